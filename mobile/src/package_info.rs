use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Manifest meta-data key declaring the package open source
pub const OPEN_SOURCE: &str = "open_source";
/// Manifest meta-data key carrying the package's license identifier
pub const OPEN_SOURCE_LICENSE: &str = "open_source_license";

/// Typed value of a manifest `<meta-data>` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Str(String),
}

/// Key-value bag a package declares about itself in its manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    values: HashMap<String, MetaValue>,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: MetaValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: MetaValue) {
        self.values.insert(key.to_string(), value);
    }

    /// `false` when the key is absent or holds a non-boolean value
    pub fn get_boolean(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(MetaValue::Bool(true)))
    }

    /// `None` when the key is absent or holds a non-string value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(MetaValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// An installed package as seen by the FOSS resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub package_name: String,
    pub meta_data: Option<MetaData>,
}

impl PackageInfo {
    /// Package with no readable meta-data bag
    pub fn new(package_name: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            meta_data: None,
        }
    }

    pub fn with_meta_data(package_name: &str, meta_data: MetaData) -> Self {
        Self {
            package_name: package_name.to_string(),
            meta_data: Some(meta_data),
        }
    }

    /// Embedded `open_source` flag
    pub fn declares_open_source(&self) -> bool {
        self.meta_data
            .as_ref()
            .is_some_and(|m| m.get_boolean(OPEN_SOURCE))
    }

    /// Embedded `open_source_license` string
    pub fn declared_license(&self) -> Option<&str> {
        self.meta_data
            .as_ref()
            .and_then(|m| m.get_string(OPEN_SOURCE_LICENSE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_bag_and_keys() {
        let bare = PackageInfo::new("com.foo");
        assert!(!bare.declares_open_source());
        assert_eq!(bare.declared_license(), None);

        let empty = PackageInfo::with_meta_data("com.foo", MetaData::new());
        assert!(!empty.declares_open_source());
        assert_eq!(empty.declared_license(), None);
    }

    #[test]
    fn test_wrong_value_types_are_ignored() {
        let meta = MetaData::new()
            .with(OPEN_SOURCE, MetaValue::Str("true".to_string()))
            .with(OPEN_SOURCE_LICENSE, MetaValue::Int(3));
        let info = PackageInfo::with_meta_data("com.foo", meta);

        assert!(!info.declares_open_source());
        assert_eq!(info.declared_license(), None);
    }

    #[test]
    fn test_declared_values() {
        let meta = MetaData::new()
            .with(OPEN_SOURCE, MetaValue::Bool(true))
            .with(OPEN_SOURCE_LICENSE, MetaValue::Str("GPL-3.0-only".to_string()));
        let info = PackageInfo::with_meta_data("com.foo", meta);

        assert!(info.declares_open_source());
        assert_eq!(info.declared_license(), Some("GPL-3.0-only"));
    }
}
