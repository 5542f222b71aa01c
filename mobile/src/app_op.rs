use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// State of one app-op for one package, as reported by `appops get`.
/// Immutable once built; serialized to hand it across process boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppOp {
    permission: String,
    id: String,
    enabled: bool,
    time: String,
    duration: String,
    reject_time: String,
}

impl AppOp {
    pub fn new(
        permission: &str,
        id: &str,
        enabled: bool,
        time: &str,
        duration: &str,
        reject_time: &str,
    ) -> Self {
        Self {
            permission: permission.to_string(),
            id: id.to_string(),
            enabled,
            time: time.to_string(),
            duration: duration.to_string(),
            reject_time: reject_time.to_string(),
        }
    }

    /// Op name as printed by `appops`, e.g. `CAMERA`
    pub fn permission(&self) -> &str {
        &self.permission
    }

    /// `AppOpsManager` op string, e.g. `android:camera`
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Last access, e.g. `+2d3h ago`
    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    /// Last rejected access
    pub fn reject_time(&self) -> &str {
        &self.reject_time
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("Failed to serialize app op")
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("Failed to deserialize app op")
    }
}

fn op_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z][A-Z0-9_]*):\s*([a-z_]+)\s*(.*)$").expect("valid regex"))
}

fn op_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(time|duration|rejectTime)=([^;]*)").expect("valid regex"))
}

/// Modes that let the op through
fn is_allowing_mode(mode: &str) -> bool {
    matches!(mode, "allow" | "foreground")
}

/// Parse `appops get <package>` output. Lines look like:
///
/// ```text
/// Uid mode: COARSE_LOCATION: foreground
/// CAMERA: allow; time=+2d3h ago; duration=+1s
/// RECORD_AUDIO: ignore; rejectTime=+5m ago
/// ```
///
/// `Uid mode` lines and anything else that isn't an op line are skipped.
pub fn parse_app_ops(text: &str) -> Vec<AppOp> {
    text.lines()
        .filter_map(|line| {
            let caps = op_line_re().captures(line.trim())?;
            let name = caps.get(1)?.as_str();
            let mode = caps.get(2)?.as_str();
            let rest = caps.get(3).map_or("", |m| m.as_str());

            let mut time = "";
            let mut duration = "";
            let mut reject_time = "";
            for field in op_field_re().captures_iter(rest) {
                let value = field.get(2).map_or("", |m| m.as_str().trim());
                match field.get(1).map(|m| m.as_str()) {
                    Some("time") => time = value,
                    Some("duration") => duration = value,
                    Some("rejectTime") => reject_time = value,
                    _ => {}
                }
            }

            let id = format!("android:{}", name.to_lowercase());
            Some(AppOp::new(
                name,
                &id,
                is_allowing_mode(mode),
                time,
                duration,
                reject_time,
            ))
        })
        .collect()
}
