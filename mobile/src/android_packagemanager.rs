// usage
// get_installed_packages : package names visible to this app
// get_package_info : package name plus the FOSS meta-data keys of its manifest

// reference
// https://developer.android.com/reference/android/content/pm/PackageManager
// getInstalledPackages
// getPackageInfo
// https://developer.android.com/reference/android/content/pm/PackageItemInfo#metaData

#[cfg(target_os = "android")]
use crate::package_info::{MetaData, MetaValue, PackageInfo, OPEN_SOURCE, OPEN_SOURCE_LICENSE};
#[cfg(target_os = "android")]
use jni::objects::{JObject, JString, JValue};
#[cfg(target_os = "android")]
use jni::JNIEnv;

/// PackageManager.GET_META_DATA
#[cfg(target_os = "android")]
const GET_META_DATA: i32 = 0x80;

#[cfg(target_os = "android")]
fn jni_error(context: impl std::fmt::Display) -> impl FnOnce(jni::errors::Error) -> std::io::Error {
    move |e| std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[cfg(target_os = "android")]
fn with_package_manager<T>(
    f: impl FnOnce(&mut JNIEnv, &JObject) -> std::io::Result<T>,
) -> std::io::Result<T> {
    let ctx = ndk_context::android_context();
    let vm = unsafe { jni::JavaVM::from_raw(ctx.vm() as _) }.map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Expected to find JVM via ndk_context crate",
        )
    })?;

    let activity = unsafe { JObject::from_raw(ctx.context() as _) };
    let mut env = vm
        .attach_current_thread()
        .map_err(jni_error("Failed to attach current thread"))?;

    let package_manager = env
        .call_method(
            &activity,
            "getPackageManager",
            "()Landroid/content/pm/PackageManager;",
            &[],
        )
        .and_then(|v| v.l())
        .map_err(jni_error("Failed to get PackageManager"))?;

    f(&mut env, &package_manager)
}

#[cfg(target_os = "android")]
fn read_string(env: &mut JNIEnv, obj: JObject) -> std::io::Result<String> {
    let s: String = env
        .get_string(&JString::from(obj))
        .map_err(jni_error("Failed to convert Java string"))?
        .into();
    Ok(s)
}

#[cfg(target_os = "android")]
pub fn get_installed_packages() -> std::io::Result<Vec<String>> {
    with_package_manager(|env, package_manager| {
        let java_list = env
            .call_method(
                package_manager,
                "getInstalledPackages",
                "(I)Ljava/util/List;",
                &[JValue::Int(0)],
            )
            .and_then(|v| v.l())
            .map_err(jni_error("Failed to get installed packages"))?;

        let size = env
            .call_method(&java_list, "size", "()I", &[])
            .and_then(|v| v.i())
            .map_err(jni_error("Failed to get list size"))?;

        let mut package_names = Vec::with_capacity(size.max(0) as usize);
        for i in 0..size {
            let package_info = env
                .call_method(&java_list, "get", "(I)Ljava/lang/Object;", &[JValue::Int(i)])
                .and_then(|v| v.l())
                .map_err(jni_error(format!("Failed to get package info at index {}", i)))?;
            let package_name = env
                .get_field(&package_info, "packageName", "Ljava/lang/String;")
                .and_then(|v| v.l())
                .map_err(jni_error(format!("Failed to get package name at index {}", i)))?;
            package_names.push(read_string(env, package_name)?);
        }
        Ok(package_names)
    })
}

/// Read `open_source` and `open_source_license` from the package's
/// `applicationInfo.metaData`. A package without a meta-data bundle gets
/// `meta_data: None`.
#[cfg(target_os = "android")]
pub fn get_package_info(package_name: &str) -> std::io::Result<PackageInfo> {
    with_package_manager(|env, package_manager| {
        let jname = env
            .new_string(package_name)
            .map_err(jni_error("Failed to create package name string"))?;

        let package_info = env
            .call_method(
                package_manager,
                "getPackageInfo",
                "(Ljava/lang/String;I)Landroid/content/pm/PackageInfo;",
                &[JValue::Object(&jname), JValue::Int(GET_META_DATA)],
            )
            .and_then(|v| v.l())
            .map_err(jni_error(format!("Failed to get package info for {}", package_name)))?;

        let app_info = env
            .get_field(&package_info, "applicationInfo", "Landroid/content/pm/ApplicationInfo;")
            .and_then(|v| v.l())
            .map_err(jni_error("Failed to get applicationInfo"))?;
        if app_info.is_null() {
            return Ok(PackageInfo::new(package_name));
        }

        let bundle = env
            .get_field(&app_info, "metaData", "Landroid/os/Bundle;")
            .and_then(|v| v.l())
            .map_err(jni_error("Failed to get metaData"))?;
        if bundle.is_null() {
            return Ok(PackageInfo::new(package_name));
        }

        let mut meta = MetaData::new();

        let key = env
            .new_string(OPEN_SOURCE)
            .map_err(jni_error("Failed to create key string"))?;
        let has_flag = env
            .call_method(&bundle, "containsKey", "(Ljava/lang/String;)Z", &[JValue::Object(&key)])
            .and_then(|v| v.z())
            .map_err(jni_error("Failed to query metaData"))?;
        if has_flag {
            let flag = env
                .call_method(&bundle, "getBoolean", "(Ljava/lang/String;)Z", &[JValue::Object(&key)])
                .and_then(|v| v.z())
                .map_err(jni_error("Failed to read open_source"))?;
            meta.insert(OPEN_SOURCE, MetaValue::Bool(flag));
        }

        let key = env
            .new_string(OPEN_SOURCE_LICENSE)
            .map_err(jni_error("Failed to create key string"))?;
        let license = env
            .call_method(
                &bundle,
                "getString",
                "(Ljava/lang/String;)Ljava/lang/String;",
                &[JValue::Object(&key)],
            )
            .and_then(|v| v.l())
            .map_err(jni_error("Failed to read open_source_license"))?;
        if !license.is_null() {
            meta.insert(OPEN_SOURCE_LICENSE, MetaValue::Str(read_string(env, license)?));
        }

        Ok(PackageInfo::with_meta_data(package_name, meta))
    })
}

/// Installed package names. Only available on the device itself.
#[cfg(not(target_os = "android"))]
pub fn get_installed_packages() -> std::io::Result<Vec<String>> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "PackageManager is only available on Android",
    ))
}

/// Manifest meta-data cannot be read off-device; packages carry no bag.
#[cfg(not(target_os = "android"))]
pub fn get_package_info(package_name: &str) -> std::io::Result<crate::package_info::PackageInfo> {
    Ok(crate::package_info::PackageInfo::new(package_name))
}
