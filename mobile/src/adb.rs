// interface for adb commands wrapper
// get_devices : return value of "adb devices"
// list_packages : package names installed on a device
// get_app_ops : app-op states of one package

use crate::app_op::{parse_app_ops, AppOp};
use std::process::Command;
use tracing::{debug, error};

fn adb_shell(device: &str, args: &[&str]) -> std::io::Result<String> {
    let output = Command::new("adb")
        .arg("-s")
        .arg(device)
        .arg("shell")
        .args(args)
        .output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let err = String::from_utf8_lossy(&output.stderr).to_string();
        error!("ADB command {:?} failed: {}", args, err);
        Err(std::io::Error::new(std::io::ErrorKind::Other, err))
    }
}

pub fn get_devices() -> std::io::Result<Vec<String>> {
    let output = Command::new("adb").arg("devices").arg("-l").output()?;

    if output.status.success() {
        let devices = String::from_utf8_lossy(&output.stdout).to_string();
        Ok(parse_devices(&devices))
    } else {
        let err = String::from_utf8_lossy(&output.stderr).to_string();
        Err(std::io::Error::new(std::io::ErrorKind::Other, err))
    }
}

fn parse_devices(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            // Skip empty lines and the header line
            if line.trim().is_empty() || line.starts_with("List of devices") {
                return None;
            }

            let mut tokens = line.split_whitespace();
            let serial = tokens.next()?;
            if tokens.next() == Some("device") {
                Some(serial.to_string())
            } else {
                None
            }
        })
        .collect()
}

pub fn list_packages(device: &str) -> std::io::Result<Vec<String>> {
    debug!("Listing packages for device: {}", device);
    let text = adb_shell(device, &["pm", "list", "packages"])?;
    let packages = parse_package_list(&text);
    debug!("Parsed {} packages", packages.len());
    Ok(packages)
}

fn parse_package_list(text: &str) -> Vec<String> {
    // package:com.android.settings
    text.lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn get_app_ops(device: &str, package_name: &str) -> std::io::Result<Vec<AppOp>> {
    debug!("Getting app ops for {} on {}", package_name, device);
    let text = adb_shell(device, &["appops", "get", package_name])?;
    Ok(parse_app_ops(&text))
}
