/*!
macOS-specific device detection using sysctl
*/

use crate::constants::{CMD_SYSCTL, SYSCTL_HW_MODEL};
use crate::{HardwareError, Result};
use std::process::Command;

/// Read the hardware model identifier (e.g. `"Mac14,2"`, `"MacBookPro16,1"`).
pub fn detect_device_model() -> Result<String> {
    let output = Command::new(CMD_SYSCTL)
        .args(["-n", SYSCTL_HW_MODEL])
        .output()
        .map_err(|e| HardwareError::DeviceDetection(format!("sysctl failed: {}", e)))?;

    if !output.status.success() {
        return Err(HardwareError::DeviceDetection(format!(
            "sysctl {} exited with {}",
            SYSCTL_HW_MODEL, output.status
        )));
    }

    let model = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if model.is_empty() {
        return Err(HardwareError::DeviceDetection("empty hw.model".to_string()));
    }

    Ok(model)
}
