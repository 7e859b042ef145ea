/*!
# CoreML EP Hardware Detection

Device and platform probes used when deciding whether the Core ML execution
provider can be engaged.

## Features

- Apple Neural Engine detection from the device model identifier
- Core ML version derived from the OS release
- OS information via `sysinfo`
- Serializable for JSON output

## Example

```rust,no_run
use coreml_ep_hardware::{detect_coreml_version, detect_neural_engine};

let version = detect_coreml_version();
println!("Core ML {} (Neural Engine: {})", version, detect_neural_engine());
```
*/

use serde::{Deserialize, Serialize};
use sysinfo::System;
use thiserror::Error;

pub mod constants;
mod coreml;
mod neural_engine;
mod version;

#[cfg(target_os = "macos")]
mod platform_macos;

pub use coreml::{coreml_version_for_os, detect_coreml_version};
pub use neural_engine::{
    detect_apple_device, detect_neural_engine, has_neural_engine_by_model, AppleDeviceInfo,
    DetectionConfidence,
};
pub use version::PlatformVersion;

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("Failed to detect device: {0}")]
    DeviceDetection(String),

    #[error("Invalid version string: {0:?}")]
    InvalidVersion(String),
}

pub type Result<T> = std::result::Result<T, HardwareError>;

/// Operating system information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsInfo {
    pub name: String,
    pub version: String,
    pub arch: String,
}

impl OsInfo {
    /// Detect operating system name, version and architecture.
    ///
    /// The version is the bare release number (`"14.5"`), or `"unknown"`.
    pub fn detect() -> Self {
        let os_version = System::os_version().unwrap_or_else(|| "unknown".to_string());

        Self {
            name: std::env::consts::OS.to_string(),
            version: os_version,
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Whether this build targets an OS that ships Core ML.
pub fn is_apple_platform() -> bool {
    cfg!(any(target_os = "macos", target_os = "ios"))
}
