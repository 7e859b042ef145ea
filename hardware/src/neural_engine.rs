/*!
Apple Neural Engine Detection

Infers whether the current device carries a Neural Engine from its model
identifier, falling back to the CPU architecture when no identifier is known.
*/

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// How much the detection result can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionConfidence {
    High,
    Medium,
    Low,
}

/// iOS/macOS device family detection result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppleDeviceInfo {
    /// Device identifier (e.g., "iPhone12,1", "MacBookPro18,1")
    pub device_model: Option<String>,
    pub has_neural_engine: bool,
    pub confidence: DetectionConfidence,
}

/// Detect the current Apple device.
///
/// Sources, in order:
/// 1. `DEVICE_MODEL`, `SIMULATOR_MODEL_IDENTIFIER`, `APPLE_DEVICE_MODEL` environment variables
/// 2. `sysctl hw.model` (macOS)
/// 3. CPU architecture: every arm64 Apple device since 2017 ships a Neural Engine
pub fn detect_apple_device() -> AppleDeviceInfo {
    if !crate::is_apple_platform() {
        return AppleDeviceInfo {
            device_model: None,
            has_neural_engine: false,
            confidence: DetectionConfidence::High,
        };
    }

    let env_model = [ENV_DEVICE_MODEL, ENV_SIMULATOR_MODEL_IDENTIFIER, ENV_APPLE_DEVICE_MODEL]
        .iter()
        .find_map(|key| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|model| (*key, model))
        });

    if let Some((key, model)) = env_model {
        return device_info_from_env(key, model, cfg!(target_arch = "aarch64"));
    }

    #[cfg(target_os = "macos")]
    {
        match crate::platform_macos::detect_device_model() {
            Ok(model) => {
                return AppleDeviceInfo {
                    has_neural_engine: has_neural_engine_by_model(&model),
                    device_model: Some(model),
                    confidence: DetectionConfidence::High,
                };
            }
            Err(e) => log::debug!("hw.model lookup failed, using architecture fallback: {}", e),
        }
    }

    AppleDeviceInfo {
        device_model: None,
        has_neural_engine: cfg!(target_arch = "aarch64"),
        confidence: if cfg!(target_arch = "aarch64") {
            DetectionConfidence::Low
        } else {
            // Intel Macs never had a Neural Engine
            DetectionConfidence::High
        },
    }
}

/// Build the detection result for a model identifier taken from `key`.
///
/// A simulator runs on the host CPU, so the simulated model only counts when
/// the host itself is arm64.
fn device_info_from_env(key: &str, model: String, host_is_arm64: bool) -> AppleDeviceInfo {
    let simulated = key == ENV_SIMULATOR_MODEL_IDENTIFIER;
    let has_neural_engine = has_neural_engine_by_model(&model) && (!simulated || host_is_arm64);
    if simulated && !host_is_arm64 {
        log::debug!("Simulated {} on a non-arm64 host, no Neural Engine", model);
    }

    AppleDeviceInfo {
        has_neural_engine,
        device_model: Some(model),
        confidence: DetectionConfidence::Medium,
    }
}

/// Whether the current device has a Neural Engine. Never fails; unknown means `false`
/// off Apple platforms.
pub fn detect_neural_engine() -> bool {
    detect_apple_device().has_neural_engine
}

/// Check if a device model identifier has a Neural Engine.
///
/// - iPhone: A11 Bionic (iPhone10,x) and later
/// - iPad: A12X Bionic (iPad8,x) and later
/// - Mac: every Apple Silicon model
pub fn has_neural_engine_by_model(model: &str) -> bool {
    let model_lower = model.trim().to_lowercase();

    if let Some(rest) = model_lower.strip_prefix(FAMILY_IPHONE) {
        // Unknown iPhone format: assume a current device
        return model_major(rest).map_or(true, |major| major >= IPHONE_FIRST_ANE_MAJOR);
    }

    if let Some(rest) = model_lower.strip_prefix(FAMILY_IPAD) {
        return model_major(rest).map_or(false, |major| major >= IPAD_FIRST_ANE_MAJOR);
    }

    if model_lower.starts_with(FAMILY_APPLE_TV) || model_lower.starts_with(FAMILY_WATCH) {
        return false;
    }

    if model_lower.contains(FAMILY_MAC) {
        if APPLE_SILICON_MAC_MODELS
            .iter()
            .any(|pattern| model_lower.starts_with(pattern))
        {
            return true;
        }
        // Unknown Mac: arm64 build means Apple Silicon
        return cfg!(target_arch = "aarch64");
    }

    false
}

/// `"12,1"` -> `Some(12)`
fn model_major(rest: &str) -> Option<u32> {
    rest.split_once(',')?.0.parse().ok()
}
