/*!
Hardware Detection Constants

Centralized constants for device probing to avoid string literals across crates.
*/

// ========== Operating System Names (std::env::consts::OS) ==========
pub const OS_MACOS: &str = "macos";
pub const OS_IOS: &str = "ios";

// ========== Detection Command Names ==========
pub const CMD_SYSCTL: &str = "sysctl";
pub const SYSCTL_HW_MODEL: &str = "hw.model";

// ========== Device Model Overrides ==========
/// Set by mobile runtimes (Flutter, React Native) that know the device identifier.
pub const ENV_DEVICE_MODEL: &str = "DEVICE_MODEL";
/// Set by the iOS Simulator.
pub const ENV_SIMULATOR_MODEL_IDENTIFIER: &str = "SIMULATOR_MODEL_IDENTIFIER";
pub const ENV_APPLE_DEVICE_MODEL: &str = "APPLE_DEVICE_MODEL";

// ========== Device Families ==========
pub const FAMILY_IPHONE: &str = "iphone";
pub const FAMILY_IPAD: &str = "ipad";
pub const FAMILY_MAC: &str = "mac";
pub const FAMILY_APPLE_TV: &str = "appletv";
pub const FAMILY_WATCH: &str = "watch";

/// First iPhone major identifier with a Neural Engine (iPhone10,x = A11).
pub const IPHONE_FIRST_ANE_MAJOR: u32 = 10;
/// First iPad major identifier with a Neural Engine (iPad8,x = A12X).
pub const IPAD_FIRST_ANE_MAJOR: u32 = 8;

/// Mac model identifiers that are Apple Silicon (and therefore have a Neural Engine).
pub const APPLE_SILICON_MAC_MODELS: &[&str] = &[
    "macbookpro17",
    "macbookpro18",
    "macbookpro19",
    "macbookpro20",
    "macbookair10",
    "macbookair11",
    "macbookair12",
    "macmini9",
    "macmini10",
    "imac21",
    "imac22",
    "imac23",
    "imac24",
    "mac13",
    "mac14",
    "mac15",
    "mac16",
];

// ========== Core ML Versions ==========
/// Newest Core ML major version this crate knows how to map.
pub const COREML_LATEST_MAJOR: u32 = 9;
