/*!
Core ML Version Detection

Core ML ships with the operating system, so its version follows from the OS release:

| Core ML | macOS | iOS |
|---------|-------|-----|
| 1       | 10.13 | 11  |
| 2       | 10.14 | 12  |
| 3       | 10.15 | 13  |
| 4       | 11    | 14  |
| 5       | 12    | 15  |
| 6       | 13    | 16  |
| 7       | 14    | 17  |
| 8       | 15    | 18  |
| 9       | 26    | 26  |
*/

use crate::constants::{COREML_LATEST_MAJOR, OS_IOS, OS_MACOS};
use crate::{OsInfo, PlatformVersion};

/// Map an OS name (`std::env::consts::OS` spelling) and release to the
/// bundled Core ML version.
///
/// Returns `None` for non-Apple systems and releases older than Core ML 1.
pub fn coreml_version_for_os(
    os_name: &str,
    os_version: PlatformVersion,
) -> Option<PlatformVersion> {
    let major = match os_name {
        OS_MACOS => match os_version.major {
            10 if os_version.minor >= 13 => os_version.minor - 12,
            11..=15 => os_version.major - 7,
            m if m > 15 => COREML_LATEST_MAJOR,
            _ => return None,
        },
        OS_IOS => match os_version.major {
            11..=18 => os_version.major - 10,
            m if m > 18 => COREML_LATEST_MAJOR,
            _ => return None,
        },
        _ => return None,
    };

    Some(PlatformVersion::major(major))
}

/// Core ML version of the running system, `PlatformVersion::UNKNOWN` when it cannot be told.
pub fn detect_coreml_version() -> PlatformVersion {
    let os = OsInfo::detect();
    let os_version = match PlatformVersion::parse(&os.version) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("Could not parse OS version {:?}: {}", os.version, e);
            return PlatformVersion::UNKNOWN;
        }
    };

    coreml_version_for_os(&os.name, os_version).unwrap_or(PlatformVersion::UNKNOWN)
}
