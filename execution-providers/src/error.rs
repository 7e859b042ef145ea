use coreml_ep_hardware::PlatformVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::engine::EngineError;

/// Stable, machine-readable identifier for each registration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ConfigurationConflict,
    UnsupportedPlatformVersion,
    EngineRegistrationFailed,
    SessionAlreadyFinalized,
    InvalidConfig,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationConflict => "CONFIGURATION_CONFLICT",
            Self::UnsupportedPlatformVersion => "UNSUPPORTED_PLATFORM_VERSION",
            Self::EngineRegistrationFailed => "ENGINE_REGISTRATION_FAILED",
            Self::SessionAlreadyFinalized => "SESSION_ALREADY_FINALIZED",
            Self::InvalidConfig => "INVALID_CONFIG",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when attaching an execution provider to a session
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum RegistrationError {
    #[error("Configuration conflict: {0}")]
    ConfigurationConflict(String),

    #[error("Unsupported platform version: {feature} requires Core ML {required}, found {actual}")]
    UnsupportedPlatformVersion {
        feature: String,
        required: PlatformVersion,
        actual: PlatformVersion,
    },

    #[error("Engine registration failed (status {code}): {message}")]
    EngineRegistrationFailed { code: i32, message: String },

    #[error("Session configuration is already finalized")]
    SessionAlreadyFinalized,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RegistrationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ConfigurationConflict(_) => ErrorCode::ConfigurationConflict,
            Self::UnsupportedPlatformVersion { .. } => ErrorCode::UnsupportedPlatformVersion,
            Self::EngineRegistrationFailed { .. } => ErrorCode::EngineRegistrationFailed,
            Self::SessionAlreadyFinalized => ErrorCode::SessionAlreadyFinalized,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
        }
    }
}

impl From<EngineError> for RegistrationError {
    fn from(err: EngineError) -> Self {
        Self::EngineRegistrationFailed {
            code: err.code,
            message: err.message,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
