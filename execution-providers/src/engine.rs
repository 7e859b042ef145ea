//! Engine boundary
//!
//! The inference engine is reached only through [`EngineProviderBackend`], so
//! registration logic can run against a fake engine in tests.

use coreml_ep_hardware::{
    detect_coreml_version, detect_neural_engine, is_apple_platform, PlatformVersion,
};
use std::fmt::Debug;
use thiserror::Error;

use crate::constants::*;
use crate::coreml::NormalizedCoreMLOptions;
use crate::cpu::cpu_mem_arena_enabled;
use crate::session::SessionHandle;
use crate::{BackendType, ProviderConfig};

/// Failure reported by the engine, carrying its status code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("engine status {code}: {message}")]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Capabilities the registrar needs from the inference engine.
pub trait EngineProviderBackend: Send + Sync + Debug {
    /// Append a provider to the engine-side provider list of `session`.
    ///
    /// Must leave the session untouched on error.
    fn append_provider(
        &self,
        session: SessionHandle,
        kind: BackendType,
        options: &ProviderConfig,
    ) -> EngineResult<()>;

    /// Whether the device has a dedicated neural accelerator. Never fails.
    fn query_accelerator_available(&self) -> bool;

    /// Core ML version the engine would compile against
    fn platform_version(&self) -> PlatformVersion;
}

/// Engine backend for the running system.
///
/// Probes real hardware on every call; nothing is cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEngine;

impl SystemEngine {
    pub fn new() -> Self {
        Self
    }
}

impl EngineProviderBackend for SystemEngine {
    fn append_provider(
        &self,
        session: SessionHandle,
        kind: BackendType,
        options: &ProviderConfig,
    ) -> EngineResult<()> {
        match kind {
            BackendType::CPU => {
                let arena = cpu_mem_arena_enabled(options)
                    .map_err(|e| EngineError::new(ENGINE_STATUS_INVALID_ARGUMENT, e.to_string()))?;
                log::debug!(
                    "Engine accepted {} for session {} (memory arena: {})",
                    PROVIDER_NAME_CPU,
                    session,
                    arena
                );
                Ok(())
            }
            BackendType::CoreML => {
                if !is_apple_platform() {
                    return Err(EngineError::new(
                        ENGINE_STATUS_NOT_IMPLEMENTED,
                        format!(
                            "{} is not supported on {}",
                            PROVIDER_NAME_COREML,
                            std::env::consts::OS
                        ),
                    ));
                }

                let parsed = NormalizedCoreMLOptions::from_provider_config(options)
                    .map_err(|e| EngineError::new(ENGINE_STATUS_INVALID_ARGUMENT, e.to_string()))?;
                log::debug!(
                    "Engine accepted {} for session {} ({:?}, flags {:#05x})",
                    PROVIDER_NAME_COREML,
                    session,
                    parsed.compute_units(),
                    parsed.coreml_flags()
                );
                Ok(())
            }
        }
    }

    fn query_accelerator_available(&self) -> bool {
        detect_neural_engine()
    }

    fn platform_version(&self) -> PlatformVersion {
        detect_coreml_version()
    }
}
