//! CPU Execution Provider
//!
//! Fallback provider that runs on CPU. Always available.

use crate::constants::*;
use crate::{
    impl_provider_base, BackendType, ExecutionProvider, ProviderConfig, RegistrationError, Result,
};

#[derive(Debug, Clone, Default)]
pub struct CPUExecutionProvider {
    config: ProviderConfig,
}

impl_provider_base!(
    CPUExecutionProvider,
    PROVIDER_NAME_CPU,
    BackendType::CPU
);

impl CPUExecutionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enable_cpu_mem_arena(mut self, enable: bool) -> Self {
        self.config.set(ENABLE_CPU_MEM_ARENA, enable);
        self
    }
}

/// Read the memory arena switch from a CPU provider config.
///
/// A missing key means the arena is on. Anything other than `true`/`false`
/// is an `InvalidConfig` error.
pub fn cpu_mem_arena_enabled(config: &ProviderConfig) -> Result<bool> {
    match config.get(ENABLE_CPU_MEM_ARENA) {
        None => Ok(true),
        Some(value) => value.parse::<bool>().map_err(|_| {
            RegistrationError::InvalidConfig(format!(
                "{} must be true or false, got '{}'",
                ENABLE_CPU_MEM_ARENA, value
            ))
        }),
    }
}

impl ExecutionProvider for CPUExecutionProvider {
    fn name(&self) -> &'static str {
        self.get_name()
    }

    fn backend_type(&self) -> BackendType {
        self.get_backend_type()
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn supported_by_platform(&self) -> bool {
        true // Always supported
    }

    fn is_available(&self) -> Result<bool> {
        Ok(true) // Always available
    }
}
