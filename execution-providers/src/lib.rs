//! CoreML Execution Provider Registration
//!
//! Configuration surface for requesting the Apple Core ML execution provider
//! and attaching it to a session's ordered provider list.
//!
//! # Examples
//!
//! ```rust
//! use coreml_ep::*;
//!
//! let options = CoreMLExecutionProviderOptions::new()
//!     .with_compute_units(CoreMLComputeUnits::CpuAndNeuralEngine)
//!     .with_only_enable_for_devices_with_ane(true);
//!
//! let mut session = SessionConfig::new();
//! let registrar = ProviderRegistrar::system();
//!
//! // Off Apple platforms the engine refuses the provider
//! if let Err(e) = registrar.register(&options, &mut session) {
//!     println!("CoreML not attached: {} ({})", e, e.code());
//! }
//!
//! // CPU fallback, lowest priority
//! registrar
//!     .register_provider(CPUExecutionProvider::new().build(), &mut session)
//!     .unwrap();
//!
//! let dispatch = session.finalize();
//! assert!(dispatch.providers().last().unwrap().backend_type() == BackendType::CPU);
//! ```

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

pub mod constants;
pub mod engine;
pub mod error;
pub mod registrar;
pub mod session;

pub mod coreml;
pub mod cpu;

#[cfg(all(feature = "coreml", target_os = "macos"))]
pub mod ort_bridge;

pub use coreml::{
    is_coreml_execution_provider_available, CoreMLComputeUnits, CoreMLExecutionProvider,
    CoreMLExecutionProviderOptions, CoreMLModelFormat, NormalizedCoreMLOptions,
};
pub use coreml_ep_hardware::PlatformVersion;
pub use cpu::CPUExecutionProvider;
pub use engine::{EngineError, EngineProviderBackend, EngineResult, SystemEngine};
pub use error::{ErrorCode, RegistrationError, Result};
pub use registrar::{append_coreml_execution_provider, ProviderRegistrar};
pub use session::{SessionConfig, SessionHandle};

/// Backend type enum - categorizes the hardware acceleration backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendType {
    // Apple
    CoreML,

    // Fallback
    CPU,
}

/// Generic configuration store for provider options.
///
/// Keys iterate in sorted order so the serialized form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    options: BTreeMap<String, String>,
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.options.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn get_as<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.parse().ok()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.options.iter()
    }
}

/// Universal execution provider trait
///
/// Every entry of a session's provider list implements this. The options map
/// returned by `config()` is exactly what the engine receives on registration.
pub trait ExecutionProvider: Send + Sync + Debug {
    /// Human-readable name (e.g., "CoreMLExecutionProvider")
    fn name(&self) -> &'static str;

    /// Backend type for this provider
    fn backend_type(&self) -> BackendType;

    /// Check if this provider is supported on the current platform (compile-time)
    fn supported_by_platform(&self) -> bool;

    /// Configuration options for this provider
    fn config(&self) -> &ProviderConfig;

    /// Check if this provider is available on the current system (runtime)
    fn is_available(&self) -> Result<bool>;
}

/// Type-erased execution provider for dynamic dispatch
pub type DynExecutionProvider = Arc<dyn ExecutionProvider>;

/// Execution provider dispatch - providers in decreasing priority order
#[derive(Debug, Clone, Default)]
pub struct ExecutionProviderDispatch {
    providers: Vec<DynExecutionProvider>,
}

impl ExecutionProviderDispatch {
    pub fn new(providers: Vec<DynExecutionProvider>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[DynExecutionProvider] {
        &self.providers
    }

    pub fn into_providers(self) -> Vec<DynExecutionProvider> {
        self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Position in dispatch order, 0 being the highest priority
    pub fn priority_of(&self, name: &str) -> Option<usize> {
        self.providers.iter().position(|p| p.name() == name)
    }

    /// Filter to only available providers
    pub fn filter_available(&self) -> Vec<DynExecutionProvider> {
        self.providers
            .iter()
            .filter(|p| p.is_available().unwrap_or(false))
            .cloned()
            .collect()
    }
}

/// Macro to reduce boilerplate when implementing ExecutionProvider base methods
#[macro_export]
macro_rules! impl_provider_base {
    ($struct_name:ident, $name:expr, $backend:expr) => {
        impl $struct_name {
            pub fn build(self) -> std::sync::Arc<dyn $crate::ExecutionProvider> {
                std::sync::Arc::new(self)
            }

            fn get_name(&self) -> &'static str {
                $name
            }

            fn get_backend_type(&self) -> $crate::BackendType {
                $backend
            }
        }
    };
}
