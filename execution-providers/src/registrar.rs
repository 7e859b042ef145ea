//! Provider registration
//!
//! Validates provider options, hands them to the engine and appends the
//! provider to the session. Registration is one-shot and all-or-nothing: on
//! any error the session's provider list is left exactly as it was.

use std::sync::Arc;

use crate::constants::*;
use crate::coreml::{CoreMLExecutionProvider, CoreMLExecutionProviderOptions};
use crate::engine::{EngineProviderBackend, SystemEngine};
use crate::session::SessionConfig;
use crate::{DynExecutionProvider, RegistrationError, Result};

#[derive(Debug, Clone)]
pub struct ProviderRegistrar {
    engine: Arc<dyn EngineProviderBackend>,
}

impl Default for ProviderRegistrar {
    fn default() -> Self {
        Self::system()
    }
}

impl ProviderRegistrar {
    pub fn new(engine: Arc<dyn EngineProviderBackend>) -> Self {
        Self { engine }
    }

    /// Registrar backed by the running system
    pub fn system() -> Self {
        Self::new(Arc::new(SystemEngine::new()))
    }

    pub fn engine(&self) -> &Arc<dyn EngineProviderBackend> {
        &self.engine
    }

    /// Enable the CoreML execution provider on `session`.
    ///
    /// It is appended to the provider list, which is ordered by decreasing
    /// priority. Checks run in this order:
    ///
    /// 1. the session must not be finalized
    /// 2. options normalize without conflict
    /// 3. `create_ml_program` needs the engine at Core ML 5 or later
    /// 4. with `only_enable_for_devices_with_ane`, a device without a Neural
    ///    Engine makes the call a successful no-op
    /// 5. the engine accepts the serialized options
    pub fn register(
        &self,
        options: &CoreMLExecutionProviderOptions,
        session: &mut SessionConfig,
    ) -> Result<()> {
        session.ensure_configurable()?;

        let normalized = options.normalize()?;

        if normalized.create_ml_program() {
            let actual = self.engine.platform_version();
            if actual < MIN_COREML_VERSION_FOR_ML_PROGRAM {
                log::warn!(
                    "Refusing {}: MLProgram needs Core ML {}, engine reports {}",
                    PROVIDER_NAME_COREML,
                    MIN_COREML_VERSION_FOR_ML_PROGRAM,
                    actual
                );
                return Err(RegistrationError::UnsupportedPlatformVersion {
                    feature: MODEL_FORMAT_ML_PROGRAM.to_string(),
                    required: MIN_COREML_VERSION_FOR_ML_PROGRAM,
                    actual,
                });
            }
        }

        if normalized.only_enable_for_devices_with_ane()
            && !self.engine.query_accelerator_available()
        {
            log::info!(
                "No Neural Engine on this device, {} not added to session {}",
                PROVIDER_NAME_COREML,
                session.handle()
            );
            return Ok(());
        }

        let provider = CoreMLExecutionProvider::from_options(&normalized).build();
        self.append(provider, session)
    }

    /// Append any provider (e.g. the CPU fallback) through the engine.
    pub fn register_provider(
        &self,
        provider: DynExecutionProvider,
        session: &mut SessionConfig,
    ) -> Result<()> {
        session.ensure_configurable()?;
        self.append(provider, session)
    }

    fn append(&self, provider: DynExecutionProvider, session: &mut SessionConfig) -> Result<()> {
        log::debug!(
            "Appending {} with {} options to session {}",
            provider.name(),
            provider.config().len(),
            session.handle()
        );

        self.engine
            .append_provider(session.handle(), provider.backend_type(), provider.config())
            .map_err(|e| {
                log::warn!("Engine rejected {}: {}", provider.name(), e);
                RegistrationError::from(e)
            })?;

        session.push_provider(Arc::clone(&provider));
        log::info!(
            "Registered {} at priority {} in session {}",
            provider.name(),
            session.provider_count() - 1,
            session.handle()
        );
        Ok(())
    }
}

/// Enable the CoreML execution provider on `session` using the system engine.
pub fn append_coreml_execution_provider(
    session: &mut SessionConfig,
    options: &CoreMLExecutionProviderOptions,
) -> Result<()> {
    ProviderRegistrar::system().register(options, session)
}
