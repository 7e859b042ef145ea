//! CoreML Execution Provider
//!
//! Apple Core ML for optimized inference on macOS and iOS devices.
//!
//! [`CoreMLExecutionProviderOptions`] is the caller-facing options object. It is
//! never validated when built; [`CoreMLExecutionProviderOptions::normalize`] runs
//! once at registration and folds the deprecated boolean knobs into a single
//! [`NormalizedCoreMLOptions`] value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::*;
use crate::{
    impl_provider_base, BackendType, ExecutionProvider, ProviderConfig, RegistrationError, Result,
};
use coreml_ep_hardware::{detect_coreml_version, is_apple_platform};

/// Which compute units Core ML may use. Maps to Apple's `MLComputeUnits`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CoreMLComputeUnits {
    /// CPU, GPU and Neural Engine
    #[default]
    All,
    CpuOnly,
    /// Excludes the Neural Engine
    CpuAndGpu,
    /// Excludes the GPU. The only choice that keeps running while an iOS app is backgrounded.
    CpuAndNeuralEngine,
}

impl CoreMLComputeUnits {
    /// Spelling used in config files
    pub fn config_value(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::CpuOnly => "CPU_ONLY",
            Self::CpuAndGpu => "CPU_AND_GPU",
            Self::CpuAndNeuralEngine => "CPU_AND_NE",
        }
    }

    /// Spelling expected by the engine's `MLComputeUnits` option
    pub fn engine_value(&self) -> &'static str {
        match self {
            Self::All => COMPUTE_UNITS_ALL,
            Self::CpuOnly => COMPUTE_UNITS_CPU_ONLY,
            Self::CpuAndGpu => COMPUTE_UNITS_CPU_AND_GPU,
            Self::CpuAndNeuralEngine => COMPUTE_UNITS_CPU_AND_NEURAL_ENGINE,
        }
    }
}

impl fmt::Display for CoreMLComputeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_value())
    }
}

impl FromStr for CoreMLComputeUnits {
    type Err = RegistrationError;

    /// Accepts both the config spelling (`CPU_AND_NE`) and the engine spelling
    /// (`CPUAndNeuralEngine`), case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "cpu_only" | "cpuonly" => Ok(Self::CpuOnly),
            "cpu_and_gpu" | "cpuandgpu" => Ok(Self::CpuAndGpu),
            "cpu_and_ne" | "cpuandne" | "cpuandneuralengine" | "cpu_and_neural_engine" => {
                Ok(Self::CpuAndNeuralEngine)
            }
            _ => Err(RegistrationError::InvalidConfig(format!(
                "unknown compute units {:?}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for CoreMLComputeUnits {
    type Error = RegistrationError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CoreMLComputeUnits> for String {
    fn from(units: CoreMLComputeUnits) -> Self {
        units.config_value().to_string()
    }
}

/// Model representation Core ML builds from the claimed subgraphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreMLModelFormat {
    /// Classic network description, available on every Core ML release
    NeuralNetwork,
    /// Compiled program, requires Core ML 5 or later
    MLProgram,
}

impl CoreMLModelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeuralNetwork => MODEL_FORMAT_NEURAL_NETWORK,
            Self::MLProgram => MODEL_FORMAT_ML_PROGRAM,
        }
    }
}

impl fmt::Display for CoreMLModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for configuring the CoreML execution provider.
///
/// All fields default to off / [`CoreMLComputeUnits::All`]. Conflicting
/// combinations are accepted here and rejected only at registration, so the
/// options can be built up incrementally or loaded from a config file.
///
/// ```rust
/// use coreml_ep::{CoreMLComputeUnits, CoreMLExecutionProviderOptions};
///
/// let options = CoreMLExecutionProviderOptions::new()
///     .with_compute_units(CoreMLComputeUnits::CpuAndNeuralEngine)
///     .with_only_allow_static_input_shapes(true);
///
/// let normalized = options.normalize().unwrap();
/// assert_eq!(normalized.compute_units(), CoreMLComputeUnits::CpuAndNeuralEngine);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreMLExecutionProviderOptions {
    compute_units: CoreMLComputeUnits,
    use_cpu_only: bool,
    use_cpu_and_gpu: bool,
    enable_on_subgraphs: bool,
    only_enable_for_devices_with_ane: bool,
    only_allow_static_input_shapes: bool,
    create_ml_program: bool,
}

impl CoreMLExecutionProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a TOML table. Missing keys keep their defaults,
    /// unknown keys are rejected.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| RegistrationError::InvalidConfig(e.to_string()))
    }

    /// Load options from a JSON object. Missing keys keep their defaults,
    /// unknown keys are rejected.
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| RegistrationError::InvalidConfig(e.to_string()))
    }

    // ----- builders -----

    /// Set compute units preference (default: `All`)
    pub fn with_compute_units(mut self, units: CoreMLComputeUnits) -> Self {
        self.compute_units = units;
        self
    }

    /// Run on CPU only
    #[deprecated(note = "use `with_compute_units(CoreMLComputeUnits::CpuOnly)`")]
    pub fn with_use_cpu_only(mut self, enable: bool) -> Self {
        self.use_cpu_only = enable;
        self
    }

    /// Exclude the Neural Engine
    #[deprecated(note = "use `with_compute_units(CoreMLComputeUnits::CpuAndGpu)`")]
    pub fn with_use_cpu_and_gpu(mut self, enable: bool) -> Self {
        self.use_cpu_and_gpu = enable;
        self
    }

    /// Let the provider claim nodes inside control-flow subgraphs (default: false)
    pub fn with_enable_on_subgraphs(mut self, enable: bool) -> Self {
        self.enable_on_subgraphs = enable;
        self
    }

    /// Register only on devices with an Apple Neural Engine; elsewhere
    /// registration silently does nothing (default: false)
    pub fn with_only_enable_for_devices_with_ane(mut self, enable: bool) -> Self {
        self.only_enable_for_devices_with_ane = enable;
        self
    }

    /// Only take nodes whose inputs have static shapes (default: false)
    pub fn with_only_allow_static_input_shapes(mut self, enable: bool) -> Self {
        self.only_allow_static_input_shapes = enable;
        self
    }

    /// Create an MLProgram instead of a NeuralNetwork model. Requires Core ML 5.
    pub fn with_create_ml_program(mut self, enable: bool) -> Self {
        self.create_ml_program = enable;
        self
    }

    // ----- setters -----

    pub fn set_compute_units(&mut self, units: CoreMLComputeUnits) {
        self.compute_units = units;
    }

    #[deprecated(note = "use `set_compute_units(CoreMLComputeUnits::CpuOnly)`")]
    pub fn set_use_cpu_only(&mut self, enable: bool) {
        self.use_cpu_only = enable;
    }

    #[deprecated(note = "use `set_compute_units(CoreMLComputeUnits::CpuAndGpu)`")]
    pub fn set_use_cpu_and_gpu(&mut self, enable: bool) {
        self.use_cpu_and_gpu = enable;
    }

    pub fn set_enable_on_subgraphs(&mut self, enable: bool) {
        self.enable_on_subgraphs = enable;
    }

    pub fn set_only_enable_for_devices_with_ane(&mut self, enable: bool) {
        self.only_enable_for_devices_with_ane = enable;
    }

    pub fn set_only_allow_static_input_shapes(&mut self, enable: bool) {
        self.only_allow_static_input_shapes = enable;
    }

    pub fn set_create_ml_program(&mut self, enable: bool) {
        self.create_ml_program = enable;
    }

    // ----- getters -----

    pub fn compute_units(&self) -> CoreMLComputeUnits {
        self.compute_units
    }

    pub fn use_cpu_only(&self) -> bool {
        self.use_cpu_only
    }

    pub fn use_cpu_and_gpu(&self) -> bool {
        self.use_cpu_and_gpu
    }

    pub fn enable_on_subgraphs(&self) -> bool {
        self.enable_on_subgraphs
    }

    pub fn only_enable_for_devices_with_ane(&self) -> bool {
        self.only_enable_for_devices_with_ane
    }

    pub fn only_allow_static_input_shapes(&self) -> bool {
        self.only_allow_static_input_shapes
    }

    pub fn create_ml_program(&self) -> bool {
        self.create_ml_program
    }

    /// Resolve the deprecated flags into one effective compute-units value.
    ///
    /// - both legacy flags set: [`RegistrationError::ConfigurationConflict`]
    /// - `compute_units` left at `All`: `use_cpu_only` gives `CpuOnly`,
    ///   `use_cpu_and_gpu` gives `CpuAndGpu`
    /// - any other `compute_units` wins over the legacy flags
    ///
    /// `self` is not modified.
    pub fn normalize(&self) -> Result<NormalizedCoreMLOptions> {
        if self.use_cpu_only && self.use_cpu_and_gpu {
            return Err(RegistrationError::ConfigurationConflict(
                "deprecated use_cpu_only and use_cpu_and_gpu are mutually exclusive; \
                 set compute_units instead"
                    .to_string(),
            ));
        }

        let legacy = if self.use_cpu_only {
            Some(CoreMLComputeUnits::CpuOnly)
        } else if self.use_cpu_and_gpu {
            Some(CoreMLComputeUnits::CpuAndGpu)
        } else {
            None
        };

        let compute_units = match (self.compute_units, legacy) {
            (CoreMLComputeUnits::All, Some(mapped)) => {
                log::warn!(
                    "Deprecated CoreML legacy flag in use, mapped to compute units {}",
                    mapped
                );
                mapped
            }
            (explicit, Some(mapped)) => {
                log::warn!(
                    "Ignoring deprecated CoreML legacy flag ({}); \
                     compute units explicitly set to {}",
                    mapped,
                    explicit
                );
                explicit
            }
            (explicit, None) => explicit,
        };

        let normalized = NormalizedCoreMLOptions {
            compute_units,
            enable_on_subgraphs: self.enable_on_subgraphs,
            only_enable_for_devices_with_ane: self.only_enable_for_devices_with_ane,
            only_allow_static_input_shapes: self.only_allow_static_input_shapes,
            create_ml_program: self.create_ml_program,
        };
        log::debug!("Normalized CoreML options: {:?}", normalized);

        Ok(normalized)
    }
}

/// Validated snapshot of [`CoreMLExecutionProviderOptions`] with the legacy
/// flags resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NormalizedCoreMLOptions {
    compute_units: CoreMLComputeUnits,
    enable_on_subgraphs: bool,
    only_enable_for_devices_with_ane: bool,
    only_allow_static_input_shapes: bool,
    create_ml_program: bool,
}

impl NormalizedCoreMLOptions {
    pub fn compute_units(&self) -> CoreMLComputeUnits {
        self.compute_units
    }

    pub fn enable_on_subgraphs(&self) -> bool {
        self.enable_on_subgraphs
    }

    pub fn only_enable_for_devices_with_ane(&self) -> bool {
        self.only_enable_for_devices_with_ane
    }

    pub fn only_allow_static_input_shapes(&self) -> bool {
        self.only_allow_static_input_shapes
    }

    pub fn create_ml_program(&self) -> bool {
        self.create_ml_program
    }

    pub fn model_format(&self) -> CoreMLModelFormat {
        if self.create_ml_program {
            CoreMLModelFormat::MLProgram
        } else {
            CoreMLModelFormat::NeuralNetwork
        }
    }

    /// Legacy `CoreMLFlags` bitmask.
    ///
    /// `CpuAndNeuralEngine` has no flag; it is carried only by the
    /// `MLComputeUnits` option.
    pub fn coreml_flags(&self) -> u32 {
        let mut flags = match self.compute_units {
            CoreMLComputeUnits::CpuOnly => COREML_FLAG_USE_CPU_ONLY,
            CoreMLComputeUnits::CpuAndGpu => COREML_FLAG_USE_CPU_AND_GPU,
            CoreMLComputeUnits::All | CoreMLComputeUnits::CpuAndNeuralEngine => {
                COREML_FLAG_USE_NONE
            }
        };
        if self.enable_on_subgraphs {
            flags |= COREML_FLAG_ENABLE_ON_SUBGRAPH;
        }
        if self.only_enable_for_devices_with_ane {
            flags |= COREML_FLAG_ONLY_ENABLE_DEVICE_WITH_ANE;
        }
        if self.only_allow_static_input_shapes {
            flags |= COREML_FLAG_ONLY_ALLOW_STATIC_INPUT_SHAPES;
        }
        if self.create_ml_program {
            flags |= COREML_FLAG_CREATE_MLPROGRAM;
        }
        flags
    }

    /// Serialize into the engine's provider-options map
    pub fn to_provider_config(&self) -> ProviderConfig {
        let mut config = ProviderConfig::new();
        config.set(ML_COMPUTE_UNITS, self.compute_units.engine_value());
        config.set(MODEL_FORMAT, self.model_format().as_str());
        config.set(ENABLE_ON_SUBGRAPHS, option_flag(self.enable_on_subgraphs));
        config.set(REQUIRE_STATIC_INPUT_SHAPES, option_flag(self.only_allow_static_input_shapes));
        config.set(ONLY_ENABLE_DEVICE_WITH_ANE, option_flag(self.only_enable_for_devices_with_ane));
        config.set(COREML_FLAGS, self.coreml_flags());
        config
    }

    /// Parse an options map produced by [`Self::to_provider_config`]. Missing keys take defaults.
    pub fn from_provider_config(config: &ProviderConfig) -> Result<Self> {
        let compute_units: CoreMLComputeUnits = config
            .get(ML_COMPUTE_UNITS)
            .map(str::parse::<CoreMLComputeUnits>)
            .transpose()?
            .unwrap_or_default();

        let create_ml_program = match config.get(MODEL_FORMAT) {
            None | Some(MODEL_FORMAT_NEURAL_NETWORK) => false,
            Some(MODEL_FORMAT_ML_PROGRAM) => true,
            Some(other) => {
                return Err(RegistrationError::InvalidConfig(format!(
                    "unknown {} {:?}",
                    MODEL_FORMAT, other
                )))
            }
        };

        Ok(Self {
            compute_units,
            enable_on_subgraphs: parse_flag(config, ENABLE_ON_SUBGRAPHS)?,
            only_enable_for_devices_with_ane: parse_flag(config, ONLY_ENABLE_DEVICE_WITH_ANE)?,
            only_allow_static_input_shapes: parse_flag(config, REQUIRE_STATIC_INPUT_SHAPES)?,
            create_ml_program,
        })
    }
}

fn option_flag(enable: bool) -> &'static str {
    if enable {
        OPTION_TRUE
    } else {
        OPTION_FALSE
    }
}

fn parse_flag(config: &ProviderConfig, key: &str) -> Result<bool> {
    match config.get(key) {
        None => Ok(false),
        Some(OPTION_TRUE) | Some("true") => Ok(true),
        Some(OPTION_FALSE) | Some("false") => Ok(false),
        Some(other) => Err(RegistrationError::InvalidConfig(format!(
            "{} expects 0 or 1, got {:?}",
            key, other
        ))),
    }
}

/// Whether the CoreML execution provider can be used on this system.
///
/// Pure query: true on Apple platforms whose Core ML version could be
/// determined. Never fails; anything uncertain reports `false`.
pub fn is_coreml_execution_provider_available() -> bool {
    is_apple_platform() && detect_coreml_version() >= MIN_COREML_VERSION
}

#[derive(Debug, Clone)]
pub struct CoreMLExecutionProvider {
    config: ProviderConfig,
}

impl_provider_base!(
    CoreMLExecutionProvider,
    PROVIDER_NAME_COREML,
    BackendType::CoreML
);

impl CoreMLExecutionProvider {
    pub fn from_options(options: &NormalizedCoreMLOptions) -> Self {
        Self {
            config: options.to_provider_config(),
        }
    }

    /// Options this provider was built from
    pub fn options(&self) -> Result<NormalizedCoreMLOptions> {
        NormalizedCoreMLOptions::from_provider_config(&self.config)
    }
}

impl ExecutionProvider for CoreMLExecutionProvider {
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
        is_apple_platform()
    }

    fn is_available(&self) -> Result<bool> {
        Ok(is_coreml_execution_provider_available())
    }
}
