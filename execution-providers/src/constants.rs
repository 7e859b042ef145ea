//! Configuration key constants for the execution providers
//!
//! Keys and values of the engine's provider-options map, kept here to avoid
//! string literals throughout the codebase.

use coreml_ep_hardware::PlatformVersion;

// ============================================================================
// Provider Names
// ============================================================================

pub const PROVIDER_NAME_COREML: &str = "CoreMLExecutionProvider";
pub const PROVIDER_NAME_CPU: &str = "CPUExecutionProvider";

// ============================================================================
// CPU Execution Provider
// ============================================================================

pub const ENABLE_CPU_MEM_ARENA: &str = "enable_cpu_mem_arena";

// ============================================================================
// CoreML Execution Provider
// ============================================================================

pub const ML_COMPUTE_UNITS: &str = "MLComputeUnits";
pub const MODEL_FORMAT: &str = "ModelFormat";
pub const ENABLE_ON_SUBGRAPHS: &str = "EnableOnSubgraphs";
pub const REQUIRE_STATIC_INPUT_SHAPES: &str = "RequireStaticInputShapes";
pub const ONLY_ENABLE_DEVICE_WITH_ANE: &str = "OnlyEnableDeviceWithANE";
pub const COREML_FLAGS: &str = "CoreMLFlags";

// MLComputeUnits values
pub const COMPUTE_UNITS_ALL: &str = "ALL";
pub const COMPUTE_UNITS_CPU_ONLY: &str = "CPUOnly";
pub const COMPUTE_UNITS_CPU_AND_GPU: &str = "CPUAndGPU";
pub const COMPUTE_UNITS_CPU_AND_NEURAL_ENGINE: &str = "CPUAndNeuralEngine";

// ModelFormat values
pub const MODEL_FORMAT_ML_PROGRAM: &str = "MLProgram";
pub const MODEL_FORMAT_NEURAL_NETWORK: &str = "NeuralNetwork";

pub const OPTION_TRUE: &str = "1";
pub const OPTION_FALSE: &str = "0";

// Legacy CoreMLFlags bitmask
pub const COREML_FLAG_USE_NONE: u32 = 0x000;
pub const COREML_FLAG_USE_CPU_ONLY: u32 = 0x001;
pub const COREML_FLAG_ENABLE_ON_SUBGRAPH: u32 = 0x002;
pub const COREML_FLAG_ONLY_ENABLE_DEVICE_WITH_ANE: u32 = 0x004;
pub const COREML_FLAG_ONLY_ALLOW_STATIC_INPUT_SHAPES: u32 = 0x008;
pub const COREML_FLAG_CREATE_MLPROGRAM: u32 = 0x010;
pub const COREML_FLAG_USE_CPU_AND_GPU: u32 = 0x020;

/// MLProgram models need Core ML 5 (macOS 12, iOS 15).
pub const MIN_COREML_VERSION_FOR_ML_PROGRAM: PlatformVersion = PlatformVersion::major(5);

/// Oldest Core ML release the provider can target at all.
pub const MIN_COREML_VERSION: PlatformVersion = PlatformVersion::major(1);

// ============================================================================
// Engine Status Codes
// ============================================================================

pub const ENGINE_STATUS_INVALID_ARGUMENT: i32 = 2;
pub const ENGINE_STATUS_NOT_IMPLEMENTED: i32 = 9;
pub const ENGINE_STATUS_EP_FAIL: i32 = 11;
