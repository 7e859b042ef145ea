//! Bridge between a finalized provider list and `ort` execution providers
//!
//! Converts our engine-agnostic providers into `ort` dispatch values for
//! `ort::session::SessionBuilder::with_execution_providers`.

use ort::execution_providers::coreml::{
    CoreMLComputeUnits as OrtComputeUnits, CoreMLModelFormat as OrtModelFormat,
};
use ort::execution_providers::{
    CPUExecutionProvider as OrtCPU, CoreMLExecutionProvider as OrtCoreML,
};

use crate::cpu::cpu_mem_arena_enabled;
use crate::{
    BackendType, CoreMLComputeUnits, CoreMLModelFormat, DynExecutionProvider,
    ExecutionProviderDispatch, NormalizedCoreMLOptions, Result,
};

/// Convert every provider of `dispatch`, keeping its priority order.
pub fn bridge_to_ort(
    dispatch: &ExecutionProviderDispatch,
) -> Result<Vec<ort::execution_providers::ExecutionProviderDispatch>> {
    let ort_providers = dispatch
        .providers()
        .iter()
        .map(convert_provider)
        .collect::<Result<Vec<_>>>()?;

    log::info!("Bridged {} providers to ort", ort_providers.len());
    Ok(ort_providers)
}

/// Convert a single execution provider to ort format
fn convert_provider(
    provider: &DynExecutionProvider,
) -> Result<ort::execution_providers::ExecutionProviderDispatch> {
    match provider.backend_type() {
        BackendType::CoreML => {
            let options = NormalizedCoreMLOptions::from_provider_config(provider.config())?;

            let compute_units = match options.compute_units() {
                CoreMLComputeUnits::All => OrtComputeUnits::All,
                CoreMLComputeUnits::CpuOnly => OrtComputeUnits::CPUOnly,
                CoreMLComputeUnits::CpuAndGpu => OrtComputeUnits::CPUAndGPU,
                CoreMLComputeUnits::CpuAndNeuralEngine => OrtComputeUnits::CPUAndNeuralEngine,
            };
            let model_format = match options.model_format() {
                CoreMLModelFormat::MLProgram => OrtModelFormat::MLProgram,
                CoreMLModelFormat::NeuralNetwork => OrtModelFormat::NeuralNetwork,
            };

            let coreml = OrtCoreML::default()
                .with_compute_units(compute_units)
                .with_model_format(model_format)
                .with_subgraphs(options.enable_on_subgraphs())
                .with_static_input_shapes(options.only_allow_static_input_shapes());

            log::debug!(
                "Configured CoreML provider ({}, {})",
                options.compute_units(),
                options.model_format()
            );
            Ok(coreml.build())
        }

        BackendType::CPU => {
            let arena = cpu_mem_arena_enabled(provider.config())?;
            log::debug!("Configured CPU provider (memory arena: {})", arena);
            Ok(OrtCPU::default().with_arena_allocator(arena).build())
        }
    }
}

