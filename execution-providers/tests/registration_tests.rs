//! Registration contract tests against a fake engine.

#![allow(deprecated)]

use std::sync::{Arc, Mutex};

use coreml_ep::constants::*;
use coreml_ep::*;

#[derive(Debug)]
struct FakeEngine {
    version: PlatformVersion,
    accelerator: bool,
    failure: Option<EngineError>,
    appended: Mutex<Vec<(SessionHandle, BackendType, ProviderConfig)>>,
}

impl FakeEngine {
    fn new() -> Self {
        Self {
            version: PlatformVersion::major(7),
            accelerator: true,
            failure: None,
            appended: Mutex::new(Vec::new()),
        }
    }

    fn with_version(mut self, version: PlatformVersion) -> Self {
        self.version = version;
        self
    }

    fn without_accelerator(mut self) -> Self {
        self.accelerator = false;
        self
    }

    fn failing(mut self, code: i32, message: &str) -> Self {
        self.failure = Some(EngineError::new(code, message));
        self
    }

    fn append_calls(&self) -> usize {
        self.appended.lock().unwrap().len()
    }
}

impl EngineProviderBackend for FakeEngine {
    fn append_provider(
        &self,
        session: SessionHandle,
        kind: BackendType,
        options: &ProviderConfig,
    ) -> EngineResult<()> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.appended
            .lock()
            .unwrap()
            .push((session, kind, options.clone()));
        Ok(())
    }

    fn query_accelerator_available(&self) -> bool {
        self.accelerator
    }

    fn platform_version(&self) -> PlatformVersion {
        self.version
    }
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn registrar(engine: FakeEngine) -> (ProviderRegistrar, Arc<FakeEngine>) {
    let engine = Arc::new(engine);
    (ProviderRegistrar::new(engine.clone()), engine)
}

fn conflicting_options() -> CoreMLExecutionProviderOptions {
    CoreMLExecutionProviderOptions::new()
        .with_use_cpu_only(true)
        .with_use_cpu_and_gpu(true)
}

#[test]
fn test_register_appends_one_provider() {
    init();
    let (registrar, engine) = registrar(FakeEngine::new());
    let mut session = SessionConfig::new();

    registrar
        .register(&CoreMLExecutionProviderOptions::new(), &mut session)
        .unwrap();

    assert_eq!(session.provider_count(), 1);
    assert_eq!(session.providers()[0].backend_type(), BackendType::CoreML);
    assert_eq!(engine.append_calls(), 1);

    let appended = engine.appended.lock().unwrap();
    let (handle, kind, config) = &appended[0];
    assert_eq!(*handle, session.handle());
    assert_eq!(*kind, BackendType::CoreML);
    assert_eq!(config.get(ML_COMPUTE_UNITS), Some("ALL"));
}

#[test]
fn test_engine_receives_normalized_legacy_flag() {
    init();
    let (registrar, engine) = registrar(FakeEngine::new());
    let mut session = SessionConfig::new();

    let options = CoreMLExecutionProviderOptions::new().with_use_cpu_and_gpu(true);
    registrar.register(&options, &mut session).unwrap();

    let appended = engine.appended.lock().unwrap();
    assert_eq!(appended[0].2.get(ML_COMPUTE_UNITS), Some("CPUAndGPU"));
    // Caller's object keeps its own view
    assert_eq!(options.compute_units(), CoreMLComputeUnits::All);
}

#[test]
fn test_conflicting_legacy_flags_leave_session_unchanged() {
    init();
    let (registrar, engine) = registrar(FakeEngine::new());
    let mut session = SessionConfig::new();
    registrar
        .register_provider(CPUExecutionProvider::new().build(), &mut session)
        .unwrap();
    let before = session.provider_count();

    let err = registrar.register(&conflicting_options(), &mut session).unwrap_err();

    assert_eq!(err.code(), ErrorCode::ConfigurationConflict);
    assert_eq!(session.provider_count(), before);
    assert_eq!(engine.append_calls(), 1);
}

#[test]
fn test_failure_is_repeatable() {
    init();
    let (registrar, _engine) = registrar(FakeEngine::new());
    let mut session = SessionConfig::new();

    let first = registrar.register(&conflicting_options(), &mut session).unwrap_err();
    let second = registrar.register(&conflicting_options(), &mut session).unwrap_err();

    assert_eq!(first.code(), second.code());
    assert_eq!(first, second);
    assert_eq!(session.provider_count(), 0);
}

#[test]
fn test_ml_program_below_minimum_version() {
    init();
    let (registrar, engine) =
        registrar(FakeEngine::new().with_version(PlatformVersion::new(4, 1, 0)));
    let mut session = SessionConfig::new();

    let options = CoreMLExecutionProviderOptions::new().with_create_ml_program(true);
    let err = registrar.register(&options, &mut session).unwrap_err();

    assert_eq!(
        err,
        RegistrationError::UnsupportedPlatformVersion {
            feature: "MLProgram".to_string(),
            required: PlatformVersion::major(5),
            actual: PlatformVersion::new(4, 1, 0),
        }
    );
    assert_eq!(err.code(), ErrorCode::UnsupportedPlatformVersion);
    assert_eq!(session.provider_count(), 0);
    assert_eq!(engine.append_calls(), 0);
}

#[test]
fn test_ml_program_on_unknown_version_fails() {
    init();
    let (registrar, _engine) = registrar(FakeEngine::new().with_version(PlatformVersion::UNKNOWN));
    let mut session = SessionConfig::new();

    let options = CoreMLExecutionProviderOptions::new().with_create_ml_program(true);
    assert_eq!(
        registrar.register(&options, &mut session).unwrap_err().code(),
        ErrorCode::UnsupportedPlatformVersion
    );
}

#[test]
fn test_ml_program_at_minimum_version() {
    init();
    let (registrar, engine) = registrar(FakeEngine::new().with_version(PlatformVersion::major(5)));
    let mut session = SessionConfig::new();

    let options = CoreMLExecutionProviderOptions::new().with_create_ml_program(true);
    registrar.register(&options, &mut session).unwrap();

    assert_eq!(session.provider_count(), 1);
    assert_eq!(engine.appended.lock().unwrap()[0].2.get(MODEL_FORMAT), Some("MLProgram"));
}

#[test]
fn test_neural_network_ignores_platform_version() {
    init();
    let (registrar, _engine) = registrar(FakeEngine::new().with_version(PlatformVersion::major(1)));
    let mut session = SessionConfig::new();

    registrar
        .register(&CoreMLExecutionProviderOptions::new(), &mut session)
        .unwrap();
    assert_eq!(session.provider_count(), 1);
}

#[test]
fn test_ane_only_without_accelerator_is_silent_no_op() {
    init();
    let (registrar, engine) = registrar(FakeEngine::new().without_accelerator());
    let mut session = SessionConfig::new();

    let options = CoreMLExecutionProviderOptions::new().with_only_enable_for_devices_with_ane(true);
    registrar.register(&options, &mut session).unwrap();

    assert_eq!(session.provider_count(), 0);
    assert_eq!(engine.append_calls(), 0);
}

#[test]
fn test_ane_only_with_accelerator_registers() {
    init();
    let (registrar, _engine) = registrar(FakeEngine::new());
    let mut session = SessionConfig::new();

    let options = CoreMLExecutionProviderOptions::new().with_only_enable_for_devices_with_ane(true);
    registrar.register(&options, &mut session).unwrap();

    assert_eq!(session.provider_count(), 1);
}

#[test]
fn test_conflict_reported_before_ane_no_op() {
    init();
    let (registrar, engine) = registrar(FakeEngine::new().without_accelerator());
    let mut session = SessionConfig::new();

    let options = conflicting_options().with_only_enable_for_devices_with_ane(true);
    let err = registrar.register(&options, &mut session).unwrap_err();

    assert_eq!(err.code(), ErrorCode::ConfigurationConflict);
    assert_eq!(session.provider_count(), 0);
    assert_eq!(engine.append_calls(), 0);
}

#[test]
fn test_version_reported_before_ane_no_op() {
    init();
    let (registrar, engine) = registrar(
        FakeEngine::new()
            .without_accelerator()
            .with_version(PlatformVersion::major(4)),
    );
    let mut session = SessionConfig::new();

    let options = CoreMLExecutionProviderOptions::new()
        .with_create_ml_program(true)
        .with_only_enable_for_devices_with_ane(true);
    let err = registrar.register(&options, &mut session).unwrap_err();

    assert_eq!(err.code(), ErrorCode::UnsupportedPlatformVersion);
    assert_eq!(session.provider_count(), 0);
    assert_eq!(engine.append_calls(), 0);
}

#[test]
fn test_accelerator_flag_ignored_when_not_requested() {
    init();
    let (registrar, _engine) = registrar(FakeEngine::new().without_accelerator());
    let mut session = SessionConfig::new();

    registrar
        .register(&CoreMLExecutionProviderOptions::new(), &mut session)
        .unwrap();
    assert_eq!(session.provider_count(), 1);
}

#[test]
fn test_engine_failure_is_wrapped() {
    init();
    let (registrar, _engine) =
        registrar(FakeEngine::new().failing(ENGINE_STATUS_EP_FAIL, "CoreML EP unavailable"));
    let mut session = SessionConfig::new();

    let err = registrar
        .register(&CoreMLExecutionProviderOptions::new(), &mut session)
        .unwrap_err();

    assert_eq!(
        err,
        RegistrationError::EngineRegistrationFailed {
            code: ENGINE_STATUS_EP_FAIL,
            message: "CoreML EP unavailable".to_string(),
        }
    );
    assert_eq!(err.code(), ErrorCode::EngineRegistrationFailed);
    assert_eq!(session.provider_count(), 0);
}

#[test]
fn test_registration_order_is_priority_order() {
    init();
    let (registrar, _engine) = registrar(FakeEngine::new());
    let mut session = SessionConfig::new();

    let a = CoreMLExecutionProviderOptions::new()
        .with_compute_units(CoreMLComputeUnits::CpuAndNeuralEngine);
    let b = CoreMLExecutionProviderOptions::new().with_compute_units(CoreMLComputeUnits::CpuOnly);
    registrar.register(&a, &mut session).unwrap();
    registrar.register(&b, &mut session).unwrap();

    let dispatch = session.finalize();
    let units: Vec<_> = dispatch
        .providers()
        .iter()
        .map(|p| p.config().get(ML_COMPUTE_UNITS).unwrap().to_string())
        .collect();
    assert_eq!(units, vec!["CPUAndNeuralEngine", "CPUOnly"]);
}

#[test]
fn test_finalized_session_rejects_everything() {
    init();
    let (registrar, engine) = registrar(FakeEngine::new());
    let mut session = SessionConfig::new();
    registrar
        .register(&CoreMLExecutionProviderOptions::new(), &mut session)
        .unwrap();
    session.finalize();

    let valid = registrar
        .register(&CoreMLExecutionProviderOptions::new(), &mut session)
        .unwrap_err();
    let conflicting = registrar.register(&conflicting_options(), &mut session).unwrap_err();
    let cpu = registrar
        .register_provider(CPUExecutionProvider::new().build(), &mut session)
        .unwrap_err();

    assert_eq!(valid, RegistrationError::SessionAlreadyFinalized);
    assert_eq!(conflicting, RegistrationError::SessionAlreadyFinalized);
    assert_eq!(cpu, RegistrationError::SessionAlreadyFinalized);
    assert_eq!(session.provider_count(), 1);
    assert_eq!(engine.append_calls(), 1);
}

#[test]
fn test_cpu_fallback_goes_last() {
    init();
    let (registrar, _engine) = registrar(FakeEngine::new());
    let mut session = SessionConfig::new();

    registrar
        .register(&CoreMLExecutionProviderOptions::new(), &mut session)
        .unwrap();
    registrar
        .register_provider(CPUExecutionProvider::new().build(), &mut session)
        .unwrap();

    let dispatch = session.dispatch_order();
    assert_eq!(dispatch.priority_of(PROVIDER_NAME_COREML), Some(0));
    assert_eq!(dispatch.priority_of(PROVIDER_NAME_CPU), Some(1));
}

#[test]
fn test_cpu_arena_switch_reaches_engine() {
    init();
    let (registrar, engine) = registrar(FakeEngine::new());
    let mut session = SessionConfig::new();

    registrar
        .register_provider(
            CPUExecutionProvider::new().with_enable_cpu_mem_arena(false).build(),
            &mut session,
        )
        .unwrap();

    let appended = engine.appended.lock().unwrap();
    assert_eq!(appended[0].1, BackendType::CPU);
    assert_eq!(appended[0].2.get(ENABLE_CPU_MEM_ARENA), Some("false"));
}

#[test]
fn test_system_registrar_rejects_bad_cpu_arena_value() {
    #[derive(Debug)]
    struct RawCpu(ProviderConfig);

    impl ExecutionProvider for RawCpu {
        fn name(&self) -> &'static str {
            PROVIDER_NAME_CPU
        }
        fn backend_type(&self) -> BackendType {
            BackendType::CPU
        }
        fn config(&self) -> &ProviderConfig {
            &self.0
        }
        fn supported_by_platform(&self) -> bool {
            true
        }
        fn is_available(&self) -> Result<bool> {
            Ok(true)
        }
    }

    init();
    let mut config = ProviderConfig::new();
    config.set(ENABLE_CPU_MEM_ARENA, "not-a-bool");
    let mut session = SessionConfig::new();

    let err = ProviderRegistrar::system()
        .register_provider(Arc::new(RawCpu(config)), &mut session)
        .unwrap_err();

    assert_eq!(
        err.code(),
        ErrorCode::EngineRegistrationFailed,
        "unexpected error: {err}"
    );
    assert_eq!(session.provider_count(), 0);
}

#[test]
fn test_system_registrar_matches_platform() {
    init();
    let mut session = SessionConfig::new();
    let result =
        append_coreml_execution_provider(&mut session, &CoreMLExecutionProviderOptions::new());

    #[cfg(not(any(target_os = "macos", target_os = "ios")))]
    {
        assert_eq!(result.unwrap_err().code(), ErrorCode::EngineRegistrationFailed);
        assert_eq!(session.provider_count(), 0);
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    {
        result.unwrap();
        assert_eq!(session.provider_count(), 1);
    }
}

#[test]
fn test_errors_serialize_with_type_tag() {
    let json = serde_json::to_value(RegistrationError::SessionAlreadyFinalized).unwrap();
    assert_eq!(json["type"], "SessionAlreadyFinalized");

    let json = serde_json::to_value(RegistrationError::EngineRegistrationFailed {
        code: 1,
        message: "boom".into(),
    })
    .unwrap();
    assert_eq!(json["type"], "EngineRegistrationFailed");
    assert_eq!(json["details"]["code"], 1);
}
