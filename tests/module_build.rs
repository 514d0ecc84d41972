use proptest::prelude::*;

use swerve_config::conversion::{self, ConversionFactors, ConversionFactorsDescriptor};
use swerve_config::descriptor::{
    DeviceDescriptor, LocationDescriptor, ModuleDescriptor, MotorInversion, PidfConfig,
};
use swerve_config::encoder::AnalogEncoder;
use swerve_config::hardware::{
    DeviceClass, DeviceProvider, DeviceStatus, FeedbackSensor, MotorConfig, MotorFamily,
    MotorHandle, MotorPort, MotorRole, SensorConfig, SensorPort, Signal, SimulatedBus,
};
use swerve_config::module::round_half_up;
use swerve_config::{
    AbsoluteEncoder, Advisory, AlertBoard, ConfigError, ModuleConfigBuilder, OffsetOutcome,
    PhysicalCharacteristics, RetryState, RetryingConfigurator,
};

const MODULE_JSON: &str = r#"{
    "drive": { "type": "sparkmax", "id": 10 },
    "angle": { "type": "sparkmax", "id": 11 },
    "encoder": { "type": "attached", "id": 11 },
    "inverted": { "drive": false, "angle": true },
    "absoluteEncoderOffset": 87.5,
    "location": { "front": 10.75, "left": -10.75 },
    "conversionFactors": {
        "angle": { "gearRatio": 1 },
        "drive": { "gearRatio": 6.75, "diameter": 4 }
    }
}"#;

fn module(encoder: &str, front: f64, left: f64, factors: ConversionFactorsDescriptor) -> ModuleDescriptor {
    ModuleDescriptor {
        drive: DeviceDescriptor::new("sparkmax", 1),
        angle: DeviceDescriptor::new("sparkmax", 2),
        encoder: Some(DeviceDescriptor::new(encoder, 3)),
        inverted: MotorInversion::default(),
        absolute_encoder_offset: 0.0,
        absolute_encoder_inverted: false,
        location: LocationDescriptor { front, left },
        conversion_factors: factors,
        use_cosine_compensator: true,
    }
}

fn build(
    descriptor: ModuleDescriptor,
    physical: &PhysicalCharacteristics,
) -> swerve_config::Result<swerve_config::SwerveModuleConfiguration> {
    let mut bus = SimulatedBus::new();
    ModuleConfigBuilder::new(&mut bus, AlertBoard::new()).build(
        descriptor,
        PidfConfig::default(),
        PidfConfig::default(),
        physical,
        "module.json",
    )
}

#[test]
fn test_json_module_gear_ratio_one_binds_encoder() {
    let descriptor: ModuleDescriptor = serde_json::from_str(MODULE_JSON).unwrap();
    let module = build(descriptor, &PhysicalCharacteristics::default()).unwrap();

    assert_eq!(module.name(), "module");
    assert_eq!(module.conversion_factors().angle, 360.0);
    assert!(module.angle_feedback_from_encoder());
    assert_eq!(
        module.angle_motor().feedback_sensor(),
        FeedbackSensor::AbsoluteEncoder
    );
    // 10.75 in rounds to 11 in, -10.75 to -11
    assert!((module.location().front - 0.2794).abs() < 1e-12);
    assert!((module.location().left + 0.2794).abs() < 1e-12);
    assert!(module.angle_motor_inverted());
    assert_eq!(module.absolute_encoder_offset(), 87.5);
}

#[test]
fn test_fallback_drive_with_module_angle() {
    let physical =
        PhysicalCharacteristics::with_conversion_factors(ConversionFactorsDescriptor::literal(0.05, 0.1));
    let module = build(
        module("cancoder", 12.0, 12.0, ConversionFactorsDescriptor::literal(0.0, 0.2)),
        &physical,
    )
    .unwrap();
    assert_eq!(module.conversion_factors().drive, 0.05);
    assert_eq!(module.conversion_factors().angle, 0.2);
}

#[test]
fn test_no_factor_anywhere() {
    let err = build(
        module("cancoder", 12.0, 12.0, ConversionFactorsDescriptor::default()),
        &PhysicalCharacteristics::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::NoConversionFactor { .. }));
}

#[test]
fn test_analog_offset_is_unsupported_without_hardware_write() {
    let mut bus = SimulatedBus::new();
    let board = AlertBoard::new();
    let motor = MotorHandle::open(
        &mut bus,
        MotorFamily::SparkMax,
        7,
        "",
        MotorRole::Angle,
        &PhysicalCharacteristics::default(),
        board.clone(),
    );
    let mut encoder = AnalogEncoder::attach(&motor, 3.3, board.clone()).unwrap();

    let device = bus.device(DeviceClass::Motor, 7, "");
    let before = device.borrow().apply_attempts;
    assert_eq!(encoder.set_offset(42.0), OffsetOutcome::Unsupported);
    assert_eq!(device.borrow().apply_attempts, before);
    assert!(board.any_active_containing("SparkMax Analog Sensors do not support integrated offsets"));
}

#[test]
fn test_failing_motor_is_retried_five_times() {
    let mut bus = SimulatedBus::new();
    let board = AlertBoard::new();
    let motor = MotorHandle::open(
        &mut bus,
        MotorFamily::SparkMax,
        8,
        "",
        MotorRole::Angle,
        &PhysicalCharacteristics::default(),
        board.clone(),
    );
    let device = bus.device(DeviceClass::Motor, 8, "");
    device.borrow_mut().fail_always = true;
    let before = device.borrow().apply_attempts;

    let state = motor.bind_absolute_encoder(FeedbackSensor::AbsoluteEncoder);
    assert_eq!(state, RetryState::Exhausted { attempts: 5 });
    assert_eq!(device.borrow().apply_attempts - before, 5);
    assert!(board.any_active_containing("motor 8"));
}

/// Controllers that accept configuration but never finish a factory reset
struct ResetRefusingBus;

struct ResetRefusingPort;

impl MotorPort for ResetRefusingPort {
    fn apply(&mut self, _config: &MotorConfig) -> DeviceStatus {
        DeviceStatus::Ok
    }

    fn restore_factory_defaults(&mut self) -> DeviceStatus {
        DeviceStatus::Timeout
    }

    fn clear_sticky_faults(&mut self) -> DeviceStatus {
        DeviceStatus::Ok
    }

    fn read(&self, _signal: Signal) -> f64 {
        0.0
    }
}

impl SensorPort for ResetRefusingPort {
    fn apply(&mut self, _config: &SensorConfig) -> DeviceStatus {
        DeviceStatus::Ok
    }

    fn restore_factory_defaults(&mut self) -> DeviceStatus {
        DeviceStatus::Timeout
    }

    fn clear_sticky_faults(&mut self) -> DeviceStatus {
        DeviceStatus::Ok
    }

    fn read(&self, _signal: Signal) -> f64 {
        0.0
    }
}

impl DeviceProvider for ResetRefusingBus {
    fn open_motor(&mut self, _family: MotorFamily, _id: u8, _canbus: &str) -> Box<dyn MotorPort> {
        Box::new(ResetRefusingPort)
    }

    fn open_sensor(&mut self, _id: u8, _canbus: &str) -> Box<dyn SensorPort> {
        Box::new(ResetRefusingPort)
    }
}

#[test]
fn test_failed_factory_reset_outlives_successful_writes() {
    let board = AlertBoard::new();
    let module = ModuleConfigBuilder::new(&mut ResetRefusingBus, board.clone())
        .build(
            module("cancoder", 12.0, 12.0, ConversionFactorsDescriptor::literal(0.05, 16.8)),
            PidfConfig::default(),
            PidfConfig::default(),
            &PhysicalCharacteristics::default(),
            "frontleft.json",
        )
        .unwrap();

    assert_eq!(module.name(), "frontleft");
    assert!(board.any_active_containing("Failure restoring factory defaults on motor 1"));
    assert!(board.any_active_containing("Failure restoring factory defaults on motor 2"));
    assert!(!board.any_active_containing("Failure configuring"));

    let (_, _, encoder) = module.into_parts();
    let mut encoder = encoder.unwrap();
    encoder.factory_default();
    encoder.configure(false);
    assert!(board.any_active_containing("Failure restoring CANcoder 3 factory defaults"));
}

fn any_factor() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 0.001f64..500.0]
}

fn any_encoder() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("none"),
        Just("sparkmax_analog"),
        Just("attached"),
        Just("cancoder"),
    ]
}

proptest! {
    #[test]
    fn prop_centered_module_always_rejected(
        encoder in any_encoder(),
        drive in any_factor(),
        angle in any_factor(),
    ) {
        let err = build(
            module(encoder, 0.0, 0.0, ConversionFactorsDescriptor::literal(drive, angle)),
            &PhysicalCharacteristics::default(),
        )
        .unwrap_err();
        prop_assert!(
            matches!(err, ConfigError::ImproperModuleLocation { ref module } if module == "module"),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn prop_module_axis_beats_fallback(
        module_drive in any_factor(),
        module_angle in any_factor(),
        fallback_drive in 0.001f64..10.0,
        fallback_angle in 0.001f64..500.0,
    ) {
        prop_assume!(module_drive > 0.0 || module_angle > 0.0);
        let module = ConversionFactors::new(module_drive, module_angle);
        let fallback = ConversionFactors::new(fallback_drive, fallback_angle);

        let r = conversion::resolve(module, Some(fallback), "m").unwrap();
        prop_assert_eq!(r.drive, if module_drive > 0.0 { module_drive } else { fallback_drive });
        prop_assert_eq!(r.angle, if module_angle > 0.0 { module_angle } else { fallback_angle });
    }

    #[test]
    fn prop_resolution_is_idempotent(
        drive in 0.001f64..10.0,
        angle in 0.001f64..500.0,
        fallback_drive in any_factor(),
        fallback_angle in any_factor(),
    ) {
        let module = ConversionFactors::new(drive, angle);
        let fallback = Some(ConversionFactors::new(fallback_drive, fallback_angle));
        let once = conversion::resolve(module, fallback, "m").unwrap();
        let twice = conversion::resolve(
            ConversionFactors::new(once.drive, once.angle),
            fallback,
            "m",
        )
        .unwrap();
        prop_assert_eq!((once.drive, once.angle), (twice.drive, twice.angle));
    }

    #[test]
    fn prop_retry_stops_at_first_success(failures in 0u32..12) {
        let board = AlertBoard::new();
        let advisory = Advisory::warning("Motors", "Failure configuring test motor");
        let configurator = RetryingConfigurator::new(board.clone(), advisory.clone());

        let mut calls = 0u32;
        let state = configurator.run(|| {
            calls += 1;
            if calls > failures { DeviceStatus::Ok } else { DeviceStatus::CanError }
        });

        prop_assert_eq!(calls, (failures + 1).min(5));
        prop_assert_eq!(state.succeeded(), failures < 5);
        prop_assert_eq!(board.is_active(&advisory), failures >= 5);
    }

    #[test]
    fn prop_non_360_angle_never_binds(angle in 0.001f64..1000.0) {
        prop_assume!(angle != 360.0);
        let module = build(
            module("attached", 12.0, -12.0, ConversionFactorsDescriptor::literal(0.05, angle)),
            &PhysicalCharacteristics::default(),
        )
        .unwrap();
        prop_assert!(!module.angle_feedback_from_encoder());
        prop_assert_eq!(module.angle_motor().feedback_sensor(), FeedbackSensor::PrimaryEncoder);
    }

    #[test]
    fn prop_location_rounds_to_whole_inches(front in -60.0f64..60.0, left in 1.0f64..60.0) {
        let module = build(
            module("none", front, left, ConversionFactorsDescriptor::literal(0.05, 16.8)),
            &PhysicalCharacteristics::default(),
        )
        .unwrap();
        let inches = module.location().front / 0.0254;
        prop_assert!((inches - inches.round()).abs() < 1e-9);
        prop_assert!((inches - front).abs() <= 0.5 + 1e-9);
        prop_assert_eq!(round_half_up(front), inches.round());
    }
}
