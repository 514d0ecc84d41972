// Driver-facing types: device families, configuration objects, port traits
//
// A driver library implements MotorPort/SensorPort for its devices and hands
// them out through a DeviceProvider. Every write returns a DeviceStatus that
// the retrying configurator inspects.

use std::str::FromStr;

use serde::Serialize;

use crate::error::ConfigError;

/// Motor controller families understood in module JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorFamily {
    SparkMax,
    SparkMaxBrushed,
    SparkFlex,
    ThriftyNova,
    TalonFx,
}

impl MotorFamily {
    /// Both SPARK MAX personalities share the same controller object
    pub fn is_spark_max(self) -> bool {
        matches!(self, MotorFamily::SparkMax | MotorFamily::SparkMaxBrushed)
    }

    /// Controllers with a data port that accepts an attached absolute encoder
    pub fn has_data_port(self) -> bool {
        self.is_spark_max() || self == MotorFamily::SparkFlex
    }
}

impl FromStr for MotorFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sparkmax" | "neo" => Ok(MotorFamily::SparkMax),
            "sparkmax_brushed" => Ok(MotorFamily::SparkMaxBrushed),
            "sparkflex" => Ok(MotorFamily::SparkFlex),
            "thrifty_nova" => Ok(MotorFamily::ThriftyNova),
            "talonfx" | "falcon" | "krakenx60" => Ok(MotorFamily::TalonFx),
            _ => Err(ConfigError::UnknownMotorType(s.to_string())),
        }
    }
}

/// Result of a single driver call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Ok,
    Timeout,
    CanError,
    InvalidParameter,
    HardwareFault,
}

impl DeviceStatus {
    pub fn is_ok(self) -> bool {
        self == DeviceStatus::Ok
    }
}

/// Readable signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    /// Analog data port pin, scaled by the analog sensor factors
    AnalogPosition,
    AnalogVelocity,
    /// Duty-cycle encoder on the data port, scaled by the absolute encoder factors
    AbsolutePosition,
    AbsoluteVelocity,
    /// Encoder wired into a controller's external encoder input, in rotations
    ExternalPosition,
    ExternalVelocity,
    /// Stand-alone sensor absolute position, in rotations
    SensorPosition,
    SensorVelocity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSensor {
    #[default]
    PrimaryEncoder,
    AnalogSensor,
    AbsoluteEncoder,
    ExternalEncoder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleMode {
    #[default]
    Coast,
    Brake,
}

/// Position/velocity conversion applied on the device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorScaling {
    pub position_factor: f64,
    pub velocity_factor: f64,
}

impl Default for SensorScaling {
    fn default() -> Self {
        Self {
            position_factor: 1.0,
            velocity_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClosedLoopConfig {
    pub feedback_sensor: FeedbackSensor,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalogSensorConfig {
    pub scaling: SensorScaling,
    pub inverted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AbsoluteEncoderConfig {
    pub scaling: SensorScaling,
    pub inverted: bool,
    /// Zero offset in rotations, [0, 1)
    pub zero_offset: f64,
}

/// Encoder wired into the controller's external encoder input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExternalEncoderConfig {
    pub inverted: bool,
}

/// Status frame periods; `None` leaves the device default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalsConfig {
    pub analog_position_period_ms: Option<u16>,
    pub analog_velocity_period_ms: Option<u16>,
    pub analog_voltage_period_ms: Option<u16>,
}

/// Full configuration object for a motor controller
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MotorConfig {
    pub inverted: bool,
    pub idle_mode: IdleMode,
    /// Amps
    pub smart_current_limit: u32,
    /// Seconds from neutral to full output
    pub ramp_rate: f64,
    pub closed_loop: ClosedLoopConfig,
    pub analog_sensor: AnalogSensorConfig,
    pub absolute_encoder: AbsoluteEncoderConfig,
    pub external_encoder: ExternalEncoderConfig,
    pub signals: SignalsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbsoluteRange {
    /// [0, 1) rotations
    #[default]
    Unsigned,
    /// [-0.5, 0.5) rotations
    Signed,
}

/// Configuration object for a stand-alone absolute sensor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorConfig {
    /// Clockwise rotation reads positive
    pub clockwise_positive: bool,
    /// Rotations added to the raw reading
    pub magnet_offset: f64,
    pub absolute_range: AbsoluteRange,
}

pub trait MotorPort {
    fn apply(&mut self, config: &MotorConfig) -> DeviceStatus;
    fn restore_factory_defaults(&mut self) -> DeviceStatus;
    fn clear_sticky_faults(&mut self) -> DeviceStatus;
    fn read(&self, signal: Signal) -> f64;
}

pub trait SensorPort {
    fn apply(&mut self, config: &SensorConfig) -> DeviceStatus;
    fn restore_factory_defaults(&mut self) -> DeviceStatus;
    fn clear_sticky_faults(&mut self) -> DeviceStatus;
    fn read(&self, signal: Signal) -> f64;
}

/// Opens devices by CAN id
pub trait DeviceProvider {
    fn open_motor(&mut self, family: MotorFamily, id: u8, canbus: &str) -> Box<dyn MotorPort>;
    fn open_sensor(&mut self, id: u8, canbus: &str) -> Box<dyn SensorPort>;
}
