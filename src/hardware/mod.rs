// Hardware call surface for swerve module devices
//
// Provides:
// - Motor controller families and the configuration objects written to them
// - Port traits implemented by a motor/encoder driver library
// - MotorHandle: a configured motor controller shared with its attached encoder
// - An in-memory simulated CAN bus for tests and offline checking

mod motor;
mod port;
pub mod sim;

pub use motor::{ControllerCore, MotorHandle, MotorRole, SharedController};
pub use port::{
    AbsoluteEncoderConfig, AbsoluteRange, AnalogSensorConfig, ClosedLoopConfig, DeviceProvider,
    DeviceStatus, ExternalEncoderConfig, FeedbackSensor, IdleMode, MotorConfig, MotorFamily, MotorPort, SensorConfig,
    SensorPort, SensorScaling, Signal, SignalsConfig,
};
pub use sim::{DeviceClass, SimDevice, SimulatedBus};
