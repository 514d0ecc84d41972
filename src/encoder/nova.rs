// Encoder on a Thrifty Nova's external encoder input

use super::{AbsoluteEncoder, EncoderKind, OffsetOutcome, wrap_degrees};
use crate::advisory::{Advisory, SharedSink};
use crate::error::Result;
use crate::hardware::{MotorHandle, SharedController, Signal};
use crate::retry::RetryingConfigurator;

pub struct NovaEncoder {
    controller: SharedController,
    configurator: RetryingConfigurator,
    offsets_unsupported: Advisory,
    sink: SharedSink,
}

impl NovaEncoder {
    pub fn attach(motor: &MotorHandle, sink: SharedSink) -> Result<Self> {
        EncoderKind::NovaIntegrated.check(motor.family())?;

        Ok(Self {
            controller: motor.controller(),
            configurator: RetryingConfigurator::new(
                sink.clone(),
                Advisory::warning(
                    "Encoders",
                    format!("Failure configuring Thrifty Nova encoder on motor {}", motor.id()),
                ),
            ),
            offsets_unsupported: Advisory::warning(
                "Encoders",
                "Thrifty Nova encoders do not support integrated offsets",
            ),
            sink,
        })
    }
}

impl AbsoluteEncoder for NovaEncoder {
    fn factory_default(&mut self) {}

    fn clear_sticky_faults(&mut self) {}

    fn configure(&mut self, inverted: bool) {
        self.controller
            .borrow_mut()
            .reconfigure(&self.configurator, |cfg| cfg.external_encoder.inverted = inverted);
    }

    fn absolute_position(&self) -> f64 {
        let rotations = self.controller.borrow().port().read(Signal::ExternalPosition);
        wrap_degrees(rotations * 360.0)
    }

    fn velocity(&self) -> f64 {
        self.controller.borrow().port().read(Signal::ExternalVelocity) * 360.0
    }

    fn set_offset(&mut self, _offset_degrees: f64) -> OffsetOutcome {
        self.sink.raise(&self.offsets_unsupported);
        OffsetOutcome::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::AlertBoard;
    use crate::hardware::{DeviceClass, MotorFamily, MotorRole, SimulatedBus};
    use crate::physical::PhysicalCharacteristics;

    #[test]
    fn test_reads_rotations_as_degrees() {
        let mut bus = SimulatedBus::new();
        let board = AlertBoard::new();
        let motor = MotorHandle::open(
            &mut bus,
            MotorFamily::ThriftyNova,
            20,
            "",
            MotorRole::Angle,
            &PhysicalCharacteristics::default(),
            board.clone(),
        );
        let mut encoder = NovaEncoder::attach(&motor, board.clone()).unwrap();

        let dev = bus.device(DeviceClass::Motor, 20, "");
        dev.borrow_mut().set_raw(Signal::ExternalPosition, 1.5);
        dev.borrow_mut().set_raw(Signal::ExternalVelocity, 0.5);
        assert!((encoder.absolute_position() - 180.0).abs() < 1e-9);
        assert!((encoder.velocity() - 180.0).abs() < 1e-9);

        encoder.configure(true);
        assert!((encoder.absolute_position() - 180.0).abs() < 1e-9);
        assert!((encoder.velocity() + 180.0).abs() < 1e-9);

        assert_eq!(encoder.set_offset(30.0), OffsetOutcome::Unsupported);
        assert!(board.any_active_containing("Thrifty Nova encoders do not support"));
    }

    #[test]
    fn test_requires_nova_controller() {
        let mut bus = SimulatedBus::new();
        let board = AlertBoard::new();
        let motor = MotorHandle::open(
            &mut bus,
            MotorFamily::SparkMax,
            20,
            "",
            MotorRole::Angle,
            &PhysicalCharacteristics::default(),
            board.clone(),
        );
        assert!(NovaEncoder::attach(&motor, board).is_err());
    }
}
