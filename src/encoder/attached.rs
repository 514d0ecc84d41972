// Duty-cycle absolute encoder attached to a SPARK data port

use super::{AbsoluteEncoder, EncoderKind, OffsetOutcome, wrap_degrees};
use crate::advisory::{Advisory, SharedSink};
use crate::error::Result;
use crate::hardware::{MotorHandle, SensorScaling, SharedController, Signal};
use crate::retry::RetryingConfigurator;

/// Degrees per rotation
const POSITION_FACTOR: f64 = 360.0;

pub struct AttachedEncoder {
    controller: SharedController,
    configurator: RetryingConfigurator,
    offset_configurator: RetryingConfigurator,
}

impl AttachedEncoder {
    pub fn attach(motor: &MotorHandle, sink: SharedSink) -> Result<Self> {
        EncoderKind::Attached.check(motor.family())?;

        let encoder = Self {
            controller: motor.controller(),
            configurator: RetryingConfigurator::new(
                sink.clone(),
                Advisory::warning(
                    "Encoders",
                    format!("Failure configuring attached absolute encoder on motor {}", motor.id()),
                ),
            ),
            offset_configurator: RetryingConfigurator::new(
                sink,
                Advisory::warning(
                    "Encoders",
                    format!("Failure to set absolute encoder offset on motor {}", motor.id()),
                ),
            ),
        };

        encoder
            .controller
            .borrow_mut()
            .reconfigure(&encoder.configurator, |cfg| {
                cfg.absolute_encoder.scaling = SensorScaling {
                    position_factor: POSITION_FACTOR,
                    velocity_factor: POSITION_FACTOR / 60.0,
                };
            });
        Ok(encoder)
    }
}

impl AbsoluteEncoder for AttachedEncoder {
    // Settings live in the motor controller, which owns the reset
    fn factory_default(&mut self) {}

    fn clear_sticky_faults(&mut self) {}

    fn configure(&mut self, inverted: bool) {
        self.controller
            .borrow_mut()
            .reconfigure(&self.configurator, |cfg| cfg.absolute_encoder.inverted = inverted);
    }

    fn absolute_position(&self) -> f64 {
        wrap_degrees(self.controller.borrow().port().read(Signal::AbsolutePosition))
    }

    fn velocity(&self) -> f64 {
        self.controller.borrow().port().read(Signal::AbsoluteVelocity)
    }

    fn set_offset(&mut self, offset_degrees: f64) -> OffsetOutcome {
        let zero_offset = wrap_degrees(offset_degrees) / 360.0;
        let state = self
            .controller
            .borrow_mut()
            .reconfigure(&self.offset_configurator, |cfg| {
                cfg.absolute_encoder.zero_offset = zero_offset
            });
        if state.succeeded() {
            OffsetOutcome::Applied
        } else {
            OffsetOutcome::Failed
        }
    }
}
