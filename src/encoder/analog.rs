// Absolute encoder read through the SPARK MAX data port analog pin

use tracing::{debug, warn};

use super::{AbsoluteEncoder, EncoderKind, OffsetOutcome, wrap_degrees};
use crate::advisory::{Advisory, SharedSink};
use crate::config::{ANALOG_SIGNAL_PERIOD_MS, DEFAULT_ANALOG_MAX_VOLTAGE};
use crate::error::Result;
use crate::hardware::{FeedbackSensor, MotorHandle, SensorScaling, SharedController, Signal};
use crate::retry::{RetryState, RetryingConfigurator};

pub struct AnalogEncoder {
    controller: SharedController,
    configurator: RetryingConfigurator,
    offsets_unsupported: Advisory,
    sink: SharedSink,
}

impl AnalogEncoder {
    /// Attach to a SPARK MAX and scale the pin so `max_voltage` reads as 360 degrees
    pub fn attach(motor: &MotorHandle, max_voltage: f64, sink: SharedSink) -> Result<Self> {
        EncoderKind::Analog.check(motor.family())?;

        let max_voltage = if max_voltage > 0.0 && max_voltage.is_finite() {
            max_voltage
        } else {
            warn!(
                "Invalid analog max voltage {}, using {}",
                max_voltage, DEFAULT_ANALOG_MAX_VOLTAGE
            );
            DEFAULT_ANALOG_MAX_VOLTAGE
        };

        let encoder = Self {
            controller: motor.controller(),
            configurator: RetryingConfigurator::new(
                sink.clone(),
                Advisory::warning(
                    "Encoders",
                    format!("Failure configuring SparkMax Analog Encoder on motor {}", motor.id()),
                ),
            ),
            offsets_unsupported: Advisory::warning(
                "Encoders",
                "SparkMax Analog Sensors do not support integrated offsets",
            ),
            sink,
        };
        encoder.set_conversion_factor(360.0 / max_voltage);
        Ok(encoder)
    }

    /// Position factor in degrees per volt; velocity uses the same factor per minute
    pub fn set_conversion_factor(&self, factor: f64) -> RetryState {
        debug!("Analog encoder position factor {}", factor);
        self.controller
            .borrow_mut()
            .reconfigure(&self.configurator, |cfg| {
                cfg.closed_loop.feedback_sensor = FeedbackSensor::AnalogSensor;
                cfg.signals.analog_position_period_ms = Some(ANALOG_SIGNAL_PERIOD_MS);
                cfg.signals.analog_velocity_period_ms = Some(ANALOG_SIGNAL_PERIOD_MS);
                cfg.signals.analog_voltage_period_ms = Some(ANALOG_SIGNAL_PERIOD_MS);
                cfg.analog_sensor.scaling = SensorScaling {
                    position_factor: factor,
                    velocity_factor: factor / 60.0,
                };
            })
    }
}

impl AbsoluteEncoder for AnalogEncoder {
    fn factory_default(&mut self) {}

    fn clear_sticky_faults(&mut self) {}

    fn configure(&mut self, inverted: bool) {
        self.controller
            .borrow_mut()
            .reconfigure(&self.configurator, |cfg| cfg.analog_sensor.inverted = inverted);
    }

    fn absolute_position(&self) -> f64 {
        wrap_degrees(self.controller.borrow().port().read(Signal::AnalogPosition))
    }

    fn velocity(&self) -> f64 {
        self.controller.borrow().port().read(Signal::AnalogVelocity)
    }

    fn set_offset(&mut self, _offset_degrees: f64) -> OffsetOutcome {
        self.sink.raise(&self.offsets_unsupported);
        OffsetOutcome::Unsupported
    }
}
