// Absolute encoders for the angle motor
//
// One capability trait, one closed enum of physical attachments:
// - analog pin on a SPARK MAX data port
// - duty-cycle encoder attached to a SPARK data port
// - encoder on a Thrifty Nova's external encoder input
// - stand-alone CANcoder on the bus

mod analog;
mod attached;
mod cancoder;
mod nova;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub use analog::AnalogEncoder;
pub use attached::AttachedEncoder;
pub use cancoder::CanCoder;
pub use nova::NovaEncoder;

use crate::error::ConfigError;
use crate::hardware::{FeedbackSensor, MotorFamily};

/// Outcome of writing an encoder offset to hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetOutcome {
    Applied,
    /// The variant has no integrated offset; nothing was written
    Unsupported,
    /// The write was attempted and did not succeed
    Failed,
}

impl OffsetOutcome {
    pub fn is_applied(self) -> bool {
        self == OffsetOutcome::Applied
    }
}

/// Capabilities shared by every absolute encoder
pub trait AbsoluteEncoder {
    /// Reset to factory defaults; no-op where there is nothing to reset
    fn factory_default(&mut self);

    /// No-op for encoders without sticky-fault registers
    fn clear_sticky_faults(&mut self);

    /// Write the inversion setting
    fn configure(&mut self, inverted: bool);

    /// Degrees in [0, 360)
    fn absolute_position(&self) -> f64;

    /// Degrees per second
    fn velocity(&self) -> f64;

    fn set_offset(&mut self, offset_degrees: f64) -> OffsetOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    Analog,
    Attached,
    NovaIntegrated,
    Cancoder,
}

impl EncoderKind {
    /// Whether this encoder can be created against a controller of `family`
    pub fn supports(self, family: MotorFamily) -> bool {
        match self {
            EncoderKind::Analog => family.is_spark_max(),
            EncoderKind::Attached => family.has_data_port(),
            EncoderKind::NovaIntegrated => family == MotorFamily::ThriftyNova,
            EncoderKind::Cancoder => true,
        }
    }

    pub(crate) fn check(self, family: MotorFamily) -> crate::error::Result<()> {
        if self.supports(family) {
            Ok(())
        } else {
            Err(ConfigError::IncompatibleEncoder {
                encoder: self,
                motor: family,
            })
        }
    }
}

impl FromStr for EncoderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sparkmax_analog" => Ok(EncoderKind::Analog),
            "integrated" | "attached" | "sparkmax" | "sparkflex" => Ok(EncoderKind::Attached),
            "thrifty_nova" => Ok(EncoderKind::NovaIntegrated),
            "cancoder" => Ok(EncoderKind::Cancoder),
            _ => Err(ConfigError::UnknownEncoderType(s.to_string())),
        }
    }
}

/// An absolute encoder owned by a module's angle motor
pub enum EncoderHandle {
    Analog(AnalogEncoder),
    Attached(AttachedEncoder),
    Nova(NovaEncoder),
    Cancoder(CanCoder),
}

impl EncoderHandle {
    pub fn kind(&self) -> EncoderKind {
        match self {
            EncoderHandle::Analog(_) => EncoderKind::Analog,
            EncoderHandle::Attached(_) => EncoderKind::Attached,
            EncoderHandle::Nova(_) => EncoderKind::NovaIntegrated,
            EncoderHandle::Cancoder(_) => EncoderKind::Cancoder,
        }
    }

    /// Feedback sensor selection when this encoder drives the angle motor directly
    pub fn feedback_sensor(&self) -> Option<FeedbackSensor> {
        match self {
            EncoderHandle::Analog(_) => Some(FeedbackSensor::AnalogSensor),
            EncoderHandle::Attached(_) => Some(FeedbackSensor::AbsoluteEncoder),
            EncoderHandle::Nova(_) => Some(FeedbackSensor::ExternalEncoder),
            EncoderHandle::Cancoder(_) => None,
        }
    }

    fn inner(&self) -> &dyn AbsoluteEncoder {
        match self {
            EncoderHandle::Analog(e) => e,
            EncoderHandle::Attached(e) => e,
            EncoderHandle::Nova(e) => e,
            EncoderHandle::Cancoder(e) => e,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn AbsoluteEncoder {
        match self {
            EncoderHandle::Analog(e) => e,
            EncoderHandle::Attached(e) => e,
            EncoderHandle::Nova(e) => e,
            EncoderHandle::Cancoder(e) => e,
        }
    }
}

impl AbsoluteEncoder for EncoderHandle {
    fn factory_default(&mut self) {
        self.inner_mut().factory_default()
    }

    fn clear_sticky_faults(&mut self) {
        self.inner_mut().clear_sticky_faults()
    }

    fn configure(&mut self, inverted: bool) {
        self.inner_mut().configure(inverted)
    }

    fn absolute_position(&self) -> f64 {
        self.inner().absolute_position()
    }

    fn velocity(&self) -> f64 {
        self.inner().velocity()
    }

    fn set_offset(&mut self, offset_degrees: f64) -> OffsetOutcome {
        self.inner_mut().set_offset(offset_degrees)
    }
}

impl fmt::Debug for EncoderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncoderHandle").field(&self.kind()).finish()
    }
}

/// Wrap an angle into [0, 360)
pub fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(725.0), 5.0);
        let tiny = wrap_degrees(-1e-14);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_encoder_kind_parsing() {
        assert_eq!("sparkmax_analog".parse::<EncoderKind>().unwrap(), EncoderKind::Analog);
        assert_eq!("attached".parse::<EncoderKind>().unwrap(), EncoderKind::Attached);
        assert_eq!("CANcoder".parse::<EncoderKind>().unwrap(), EncoderKind::Cancoder);
        assert!(matches!(
            "pwm_magic".parse::<EncoderKind>(),
            Err(ConfigError::UnknownEncoderType(_))
        ));
    }

    #[test]
    fn test_compatibility_matrix() {
        assert!(EncoderKind::Analog.supports(MotorFamily::SparkMaxBrushed));
        assert!(!EncoderKind::Analog.supports(MotorFamily::SparkFlex));
        assert!(EncoderKind::Attached.supports(MotorFamily::SparkFlex));
        assert!(!EncoderKind::Attached.supports(MotorFamily::TalonFx));
        assert!(EncoderKind::NovaIntegrated.supports(MotorFamily::ThriftyNova));
        assert!(!EncoderKind::NovaIntegrated.supports(MotorFamily::SparkMax));
        assert!(EncoderKind::Cancoder.supports(MotorFamily::TalonFx));

        assert!(matches!(
            EncoderKind::Analog.check(MotorFamily::TalonFx),
            Err(ConfigError::IncompatibleEncoder {
                encoder: EncoderKind::Analog,
                motor: MotorFamily::TalonFx
            })
        ));
    }
}
