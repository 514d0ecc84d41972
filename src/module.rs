// Swerve module configuration builder
//
// Turns a parsed module JSON into a validated, hardware-bound configuration:
// angle motor, absolute encoder, placement check, conversion factors, feedback
// binding, location conversion, then the drive motor and final assembly.

use serde::Serialize;
use tracing::{debug, info};

use crate::advisory::SharedSink;
use crate::config::inches_to_meters;
use crate::conversion::{self, ResolvedConversionFactors};
use crate::descriptor::{ModuleDescriptor, PidfConfig};
use crate::encoder::{EncoderHandle, EncoderKind};
use crate::error::{ConfigError, Result};
use crate::hardware::{DeviceProvider, MotorFamily, MotorHandle, MotorRole};
use crate::physical::PhysicalCharacteristics;

/// Module position relative to the robot center, meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModuleLocation {
    pub front: f64,
    pub left: f64,
}

impl ModuleLocation {
    /// Inches to meters, rounding each coordinate to a whole inch first
    pub fn from_inches(front: f64, left: f64) -> Self {
        Self {
            front: inches_to_meters(round_half_up(front)),
            left: inches_to_meters(round_half_up(left)),
        }
    }
}

/// Nearest integer, halves toward positive infinity (12.5 -> 13, -12.5 -> -12)
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Fully resolved module, owned by the drive subsystem
#[derive(Debug)]
pub struct SwerveModuleConfiguration {
    name: String,
    drive_motor: MotorHandle,
    angle_motor: MotorHandle,
    conversion_factors: ResolvedConversionFactors,
    absolute_encoder: Option<EncoderHandle>,
    absolute_encoder_offset: f64,
    absolute_encoder_inverted: bool,
    location: ModuleLocation,
    angle_pidf: PidfConfig,
    velocity_pidf: PidfConfig,
    physical_characteristics: PhysicalCharacteristics,
    drive_motor_inverted: bool,
    angle_motor_inverted: bool,
    angle_feedback_from_encoder: bool,
    use_cosine_compensator: bool,
}

impl SwerveModuleConfiguration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn drive_motor(&self) -> &MotorHandle {
        &self.drive_motor
    }

    pub fn angle_motor(&self) -> &MotorHandle {
        &self.angle_motor
    }

    pub fn conversion_factors(&self) -> ResolvedConversionFactors {
        self.conversion_factors
    }

    pub fn absolute_encoder(&self) -> Option<&EncoderHandle> {
        self.absolute_encoder.as_ref()
    }

    /// Degrees
    pub fn absolute_encoder_offset(&self) -> f64 {
        self.absolute_encoder_offset
    }

    pub fn absolute_encoder_inverted(&self) -> bool {
        self.absolute_encoder_inverted
    }

    pub fn location(&self) -> ModuleLocation {
        self.location
    }

    pub fn angle_pidf(&self) -> &PidfConfig {
        &self.angle_pidf
    }

    pub fn velocity_pidf(&self) -> &PidfConfig {
        &self.velocity_pidf
    }

    pub fn physical_characteristics(&self) -> &PhysicalCharacteristics {
        &self.physical_characteristics
    }

    pub fn drive_motor_inverted(&self) -> bool {
        self.drive_motor_inverted
    }

    pub fn angle_motor_inverted(&self) -> bool {
        self.angle_motor_inverted
    }

    /// The absolute encoder is the angle motor's closed-loop feedback
    pub fn angle_feedback_from_encoder(&self) -> bool {
        self.angle_feedback_from_encoder
    }

    pub fn use_cosine_compensator(&self) -> bool {
        self.use_cosine_compensator
    }

    /// Hand the hardware to the drive subsystem
    pub fn into_parts(self) -> (MotorHandle, MotorHandle, Option<EncoderHandle>) {
        (self.drive_motor, self.angle_motor, self.absolute_encoder)
    }
}

/// Whether `encoder` should be bound as the angle motor's feedback
///
/// An attached encoder on a SPARK MAX is bound only when the angle factor asks
/// for it (exactly 360). A Thrifty Nova always reads its own integrated encoder.
pub fn binds_encoder_directly(
    factors: &ResolvedConversionFactors,
    encoder: EncoderKind,
    angle_motor: MotorFamily,
) -> bool {
    match encoder {
        EncoderKind::Attached => factors.requests_direct_feedback() && angle_motor.is_spark_max(),
        EncoderKind::NovaIntegrated => angle_motor == MotorFamily::ThriftyNova,
        EncoderKind::Analog | EncoderKind::Cancoder => false,
    }
}

pub struct ModuleConfigBuilder<'a> {
    provider: &'a mut dyn DeviceProvider,
    sink: SharedSink,
}

impl<'a> ModuleConfigBuilder<'a> {
    pub fn new(provider: &'a mut dyn DeviceProvider, sink: SharedSink) -> Self {
        Self { provider, sink }
    }

    /// Build one module
    ///
    /// Placement and conversion factor problems are fatal and no drive motor
    /// is opened. Hardware write failures only raise advisories.
    pub fn build(
        &mut self,
        descriptor: ModuleDescriptor,
        angle_pidf: PidfConfig,
        velocity_pidf: PidfConfig,
        physical: &PhysicalCharacteristics,
        name: &str,
    ) -> Result<SwerveModuleConfiguration> {
        let name = name.replace(".json", "");
        info!("Configuring module {}", name);

        let angle_motor = descriptor.angle.create_motor(
            self.provider,
            MotorRole::Angle,
            physical,
            self.sink.clone(),
        )?;
        let absolute_encoder = match &descriptor.encoder {
            Some(encoder) => {
                encoder.create_encoder(&angle_motor, self.provider, physical, self.sink.clone())?
            }
            None => None,
        };

        let location = descriptor.location;
        if location.front == 0.0 && location.left == 0.0 {
            return Err(ConfigError::ImproperModuleLocation { module: name });
        }

        let factors = conversion::resolve(
            descriptor.conversion_factors.factors(),
            physical.fallback_factors(),
            &name,
        )?;

        let mut angle_feedback_from_encoder = false;
        if let Some(encoder) = &absolute_encoder {
            if binds_encoder_directly(&factors, encoder.kind(), angle_motor.family()) {
                if let Some(sensor) = encoder.feedback_sensor() {
                    angle_feedback_from_encoder =
                        angle_motor.bind_absolute_encoder(sensor).succeeded();
                }
            }
        }

        let location = ModuleLocation::from_inches(location.front, location.left);
        debug!("Module {} at {:?}", name, location);

        let drive_motor = descriptor.drive.create_motor(
            self.provider,
            MotorRole::Drive,
            physical,
            self.sink.clone(),
        )?;

        Ok(SwerveModuleConfiguration {
            name,
            drive_motor,
            angle_motor,
            conversion_factors: factors,
            absolute_encoder,
            absolute_encoder_offset: descriptor.absolute_encoder_offset,
            absolute_encoder_inverted: descriptor.absolute_encoder_inverted,
            location,
            angle_pidf,
            velocity_pidf,
            physical_characteristics: physical.clone(),
            drive_motor_inverted: descriptor.inverted.drive,
            angle_motor_inverted: descriptor.inverted.angle,
            angle_feedback_from_encoder,
            use_cosine_compensator: descriptor.use_cosine_compensator,
        })
    }
}
