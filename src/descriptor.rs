// Module JSON model
//
// Field names and units are fixed by the deploy files: locations in inches,
// offsets in degrees. Parsing only; validation happens in the builder.

use serde::{Deserialize, Serialize};

use crate::advisory::SharedSink;
use crate::conversion::ConversionFactorsDescriptor;
use crate::encoder::{AnalogEncoder, AttachedEncoder, CanCoder, EncoderHandle, EncoderKind, NovaEncoder};
use crate::error::Result;
use crate::hardware::{DeviceProvider, MotorFamily, MotorHandle, MotorRole};
use crate::physical::PhysicalCharacteristics;

/// A device on the bus: `{ "type": "sparkmax", "id": 5, "canbus": "" }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: u8,
    #[serde(default)]
    pub canbus: String,
}

impl DeviceDescriptor {
    pub fn new(kind: &str, id: u8) -> Self {
        Self {
            kind: kind.to_string(),
            id,
            canbus: String::new(),
        }
    }

    pub fn motor_family(&self) -> Result<MotorFamily> {
        self.kind.parse()
    }

    /// `None` for `"none"`
    pub fn encoder_kind(&self) -> Result<Option<EncoderKind>> {
        if self.kind.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        self.kind.parse().map(Some)
    }

    pub fn create_motor(
        &self,
        provider: &mut dyn DeviceProvider,
        role: MotorRole,
        physical: &PhysicalCharacteristics,
        sink: SharedSink,
    ) -> Result<MotorHandle> {
        let family = self.motor_family()?;
        Ok(MotorHandle::open(
            provider,
            family,
            self.id,
            &self.canbus,
            role,
            physical,
            sink,
        ))
    }

    /// Create the absolute encoder described here, bound to `motor`
    ///
    /// Data-port and integrated encoders are checked against the motor family
    /// immediately; a mismatch is fatal.
    pub fn create_encoder(
        &self,
        motor: &MotorHandle,
        provider: &mut dyn DeviceProvider,
        physical: &PhysicalCharacteristics,
        sink: SharedSink,
    ) -> Result<Option<EncoderHandle>> {
        let Some(kind) = self.encoder_kind()? else {
            return Ok(None);
        };
        let handle = match kind {
            EncoderKind::Analog => EncoderHandle::Analog(AnalogEncoder::attach(
                motor,
                physical.analog_max_voltage,
                sink,
            )?),
            EncoderKind::Attached => EncoderHandle::Attached(AttachedEncoder::attach(motor, sink)?),
            EncoderKind::NovaIntegrated => EncoderHandle::Nova(NovaEncoder::attach(motor, sink)?),
            EncoderKind::Cancoder => {
                EncoderHandle::Cancoder(CanCoder::open(provider, self.id, &self.canbus, sink))
            }
        };
        Ok(Some(handle))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct MotorInversion {
    #[serde(default)]
    pub drive: bool,
    #[serde(default)]
    pub angle: bool,
}

/// Module position relative to the robot center, in inches
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct LocationDescriptor {
    pub front: f64,
    pub left: f64,
}

/// One module JSON file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub drive: DeviceDescriptor,
    pub angle: DeviceDescriptor,
    #[serde(default)]
    pub encoder: Option<DeviceDescriptor>,
    #[serde(default)]
    pub inverted: MotorInversion,
    /// Degrees
    #[serde(default)]
    pub absolute_encoder_offset: f64,
    #[serde(default)]
    pub absolute_encoder_inverted: bool,
    pub location: LocationDescriptor,
    #[serde(default)]
    pub conversion_factors: ConversionFactorsDescriptor,
    #[serde(default = "default_true")]
    pub use_cosine_compensator: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputRange {
    pub min: f64,
    pub max: f64,
}

impl Default for OutputRange {
    fn default() -> Self {
        Self {
            min: -1.0,
            max: 1.0,
        }
    }
}

/// PID with feedforward and integral zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidfConfig {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub f: f64,
    pub iz: f64,
    pub output: OutputRange,
}

impl PidfConfig {
    pub fn pid(p: f64, i: f64, d: f64) -> Self {
        Self {
            p,
            i,
            d,
            ..Default::default()
        }
    }
}

/// pidfproperties.json
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PidfProperties {
    pub drive: PidfConfig,
    pub angle: PidfConfig,
}
