// Conversion factors: composition from JSON and precedence resolution
//
// A module can state its factors literally or give the geometry to compute
// them. physicalproperties.json can supply robot-wide fallbacks. Module values
// always win per axis; the result must have both axes set.

use std::f64::consts::PI;

use serde::Deserialize;
use tracing::debug;

use crate::config::{DIRECT_FEEDBACK_ANGLE_FACTOR, inches_to_meters};
use crate::error::{ConfigError, Result};

/// `conversionFactors.angle` in JSON
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleFactorDescriptor {
    /// Steering motor rotations per module rotation
    #[serde(default)]
    pub gear_ratio: f64,
    /// Degrees per motor rotation; 0 means compute from the gear ratio
    #[serde(default)]
    pub factor: f64,
}

impl AngleFactorDescriptor {
    pub fn calculate(&self) -> Option<f64> {
        usable(self.factor).or_else(|| usable(360.0 / self.gear_ratio))
    }
}

/// `conversionFactors.drive` in JSON
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFactorDescriptor {
    /// Drive motor rotations per wheel rotation
    #[serde(default)]
    pub gear_ratio: f64,
    /// Wheel diameter in inches
    #[serde(default)]
    pub diameter: f64,
    /// Meters per motor rotation; 0 means compute from diameter and gear ratio
    #[serde(default)]
    pub factor: f64,
}

impl DriveFactorDescriptor {
    pub fn calculate(&self) -> Option<f64> {
        usable(self.factor)
            .or_else(|| usable(PI * inches_to_meters(self.diameter) / self.gear_ratio))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ConversionFactorsDescriptor {
    #[serde(default)]
    pub angle: AngleFactorDescriptor,
    #[serde(default)]
    pub drive: DriveFactorDescriptor,
}

impl ConversionFactorsDescriptor {
    /// Literal factors, `0` meaning unset
    pub fn literal(drive: f64, angle: f64) -> Self {
        Self {
            angle: AngleFactorDescriptor {
                factor: angle,
                ..Default::default()
            },
            drive: DriveFactorDescriptor {
                factor: drive,
                ..Default::default()
            },
        }
    }

    pub fn factors(&self) -> ConversionFactors {
        ConversionFactors {
            drive: self.drive.calculate(),
            angle: self.angle.calculate(),
        }
    }
}

/// Unresolved pair; `None` is the unset sentinel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConversionFactors {
    pub drive: Option<f64>,
    pub angle: Option<f64>,
}

impl ConversionFactors {
    pub const UNSET: Self = Self {
        drive: None,
        angle: None,
    };

    /// Zero, negative and non-finite values count as unset
    pub fn new(drive: f64, angle: f64) -> Self {
        Self {
            drive: usable(drive),
            angle: usable(angle),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.drive.is_none() && self.angle.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.drive.is_some() && self.angle.is_some()
    }
}

fn usable(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Where the resolved pair came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorSource {
    Module,
    Fallback,
    /// Some axes from the module, the rest from the fallback
    Merged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedConversionFactors {
    /// Meters per drive motor rotation
    pub drive: f64,
    /// Degrees per angle motor rotation
    pub angle: f64,
    pub source: FactorSource,
}

impl ResolvedConversionFactors {
    /// An angle factor of exactly 360 asks for the absolute encoder to be used
    /// as the angle motor's feedback instead of a numeric scale
    pub fn requests_direct_feedback(&self) -> bool {
        self.angle == DIRECT_FEEDBACK_ANGLE_FACTOR
    }
}

/// Merge module-level factors with the physical characteristics fallback
///
/// 1. Nothing usable anywhere: `NoConversionFactor`.
/// 2. Complete fallback, empty module: fallback wholesale.
/// 3. Complete fallback, partial module: module per axis, fallback fills gaps.
/// 4. Either axis still unset: `ZeroConversionFactor`.
pub fn resolve(
    module: ConversionFactors,
    fallback: Option<ConversionFactors>,
    name: &str,
) -> Result<ResolvedConversionFactors> {
    let fallback_has_any = fallback.is_some_and(|f| !f.is_empty());
    if module.is_empty() && !fallback_has_any {
        return Err(ConfigError::NoConversionFactor {
            module: name.to_string(),
        });
    }

    let complete_fallback = fallback.filter(ConversionFactors::is_complete);
    let (merged, source) = match complete_fallback {
        Some(fb) if module.is_empty() => (fb, FactorSource::Fallback),
        Some(fb) => {
            let merged = ConversionFactors {
                drive: module.drive.or(fb.drive),
                angle: module.angle.or(fb.angle),
            };
            let source = if module.is_complete() {
                FactorSource::Module
            } else {
                FactorSource::Merged
            };
            (merged, source)
        }
        None => (module, FactorSource::Module),
    };

    match (merged.drive, merged.angle) {
        (Some(drive), Some(angle)) => {
            debug!(
                "Module {} conversion factors drive={} angle={} ({:?})",
                name, drive, angle, source
            );
            Ok(ResolvedConversionFactors {
                drive,
                angle,
                source,
            })
        }
        _ => Err(ConfigError::ZeroConversionFactor {
            module: name.to_string(),
        }),
    }
}
