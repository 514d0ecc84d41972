// Robot-wide physical characteristics (physicalproperties.json)

use serde::Deserialize;

use crate::config::DEFAULT_ANALOG_MAX_VOLTAGE;
use crate::conversion::{ConversionFactors, ConversionFactorsDescriptor};

/// Amps per motor role; a missing role keeps its default
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CurrentLimits {
    pub drive: u32,
    pub angle: u32,
}

impl Default for CurrentLimits {
    fn default() -> Self {
        Self {
            drive: 40,
            angle: 20,
        }
    }
}

/// Seconds from neutral to full output, per motor role
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RampRates {
    pub drive: f64,
    pub angle: f64,
}

impl Default for RampRates {
    fn default() -> Self {
        Self {
            drive: 0.25,
            angle: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhysicalCharacteristics {
    /// Fallback for modules that do not set their own factors
    pub conversion_factors: Option<ConversionFactorsDescriptor>,
    /// Full-scale voltage of analog absolute encoders
    pub analog_max_voltage: f64,
    /// Voltage compensation target
    pub optimal_voltage: f64,
    pub current_limit: CurrentLimits,
    pub ramp_rate: RampRates,
    pub wheel_grip_coefficient_of_friction: f64,
}

impl Default for PhysicalCharacteristics {
    fn default() -> Self {
        Self {
            conversion_factors: None,
            analog_max_voltage: DEFAULT_ANALOG_MAX_VOLTAGE,
            optimal_voltage: 12.0,
            current_limit: CurrentLimits::default(),
            ramp_rate: RampRates::default(),
            wheel_grip_coefficient_of_friction: 1.19,
        }
    }
}

impl PhysicalCharacteristics {
    pub fn with_conversion_factors(conversion_factors: ConversionFactorsDescriptor) -> Self {
        Self {
            conversion_factors: Some(conversion_factors),
            ..Default::default()
        }
    }

    /// The fallback factors, if physicalproperties.json declares any
    pub fn fallback_factors(&self) -> Option<ConversionFactors> {
        self.conversion_factors.as_ref().map(|c| c.factors())
    }
}
