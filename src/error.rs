// Fatal configuration errors
//
// Anything in here aborts construction of a module. Hardware write failures are
// not errors: they are reported through advisories (see advisory.rs).

use std::path::PathBuf;

use crate::encoder::EncoderKind;
use crate::hardware::MotorFamily;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "Improper module location settings for {module}: 'front' and 'left' are both 0. \
         Set the distance from the center of the robot to the center of the wheel in the module JSON file"
    )]
    ImproperModuleLocation { module: String },

    #[error(
        "No conversion factor configured for {module}. Set the conversion factor in \
         physicalproperties.json or the module JSON file"
    )]
    NoConversionFactor { module: String },

    #[error(
        "Conversion factors for {module} cannot be 0, configure them in \
         physicalproperties.json or the module JSON files"
    )]
    ZeroConversionFactor { module: String },

    #[error("Encoder {encoder:?} cannot be attached to a {motor:?} motor controller")]
    IncompatibleEncoder {
        encoder: EncoderKind,
        motor: MotorFamily,
    },

    #[error("Unknown motor type: {0}")]
    UnknownMotorType(String),

    #[error("Unknown encoder type: {0}")]
    UnknownEncoderType(String),

    #[error("Missing configuration file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
