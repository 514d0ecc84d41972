// Deploy directory loading
//
// Layout:
//   swervedrive.json                  { "modules": ["frontleft.json", ...] }
//   modules/physicalproperties.json
//   modules/pidfproperties.json       optional, zero gains when absent
//   modules/<name>.json               one per entry in swervedrive.json

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::advisory::SharedSink;
use crate::descriptor::{ModuleDescriptor, PidfProperties};
use crate::error::{ConfigError, Result};
use crate::hardware::DeviceProvider;
use crate::module::{ModuleConfigBuilder, SwerveModuleConfiguration};
use crate::physical::PhysicalCharacteristics;

pub const DRIVE_FILE: &str = "swervedrive.json";
pub const MODULES_DIR: &str = "modules";
pub const PHYSICAL_FILE: &str = "physicalproperties.json";
pub const PIDF_FILE: &str = "pidfproperties.json";

#[derive(Debug, Deserialize)]
struct DriveFile {
    modules: Vec<String>,
}

/// Everything a deploy directory declares, parsed but not yet validated
#[derive(Debug, Clone)]
pub struct DeployDirectory {
    pub root: PathBuf,
    pub physical: PhysicalCharacteristics,
    pub pidf: PidfProperties,
    /// File name and descriptor, in swervedrive.json order
    pub modules: Vec<(String, ModuleDescriptor)>,
}

impl DeployDirectory {
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        info!("Loading swerve configuration from {}", root.display());

        let drive: DriveFile = read_json(&root.join(DRIVE_FILE))?;
        let modules_dir = root.join(MODULES_DIR);
        let physical: PhysicalCharacteristics = read_json(&modules_dir.join(PHYSICAL_FILE))?;

        let pidf_path = modules_dir.join(PIDF_FILE);
        let pidf = if pidf_path.exists() {
            read_json(&pidf_path)?
        } else {
            debug!("{} not found, using zero gains", pidf_path.display());
            PidfProperties::default()
        };

        let modules = drive
            .modules
            .into_iter()
            .map(|name| {
                let descriptor: ModuleDescriptor = read_json(&modules_dir.join(&name))?;
                Ok((name, descriptor))
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Found {} modules", modules.len());
        Ok(Self {
            root,
            physical,
            pidf,
            modules,
        })
    }

    /// Build every module in order, stopping at the first fatal error
    pub fn build_modules(
        &self,
        provider: &mut dyn DeviceProvider,
        sink: SharedSink,
    ) -> Result<Vec<SwerveModuleConfiguration>> {
        let mut builder = ModuleConfigBuilder::new(provider, sink);
        self.modules
            .iter()
            .map(|(name, descriptor)| {
                builder.build(
                    descriptor.clone(),
                    self.pidf.angle,
                    self.pidf.drive,
                    &self.physical,
                    name,
                )
            })
            .collect()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
