pub mod advisory;
pub mod config;
pub mod conversion;
pub mod descriptor;
pub mod encoder;
pub mod error;
pub mod hardware;
pub mod loader;
pub mod module;
pub mod physical;
pub mod retry;

pub use advisory::{Advisory, AdvisoryLevel, AdvisorySink, AlertBoard, SharedSink};
pub use encoder::{AbsoluteEncoder, EncoderHandle, EncoderKind, OffsetOutcome};
pub use error::{ConfigError, Result};
pub use loader::DeployDirectory;
pub use module::{ModuleConfigBuilder, ModuleLocation, SwerveModuleConfiguration};
pub use physical::PhysicalCharacteristics;
pub use retry::{RetryState, RetryingConfigurator};
