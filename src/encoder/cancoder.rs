// CANcoder: stand-alone absolute encoder on the CAN bus
//
// Unlike the data-port encoders it has its own configuration registers, so
// factory reset and sticky-fault clearing reach real hardware.

use tracing::info;

use super::{AbsoluteEncoder, OffsetOutcome, wrap_degrees};
use crate::advisory::{Advisory, SharedSink};
use crate::hardware::{AbsoluteRange, DeviceProvider, SensorConfig, SensorPort, Signal};
use crate::retry::RetryingConfigurator;

pub struct CanCoder {
    id: u8,
    port: Box<dyn SensorPort>,
    config: SensorConfig,
    configurator: RetryingConfigurator,
    reset_configurator: RetryingConfigurator,
    faults_configurator: RetryingConfigurator,
    offset_configurator: RetryingConfigurator,
}

impl CanCoder {
    pub fn open(provider: &mut dyn DeviceProvider, id: u8, canbus: &str, sink: SharedSink) -> Self {
        info!("Opening CANcoder id={} bus='{}'", id, canbus);
        Self {
            id,
            port: provider.open_sensor(id, canbus),
            config: SensorConfig::default(),
            configurator: RetryingConfigurator::new(
                sink.clone(),
                Advisory::warning("Encoders", format!("Failure configuring CANcoder {}", id)),
            ),
            reset_configurator: RetryingConfigurator::new(
                sink.clone(),
                Advisory::error(
                    "Encoders",
                    format!("Failure restoring CANcoder {} factory defaults", id),
                ),
            ),
            faults_configurator: RetryingConfigurator::new(
                sink.clone(),
                Advisory::warning(
                    "Encoders",
                    format!("Failure clearing CANcoder {} sticky faults", id),
                ),
            ),
            offset_configurator: RetryingConfigurator::new(
                sink,
                Advisory::warning(
                    "Encoders",
                    format!("Failure to set CANcoder {} absolute encoder offset", id),
                ),
            ),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn config(&self) -> SensorConfig {
        self.config
    }
}

fn write_config(
    port: &mut dyn SensorPort,
    config: SensorConfig,
    configurator: &RetryingConfigurator,
) -> bool {
    configurator.run(|| port.apply(&config)).succeeded()
}

impl AbsoluteEncoder for CanCoder {
    fn factory_default(&mut self) {
        let port = &mut self.port;
        if self.reset_configurator.run(|| port.restore_factory_defaults()).succeeded() {
            self.config = SensorConfig::default();
        }
    }

    fn clear_sticky_faults(&mut self) {
        let port = &mut self.port;
        self.faults_configurator.run(|| port.clear_sticky_faults());
    }

    fn configure(&mut self, inverted: bool) {
        self.config.clockwise_positive = inverted;
        self.config.absolute_range = AbsoluteRange::Unsigned;
        write_config(self.port.as_mut(), self.config, &self.configurator);
    }

    fn absolute_position(&self) -> f64 {
        wrap_degrees(self.port.read(Signal::SensorPosition) * 360.0)
    }

    fn velocity(&self) -> f64 {
        self.port.read(Signal::SensorVelocity) * 360.0
    }

    fn set_offset(&mut self, offset_degrees: f64) -> OffsetOutcome {
        let rotations = offset_degrees / 360.0;
        // Device accepts [-0.5, 0.5)
        self.config.magnet_offset = rotations - (rotations + 0.5).floor();
        if write_config(self.port.as_mut(), self.config, &self.offset_configurator) {
            OffsetOutcome::Applied
        } else {
            OffsetOutcome::Failed
        }
    }
}
