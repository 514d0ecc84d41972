// Simulated CAN bus
//
// Devices are created on first use and keyed by (class, bus, id). Tests reach
// the same device state the ports write to, so they can inject raw sensor
// values and configuration failures and inspect what was written.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use super::port::{
    AbsoluteRange, DeviceProvider, DeviceStatus, MotorConfig, MotorFamily, MotorPort,
    SensorConfig, SensorPort, Signal,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceClass {
    Motor,
    Sensor,
}

/// State of one simulated device
#[derive(Debug, Default)]
pub struct SimDevice {
    /// Every call to apply, successful or not
    pub apply_attempts: u32,
    pub applies: u32,
    pub factory_resets: u32,
    pub sticky_clears: u32,
    /// Fail this many upcoming applies
    pub fail_next_applies: u32,
    /// Fail every apply
    pub fail_always: bool,
    /// Fail every factory reset
    pub fail_factory_resets: bool,
    pub last_motor_config: Option<MotorConfig>,
    pub last_sensor_config: Option<SensorConfig>,
    raw: BTreeMap<Signal, f64>,
}

impl SimDevice {
    /// Set the unscaled value behind a signal (volts, rotations, RPM)
    pub fn set_raw(&mut self, signal: Signal, value: f64) {
        self.raw.insert(signal, value);
    }

    fn raw(&self, signal: Signal) -> f64 {
        self.raw.get(&signal).copied().unwrap_or(0.0)
    }

    fn try_apply(&mut self) -> DeviceStatus {
        self.apply_attempts += 1;
        if self.fail_always {
            return DeviceStatus::Timeout;
        }
        if self.fail_next_applies > 0 {
            self.fail_next_applies -= 1;
            return DeviceStatus::Timeout;
        }
        self.applies += 1;
        DeviceStatus::Ok
    }

    fn read_motor(&self, signal: Signal) -> f64 {
        let cfg = self.last_motor_config.clone().unwrap_or_default();
        let raw = self.raw(signal);
        match signal {
            Signal::AnalogPosition => raw * cfg.analog_sensor.scaling.position_factor,
            Signal::AnalogVelocity => raw * cfg.analog_sensor.scaling.velocity_factor,
            Signal::AbsolutePosition => {
                let abs = cfg.absolute_encoder;
                let r = if abs.inverted { 1.0 - raw } else { raw };
                (r - abs.zero_offset).rem_euclid(1.0) * abs.scaling.position_factor
            }
            Signal::AbsoluteVelocity => {
                let abs = cfg.absolute_encoder;
                let v = if abs.inverted { -raw } else { raw };
                v * abs.scaling.velocity_factor
            }
            Signal::ExternalPosition | Signal::ExternalVelocity => {
                if cfg.external_encoder.inverted { -raw } else { raw }
            }
            Signal::SensorPosition | Signal::SensorVelocity => 0.0,
        }
    }

    fn read_sensor(&self, signal: Signal) -> f64 {
        let cfg = self.last_sensor_config.unwrap_or_default();
        let raw = self.raw(signal);
        let raw = if cfg.clockwise_positive { -raw } else { raw };
        match signal {
            Signal::SensorPosition => {
                let r = raw + cfg.magnet_offset;
                match cfg.absolute_range {
                    AbsoluteRange::Unsigned => r.rem_euclid(1.0),
                    AbsoluteRange::Signed => r - (r + 0.5).floor(),
                }
            }
            Signal::SensorVelocity => raw,
            _ => 0.0,
        }
    }
}

pub type SimHandle = Rc<RefCell<SimDevice>>;

/// In-memory DeviceProvider
#[derive(Debug, Default)]
pub struct SimulatedBus {
    devices: BTreeMap<(DeviceClass, String, u8), SimHandle>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device state, created if it does not exist yet
    pub fn device(&mut self, class: DeviceClass, id: u8, canbus: &str) -> SimHandle {
        Rc::clone(
            self.devices
                .entry((class, canbus.to_string(), id))
                .or_default(),
        )
    }

    /// Devices touched so far
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn contains(&self, class: DeviceClass, id: u8, canbus: &str) -> bool {
        self.devices.contains_key(&(class, canbus.to_string(), id))
    }
}

impl DeviceProvider for SimulatedBus {
    fn open_motor(&mut self, family: MotorFamily, id: u8, canbus: &str) -> Box<dyn MotorPort> {
        debug!("Simulated motor {:?} id={} bus='{}'", family, id, canbus);
        Box::new(SimMotorPort {
            dev: self.device(DeviceClass::Motor, id, canbus),
        })
    }

    fn open_sensor(&mut self, id: u8, canbus: &str) -> Box<dyn SensorPort> {
        debug!("Simulated sensor id={} bus='{}'", id, canbus);
        Box::new(SimSensorPort {
            dev: self.device(DeviceClass::Sensor, id, canbus),
        })
    }
}

struct SimMotorPort {
    dev: SimHandle,
}

impl MotorPort for SimMotorPort {
    fn apply(&mut self, config: &MotorConfig) -> DeviceStatus {
        let mut dev = self.dev.borrow_mut();
        let status = dev.try_apply();
        if status.is_ok() {
            dev.last_motor_config = Some(config.clone());
        }
        status
    }

    fn restore_factory_defaults(&mut self) -> DeviceStatus {
        let mut dev = self.dev.borrow_mut();
        if dev.fail_factory_resets {
            return DeviceStatus::Timeout;
        }
        dev.factory_resets += 1;
        dev.last_motor_config = None;
        DeviceStatus::Ok
    }

    fn clear_sticky_faults(&mut self) -> DeviceStatus {
        self.dev.borrow_mut().sticky_clears += 1;
        DeviceStatus::Ok
    }

    fn read(&self, signal: Signal) -> f64 {
        self.dev.borrow().read_motor(signal)
    }
}

struct SimSensorPort {
    dev: SimHandle,
}

impl SensorPort for SimSensorPort {
    fn apply(&mut self, config: &SensorConfig) -> DeviceStatus {
        let mut dev = self.dev.borrow_mut();
        let status = dev.try_apply();
        if status.is_ok() {
            dev.last_sensor_config = Some(*config);
        }
        status
    }

    fn restore_factory_defaults(&mut self) -> DeviceStatus {
        let mut dev = self.dev.borrow_mut();
        if dev.fail_factory_resets {
            return DeviceStatus::Timeout;
        }
        dev.factory_resets += 1;
        dev.last_sensor_config = None;
        DeviceStatus::Ok
    }

    fn clear_sticky_faults(&mut self) -> DeviceStatus {
        self.dev.borrow_mut().sticky_clears += 1;
        DeviceStatus::Ok
    }

    fn read(&self, signal: Signal) -> f64 {
        self.dev.borrow().read_sensor(signal)
    }
}
