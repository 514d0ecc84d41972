// Configured motor controller handle
//
// The controller core (configuration object + driver port) is shared with any
// encoder attached to the controller's data port, because those encoders are
// configured through the motor's configuration object.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info};

use super::port::{DeviceProvider, FeedbackSensor, IdleMode, MotorConfig, MotorFamily, MotorPort};
use crate::advisory::{Advisory, SharedSink};
use crate::physical::PhysicalCharacteristics;
use crate::retry::{RetryState, RetryingConfigurator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorRole {
    Drive,
    Angle,
}

pub struct ControllerCore {
    family: MotorFamily,
    id: u8,
    config: MotorConfig,
    port: Box<dyn MotorPort>,
}

impl ControllerCore {
    pub fn family(&self) -> MotorFamily {
        self.family
    }

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    pub fn port(&self) -> &dyn MotorPort {
        self.port.as_ref()
    }

    /// Edit the configuration object, then write it with retries
    pub fn reconfigure<F>(&mut self, configurator: &RetryingConfigurator, edit: F) -> RetryState
    where
        F: FnOnce(&mut MotorConfig),
    {
        edit(&mut self.config);
        let config = &self.config;
        let port = &mut self.port;
        configurator.run(|| port.apply(config))
    }
}

impl fmt::Debug for ControllerCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerCore")
            .field("family", &self.family)
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

pub type SharedController = Rc<RefCell<ControllerCore>>;

/// A motor controller opened and configured for one role in a module
pub struct MotorHandle {
    core: SharedController,
    role: MotorRole,
    id: u8,
    canbus: String,
    configurator: RetryingConfigurator,
}

impl MotorHandle {
    /// Open a controller and write its initial configuration
    ///
    /// Restores factory defaults, clears sticky faults and applies current limit,
    /// ramp rate and idle mode for the role. Motors always start non-inverted.
    /// Write failures raise the motor's advisory; the handle is returned anyway.
    pub fn open(
        provider: &mut dyn DeviceProvider,
        family: MotorFamily,
        id: u8,
        canbus: &str,
        role: MotorRole,
        physical: &PhysicalCharacteristics,
        sink: SharedSink,
    ) -> Self {
        info!("Opening {:?} motor {:?} id={} bus='{}'", role, family, id, canbus);
        let port = provider.open_motor(family, id, canbus);
        let reset = RetryingConfigurator::new(
            sink.clone(),
            Advisory::error(
                "Motors",
                format!("Failure restoring factory defaults on motor {}", id),
            ),
        );
        let faults = RetryingConfigurator::new(
            sink.clone(),
            Advisory::warning("Motors", format!("Failure clearing sticky faults on motor {}", id)),
        );
        let configurator = RetryingConfigurator::new(
            sink,
            Advisory::warning("Motors", format!("Failure configuring {:?} motor {}", family, id)),
        );

        let (current_limit, ramp_rate) = match role {
            MotorRole::Drive => (physical.current_limit.drive, physical.ramp_rate.drive),
            MotorRole::Angle => (physical.current_limit.angle, physical.ramp_rate.angle),
        };

        let mut core = ControllerCore {
            family,
            id,
            config: MotorConfig::default(),
            port,
        };

        reset.run(|| core.port.restore_factory_defaults());
        faults.run(|| core.port.clear_sticky_faults());
        let state = core.reconfigure(&configurator, |cfg| {
            cfg.inverted = false;
            cfg.idle_mode = IdleMode::Brake;
            cfg.smart_current_limit = current_limit;
            cfg.ramp_rate = ramp_rate;
        });
        debug!("Motor {} initial configuration: {:?}", id, state);

        Self {
            core: Rc::new(RefCell::new(core)),
            role,
            id,
            canbus: canbus.to_string(),
            configurator,
        }
    }

    pub fn family(&self) -> MotorFamily {
        self.core.borrow().family
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn canbus(&self) -> &str {
        &self.canbus
    }

    pub fn role(&self) -> MotorRole {
        self.role
    }

    /// Snapshot of the last configuration requested; a write that ran out of
    /// retries is still reflected here
    pub fn config(&self) -> MotorConfig {
        self.core.borrow().config.clone()
    }

    pub fn feedback_sensor(&self) -> FeedbackSensor {
        self.core.borrow().config.closed_loop.feedback_sensor
    }

    /// Controller core, for encoders attached to this controller
    pub fn controller(&self) -> SharedController {
        Rc::clone(&self.core)
    }

    /// Use an attached absolute encoder as closed-loop feedback
    pub fn bind_absolute_encoder(&self, sensor: FeedbackSensor) -> RetryState {
        info!("Motor {} using {:?} as feedback", self.id, sensor);
        self.core
            .borrow_mut()
            .reconfigure(&self.configurator, |cfg| cfg.closed_loop.feedback_sensor = sensor)
    }
}

impl fmt::Debug for MotorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotorHandle")
            .field("family", &self.family())
            .field("id", &self.id)
            .field("canbus", &self.canbus)
            .field("role", &self.role)
            .field("feedback", &self.feedback_sensor())
            .finish()
    }
}
