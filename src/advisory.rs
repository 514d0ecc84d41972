// Sticky advisories for recoverable hardware problems
//
// An advisory is raised when a device could not be configured or lacks a
// capability. It stays set until the same advisory is cleared, which happens
// when a later configuration attempt for that target succeeds.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AdvisoryLevel {
    Warning,
    /// Device state is unknown, e.g. a factory reset that never went through
    Error,
}

/// A persistent warning, identified by its group and text
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Advisory {
    pub group: &'static str,
    pub text: String,
    pub level: AdvisoryLevel,
}

impl Advisory {
    pub fn warning(group: &'static str, text: impl Into<String>) -> Self {
        Self {
            group,
            text: text.into(),
            level: AdvisoryLevel::Warning,
        }
    }

    pub fn error(group: &'static str, text: impl Into<String>) -> Self {
        Self {
            group,
            text: text.into(),
            level: AdvisoryLevel::Error,
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.group, self.text)
    }
}

/// Side channel for advisories, injected into everything that touches hardware
pub trait AdvisorySink {
    fn raise(&self, advisory: &Advisory);
    fn clear(&self, advisory: &Advisory);
}

pub type SharedSink = Rc<dyn AdvisorySink>;

/// In-memory advisory sink that logs every rising and falling edge
#[derive(Debug, Default)]
pub struct AlertBoard {
    alerts: RefCell<BTreeMap<Advisory, AlertRecord>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertRecord {
    pub active: bool,
    /// How many times the advisory has gone from clear to set
    pub times_raised: u32,
}

impl AlertBoard {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn is_active(&self, advisory: &Advisory) -> bool {
        self.record(advisory).is_some_and(|r| r.active)
    }

    pub fn record(&self, advisory: &Advisory) -> Option<AlertRecord> {
        self.alerts.borrow().get(advisory).copied()
    }

    /// Currently set advisories, sorted by group then text
    pub fn active(&self) -> Vec<Advisory> {
        self.alerts
            .borrow()
            .iter()
            .filter(|(_, r)| r.active)
            .map(|(a, _)| a.clone())
            .collect()
    }

    /// True if any active advisory mentions `needle`
    pub fn any_active_containing(&self, needle: &str) -> bool {
        self.active().iter().any(|a| a.text.contains(needle))
    }
}

impl AdvisorySink for AlertBoard {
    fn raise(&self, advisory: &Advisory) {
        let mut alerts = self.alerts.borrow_mut();
        let record = alerts.entry(advisory.clone()).or_default();
        if !record.active {
            record.active = true;
            record.times_raised += 1;
            match advisory.level {
                AdvisoryLevel::Warning => warn!("Advisory set: {}", advisory),
                AdvisoryLevel::Error => error!("Advisory set: {}", advisory),
            }
        }
    }

    fn clear(&self, advisory: &Advisory) {
        if let Some(record) = self.alerts.borrow_mut().get_mut(advisory) {
            if record.active {
                record.active = false;
                info!("Advisory cleared: {}", advisory);
            }
        }
    }
}
