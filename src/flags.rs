use std::fmt;

use serde_derive::{Deserialize, Serialize};

/// Flags raised by the endpoint for the charm to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flag {
    /// A connection to the integrator exists
    Joined,

    /// New relation data arrived and hasn't been looked at yet
    Changed,

    /// Everything needed to talk to OpenStack has arrived
    Ready,
}

impl Flag {
    pub fn suffix(self) -> &'static str {
        match self {
            Flag::Joined => "joined",
            Flag::Changed => "changed",
            Flag::Ready => "ready",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Full flag name for an endpoint, e.g. `endpoint.openstack.ready`
pub fn expand_name(endpoint: &str, flag: Flag) -> String {
    format!("endpoint.{}.{}", endpoint, flag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    joined: bool,
    changed: bool,
    ready: bool,
}

impl Flags {
    fn slot(&mut self, flag: Flag) -> &mut bool {
        match flag {
            Flag::Joined => &mut self.joined,
            Flag::Changed => &mut self.changed,
            Flag::Ready => &mut self.ready,
        }
    }

    pub fn is_set(&self, flag: Flag) -> bool {
        match flag {
            Flag::Joined => self.joined,
            Flag::Changed => self.changed,
            Flag::Ready => self.ready,
        }
    }

    pub fn set(&mut self, flag: Flag) {
        self.toggle(flag, true)
    }

    pub fn clear(&mut self, flag: Flag) {
        self.toggle(flag, false)
    }

    pub fn toggle(&mut self, flag: Flag, value: bool) {
        *self.slot(flag) = value;
    }

    /// Expanded names of every flag currently set
    pub fn active(&self, endpoint: &str) -> Vec<String> {
        [Flag::Joined, Flag::Changed, Flag::Ready]
            .iter()
            .filter(|&&flag| self.is_set(flag))
            .map(|&flag| expand_name(endpoint, flag))
            .collect()
    }
}
