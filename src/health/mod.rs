//! Satellite health arbitration
use crate::signal::Code;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod galileo;
mod gps;

pub use galileo::GalileoHealth;
pub use gps::{
    check_6bit_health_word, check_8bit_health_word, check_nav_dhi,
    check_page25_health_word, decode_ura_index, encode_ura, six_bit_health, ComponentHealth,
    NavDataHealth, NavDhiMask, URA_VALUES,
};

pub(crate) use gps::INVALID_URA;

/// Health arbitration outcome
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Health {
    /// Signal may be used
    Healthy,
    /// Signal must not be used
    Unhealthy,
    /// Health is not broadcast or not interpreted for this signal
    #[default]
    Unknown,
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl Health {
    /// Only [Health::Unhealthy] prevents usage
    pub fn is_usable(&self) -> bool {
        *self != Self::Unhealthy
    }
}

impl From<bool> for Health {
    fn from(healthy: bool) -> Self {
        if healthy {
            Self::Healthy
        } else {
            Self::Unhealthy
        }
    }
}

/// Implemented by data sets that carry broadcast health
/// information applicable to a given signal.
pub trait SignalHealth {
    /// Arbitrates the health of `code` from the broadcast indications.
    fn signal_health(&self, code: Code) -> Health;
    /// True unless the broadcast indications declare `code` unusable.
    fn is_healthy(&self, code: Code) -> bool {
        self.signal_health(code).is_usable()
    }
}
