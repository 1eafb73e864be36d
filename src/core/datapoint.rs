use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};

use crate::quantity::KilowattHours;

/// Billing tariff a value is reported for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Channel {
    /// High tariff («Hochtarif»).
    High,

    /// Low tariff («Niedertarif»).
    Low,
}

impl Channel {
    pub const ALL: [Self; 2] = [Self::High, Self::Low];

    #[must_use]
    pub const fn is_low(self) -> bool {
        matches!(self, Self::Low)
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "HT"),
            Self::Low => write!(f, "NT"),
        }
    }
}

/// Both tariff values at one instant.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, bon::Builder)]
pub struct Datapoint {
    pub instant: DateTime<Utc>,
    pub high: Option<KilowattHours>,
    pub low: Option<KilowattHours>,
}

impl Datapoint {
    pub const fn empty(instant: DateTime<Utc>) -> Self {
        Self { instant, high: None, low: None }
    }

    pub const fn set(&mut self, channel: Channel, value: KilowattHours) {
        match channel {
            Channel::High => self.high = Some(value),
            Channel::Low => self.low = Some(value),
        }
    }

    #[must_use]
    pub const fn has_values(&self) -> bool {
        self.high.is_some() || self.low.is_some()
    }
}
