use std::fmt::{Debug, Display, Formatter};

/// Energy as reported by the portal.
#[must_use]
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, PartialOrd, serde::Deserialize, derive_more::FromStr)]
pub struct KilowattHours(pub f64);

impl KilowattHours {
    /// Shortest round-trip decimal with at least one fractional digit, as stored in the dataset.
    #[must_use]
    pub fn to_plain_string(self) -> String {
        let mut text = self.0.to_string();
        if self.0.is_finite() && !text.contains('.') {
            text.push_str(".0");
        }
        text
    }
}

impl Display for KilowattHours {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, formatter)?;
        write!(formatter, " kWh")
    }
}

impl Debug for KilowattHours {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, formatter)?;
        write!(formatter, "kWh")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_ok() {
        assert_eq!(KilowattHours(0.25).to_plain_string(), "0.25");
        assert_eq!(KilowattHours(1.0).to_plain_string(), "1.0");
        assert_eq!(KilowattHours(0.0).to_plain_string(), "0.0");
        assert_eq!(KilowattHours(12.345).to_plain_string(), "12.345");
    }

    #[test]
    fn from_str_ok() -> crate::prelude::Result {
        approx::assert_abs_diff_eq!("0.125".parse::<KilowattHours>()?.0, 0.125);
        assert!("0,125".parse::<KilowattHours>().is_err());
        Ok(())
    }

    #[test]
    fn display_ok() {
        assert_eq!(KilowattHours(0.5).to_string(), "0.5 kWh");
    }
}
