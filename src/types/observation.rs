//! Defines [`Observation`], the engine's uniform output for a single reading: a
//! number with an optional unit label and an optional timestamp.

use crate::normalize::timestamp::Timestamp;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A numeric reading with its unit and the time it was taken.
///
/// An `Observation` behaves like the number it wraps: it compares, orders and
/// combines arithmetically by value alone. Units are carried as opaque labels
/// and are never converted or checked, so two readings with the same value
/// compare equal even when their units differ.
///
/// # Examples
///
/// ```
/// use buoyant::Observation;
///
/// let metres = Observation::new(1.0, "m");
/// let feet = Observation::new(1.0, "ft");
/// assert_eq!(metres, feet);
/// assert_eq!(&metres + 0.5, 1.5);
/// assert_eq!(metres.to_string(), "1 m");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    value: f64,
    unit: Option<String>,
    timestamp: Option<Timestamp>,
}

impl Observation {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: Some(unit.into()),
            timestamp: None,
        }
    }

    pub fn unitless(value: f64) -> Self {
        Self {
            value,
            unit: None,
            timestamp: None,
        }
    }

    /// Returns a copy of this reading stamped with `timestamp`.
    pub fn with_timestamp(mut self, timestamp: Option<Timestamp>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn timestamp(&self) -> Option<&Timestamp> {
        self.timestamp.as_ref()
    }
}

// Equality and ordering look at the number only.
impl PartialEq for Observation {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialEq<f64> for Observation {
    fn eq(&self, other: &f64) -> bool {
        self.value == *other
    }
}

impl PartialEq<Observation> for f64 {
    fn eq(&self, other: &Observation) -> bool {
        *self == other.value
    }
}

impl PartialOrd for Observation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl PartialOrd<f64> for Observation {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value.partial_cmp(other)
    }
}

impl From<Observation> for f64 {
    fn from(observation: Observation) -> Self {
        observation.value
    }
}

impl From<&Observation> for f64 {
    fn from(observation: &Observation) -> Self {
        observation.value
    }
}

impl Neg for Observation {
    type Output = f64;

    fn neg(self) -> f64 {
        -self.value
    }
}

/// Implements a binary operator between observations and plain `f64`s, in
/// every owned/borrowed combination, always producing a bare `f64`.
macro_rules! impl_numeric_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Observation {
            type Output = f64;
            fn $method(self, rhs: Observation) -> f64 {
                self.value $op rhs.value
            }
        }

        impl $trait<&Observation> for &Observation {
            type Output = f64;
            fn $method(self, rhs: &Observation) -> f64 {
                self.value $op rhs.value
            }
        }

        impl $trait<f64> for Observation {
            type Output = f64;
            fn $method(self, rhs: f64) -> f64 {
                self.value $op rhs
            }
        }

        impl $trait<f64> for &Observation {
            type Output = f64;
            fn $method(self, rhs: f64) -> f64 {
                self.value $op rhs
            }
        }

        impl $trait<Observation> for f64 {
            type Output = f64;
            fn $method(self, rhs: Observation) -> f64 {
                self $op rhs.value
            }
        }

        impl $trait<&Observation> for f64 {
            type Output = f64;
            fn $method(self, rhs: &Observation) -> f64 {
                self $op rhs.value
            }
        }
    };
}

impl_numeric_op!(Add, add, +);
impl_numeric_op!(Sub, sub, -);
impl_numeric_op!(Mul, mul, *);
impl_numeric_op!(Div, div, /);

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} {}", self.value, unit),
            None => write!(f, "{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::timestamp::parse_iso;

    #[test]
    fn test_equality_ignores_unit_and_timestamp() -> Result<(), Box<dyn std::error::Error>> {
        let stamped = Observation::new(1.0, "m").with_timestamp(Some(parse_iso("2017-03-01T12:30:00Z")?));

        assert_eq!(Observation::new(1.0, "m"), Observation::new(1.0, "ft"));
        assert_eq!(stamped, Observation::unitless(1.0));
        assert_ne!(Observation::new(1.0, "m"), Observation::new(2.0, "m"));
        Ok(())
    }

    #[test]
    fn test_compares_with_plain_numbers() {
        let temp = Observation::new(12.5, "C");

        assert_eq!(temp, 12.5);
        assert_eq!(12.5, temp);
        assert!(temp > 10.0);
        assert!(Observation::new(3.0, "s") < Observation::new(4.0, "min"));
    }

    #[test]
    fn test_arithmetic_yields_plain_numbers() {
        let a = Observation::new(6.0, "m");
        let b = Observation::new(2.0, "m");

        assert_eq!(&a + &b, 8.0);
        assert_eq!(&a - 1.0, 5.0);
        assert_eq!(3.0 * &b, 6.0);
        assert_eq!(a.clone() / b, 3.0);
        assert_eq!(-a, -6.0);
    }

    #[test]
    fn test_accessors_and_display() -> Result<(), Box<dyn std::error::Error>> {
        let ts = parse_iso("2017-03-01T12:30:00Z")?;
        let obs = Observation::new(0.117495, "m**2/Hz").with_timestamp(Some(ts));

        assert_eq!(obs.value(), 0.117495);
        assert_eq!(obs.unit(), Some("m**2/Hz"));
        assert_eq!(obs.timestamp(), Some(&ts));
        assert_eq!(obs.to_string(), "0.117495 m**2/Hz");
        assert_eq!(Observation::unitless(4.0).to_string(), "4");
        assert_eq!(f64::from(&obs), 0.117495);
        Ok(())
    }

    #[test]
    fn test_serializes_value_and_unit() -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_value(Observation::new(53.6, "F"))?;

        assert_eq!(json["value"], 53.6);
        assert_eq!(json["unit"], "F");
        assert!(json["timestamp"].is_null());
        Ok(())
    }
}
