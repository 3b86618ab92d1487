//! Shared scalar types: opaque ids, exact money, and tick-based timestamps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A stable, opaque 128-bit property id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub Uuid);

/// A stable, opaque 128-bit unit id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

macro_rules! opaque_id {
    ($name:ident) => {
        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok($name(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                $name(id)
            }
        }
    };
}

opaque_id!(PropertyId);
opaque_id!(UnitId);

/// A 3-letter currency code (e.g. `USD`, `YER`). Stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    /// Construct a currency code, upper-casing it for canonical comparison.
    pub fn new(code: impl Into<String>) -> Self {
        Currency(code.into().to_uppercase())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exact monetary amount stored as integer minor units (cents) to guarantee
/// two-fractional-digit precision across encode/decode cycles (no floats).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(pub i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(0);

    /// Build from a whole-and-cents pair, e.g. `Money::from_major_minor(12, 50)` = $12.50.
    pub fn from_major_minor(major: i64, minor: i64) -> Self {
        Money(major * 100 + minor)
    }

    /// Build from a decimal string with at most two fractional digits (e.g. "12.50").
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let neg = s.starts_with('-');
        let s = s.trim_start_matches('-');
        let mut parts = s.splitn(2, '.');
        let major: i64 = parts.next()?.parse().ok()?;
        let minor_str = parts.next().unwrap_or("0");
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().ok()? * 10,
            _ => minor_str[..2].parse().ok()?,
        };
        let cents = major * 100 + minor;
        Some(Money(if neg { -cents } else { cents }))
    }

    /// Render as a decimal string with exactly two fractional digits.
    pub fn to_decimal_string(self) -> String {
        let neg = self.0 < 0;
        let abs = self.0.unsigned_abs();
        let major = abs / 100;
        let minor = abs % 100;
        format!("{}{}.{:02}", if neg { "-" } else { "" }, major, minor)
    }

    /// Value as a floating-point number of major units, for ranking/sorting only.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

/// A point in time expressed as integer ticks, comparable and orderable
/// without float or calendar arithmetic. Ticks are opaque to this engine;
/// the authoritative store defines their epoch and resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticks(pub i64);

impl Ticks {
    /// Construct from a raw tick count.
    pub fn new(v: i64) -> Self {
        Ticks(v)
    }

    /// Ticks per day, in this engine's chosen unit of milliseconds since the
    /// Unix epoch.
    pub const ONE_DAY: i64 = 86_400_000;

    /// The current instant, in milliseconds since the Unix epoch. Used by the
    /// document builder for "today's one-night window" and by
    /// the maintainer for timestamping mutations.
    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Ticks(millis)
    }

    /// This tick plus `days` whole days.
    pub fn plus_days(self, days: i64) -> Self {
        Ticks(self.0 + days * Self::ONE_DAY)
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
