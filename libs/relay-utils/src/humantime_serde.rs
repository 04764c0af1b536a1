//! Serde adapter for `std::time::Duration` written as human-readable strings.
//!
//! Config files spell timeouts as `"30s"`, `"1m 30s"` or `"250ms"`; this
//! module parses and prints them with the `humantime` crate.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Timeouts {
//!     #[serde(with = "relay_utils::humantime_serde")]
//!     request: Duration,
//! }
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserializer, Serializer, de};

struct DurationVisitor;

impl de::Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration such as \"30s\" or \"1m 30s\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
        humantime::parse_duration(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

/// Deserialize a `Duration` from a humantime string.
///
/// # Errors
/// Returns the deserializer's error when the value is not a string or cannot be parsed.
pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    d.deserialize_str(DurationVisitor)
}

/// Serialize a `Duration` as a humantime string.
///
/// # Errors
/// Returns the serializer's error.
pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&humantime::format_duration(*value))
}
