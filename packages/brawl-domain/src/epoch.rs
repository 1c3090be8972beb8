use std::fmt;

use serde::{Serialize, Serializer};
use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

const NANOS_PER_MILLI: i128 = 1_000_000;

/// A point in time carried in both client (milliseconds) and store form.
///
/// Construction rejects instants outside years 0000-9999 so the value always renders as
/// RFC 3339.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch {
	millis: i64,
	at: OffsetDateTime,
}
impl Epoch {
	pub fn from_millis(millis: i64) -> Option<Self> {
		let at =
			OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI).ok()?;

		Self::checked(millis, at)
	}

	pub fn from_datetime(at: OffsetDateTime) -> Option<Self> {
		let at = at.to_offset(UtcOffset::UTC);
		let millis = i64::try_from(at.unix_timestamp_nanos() / NANOS_PER_MILLI).ok()?;

		Self::checked(millis, at)
	}

	pub fn millis(self) -> i64 {
		self.millis
	}

	pub fn datetime(self) -> OffsetDateTime {
		self.at
	}

	pub fn to_rfc3339(self) -> String {
		format_rfc3339(self.at)
	}

	fn checked(millis: i64, at: OffsetDateTime) -> Option<Self> {
		if !(0..=9_999).contains(&at.year()) {
			return None;
		}

		Some(Self { millis, at })
	}
}
impl fmt::Debug for Epoch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Epoch({})", self.to_rfc3339())
	}
}
impl Serialize for Epoch {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_rfc3339())
	}
}

/// Formats a UTC timestamp the way records expose `epoch`.
///
/// Years outside 0000-9999 cannot be represented and render as an empty string.
pub fn format_rfc3339(at: OffsetDateTime) -> String {
	at.to_offset(UtcOffset::UTC).format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn millis_round_trip_through_datetime() {
		let epoch = Epoch::from_millis(1_604_519_574_123).expect("Epoch must be in range.");

		assert_eq!(epoch.to_rfc3339(), "2020-11-04T19:52:54.123Z");
		assert_eq!(Epoch::from_datetime(epoch.datetime()), Some(epoch));
	}

	#[test]
	fn rejects_years_beyond_four_digits() {
		assert!(Epoch::from_millis(i64::MAX).is_none());
		assert!(Epoch::from_millis(-62_167_219_200_001).is_none());
		assert!(Epoch::from_millis(-62_167_219_200_000).is_some());
	}
}
