use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Length of the `YYYYMMDDTHHMMSS` prefix that carries the timestamp.
const STAMP_LEN: usize = 15;

#[derive(Debug, thiserror::Error)]
pub enum BattleTimeError {
	#[error("Battle time {raw:?} does not start with YYYYMMDDTHHMMSS.")]
	Malformed { raw: String },
	#[error("Battle time {raw:?} is out of range.")]
	OutOfRange { raw: String, source: time::error::ComponentRange },
}

/// Parses a compact raw battle time such as `20201104T195254.000Z`.
///
/// Only the leading `YYYYMMDDTHHMMSS` is read; any fractional or zone suffix is ignored and
/// the value is taken as UTC.
pub fn parse_battle_time(raw: &str) -> Result<OffsetDateTime, BattleTimeError> {
	let malformed = || BattleTimeError::Malformed { raw: raw.to_string() };
	let stamp = raw.get(..STAMP_LEN).ok_or_else(malformed)?.as_bytes();

	if stamp[8] != b'T' {
		return Err(malformed());
	}

	let field = |range: std::ops::Range<usize>| -> Result<u16, BattleTimeError> {
		let digits = &stamp[range];

		if !digits.iter().all(u8::is_ascii_digit) {
			return Err(malformed());
		}

		Ok(digits.iter().fold(0_u16, |acc, digit| acc * 10 + u16::from(digit - b'0')))
	};
	let year = field(0..4)?;
	let month = field(4..6)?;
	let day = field(6..8)?;
	let hour = field(9..11)?;
	let minute = field(11..13)?;
	let second = field(13..15)?;
	let out_of_range = |source| BattleTimeError::OutOfRange { raw: raw.to_string(), source };
	let month = Month::try_from(month as u8).map_err(out_of_range)?;
	let date = Date::from_calendar_date(i32::from(year), month, day as u8).map_err(out_of_range)?;
	let time = Time::from_hms(hour as u8, minute as u8, second as u8).map_err(out_of_range)?;

	Ok(PrimitiveDateTime::new(date, time).assume_utc())
}
