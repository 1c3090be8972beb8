use crate::{Epoch, Projection, SortOrder};

/// Validated caller filter. Every field is independently optional; `None` means the
/// dimension is unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
	/// Inclusive lower bound on `epoch`.
	pub start: Option<Epoch>,
	/// Inclusive upper bound on `epoch`.
	pub end: Option<Epoch>,
	/// `Some(true)` keeps only ranked matches, `Some(false)` drops them.
	pub ranked: Option<bool>,
	/// `Some(true)` requires a `player` payload, `Some(false)` requires it to be absent.
	pub need_player: Option<bool>,
	pub brawlers: Option<Vec<String>>,
	pub modes: Option<Vec<String>>,
	/// `0` means unbounded.
	pub limit: u64,
	pub projection: Projection,
	pub sort: SortOrder,
}

/// Builds a [`FilterSpec`] from raw request parameters.
///
/// Each recognised parameter is parsed on its own. A value that fails to parse leaves its
/// field unconstrained without affecting the others. Unknown parameters are ignored and the
/// last occurrence of a repeated parameter wins.
pub fn parse_params<I, K, V>(params: I) -> FilterSpec
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	let mut spec = FilterSpec::default();

	for (key, value) in params {
		let value = value.as_ref();

		match key.as_ref() {
			"start_time" => spec.start = parse_leading_int(value).and_then(Epoch::from_millis),
			"end_time" => spec.end = parse_leading_int(value).and_then(Epoch::from_millis),
			"ranked" => spec.ranked = Some(value != "0"),
			"need_player" => spec.need_player = Some(value != "0"),
			"brawler" => spec.brawlers = parse_name_set(value),
			"mode" => spec.modes = parse_name_set(value),
			"limit" =>
				spec.limit = parse_leading_int(value)
					.and_then(|limit| u64::try_from(limit).ok())
					.unwrap_or(0),
			"project" => spec.projection = Projection::parse(value).unwrap_or_default(),
			"sort" => spec.sort = SortOrder::parse(value).unwrap_or_default(),
			_ => {},
		}
	}

	spec
}

/// Reads the leading base-10 integer of `raw`: optional whitespace, an optional sign and at
/// least one digit. Trailing characters are ignored, so `"1500ms"` yields `1500`.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
	let trimmed = raw.trim_start();
	let (negative, digits) = match trimmed.as_bytes().first() {
		Some(b'-') => (true, &trimmed[1..]),
		Some(b'+') => (false, &trimmed[1..]),
		_ => (false, trimmed),
	};
	let end = digits.bytes().take_while(u8::is_ascii_digit).count();

	if end == 0 {
		return None;
	}

	let magnitude = digits[..end].parse::<i64>().ok()?;

	Some(if negative { -magnitude } else { magnitude })
}

/// Parses an encoded list of names, e.g. `["Shelly","Colt"]`.
fn parse_name_set(raw: &str) -> Option<Vec<String>> {
	serde_json::from_str::<Vec<String>>(raw).ok()
}
