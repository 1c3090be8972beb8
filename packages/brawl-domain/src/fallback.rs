//! Query relaxation used when the requested window holds no records.
//!
//! Retrieval walks [`Provenance::Exact`], then [`Provenance::ForwardRelaxed`], then
//! [`Provenance::BackwardRelaxed`], stopping at the first attempt that returns records. Each
//! attempt is derived from the requested filter, never from the previous attempt.

use serde::Serialize;

use crate::{Condition, FilterSpec, FindQuery, SortOrder, compose};

/// Which attempt produced a retrieval result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Provenance {
	/// The composed query as requested.
	Exact,
	/// Upper epoch bound dropped, newest single record.
	ForwardRelaxed,
	/// Lower epoch bound re-applied as an upper bound, oldest single record.
	BackwardRelaxed,
}
impl Provenance {
	pub const ORDER: [Self; 3] = [Self::Exact, Self::ForwardRelaxed, Self::BackwardRelaxed];

	pub fn is_forced(self) -> bool {
		!matches!(self, Self::Exact)
	}
}

/// Returns the query for `attempt`, or `None` when the attempt does not apply.
///
/// Backward relaxation needs a lower bound to mirror; without one it is skipped. Its query
/// would carry no epoch constraint at all, which the forward attempt already covered.
pub fn plan(spec: &FilterSpec, attempt: Provenance) -> Option<FindQuery> {
	let exact = compose(spec);

	match attempt {
		Provenance::Exact => Some(exact),
		Provenance::ForwardRelaxed => {
			let filter =
				exact.filter.retain(|condition| !matches!(condition, Condition::EpochAtMost(_)));

			Some(FindQuery { filter, sort: SortOrder::epoch_descending(), limit: 1, ..exact })
		},
		Provenance::BackwardRelaxed => {
			let lower = spec.start?;
			let filter = exact
				.filter
				.retain(|condition| {
					!matches!(condition, Condition::EpochAtLeast(_) | Condition::EpochAtMost(_))
				})
				.with(Condition::EpochAtMost(lower));

			Some(FindQuery { filter, sort: SortOrder::epoch_ascending(), limit: 1, ..exact })
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Epoch, Projection, parse_params};

	fn epoch(millis: i64) -> Epoch {
		Epoch::from_millis(millis).expect("Epoch must be in range.")
	}

	#[test]
	fn exact_attempt_is_the_composed_query() {
		let spec = parse_params([("start_time", "1000"), ("limit", "5")]);

		assert_eq!(plan(&spec, Provenance::Exact), Some(compose(&spec)));
	}

	#[test]
	fn forward_drops_only_the_upper_bound() {
		let spec = parse_params([
			("start_time", "1000"),
			("end_time", "2000"),
			("mode", r#"["soloShowdown"]"#),
			("sort", r#"{"battle.rank": 1}"#),
			("project", r#"{"epoch": 1}"#),
			("limit", "50"),
		]);
		let query = plan(&spec, Provenance::ForwardRelaxed).expect("Forward attempt must apply.");

		assert_eq!(
			query.filter.conditions(),
			&[
				Condition::EpochAtLeast(epoch(1_000)),
				Condition::ModeIn(vec!["soloShowdown".to_string()]),
			]
		);
		assert_eq!(query.sort, SortOrder::epoch_descending());
		assert_eq!(query.limit, 1);
		assert_eq!(query.projection, Projection::include(["epoch"]));
	}

	#[test]
	fn backward_mirrors_the_lower_bound() {
		let spec = parse_params([("start_time", "1000"), ("end_time", "2000"), ("ranked", "1")]);
		let query = plan(&spec, Provenance::BackwardRelaxed).expect("Backward attempt must apply.");

		assert_eq!(
			query.filter.conditions(),
			&[Condition::Ranked(true), Condition::EpochAtMost(epoch(1_000))]
		);
		assert_eq!(query.sort, SortOrder::epoch_ascending());
		assert_eq!(query.limit, 1);
	}

	#[test]
	fn backward_is_skipped_without_lower_bound() {
		let spec = parse_params([("end_time", "2000")]);

		assert!(plan(&spec, Provenance::BackwardRelaxed).is_none());
	}

	#[test]
	fn only_exact_is_unforced() {
		assert!(!Provenance::Exact.is_forced());
		assert!(Provenance::ForwardRelaxed.is_forced());
		assert!(Provenance::BackwardRelaxed.is_forced());
	}
}
