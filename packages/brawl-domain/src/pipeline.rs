use crate::{Direction, StoreFilter};

/// Value a group key is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupExpr {
	/// UTC calendar day of `epoch`, formatted `YYYY-MM-DD`.
	EpochDay,
	/// Numeric field of the `battle` payload, null when absent or non-numeric.
	BattleNumber(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupKey {
	pub name: &'static str,
	pub expr: GroupExpr,
}

/// Reducer over the numeric `battle` fields of each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
	Count { name: &'static str },
	/// Sum of numeric values, `0` when none are present.
	Sum { name: &'static str, field: &'static str },
	/// Mean of numeric values, null when none are present.
	Avg { name: &'static str, field: &'static str },
}
impl Accumulator {
	pub fn name(&self) -> &'static str {
		match self {
			Self::Count { name } | Self::Sum { name, .. } | Self::Avg { name, .. } => *name,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSort {
	pub name: &'static str,
	pub direction: Direction,
}

/// Match, group, sort. Each output document is flat and keyed by the group key and
/// accumulator names.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
	pub filter: StoreFilter,
	pub group: Vec<GroupKey>,
	pub accumulators: Vec<Accumulator>,
	pub sort: Vec<OutputSort>,
}
impl Pipeline {
	/// Whether a group key or accumulator is named `name`.
	pub fn has_output(&self, name: &str) -> bool {
		self.group.iter().any(|key| key.name == name)
			|| self.accumulators.iter().any(|acc| acc.name() == name)
	}
}
