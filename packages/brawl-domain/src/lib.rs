pub mod battle_time;
pub mod client_state;
pub mod epoch;
pub mod fallback;
pub mod filter;
pub mod pipeline;
pub mod player;
pub mod projection;
pub mod query;
pub mod stats;

pub use epoch::Epoch;
pub use fallback::Provenance;
pub use filter::{FilterSpec, parse_params};
pub use projection::Projection;
pub use query::{Condition, Direction, FindQuery, SortKey, SortOrder, StoreFilter, compose};

/// `battle.type` value carried by ranked matches.
pub const RANKED_TYPE: &str = "ranked";
/// `battle.mode` value of solo-elimination matches.
pub const SOLO_SHOWDOWN_MODE: &str = "soloShowdown";
