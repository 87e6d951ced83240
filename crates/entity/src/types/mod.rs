mod difficulty_tier;
mod mod_log_kind;

pub use difficulty_tier::*;
pub use mod_log_kind::*;
