mod assigner;
mod input;
mod motor;

pub use assigner::{
    AssignConfig, ConfigError, DEFAULT_CONFLICT_TOLERANCE, assign, condensing_assign,
};
pub use input::{AssignError, ScoreNotes};
pub use motor::{Motor, UsageInterval};
