//! Arranges a decoded musical score for a bank of stepper motors.
//!
//! Notes are placed in real time through a [`timing::TempoTimeline`], spread
//! over as few [`assign::Motor`]s as the heuristics manage, and finally
//! flattened into a tick-by-tick command schedule.

pub mod assign;
pub mod engine;
pub mod events;
pub mod project;
pub mod timing;

pub use engine::{Arrangement, EngineError, arrange};
pub use project::{DecodedSong, ProjectError, ScoreNote, ScorePercussion, Song};
