use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace};

use super::ScoreNotes;
use super::motor::Motor;
use crate::events::Note;

pub const DEFAULT_CONFLICT_TOLERANCE: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignConfig {
    /// Keep each voice on its own motors before joining tracks. When false the
    /// whole score is treated as a single voice.
    pub preserve_voices: bool,
    /// Largest fraction of overlapping playtime at which two motors of the
    /// same voice are still forced onto one.
    pub conflict_tolerance: f64,
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            preserve_voices: true,
            conflict_tolerance: DEFAULT_CONFLICT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("conflict tolerance must be a non-negative number, got {0}")]
    InvalidTolerance(f64),
}

impl AssignConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.conflict_tolerance.is_finite() || self.conflict_tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(self.conflict_tolerance));
        }
        Ok(())
    }
}

/// Assigns every note of the score to a motor. The returned motors are ordered
/// by how long they play, busiest first, and indexed accordingly.
pub fn assign(score: &ScoreNotes, config: &AssignConfig) -> Vec<Motor> {
    let mut motors = if config.preserve_voices {
        assign_by_voice(score, config.conflict_tolerance)
    } else {
        condensing_assign(&score.chronological())
    };

    order_by_on_time(&mut motors);
    info!(
        notes = score.len(),
        motors = motors.len(),
        preserve_voices = config.preserve_voices,
        "assigned notes to motors"
    );
    motors
}

fn assign_by_voice(score: &ScoreNotes, tolerance: f64) -> Vec<Motor> {
    let mut motors = Vec::new();

    for run in score.voice_runs() {
        let mut voice_motors = condensing_assign(run);
        let colored = voice_motors.len();
        reduce_voice(&mut voice_motors, tolerance);
        debug!(
            voice = run[0].voice,
            notes = run.len(),
            colored,
            reduced = voice_motors.len(),
            "assigned voice"
        );
        motors.extend(voice_motors);
    }

    renumber(&mut motors);
    join_tracks(&mut motors);
    motors
}

/// Greedy first-fit coloring: each note goes on the lowest-numbered motor that
/// is idle at the note's start, and a new motor is added when none is.
///
/// `notes` must be sorted by start time. Under that ordering the result uses
/// the fewest motors any assignment of these notes could.
pub fn condensing_assign(notes: &[Note]) -> Vec<Motor> {
    let mut motors: Vec<Motor> = Vec::new();

    for note in notes {
        let slot = match motors.iter().position(|m| !m.is_in_use(note.start_time)) {
            Some(slot) => slot,
            None => {
                motors.push(Motor::new(motors.len()));
                motors.len() - 1
            }
        };
        trace!(motor = slot, "{note}");
        motors[slot].add_note(*note);
    }

    motors
}

/// Folds motors of a single voice into its first motor while their overlap
/// stays within `tolerance`. Overlapping notes get shortened.
fn reduce_voice(motors: &mut Vec<Motor>, tolerance: f64) {
    loop {
        let mut merged = false;
        let mut n = 1;
        while n < motors.len() {
            let conflict = motors[0].percent_conflict(&motors[n]);
            debug!(motor = motors[n].index(), conflict, "conflict with first motor");
            if conflict <= tolerance {
                let other = motors.remove(n);
                motors[0].force_combine(other);
                merged = true;
            } else {
                n += 1;
            }
        }
        if !merged || motors.len() <= 1 {
            break;
        }
    }
}

/// Repeatedly merges any two motors that never play at the same time, keeping
/// the lower-indexed one, until no such pair is left.
fn join_tracks(motors: &mut Vec<Motor>) {
    while let Some((keep, drop)) = find_joinable_pair(motors) {
        let absorbed = motors.remove(drop);
        debug!(
            keep = motors[keep].index(),
            drop = absorbed.index(),
            "joining motors"
        );
        motors[keep].absorb(absorbed);
    }
}

/// Highest index first. Returns `(lower, higher)` positions.
fn find_joinable_pair(motors: &[Motor]) -> Option<(usize, usize)> {
    (0..motors.len()).rev().find_map(|high| {
        (0..high)
            .rev()
            .find(|&low| !motors[high].conflicts_with(&motors[low]))
            .map(|low| (low, high))
    })
}

fn order_by_on_time(motors: &mut [Motor]) {
    motors.sort_by_cached_key(|m| Reverse(m.on_time()));
    renumber(motors);
}

fn renumber(motors: &mut [Motor]) {
    for (index, motor) in motors.iter_mut().enumerate() {
        motor.set_index(index);
    }
}
