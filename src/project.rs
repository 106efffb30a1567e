use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::{
    assign::{AssignConfig, ScoreNotes},
    events::{Note, Percussion, PercussionKind, Ticks, voice_order},
    timing::{TempoEntry, TempoTimeline},
};

/// A pitched note positioned in musical time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreNote {
    pub voice: u32,
    /// Measures from the start of the song
    pub measure: f64,
    /// Measures
    pub length: f64,
    /// Hz, 0 for a silent placeholder
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePercussion {
    pub measure: f64,
    pub kind: PercussionKind,
}

/// An already-decoded score together with the settings used to arrange it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub name: String,
    #[serde(default)]
    pub tempo: Vec<TempoEntry>,
    #[serde(default)]
    pub notes: Vec<ScoreNote>,
    #[serde(default)]
    pub percussion: Vec<ScorePercussion>,
    #[serde(default)]
    pub config: AssignConfig,
}

/// Song events converted to real time.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSong {
    pub notes: ScoreNotes,
    pub percussion: Vec<Percussion>,
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to access song file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse song file: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize song: {0}")]
    Serialize(#[from] ron::Error),
    #[error("note {index} is invalid: {reason}")]
    InvalidNote { index: usize, reason: &'static str },
    #[error("percussion hit {index} has invalid measure {measure}")]
    InvalidPercussion { index: usize, measure: f64 },
    #[error("event ending at measure {measure} falls past the last schedulable tick")]
    PastEndOfClock { measure: f64 },
}

impl Song {
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, ron_string)?;

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let ron_string = fs::read_to_string(path)?;
        Self::parse(&ron_string)
    }

    pub fn parse(ron_string: &str) -> Result<Self, ProjectError> {
        let song: Song = ron::from_str(ron_string)?;
        Ok(song)
    }

    /// Places every note and percussion hit in real time. Notes come out
    /// grouped by voice and sorted by start within each voice.
    pub fn decode(&self, timeline: &TempoTimeline) -> Result<DecodedSong, ProjectError> {
        let mut notes = Vec::with_capacity(self.notes.len());
        for (index, note) in self.notes.iter().enumerate() {
            check_note(note).map_err(|reason| ProjectError::InvalidNote { index, reason })?;
            check_in_range(timeline, note.measure + note.length)?;
            let span = timeline.quantize_note(note.measure, note.length);
            notes.push(Note::new(span.start, note.frequency, span.duration, note.voice));
        }
        notes.sort_by(voice_order);

        let mut percussion = Vec::with_capacity(self.percussion.len());
        for (index, hit) in self.percussion.iter().enumerate() {
            if !is_position(hit.measure) {
                return Err(ProjectError::InvalidPercussion {
                    index,
                    measure: hit.measure,
                });
            }
            check_in_range(timeline, hit.measure)?;
            percussion.push(Percussion {
                start_time: timeline.quantize_position(hit.measure),
                kind: hit.kind,
            });
        }
        percussion.sort_by_key(|p| p.start_time);

        Ok(DecodedSong {
            notes: ScoreNotes::from_unordered(notes),
            percussion,
        })
    }
}

fn is_position(measure: f64) -> bool {
    measure.is_finite() && measure >= 0.0
}

/// Every tick up to the end of an event has to fit in [`Ticks`].
fn check_in_range(timeline: &TempoTimeline, measure: f64) -> Result<(), ProjectError> {
    if timeline.measure_to_time(measure).round() > Ticks::MAX as f64 {
        return Err(ProjectError::PastEndOfClock { measure });
    }
    Ok(())
}

fn check_note(note: &ScoreNote) -> Result<(), &'static str> {
    if !is_position(note.measure) {
        return Err("measure must be a non-negative number");
    }
    if !note.length.is_finite() || note.length <= 0.0 {
        return Err("length must be positive");
    }
    if !note.frequency.is_finite() || note.frequency < 0.0 {
        return Err("frequency must be a non-negative number");
    }
    Ok(())
}
