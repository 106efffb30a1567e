use thiserror::Error;

use crate::events::{Note, Ticks, chronological_order, voice_order};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    #[error("note {index} in voice {voice} starts at {start}, before the previous note at {previous}")]
    OutOfOrder {
        index: usize,
        voice: u32,
        start: Ticks,
        previous: Ticks,
    },
}

/// A note stream grouped into contiguous runs by voice, each run sorted by
/// start time. Coloring relies on this ordering, so the assigner only accepts
/// notes through this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreNotes {
    notes: Vec<Note>,
}

impl ScoreNotes {
    pub fn new(notes: Vec<Note>) -> Result<Self, AssignError> {
        for (index, pair) in notes.windows(2).enumerate() {
            let (previous, note) = (&pair[0], &pair[1]);
            if previous.voice == note.voice && note.start_time < previous.start_time {
                return Err(AssignError::OutOfOrder {
                    index: index + 1,
                    voice: note.voice,
                    start: note.start_time,
                    previous: previous.start_time,
                });
            }
        }
        Ok(Self { notes })
    }

    pub fn from_unordered(mut notes: Vec<Note>) -> Self {
        notes.sort_by(voice_order);
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Contiguous runs of notes sharing a voice, in stream order.
    pub fn voice_runs(&self) -> impl Iterator<Item = &[Note]> {
        self.notes.chunk_by(|a, b| a.voice == b.voice)
    }

    /// Every note regardless of voice, by start time then pitch.
    pub fn chronological(&self) -> Vec<Note> {
        let mut notes = self.notes.clone();
        notes.sort_by(chronological_order);
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_sorted_voice_runs() {
        let score = ScoreNotes::new(vec![
            Note::new(0, 440.0, 10, 1),
            Note::new(20, 440.0, 10, 1),
            Note::new(5, 220.0, 10, 0),
            Note::new(5, 330.0, 10, 0),
            Note::new(0, 110.0, 10, 2),
        ])
        .unwrap();

        let runs: Vec<usize> = score.voice_runs().map(|run| run.len()).collect();
        assert_eq!(runs, vec![2, 2, 1]);
        assert_eq!(score.len(), 5);
    }

    #[test]
    fn rejects_time_going_backwards_within_a_voice() {
        let err = ScoreNotes::new(vec![
            Note::new(0, 440.0, 10, 0),
            Note::new(50, 440.0, 10, 0),
            Note::new(30, 440.0, 10, 0),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            AssignError::OutOfOrder {
                index: 2,
                voice: 0,
                start: 30,
                previous: 50
            }
        );
    }

    #[test]
    fn sorts_unordered_input() {
        let score = ScoreNotes::from_unordered(vec![
            Note::new(30, 440.0, 10, 1),
            Note::new(0, 440.0, 10, 1),
            Note::new(10, 440.0, 10, 0),
        ]);

        let order: Vec<(u32, Ticks)> = score
            .notes()
            .iter()
            .map(|n| (n.voice, n.start_time))
            .collect();
        assert_eq!(order, vec![(0, 10), (1, 0), (1, 30)]);

        let chronological: Vec<Ticks> = score
            .chronological()
            .iter()
            .map(|n| n.start_time)
            .collect();
        assert_eq!(chronological, vec![0, 10, 30]);
    }

    #[test]
    fn empty_score_has_no_runs() {
        let score = ScoreNotes::new(Vec::new()).unwrap();
        assert!(score.is_empty());
        assert_eq!(score.voice_runs().count(), 0);
    }
}
