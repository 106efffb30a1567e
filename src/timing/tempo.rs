use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::Ticks;

pub const DEFAULT_BPM: u32 = 120;
pub const BEATS_PER_MEASURE: f64 = 4.0;
const HUNDREDTHS_PER_MINUTE: f64 = 6000.0;

/// A tempo change taking effect at `measure_offset` (in measures, with beats
/// expressed as a fraction of a measure).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEntry {
    pub measure_offset: f64,
    pub bpm: u32,
}

impl TempoEntry {
    pub fn new(measure_offset: f64, bpm: u32) -> Self {
        Self { measure_offset, bpm }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("tempo change {index} at measure {offset} comes before the previous change at {previous}")]
    OutOfOrder {
        index: usize,
        offset: f64,
        previous: f64,
    },
    #[error("tempo change {index} has invalid measure offset {offset}")]
    InvalidOffset { index: usize, offset: f64 },
    #[error("tempo change {index} has a tempo of 0 bpm")]
    ZeroTempo { index: usize },
}

/// Where a note lands in real time once the tempo map has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteSpan {
    pub start: Ticks,
    pub duration: Ticks,
}

/// Piecewise-constant tempo function over measure space. Entries are kept in
/// the order they were supplied, which must be non-decreasing by offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempoTimeline {
    entries: Vec<TempoEntry>,
}

impl TempoTimeline {
    pub fn new(entries: impl IntoIterator<Item = TempoEntry>) -> Result<Self, TimelineError> {
        let mut timeline = Self::default();
        for entry in entries {
            timeline.push(entry)?;
        }
        Ok(timeline)
    }

    pub fn push(&mut self, entry: TempoEntry) -> Result<(), TimelineError> {
        let index = self.entries.len();
        if !entry.measure_offset.is_finite() || entry.measure_offset < 0.0 {
            return Err(TimelineError::InvalidOffset {
                index,
                offset: entry.measure_offset,
            });
        }
        if entry.bpm == 0 {
            return Err(TimelineError::ZeroTempo { index });
        }
        if let Some(last) = self.entries.last() {
            if entry.measure_offset < last.measure_offset {
                return Err(TimelineError::OutOfOrder {
                    index,
                    offset: entry.measure_offset,
                    previous: last.measure_offset,
                });
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[TempoEntry] {
        &self.entries
    }

    pub fn tempo_at_measure(&self, measure: f64) -> u32 {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.measure_offset <= measure)
            .map_or(DEFAULT_BPM, |entry| entry.bpm)
    }

    /// Elapsed time in hundredths of a second from the start of the song up to
    /// `measure`. Every segment is charged at its own tempo; anything before the
    /// first tempo change runs at [`DEFAULT_BPM`].
    pub fn measure_to_time(&self, measure: f64) -> f64 {
        let measure = measure.max(0.0);
        let mut time = 0.0;
        let mut segment_start = 0.0;
        let mut bpm = DEFAULT_BPM;

        for entry in &self.entries {
            if entry.measure_offset > measure {
                break;
            }
            time += measures_to_hundredths(entry.measure_offset - segment_start, bpm);
            segment_start = entry.measure_offset;
            bpm = entry.bpm;
        }

        time + measures_to_hundredths(measure - segment_start, bpm)
    }

    /// Real-time placement of a note starting at `measure` and lasting `length`
    /// measures. The note is released one tick early so that a note starting
    /// exactly where this one ends can go on the same motor.
    pub fn quantize_note(&self, measure: f64, length: f64) -> NoteSpan {
        let start = self.quantize_position(measure);
        let end = self.quantize_position(measure + length);
        NoteSpan {
            start,
            duration: end.saturating_sub(start).saturating_sub(1).max(1),
        }
    }

    pub fn quantize_position(&self, measure: f64) -> Ticks {
        self.measure_to_time(measure).round() as Ticks
    }
}

fn measures_to_hundredths(measures: f64, bpm: u32) -> f64 {
    measures * BEATS_PER_MEASURE * HUNDREDTHS_PER_MINUTE / bpm as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempo_change_timeline(change_at: f64) -> TempoTimeline {
        TempoTimeline::new([TempoEntry::new(0.0, 120), TempoEntry::new(change_at, 60)]).unwrap()
    }

    #[test]
    fn defaults_to_120_bpm() {
        let timeline = TempoTimeline::default();
        assert_eq!(timeline.tempo_at_measure(0.0), 120);
        assert_eq!(timeline.tempo_at_measure(12.5), 120);
        assert_eq!(timeline.measure_to_time(1.0), 200.0);

        let late_start = TempoTimeline::new([TempoEntry::new(2.0, 60)]).unwrap();
        assert_eq!(late_start.tempo_at_measure(1.99), 120);
        assert_eq!(late_start.measure_to_time(2.0), 400.0);
        assert_eq!(late_start.measure_to_time(3.0), 800.0);
    }

    #[test]
    fn single_tempo_is_linear() {
        let timeline = TempoTimeline::new([TempoEntry::new(0.0, 90)]).unwrap();
        let per_measure = timeline.measure_to_time(1.0);
        for i in 0..20 {
            let m = i as f64 * 0.75;
            assert!((timeline.measure_to_time(m) - per_measure * m).abs() < 1e-9);
        }
    }

    #[test]
    fn time_never_decreases() {
        let timeline = TempoTimeline::new([
            TempoEntry::new(0.0, 120),
            TempoEntry::new(1.0, 60),
            TempoEntry::new(1.0, 200),
            TempoEntry::new(2.5, 45),
            TempoEntry::new(4.0, 240),
        ])
        .unwrap();

        let mut previous = timeline.measure_to_time(0.0);
        for i in 1..=120 {
            let time = timeline.measure_to_time(i as f64 / 20.0);
            assert!(time >= previous, "time went backwards at step {i}");
            previous = time;
        }
    }

    #[test]
    fn boundary_uses_new_tempo() {
        let timeline = tempo_change_timeline(1.0);
        assert_eq!(timeline.tempo_at_measure(0.999), 120);
        assert_eq!(timeline.tempo_at_measure(1.0), 60);
        assert_eq!(timeline.measure_to_time(1.0), 200.0);
        assert_eq!(timeline.measure_to_time(1.25), 300.0);
    }

    #[test]
    fn halving_tempo_doubles_note_spacing() {
        let timeline = tempo_change_timeline(1.0);
        let starts: Vec<Ticks> = (0..8)
            .map(|i| timeline.quantize_position(i as f64 * 0.25))
            .collect();
        assert_eq!(starts, vec![0, 50, 100, 150, 200, 300, 400, 500]);
    }

    #[test]
    fn decoder_offset_tempo_change() {
        // Decoders report the change slightly after the bar line.
        let timeline = tempo_change_timeline(1.015);
        let before: Vec<Ticks> = (0..4)
            .map(|i| timeline.quantize_position(i as f64 * 0.25))
            .collect();
        let after: Vec<Ticks> = (0..4)
            .map(|i| timeline.quantize_position(1.015 + i as f64 * 0.25))
            .collect();
        assert_eq!(before, vec![0, 50, 100, 150]);
        assert_eq!(after, vec![203, 303, 403, 503]);
    }

    #[test]
    fn quantized_notes_leave_a_gap() {
        let timeline = tempo_change_timeline(1.0);
        assert_eq!(
            timeline.quantize_note(0.0, 0.25),
            NoteSpan {
                start: 0,
                duration: 49
            }
        );
        assert_eq!(
            timeline.quantize_note(1.0, 0.25),
            NoteSpan {
                start: 200,
                duration: 99
            }
        );
        // Straddles the change: a quarter measure at 120 then a quarter at 60.
        assert_eq!(
            timeline.quantize_note(0.75, 0.5),
            NoteSpan {
                start: 150,
                duration: 149
            }
        );
        // Too short to survive the release gap.
        assert_eq!(timeline.quantize_note(0.0, 0.001).duration, 1);
    }

    #[test]
    fn rejects_bad_entries() {
        let err = TempoTimeline::new([TempoEntry::new(2.0, 120), TempoEntry::new(1.0, 90)])
            .unwrap_err();
        assert_eq!(
            err,
            TimelineError::OutOfOrder {
                index: 1,
                offset: 1.0,
                previous: 2.0
            }
        );

        let err = TempoTimeline::new([TempoEntry::new(0.0, 0)]).unwrap_err();
        assert_eq!(err, TimelineError::ZeroTempo { index: 0 });

        let err = TempoTimeline::new([TempoEntry::new(f64::NAN, 100)]).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidOffset { index: 0, .. }));
    }
}
