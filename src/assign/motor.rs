use serde::{Deserialize, Serialize};

use crate::events::{Note, Ticks};

/// Half-open span `[start, end)` during which a motor is busy with a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInterval {
    pub start: Ticks,
    pub end: Ticks,
}

impl UsageInterval {
    pub fn of(note: &Note) -> Self {
        Self {
            start: note.start_time,
            end: note.end_time(),
        }
    }

    pub fn len(&self) -> Ticks {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, time: Ticks) -> bool {
        time >= self.start && time < self.end
    }

    pub fn overlaps(&self, other: &UsageInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn overlap(&self, other: &UsageInterval) -> Ticks {
        self.end
            .min(other.end)
            .saturating_sub(self.start.max(other.start))
    }
}

/// One physical actuator and the notes it plays.
///
/// `notes` and `intervals` are kept in lock-step: `intervals[i]` is always the
/// usage interval of `notes[i]`, and the intervals are sorted by start and
/// never overlap each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Motor {
    index: usize,
    notes: Vec<Note>,
    intervals: Vec<UsageInterval>,
}

impl Motor {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            notes: Vec::new(),
            intervals: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn intervals(&self) -> &[UsageInterval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Appends a note. The note must start no earlier than every note already
    /// on this motor and must not overlap any of them.
    pub fn add_note(&mut self, note: Note) {
        let interval = UsageInterval::of(&note);
        debug_assert!(
            self.intervals
                .last()
                .is_none_or(|last| last.start <= interval.start && !last.overlaps(&interval)),
            "{note} added out of order to motor {}",
            self.index
        );
        self.notes.push(note);
        self.intervals.push(interval);
    }

    /// Only looks at the most recently added note, which is enough as long as
    /// notes arrive in start order.
    pub fn is_in_use(&self, time: Ticks) -> bool {
        self.intervals
            .last()
            .is_some_and(|last| last.contains(time))
    }

    /// Total time this motor spends playing.
    pub fn on_time(&self) -> u64 {
        self.intervals.iter().map(|i| i.len() as u64).sum()
    }

    pub fn conflicts_with(&self, other: &Motor) -> bool {
        let mut conflict = false;
        sweep(&self.intervals, &other.intervals, |a, b| {
            conflict = a.overlaps(b);
            conflict
        });
        conflict
    }

    /// Time both motors spend playing at once, as a fraction of the busier
    /// motor's on-time.
    pub fn percent_conflict(&self, other: &Motor) -> f64 {
        let larger = self.on_time().max(other.on_time());
        if larger == 0 {
            return 0.0;
        }

        let mut overlap = 0u64;
        sweep(&self.intervals, &other.intervals, |a, b| {
            overlap += a.overlap(b) as u64;
            false
        });
        overlap as f64 / larger as f64
    }

    /// Merges `other` into this motor even though the two may overlap. Where a
    /// note would still be sounding when the next one starts, it is cut short
    /// at that start; a note cut down to nothing is dropped.
    pub fn force_combine(&mut self, other: Motor) {
        let merged = merge_by_start(std::mem::take(&mut self.notes), other.notes);
        self.intervals.clear();

        for note in merged {
            let incoming = UsageInterval::of(&note);
            if self
                .intervals
                .last()
                .is_some_and(|last| last.overlaps(&incoming))
            {
                self.truncate_last(incoming.start);
            }
            self.add_note(note);
        }
    }

    /// Merges a motor that does not conflict with this one. Nothing is lost.
    pub fn absorb(&mut self, other: Motor) {
        debug_assert!(!self.conflicts_with(&other));
        self.notes = merge_by_start(std::mem::take(&mut self.notes), other.notes);
        self.intervals = self.notes.iter().map(UsageInterval::of).collect();
    }

    fn truncate_last(&mut self, end: Ticks) {
        let Some(start) = self.notes.last().map(|note| note.start_time) else {
            return;
        };
        if end <= start {
            self.notes.pop();
            self.intervals.pop();
            return;
        }
        if let Some(note) = self.notes.last_mut() {
            note.duration = end - start;
        }
        if let Some(interval) = self.intervals.last_mut() {
            interval.end = end;
        }
    }
}

/// Walks two sorted, internally non-overlapping interval lists in step,
/// visiting every pair that could overlap. Stops early when `visit` returns
/// true.
fn sweep(
    a: &[UsageInterval],
    b: &[UsageInterval],
    mut visit: impl FnMut(&UsageInterval, &UsageInterval) -> bool,
) {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if visit(&a[i], &b[j]) {
            return;
        }
        if a[i].end <= b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }
}

/// Merges two start-sorted lists. On equal start times the note from
/// `second` comes first, so when `force_combine` truncates it is the incoming
/// note that gets cut and the receiving motor's note keeps its full length.
fn merge_by_start(first: Vec<Note>, second: Vec<Note>) -> Vec<Note> {
    let mut merged = Vec::with_capacity(first.len() + second.len());
    let mut first = first.into_iter().peekable();
    let mut second = second.into_iter().peekable();

    loop {
        let take_first = match (first.peek(), second.peek()) {
            (Some(a), Some(b)) => a.start_time < b.start_time,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_first {
            first.next()
        } else {
            second.next()
        };
        merged.extend(next);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motor(index: usize, spans: &[(Ticks, Ticks)]) -> Motor {
        let mut motor = Motor::new(index);
        for &(start, duration) in spans {
            motor.add_note(Note::new(start, 440.0, duration, 0));
        }
        motor
    }

    fn spans(motor: &Motor) -> Vec<(Ticks, Ticks)> {
        motor
            .notes()
            .iter()
            .map(|n| (n.start_time, n.duration))
            .collect()
    }

    fn assert_lock_step(motor: &Motor) {
        assert_eq!(motor.notes().len(), motor.intervals().len());
        for (note, interval) in motor.notes().iter().zip(motor.intervals()) {
            assert_eq!(UsageInterval::of(note), *interval);
        }
        for pair in motor.intervals().windows(2) {
            assert!(pair[0].end <= pair[1].start, "{pair:?} overlap");
        }
    }

    #[test]
    fn in_use_only_checks_last_note() {
        let m = motor(0, &[(0, 40), (100, 50)]);
        assert!(!m.is_in_use(20));
        assert!(m.is_in_use(100));
        assert!(m.is_in_use(149));
        assert!(!m.is_in_use(150));
        assert!(!Motor::new(3).is_in_use(0));
    }

    #[test]
    fn detects_conflicts() {
        let a = motor(0, &[(0, 100), (200, 100)]);
        let b = motor(1, &[(100, 100), (300, 10)]);
        let c = motor(2, &[(250, 10)]);
        assert!(!a.conflicts_with(&b));
        assert!(!b.conflicts_with(&a));
        assert!(a.conflicts_with(&c));
        assert!(c.conflicts_with(&a));
        assert!(!a.conflicts_with(&Motor::new(9)));
    }

    #[test]
    fn percent_conflict_uses_busier_motor() {
        let a = motor(0, &[(0, 100)]);
        let b = motor(1, &[(90, 100), (300, 100)]);
        assert_eq!(a.on_time(), 100);
        assert_eq!(b.on_time(), 200);
        assert_eq!(a.percent_conflict(&b), 0.05);
        assert_eq!(b.percent_conflict(&a), 0.05);
        assert_eq!(Motor::new(0).percent_conflict(&Motor::new(1)), 0.0);
    }

    #[test]
    fn percent_conflict_is_symmetric() {
        let motors = [
            motor(0, &[(0, 30), (40, 30), (90, 200)]),
            motor(1, &[(10, 5), (20, 60), (100, 20), (130, 20), (400, 7)]),
            motor(2, &[(5, 500)]),
            motor(3, &[(289, 1), (295, 1)]),
        ];
        for a in &motors {
            for b in &motors {
                assert_eq!(a.percent_conflict(b), b.percent_conflict(a));
            }
        }
    }

    #[test]
    fn force_combine_truncates_overlapping_notes() {
        let mut a = motor(0, &[(0, 100), (200, 50)]);
        let b = motor(1, &[(90, 50), (400, 10)]);
        a.force_combine(b);

        assert_eq!(spans(&a), vec![(0, 90), (90, 50), (200, 50), (400, 10)]);
        assert_lock_step(&a);
    }

    #[test]
    fn force_combine_keeps_receiving_note_on_shared_start() {
        let mut a = Motor::new(0);
        a.add_note(Note::new(0, 440.0, 100, 0));
        a.add_note(Note::new(150, 440.0, 10, 0));
        let mut b = Motor::new(1);
        b.add_note(Note::new(0, 220.0, 40, 0));
        a.force_combine(b);

        let audible: Vec<(Ticks, f64, Ticks)> = a
            .notes()
            .iter()
            .map(|n| (n.start_time, n.frequency, n.duration))
            .collect();
        assert_eq!(audible, vec![(0, 440.0, 100), (150, 440.0, 10)]);
        assert_lock_step(&a);
    }

    #[test]
    fn absorb_interleaves_without_loss() {
        let mut a = motor(0, &[(0, 10), (40, 10)]);
        let b = motor(5, &[(20, 10), (60, 10)]);
        a.absorb(b);

        assert_eq!(a.index(), 0);
        assert_eq!(spans(&a), vec![(0, 10), (20, 10), (40, 10), (60, 10)]);
        assert_lock_step(&a);
    }
}
