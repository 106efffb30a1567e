use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Hundredths of a second since the start of the song. The player checks for
/// new commands 100 times per second, so this is the finest unit we schedule.
pub type Ticks = u32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub start_time: Ticks,
    /// Hz
    pub frequency: f64,
    pub duration: Ticks,
    pub voice: u32,
}

impl Note {
    pub fn new(start_time: Ticks, frequency: f64, duration: Ticks, voice: u32) -> Self {
        Self {
            start_time,
            frequency,
            duration,
            voice,
        }
    }

    pub fn end_time(&self) -> Ticks {
        self.start_time + self.duration
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Note {} at {} until {}",
            self.frequency,
            Seconds(self.start_time),
            Seconds(self.end_time())
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PercussionKind {
    AcousticBassDrum,
    BassDrum,
    SideStick,
    AcousticSnare,
    HandClap,
    ElectricSnare,
    LoFloorTom,
    ClosedHiHat,
    HighFloorTom,
    PedalHiHat,
    LoTom,
    OpenHiHat,
    LoMidTom,
    HiMidTom,
    CrashCymbal1,
    HiTom,
    RideCymbal1,
    ChineseCymbal,
    RideBell,
    Tambourine,
    SplashCymbal,
    Cowbell,
    CrashCymbal2,
    Vibraslap,
    RideCymbal2,
    HiBongo,
    LoBongo,
    MuteHiConga,
    OpenHiConga,
    LoConga,
    HiTimbale,
    LoTimbale,
    HiAgogo,
    LoAgogo,
    Cabasa,
    Maracas,
    ShortWhistle,
    LongWhistle,
    ShortGuiro,
    LongGuiro,
    Claves,
    HiWoodBlock,
    LoWoodBlock,
    MuteCuica,
    OpenCuica,
    MuteTriangle,
    OpenTriangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Percussion {
    pub start_time: Ticks,
    pub kind: PercussionKind,
}

impl fmt::Display for Percussion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Percussion {:?} at {}", self.kind, Seconds(self.start_time))
    }
}

/// Anything the player can be told to do at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MusicEvent {
    Note(Note),
    Percussion(Percussion),
}

impl MusicEvent {
    pub fn start_time(&self) -> Ticks {
        match self {
            MusicEvent::Note(note) => note.start_time,
            MusicEvent::Percussion(hit) => hit.start_time,
        }
    }

    /// Percussion is a strike with no sustain, so its duration is always 0.
    pub fn duration(&self) -> Ticks {
        match self {
            MusicEvent::Note(note) => note.duration,
            MusicEvent::Percussion(_) => 0,
        }
    }
}

impl From<Note> for MusicEvent {
    fn from(note: Note) -> Self {
        MusicEvent::Note(note)
    }
}

impl From<Percussion> for MusicEvent {
    fn from(hit: Percussion) -> Self {
        MusicEvent::Percussion(hit)
    }
}

/// Start time, then pitch.
pub fn chronological_order(a: &Note, b: &Note) -> Ordering {
    a.start_time
        .cmp(&b.start_time)
        .then_with(|| a.frequency.total_cmp(&b.frequency))
}

/// Voice, then start time, then pitch.
pub fn voice_order(a: &Note, b: &Note) -> Ordering {
    a.voice
        .cmp(&b.voice)
        .then_with(|| chronological_order(a, b))
}

struct Seconds(Ticks);

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}s", self.0 / 100, self.0 % 100)
    }
}
