mod scheduler;
mod tempo;

pub use scheduler::{
    CommandRecord, MotorCommand, ScheduledCommand, group_records, schedule_commands,
    song_end_time, step_period,
};
pub use tempo::{
    BEATS_PER_MEASURE, DEFAULT_BPM, NoteSpan, TempoEntry, TempoTimeline, TimelineError,
};
