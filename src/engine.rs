use thiserror::Error;
use tracing::{debug, info};

use crate::{
    Song,
    assign::{self, ConfigError, Motor},
    events::{Percussion, Ticks},
    project::ProjectError,
    timing::{self, CommandRecord, ScheduledCommand, TempoTimeline, TimelineError},
};

/// The finished arrangement: which motor plays what, and every command the
/// player will execute.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    pub motors: Vec<Motor>,
    pub percussion: Vec<Percussion>,
    pub commands: Vec<ScheduledCommand>,
    pub end_time: Ticks,
}

impl Arrangement {
    pub fn records(&self) -> Vec<CommandRecord> {
        timing::group_records(&self.commands)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid tempo map: {0}")]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Project(#[from] ProjectError),
}

pub fn arrange(song: &Song) -> Result<Arrangement, EngineError> {
    song.config.validate()?;

    let timeline = TempoTimeline::new(song.tempo.iter().copied())?;
    debug!(tempo_changes = timeline.entries().len(), "built tempo timeline");

    let decoded = song.decode(&timeline)?;
    debug!(
        notes = decoded.notes.len(),
        percussion = decoded.percussion.len(),
        "decoded song"
    );

    let motors = assign::assign(&decoded.notes, &song.config);
    let commands = timing::schedule_commands(&motors, &decoded.percussion);
    let end_time = timing::song_end_time(&motors, &decoded.percussion);

    info!(
        song = %song.name,
        motors = motors.len(),
        commands = commands.len(),
        end_time,
        "arranged song"
    );

    Ok(Arrangement {
        motors,
        percussion: decoded.percussion,
        commands,
        end_time,
    })
}
