use serde::{Deserialize, Serialize};

use crate::assign::Motor;
use crate::events::{Note, Percussion, PercussionKind, Ticks};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorCommand {
    Stop { motor: usize },
    /// Step the motor once every `period_us` microseconds.
    Play { motor: usize, period_us: u32 },
    Strike { kind: PercussionKind },
}

impl MotorCommand {
    /// Order among commands sharing a tick. A motor has to be stopped before
    /// it is told to play the next note, or the stop would silence it.
    fn rank(&self) -> u8 {
        match self {
            MotorCommand::Stop { .. } => 0,
            MotorCommand::Play { .. } => 1,
            MotorCommand::Strike { .. } => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCommand {
    pub time: Ticks,
    pub command: MotorCommand,
}

/// Everything the player has to do on a single tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub time: Ticks,
    pub commands: Vec<MotorCommand>,
}

/// Microseconds between steps for a motor to sound at `frequency`, or `None`
/// when the rounded frequency is 0 and the motor should stay silent.
pub fn step_period(frequency: f64) -> Option<u32> {
    let hz = frequency.round();
    if hz < 1.0 {
        None
    } else {
        Some((1_000_000.0 / hz) as u32)
    }
}

pub fn schedule_commands(motors: &[Motor], percussion: &[Percussion]) -> Vec<ScheduledCommand> {
    let note_count: usize = motors.iter().map(|m| m.notes().len()).sum();
    let mut commands = Vec::with_capacity(note_count * 2 + percussion.len());

    for motor in motors {
        let index = motor.index();
        for note in motor.notes() {
            let start = match step_period(note.frequency) {
                Some(period_us) => MotorCommand::Play {
                    motor: index,
                    period_us,
                },
                None => MotorCommand::Stop { motor: index },
            };
            commands.push(ScheduledCommand {
                time: note.start_time,
                command: start,
            });
            commands.push(ScheduledCommand {
                time: note.end_time(),
                command: MotorCommand::Stop { motor: index },
            });
        }
    }

    for hit in percussion {
        commands.push(ScheduledCommand {
            time: hit.start_time,
            command: MotorCommand::Strike { kind: hit.kind },
        });
    }

    commands.sort_by_key(|c| (c.time, c.command.rank()));
    commands
}

pub fn group_records(commands: &[ScheduledCommand]) -> Vec<CommandRecord> {
    commands
        .chunk_by(|a, b| a.time == b.time)
        .map(|group| CommandRecord {
            time: group[0].time,
            commands: group.iter().map(|c| c.command).collect(),
        })
        .collect()
}

/// When the last note stops or the last percussion hit lands.
pub fn song_end_time(motors: &[Motor], percussion: &[Percussion]) -> Ticks {
    let notes_end = motors
        .iter()
        .filter_map(|m| m.notes().last().map(Note::end_time))
        .max()
        .unwrap_or(0);
    let percussion_end = percussion.iter().map(|p| p.start_time).max().unwrap_or(0);
    notes_end.max(percussion_end)
}
