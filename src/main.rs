use std::path::{Path, PathBuf};
use std::process::ExitCode;

use motorize::{Arrangement, Song, arrange};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: motorize <song.ron>");
        return ExitCode::FAILURE;
    };

    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let song = Song::load(path)?;
    let arrangement = arrange(&song)?;
    print_arrangement(&song, &arrangement);
    Ok(())
}

fn print_arrangement(song: &Song, arrangement: &Arrangement) {
    println!("{}", song.name);
    for motor in &arrangement.motors {
        println!(
            "  motor {:>2}: {:>4} notes, {:>4}.{:02}s playing",
            motor.index(),
            motor.notes().len(),
            motor.on_time() / 100,
            motor.on_time() % 100
        );
    }
    println!(
        "  {} percussion hits, {} commands in {} records, ends at {}.{:02}s",
        arrangement.percussion.len(),
        arrangement.commands.len(),
        arrangement.records().len(),
        arrangement.end_time / 100,
        arrangement.end_time % 100
    );
}
