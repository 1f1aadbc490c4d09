// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use clap::{crate_version, Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use melodia::config::EngineConfig;
use melodia::music::{misc, Instrument, NoteDuration, Pitch, Tempo};
use melodia::score::{self, ScoreBody};
use melodia::sound::Sound;
use melodia::{audio, Catalog, Scheduler};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// How often the CLI checks whether playback finished.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Catalog name the single-file commands load under.
const LOADED: &str = "loaded";

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A note and rhythm sound engine."
)]
struct Cli {
    /// Engine configuration file (YAML). MELODIA_* variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Plays a score, WAV or compressed audio file until it ends.
    Play {
        /// The file to play.
        path: PathBuf,
        /// The catalog name to load under (default: the path).
        #[arg(short, long)]
        name: Option<String>,
        /// Loop until interrupted.
        #[arg(short, long = "loop")]
        looping: bool,
        /// Play only this track of a multi-track score.
        #[arg(short, long)]
        track: Option<usize>,
    },
    /// Mixes a score down to a WAV file.
    Render {
        score: PathBuf,
        output: PathBuf,
        #[arg(long)]
        overwrite: bool,
    },
    /// Mixes a score down to an MP3 file through the configured encoder.
    Mp3 {
        score: PathBuf,
        output: PathBuf,
        /// Minimum bitrate in kbps (0 leaves it to the encoder).
        #[arg(short, long, default_value_t = 0)]
        bitrate: u32,
        /// Keep the intermediate WAV next to the MP3.
        #[arg(long)]
        keep_wav: bool,
        #[arg(long)]
        overwrite: bool,
    },
    /// Describes a score file.
    Info { score: PathBuf },
    /// Plays a single note sample. Values are codes or names, e.g. `flute 120
    /// crotchet 4 la`.
    Note {
        instrument: Instrument,
        tempo: Tempo,
        duration: NoteDuration,
        octave: u8,
        pitch: Pitch,
        /// Volume between 0 and 1.
        #[arg(short, long, default_value_t = 1.0)]
        intensity: f32,
    },
    /// Prints the effective engine configuration.
    Config {},
}

fn catalog(config: &Option<PathBuf>) -> Result<Arc<Catalog>, Box<dyn Error>> {
    let config = EngineConfig::load(config.as_deref())?;
    Ok(Arc::new(Catalog::from_config(config)?))
}

fn scheduler(catalog: &Arc<Catalog>) -> Result<Scheduler, Box<dyn Error>> {
    let interval = catalog.config().tick_interval()?;
    Ok(Scheduler::start(catalog.clone(), interval)?)
}

fn describe(path: &Path) -> Result<(), Box<dyn Error>> {
    let score = score::read_file(path)?;
    println!("Name: {}", score.name);
    println!("Tempo: {} bpm", score.tempo.bpm());
    match &score.body {
        ScoreBody::Sound(tracks) => {
            let sound = Sound::from_score(&score.name, &score)?;
            println!("Tracks (count: {}):", tracks.len());
            for (index, track) in tracks.iter().enumerate() {
                println!(
                    "- {}: instrument {}, time signature {}, {} notes, {} bars",
                    index,
                    track.instrument,
                    track.time_signature,
                    track.notes.len(),
                    sound.track_bars(index)
                );
            }
            println!("Bars: {}", sound.bars());
            println!(
                "Duration: {:.2}s",
                Duration::from_millis(sound.total_duration_ms()).as_secs_f64()
            );
        }
        ScoreBody::Music(music) => {
            println!("Instrument: {}", music.instrument);
            println!("Notes: {}", music.notes.len());
            let beats: u32 = music.notes.iter().map(|n| n.duration().beats()).sum();
            println!("Beats: {}", beats);
            println!("Rhythms (count: {}):", music.rhythms.len());
            for rhythm in music.rhythms.iter() {
                match rhythm.variation {
                    Some(variation) => println!("- {} variation {}", rhythm.instrument, variation),
                    None => println!("- {} (off)", rhythm.instrument),
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Play {
            path,
            name,
            looping,
            track,
        } => {
            let catalog = catalog(&cli.config)?;
            let name = name.unwrap_or_else(|| path.display().to_string());
            catalog.load(&path, &name, true, true)?;

            let events = catalog.subscribe();
            let _scheduler = scheduler(&catalog)?;
            match track {
                Some(track) => catalog.play_track(&name, track, looping, false)?,
                None => catalog.play(&name, looping, false)?,
            }
            info!(sound = name, looping, "Playing");

            while !catalog.is_stopped(&name)? {
                for event in events.try_iter() {
                    info!(sound = event.sound, event = ?event.kind, "Event");
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            for event in events.try_iter() {
                info!(sound = event.sound, event = ?event.kind, "Event");
            }
        }
        Commands::Render {
            score,
            output,
            overwrite,
        } => {
            let catalog = catalog(&cli.config)?;
            catalog.load(&score, LOADED, true, false)?;
            catalog.save_wav(LOADED, &output, overwrite)?;
            println!("Wrote {}", output.display());
        }
        Commands::Mp3 {
            score,
            output,
            bitrate,
            keep_wav,
            overwrite,
        } => {
            let catalog = catalog(&cli.config)?;
            catalog.load(&score, LOADED, true, false)?;
            catalog.save_mp3(LOADED, &output, bitrate, !keep_wav, overwrite)?;
            println!("Wrote {}", output.display());
        }
        Commands::Info { score } => describe(&score)?,
        Commands::Note {
            instrument,
            tempo,
            duration,
            octave,
            pitch,
            intensity,
        } => {
            let catalog = catalog(&cli.config)?;
            let _scheduler = scheduler(&catalog)?;
            let name =
                catalog.play_note(instrument, tempo, duration, pitch, octave, intensity)?;
            println!(
                "Playing {} {} in octave {}",
                misc::duration_name(duration),
                pitch,
                octave
            );
            while catalog.contains(&name) {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
        Commands::Config {} => {
            let config = EngineConfig::load(cli.config.as_deref())?;
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
