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
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use udpboard::board::Board;
use udpboard::clips::{self, LoadOptions};
use udpboard::control::{self, Command};
use udpboard::{audio, config};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A soundboard that plays overlapping clips on UDP command."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Loads and verifies all clips in the given directory.
    Clips {
        /// The path to the sound directory.
        path: PathBuf,
        /// The sample rate every clip must be encoded at.
        #[arg(short, long, default_value_t = 44100)]
        sample_rate: u32,
    },
    /// Starts the soundboard and runs until interrupted.
    Start {
        /// The path to the board config.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// The output device name. Prompts for one when neither this nor the
        /// config names a device.
        #[arg(short, long)]
        device: Option<String>,
        /// The sound directory.
        #[arg(short, long)]
        sounds: Option<PathBuf>,
        /// The address to listen for commands on.
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Sends a single play command to a running soundboard.
    Send {
        /// The clip to play.
        name: String,
        /// Volume multiplier applied to the clip's default volume.
        volume: Option<f32>,
        /// The address of the soundboard.
        #[arg(short, long, default_value = control::DEFAULT_ADDRESS)]
        address: SocketAddr,
    },
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
        Commands::Clips { path, sample_rate } => {
            let bank = clips::load_directory(&path, &LoadOptions::new(sample_rate))?;

            if bank.is_empty() {
                println!("No clips found in {}.", path.display());
                return Ok(());
            }

            println!(
                "Clips (count: {}, memory: {} bytes):",
                bank.len(),
                bank.total_memory_usage()
            );
            for clip in bank.sorted_list() {
                println!(
                    "- {} ({:.2}s, {} frames)",
                    clip.name(),
                    clip.duration(bank.sample_rate()).as_secs_f64(),
                    clip.len()
                );
            }
        }
        Commands::Start {
            config,
            device,
            sounds,
            address,
        } => {
            let mut board_config = config::Board::load(config.as_deref())?;
            if let Some(device) = device {
                board_config.audio_mut().set_device(&device);
            }
            if let Some(sounds) = sounds {
                board_config.clips_mut().set_path(&sounds);
            }
            if let Some(address) = address {
                board_config.listener_mut().set_address(&address);
            }
            board_config.validate()?;

            if board_config.audio().device().is_none() {
                let names: Vec<String> = audio::list_devices()?
                    .iter()
                    .map(|device| device.name().to_string())
                    .collect();
                let choice = audio::select_device(&names, io::stdin().lock(), io::stdout())?;
                board_config.audio_mut().set_device(&names[choice]);
            }

            let board = Board::start(&board_config).await?;
            println!("Loaded {} clips.", board.bank().len());
            println!(
                "UDP mixer listening on {} (press ctrl-C to quit)",
                board.listener_addr()
            );

            board.run_until(tokio::signal::ctrl_c()).await?;
            println!("\nInterrupted by user. Exiting...");
        }
        Commands::Send {
            name,
            volume,
            address,
        } => {
            control::send_command(address, &Command::new(&name, volume)).await?;
        }
    }

    Ok(())
}
