use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use launchgrid::config::SurfaceConfig;
use launchgrid::core::prelude::*;
use launchgrid::io::midi;
use launchgrid::runtime;
use launchgrid::song::Song;

#[derive(Parser)]
#[command(version, about = "Grid mixer and launch control surface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available MIDI input and output ports
    ListPorts,
    /// Run the surface against a demo session
    Run {
        /// MIDI input port name (the controller's output)
        #[arg(long)]
        input: String,
        /// MIDI output port name (the controller's input)
        #[arg(long)]
        output: String,
        /// Optional YAML config overriding the default hardware profile
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::ListPorts => midi::print_ports(),
        Commands::Run {
            input,
            output,
            config,
        } => {
            let config = match config {
                Some(path) => SurfaceConfig::from_yaml_file(path)?,
                None => SurfaceConfig::default(),
            };
            info!(
                "Starting {}x{} surface on '{}' -> '{}'",
                config.grid_cols, config.grid_rows, input, output
            );
            runtime::run(config, &input, &output, demo_song())
        }
    }
}

/// A small session to drive the surface without a host attached: eight
/// armable tracks, eight scenes, and a diagonal of colored clips.
fn demo_song() -> Song {
    const PALETTE: [u32; 8] = [
        0xFF3030, 0xFF8000, 0xFFD700, 0x30FF30, 0x30FFFF, 0x3060FF, 0x9030FF,
        0xFF30C0,
    ];

    let mut song = Song::new();
    for _ in 0..8 {
        song.add_scene();
    }
    for index in 0..8 {
        song.add_track(&format!("Track {}", index + 1), true);
        song.create_clip(index, index, PALETTE[index]);
        song.create_clip(index, (index + 3) % 8, PALETTE[(index + 4) % 8]);
    }
    song.take_notifications();
    song
}
