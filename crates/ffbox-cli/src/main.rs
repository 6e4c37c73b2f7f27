//! ffbox CLI - Self-contained ffmpeg with progress reporting

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ffbox - Self-contained ffmpeg with progress reporting
#[derive(Parser)]
#[command(name = "ffbox")]
#[command(version)]
#[command(about = "Extract audio, split videos and pull keyframes with an embedded ffmpeg", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print progress snapshots as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Use this ffmpeg instead of the embedded one
    #[arg(long, global = true, env = "FFBOX_FFMPEG")]
    ffmpeg: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize ffbox (create config and directories)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Extract the embedded executables and print where they are
    Provision {
        /// Extraction directory (default: from config, then the cache dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Copy the audio stream out of a video
    Audio {
        /// Input video
        input: PathBuf,

        /// Output audio file
        output: PathBuf,
    },

    /// Split a video into fixed-length segments
    Split {
        /// Input video
        input: PathBuf,

        /// Directory for the segments
        output_dir: PathBuf,

        /// Segment length in seconds (default: from config)
        #[arg(short = 't', long)]
        segment_time: Option<u32>,

        /// Segment file name prefix (default: from config)
        #[arg(short, long)]
        prefix: Option<String>,

        /// Segment file extension (default: from config)
        #[arg(short, long)]
        extension: Option<String>,
    },

    /// Extract keyframes as JPEG images
    Keyframes {
        /// Input video
        input: PathBuf,

        /// Directory for the images
        output_dir: PathBuf,

        /// Seconds between keyframes (default: from config)
        #[arg(short, long)]
        interval: Option<u32>,

        /// Image file name prefix (default: from config)
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Print the duration of a media file
    Duration {
        /// Input media file
        input: PathBuf,
    },

    /// Split a video, then extract keyframes from every segment
    Workflow {
        /// Input video
        input: PathBuf,

        /// Root output directory
        output_dir: PathBuf,

        /// Segment length in seconds (default: from config)
        #[arg(short = 't', long)]
        segment_time: Option<u32>,

        /// Seconds between keyframes (default: from config)
        #[arg(short, long)]
        interval: Option<u32>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., split.segment_time)
        key: String,

        /// Value to set (empty to clear an optional path)
        value: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ffbox=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ffbox=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = commands::GlobalOptions {
        json: cli.json,
        ffmpeg: cli.ffmpeg,
    };

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(),
            ConfigCommands::Set { key, value } => commands::config::set(&key, &value),
        },
        Commands::Provision { dir } => commands::provision::run(dir),
        Commands::Audio { input, output } => commands::audio::run(&options, &input, &output),
        Commands::Split {
            input,
            output_dir,
            segment_time,
            prefix,
            extension,
        } => commands::split::run(&options, &input, &output_dir, segment_time, prefix, extension),
        Commands::Keyframes {
            input,
            output_dir,
            interval,
            prefix,
        } => commands::keyframes::run(&options, &input, &output_dir, interval, prefix),
        Commands::Duration { input } => commands::duration::run(&options, &input),
        Commands::Workflow {
            input,
            output_dir,
            segment_time,
            interval,
        } => commands::workflow::run(&options, &input, &output_dir, segment_time, interval),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
