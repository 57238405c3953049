use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skiff")]
#[command(about = "A command-line container maintenance utility")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Do not print to stdout; results only reach the log file
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log file path
    #[arg(long, global = true, env = "SKIFF_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "SKIFF_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SKIFF_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stop running containers (all by default)
    #[command(alias = "scs")]
    StopContainers {
        /// Container to stop, by name or id prefix
        container: Option<String>,
    },

    /// Remove stopped containers
    #[command(alias = "rms")]
    RemoveStopped,

    /// Remove all containers, running or not
    #[command(alias = "rma")]
    RemoveAll,

    /// Remove all untagged images
    #[command(alias = "rmi")]
    RemoveImages {
        /// Remove images one at a time instead of using the runtime's prune
        #[arg(long)]
        sweep: bool,
    },

    /// Generate a unique sequential name from a prefix ('web' returns 'web-001')
    Name {
        /// Prefix for a new container; with web-001 and web-002 present, 'web' yields web-003
        prefix: String,
    },

    /// Get the IP address of a container
    Ip {
        /// Name of the container
        name: String,
    },
}
