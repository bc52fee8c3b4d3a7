//! Save command CLI definitions

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum SaveCommand {
    /// Decrypt to JSON (stdout or -o file)
    Decrypt {
        /// Path to .dat file
        input: PathBuf,

        /// Path to output JSON file (uses stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Encrypt from JSON (positional file or stdin) to .dat
    Encrypt {
        /// Path to output .dat file
        output: PathBuf,

        /// JSON input file (reads stdin if not provided)
        json: Option<PathBuf>,
    },

    /// Set character values
    Set {
        /// Path to .dat file
        input: PathBuf,

        /// Character level as shown in game (e.g. 42.5)
        #[arg(long, conflicts_with = "xp")]
        level: Option<f64>,

        /// Raw serialized XP
        #[arg(long)]
        xp: Option<i64>,

        /// Currency count as TYPE=COUNT (e.g. Emerald=5000), repeatable
        #[arg(long, value_name = "TYPE=COUNT")]
        currency: Vec<String>,

        /// Skip the timestamped backup for this write
        #[arg(long)]
        no_backup: bool,
    },
}
