mod cli;
mod commands;
mod config;
mod file_io;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Configure {
            catalog,
            backup,
            show,
        } => {
            commands::configure::handle(catalog, backup, show)?;
        }

        Commands::Inspect { input, full } => {
            commands::save::inspect(&input, full)?;
        }

        Commands::Save { command } => match command {
            SaveCommand::Decrypt {
                input,
                output,
                pretty,
            } => {
                commands::save::decrypt(&input, output.as_deref(), pretty)?;
            }

            SaveCommand::Encrypt { output, json } => {
                commands::save::encrypt(&output, json.as_deref())?;
            }

            SaveCommand::Set {
                input,
                level,
                xp,
                currency,
                no_backup,
            } => {
                let edits = commands::save::Edits {
                    level,
                    xp,
                    currency,
                };
                commands::save::set(&input, &edits, no_backup)?;
            }
        },

        Commands::Items { command } => match command {
            ItemsCommand::List {
                input,
                storage,
                filter,
            } => {
                commands::items::list(&input, storage, filter.into())?;
            }
            ItemsCommand::Transfer(target) => commands::items::transfer(&target)?,
            ItemsCommand::Delete(target) => commands::items::delete(&target)?,
            ItemsCommand::Duplicate(target) => commands::items::duplicate(&target)?,
        },
    }

    Ok(())
}

/// Log to stderr; `-v` flags win over `RUST_LOG`, which wins over the `warn` default
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
