pub mod commands;
pub mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use tempora_core::config::{load_config, ClockMode, Config};
use tempora_core::system::paths::default_config_path;

#[derive(Parser)]
#[command(
    name = "tempora",
    version,
    about = "Bitemporal storage for XML documents",
    long_about = "Tempora keeps every version of a document: edits close the validity of old \
                  records instead of overwriting them, so any past snapshot can be rendered \
                  and compared with the present."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file (defaults to $TEMPORA_HOME/config.toml when present)
    #[arg(long, global = true, value_name = "PATH", env = "TEMPORA_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file, overriding the configuration
    #[arg(long, global = true, value_name = "PATH", env = "TEMPORA_DATABASE")]
    pub database: Option<PathBuf>,

    /// Clock used for new cuts, overriding the configuration
    #[arg(long, global = true, value_enum)]
    pub clock: Option<ClockArg>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ClockArg {
    Logical,
    Wall,
}

impl From<ClockArg> for ClockMode {
    fn from(arg: ClockArg) -> Self {
        match arg {
            ClockArg::Logical => ClockMode::Logical,
            ClockArg::Wall => ClockMode::Wall,
        }
    }
}

impl GlobalArgs {
    /// Configuration file, then command-line overrides
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => {
                let default = default_config_path();
                if default.exists() {
                    load_config(&default)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(database) = &self.database {
            config.storage.database_path = Some(database.to_string_lossy().into_owned());
        }
        if let Some(clock) = self.clock {
            config.storage.clock = clock.into();
        }
        if self.verbose > 0 {
            config.logging.level = match self.verbose {
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
            .to_string();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a document tree from a JSON file
    Load(commands::load::LoadArgs),

    /// List stored documents
    Documents,

    /// Show a document's cuts and per-depth record counts
    Info(commands::info::InfoArgs),

    /// Render a document snapshot or its full history
    Render(commands::render::RenderArgs),

    /// List nodes by label
    Nodes(commands::nodes::NodesArgs),

    /// List subtrees whose validity ended before a cut
    Expired(commands::nodes::ExpiredArgs),

    /// Insert elements, attributes or text below a node
    Insert(commands::edit::InsertArgs),

    /// Delete a node and its subtree from the current cut on
    Delete(commands::edit::DeleteArgs),

    /// Move a node and its subtree under another element
    Move(commands::edit::MoveArgs),

    /// Replace the value of a text or attribute node
    SetValue(commands::edit::SetValueArgs),
}
