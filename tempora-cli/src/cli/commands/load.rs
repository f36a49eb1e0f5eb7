use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use tempora_core::config::Config;
use tempora_engine::DocumentTree;

use super::open_engine;
use crate::cli::output::{format_cut, success};

#[derive(Args)]
pub struct LoadArgs {
    /// Document tree as JSON (`name`, `header`, `root`)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Store the document under this name instead of the one in the file
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run(args: LoadArgs, config: Config) -> Result<()> {
    let json = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let mut tree = DocumentTree::from_json(&json)?;
    if let Some(name) = args.name {
        tree.name = name;
    }

    let clock = config.storage.clock;
    let mut engine = open_engine(config)?;
    let summary = engine.load(&tree)?;

    success(&format!(
        "Loaded '{}': {} node(s), depth {}, cut {}",
        summary.document.name,
        summary.nodes,
        summary.depth,
        format_cut(summary.cut, clock)
    ));
    Ok(())
}
