use anyhow::Result;
use clap::Args;

use tempora_core::config::Config;
use tempora_core::{TimeFilter, Timestamp};
use tempora_engine::{NodeSet, RenderOptions};

use super::{open_engine, NodeSelector};

#[derive(Args)]
pub struct RenderArgs {
    /// Document name
    pub document: String,

    /// Render only this node (`#id` or `label[n]`)
    #[arg(long)]
    pub node: Option<NodeSelector>,

    /// Snapshot instant (defaults to the current cut)
    #[arg(long, conflicts_with = "history")]
    pub at: Option<i64>,

    /// Render every record ever valid instead of one snapshot
    #[arg(long)]
    pub history: bool,

    /// Add id/from/to attributes wherever validity differs from the parent's
    #[arg(long)]
    pub annotate: bool,

    /// Spaces per nesting level (0 renders on one line)
    #[arg(long)]
    pub indent: Option<usize>,
}

pub fn run(args: RenderArgs, config: Config) -> Result<()> {
    let mut options = RenderOptions::from_config(&config.render);
    let engine = open_engine(config)?;
    let now = engine.current_cut(&args.document)?;

    options.at = if args.history {
        None
    } else {
        Some(args.at.map(Timestamp::new).unwrap_or(now))
    };
    options.annotate = args.annotate;
    if let Some(indent) = args.indent {
        options.indent = indent;
    }

    let mut session = engine.session(&args.document)?;
    let rendered = match &args.node {
        Some(selector) => {
            let node = selector.resolve(&engine, &args.document, options.at.unwrap_or(now))?;
            session.render(&NodeSet::from(vec![node]), &options)?
        }
        None if args.history => {
            let roots = session.roots(TimeFilter::All)?;
            session.render(&roots, &options)?
        }
        None => session.render_document(&options)?,
    };
    println!("{}", rendered);
    Ok(())
}
