use anyhow::Result;
use clap::Args;
use comfy_table::Cell;

use tempora_core::config::{ClockMode, Config};
use tempora_core::{NodeKind, TimeFilter, Timestamp};
use tempora_engine::{NodeSet, Session};

use super::open_engine;
use crate::cli::output::{create_standard_table, empty, format_cut, header_cell, info};

#[derive(Args)]
pub struct NodesArgs {
    /// Document name
    pub document: String,

    /// Local name to look for (`#text` for text nodes)
    pub label: String,

    /// Only nodes of this kind
    #[arg(long, value_parser = parse_kind)]
    pub kind: Option<NodeKind>,

    /// Snapshot instant (defaults to the current cut)
    #[arg(long, conflicts_with = "history")]
    pub at: Option<i64>,

    /// Every record ever stored, whatever its validity
    #[arg(long)]
    pub history: bool,
}

#[derive(Args)]
pub struct ExpiredArgs {
    /// Document name
    pub document: String,

    /// Report records that ended before this cut (defaults to the current cut)
    #[arg(long)]
    pub before: Option<i64>,
}

fn parse_kind(s: &str) -> Result<NodeKind, String> {
    match s.to_lowercase().as_str() {
        "element" => Ok(NodeKind::Element),
        "attribute" => Ok(NodeKind::Attribute),
        "text" => Ok(NodeKind::Text),
        _ => Err(format!("Unknown node kind: {} (use element, attribute or text)", s)),
    }
}

pub fn run(args: NodesArgs, config: Config) -> Result<()> {
    let clock = config.storage.clock;
    let engine = open_engine(config)?;
    let filter = if args.history {
        TimeFilter::All
    } else {
        let now = engine.current_cut(&args.document)?;
        TimeFilter::At(args.at.map(Timestamp::new).unwrap_or(now))
    };

    let mut session = engine.session(&args.document)?;
    let found = session.nodes_by_label(&args.label, args.kind, filter)?;
    let found = session.sort(found)?;
    if found.is_empty() {
        empty(&format!("No node named '{}'", args.label));
        return Ok(());
    }
    print_nodes(&mut session, &found, clock)?;
    info(&format!("{} record(s)", found.len()));
    Ok(())
}

pub fn expired(args: ExpiredArgs, config: Config) -> Result<()> {
    let clock = config.storage.clock;
    let engine = open_engine(config)?;
    let before = match args.before {
        Some(t) => Timestamp::new(t),
        None => engine.current_cut(&args.document)?,
    };

    let mut session = engine.session(&args.document)?;
    let expired = session.expired_nodes(before)?;
    let expired = session.sort(expired)?;
    if expired.is_empty() {
        empty(&format!("Nothing expired before {}", format_cut(before, clock)));
        return Ok(());
    }
    print_nodes(&mut session, &expired, clock)?;
    Ok(())
}

fn print_nodes(session: &mut Session<'_>, nodes: &NodeSet, clock: ClockMode) -> Result<()> {
    let mut table = create_standard_table();
    table.set_header(vec![
        header_cell("ID"),
        header_cell("Kind"),
        header_cell("Name"),
        header_cell("Depth"),
        header_cell("From"),
        header_cell("To"),
        header_cell("Value"),
    ]);
    for node in nodes {
        let valid = node.valid();
        table.add_row(vec![
            Cell::new(node.id()),
            Cell::new(node.kind()),
            Cell::new(session.qualified_name(node)?),
            Cell::new(node.depth()),
            Cell::new(format_cut(valid.from, clock)),
            Cell::new(format_cut(valid.to, clock)),
            Cell::new(node.value().unwrap_or("")),
        ]);
    }
    println!("{}", table);
    Ok(())
}
