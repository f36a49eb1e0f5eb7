use anyhow::Result;
use clap::Args;
use comfy_table::Cell;
use serde_json::json;

use tempora_core::config::Config;
use tempora_core::TimeFilter;

use super::open_engine;
use crate::cli::output::{create_standard_table, empty, format_cut, header_cell, section_header};

#[derive(Args)]
pub struct InfoArgs {
    /// Document name
    pub document: String,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn documents(config: Config) -> Result<()> {
    let clock = config.storage.clock;
    let engine = open_engine(config)?;
    let documents = engine.documents()?;
    if documents.is_empty() {
        empty("No documents stored");
        return Ok(());
    }

    let mut table = create_standard_table();
    table.set_header(vec![
        header_cell("ID"),
        header_cell("Name"),
        header_cell("Current cut"),
    ]);
    for document in documents {
        let cut = engine.current_cut(&document.name)?;
        table.add_row(vec![
            Cell::new(document.id),
            Cell::new(&document.name),
            Cell::new(format_cut(cut, clock)),
        ]);
    }
    println!("{}", table);
    Ok(())
}

struct DepthInfo {
    depth: u32,
    live: usize,
    records: usize,
    versions: usize,
}

pub fn run(args: InfoArgs, config: Config) -> Result<()> {
    let clock = config.storage.clock;
    let engine = open_engine(config)?;
    let document = engine.document(&args.document)?;
    let now = engine.current_cut(&args.document)?;
    let view = engine.store().view();
    let mut session = engine.session(&args.document)?;

    let mut depths = Vec::new();
    for class in view.order_classes(document.id)? {
        depths.push(DepthInfo {
            depth: class.depth,
            live: session.nodes_at_depth(class.depth, TimeFilter::At(now))?.len(),
            records: session.nodes_at_depth(class.depth, TimeFilter::All)?.len(),
            versions: view.order_records(class.id)?.len(),
        });
    }
    let namespaces = view.namespaces(document.id)?;

    if args.json {
        let value = json!({
            "document": document,
            "current_cut": now,
            "namespaces": namespaces,
            "depths": depths.iter().map(|d| json!({
                "depth": d.depth,
                "live": d.live,
                "records": d.records,
                "order_versions": d.versions,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    section_header(&format!("{} (cut {})", document.name, format_cut(now, clock)));
    for namespace in &namespaces {
        let prefix = if namespace.is_default() { "(default)" } else { namespace.prefix.as_str() };
        println!("  {} = {}", prefix, namespace.uri);
    }

    let mut table = create_standard_table();
    table.set_header(vec![
        header_cell("Depth"),
        header_cell("Live nodes"),
        header_cell("Records"),
        header_cell("Order versions"),
    ]);
    for d in &depths {
        table.add_row(vec![
            Cell::new(d.depth),
            Cell::new(d.live),
            Cell::new(d.records),
            Cell::new(d.versions),
        ]);
    }
    println!("{}", table);
    Ok(())
}
