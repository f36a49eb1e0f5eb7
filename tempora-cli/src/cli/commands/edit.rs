use anyhow::{bail, Result};
use clap::Args;

use tempora_core::config::Config;

use super::{open_engine, NodeSelector};
use crate::cli::output::{format_cut, info, success};

#[derive(Args)]
pub struct InsertArgs {
    /// Document name
    pub document: String,

    /// Parent element (`#id` or `label[n]`)
    pub parent: NodeSelector,

    /// Path to create, e.g. `review/@stars`; `prefix:name` segments use the document's namespaces
    #[arg(required_unless_present = "text")]
    pub path: Option<String>,

    /// Value of the trailing attribute, or text of the trailing element
    #[arg(long)]
    pub value: Option<String>,

    /// 1-based position among siblings of the same group; negative counts from the end
    #[arg(long, allow_hyphen_values = true)]
    pub position: Option<i64>,

    /// Insert a text node with `--value` instead of a path
    #[arg(long, requires = "value")]
    pub text: bool,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Document name
    pub document: String,

    /// Node to delete (`#id` or `label[n]`)
    pub node: NodeSelector,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Document name
    pub document: String,

    /// Node to move (`#id` or `label[n]`)
    pub node: NodeSelector,

    /// New parent element (`#id` or `label[n]`)
    pub target: NodeSelector,

    /// 1-based position among the target's children; negative counts from the end
    #[arg(long, allow_hyphen_values = true)]
    pub position: Option<i64>,
}

#[derive(Args)]
pub struct SetValueArgs {
    /// Document name
    pub document: String,

    /// Text or attribute node (`#id` or `label[n]`)
    pub node: NodeSelector,

    /// New value
    pub value: String,
}

pub fn insert(args: InsertArgs, config: Config) -> Result<()> {
    let clock = config.storage.clock;
    let mut engine = open_engine(config)?;
    let now = engine.current_cut(&args.document)?;
    let parent = args.parent.resolve(&engine, &args.document, now)?;

    let node = match (args.text, &args.path, &args.value) {
        (true, _, Some(value)) => {
            engine.insert_text(&args.document, &parent, value, args.position)?
        }
        (_, Some(path), value) => engine.insert_node(
            &args.document,
            &parent,
            path,
            value.as_deref(),
            args.position,
        )?,
        _ => bail!("Nothing to insert: give a path, or --text with --value"),
    };
    success(&format!(
        "Inserted {} '{}' as node {} at cut {}",
        node.kind(),
        node.local_name(),
        node.id(),
        format_cut(node.valid().from, clock)
    ));
    Ok(())
}

pub fn delete(args: DeleteArgs, config: Config) -> Result<()> {
    let clock = config.storage.clock;
    let mut engine = open_engine(config)?;
    let now = engine.current_cut(&args.document)?;
    let node = args.node.resolve(&engine, &args.document, now)?;

    if engine.delete_subtree(&args.document, &node)? {
        let cut = engine.current_cut(&args.document)?;
        success(&format!(
            "Deleted node {} and its subtree from cut {}",
            node.id(),
            format_cut(cut, clock)
        ));
    } else {
        info(&format!("Node {} is not valid at the current cut", node.id()));
    }
    Ok(())
}

pub fn move_node(args: MoveArgs, config: Config) -> Result<()> {
    let clock = config.storage.clock;
    let mut engine = open_engine(config)?;
    let now = engine.current_cut(&args.document)?;
    let node = args.node.resolve(&engine, &args.document, now)?;
    let target = args.target.resolve(&engine, &args.document, now)?;

    let moved = engine.set_parent_in_document(&args.document, &node, &target, args.position)?;
    success(&format!(
        "Moved node {} under node {} at cut {} (depth {} -> {})",
        moved.id(),
        target.id(),
        format_cut(moved.valid().from, clock),
        node.depth(),
        moved.depth()
    ));
    Ok(())
}

pub fn set_value(args: SetValueArgs, config: Config) -> Result<()> {
    let clock = config.storage.clock;
    let mut engine = open_engine(config)?;
    let now = engine.current_cut(&args.document)?;
    let node = args.node.resolve(&engine, &args.document, now)?;

    let updated = engine.replace_value(&args.document, &node, &args.value)?;
    success(&format!(
        "Node {} holds '{}' from cut {}",
        updated.id(),
        args.value,
        format_cut(updated.valid().from, clock)
    ));
    Ok(())
}
