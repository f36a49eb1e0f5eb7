pub mod edit;
pub mod info;
pub mod load;
pub mod nodes;
pub mod render;

use anyhow::{anyhow, bail, Result};
use std::str::FromStr;
use tracing::debug;

use tempora_core::config::Config;
use tempora_core::{NodeId, TimeFilter, Timestamp};
use tempora_engine::tree::split_qualified;
use tempora_engine::{Engine, NodeHandle, NodeSet};

/// Open the configured store
pub fn open_engine(config: Config) -> Result<Engine> {
    debug!(
        "Opening store {} (clock {:?})",
        config.storage.resolved_database_path().display(),
        config.storage.clock
    );
    Ok(Engine::open(config)?)
}

/// A node named on the command line: `#12` by id, or `label[n]` for the n-th node (1-based,
/// document order) with that name; `label` alone means `label[1]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelector {
    Id(NodeId),
    Label { name: String, ordinal: usize },
}

impl FromStr for NodeSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix('#') {
            return id
                .parse::<i64>()
                .map(|id| NodeSelector::Id(NodeId(id)))
                .map_err(|_| format!("Invalid node id: {}", s));
        }
        let (name, ordinal) = match s.split_once('[') {
            Some((name, rest)) => {
                let ordinal = rest
                    .strip_suffix(']')
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("Invalid ordinal in '{}'", s))?;
                (name, ordinal)
            }
            None => (s, 1),
        };
        if name.is_empty() {
            return Err(format!("Missing label in '{}'", s));
        }
        Ok(NodeSelector::Label {
            name: name.to_string(),
            ordinal,
        })
    }
}

impl NodeSelector {
    /// The record the selector names at `t`
    pub fn resolve(&self, engine: &Engine, document: &str, t: Timestamp) -> Result<NodeHandle> {
        let mut session = engine.session(document)?;
        match self {
            NodeSelector::Id(id) => session
                .node_at(*id, t)?
                .ok_or_else(|| anyhow!("Node {} is not valid at {}", id, t)),
            NodeSelector::Label { name, ordinal } => {
                let (prefix, local_name) = split_qualified(name);
                let found = session.nodes_by_label(local_name, None, TimeFilter::At(t))?;
                let mut matches = NodeSet::new();
                for node in found {
                    if prefix.is_none() || session.qualified_name(&node)? == *name {
                        matches.push(node);
                    }
                }
                let matches = session.sort(matches)?;
                if matches.is_empty() {
                    bail!("No node named '{}' at {}", name, t);
                }
                matches.get(ordinal - 1).cloned().ok_or_else(|| {
                    anyhow!(
                        "Only {} node(s) named '{}' at {}, asked for #{}",
                        matches.len(),
                        name,
                        t,
                        ordinal
                    )
                })
            }
        }
    }
}
