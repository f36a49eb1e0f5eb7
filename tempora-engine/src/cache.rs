//! Per-session node arena
//!
//! Handles are stored once by record key; children, attributes and parents are kept as key
//! lists in separate maps, so no handle owns another.

use std::collections::HashMap;

use tempora_core::{NodeId, NodeKey};

use crate::handle::NodeHandle;

#[derive(Debug, Default)]
pub struct NodeCache {
    nodes: HashMap<NodeKey, NodeHandle>,
    children: HashMap<NodeKey, Vec<NodeKey>>,
    attributes: HashMap<NodeKey, Vec<NodeKey>>,
    parents: HashMap<NodeKey, Option<NodeKey>>,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Store a handle, replacing any previous copy of the same record
    pub fn insert(&mut self, handle: NodeHandle) -> NodeKey {
        let key = handle.key();
        self.nodes.insert(key, handle);
        key
    }

    pub fn get(&self, key: &NodeKey) -> Option<&NodeHandle> {
        self.nodes.get(key)
    }

    pub fn children(&self, key: &NodeKey) -> Option<Vec<NodeHandle>> {
        self.resolve(self.children.get(key)?)
    }

    pub fn set_children(&mut self, key: NodeKey, children: &[NodeHandle]) {
        let keys = children.iter().map(|c| self.insert(c.clone())).collect();
        self.children.insert(key, keys);
    }

    pub fn attributes(&self, key: &NodeKey) -> Option<Vec<NodeHandle>> {
        self.resolve(self.attributes.get(key)?)
    }

    pub fn set_attributes(&mut self, key: NodeKey, attributes: &[NodeHandle]) {
        let keys = attributes.iter().map(|a| self.insert(a.clone())).collect();
        self.attributes.insert(key, keys);
    }

    /// `Some(None)` records a resolved absence (the root has no parent)
    pub fn parent(&self, key: &NodeKey) -> Option<Option<NodeHandle>> {
        match self.parents.get(key)? {
            Some(parent) => self.nodes.get(parent).cloned().map(Some),
            None => Some(None),
        }
    }

    pub fn set_parent(&mut self, key: NodeKey, parent: Option<&NodeHandle>) {
        let parent = parent.map(|p| self.insert(p.clone()));
        self.parents.insert(key, parent);
    }

    /// Drop the record and everything resolved from it
    pub fn invalidate(&mut self, key: &NodeKey) {
        self.nodes.remove(key);
        self.children.remove(key);
        self.attributes.remove(key);
        self.parents.remove(key);
    }

    /// Drop every record of one node
    pub fn invalidate_node(&mut self, id: NodeId) {
        let keys: Vec<NodeKey> = self.nodes.keys().filter(|k| k.id == id).copied().collect();
        for key in keys {
            self.invalidate(&key);
        }
        self.children.retain(|k, _| k.id != id);
        self.attributes.retain(|k, _| k.id != id);
        self.parents.retain(|k, _| k.id != id);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.children.clear();
        self.attributes.clear();
        self.parents.clear();
    }

    // A list is only usable while every member is still cached
    fn resolve(&self, keys: &[NodeKey]) -> Option<Vec<NodeHandle>> {
        keys.iter().map(|k| self.nodes.get(k).cloned()).collect()
    }
}
