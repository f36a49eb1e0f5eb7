//! Entry point tying a temporal store to documents, sessions and mutations

use tracing::{info, instrument};

use tempora_core::config::Config;
use tempora_core::{Document, TemporaResult, Timestamp};
use tempora_storage::TemporalStore;

use crate::handle::NodeHandle;
use crate::loader::{load_tree, LoadSummary};
use crate::session::Session;
use crate::tree::DocumentTree;
use crate::update::Mutation;

pub struct Engine {
    store: TemporalStore,
    config: Config,
}

impl Engine {
    /// Open the configured store, creating its tables if needed
    pub fn open(config: Config) -> TemporaResult<Self> {
        let store = TemporalStore::open(&config.storage)?;
        Self::with_store(store, config)
    }

    /// Private in-memory store with default configuration
    pub fn in_memory() -> TemporaResult<Self> {
        let config = Config::default();
        let store = TemporalStore::open_in_memory()?.with_clock(config.storage.clock);
        Self::with_store(store, config)
    }

    pub fn with_store(store: TemporalStore, config: Config) -> TemporaResult<Self> {
        store.bootstrap()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &TemporalStore {
        &self.store
    }

    /// Load a document tree as one transaction at one cut
    #[instrument(skip(self, tree), fields(document = %tree.name))]
    pub fn load(&mut self, tree: &DocumentTree) -> TemporaResult<LoadSummary> {
        self.store.write(|view| load_tree(view, tree))
    }

    pub fn documents(&self) -> TemporaResult<Vec<Document>> {
        self.store.view().documents()
    }

    pub fn document(&self, name: &str) -> TemporaResult<Document> {
        self.store.view().document_named(name)
    }

    pub fn current_cut(&self, name: &str) -> TemporaResult<Timestamp> {
        let document = self.document(name)?;
        self.store.view().current_cut(document.id)
    }

    /// Read session over the committed state
    pub fn session(&self, name: &str) -> TemporaResult<Session<'_>> {
        let view = self.store.view();
        let document = view.document_named(name)?;
        Ok(Session::new(view, document, self.config.render.clone()))
    }

    /// Run several operations as one edit: one transaction, one cut. Nothing is kept when
    /// `f` fails.
    pub fn mutate<T, F>(&mut self, name: &str, f: F) -> TemporaResult<T>
    where
        F: FnOnce(&mut Mutation<'_>) -> TemporaResult<T>,
    {
        let render = self.config.render.clone();
        self.store.write(|view| {
            let document = view.document_named(name)?;
            let mut mutation = Mutation::begin(view, document, render)?;
            f(&mut mutation)
        })
    }

    #[instrument(skip(self, parent, value), fields(parent = %parent.key()))]
    pub fn insert_node(
        &mut self,
        document: &str,
        parent: &NodeHandle,
        path: &str,
        value: Option<&str>,
        position: Option<i64>,
    ) -> TemporaResult<NodeHandle> {
        let node = self.mutate(document, |m| m.insert_node(parent, path, value, position))?;
        info!("Inserted '{}' as {}", path, node.key());
        Ok(node)
    }

    #[instrument(skip(self, parent, value), fields(parent = %parent.key()))]
    pub fn insert_text(
        &mut self,
        document: &str,
        parent: &NodeHandle,
        value: &str,
        position: Option<i64>,
    ) -> TemporaResult<NodeHandle> {
        let node = self.mutate(document, |m| m.insert_text(parent, value, position))?;
        info!("Inserted text {}", node.key());
        Ok(node)
    }

    #[instrument(skip(self, node), fields(node = %node.key()))]
    pub fn delete_subtree(&mut self, document: &str, node: &NodeHandle) -> TemporaResult<bool> {
        let deleted = self.mutate(document, |m| m.delete_subtree(node))?;
        if deleted {
            info!("Deleted subtree of node {}", node.id());
        }
        Ok(deleted)
    }

    #[instrument(skip(self, node, target), fields(node = %node.key(), target = %target.key()))]
    pub fn set_parent_in_document(
        &mut self,
        document: &str,
        node: &NodeHandle,
        target: &NodeHandle,
        position: Option<i64>,
    ) -> TemporaResult<NodeHandle> {
        let moved = self.mutate(document, |m| m.set_parent_in_document(node, target, position))?;
        info!("Moved node {} under node {}", moved.id(), target.id());
        Ok(moved)
    }

    #[instrument(skip(self, node, value), fields(node = %node.key()))]
    pub fn replace_value(
        &mut self,
        document: &str,
        node: &NodeHandle,
        value: &str,
    ) -> TemporaResult<NodeHandle> {
        let node = self.mutate(document, |m| m.replace_value(node, value))?;
        info!("Replaced value of {}", node.key());
        Ok(node)
    }
}
