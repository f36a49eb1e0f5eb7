//! In-memory engine with one loaded document

use anyhow::{anyhow, Context, Result};

use tempora_core::{NodeKind, TimeFilter, Timestamp};
use tempora_engine::{DocumentTree, Engine, LoadSummary, NodeHandle, RenderOptions, Session};

use crate::fixtures::three_book_catalog;

pub struct TestEngine {
    pub engine: Engine,
    pub document: String,
    pub loaded: LoadSummary,
}

impl TestEngine {
    /// Load `tree` into a fresh in-memory engine
    pub fn with_document(tree: &DocumentTree) -> Result<Self> {
        crate::init_test_logging();
        let mut engine = Engine::in_memory().context("Failed to open in-memory engine")?;
        let loaded = engine.load(tree).context("Failed to load test document")?;
        Ok(Self {
            engine,
            document: tree.name.clone(),
            loaded,
        })
    }

    /// The three-book catalog
    pub fn catalog() -> Result<Self> {
        Self::with_document(&three_book_catalog())
    }

    pub fn session(&self) -> Result<Session<'_>> {
        Ok(self.engine.session(&self.document)?)
    }

    /// The document's latest cut
    pub fn now(&self) -> Result<Timestamp> {
        Ok(self.engine.current_cut(&self.document)?)
    }

    pub fn root(&self) -> Result<NodeHandle> {
        let now = self.now()?;
        self.session()?
            .root_at(now)?
            .ok_or_else(|| anyhow!("document has no root at {}", now))
    }

    /// Element children named `name` of `parent` valid at `t`, in document order
    pub fn elements_at(&self, parent: &NodeHandle, name: &str, t: Timestamp) -> Result<Vec<NodeHandle>> {
        let mut session = self.session()?;
        Ok(session
            .children_at(parent, t)?
            .filter(|n| n.kind() == NodeKind::Element && n.local_name() == name)
            .into_vec())
    }

    /// Current `<book>` elements in document order
    pub fn books(&self) -> Result<Vec<NodeHandle>> {
        let root = self.root()?;
        self.elements_at(&root, "book", self.now()?)
    }

    /// Current book at a 1-based ordinal
    pub fn book(&self, ordinal: usize) -> Result<NodeHandle> {
        self.books()?
            .into_iter()
            .nth(ordinal.saturating_sub(1))
            .ok_or_else(|| anyhow!("no book #{}", ordinal))
    }

    /// Current book whose `<author>` text is `author`
    pub fn book_by_author(&self, author: &str) -> Result<NodeHandle> {
        let now = self.now()?;
        for book in self.books()? {
            for element in self.elements_at(&book, "author", now)? {
                if self.text_at(&element, now)? == author {
                    return Ok(book);
                }
            }
        }
        Err(anyhow!("no book by {}", author))
    }

    /// Concatenated text below `node` at `t`
    pub fn text_at(&self, node: &NodeHandle, t: Timestamp) -> Result<String> {
        let mut session = self.session()?;
        let mut text = String::new();
        let mut pending = vec![node.clone()];
        while let Some(next) = pending.pop() {
            if next.kind() == NodeKind::Text {
                text.push_str(next.value().unwrap_or_default());
                continue;
            }
            let children = session.children_at(&next, t)?;
            pending.extend(children.into_vec().into_iter().rev());
        }
        Ok(text)
    }

    /// Local names of the children of `node` at `t`, in document order
    pub fn child_names_at(&self, node: &NodeHandle, t: Timestamp) -> Result<Vec<String>> {
        let mut session = self.session()?;
        Ok(session
            .children_at(node, t)?
            .iter()
            .map(|n| n.local_name().to_string())
            .collect())
    }

    /// Compact markup of `node` as valid at `t`
    pub fn render_at(&self, node: &NodeHandle, t: Timestamp) -> Result<String> {
        let mut session = self.session()?;
        let set = vec![node.clone()].into();
        Ok(session.render(&set, &RenderOptions::at(t))?)
    }

    /// Compact markup of the whole document at `t`, header excluded
    pub fn render_document_at(&self, t: Timestamp) -> Result<String> {
        let mut session = self.session()?;
        let rendered = session.render_document(&RenderOptions::at(t))?;
        let header = &self.loaded.document.header;
        Ok(rendered
            .strip_prefix(header.as_str())
            .map(|rest| rest.trim_start_matches('\n').to_string())
            .unwrap_or(rendered))
    }

    /// Every record named `name`, whatever its validity
    pub fn history_of(&self, name: &str) -> Result<Vec<NodeHandle>> {
        let mut session = self.session()?;
        Ok(session
            .nodes_by_label(name, None, TimeFilter::All)?
            .into_vec())
    }
}
