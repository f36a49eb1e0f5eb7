//! Append-only dictionaries: documents, namespaces, node classes and order classes.
//! Lookups insert on miss; a miss is only an error where existence was assumed.

use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::context::{row_error, SqlContext};
use crate::store::{unknown_document, Sequence, StoreView};
use tempora_core::{
    Document, DocumentId, Namespace, NamespaceId, NodeClass, NodeClassId, NodeKind, OrderClass,
    OrderClassId, TemporaError, TemporaResult,
};

pub(crate) const NODE_CLASS_COLUMNS: &str =
    "c.id, c.kind, c.local_name, c.namespace_id, c.depth, c.parent_class_id, c.document_id";

/// Decode the seven node-class columns starting at `offset`
pub(crate) fn node_class_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<NodeClass> {
    let code: i64 = row.get(offset + 1)?;
    let kind = NodeKind::from_code(code).map_err(|e| row_error(offset + 1, e))?;
    Ok(NodeClass {
        id: NodeClassId(row.get(offset)?),
        kind,
        local_name: row.get(offset + 2)?,
        namespace_id: row.get::<_, Option<i64>>(offset + 3)?.map(NamespaceId),
        depth: row.get::<_, i64>(offset + 4)? as u32,
        parent_class_id: row.get::<_, Option<i64>>(offset + 5)?.map(NodeClassId),
        document_id: DocumentId(row.get(offset + 6)?),
    })
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: DocumentId(row.get(0)?),
        name: row.get(1)?,
        header: row.get(2)?,
    })
}

fn namespace_from_row(row: &Row<'_>) -> rusqlite::Result<Namespace> {
    Ok(Namespace {
        id: NamespaceId(row.get(0)?),
        uri: row.get(1)?,
        prefix: row.get(2)?,
        document_id: DocumentId(row.get(3)?),
    })
}

fn order_class_from_row(row: &Row<'_>) -> rusqlite::Result<OrderClass> {
    Ok(OrderClass {
        id: OrderClassId(row.get(0)?),
        depth: row.get::<_, i64>(1)? as u32,
        parent_class_id: row.get::<_, Option<i64>>(2)?.map(NodeClassId),
        document_id: DocumentId(row.get(3)?),
    })
}

impl<'c> StoreView<'c> {
    // Documents

    pub fn create_document(&self, name: &str, header: &str) -> TemporaResult<Document> {
        if self.find_document(name)?.is_some() {
            return Err(TemporaError::InvalidInput(format!(
                "document '{}' is already loaded",
                name
            )));
        }
        let id = DocumentId(self.next_id(Sequence::Document)?);
        self.conn
            .execute(
                "INSERT INTO document (id, name, header) VALUES (?1, ?2, ?3)",
                params![id.0, name, header],
            )
            .sql("insert document")?;
        debug!("Created document {} '{}'", id, name);
        Ok(Document {
            id,
            name: name.to_string(),
            header: header.to_string(),
        })
    }

    pub fn find_document(&self, name: &str) -> TemporaResult<Option<Document>> {
        self.conn
            .query_row(
                "SELECT id, name, header FROM document WHERE name = ?1",
                params![name],
                document_from_row,
            )
            .optional()
            .sql("find document")
    }

    pub fn document_named(&self, name: &str) -> TemporaResult<Document> {
        self.find_document(name)?
            .ok_or_else(|| unknown_document(name))
    }

    pub fn document(&self, id: DocumentId) -> TemporaResult<Document> {
        self.conn
            .query_row(
                "SELECT id, name, header FROM document WHERE id = ?1",
                params![id.0],
                document_from_row,
            )
            .optional()
            .sql("load document")?
            .ok_or_else(|| unknown_document(id))
    }

    pub fn documents(&self) -> TemporaResult<Vec<Document>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name, header FROM document ORDER BY id")
            .sql("prepare document list")?;
        let rows = stmt.query_map([], document_from_row).sql("list documents")?;
        rows.collect::<rusqlite::Result<Vec<_>>>().sql("list documents")
    }

    // Namespaces

    pub fn find_or_create_namespace(
        &self,
        document: DocumentId,
        uri: &str,
        prefix: &str,
    ) -> TemporaResult<Namespace> {
        let existing = self
            .conn
            .query_row(
                "SELECT id, uri, prefix, document_id FROM namespace \
                 WHERE uri = ?1 AND prefix = ?2 AND document_id = ?3",
                params![uri, prefix, document.0],
                namespace_from_row,
            )
            .optional()
            .sql("find namespace")?;
        if let Some(namespace) = existing {
            return Ok(namespace);
        }

        let id = NamespaceId(self.next_id(Sequence::Namespace)?);
        self.conn
            .execute(
                "INSERT INTO namespace (id, uri, prefix, document_id) VALUES (?1, ?2, ?3, ?4)",
                params![id.0, uri, prefix, document.0],
            )
            .sql("insert namespace")?;
        debug!("Registered namespace {} '{}' = {}", id, prefix, uri);
        Ok(Namespace {
            id,
            uri: uri.to_string(),
            prefix: prefix.to_string(),
            document_id: document,
        })
    }

    pub fn namespace(&self, id: NamespaceId) -> TemporaResult<Namespace> {
        self.conn
            .query_row(
                "SELECT id, uri, prefix, document_id FROM namespace WHERE id = ?1",
                params![id.0],
                namespace_from_row,
            )
            .optional()
            .sql("load namespace")?
            .ok_or_else(|| TemporaError::Database(format!("namespace {} does not exist", id)))
    }

    pub fn namespaces(&self, document: DocumentId) -> TemporaResult<Vec<Namespace>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT id, uri, prefix, document_id FROM namespace \
                 WHERE document_id = ?1 ORDER BY id",
            )
            .sql("prepare namespace list")?;
        let rows = stmt
            .query_map(params![document.0], namespace_from_row)
            .sql("list namespaces")?;
        rows.collect::<rusqlite::Result<Vec<_>>>().sql("list namespaces")
    }

    /// Resolve a prefix against the document's bindings. The empty prefix asks for the
    /// default namespace, which may legitimately be absent.
    pub fn resolve_prefix(
        &self,
        document: DocumentId,
        prefix: &str,
    ) -> TemporaResult<Option<Namespace>> {
        let mut bindings: Vec<Namespace> = self
            .namespaces(document)?
            .into_iter()
            .filter(|ns| ns.prefix == prefix)
            .collect();

        match bindings.len() {
            0 if prefix.is_empty() => Ok(None),
            0 => Err(TemporaError::UnknownNamespacePrefix(prefix.to_string())),
            1 => Ok(bindings.pop()),
            n => Err(TemporaError::AmbiguousNamespacePrefix {
                prefix: prefix.to_string(),
                bindings: n,
            }),
        }
    }

    // Node classes

    pub fn find_or_create_node_class(
        &self,
        document: DocumentId,
        kind: NodeKind,
        local_name: &str,
        namespace_id: Option<NamespaceId>,
        depth: u32,
        parent_class_id: Option<NodeClassId>,
    ) -> TemporaResult<NodeClass> {
        let existing = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM node_class c \
                     WHERE c.document_id = ?1 AND c.local_name = ?2 AND c.kind = ?3 \
                     AND c.depth = ?4 AND c.namespace_id IS ?5 AND c.parent_class_id IS ?6",
                    NODE_CLASS_COLUMNS
                ),
                params![
                    document.0,
                    local_name,
                    kind.code(),
                    depth as i64,
                    namespace_id.map(|n| n.0),
                    parent_class_id.map(|c| c.0)
                ],
                |row| node_class_from_row(row, 0),
            )
            .optional()
            .sql("find node class")?;
        if let Some(class) = existing {
            return Ok(class);
        }

        let id = NodeClassId(self.next_id(Sequence::NodeClass)?);
        self.conn
            .execute(
                "INSERT INTO node_class \
                 (id, kind, local_name, namespace_id, depth, parent_class_id, document_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id.0,
                    kind.code(),
                    local_name,
                    namespace_id.map(|n| n.0),
                    depth as i64,
                    parent_class_id.map(|c| c.0),
                    document.0
                ],
            )
            .sql("insert node class")?;
        debug!("Registered node class {} {} '{}' at depth {}", id, kind, local_name, depth);
        Ok(NodeClass {
            id,
            kind,
            local_name: local_name.to_string(),
            namespace_id,
            depth,
            parent_class_id,
            document_id: document,
        })
    }

    pub fn node_class(&self, id: NodeClassId) -> TemporaResult<NodeClass> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM node_class c WHERE c.id = ?1", NODE_CLASS_COLUMNS),
                params![id.0],
                |row| node_class_from_row(row, 0),
            )
            .optional()
            .sql("load node class")?
            .ok_or_else(|| TemporaError::Database(format!("node class {} does not exist", id)))
    }

    pub fn node_classes(&self, document: DocumentId) -> TemporaResult<Vec<NodeClass>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {} FROM node_class c WHERE c.document_id = ?1 ORDER BY c.id",
                NODE_CLASS_COLUMNS
            ))
            .sql("prepare node class list")?;
        let rows = stmt
            .query_map(params![document.0], |row| node_class_from_row(row, 0))
            .sql("list node classes")?;
        rows.collect::<rusqlite::Result<Vec<_>>>().sql("list node classes")
    }

    // Order classes

    /// One order class per depth per document: `parent_class_id` is recorded from the first
    /// caller but is not part of the lookup key.
    pub fn find_or_create_order_class(
        &self,
        document: DocumentId,
        depth: u32,
        parent_class_id: Option<NodeClassId>,
    ) -> TemporaResult<OrderClass> {
        if let Some(class) = self.order_class_at_depth(document, depth)? {
            return Ok(class);
        }

        let id = OrderClassId(self.next_id(Sequence::OrderClass)?);
        self.conn
            .execute(
                "INSERT INTO order_class (id, depth, parent_class_id, document_id) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![id.0, depth as i64, parent_class_id.map(|c| c.0), document.0],
            )
            .sql("insert order class")?;
        debug!("Registered order class {} for depth {}", id, depth);
        Ok(OrderClass {
            id,
            depth,
            parent_class_id,
            document_id: document,
        })
    }

    pub fn order_class_at_depth(
        &self,
        document: DocumentId,
        depth: u32,
    ) -> TemporaResult<Option<OrderClass>> {
        self.conn
            .query_row(
                "SELECT id, depth, parent_class_id, document_id FROM order_class \
                 WHERE document_id = ?1 AND depth = ?2 ORDER BY id LIMIT 1",
                params![document.0, depth as i64],
                order_class_from_row,
            )
            .optional()
            .sql("find order class")
    }

    pub fn order_classes(&self, document: DocumentId) -> TemporaResult<Vec<OrderClass>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT id, depth, parent_class_id, document_id FROM order_class \
                 WHERE document_id = ?1 ORDER BY depth",
            )
            .sql("prepare order class list")?;
        let rows = stmt
            .query_map(params![document.0], order_class_from_row)
            .sql("list order classes")?;
        rows.collect::<rusqlite::Result<Vec<_>>>().sql("list order classes")
    }
}

#[cfg(test)]
mod tests {
    use crate::store::TemporalStore;
    use tempora_core::{NodeKind, TemporaError};

    fn store() -> TemporalStore {
        let store = TemporalStore::open_in_memory().unwrap();
        store.bootstrap().unwrap();
        store
    }

    #[test]
    fn test_duplicate_document_rejected() {
        let mut store = store();
        store.write(|view| view.create_document("catalog", "<?xml version=\"1.0\"?>")).unwrap();
        let err = store.write(|view| view.create_document("catalog", "")).unwrap_err();
        assert!(matches!(err, TemporaError::InvalidInput(_)));

        let view = store.view();
        assert_eq!(view.document_named("catalog").unwrap().header, "<?xml version=\"1.0\"?>");
        assert!(matches!(
            view.document_named("missing"),
            Err(TemporaError::UnknownDocument(_))
        ));
    }

    #[test]
    fn test_namespaces_insert_on_miss() {
        let mut store = store();
        store
            .write(|view| {
                let doc = view.create_document("catalog", "")?;
                let first = view.find_or_create_namespace(doc.id, "urn:books", "b")?;
                let again = view.find_or_create_namespace(doc.id, "urn:books", "b")?;
                let other = view.find_or_create_namespace(doc.id, "urn:books", "bk")?;
                assert_eq!(first.id, again.id);
                assert_ne!(first.id, other.id);
                assert_eq!(view.namespaces(doc.id)?.len(), 2);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_prefix_resolution() {
        let mut store = store();
        store
            .write(|view| {
                let doc = view.create_document("catalog", "")?;
                assert!(view.resolve_prefix(doc.id, "")?.is_none());
                assert!(matches!(
                    view.resolve_prefix(doc.id, "b"),
                    Err(TemporaError::UnknownNamespacePrefix(_))
                ));

                view.find_or_create_namespace(doc.id, "urn:books", "b")?;
                assert_eq!(view.resolve_prefix(doc.id, "b")?.unwrap().uri, "urn:books");

                view.find_or_create_namespace(doc.id, "urn:other", "b")?;
                assert!(matches!(
                    view.resolve_prefix(doc.id, "b"),
                    Err(TemporaError::AmbiguousNamespacePrefix { bindings: 2, .. })
                ));

                view.find_or_create_namespace(doc.id, "urn:default", "")?;
                assert_eq!(view.resolve_prefix(doc.id, "")?.unwrap().uri, "urn:default");
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_node_classes_are_shared_by_shape() {
        let mut store = store();
        store
            .write(|view| {
                let doc = view.create_document("catalog", "")?;
                let root = view.find_or_create_node_class(doc.id, NodeKind::Element, "catalog", None, 1, None)?;
                let book = view.find_or_create_node_class(doc.id, NodeKind::Element, "book", None, 2, Some(root.id))?;
                let same = view.find_or_create_node_class(doc.id, NodeKind::Element, "book", None, 2, Some(root.id))?;
                let attr = view.find_or_create_node_class(doc.id, NodeKind::Attribute, "book", None, 2, Some(root.id))?;
                let deeper = view.find_or_create_node_class(doc.id, NodeKind::Element, "book", None, 3, Some(book.id))?;

                assert_eq!(book.id, same.id);
                assert_ne!(book.id, attr.id);
                assert_ne!(book.id, deeper.id);
                assert_eq!(view.node_class(book.id)?, book);
                assert_eq!(view.node_classes(doc.id)?.len(), 4);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_order_class_keyed_by_depth_only() {
        let mut store = store();
        store
            .write(|view| {
                let doc = view.create_document("catalog", "")?;
                let a = view.find_or_create_node_class(doc.id, NodeKind::Element, "a", None, 1, None)?;
                let b = view.find_or_create_node_class(doc.id, NodeKind::Element, "b", None, 1, None)?;

                let first = view.find_or_create_order_class(doc.id, 2, Some(a.id))?;
                let second = view.find_or_create_order_class(doc.id, 2, Some(b.id))?;
                assert_eq!(first.id, second.id);
                assert_eq!(second.parent_class_id, Some(a.id));

                let deeper = view.find_or_create_order_class(doc.id, 3, None)?;
                assert_ne!(first.id, deeper.id);
                assert_eq!(view.order_classes(doc.id)?.len(), 2);
                Ok(())
            })
            .unwrap();
    }
}
