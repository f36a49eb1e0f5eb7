//! Insert paths: `a/b/@c`, optionally prefixed as `p:name`

use tempora_core::{DocumentId, NamespaceId, NodeKind, TemporaError, TemporaResult};
use tempora_storage::StoreView;

use crate::tree::split_qualified;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub kind: NodeKind,
    pub prefix: Option<String>,
    pub local_name: String,
}

impl PathSegment {
    /// Namespace of the segment: its prefix's binding, the document's default namespace for
    /// unprefixed elements, none for unprefixed attributes
    pub fn namespace(
        &self,
        view: StoreView<'_>,
        document: DocumentId,
    ) -> TemporaResult<Option<NamespaceId>> {
        let namespace = match (&self.prefix, self.kind) {
            (Some(prefix), _) => view.resolve_prefix(document, prefix)?,
            (None, NodeKind::Attribute) => None,
            (None, _) => view.resolve_prefix(document, "")?,
        };
        Ok(namespace.map(|ns| ns.id))
    }
}

/// Parse an insert path. Only the last segment may name an attribute.
pub fn parse_path(path: &str) -> TemporaResult<Vec<PathSegment>> {
    let invalid = |why: &str| TemporaError::InvalidInput(format!("invalid path '{}': {}", path, why));

    let raw: Vec<&str> = path.split('/').collect();
    let mut segments = Vec::with_capacity(raw.len());
    for (i, part) in raw.iter().enumerate() {
        let (kind, name) = match part.strip_prefix('@') {
            Some(name) => (NodeKind::Attribute, name),
            None => (NodeKind::Element, *part),
        };
        if kind == NodeKind::Attribute && i + 1 != raw.len() {
            return Err(invalid("attributes can only end a path"));
        }
        let (prefix, local_name) = split_qualified(name);
        if local_name.is_empty() || prefix == Some("") || local_name.contains(':') {
            return Err(invalid("empty or malformed name"));
        }
        segments.push(PathSegment {
            kind,
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
        });
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_segments() {
        let segments = parse_path("b:review/rating/@scale").unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].prefix.as_deref(), Some("b"));
        assert_eq!(segments[0].local_name, "review");
        assert_eq!(segments[1].kind, NodeKind::Element);
        assert_eq!(segments[2].kind, NodeKind::Attribute);
        assert_eq!(segments[2].local_name, "scale");
    }

    #[test]
    fn test_malformed_paths() {
        for path in ["", "a//b", "@id/b", "a/:b", "a/b:", "a:b:c"] {
            assert!(
                matches!(parse_path(path), Err(TemporaError::InvalidInput(_))),
                "{} should be rejected",
                path
            );
        }
    }
}
