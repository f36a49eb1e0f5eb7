//! Subtree serialization
//!
//! Elements render with their attributes and children as nested markup. With annotation on,
//! a node whose validity differs from its rendering parent's carries its id and bounds as
//! `prefix:id`, `prefix:from` and `prefix:to` attributes. Text and attribute records cannot
//! carry attributes of their own, so those render as `prefix:text` and `prefix:attribute`
//! elements instead; an attribute keeps its name in a plain `name` attribute.
//!
//! Without annotation a history render keeps one attribute per name, the latest version.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use tempora_core::config::RenderConfig;
use tempora_core::{Interval, NodeKind, TemporaResult, Timestamp};

use crate::handle::NodeHandle;
use crate::session::Session;
use crate::set::NodeSet;

/// Namespace bound to the annotation prefix in rendered documents
pub const ANNOTATION_NAMESPACE: &str = "urn:tempora:validity";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Snapshot instant; `None` renders every record in the history
    pub at: Option<Timestamp>,
    pub annotate: bool,
    /// Spaces per nesting level; 0 renders on one line
    pub indent: usize,
}

impl RenderOptions {
    pub fn at(t: Timestamp) -> Self {
        Self {
            at: Some(t),
            ..Self::default()
        }
    }

    pub fn history() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            indent: config.indent,
            ..Self::default()
        }
    }

    pub fn annotated(mut self) -> Self {
        self.annotate = true;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

pub(crate) struct Renderer<'s, 'c> {
    session: &'s mut Session<'c>,
    options: RenderOptions,
    prefix: String,
    open_label: String,
}

impl<'s, 'c> Renderer<'s, 'c> {
    pub(crate) fn new(session: &'s mut Session<'c>, options: &RenderOptions) -> Self {
        let prefix = session.render_config().annotation_prefix.clone();
        let open_label = session.render_config().open_label.clone();
        Self {
            session,
            options: options.clone(),
            prefix,
            open_label,
        }
    }

    pub(crate) fn render_set(&mut self, nodes: &NodeSet) -> TemporaResult<String> {
        let mut out = String::new();
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 && self.options.indent > 0 {
                out.push('\n');
            }
            self.render_node(&mut out, node, None, 0, &[])?;
        }
        Ok(out)
    }

    pub(crate) fn render_document(&mut self, root: Option<&NodeHandle>) -> TemporaResult<String> {
        let mut out = String::new();
        let header = self.session.document().header.clone();
        if !header.is_empty() {
            out.push_str(&header);
            out.push('\n');
        }
        let Some(root) = root else {
            return Ok(out);
        };

        let mut declarations: Vec<(String, String)> = Vec::new();
        let namespaces = self.session.view().namespaces(self.session.document().id)?;
        for namespace in namespaces {
            let name = if namespace.is_default() {
                "xmlns".to_string()
            } else {
                format!("xmlns:{}", namespace.prefix)
            };
            if !declarations.iter().any(|(n, _)| *n == name) {
                declarations.push((name, namespace.uri));
            }
        }
        if self.options.annotate {
            declarations.push((format!("xmlns:{}", self.prefix), ANNOTATION_NAMESPACE.to_string()));
        }

        self.render_node(&mut out, root, None, 0, &declarations)?;
        Ok(out)
    }

    fn render_node(
        &mut self,
        out: &mut String,
        node: &NodeHandle,
        context: Option<Interval>,
        level: usize,
        extra: &[(String, String)],
    ) -> TemporaResult<()> {
        self.pad(out, level);
        match node.kind() {
            NodeKind::Element if !node.is_synthetic() => {
                self.render_element(out, node, context, level, extra)
            }
            NodeKind::Attribute => {
                let name = self.session.qualified_name(node)?;
                if self.options.annotate && context != Some(node.valid()) {
                    self.render_annotated_leaf(out, "attribute", Some(&name), node);
                } else {
                    let _ = write!(out, "{}=\"{}\"", name, escape_attribute(node.value().unwrap_or("")));
                }
                Ok(())
            }
            NodeKind::Text if self.options.annotate && context != Some(node.valid()) => {
                self.render_annotated_leaf(out, "text", None, node);
                Ok(())
            }
            _ => {
                out.push_str(&escape_text(node.value().unwrap_or("")));
                Ok(())
            }
        }
    }

    fn render_element(
        &mut self,
        out: &mut String,
        node: &NodeHandle,
        context: Option<Interval>,
        level: usize,
        extra: &[(String, String)],
    ) -> TemporaResult<()> {
        let name = self.session.qualified_name(node)?;
        let (attributes, children) = match self.options.at {
            Some(t) => (
                self.session.attributes_at(node, t)?,
                self.session.children_at(node, t)?,
            ),
            None => {
                let attributes = self.session.attributes(node)?;
                let children = self.session.children(node)?;
                (self.session.sort(attributes)?, self.session.sort(children)?)
            }
        };

        let _ = write!(out, "<{}", name);
        for (attr, value) in extra {
            let _ = write!(out, " {}=\"{}\"", attr, escape_attribute(value));
        }
        if self.options.annotate && context != Some(node.valid()) {
            self.write_annotation(out, node);
        }

        // Versions that do not share the element's validity move into the content
        let mut in_tag: Vec<(String, NodeHandle)> = Vec::new();
        let mut detached: Vec<NodeHandle> = Vec::new();
        for attribute in attributes.iter() {
            if self.options.annotate && attribute.valid() != node.valid() {
                detached.push(attribute.clone());
                continue;
            }
            let attribute_name = self.session.qualified_name(attribute)?;
            match in_tag.iter_mut().find(|(n, _)| *n == attribute_name) {
                Some(slot) => {
                    if attribute.valid().from > slot.1.valid().from {
                        slot.1 = attribute.clone();
                    }
                }
                None => in_tag.push((attribute_name, attribute.clone())),
            }
        }
        for (attribute_name, attribute) in &in_tag {
            let _ = write!(
                out,
                " {}=\"{}\"",
                attribute_name,
                escape_attribute(attribute.value().unwrap_or(""))
            );
        }

        if children.is_empty() && detached.is_empty() {
            out.push_str("/>");
            return Ok(());
        }
        out.push('>');

        let inline = self.options.indent == 0
            || (detached.is_empty() && children.iter().all(|c| c.kind() == NodeKind::Text));
        for child in detached.iter().chain(children.iter()) {
            if inline {
                self.render_node(out, child, Some(node.valid()), 0, &[])?;
            } else {
                out.push('\n');
                self.render_node(out, child, Some(node.valid()), level + 1, &[])?;
            }
        }
        if !inline {
            out.push('\n');
            self.pad(out, level);
        }
        let _ = write!(out, "</{}>", name);
        Ok(())
    }

    fn render_annotated_leaf(
        &self,
        out: &mut String,
        tag: &str,
        name: Option<&str>,
        node: &NodeHandle,
    ) {
        let _ = write!(out, "<{}:{}", self.prefix, tag);
        if let Some(name) = name {
            let _ = write!(out, " name=\"{}\"", escape_attribute(name));
        }
        self.write_annotation(out, node);
        let _ = write!(
            out,
            ">{}</{}:{}>",
            escape_text(node.value().unwrap_or("")),
            self.prefix,
            tag
        );
    }

    fn write_annotation(&self, out: &mut String, node: &NodeHandle) {
        let valid = node.valid();
        let _ = write!(
            out,
            " {p}:id=\"{}\" {p}:from=\"{}\" {p}:to=\"{}\"",
            node.id(),
            valid.from,
            self.bound(valid.to),
            p = self.prefix
        );
    }

    fn bound(&self, t: Timestamp) -> String {
        if t.is_open() {
            self.open_label.clone()
        } else {
            t.to_string()
        }
    }

    fn pad(&self, out: &mut String, level: usize) {
        if self.options.indent > 0 {
            out.extend(std::iter::repeat(' ').take(level * self.options.indent));
        }
    }
}

pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaping() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attribute("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_option_builders() {
        let options = RenderOptions::at(Timestamp(4)).annotated().with_indent(2);
        assert_eq!(options.at, Some(Timestamp(4)));
        assert!(options.annotate);
        assert_eq!(options.indent, 2);
        assert_eq!(RenderOptions::history().at, None);
    }
}
