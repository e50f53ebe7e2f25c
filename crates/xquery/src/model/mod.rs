//! Read-only XML trees stored as pre-order arenas.
//!
//! Every node of a [`Document`] is a record in one vector, in document order. A
//! record stores its parent index and the size of its subtree (itself, attributes
//! and descendants), so parent, child and attribute navigation is index arithmetic.

use core::fmt;
use std::sync::Arc;
use url::Url;

use crate::consts::XML_URI;
use crate::engine::runtime::Error;
use crate::xdm::XdmAtomicValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
    pub ns_uri: Option<String>,
}

impl QName {
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            ns_uri: None,
        }
    }

    pub fn xml(local: impl Into<String>) -> Self {
        Self {
            prefix: Some("xml".to_string()),
            local: local.into(),
            ns_uri: Some(XML_URI.to_string()),
        }
    }

    fn is_xml_base(&self) -> bool {
        self.ns_uri.as_deref() == Some(XML_URI) && self.local == "base"
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) if !p.is_empty() => write!(f, "{p}:{}", self.local),
            _ => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone)]
struct NodeRecord {
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    parent: Option<usize>,
    size: usize,
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeRecord>,
    uri: Option<String>,
}

impl Document {
    pub fn root(self: &Arc<Self>) -> NodeHandle {
        NodeHandle {
            doc: self.clone(),
            pre: 0,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Node identity is the pair (document, pre-order index).
#[derive(Clone)]
pub struct NodeHandle {
    doc: Arc<Document>,
    pre: usize,
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.doc, &other.doc) && self.pre == other.pre
    }
}

impl Eq for NodeHandle {}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rec = self.record();
        match (&rec.kind, &rec.name) {
            (NodeKind::Document, _) => write!(f, "document-node()#{}", self.pre),
            (NodeKind::Element, Some(n)) => write!(f, "<{n}>#{}", self.pre),
            (NodeKind::Attribute, Some(n)) => write!(f, "@{n}#{}", self.pre),
            (NodeKind::ProcessingInstruction, Some(n)) => write!(f, "<?{n}?>#{}", self.pre),
            (NodeKind::Comment, _) => write!(f, "<!-- -->#{}", self.pre),
            _ => write!(f, "text()#{}", self.pre),
        }
    }
}

impl NodeHandle {
    fn record(&self) -> &NodeRecord {
        &self.doc.nodes[self.pre]
    }

    fn at(&self, pre: usize) -> NodeHandle {
        NodeHandle {
            doc: self.doc.clone(),
            pre,
        }
    }

    pub fn pre(&self) -> usize {
        self.pre
    }

    pub fn kind(&self) -> NodeKind {
        self.record().kind
    }

    pub fn name(&self) -> Option<&QName> {
        self.record().name.as_ref()
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.record().parent.map(|p| self.at(p))
    }

    fn direct(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        let end = self.pre + self.record().size;
        let mut i = self.pre + 1;
        core::iter::from_fn(move || {
            if i >= end {
                return None;
            }
            let cur = i;
            i += self.doc.nodes[cur].size;
            Some(self.at(cur))
        })
    }

    pub fn children(&self) -> Vec<NodeHandle> {
        self.direct()
            .filter(|n| n.kind() != NodeKind::Attribute)
            .collect()
    }

    pub fn attributes(&self) -> Vec<NodeHandle> {
        self.direct()
            .filter(|n| n.kind() == NodeKind::Attribute)
            .collect()
    }

    pub fn attribute(&self, name: &QName) -> Option<NodeHandle> {
        self.direct()
            .find(|n| n.kind() == NodeKind::Attribute && n.name() == Some(name))
    }

    /// Concatenated text descendants for documents and elements, own value otherwise.
    pub fn string_value(&self) -> String {
        let rec = self.record();
        match rec.kind {
            NodeKind::Document | NodeKind::Element => self.doc.nodes
                [self.pre + 1..self.pre + rec.size]
                .iter()
                .filter(|r| r.kind == NodeKind::Text)
                .filter_map(|r| r.value.as_deref())
                .collect(),
            _ => rec.value.clone().unwrap_or_default(),
        }
    }

    /// Atomized value. Without schema types, comments and processing instructions
    /// are `xs:string`; all other nodes are `xs:untypedAtomic`.
    pub fn typed_value(&self) -> XdmAtomicValue {
        let s = self.string_value();
        match self.kind() {
            NodeKind::Comment | NodeKind::ProcessingInstruction => XdmAtomicValue::String(s),
            _ => XdmAtomicValue::UntypedAtomic(s),
        }
    }

    /// Base URI: `xml:base` values and the document URI are resolved from the
    /// node upwards until one is absolute, then against the static base URI.
    /// Attributes and text without a parent have none.
    pub fn base_uri(&self, static_base: Option<&Url>) -> Result<Option<Url>, Error> {
        let mut cur = match self.kind() {
            NodeKind::Element | NodeKind::Document => Some(self.pre),
            _ => match self.record().parent {
                Some(p) => Some(p),
                None => return Ok(None),
            },
        };
        let mut relative: Vec<&str> = Vec::new();
        while let Some(pre) = cur {
            if let Some(base) = self.own_base(pre) {
                match Url::parse(base) {
                    Ok(anchor) => return resolve_against(anchor, &relative).map(Some),
                    Err(url::ParseError::RelativeUrlWithoutBase) => relative.push(base),
                    Err(e) => return Err(uri_error(base, e)),
                }
            }
            cur = self.doc.nodes[pre].parent;
        }
        match (static_base, relative.last()) {
            (Some(anchor), _) => resolve_against(anchor.clone(), &relative).map(Some),
            (None, Some(base)) => Err(uri_error(base, url::ParseError::RelativeUrlWithoutBase)),
            (None, None) => Ok(None),
        }
    }

    // `xml:base` of the element at `pre`, or the URI of the document node.
    fn own_base(&self, pre: usize) -> Option<&str> {
        match self.doc.nodes[pre].kind {
            NodeKind::Element => {
                let attr = self.at(pre).direct().find(|a| a.name().is_some_and(QName::is_xml_base))?;
                self.doc.nodes[attr.pre].value.as_deref()
            }
            NodeKind::Document => self.doc.uri.as_deref(),
            _ => None,
        }
    }
}

// `relative` is ordered from the node upwards.
fn resolve_against(anchor: Url, relative: &[&str]) -> Result<Url, Error> {
    relative
        .iter()
        .rev()
        .try_fold(anchor, |base, rel| base.join(rel).map_err(|e| uri_error(rel, e)))
}

fn uri_error(uri: &str, e: url::ParseError) -> Error {
    Error::invalid_uri(uri).with_source(Some(Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>))
}

/// Builds a [`Document`] in document order.
///
/// Attributes must be added right after `start_element`, before any child.
#[derive(Debug)]
pub struct DocumentBuilder {
    nodes: Vec<NodeRecord>,
    open: Vec<usize>,
    uri: Option<String>,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeRecord {
                kind: NodeKind::Document,
                name: None,
                value: None,
                parent: None,
                size: 1,
            }],
            open: vec![0],
            uri: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    fn push(&mut self, kind: NodeKind, name: Option<QName>, value: Option<String>) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(NodeRecord {
            kind,
            name,
            value,
            parent: self.open.last().copied(),
            size: 1,
        });
        idx
    }

    pub fn start_element(&mut self, name: QName) -> &mut Self {
        let idx = self.push(NodeKind::Element, Some(name), None);
        self.open.push(idx);
        self
    }

    pub fn attribute(&mut self, name: QName, value: impl Into<String>) -> &mut Self {
        self.push(NodeKind::Attribute, Some(name), Some(value.into()));
        self
    }

    /// Shorthand for an `xml:base` attribute.
    pub fn base(&mut self, uri: impl Into<String>) -> &mut Self {
        self.attribute(QName::xml("base"), uri)
    }

    pub fn text(&mut self, value: impl Into<String>) -> &mut Self {
        self.push(NodeKind::Text, None, Some(value.into()));
        self
    }

    pub fn comment(&mut self, value: impl Into<String>) -> &mut Self {
        self.push(NodeKind::Comment, None, Some(value.into()));
        self
    }

    pub fn processing_instruction(&mut self, target: &str, data: impl Into<String>) -> &mut Self {
        self.push(
            NodeKind::ProcessingInstruction,
            Some(QName::local(target)),
            Some(data.into()),
        );
        self
    }

    pub fn end_element(&mut self) -> &mut Self {
        // the document node (index 0) is closed by `build`
        if self.open.len() > 1
            && let Some(idx) = self.open.pop()
        {
            self.nodes[idx].size = self.nodes.len() - idx;
        }
        self
    }

    /// Close any open elements and freeze the tree. The builder starts over empty.
    pub fn build(&mut self) -> Arc<Document> {
        while self.open.len() > 1 {
            self.end_element();
        }
        let DocumentBuilder { mut nodes, uri, .. } = core::mem::take(self);
        let len = nodes.len();
        if let Some(root) = nodes.first_mut() {
            root.size = len;
        }
        Arc::new(Document { nodes, uri })
    }
}
