//! In-memory XML Schema graph.
//!
//! A [`Schema`] is an arena of [`SchemaNode`]s plus the schema-level
//! declarations: target namespace, form defaults, and the ordered list of
//! top-level (root) declarations with by-name lookup indices. Source
//! schemas are built by the WSDL-facing caller; target schemas are built by
//! the extraction engine.

use ahash::AHashMap;

pub mod model;
pub mod qname;
mod writer;

pub use model::{
    AnyNode, AttributeGroupNode, AttributeNode, AttributeUse, ComplexTypeNode, ContentModelNode,
    ContentVariety, ElementNode, Facet, Form, GroupNode, MaxOccurs, NodeId, Occurs, ParticleKind,
    ParticleNode, RefKind, ReferenceNode, SchemaNode, SimpleTypeContent, SimpleTypeNode,
};
pub use qname::{QName, XSD_NAMESPACE};

use crate::error::ExtractError;

/// One schema grouping: a node arena with a target namespace and top-level
/// declarations.
#[derive(Debug, Clone)]
pub struct Schema {
    pub target_namespace: String,
    pub element_form_default: Form,
    pub attribute_form_default: Form,
    nodes: Vec<SchemaNode>,
    roots: Vec<NodeId>,
    elements: AHashMap<String, NodeId>,
    attributes: AHashMap<String, NodeId>,
    types: AHashMap<String, NodeId>,
    groups: AHashMap<String, NodeId>,
    attribute_groups: AHashMap<String, NodeId>,
}

impl Schema {
    /// An empty schema in the given target namespace.
    pub fn new(target_namespace: impl Into<String>) -> Self {
        Self {
            target_namespace: target_namespace.into(),
            element_form_default: Form::default(),
            attribute_form_default: Form::default(),
            nodes: Vec::new(),
            roots: Vec::new(),
            elements: AHashMap::new(),
            attributes: AHashMap::new(),
            types: AHashMap::new(),
            groups: AHashMap::new(),
            attribute_groups: AHashMap::new(),
        }
    }

    /// Adds a node to the arena and returns its handle.
    pub fn alloc(&mut self, node: SchemaNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.index()]
    }

    /// Declares a node at the schema root. Marks it top-level and, if it is
    /// named, registers it in the matching by-name index.
    pub fn add_root(&mut self, id: NodeId) {
        match self.node_mut(id) {
            SchemaNode::Element(n) => n.top_level = true,
            SchemaNode::Attribute(n) => n.top_level = true,
            SchemaNode::SimpleType(n) => n.top_level = true,
            SchemaNode::ComplexType(n) => n.top_level = true,
            _ => {}
        }
        if let Some(name) = self.node(id).name().map(str::to_string) {
            match self.node(id) {
                SchemaNode::Element(_) => {
                    self.elements.insert(name, id);
                }
                SchemaNode::Attribute(_) => {
                    self.attributes.insert(name, id);
                }
                SchemaNode::SimpleType(_) | SchemaNode::ComplexType(_) => {
                    self.types.insert(name, id);
                }
                SchemaNode::Group(_) => {
                    self.groups.insert(name, id);
                }
                SchemaNode::AttributeGroup(_) => {
                    self.attribute_groups.insert(name, id);
                }
                _ => {}
            }
        }
        self.roots.push(id);
    }

    /// Top-level declarations, in declaration order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// All nodes of the arena, in allocation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SchemaNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Looks up a top-level element by local name.
    pub fn element_by_name(&self, local_part: &str) -> Option<NodeId> {
        self.elements.get(local_part).copied()
    }

    pub fn element_by_qname(&self, name: &QName) -> Option<NodeId> {
        self.in_namespace(name, &self.elements)
    }

    pub fn attribute_by_qname(&self, name: &QName) -> Option<NodeId> {
        self.in_namespace(name, &self.attributes)
    }

    /// Looks up a named top-level simple or complex type.
    pub fn type_by_qname(&self, name: &QName) -> Option<NodeId> {
        self.in_namespace(name, &self.types)
    }

    pub fn group_by_qname(&self, name: &QName) -> Option<NodeId> {
        self.in_namespace(name, &self.groups)
    }

    pub fn attribute_group_by_qname(&self, name: &QName) -> Option<NodeId> {
        self.in_namespace(name, &self.attribute_groups)
    }

    fn in_namespace(&self, name: &QName, index: &AHashMap<String, NodeId>) -> Option<NodeId> {
        if name.namespace_uri == self.target_namespace {
            index.get(&name.local_part).copied()
        } else {
            None
        }
    }

    /// Qualified name of a named node in this schema's namespace.
    pub fn qname_of(&self, id: NodeId) -> Option<QName> {
        self.node(id)
            .name()
            .map(|local| QName::new(self.target_namespace.clone(), local))
    }

    /// Serializes the schema to its canonical XSD document form.
    pub fn to_document_string(&self) -> Result<String, ExtractError> {
        writer::write_document(self)
    }
}
