//! The schema node kinds making up the in-memory schema graph.
//!
//! Every construct is a variant of [`SchemaNode`], stored in a [`Schema`]
//! arena and addressed by [`NodeId`] handles. Nodes reference each other by
//! handle rather than by ownership, which lets the extraction engine copy
//! subgraphs breadth-first through a work queue without fighting over
//! object identity.
//!
//! [`Schema`]: super::Schema

use super::qname::QName;

/// Handle to a node inside one [`Schema`] arena. Handles are only
/// meaningful for the schema that allocated them.
///
/// [`Schema`]: super::Schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// XML Schema qualification form for local element/attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Form {
    #[default]
    Unqualified,
    Qualified,
}

/// Upper bound of an occurrence range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

/// An `minOccurs`/`maxOccurs` pair, defaulting to exactly-once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    pub min: u32,
    pub max: MaxOccurs,
}

impl Default for Occurs {
    fn default() -> Self {
        Self {
            min: 1,
            max: MaxOccurs::Bounded(1),
        }
    }
}

impl Occurs {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// `use` attribute of an attribute declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUse {
    #[default]
    Optional,
    Required,
    Prohibited,
}

/// An element declaration, top-level or nested. Carries either a built-in
/// type name (`type_name`) or an inline type node (`type_node`), never both.
#[derive(Debug, Clone, Default)]
pub struct ElementNode {
    pub name: Option<String>,
    pub top_level: bool,
    pub form: Form,
    pub occurs: Occurs,
    pub nillable: bool,
    pub default_value: Option<String>,
    pub fixed_value: Option<String>,
    pub substitution_group: Option<QName>,
    pub type_name: Option<QName>,
    pub type_node: Option<NodeId>,
}

/// An attribute declaration.
#[derive(Debug, Clone, Default)]
pub struct AttributeNode {
    pub name: Option<String>,
    pub top_level: bool,
    pub form: Form,
    pub usage: AttributeUse,
    pub default_value: Option<String>,
    pub fixed_value: Option<String>,
    pub type_name: Option<QName>,
    pub type_node: Option<NodeId>,
}

/// A constraining facet of a simple type restriction, e.g. `maxLength`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub name: String,
    pub value: String,
}

/// Derivation of a simple type: restriction, list, or union.
#[derive(Debug, Clone)]
pub enum SimpleTypeContent {
    Restriction {
        base_name: Option<QName>,
        base: Option<NodeId>,
        facets: Vec<Facet>,
    },
    List {
        item_name: Option<QName>,
        item: Option<NodeId>,
    },
    Union {
        member_names: Vec<QName>,
        members: Vec<NodeId>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SimpleTypeNode {
    pub name: Option<String>,
    pub top_level: bool,
    pub content: Option<SimpleTypeContent>,
}

/// A complex type. Owns either a content model (simple/complex content
/// derivation) or a particle, plus its attribute declarations.
#[derive(Debug, Clone, Default)]
pub struct ComplexTypeNode {
    pub name: Option<String>,
    pub top_level: bool,
    pub mixed: bool,
    pub is_abstract: bool,
    pub attributes: Vec<NodeId>,
    pub content_model: Option<NodeId>,
    pub particle: Option<NodeId>,
}

/// Compositor of a model-group particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Sequence,
    Choice,
    All,
}

/// A model-group particle ordering its child nodes.
#[derive(Debug, Clone)]
pub struct ParticleNode {
    pub kind: ParticleKind,
    pub occurs: Occurs,
    pub items: Vec<NodeId>,
}

/// Derivation variety of a complex type's content model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentVariety {
    SimpleExtension,
    SimpleRestriction,
    ComplexExtension,
    ComplexRestriction,
}

/// Content model of a complex type, flattened over the `simpleContent`/
/// `complexContent` wrapper of the XSD syntax.
#[derive(Debug, Clone)]
pub struct ContentModelNode {
    pub variety: ContentVariety,
    pub base_name: Option<QName>,
    pub base: Option<NodeId>,
    pub attributes: Vec<NodeId>,
    pub particle: Option<NodeId>,
    pub facets: Vec<Facet>,
}

impl ContentModelNode {
    pub fn new(variety: ContentVariety) -> Self {
        Self {
            variety,
            base_name: None,
            base: None,
            attributes: Vec::new(),
            particle: None,
            facets: Vec::new(),
        }
    }
}

/// A named top-level model group. Always wraps exactly one particle.
#[derive(Debug, Clone)]
pub struct GroupNode {
    pub name: Option<String>,
    pub particle: NodeId,
}

/// A named top-level attribute group. Members are attributes, nested
/// attribute groups, or attribute-group references.
#[derive(Debug, Clone)]
pub struct AttributeGroupNode {
    pub name: Option<String>,
    pub members: Vec<NodeId>,
}

/// What a [`ReferenceNode`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Element,
    Attribute,
    Group,
    AttributeGroup,
}

/// A `ref="..."` to a named top-level declaration. References only ever
/// appear in source schemas; extraction resolves every one of them to an
/// inlined copy.
#[derive(Debug, Clone)]
pub struct ReferenceNode {
    pub kind: RefKind,
    pub ref_name: QName,
    pub occurs: Occurs,
}

/// An `xsd:any` wildcard. Copied verbatim, never expanded.
#[derive(Debug, Clone, Default)]
pub struct AnyNode {
    pub occurs: Occurs,
    pub namespace: Option<String>,
    pub process_contents: Option<String>,
}

/// A node of the schema graph.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Element(ElementNode),
    Attribute(AttributeNode),
    SimpleType(SimpleTypeNode),
    ComplexType(ComplexTypeNode),
    Particle(ParticleNode),
    ContentModel(ContentModelNode),
    Group(GroupNode),
    AttributeGroup(AttributeGroupNode),
    Reference(ReferenceNode),
    Any(AnyNode),
}

impl SchemaNode {
    /// Local name of the node, if it carries one.
    pub fn name(&self) -> Option<&str> {
        match self {
            SchemaNode::Element(n) => n.name.as_deref(),
            SchemaNode::Attribute(n) => n.name.as_deref(),
            SchemaNode::SimpleType(n) => n.name.as_deref(),
            SchemaNode::ComplexType(n) => n.name.as_deref(),
            SchemaNode::Group(n) => n.name.as_deref(),
            SchemaNode::AttributeGroup(n) => n.name.as_deref(),
            SchemaNode::Particle(_)
            | SchemaNode::ContentModel(_)
            | SchemaNode::Reference(_)
            | SchemaNode::Any(_) => None,
        }
    }

    /// True iff the node is declared directly under a schema root.
    pub fn is_top_level(&self) -> bool {
        match self {
            SchemaNode::Element(n) => n.top_level,
            SchemaNode::Attribute(n) => n.top_level,
            SchemaNode::SimpleType(n) => n.top_level,
            SchemaNode::ComplexType(n) => n.top_level,
            // Groups and attribute groups only exist as named top-level
            // declarations.
            SchemaNode::Group(_) | SchemaNode::AttributeGroup(_) => true,
            SchemaNode::Particle(_)
            | SchemaNode::ContentModel(_)
            | SchemaNode::Reference(_)
            | SchemaNode::Any(_) => false,
        }
    }

    /// A named node declared at the schema root. Only these participate in
    /// cycle detection: anonymous nodes cannot be referenced a second time.
    pub fn is_named_root(&self) -> bool {
        self.name().is_some() && self.is_top_level()
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            SchemaNode::Element(_) => "element",
            SchemaNode::Attribute(_) => "attribute",
            SchemaNode::SimpleType(_) => "simpleType",
            SchemaNode::ComplexType(_) => "complexType",
            SchemaNode::Particle(_) => "particle",
            SchemaNode::ContentModel(_) => "contentModel",
            SchemaNode::Group(_) => "group",
            SchemaNode::AttributeGroup(_) => "attributeGroup",
            SchemaNode::Reference(_) => "reference",
            SchemaNode::Any(_) => "any",
        }
    }
}
