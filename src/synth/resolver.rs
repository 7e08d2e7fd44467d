//! Namespace target markers.
//!
//! A synthesized payload schema lives in a single target namespace, but
//! parts of the real message belong to other namespaces: the RPC operation
//! wrapper to the operation namespace, type-referenced parts to their
//! type's namespace. [`resolve_namespace_targets`] records those real
//! namespaces as fixed-value marker attributes on the affected elements so
//! the payload consumer can restore them when assembling the SOAP message.

use tracing::warn;

use crate::schema::{
    AttributeNode, ComplexTypeNode, ContentModelNode, ContentVariety, ElementNode, NodeId,
    ParticleKind, ParticleNode, QName, Schema, SchemaNode,
};

/// Name of the fixed marker attribute carrying an element's real
/// on-the-wire namespace.
pub const SOAP_PAYLOAD_NAMESPACE_ATTRIBUTE: &str = "soap-payload-namespace";

/// Suffix of the wrapper child element introduced when marking an element
/// of simple type, which cannot carry attributes directly.
pub const XML_SIMPLETYPE_VALUE_SUFFIX: &str = "-xml-simpletype-value";

/// How deep below a top-level element the marker search descends.
const MAX_SEARCH_DEPTH: usize = 3;

/// Attaches a namespace marker attribute to each named target element in
/// the schema. Targets name an element by local part and carry the real
/// namespace to record; elements are searched among the top-level
/// declarations first and then up to three levels below them.
pub fn resolve_namespace_targets(schema: &mut Schema, targets: &[QName]) {
    for target in targets {
        let found = schema
            .element_by_name(&target.local_part)
            .or_else(|| find_nested_element(schema, &target.local_part));
        match found {
            Some(element) => attach_marker(schema, element, &target.namespace_uri),
            None => {
                // wrapper elements can be elided for empty messages
                warn!(element = %target.local_part, "namespace target element not found");
            }
        }
    }
}

/// Breadth-limited search for an element below the top-level declarations.
/// Only sequence particles of complex types are descended into; wrapper
/// chains are built exactly that way.
fn find_nested_element(schema: &Schema, local_part: &str) -> Option<NodeId> {
    let roots: Vec<NodeId> = schema
        .roots()
        .iter()
        .copied()
        .filter(|&id| matches!(schema.node(id), SchemaNode::Element(_)))
        .collect();
    find_child_by_name(schema, &roots, local_part, MAX_SEARCH_DEPTH)
}

fn find_child_by_name(
    schema: &Schema,
    elements: &[NodeId],
    local_part: &str,
    depth: usize,
) -> Option<NodeId> {
    if depth == 0 {
        return None;
    }
    let mut next_level = Vec::new();
    for &id in elements {
        for child in element_children(schema, id) {
            if let SchemaNode::Element(el) = schema.node(child) {
                if el.name.as_deref() == Some(local_part) {
                    return Some(child);
                }
            }
            next_level.push(child);
        }
    }
    find_child_by_name(schema, &next_level, local_part, depth - 1)
}

fn element_children(schema: &Schema, element: NodeId) -> Vec<NodeId> {
    let SchemaNode::Element(el) = schema.node(element) else {
        return Vec::new();
    };
    let Some(type_node) = el.type_node else {
        return Vec::new();
    };
    let SchemaNode::ComplexType(ct) = schema.node(type_node) else {
        return Vec::new();
    };
    let Some(particle) = ct.particle else {
        return Vec::new();
    };
    match schema.node(particle) {
        SchemaNode::Particle(p) => p
            .items
            .iter()
            .copied()
            .filter(|&id| matches!(schema.node(id), SchemaNode::Element(_)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Puts the marker attribute on the element's type, rewriting the type
/// where a simple type cannot hold it.
fn attach_marker(schema: &mut Schema, element: NodeId, namespace: &str) {
    let attribute = schema.alloc(SchemaNode::Attribute(AttributeNode {
        name: Some(SOAP_PAYLOAD_NAMESPACE_ATTRIBUTE.to_string()),
        type_name: Some(QName::xsd("anyURI")),
        fixed_value: Some(namespace.to_string()),
        ..AttributeNode::default()
    }));

    let SchemaNode::Element(el) = schema.node(element) else {
        return;
    };
    let element_name = el.name.clone().unwrap_or_default();
    let type_name = el.type_name.clone();
    let type_node = el.type_node;

    match type_node {
        Some(type_id) => match schema.node(type_id) {
            SchemaNode::ComplexType(_) => {
                if let SchemaNode::ComplexType(ct) = schema.node_mut(type_id) {
                    ct.attributes.push(attribute);
                }
            }
            SchemaNode::SimpleType(_) => {
                wrap_simple_type(schema, element, &element_name, type_id, attribute);
            }
            _ => extend_builtin(schema, element, type_name, attribute),
        },
        None => extend_builtin(schema, element, type_name, attribute),
    }
}

/// Replaces a built-in type reference with a complex type whose simple
/// content extends the original type and holds the marker attribute.
fn extend_builtin(
    schema: &mut Schema,
    element: NodeId,
    base_name: Option<QName>,
    attribute: NodeId,
) {
    let content_model = schema.alloc(SchemaNode::ContentModel(ContentModelNode {
        base_name,
        attributes: vec![attribute],
        ..ContentModelNode::new(ContentVariety::SimpleExtension)
    }));
    let complex_type = schema.alloc(SchemaNode::ComplexType(ComplexTypeNode {
        content_model: Some(content_model),
        ..ComplexTypeNode::default()
    }));
    if let SchemaNode::Element(el) = schema.node_mut(element) {
        el.type_name = None;
        el.type_node = Some(complex_type);
    }
}

/// Replaces an element's simple type with a complex type holding the
/// marker attribute and a single child element of the original type.
fn wrap_simple_type(
    schema: &mut Schema,
    element: NodeId,
    element_name: &str,
    simple_type: NodeId,
    attribute: NodeId,
) {
    let value_element = schema.alloc(SchemaNode::Element(ElementNode {
        name: Some(format!("{element_name}{XML_SIMPLETYPE_VALUE_SUFFIX}")),
        type_node: Some(simple_type),
        ..ElementNode::default()
    }));
    let sequence = schema.alloc(SchemaNode::Particle(ParticleNode {
        kind: ParticleKind::Sequence,
        occurs: Default::default(),
        items: vec![value_element],
    }));
    let complex_type = schema.alloc(SchemaNode::ComplexType(ComplexTypeNode {
        attributes: vec![attribute],
        particle: Some(sequence),
        ..ComplexTypeNode::default()
    }));
    if let SchemaNode::Element(el) = schema.node_mut(element) {
        el.type_node = Some(complex_type);
    }
}
