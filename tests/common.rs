//! Common test utilities for building source schemas and binding messages.
use soapgen::prelude::*;

pub const NS: &str = "http://example.com/test";

/// Qualified name in the shared test namespace.
pub fn qn(local: &str) -> QName {
    QName::new(NS, local)
}

#[allow(dead_code)]
pub fn new_schema() -> Schema {
    Schema::new(NS)
}

/// Message part referencing a schema element, named in the test namespace.
#[allow(dead_code)]
pub fn element_part(name: &str, element: &str) -> MessagePart {
    MessagePart {
        name: qn(name),
        element_name: Some(qn(element)),
        type_name: None,
    }
}

/// Message part referencing a type by qualified name, named in the test
/// namespace.
#[allow(dead_code)]
pub fn type_part(name: &str, type_name: QName) -> MessagePart {
    MessagePart {
        name: qn(name),
        element_name: None,
        type_name: Some(type_name),
    }
}

#[allow(dead_code)]
pub fn document_message(body_parts: Vec<MessagePart>) -> BindingMessage {
    BindingMessage {
        operation: "Lookup".to_string(),
        operation_namespace: NS.to_string(),
        direction: MessageDirection::Input,
        style: Style::Document,
        body_use: Use::Literal,
        body_parts,
        header_parts: vec![],
    }
}

#[allow(dead_code)]
pub fn rpc_message(
    operation: &str,
    direction: MessageDirection,
    body_parts: Vec<MessagePart>,
    header_parts: Vec<MessagePart>,
) -> BindingMessage {
    BindingMessage {
        operation: operation.to_string(),
        operation_namespace: NS.to_string(),
        direction,
        style: Style::Rpc,
        body_use: Use::Literal,
        body_parts,
        header_parts,
    }
}

/// Adds a top-level element of the given type name to `schema`.
#[allow(dead_code)]
pub fn add_element_of_type(schema: &mut Schema, name: &str, type_name: QName) -> NodeId {
    let element = schema.alloc(SchemaNode::Element(ElementNode {
        name: Some(name.to_string()),
        type_name: Some(type_name),
        ..ElementNode::default()
    }));
    schema.add_root(element);
    element
}

/// Adds a named top-level complex type whose sequence holds one child
/// element per `(name, type)` pair.
#[allow(dead_code)]
pub fn add_complex_type(schema: &mut Schema, name: &str, children: &[(&str, QName)]) -> NodeId {
    let items = children
        .iter()
        .map(|(child, child_type)| {
            schema.alloc(SchemaNode::Element(ElementNode {
                name: Some(child.to_string()),
                type_name: Some(child_type.clone()),
                ..ElementNode::default()
            }))
        })
        .collect();
    let sequence = schema.alloc(SchemaNode::Particle(ParticleNode {
        kind: ParticleKind::Sequence,
        occurs: Occurs::default(),
        items,
    }));
    let complex_type = schema.alloc(SchemaNode::ComplexType(ComplexTypeNode {
        name: Some(name.to_string()),
        particle: Some(sequence),
        ..ComplexTypeNode::default()
    }));
    schema.add_root(complex_type);
    complex_type
}

/// Runs a full extraction of one top-level element and serializes the
/// result, without any message wrapping.
#[allow(dead_code)]
pub fn extract_element_document(schema: &Schema, element: &str) -> Result<String, ExtractError> {
    let source_element = schema
        .element_by_name(element)
        .unwrap_or_else(|| panic!("test schema has no element {element}"));
    let mut extractor = SchemaExtractor::new(Schema::new(NS), schema);
    extractor.extract_element(source_element, true)?;
    extractor.drain()?;
    extractor.target().to_document_string()
}
