//! SOAP payload schema synthesis.
//!
//! [`PayloadSynthesizer`] turns one WSDL binding message into a
//! self-contained payload schema document. It seeds the extraction engine
//! with the message parts, wraps them according to the binding style, and
//! marks every inserted wrapper with its real on-the-wire namespace so that
//! the payload consumer can reassemble a namespaced SOAP message from the
//! single-namespace schema.

pub mod resolver;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ExtractError;
use crate::extractor::SchemaExtractor;
use crate::schema::{
    ComplexTypeNode, ElementNode, NodeId, ParticleKind, ParticleNode, QName, Schema, SchemaNode,
};

/// Local name of the top-level wrapper element standing in for the SOAP
/// envelope in synthesized payload schemas.
pub const SOAP_PAYLOAD_ENVELOPE_ELEMENT: &str = "soap-payload-envelope";
/// Local name of the wrapper element collecting SOAP header parts.
pub const SOAP_PAYLOAD_HEADER_ELEMENT: &str = "soap-payload-header";
/// Local name of the wrapper element collecting SOAP body parts.
pub const SOAP_PAYLOAD_BODY_ELEMENT: &str = "soap-payload-body";

/// SOAP binding style of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Rpc,
    Document,
}

/// SOAP `use` of a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Use {
    Literal,
    Encoded,
}

/// Which half of the operation the message describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    Input,
    Output,
}

impl std::fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageDirection::Input => f.write_str("input"),
            MessageDirection::Output => f.write_str("output"),
        }
    }
}

/// One message part: the part's concrete qualified name plus either an
/// element reference or a type reference into the service schema. The
/// concrete name carries the namespace the part uses on the wire, which
/// can differ from the referenced type's namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePart {
    pub name: QName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_name: Option<QName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<QName>,
}

/// The binding-level view of one message of one operation, resolved from
/// the WSDL by the caller: style, use, and the parts bound to the SOAP
/// body and headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingMessage {
    pub operation: String,
    pub operation_namespace: String,
    pub direction: MessageDirection,
    pub style: Style,
    pub body_use: Use,
    #[serde(default)]
    pub body_parts: Vec<MessagePart>,
    #[serde(default)]
    pub header_parts: Vec<MessagePart>,
}

impl BindingMessage {
    /// Local name of the RPC wrapper: the operation name on input, with a
    /// `Response` suffix on output.
    fn rpc_wrapper_name(&self) -> String {
        match self.direction {
            MessageDirection::Input => self.operation.clone(),
            MessageDirection::Output => format!("{}Response", self.operation),
        }
    }
}

/// Builds the payload schema for one binding message.
#[derive(Debug)]
pub struct PayloadSynthesizer<'a> {
    message: &'a BindingMessage,
    source: Cow<'a, Schema>,
}

impl<'a> PayloadSynthesizer<'a> {
    /// Binds a synthesizer to a message and the service's schema
    /// collection. At most one schema is supported; a message whose body
    /// uses SOAP encoding is rejected up front.
    pub fn new(message: &'a BindingMessage, schemas: &'a [Schema]) -> Result<Self, ExtractError> {
        if schemas.len() > 1 {
            return Err(ExtractError::MultipleSchemas);
        }
        if message.body_use == Use::Encoded {
            return Err(ExtractError::UseEncoded);
        }
        let source = match schemas.first() {
            Some(schema) => Cow::Borrowed(schema),
            // services without a types section still get a payload schema
            None => Cow::Owned(Schema::new(message.operation_namespace.clone())),
        };
        Ok(Self { message, source })
    }

    /// Synthesizes the payload schema document for the bound message.
    pub fn synthesize(&self) -> Result<String, ExtractError> {
        debug!(
            operation = %self.message.operation,
            direction = %self.message.direction,
            style = ?self.message.style,
            "synthesizing payload schema"
        );

        let mut target = Schema::new(self.source.target_namespace.clone());
        target.element_form_default = self.source.element_form_default;
        target.attribute_form_default = self.source.attribute_form_default;
        let mut extractor = SchemaExtractor::new(target, &self.source);
        let mut namespace_targets = Vec::new();

        match self.message.style {
            Style::Rpc => self.build_rpc(&mut extractor, &mut namespace_targets)?,
            Style::Document => self.build_document(&mut extractor, &mut namespace_targets)?,
        }

        self.finish(extractor, &namespace_targets)
    }

    /// RPC style: parts become children of an operation wrapper named in
    /// the operation namespace.
    fn build_rpc(
        &self,
        extractor: &mut SchemaExtractor<'_>,
        namespace_targets: &mut Vec<QName>,
    ) -> Result<(), ExtractError> {
        let wrapper_name = self.message.rpc_wrapper_name();
        namespace_targets.push(QName::new(
            self.message.operation_namespace.clone(),
            &wrapper_name,
        ));

        let body_particle = if self.message.header_parts.is_empty() {
            wrapper_element(extractor.target_mut(), None, &wrapper_name, true)
        } else {
            let envelope = wrapper_element(
                extractor.target_mut(),
                None,
                SOAP_PAYLOAD_ENVELOPE_ELEMENT,
                true,
            );
            let header = wrapper_element(
                extractor.target_mut(),
                Some(envelope),
                SOAP_PAYLOAD_HEADER_ELEMENT,
                false,
            );
            self.append_parts(extractor, namespace_targets, &self.message.header_parts, |ex, id| {
                push_child(ex.target_mut(), header, id);
            })?;
            let body = wrapper_element(
                extractor.target_mut(),
                Some(envelope),
                SOAP_PAYLOAD_BODY_ELEMENT,
                false,
            );
            wrapper_element(extractor.target_mut(), Some(body), &wrapper_name, false)
        };

        self.append_parts(extractor, namespace_targets, &self.message.body_parts, |ex, id| {
            push_child(ex.target_mut(), body_particle, id);
        })
    }

    /// Document style: a single headerless body part passes through as the
    /// payload root; anything else is collected under the envelope wrapper.
    fn build_document(
        &self,
        extractor: &mut SchemaExtractor<'_>,
        namespace_targets: &mut Vec<QName>,
    ) -> Result<(), ExtractError> {
        let bare = self.message.header_parts.is_empty() && self.message.body_parts.len() == 1;
        if bare {
            // single headerless body part: it becomes the payload root itself
            let part = &self.message.body_parts[0];
            self.part_element(extractor, namespace_targets, part, true)?;
            return Ok(());
        }

        let envelope = wrapper_element(
            extractor.target_mut(),
            None,
            SOAP_PAYLOAD_ENVELOPE_ELEMENT,
            true,
        );
        let body_particle = if self.message.header_parts.is_empty() {
            envelope
        } else {
            let header = wrapper_element(
                extractor.target_mut(),
                Some(envelope),
                SOAP_PAYLOAD_HEADER_ELEMENT,
                false,
            );
            self.append_parts(extractor, namespace_targets, &self.message.header_parts, |ex, id| {
                push_child(ex.target_mut(), header, id);
            })?;
            wrapper_element(
                extractor.target_mut(),
                Some(envelope),
                SOAP_PAYLOAD_BODY_ELEMENT,
                false,
            )
        };
        self.append_parts(extractor, namespace_targets, &self.message.body_parts, |ex, id| {
            push_child(ex.target_mut(), body_particle, id);
        })
    }

    /// Seeds extraction for each part and hands the resulting element to
    /// `place`. A part resolves, in priority order, by element reference,
    /// by named schema type, or by built-in/foreign type name.
    fn append_parts(
        &self,
        extractor: &mut SchemaExtractor<'_>,
        namespace_targets: &mut Vec<QName>,
        parts: &[MessagePart],
        mut place: impl FnMut(&mut SchemaExtractor<'_>, NodeId),
    ) -> Result<(), ExtractError> {
        for part in parts {
            let id = self.part_element(extractor, namespace_targets, part, false)?;
            place(extractor, id);
        }
        Ok(())
    }

    fn part_element(
        &self,
        extractor: &mut SchemaExtractor<'_>,
        namespace_targets: &mut Vec<QName>,
        part: &MessagePart,
        top_level: bool,
    ) -> Result<NodeId, ExtractError> {
        if let Some(element_name) = &part.element_name {
            let element = self
                .source
                .element_by_qname(element_name)
                .ok_or_else(|| ExtractError::MissingElement(element_name.clone()))?;
            return extractor.extract_element(element, top_level);
        }

        let type_name = part
            .type_name
            .as_ref()
            .ok_or_else(|| ExtractError::MissingType(part.name.clone()))?;

        // type-referenced parts are named by their concrete name, so the
        // concrete name's namespace is what goes on the wire
        if let Some(source_type) = self.source.type_by_qname(type_name) {
            let id = extractor.extract_type(&part.name.local_part, source_type, top_level)?;
            namespace_targets.push(part.name.clone());
            return Ok(id);
        }
        if type_name.is_xsd() || type_name.namespace_uri != self.source.target_namespace {
            let id = extractor.synthetic_element(&part.name.local_part, type_name.clone(), top_level);
            namespace_targets.push(part.name.clone());
            return Ok(id);
        }
        Err(ExtractError::MissingType(type_name.clone()))
    }

    /// Drains the queue, attaches the namespace markers, and serializes.
    /// Errors are wrapped with the operation and direction for reporting.
    fn finish(
        &self,
        mut extractor: SchemaExtractor<'_>,
        namespace_targets: &[QName],
    ) -> Result<String, ExtractError> {
        let result = extractor.drain().and_then(|_| {
            resolver::resolve_namespace_targets(extractor.target_mut(), namespace_targets);
            extractor.target().to_document_string()
        });
        result.map_err(|source| ExtractError::Synthesis {
            operation: self.message.operation.clone(),
            direction: self.message.direction.to_string(),
            source: Box::new(source),
        })
    }
}

/// Allocates `<element name=...><complexType><sequence/></complexType>` and
/// returns the sequence handle, so parts can be pushed into it. With a
/// parent sequence given, the new element is appended to it.
fn wrapper_element(
    schema: &mut Schema,
    parent: Option<NodeId>,
    name: &str,
    top_level: bool,
) -> NodeId {
    let sequence = schema.alloc(SchemaNode::Particle(ParticleNode {
        kind: ParticleKind::Sequence,
        occurs: Default::default(),
        items: Vec::new(),
    }));
    let complex_type = schema.alloc(SchemaNode::ComplexType(ComplexTypeNode {
        particle: Some(sequence),
        ..ComplexTypeNode::default()
    }));
    let element = schema.alloc(SchemaNode::Element(ElementNode {
        name: Some(name.to_string()),
        top_level,
        type_node: Some(complex_type),
        ..ElementNode::default()
    }));
    if top_level {
        schema.add_root(element);
    }
    if let Some(parent) = parent {
        push_child(schema, parent, element);
    }
    sequence
}

fn push_child(schema: &mut Schema, sequence: NodeId, child: NodeId) {
    if let SchemaNode::Particle(p) = schema.node_mut(sequence) {
        p.items.push(child);
    }
}
