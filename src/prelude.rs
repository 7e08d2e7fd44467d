//! Convenience re-exports for the common use of the crate.

pub use crate::context::ServiceContext;
pub use crate::error::{ExtractError, Violation};
pub use crate::extractor::SchemaExtractor;
pub use crate::schema::{
    AnyNode, AttributeGroupNode, AttributeNode, AttributeUse, ComplexTypeNode, ContentModelNode,
    ContentVariety, ElementNode, Facet, Form, GroupNode, MaxOccurs, NodeId, Occurs, ParticleKind,
    ParticleNode, QName, RefKind, ReferenceNode, Schema, SchemaNode, SimpleTypeContent,
    SimpleTypeNode, XSD_NAMESPACE,
};
pub use crate::synth::{
    BindingMessage, MessageDirection, MessagePart, PayloadSynthesizer, Style, Use,
};
