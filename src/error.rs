use crate::schema::QName;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while extracting schema types or synthesizing a payload
/// schema. Every variant carries enough context to pinpoint the offending
/// WSDL construct; none of them are retryable.
#[derive(Error, Debug, Clone)]
pub enum ExtractError {
    #[error("WSDLs with multiple schemas are not supported")]
    MultipleSchemas,

    #[error("messages with use='encoded' are not supported")]
    UseEncoded,

    #[error("missing type in source schema: {0}")]
    MissingType(QName),

    #[error("missing element in source schema: {0}")]
    MissingElement(QName),

    #[error("missing ref target in source schema: {0}")]
    MissingRefTarget(QName),

    #[error("missing group in source schema: {0}")]
    MissingGroup(QName),

    #[error("circular reference in schema types {chain}, {name}")]
    CircularReference { chain: String, name: QName },

    #[error("unsupported particle kind: {kind}")]
    UnsupportedParticle { kind: String },

    #[error("unsupported extension of type {0}")]
    UnsupportedExtensionBase(QName),

    #[error("cannot construct a copy of {kind} node")]
    NodeConstruction { kind: String },

    #[error("failed to serialize schema document: {0}")]
    Serialize(String),

    #[error("error synthesizing {direction} message for operation {operation}: {source}")]
    Synthesis {
        operation: String,
        direction: String,
        #[source]
        source: Box<ExtractError>,
    },
}

impl ExtractError {
    /// Stable tag identifying the error category, preserved through
    /// [`ExtractError::Synthesis`] wrapping.
    pub fn error_class(&self) -> &'static str {
        match self {
            ExtractError::MultipleSchemas => "multiple-schemas-unsupported",
            ExtractError::UseEncoded => "use-encoded-unsupported",
            ExtractError::MissingType(_) => "missing-type",
            ExtractError::MissingElement(_) => "missing-element",
            ExtractError::MissingRefTarget(_) => "missing-ref-target",
            ExtractError::MissingGroup(_) => "missing-group",
            ExtractError::CircularReference { .. } => "circular-reference",
            ExtractError::UnsupportedParticle { .. } => "unsupported-particle",
            ExtractError::UnsupportedExtensionBase(_) => "unsupported-extension-base",
            ExtractError::NodeConstruction { .. } => "node-construction",
            ExtractError::Serialize(_) => "serialization",
            ExtractError::Synthesis { source, .. } => source.error_class(),
        }
    }

    /// Name of the offending schema property, when one can be named.
    pub fn property(&self) -> Option<String> {
        match self {
            ExtractError::MissingType(name)
            | ExtractError::MissingElement(name)
            | ExtractError::MissingRefTarget(name)
            | ExtractError::MissingGroup(name)
            | ExtractError::UnsupportedExtensionBase(name) => Some(name.to_string()),
            ExtractError::CircularReference { name, .. } => Some(name.to_string()),
            ExtractError::Synthesis { source, .. } => source.property(),
            _ => None,
        }
    }

    /// Converts the error into the user-facing validation entry presented
    /// by the connector catalog instead of a raw error chain.
    pub fn to_violation(&self) -> Violation {
        Violation {
            message: self.to_string(),
            property: self.property(),
            error: self.error_class().to_string(),
        }
    }
}

/// User-visible validation entry derived from an [`ExtractError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    pub error: String,
}
