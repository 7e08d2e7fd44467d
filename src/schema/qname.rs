use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace URI of the built-in XML Schema types (`xsd:string`, `xsd:int`, ...).
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// A qualified XML name: a namespace URI paired with a local part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    pub namespace_uri: String,
    pub local_part: String,
}

impl QName {
    pub fn new(namespace_uri: impl Into<String>, local_part: impl Into<String>) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            local_part: local_part.into(),
        }
    }

    /// A name in the built-in XSD namespace, e.g. `QName::xsd("string")`.
    pub fn xsd(local_part: impl Into<String>) -> Self {
        Self::new(XSD_NAMESPACE, local_part)
    }

    /// True iff this name refers to a built-in XML Schema type.
    /// Built-in types are never copied during extraction; they are
    /// referenced by name only.
    pub fn is_xsd(&self) -> bool {
        self.namespace_uri == XSD_NAMESPACE
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_uri.is_empty() {
            write!(f, "{}", self.local_part)
        } else {
            write!(f, "{{{}}}{}", self.namespace_uri, self.local_part)
        }
    }
}
