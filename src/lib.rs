//! Payload schema synthesis for SOAP web services.
//!
//! Given the schemas of a parsed WSDL and the binding view of one
//! operation message, this crate builds a single, self-contained XML
//! schema document describing the message payload: all type and element
//! references inlined, RPC wrappers and SOAP header/body wrappers
//! materialized as plain elements, and the real on-the-wire namespaces
//! recorded as fixed marker attributes.
//!
//! The pipeline has three stages. The [`extractor`] copies the reachable
//! subgraph of the source schema into a fresh target schema, resolving
//! `ref`s, inlining named types, and flattening groups as it goes. The
//! [`synth`] module arranges message parts under the wrappers the binding
//! style calls for and marks namespace targets. The [`schema`] module
//! holds the graph model both stages operate on and serializes the result.
//!
//! ```
//! use soapgen::prelude::*;
//!
//! let message = BindingMessage {
//!     operation: "GetQuote".to_string(),
//!     operation_namespace: "http://example.com/stocks".to_string(),
//!     direction: MessageDirection::Input,
//!     style: Style::Rpc,
//!     body_use: Use::Literal,
//!     body_parts: vec![MessagePart {
//!         name: QName::new("http://example.com/stocks", "symbol"),
//!         element_name: None,
//!         type_name: Some(QName::xsd("string")),
//!     }],
//!     header_parts: vec![],
//! };
//!
//! let context = ServiceContext::new(vec![])?;
//! let document = context.payload_schema(&message)?;
//! assert!(document.contains("GetQuote"));
//! # Ok::<(), ExtractError>(())
//! ```

pub mod context;
pub mod error;
pub mod extractor;
pub mod prelude;
pub mod schema;
pub mod synth;

pub use context::ServiceContext;
pub use error::{ExtractError, Violation};
pub use schema::{QName, Schema};
