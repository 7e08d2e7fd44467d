//! Request-scoped service context.
//!
//! A [`ServiceContext`] holds the schema collection parsed from one WSDL's
//! types section and hands out payload synthesizers for its binding
//! messages. Each synthesis works against the context it was created from;
//! nothing is shared through globals or thread-locals.

use crate::error::ExtractError;
use crate::schema::Schema;
use crate::synth::{BindingMessage, PayloadSynthesizer};

/// The schemas of one parsed service description.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    schemas: Vec<Schema>,
}

impl ServiceContext {
    /// Wraps the schema collection of a service. Fails if the WSDL carried
    /// more than one schema, which the extraction engine does not support.
    pub fn new(schemas: Vec<Schema>) -> Result<Self, ExtractError> {
        if schemas.len() > 1 {
            return Err(ExtractError::MultipleSchemas);
        }
        Ok(Self { schemas })
    }

    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    /// A synthesizer bound to this context's schemas.
    pub fn synthesizer_for<'a>(
        &'a self,
        message: &'a BindingMessage,
    ) -> Result<PayloadSynthesizer<'a>, ExtractError> {
        PayloadSynthesizer::new(message, &self.schemas)
    }

    /// Synthesizes the payload schema document for one binding message.
    pub fn payload_schema(&self, message: &BindingMessage) -> Result<String, ExtractError> {
        self.synthesizer_for(message)?.synthesize()
    }
}
