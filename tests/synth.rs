//! Tests for SOAP payload synthesis: binding styles, wrappers, and
//! namespace markers.
mod common;
use common::*;
use soapgen::prelude::*;
use soapgen::synth::{
    SOAP_PAYLOAD_BODY_ELEMENT, SOAP_PAYLOAD_ENVELOPE_ELEMENT, SOAP_PAYLOAD_HEADER_ELEMENT,
};

fn stock_schema() -> Schema {
    let mut schema = new_schema();
    add_complex_type(
        &mut schema,
        "QuoteType",
        &[
            ("symbol", QName::xsd("string")),
            ("price", QName::xsd("decimal")),
        ],
    );
    add_element_of_type(&mut schema, "quote", qn("QuoteType"));
    schema
}

#[test]
fn test_rpc_input_wraps_parts_in_operation_element() {
    let message = rpc_message(
        "GetQuote",
        MessageDirection::Input,
        vec![
            type_part("symbol", QName::xsd("string")),
            type_part("detail", QName::xsd("boolean")),
        ],
        vec![],
    );
    let document = PayloadSynthesizer::new(&message, &[]).unwrap().synthesize().unwrap();

    assert!(document.contains(r#"<xsd:element name="GetQuote">"#));
    // parts keep their declaration order
    let symbol = document.find(r#"name="symbol""#).unwrap();
    let detail = document.find(r#"name="detail""#).unwrap();
    assert!(symbol < detail);
    assert!(!document.contains(SOAP_PAYLOAD_ENVELOPE_ELEMENT));
}

#[test]
fn test_rpc_output_wrapper_gets_response_suffix() {
    let message = rpc_message(
        "GetQuote",
        MessageDirection::Output,
        vec![type_part("result", QName::xsd("decimal"))],
        vec![],
    );
    let document = PayloadSynthesizer::new(&message, &[]).unwrap().synthesize().unwrap();
    assert!(document.contains(r#"<xsd:element name="GetQuoteResponse">"#));
}

#[test]
fn test_rpc_wrapper_carries_namespace_marker() {
    let message = rpc_message("GetQuote", MessageDirection::Input, vec![], vec![]);
    let document = PayloadSynthesizer::new(&message, &[]).unwrap().synthesize().unwrap();

    assert!(document.contains(r#"name="soap-payload-namespace""#));
    assert!(document.contains(r#"type="xsd:anyURI""#));
    assert!(document.contains(&format!(r#"fixed="{NS}""#)));
}

#[test]
fn test_rpc_with_headers_builds_envelope() {
    let schema = stock_schema();
    let message = rpc_message(
        "GetQuote",
        MessageDirection::Input,
        vec![type_part("symbol", QName::xsd("string"))],
        vec![element_part("session", "quote")],
    );
    let document = PayloadSynthesizer::new(&message, std::slice::from_ref(&schema))
        .unwrap()
        .synthesize()
        .unwrap();

    assert!(document.contains(&format!(r#"<xsd:element name="{SOAP_PAYLOAD_ENVELOPE_ELEMENT}">"#)));
    assert!(document.contains(&format!(r#"<xsd:element name="{SOAP_PAYLOAD_HEADER_ELEMENT}">"#)));
    assert!(document.contains(&format!(r#"<xsd:element name="{SOAP_PAYLOAD_BODY_ELEMENT}">"#)));
    // the header part comes before the body wrapper
    let header = document.find(SOAP_PAYLOAD_HEADER_ELEMENT).unwrap();
    let body = document.find(SOAP_PAYLOAD_BODY_ELEMENT).unwrap();
    assert!(header < body);
    assert!(document.contains(r#"name="GetQuote""#));
}

#[test]
fn test_document_single_part_passes_through() {
    let schema = stock_schema();
    let message = document_message(vec![element_part("body", "quote")]);
    let document = PayloadSynthesizer::new(&message, std::slice::from_ref(&schema))
        .unwrap()
        .synthesize()
        .unwrap();

    assert!(document.contains(r#"<xsd:element name="quote">"#));
    assert!(document.contains(r#"name="symbol""#));
    assert!(!document.contains(SOAP_PAYLOAD_ENVELOPE_ELEMENT));
    assert!(!document.contains("QuoteType"));
}

#[test]
fn test_document_multiple_parts_are_collected_under_envelope() {
    let schema = stock_schema();
    let message = document_message(vec![
        element_part("first", "quote"),
        type_part("second", QName::xsd("string")),
    ]);
    let document = PayloadSynthesizer::new(&message, std::slice::from_ref(&schema))
        .unwrap()
        .synthesize()
        .unwrap();

    assert!(document.contains(&format!(r#"<xsd:element name="{SOAP_PAYLOAD_ENVELOPE_ELEMENT}">"#)));
    // no headers, so parts go straight under the envelope
    assert!(!document.contains(SOAP_PAYLOAD_HEADER_ELEMENT));
    assert!(!document.contains(SOAP_PAYLOAD_BODY_ELEMENT));
    assert!(document.contains(r#"name="quote""#));
    assert!(document.contains(r#"name="second""#));
}

#[test]
fn test_document_with_headers_builds_envelope() {
    let schema = stock_schema();
    let mut message = document_message(vec![element_part("body", "quote")]);
    message.header_parts = vec![type_part("session", QName::xsd("string"))];
    let document = PayloadSynthesizer::new(&message, std::slice::from_ref(&schema))
        .unwrap()
        .synthesize()
        .unwrap();

    assert!(document.contains(&format!(r#"<xsd:element name="{SOAP_PAYLOAD_ENVELOPE_ELEMENT}">"#)));
    assert!(document.contains(&format!(r#"<xsd:element name="{SOAP_PAYLOAD_HEADER_ELEMENT}">"#)));
    assert!(document.contains(&format!(r#"<xsd:element name="{SOAP_PAYLOAD_BODY_ELEMENT}">"#)));
    assert!(document.contains(r#"name="session""#));
    assert!(document.contains(r#"name="quote""#));
}

#[test]
fn test_encoded_use_is_rejected() {
    let mut message = document_message(vec![]);
    message.body_use = Use::Encoded;
    let err = PayloadSynthesizer::new(&message, &[]).unwrap_err();
    assert_eq!(err.error_class(), "use-encoded-unsupported");
}

#[test]
fn test_multiple_schemas_are_rejected() {
    let schemas = vec![new_schema(), Schema::new("http://example.com/other")];
    let message = document_message(vec![]);
    assert_eq!(
        PayloadSynthesizer::new(&message, &schemas).unwrap_err().error_class(),
        "multiple-schemas-unsupported"
    );
    assert_eq!(
        ServiceContext::new(schemas).unwrap_err().error_class(),
        "multiple-schemas-unsupported"
    );
}

#[test]
fn test_service_without_schema_still_synthesizes() {
    let context = ServiceContext::new(vec![]).unwrap();
    let message = rpc_message(
        "Ping",
        MessageDirection::Input,
        vec![type_part("token", QName::xsd("string"))],
        vec![],
    );
    let document = context.payload_schema(&message).unwrap();
    assert!(document.contains(r#"<xsd:element name="Ping">"#));
    assert!(document.contains(r#"name="token""#));
}

#[test]
fn test_part_with_schema_type_is_marked_with_its_namespace() {
    let schema = stock_schema();
    let message = document_message(vec![type_part("payload", qn("QuoteType"))]);
    let document = PayloadSynthesizer::new(&message, std::slice::from_ref(&schema))
        .unwrap()
        .synthesize()
        .unwrap();

    // the part element is named after the part, typed by the copied type
    assert!(document.contains(r#"<xsd:element name="payload">"#));
    assert!(document.contains(r#"name="soap-payload-namespace""#));
    assert!(document.contains(&format!(r#"fixed="{NS}""#)));
}

#[test]
fn test_simple_type_part_is_wrapped_for_marking() {
    let mut schema = new_schema();
    let sku_type = schema.alloc(SchemaNode::SimpleType(SimpleTypeNode {
        name: Some("SkuType".to_string()),
        content: Some(SimpleTypeContent::Restriction {
            base_name: Some(QName::xsd("string")),
            base: None,
            facets: vec![],
        }),
        ..SimpleTypeNode::default()
    }));
    schema.add_root(sku_type);

    let message = document_message(vec![type_part("sku", qn("SkuType"))]);
    let document = PayloadSynthesizer::new(&message, std::slice::from_ref(&schema))
        .unwrap()
        .synthesize()
        .unwrap();

    // simple types cannot carry attributes; the value moves to a child element
    assert!(document.contains(r#"<xsd:element name="sku-xml-simpletype-value">"#));
    assert!(document.contains(r#"name="soap-payload-namespace""#));
}

#[test]
fn test_builtin_type_part_is_extended_for_marking() {
    let message = document_message(vec![type_part("token", QName::xsd("string"))]);
    let document = PayloadSynthesizer::new(&message, &[]).unwrap().synthesize().unwrap();

    assert!(document.contains(r#"<xsd:element name="token">"#));
    assert!(document.contains(r#"<xsd:extension base="xsd:string">"#));
    // the marker carries the part's namespace, not the built-in type's
    assert!(document.contains(&format!(r#"fixed="{NS}""#)));
    assert!(!document.contains(&format!(r#"fixed="{XSD_NAMESPACE}""#)));
}

#[test]
fn test_marker_uses_part_namespace_over_type_namespace() {
    let custom = "http://example.com/custom";
    let message = document_message(vec![MessagePart {
        name: QName::new(custom, "token"),
        element_name: None,
        type_name: Some(QName::xsd("string")),
    }]);
    let document = PayloadSynthesizer::new(&message, &[]).unwrap().synthesize().unwrap();

    assert!(document.contains(r#"<xsd:element name="token">"#));
    assert!(document.contains(&format!(r#"fixed="{custom}""#)));
    assert!(!document.contains(&format!(r#"fixed="{XSD_NAMESPACE}""#)));
}

#[test]
fn test_missing_part_element_is_reported() {
    let message = document_message(vec![element_part("body", "nonexistent")]);
    let err = PayloadSynthesizer::new(&message, &[]).unwrap().synthesize().unwrap_err();
    assert_eq!(err.error_class(), "missing-element");
}

#[test]
fn test_extraction_errors_carry_operation_context() {
    let mut schema = new_schema();
    add_complex_type(&mut schema, "LoopType", &[("next", qn("LoopType"))]);
    add_element_of_type(&mut schema, "loop", qn("LoopType"));

    let message = document_message(vec![element_part("body", "loop")]);
    let err = PayloadSynthesizer::new(&message, std::slice::from_ref(&schema))
        .unwrap()
        .synthesize()
        .unwrap_err();

    assert_eq!(err.error_class(), "circular-reference");
    let text = err.to_string();
    assert!(text.contains("Lookup"));
    assert!(text.contains("input"));
    assert!(text.contains("LoopType"));
}
