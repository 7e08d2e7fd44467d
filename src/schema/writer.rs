//! Serializes a generated [`Schema`] to its canonical XSD document form.
//!
//! The writer expects a fully extracted target schema: every reference has
//! been inlined and every group flattened. A residual reference or group is
//! reported as a serialization error rather than silently emitted.

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use std::fmt::Display;

use super::Schema;
use super::model::{
    AttributeNode, AttributeUse, ComplexTypeNode, ContentModelNode, ContentVariety, ElementNode,
    Facet, Form, MaxOccurs, NodeId, Occurs, ParticleKind, ParticleNode, SchemaNode,
    SimpleTypeContent, SimpleTypeNode,
};
use super::qname::{QName, XSD_NAMESPACE};
use crate::error::ExtractError;

fn ser_err(e: impl Display) -> ExtractError {
    ExtractError::Serialize(e.to_string())
}

type XmlWriter = Writer<Vec<u8>>;

/// Namespace prefix assignment for the document: `xsd` for the built-in
/// namespace, `tns` for the target namespace, `ns<N>` for anything else
/// referenced by a qualified name in the graph.
struct Prefixes<'a> {
    target_namespace: &'a str,
    foreign: Vec<String>,
}

impl<'a> Prefixes<'a> {
    fn collect(schema: &'a Schema) -> Self {
        let mut foreign: Vec<String> = Vec::new();
        let mut seen = |name: &QName| {
            if !name.is_xsd()
                && !name.namespace_uri.is_empty()
                && name.namespace_uri != schema.target_namespace
                && !foreign.contains(&name.namespace_uri)
            {
                foreign.push(name.namespace_uri.clone());
            }
        };
        for (_, node) in schema.nodes() {
            match node {
                SchemaNode::Element(el) => {
                    if let Some(name) = &el.type_name {
                        seen(name);
                    }
                }
                SchemaNode::Attribute(attr) => {
                    if let Some(name) = &attr.type_name {
                        seen(name);
                    }
                }
                SchemaNode::SimpleType(st) => match &st.content {
                    Some(SimpleTypeContent::Restriction { base_name, .. }) => {
                        if let Some(name) = base_name {
                            seen(name);
                        }
                    }
                    Some(SimpleTypeContent::List { item_name, .. }) => {
                        if let Some(name) = item_name {
                            seen(name);
                        }
                    }
                    Some(SimpleTypeContent::Union { member_names, .. }) => {
                        for name in member_names {
                            seen(name);
                        }
                    }
                    None => {}
                },
                SchemaNode::ContentModel(cm) => {
                    if let Some(name) = &cm.base_name {
                        seen(name);
                    }
                }
                SchemaNode::Reference(r) => seen(&r.ref_name),
                _ => {}
            }
        }
        Self {
            target_namespace: &schema.target_namespace,
            foreign,
        }
    }

    fn qref(&self, name: &QName) -> String {
        if name.is_xsd() {
            return format!("xsd:{}", name.local_part);
        }
        if name.namespace_uri.is_empty() {
            return name.local_part.clone();
        }
        if name.namespace_uri == self.target_namespace {
            return format!("tns:{}", name.local_part);
        }
        match self.foreign.iter().position(|ns| *ns == name.namespace_uri) {
            Some(i) => format!("ns{}:{}", i + 1, name.local_part),
            None => name.local_part.clone(),
        }
    }
}

pub(super) fn write_document(schema: &Schema) -> Result<String, ExtractError> {
    let prefixes = Prefixes::collect(schema);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut root = BytesStart::new("xsd:schema");
    root.push_attribute(("xmlns:xsd", XSD_NAMESPACE));
    if !schema.target_namespace.is_empty() {
        root.push_attribute(("targetNamespace", schema.target_namespace.as_str()));
        root.push_attribute(("xmlns:tns", schema.target_namespace.as_str()));
    }
    for (i, ns) in prefixes.foreign.iter().enumerate() {
        root.push_attribute((format!("xmlns:ns{}", i + 1).as_str(), ns.as_str()));
    }
    if schema.element_form_default == Form::Qualified {
        root.push_attribute(("elementFormDefault", "qualified"));
    }
    if schema.attribute_form_default == Form::Qualified {
        root.push_attribute(("attributeFormDefault", "qualified"));
    }
    writer.write_event(Event::Start(root)).map_err(ser_err)?;

    for &id in schema.roots() {
        write_node(schema, &prefixes, &mut writer, id)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("xsd:schema")))
        .map_err(ser_err)?;
    String::from_utf8(writer.into_inner()).map_err(ser_err)
}

fn write_node(
    schema: &Schema,
    prefixes: &Prefixes<'_>,
    writer: &mut XmlWriter,
    id: NodeId,
) -> Result<(), ExtractError> {
    match schema.node(id) {
        SchemaNode::Element(el) => write_element(schema, prefixes, writer, el),
        SchemaNode::Attribute(attr) => write_attribute(schema, prefixes, writer, attr),
        SchemaNode::SimpleType(st) => write_simple_type(schema, prefixes, writer, st),
        SchemaNode::ComplexType(ct) => write_complex_type(schema, prefixes, writer, ct),
        SchemaNode::Particle(p) => write_particle(schema, prefixes, writer, p),
        SchemaNode::ContentModel(cm) => write_content_model(schema, prefixes, writer, cm),
        SchemaNode::Any(any) => {
            let mut start = BytesStart::new("xsd:any");
            push_occurs(&mut start, &any.occurs);
            if let Some(ns) = &any.namespace {
                start.push_attribute(("namespace", ns.as_str()));
            }
            if let Some(pc) = &any.process_contents {
                start.push_attribute(("processContents", pc.as_str()));
            }
            writer.write_event(Event::Empty(start)).map_err(ser_err)
        }
        other @ (SchemaNode::Group(_)
        | SchemaNode::AttributeGroup(_)
        | SchemaNode::Reference(_)) => Err(ExtractError::Serialize(format!(
            "unresolved {} node in generated schema",
            other.kind_name()
        ))),
    }
}

fn write_element(
    schema: &Schema,
    prefixes: &Prefixes<'_>,
    writer: &mut XmlWriter,
    el: &ElementNode,
) -> Result<(), ExtractError> {
    let mut start = BytesStart::new("xsd:element");
    if let Some(name) = &el.name {
        start.push_attribute(("name", name.as_str()));
    }
    if let Some(type_name) = &el.type_name {
        start.push_attribute(("type", prefixes.qref(type_name).as_str()));
    }
    // occurs constraints are meaningless on a schema root element
    if !el.top_level {
        push_occurs(&mut start, &el.occurs);
        if el.form == Form::Qualified && schema.element_form_default == Form::Unqualified {
            start.push_attribute(("form", "qualified"));
        }
    }
    if el.nillable {
        start.push_attribute(("nillable", "true"));
    }
    if let Some(value) = &el.default_value {
        start.push_attribute(("default", value.as_str()));
    }
    if let Some(value) = &el.fixed_value {
        start.push_attribute(("fixed", value.as_str()));
    }
    match el.type_node {
        None => writer.write_event(Event::Empty(start)).map_err(ser_err),
        Some(type_node) => {
            writer.write_event(Event::Start(start)).map_err(ser_err)?;
            write_node(schema, prefixes, writer, type_node)?;
            writer
                .write_event(Event::End(BytesEnd::new("xsd:element")))
                .map_err(ser_err)
        }
    }
}

fn write_attribute(
    schema: &Schema,
    prefixes: &Prefixes<'_>,
    writer: &mut XmlWriter,
    attr: &AttributeNode,
) -> Result<(), ExtractError> {
    let mut start = BytesStart::new("xsd:attribute");
    if let Some(name) = &attr.name {
        start.push_attribute(("name", name.as_str()));
    }
    if let Some(type_name) = &attr.type_name {
        start.push_attribute(("type", prefixes.qref(type_name).as_str()));
    }
    match attr.usage {
        AttributeUse::Optional => {}
        AttributeUse::Required => start.push_attribute(("use", "required")),
        AttributeUse::Prohibited => start.push_attribute(("use", "prohibited")),
    }
    if let Some(value) = &attr.default_value {
        start.push_attribute(("default", value.as_str()));
    }
    if let Some(value) = &attr.fixed_value {
        start.push_attribute(("fixed", value.as_str()));
    }
    match attr.type_node {
        None => writer.write_event(Event::Empty(start)).map_err(ser_err),
        Some(type_node) => {
            writer.write_event(Event::Start(start)).map_err(ser_err)?;
            write_node(schema, prefixes, writer, type_node)?;
            writer
                .write_event(Event::End(BytesEnd::new("xsd:attribute")))
                .map_err(ser_err)
        }
    }
}

fn write_simple_type(
    schema: &Schema,
    prefixes: &Prefixes<'_>,
    writer: &mut XmlWriter,
    st: &SimpleTypeNode,
) -> Result<(), ExtractError> {
    let mut start = BytesStart::new("xsd:simpleType");
    if let Some(name) = &st.name {
        start.push_attribute(("name", name.as_str()));
    }
    let Some(content) = &st.content else {
        return writer.write_event(Event::Empty(start)).map_err(ser_err);
    };
    writer.write_event(Event::Start(start)).map_err(ser_err)?;
    match content {
        SimpleTypeContent::Restriction {
            base_name,
            base,
            facets,
        } => {
            let mut restriction = BytesStart::new("xsd:restriction");
            if let Some(base_name) = base_name {
                restriction.push_attribute(("base", prefixes.qref(base_name).as_str()));
            }
            if base.is_none() && facets.is_empty() {
                writer
                    .write_event(Event::Empty(restriction))
                    .map_err(ser_err)?;
            } else {
                writer
                    .write_event(Event::Start(restriction))
                    .map_err(ser_err)?;
                if let Some(base) = base {
                    write_node(schema, prefixes, writer, *base)?;
                }
                write_facets(writer, facets)?;
                writer
                    .write_event(Event::End(BytesEnd::new("xsd:restriction")))
                    .map_err(ser_err)?;
            }
        }
        SimpleTypeContent::List { item_name, item } => {
            let mut list = BytesStart::new("xsd:list");
            if let Some(item_name) = item_name {
                list.push_attribute(("itemType", prefixes.qref(item_name).as_str()));
            }
            match item {
                None => writer.write_event(Event::Empty(list)).map_err(ser_err)?,
                Some(item) => {
                    writer.write_event(Event::Start(list)).map_err(ser_err)?;
                    write_node(schema, prefixes, writer, *item)?;
                    writer
                        .write_event(Event::End(BytesEnd::new("xsd:list")))
                        .map_err(ser_err)?;
                }
            }
        }
        SimpleTypeContent::Union {
            member_names,
            members,
        } => {
            let mut union = BytesStart::new("xsd:union");
            if !member_names.is_empty() {
                let joined = member_names
                    .iter()
                    .map(|name| prefixes.qref(name))
                    .collect::<Vec<_>>()
                    .join(" ");
                union.push_attribute(("memberTypes", joined.as_str()));
            }
            if members.is_empty() {
                writer.write_event(Event::Empty(union)).map_err(ser_err)?;
            } else {
                writer.write_event(Event::Start(union)).map_err(ser_err)?;
                for &member in members {
                    write_node(schema, prefixes, writer, member)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new("xsd:union")))
                    .map_err(ser_err)?;
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new("xsd:simpleType")))
        .map_err(ser_err)
}

fn write_complex_type(
    schema: &Schema,
    prefixes: &Prefixes<'_>,
    writer: &mut XmlWriter,
    ct: &ComplexTypeNode,
) -> Result<(), ExtractError> {
    let mut start = BytesStart::new("xsd:complexType");
    if let Some(name) = &ct.name {
        start.push_attribute(("name", name.as_str()));
    }
    if ct.mixed {
        start.push_attribute(("mixed", "true"));
    }
    if ct.is_abstract {
        start.push_attribute(("abstract", "true"));
    }
    if ct.content_model.is_none() && ct.particle.is_none() && ct.attributes.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(ser_err);
    }
    writer.write_event(Event::Start(start)).map_err(ser_err)?;
    if let Some(cm) = ct.content_model {
        write_node(schema, prefixes, writer, cm)?;
    } else if let Some(particle) = ct.particle {
        write_node(schema, prefixes, writer, particle)?;
    }
    for &attr in &ct.attributes {
        write_node(schema, prefixes, writer, attr)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("xsd:complexType")))
        .map_err(ser_err)
}

fn write_particle(
    schema: &Schema,
    prefixes: &Prefixes<'_>,
    writer: &mut XmlWriter,
    particle: &ParticleNode,
) -> Result<(), ExtractError> {
    let tag = match particle.kind {
        ParticleKind::Sequence => "xsd:sequence",
        ParticleKind::Choice => "xsd:choice",
        ParticleKind::All => "xsd:all",
    };
    let mut start = BytesStart::new(tag);
    push_occurs(&mut start, &particle.occurs);
    if particle.items.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(ser_err);
    }
    writer.write_event(Event::Start(start)).map_err(ser_err)?;
    for &item in &particle.items {
        write_node(schema, prefixes, writer, item)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(ser_err)
}

fn write_content_model(
    schema: &Schema,
    prefixes: &Prefixes<'_>,
    writer: &mut XmlWriter,
    cm: &ContentModelNode,
) -> Result<(), ExtractError> {
    // extraction can merge a named base away entirely; the derivation then
    // collapses into plain complex type content
    if cm.variety == ContentVariety::ComplexExtension && cm.base_name.is_none() && cm.base.is_none()
    {
        if let Some(particle) = cm.particle {
            write_node(schema, prefixes, writer, particle)?;
        }
        for &attr in &cm.attributes {
            write_node(schema, prefixes, writer, attr)?;
        }
        return Ok(());
    }

    let outer = match cm.variety {
        ContentVariety::SimpleExtension | ContentVariety::SimpleRestriction => "xsd:simpleContent",
        ContentVariety::ComplexExtension | ContentVariety::ComplexRestriction => {
            "xsd:complexContent"
        }
    };
    let inner = match cm.variety {
        ContentVariety::SimpleExtension | ContentVariety::ComplexExtension => "xsd:extension",
        ContentVariety::SimpleRestriction | ContentVariety::ComplexRestriction => "xsd:restriction",
    };
    writer
        .write_event(Event::Start(BytesStart::new(outer)))
        .map_err(ser_err)?;

    let mut start = BytesStart::new(inner);
    if let Some(base_name) = &cm.base_name {
        start.push_attribute(("base", prefixes.qref(base_name).as_str()));
    }
    let empty =
        cm.base.is_none() && cm.particle.is_none() && cm.facets.is_empty() && cm.attributes.is_empty();
    if empty {
        writer.write_event(Event::Empty(start)).map_err(ser_err)?;
    } else {
        writer.write_event(Event::Start(start)).map_err(ser_err)?;
        if let Some(base) = cm.base {
            write_node(schema, prefixes, writer, base)?;
        }
        if let Some(particle) = cm.particle {
            write_node(schema, prefixes, writer, particle)?;
        }
        write_facets(writer, &cm.facets)?;
        for &attr in &cm.attributes {
            write_node(schema, prefixes, writer, attr)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(inner)))
            .map_err(ser_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(outer)))
        .map_err(ser_err)
}

fn write_facets(writer: &mut XmlWriter, facets: &[Facet]) -> Result<(), ExtractError> {
    for facet in facets {
        let mut start = BytesStart::new(format!("xsd:{}", facet.name));
        start.push_attribute(("value", facet.value.as_str()));
        writer.write_event(Event::Empty(start)).map_err(ser_err)?;
    }
    Ok(())
}

fn push_occurs(start: &mut BytesStart<'_>, occurs: &Occurs) {
    if occurs.min != 1 {
        start.push_attribute(("minOccurs", occurs.min.to_string().as_str()));
    }
    match occurs.max {
        MaxOccurs::Bounded(1) => {}
        MaxOccurs::Bounded(n) => start.push_attribute(("maxOccurs", n.to_string().as_str())),
        MaxOccurs::Unbounded => start.push_attribute(("maxOccurs", "unbounded")),
    }
}
