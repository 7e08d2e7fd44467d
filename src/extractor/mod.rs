//! The schema extraction engine.
//!
//! [`SchemaExtractor`] copies elements and types from a read-only source
//! schema into a freshly built target schema, inlining every reference on
//! the way: `ref` attributes are resolved to copies of their targets, named
//! types become anonymous inline types, model groups and attribute groups
//! are flattened into their use sites, and substitution-group heads replace
//! the elements that declare them. The result is a self-contained subgraph
//! with no residual references and no named nested types.
//!
//! Extraction is two-phase. The `extract_*` seed methods allocate a
//! placeholder node in the target schema and return its handle immediately;
//! the body is filled in when [`SchemaExtractor::drain`] processes the work
//! queue. Work items are handled strictly in FIFO order, which keeps the
//! expansion breadth-oriented and the output stable across runs. Each work
//! item remembers the named top-level ancestors on its path, so a type that
//! transitively references itself is rejected instead of expanding forever.

use std::collections::VecDeque;

use itertools::Itertools;
use tracing::trace;

use crate::error::ExtractError;
use crate::schema::{
    AttributeNode, ComplexTypeNode, ContentModelNode, ContentVariety, ElementNode, NodeId,
    ParticleNode, QName, RefKind, ReferenceNode, Schema, SchemaNode, SimpleTypeContent,
    SimpleTypeNode,
};

/// A pending copy obligation: fill `target` from `source`. `path` holds the
/// named top-level source ancestors already being copied on this branch.
struct WorkItem {
    target: NodeId,
    source: NodeId,
    path: Vec<NodeId>,
}

/// Outcome of resolving a `type`/`base`/`itemType` name against the source
/// schema: a built-in kept by name, an inlined copy, or nothing.
enum ResolvedType {
    Builtin(QName),
    Inline(NodeId),
    None,
}

/// Copies subgraphs from a source schema into a target schema, inlining all
/// references. One extractor serves one extraction; the work queue and the
/// ancestor path are not reusable across target schemas.
pub struct SchemaExtractor<'s> {
    source: &'s Schema,
    target: Schema,
    queue: VecDeque<WorkItem>,
    current_path: Vec<NodeId>,
}

impl<'s> SchemaExtractor<'s> {
    pub fn new(target: Schema, source: &'s Schema) -> Self {
        Self {
            source,
            target,
            queue: VecDeque::new(),
            current_path: Vec::new(),
        }
    }

    /// The source schema reference, with its full lifetime. Field reads
    /// through `self` would otherwise tie the borrow to `&self`.
    fn src(&self) -> &'s Schema {
        self.source
    }

    pub fn target(&self) -> &Schema {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut Schema {
        &mut self.target
    }

    /// Consumes the extractor, yielding the built target schema.
    pub fn into_target(self) -> Schema {
        self.target
    }

    /// Seeds a copy of a source element. The returned target element keeps
    /// the source element's name; its body is filled during [`drain`].
    ///
    /// [`drain`]: SchemaExtractor::drain
    pub fn extract_element(
        &mut self,
        element: NodeId,
        top_level: bool,
    ) -> Result<NodeId, ExtractError> {
        let name = match self.src().node(element) {
            SchemaNode::Element(el) => el.name.clone(),
            other => {
                return Err(ExtractError::NodeConstruction {
                    kind: other.kind_name().to_string(),
                });
            }
        };
        let id = self.target.alloc(SchemaNode::Element(ElementNode {
            name,
            top_level,
            ..ElementNode::default()
        }));
        if top_level {
            self.target.add_root(id);
        }
        self.stage_copy(id, element)?;
        Ok(id)
    }

    /// Seeds a synthetic element named `name` whose type is a copy of the
    /// given named source type. Built-in types never reach this method;
    /// they are referenced by name via [`synthetic_element`].
    ///
    /// [`synthetic_element`]: SchemaExtractor::synthetic_element
    pub fn extract_type(
        &mut self,
        name: &str,
        source_type: NodeId,
        top_level: bool,
    ) -> Result<NodeId, ExtractError> {
        let id = self.target.alloc(SchemaNode::Element(ElementNode {
            name: Some(name.to_string()),
            top_level,
            ..ElementNode::default()
        }));
        if top_level {
            self.target.add_root(id);
        }
        let type_copy = self.clone_shell(source_type)?;
        if let SchemaNode::Element(el) = self.target.node_mut(id) {
            el.type_node = Some(type_copy);
        }
        Ok(id)
    }

    /// Builds an element referencing a type by name only, with no copy.
    /// Used for parts typed directly by a built-in or foreign type.
    pub fn synthetic_element(&mut self, name: &str, type_name: QName, top_level: bool) -> NodeId {
        let id = self.target.alloc(SchemaNode::Element(ElementNode {
            name: Some(name.to_string()),
            top_level,
            type_name: Some(type_name),
            ..ElementNode::default()
        }));
        if top_level {
            self.target.add_root(id);
        }
        id
    }

    /// Processes the work queue until it is empty or a copy fails. After a
    /// successful drain the target schema contains no references and no
    /// named nested types.
    pub fn drain(&mut self) -> Result<(), ExtractError> {
        while let Some(item) = self.queue.pop_front() {
            self.current_path = item.path;
            trace!(
                source = self.src().node(item.source).kind_name(),
                depth = self.current_path.len(),
                "copying node"
            );
            self.copy_item(item.target, item.source)?;
        }
        Ok(())
    }

    // -- staging ----------------------------------------------------------

    /// Copies the source node's scalar fields onto the target, rejects
    /// named ancestors reappearing on the current path, and enqueues the
    /// pair for structural copying.
    fn stage_copy(&mut self, target: NodeId, source: NodeId) -> Result<(), ExtractError> {
        self.copy_scalars(target, source)?;

        if self.current_path.contains(&source) {
            let chain = self
                .current_path
                .iter()
                .filter_map(|&id| self.src().qname_of(id))
                .map(|q| q.to_string())
                .join(", ");
            let name = self
                .src()
                .qname_of(source)
                .unwrap_or_else(|| QName::new(self.src().target_namespace.clone(), "<anonymous>"));
            return Err(ExtractError::CircularReference { chain, name });
        }

        let mut path = self.current_path.clone();
        if self.src().node(source).is_named_root() {
            path.push(source);
        }
        self.queue.push_back(WorkItem {
            target,
            source,
            path,
        });
        Ok(())
    }

    /// Allocates an anonymous target node of the same kind as the source
    /// and stages the pair. Elements and attributes keep their local name;
    /// types lose theirs, since every generated type must be local.
    fn clone_shell(&mut self, source: NodeId) -> Result<NodeId, ExtractError> {
        let shell = match self.src().node(source) {
            SchemaNode::Element(el) => SchemaNode::Element(ElementNode {
                name: el.name.clone(),
                form: el.form,
                ..ElementNode::default()
            }),
            SchemaNode::Attribute(attr) => SchemaNode::Attribute(AttributeNode {
                name: attr.name.clone(),
                form: attr.form,
                ..AttributeNode::default()
            }),
            SchemaNode::SimpleType(_) => SchemaNode::SimpleType(SimpleTypeNode::default()),
            SchemaNode::ComplexType(_) => SchemaNode::ComplexType(ComplexTypeNode::default()),
            SchemaNode::Particle(p) => SchemaNode::Particle(ParticleNode {
                kind: p.kind,
                occurs: p.occurs,
                items: Vec::new(),
            }),
            SchemaNode::ContentModel(cm) => {
                SchemaNode::ContentModel(ContentModelNode::new(cm.variety))
            }
            SchemaNode::Reference(r) => match r.kind {
                RefKind::Element => SchemaNode::Element(ElementNode::default()),
                RefKind::Attribute => SchemaNode::Attribute(AttributeNode::default()),
                RefKind::Group | RefKind::AttributeGroup => {
                    // group references are flattened inline, never staged
                    return Err(ExtractError::NodeConstruction {
                        kind: "group reference".to_string(),
                    });
                }
            },
            SchemaNode::Any(any) => SchemaNode::Any(any.clone()),
            other @ (SchemaNode::Group(_) | SchemaNode::AttributeGroup(_)) => {
                return Err(ExtractError::NodeConstruction {
                    kind: other.kind_name().to_string(),
                });
            }
        };
        let id = self.target.alloc(shell);
        self.stage_copy(id, source)?;
        Ok(id)
    }

    /// Explicit per-kind copy of the fields not owned by a handler: occurs
    /// bounds, value constraints, forms and flags. Names, types, and
    /// container fields are set by the handlers. Re-staging a target
    /// against a new source (ref targets, substitution heads) re-runs this,
    /// so the final staged source wins.
    fn copy_scalars(&mut self, target: NodeId, source: NodeId) -> Result<(), ExtractError> {
        let src = self.src().node(source);
        match (self.target.node_mut(target), src) {
            (SchemaNode::Element(t), SchemaNode::Element(s)) => {
                t.occurs = s.occurs;
                t.nillable = s.nillable;
                t.default_value = s.default_value.clone();
                t.fixed_value = s.fixed_value.clone();
                t.substitution_group = s.substitution_group.clone();
            }
            (SchemaNode::Element(t), SchemaNode::Reference(s)) => {
                t.occurs = s.occurs;
            }
            (SchemaNode::Attribute(t), SchemaNode::Attribute(s)) => {
                t.usage = s.usage;
                t.default_value = s.default_value.clone();
                t.fixed_value = s.fixed_value.clone();
            }
            (SchemaNode::Attribute(_), SchemaNode::Reference(_)) => {}
            (SchemaNode::SimpleType(_), SchemaNode::SimpleType(_)) => {}
            (SchemaNode::ComplexType(t), SchemaNode::ComplexType(s)) => {
                t.mixed = s.mixed;
                t.is_abstract = s.is_abstract;
            }
            (SchemaNode::Particle(t), SchemaNode::Particle(s)) => {
                t.occurs = s.occurs;
            }
            (SchemaNode::ContentModel(_), SchemaNode::ContentModel(_)) => {}
            (SchemaNode::Any(t), SchemaNode::Any(s)) => {
                t.occurs = s.occurs;
                t.namespace = s.namespace.clone();
                t.process_contents = s.process_contents.clone();
            }
            (_, src) => {
                return Err(ExtractError::NodeConstruction {
                    kind: src.kind_name().to_string(),
                });
            }
        }
        Ok(())
    }

    // -- handlers ---------------------------------------------------------

    /// One handler per source node kind; the closed enum makes the policy
    /// table exhaustive.
    fn copy_item(&mut self, target: NodeId, source: NodeId) -> Result<(), ExtractError> {
        let src = self.src();
        match src.node(source) {
            SchemaNode::Reference(r) => self.copy_reference(target, r),
            SchemaNode::Element(el) => self.copy_element(target, el),
            SchemaNode::Attribute(attr) => self.copy_attribute(target, attr),
            SchemaNode::SimpleType(st) => self.copy_simple_type(target, st),
            SchemaNode::ComplexType(ct) => self.copy_complex_type(target, ct),
            SchemaNode::ContentModel(cm) => self.copy_content_model(target, cm),
            SchemaNode::Particle(p) => self.copy_group_particle(target, p),
            // wildcards are terminal: scalars were staged, nothing to expand
            SchemaNode::Any(_) => Ok(()),
            other @ (SchemaNode::Group(_) | SchemaNode::AttributeGroup(_)) => {
                Err(ExtractError::NodeConstruction {
                    kind: other.kind_name().to_string(),
                })
            }
        }
    }

    /// Resolves a `ref` to its named target in the source schema, renames
    /// the placeholder after it, and re-stages the pair so the referenced
    /// body is copied. Cross-schema references are unsupported.
    fn copy_reference(&mut self, target: NodeId, r: &ReferenceNode) -> Result<(), ExtractError> {
        if r.ref_name.namespace_uri != self.src().target_namespace {
            return Err(ExtractError::MissingRefTarget(r.ref_name.clone()));
        }
        let resolved = match r.kind {
            RefKind::Element => self.src().element_by_qname(&r.ref_name),
            RefKind::Attribute => self.src().attribute_by_qname(&r.ref_name),
            RefKind::Group | RefKind::AttributeGroup => {
                return Err(ExtractError::NodeConstruction {
                    kind: "group reference".to_string(),
                });
            }
        }
        .ok_or_else(|| ExtractError::MissingRefTarget(r.ref_name.clone()))?;

        let name = Some(r.ref_name.local_part.clone());
        match self.target.node_mut(target) {
            SchemaNode::Element(el) => el.name = name,
            SchemaNode::Attribute(attr) => attr.name = name,
            other => {
                return Err(ExtractError::NodeConstruction {
                    kind: other.kind_name().to_string(),
                });
            }
        }
        self.stage_copy(target, resolved)
    }

    /// Substitution groups are resolved once, eagerly: the declaring
    /// element is overwritten by the group head. Otherwise the element's
    /// type is inlined.
    fn copy_element(&mut self, target: NodeId, el: &'s ElementNode) -> Result<(), ExtractError> {
        if let Some(head) = &el.substitution_group {
            let head_id = self
                .src()
                .element_by_qname(head)
                .ok_or_else(|| ExtractError::MissingElement(head.clone()))?;
            return self.stage_copy(target, head_id);
        }
        let resolved = self.resolve_type(el.type_name.as_ref(), el.type_node)?;
        if let SchemaNode::Element(t) = self.target.node_mut(target) {
            match resolved {
                ResolvedType::Builtin(name) => t.type_name = Some(name),
                ResolvedType::Inline(id) => t.type_node = Some(id),
                ResolvedType::None => {}
            }
        }
        Ok(())
    }

    fn copy_attribute(
        &mut self,
        target: NodeId,
        attr: &'s AttributeNode,
    ) -> Result<(), ExtractError> {
        let resolved = self.resolve_type(attr.type_name.as_ref(), attr.type_node)?;
        if let SchemaNode::Attribute(t) = self.target.node_mut(target) {
            match resolved {
                ResolvedType::Builtin(name) => t.type_name = Some(name),
                ResolvedType::Inline(id) => t.type_node = Some(id),
                ResolvedType::None => {}
            }
        }
        Ok(())
    }

    fn copy_simple_type(
        &mut self,
        target: NodeId,
        st: &'s SimpleTypeNode,
    ) -> Result<(), ExtractError> {
        let content = match &st.content {
            None => None,
            Some(SimpleTypeContent::Restriction {
                base_name,
                base,
                facets,
            }) => {
                let (base_name, base) = self.resolve_type_parts(base_name.as_ref(), *base)?;
                Some(SimpleTypeContent::Restriction {
                    base_name,
                    base,
                    facets: facets.clone(),
                })
            }
            Some(SimpleTypeContent::List { item_name, item }) => {
                let (item_name, item) = self.resolve_type_parts(item_name.as_ref(), *item)?;
                Some(SimpleTypeContent::List { item_name, item })
            }
            Some(SimpleTypeContent::Union {
                member_names,
                members,
            }) => {
                let mut names = Vec::new();
                let mut copies = Vec::new();
                for &member in members {
                    copies.push(self.clone_shell(member)?);
                }
                // built-in members stay by name, named members are inlined
                for name in member_names {
                    if name.is_xsd() {
                        names.push(name.clone());
                    } else {
                        let member = self
                            .src()
                            .type_by_qname(name)
                            .ok_or_else(|| ExtractError::MissingType(name.clone()))?;
                        copies.push(self.clone_shell(member)?);
                    }
                }
                Some(SimpleTypeContent::Union {
                    member_names: names,
                    members: copies,
                })
            }
        };
        if let SchemaNode::SimpleType(t) = self.target.node_mut(target) {
            t.content = content;
        }
        Ok(())
    }

    fn copy_complex_type(
        &mut self,
        target: NodeId,
        ct: &'s ComplexTypeNode,
    ) -> Result<(), ExtractError> {
        let attributes = self.flatten_attributes(&ct.attributes)?;
        let content_model = match ct.content_model {
            Some(cm) => Some(self.clone_shell(cm)?),
            None => None,
        };
        let particle = self.copy_particle_slot(ct.particle)?;
        if let SchemaNode::ComplexType(t) = self.target.node_mut(target) {
            t.attributes = attributes;
            t.content_model = content_model;
            t.particle = particle;
        }
        Ok(())
    }

    fn copy_content_model(
        &mut self,
        target: NodeId,
        cm: &'s ContentModelNode,
    ) -> Result<(), ExtractError> {
        let mut attributes = self.flatten_attributes(&cm.attributes)?;
        let mut base_name = None;
        let mut base = None;
        let mut particle = None;
        let mut facets = Vec::new();

        match cm.variety {
            ContentVariety::SimpleExtension => {
                base_name = cm.base_name.clone();
            }
            ContentVariety::SimpleRestriction => {
                let (name, node) = self.resolve_type_parts(cm.base_name.as_ref(), cm.base)?;
                base_name = name;
                base = node;
                facets = cm.facets.clone();
            }
            ContentVariety::ComplexRestriction => {
                base_name = cm.base_name.clone();
                particle = self.copy_particle_slot(cm.particle)?;
            }
            ContentVariety::ComplexExtension => {
                if cm.particle.is_some() {
                    particle = self.copy_particle_slot(cm.particle)?;
                } else if let Some(declared_base) = &cm.base_name {
                    if declared_base.is_xsd() {
                        // built-in base with no particle: keep the derivation shallow
                        base_name = Some(declared_base.clone());
                    } else {
                        let base_type = self
                            .src()
                            .type_by_qname(declared_base)
                            .map(|id| self.src().node(id));
                        match base_type {
                            Some(SchemaNode::ComplexType(base_ct)) => {
                                // one-level flattening: the target never retains
                                // named base types to extend
                                if base_ct.particle.is_some() {
                                    particle = self.copy_particle_slot(base_ct.particle)?;
                                    attributes
                                        .extend(self.flatten_attributes(&base_ct.attributes)?);
                                }
                            }
                            _ => {
                                return Err(ExtractError::UnsupportedExtensionBase(
                                    declared_base.clone(),
                                ));
                            }
                        }
                    }
                }
            }
        }

        if let SchemaNode::ContentModel(t) = self.target.node_mut(target) {
            t.base_name = base_name;
            t.base = base;
            t.attributes = attributes;
            t.particle = particle;
            t.facets = facets;
        }
        Ok(())
    }

    /// Copies the children of a sequence/choice/all, replacing each group
    /// reference with a copy of the referenced group's particle content.
    fn copy_group_particle(
        &mut self,
        target: NodeId,
        particle: &'s ParticleNode,
    ) -> Result<(), ExtractError> {
        let mut items = Vec::with_capacity(particle.items.len());
        for &item in &particle.items {
            match self.src().node(item) {
                SchemaNode::Reference(r) if r.kind == RefKind::Group => {
                    let group_particle = self.resolve_group(&r.ref_name)?;
                    items.push(self.clone_shell(group_particle)?);
                }
                _ => items.push(self.clone_shell(item)?),
            }
        }
        if let SchemaNode::Particle(t) = self.target.node_mut(target) {
            t.items = items;
        }
        Ok(())
    }

    // -- resolution helpers ----------------------------------------------

    /// The `type`/`base` resolution rule shared by elements, attributes,
    /// and simple type derivations: a built-in name is kept as a name, a
    /// named source type is looked up and inlined, an inline type node is
    /// copied directly.
    fn resolve_type(
        &mut self,
        type_name: Option<&QName>,
        type_node: Option<NodeId>,
    ) -> Result<ResolvedType, ExtractError> {
        let mut source_type = type_node;
        if let Some(name) = type_name {
            if name.is_xsd() {
                return Ok(ResolvedType::Builtin(name.clone()));
            }
            source_type = Some(
                self.src()
                    .type_by_qname(name)
                    .ok_or_else(|| ExtractError::MissingType(name.clone()))?,
            );
        }
        match source_type {
            Some(id) => Ok(ResolvedType::Inline(self.clone_shell(id)?)),
            None => Ok(ResolvedType::None),
        }
    }

    fn resolve_type_parts(
        &mut self,
        type_name: Option<&QName>,
        type_node: Option<NodeId>,
    ) -> Result<(Option<QName>, Option<NodeId>), ExtractError> {
        match self.resolve_type(type_name, type_node)? {
            ResolvedType::Builtin(name) => Ok((Some(name), None)),
            ResolvedType::Inline(id) => Ok((None, Some(id))),
            ResolvedType::None => Ok((None, None)),
        }
    }

    /// Copies a complex type's (or content model's) particle slot. A group
    /// reference in particle position is replaced by the referenced group's
    /// particle content.
    fn copy_particle_slot(
        &mut self,
        particle: Option<NodeId>,
    ) -> Result<Option<NodeId>, ExtractError> {
        let Some(id) = particle else {
            return Ok(None);
        };
        match self.src().node(id) {
            SchemaNode::Reference(r) if r.kind == RefKind::Group => {
                let group_particle = self.resolve_group(&r.ref_name)?;
                Ok(Some(self.clone_shell(group_particle)?))
            }
            SchemaNode::Particle(_) | SchemaNode::Any(_) => Ok(Some(self.clone_shell(id)?)),
            other => Err(ExtractError::UnsupportedParticle {
                kind: other.kind_name().to_string(),
            }),
        }
    }

    fn resolve_group(&mut self, name: &QName) -> Result<NodeId, ExtractError> {
        let group = self
            .src()
            .group_by_qname(name)
            .ok_or_else(|| ExtractError::MissingGroup(name.clone()))?;
        match self.src().node(group) {
            SchemaNode::Group(g) => Ok(g.particle),
            other => Err(ExtractError::NodeConstruction {
                kind: other.kind_name().to_string(),
            }),
        }
    }

    /// Copies an attribute list, flattening attribute groups and group
    /// references into plain attributes. Groups are never preserved as
    /// named groups in the target.
    fn flatten_attributes(&mut self, ids: &'s [NodeId]) -> Result<Vec<NodeId>, ExtractError> {
        let mut out = Vec::new();
        self.append_attributes(ids, &mut out)?;
        Ok(out)
    }

    fn append_attributes(
        &mut self,
        ids: &'s [NodeId],
        out: &mut Vec<NodeId>,
    ) -> Result<(), ExtractError> {
        for &id in ids {
            match self.src().node(id) {
                SchemaNode::Reference(r) if r.kind == RefKind::AttributeGroup => {
                    let group = self
                        .src()
                        .attribute_group_by_qname(&r.ref_name)
                        .ok_or_else(|| ExtractError::MissingGroup(r.ref_name.clone()))?;
                    match self.src().node(group) {
                        SchemaNode::AttributeGroup(g) => {
                            self.append_attributes(&g.members, out)?;
                        }
                        other => {
                            return Err(ExtractError::NodeConstruction {
                                kind: other.kind_name().to_string(),
                            });
                        }
                    }
                }
                SchemaNode::AttributeGroup(g) => self.append_attributes(&g.members, out)?,
                SchemaNode::Attribute(_) | SchemaNode::Reference(_) => {
                    out.push(self.clone_shell(id)?);
                }
                other => {
                    return Err(ExtractError::NodeConstruction {
                        kind: other.kind_name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
