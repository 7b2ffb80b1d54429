//! Editable form trees generated from a schema, and their rendering to XML.
//!
//! An element becomes an `element` node whose children are its `attribute`
//! nodes followed by either a value leaf (`input` or `restriction`) or the
//! node of its content group. Every branch of a `choice` is kept in the tree
//! (wrapped in a `sequence`) so the visitor can switch branches; only the
//! selected one is rendered.

use std::io::Write;

use registration_common::model::form::{FormElement, FormTag};
use serde_json::{json, Map, Value};
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

use crate::error::{RegistrationError, Result};
use crate::xsd::schema::{Compositor, Content, ElementDecl, Group, MaxOccurs, Particle, Schema, SimpleType};
use crate::xsd::tree::{self, XmlNode};

/// Build the form tree of `xsd`, prefilled from `xml` when given.
pub fn generate_form(xsd: &str, xml: Option<&str>) -> Result<FormElement> {
    let schema = Schema::compile(xsd)?;
    let document = match xml {
        Some(xml) if !xml.trim().is_empty() => {
            Some(tree::parse(xml).map_err(RegistrationError::Xml)?)
        }
        _ => None,
    };
    // Data for another root is ignored rather than half applied.
    let document = document.filter(|document| document.name == schema.root.name);
    let mut root = element(&schema.root, document.as_ref());
    if let Some(namespace) = &schema.target_namespace {
        root.options.insert("namespace".to_string(), json!(namespace));
    }
    Ok(root)
}

fn node(tag: FormTag, value: Option<String>, options: Map<String, Value>) -> FormElement {
    FormElement {
        id: None,
        tag,
        value,
        options,
        children: Vec::new(),
    }
}

fn occurs_options(min_occurs: u32, max_occurs: MaxOccurs) -> Map<String, Value> {
    let mut options = Map::new();
    options.insert("min_occurs".to_string(), json!(min_occurs));
    options.insert("max_occurs".to_string(), json!(max_occurs.to_string()));
    options
}

fn leaf(simple: &SimpleType, value: Option<String>) -> FormElement {
    let mut options = Map::new();
    options.insert("base".to_string(), json!(simple.base.name()));
    let value = value.filter(|value| !value.is_empty());
    if simple.enumeration.is_empty() {
        node(FormTag::Input, value, options)
    } else {
        options.insert("enumeration".to_string(), json!(simple.enumeration));
        node(FormTag::Restriction, value, options)
    }
}

fn element(decl: &ElementDecl, data: Option<&XmlNode>) -> FormElement {
    let mut options = occurs_options(decl.min_occurs, decl.max_occurs);
    options.insert("name".to_string(), json!(decl.name));
    let mut form = node(FormTag::Element, Some(decl.name.clone()), options);

    match &decl.content {
        Content::Simple(simple) => {
            let value = match data {
                Some(data) => Some(simple.normalize(&data.text).to_string()),
                None => decl.default.clone(),
            };
            form.children.push(leaf(simple, value));
        }
        Content::Complex {
            attributes,
            group,
            text,
            ..
        } => {
            for attribute in attributes {
                let mut options = Map::new();
                options.insert("name".to_string(), json!(attribute.name));
                let usage = if attribute.required { "required" } else { "optional" };
                options.insert("use".to_string(), json!(usage));
                let mut form_attribute =
                    node(FormTag::Attribute, Some(attribute.name.clone()), options);
                let value = data
                    .and_then(|data| data.attr(&attribute.name))
                    .map(|value| attribute.simple.normalize(value).to_string())
                    .or_else(|| attribute.default.clone());
                form_attribute.children.push(leaf(&attribute.simple, value));
                form.children.push(form_attribute);
            }
            if let Some(simple) = text {
                let value = match data {
                    Some(data) => Some(simple.normalize(&data.text).to_string()),
                    None => decl.default.clone(),
                };
                form.children.push(leaf(simple, value));
            }
            if let Some(group) = group {
                let children: Vec<&XmlNode> = data
                    .map(|data| data.children.iter().collect())
                    .unwrap_or_default();
                let mut pos = 0;
                group_instances(group, &children, &mut pos, &mut form.children);
            }
        }
    }
    form
}

fn target_count(min_occurs: u32) -> usize {
    (min_occurs as usize).max(1)
}

fn element_instances(
    decl: &ElementDecl,
    children: &[&XmlNode],
    pos: &mut usize,
    out: &mut Vec<FormElement>,
) {
    let mut count = 0;
    while let Some(child) = children.get(*pos) {
        if child.name != decl.name || !decl.max_occurs.allows(count + 1) {
            break;
        }
        out.push(element(decl, Some(child)));
        *pos += 1;
        count += 1;
    }
    while count < target_count(decl.min_occurs) && decl.max_occurs.allows(count + 1) {
        out.push(element(decl, None));
        count += 1;
    }
}

fn particle_instances(
    particle: &Particle,
    children: &[&XmlNode],
    pos: &mut usize,
    out: &mut Vec<FormElement>,
) {
    match particle {
        Particle::Element(decl) => element_instances(decl, children, pos, out),
        Particle::Group(group) => group_instances(group, children, pos, out),
    }
}

fn group_instances(
    group: &Group,
    children: &[&XmlNode],
    pos: &mut usize,
    out: &mut Vec<FormElement>,
) {
    let target = target_count(group.min_occurs);
    let mut count = 0;
    while group.max_occurs.allows(count + 1) {
        let starts_here = children
            .get(*pos)
            .is_some_and(|child| group_first_names(group).contains(&child.name.as_str()));
        if count >= target && !starts_here {
            break;
        }
        let start = *pos;
        out.push(group_instance(group, children, pos));
        count += 1;
        if *pos == start && count >= target {
            break;
        }
    }
}

fn group_instance(group: &Group, children: &[&XmlNode], pos: &mut usize) -> FormElement {
    let tag = match group.compositor {
        Compositor::Sequence => FormTag::Sequence,
        Compositor::Choice => FormTag::Choice,
        Compositor::All => FormTag::All,
    };
    let mut form = node(tag, None, occurs_options(group.min_occurs, group.max_occurs));

    match group.compositor {
        Compositor::Sequence => {
            for particle in &group.particles {
                particle_instances(particle, children, pos, &mut form.children);
            }
        }
        Compositor::Choice => {
            let selected = children
                .get(*pos)
                .and_then(|child| {
                    group
                        .particles
                        .iter()
                        .position(|particle| first_names(particle).contains(&child.name.as_str()))
                })
                .unwrap_or(0);
            for (index, particle) in group.particles.iter().enumerate() {
                let mut branch = node(FormTag::Sequence, None, Map::new());
                branch.options.insert("branch".to_string(), json!(index));
                if index == selected {
                    particle_instances(particle, children, pos, &mut branch.children);
                } else {
                    particle_instances(particle, &[], &mut 0, &mut branch.children);
                }
                form.children.push(branch);
            }
            form.value = Some(selected.to_string());
        }
        Compositor::All => {
            let names = group_first_names(group);
            let end = children[(*pos).min(children.len())..]
                .iter()
                .position(|child| !names.contains(&child.name.as_str()))
                .map(|offset| *pos + offset)
                .unwrap_or(children.len());
            let run = &children[(*pos).min(end)..end];
            for particle in &group.particles {
                if let Particle::Element(decl) = particle {
                    let matching: Vec<&XmlNode> = run
                        .iter()
                        .copied()
                        .filter(|child| child.name == decl.name)
                        .collect();
                    element_instances(decl, &matching, &mut 0, &mut form.children);
                }
            }
            *pos = end.max(*pos);
        }
    }
    form
}

fn is_optional(particle: &Particle) -> bool {
    match particle {
        Particle::Element(decl) => decl.min_occurs == 0,
        Particle::Group(group) => group.min_occurs == 0,
    }
}

/// Names of the elements that may open an occurrence of `particle`.
fn first_names(particle: &Particle) -> Vec<&str> {
    match particle {
        Particle::Element(decl) => vec![decl.name.as_str()],
        Particle::Group(group) => group_first_names(group),
    }
}

fn group_first_names(group: &Group) -> Vec<&str> {
    let mut names = Vec::new();
    for particle in &group.particles {
        names.extend(first_names(particle));
        if group.compositor == Compositor::Sequence && !is_optional(particle) {
            break;
        }
    }
    names
}

/// Render a form tree to an XML document.
///
/// Optional elements and attributes without any value are left out, and a
/// choice renders only its selected branch.
pub fn render_xml(root: &FormElement) -> Result<String> {
    if root.tag != FormTag::Element {
        return Err(RegistrationError::Xml(
            "the root of a form must be an element".to_string(),
        ));
    }
    let mut buffer = Vec::new();
    {
        let mut writer = EmitterConfig::new()
            .write_document_declaration(false)
            .create_writer(&mut buffer);
        write_element(&mut writer, root, true)?;
    }
    String::from_utf8(buffer).map_err(|e| RegistrationError::Xml(e.to_string()))
}

fn emit_error(err: xml::writer::Error) -> RegistrationError {
    RegistrationError::Xml(err.to_string())
}

fn option_str<'a>(form: &'a FormElement, key: &str) -> Option<&'a str> {
    form.options.get(key).and_then(Value::as_str)
}

fn is_optional_node(form: &FormElement) -> bool {
    match form.tag {
        FormTag::Attribute => option_str(form, "use") != Some("required"),
        _ => form.options.get("min_occurs").and_then(Value::as_u64) == Some(0),
    }
}

fn leaf_value(form: &FormElement) -> Option<&str> {
    form.children
        .iter()
        .find(|child| matches!(child.tag, FormTag::Input | FormTag::Restriction))
        .and_then(|child| child.value.as_deref())
        .filter(|value| !value.is_empty())
}

fn selected_branch(form: &FormElement) -> Option<&FormElement> {
    let index = form
        .value
        .as_deref()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);
    form.children.get(index)
}

/// Whether anything below `form` carries a value.
fn has_content(form: &FormElement) -> bool {
    match form.tag {
        FormTag::Input | FormTag::Restriction => {
            form.value.as_deref().is_some_and(|value| !value.is_empty())
        }
        FormTag::Choice => selected_branch(form).is_some_and(has_content),
        _ => form.children.iter().any(has_content),
    }
}

fn write_element<W: Write>(
    writer: &mut EventWriter<W>,
    form: &FormElement,
    is_root: bool,
) -> Result<()> {
    let name = form
        .value
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| RegistrationError::Xml("element without a name".to_string()))?;
    if !is_root && is_optional_node(form) && !has_content(form) {
        return Ok(());
    }

    let mut attributes = Vec::new();
    for child in form.children.iter().filter(|c| c.tag == FormTag::Attribute) {
        let Some(attribute_name) = child.value.as_deref() else {
            continue;
        };
        match leaf_value(child) {
            Some(value) => attributes.push((attribute_name, value)),
            None if !is_optional_node(child) => attributes.push((attribute_name, "")),
            None => {}
        }
    }

    let mut start = XmlEvent::start_element(name);
    if is_root {
        if let Some(namespace) = option_str(form, "namespace") {
            start = start.default_ns(namespace);
        }
    }
    for (attribute_name, value) in &attributes {
        start = start.attr(*attribute_name, value);
    }
    writer.write(start).map_err(emit_error)?;

    for child in &form.children {
        match child.tag {
            FormTag::Attribute => {}
            FormTag::Input | FormTag::Restriction => {
                if let Some(value) = child.value.as_deref().filter(|v| !v.is_empty()) {
                    writer.write(XmlEvent::characters(value)).map_err(emit_error)?;
                }
            }
            FormTag::Element => write_element(writer, child, false)?,
            FormTag::Sequence | FormTag::Choice | FormTag::All => write_group(writer, child)?,
        }
    }

    writer.write(XmlEvent::end_element()).map_err(emit_error)?;
    Ok(())
}

fn write_group<W: Write>(writer: &mut EventWriter<W>, form: &FormElement) -> Result<()> {
    let children: Vec<&FormElement> = match form.tag {
        FormTag::Choice => selected_branch(form).into_iter().collect(),
        _ => form.children.iter().collect(),
    };
    for child in children {
        match child.tag {
            FormTag::Element => write_element(writer, child, false)?,
            FormTag::Sequence | FormTag::Choice | FormTag::All => write_group(writer, child)?,
            _ => {}
        }
    }
    Ok(())
}
