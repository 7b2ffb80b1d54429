//! Validation of XML documents against a compiled [`Schema`].
//!
//! Structure is matched greedily on element names, without backtracking:
//! a choice takes the first branch whose leading element matches. Values
//! are then checked element by element and every problem is reported.

use crate::error::{RegistrationError, Result};
use crate::xsd::schema::{Compositor, Content, ElementDecl, Group, Particle, Schema};
use crate::xsd::tree::{self, XmlNode};

/// Validate `xml` against `schema`.
///
/// Returns `None` when the document is valid, otherwise the list of errors.
pub fn validate_xml_data(schema: &Schema, xml: &str) -> Option<Vec<String>> {
    let document = match tree::parse(xml) {
        Ok(document) => document,
        Err(e) => return Some(vec![format!("the document is not well-formed: {}", e)]),
    };
    let mut errors = Vec::new();
    let namespace = document.namespace.as_deref().filter(|ns| !ns.is_empty());
    let expected_namespace = schema.target_namespace.as_deref().filter(|ns| !ns.is_empty());
    if document.name != schema.root.name {
        errors.push(format!(
            "root element '{}' does not match the expected '{}'",
            document.name, schema.root.name
        ));
    } else if namespace != expected_namespace {
        errors.push(format!(
            "root element '{}' is in namespace '{}', expected '{}'",
            document.name,
            namespace.unwrap_or(""),
            expected_namespace.unwrap_or("")
        ));
    } else {
        validate_element(&document, &schema.root, &format!("/{}", document.name), &mut errors);
    }
    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

/// Check `xml_content` against the schema text `xsd`.
///
/// A broken schema is an `Xsd` error; a broken or invalid document an `Xml` error.
pub fn check_xml_against_schema(xsd: &str, xml_content: &str) -> Result<()> {
    let schema = Schema::compile(xsd)?;
    match validate_xml_data(&schema, xml_content) {
        None => Ok(()),
        Some(errors) => Err(RegistrationError::Xml(errors.join("; "))),
    }
}

fn validate_element(node: &XmlNode, decl: &ElementDecl, path: &str, errors: &mut Vec<String>) {
    match &decl.content {
        Content::Simple(simple) => {
            if !node.children.is_empty() {
                errors.push(format!("{}: child elements are not allowed", path));
                return;
            }
            check_attributes(node, &[], path, errors);
            if let Err(e) = simple.check(simple.normalize(&node.text)) {
                errors.push(format!("{}: {}", path, e));
            }
        }
        Content::Complex {
            attributes,
            group,
            text,
            mixed,
        } => {
            check_attributes(node, attributes, path, errors);

            if let Some(simple) = text {
                if !node.children.is_empty() {
                    errors.push(format!("{}: child elements are not allowed", path));
                } else if let Err(e) = simple.check(simple.normalize(&node.text)) {
                    errors.push(format!("{}: {}", path, e));
                }
                return;
            }
            if node.has_text() && !mixed {
                errors.push(format!("{}: text content is not allowed", path));
            }

            let children: Vec<&XmlNode> = node.children.iter().collect();
            let mut assigned: Vec<&ElementDecl> = Vec::with_capacity(children.len());
            let matched = match group {
                Some(group) => match_group(group, &children, 0, &mut assigned),
                None => Ok(0),
            };
            match matched {
                Err(e) => errors.push(format!("{}: {}", path, e)),
                Ok(consumed) if consumed < children.len() => errors.push(format!(
                    "{}: unexpected element '{}'",
                    path, children[consumed].name
                )),
                Ok(_) => {}
            }
            for (child, child_decl) in children.iter().zip(assigned.iter()) {
                let child_path = format!("{}/{}", path, child.name);
                validate_element(child, child_decl, &child_path, errors);
            }
        }
    }
}

fn check_attributes(
    node: &XmlNode,
    declared: &[crate::xsd::schema::AttributeDecl],
    path: &str,
    errors: &mut Vec<String>,
) {
    for (name, value) in &node.attributes {
        if name.starts_with("xsi:") || name.starts_with("xml:") {
            continue;
        }
        match declared.iter().find(|decl| &decl.name == name) {
            Some(decl) => {
                if let Err(e) = decl.simple.check(decl.simple.normalize(value)) {
                    errors.push(format!("{}/@{}: {}", path, name, e));
                }
            }
            None => errors.push(format!("{}: attribute '{}' is not allowed", path, name)),
        }
    }
    for decl in declared {
        if decl.required && node.attr(&decl.name).is_none() {
            errors.push(format!("{}: missing required attribute '{}'", path, decl.name));
        }
    }
}

/// Greedy structural match of `group` against `children[pos..]`.
///
/// Pushes the declaration of every consumed child to `assigned` and returns
/// the position after the last consumed child.
fn match_group<'s>(
    group: &'s Group,
    children: &[&XmlNode],
    pos: usize,
    assigned: &mut Vec<&'s ElementDecl>,
) -> std::result::Result<usize, String> {
    let mut pos = pos;
    let mut count = 0usize;
    while group.max_occurs.allows(count + 1) {
        let mark = assigned.len();
        let attempt = match group.compositor {
            Compositor::Sequence => match_sequence(group, children, pos, assigned),
            Compositor::Choice => match_choice(group, children, pos, assigned),
            Compositor::All => match_all(group, children, pos, assigned),
        };
        match attempt {
            Ok(next) if next > pos => {
                pos = next;
                count += 1;
            }
            Ok(_) => {
                // Matched without consuming anything: the group is satisfied by emptiness.
                count = count.max(group.min_occurs as usize);
                break;
            }
            Err(e) => {
                assigned.truncate(mark);
                if count >= group.min_occurs as usize {
                    break;
                }
                return Err(e);
            }
        }
    }
    if count < group.min_occurs as usize {
        return Err(format!(
            "the group must occur at least {} time(s)",
            group.min_occurs
        ));
    }
    Ok(pos)
}

fn match_particle<'s>(
    particle: &'s Particle,
    children: &[&XmlNode],
    pos: usize,
    assigned: &mut Vec<&'s ElementDecl>,
) -> std::result::Result<usize, String> {
    match particle {
        Particle::Element(decl) => match_element(decl, children, pos, assigned),
        Particle::Group(group) => match_group(group, children, pos, assigned),
    }
}

fn match_element<'s>(
    decl: &'s ElementDecl,
    children: &[&XmlNode],
    pos: usize,
    assigned: &mut Vec<&'s ElementDecl>,
) -> std::result::Result<usize, String> {
    let mut pos = pos;
    let mut count = 0usize;
    while pos < children.len()
        && children[pos].name == decl.name
        && decl.max_occurs.allows(count + 1)
    {
        assigned.push(decl);
        pos += 1;
        count += 1;
    }
    if count < decl.min_occurs as usize {
        return Err(match children.get(pos) {
            Some(found) => format!("expected element '{}', found '{}'", decl.name, found.name),
            None => format!("missing element '{}'", decl.name),
        });
    }
    Ok(pos)
}

fn match_sequence<'s>(
    group: &'s Group,
    children: &[&XmlNode],
    pos: usize,
    assigned: &mut Vec<&'s ElementDecl>,
) -> std::result::Result<usize, String> {
    let mut pos = pos;
    for particle in &group.particles {
        pos = match_particle(particle, children, pos, assigned)?;
    }
    Ok(pos)
}

fn match_choice<'s>(
    group: &'s Group,
    children: &[&XmlNode],
    pos: usize,
    assigned: &mut Vec<&'s ElementDecl>,
) -> std::result::Result<usize, String> {
    let mut empty_branch = false;
    for particle in &group.particles {
        let mark = assigned.len();
        match match_particle(particle, children, pos, assigned) {
            Ok(next) if next > pos => return Ok(next),
            Ok(_) => empty_branch = true,
            Err(_) => {}
        }
        assigned.truncate(mark);
    }
    if empty_branch {
        return Ok(pos);
    }
    let expected: Vec<String> = group.particles.iter().map(particle_label).collect();
    Err(match children.get(pos) {
        Some(found) => format!(
            "expected one of [{}], found '{}'",
            expected.join(", "),
            found.name
        ),
        None => format!("missing one of [{}]", expected.join(", ")),
    })
}

fn match_all<'s>(
    group: &'s Group,
    children: &[&XmlNode],
    pos: usize,
    assigned: &mut Vec<&'s ElementDecl>,
) -> std::result::Result<usize, String> {
    let decls: Vec<&ElementDecl> = group
        .particles
        .iter()
        .filter_map(|particle| match particle {
            Particle::Element(decl) => Some(decl),
            Particle::Group(_) => None,
        })
        .collect();
    let mut seen = vec![false; decls.len()];
    let mut pos = pos;
    while let Some(child) = children.get(pos) {
        let Some(index) = decls.iter().position(|decl| decl.name == child.name) else {
            break;
        };
        if seen[index] {
            return Err(format!("element '{}' may only appear once", child.name));
        }
        seen[index] = true;
        assigned.push(decls[index]);
        pos += 1;
    }
    for (decl, seen) in decls.iter().zip(seen) {
        if !seen && !decl.is_optional() {
            return Err(format!("missing element '{}'", decl.name));
        }
    }
    Ok(pos)
}

fn particle_label(particle: &Particle) -> String {
    match particle {
        Particle::Element(decl) => decl.name.clone(),
        Particle::Group(group) => format!(
            "({})",
            group
                .particles
                .iter()
                .map(particle_label)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}
