//! Compilation of the XML Schema subset used by registration templates.
//!
//! Supported: top-level and local `element` declarations (with `ref`,
//! `minOccurs` and `maxOccurs`), named and anonymous `complexType` with
//! `sequence`, `choice` and `all` compositors (nested), `attribute`,
//! `simpleContent` extensions, and named or anonymous `simpleType`
//! restrictions over the common builtin types. Anything else is reported as
//! an error instead of being silently ignored.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::{RegistrationError, Result};
use crate::xsd::tree::{self, XmlNode};

pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Nesting limit; also stops recursive type definitions.
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    /// Whether `count` occurrences are allowed.
    pub fn allows(&self, count: usize) -> bool {
        match self {
            MaxOccurs::Bounded(max) => count <= *max as usize,
            MaxOccurs::Unbounded => true,
        }
    }
}

impl std::fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxOccurs::Bounded(max) => write!(f, "{}", max),
            MaxOccurs::Unbounded => f.write_str("unbounded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    String,
    NormalizedString,
    Token,
    Boolean,
    Integer,
    Int,
    Long,
    Short,
    NonNegativeInteger,
    PositiveInteger,
    Decimal,
    Float,
    Double,
    Date,
    DateTime,
    AnyUri,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" | "anyType" | "anySimpleType" => Builtin::String,
            "normalizedString" => Builtin::NormalizedString,
            "token" | "Name" | "NCName" | "language" => Builtin::Token,
            "boolean" => Builtin::Boolean,
            "integer" => Builtin::Integer,
            "int" => Builtin::Int,
            "long" => Builtin::Long,
            "short" => Builtin::Short,
            "nonNegativeInteger" => Builtin::NonNegativeInteger,
            "positiveInteger" => Builtin::PositiveInteger,
            "decimal" => Builtin::Decimal,
            "float" => Builtin::Float,
            "double" => Builtin::Double,
            "date" => Builtin::Date,
            "dateTime" => Builtin::DateTime,
            "anyURI" => Builtin::AnyUri,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::String => "string",
            Builtin::NormalizedString => "normalizedString",
            Builtin::Token => "token",
            Builtin::Boolean => "boolean",
            Builtin::Integer => "integer",
            Builtin::Int => "int",
            Builtin::Long => "long",
            Builtin::Short => "short",
            Builtin::NonNegativeInteger => "nonNegativeInteger",
            Builtin::PositiveInteger => "positiveInteger",
            Builtin::Decimal => "decimal",
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::Date => "date",
            Builtin::DateTime => "dateTime",
            Builtin::AnyUri => "anyURI",
        }
    }

    /// Whether leading and trailing whitespace is significant.
    fn preserves_whitespace(&self) -> bool {
        matches!(self, Builtin::String | Builtin::NormalizedString)
    }

    fn is_numeric(&self) -> bool {
        matches!(
            self,
            Builtin::Integer
                | Builtin::Int
                | Builtin::Long
                | Builtin::Short
                | Builtin::NonNegativeInteger
                | Builtin::PositiveInteger
                | Builtin::Decimal
                | Builtin::Float
                | Builtin::Double
        )
    }

    fn accepts(&self, value: &str) -> bool {
        match self {
            Builtin::String => true,
            Builtin::NormalizedString => !value.contains(['\n', '\r', '\t']),
            Builtin::Token => !value.contains(['\n', '\r', '\t']) && !value.contains("  "),
            Builtin::Boolean => matches!(value, "true" | "false" | "1" | "0"),
            Builtin::Integer => is_integer(value),
            Builtin::Int => value.parse::<i32>().is_ok(),
            Builtin::Long => value.parse::<i64>().is_ok(),
            Builtin::Short => value.parse::<i16>().is_ok(),
            Builtin::NonNegativeInteger => is_integer(value) && !value.starts_with('-'),
            Builtin::PositiveInteger => {
                is_integer(value)
                    && !value.starts_with('-')
                    && !value.trim_start_matches('+').trim_start_matches('0').is_empty()
            }
            Builtin::Decimal => is_decimal(value),
            Builtin::Float | Builtin::Double => {
                matches!(value, "INF" | "-INF" | "NaN") || value.parse::<f64>().is_ok()
            }
            Builtin::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
            Builtin::DateTime => {
                DateTime::parse_from_rfc3339(value).is_ok()
                    || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok()
                    || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
            }
            Builtin::AnyUri => !value.contains(char::is_whitespace),
        }
    }
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_decimal(value: &str) -> bool {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (unsigned, ""),
    };
    (!int_part.is_empty() || !frac_part.is_empty())
        && int_part.chars().all(|c| c.is_ascii_digit())
        && frac_part.chars().all(|c| c.is_ascii_digit())
}

/// A builtin type narrowed by restriction facets.
#[derive(Debug, Clone)]
pub struct SimpleType {
    pub base: Builtin,
    pub enumeration: Vec<String>,
    pub patterns: Vec<Regex>,
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_inclusive: Option<f64>,
    pub max_inclusive: Option<f64>,
}

impl SimpleType {
    pub fn builtin(base: Builtin) -> Self {
        SimpleType {
            base,
            enumeration: Vec::new(),
            patterns: Vec::new(),
            length: None,
            min_length: None,
            max_length: None,
            min_inclusive: None,
            max_inclusive: None,
        }
    }

    /// Normalize raw character data the way the base type reads it.
    pub fn normalize<'a>(&self, raw: &'a str) -> &'a str {
        if self.base.preserves_whitespace() {
            raw
        } else {
            raw.trim()
        }
    }

    /// Check a normalized value against the base type and every facet.
    pub fn check(&self, value: &str) -> std::result::Result<(), String> {
        if !self.base.accepts(value) {
            return Err(format!(
                "'{}' is not a valid value of type {}",
                value,
                self.base.name()
            ));
        }
        if !self.enumeration.is_empty() && !self.enumeration.iter().any(|v| v == value) {
            return Err(format!(
                "'{}' is not one of the allowed values [{}]",
                value,
                self.enumeration.join(", ")
            ));
        }
        for pattern in &self.patterns {
            if !pattern.is_match(value) {
                return Err(format!(
                    "'{}' does not match the pattern '{}'",
                    value,
                    pattern.as_str()
                ));
            }
        }
        let len = value.chars().count();
        if let Some(length) = self.length {
            if len != length {
                return Err(format!("'{}' must be exactly {} characters long", value, length));
            }
        }
        if let Some(min) = self.min_length {
            if len < min {
                return Err(format!("'{}' must be at least {} characters long", value, min));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(format!("'{}' must be at most {} characters long", value, max));
            }
        }
        if self.min_inclusive.is_some() || self.max_inclusive.is_some() {
            let number: f64 = value
                .parse()
                .map_err(|_| format!("'{}' is not a number", value))?;
            if let Some(min) = self.min_inclusive {
                if number < min {
                    return Err(format!("'{}' is lower than the minimum {}", value, min));
                }
            }
            if let Some(max) = self.max_inclusive {
                if number > max {
                    return Err(format!("'{}' is greater than the maximum {}", value, max));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AttributeDecl {
    pub name: String,
    pub required: bool,
    pub default: Option<String>,
    pub simple: SimpleType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compositor {
    Sequence,
    Choice,
    All,
}

#[derive(Debug, Clone)]
pub enum Particle {
    Element(ElementDecl),
    Group(Group),
}

#[derive(Debug, Clone)]
pub struct Group {
    pub compositor: Compositor,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub particles: Vec<Particle>,
}

#[derive(Debug, Clone)]
pub enum Content {
    /// Character data only.
    Simple(SimpleType),
    /// Attributes plus child elements (`group`) or typed text (`text`).
    Complex {
        attributes: Vec<AttributeDecl>,
        group: Option<Group>,
        text: Option<SimpleType>,
        mixed: bool,
    },
}

#[derive(Debug, Clone)]
pub struct ElementDecl {
    pub name: String,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub default: Option<String>,
    pub content: Content,
}

impl ElementDecl {
    pub fn is_optional(&self) -> bool {
        self.min_occurs == 0
    }
}

/// A compiled schema: the declaration of the document root.
#[derive(Debug, Clone)]
pub struct Schema {
    pub root: ElementDecl,
    pub target_namespace: Option<String>,
}

impl Schema {
    /// Parse and compile a schema document.
    pub fn compile(xsd: &str) -> Result<Self> {
        let document = tree::parse(xsd).map_err(RegistrationError::Xsd)?;
        if document.name != "schema" || document.namespace.as_deref() != Some(XS_NAMESPACE) {
            return Err(RegistrationError::Xsd(
                "the document is not an XML Schema".to_string(),
            ));
        }
        let compiler = Compiler::new(&document);
        let root_node = document
            .children_named("element")
            .next()
            .ok_or_else(|| RegistrationError::Xsd("the schema declares no root element".into()))?;
        let root = compiler
            .element(root_node, 0)
            .map_err(RegistrationError::Xsd)?;
        Ok(Schema {
            root,
            target_namespace: document.attr("targetNamespace").map(str::to_string),
        })
    }
}

/// Check that `xsd` is a schema this service can render and validate.
pub fn is_schema_valid(xsd: &str) -> Result<Schema> {
    Schema::compile(xsd)
}

/// Hash identifying a schema content.
pub fn get_hash(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

fn local(qname: &str) -> &str {
    qname.rsplit(':').next().unwrap_or(qname)
}

fn parse_occurs(node: &XmlNode) -> std::result::Result<(u32, MaxOccurs), String> {
    let min = match node.attr("minOccurs") {
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| format!("invalid minOccurs '{}'", value))?,
        None => 1,
    };
    let max = match node.attr("maxOccurs") {
        Some("unbounded") => MaxOccurs::Unbounded,
        Some(value) => MaxOccurs::Bounded(
            value
                .parse::<u32>()
                .map_err(|_| format!("invalid maxOccurs '{}'", value))?,
        ),
        None => MaxOccurs::Bounded(1),
    };
    if !max.allows(min as usize) {
        return Err(format!("minOccurs {} is greater than maxOccurs {}", min, max));
    }
    Ok((min, max))
}

struct Compiler<'a> {
    elements: HashMap<&'a str, &'a XmlNode>,
    complex_types: HashMap<&'a str, &'a XmlNode>,
    simple_types: HashMap<&'a str, &'a XmlNode>,
}

type CompileResult<T> = std::result::Result<T, String>;

impl<'a> Compiler<'a> {
    fn new(document: &'a XmlNode) -> Self {
        let mut compiler = Compiler {
            elements: HashMap::new(),
            complex_types: HashMap::new(),
            simple_types: HashMap::new(),
        };
        for child in &document.children {
            let Some(name) = child.attr("name") else {
                continue;
            };
            match child.name.as_str() {
                "element" => {
                    compiler.elements.insert(name, child);
                }
                "complexType" => {
                    compiler.complex_types.insert(name, child);
                }
                "simpleType" => {
                    compiler.simple_types.insert(name, child);
                }
                _ => {}
            }
        }
        compiler
    }

    fn check_depth(depth: usize) -> CompileResult<()> {
        if depth > MAX_DEPTH {
            return Err(format!(
                "the schema nests deeper than {} levels (recursive types are not supported)",
                MAX_DEPTH
            ));
        }
        Ok(())
    }

    fn element(&self, node: &XmlNode, depth: usize) -> CompileResult<ElementDecl> {
        Self::check_depth(depth)?;
        let (min_occurs, max_occurs) = parse_occurs(node)?;

        if let Some(reference) = node.attr("ref") {
            let target = self
                .elements
                .get(local(reference))
                .ok_or_else(|| format!("unknown element reference '{}'", reference))?;
            let mut decl = self.element(target, depth + 1)?;
            decl.min_occurs = min_occurs;
            decl.max_occurs = max_occurs;
            return Ok(decl);
        }

        let name = node
            .attr("name")
            .ok_or_else(|| "element declaration without a name".to_string())?
            .to_string();

        let content = if let Some(type_name) = node.attr("type") {
            self.named_type(type_name, depth)?
        } else if let Some(complex) = node.children_named("complexType").next() {
            self.complex_type(complex, depth + 1)?
        } else if let Some(simple) = node.children_named("simpleType").next() {
            Content::Simple(self.simple_type(simple, depth + 1)?)
        } else {
            Content::Simple(SimpleType::builtin(Builtin::String))
        };

        Ok(ElementDecl {
            name,
            min_occurs,
            max_occurs,
            default: node.attr("default").map(str::to_string),
            content,
        })
    }

    fn named_type(&self, type_name: &str, depth: usize) -> CompileResult<Content> {
        let name = local(type_name);
        if let Some(node) = self.complex_types.get(name) {
            return self.complex_type(node, depth + 1);
        }
        Ok(Content::Simple(self.named_simple_type(type_name, depth)?))
    }

    fn named_simple_type(&self, type_name: &str, depth: usize) -> CompileResult<SimpleType> {
        let name = local(type_name);
        if let Some(node) = self.simple_types.get(name) {
            return self.simple_type(node, depth + 1);
        }
        Builtin::from_name(name)
            .map(SimpleType::builtin)
            .ok_or_else(|| format!("unknown type '{}'", type_name))
    }

    fn simple_type(&self, node: &XmlNode, depth: usize) -> CompileResult<SimpleType> {
        Self::check_depth(depth)?;
        let restriction = node.children_named("restriction").next().ok_or_else(|| {
            "only simpleType restrictions are supported (list and union are not)".to_string()
        })?;
        let mut simple = match restriction.attr("base") {
            Some(base) => self.named_simple_type(base, depth)?,
            None => match restriction.children_named("simpleType").next() {
                Some(inner) => self.simple_type(inner, depth + 1)?,
                None => return Err("restriction without a base type".to_string()),
            },
        };
        self.apply_facets(restriction, &mut simple)?;
        Ok(simple)
    }

    fn apply_facets(&self, restriction: &XmlNode, simple: &mut SimpleType) -> CompileResult<()> {
        let mut enumeration = Vec::new();
        for facet in &restriction.children {
            let value = facet.attr("value");
            let parse_usize = |v: Option<&str>| -> CompileResult<usize> {
                v.and_then(|v| v.parse().ok())
                    .ok_or_else(|| format!("invalid value for facet '{}'", facet.name))
            };
            let parse_f64 = |v: Option<&str>| -> CompileResult<f64> {
                v.and_then(|v| v.parse().ok())
                    .ok_or_else(|| format!("invalid value for facet '{}'", facet.name))
            };
            match facet.name.as_str() {
                "enumeration" => enumeration.push(value.unwrap_or_default().to_string()),
                "pattern" => {
                    let pattern = value.unwrap_or_default();
                    let regex = Regex::new(&format!("^(?:{})$", pattern))
                        .map_err(|e| format!("invalid pattern '{}': {}", pattern, e))?;
                    simple.patterns.push(regex);
                }
                "length" => simple.length = Some(parse_usize(value)?),
                "minLength" => simple.min_length = Some(parse_usize(value)?),
                "maxLength" => simple.max_length = Some(parse_usize(value)?),
                "minInclusive" => {
                    if !simple.base.is_numeric() {
                        return Err("minInclusive is only supported on numeric types".into());
                    }
                    simple.min_inclusive = Some(parse_f64(value)?)
                }
                "maxInclusive" => {
                    if !simple.base.is_numeric() {
                        return Err("maxInclusive is only supported on numeric types".into());
                    }
                    simple.max_inclusive = Some(parse_f64(value)?)
                }
                "whiteSpace" | "annotation" | "simpleType" => {}
                other => return Err(format!("unsupported facet '{}'", other)),
            }
        }
        if !enumeration.is_empty() {
            simple.enumeration = enumeration;
        }
        Ok(())
    }

    fn complex_type(&self, node: &XmlNode, depth: usize) -> CompileResult<Content> {
        Self::check_depth(depth)?;
        let mut attributes = Vec::new();
        let mut group = None;
        let mut text = None;

        for child in &node.children {
            match child.name.as_str() {
                "sequence" | "choice" | "all" => {
                    if group.is_some() {
                        return Err("a complexType may hold only one compositor".to_string());
                    }
                    group = Some(self.group(child, depth + 1)?);
                }
                "attribute" => attributes.push(self.attribute(child, depth)?),
                "simpleContent" => {
                    let extension = child
                        .children
                        .iter()
                        .find(|c| c.name == "extension" || c.name == "restriction")
                        .ok_or_else(|| "simpleContent without extension".to_string())?;
                    let base = extension
                        .attr("base")
                        .ok_or_else(|| "simpleContent extension without a base".to_string())?;
                    let mut simple = self.named_simple_type(base, depth)?;
                    if extension.name == "restriction" {
                        self.apply_facets(extension, &mut simple)?;
                    }
                    for attribute in extension.children_named("attribute") {
                        attributes.push(self.attribute(attribute, depth)?);
                    }
                    text = Some(simple);
                }
                "complexContent" => {
                    return Err("complexContent derivation is not supported".to_string());
                }
                "anyAttribute" | "annotation" => {}
                other => return Err(format!("unsupported complexType child '{}'", other)),
            }
        }

        Ok(Content::Complex {
            attributes,
            group,
            text,
            mixed: node.attr("mixed") == Some("true"),
        })
    }

    fn group(&self, node: &XmlNode, depth: usize) -> CompileResult<Group> {
        Self::check_depth(depth)?;
        let compositor = match node.name.as_str() {
            "sequence" => Compositor::Sequence,
            "choice" => Compositor::Choice,
            _ => Compositor::All,
        };
        let (min_occurs, max_occurs) = parse_occurs(node)?;
        let mut particles = Vec::new();
        for child in &node.children {
            match child.name.as_str() {
                "element" => particles.push(Particle::Element(self.element(child, depth + 1)?)),
                "sequence" | "choice" | "all" => {
                    if compositor == Compositor::All {
                        return Err("an 'all' group may only contain elements".to_string());
                    }
                    particles.push(Particle::Group(self.group(child, depth + 1)?))
                }
                "annotation" => {}
                other => return Err(format!("unsupported particle '{}'", other)),
            }
        }
        Ok(Group {
            compositor,
            min_occurs,
            max_occurs,
            particles,
        })
    }

    fn attribute(&self, node: &XmlNode, depth: usize) -> CompileResult<AttributeDecl> {
        let name = node
            .attr("name")
            .ok_or_else(|| "attribute declaration without a name".to_string())?
            .to_string();
        let simple = match (node.attr("type"), node.children_named("simpleType").next()) {
            (Some(type_name), _) => self.named_simple_type(type_name, depth)?,
            (None, Some(inline)) => self.simple_type(inline, depth + 1)?,
            (None, None) => SimpleType::builtin(Builtin::String),
        };
        Ok(AttributeDecl {
            name,
            required: node.attr("use") == Some("required"),
            default: node.attr("default").map(str::to_string),
            simple,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:simpleType name="Country">
    <xs:restriction base="xs:string">
      <xs:enumeration value="FR"/>
      <xs:enumeration value="US"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:complexType name="Address">
    <xs:sequence>
      <xs:element name="city" type="xs:string"/>
      <xs:element name="country" type="Country"/>
    </xs:sequence>
  </xs:complexType>
  <xs:element name="profile">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="age" type="xs:int" minOccurs="0"/>
        <xs:element name="address" type="Address" maxOccurs="unbounded"/>
      </xs:sequence>
      <xs:attribute name="lang" type="xs:language" use="required"/>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    #[test]
    fn compiles_named_and_anonymous_types() {
        let schema = Schema::compile(SCHEMA).unwrap();
        assert_eq!(schema.root.name, "profile");
        let Content::Complex {
            attributes, group, ..
        } = &schema.root.content
        else {
            panic!("profile should be complex");
        };
        assert_eq!(attributes.len(), 1);
        assert!(attributes[0].required);
        let group = group.as_ref().unwrap();
        assert_eq!(group.compositor, Compositor::Sequence);
        let Particle::Element(age) = &group.particles[0] else {
            panic!("expected element");
        };
        assert!(age.is_optional());
        let Particle::Element(address) = &group.particles[1] else {
            panic!("expected element");
        };
        assert_eq!(address.max_occurs, MaxOccurs::Unbounded);
    }

    #[test]
    fn rejects_non_schema_documents_and_unknown_types() {
        assert!(matches!(
            Schema::compile("<root/>"),
            Err(RegistrationError::Xsd(_))
        ));
        let unknown = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="a" type="Missing"/></xs:schema>"#;
        assert!(matches!(
            Schema::compile(unknown),
            Err(RegistrationError::Xsd(_))
        ));
        assert!(matches!(
            Schema::compile("not xml"),
            Err(RegistrationError::Xsd(_))
        ));
    }

    #[test]
    fn recursive_types_are_reported() {
        let recursive = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType name="Node"><xs:sequence>
              <xs:element name="node" type="Node" minOccurs="0"/>
            </xs:sequence></xs:complexType>
            <xs:element name="root" type="Node"/></xs:schema>"#;
        let err = Schema::compile(recursive).unwrap_err();
        assert!(err.to_string().contains("recursive"));
    }

    #[test]
    fn facets_constrain_values() {
        let mut simple = SimpleType::builtin(Builtin::Int);
        simple.min_inclusive = Some(18.0);
        simple.max_inclusive = Some(120.0);
        assert!(simple.check("42").is_ok());
        assert!(simple.check("12").is_err());
        assert!(simple.check("abc").is_err());

        let mut code = SimpleType::builtin(Builtin::String);
        code.patterns.push(Regex::new("^(?:[A-Z]{3})$").unwrap());
        assert!(code.check("ABC").is_ok());
        assert!(code.check("ABCD").is_err());
    }

    #[test]
    fn builtin_lexical_spaces() {
        assert!(Builtin::Date.accepts("2024-02-29"));
        assert!(!Builtin::Date.accepts("2023-02-29"));
        assert!(Builtin::DateTime.accepts("2024-01-01T10:00:00Z"));
        assert!(Builtin::Decimal.accepts("-1.50"));
        assert!(!Builtin::Decimal.accepts("1e3"));
        assert!(Builtin::PositiveInteger.accepts("3"));
        assert!(!Builtin::PositiveInteger.accepts("0"));
        assert!(Builtin::Boolean.accepts("true"));
        assert!(!Builtin::Boolean.accepts("yes"));
    }

    #[test]
    fn hash_is_stable_md5_hex() {
        assert_eq!(get_hash(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(get_hash(SCHEMA), get_hash(SCHEMA));
    }
}
