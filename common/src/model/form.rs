use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of a node in the editable form tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormTag {
    /// An XML element; `value` holds the element name.
    Element,
    /// An XML attribute; `value` holds the attribute name.
    Attribute,
    Sequence,
    /// A choice between branches; `value` holds the index of the selected branch.
    Choice,
    All,
    /// Free text input; `value` holds the text.
    Input,
    /// Enumerated input; `value` holds the selected option.
    Restriction,
}

impl FormTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormTag::Element => "element",
            FormTag::Attribute => "attribute",
            FormTag::Sequence => "sequence",
            FormTag::Choice => "choice",
            FormTag::All => "all",
            FormTag::Input => "input",
            FormTag::Restriction => "restriction",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "element" => Some(FormTag::Element),
            "attribute" => Some(FormTag::Attribute),
            "sequence" => Some(FormTag::Sequence),
            "choice" => Some(FormTag::Choice),
            "all" => Some(FormTag::All),
            "input" => Some(FormTag::Input),
            "restriction" => Some(FormTag::Restriction),
            _ => None,
        }
    }

    /// Whether a visitor may change the value of a node with this tag.
    pub fn is_editable(&self) -> bool {
        matches!(self, FormTag::Input | FormTag::Restriction | FormTag::Choice)
    }
}

/// A node of the editable form tree generated from an XML Schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormElement {
    /// Storage id, set once the tree has been persisted.
    pub id: Option<String>,
    pub tag: FormTag,
    pub value: Option<String>,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub children: Vec<FormElement>,
}
