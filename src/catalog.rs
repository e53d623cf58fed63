//! Raw node-type descriptions, as authored.
//!
//! A [`Catalog`] maps each opcode name to its [`NodeSpec`]. Nothing here is
//! resolved yet: parents are still references by name, optional fields are
//! still missing. See `normalize` for the flat form the emitter consumes.
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A named graph input (or tuple output) of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl Input {
    pub fn new(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self { name: name.into(), comment: comment.into() }
    }
}

/// Number of predecessor inputs.
///
/// Serialized as a plain count or as `"variable"` / `"dynamic"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ArityRepr", into = "ArityRepr")]
pub enum Arity {
    Fixed(usize),
    /// Trailing inputs whose count is chosen at construction.
    Variable,
    /// Inputs may be added after construction.
    Dynamic,
}

impl Arity {
    /// Variable and dynamic nodes take a count plus an array of trailing inputs.
    pub fn is_open(self) -> bool {
        matches!(self, Arity::Variable | Arity::Dynamic)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ArityRepr {
    Count(usize),
    Kind(OpenArity),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OpenArity {
    Variable,
    Dynamic,
}

impl From<ArityRepr> for Arity {
    fn from(repr: ArityRepr) -> Self {
        match repr {
            ArityRepr::Count(n) => Arity::Fixed(n),
            ArityRepr::Kind(OpenArity::Variable) => Arity::Variable,
            ArityRepr::Kind(OpenArity::Dynamic) => Arity::Dynamic,
        }
    }
}

impl From<Arity> for ArityRepr {
    fn from(arity: Arity) -> Self {
        match arity {
            Arity::Fixed(n) => ArityRepr::Count(n),
            Arity::Variable => ArityRepr::Kind(OpenArity::Variable),
            Arity::Dynamic => ArityRepr::Kind(OpenArity::Dynamic),
        }
    }
}

/// Pinning policy. `Memory` and `Exception` are decided per node instance by
/// a stored flag, so they travel through import/export as an attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pinned {
    Yes,
    #[default]
    No,
    Memory,
    Exception,
}

impl Pinned {
    pub fn is_dynamic(self) -> bool {
        matches!(self, Pinned::Memory | Pinned::Exception)
    }
}

/// Marks the attribute that selects an alternate constructor
/// (`prefix + Node` or `Node + suffix`) when it equals `init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Special {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub init: String,
}

impl Special {
    pub fn prefix(prefix: impl Into<String>, init: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()), suffix: None, init: init.into() }
    }

    pub fn suffix(suffix: impl Into<String>, init: impl Into<String>) -> Self {
        Self { prefix: None, suffix: Some(suffix.into()), init: init.into() }
    }
}

/// A declared attribute or constructor-only argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<Special>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl Attr {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            init: None,
            special: None,
            comment: String::new(),
        }
    }

    pub fn with_init(mut self, init: impl Into<String>) -> Self {
        self.init = Some(init.into());
        self
    }

    pub fn with_special(mut self, special: Special) -> Self {
        self.special = Some(special);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// One IR opcode as authored. The name is the catalog key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeSpec {
    /// Parent whose `ins`/`outs` are copied down. Attributes are never inherited.
    pub is_a: Option<String>,
    pub ins: Vec<Input>,
    /// Present iff the node produces a tuple.
    pub outs: Option<Vec<Input>>,
    pub arity: Option<Arity>,
    pub input_name: Option<String>,
    /// Fixed mode expression; `None` means the mode is serialized.
    pub mode: Option<String>,
    pub attrs: Vec<Attr>,
    pub constructor_args: Vec<Attr>,
    pub pinned: Option<Pinned>,
    pub pinned_init: Option<String>,
    pub flags: Vec<String>,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub custom_serializer: bool,
    pub not_yet_implemented: bool,
    pub singleton: bool,
    pub no_constructor: bool,
    pub known_block: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    nodes: BTreeMap<String, NodeSpec>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node type. A name that is already present is rejected.
    pub fn insert(&mut self, name: impl Into<String>, spec: NodeSpec) -> Result<()> {
        let name = name.into();
        if self.nodes.contains_key(&name) {
            return Err(GenError::DuplicateNode(name));
        }
        self.nodes.insert(name, spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.get(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeSpec)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Moves every node of `other` into `self`, rejecting redefinitions.
    pub fn merge(&mut self, other: Catalog) -> Result<()> {
        for (name, spec) in other.nodes {
            self.insert(name, spec)?;
        }
        Ok(())
    }

    /// Parses a JSON object of `name -> NodeSpec`. Errors carry the JSON path
    /// of the offending value.
    pub fn from_json_str(src: &str, origin: &str) -> Result<Self> {
        let de = &mut serde_json::Deserializer::from_str(src);
        serde_path_to_error::deserialize::<_, Catalog>(de).map_err(|err| {
            let path = err.path().to_string();
            GenError::Catalog {
                origin: origin.to_string(),
                message: format!("at JSON path {path} → {}", err.into_inner()),
            }
        })
    }

    /// Loads and merges catalog fragments, in the given order.
    pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut catalog = Catalog::new();
        for path in paths {
            let path = path.as_ref();
            let origin = path.display().to_string();
            let source = std::fs::read_to_string(path).map_err(|error| GenError::Catalog {
                origin: origin.clone(),
                message: error.to_string(),
            })?;
            tracing::debug!(path = %origin, "loading catalog fragment");
            catalog.merge(Self::from_json_str(&source, &origin)?)?;
        }
        Ok(catalog)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|error| GenError::Catalog {
            origin: "<memory>".to_string(),
            message: error.to_string(),
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_accepts_counts_and_keywords() {
        let src = r#"{
            "A": { "arity": 2, "ins": [{"name": "x"}, {"name": "y"}] },
            "B": { "arity": "variable", "input_name": "pred" },
            "C": { "arity": "dynamic" }
        }"#;
        let catalog = Catalog::from_json_str(src, "inline").unwrap();
        assert_eq!(catalog.get("A").unwrap().arity, Some(Arity::Fixed(2)));
        assert_eq!(catalog.get("B").unwrap().arity, Some(Arity::Variable));
        assert_eq!(catalog.get("C").unwrap().arity, Some(Arity::Dynamic));
        assert!(catalog.get("B").unwrap().arity.unwrap().is_open());
    }

    #[test]
    fn attrs_and_special_parse() {
        let src = r#"{
            "Div": {
                "pinned": "exception",
                "outs": [{"name": "M"}],
                "attrs": [
                    {"name": "resmode", "type": "ir_mode*"},
                    {"name": "no_remainder", "type": "int", "init": "0",
                     "special": {"suffix": "RL", "init": "1"}}
                ]
            }
        }"#;
        let catalog = Catalog::from_json_str(src, "inline").unwrap();
        let div = catalog.get("Div").unwrap();
        assert_eq!(div.pinned, Some(Pinned::Exception));
        assert!(div.pinned.unwrap().is_dynamic());
        assert_eq!(div.attrs[1].special, Some(Special::suffix("RL", "1")));
        assert_eq!(div.attrs[1].init.as_deref(), Some("0"));
    }

    #[test]
    fn parse_error_reports_json_path() {
        let src = r#"{ "Bad": { "attrs": [ {"name": "x", "type": 3} ] } }"#;
        let err = Catalog::from_json_str(src, "broken.json").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("broken.json"), "{msg}");
        assert!(msg.contains("Bad.attrs[0].type"), "{msg}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let src = r#"{ "X": { "pinnned": "yes" } }"#;
        assert!(Catalog::from_json_str(src, "typo.json").is_err());
    }

    #[test]
    fn merge_rejects_duplicates() {
        let mut a = Catalog::new();
        a.insert("Jmp", NodeSpec::default()).unwrap();
        let mut b = Catalog::new();
        b.insert("Jmp", NodeSpec::default()).unwrap();
        match a.merge(b) {
            Err(GenError::DuplicateNode(name)) => assert_eq!(name, "Jmp"),
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn json_dump_reloads_identically() {
        let mut catalog = Catalog::new();
        catalog
            .insert(
                "Proj",
                NodeSpec {
                    ins: vec![Input::new("pred", "tuple value")],
                    attrs: vec![Attr::new("proj", "long")],
                    known_block: true,
                    ..NodeSpec::default()
                },
            )
            .unwrap();
        let json = catalog.to_json_pretty().unwrap();
        let back = Catalog::from_json_str(&json, "dump").unwrap();
        assert_eq!(back, catalog);
    }
}
