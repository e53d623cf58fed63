//! Rendering of the three generated artifacts.
//!
//! Export and import both walk `NormalizedNode::fields`, so the order in which
//! values are written is the order in which they are read back.
use std::collections::HashMap;

use serde::Serialize;
use tera::{Context, Tera, Value};

use crate::error::Result;
use crate::normalize::{InitArg, NormalizedAttr, NormalizedNode, SpecialConstructor};
use crate::preprocess::Preprocessed;

// ————————————————————————————————————————————————————————————————————————————
// TEMPLATES
// ————————————————————————————————————————————————————————————————————————————

const EXPORT_TEMPLATE: &str = r#"{% for node in nodes %}
	case iro_{{ node.name }}:
{%- if not node.fixed_mode %}
		write_mode(env, get_irn_mode(irn));
{%- endif %}
{%- for field in node.fields %}
		{{ field.write }}
{%- endfor %}
		break;
{%- endfor %}
"#;

const IMPORT_TEMPLATE: &str = r#"{% for node in nodes %}
	case iro_{{ node.name }}:
	{
{%- if not node.fixed_mode %}
		ir_mode *mode = read_mode(env);
{%- endif %}
{%- for field in node.fields %}
		{{ field.read }}
{%- endfor %}
{%- for special in node.special_constructors %}
		if ({{ special.attr }} == {{ special.value }})
			newnode = new_r_{{ special.constructor }}(current_ir_graph{{ node | block }}{{ node.arguments | args }});
		else
{%- endfor %}
		newnode = new_r_{{ node.name }}(current_ir_graph{{ node | block }}{{ node.arguments | args }});
{%- for init in node.init_args %}
		{{ init.setter }}(newnode, {{ init.value }});
{%- endfor %}
		break;
	}
{%- endfor %}
"#;

const LEXER_TEMPLATE: &str =
    "{% for node in nodes %}\tINSERT(\"{{ node.name }}\", tt_iro, iro_{{ node.name }});\n{% endfor %}";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Export,
    Import,
    Lexer,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Export, ArtifactKind::Import, ArtifactKind::Lexer];

    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Export => "gen_irio_export.inl",
            ArtifactKind::Import => "gen_irio_import.inl",
            ArtifactKind::Lexer => "gen_irio_lex.inl",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub contents: String,
}

/// What the templates see of a node.
#[derive(Serialize)]
struct NodeView<'a> {
    name: &'a str,
    fixed_mode: bool,
    known_block: bool,
    fields: Vec<&'a NormalizedAttr>,
    arguments: &'a [String],
    init_args: &'a [InitArg],
    special_constructors: &'a [SpecialConstructor],
}

impl<'a> From<&'a NormalizedNode> for NodeView<'a> {
    fn from(node: &'a NormalizedNode) -> Self {
        Self {
            name: &node.name,
            fixed_mode: node.has_fixed_mode(),
            known_block: node.known_block,
            fields: node.fields().collect(),
            arguments: &node.arguments,
            init_args: &node.init_args,
            special_constructors: &node.special_constructors,
        }
    }
}

pub struct Emitter {
    tera: Tera,
}

// ————————————————————————————————————————————————————————————————————————————
// FILTERS
// ————————————————————————————————————————————————————————————————————————————

/// `["a", "b"] | args` → `", a, b"`; empty lists render as nothing.
fn args_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let items = value.as_array().ok_or_else(|| tera::Error::msg("args filter requires a list"))?;
    let mut out = String::new();
    for item in items {
        let arg = item.as_str().ok_or_else(|| tera::Error::msg("args filter requires a list of strings"))?;
        out.push_str(", ");
        out.push_str(arg);
    }
    Ok(Value::String(out))
}

/// Block argument of a constructor call: the block of the first predecessor,
/// unless the node knows its block itself.
fn block_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let known = value
        .get("known_block")
        .and_then(Value::as_bool)
        .ok_or_else(|| tera::Error::msg("block filter requires a node"))?;
    let arg = if known { "" } else { ", get_node(env, preds[0])" };
    Ok(Value::String(arg.to_string()))
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Emitter {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("args", args_filter);
        tera.register_filter("block", block_filter);
        tera.add_raw_templates(vec![
            (ArtifactKind::Export.file_name(), EXPORT_TEMPLATE),
            (ArtifactKind::Import.file_name(), IMPORT_TEMPLATE),
            (ArtifactKind::Lexer.file_name(), LEXER_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    pub fn render(&self, kind: ArtifactKind, pre: &Preprocessed) -> Result<String> {
        let nodes: Vec<NodeView<'_>> = match kind {
            ArtifactKind::Export => pre.export_nodes().map(NodeView::from).collect(),
            ArtifactKind::Import => pre.import_nodes().map(NodeView::from).collect(),
            ArtifactKind::Lexer => pre.lexer_nodes().map(NodeView::from).collect(),
        };
        let mut context = Context::new();
        context.insert("nodes", &nodes);
        Ok(self.tera.render(kind.file_name(), &context)?)
    }

    /// Renders all three artifacts. They only read the frozen catalog, so they
    /// run in parallel.
    pub fn render_all(&self, pre: &Preprocessed) -> Result<Vec<Artifact>> {
        let (export, (import, lexer)) = rayon::join(
            || self.render(ArtifactKind::Export, pre),
            || {
                rayon::join(
                    || self.render(ArtifactKind::Import, pre),
                    || self.render(ArtifactKind::Lexer, pre),
                )
            },
        );
        Ok(vec![
            Artifact { kind: ArtifactKind::Export, contents: export? },
            Artifact { kind: ArtifactKind::Import, contents: import? },
            Artifact { kind: ArtifactKind::Lexer, contents: lexer? },
        ])
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
