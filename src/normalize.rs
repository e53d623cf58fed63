//! Node normalization: raw `NodeSpec` → flat `NormalizedNode`.
//!
//! Every piece of information the templates need is computed here, once:
//! inherited inputs, defaults, the derived tuple mode, the injected pin-state
//! attribute, the constructor argument list, post-construction setters and
//! the specialized constructor. No normalized node refers back to its parent.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::catalog::{Arity, Attr, Catalog, Input, NodeSpec, Pinned, Special};
use crate::codec::CodecTable;
use crate::diagnostics::Diagnostics;
use crate::error::{GenError, Result};

/// Name of the attribute injected for dynamically pinned nodes.
pub const PIN_STATE_ATTR: &str = "state";
pub const PIN_STATE_TYPE: &str = "op_pin_state";
const PIN_STATE_SETTER: &str = "set_irn_pinned";
/// Mode of every node that declares outputs.
pub const TUPLE_MODE: &str = "mode_T";

/// Locals the import template declares itself; attributes may not shadow them.
const RESERVED_LOCALS: &[&str] = &[
    "env",
    "irn",
    "newnode",
    "preds",
    "prednodes",
    "numpreds",
    "current_ir_graph",
];

static C_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// An attribute or constructor-only argument with its codec attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedAttr {
    pub name: String,
    pub ty: String,
    pub init: Option<String>,
    pub special: Option<Special>,
    /// Import statement; declares a local named `name`.
    pub read: String,
    /// Export statement, already applied to the node's accessor.
    pub write: String,
    pub supported: bool,
}

/// A setter applied to the freshly constructed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitArg {
    pub value: String,
    pub setter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialConstructor {
    pub constructor: String,
    pub attr: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedNode {
    pub name: String,
    pub ins: Vec<Input>,
    pub outs: Option<Vec<Input>>,
    pub arity: Arity,
    pub input_name: Option<String>,
    pub mode: Option<String>,
    pub pinned: Pinned,
    pub attrs: Vec<NormalizedAttr>,
    pub constructor_args: Vec<NormalizedAttr>,
    /// Arguments of `new_r_<name>` after the graph and block arguments.
    pub arguments: Vec<String>,
    pub init_args: Vec<InitArg>,
    pub special_constructors: Vec<SpecialConstructor>,
    pub flags: Vec<String>,
    pub is_abstract: bool,
    pub custom_serializer: bool,
    pub singleton: bool,
    pub no_constructor: bool,
    pub known_block: bool,
}

impl NormalizedNode {
    pub fn has_fixed_mode(&self) -> bool {
        self.mode.is_some()
    }

    /// Attributes followed by constructor-only arguments: the order in which
    /// both export and import handle them.
    pub fn fields(&self) -> impl Iterator<Item = &NormalizedAttr> {
        self.attrs.iter().chain(self.constructor_args.iter())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NORMALIZATION
// ————————————————————————————————————————————————————————————————————————————

pub fn normalize(
    name: &str,
    spec: &NodeSpec,
    catalog: &Catalog,
    codecs: &CodecTable,
    diags: &mut Diagnostics,
) -> Result<NormalizedNode> {
    // 1) inheritance: copy the parent's inputs/outputs, nothing else
    let mut ins = spec.ins.clone();
    let mut outs = spec.outs.clone();
    if let Some(parent_name) = &spec.is_a {
        let parent = catalog.get(parent_name).ok_or_else(|| GenError::UnknownParent {
            node: name.to_string(),
            parent: parent_name.clone(),
        })?;
        if let Some(grandparent) = &parent.is_a {
            return Err(GenError::shape(
                name,
                format!("parent {parent_name} itself inherits from {grandparent}; only one level is supported"),
            ));
        }
        ins = parent.ins.clone();
        if parent.outs.is_some() {
            outs = parent.outs.clone();
        }
    }

    // 2) defaults
    let arity = spec.arity.unwrap_or(Arity::Fixed(ins.len()));
    let pinned = spec.pinned.unwrap_or_default();

    // 3) tuple nodes always have mode_T
    let mode = if outs.is_some() { Some(TUPLE_MODE.to_string()) } else { spec.mode.clone() };

    // 4) dynamic pin state is serialized like any other attribute
    let mut attrs = spec.attrs.clone();
    if pinned.is_dynamic() {
        inject_pin_state(&mut attrs, spec.pinned_init.as_deref());
    }

    // 5) shape
    validate(name, spec, &ins, pinned, mode.is_some(), &attrs)?;

    // 6-8) constructor arguments, setters, specialized constructor
    let mut arguments: Vec<String> = (0..ins.len()).map(|i| format!("prednodes[{i}]")).collect();
    if arity.is_open() {
        let i = ins.len();
        arguments.push(format!("numpreds - {}", i + 1));
        arguments.push(format!("prednodes + {i}"));
    }
    if mode.is_none() {
        arguments.push("mode".to_string());
    }

    let mut init_args = Vec::new();
    let mut special_constructors: Vec<SpecialConstructor> = Vec::new();
    let mut normalized_attrs = Vec::with_capacity(attrs.len());
    for attr in &attrs {
        normalized_attrs.push(prepare_attr(name, attr, codecs, diags));
        if let Some(special) = &attr.special {
            if attr.init.is_none() {
                return Err(GenError::SpecialWithoutInit { node: name.to_string(), attr: attr.name.clone() });
            }
            if !special_constructors.is_empty() {
                return Err(GenError::MultipleSpecial { node: name.to_string() });
            }
            special_constructors.push(SpecialConstructor {
                constructor: special_constructor_name(name, &attr.name, special)?,
                attr: attr.name.clone(),
                value: special.init.clone(),
            });
        } else if attr.init.is_some() {
            init_args.push(InitArg { value: attr.name.clone(), setter: setter_name(name, attr) });
        } else {
            arguments.push(attr.name.clone());
        }
    }

    let constructor_args = spec
        .constructor_args
        .iter()
        .map(|arg| {
            arguments.push(arg.name.clone());
            prepare_attr(name, arg, codecs, diags)
        })
        .collect();

    Ok(NormalizedNode {
        name: name.to_string(),
        ins,
        outs,
        arity,
        input_name: spec.input_name.clone(),
        mode,
        pinned,
        attrs: normalized_attrs,
        constructor_args,
        arguments,
        init_args,
        special_constructors,
        flags: spec.flags.clone(),
        is_abstract: spec.is_abstract,
        custom_serializer: spec.custom_serializer,
        singleton: spec.singleton,
        no_constructor: spec.no_constructor,
        known_block: spec.known_block,
    })
}

/// Adds the `state` attribute unless the description already declares it;
/// in that case only a missing initializer is filled in.
fn inject_pin_state(attrs: &mut Vec<Attr>, pinned_init: Option<&str>) {
    if let Some(existing) = attrs.iter_mut().find(|a| a.name == PIN_STATE_ATTR) {
        if existing.init.is_none() {
            existing.init = pinned_init.map(str::to_string);
        }
        return;
    }
    let mut state = Attr::new(PIN_STATE_ATTR, PIN_STATE_TYPE);
    state.init = pinned_init.map(str::to_string);
    attrs.push(state);
}

fn validate(
    name: &str,
    spec: &NodeSpec,
    ins: &[Input],
    pinned: Pinned,
    fixed_mode: bool,
    attrs: &[Attr],
) -> Result<()> {
    if !C_IDENT.is_match(name) {
        return Err(GenError::shape(name, "node name is not a C identifier"));
    }
    if let Some(bad) = ins.iter().find(|input| !C_IDENT.is_match(&input.name)) {
        return Err(GenError::shape(name, format!("input name {:?} is not a C identifier", bad.name)));
    }
    if let Some(Arity::Fixed(n)) = spec.arity {
        if n != ins.len() {
            return Err(GenError::shape(name, format!("declares arity {n} but has {} inputs", ins.len())));
        }
    }
    if spec.arity.is_some_and(Arity::is_open) && spec.input_name.is_none() {
        return Err(GenError::shape(name, "variable or dynamic arity requires input_name"));
    }
    if spec.pinned_init.is_some() && !pinned.is_dynamic() {
        return Err(GenError::shape(name, "has pinned_init but is not dynamically pinned"));
    }

    let mut seen = std::collections::BTreeSet::new();
    for field in attrs.iter().chain(spec.constructor_args.iter()) {
        if !C_IDENT.is_match(&field.name) {
            return Err(GenError::shape(name, format!("attribute name {:?} is not a C identifier", field.name)));
        }
        if RESERVED_LOCALS.contains(&field.name.as_str()) {
            return Err(GenError::shape(name, format!("attribute {} shadows a local of the import code", field.name)));
        }
        if !fixed_mode && field.name == "mode" {
            return Err(GenError::shape(name, "attribute mode clashes with the serialized node mode"));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(GenError::shape(name, format!("attribute {} is declared twice", field.name)));
        }
    }
    Ok(())
}

fn prepare_attr(node: &str, attr: &Attr, codecs: &CodecTable, diags: &mut Diagnostics) -> NormalizedAttr {
    let codec = codecs.resolve(&attr.ty, &attr.name, node, diags);
    let accessor = format!("get_{node}_{}(irn)", attr.name);
    NormalizedAttr {
        name: attr.name.clone(),
        ty: attr.ty.clone(),
        init: attr.init.clone(),
        special: attr.special.clone(),
        write: codec.write_with(&accessor),
        read: codec.read,
        supported: codec.supported,
    }
}

fn setter_name(node: &str, attr: &Attr) -> String {
    if attr.ty == PIN_STATE_TYPE {
        PIN_STATE_SETTER.to_string()
    } else {
        format!("set_{node}_{}", attr.name)
    }
}

fn special_constructor_name(node: &str, attr: &str, special: &Special) -> Result<String> {
    match (&special.prefix, &special.suffix) {
        (Some(prefix), _) => Ok(format!("{prefix}{node}")),
        (None, Some(suffix)) => Ok(format!("{node}{suffix}")),
        (None, None) => Err(GenError::shape(
            node,
            format!("special entry of attribute {attr} has neither prefix nor suffix"),
        )),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FIRM_CODECS;

    fn run(name: &str, catalog: &Catalog) -> Result<NormalizedNode> {
        let mut diags = Diagnostics::new();
        normalize(name, catalog.get(name).unwrap(), catalog, &FIRM_CODECS, &mut diags)
    }

    fn single(name: &str, spec: NodeSpec) -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert(name, spec).unwrap();
        catalog
    }

    #[test]
    fn example_node_with_one_input_and_attribute() {
        let catalog = single(
            "Example",
            NodeSpec {
                ins: vec![Input::new("a", "")],
                mode: Some("mode_Is".into()),
                attrs: vec![Attr::new("n", "int")],
                ..NodeSpec::default()
            },
        );
        let node = run("Example", &catalog).unwrap();
        assert_eq!(node.arguments, ["prednodes[0]", "n"]);
        assert!(node.init_args.is_empty());
        assert!(node.special_constructors.is_empty());
        assert_eq!(node.attrs.len(), 1);
        assert_eq!(node.attrs[0].read, "int n = (int) read_long(env);");
        assert_eq!(node.attrs[0].write, r#"fprintf(env->file, "%d ", get_Example_n(irn));"#);
        assert_eq!(node.arity, Arity::Fixed(1));
        assert_eq!(node.pinned, Pinned::No);
    }

    #[test]
    fn inheritance_copies_inputs_and_outputs_only() {
        let mut catalog = Catalog::new();
        catalog
            .insert(
                "Binop",
                NodeSpec {
                    is_abstract: true,
                    ins: vec![Input::new("left", ""), Input::new("right", "")],
                    outs: Some(vec![Input::new("res", "")]),
                    attrs: vec![Attr::new("never_inherited", "int")],
                    ..NodeSpec::default()
                },
            )
            .unwrap();
        catalog.insert("Add", NodeSpec { is_a: Some("Binop".into()), ..NodeSpec::default() }).unwrap();
        let add = run("Add", &catalog).unwrap();
        let names: Vec<_> = add.ins.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["left", "right"]);
        assert!(add.outs.is_some());
        assert!(add.attrs.is_empty());
        assert!(!add.is_abstract);
        assert_eq!(add.mode.as_deref(), Some(TUPLE_MODE));
        assert_eq!(add.arity, Arity::Fixed(2));
    }

    #[test]
    fn unknown_parent_is_fatal() {
        let catalog = single("Orphan", NodeSpec { is_a: Some("Nobody".into()), ..NodeSpec::default() });
        assert!(matches!(run("Orphan", &catalog), Err(GenError::UnknownParent { .. })));
    }

    #[test]
    fn two_level_inheritance_is_rejected() {
        let mut catalog = Catalog::new();
        catalog.insert("A", NodeSpec::default()).unwrap();
        catalog.insert("B", NodeSpec { is_a: Some("A".into()), ..NodeSpec::default() }).unwrap();
        catalog.insert("C", NodeSpec { is_a: Some("B".into()), ..NodeSpec::default() }).unwrap();
        assert!(matches!(run("C", &catalog), Err(GenError::Shape { .. })));
    }

    #[test]
    fn variable_arity_and_serialized_mode() {
        let catalog = single(
            "Return",
            NodeSpec {
                ins: vec![Input::new("mem", "")],
                arity: Some(Arity::Variable),
                input_name: Some("res".into()),
                ..NodeSpec::default()
            },
        );
        let node = run("Return", &catalog).unwrap();
        assert_eq!(node.arguments, ["prednodes[0]", "numpreds - 2", "prednodes + 1", "mode"]);
        assert!(!node.has_fixed_mode());
    }

    #[test]
    fn dynamic_pinning_injects_state_once() {
        let plain = single(
            "Div",
            NodeSpec { pinned: Some(Pinned::Exception), outs: Some(vec![]), ..NodeSpec::default() },
        );
        let node = run("Div", &plain).unwrap();
        assert_eq!(node.attrs.iter().filter(|a| a.name == PIN_STATE_ATTR).count(), 1);
        // no initializer: passed to the constructor
        assert_eq!(node.arguments.last().map(String::as_str), Some("state"));

        let explicit = single(
            "Call",
            NodeSpec {
                pinned: Some(Pinned::Memory),
                pinned_init: Some("op_pin_state_pinned".into()),
                outs: Some(vec![]),
                attrs: vec![Attr::new("state", "op_pin_state")],
                ..NodeSpec::default()
            },
        );
        let node = run("Call", &explicit).unwrap();
        let states: Vec<_> = node.attrs.iter().filter(|a| a.name == PIN_STATE_ATTR).collect();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].init.as_deref(), Some("op_pin_state_pinned"));
        assert_eq!(node.init_args, [InitArg { value: "state".into(), setter: "set_irn_pinned".into() }]);
        assert!(!node.arguments.contains(&"state".to_string()));
    }

    #[test]
    fn static_pinning_adds_nothing() {
        let catalog = single("Jmp", NodeSpec { pinned: Some(Pinned::Yes), ..NodeSpec::default() });
        assert!(run("Jmp", &catalog).unwrap().attrs.is_empty());
    }

    #[test]
    fn initialized_attrs_become_setters() {
        let catalog = single(
            "Cond",
            NodeSpec {
                ins: vec![Input::new("selector", "")],
                outs: Some(vec![Input::new("false", ""), Input::new("true", "")]),
                attrs: vec![Attr::new("jmp_pred", "cond_jmp_predicate").with_init("COND_JMP_PRED_NONE")],
                ..NodeSpec::default()
            },
        );
        let node = run("Cond", &catalog).unwrap();
        assert_eq!(node.arguments, ["prednodes[0]"]);
        assert_eq!(node.init_args, [InitArg { value: "jmp_pred".into(), setter: "set_Cond_jmp_pred".into() }]);
    }

    #[test]
    fn constructor_args_follow_attributes() {
        let catalog = single(
            "Load",
            NodeSpec {
                ins: vec![Input::new("mem", ""), Input::new("ptr", "")],
                outs: Some(vec![Input::new("M", "")]),
                pinned: Some(Pinned::Exception),
                pinned_init: Some("flags & cons_floats ? op_pin_state_floats : op_pin_state_pinned".into()),
                attrs: vec![Attr::new("mode", "ir_mode*")],
                constructor_args: vec![Attr::new("flags", "ir_cons_flags")],
                ..NodeSpec::default()
            },
        );
        let node = run("Load", &catalog).unwrap();
        assert_eq!(node.arguments, ["prednodes[0]", "prednodes[1]", "mode", "flags"]);
        let order: Vec<_> = node.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(order, ["mode", "state", "flags"]);
        assert!(node.constructor_args[0].read.contains("get_cons_flags"));
    }

    #[test]
    fn special_attribute_yields_alternate_constructor() {
        let catalog = single(
            "Div",
            NodeSpec {
                outs: Some(vec![]),
                attrs: vec![Attr::new("no_remainder", "int").with_init("0").with_special(Special::suffix("RL", "1"))],
                ..NodeSpec::default()
            },
        );
        let node = run("Div", &catalog).unwrap();
        assert_eq!(
            node.special_constructors,
            [SpecialConstructor { constructor: "DivRL".into(), attr: "no_remainder".into(), value: "1".into() }]
        );
        // neither a constructor argument nor a setter
        assert!(node.arguments.is_empty());
        assert!(node.init_args.is_empty());

        let prefixed = single(
            "Const",
            NodeSpec {
                mode: Some("mode_Is".into()),
                attrs: vec![Attr::new("kind", "int").with_init("0").with_special(Special::prefix("Small", "1"))],
                ..NodeSpec::default()
            },
        );
        assert_eq!(run("Const", &prefixed).unwrap().special_constructors[0].constructor, "SmallConst");
    }

    #[test]
    fn special_without_init_is_fatal() {
        let catalog = single(
            "Div",
            NodeSpec {
                attrs: vec![Attr::new("no_remainder", "int").with_special(Special::suffix("RL", "1"))],
                ..NodeSpec::default()
            },
        );
        assert!(matches!(run("Div", &catalog), Err(GenError::SpecialWithoutInit { .. })));
    }

    #[test]
    fn two_special_attributes_are_fatal() {
        let catalog = single(
            "Div",
            NodeSpec {
                attrs: vec![
                    Attr::new("a", "int").with_init("0").with_special(Special::suffix("A", "1")),
                    Attr::new("b", "int").with_init("0").with_special(Special::suffix("B", "1")),
                ],
                ..NodeSpec::default()
            },
        );
        assert!(matches!(run("Div", &catalog), Err(GenError::MultipleSpecial { .. })));
    }

    #[test]
    fn special_without_affix_is_fatal() {
        let special = Special { prefix: None, suffix: None, init: "1".into() };
        let catalog = single(
            "Div",
            NodeSpec {
                attrs: vec![Attr::new("a", "int").with_init("0").with_special(special)],
                ..NodeSpec::default()
            },
        );
        assert!(matches!(run("Div", &catalog), Err(GenError::Shape { .. })));
    }

    #[test]
    fn shape_violations_are_fatal() {
        let cases = [
            NodeSpec { arity: Some(Arity::Fixed(3)), ins: vec![Input::new("a", "")], ..NodeSpec::default() },
            NodeSpec { pinned: Some(Pinned::Yes), pinned_init: Some("x".into()), ..NodeSpec::default() },
            NodeSpec { attrs: vec![Attr::new("x", "int"), Attr::new("x", "long")], ..NodeSpec::default() },
            NodeSpec {
                attrs: vec![Attr::new("x", "int")],
                constructor_args: vec![Attr::new("x", "int")],
                ..NodeSpec::default()
            },
            NodeSpec { attrs: vec![Attr::new("mode", "ir_mode*")], ..NodeSpec::default() },
            NodeSpec { attrs: vec![Attr::new("newnode", "int")], ..NodeSpec::default() },
            NodeSpec { attrs: vec![Attr::new("not valid", "int")], ..NodeSpec::default() },
            NodeSpec { ins: vec![Input::new("1st", "")], ..NodeSpec::default() },
            NodeSpec { attrs: vec![Attr::new("current_ir_graph", "int")], ..NodeSpec::default() },
            NodeSpec {
                ins: vec![Input::new("mem", "")],
                arity: Some(Arity::Variable),
                ..NodeSpec::default()
            },
            NodeSpec { arity: Some(Arity::Dynamic), ..NodeSpec::default() },
        ];
        for spec in cases {
            let catalog = single("Broken", spec.clone());
            assert!(matches!(run("Broken", &catalog), Err(GenError::Shape { .. })), "{spec:?}");
        }
    }

    #[test]
    fn unsupported_type_is_reported_not_fatal() {
        let catalog = single(
            "Asm",
            NodeSpec { mode: Some("mode_T".into()), attrs: vec![Attr::new("text", "ident*")], ..NodeSpec::default() },
        );
        let mut diags = Diagnostics::new();
        let node = normalize("Asm", catalog.get("Asm").unwrap(), &catalog, &FIRM_CODECS, &mut diags).unwrap();
        assert_eq!(diags.len(), 1);
        assert!(!node.attrs[0].supported);
        assert_eq!(node.attrs[0].write, "// BAD: ident*");
    }
}
