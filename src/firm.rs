//! The libFirm node catalog.
//!
//! Only what import/export generation looks at is recorded: inputs, outputs,
//! arity, mode, attributes, pinning and the handful of flags that decide
//! which artifacts a node ends up in.
use crate::catalog::{Arity, Attr, Catalog, Input, NodeSpec, Pinned, Special};
use crate::error::Result;

/// Fluent builder for one catalog entry.
#[derive(Default)]
struct Op(NodeSpec);

impl Op {
    fn new() -> Self {
        Self::default()
    }

    fn is_a(mut self, parent: &str) -> Self {
        self.0.is_a = Some(parent.to_string());
        self
    }

    fn ins(mut self, ins: &[(&str, &str)]) -> Self {
        self.0.ins = ins.iter().map(|(name, comment)| Input::new(*name, *comment)).collect();
        self
    }

    fn outs(mut self, outs: &[(&str, &str)]) -> Self {
        self.0.outs = Some(outs.iter().map(|(name, comment)| Input::new(*name, *comment)).collect());
        self
    }

    fn arity(mut self, arity: Arity, input_name: &str) -> Self {
        self.0.arity = Some(arity);
        self.0.input_name = Some(input_name.to_string());
        self
    }

    fn mode(mut self, mode: &str) -> Self {
        self.0.mode = Some(mode.to_string());
        self
    }

    fn attr(mut self, attr: Attr) -> Self {
        self.0.attrs.push(attr);
        self
    }

    fn constructor_arg(mut self, arg: Attr) -> Self {
        self.0.constructor_args.push(arg);
        self
    }

    fn pinned(mut self, pinned: Pinned) -> Self {
        self.0.pinned = Some(pinned);
        self
    }

    fn pinned_init(mut self, init: &str) -> Self {
        self.0.pinned_init = Some(init.to_string());
        self
    }

    fn flags(mut self, flags: &[&str]) -> Self {
        self.0.flags = flags.iter().map(|f| f.to_string()).collect();
        self
    }

    fn abstract_base(mut self) -> Self {
        self.0.is_abstract = true;
        self
    }

    fn custom_serializer(mut self) -> Self {
        self.0.custom_serializer = true;
        self
    }

    fn singleton(mut self) -> Self {
        self.0.singleton = true;
        self
    }

    fn no_constructor(mut self) -> Self {
        self.0.no_constructor = true;
        self
    }

    fn known_block(mut self) -> Self {
        self.0.known_block = true;
        self
    }
}

const MEM: (&str, &str) = ("mem", "memory dependency");
const M: (&str, &str) = ("M", "memory result");
const X_REGULAR: (&str, &str) = ("X_regular", "control flow when no exception occurs");
const X_EXCEPT: (&str, &str) = ("X_except", "control flow when exception occured");
const CONS_FLAGS_PINNED: &str = "flags & cons_floats ? op_pin_state_floats : op_pin_state_pinned";

fn binop() -> Op {
    Op::new().is_a("Binop")
}

fn unop() -> Op {
    Op::new().ins(&[("op", "operand")]).pinned(Pinned::No)
}

fn ops() -> Vec<(&'static str, Op)> {
    vec![
        (
            "Binop",
            Op::new()
                .abstract_base()
                .ins(&[("left", "first operand"), ("right", "second operand")])
                .pinned(Pinned::No),
        ),
        ("Add", binop().flags(&["commutative"])),
        (
            "Alloc",
            Op::new()
                .ins(&[MEM, ("size", "size of the block in bytes")])
                .outs(&[M, ("res", "pointer to newly allocated memory")])
                .attr(Attr::new("alignment", "unsigned").with_comment("alignment of the memory block"))
                .flags(&["uses_memory"])
                .pinned(Pinned::Yes),
        ),
        (
            "Anchor",
            Op::new()
                .mode("mode_ANY")
                .arity(Arity::Variable, "anchor")
                .flags(&["dump_noblock"])
                .pinned(Pinned::Yes)
                .known_block()
                .singleton()
                .no_constructor()
                .custom_serializer(),
        ),
        ("And", binop().flags(&["commutative"])),
        (
            "ASM",
            Op::new()
                .mode("mode_T")
                .arity(Arity::Variable, "input")
                .ins(&[MEM])
                .flags(&["keep", "uses_memory"])
                .pinned(Pinned::Memory)
                .pinned_init("op_pin_state_pinned")
                .attr(Attr::new("input_constraints", "ir_asm_constraint*"))
                .attr(Attr::new("n_output_constraints", "size_t"))
                .attr(Attr::new("output_constraints", "ir_asm_constraint*"))
                .attr(Attr::new("n_clobbers", "size_t"))
                .attr(Attr::new("clobbers", "ident**"))
                .attr(Attr::new("text", "ident*"))
                .no_constructor()
                .custom_serializer(),
        ),
        (
            "Bad",
            Op::new().flags(&["start_block", "dump_noblock"]).pinned(Pinned::Yes).known_block(),
        ),
        (
            "Block",
            Op::new()
                .mode("mode_BB")
                .known_block()
                .pinned(Pinned::Yes)
                .arity(Arity::Variable, "cfgpred")
                .attr(Attr::new("entity", "ir_entity*").with_init("NULL"))
                .custom_serializer(),
        ),
        (
            "Builtin",
            Op::new()
                .ins(&[MEM])
                .arity(Arity::Variable, "param")
                .outs(&[M])
                .flags(&["uses_memory"])
                .attr(Attr::new("kind", "ir_builtin_kind").with_comment("kind of builtin"))
                .attr(Attr::new("type", "ir_type*").with_comment("method type for the builtin call"))
                .pinned(Pinned::Memory)
                .pinned_init("op_pin_state_pinned"),
        ),
        (
            "Call",
            Op::new()
                .ins(&[MEM, ("ptr", "pointer to called code")])
                .arity(Arity::Variable, "param")
                .outs(&[M, ("T_result", "tuple containing all results"), X_REGULAR, X_EXCEPT])
                .flags(&["fragile", "uses_memory"])
                .attr(Attr::new("type", "ir_type*").with_comment("type of the call"))
                .pinned(Pinned::Memory)
                .pinned_init("op_pin_state_pinned"),
        ),
        (
            "Cmp",
            binop().mode("mode_b").attr(Attr::new("relation", "ir_relation").with_comment("Comparison relation")),
        ),
        (
            "Cond",
            Op::new()
                .ins(&[("selector", "condition parameter")])
                .outs(&[
                    ("false", "control flow if operand is \"false\""),
                    ("true", "control flow if operand is \"true\""),
                ])
                .flags(&["cfopcode", "forking"])
                .pinned(Pinned::Yes)
                .attr(
                    Attr::new("jmp_pred", "cond_jmp_predicate")
                        .with_init("COND_JMP_PRED_NONE")
                        .with_comment("can indicate the most likely jump"),
                ),
        ),
        (
            "Confirm",
            Op::new()
                .ins(&[("value", "value to express a constraint for"), ("bound", "value to compare against")])
                .mode("get_irn_mode(irn_value)")
                .flags(&["highlevel"])
                .pinned(Pinned::Yes)
                .attr(Attr::new("relation", "ir_relation").with_comment("relation of value to bound")),
        ),
        (
            "Const",
            Op::new()
                .flags(&["constlike", "start_block"])
                .mode("get_tarval_mode(tarval)")
                .known_block()
                .pinned(Pinned::No)
                .attr(Attr::new("tarval", "ir_tarval*").with_comment("constant value (a tarval object)")),
        ),
        ("Conv", unop()),
        (
            "CopyB",
            Op::new()
                .ins(&[MEM, ("dst", "destination address"), ("src", "source address")])
                .outs(&[M, X_REGULAR, X_EXCEPT])
                .flags(&["fragile", "uses_memory"])
                .attr(Attr::new("type", "ir_type*").with_comment("type of copied data"))
                .pinned(Pinned::Memory)
                .pinned_init("op_pin_state_pinned"),
        ),
        (
            "Deleted",
            Op::new().mode("mode_Bad").pinned(Pinned::Yes).no_constructor().custom_serializer(),
        ),
        (
            "Div",
            Op::new()
                .ins(&[MEM, ("left", "first operand"), ("right", "second operand")])
                .outs(&[M, ("res", "result of computation"), X_REGULAR, X_EXCEPT])
                .flags(&["fragile", "uses_memory"])
                .attr(Attr::new("resmode", "ir_mode*").with_comment("mode of the result value"))
                .attr(
                    Attr::new("no_remainder", "int")
                        .with_init("0")
                        .with_special(Special::suffix("RL", "1")),
                )
                .pinned(Pinned::Exception),
        ),
        (
            "Dummy",
            Op::new()
                .flags(&["cfopcode", "start_block", "constlike", "dump_noblock"])
                .known_block()
                .pinned(Pinned::Yes),
        ),
        (
            "End",
            Op::new()
                .mode("mode_X")
                .pinned(Pinned::Yes)
                .arity(Arity::Dynamic, "keepalive")
                .flags(&["cfopcode"])
                .known_block()
                .singleton(),
        ),
        ("Eor", binop().flags(&["commutative"])),
        (
            "Free",
            Op::new()
                .ins(&[MEM, ("ptr", "pointer to the object to free")])
                .mode("mode_M")
                .flags(&["uses_memory"])
                .pinned(Pinned::Yes),
        ),
        ("Id", Op::new().ins(&[("pred", "the value which is returned unchanged")]).pinned(Pinned::No)),
        (
            "IJmp",
            Op::new()
                .mode("mode_X")
                .pinned(Pinned::Yes)
                .ins(&[("target", "target address of the jump")])
                .flags(&["cfopcode", "forking", "keep", "unknown_jump"]),
        ),
        (
            "InstOf",
            Op::new()
                .ins(&[("store", "memory dependency"), ("obj", "pointer to object being queried")])
                .outs(&[M, ("res", "checked object pointer"), X_REGULAR, X_EXCEPT])
                .flags(&["highlevel"])
                .attr(Attr::new("type", "ir_type*").with_comment("type to check ptr for"))
                .pinned(Pinned::Memory)
                .pinned_init("op_pin_state_floats"),
        ),
        ("Jmp", Op::new().mode("mode_X").pinned(Pinned::Yes).flags(&["cfopcode"])),
        (
            "Load",
            Op::new()
                .ins(&[MEM, ("ptr", "address to load from")])
                .outs(&[M, ("res", "result of load operation"), X_REGULAR, X_EXCEPT])
                .flags(&["fragile", "uses_memory"])
                .pinned(Pinned::Exception)
                .pinned_init(CONS_FLAGS_PINNED)
                .attr(Attr::new("mode", "ir_mode*").with_comment("mode of the value to be loaded"))
                .constructor_arg(
                    Attr::new("flags", "ir_cons_flags").with_comment("specifies alignment, volatility and pin state"),
                ),
        ),
        ("Minus", unop()),
        (
            "Mod",
            Op::new()
                .ins(&[MEM, ("left", "first operand"), ("right", "second operand")])
                .outs(&[M, ("res", "result of computation"), X_REGULAR, X_EXCEPT])
                .flags(&["fragile", "uses_memory"])
                .attr(Attr::new("resmode", "ir_mode*").with_comment("mode of the result"))
                .pinned(Pinned::Exception),
        ),
        ("Mul", binop().flags(&["commutative"])),
        ("Mulh", binop().flags(&["commutative"])),
        (
            "Mux",
            Op::new()
                .ins(&[
                    ("sel", "value making the output selection"),
                    ("false", "selected if sel input is false"),
                    ("true", "selected if sel input is true"),
                ])
                .pinned(Pinned::No),
        ),
        (
            "NoMem",
            Op::new()
                .mode("mode_M")
                .flags(&["dump_noblock"])
                .pinned(Pinned::Yes)
                .known_block()
                .singleton(),
        ),
        ("Not", unop()),
        ("Or", binop().flags(&["commutative"])),
        (
            "Phi",
            Op::new().pinned(Pinned::Yes).arity(Arity::Variable, "pred").custom_serializer(),
        ),
        (
            "Pin",
            Op::new()
                .ins(&[("op", "value which is pinned")])
                .mode("get_irn_mode(irn_op)")
                .flags(&["highlevel"])
                .pinned(Pinned::Yes),
        ),
        (
            "Proj",
            Op::new()
                .ins(&[("pred", "the tuple value from which a part is extracted")])
                .pinned(Pinned::No)
                .known_block()
                .attr(Attr::new("proj", "long").with_comment("number of tuple component to be extracted")),
        ),
        (
            "Raise",
            Op::new()
                .ins(&[MEM, ("exo_ptr", "pointer to exception object to be thrown")])
                .outs(&[M, ("X", "control flow to exception handler")])
                .flags(&["highlevel", "cfopcode"])
                .pinned(Pinned::Yes),
        ),
        (
            "Return",
            Op::new()
                .ins(&[MEM])
                .arity(Arity::Variable, "res")
                .mode("mode_X")
                .flags(&["cfopcode"])
                .pinned(Pinned::Yes),
        ),
        ("Rotl", binop()),
        (
            "Sel",
            Op::new()
                .ins(&[MEM, ("ptr", "pointer to object to select from")])
                .arity(Arity::Variable, "index")
                .mode("is_Method_type(get_entity_type(entity)) ? mode_P_code : mode_P_data")
                .pinned(Pinned::No)
                .attr(Attr::new("entity", "ir_entity*").with_comment("entity which is selected")),
        ),
        ("Shl", binop()),
        ("Shr", binop()),
        ("Shrs", binop()),
        (
            "Start",
            Op::new()
                .outs(&[
                    ("X_initial_exec", "control flow"),
                    ("M", "initial memory"),
                    ("P_frame_base", "frame base pointer"),
                    ("T_args", "function arguments"),
                ])
                .pinned(Pinned::Yes)
                .flags(&["cfopcode"])
                .singleton()
                .known_block(),
        ),
        (
            "Store",
            Op::new()
                .ins(&[MEM, ("ptr", "address to store to"), ("value", "value to store")])
                .outs(&[M, X_REGULAR, X_EXCEPT])
                .flags(&["fragile", "uses_memory"])
                .pinned(Pinned::Exception)
                .pinned_init(CONS_FLAGS_PINNED)
                .constructor_arg(
                    Attr::new("flags", "ir_cons_flags").with_comment("specifies alignment, volatility and pin state"),
                ),
        ),
        ("Sub", binop()),
        (
            "Switch",
            Op::new()
                .ins(&[("selector", "input selector")])
                .outs(&[("default", "control flow if no other case matches")])
                .flags(&["cfopcode", "forking"])
                .pinned(Pinned::Yes)
                .attr(Attr::new("n_outs", "unsigned").with_comment("number of outputs (including pn_Switch_default)"))
                .attr(
                    Attr::new("table", "ir_switch_table*")
                        .with_comment("table describing mapping from input values to Proj numbers"),
                ),
        ),
        (
            "SymConst",
            Op::new()
                .mode("mode_P")
                .flags(&["constlike", "start_block"])
                .known_block()
                .pinned(Pinned::No)
                .attr(Attr::new("entity", "ir_entity*").with_comment("entity whose address is returned"))
                .custom_serializer()
                .no_constructor(),
        ),
        (
            "Sync",
            Op::new().mode("mode_M").pinned(Pinned::No).arity(Arity::Dynamic, "pred"),
        ),
        (
            "Tuple",
            Op::new().arity(Arity::Variable, "pred").mode("mode_T").pinned(Pinned::No),
        ),
        (
            "Unknown",
            Op::new()
                .known_block()
                .pinned(Pinned::Yes)
                .flags(&["start_block", "constlike", "dump_noblock"]),
        ),
    ]
}

pub fn catalog() -> Result<Catalog> {
    let mut catalog = Catalog::new();
    for (name, op) in ops() {
        catalog.insert(name, op.0)?;
    }
    Ok(catalog)
}
