//! Shared fixtures for the generator integration tests.

#![allow(dead_code)]

use rulegen_insn::{BinaryOp, CapturedVar, Constant, Insn, InsnGroup, NodeRole, OwnerType, RootKind};

pub const CONTEXT: &str = "rulegen/runtime/Context";
pub const PARSER: &str = "rulegen/runtime/Parser";
pub const ACTIONS: &str = "rulegen/runtime/Actions";

/// Route test logs through the test harness writer.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

pub fn owner() -> OwnerType {
    OwnerType::new("org/demo/CalcParser", Some("CalcParser.java"))
}

/// `ctx.hasError()`, no captures and no special calls.
pub fn plain_action(name: &str) -> InsnGroup {
    let mut builder = InsnGroup::builder(name);
    let ctx = builder.push(Insn::Load(1));
    let call = builder.push_node(
        Insn::invoke_interface(CONTEXT, "hasError", "()Z"),
        NodeRole::Plain,
        &[ctx],
    );
    builder.mark_root(call, RootKind::Action);
    builder.build().expect("plain action")
}

/// `Objects.nonNull(<local 2>)` with local 2 captured.
pub fn capturing_action(name: &str) -> InsnGroup {
    let mut builder = InsnGroup::builder(name);
    let load = builder.push_node(Insn::Load(2), NodeRole::CapturedLoad, &[]);
    let call = builder.push_node(
        Insn::invoke_static("java/util/Objects", "nonNull", "(Ljava/lang/Object;)Z"),
        NodeRole::Plain,
        &[load],
    );
    builder
        .capture(CapturedVar::new(2, "field$0", "Ljava/lang/String;"))
        .mark_root(call, RootKind::Action);
    builder.build().expect("capturing action")
}

/// `Objects.equals(<local 5>, <local 2>)`, captures declared out of slot order.
pub fn two_capture_action(name: &str) -> InsnGroup {
    let mut builder = InsnGroup::builder(name);
    let first = builder.push_node(Insn::Load(5), NodeRole::CapturedLoad, &[]);
    let second = builder.push_node(Insn::Load(2), NodeRole::CapturedLoad, &[]);
    let call = builder.push_node(
        Insn::invoke_static(
            "java/util/Objects",
            "equals",
            "(Ljava/lang/Object;Ljava/lang/Object;)Z",
        ),
        NodeRole::Plain,
        &[first, second],
    );
    builder
        .capture(CapturedVar::new(5, "field$1", "Ljava/lang/Object;"))
        .capture(CapturedVar::new(2, "field$0", "Ljava/lang/String;"))
        .mark_root(call, RootKind::Action);
    builder.build().expect("two-capture action")
}

/// `ctx.getParser().accept(7)` with `accept` context aware.
pub fn context_aware_action(name: &str) -> InsnGroup {
    let mut builder = InsnGroup::builder(name);
    let ctx = builder.push(Insn::Load(1));
    let parser = builder.push_node(
        Insn::invoke_interface(CONTEXT, "getParser", "()Lrulegen/runtime/Parser;"),
        NodeRole::Plain,
        &[ctx],
    );
    let arg = builder.push(Insn::Const(Constant::Int(7)));
    let call = builder.push_node(
        Insn::invoke_virtual(PARSER, "accept", "(I)Z"),
        NodeRole::ContextAwareCall,
        &[parser, arg],
    );
    builder.mark_root(call, RootKind::Action);
    builder.build().expect("context-aware action")
}

/// `DOWN2(UP(x) + x)` where `x = dup 5`: both switches share `const 5`.
pub fn nested_switch_action(name: &str) -> InsnGroup {
    let mut builder = InsnGroup::builder(name);
    let five = builder.push(Insn::Const(Constant::Int(5)));
    let copy = builder.push_node(Insn::Dup, NodeRole::Plain, &[five]);
    let up = builder.push_node(
        Insn::invoke_static(ACTIONS, "UP", "(I)I"),
        NodeRole::ContextSwitch,
        &[copy],
    );
    let sum = builder.push_node(
        Insn::Binary(BinaryOp::Add),
        NodeRole::Plain,
        &[copy, up],
    );
    let down = builder.push_node(
        Insn::invoke_static(ACTIONS, "DOWN2", "(I)I"),
        NodeRole::ContextSwitch,
        &[sum],
    );
    builder.mark_root(down, RootKind::Action);
    builder.build().expect("nested switch action")
}

/// `"seed"` as a variable initializer.
pub fn var_init(name: &str) -> InsnGroup {
    let mut builder = InsnGroup::builder(name);
    let value = builder.push(Insn::Const(Constant::Str("seed".into())));
    builder.mark_root(value, RootKind::VarInit);
    builder.build().expect("var init")
}

/// Names of the hand-off calls in a body, in order.
pub fn hand_offs(code: &[Insn]) -> Vec<String> {
    code.iter()
        .filter_map(|insn| match insn {
            Insn::Invoke { owner, name, .. } if owner.as_str() == "rulegen/runtime/BaseAction" => {
                Some(name.clone())
            }
            _ => None,
        })
        .collect()
}
