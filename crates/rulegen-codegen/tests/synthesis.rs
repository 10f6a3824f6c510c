//! End-to-end synthesis of group units through `process`.

mod common;

use common::*;
use rulegen_codegen::{
    ActionUnits, DefineOutcome, GeneratorConfig, GroupUnitGenerator, LoaderScope, UnitDefinition,
    VarInitUnits,
};
use rulegen_insn::{
    BinaryOp, Constant, Insn, InsnGroup, NodeRole, ReturnKind, RootKind, RuleMethod, TypeName,
};

fn action_generator() -> GroupUnitGenerator<ActionUnits> {
    GroupUnitGenerator::new(ActionUnits, GeneratorConfig::default())
}

fn installed(scope: &LoaderScope, name: &str) -> UnitDefinition {
    scope
        .find(&TypeName::new(name))
        .expect("unit installed")
        .definition
        .clone()
}

fn hand_off(name: &str) -> Vec<Insn> {
    vec![
        Insn::Load(0),
        Insn::Load(1),
        Insn::invoke_virtual(
            "rulegen/runtime/BaseAction",
            name,
            "(Lrulegen/runtime/Context;)Lrulegen/runtime/Context;",
        ),
        Insn::Store(1),
    ]
}

#[test]
fn test_plain_group_keeps_its_body() {
    init_tracing();
    let group = plain_action("Action$Plain");
    let original = group.instructions().to_vec();
    let mut method = RuleMethod::new("Expression", vec![group]);
    let scope = LoaderScope::new();

    let report = action_generator()
        .process(&owner(), &mut method, &scope)
        .unwrap();
    assert_eq!(
        report.units,
        vec![(TypeName::new("org/demo/Action$Plain"), DefineOutcome::Installed)]
    );

    let unit = installed(&scope, "org/demo/Action$Plain");
    assert!(unit.fields.is_empty());
    assert_eq!(unit.super_type.as_str(), "rulegen/runtime/BaseAction");
    assert_eq!(unit.source_file.as_deref(), Some("CalcParser.java"));

    let run = unit.method("run").unwrap();
    assert_eq!(run.desc, "(Lrulegen/runtime/Context;)Z");
    let mut expected = original;
    expected.push(Insn::Return(ReturnKind::Int));
    assert_eq!(run.code, expected);
    assert_eq!((run.max_stack, run.max_locals), (1, 2));

    let group = &method.groups()[0];
    assert!(group.is_frozen());
    assert_eq!(group.unit_type(), Some(&unit.name));
    assert!(group.unit_code().is_some());
}

#[test]
fn test_captured_load_reads_the_field() {
    init_tracing();
    let mut method = RuleMethod::new("Term", vec![capturing_action("Action$Cap")]);
    let scope = LoaderScope::new();

    action_generator()
        .process(&owner(), &mut method, &scope)
        .unwrap();

    let unit = installed(&scope, "org/demo/Action$Cap");
    assert_eq!(unit.fields.len(), 1);
    assert_eq!(unit.fields[0].name, "field$0");
    assert_eq!(unit.fields[0].desc, "Ljava/lang/String;");

    let run = unit.method("run").unwrap();
    assert_eq!(
        run.code,
        vec![
            Insn::Load(0),
            Insn::GetField {
                owner: TypeName::new("org/demo/Action$Cap"),
                name: "field$0".into(),
                desc: "Ljava/lang/String;".into(),
            },
            Insn::invoke_static("java/util/Objects", "nonNull", "(Ljava/lang/Object;)Z"),
            Insn::Return(ReturnKind::Int),
        ]
    );
    // No slot above the parameters is touched any more.
    assert_eq!(run.max_locals, 2);
}

#[test]
fn test_context_aware_call_gets_its_context() {
    init_tracing();
    let mut method = RuleMethod::new("Factor", vec![context_aware_action("Action$Ctx")]);
    let scope = LoaderScope::new();

    action_generator()
        .process(&owner(), &mut method, &scope)
        .unwrap();

    let run = installed(&scope, "org/demo/Action$Ctx")
        .method("run")
        .cloned()
        .unwrap();
    assert_eq!(
        run.code,
        vec![
            Insn::Load(1),
            Insn::invoke_interface(CONTEXT, "getParser", "()Lrulegen/runtime/Parser;"),
            Insn::Dup,
            Insn::Store(2),
            Insn::Const(Constant::Int(7)),
            Insn::Load(2),
            Insn::Load(1),
            Insn::invoke_interface(
                "rulegen/runtime/ContextAware",
                "setContext",
                "(Lrulegen/runtime/Context;)V"
            ),
            Insn::invoke_virtual(PARSER, "accept", "(I)Z"),
            Insn::Return(ReturnKind::Int),
        ]
    );
    assert_eq!(run.max_stack, 4);
    assert_eq!(run.max_locals, 3);
}

#[test]
fn test_single_argument_switch_is_bracketed() {
    init_tracing();
    let mut builder = InsnGroup::builder("Action$Up");
    let value = builder.push(Insn::Const(Constant::Int(1)));
    let switch = builder.push_node(
        Insn::invoke_static(ACTIONS, "UP3", "(I)Z"),
        NodeRole::ContextSwitch,
        &[value],
    );
    builder.mark_root(switch, RootKind::Action);
    let mut method = RuleMethod::new("Sequence", vec![builder.build().unwrap()]);
    let scope = LoaderScope::new();

    action_generator()
        .process(&owner(), &mut method, &scope)
        .unwrap();

    let run = installed(&scope, "org/demo/Action$Up")
        .method("run")
        .cloned()
        .unwrap();
    let mut expected = hand_off("UP3");
    expected.push(Insn::Const(Constant::Int(1)));
    expected.extend(hand_off("DOWN3"));
    expected.push(Insn::Return(ReturnKind::Int));
    assert_eq!(run.code, expected);
    assert_eq!(run.max_stack, 3);
}

#[test]
fn test_switch_without_dependencies_brackets_nothing() {
    init_tracing();
    let mut builder = InsnGroup::builder("Action$Bare");
    let switch = builder.push_node(
        Insn::invoke_static(ACTIONS, "DOWN", "()Z"),
        NodeRole::ContextSwitch,
        &[],
    );
    builder.push_node(Insn::Const(Constant::Int(1)), NodeRole::Plain, &[]);
    builder.mark_root(switch, RootKind::Action);
    let mut method = RuleMethod::new("Empty", vec![builder.build().unwrap()]);
    let scope = LoaderScope::new();

    action_generator()
        .process(&owner(), &mut method, &scope)
        .unwrap();

    let run = installed(&scope, "org/demo/Action$Bare")
        .method("run")
        .cloned()
        .unwrap();
    assert_eq!(hand_offs(&run.code), vec!["DOWN", "UP"]);
    assert_eq!(&run.code[..8], [hand_off("DOWN"), hand_off("UP")].concat().as_slice());
}

#[test]
fn test_switches_sharing_a_dependency_nest() {
    init_tracing();
    let mut method = RuleMethod::new("Nested", vec![nested_switch_action("Action$Nest")]);
    let scope = LoaderScope::new();

    action_generator()
        .process(&owner(), &mut method, &scope)
        .unwrap();

    let run = installed(&scope, "org/demo/Action$Nest")
        .method("run")
        .cloned()
        .unwrap();
    assert_eq!(hand_offs(&run.code), vec!["DOWN2", "UP", "DOWN", "UP2"]);

    let expected = [
        hand_off("DOWN2"),
        hand_off("UP"),
        vec![Insn::Const(Constant::Int(5)), Insn::Dup],
        hand_off("DOWN"),
        vec![Insn::Binary(BinaryOp::Add)],
        hand_off("UP2"),
        vec![Insn::Return(ReturnKind::Int)],
    ]
    .concat();
    assert_eq!(run.code, expected);
    assert_eq!(run.max_stack, 4);
    assert_eq!(run.max_locals, 2);
}

#[test]
fn test_strategies_pick_their_own_groups() {
    init_tracing();
    let mut method = RuleMethod::new(
        "Mixed",
        vec![plain_action("Action$M1"), var_init("VarInit$M2")],
    );
    let scope = LoaderScope::new();

    let actions = action_generator()
        .process(&owner(), &mut method, &scope)
        .unwrap();
    assert_eq!(actions.units.len(), 1);
    assert!(method.groups()[1].unit_type().is_none());

    let var_inits = GroupUnitGenerator::new(VarInitUnits, GeneratorConfig::default())
        .process(&owner(), &mut method, &scope)
        .unwrap();
    assert_eq!(
        var_inits.units,
        vec![(TypeName::new("org/demo/VarInit$M2"), DefineOutcome::Installed)]
    );

    let unit = installed(&scope, "org/demo/VarInit$M2");
    assert_eq!(unit.super_type.as_str(), "rulegen/runtime/BaseVarInit");
    let create = unit.method("create").unwrap();
    assert_eq!(create.desc, "()Ljava/lang/Object;");
    assert_eq!(create.code.last(), Some(&Insn::Return(ReturnKind::Reference)));
    assert_eq!(scope.len(), 2);
}
