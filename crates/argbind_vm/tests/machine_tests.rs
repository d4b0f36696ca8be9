//! Machine tests over hand-written instruction streams.

use argbind_core::TextSpan;
use argbind_ir::{Instruction, Op};
use argbind_vm::{Machine, Object, RuntimeError, Value};

fn stream(ops: Vec<Op>) -> Vec<Instruction> {
    ops.into_iter().map(|op| Instruction::new(op, TextSpan::default())).collect()
}

fn set(name: &str) -> Op {
    Op::VariableSet {
        name: name.into(),
        local_only: true,
    }
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Integer).collect()
}

#[test]
fn test_shift_and_pop_from_both_ends() {
    let ops = stream(vec![Op::ArrayShift, set("a"), Op::ArrayPop, set("c"), Op::Dup, set("b"), Op::Pop]);
    let mut machine = Machine::new();
    machine.bind_arguments(&ops, ints(&[1, 2, 3, 4])).unwrap();
    assert_eq!(machine.local("a"), Some(&Value::Integer(1)));
    assert_eq!(machine.local("c"), Some(&Value::Integer(4)));
    assert_eq!(machine.local("b"), Some(&Value::array(ints(&[2, 3]))));
    assert_eq!(machine.stack_depth(), 0);
}

#[test]
fn test_shift_from_empty_yields_nil() {
    let ops = stream(vec![Op::ArrayShift, set("a"), Op::Pop]);
    let mut machine = Machine::new();
    machine.bind_arguments(&ops, Vec::new()).unwrap();
    assert_eq!(machine.local("a"), Some(&Value::Nil));
}

#[test]
fn test_conditional_default() {
    let ops = stream(vec![
        Op::ArrayIsEmpty,
        Op::If,
        Op::PushInt(7),
        Op::Else,
        Op::ArrayShift,
        Op::End,
        set("b"),
        Op::Pop,
    ]);

    let mut machine = Machine::new();
    machine.bind_arguments(&ops, Vec::new()).unwrap();
    assert_eq!(machine.local("b"), Some(&Value::Integer(7)));

    let mut machine = Machine::new();
    machine.bind_arguments(&ops, ints(&[3])).unwrap();
    assert_eq!(machine.local("b"), Some(&Value::Integer(3)));
}

#[test]
fn test_keyword_hash_is_copied() {
    let ops = stream(vec![
        Op::StageKeywordHash,
        Op::HashDelete { name: "a".into() },
        set("a"),
        Op::CheckExtraKeywords,
        Op::Pop,
        Op::Pop,
    ]);
    let keywords = Value::keywords([("a", Value::Integer(1))]);
    let mut machine = Machine::new();
    machine.bind_arguments(&ops, vec![keywords.clone()]).unwrap();
    assert_eq!(machine.local("a"), Some(&Value::Integer(1)));
    assert_eq!(keywords, Value::keywords([("a", Value::Integer(1))]));
}

#[test]
fn test_missing_and_unknown_keywords() {
    let ops = stream(vec![
        Op::StageKeywordHash,
        Op::HashDelete { name: "a".into() },
        set("a"),
        Op::CheckExtraKeywords,
        Op::Pop,
        Op::Pop,
    ]);

    let mut machine = Machine::new();
    let err = machine.bind_arguments(&ops, Vec::new()).unwrap_err();
    assert_eq!(err, RuntimeError::MissingKeyword { name: "a".into() });

    let mut machine = Machine::new();
    let args = vec![Value::keywords([("a", Value::Integer(1)), ("z", Value::Integer(2))])];
    let err = machine.bind_arguments(&ops, args).unwrap_err();
    assert_eq!(err.to_string(), "unknown keyword: :z");
}

#[test]
fn test_stage_without_trailing_hash_pushes_empty_hash() {
    let ops = stream(vec![Op::StageKeywordHash, set("opts"), Op::ArrayShift, set("a"), Op::Pop]);
    let mut machine = Machine::new();
    machine.bind_arguments(&ops, ints(&[5])).unwrap();
    assert_eq!(machine.local("opts"), Some(&Value::keywords(Vec::<(&str, Value)>::new())));
    assert_eq!(machine.local("a"), Some(&Value::Integer(5)));
}

#[test]
fn test_to_array_coercion() {
    let ops = stream(vec![Op::ArrayShift, Op::ToArray, Op::ArrayShift, set("b"), Op::Pop, Op::Pop]);

    let mut machine = Machine::new();
    machine.bind_arguments(&ops, vec![Value::Nil]).unwrap();
    assert_eq!(machine.local("b"), Some(&Value::Nil));

    let mut machine = Machine::new();
    let err = machine.bind_arguments(&ops, ints(&[1])).unwrap_err();
    assert_eq!(err.to_string(), "can't convert Integer into Array");
}

#[test]
fn test_attribute_assignment_on_self() {
    let ops = stream(vec![
        Op::ArrayShift,
        Op::PushSelf,
        Op::PushArgc { count: 1 },
        Op::Send {
            message: "x=".into(),
            receiver_is_self: true,
            attr_assign: true,
        },
        Op::Pop,
        Op::Pop,
    ]);
    let mut machine = Machine::with_self(Value::object(Object::new("Point")));
    machine.bind_arguments(&ops, ints(&[4])).unwrap();
    assert_eq!(machine.self_value().inspect(), "#<Point @x=4>");
}

#[test]
fn test_instance_and_global_variables() {
    let ops = stream(vec![
        Op::ArrayShift,
        Op::InstanceVariableSet { name: "@a".into() },
        Op::ArrayShift,
        Op::GlobalVariableSet { name: "$b".into() },
        Op::Pop,
    ]);
    let mut machine = Machine::new();
    machine.assign(&ops, &Value::array(ints(&[1, 2]))).unwrap();
    assert_eq!(machine.self_value().inspect(), "#<main @a=1>");
    assert_eq!(machine.global("$b"), Some(&Value::Integer(2)));
}

#[test]
fn test_assign_wraps_non_arrays() {
    let ops = stream(vec![Op::ArrayShift, set("a"), Op::ArrayShift, set("b"), Op::Pop]);
    let mut machine = Machine::new();
    machine.assign(&ops, &Value::Integer(9)).unwrap();
    assert_eq!(machine.local("a"), Some(&Value::Integer(9)));
    assert_eq!(machine.local("b"), Some(&Value::Nil));
}

#[test]
fn test_unbalanced_stream_is_reported() {
    let ops = stream(vec![Op::ArrayShift, set("a")]);
    let mut machine = Machine::new();
    let err = machine.bind_arguments(&ops, ints(&[1])).unwrap_err();
    assert_eq!(err, RuntimeError::UnbalancedStack { extra: 1 });
    assert!(!err.is_argument_error());
}

#[test]
fn test_create_collections() {
    let ops = stream(vec![
        Op::PushSymbol("k".into()),
        Op::PushInt(1),
        Op::CreateHash { count: 1 },
        set("h"),
        Op::PushInt(1),
        Op::PushString("s".into()),
        Op::CreateArray { count: 2 },
        set("a"),
    ]);
    let mut machine = Machine::new();
    machine.execute(&ops).unwrap();
    assert_eq!(machine.local("h").map(Value::inspect).as_deref(), Some("{k: 1}"));
    assert_eq!(machine.local("a").map(Value::inspect).as_deref(), Some("[1, \"s\"]"));
    let names: Vec<&str> = machine.locals().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["h", "a"]);
}

#[test]
fn test_undefined_variable() {
    let ops = stream(vec![Op::VariableGet { name: "nope".into() }]);
    let mut machine = Machine::new();
    assert_eq!(
        machine.execute(&ops),
        Err(RuntimeError::UndefinedVariable { name: "nope".into() })
    );
}
