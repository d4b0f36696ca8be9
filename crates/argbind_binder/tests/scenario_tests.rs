//! End-to-end binding tests.
//!
//! Each test binds a parameter or target list, runs the stream on the
//! machine against concrete arguments, and checks the resulting variables.

use argbind_ast::builder::*;
use argbind_ast::{Expression, ParameterList, TargetList};
use argbind_binder::{bind_parameters, bind_targets, BinderOptions};
use argbind_core::{NameInterner, SpecArena};
use argbind_diagnostics::CompileError;
use argbind_ir::Instruction;
use argbind_vm::{Machine, Object, RuntimeError, Value};

fn compile_with(list: &ParameterList, options: BinderOptions) -> Vec<Instruction> {
    let arena = SpecArena::new();
    let interner = NameInterner::new();
    bind_parameters(&arena, &interner, Some(list), options).unwrap()
}

fn compile(list: &ParameterList) -> Vec<Instruction> {
    compile_with(list, BinderOptions::default())
}

fn call(list: &ParameterList, args: Vec<Value>) -> Result<Machine, RuntimeError> {
    let stream = compile(list);
    let mut machine = Machine::new();
    machine.bind_arguments(&stream, args)?;
    Ok(machine)
}

fn assign(list: &TargetList, value: Value) -> Machine {
    let arena = SpecArena::new();
    let interner = NameInterner::new();
    let stream = bind_targets(&arena, &interner, list).unwrap();
    let mut machine = Machine::new();
    machine.assign(&stream, &value).unwrap();
    machine
}

fn ints(values: &[i64]) -> Value {
    Value::array(values.iter().copied().map(Value::Integer).collect())
}

fn var(machine: &Machine, name: &str) -> String {
    machine
        .local(name)
        .map(Value::inspect)
        .unwrap_or_else(|| format!("<unbound {}>", name))
}

#[test]
fn test_optional_defaults_only_when_missing() {
    let list = params(vec![req("a"), opt("b", int(2))]);

    let machine = call(&list, vec![Value::Integer(9)]).unwrap();
    assert_eq!(var(&machine, "a"), "9");
    assert_eq!(var(&machine, "b"), "2");

    let machine = call(&list, vec![Value::Integer(9), Value::Integer(8)]).unwrap();
    assert_eq!(var(&machine, "b"), "8");
}

#[test]
fn test_rest_between_required() {
    let list = params(vec![req("a"), rest(Some("b")), req("c")]);
    let machine = call(&list, vec![1, 2, 3, 4].into_iter().map(Value::Integer).collect()).unwrap();
    assert_eq!(var(&machine, "a"), "1");
    assert_eq!(var(&machine, "b"), "[2, 3]");
    assert_eq!(var(&machine, "c"), "4");
}

#[test]
fn test_rest_with_too_few_arguments() {
    let list = params(vec![req("a"), rest(Some("b")), req("c")]);
    let machine = call(&list, vec![Value::Integer(1)]).unwrap();
    assert_eq!(var(&machine, "a"), "1");
    assert_eq!(var(&machine, "b"), "[]");
    assert_eq!(var(&machine, "c"), "nil");
}

#[test]
fn test_optional_before_required() {
    let list = params(vec![opt("a", int(1)), req("b")]);

    let machine = call(&list, vec![Value::Integer(5)]).unwrap();
    assert_eq!(var(&machine, "a"), "1");
    assert_eq!(var(&machine, "b"), "5");

    let machine = call(&list, vec![Value::Integer(5), Value::Integer(6)]).unwrap();
    assert_eq!(var(&machine, "a"), "5");
    assert_eq!(var(&machine, "b"), "6");
}

#[test]
fn test_keywords() {
    let list = params(vec![kw("a", None), kw("b", Some(int(5)))]);

    let machine = call(&list, vec![Value::keywords([("a", Value::Integer(1))])]).unwrap();
    assert_eq!(var(&machine, "a"), "1");
    assert_eq!(var(&machine, "b"), "5");

    let args = vec![Value::keywords([("b", Value::Integer(2)), ("a", Value::Integer(1))])];
    let machine = call(&list, args).unwrap();
    assert_eq!(var(&machine, "b"), "2");
}

#[test]
fn test_unknown_keyword() {
    let list = params(vec![kw("a", None), kw("b", Some(int(5)))]);
    let args = vec![Value::keywords([("a", Value::Integer(1)), ("z", Value::Integer(0))])];
    let err = call(&list, args).err().unwrap();
    assert_eq!(err.to_string(), "unknown keyword: :z");
}

#[test]
fn test_missing_keyword() {
    let list = params(vec![req("x"), kw("a", None)]);
    let err = call(&list, vec![Value::Integer(1)]).err().unwrap();
    assert_eq!(err, RuntimeError::MissingKeyword { name: "a".into() });
}

#[test]
fn test_keyword_rest_collects_leftovers_without_touching_caller() {
    let list = params(vec![kw("a", None), kwrest(Some("opts"))]);
    let given = Value::keywords([("a", Value::Integer(1)), ("z", Value::Integer(2))]);
    let machine = call(&list, vec![given.clone()]).unwrap();
    assert_eq!(var(&machine, "a"), "1");
    assert_eq!(var(&machine, "opts"), "{z: 2}");
    assert_eq!(given.inspect(), "{a: 1, z: 2}");
}

#[test]
fn test_keywords_after_rest() {
    let list = params(vec![rest(Some("args")), req("last"), kw("k", Some(nil()))]);
    let args = vec![
        Value::Integer(1),
        Value::Integer(2),
        Value::keywords([("k", Value::symbol("v"))]),
    ];
    let machine = call(&list, args).unwrap();
    assert_eq!(var(&machine, "args"), "[1]");
    assert_eq!(var(&machine, "last"), "2");
    assert_eq!(var(&machine, "k"), ":v");
}

#[test]
fn test_destructuring() {
    let list = params(vec![req("a"), destructure(vec![req("b"), req("c")])]);

    let machine = call(&list, vec![Value::Integer(1), ints(&[2, 3])]).unwrap();
    assert_eq!(var(&machine, "a"), "1");
    assert_eq!(var(&machine, "b"), "2");
    assert_eq!(var(&machine, "c"), "3");

    let machine = call(&list, vec![Value::Integer(1), Value::Nil]).unwrap();
    assert_eq!(var(&machine, "b"), "nil");

    let err = call(&list, vec![Value::Integer(1), Value::Integer(2)]).err().unwrap();
    assert!(matches!(err, RuntimeError::TypeError { .. }));
}

#[test]
fn test_nested_destructuring_with_rest() {
    let list = params(vec![destructure(vec![req("a"), destructure(vec![marker("*b"), req("c")])])]);
    let arg = Value::array(vec![Value::Integer(1), ints(&[2, 3, 4])]);
    let machine = call(&list, vec![arg]).unwrap();
    assert_eq!(var(&machine, "a"), "1");
    assert_eq!(var(&machine, "b"), "[2, 3]");
    assert_eq!(var(&machine, "c"), "4");
}

#[test]
fn test_default_reads_earlier_parameter() {
    let list = params(vec![req("a"), opt("b", call_expr_plus("a", 1))]);
    let machine = call(&list, vec![Value::Integer(2)]).unwrap();
    assert_eq!(var(&machine, "b"), "3");
}

fn call_expr_plus(name: &str, n: i64) -> Expression {
    argbind_ast::builder::call(Some(lvar(name)), "+", vec![int(n)])
}

#[test]
fn test_attribute_parameter_writes_self() {
    let list = params(vec![rest(None), attr_param(Expression::SelfRef, "last=")]);
    let stream = compile(&list);
    let mut machine = Machine::with_self(Value::object(Object::new("Recorder")));
    machine
        .bind_arguments(&stream, vec![Value::Integer(1), Value::Integer(2)])
        .unwrap();
    assert_eq!(machine.self_value().inspect(), "#<Recorder @last=2>");
}

#[test]
fn test_non_local_binding_reassigns_outer_variable() {
    let list = params(vec![req("i")]);
    let stream = compile_with(&list, BinderOptions { local_only: false });
    let mut machine = Machine::new();
    machine.define_local("i", Value::Integer(0));
    machine.push_scope();
    machine.bind_arguments(&stream, vec![Value::Integer(7)]).unwrap();
    assert_eq!(machine.locals().count(), 0);
    machine.pop_scope();
    assert_eq!(var(&machine, "i"), "7");
}

#[test]
fn test_circular_default_is_a_compile_error() {
    let arena = SpecArena::new();
    let interner = NameInterner::new();
    let list = params(vec![opt("a", lvar("a"))]);
    let err = bind_parameters(&arena, &interner, Some(&list), BinderOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::CircularArgumentReference { .. }));
}

#[test]
fn test_multiple_assignment_with_splat() {
    let list = targets(vec![local("a"), splat(Some(local("b"))), local("c")]);
    let machine = assign(&list, ints(&[1, 2, 3, 4, 5]));
    assert_eq!(var(&machine, "a"), "1");
    assert_eq!(var(&machine, "b"), "[2, 3, 4]");
    assert_eq!(var(&machine, "c"), "5");
}

#[test]
fn test_multiple_assignment_nested_and_wrapped() {
    let list = targets(vec![nested(vec![local("a"), local("b")]), ivar_target("@c"), gvar_target("$d")]);
    let machine = assign(&list, Value::array(vec![ints(&[1, 2]), Value::Integer(3)]));
    assert_eq!(var(&machine, "a"), "1");
    assert_eq!(var(&machine, "b"), "2");
    assert_eq!(machine.self_value().inspect(), "#<main @c=3>");
    assert_eq!(machine.global("$d"), Some(&Value::Nil));

    let list = targets(vec![local("x"), local("y")]);
    let machine = assign(&list, Value::Integer(1));
    assert_eq!(var(&machine, "x"), "1");
    assert_eq!(var(&machine, "y"), "nil");
}

#[test]
fn test_binding_is_deterministic() {
    let list = params(vec![
        req("a"),
        opt("b", int(1)),
        rest(Some("c")),
        destructure(vec![req("d"), marker("*e")]),
        kw("f", Some(nil())),
        kwrest(None),
    ]);
    assert_eq!(compile(&list), compile(&list));
}
