use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weave_ir::{InstKind, IntTy, NativeFn, RecordingBackend, Signature, Type, ValueId};

use super::*;
use crate::{SessionConfig, Variable};

fn session(dir: &TempDir) -> ModuleBuilder<RecordingBackend> {
    let config = SessionConfig::new("unit", "values").source_root(dir.path());
    ModuleBuilder::new(RecordingBackend::new("values"), config).unwrap()
}

fn named(repr: &str) -> Value {
    Value::new(ValueId::new(0), Type::I64, repr)
}

#[test]
fn bare_repr_strips_one_enclosing_pair() {
    assert_eq!(named("(a + b)").bare_repr(), "a + b");
    assert_eq!(named("((a + b) * c)").bare_repr(), "(a + b) * c");
    assert_eq!(named("(a) + (b)").bare_repr(), "(a) + (b)");
    assert_eq!(named("acc").bare_repr(), "acc");
    assert_eq!(named("((int64_t)x)").bare_repr(), "(int64_t)x");
}

#[test]
fn literals_render_in_their_type() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    assert_eq!(mb.i32(-5).repr(), "-5");
    assert_eq!(mb.int(IntTy::U8, 300).repr(), "44");
    assert_eq!(mb.u64(u64::MAX).repr(), "18446744073709551615");
    assert_eq!(mb.true_().ty(), &Type::BOOL);
    assert_eq!(mb.false_().repr(), "false");
    assert_eq!(mb.f64(1.5).repr(), "1.5");
}

#[test]
fn expressions_nest_with_parentheses() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("f", &Signature::new(Type::Void).param("a", Type::I64));
    let a = mb.param(0);
    let two = mb.i64(2);
    let sum = mb.add(&a, &two);
    let product = mb.mul(&sum, &a);
    assert_eq!(product.repr(), "((a + 2) * a)");

    let lt = mb.lt(&product, &two);
    let ge = mb.ge(&a, &two);
    let both = mb.and(&lt, &ge);
    let negated = mb.not(&both);
    assert_eq!(negated.repr(), "!((((a + 2) * a) < 2) && (a >= 2))");
    assert_eq!(negated.ty(), &Type::BOOL);

    let shifted = mb.shl(&a, &two);
    let masked = mb.bit_and(&shifted, &a);
    assert_eq!(masked.repr(), "((a << 2) & a)");
    assert_eq!(mb.neg(&a).repr(), "-a");
}

#[test]
fn cast_int_extends_and_renders_a_cast() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("f", &Signature::new(Type::Void).param("x", Type::I32));
    let x = mb.param(0);
    let wide = mb.cast_int(&x, IntTy::I64);
    assert_eq!(wide.repr(), "((int64_t)x)");
    assert_eq!(wide.ty(), &Type::I64);

    let same = mb.cast_int(&x, IntTy::I32);
    assert_eq!(same, x);

    let module = mb.backend().module();
    let extends = module
        .blocks
        .iter()
        .flat_map(|b| &b.insts)
        .filter(|i| matches!(i.kind, InstKind::Extend { from: IntTy::I32, to: IntTy::I64, .. }))
        .count();
    assert_eq!(extends, 1);
}

#[test]
fn calls_render_as_statements() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    let print_sig = Signature::new(Type::Void).param("v", Type::I64);
    let print = mb.declare_external_function("print", &print_sig, NativeFn::new(|_| None));
    let twice_sig = Signature::new(Type::I64).param("v", Type::I64);
    let twice = mb.declare_external_function(
        "twice",
        &twice_sig,
        NativeFn::new(|args| args.first().copied()),
    );

    mb.begin_function("f", &Signature::new(Type::Void));
    let one = mb.i64(1);
    let doubled = mb.call(&twice, &[one]);
    let Some(doubled) = doubled else {
        panic!("twice returns a value");
    };
    assert_eq!(doubled.repr(), "twice_ret");
    assert_eq!(mb.call(&print, &[doubled]), None);
    mb.return_();
    mb.end_function();

    assert_eq!(
        mb.source_text(),
        "void f() {\n    twice_ret = twice(1);\n    print(twice_ret);\n    return;\n}\n"
    );
}

#[test]
#[should_panic(expected = "'twice' takes 1 arguments, 0 given")]
fn call_arity_is_checked() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    let sig = Signature::new(Type::I64).param("v", Type::I64);
    let twice = mb.declare_external_function("twice", &sig, NativeFn::new(|_| None));
    mb.begin_function("f", &Signature::new(Type::Void));
    mb.call(&twice, &[]);
}

#[test]
#[should_panic(expected = "type mismatch in argument 'v' of 'twice': expected int64_t, found bool")]
fn call_argument_types_are_checked() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    let sig = Signature::new(Type::I64).param("v", Type::I64);
    let twice = mb.declare_external_function("twice", &sig, NativeFn::new(|_| None));
    mb.begin_function("f", &Signature::new(Type::Void));
    let t = mb.true_();
    mb.call(&twice, &[t]);
}

#[test]
fn load_and_store_go_through_pointers() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("f", &Signature::new(Type::I32));
    let x = Variable::new(&mut mb, "x", Type::I32);
    let p = x.address(&mb);
    assert_eq!(p.ty(), &Type::ptr(Type::I32));
    let seven = mb.i32(7);
    mb.store(&seven, &p);
    let loaded = mb.load(&p);
    assert_eq!(loaded.repr(), "val0");
    mb.return_value(&loaded);
    mb.end_function();

    assert_eq!(
        mb.source_text(),
        "int32_t f() {\n    int32_t x;\n    *&x = 7;\n    val0 = *&x;\n    return val0;\n}\n"
    );
}

#[test]
#[should_panic(expected = "type mismatch in '+': expected int64_t, found int32_t")]
fn operands_must_share_a_type() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("f", &Signature::new(Type::Void));
    let a = mb.i64(1);
    let b = mb.i32(1);
    mb.add(&a, &b);
}

#[test]
#[should_panic(expected = "'<<' requires an integer, found double")]
fn bitwise_operators_need_integers() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("f", &Signature::new(Type::Void));
    let a = mb.f64(1.0);
    mb.shl(&a, &a);
}

#[test]
#[should_panic(expected = "store requires a pointer, found int64_t")]
fn store_needs_a_pointer() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("f", &Signature::new(Type::Void));
    let a = mb.i64(1);
    mb.store(&a, &a);
}
