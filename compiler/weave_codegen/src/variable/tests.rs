use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weave_ir::{DebugLevel, InstKind, IntTy, RecordingBackend, Signature};

use super::*;
use crate::SessionConfig;

fn session(dir: &TempDir, level: DebugLevel) -> ModuleBuilder<RecordingBackend> {
    let config = SessionConfig::new("unit", "vars")
        .source_root(dir.path())
        .debug_level(level);
    ModuleBuilder::new(RecordingBackend::new("vars"), config).unwrap()
}

#[test]
fn declaration_renders_and_describes_a_local() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir, DebugLevel::Full);
    mb.begin_function("f", &Signature::new(Type::Void));
    let seven = mb.i64(7);
    let acc = Variable::with_value(&mut mb, "acc", &seven);
    let table = Variable::new(&mut mb, "table", Type::array(Type::I32, 4));
    assert_eq!(acc.name(), "acc");
    assert_eq!(table.ty(), &Type::array(Type::I32, 4));
    mb.return_();
    mb.end_function();

    assert_eq!(
        mb.source_text(),
        "void f() {\n    int64_t acc;\n    acc = 7;\n    int32_t table[4];\n    return;\n}\n"
    );
    let locals = &mb.backend().module().locals;
    assert_eq!(locals.len(), 2);
    assert_eq!(locals[0].name, "acc");
    assert_eq!(locals[0].line, 2);
    assert_eq!(locals[1].ty, Type::array(Type::I32, 4));
}

#[test]
fn line_tables_only_declares_no_locals() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir, DebugLevel::LineTablesOnly);
    mb.begin_function("f", &Signature::new(Type::Void));
    let _x = Variable::new(&mut mb, "x", Type::I64);
    mb.return_();
    mb.end_function();
    assert!(mb.backend().module().locals.is_empty());
}

#[test]
fn get_adds_no_line() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir, DebugLevel::Full);
    mb.begin_function("f", &Signature::new(Type::I64));
    let x = Variable::new(&mut mb, "x", Type::I64);
    let lines = mb.line_count();
    let value = x.get(&mut mb);
    assert_eq!(value.repr(), "x");
    assert_eq!(mb.line_count(), lines);
    mb.return_value(&value);
    mb.end_function();
}

#[test]
fn elements_widen_their_index() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir, DebugLevel::Full);
    mb.begin_function(
        "f",
        &Signature::new(Type::U8)
            .param("i", Type::I32)
            .param("j", Type::U16),
    );
    let bytes = Variable::new(&mut mb, "bytes", Type::array(Type::U8, 8));
    let (i, j) = (mb.param(0), mb.param(1));
    let v = mb.int(IntTy::U8, 9);
    bytes.set_elem(&mut mb, &i, &v);
    let read = bytes.elem(&mut mb, &j);
    assert_eq!(read.repr(), "bytes[j]");
    assert_eq!(read.ty(), &Type::U8);
    mb.return_value(&read);
    mb.end_function();

    assert!(mb.source_text().contains("    bytes[i] = 9;\n"));
    let module = mb.backend().module();
    let extends: Vec<(IntTy, IntTy)> = module
        .blocks
        .iter()
        .flat_map(|b| &b.insts)
        .filter_map(|inst| match inst.kind {
            InstKind::Extend { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(extends, vec![(IntTy::I32, IntTy::I64), (IntTy::U16, IntTy::I64)]);
}

#[test]
fn address_width_indices_are_used_directly() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir, DebugLevel::Full);
    mb.begin_function("f", &Signature::new(Type::I64).param("i", Type::I64));
    let xs = Variable::new(&mut mb, "xs", Type::array(Type::I64, 2));
    let i = mb.param(0);
    let read = xs.elem(&mut mb, &i);
    mb.return_value(&read);
    mb.end_function();

    let module = mb.backend().module();
    let has_extend = module
        .blocks
        .iter()
        .flat_map(|b| &b.insts)
        .any(|inst| matches!(inst.kind, InstKind::Extend { .. }));
    assert!(!has_extend);
}

#[test]
#[should_panic(expected = "array 'xs' can only be read by element")]
fn arrays_are_not_read_whole() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir, DebugLevel::Full);
    mb.begin_function("f", &Signature::new(Type::Void));
    let xs = Variable::new(&mut mb, "xs", Type::array(Type::I64, 2));
    xs.get(&mut mb);
}

#[test]
#[should_panic(expected = "'x' is not an array (declared as int64_t)")]
fn scalars_have_no_elements() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir, DebugLevel::Full);
    mb.begin_function("f", &Signature::new(Type::Void));
    let x = Variable::new(&mut mb, "x", Type::I64);
    let zero = mb.i64(0);
    x.elem(&mut mb, &zero);
}

#[test]
#[should_panic(expected = "index into 'xs' requires an integer, found bool")]
fn indices_must_be_integers() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir, DebugLevel::Full);
    mb.begin_function("f", &Signature::new(Type::Void));
    let xs = Variable::new(&mut mb, "xs", Type::array(Type::I64, 2));
    let t = mb.true_();
    xs.elem(&mut mb, &t);
}

#[test]
#[should_panic(expected = "type mismatch in assignment to 'x': expected int64_t, found int32_t")]
fn assignment_types_must_match() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir, DebugLevel::Full);
    mb.begin_function("f", &Signature::new(Type::Void));
    let x = Variable::new(&mut mb, "x", Type::I64);
    let small = mb.i32(1);
    x.set(&mut mb, &small);
}

#[test]
#[should_panic(expected = "variable 'v' cannot have type void")]
fn void_variables_are_a_violation() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir, DebugLevel::Full);
    mb.begin_function("f", &Signature::new(Type::Void));
    Variable::new(&mut mb, "v", Type::Void);
}

#[test]
#[should_panic(expected = "variable 'x' belongs to function 'first'")]
fn variables_do_not_outlive_their_function() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir, DebugLevel::Full);
    mb.begin_function("first", &Signature::new(Type::Void));
    let x = Variable::new(&mut mb, "x", Type::I64);
    mb.return_();
    mb.end_function();

    mb.begin_function("second", &Signature::new(Type::Void));
    x.get(&mut mb);
}
