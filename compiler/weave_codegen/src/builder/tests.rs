use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weave_ir::{DebugLevel, IrModule, RecordingBackend, Signature, Type};

use super::*;
use crate::session::session_active;

fn session(dir: &TempDir) -> ModuleBuilder<RecordingBackend> {
    let config = SessionConfig::new("unit", "m").source_root(dir.path());
    ModuleBuilder::new(RecordingBackend::new("m"), config).unwrap()
}

fn add_sig() -> Signature {
    Signature::new(Type::I64)
        .param("a", Type::I64)
        .param("b", Type::I64)
}

#[test]
fn begin_function_renders_prototype_and_binds_params() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    let f = mb.begin_function("add", &add_sig());

    assert_eq!(mb.source_text(), "int64_t add(int64_t a, int64_t b) {\n");
    assert_eq!(f.name(), "add");
    assert_eq!(mb.param(1).repr(), "b");
    assert_eq!(mb.param(1).ty(), &Type::I64);
    assert_eq!(mb.scope_depth(), 1);
    assert!(mb.block_state().is_open());
    assert_eq!(mb.current_function(), Some(&f));
}

#[test]
fn end_function_closes_the_body() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("add", &add_sig());
    let (a, b) = (mb.param(0), mb.param(1));
    let sum = mb.add(&a, &b);
    mb.return_value(&sum);
    mb.end_function();

    assert_eq!(
        mb.source_text(),
        "int64_t add(int64_t a, int64_t b) {\n    return a + b;\n}\n"
    );
    assert_eq!(mb.scope_depth(), 0);
    assert_eq!(mb.current_function(), None);
}

#[test]
fn build_writes_the_recorded_source() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("nothing", &Signature::new(Type::Void));
    mb.return_();
    mb.end_function();
    let expected_path = dir.path().join("cg_unit").join("m.c");
    assert_eq!(mb.source_path(), expected_path.as_path());

    let compiled = mb.build().unwrap();
    assert!(!session_active());
    assert_eq!(compiled.source_path, expected_path);
    assert_eq!(fs::read_to_string(&compiled.source_path).unwrap(), compiled.source);
    let module: IrModule = compiled.artifact;
    assert_eq!(module.functions.len(), 1);
}

#[test]
fn debug_level_reaches_the_backend() {
    let dir = TempDir::new().unwrap();
    let config = SessionConfig::new("unit", "m")
        .source_root(dir.path())
        .debug_level(DebugLevel::LineTablesOnly);
    let mb = ModuleBuilder::new(RecordingBackend::new("m"), config).unwrap();
    assert_eq!(mb.backend().module().debug_level, DebugLevel::LineTablesOnly);
}

#[test]
fn dropping_the_builder_releases_the_session() {
    let dir = TempDir::new().unwrap();
    {
        let _mb = session(&dir);
        assert!(session_active());
    }
    assert!(!session_active());
    let _again = session(&dir);
}

#[test]
#[should_panic(expected = "already active on this thread")]
fn second_session_on_one_thread_is_a_violation() {
    let dir = TempDir::new().unwrap();
    let _first = session(&dir);
    let _second = session(&dir);
}

#[test]
#[should_panic(expected = "ends on a block without a terminator")]
fn end_function_requires_a_terminator() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("add", &add_sig());
    mb.end_function();
}

#[test]
#[should_panic(expected = "is still being built")]
fn functions_do_not_nest() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("outer", &Signature::new(Type::Void));
    mb.begin_function("inner", &Signature::new(Type::Void));
}

#[test]
#[should_panic(expected = "already has a terminator")]
fn code_after_return_is_a_violation() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("add", &add_sig());
    let (a, b) = (mb.param(0), mb.param(1));
    mb.return_value(&a);
    mb.add(&a, &b);
}

#[test]
#[should_panic(expected = "function 'open' is still open")]
fn build_with_an_open_function_is_a_violation() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("open", &Signature::new(Type::Void));
    let _ = mb.build();
}

#[test]
fn switching_into_a_terminated_block_stays_closed() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    mb.begin_function("f", &Signature::new(Type::Void));
    let entry = mb.backend().current_block().unwrap();
    mb.return_();
    let spare = mb.new_block("spare");
    mb.switch_to(spare);
    assert!(mb.block_state().is_open());
    mb.switch_to(entry);
    assert!(mb.block_state().is_closed());
}

#[test]
fn backend_rejection_is_a_build_error() {
    let dir = TempDir::new().unwrap();
    let mut mb = session(&dir);
    // A block that nothing terminates.
    mb.begin_function("f", &Signature::new(Type::Void));
    mb.new_block("dangling");
    mb.return_();
    mb.end_function();

    let err = mb.build().unwrap_err();
    assert!(matches!(err, BuildError::Backend(_)));
    assert!(err.to_string().contains("dangling"));
}
