use pretty_assertions::assert_eq;
use weave_ir::{Linkage, RecordingBackend, ScopeKind, Type};

use super::*;

fn recorder(backend: &RecordingBackend) -> SourceRecorder {
    SourceRecorder::new(backend.file_scope(), false)
}

#[test]
fn lines_are_numbered_from_one() {
    let be = RecordingBackend::new("m");
    let mut src = recorder(&be);
    assert_eq!(src.current_line(), 0);
    assert_eq!(src.add_line("a;"), 1);
    assert_eq!(src.add_line("b;"), 2);
    assert_eq!(src.line_count(), 2);
    assert_eq!(src.text(), "a;\nb;\n");
}

#[test]
fn indentation_follows_scope_depth() {
    let mut be = RecordingBackend::new("m");
    let mut src = recorder(&be);
    src.add_line("while (x) {");
    src.enter_scope(&mut be);
    src.add_line("if (y) {");
    src.enter_scope(&mut be);
    src.add_line("break;");
    src.leave_scope();
    src.add_line("}");
    src.leave_scope();
    src.add_line("}");
    assert_eq!(
        src.text(),
        "while (x) {\n    if (y) {\n        break;\n    }\n}\n"
    );
    assert_eq!(src.depth(), 0);
}

#[test]
fn locations_use_the_innermost_scope() {
    let mut be = RecordingBackend::new("m");
    let sig = Signature::new(Type::Void);
    let func = be.declare_function("f", &sig, Linkage::Defined);
    let mut src = recorder(&be);

    let line = src.add_line("void f() {");
    let fn_scope = src.enter_function_scope(&mut be, func, "f", &sig);
    assert_eq!(src.location(line).scope, fn_scope);

    src.add_line("if (c) {");
    let block = src.enter_scope(&mut be);
    let inner = src.add_line("return;");
    assert_eq!(
        src.location(inner),
        DebugLoc {
            line: 3,
            column: 1,
            scope: block
        }
    );

    let scopes = &be.module().scopes;
    assert_eq!(scopes[block.index()].parent, Some(fn_scope));
    assert_eq!(scopes[block.index()].line, 2);
    assert_eq!(
        scopes[fn_scope.index()].kind,
        ScopeKind::Function { name: "f".into() }
    );

    src.leave_scope();
    src.leave_function_scope();
    assert_eq!(src.current_scope(), be.file_scope());
}

#[test]
#[should_panic(expected = "scope stack underflow")]
fn leaving_the_file_scope_is_a_violation() {
    let be = RecordingBackend::new("m");
    let mut src = recorder(&be);
    src.leave_scope();
}
