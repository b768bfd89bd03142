use pretty_assertions::assert_eq;

use super::*;

fn begin(backend: &mut RecordingBackend, sig: &Signature) -> (FunctionId, BlockId) {
    let func = backend.declare_function("f", sig, Linkage::Defined);
    let entry = backend.append_block(func, "entry");
    backend.position_at_end(entry);
    (func, entry)
}

#[test]
fn allocas_are_hoisted_to_entry_top() {
    let mut be = RecordingBackend::new("m");
    let (func, entry) = begin(&mut be, &Signature::new(Type::I64));
    let one = be.const_int(IntTy::I64, 1);
    let a = be.entry_alloca(func, &Type::I64, "a");
    be.store(&Type::I64, one, a);
    let b = be.entry_alloca(func, &Type::I64, "b");
    be.store(&Type::I64, one, b);
    be.ret(Some(one));

    let block = be.module().block(entry);
    let kinds: Vec<bool> = block
        .insts
        .iter()
        .map(|i| matches!(i.kind, InstKind::Alloca { .. }))
        .collect();
    assert_eq!(kinds, vec![true, true, false, false]);
    assert_eq!(block.body_len(), 2);
    assert_eq!(be.module().function(func).alloca_count, 2);
    assert_eq!(be.module().value(a).ty(), Type::ptr(Type::I64));
}

#[test]
fn blocks_report_their_terminator() {
    let mut be = RecordingBackend::new("m");
    let (func, entry) = begin(&mut be, &Signature::new(Type::Void));
    let next = be.append_block(func, "next");
    assert_eq!(be.current_block(), Some(entry));
    assert!(!be.block_terminated(entry));
    be.br(next);
    assert!(be.block_terminated(entry));
    assert!(!be.block_terminated(next));
}

#[test]
fn instructions_carry_current_location() {
    let mut be = RecordingBackend::new("m");
    let (_, entry) = begin(&mut be, &Signature::new(Type::I64).param("x", Type::I64));
    let scope = be.file_scope();
    let x = be.param(FunctionId::new(0), 0);
    be.set_debug_location(DebugLoc {
        line: 3,
        column: 1,
        scope,
    });
    let sum = be.binary(BinaryOp::Add, &Type::I64, x, x);
    be.set_debug_location(DebugLoc {
        line: 4,
        column: 1,
        scope,
    });
    be.ret(Some(sum));

    let block = be.module().block(entry);
    assert_eq!(block.insts[0].loc.map(|l| l.line), Some(3));
    assert_eq!(block.terminator_loc.map(|l| l.line), Some(4));
    assert_eq!(be.module().location_events.len(), 2);
}

#[test]
fn second_terminator_is_counted_not_applied() {
    let mut be = RecordingBackend::new("m");
    let (_, entry) = begin(&mut be, &Signature::new(Type::Void));
    be.ret(None);
    be.unreachable();
    let block = be.module().block(entry);
    assert_eq!(block.terminator, Some(Terminator::Ret(None)));
    assert_eq!(block.terminator_count, 2);
    assert!(be.finalize().is_err());
}

#[test]
fn finalize_verifies() {
    let mut be = RecordingBackend::new("m");
    let (func, _) = begin(&mut be, &Signature::new(Type::Void));
    let dangling = be.append_block(func, "dangling");
    be.br(dangling);
    let err = be.finalize().err();
    assert!(err.is_some_and(|e| e.diagnostics[0].contains("dangling")));
}

#[test]
fn scopes_form_a_tree() {
    let mut be = RecordingBackend::new("m");
    let sig = Signature::new(Type::Void);
    let (func, _) = begin(&mut be, &sig);
    let fs = be.open_function_scope(func, "f", &sig, 1);
    let inner = be.open_lexical_scope(fs, 2, 1);
    let m = be.module();
    assert_eq!(m.scopes[fs.index()].parent, Some(be.file_scope()));
    assert_eq!(m.scopes[inner.index()].parent, Some(fs));
    assert_eq!(m.scopes[inner.index()].kind, ScopeKind::Lexical);
}

#[test]
fn locals_respect_debug_level() {
    let mut be = RecordingBackend::new("m");
    be.set_debug_level(DebugLevel::LineTablesOnly);
    let (func, _) = begin(&mut be, &Signature::new(Type::Void));
    let slot = be.entry_alloca(func, &Type::I32, "x");
    be.declare_local(be.file_scope(), "x", &Type::I32, 1, slot);
    assert!(be.module().locals.is_empty());
}

#[test]
fn void_call_has_no_result() {
    let mut be = RecordingBackend::new("m");
    let callee = be.declare_function("g", &Signature::new(Type::Void), Linkage::External);
    let _ = begin(&mut be, &Signature::new(Type::Void));
    assert_eq!(be.call(callee, &[], &Type::Void), None);
    let ret = be.call(callee, &[], &Type::I32);
    assert!(ret.is_some());
}
