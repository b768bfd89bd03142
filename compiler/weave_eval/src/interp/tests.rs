use pretty_assertions::assert_eq;
use weave_ir::{
    Backend, BinaryOp, CmpOp, IntTy, IrModule, Linkage, NativeFn, RecordingBackend, Scalar,
    Signature, Type,
};

use super::*;

/// `int64_t count(int64_t n) { i = 0; while (i < n) i += 1; return i; }`
fn counting_module() -> IrModule {
    let mut be = RecordingBackend::new("count");
    let sig = Signature::new(Type::I64).param("n", Type::I64);
    let f = be.declare_function("count", &sig, Linkage::Defined);
    let entry = be.append_block(f, "entry");
    let guard = be.append_block(f, "while_continue");
    let body = be.append_block(f, "while_iteration");
    let exit = be.append_block(f, "while_break");
    be.position_at_end(entry);
    let n = be.param(f, 0);
    let slot = be.entry_alloca(f, &Type::I64, "i");
    let zero = be.const_int(IntTy::I64, 0);
    be.store(&Type::I64, zero, slot);
    be.br(guard);

    be.position_at_end(guard);
    let i = be.load(&Type::I64, slot, "i");
    let cond = be.compare(CmpOp::Lt, &Type::I64, i, n);
    be.cond_br(cond, body, exit);

    be.position_at_end(body);
    let i = be.load(&Type::I64, slot, "i");
    let one = be.const_int(IntTy::I64, 1);
    let next = be.binary(BinaryOp::Add, &Type::I64, i, one);
    be.store(&Type::I64, next, slot);
    be.br(guard);

    be.position_at_end(exit);
    let i = be.load(&Type::I64, slot, "i");
    be.ret(Some(i));
    be.finalize().unwrap()
}

#[test]
fn runs_a_loop() {
    let program = Program::new(counting_module());
    assert_eq!(program.call("count", &[Scalar::i64(7)]), Ok(Some(Scalar::i64(7))));
    assert_eq!(program.call("count", &[Scalar::i64(-3)]), Ok(Some(Scalar::i64(0))));
}

#[test]
fn step_limit_stops_long_loops() {
    let program = Program::with_config(counting_module(), EvalConfig::default().max_steps(100));
    assert_eq!(
        program.call("count", &[Scalar::i64(1_000_000)]),
        Err(EvalError::StepLimit { limit: 100 })
    );
}

#[test]
fn arguments_are_checked() {
    let program = Program::new(counting_module());
    assert_eq!(
        program.call("count", &[]),
        Err(EvalError::ArgumentCount {
            func: "count".into(),
            expected: 1,
            found: 0,
        })
    );
    assert_eq!(
        program.call("count", &[Scalar::i32(1)]),
        Err(EvalError::ArgumentMismatch {
            func: "count".into(),
            index: 0,
            expected: Type::I64,
            found: Type::I32,
        })
    );
    assert_eq!(
        program.call("missing", &[]),
        Err(EvalError::UnknownFunction {
            name: "missing".into()
        })
    );
}

fn calls_external() -> IrModule {
    let mut be = RecordingBackend::new("ext");
    let ext_sig = Signature::new(Type::I32).param("x", Type::I32);
    let ext = be.declare_function("twice", &ext_sig, Linkage::External);
    let f = be.declare_function("f", &ext_sig, Linkage::Defined);
    let entry = be.append_block(f, "entry");
    be.position_at_end(entry);
    let x = be.param(f, 0);
    let r = be.call(ext, &[x], &Type::I32);
    be.ret(r);
    be.finalize().unwrap()
}

#[test]
fn external_symbols_resolve_at_invocation() {
    let mut program = Program::new(calls_external());
    assert_eq!(
        program.call("f", &[Scalar::i32(4)]),
        Err(EvalError::UnresolvedSymbol {
            name: "twice".into()
        })
    );
    program.register_symbol(
        "twice",
        NativeFn::new(|args| Some(Scalar::i32(args[0].as_i64().unwrap() as i32 * 2))),
    );
    assert_eq!(program.call("f", &[Scalar::i32(4)]), Ok(Some(Scalar::i32(8))));
}

#[test]
fn host_return_type_is_checked() {
    let mut program = Program::new(calls_external());
    program.register_symbol("twice", NativeFn::new(|_| None));
    assert_eq!(
        program.call("f", &[Scalar::i32(4)]),
        Err(EvalError::NativeReturn {
            name: "twice".into(),
            expected: Type::I32,
            found: Type::Void,
        })
    );
}

#[test]
fn unreachable_block_traps() {
    let mut be = RecordingBackend::new("trap");
    let f = be.declare_function("f", &Signature::new(Type::Void), Linkage::Defined);
    let entry = be.append_block(f, "entry");
    be.position_at_end(entry);
    be.unreachable();
    let program = Program::new(be.finalize().unwrap());
    assert_eq!(
        program.call("f", &[]),
        Err(EvalError::Unreachable {
            func: "f".into(),
            block: "entry".into(),
        })
    );
}

#[test]
fn array_elements_are_addressed_by_stride() {
    // int32_t f(int64_t i) { int32_t a[4]; a[i] = 9; return a[i]; }
    let mut be = RecordingBackend::new("arr");
    let arr = Type::array(Type::I32, 4);
    let sig = Signature::new(Type::I32).param("i", Type::I64);
    let f = be.declare_function("f", &sig, Linkage::Defined);
    let entry = be.append_block(f, "entry");
    be.position_at_end(entry);
    let i = be.param(f, 0);
    let slot = be.entry_alloca(f, &arr, "a");
    let addr = be.element_address(&arr, slot, i);
    let nine = be.const_int(IntTy::I32, 9);
    be.store(&Type::I32, nine, addr);
    let addr = be.element_address(&arr, slot, i);
    let v = be.load(&Type::I32, addr, "a_i");
    be.ret(Some(v));
    let program = Program::new(be.finalize().unwrap());

    assert_eq!(program.call("f", &[Scalar::i64(3)]), Ok(Some(Scalar::i32(9))));
    assert!(matches!(
        program.call("f", &[Scalar::i64(4)]),
        Err(EvalError::OutOfBounds { .. })
    ));
    assert!(matches!(
        program.call("f", &[Scalar::i64(-100)]),
        Err(EvalError::OutOfBounds { .. })
    ));
}

#[test]
fn recursion_releases_frames() {
    // int64_t down(int64_t n) { int64_t t; if (n == 0) return 0; return down(n - 1); }
    let mut be = RecordingBackend::new("rec");
    let sig = Signature::new(Type::I64).param("n", Type::I64);
    let f = be.declare_function("down", &sig, Linkage::Defined);
    let entry = be.append_block(f, "entry");
    let base = be.append_block(f, "base");
    let step = be.append_block(f, "step");
    be.position_at_end(entry);
    let _slot = be.entry_alloca(f, &Type::I64, "t");
    let n = be.param(f, 0);
    let zero = be.const_int(IntTy::I64, 0);
    let is_zero = be.compare(CmpOp::Eq, &Type::I64, n, zero);
    be.cond_br(is_zero, base, step);
    be.position_at_end(base);
    be.ret(Some(zero));
    be.position_at_end(step);
    let one = be.const_int(IntTy::I64, 1);
    let m = be.binary(BinaryOp::Sub, &Type::I64, n, one);
    let r = be.call(f, &[m], &Type::I64);
    be.ret(r);

    let config = EvalConfig::default().stack_size(64);
    let program = Program::with_config(be.finalize().unwrap(), config);
    assert_eq!(program.call("down", &[Scalar::i64(3)]), Ok(Some(Scalar::i64(0))));
    assert!(matches!(
        program.call("down", &[Scalar::i64(100)]),
        Err(EvalError::StackOverflow { .. })
    ));
}
