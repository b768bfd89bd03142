use pretty_assertions::assert_eq;
use weave_ir::{BinaryOp, CmpOp, IntTy, Scalar, UnaryOp};

use super::*;

#[test]
fn integer_arithmetic_wraps_at_width() {
    let max = Scalar::from_bits(IntTy::U8, 255);
    let one = Scalar::u8(1);
    assert_eq!(binary(BinaryOp::Add, max, one), Ok(Scalar::u8(0)));
    assert_eq!(
        binary(BinaryOp::Mul, Scalar::i32(i32::MAX), Scalar::i32(2)),
        Ok(Scalar::i32(-2))
    );
}

#[test]
fn division_follows_signedness() {
    let minus_seven = Scalar::i32(-7);
    assert_eq!(
        binary(BinaryOp::Div, minus_seven, Scalar::i32(2)),
        Ok(Scalar::i32(-3))
    );
    assert_eq!(
        binary(BinaryOp::Rem, minus_seven, Scalar::i32(2)),
        Ok(Scalar::i32(-1))
    );
    let big = Scalar::from_bits(IntTy::U32, 0xFFFF_FFF9);
    assert_eq!(
        binary(BinaryOp::Div, big, Scalar::from_bits(IntTy::U32, 2)),
        Ok(Scalar::from_bits(IntTy::U32, 0x7FFF_FFFC))
    );
    assert_eq!(
        binary(BinaryOp::Div, Scalar::i32(i32::MIN), Scalar::i32(-1)),
        Ok(Scalar::i32(i32::MIN))
    );
}

#[test]
fn division_by_zero_is_an_error() {
    assert_eq!(
        binary(BinaryOp::Rem, Scalar::i64(1), Scalar::i64(0)),
        Err(EvalError::DivisionByZero)
    );
}

#[test]
fn shifts() {
    assert_eq!(
        binary(BinaryOp::Shr, Scalar::i32(-8), Scalar::i32(1)),
        Ok(Scalar::i32(-4))
    );
    assert_eq!(
        binary(
            BinaryOp::Shr,
            Scalar::from_bits(IntTy::U8, 0x80),
            Scalar::u8(7)
        ),
        Ok(Scalar::u8(1))
    );
    assert_eq!(
        binary(BinaryOp::Shl, Scalar::u8(1), Scalar::u8(7)),
        Ok(Scalar::u8(0x80))
    );
}

#[test]
fn comparisons() {
    let lt = |a, b| compare(CmpOp::Lt, a, b);
    assert_eq!(lt(Scalar::i32(-1), Scalar::i32(0)), Ok(Scalar::Bool(true)));
    assert_eq!(
        lt(
            Scalar::from_bits(IntTy::U32, u64::from(u32::MAX)),
            Scalar::from_bits(IntTy::U32, 0)
        ),
        Ok(Scalar::Bool(false))
    );
    assert_eq!(
        compare(CmpOp::Ne, Scalar::F64(f64::NAN), Scalar::F64(f64::NAN)),
        Ok(Scalar::Bool(true))
    );
    assert_eq!(
        compare(CmpOp::Le, Scalar::F64(f64::NAN), Scalar::F64(1.0)),
        Ok(Scalar::Bool(false))
    );
}

#[test]
fn mixed_operands_are_malformed() {
    assert!(matches!(
        binary(BinaryOp::Add, Scalar::i32(1), Scalar::i64(1)),
        Err(EvalError::Malformed(_))
    ));
    assert!(matches!(
        binary(BinaryOp::Shl, Scalar::F64(1.0), Scalar::F64(1.0)),
        Err(EvalError::Malformed(_))
    ));
}

#[test]
fn unary_ops() {
    assert_eq!(unary(UnaryOp::Neg, Scalar::i64(5)), Ok(Scalar::i64(-5)));
    assert_eq!(unary(UnaryOp::Not, Scalar::Bool(true)), Ok(Scalar::Bool(false)));
    assert_eq!(unary(UnaryOp::Not, Scalar::u8(0x0F)), Ok(Scalar::u8(0xF0)));
}

#[test]
fn extension_follows_source_signedness() {
    assert_eq!(
        extend(Scalar::int(IntTy::I8, -1), IntTy::I8, IntTy::I64),
        Ok(Scalar::i64(-1))
    );
    assert_eq!(
        extend(Scalar::u8(0xFF), IntTy::U8, IntTy::I64),
        Ok(Scalar::i64(255))
    );
    assert_eq!(
        extend(Scalar::i64(0x1_0000_0005), IntTy::I64, IntTy::I32),
        Ok(Scalar::i32(5))
    );
}
