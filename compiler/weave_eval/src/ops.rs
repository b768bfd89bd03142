//! Scalar operator semantics.
//!
//! The operand types are a closed set, so dispatch is a direct `match` on
//! the scalar pair. Integer arithmetic wraps at the operand width and
//! follows the signedness of its `IntTy`.

use std::cmp::Ordering;

use weave_ir::{sign_extend, BinaryOp, CmpOp, IntTy, Scalar, UnaryOp};

use crate::error::{EvalError, EvalResult};

fn mismatch(what: &str, lhs: Scalar, rhs: Scalar) -> EvalError {
    EvalError::malformed(format!(
        "{what} on {} and {}",
        lhs.ty(),
        rhs.ty()
    ))
}

pub(crate) fn binary(op: BinaryOp, lhs: Scalar, rhs: Scalar) -> EvalResult<Scalar> {
    match (lhs, rhs) {
        (Scalar::Int { ty, bits: a }, Scalar::Int { ty: rty, bits: b }) if ty == rty => {
            int_binary(op, ty, a, b).map(|bits| Scalar::from_bits(ty, bits))
        }
        (Scalar::Bool(a), Scalar::Bool(b)) => match op {
            BinaryOp::And => Ok(Scalar::Bool(a && b)),
            BinaryOp::Or => Ok(Scalar::Bool(a || b)),
            BinaryOp::Xor => Ok(Scalar::Bool(a ^ b)),
            _ => Err(mismatch(op.symbol(), lhs, rhs)),
        },
        (Scalar::F64(a), Scalar::F64(b)) => float_binary(op, a, b).map(Scalar::F64),
        (Scalar::F32(a), Scalar::F32(b)) => {
            float_binary(op, f64::from(a), f64::from(b)).map(|v| Scalar::F32(v as f32))
        }
        _ => Err(mismatch(op.symbol(), lhs, rhs)),
    }
}

fn int_binary(op: BinaryOp, ty: IntTy, a: u64, b: u64) -> EvalResult<u64> {
    let signed = ty.is_signed();
    let (sa, sb) = (sign_extend(ty, a), sign_extend(ty, b));
    let shift = (b % u64::from(ty.bits())) as u32;
    Ok(match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b & ty.mask() == 0 => {
            return Err(EvalError::DivisionByZero)
        }
        BinaryOp::Div if signed => sa.wrapping_div(sb) as u64,
        BinaryOp::Div => a / b,
        BinaryOp::Rem if signed => sa.wrapping_rem(sb) as u64,
        BinaryOp::Rem => a % b,
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
        BinaryOp::Shl => a.wrapping_shl(shift),
        BinaryOp::Shr if signed => (sa >> shift) as u64,
        BinaryOp::Shr => (a & ty.mask()) >> shift,
    })
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> EvalResult<f64> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Sub => Ok(a - b),
        BinaryOp::Mul => Ok(a * b),
        BinaryOp::Div => Ok(a / b),
        BinaryOp::Rem => Ok(a % b),
        _ => Err(EvalError::malformed(format!(
            "bitwise '{}' on floating-point operands",
            op.symbol()
        ))),
    }
}

pub(crate) fn compare(op: CmpOp, lhs: Scalar, rhs: Scalar) -> EvalResult<Scalar> {
    let ordering = match (lhs, rhs) {
        (Scalar::Int { ty, bits: a }, Scalar::Int { ty: rty, bits: b }) if ty == rty => {
            Some(if ty.is_signed() {
                sign_extend(ty, a).cmp(&sign_extend(ty, b))
            } else {
                a.cmp(&b)
            })
        }
        (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(&b)),
        (Scalar::Ptr(a), Scalar::Ptr(b)) => Some(a.cmp(&b)),
        (Scalar::F64(a), Scalar::F64(b)) => a.partial_cmp(&b),
        (Scalar::F32(a), Scalar::F32(b)) => a.partial_cmp(&b),
        _ => return Err(mismatch(op.symbol(), lhs, rhs)),
    };
    // Unordered (NaN) operands compare unequal and nothing else.
    let result = ordering.map_or(op == CmpOp::Ne, |ord| match op {
        CmpOp::Eq => ord == Ordering::Equal,
        CmpOp::Ne => ord != Ordering::Equal,
        CmpOp::Lt => ord == Ordering::Less,
        CmpOp::Le => ord != Ordering::Greater,
        CmpOp::Gt => ord == Ordering::Greater,
        CmpOp::Ge => ord != Ordering::Less,
    });
    Ok(Scalar::Bool(result))
}

pub(crate) fn unary(op: UnaryOp, operand: Scalar) -> EvalResult<Scalar> {
    match (op, operand) {
        (UnaryOp::Neg, Scalar::Int { ty, bits }) => Ok(Scalar::from_bits(ty, bits.wrapping_neg())),
        (UnaryOp::Neg, Scalar::F64(v)) => Ok(Scalar::F64(-v)),
        (UnaryOp::Neg, Scalar::F32(v)) => Ok(Scalar::F32(-v)),
        (UnaryOp::Not, Scalar::Bool(b)) => Ok(Scalar::Bool(!b)),
        (UnaryOp::Not, Scalar::Int { ty, bits }) => Ok(Scalar::from_bits(ty, !bits)),
        _ => Err(EvalError::malformed(format!(
            "'{}' on {}",
            op.symbol(),
            operand.ty()
        ))),
    }
}

/// Integer width conversion: widening follows `from`'s signedness.
pub(crate) fn extend(value: Scalar, from: IntTy, to: IntTy) -> EvalResult<Scalar> {
    let Scalar::Int { bits, .. } = value else {
        return Err(EvalError::malformed(format!(
            "extend of non-integer {}",
            value.ty()
        )));
    };
    let widened = if from.is_signed() {
        sign_extend(from, bits) as u64
    } else {
        bits & from.mask()
    };
    Ok(Scalar::from_bits(to, widened))
}

#[cfg(test)]
mod tests;
