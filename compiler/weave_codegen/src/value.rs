//! Typed values and the operations that produce them.
//!
//! A [`Value`] pairs a backend operand with its semantic [`Type`] and the
//! text it renders as in the synthetic source. Operations check operand
//! types when they are called, so a mismatched program fails while it is
//! being described rather than when it runs.
//!
//! Arithmetic and comparisons render as parenthesised expressions and do
//! not add lines of their own; the statement that consumes them does, and
//! their instructions are located on that statement's line.
//! Calls and raw pointer loads are statements and add a line.

use weave_ir::{Backend, BinaryOp, CmpOp, IntTy, Scalar, Type, UnaryOp, ValueId};

use crate::builder::{FunctionRef, ModuleBuilder};
use crate::error::{violation, UsageError};

/// Operand id of values that were only rendered, never emitted.
pub(crate) const DETACHED: ValueId = ValueId::new(u32::MAX);

/// An immutable typed value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Value {
    id: ValueId,
    ty: Type,
    repr: String,
}

impl Value {
    pub(crate) fn new(id: ValueId, ty: Type, repr: impl Into<String>) -> Self {
        Self {
            id,
            ty,
            repr: repr.into(),
        }
    }

    pub fn id(&self) -> ValueId {
        self.id
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Synthetic source text of this value.
    pub fn repr(&self) -> &str {
        &self.repr
    }

    /// [`repr`](Self::repr) without one pair of enclosing parentheses.
    pub fn bare_repr(&self) -> &str {
        let s = self.repr.as_str();
        if !(s.starts_with('(') && s.ends_with(')')) {
            return s;
        }
        let mut depth = 0usize;
        for (i, c) in s.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 && i + 1 < s.len() {
                        // `(a) + (b)`: the first group closes early.
                        return s;
                    }
                }
                _ => {}
            }
        }
        &s[1..s.len() - 1]
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.id == DETACHED
    }
}

impl<B: Backend> ModuleBuilder<B> {
    // -- Literals --

    /// Integer literal of type `ty`; `value` wraps to the type's width.
    pub fn int(&mut self, ty: IntTy, value: i64) -> Value {
        let scalar = Scalar::int(ty, value);
        let bits = scalar.as_u64().unwrap_or_default();
        let id = self.constant(|b| b.const_int(ty, bits));
        Value::new(id, Type::Int(ty), scalar.to_string())
    }

    pub fn i64(&mut self, value: i64) -> Value {
        self.int(IntTy::I64, value)
    }

    pub fn i32(&mut self, value: i32) -> Value {
        self.int(IntTy::I32, i64::from(value))
    }

    pub fn u64(&mut self, value: u64) -> Value {
        let id = self.constant(|b| b.const_int(IntTy::U64, value));
        Value::new(id, Type::U64, value.to_string())
    }

    pub fn bool(&mut self, value: bool) -> Value {
        let id = self.constant(|b| b.const_bool(value));
        Value::new(id, Type::Bool, value.to_string())
    }

    pub fn true_(&mut self) -> Value {
        self.bool(true)
    }

    pub fn false_(&mut self) -> Value {
        self.bool(false)
    }

    pub fn f64(&mut self, value: f64) -> Value {
        let id = self.constant(|b| b.const_float(&Type::F64, value));
        Value::new(id, Type::F64, format!("{value:?}"))
    }

    // -- Arithmetic --

    #[track_caller]
    pub fn add(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.arith(BinaryOp::Add, lhs, rhs)
    }

    #[track_caller]
    pub fn sub(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.arith(BinaryOp::Sub, lhs, rhs)
    }

    #[track_caller]
    pub fn mul(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.arith(BinaryOp::Mul, lhs, rhs)
    }

    #[track_caller]
    pub fn div(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.arith(BinaryOp::Div, lhs, rhs)
    }

    #[track_caller]
    pub fn rem(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.arith(BinaryOp::Rem, lhs, rhs)
    }

    #[track_caller]
    pub fn bit_and(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.arith(BinaryOp::And, lhs, rhs)
    }

    #[track_caller]
    pub fn bit_or(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.arith(BinaryOp::Or, lhs, rhs)
    }

    #[track_caller]
    pub fn bit_xor(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.arith(BinaryOp::Xor, lhs, rhs)
    }

    #[track_caller]
    pub fn shl(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.arith(BinaryOp::Shl, lhs, rhs)
    }

    /// Arithmetic shift for signed operands, logical for unsigned.
    #[track_caller]
    pub fn shr(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.arith(BinaryOp::Shr, lhs, rhs)
    }

    #[track_caller]
    pub fn neg(&mut self, operand: &Value) -> Value {
        if !operand.ty.is_numeric() {
            violation(UsageError::NotNumeric {
                context: "'-'".to_owned(),
                found: operand.ty.clone(),
            });
        }
        self.unary_value(UnaryOp::Neg, operand, format!("-{}", operand.repr))
    }

    // -- Comparisons and logic --

    #[track_caller]
    pub fn eq(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.compare(CmpOp::Eq, lhs, rhs)
    }

    #[track_caller]
    pub fn ne(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.compare(CmpOp::Ne, lhs, rhs)
    }

    #[track_caller]
    pub fn lt(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.compare(CmpOp::Lt, lhs, rhs)
    }

    #[track_caller]
    pub fn le(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.compare(CmpOp::Le, lhs, rhs)
    }

    #[track_caller]
    pub fn gt(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.compare(CmpOp::Gt, lhs, rhs)
    }

    #[track_caller]
    pub fn ge(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.compare(CmpOp::Ge, lhs, rhs)
    }

    /// Logical and. Both operands are always evaluated.
    #[track_caller]
    pub fn and(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.logic(BinaryOp::And, "&&", lhs, rhs)
    }

    /// Logical or. Both operands are always evaluated.
    #[track_caller]
    pub fn or(&mut self, lhs: &Value, rhs: &Value) -> Value {
        self.logic(BinaryOp::Or, "||", lhs, rhs)
    }

    #[track_caller]
    pub fn not(&mut self, operand: &Value) -> Value {
        require_bool("'!'", operand);
        self.unary_value(UnaryOp::Not, operand, format!("!{}", operand.repr))
    }

    /// Convert between integer types: sign- or zero-extends according to
    /// the source type, truncates when narrowing.
    #[track_caller]
    pub fn cast_int(&mut self, value: &Value, to: IntTy) -> Value {
        let Some(from) = value.ty.int_ty() else {
            violation(UsageError::NotInteger {
                context: format!("cast to {}", to.c_name()),
                found: value.ty.clone(),
            });
        };
        if from == to {
            return value.clone();
        }
        let v = self.operand(value);
        self.locate_expression();
        let id = self.emit_value(|b| b.extend(v, from, to));
        Value::new(
            id,
            Type::Int(to),
            format!("(({}){})", to.c_name(), value.repr),
        )
    }

    // -- Calls and memory --

    /// Call `callee`. Returns the result, or `None` for void functions.
    ///
    /// Renders as `f_ret = f(a, b);`, or `f(a, b);` when void.
    #[track_caller]
    pub fn call(&mut self, callee: &FunctionRef, args: &[Value]) -> Option<Value> {
        let sig = callee.signature();
        if sig.params.len() != args.len() {
            violation(UsageError::ArityMismatch {
                callee: callee.name().to_owned(),
                expected: sig.params.len(),
                found: args.len(),
            });
        }
        for (param, arg) in sig.params.iter().zip(args) {
            if param.ty != arg.ty {
                violation(UsageError::TypeMismatch {
                    context: format!("argument '{}' of '{}'", param.name, callee.name()),
                    expected: param.ty.clone(),
                    found: arg.ty.clone(),
                });
            }
        }

        let operands: Vec<ValueId> = args.iter().map(|a| self.operand(a)).collect();
        let rendered: Vec<&str> = args.iter().map(Value::repr).collect();
        let call_text = format!("{}({})", callee.name(), rendered.join(", "));
        let ret = sig.ret.clone();
        let func = callee.id();

        if ret.is_void() {
            self.statement(&format!("{call_text};"));
            self.emit(|b| b.call(func, &operands, &ret));
            return None;
        }
        let name = format!("{}_ret", callee.name());
        self.statement(&format!("{name} = {call_text};"));
        let id = self
            .emit(|b| b.call(func, &operands, &ret))
            .flatten()
            .unwrap_or(DETACHED);
        Some(Value::new(id, ret, name))
    }

    /// Load through a pointer: `valN = *p;`.
    #[track_caller]
    pub fn load(&mut self, ptr: &Value) -> Value {
        let pointee = pointee_of("load", ptr).clone();
        let name = self.temp_name();
        self.statement(&format!("{name} = *{};", ptr.repr));
        let p = self.operand(ptr);
        let id = self.emit_value(|b| b.load(&pointee, p, &name));
        Value::new(id, pointee, name)
    }

    /// Store through a pointer: `*p = v;`.
    #[track_caller]
    pub fn store(&mut self, value: &Value, ptr: &Value) {
        let pointee = pointee_of("store", ptr).clone();
        if pointee != value.ty {
            violation(UsageError::TypeMismatch {
                context: format!("store through {}", ptr.repr),
                expected: pointee,
                found: value.ty.clone(),
            });
        }
        self.statement(&format!("*{} = {};", ptr.repr, value.bare_repr()));
        let (v, p) = (self.operand(value), self.operand(ptr));
        self.emit(|b| b.store(&pointee, v, p));
    }

    // -- Helpers --

    /// Bitwise operators take integers, the rest any numeric type.
    #[track_caller]
    fn arith(&mut self, op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
        let ty = same_type(op.symbol(), lhs, rhs);
        let context = format!("'{}'", op.symbol());
        if op.is_bitwise() {
            if !ty.is_integer() {
                violation(UsageError::NotInteger { context, found: ty });
            }
        } else if !ty.is_numeric() {
            violation(UsageError::NotNumeric { context, found: ty });
        }
        self.binary_value(op, op.symbol(), ty, lhs, rhs)
    }

    #[track_caller]
    fn logic(&mut self, op: BinaryOp, symbol: &str, lhs: &Value, rhs: &Value) -> Value {
        let context = format!("'{symbol}'");
        require_bool(&context, lhs);
        require_bool(&context, rhs);
        self.binary_value(op, symbol, Type::Bool, lhs, rhs)
    }

    #[track_caller]
    fn compare(&mut self, op: CmpOp, lhs: &Value, rhs: &Value) -> Value {
        let ty = same_type(op.symbol(), lhs, rhs);
        if ty.is_void() || ty.is_array() {
            violation(UsageError::NotNumeric {
                context: format!("'{}'", op.symbol()),
                found: ty,
            });
        }
        let (l, r) = (self.operand(lhs), self.operand(rhs));
        self.locate_expression();
        let id = self.emit_value(|b| b.compare(op, &ty, l, r));
        Value::new(
            id,
            Type::Bool,
            format!("({} {} {})", lhs.repr, op.symbol(), rhs.repr),
        )
    }

    #[track_caller]
    fn binary_value(
        &mut self,
        op: BinaryOp,
        symbol: &str,
        ty: Type,
        lhs: &Value,
        rhs: &Value,
    ) -> Value {
        let (l, r) = (self.operand(lhs), self.operand(rhs));
        self.locate_expression();
        let id = self.emit_value(|b| b.binary(op, &ty, l, r));
        let repr = format!("({} {symbol} {})", lhs.repr, rhs.repr);
        Value::new(id, ty, repr)
    }

    #[track_caller]
    fn unary_value(&mut self, op: UnaryOp, operand: &Value, repr: String) -> Value {
        let v = self.operand(operand);
        let ty = operand.ty.clone();
        self.locate_expression();
        let id = self.emit_value(|b| b.unary(op, &ty, v));
        Value::new(id, ty, repr)
    }
}

#[track_caller]
fn same_type(op: &str, lhs: &Value, rhs: &Value) -> Type {
    if lhs.ty != rhs.ty {
        violation(UsageError::TypeMismatch {
            context: format!("'{op}'"),
            expected: lhs.ty.clone(),
            found: rhs.ty.clone(),
        });
    }
    lhs.ty.clone()
}

#[track_caller]
pub(crate) fn require_bool(context: &str, value: &Value) {
    if !value.ty.is_bool() {
        violation(UsageError::NotBool {
            context: context.to_owned(),
            found: value.ty.clone(),
        });
    }
}

/// Scalar pointee of a pointer value.
#[track_caller]
fn pointee_of<'v>(context: &str, ptr: &'v Value) -> &'v Type {
    match ptr.ty.pointee() {
        Some(pointee) if !pointee.is_void() && !pointee.is_array() => pointee,
        _ => violation(UsageError::NotPointer {
            context: context.to_owned(),
            found: ptr.ty.clone(),
        }),
    }
}

#[cfg(test)]
mod tests;
