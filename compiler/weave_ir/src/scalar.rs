//! Scalar runtime values.
//!
//! Used both for IR constants and for the values an executor passes in and
//! out of generated functions. Integer payloads are stored as raw bits
//! truncated to the type's width; signed interpretation is applied on read.

use std::fmt;

use smallvec::SmallVec;

use crate::types::{IntTy, Type};

/// A scalar value tagged with its semantic type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    /// Integer with its bits truncated to `ty.bits()`.
    Int { ty: IntTy, bits: u64 },
    F32(f32),
    F64(f64),
    /// Address in the executor's memory.
    Ptr(u64),
}

/// Sign-extend the low `ty.bits()` of `bits` to a full `i64`.
#[inline]
pub fn sign_extend(ty: IntTy, bits: u64) -> i64 {
    let shift = 64 - ty.bits();
    ((bits << shift) as i64) >> shift
}

impl Scalar {
    /// Integer from raw bits; bits above the type width are dropped.
    #[inline]
    pub fn from_bits(ty: IntTy, bits: u64) -> Self {
        Scalar::Int {
            ty,
            bits: bits & ty.mask(),
        }
    }

    /// Integer from a signed value, wrapping to the type width.
    #[inline]
    pub fn int(ty: IntTy, value: i64) -> Self {
        Self::from_bits(ty, value as u64)
    }

    pub fn i64(value: i64) -> Self {
        Self::int(IntTy::I64, value)
    }

    pub fn i32(value: i32) -> Self {
        Self::int(IntTy::I32, i64::from(value))
    }

    pub fn u64(value: u64) -> Self {
        Self::from_bits(IntTy::U64, value)
    }

    pub fn u8(value: u8) -> Self {
        Self::from_bits(IntTy::U8, u64::from(value))
    }

    /// The semantic type of this value.
    ///
    /// Pointers report `void*`: the executor does not track pointee types.
    pub fn ty(&self) -> Type {
        match self {
            Scalar::Bool(_) => Type::Bool,
            Scalar::Int { ty, .. } => Type::Int(*ty),
            Scalar::F32(_) => Type::F32,
            Scalar::F64(_) => Type::F64,
            Scalar::Ptr(_) => Type::ptr(Type::Void),
        }
    }

    /// Signed interpretation of an integer (or the address of a pointer).
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Scalar::Int { ty, bits } if ty.is_signed() => Some(sign_extend(ty, bits)),
            Scalar::Int { bits, .. } => Some(bits as i64),
            Scalar::Bool(b) => Some(i64::from(b)),
            Scalar::Ptr(addr) => Some(addr as i64),
            Scalar::F32(_) | Scalar::F64(_) => None,
        }
    }

    /// Raw integer bits (zero-extended), pointer address or bool.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Scalar::Int { bits, .. } | Scalar::Ptr(bits) => Some(bits),
            Scalar::Bool(b) => Some(u64::from(b)),
            Scalar::F32(_) | Scalar::F64(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Scalar::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Scalar::F32(v) => Some(f64::from(v)),
            Scalar::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Little-endian in-memory encoding.
    pub fn to_le_bytes(&self) -> SmallVec<[u8; 8]> {
        match *self {
            Scalar::Bool(b) => SmallVec::from_slice(&[u8::from(b)]),
            Scalar::Int { ty, bits } => {
                SmallVec::from_slice(&bits.to_le_bytes()[..ty.bytes() as usize])
            }
            Scalar::F32(v) => SmallVec::from_slice(&v.to_le_bytes()),
            Scalar::F64(v) => SmallVec::from_slice(&v.to_le_bytes()),
            Scalar::Ptr(addr) => SmallVec::from_slice(&addr.to_le_bytes()),
        }
    }

    /// Decode a value of type `ty` from little-endian bytes.
    ///
    /// Returns `None` for non-scalar types or if `bytes` has the wrong length.
    pub fn from_le_bytes(ty: &Type, bytes: &[u8]) -> Option<Self> {
        if bytes.len() as u64 != ty.size() {
            return None;
        }
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(bytes);
        let raw = u64::from_le_bytes(buf);
        match ty {
            Type::Bool => Some(Scalar::Bool(raw != 0)),
            Type::Int(it) => Some(Scalar::from_bits(*it, raw)),
            Type::F32 => Some(Scalar::F32(f32::from_bits(raw as u32))),
            Type::F64 => Some(Scalar::F64(f64::from_bits(raw))),
            Type::Ptr(_) => Some(Scalar::Ptr(raw)),
            Type::Void | Type::Array(..) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int { ty, bits } if ty.is_signed() => write!(f, "{}", sign_extend(ty, bits)),
            Scalar::Int { bits, .. } => write!(f, "{bits}"),
            Scalar::F32(v) => write!(f, "{v:?}"),
            Scalar::F64(v) => write!(f, "{v:?}"),
            Scalar::Ptr(addr) => write!(f, "{addr:#x}"),
        }
    }
}
