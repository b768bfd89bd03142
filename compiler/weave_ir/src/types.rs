//! Semantic types.
//!
//! Every value and variable the code generator handles carries one of these
//! tags. The set is closed: backends map each variant to their native
//! representation, and the code generator checks operand compatibility
//! against them before anything is emitted.

use std::fmt;

/// Integer kinds, by width and signedness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntTy {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntTy {
    /// Width in bits.
    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            Self::I8 | Self::U8 => 8,
            Self::I16 | Self::U16 => 16,
            Self::I32 | Self::U32 => 32,
            Self::I64 | Self::U64 => 64,
        }
    }

    /// Width in bytes.
    #[inline]
    pub fn bytes(self) -> u32 {
        self.bits() / 8
    }

    #[inline]
    pub fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Mask selecting the low `bits()` bits of a `u64`.
    #[inline]
    pub fn mask(self) -> u64 {
        if self.bits() == 64 {
            u64::MAX
        } else {
            (1u64 << self.bits()) - 1
        }
    }

    /// C spelling used in the synthetic source.
    pub fn c_name(self) -> &'static str {
        match self {
            Self::I8 => "int8_t",
            Self::I16 => "int16_t",
            Self::I32 => "int32_t",
            Self::I64 => "int64_t",
            Self::U8 => "uint8_t",
            Self::U16 => "uint16_t",
            Self::U32 => "uint32_t",
            Self::U64 => "uint64_t",
        }
    }
}

/// A semantic type tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Bool,
    Int(IntTy),
    F32,
    F64,
    /// Pointer to a value of the inner type.
    Ptr(Box<Type>),
    /// Fixed-length array: element type and length.
    Array(Box<Type>, u32),
}

/// Index type used for element addressing (native address width).
pub const ADDRESS_TYPE: IntTy = IntTy::I64;

impl Type {
    pub const VOID: Type = Type::Void;
    pub const BOOL: Type = Type::Bool;
    pub const I8: Type = Type::Int(IntTy::I8);
    pub const I16: Type = Type::Int(IntTy::I16);
    pub const I32: Type = Type::Int(IntTy::I32);
    pub const I64: Type = Type::Int(IntTy::I64);
    pub const U8: Type = Type::Int(IntTy::U8);
    pub const U16: Type = Type::Int(IntTy::U16);
    pub const U32: Type = Type::Int(IntTy::U32);
    pub const U64: Type = Type::Int(IntTy::U64);

    /// Pointer to `pointee`.
    pub fn ptr(pointee: Type) -> Type {
        Type::Ptr(Box::new(pointee))
    }

    /// Array of `len` elements of `elem`.
    pub fn array(elem: Type, len: u32) -> Type {
        Type::Array(Box::new(elem), len)
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    #[inline]
    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int(_))
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, Type::F32 | Type::F64)
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    #[inline]
    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Ptr(_))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(..))
    }

    /// The integer kind, if this is an integer type.
    pub fn int_ty(&self) -> Option<IntTy> {
        match self {
            Type::Int(it) => Some(*it),
            _ => None,
        }
    }

    /// Element type of an array.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(elem, _) => Some(elem),
            _ => None,
        }
    }

    /// Pointee type of a pointer.
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Ptr(inner) => Some(inner),
            _ => None,
        }
    }

    /// Storage size in bytes (natural C layout).
    pub fn size(&self) -> u64 {
        match self {
            Type::Void => 0,
            Type::Bool => 1,
            Type::Int(it) => u64::from(it.bytes()),
            Type::F32 => 4,
            Type::F64 | Type::Ptr(_) => 8,
            Type::Array(elem, len) => elem.size() * u64::from(*len),
        }
    }

    /// Alignment in bytes.
    pub fn align(&self) -> u64 {
        match self {
            Type::Void | Type::Bool => 1,
            Type::Array(elem, _) => elem.align(),
            _ => self.size(),
        }
    }

    /// C declaration of a variable named `name` with this type.
    ///
    /// Arrays put the extent after the name: `int32_t a[4]`.
    pub fn c_decl(&self, name: &str) -> String {
        match self {
            Type::Array(elem, len) => elem.c_decl(&format!("{name}[{len}]")),
            _ => format!("{self} {name}"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int(it) => write!(f, "{}", it.c_name()),
            Type::F32 => write!(f, "float"),
            Type::F64 => write!(f, "double"),
            Type::Ptr(inner) => write!(f, "{inner}*"),
            Type::Array(elem, len) => write!(f, "{elem}[{len}]"),
        }
    }
}

/// A function parameter: display name and type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

/// A function signature: ordered parameters and a return type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<Param>,
    pub ret: Type,
}

impl Signature {
    /// A signature with no parameters.
    pub fn new(ret: Type) -> Self {
        Self {
            params: Vec::new(),
            ret,
        }
    }

    /// Append a named parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    /// Parameter types in order.
    pub fn param_types(&self) -> impl Iterator<Item = &Type> {
        self.params.iter().map(|p| &p.ty)
    }

    /// C prototype for the synthetic source, e.g. `int64_t sum(int64_t n)`.
    pub fn c_prototype(&self, name: &str) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.ty.c_decl(&p.name)).collect();
        format!("{} {}({})", self.ret, name, params.join(", "))
    }
}

#[cfg(test)]
mod tests;
