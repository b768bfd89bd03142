//! Mapping from weave types to LLVM types.

use inkwell::context::Context;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType, IntType};
use inkwell::AddressSpace;
use weave_ir::{IntTy, Signature, Type};

/// LLVM integer type of `ty`'s width. Signedness lives in the operations.
pub(crate) fn int_type(cx: &Context, ty: IntTy) -> IntType<'_> {
    cx.custom_width_int_type(ty.bits())
}

/// The first-class LLVM type of `ty`, or `None` for `void`.
pub(crate) fn basic_type<'ctx>(cx: &'ctx Context, ty: &Type) -> Option<BasicTypeEnum<'ctx>> {
    Some(match ty {
        Type::Void => return None,
        Type::Bool => cx.bool_type().into(),
        Type::Int(it) => int_type(cx, *it).into(),
        Type::F32 => cx.f32_type().into(),
        Type::F64 => cx.f64_type().into(),
        // Opaque pointers: the pointee only matters to loads and GEPs.
        Type::Ptr(_) => cx.ptr_type(AddressSpace::default()).into(),
        Type::Array(elem, len) => basic_type(cx, elem)?.array_type(*len).into(),
    })
}

/// Like [`basic_type`], for positions where `void` cannot occur.
pub(crate) fn value_type<'ctx>(cx: &'ctx Context, ty: &Type) -> BasicTypeEnum<'ctx> {
    basic_type(cx, ty).unwrap_or_else(|| panic!("'{ty}' has no value representation"))
}

pub(crate) fn function_type<'ctx>(cx: &'ctx Context, sig: &Signature) -> FunctionType<'ctx> {
    let params: Vec<BasicMetadataTypeEnum<'ctx>> = sig
        .param_types()
        .map(|ty| value_type(cx, ty).into())
        .collect();
    match basic_type(cx, &sig.ret) {
        Some(ret) => ret.fn_type(&params, false),
        None => cx.void_type().fn_type(&params, false),
    }
}

#[cfg(test)]
mod tests;
