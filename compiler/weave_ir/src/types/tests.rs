use pretty_assertions::assert_eq;

use super::*;

#[test]
fn int_widths_and_signedness() {
    assert_eq!(IntTy::I8.bits(), 8);
    assert_eq!(IntTy::U16.bytes(), 2);
    assert!(IntTy::I32.is_signed());
    assert!(!IntTy::U64.is_signed());
    assert_eq!(IntTy::U8.mask(), 0xff);
    assert_eq!(IntTy::I64.mask(), u64::MAX);
}

#[test]
fn layout_follows_c() {
    assert_eq!(Type::BOOL.size(), 1);
    assert_eq!(Type::I32.size(), 4);
    assert_eq!(Type::ptr(Type::U8).size(), 8);
    let arr = Type::array(Type::I16, 5);
    assert_eq!(arr.size(), 10);
    assert_eq!(arr.align(), 2);
    assert_eq!(Type::Void.size(), 0);
}

#[test]
fn c_spelling() {
    assert_eq!(Type::I64.to_string(), "int64_t");
    assert_eq!(Type::ptr(Type::F64).to_string(), "double*");
    assert_eq!(Type::I64.c_decl("acc"), "int64_t acc");
    assert_eq!(Type::array(Type::I32, 4).c_decl("a"), "int32_t a[4]");
    assert_eq!(
        Type::array(Type::array(Type::U8, 2), 3).c_decl("grid"),
        "uint8_t grid[3][2]"
    );
}

#[test]
fn accessors() {
    let arr = Type::array(Type::I32, 4);
    assert_eq!(arr.element(), Some(&Type::I32));
    assert_eq!(Type::I32.element(), None);
    assert_eq!(Type::ptr(Type::Bool).pointee(), Some(&Type::Bool));
    assert_eq!(Type::U8.int_ty(), Some(IntTy::U8));
    assert!(Type::F32.is_numeric());
    assert!(!Type::BOOL.is_numeric());
}

#[test]
fn signature_prototype() {
    let sig = Signature::new(Type::I64)
        .param("n", Type::I64)
        .param("buf", Type::ptr(Type::U8));
    assert_eq!(sig.c_prototype("sum"), "int64_t sum(int64_t n, uint8_t* buf)");
    assert_eq!(sig.param_types().count(), 2);
    assert_eq!(Signature::new(Type::Void).c_prototype("f"), "void f()");
}
