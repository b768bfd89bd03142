use inkwell::context::Context;
use inkwell::types::BasicTypeEnum;
use weave_ir::{Signature, Type};

use super::{basic_type, function_type};

#[test]
fn scalars_map_to_their_width() {
    let cx = Context::create();
    let Some(BasicTypeEnum::IntType(i)) = basic_type(&cx, &Type::U16) else {
        panic!("u16 is an integer");
    };
    assert_eq!(i.get_bit_width(), 16);
    let Some(BasicTypeEnum::IntType(b)) = basic_type(&cx, &Type::BOOL) else {
        panic!("bool is i1");
    };
    assert_eq!(b.get_bit_width(), 1);
    assert!(basic_type(&cx, &Type::Void).is_none());
}

#[test]
fn arrays_keep_their_length() {
    let cx = Context::create();
    let Some(BasicTypeEnum::ArrayType(a)) = basic_type(&cx, &Type::array(Type::I32, 4)) else {
        panic!("array type expected");
    };
    assert_eq!(a.len(), 4);
}

#[test]
fn void_functions_return_nothing() {
    let cx = Context::create();
    let sig = Signature::new(Type::Void).param("p", Type::ptr(Type::I8));
    let fn_type = function_type(&cx, &sig);
    assert!(fn_type.get_return_type().is_none());
    assert_eq!(fn_type.count_param_types(), 1);
}
