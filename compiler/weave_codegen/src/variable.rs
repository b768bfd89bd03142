//! Mutable stack variables.
//!
//! A [`Variable`] is a named stack slot in its function's entry block,
//! visible to debuggers as a local. Reading it yields a [`Value`] whose text
//! is the variable's name, so expressions over variables render the way a
//! C programmer would write them.

use weave_ir::{Backend, FunctionId, Type, ValueId, ADDRESS_TYPE};

use crate::builder::ModuleBuilder;
use crate::error::{violation, UsageError};
use crate::value::Value;

/// A named, typed stack slot.
///
/// Neither `Clone` nor `Copy`: the handle is the variable.
#[derive(Debug)]
pub struct Variable {
    name: String,
    ty: Type,
    slot: ValueId,
    owner: FunctionId,
    owner_name: String,
}

impl Variable {
    /// Declare `name` in the current function: `int64_t acc;`.
    #[track_caller]
    pub fn new<B: Backend>(mb: &mut ModuleBuilder<B>, name: &str, ty: Type) -> Self {
        mb.require_construct();
        if ty.is_void() {
            violation(UsageError::VoidVariable {
                name: name.to_owned(),
            });
        }
        let (owner, owner_name) = {
            let func = mb.function();
            (func.id(), func.name().to_owned())
        };

        let line = mb.statement(&format!("{};", ty.c_decl(name)));
        let slot = mb.emit_value(|b| b.entry_alloca(owner, &ty, name));
        if let Some(line) = line {
            mb.declare_local(name, &ty, line, slot);
        }
        Self {
            name: name.to_owned(),
            ty,
            slot,
            owner,
            owner_name,
        }
    }

    /// Declare `name` with the type of `init` and assign it: `int64_t acc;`
    /// followed by `acc = 0;`.
    #[track_caller]
    pub fn with_value<B: Backend>(mb: &mut ModuleBuilder<B>, name: &str, init: &Value) -> Self {
        let var = Self::new(mb, name, init.ty().clone());
        var.set(mb, init);
        var
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Current value. Renders as the variable name and adds no line.
    #[track_caller]
    pub fn get<B: Backend>(&self, mb: &mut ModuleBuilder<B>) -> Value {
        self.check_owner(mb);
        if self.ty.is_array() {
            violation(UsageError::WholeArray {
                name: self.name.clone(),
            });
        }
        let (ty, slot) = (&self.ty, self.slot);
        mb.locate_expression();
        let id = mb.emit_value(|b| b.load(ty, slot, &self.name));
        Value::new(id, self.ty.clone(), self.name.as_str())
    }

    /// Assign `value`: `acc = v;`. Types must match exactly.
    #[track_caller]
    pub fn set<B: Backend>(&self, mb: &mut ModuleBuilder<B>, value: &Value) {
        self.check_owner(mb);
        if *value.ty() != self.ty {
            violation(UsageError::TypeMismatch {
                context: format!("assignment to '{}'", self.name),
                expected: self.ty.clone(),
                found: value.ty().clone(),
            });
        }
        mb.statement(&format!("{} = {};", self.name, value.bare_repr()));
        let v = mb.operand(value);
        let (ty, slot) = (&self.ty, self.slot);
        mb.emit(|b| b.store(ty, v, slot));
    }

    /// Element `index` of an array variable: `a[i]`. Adds no line.
    #[track_caller]
    pub fn elem<B: Backend>(&self, mb: &mut ModuleBuilder<B>, index: &Value) -> Value {
        let elem_ty = self.element_type(mb, index).clone();
        mb.locate_expression();
        let addr = self.element_address(mb, index);
        let name = format!("{}[{}]", self.name, index.bare_repr());
        let id = mb.emit_value(|b| b.load(&elem_ty, addr, &name));
        Value::new(id, elem_ty, name)
    }

    /// Store `value` into element `index`: `a[i] = v;`.
    #[track_caller]
    pub fn set_elem<B: Backend>(&self, mb: &mut ModuleBuilder<B>, index: &Value, value: &Value) {
        let elem_ty = self.element_type(mb, index).clone();
        if *value.ty() != elem_ty {
            violation(UsageError::TypeMismatch {
                context: format!("assignment to element of '{}'", self.name),
                expected: elem_ty,
                found: value.ty().clone(),
            });
        }
        mb.statement(&format!(
            "{}[{}] = {};",
            self.name,
            index.bare_repr(),
            value.bare_repr()
        ));
        let addr = self.element_address(mb, index);
        let v = mb.operand(value);
        mb.emit(|b| b.store(&elem_ty, v, addr));
    }

    /// Pointer to the slot: `&x`.
    #[track_caller]
    pub fn address<B: Backend>(&self, mb: &ModuleBuilder<B>) -> Value {
        self.check_owner(mb);
        Value::new(
            self.slot,
            Type::ptr(self.ty.clone()),
            format!("&{}", self.name),
        )
    }

    #[track_caller]
    fn check_owner<B: Backend>(&self, mb: &ModuleBuilder<B>) {
        if mb.function().id() != self.owner {
            violation(UsageError::ForeignVariable {
                name: self.name.clone(),
                owner: self.owner_name.clone(),
            });
        }
    }

    #[track_caller]
    fn element_type<B: Backend>(&self, mb: &ModuleBuilder<B>, index: &Value) -> &Type {
        self.check_owner(mb);
        let Some(elem) = self.ty.element() else {
            violation(UsageError::NotArray {
                name: self.name.clone(),
                found: self.ty.clone(),
            });
        };
        if !index.ty().is_integer() {
            violation(UsageError::NotInteger {
                context: format!("index into '{}'", self.name),
                found: index.ty().clone(),
            });
        }
        elem
    }

    /// Widen `index` to the address width and compute the element address.
    #[track_caller]
    fn element_address<B: Backend>(&self, mb: &mut ModuleBuilder<B>, index: &Value) -> ValueId {
        let mut idx = mb.operand(index);
        if let Some(from) = index.ty().int_ty() {
            if from.bits() != ADDRESS_TYPE.bits() {
                idx = mb.emit_value(|b| b.extend(idx, from, ADDRESS_TYPE));
            }
        }
        let (ty, slot) = (&self.ty, self.slot);
        mb.emit_value(|b| b.element_address(ty, slot, idx))
    }
}

#[cfg(test)]
mod tests;
