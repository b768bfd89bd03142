//! DWARF metadata for the synthetic source file.
//!
//! One compile unit per module, pointing at the `.c` file the code
//! generator writes. Functions get a `DISubprogram`, braces open
//! lexical blocks, and at [`DebugLevel::Full`] every variable becomes an
//! auto variable bound to its stack slot with `llvm.dbg.declare`.

use std::path::Path;

use inkwell::basic_block::BasicBlock;
use inkwell::context::Context;
use inkwell::debug_info::{
    AsDIScope, DICompileUnit, DIFile, DIFlags, DIFlagsConstants, DILocation, DIScope, DIType,
    DWARFEmissionKind, DWARFSourceLanguage, DebugInfoBuilder,
};
use inkwell::module::{FlagBehavior, Module};
use inkwell::values::{FunctionValue, PointerValue};
use inkwell::AddressSpace;
use rustc_hash::FxHashMap;
use weave_ir::{DebugLevel, IntTy, Signature, Type};

/// DWARF base type encodings.
const DW_ATE_BOOLEAN: u32 = 0x02;
const DW_ATE_FLOAT: u32 = 0x04;
const DW_ATE_SIGNED: u32 = 0x05;
const DW_ATE_UNSIGNED: u32 = 0x07;

const DWARF_VERSION: u64 = 4;

fn emission_kind(level: DebugLevel) -> DWARFEmissionKind {
    match level {
        DebugLevel::None => DWARFEmissionKind::None,
        DebugLevel::LineTablesOnly => DWARFEmissionKind::LineTablesOnly,
        DebugLevel::Full => DWARFEmissionKind::Full,
    }
}

pub(crate) struct DebugInfo<'ctx> {
    builder: DebugInfoBuilder<'ctx>,
    compile_unit: DICompileUnit<'ctx>,
    context: &'ctx Context,
    level: DebugLevel,
    types: FxHashMap<Type, DIType<'ctx>>,
}

impl<'ctx> DebugInfo<'ctx> {
    const PRODUCER: &'static str = "weave";

    /// Create the compile unit for `source_path`, or `None` when `level`
    /// disables debug info.
    pub(crate) fn new(
        module: &Module<'ctx>,
        context: &'ctx Context,
        level: DebugLevel,
        source_path: &Path,
    ) -> Option<Self> {
        if !level.is_enabled() {
            return None;
        }

        let i32_type = context.i32_type();
        module.add_basic_value_flag(
            "Debug Info Version",
            FlagBehavior::Warning,
            i32_type.const_int(3, false),
        );
        module.add_basic_value_flag(
            "Dwarf Version",
            FlagBehavior::Warning,
            i32_type.const_int(DWARF_VERSION, false),
        );

        let file_name = source_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown.c");
        let dir = source_path
            .parent()
            .and_then(|p| p.to_str())
            .unwrap_or(".");

        let (builder, compile_unit) = module.create_debug_info_builder(
            /* allow_unresolved */ true,
            /* language */ DWARFSourceLanguage::C,
            /* filename */ file_name,
            /* directory */ dir,
            /* producer */ Self::PRODUCER,
            /* is_optimized */ false,
            /* flags */ "",
            /* runtime_ver */ 0,
            /* split_name */ "",
            /* kind */ emission_kind(level),
            /* dwo_id */ 0,
            /* split_debug_inlining */ false,
            /* debug_info_for_profiling */ false,
            /* sysroot */ "",
            /* sdk */ "",
        );

        Some(Self {
            builder,
            compile_unit,
            context,
            level,
            types: FxHashMap::default(),
        })
    }

    fn file(&self) -> DIFile<'ctx> {
        self.compile_unit.get_file()
    }

    /// Attach a subprogram to `func` and return it as a scope.
    pub(crate) fn function(
        &mut self,
        func: FunctionValue<'ctx>,
        name: &str,
        sig: &Signature,
        line: u32,
    ) -> DIScope<'ctx> {
        let ret = self.di_type(&sig.ret);
        let params: Vec<DIType<'ctx>> = sig
            .param_types()
            .filter_map(|ty| self.di_type(ty))
            .collect();
        let subroutine =
            self.builder
                .create_subroutine_type(self.file(), ret, &params, DIFlags::ZERO);
        let subprogram = self.builder.create_function(
            self.compile_unit.as_debug_info_scope(),
            name,
            None,
            self.file(),
            line,
            subroutine,
            /* is_local_to_unit */ false,
            /* is_definition */ true,
            /* scope_line */ line,
            DIFlags::ZERO,
            /* is_optimized */ false,
        );
        func.set_subprogram(subprogram);
        subprogram.as_debug_info_scope()
    }

    /// The compile unit, for lexical blocks opened outside any function.
    pub(crate) fn file_scope(&self) -> DIScope<'ctx> {
        self.compile_unit.as_debug_info_scope()
    }

    pub(crate) fn lexical_block(
        &self,
        parent: DIScope<'ctx>,
        line: u32,
        column: u32,
    ) -> DIScope<'ctx> {
        self.builder
            .create_lexical_block(parent, self.file(), line, column)
            .as_debug_info_scope()
    }

    pub(crate) fn location(
        &self,
        line: u32,
        column: u32,
        scope: DIScope<'ctx>,
    ) -> DILocation<'ctx> {
        self.builder
            .create_debug_location(self.context, line, column, scope, None)
    }

    /// Describe `storage` as local `name`, declared at the end of `block`.
    ///
    /// Does nothing below [`DebugLevel::Full`].
    pub(crate) fn declare_local(
        &mut self,
        scope: DIScope<'ctx>,
        name: &str,
        ty: &Type,
        line: u32,
        storage: PointerValue<'ctx>,
        block: BasicBlock<'ctx>,
    ) {
        if !self.level.has_variables() {
            return;
        }
        let Some(di_type) = self.di_type(ty) else {
            return;
        };
        let variable = self.builder.create_auto_variable(
            scope,
            name,
            self.file(),
            line,
            di_type,
            /* always_preserve */ true,
            DIFlags::ZERO,
            /* align_in_bits */ (ty.align() * 8) as u32,
        );
        let loc = self.location(line, 1, scope);
        self.builder
            .insert_declare_at_end(storage, Some(variable), None, loc, block);
    }

    /// Debug type of `ty`, cached per module. `void` has none.
    fn di_type(&mut self, ty: &Type) -> Option<DIType<'ctx>> {
        if let Some(&cached) = self.types.get(ty) {
            return Some(cached);
        }
        let created = match ty {
            Type::Void => return None,
            Type::Bool => self.basic("bool", 8, DW_ATE_BOOLEAN),
            Type::Int(it) => self.basic(it.c_name(), u64::from(it.bits()), int_encoding(*it)),
            Type::F32 => self.basic("float", 32, DW_ATE_FLOAT),
            Type::F64 => self.basic("double", 64, DW_ATE_FLOAT),
            Type::Ptr(inner) => {
                // `void *` is described as a pointer to bytes.
                let pointee = match self.di_type(inner) {
                    Some(pointee) => pointee,
                    None => self.di_type(&Type::U8)?,
                };
                self.builder
                    .create_pointer_type(&ty.to_string(), pointee, 64, 64, AddressSpace::default())
                    .as_type()
            }
            Type::Array(elem, len) => {
                let elem_di = self.di_type(elem)?;
                let subscripts = if *len > 0 {
                    vec![0..i64::from(*len)]
                } else {
                    Vec::new()
                };
                self.builder
                    .create_array_type(
                        elem_di,
                        ty.size() * 8,
                        (ty.align() * 8) as u32,
                        &subscripts,
                    )
                    .as_type()
            }
        };
        self.types.insert(ty.clone(), created);
        Some(created)
    }

    fn basic(&self, name: &str, size_bits: u64, encoding: u32) -> DIType<'ctx> {
        self.builder
            .create_basic_type(name, size_bits, encoding, DIFlags::ZERO)
            .expect("failed to create basic debug type")
            .as_type()
    }

    /// Resolve forward references. Must run before verification.
    pub(crate) fn finalize(&self) {
        self.builder.finalize();
    }
}

fn int_encoding(ty: IntTy) -> u32 {
    if ty.is_signed() {
        DW_ATE_SIGNED
    } else {
        DW_ATE_UNSIGNED
    }
}
