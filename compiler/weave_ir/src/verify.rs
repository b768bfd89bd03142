//! Structural verification of a recorded module.
//!
//! Checks the properties every backend relies on: each block of a defined
//! function ends in exactly one terminator, control never leaves its
//! function, branch conditions are booleans, and returns and calls agree
//! with the signatures involved.

use crate::backend::Linkage;
use crate::ids::{BlockId, FunctionId, ValueId};
use crate::module::{InstKind, IrModule, Terminator};
use crate::types::Type;

/// One verification failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("block '{block}' in '{func}' has no terminator")]
    MissingTerminator { func: String, block: String },
    #[error("block '{block}' in '{func}' was terminated {count} times")]
    MultipleTerminators {
        func: String,
        block: String,
        count: u32,
    },
    #[error("block '{block}' in '{func}' branches to a block of another function")]
    ForeignTarget { func: String, block: String },
    #[error("branch condition in '{func}' is {ty}, expected bool")]
    NonBoolCondition { func: String, ty: Type },
    #[error("'{func}' returns {found} but is declared to return {expected}")]
    ReturnMismatch {
        func: String,
        expected: Type,
        found: Type,
    },
    #[error("call to '{callee}' in '{func}' passes {found} arguments, expected {expected}")]
    CallArity {
        func: String,
        callee: String,
        expected: usize,
        found: usize,
    },
    #[error("external function '{func}' has a body")]
    ExternalWithBody { func: String },
    #[error("defined function '{func}' has no blocks")]
    EmptyFunction { func: String },
}

/// Verify every function of `module`, collecting all failures.
pub fn verify_module(module: &IrModule) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    for index in 0..module.functions.len() {
        verify_function(module, FunctionId::new(index as u32), &mut errors);
    }
    errors
}

fn verify_function(module: &IrModule, fid: FunctionId, errors: &mut Vec<VerifyError>) {
    let func = module.function(fid);
    let name = || func.name.clone();

    if func.linkage == Linkage::External {
        if !func.blocks.is_empty() {
            errors.push(VerifyError::ExternalWithBody { func: name() });
        }
        return;
    }
    if func.blocks.is_empty() {
        errors.push(VerifyError::EmptyFunction { func: name() });
        return;
    }

    for &bid in &func.blocks {
        let block = module.block(bid);
        if block.terminator_count > 1 {
            errors.push(VerifyError::MultipleTerminators {
                func: name(),
                block: block.name.clone(),
                count: block.terminator_count,
            });
        }
        for inst in &block.insts {
            if let InstKind::Call { callee, args } = &inst.kind {
                let expected = module.function(*callee).sig.params.len();
                if expected != args.len() {
                    errors.push(VerifyError::CallArity {
                        func: name(),
                        callee: module.function(*callee).name.clone(),
                        expected,
                        found: args.len(),
                    });
                }
            }
        }
        let Some(term) = block.terminator else {
            errors.push(VerifyError::MissingTerminator {
                func: name(),
                block: block.name.clone(),
            });
            continue;
        };
        if term
            .successors()
            .iter()
            .any(|&succ| !owns_block(module, fid, succ))
        {
            errors.push(VerifyError::ForeignTarget {
                func: name(),
                block: block.name.clone(),
            });
        }
        match term {
            Terminator::CondBr { cond, .. } => {
                let ty = module.value(cond).ty();
                if !ty.is_bool() {
                    errors.push(VerifyError::NonBoolCondition { func: name(), ty });
                }
            }
            Terminator::Ret(value) => {
                let found = value.map_or(Type::Void, |v: ValueId| module.value(v).ty());
                if found != func.sig.ret {
                    errors.push(VerifyError::ReturnMismatch {
                        func: name(),
                        expected: func.sig.ret.clone(),
                        found,
                    });
                }
            }
            Terminator::Br(_) | Terminator::Unreachable => {}
        }
    }
}

fn owns_block(module: &IrModule, fid: FunctionId, block: BlockId) -> bool {
    block.index() < module.blocks.len() && module.block(block).func == fid
}
