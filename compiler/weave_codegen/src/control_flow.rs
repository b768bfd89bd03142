//! Structured control flow: conditionals, loops, jumps and returns.
//!
//! Each construct lowers to basic blocks and branches, records its
//! synthetic lines, and runs nested bodies one lexical scope deeper. The
//! returned [`BlockState`] says whether code after the construct is
//! reachable.
//!
//! # Block Layout
//!
//! | Construct | Blocks |
//! |-----------|--------|
//! | `if_` | `true_block`, `merge_block` |
//! | `if_else` | `true_block`, `false_block`, `merge_block` |
//! | `while_` | `while_continue` (guard), `while_iteration`, `while_break` |

use tracing::trace;
use weave_ir::{Backend, BlockId, Type};

use crate::builder::{BlockState, ConditionPass, ModuleBuilder};
use crate::error::{violation, UsageError};
use crate::value::{require_bool, Value};

/// Branch targets of an enclosing loop.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LoopContext {
    /// Where `continue` goes: the loop guard.
    pub(crate) continue_block: BlockId,
    /// Where `break` goes.
    pub(crate) exit_block: BlockId,
}

impl<B: Backend> ModuleBuilder<B> {
    /// `if (c) { then }`.
    ///
    /// Always resumes Open at the merge block.
    #[track_caller]
    pub fn if_(&mut self, cond: &Value, then: impl FnOnce(&mut Self)) -> BlockState {
        self.require_construct();
        require_bool("if condition", cond);
        let c = self.operand(cond);

        let true_block = self.new_block("true_block");
        let merge_block = self.new_block("merge_block");
        self.line(&format!("if ({}) {{", cond.bare_repr()));
        self.terminate(|b| b.cond_br(c, true_block, merge_block));

        self.switch_to(true_block);
        self.nested(then);
        self.line("}");
        self.branch_if_open(merge_block);

        self.switch_to(merge_block);
        BlockState::Open
    }

    /// `if (c) { then } else { otherwise }`.
    ///
    /// When both arms end in a terminator, the merge block is unreachable:
    /// it is sealed with `unreachable` and the builder stays Closed.
    #[track_caller]
    pub fn if_else(
        &mut self,
        cond: &Value,
        then: impl FnOnce(&mut Self),
        otherwise: impl FnOnce(&mut Self),
    ) -> BlockState {
        self.require_construct();
        require_bool("if condition", cond);
        let c = self.operand(cond);

        let true_block = self.new_block("true_block");
        let false_block = self.new_block("false_block");
        let merge_block = self.new_block("merge_block");
        self.line(&format!("if ({}) {{", cond.bare_repr()));
        self.terminate(|b| b.cond_br(c, true_block, false_block));

        self.switch_to(true_block);
        self.nested(then);
        let then_closed = self.block_state().is_closed();
        self.line("} else {");
        self.branch_if_open(merge_block);

        self.switch_to(false_block);
        self.nested(otherwise);
        let else_closed = self.block_state().is_closed();
        self.line("}");
        self.branch_if_open(merge_block);

        self.switch_to(merge_block);
        if then_closed && else_closed {
            trace!("both arms terminated, sealing merge block");
            self.seal_dead_block();
            return BlockState::Closed;
        }
        BlockState::Open
    }

    /// `while (c) { body }`.
    ///
    /// `cond` runs twice: once to render the header line, once in the guard
    /// block to emit the test, located on the header. It may compute values
    /// but not add statements, open constructs or declare variables.
    #[track_caller]
    pub fn while_(
        &mut self,
        mut cond: impl FnMut(&mut Self) -> Value,
        body: impl FnOnce(&mut Self),
    ) -> BlockState {
        self.require_construct();
        let rendered = self.in_condition(ConditionPass::Render, &mut cond);
        require_bool("while condition", &rendered);

        let guard = self.new_block("while_continue");
        let iteration = self.new_block("while_iteration");
        let exit = self.new_block("while_break");
        self.line(&format!("while ({}) {{", rendered.bare_repr()));
        self.terminate(|b| b.br(guard));

        self.switch_to(guard);
        let test = self.in_condition(ConditionPass::Emit, &mut cond);
        require_bool("while condition", &test);
        let c = self.operand(&test);
        self.terminate(|b| b.cond_br(c, iteration, exit));

        self.switch_to(iteration);
        self.loops.push(LoopContext {
            continue_block: guard,
            exit_block: exit,
        });
        self.nested(body);
        self.loops.pop();
        self.line("}");
        self.branch_if_open(guard);

        self.switch_to(exit);
        BlockState::Open
    }

    /// `break;` out of the innermost loop.
    #[track_caller]
    pub fn break_(&mut self) -> BlockState {
        self.require_construct();
        let target = self.innermost_loop("break").exit_block;
        self.line("break;");
        self.terminate(|b| b.br(target))
    }

    /// `continue;` with the innermost loop's next test.
    #[track_caller]
    pub fn continue_(&mut self) -> BlockState {
        self.require_construct();
        let target = self.innermost_loop("continue").continue_block;
        self.line("continue;");
        self.terminate(|b| b.br(target))
    }

    /// `return;` from a void function.
    #[track_caller]
    pub fn return_(&mut self) -> BlockState {
        self.require_construct();
        self.check_return(&Type::Void);
        self.line("return;");
        self.terminate(|b| b.ret(None))
    }

    /// `return v;`.
    #[track_caller]
    pub fn return_value(&mut self, value: &Value) -> BlockState {
        self.require_construct();
        self.check_return(value.ty());
        self.line(&format!("return {};", value.bare_repr()));
        let v = self.operand(value);
        self.terminate(|b| b.ret(Some(v)))
    }

    #[track_caller]
    fn innermost_loop(&self, statement: &'static str) -> LoopContext {
        match self.loops.last() {
            Some(ctx) => *ctx,
            None => violation(UsageError::OutsideLoop { statement }),
        }
    }

    #[track_caller]
    fn check_return(&self, found: &Type) {
        let func = self.function();
        let expected = &func.signature().ret;
        if expected != found {
            violation(UsageError::ReturnMismatch {
                name: func.name().to_owned(),
                expected: expected.clone(),
                found: found.clone(),
            });
        }
    }
}
