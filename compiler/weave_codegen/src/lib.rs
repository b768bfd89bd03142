//! Structured code generation with a synthetic, debuggable source.
//!
//! Generator code describes functions with structured constructs (`if`,
//! `while`, variables, calls) on a [`ModuleBuilder`]. Each construct is
//! lowered to basic blocks on a [`Backend`](weave_ir::Backend) and, at the
//! same time, rendered as a line of C-like text. The text is written next
//! to the compiled module and every instruction's debug location points at
//! its line, so a debugger stepping through JIT code shows readable source.
//!
//! # Debug Environment Variables
//!
//! - `WEAVE_DUMP_SOURCE`: Echo each synthetic line to stderr as it is
//!   generated. Any non-empty value enables this.
//!
//! - `WEAVE_SOURCE_DIR`: Directory synthetic sources are written under
//!   (defaults to the system temp directory).
//!
//! - `WEAVE_DEBUG_LEVEL`: `none`, `line-tables` or `full`.
//!
//! - `RUST_LOG=weave_codegen=debug`: Function and build events.
//!
//! - `RUST_LOG=weave_codegen=trace`: Every line and block switch.
//!
//! The `WEAVE_*` variables are read by [`SessionConfig::from_env`].
//!
//! # Usage Errors
//!
//! Describing an invalid program (a `break` outside a loop, code after a
//! `return`, mismatched types) is a bug in the generator, not a runtime
//! condition. It panics at the call site with a [`UsageError`] message.
//! Only [`ModuleBuilder::build`] and [`ModuleBuilder::new`] return errors.
//!
//! # Example
//!
//! ```
//! use weave_codegen::{ModuleBuilder, SessionConfig, Variable};
//! use weave_ir::{RecordingBackend, Signature, Type};
//!
//! let root = std::env::temp_dir().join("weave-doc");
//! let config = SessionConfig::new("doc", "sum").source_root(&root);
//! let mut mb = ModuleBuilder::new(RecordingBackend::new("sum"), config).unwrap();
//!
//! mb.begin_function("sum", &Signature::new(Type::I64).param("n", Type::I64));
//! let zero = mb.i64(0);
//! let acc = Variable::with_value(&mut mb, "acc", &zero);
//! let i = Variable::with_value(&mut mb, "i", &zero);
//! mb.while_(
//!     |mb| {
//!         let (i, n) = (i.get(mb), mb.param(0));
//!         mb.lt(&i, &n)
//!     },
//!     |mb| {
//!         let (a, x) = (acc.get(mb), i.get(mb));
//!         let sum = mb.add(&a, &x);
//!         acc.set(mb, &sum);
//!         let one = mb.i64(1);
//!         let next = mb.add(&x, &one);
//!         i.set(mb, &next);
//!     },
//! );
//! let result = acc.get(&mut mb);
//! mb.return_value(&result);
//! mb.end_function();
//!
//! let compiled = mb.build().unwrap();
//! assert!(compiled.source.contains("while (i < n) {"));
//! ```

mod builder;
mod config;
mod control_flow;
mod error;
mod session;
mod source;
mod value;
mod variable;

pub use builder::{BlockState, CompiledModule, FunctionRef, ModuleBuilder};
pub use config::{SessionConfig, ENV_DEBUG_LEVEL, ENV_DUMP_SOURCE, ENV_SOURCE_DIR};
pub use error::{violation, BuildError, UsageError};
pub use session::session_active;
pub use source::SourceRecorder;
pub use value::Value;
pub use variable::Variable;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
