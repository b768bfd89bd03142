//! Session configuration.

use std::env;
use std::path::{Path, PathBuf};

use weave_ir::DebugLevel;

/// Enables streaming every synthetic line to stderr as it is generated.
pub const ENV_DUMP_SOURCE: &str = "WEAVE_DUMP_SOURCE";
/// Overrides the directory synthetic sources are written under.
pub const ENV_SOURCE_DIR: &str = "WEAVE_SOURCE_DIR";
/// Debug detail level: `none`, `line-tables` or `full`.
pub const ENV_DEBUG_LEVEL: &str = "WEAVE_DEBUG_LEVEL";

/// Settings for one [`ModuleBuilder`](crate::ModuleBuilder) session.
///
/// The synthetic source of a session is written to
/// `<source_root>/cg_<context_name>/<module_name>.c`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Groups the modules of one compiler context on disk.
    pub context_name: String,
    pub module_name: String,
    /// Defaults to the system temp directory.
    pub source_root: Option<PathBuf>,
    /// Echo synthetic lines to stderr while generating.
    pub live_dump: bool,
    pub debug_level: DebugLevel,
}

impl SessionConfig {
    pub fn new(context_name: impl Into<String>, module_name: impl Into<String>) -> Self {
        Self {
            context_name: context_name.into(),
            module_name: module_name.into(),
            source_root: None,
            live_dump: false,
            debug_level: DebugLevel::default(),
        }
    }

    /// Defaults overridden by `WEAVE_DUMP_SOURCE`, `WEAVE_SOURCE_DIR` and
    /// `WEAVE_DEBUG_LEVEL`.
    pub fn from_env(context_name: impl Into<String>, module_name: impl Into<String>) -> Self {
        let mut config = Self::new(context_name, module_name);
        if env::var_os(ENV_DUMP_SOURCE).is_some_and(|v| !v.is_empty()) {
            config.live_dump = true;
        }
        if let Some(dir) = env::var_os(ENV_SOURCE_DIR).filter(|v| !v.is_empty()) {
            config.source_root = Some(PathBuf::from(dir));
        }
        if let Ok(level) = env::var(ENV_DEBUG_LEVEL) {
            match DebugLevel::parse(&level) {
                Some(level) => config.debug_level = level,
                None => tracing::warn!(
                    value = %level,
                    "ignoring unknown {ENV_DEBUG_LEVEL}, expected none, line-tables or full"
                ),
            }
        }
        config
    }

    #[must_use]
    pub fn source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn live_dump(mut self, enabled: bool) -> Self {
        self.live_dump = enabled;
        self
    }

    #[must_use]
    pub fn debug_level(mut self, level: DebugLevel) -> Self {
        self.debug_level = level;
        self
    }

    /// `<source_root>/cg_<context_name>`.
    pub fn source_dir(&self) -> PathBuf {
        let root = self
            .source_root
            .clone()
            .unwrap_or_else(env::temp_dir);
        root.join(format!("cg_{}", self.context_name))
    }

    /// Full path of the synthetic source file.
    pub fn source_path(&self) -> PathBuf {
        self.source_dir().join(Path::new(&self.module_name).with_extension("c"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn source_path_layout() {
        let config = SessionConfig::new("jit", "kernels").source_root("/tmp/weave");
        assert_eq!(
            config.source_path(),
            PathBuf::from("/tmp/weave/cg_jit/kernels.c")
        );
    }

    #[test]
    fn defaults() {
        let config = SessionConfig::new("ctx", "m");
        assert!(!config.live_dump);
        assert_eq!(config.debug_level, DebugLevel::Full);
        assert!(config.source_dir().starts_with(env::temp_dir()));
    }
}
