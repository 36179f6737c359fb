//! Interpreter configuration. Plain data, no global state: every
//! `Interpreter` carries its own copy.

/// Default arena budget: 16 MiB.
pub const DEFAULT_MEMORY_BUDGET: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterConfig {
    /// Arena size in bytes. Exhausting it is fatal for the interpreter.
    pub memory_budget: usize,
    /// Merge neighbouring free blocks on release. Off reproduces the
    /// fragmentation behavior of a plain free list.
    pub coalesce_free_blocks: bool,
    /// Maximum nesting of function calls before `CallDepthExceeded`.
    pub max_call_depth: usize,
    /// Make `< <= > >=` against `undefined` evaluate to `true` instead of failing.
    pub legacy_undefined_compare: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            memory_budget: DEFAULT_MEMORY_BUDGET,
            coalesce_free_blocks: true,
            max_call_depth: 256,
            legacy_undefined_compare: false,
        }
    }
}

impl InterpreterConfig {
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget = bytes;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.coalesce_free_blocks = enabled;
        self
    }

    pub fn with_legacy_undefined_compare(mut self, enabled: bool) -> Self {
        self.legacy_undefined_compare = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = InterpreterConfig::default();
        assert_eq!(cfg.memory_budget, DEFAULT_MEMORY_BUDGET);
        assert!(cfg.coalesce_free_blocks);
        assert_eq!(cfg.max_call_depth, 256);
        assert!(!cfg.legacy_undefined_compare);
    }

    #[test]
    fn builder_overrides() {
        let cfg = InterpreterConfig::default()
            .with_memory_budget(4096)
            .with_max_call_depth(8)
            .with_coalescing(false)
            .with_legacy_undefined_compare(true);
        assert_eq!(cfg.memory_budget, 4096);
        assert_eq!(cfg.max_call_depth, 8);
        assert!(!cfg.coalesce_free_blocks);
        assert!(cfg.legacy_undefined_compare);
    }
}
