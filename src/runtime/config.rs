use serde::{Deserialize, Serialize};

/// Configuration for program evaluation
///
/// Both limits guard the native stack: `max_call_depth` bounds nested user
/// function calls, `max_eval_depth` bounds nested expression evaluation
/// (calls included). The defaults fit the 2 MiB stack of a spawned thread in
/// an unoptimized build; hosts running on bigger stacks can raise them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Maximum number of nested function calls (default: 200)
    pub max_call_depth: usize,
    /// Maximum number of nested expression evaluations (default: 256)
    pub max_eval_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 200,
            max_eval_depth: 256,
        }
    }
}

impl EvaluatorConfig {
    /// Sets the maximum number of nested function calls
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Sets the maximum number of nested expression evaluations
    pub fn with_max_eval_depth(mut self, max_eval_depth: usize) -> Self {
        self.max_eval_depth = max_eval_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EvaluatorConfig::default();
        assert_eq!(config.max_call_depth, 200);
        assert_eq!(config.max_eval_depth, 256);
    }

    #[test]
    fn test_builder_setters() {
        let config = EvaluatorConfig::default()
            .with_max_call_depth(10)
            .with_max_eval_depth(1000);
        assert_eq!(config.max_call_depth, 10);
        assert_eq!(config.max_eval_depth, 1000);
    }
}
