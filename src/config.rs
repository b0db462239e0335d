/// Function calls may nest this deep before the run is aborted.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Limits applied while a program runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub max_call_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            // overridden from the command line with --max-depth
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
