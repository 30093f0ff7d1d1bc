//! Stable exit codes for tdgen CLI commands.

/// Command succeeded (tests passed / test files generated and compiling).
pub const OK: i32 = 0;
/// Environment or infrastructure failure (layout, config, capability error).
pub const INVALID: i32 = 1;
/// The model declared the task impossible.
pub const IMPOSSIBLE: i32 = 2;
/// The retry budget was exhausted without a passing verification.
pub const EXHAUSTED: i32 = 3;
