//! Exit codes for the `uniact` binary.
//! Scripts depend on these values; do not renumber.

pub const SUCCESS: i32 = 0;
pub const COMMAND_FAILED: i32 = 1; // Login rejected or route redirected
pub const INTERNAL_ERROR: i32 = 2; // Config, storage or transport failure
pub const UNAUTHORIZED: i32 = 3; // No session or token rejected
