use crate::flags::Flags;

/// Default number of VM steps one matching call may spend.
pub const DEFAULT_STEP_LIMIT: u64 = 10_000_000;

/// Default cap on compiled instructions.
pub const DEFAULT_SIZE_LIMIT: usize = 1 << 20;

/// Compile-time options carried by a [`Pattern`](crate::Pattern).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub flags: Flags,
    /// Steps allowed per matching call before [`Error::BudgetExceeded`](crate::Error::BudgetExceeded).
    pub step_limit: u64,
    /// Instructions allowed in a compiled program before [`Error::TooLarge`](crate::Error::TooLarge).
    pub size_limit: usize,
    /// Serve known hot patterns from hand-written matchers.
    pub fast_paths: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            flags: Flags::empty(),
            step_limit: DEFAULT_STEP_LIMIT,
            size_limit: DEFAULT_SIZE_LIMIT,
            fast_paths: true,
        }
    }
}
