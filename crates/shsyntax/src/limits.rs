//! Parse limits
//!
//! Bounds how deeply constructs may nest before the parser gives up on a
//! region instead of exhausting the native stack.
//!
//! Each nesting construct (subshell, brace group, substitution, parameter
//! expansion, compound command, parenthesized arithmetic) takes one level.
//! `&&`/`||` lists and pipelines are parsed iteratively and take none.

/// Default ceiling on nested constructs.
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// Limits applied to a single parse.
#[derive(Debug, Clone)]
pub struct ParseLimits {
    /// Maximum nesting depth of guarded constructs
    /// Default: 500
    pub max_depth: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseLimits {
    /// Create new limits with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Error returned when entering a construct would exceed the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("maximum nesting depth exceeded ({depth} > {max})")]
pub struct DepthExceeded {
    /// Depth the rejected entry would have reached
    pub depth: usize,
    /// Configured ceiling
    pub max: usize,
}

/// Proof of a successful [`RecursionGuard::enter`]; hand it back to `exit`.
#[must_use = "a guard token must be released with RecursionGuard::exit"]
#[derive(Debug)]
pub struct GuardToken {
    depth: usize,
}

/// Per-parse nesting counter.
///
/// Deeply nested input (`((((...))))`, long `$( $( ... ) )`
/// chains) must not overflow the native stack. Every guarded rule enters
/// before recursing and exits on every return path.
#[derive(Debug)]
pub struct RecursionGuard {
    depth: usize,
    max_depth: usize,
    peak: usize,
    trips: usize,
}

impl RecursionGuard {
    /// Create a guard at depth zero.
    pub fn new(limits: &ParseLimits) -> Self {
        Self {
            depth: 0,
            max_depth: limits.max_depth,
            peak: 0,
            trips: 0,
        }
    }

    /// Enter one nesting level, returns error if the ceiling would be exceeded
    pub fn enter(&mut self) -> Result<GuardToken, DepthExceeded> {
        // Check before incrementing so we don't leave invalid state on failure
        if self.depth >= self.max_depth {
            self.trips += 1;
            return Err(DepthExceeded {
                depth: self.depth + 1,
                max: self.max_depth,
            });
        }
        self.depth += 1;
        self.peak = self.peak.max(self.depth);
        Ok(GuardToken { depth: self.depth })
    }

    /// Leave the level entered by `token`.
    pub fn exit(&mut self, token: GuardToken) {
        debug_assert_eq!(token.depth, self.depth, "guard levels released out of order");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Current depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Deepest level reached so far.
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Number of rejected entries.
    pub fn trips(&self) -> usize {
        self.trips
    }
}
