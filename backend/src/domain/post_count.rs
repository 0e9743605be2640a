//! Derived per-user post counter.
//!
//! A user's `post_count` equals the number of their live posts. Repositories
//! apply an adjustment in the same transaction as the post write that caused
//! it, using the store's atomic `post_count = post_count ± 1` primitive.
//! In-process copies use [`PostCountAdjustment::apply`], which refuses to go
//! below zero.

use tracing::error;

use super::error::Error;

/// Operator-facing marker attached to consistency failure logs.
pub const POST_COUNT_ALERT: &str = "post_count_consistency";

/// Direction of a post counter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCountAdjustment {
    /// A post was created.
    Increment,
    /// A post was soft-deleted.
    Decrement,
}

impl PostCountAdjustment {
    /// Signed delta for store-level arithmetic.
    pub fn delta(self) -> i64 {
        match self {
            Self::Increment => 1,
            Self::Decrement => -1,
        }
    }

    /// Apply to an in-memory counter. `None` means the result would be
    /// negative or overflow.
    pub fn apply(self, count: u64) -> Option<u64> {
        match self {
            Self::Increment => count.checked_add(1),
            Self::Decrement => count.checked_sub(1),
        }
    }
}

/// Log a counter that could not be kept consistent and build the client error.
///
/// These failures are never retried; operators reconcile the counter with
/// the `reconcile-post-counts` tool.
pub fn consistency_failure(owner_id: &str, reason: &str) -> Error {
    error!(
        alert = POST_COUNT_ALERT,
        owner_id,
        reason,
        "post count could not be kept consistent"
    );
    Error::internal(format!("post count consistency failure: {reason}"))
}
