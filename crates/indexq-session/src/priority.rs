//! Scoped priority override.
//!
//! The override lives in a task-local binding: it applies to every
//! entry created inside the scoped future, nested scopes shadow the
//! outer value, and the previous value is restored on every exit path,
//! including panic and cancellation. It is never a mutable global;
//! concurrent tasks see only their own scope.

use std::future::Future;

use tokio::task_local;

task_local! {
    static PRIORITY_OVERRIDE: i32;
}

/// Run `f` with `priority` applied to every entry created inside it.
///
/// Higher values are claimed first. Scopes nest; the innermost wins.
///
/// ```
/// # use indexq_session::{with_priority, current_override};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// with_priority(5, async {
///     assert_eq!(current_override(), Some(5));
///     with_priority(1, async {
///         assert_eq!(current_override(), Some(1));
///     })
///     .await;
///     assert_eq!(current_override(), Some(5));
/// })
/// .await;
/// assert_eq!(current_override(), None);
/// # }
/// ```
pub async fn with_priority<F>(priority: i32, f: F) -> F::Output
where
    F: Future,
{
    PRIORITY_OVERRIDE.scope(priority, f).await
}

/// The override active for the current task, if any.
pub fn current_override() -> Option<i32> {
    PRIORITY_OVERRIDE.try_with(|p| *p).ok()
}

/// Resolve the priority for a new entry: an explicit value wins, then
/// the active scope, then the configured baseline.
pub fn resolve_priority(explicit: Option<i32>, default: i32) -> i32 {
    explicit.or_else(current_override).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_override_outside_scope() {
        assert_eq!(current_override(), None);
        assert_eq!(resolve_priority(None, 0), 0);
    }

    #[tokio::test]
    async fn test_scope_applies_and_restores() {
        with_priority(5, async {
            assert_eq!(current_override(), Some(5));
        })
        .await;
        assert_eq!(current_override(), None);
    }

    #[tokio::test]
    async fn test_nested_scopes_shadow() {
        with_priority(5, async {
            with_priority(1, async {
                assert_eq!(current_override(), Some(1));
            })
            .await;
            assert_eq!(current_override(), Some(5));
        })
        .await;
    }

    #[tokio::test]
    async fn test_explicit_beats_scope() {
        with_priority(5, async {
            assert_eq!(resolve_priority(Some(9), 0), 9);
            assert_eq!(resolve_priority(None, 0), 5);
        })
        .await;
    }

    #[tokio::test]
    async fn test_concurrent_tasks_are_isolated() {
        let in_scope = tokio::spawn(with_priority(3, async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            current_override()
        }));
        let outside = tokio::spawn(async { current_override() });

        assert_eq!(in_scope.await.unwrap(), Some(3));
        assert_eq!(outside.await.unwrap(), None);
    }
}
