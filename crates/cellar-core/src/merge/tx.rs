//! Transaction scope, retry, and cancellation for merges.
//!
//! A merge body runs inside one `BEGIN IMMEDIATE` transaction. Taking the
//! reserved lock up front means two overlapping merges serialize at `BEGIN`
//! instead of deadlocking on lock upgrade mid-merge. When the store reports
//! busy/locked, the whole body is re-run from scratch after a bounded
//! exponential backoff.

use super::error::MergeError;
use crate::config::MergeConfig;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Bounded exponential backoff for transient store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn once() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn from_config(config: &MergeConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&MergeConfig::default())
    }
}

/// Cooperative cancellation flag shared between a caller and a running merge.
///
/// Cloning shares the flag. The merge checks it before every attempt and at
/// every reconciled node; a fired token rolls the transaction back.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self) -> Result<(), MergeError> {
        if self.is_cancelled() {
            Err(MergeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Per-request merge settings.
#[derive(Debug, Clone, Default)]
pub struct MergeContext {
    pub retry: RetryPolicy,
    pub cancel: CancelToken,
}

impl MergeContext {
    #[must_use]
    pub const fn new(retry: RetryPolicy, cancel: CancelToken) -> Self {
        Self { retry, cancel }
    }
}

/// Run `attempt` until it succeeds, fails terminally, or the policy runs out.
///
/// Only [`MergeError::Transient`] is retried. A transient error on the final
/// attempt is returned as [`MergeError::Failed`].
pub(crate) fn with_retry<T>(
    policy: &RetryPolicy,
    cancel: &CancelToken,
    mut attempt: impl FnMut(u32) -> Result<T, MergeError>,
) -> Result<T, MergeError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_backoff;
    let mut n = 1;

    loop {
        cancel.check()?;
        match attempt(n) {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && n < max_attempts => {
                tracing::warn!(
                    attempt = n,
                    max_attempts,
                    backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "catalog busy, retrying merge"
                );
                std::thread::sleep(delay);
                delay = delay.saturating_mul(2).min(policy.max_backoff);
                n += 1;
            }
            Err(err) => return Err(err.into_terminal()),
        }
    }
}

/// Run `body` in an immediate transaction, committing only if it succeeds.
///
/// Any error drops the transaction, which rolls it back.
pub(crate) fn run_in_transaction<T>(
    conn: &mut Connection,
    body: impl FnOnce(&Transaction<'_>) -> Result<T, MergeError>,
) -> Result<T, MergeError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = body(&tx)?;
    tx.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;
    use std::cell::Cell;

    fn busy() -> MergeError {
        MergeError::from(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_BUSY),
            None,
        ))
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    #[test]
    fn transient_errors_are_retried_until_success() {
        let calls = Cell::new(0);
        let result = with_retry(&fast_policy(3), &CancelToken::new(), |attempt| {
            calls.set(calls.get() + 1);
            if attempt < 3 { Err(busy()) } else { Ok(attempt) }
        });
        assert_eq!(result.expect("third attempt succeeds"), 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn exhausted_retries_surface_as_failed() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(&fast_policy(2), &CancelToken::new(), |_| {
            calls.set(calls.get() + 1);
            Err(busy())
        });
        assert!(matches!(result, Err(MergeError::Failed(_))));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn terminal_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(&fast_policy(5), &CancelToken::new(), |_| {
            calls.set(calls.get() + 1);
            Err(MergeError::Cancelled)
        });
        assert!(matches!(result, Err(MergeError::Cancelled)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn cancelled_token_stops_before_first_attempt() {
        let cancel = CancelToken::new();
        cancel.clone().cancel();
        let result: Result<(), _> = with_retry(&fast_policy(3), &cancel, |_| {
            panic!("attempt must not run once cancelled")
        });
        assert!(matches!(result, Err(MergeError::Cancelled)));
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let calls = Cell::new(0);
        let _ = with_retry(&fast_policy(0), &CancelToken::new(), |_| {
            calls.set(calls.get() + 1);
            Ok(())
        });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failed_body_rolls_back() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch("CREATE TABLE t (v INTEGER)")?;

        let result: Result<(), _> = run_in_transaction(&mut conn, |tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Err(MergeError::Cancelled)
        });
        assert!(matches!(result, Err(MergeError::Cancelled)));

        let rows: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))?;
        assert_eq!(rows, 0);
        Ok(())
    }

    #[test]
    fn successful_body_commits() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch("CREATE TABLE t (v INTEGER)")?;

        run_in_transaction(&mut conn, |tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Ok(())
        })
        .expect("commit");

        let rows: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))?;
        assert_eq!(rows, 1);
        Ok(())
    }
}
