use crate::error::ErrorCode;
use crate::model::{EntityId, EntityKind, MergeLevel};
use rusqlite::ffi;
use uuid::Uuid;

/// Errors returned by the level merge operations.
///
/// No variant is ever returned after a partial commit: every error means the
/// catalog is exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Fewer than one usable follower remained after normalization.
    #[error("select at least two {} to merge", .level.kind().plural())]
    Validation { level: MergeLevel },

    /// The leader or a follower no longer resolves to a live row.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    /// The store reported a busy or locked database. Retried internally and
    /// surfaced as [`MergeError::Failed`] once retries are exhausted.
    #[error("catalog store busy: {0}")]
    Transient(#[source] rusqlite::Error),

    /// The caller's cancellation token fired before the merge committed.
    #[error("merge cancelled")]
    Cancelled,

    /// Any other persistence failure. The transaction was rolled back.
    #[error("couldn't merge: {0}")]
    Failed(#[source] rusqlite::Error),
}

impl MergeError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::MergeValidation,
            Self::NotFound { .. } => ErrorCode::EntityNotFound,
            Self::Transient(_) => ErrorCode::StoreBusy,
            Self::Cancelled => ErrorCode::MergeCancelled,
            Self::Failed(_) => ErrorCode::MergeFailed,
        }
    }

    /// Remediation hint for operators, if one exists.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub(crate) fn not_found<I: EntityId>(id: I) -> Self {
        Self::NotFound {
            kind: I::KIND,
            id: id.as_uuid(),
        }
    }

    /// Convert a retry-exhausted transient error into a terminal failure.
    pub(crate) fn into_terminal(self) -> Self {
        match self {
            Self::Transient(err) => Self::Failed(err),
            other => other,
        }
    }
}

impl From<rusqlite::Error> for MergeError {
    fn from(err: rusqlite::Error) -> Self {
        if is_locked_error(&err) {
            Self::Transient(err)
        } else {
            Self::Failed(err)
        }
    }
}

pub(crate) fn is_locked_error(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if matches!(
                inner.code,
                ffi::ErrorCode::DatabaseBusy | ffi::ErrorCode::DatabaseLocked
            )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RegionId;

    fn sqlite_failure(code: std::os::raw::c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn busy_and_locked_are_transient() {
        assert!(MergeError::from(sqlite_failure(ffi::SQLITE_BUSY)).is_transient());
        assert!(MergeError::from(sqlite_failure(ffi::SQLITE_LOCKED)).is_transient());
    }

    #[test]
    fn constraint_violation_is_terminal() {
        let err = MergeError::from(sqlite_failure(ffi::SQLITE_CONSTRAINT));
        assert!(matches!(err, MergeError::Failed(_)));
        assert_eq!(err.code(), ErrorCode::MergeFailed);
    }

    #[test]
    fn exhausted_transient_becomes_failed() {
        let err = MergeError::from(sqlite_failure(ffi::SQLITE_BUSY)).into_terminal();
        assert!(matches!(err, MergeError::Failed(_)));
    }

    #[test]
    fn validation_message_names_the_level() {
        let err = MergeError::Validation {
            level: MergeLevel::SubAppellation,
        };
        assert_eq!(err.to_string(), "select at least two sub-appellations to merge");
        assert_eq!(err.code().code(), "E2001");
    }

    #[test]
    fn not_found_names_kind_and_id() {
        let id = RegionId::generate();
        let err = MergeError::not_found(id);
        assert_eq!(err.to_string(), format!("region {id} not found"));
        assert!(err.hint().is_some());
    }
}
