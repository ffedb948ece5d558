//! Mapping from SeaORM errors to repository errors.

use sea_orm::{DbErr, RuntimeErr, SqlErr};

use forum_core::error::RepoError;

/// SQLSTATE 40001 (serialization_failure) and 40P01 (deadlock_detected).
const RETRYABLE_SQLSTATES: [&str; 2] = ["40001", "40P01"];

/// Classify a database error. Serialization failures and deadlocks become
/// [`RepoError::Conflict`] so callers can retry them.
pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    if let Some(SqlErr::UniqueConstraintViolation(msg)) = err.sql_err() {
        return RepoError::Constraint(msg);
    }

    let retryable =
        sqlstate(&err).is_some_and(|code| RETRYABLE_SQLSTATES.contains(&code.as_str()));

    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => RepoError::Connection(err.to_string()),
        other if retryable => RepoError::Conflict(other.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}

/// The SQLSTATE reported by the server, if the error came from one.
fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Query(RuntimeErr::SqlxError(e)) | DbErr::Exec(RuntimeErr::SqlxError(e)) => e
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    use sea_orm::sqlx;
    use sea_orm::sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct ServerError {
        code: &'static str,
        message: &'static str,
    }

    impl fmt::Display for ServerError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for ServerError {}

    impl DatabaseError for ServerError {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn server_error(code: &'static str, message: &'static str) -> DbErr {
        DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(Box::new(
            ServerError { code, message },
        ))))
    }

    #[test]
    fn test_serialization_failure_and_deadlock_are_conflicts() {
        let err = server_error("40001", "could not serialize access");
        assert!(matches!(map_db_err(err), RepoError::Conflict(_)));

        let err = server_error("40P01", "deadlock detected");
        assert!(matches!(map_db_err(err), RepoError::Conflict(_)));
    }

    #[test]
    fn test_code_in_message_text_is_not_a_conflict() {
        let err = server_error("42P01", "relation \"t_40001\" does not exist");
        assert!(matches!(map_db_err(err), RepoError::Query(_)));

        let err = DbErr::Custom("post 40001 deadlock detected".into());
        assert!(matches!(map_db_err(err), RepoError::Query(_)));
    }
}
