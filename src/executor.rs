//! Executor seam.
//!
//! The translator never talks to a database. Callers implement
//! [`StatementExecutor`] over their driver and run emitted statements through
//! [`execute_statement`], which maps errors raised by emitted guards back to
//! [`TranslateError::Forbidden`] and [`TranslateError::Cardinality`].

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::FORBIDDEN;
use crate::cypher::CypherStatement;
use crate::translator::TranslateError;

lazy_static! {
    static ref FORBIDDEN_MESSAGE: Regex = Regex::new(&format!(r"(?:^|[:\s]){}$", FORBIDDEN)).unwrap();
    static ref CARDINALITY_MESSAGE: Regex = Regex::new(
        r"([A-Za-z_][A-Za-z0-9_]*\.[A-Za-z_][A-Za-z0-9_]* (?:required exactly once|must be less than or equal to one))"
    )
    .unwrap();
}

/// Errors reported by an executor implementation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionError {
    /// The database rejected or aborted the statement
    #[error("{message}")]
    Database {
        code: Option<String>,
        message: String,
    },

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Runs a statement inside the caller's transaction and returns its records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn execute(&self, statement: &CypherStatement) -> Result<Vec<Map<String, Value>>, ExecutionError>;
}

/// Map an executor error onto the request-level taxonomy. Guard messages are
/// recognized inside whatever text the driver wraps them in; everything else
/// passes through unchanged.
pub fn classify_execution_error(error: &ExecutionError) -> TranslateError {
    let message = match error {
        ExecutionError::Database { message, .. } => message.trim(),
        ExecutionError::Connection(_) => {
            return TranslateError::Execution {
                message: error.to_string(),
            }
        }
    };
    if let Some(captures) = CARDINALITY_MESSAGE.captures(message) {
        return TranslateError::Cardinality {
            message: captures[1].to_string(),
        };
    }
    if FORBIDDEN_MESSAGE.is_match(message) {
        return TranslateError::Forbidden;
    }
    TranslateError::Execution {
        message: message.to_string(),
    }
}

/// Execute `statement` and classify any failure.
pub async fn execute_statement(
    executor: &dyn StatementExecutor,
    statement: &CypherStatement,
) -> Result<Vec<Map<String, Value>>, TranslateError> {
    executor.execute(statement).await.map_err(|error| {
        let classified = classify_execution_error(&error);
        log::debug!("execution failed: {} ({:?})", error, classified.kind());
        classified
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn database(message: &str) -> ExecutionError {
        ExecutionError::Database {
            code: Some("Neo.ClientError.Procedure.ProcedureCallFailed".to_string()),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_classify_guard_messages() {
        assert_eq!(
            classify_execution_error(&database(
                "Failed to invoke function `apoc.util.validatePredicate`: Caused by: java.lang.RuntimeException: Forbidden"
            )),
            TranslateError::Forbidden
        );
        assert_eq!(
            classify_execution_error(&database(
                "Failed to invoke function `apoc.util.validatePredicate`: Caused by: java.lang.RuntimeException: Movie.director required exactly once"
            )),
            TranslateError::Cardinality {
                message: "Movie.director required exactly once".to_string()
            }
        );
        assert!(matches!(
            classify_execution_error(&database("Forbidden fruit is not a label")),
            TranslateError::Execution { .. }
        ));
        assert!(matches!(
            classify_execution_error(&ExecutionError::Connection("refused".to_string())),
            TranslateError::Execution { .. }
        ));
    }

    #[tokio::test]
    async fn test_execute_statement_with_mock() {
        let mut executor = MockStatementExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_| Err(database("Movie.studio must be less than or equal to one")));
        let statement = CypherStatement {
            cypher: "RETURN 1".to_string(),
            params: Map::new(),
        };
        let err = execute_statement(&executor, &statement).await.unwrap_err();
        assert_eq!(
            err,
            TranslateError::Cardinality {
                message: "Movie.studio must be less than or equal to one".to_string()
            }
        );
    }

    #[test]
    fn test_execute_statement_returns_records() {
        let statement = CypherStatement {
            cypher: "RETURN 1".to_string(),
            params: Map::new(),
        };
        let mut executor = MockStatementExecutor::new();
        executor.expect_execute().returning(|statement| {
            let mut record = Map::new();
            record.insert("cypher".to_string(), json!(statement.cypher));
            Ok(vec![record])
        });
        let records = tokio_test::block_on(execute_statement(&executor, &statement)).unwrap();
        assert_eq!(records[0]["cypher"], json!("RETURN 1"));
    }
}
