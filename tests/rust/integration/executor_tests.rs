//! Statements handed to a caller-supplied executor

#[cfg(test)]
mod executor_tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use graphcypher::executor::{execute_statement, ExecutionError, StatementExecutor};
    use graphcypher::translator::{ErrorKind, FieldSelection, TranslateError};
    use graphcypher::CypherStatement;
    use serde_json::{json, Map, Value};

    use crate::{run_mutation, run_query};

    /// Records what it was asked to run and answers with a canned result
    struct RecordingExecutor {
        seen: Mutex<Vec<CypherStatement>>,
        answer: Result<Vec<Map<String, Value>>, ExecutionError>,
    }

    impl RecordingExecutor {
        fn answering(answer: Result<Vec<Map<String, Value>>, ExecutionError>) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                answer,
            }
        }
    }

    #[async_trait]
    impl StatementExecutor for RecordingExecutor {
        async fn execute(&self, statement: &CypherStatement) -> Result<Vec<Map<String, Value>>, ExecutionError> {
            self.seen.lock().unwrap().push(statement.clone());
            self.answer.clone()
        }
    }

    fn guard_failure(message: &str) -> ExecutionError {
        ExecutionError::Database {
            code: Some("Neo.ClientError.Procedure.ProcedureCallFailed".to_string()),
            message: format!(
                "Failed to invoke function `apoc.util.validatePredicate`: Caused by: java.lang.RuntimeException: {}",
                message
            ),
        }
    }

    #[tokio::test]
    async fn test_statement_reaches_executor_unchanged() {
        let statement = run_query(FieldSelection::new("people").with_selections(FieldSelection::leaves(&["name"])))
            .unwrap();
        let mut record = Map::new();
        record.insert("this".to_string(), json!({ "name": "Lana" }));
        let executor = RecordingExecutor::answering(Ok(vec![record]));

        let records = execute_statement(&executor, &statement).await.unwrap();
        assert_eq!(records[0]["this"]["name"], json!("Lana"));
        assert_eq!(executor.seen.lock().unwrap().as_slice(), &[statement]);
    }

    #[tokio::test]
    async fn test_cardinality_guard_failure_is_classified() {
        let statement = run_mutation(
            FieldSelection::new("createMovies").with_arguments(json!({ "input": [{ "title": "Dune" }] })),
        )
        .unwrap();
        let executor = RecordingExecutor::answering(Err(guard_failure("Movie.director required exactly once")));

        let err = execute_statement(&executor, &statement).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cardinality);
        assert_eq!(err.to_string(), "Movie.director required exactly once");
    }

    #[tokio::test]
    async fn test_authorization_guard_failure_is_classified() {
        let statement = run_query(FieldSelection::new("people").with_selections(FieldSelection::leaves(&["id"])))
            .unwrap();
        let executor = RecordingExecutor::answering(Err(guard_failure("Forbidden")));
        let err = execute_statement(&executor, &statement).await.unwrap_err();
        assert_eq!(err, TranslateError::Forbidden);
    }

    #[tokio::test]
    async fn test_connection_failure_passes_through() {
        let statement = run_query(FieldSelection::new("people").with_selections(FieldSelection::leaves(&["id"])))
            .unwrap();
        let executor = RecordingExecutor::answering(Err(ExecutionError::Connection("refused".to_string())));
        let err = execute_statement(&executor, &statement).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert!(err.to_string().contains("refused"));
    }
}
