//! Filter operators as seen through a root read

#[cfg(test)]
mod filter_operator_tests {
    use graphcypher::auth::AuthContext;
    use graphcypher::translator::{translate, FieldSelection, Operation, TranslateError};
    use serde_json::{json, Map, Value};
    use test_case::test_case;

    fn movies_where(key: &str, value: Value) -> Result<String, TranslateError> {
        let mut filter = Map::new();
        filter.insert(key.to_string(), value);
        let operation = Operation::query(
            FieldSelection::new("movies")
                .with_arguments(json!({ "where": filter }))
                .with_selections(FieldSelection::leaves(&["title"])),
        );
        let schema = crate::movie_schema();
        translate(&schema, &operation, &AuthContext::anonymous()).map(|statement| statement.cypher)
    }

    /// Each suffix maps onto exactly one Cypher comparison
    #[test_case("released", "this.released = $param0"; "equality")]
    #[test_case("released_GT", "this.released > $param0"; "greater than")]
    #[test_case("released_GTE", "this.released >= $param0"; "greater than or equal")]
    #[test_case("released_LT", "this.released < $param0"; "less than")]
    #[test_case("released_LTE", "this.released <= $param0"; "less than or equal")]
    #[test_case("released_NOT", "NOT (this.released = $param0)"; "negated equality")]
    fn test_numeric_operator(key: &str, predicate: &str) {
        let text = movies_where(key, json!(1999)).unwrap();
        assert_eq!(
            text,
            format!("MATCH (this:Movie)\nWHERE {}\nRETURN this {{ .title }} AS this", predicate)
        );
    }

    #[test_case("title_CONTAINS", "this.title CONTAINS $param0"; "contains")]
    #[test_case("title_STARTS_WITH", "this.title STARTS WITH $param0"; "starts with")]
    #[test_case("title_ENDS_WITH", "this.title ENDS WITH $param0"; "ends with")]
    #[test_case("title_NOT_CONTAINS", "NOT (this.title CONTAINS $param0)"; "not contains")]
    fn test_string_operator(key: &str, predicate: &str) {
        let text = movies_where(key, json!("Matrix")).unwrap();
        assert!(text.contains(&format!("WHERE {}\n", predicate)), "{}", text);
    }

    /// Values never appear inline, only as parameters
    #[test]
    fn test_values_are_parameterized() {
        let text = movies_where("title", json!("x' OR 1=1 //")).unwrap();
        assert!(!text.contains("OR 1=1"));
    }

    #[test]
    fn test_in_requires_a_list() {
        assert!(movies_where("released_IN", json!([1999, 2003])).is_ok());
        let err = movies_where("released_IN", json!(1999)).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedFilter { .. }));
    }

    #[test]
    fn test_unknown_filter_field() {
        let err = movies_where("budget_GT", json!(10)).unwrap_err();
        assert!(matches!(
            err,
            TranslateError::UnknownField { .. } | TranslateError::UnsupportedFilter { .. }
        ));
    }

    #[test]
    fn test_matches_is_disabled_by_default() {
        let err = movies_where("title_MATCHES", json!("Ma.*")).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedFilter { .. }));
    }
}
