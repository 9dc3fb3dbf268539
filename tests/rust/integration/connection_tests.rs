//! Relay-style connections end to end

#[cfg(test)]
mod connection_tests {
    use graphcypher::pagination::cursor;
    use graphcypher::translator::{FieldSelection, TranslateError};
    use serde_json::json;

    use crate::run_query;

    fn edges_with_node(fields: &[&str]) -> FieldSelection {
        FieldSelection::new("edges")
            .with_selections(vec![FieldSelection::new("node").with_selections(FieldSelection::leaves(fields))])
    }

    /// totalCount is taken before the window; one extra row decides hasNextPage
    #[test]
    fn test_first_page_of_actors() {
        let statement = run_query(
            FieldSelection::new("actorsConnection")
                .with_arguments(json!({ "first": 1 }))
                .with_selections(vec![FieldSelection::new("totalCount"), edges_with_node(&["name"])]),
        )
        .unwrap();
        assert_eq!(
            statement.cypher,
            "MATCH (this:Actor)\n\
             WITH collect({ node: this }) AS var0\n\
             WITH var0, size(var0) AS var1\n\
             CALL {\n    WITH var0\n    UNWIND var0 AS var2\n    \
             WITH var2.node AS this3, var2.relationship AS this4\n    \
             WITH *\n    LIMIT $param0\n    \
             WITH collect({ node: this3 { .name } }) AS var5\n    \
             RETURN var5[0..$param1] AS var6, size(var5) > $param2 AS var7\n}\n\
             RETURN { totalCount: var1, edges: [var8 IN range(0, size(var6) - 1) | { node: var6[var8].node }] } AS this"
        );
        assert_eq!(statement.params["param0"], json!(2));
        assert_eq!(statement.params["param1"], json!(1));
    }

    #[test]
    fn test_after_cursor_moves_offset() {
        let statement = run_query(
            FieldSelection::new("moviesConnection")
                .with_arguments(json!({ "first": 2, "after": cursor::encode(3) }))
                .with_selections(vec![FieldSelection::new("pageInfo")
                    .with_selections(FieldSelection::leaves(&["hasPreviousPage", "hasNextPage"]))]),
        )
        .unwrap();
        assert!(statement.cypher.contains("SKIP $param0"));
        assert!(statement.cypher.contains("hasPreviousPage: true"));
        assert_eq!(statement.params["param0"], json!(4));
        assert_eq!(statement.params["param1"], json!(3));
    }

    #[test]
    fn test_foreign_cursor_is_rejected() {
        let err = run_query(
            FieldSelection::new("moviesConnection")
                .with_arguments(json!({ "after": "not a cursor" }))
                .with_selections(vec![FieldSelection::new("totalCount")]),
        )
        .unwrap_err();
        assert!(matches!(err, TranslateError::InvalidCursor { .. }));
    }

    #[test]
    fn test_cursor_text() {
        assert_eq!(cursor::encode(0), "YXJyYXljb25uZWN0aW9uOjA=");
        assert_eq!(cursor::decode(&cursor::encode(7)).unwrap(), 7);
    }

    /// Nested connections run in their own subquery below the parent match
    #[test]
    fn test_nested_connection_with_edge_properties() {
        let statement = run_query(
            FieldSelection::new("movies").with_selections(vec![
                FieldSelection::new("title"),
                FieldSelection::new("actorsConnection")
                    .with_arguments(json!({ "where": { "edge": { "role": "Neo" } } }))
                    .with_selections(vec![FieldSelection::new("edges").with_selections(vec![
                        FieldSelection::new("properties").with_selections(FieldSelection::leaves(&["role"])),
                        FieldSelection::new("node").with_selections(FieldSelection::leaves(&["name"])),
                    ])]),
            ]),
        )
        .unwrap();
        let text = &statement.cypher;
        assert!(text.starts_with("MATCH (this:Movie)\nCALL {\n    WITH this\n    MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)"));
        assert!(text.contains("WHERE this0.role = $param0"));
        assert_eq!(statement.params["param0"], json!("Neo"));
    }
}
