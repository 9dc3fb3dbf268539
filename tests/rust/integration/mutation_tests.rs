//! Nested mutations end to end

#[cfg(test)]
mod mutation_tests {
    use graphcypher::auth::AuthContext;
    use graphcypher::translator::{FieldSelection, Operation, TranslateError, Translator};
    use serde_json::{json, Value};

    use crate::{movie_schema, run_mutation};

    fn update_movies(arguments: Value) -> String {
        run_mutation(
            FieldSelection::new("updateMovies")
                .with_arguments(arguments)
                .with_selections(vec![FieldSelection::new("movies").with_selections(FieldSelection::leaves(&["title"]))]),
        )
        .unwrap()
        .cypher
    }

    fn position(text: &str, needle: &str) -> usize {
        text.find(needle).unwrap_or_else(|| panic!("`{}` not found in:\n{}", needle, text))
    }

    /// Swapping a required director checks the count once, after both phases
    #[test]
    fn test_director_swap_guards_after_disconnect_and_connect() {
        let text = update_movies(json!({
            "where": { "title": "The Matrix" },
            "update": { "director": {
                "disconnect": { "where": { "node": { "id": "p1" } } },
                "connect": { "where": { "node": { "id": "p2" } } }
            } }
        }));
        let disconnect = position(&text, "DELETE");
        let connect = position(&text, "MERGE");
        let guard = position(&text, "\"Movie.director required exactly once\"");
        assert!(disconnect < connect && connect < guard, "{}", text);
        assert_eq!(text.matches("required exactly once").count(), 1);
        assert!(!text.contains("Movie.studio"));
        assert!(text.ends_with("RETURN collect(this { .title }) AS data"));
    }

    #[test]
    fn test_phase_order_ignores_input_key_order() {
        let connect_first = update_movies(json!({
            "update": { "director": {
                "connect": { "where": { "node": { "id": "p2" } } },
                "disconnect": { "where": { "node": { "id": "p1" } } }
            } }
        }));
        let disconnect_first = update_movies(json!({
            "update": { "director": {
                "disconnect": { "where": { "node": { "id": "p1" } } },
                "connect": { "where": { "node": { "id": "p2" } } }
            } }
        }));
        assert_eq!(connect_first, disconnect_first);
    }

    /// Creating a movie without a director still emits the runtime guard
    #[test]
    fn test_create_emits_cardinality_guards() {
        let statement = run_mutation(
            FieldSelection::new("createMovies")
                .with_arguments(json!({ "input": [{ "title": "Dune" }] }))
                .with_selections(vec![FieldSelection::new("movies").with_selections(FieldSelection::leaves(&["title"]))]),
        )
        .unwrap();
        let text = &statement.cypher;
        assert!(text.starts_with("CALL {\n    CREATE (this0:Movie)\n"));
        assert!(text.contains("\"Movie.director required exactly once\""));
        assert!(text.contains("\"Movie.studio must be less than or equal to one\""));
        assert!(text.contains("randomUUID()"));
        assert!(statement.params.values().any(|value| value == &json!("Dune")));
    }

    #[test]
    fn test_create_without_required_attribute() {
        let err = run_mutation(FieldSelection::new("createMovies").with_arguments(json!({ "input": [{ "released": 1999 }] })))
            .unwrap_err();
        assert!(matches!(err, TranslateError::MissingRequiredField { .. }));
    }

    #[test]
    fn test_connect_or_create_merges_on_unique_key() {
        let text = update_movies(json!({
            "connectOrCreate": { "actors": {
                "where": { "node": { "name": "Keanu" } },
                "onCreate": { "node": { "born": 1964 }, "edge": { "role": "Neo" } }
            } }
        }));
        assert!(text.contains("MERGE (this0:Actor { name: $param0 })\n    ON CREATE SET this0.born = $param1"));
        assert!(text.contains("MERGE (this)<-[this1:ACTED_IN]-(this0)\n    ON CREATE SET this1.role = $param2"));
    }

    #[test]
    fn test_disabled_root_and_nested_operations() {
        let err = run_mutation(FieldSelection::new("deleteStudios")).unwrap_err();
        assert!(matches!(err, TranslateError::OperationDisabled { .. }));

        let err = run_mutation(FieldSelection::new("updateStudios").with_arguments(json!({
            "update": { "movies": [{ "create": [{ "node": { "title": "M" } }] }] }
        })))
        .unwrap_err();
        assert!(matches!(err, TranslateError::NestedOperationNotAllowed { .. }));
    }

    #[test]
    fn test_mutation_root_requires_mutation_operation() {
        let schema = movie_schema();
        let err = Translator::new(&schema)
            .translate(&Operation::query(FieldSelection::new("createMovies")), &AuthContext::anonymous())
            .unwrap_err();
        assert!(matches!(err, TranslateError::InvalidArgument { .. }));
    }

    /// Same operation, same text and parameters
    #[test]
    fn test_mutation_translation_is_deterministic() {
        let arguments = json!({
            "where": { "released_GT": 1990 },
            "update": {
                "title": "T",
                "actors": [{ "where": { "node": { "name": "A" } }, "update": { "edge": { "role": "R" } } }]
            }
        });
        let first = run_mutation(FieldSelection::new("updateMovies").with_arguments(arguments.clone())).unwrap();
        let second = run_mutation(FieldSelection::new("updateMovies").with_arguments(arguments)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    /// One schema serves concurrent translations
    #[test]
    fn test_schema_shared_across_threads() {
        let schema = std::sync::Arc::new(movie_schema());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let schema = std::sync::Arc::clone(&schema);
                std::thread::spawn(move || {
                    let operation = Operation::mutation(
                        FieldSelection::new("createPeople").with_arguments(json!({ "input": [{ "name": format!("P{}", i) }] })),
                    );
                    Translator::new(&schema)
                        .translate(&operation, &AuthContext::anonymous())
                        .unwrap()
                })
            })
            .collect();
        let statements: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for statement in &statements[1..] {
            assert_eq!(statement.cypher, statements[0].cypher);
            assert_eq!(statement.fingerprint(), statements[0].fingerprint());
        }
    }
}
