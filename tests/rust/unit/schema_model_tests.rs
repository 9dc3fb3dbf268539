//! Schema loading and model validation

#[cfg(test)]
mod schema_model_tests {
    use graphcypher::graph_catalog::{GraphSchema, GraphSchemaConfig, ModelError, RootField};

    fn build(yaml: &str) -> Result<GraphSchema, ModelError> {
        GraphSchemaConfig::from_yaml_str(yaml)?.build()
    }

    /// Every node contributes its six root fields
    #[test]
    fn test_fixture_root_fields() {
        let schema = crate::movie_schema();
        for (field, expected) in [
            ("movies", RootField::Read("Movie".to_string())),
            ("moviesConnection", RootField::Connection("Movie".to_string())),
            ("moviesAggregate", RootField::Aggregate("Movie".to_string())),
            ("createPeople", RootField::Create("Person".to_string())),
            ("updateSeries", RootField::Update("Series".to_string())),
            ("deleteActors", RootField::Delete("Actor".to_string())),
        ] {
            assert_eq!(schema.root_field(field), Some(&expected), "{}", field);
        }
        assert!(schema.root_field("film").is_none());
    }

    #[test]
    fn test_fixture_relationships() {
        let schema = crate::movie_schema();
        let movie = schema.node("Movie").unwrap();
        let director = movie.relationship("director").unwrap();
        assert!(director.is_one());
        assert!(director.required);
        assert!(!movie.relationship("actors").unwrap().is_one());
        let names: Vec<&str> = movie.one_relationships().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["director", "studio"]);
    }

    #[test]
    fn test_unknown_union_member() {
        let err = build(
            r#"
unions:
  - name: Anything
    members: [Ghost]
nodes:
  - name: Thing
    attributes:
      - { name: name, type: String }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::UnknownUnionMember { .. }));
    }

    #[test]
    fn test_duplicate_type() {
        let err = build(
            r#"
nodes:
  - name: Thing
    attributes:
      - { name: name, type: String }
  - name: Thing
    attributes:
      - { name: title, type: String }
"#,
        )
        .unwrap_err();
        assert_eq!(err, ModelError::DuplicateType { name: "Thing".to_string() });
    }

    #[test]
    fn test_unknown_attribute_type() {
        let err = build(
            r#"
nodes:
  - name: Thing
    attributes:
      - { name: weight, type: Decimal128 }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::UnknownAttributeType { .. }));
    }

    #[test]
    fn test_conflicting_plurals() {
        let err = build(
            r#"
nodes:
  - name: Sheep
    plural: flock
    attributes:
      - { name: name, type: String }
  - name: Goat
    plural: flock
    attributes:
      - { name: name, type: String }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::RootFieldConflict { .. }));
    }

    #[test]
    fn test_rule_referencing_unknown_field() {
        let err = build(
            r#"
nodes:
  - name: Doc
    attributes:
      - { name: id, type: ID }
    authorization:
      filter:
        - where: { node: { owner: "$jwt.sub" } }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidAuthorizationRule { .. }));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = GraphSchemaConfig::from_yaml_str("nodes: [").unwrap_err();
        assert!(matches!(err, ModelError::ConfigParseError { .. }));
    }
}
