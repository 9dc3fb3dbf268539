//! Authorization rules seen through whole translations

#[cfg(test)]
mod authorization_tests {
    use graphcypher::auth::AuthContext;
    use graphcypher::graph_catalog::{GraphSchema, GraphSchemaConfig};
    use graphcypher::translator::{translate, ErrorKind, FieldSelection, Operation, TranslateError};
    use serde_json::{json, Value};

    const OWNERSHIP_YAML: &str = r#"
nodes:
  - name: User
    attributes:
      - { name: id, type: ID, unique: true }
  - name: Doc
    attributes:
      - { name: id, type: ID, unique: true }
    relationships:
      - { name: owners, type: OWNED_BY, direction: OUT, target: User }
    authorization:
      filter:
        - operations: [READ]
          where: { node: { owners_ALL: { id: "$jwt.sub" } } }
  - name: Draft
    attributes:
      - { name: id, type: ID, unique: true }
    relationships:
      - { name: owners, type: OWNED_BY, direction: OUT, target: User }
    authorization:
      validate:
        - operations: [READ]
          when: [BEFORE]
          where: { node: { owners_NONE: { id: "$jwt.sub" } } }
"#;

    const MEMBERSHIP_YAML: &str = r#"
nodes:
  - name: Team
    attributes:
      - { name: id, type: ID, unique: true }
    relationships:
      - { name: members, type: MEMBER_OF, direction: IN, target: Member }
    authorization:
      validate:
        - operations: [CREATE_RELATIONSHIP, DELETE_RELATIONSHIP]
          when: [AFTER]
          where: { node: { id: "$jwt.sub" } }
  - name: Member
    attributes:
      - { name: name, type: String, unique: true }
"#;

    fn build(yaml: &str) -> GraphSchema {
        GraphSchemaConfig::from_yaml_str(yaml)
            .and_then(|config| config.build())
            .expect("inline schema should build")
    }

    fn update_teams(arguments: Value, auth: &AuthContext) -> Result<String, TranslateError> {
        let operation = Operation::mutation(FieldSelection::new("updateTeams").with_arguments(arguments));
        translate(&build(MEMBERSHIP_YAML), &operation, auth).map(|statement| statement.cypher)
    }

    fn read(root: &str, fields: &[&str], auth: &AuthContext) -> Result<String, TranslateError> {
        let schema = crate::movie_schema();
        let operation = Operation::query(FieldSelection::new(root).with_selections(FieldSelection::leaves(fields)));
        translate(&schema, &operation, auth).map(|statement| statement.cypher)
    }

    /// A filter rule whose claim is absent admits no rows
    #[test]
    fn test_filter_rule_fails_closed() {
        let text = read("notes", &["text"], &AuthContext::anonymous()).unwrap();
        assert_eq!(text, "MATCH (this:Note)\nWHERE false\nRETURN this { .text } AS this");
    }

    #[test]
    fn test_filter_rule_reads_claim_parameter() {
        let auth = AuthContext::with_claims(json!({ "sub": "u1" }));
        let statement = translate(
            &crate::movie_schema(),
            &Operation::query(FieldSelection::new("notes").with_selections(FieldSelection::leaves(&["text"]))),
            &auth,
        )
        .unwrap();
        assert!(statement.cypher.contains("this.id = $jwt.sub"));
        assert_eq!(statement.params["jwt"]["sub"], json!("u1"));
    }

    /// A validate rule whose claim is absent rejects the request outright
    #[test]
    fn test_validate_rule_fails_closed() {
        let err = read("profiles", &["bio"], &AuthContext::with_claims(json!({ "email": "a@b" }))).unwrap_err();
        assert_eq!(err, TranslateError::Forbidden);
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(err.to_string(), "Forbidden");
    }

    #[test]
    fn test_authentication_precedes_everything() {
        let err = read("secrets", &["id"], &AuthContext::anonymous()).unwrap_err();
        assert_eq!(err, TranslateError::Unauthenticated);
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_field_rule_with_role_claim() {
        let admin = AuthContext::with_claims(json!({ "sub": "u1", "realm_access": { "roles": ["admin"] } }));
        assert!(read("secrets", &["id", "value"], &admin).is_ok());

        let reader = AuthContext::with_claims(json!({ "sub": "u2", "realm_access": { "roles": ["reader"] } }));
        assert!(read("secrets", &["id"], &reader).is_ok());
        assert_eq!(
            read("secrets", &["id", "value"], &reader).unwrap_err(),
            TranslateError::Forbidden
        );
    }

    #[test]
    fn test_unprotected_type_ignores_claims() {
        let anonymous = read("people", &["name"], &AuthContext::anonymous()).unwrap();
        let signed_in = read("people", &["name"], &AuthContext::with_claims(json!({ "sub": "u1" }))).unwrap();
        assert_eq!(anonymous, signed_in);
    }

    /// An absent claim under `_ALL` must not pass through the negated inner check
    #[test]
    fn test_quantified_filter_rule_without_claim_admits_nothing() {
        let schema = build(OWNERSHIP_YAML);
        let operation = Operation::query(FieldSelection::new("docs").with_selections(FieldSelection::leaves(&["id"])));
        for auth in [AuthContext::anonymous(), AuthContext::with_claims(json!({ "email": "a@b" }))] {
            let text = translate(&schema, &operation, &auth).unwrap().cypher;
            assert_eq!(text, "MATCH (this:Doc)\nWHERE false\nRETURN this { .id } AS this");
        }

        let signed_in = translate(&schema, &operation, &AuthContext::with_claims(json!({ "sub": "u1" })))
            .unwrap()
            .cypher;
        assert!(signed_in.contains("NOT (EXISTS {"));
        assert!(signed_in.contains("$jwt.sub"));
        assert!(!signed_in.contains("null"));
    }

    #[test]
    fn test_quantified_validate_rule_without_claim_is_forbidden() {
        let schema = build(OWNERSHIP_YAML);
        let operation = Operation::query(FieldSelection::new("drafts").with_selections(FieldSelection::leaves(&["id"])));
        let err = translate(&schema, &operation, &AuthContext::with_claims(json!({ "email": "a@b" }))).unwrap_err();
        assert_eq!(err, TranslateError::Forbidden);

        let signed_in = translate(&schema, &operation, &AuthContext::with_claims(json!({ "sub": "u1" })))
            .unwrap()
            .cypher;
        assert!(signed_in.contains("\"Forbidden\""));
        assert!(!signed_in.contains("null"));
    }

    #[test]
    fn test_connect_checks_relationship_rule_after_merge() {
        let text = update_teams(
            json!({ "where": { "id": "t2" }, "connect": { "members": { "where": { "node": { "name": "m" } } } } }),
            &AuthContext::with_claims(json!({ "sub": "t1" })),
        )
        .unwrap();
        let merge = text.find("MERGE").unwrap();
        let guard = text.find("\"Forbidden\"").unwrap();
        assert!(merge < guard);
        assert!(text.contains("coalesce(this.id = $jwt.sub, false)"));
    }

    #[test]
    fn test_disconnect_checks_relationship_rule_after_delete() {
        let text = update_teams(
            json!({ "disconnect": { "members": { "where": { "node": { "name": "m" } } } } }),
            &AuthContext::with_claims(json!({ "sub": "t1" })),
        )
        .unwrap();
        assert!(text.find("DELETE").unwrap() < text.find("\"Forbidden\"").unwrap());
    }

    #[test]
    fn test_nested_create_and_connect_or_create_check_relationship_rule() {
        let auth = AuthContext::with_claims(json!({ "sub": "t1" }));
        let created = update_teams(json!({ "create": { "members": [{ "node": { "name": "n" } }] } }), &auth).unwrap();
        assert!(created.find("MERGE").unwrap() < created.find("\"Forbidden\"").unwrap());

        let merged = update_teams(
            json!({ "connectOrCreate": { "members": { "where": { "node": { "name": "n" } } } } }),
            &auth,
        )
        .unwrap();
        assert!(merged.rfind("MERGE").unwrap() < merged.find("\"Forbidden\"").unwrap());
    }

    #[test]
    fn test_relationship_rule_without_claim_is_forbidden() {
        let err = update_teams(
            json!({ "connect": { "members": { "where": { "node": { "name": "m" } } } } }),
            &AuthContext::with_claims(json!({ "email": "a@b" })),
        )
        .unwrap_err();
        assert_eq!(err, TranslateError::Forbidden);
    }

    /// Rules on other operations leave attribute updates untouched
    #[test]
    fn test_attribute_update_skips_relationship_rule() {
        let text = update_teams(
            json!({ "where": { "id": "t1" }, "update": { "id": "t3" } }),
            &AuthContext::anonymous(),
        )
        .unwrap();
        assert!(!text.contains("Forbidden"));
    }
}
