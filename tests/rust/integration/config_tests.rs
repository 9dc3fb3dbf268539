//! Translator configuration from the environment and from files

#[cfg(test)]
mod config_tests {
    use std::env;
    use std::io::Write;
    use std::path::PathBuf;

    use graphcypher::config::{ConfigError, TranslatorConfig};
    use graphcypher::translator::DEFAULT_MAX_SELECTION_DEPTH;
    use serial_test::serial;
    use tempfile::NamedTempFile;

    const VARS: [&str; 3] = [
        "GRAPHCYPHER_SCHEMA",
        "GRAPHCYPHER_PRETTY",
        "GRAPHCYPHER_MAX_SELECTION_DEPTH",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = TranslatorConfig::from_env().unwrap();
        assert_eq!(config.max_selection_depth, DEFAULT_MAX_SELECTION_DEPTH);
        assert!(!config.pretty);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var("GRAPHCYPHER_SCHEMA", crate::MOVIES_FIXTURE);
        env::set_var("GRAPHCYPHER_PRETTY", "true");
        env::set_var("GRAPHCYPHER_MAX_SELECTION_DEPTH", "6");
        let config = TranslatorConfig::from_env();
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.schema_path, PathBuf::from(crate::MOVIES_FIXTURE));
        assert!(config.pretty);
        assert_eq!(config.max_selection_depth, 6);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_values() {
        clear_env();
        env::set_var("GRAPHCYPHER_PRETTY", "sometimes");
        let unparsable = TranslatorConfig::from_env();
        env::set_var("GRAPHCYPHER_PRETTY", "false");
        env::set_var("GRAPHCYPHER_MAX_SELECTION_DEPTH", "0");
        let out_of_range = TranslatorConfig::from_env();
        clear_env();

        assert!(matches!(unparsable, Err(ConfigError::Parse { .. })));
        assert!(matches!(out_of_range, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "schema_path: movies.yaml\nmax_selection_depth: 12").unwrap();
        let config = TranslatorConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.schema_path, PathBuf::from("movies.yaml"));
        assert_eq!(config.max_selection_depth, 12);
        assert!(!config.pretty);
    }

    #[test]
    fn test_from_yaml_file_validates() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_selection_depth: 1000").unwrap();
        let err = TranslatorConfig::from_yaml_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    /// A configured depth limit flows into the translator
    #[test]
    fn test_configured_depth_limit() {
        let schema = crate::movie_schema();
        let config = TranslatorConfig {
            max_selection_depth: 1,
            ..Default::default()
        };
        let operation = graphcypher::translator::Operation::query(
            graphcypher::translator::FieldSelection::new("movies")
                .with_selections(graphcypher::translator::FieldSelection::leaves(&["title"])),
        );
        let err = graphcypher::Translator::new(&schema)
            .with_max_selection_depth(config.max_selection_depth)
            .translate(&operation, &graphcypher::auth::AuthContext::anonymous())
            .unwrap_err();
        assert!(matches!(
            err,
            graphcypher::translator::TranslateError::SelectionTooDeep { depth: 2, max: 1 }
        ));
    }
}
