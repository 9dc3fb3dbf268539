use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use graphcypher::auth::AuthContext;
use graphcypher::config;
use graphcypher::graph_catalog::GraphSchemaConfig;
use graphcypher::translator::{Operation, Translator, DEFAULT_MAX_SELECTION_DEPTH};

/// graphcypher - translate a graph operation into a Cypher statement
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Schema model (YAML or JSON)
    #[arg(long)]
    schema: PathBuf,

    /// Operation to translate (JSON)
    #[arg(long)]
    operation: PathBuf,

    /// Request claims (JSON object); anonymous when omitted
    #[arg(long)]
    jwt: Option<PathBuf>,

    /// Maximum selection depth
    #[arg(long, default_value_t = DEFAULT_MAX_SELECTION_DEPTH)]
    max_depth: usize,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

impl From<&Cli> for config::CliConfig {
    fn from(cli: &Cli) -> Self {
        config::CliConfig {
            schema_path: cli.schema.clone(),
            pretty: cli.pretty,
            max_selection_depth: cli.max_depth,
        }
    }
}

fn read_json(path: &PathBuf) -> anyhow::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    // Defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = config::TranslatorConfig::from_cli((&cli).into())?;

    let schema = GraphSchemaConfig::from_yaml_file(&config.schema_path)?.build()?;
    log::info!("loaded schema from {}", config.schema_path.display());

    let operation: Operation = serde_json::from_value(read_json(&cli.operation)?)?;
    let auth = match &cli.jwt {
        Some(path) => AuthContext::with_claims(read_json(path)?),
        None => AuthContext::anonymous(),
    };

    let statement = Translator::new(&schema)
        .with_max_selection_depth(config.max_selection_depth)
        .translate(&operation, &auth)?;
    let output = if config.pretty {
        serde_json::to_string_pretty(&statement)?
    } else {
        serde_json::to_string(&statement)?
    };
    println!("{}", output);
    Ok(())
}
