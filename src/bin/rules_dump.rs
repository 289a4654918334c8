//! Rules Dump
//!
//! Configures a registry from a rules document and prints the resulting
//! rule tables as JSON. Useful for checking what an import run will see.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ob_population_rules::{ClassIdentity, RulesLoader, RulesRegistry, RULES_DIR_ENV};

#[derive(Debug, Parser)]
#[command(name = "rules-dump", about = "Print population rules configured from a YAML document")]
struct Args {
    /// Rules document name (relative to the rules directory) or path
    document: String,

    /// Target classes to configure
    #[arg(short, long = "class", required = true)]
    classes: Vec<String>,

    /// Top-level section to narrow the document to
    #[arg(short, long)]
    section: Option<String>,

    /// Locale bucket to configure
    #[arg(short, long)]
    locale: Option<String>,

    /// Rules directory
    #[arg(long, env = RULES_DIR_ENV)]
    rules_dir: Option<String>,

    /// JSON object used to expand the document template
    #[arg(long, default_value = "{}")]
    context: String,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ob_population_rules=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let loader = match &args.rules_dir {
        Some(dir) => RulesLoader::new(dir),
        None => RulesLoader::from_env(),
    };
    let context: serde_json::Value =
        serde_json::from_str(&args.context).context("Failed to parse --context as JSON")?;
    let classes: Vec<ClassIdentity> = args.classes.iter().map(ClassIdentity::named).collect();

    let registry = RulesRegistry::new();
    let report = loader
        .configure(
            &registry,
            args.locale.as_deref(),
            &classes,
            &args.document,
            args.section.as_deref(),
            &context,
        )
        .with_context(|| format!("Failed to configure rules from {}", args.document))?;

    tracing::info!(
        applied = report.applied,
        skipped = report.skipped,
        "Configuration finished"
    );

    let locale = args.locale.as_deref().unwrap_or(registry.default_locale());
    let snapshot = registry.instance(locale).snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
