//! Verity CLI
//!
//! Multi-source fact checking from the command line.

mod report;

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use verity_core::{
    classify, credibility, is_sensitive, select_providers, ProviderId, PROVIDER_CATALOG,
};
use verity_net::{create_client, HttpConfig};
use verity_runtime::{EnabledProviders, FactCheckConfig, FactChecker, LogSink};
use verity_sources::{
    create_anthropic_backend, create_backend, AnthropicConfig, OpenAIBackendConfig,
    PromptRegistry, SharedBackend, SourceKeys, SourceSet,
};

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENROUTER_MODEL: &str = "anthropic/claude-sonnet-4";

#[derive(Parser)]
#[command(name = "verity")]
#[command(author, version, about = "Verity: multi-source fact checking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Fact-check a claim against every relevant source
    Check {
        /// The claim to check
        #[arg(short, long)]
        query: String,

        /// Session id for progress tracking and admission
        #[arg(long)]
        session: Option<String>,

        /// Overall deadline in milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,

        /// Results requested from each provider
        #[arg(long)]
        max_results: Option<usize>,

        /// "auto" or a comma-separated provider list
        #[arg(long)]
        providers: Option<EnabledProviders>,

        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Proxy for all outbound requests (or set VERITY_PROXY)
        #[arg(long)]
        proxy: Option<String>,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Show the domain and providers a claim would be routed to
    Classify {
        #[arg(short, long)]
        query: String,
    },

    /// Score a URL with the credibility assessor
    ScoreUrl {
        url: String,

        #[arg(long)]
        title: Option<String>,

        /// Publication date, RFC 3339 or YYYY-MM-DD
        #[arg(long)]
        published: Option<String>,
    },

    /// List known providers and whether they are configured
    Providers,
}

#[derive(Args)]
struct LlmArgs {
    /// LLM model for the direct-knowledge and cross-check engines
    #[arg(short, long)]
    model: Option<String>,

    /// Anthropic API key (or set ANTHROPIC_API_KEY env var)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_key: Option<String>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenRouter API key (or set OPENROUTER_API_KEY env var)
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    openrouter_key: Option<String>,

    /// Use OpenAI instead of Anthropic
    #[arg(long)]
    openai: bool,

    /// Use OpenRouter instead of Anthropic
    #[arg(long, conflicts_with = "openai")]
    openrouter: bool,

    /// Run an independent cross-check engine alongside the fallback chain
    #[arg(long)]
    cross_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let builder = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact();
    match EnvFilter::try_from_default_env() {
        Ok(filter) => builder.with_env_filter(filter).init(),
        Err(_) => builder.with_max_level(log_level).init(),
    }

    match cli.command {
        Commands::Check {
            query,
            session,
            deadline_ms,
            max_results,
            providers,
            config,
            json,
            output,
            proxy,
            llm,
        } => {
            let mut settings = match &config {
                Some(path) => FactCheckConfig::load(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => FactCheckConfig::default(),
            };
            if let Some(ms) = deadline_ms {
                settings.run.overall_deadline_ms = ms;
            }
            if let Some(n) = max_results {
                settings.run.max_results_per_provider = n;
            }
            if let Some(enabled) = providers {
                settings.run.enabled_providers = enabled;
            }
            settings.validate().context("Invalid settings")?;

            run_check(&query, session.as_deref(), &settings, json, output, proxy, llm).await?;
        }
        Commands::Classify { query } => show_classification(&query),
        Commands::ScoreUrl {
            url,
            title,
            published,
        } => {
            let published = published.as_deref().map(parse_published).transpose()?;
            show_score(&url, title.as_deref(), published);
        }
        Commands::Providers => show_providers()?,
    }

    Ok(())
}

async fn run_check(
    query: &str,
    session: Option<&str>,
    settings: &FactCheckConfig,
    json: bool,
    output: Option<PathBuf>,
    proxy: Option<String>,
    llm: LlmArgs,
) -> Result<()> {
    let mut keys = SourceKeys::from_env();
    keys.anthropic = llm.anthropic_key.clone().or(keys.anthropic);
    keys.openai = llm.api_key.clone().or(keys.openai);
    keys.openrouter = llm.openrouter_key.clone().or(keys.openrouter);

    let backend = select_backend(&llm, &keys)?;

    let mut http = HttpConfig::default();
    if let Some(proxy) = &proxy {
        http = http.with_proxy(proxy);
    }
    let client = create_client(&http).context("Failed to build HTTP client")?;
    let prompts = PromptRegistry::load_embedded();
    let sources = SourceSet::build(client, &keys, &prompts, backend, llm.cross_check)?;
    let checker = FactChecker::from_config(sources, settings);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, finishing with what has arrived");
            on_interrupt.cancel();
        }
    });

    let result = checker
        .run_fact_check_with_cancel(query, session, &settings.run, &LogSink, cancel)
        .await?;

    let rendered = if json {
        serde_json::to_string_pretty(&result)?
    } else {
        report::render_markdown(&result)
    };

    match output {
        Some(path) => {
            fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Report saved to: {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Pick the LLM backend behind the direct-knowledge and cross-check engines.
///
/// Anthropic is the default and optional: without a key the chain simply
/// runs without a direct-knowledge step. An explicit `--openai` or
/// `--openrouter` requires its key.
fn select_backend(llm: &LlmArgs, keys: &SourceKeys) -> Result<Option<SharedBackend>> {
    if llm.openrouter {
        let key = keys.openrouter.as_deref().ok_or_else(|| {
            anyhow!("OpenRouter API key required. Set OPENROUTER_API_KEY or use --openrouter-key")
        })?;
        let model = llm.model.as_deref().unwrap_or(DEFAULT_OPENROUTER_MODEL);
        return Ok(Some(create_backend(OpenAIBackendConfig::openrouter(key, model))?));
    }
    if llm.openai {
        let key = keys.openai.as_deref().ok_or_else(|| {
            anyhow!("OpenAI API key required. Set OPENAI_API_KEY or use --api-key")
        })?;
        let model = llm.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
        return Ok(Some(create_backend(OpenAIBackendConfig::openai(key, model))?));
    }
    match keys.anthropic.as_deref() {
        Some(key) => {
            let model = llm.model.as_deref().unwrap_or(DEFAULT_ANTHROPIC_MODEL);
            Ok(Some(create_anthropic_backend(AnthropicConfig::new(key, model))?))
        }
        None => {
            info!("No LLM key set; direct-knowledge fallback disabled");
            Ok(None)
        }
    }
}

fn show_classification(query: &str) {
    let domain = classify(query);
    println!("Domain:     {}", domain.domain);
    println!("Confidence: {:.2}", domain.confidence);
    if !domain.matched_keywords.is_empty() {
        println!("Matched:    {}", domain.matched_keywords.join(", "));
    }
    println!("Sensitive:  {}", if is_sensitive(query) { "yes" } else { "no" });
    let providers: Vec<String> = select_providers(&domain, query, None)
        .iter()
        .map(ProviderId::to_string)
        .collect();
    println!("Providers:  {}", providers.join(", "));
}

fn show_score(url: &str, title: Option<&str>, published: Option<DateTime<Utc>>) {
    let assessment = credibility::assess(url, title, published, Utc::now());
    println!("Score:       {}/100", assessment.score);
    println!("Source type: {}", assessment.source_type);
    for factor in &assessment.factors {
        println!("  {:+4}  {}", factor.impact, factor.label);
    }
}

fn parse_published(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| anyhow!("Unrecognized date '{}', expected RFC 3339 or YYYY-MM-DD", raw))
}

fn show_providers() -> Result<()> {
    let keys = SourceKeys::from_env();
    let client = create_client(&HttpConfig::default()).context("Failed to build HTTP client")?;
    let sources = SourceSet::build(client, &keys, &PromptRegistry::load_embedded(), None, false)?;

    println!("{:<16} {:<11} {:<15} {}", "PROVIDER", "TIER", "SOURCE TYPE", "STATUS");
    for descriptor in PROVIDER_CATALOG {
        let configured = match descriptor.id {
            ProviderId::WebReasoning => keys.perplexity.is_some(),
            id => sources.registry.get(id).is_some_and(|p| p.is_configured()),
        };
        let status = match (configured, descriptor.requires_key) {
            (true, _) => "ready",
            (false, true) => "missing key",
            (false, false) => "unavailable",
        };
        println!(
            "{:<16} {:<11} {:<15} {}",
            descriptor.id.as_str(),
            format!("{:?}", descriptor.tier).to_lowercase(),
            descriptor.source_type.as_str(),
            status
        );
    }
    println!("\nReasoning chain: {}", describe_chain(&sources));
    Ok(())
}

fn describe_chain(sources: &SourceSet) -> String {
    let ids = sources.chain.engine_ids();
    if ids.is_empty() {
        return "(empty)".to_string();
    }
    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_published() {
        assert_eq!(parse_published("2024-05-01").unwrap().month(), 5);
        assert_eq!(parse_published("2023-01-02T03:04:05Z").unwrap().year(), 2023);
        assert!(parse_published("last week").is_err());
    }

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::try_parse_from([
            "verity", "-vv", "check", "-q", "Is water wet?", "--providers", "wikipedia,brave",
            "--deadline-ms", "9000", "--json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Check {
                providers,
                deadline_ms,
                json,
                ..
            } => {
                assert_eq!(
                    providers,
                    Some(EnabledProviders::Only(vec![ProviderId::Wikipedia, ProviderId::Brave]))
                );
                assert_eq!(deadline_ms, Some(9000));
                assert!(json);
            }
            _ => panic!("expected check"),
        }
    }
}
