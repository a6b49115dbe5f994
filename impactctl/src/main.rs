//! `impactctl`: run the impact report workflows from the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use impact_config::{ConfigLoad, ConfigLoader, ImpactConfig};
use impact_core::{
    AbacaSource, AssetReportDraft, CancellationToken, GroupReportDraft,
    ReportService,
};
use impact_model::AssetCreateInput;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "impactctl", about = "Generate impact reports for assets and groups")]
struct Cli {
    /// TOML configuration file (overrides IMPACT_CONFIG_PATH)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Dotenv file read beneath the process environment
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or adopt an asset and generate its report
    Asset {
        /// JSON file with `asset`, `basics` and optional `breakdown`
        #[arg(long)]
        input: PathBuf,
        /// Delete stored reports and recompute
        #[arg(long)]
        regenerate: bool,
    },
    /// Create or adopt a group and generate its report
    Group {
        /// JSON file with `group` and `holdings`
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        regenerate: bool,
    },
    /// Generate an asset report from an Abaca company
    AbacaAsset {
        company_id: String,
        #[arg(long)]
        regenerate: bool,
    },
    /// Generate a group report from an Abaca company list
    AbacaCohort {
        uid: String,
        #[arg(long)]
        regenerate: bool,
    },
    /// Print reference data; activities when --industry is given
    Reference {
        #[arg(long)]
        industry: Option<String>,
    },
    /// Create a throwaway asset, print its suggested activities, delete it
    Probe {
        #[arg(long)]
        name: String,
        #[arg(long)]
        industry: String,
        #[arg(long, default_value = "GB")]
        country: String,
        #[arg(long, default_value = "Description placeholder")]
        description: String,
        #[arg(long, default_value_t = 100)]
        employees: u64,
    },
    /// Load configuration and report warnings
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let loaded = load_config(cli.config.as_deref(), &cli.env_file)?;
    for warning in &loaded.warnings.items {
        match &warning.hint {
            Some(hint) => warn!(hint = %hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }
    let config = loaded.config;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling");
            on_signal.cancel();
        }
    });

    match cli.command {
        Command::Asset { input, regenerate } => {
            let mut draft = AssetReportDraft::from_json(read_json(&input)?)
                .with_context(|| format!("invalid asset request in {}", input.display()))?;
            draft.regenerate |= regenerate;
            let service = ReportService::from_config(&config)?;
            print_json(&service.generate_asset_report(draft, &cancel).await?)
        }
        Command::Group { input, regenerate } => {
            let mut draft = GroupReportDraft::from_json(read_json(&input)?)
                .with_context(|| format!("invalid group request in {}", input.display()))?;
            draft.regenerate |= regenerate;
            let service = ReportService::from_config(&config)?;
            print_json(&service.generate_group_report(draft, &cancel).await?)
        }
        Command::AbacaAsset {
            company_id,
            regenerate,
        } => {
            let inputs = AbacaSource::from_config(&config)?
                .company_inputs(&company_id)
                .await
                .with_context(|| format!("fetching Abaca company {company_id}"))?;
            let service = ReportService::from_config(&config)?;
            let outcome = service
                .run_asset(inputs.into_request(regenerate), &cancel)
                .await?;
            print_json(&outcome)
        }
        Command::AbacaCohort { uid, regenerate } => {
            let inputs = AbacaSource::from_config(&config)?
                .cohort_inputs(&uid)
                .await
                .with_context(|| format!("fetching Abaca company list {uid}"))?;
            let service = ReportService::from_config(&config)?;
            let outcome = service
                .run_group(inputs.into_request(regenerate), &cancel)
                .await?;
            print_json(&outcome)
        }
        Command::Reference { industry } => {
            let service = ReportService::from_config(&config)?;
            match industry {
                Some(industry) => {
                    print_json(&service.reference().activities(&industry).await?)
                }
                None => print_json(&service.reference().snapshot().await?),
            }
        }
        Command::Probe {
            name,
            industry,
            country,
            description,
            employees,
        } => {
            let descriptor = AssetCreateInput {
                name,
                description,
                industry,
                hq_country_code: country,
                num_employees: employees,
            };
            let service = ReportService::from_config(&config)?;
            let report = service.probe(&descriptor).await?;
            if !report.cleaned_up {
                warn!(asset_id = %report.asset_id, "probe asset left behind");
            }
            print_json(&report.suggestions)
        }
        Command::Check => check(&config, loaded.warnings.len(), loaded.file.as_deref()),
    }
}

fn load_config(file: Option<&Path>, env_file: &Path) -> Result<ConfigLoad> {
    let mut loader = ConfigLoader::new()
        .with_dotenv(env_file)
        .with_context(|| format!("reading {}", env_file.display()))?;
    if let Some(file) = file {
        loader = loader.with_file(file);
    }
    Ok(loader.load()?)
}

fn check(config: &ImpactConfig, warnings: usize, file: Option<&Path>) -> Result<()> {
    if let Some(file) = file {
        info!(path = %file.display(), "configuration file loaded");
    }
    info!(
        base_url = %config.api.base_url,
        retry_on = %config.retry.retry_on,
        max_attempts = config.retry.max_attempts,
        abaca = config.abaca.is_some(),
        "configuration resolved"
    );
    if config.api.api_key.as_ref().is_none_or(|key| key.is_blank()) {
        bail!("API key not found; set VESTED_API_KEY");
    }
    println!("configuration OK ({warnings} warning(s))");
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
