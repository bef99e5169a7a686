use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use estimate_engine::config::{AppConfig, ConfigError};
use estimate_engine::error::AppError;
use estimate_engine::estimation::geometry::{calculate_dim_vars, Opening, RoomDimensions};
use estimate_engine::estimation::interchange::{
    export_interchange, ClaimInfo, ExportOptions, InterchangeDocument,
};
use estimate_engine::estimation::pipeline::{build_estimate, InspectionEstimate};
use estimate_engine::estimation::scope::InMemoryCatalog;
use estimate_engine::estimation::settlement::{
    calculate_settlement, CarrierRuleTable, SettlementInput,
};
use estimate_engine::estimation::Room;
use estimate_engine::telemetry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Inspection Estimator",
    about = "Price, settle and export property inspection estimates from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute dimension variables for one room
    Dimvars(DimVarsArgs),
    /// Run the settlement waterfall over a set of priced line items
    Settle(SettleArgs),
    /// Scope, price and settle a full inspection against a catalog
    Estimate(EstimateArgs),
    /// Settle a claim and write the interchange container
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct DimVarsArgs {
    /// JSON document with `dimensions` and optional `openings`
    #[arg(long)]
    room: PathBuf,
}

#[derive(Args, Debug)]
struct SettleArgs {
    /// JSON settlement input (line items, policy rules, tax rules, overrides)
    #[arg(long)]
    input: PathBuf,
    /// Override the carrier code in the input document
    #[arg(long)]
    carrier: Option<String>,
}

#[derive(Args, Debug)]
struct EstimateArgs {
    /// JSON inspection document
    #[arg(long)]
    inspection: PathBuf,
    /// Catalog CSV (defaults to APP_CATALOG_PATH)
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Regional price list CSV (defaults to APP_PRICE_LIST_PATH)
    #[arg(long)]
    prices: Option<PathBuf>,
    /// Region for price lookups (defaults to APP_REGION_ID)
    #[arg(long)]
    region: Option<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// JSON export request: claim, rooms and settlement input
    #[arg(long)]
    request: PathBuf,
    /// Where to write the container
    #[arg(long)]
    output: PathBuf,
}

#[derive(Debug, Deserialize)]
struct DimVarsRequest {
    dimensions: RoomDimensions,
    #[serde(default)]
    openings: Vec<Opening>,
}

#[derive(Debug, Deserialize)]
struct ExportRequest {
    claim: ClaimInfo,
    #[serde(default)]
    rooms: Vec<Room>,
    settlement: SettlementInput,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(
        environment = ?config.environment,
        region = %config.pricing.region_id,
        "configuration loaded"
    );

    match cli.command {
        Command::Dimvars(args) => run_dim_vars(args),
        Command::Settle(args) => run_settle(&config, args),
        Command::Estimate(args) => run_estimate(&config, args).await,
        Command::Export(args) => run_export(&config, args),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn with_fallback_tax(config: &AppConfig, mut input: SettlementInput) -> SettlementInput {
    if input.claim_tax_rate.is_none() {
        input.claim_tax_rate = Some(config.pricing.fallback_tax_rate);
    }
    input
}

/// Fill carrier and loss details the settlement input leaves unset from the claim.
fn with_claim_context(claim: &ClaimInfo, mut input: SettlementInput) -> SettlementInput {
    if input.carrier_code.is_none() {
        input.carrier_code = claim.carrier_code.clone();
    }
    if input.loss.water_category.is_none() {
        input.loss.water_category = claim.peril.water_category;
    }
    if input.loss.water_class.is_none() {
        input.loss.water_class = claim.peril.water_class;
    }
    input
}

fn run_dim_vars(args: DimVarsArgs) -> Result<(), AppError> {
    let request: DimVarsRequest = read_json(&args.room)?;
    let report = calculate_dim_vars(&request.dimensions, &request.openings);
    print_json(&report)
}

fn run_settle(config: &AppConfig, args: SettleArgs) -> Result<(), AppError> {
    let mut input: SettlementInput = read_json(&args.input)?;
    if let Some(carrier) = args.carrier {
        input.carrier_code = Some(carrier);
    }
    let input = with_fallback_tax(config, input);

    let summary = calculate_settlement(&input, &CarrierRuleTable::standard())?;
    print_json(&summary)
}

async fn run_estimate(config: &AppConfig, args: EstimateArgs) -> Result<(), AppError> {
    let catalog_path = args
        .catalog
        .or_else(|| config.pricing.catalog_path.clone())
        .ok_or(ConfigError::MissingCatalog)?;
    let price_path = args
        .prices
        .or_else(|| config.pricing.price_list_path.clone())
        .ok_or(ConfigError::MissingCatalog)?;
    let catalog = InMemoryCatalog::from_paths(&catalog_path, &price_path)?;
    info!(entries = catalog.len(), catalog = %catalog_path.display(), "catalog loaded");

    let mut estimate: InspectionEstimate = read_json(&args.inspection)?;
    if estimate.claim_tax_rate.is_none() {
        estimate.claim_tax_rate = Some(config.pricing.fallback_tax_rate);
    }
    let region = args
        .region
        .unwrap_or_else(|| config.pricing.region_id.clone());

    let rules = CarrierRuleTable::standard();
    let outcome = build_estimate(&catalog, &rules, &estimate, &region).await?;
    print_json(&outcome)
}

fn run_export(config: &AppConfig, args: ExportArgs) -> Result<(), AppError> {
    let request: ExportRequest = read_json(&args.request)?;
    let input = with_claim_context(&request.claim, with_fallback_tax(config, request.settlement));

    let summary = calculate_settlement(&input, &CarrierRuleTable::standard())?;
    let document = InterchangeDocument {
        claim: &request.claim,
        rooms: &request.rooms,
        policy_rules: &input.policy_rules,
        summary: &summary,
    };
    let generated_at = Utc::now();
    let options = ExportOptions::new(
        generated_at,
        transaction_id(&request.claim.claim_number, generated_at),
    );

    let bytes = export_interchange(&document, &options)?;
    fs::write(&args.output, &bytes)?;
    println!(
        "Wrote {} bytes to {} (transaction {})",
        bytes.len(),
        args.output.display(),
        options.transaction_id
    );
    Ok(())
}

fn transaction_id(claim_number: &str, generated_at: DateTime<Utc>) -> String {
    let claim: String = claim_number
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .collect();
    format!("{}-{}", claim, generated_at.format("%Y%m%d%H%M%S"))
}
