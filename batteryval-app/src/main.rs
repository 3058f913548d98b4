use anyhow::{Context, Result};
use batteryval_core::{
    appraisal::{self, DEFAULT_SCENARIOS},
    market::{MarketDataProvider, StaticMarketData},
    request::{load_request, AppraisalRequest, BidRequest, LotComparisonRequest, ValuationRequest},
    route::check_route,
    transport::estimate_shipment,
    valuation::valuate,
};
use batteryval_schemas::transport::{MaterialType, TransportMode, TransportRequest};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use tracing::info;

mod config;
mod report;

use config::KnowledgeBase;

#[derive(Parser)]
#[command(name = "batteryval", version, about = "Scrap battery valuation and logistics feasibility")]
struct Cli {
    /// Directory holding the YAML knowledge base.
    #[arg(long, global = true, default_value = "./data/knowledge_base")]
    knowledge_base: String,

    /// Print machine-readable JSON instead of the text report.
    #[arg(long, global = true)]
    json: bool,

    /// Evaluation date for time-gated route rules (defaults to today).
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Value a lot from a YAML request, including its shipment if one is given.
    Valuate {
        #[arg(long, default_value = "batteryval-app/request.yaml")]
        request: PathBuf,
    },
    /// Size and price a single shipment, with its packaging rules.
    Transport {
        #[arg(long)]
        origin: String,
        #[arg(long)]
        destination: String,
        #[arg(long, value_parser = parse_snake_case::<TransportMode>)]
        mode: TransportMode,
        #[arg(long)]
        weight_kg: f64,
        #[arg(long, value_parser = parse_snake_case::<MaterialType>, default_value = "black_mass")]
        material: MaterialType,
        /// Damaged, defective or recalled material.
        #[arg(long)]
        ddr: bool,
        /// Override the material's default hazard status.
        #[arg(long)]
        hazardous: Option<bool>,
        #[arg(long)]
        distance_miles: Option<f64>,
    },
    /// Check whether a lane is open for a material.
    Route {
        #[arg(long)]
        origin: String,
        #[arg(long)]
        destination: String,
        #[arg(long, value_parser = parse_snake_case::<MaterialType>, default_value = "black_mass")]
        material: MaterialType,
    },
    /// Indicative value and price sensitivity of one lot.
    Appraise {
        #[arg(long)]
        request: PathBuf,
    },
    /// Rank 2 to 10 lots by indicative value per kg.
    Compare {
        #[arg(long)]
        request: PathBuf,
    },
    /// Purchase quote for a supplier, without internal costs or margins.
    Bid {
        #[arg(long)]
        request: PathBuf,
    },
}

/// Parses a CLI value with the same snake_case names the YAML files use.
fn parse_snake_case<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_yaml::from_str(value).map_err(|_| format!("unrecognised value '{}'", value))
}

fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let today = cli.date.unwrap_or_else(|| Local::now().date_naive());

    match cli.command {
        Command::Valuate { request } => {
            let req: ValuationRequest = load_request(&request)
                .with_context(|| format!("Failed to load valuation request {:?}", request))?;
            let kb = KnowledgeBase::load(&cli.knowledge_base)?;
            let provider = StaticMarketData::new(kb.market_defaults.clone());
            let prices = provider
                .market_data(&req.currency)?
                .with_metal_overrides(&req.price_overrides);

            let result = valuate(&req.batch, &req.assay, &req.process, &req.payables, &prices)
                .context("Valuation failed")?;
            let logistics = match &req.shipment {
                Some(shipment) => {
                    let table = kb.regulatory_table();
                    let estimate =
                        estimate_shipment(&table, shipment).context("Transport estimate failed")?;
                    let advisory = check_route(
                        &table,
                        &shipment.origin,
                        &shipment.destination,
                        shipment.material_type,
                        today,
                    );
                    Some((estimate, advisory))
                }
                None => None,
            };

            if cli.json {
                let mut out = serde_json::json!({ "valuation": result.to_json()? });
                if let Some((estimate, advisory)) = &logistics {
                    out["transport"] = serde_json::to_value(estimate)?;
                    out["route"] = serde_json::to_value(advisory)?;
                }
                emit_json(&out)?;
            } else {
                report::print_valuation(&result);
                if let Some((estimate, advisory)) = &logistics {
                    report::print_transport(estimate);
                    report::print_route(advisory);
                    let landed = result.net_profit() - estimate.total_cost;
                    println!(
                        "\nNet profit after freight (freight in {}): {:.2}",
                        estimate.currency, landed
                    );
                }
            }
        }
        Command::Transport {
            origin,
            destination,
            mode,
            weight_kg,
            material,
            ddr,
            hazardous,
            distance_miles,
        } => {
            let shipment = TransportRequest {
                origin,
                destination,
                mode,
                weight_kg,
                material_type: material,
                is_ddr: ddr,
                hazardous,
                distance_miles,
            };
            let kb = KnowledgeBase::load(&cli.knowledge_base)?;
            let estimate = estimate_shipment(&kb.regulatory_table(), &shipment)?;
            if cli.json {
                emit_json(&estimate)?;
            } else {
                report::print_transport(&estimate);
            }
        }
        Command::Route {
            origin,
            destination,
            material,
        } => {
            let kb = KnowledgeBase::load(&cli.knowledge_base)?;
            let advisory = check_route(&kb.regulatory_table(), &origin, &destination, material, today);
            if cli.json {
                emit_json(&advisory)?;
            } else {
                report::print_route(&advisory);
            }
        }
        Command::Appraise { request } => {
            let req: AppraisalRequest = load_request(&request)
                .with_context(|| format!("Failed to load appraisal request {:?}", request))?;
            let kb = KnowledgeBase::load(&cli.knowledge_base)?;
            let prices = StaticMarketData::new(kb.market_defaults).market_data(&req.currency)?;
            let scenarios = req.scenarios.as_deref().unwrap_or(&DEFAULT_SCENARIOS[..]);
            let sensitivity = appraisal::sensitivity(req.weight_kg, &req.assay, &prices, scenarios)?;
            if cli.json {
                emit_json(&sensitivity)?;
            } else {
                report::print_sensitivity(&sensitivity);
            }
        }
        Command::Compare { request } => {
            let req: LotComparisonRequest = load_request(&request)
                .with_context(|| format!("Failed to load comparison request {:?}", request))?;
            let kb = KnowledgeBase::load(&cli.knowledge_base)?;
            let prices = StaticMarketData::new(kb.market_defaults).market_data(&req.currency)?;
            let comparison = appraisal::compare_lots(&req.lots, &prices)?;
            if cli.json {
                emit_json(&comparison)?;
            } else {
                report::print_comparison(&comparison);
            }
        }
        Command::Bid { request } => {
            let req: BidRequest = load_request(&request)
                .with_context(|| format!("Failed to load bid request {:?}", request))?;
            let kb = KnowledgeBase::load(&cli.knowledge_base)?;
            let prices = StaticMarketData::new(kb.market_defaults.clone()).market_data(&req.currency)?;
            let mut bid = appraisal::bid_report(req.weight_kg, &req.assay, &prices, &req.terms, today)?;
            if let Some(lane) = &req.transport {
                let advisory = check_route(
                    &kb.regulatory_table(),
                    &lane.origin,
                    &lane.destination,
                    lane.material,
                    today,
                );
                bid = bid.with_route(&advisory);
            }
            if cli.json {
                emit_json(&bid)?;
            } else {
                report::print_bid(&bid);
            }
        }
    }

    info!(%today, "Done");
    Ok(())
}
