//! `talos` — command-line front-end for the Talos API.
//!
//! Reads `TALOS_BASE_URL` / `TALOS_API_KEY` from the environment and runs one
//! `BlockingClient` call per invocation.

use anyhow::{bail, Context};
use talos_core::{
    ApiError, BlockingClient, ClientConfig, Health, OptimizationReport, OptimizationRequest,
    Resource, ResourceFilter, Roi, SwarmStatus,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Talos CLI - The Guardian of your Cloud

Usage: talos <command> [options]

Commands:
  health                                  Check system health
  swarm                                   Show AI swarm status
  roi                                     Show ROI metrics
  resources [--provider P] [--type T]     List cloud resources
  optimize [--type T] [--risk-limit R] [--apply]
                                          Run an optimization (dry run unless --apply)
  chat <message...>                       Ask the AI swarm
  recommendations                         List optimization recommendations
  help                                    Show this message

Environment:
  TALOS_BASE_URL   Server URL (default http://localhost:8080)
  TALOS_API_KEY    Bearer token
  RUST_LOG         Log filter (default warn)";

/// A parsed command line.
#[derive(Debug, PartialEq)]
enum Command {
    Health,
    Swarm,
    Roi,
    Resources(ResourceFilter),
    Optimize(OptimizationRequest),
    Chat(String),
    Recommendations,
    Help,
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let Some((command, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    let command = match command.as_str() {
        "health" => Command::Health,
        "swarm" | "status" => Command::Swarm,
        "roi" => Command::Roi,
        "recommendations" => Command::Recommendations,
        "help" | "--help" | "-h" => Command::Help,
        "resources" => {
            let mut filter = ResourceFilter::new();
            let mut it = rest.iter();
            while let Some(flag) = it.next() {
                match flag.as_str() {
                    "--provider" => filter = filter.provider(flag_value(flag, it.next())?),
                    "--type" => filter = filter.resource_type(flag_value(flag, it.next())?),
                    other => bail!("unknown option for resources: {other}"),
                }
            }
            return Ok(Command::Resources(filter));
        }
        "optimize" => {
            let mut request = OptimizationRequest::default();
            let mut it = rest.iter();
            while let Some(flag) = it.next() {
                match flag.as_str() {
                    "--type" => request = request.optimization_type(flag_value(flag, it.next())?),
                    "--risk-limit" => {
                        let raw = flag_value(flag, it.next())?;
                        let limit: f64 = raw
                            .parse()
                            .with_context(|| format!("invalid --risk-limit: {raw}"))?;
                        request = request.risk_limit(limit);
                    }
                    "--apply" => request = request.dry_run(false),
                    "--dry-run" => request = request.dry_run(true),
                    other => bail!("unknown option for optimize: {other}"),
                }
            }
            return Ok(Command::Optimize(request));
        }
        "chat" => {
            if rest.is_empty() {
                bail!("chat needs a message");
            }
            return Ok(Command::Chat(rest.join(" ")));
        }
        other => bail!("unknown command: {other}"),
    };

    if let Some(extra) = rest.first() {
        bail!("unexpected argument: {extra}");
    }
    Ok(command)
}

fn flag_value<'a>(flag: &str, value: Option<&'a String>) -> anyhow::Result<&'a str> {
    match value {
        Some(v) => Ok(v.as_str()),
        None => bail!("{flag} needs a value"),
    }
}

fn run(client: &BlockingClient, command: Command) -> Result<String, ApiError> {
    let output = match command {
        Command::Health => format_health(&client.health()?),
        Command::Swarm => format_swarm(&client.get_swarm_status()?),
        Command::Roi => format_roi(&client.get_roi()?),
        Command::Resources(filter) => format_resources(&client.get_resources(&filter)?),
        Command::Optimize(request) => {
            format_report(&request, &client.run_optimization(&request)?)
        }
        Command::Chat(message) => format!("AI: {}", client.chat(&message)?),
        Command::Recommendations => {
            let recs = client.get_recommendations()?;
            if recs.is_empty() {
                "No recommendations.".to_string()
            } else {
                recs.iter()
                    .map(|rec| serde_json::Value::Object(rec.clone()).to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Help => USAGE.to_string(),
    };
    Ok(output)
}

fn format_health(health: &Health) -> String {
    let mut out = format!("System status: {}", health.status);
    match &health.checks {
        Some(serde_json::Value::Object(checks)) => {
            for (name, value) in checks {
                let value = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                out.push_str(&format!("\n  {name}: {value}"));
            }
        }
        Some(other) => out.push_str(&format!("\n  checks: {other}")),
        None => {}
    }
    out
}

fn format_swarm(swarm: &SwarmStatus) -> String {
    let mut out = format!(
        "Active tier: T{}\nCurrent action: {}\nQueue depth: {}",
        swarm.active_tier, swarm.current_action, swarm.queue_depth
    );
    for tier in &swarm.tier_status {
        out.push_str(&format!(
            "\n  T{} {:<12} {:<20} {:<6} {:>6} req  {:>8.1} ms  {:>5.1}%",
            tier.tier,
            tier.name,
            tier.model,
            tier.status,
            tier.requests_today,
            tier.avg_latency_ms,
            tier.success_rate * 100.0
        ));
    }
    out
}

fn format_roi(roi: &Roi) -> String {
    format!(
        "ROI: {:.1}x\nSavings: ${:.2}\nCost: ${:.2}\nNet profit: ${:.2}",
        roi.ratio, roi.total_savings, roi.total_cost, roi.net_profit
    )
}

fn format_resources(resources: &[Resource]) -> String {
    if resources.is_empty() {
        return "No resources.".to_string();
    }
    resources
        .iter()
        .map(|r| {
            format!(
                "{:<16} {:<8} {:<6} {:<14} ${:>9.2}/mo  score {:.2}",
                r.id, r.resource_type, r.provider, r.region, r.cost_per_month, r.optimization_score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_report(request: &OptimizationRequest, report: &OptimizationReport) -> String {
    let mode = if request.dry_run { "dry run" } else { "applied" };
    let mut out = format!(
        "Optimization ({}, {mode}): found {} optimizations\nEst. savings: ${:.2}",
        request.optimization_type, report.optimizations_found, report.estimated_savings
    );
    if let Some(applied) = report.actions_applied {
        out.push_str(&format!("\nActions applied: {applied}"));
    }
    out
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {err:#}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    let config = ClientConfig::from_env();
    tracing::debug!(?config, "talos cli starting");
    let client = BlockingClient::new(&config);

    match run(&client, command) {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(err) => {
            let detail = err.server_message().unwrap_or_else(|| err.to_string());
            eprintln!("error: {detail}");
            std::process::exit(1);
        }
    }
}
