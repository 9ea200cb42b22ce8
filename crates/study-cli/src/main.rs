use std::env;
use std::net::SocketAddr;

use contracts::Allocation;
use study_api::serve;
use study_core::StudyEngine;

fn print_usage() {
    println!("study-cli <command>");
    println!("commands:");
    println!("  conditions");
    println!("  stages");
    println!("  trust <condition_id> <buyer_choice> [seller_choice] [--shock n]");
    println!("  allocate <stage_id> <category=amount,...> [--shock n]");
    println!("  portfolio <category=amount,...> [--shock n]");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080");
    println!("  --shock pins the income shock instead of drawing it");
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn parse_shock_flag(args: &[String]) -> Result<Option<i64>, String> {
    let Some(index) = args.iter().position(|arg| arg == "--shock") else {
        return Ok(None);
    };
    let raw = args
        .get(index + 1)
        .ok_or_else(|| "missing value for --shock".to_string())?;
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| format!("invalid shock: {raw}"))
}

fn parse_allocation_arg(raw: &str) -> Result<Allocation, String> {
    let mut allocation = Allocation::new();
    for entry in raw.split(',').filter(|entry| !entry.is_empty()) {
        let Some((category, amount)) = entry.split_once('=') else {
            return Err(format!("invalid allocation entry: {entry}"));
        };
        let amount = amount
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("invalid amount for {category}: {amount}"))?;
        allocation.insert(category.trim().to_string(), amount);
    }
    if allocation.is_empty() {
        return Err("allocation must name at least one category".to_string());
    }
    Ok(allocation)
}

fn render_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("failed to render result: {err}"))
}

fn list_conditions(engine: &StudyEngine) -> String {
    let mut lines = Vec::new();
    for condition in engine.catalog().conditions() {
        lines.push(condition.to_string());
    }
    lines.join("\n")
}

fn list_stages(engine: &StudyEngine) -> String {
    let mut lines = Vec::new();
    for stage_id in engine.catalog().stage_order() {
        if let Ok(config) = engine.catalog().stage(stage_id) {
            lines.push(format!("{stage_id}: {}", config.payment_type));
        }
    }
    lines.join("\n")
}

fn run_trust(engine: &StudyEngine, args: &[String]) -> Result<String, String> {
    let condition_id = args.get(2).ok_or_else(|| "missing condition_id".to_string())?;
    let buyer_choice = args.get(3).ok_or_else(|| "missing buyer_choice".to_string())?;
    let seller_choice = args.get(4).filter(|value| !value.starts_with("--"));
    let fixed_shock = parse_shock_flag(args)?;

    let outcome = engine
        .play_trust(
            condition_id,
            buyer_choice,
            seller_choice.map(String::as_str),
            fixed_shock,
            &mut rand::rng(),
        )
        .map_err(|err| err.to_string())?;
    render_json(&outcome)
}

fn run_allocate(engine: &StudyEngine, args: &[String]) -> Result<String, String> {
    let stage_id = args.get(2).ok_or_else(|| "missing stage_id".to_string())?;
    let raw = args.get(3).ok_or_else(|| "missing allocation".to_string())?;
    let allocation = parse_allocation_arg(raw)?;
    let fixed_shock = parse_shock_flag(args)?;

    let result = engine
        .evaluate_stage_allocation(stage_id, &allocation, fixed_shock, &mut rand::rng())
        .map_err(|err| err.to_string())?;
    render_json(&result)
}

fn run_portfolio(engine: &StudyEngine, args: &[String]) -> Result<String, String> {
    let raw = args.get(2).ok_or_else(|| "missing allocation".to_string())?;
    let allocation = parse_allocation_arg(raw)?;
    let fixed_shock = parse_shock_flag(args)?;

    let result = engine
        .evaluate_portfolio(&allocation, fixed_shock, &mut rand::rng())
        .map_err(|err| err.to_string())?;
    render_json(&result)
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    let engine = StudyEngine::new();

    match command {
        Some("conditions") => {
            println!("{}", list_conditions(&engine));
        }
        Some("stages") => {
            println!("{}", list_stages(&engine));
        }
        Some("trust") => match run_trust(&engine, &args) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        },
        Some("allocate") => match run_allocate(&engine, &args) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        },
        Some("portfolio") => match run_portfolio(&engine, &args) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        },
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                println!("serving api on http://{addr}");
                if let Err(err) = serve(addr).await {
                    eprintln!("server error: {err}");
                    std::process::exit(1);
                }
            }
            Err(err) => {
                eprintln!("error: {}", err);
                print_usage();
                std::process::exit(2);
            }
        },
        _ => {
            print_usage();
        }
    }
}
