use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, LevelFilter};
use meshnoc::router::config::RouterConfig;
use meshnoc::sim::config::{Config, RunMode, SimConfig, TrafficConfig};
use meshnoc::sim::top::Sim;
use toml::Table;

#[derive(Parser)]
#[command(version, about)]
struct MeshnocArgs {
    #[arg(help = "Path to config.toml")]
    config_path: Option<PathBuf>,
    #[arg(long, help = "Override number of simulated cycles")]
    cycles: Option<u64>,
    #[arg(long, help = "Override RNG seed")]
    seed: Option<u64>,
    #[arg(long, help = "Run mode (channel, stress)")]
    mode: Option<RunMode>,
    #[arg(long, help = "Log level (0: warnings only, 1: info, 2: debug, 3: trace)")]
    log: Option<u64>,
    #[arg(long, help = "Directory for the JSON run summary")]
    output_dir: Option<PathBuf>,
    #[arg(long, help = "Override downstream queue depth")]
    queue_depth: Option<u32>,
}

struct Configs {
    sim: SimConfig,
    router: RouterConfig,
    traffic: TrafficConfig,
}

fn load_configs(argv: &MeshnocArgs) -> Result<Configs> {
    let config_table: Table = match &argv.config_path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&text).context("cannot parse config toml")?
        }
        None => Table::new(),
    };
    let mut sim = SimConfig::try_from_section(config_table.get("sim"))
        .context("cannot parse [sim] section")?;
    let mut router = RouterConfig::try_from_section(config_table.get("router"))
        .context("cannot parse [router] section")?;
    let traffic = TrafficConfig::try_from_section(config_table.get("traffic"))
        .context("cannot parse [traffic] section")?;

    // override toml configs with argv
    sim.cycles = argv.cycles.unwrap_or(sim.cycles);
    sim.seed = argv.seed.unwrap_or(sim.seed);
    sim.mode = argv.mode.unwrap_or(sim.mode);
    sim.log_level = argv.log.unwrap_or(sim.log_level);
    sim.output_dir = argv.output_dir.clone().or(sim.output_dir);
    router.queue_depth = argv.queue_depth.unwrap_or(router.queue_depth);

    Ok(Configs { sim, router, traffic })
}

fn run(configs: Configs) -> Result<bool> {
    let mut sim = Sim::new(configs.sim, configs.router, configs.traffic)?;
    let report = sim.simulate()?;
    Ok(report.passed())
}

fn init_logger(level: LevelFilter) {
    // RUST_LOG, when set, takes precedence over the configured level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

pub fn main() -> ExitCode {
    let argv = MeshnocArgs::parse();
    let result = match load_configs(&argv) {
        Ok(configs) => {
            init_logger(configs.sim.log_filter());
            run(configs)
        }
        Err(err) => {
            init_logger(SimConfig::default().log_filter());
            Err(err)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("stress checks reported mismatches");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
