use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::base::mask::PortMask;
use crate::router::config::RouterConfig;
use crate::router::port::NUM_ROUTE_PORTS;
use crate::router::route::Position;
use crate::sim::channel::{ChannelCycle, ChannelStats, OutputChannel, Packet};
use crate::sim::config::{RunMode, SimConfig, TrafficConfig};
use crate::sim::stress::{arbiter_stress, credit_stress, StressReport};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum SimReport {
    Channel(ChannelStats),
    Stress { reports: Vec<StressReport> },
}

impl SimReport {
    pub fn passed(&self) -> bool {
        match self {
            SimReport::Channel(_) => true,
            SimReport::Stress { reports } => reports.iter().all(StressReport::passed),
        }
    }
}

pub struct Sim {
    sim_config: SimConfig,
    router_config: Arc<RouterConfig>,
    traffic: TrafficConfig,
    rng: StdRng,
}

impl Sim {
    pub fn new(
        sim_config: SimConfig,
        router_config: RouterConfig,
        traffic: TrafficConfig,
    ) -> Result<Self> {
        router_config.validate().context("invalid [router] section")?;
        traffic.validate(&router_config).context("invalid [traffic] section")?;
        let rng = StdRng::seed_from_u64(sim_config.seed);
        Ok(Sim {
            sim_config,
            router_config: Arc::new(router_config),
            traffic,
            rng,
        })
    }

    fn random_position(&mut self) -> Position {
        let t = &self.traffic;
        Position::new(
            self.rng.gen_range(0..t.tiles_x),
            self.rng.gen_range(0..t.tiles_y),
            self.rng.gen_range(0..t.locals_x),
            self.rng.gen_range(0..t.locals_y),
        )
    }

    fn random_livelink(&mut self) -> PortMask {
        let rate = self.traffic.link_down_rate;
        (0..NUM_ROUTE_PORTS)
            .filter(|_| !self.rng.gen_bool(rate))
            .collect()
    }

    fn run_channel(&mut self) -> ChannelStats {
        let position = Position::new(0, 0, self.traffic.locals_x / 2, self.traffic.locals_y / 2);
        let mut channel = OutputChannel::new(
            Arc::clone(&self.router_config),
            position,
            self.traffic.output,
            self.traffic.credit_port,
            self.traffic.credit_latency,
        );
        let injection = self.traffic.injection_rate;
        let drain = self.traffic.drain_rate;
        let num_vc_classes = self.traffic.num_vc_classes;
        let mut next_id = 0;

        for cycle in 0..self.sim_config.cycles {
            for input in 0..self.router_config.num_inputs {
                if self.rng.gen_bool(injection) {
                    let packet = Packet {
                        id: next_id,
                        dest: self.random_position(),
                        vc_class: self.rng.gen_range(0..num_vc_classes),
                        injected_at: cycle,
                    };
                    next_id += 1;
                    channel.inject(input, packet);
                }
            }
            let env = ChannelCycle {
                livelink: self.random_livelink(),
                drain: self.rng.gen_bool(drain),
            };
            channel.step(env);
        }

        let stats = channel.stats().clone();
        info!(
            "channel {} at {}: {} cycles, {} injected, {} granted {:?}",
            self.traffic.output,
            position,
            stats.cycles,
            stats.injected,
            stats.total_granted(),
            stats.granted
        );
        info!(
            "{} retries, {} credit stalls, mean wait {:.2}",
            stats.retries,
            stats.credit_stalls,
            stats.mean_wait()
        );
        stats
    }

    fn run_stress(&mut self) -> Vec<StressReport> {
        let cycles = self.sim_config.cycles;
        vec![
            credit_stress(Arc::clone(&self.router_config), cycles, &mut self.rng),
            arbiter_stress(Arc::clone(&self.router_config), cycles, &mut self.rng),
        ]
    }

    pub fn simulate(&mut self) -> Result<SimReport> {
        info!(
            "running {:?} for {} cycles, seed {}",
            self.sim_config.mode, self.sim_config.cycles, self.sim_config.seed
        );
        let report = match self.sim_config.mode {
            RunMode::Channel => SimReport::Channel(self.run_channel()),
            RunMode::Stress => SimReport::Stress {
                reports: self.run_stress(),
            },
        };

        if let Some(dir) = &self.sim_config.output_dir {
            fs::create_dir_all(dir)
                .with_context(|| format!("cannot create output dir {}", dir.display()))?;
            let path = dir.join(SimConfig::SUMMARY_FILE);
            let payload = serde_json::to_string_pretty(&report).context("cannot serialize report")?;
            fs::write(&path, payload)
                .with_context(|| format!("cannot write summary to {}", path.display()))?;
            info!("wrote summary to {}", path.display());
        }
        Ok(report)
    }
}
