use std::path::PathBuf;
use std::str::FromStr;

use anyhow::bail;
use log::{warn, LevelFilter};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::*;

use crate::router::config::RouterConfig;
use crate::router::port::Port;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Channel,
    Stress,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "channel" => Ok(Self::Channel),
            "stress" => Ok(Self::Stress),
            _ => Err(format!(
                "unsupported run mode '{}', expected one of: channel, stress",
                value
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConfig {
    pub cycles: u64,
    pub seed: u64,
    pub mode: RunMode,
    /// 0: warnings only, 1: info, 2: debug, 3: trace
    pub log_level: u64,
    /// directory receiving the JSON run summary
    pub output_dir: Option<PathBuf>,
}

impl SimConfig {
    pub const SUMMARY_FILE: &'static str = "summary.json";

    pub fn log_filter(&self) -> LevelFilter {
        match self.log_level {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> Self {
        match section {
            Some(value) => value.clone().try_into().expect("cannot deserialize config"),
            None => {
                warn!("config section not found");
                Self::default()
            }
        }
    }

    fn try_from_section(section: Option<&Value>) -> anyhow::Result<Self> {
        match section {
            Some(value) => Ok(value.clone().try_into()?),
            None => {
                warn!("config section not found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

impl Config for SimConfig {}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cycles: 10_000,
            seed: 0,
            mode: RunMode::Channel,
            log_level: 1,
            output_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrafficConfig {
    /// route port served by the modeled output channel
    pub output: Port,
    /// credit counter tracking that output's downstream buffer
    pub credit_port: usize,
    /// probability per input per cycle of enqueuing a packet
    pub injection_rate: f64,
    /// probability per cycle that the downstream frees one slot
    pub drain_rate: f64,
    /// cycles between a downstream slot freeing and the credit pulse arriving
    pub credit_latency: u64,
    /// probability per cycle that a given link is sampled down
    pub link_down_rate: f64,
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub locals_x: u32,
    pub locals_y: u32,
    /// VC classes drawn uniformly from `0..num_vc_classes`
    pub num_vc_classes: u8,
}

impl Config for TrafficConfig {}

impl TrafficConfig {
    pub fn validate(&self, router: &RouterConfig) -> anyhow::Result<()> {
        for (name, rate) in [
            ("injection_rate", self.injection_rate),
            ("drain_rate", self.drain_rate),
            ("link_down_rate", self.link_down_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                bail!("{} must be a probability in [0, 1], got {}", name, rate);
            }
        }
        if self.tiles_x == 0 || self.tiles_y == 0 || self.locals_x == 0 || self.locals_y == 0 {
            bail!(
                "grid extents must be non-zero, got {}x{} tiles of {}x{}",
                self.tiles_x,
                self.tiles_y,
                self.locals_x,
                self.locals_y
            );
        }
        if self.num_vc_classes == 0 {
            bail!("num_vc_classes must be at least 1");
        }
        if self.credit_port >= router.num_ports {
            bail!(
                "credit_port {} out of range for {} credit ports",
                self.credit_port,
                router.num_ports
            );
        }
        Ok(())
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            output: Port::East,
            credit_port: 0,
            injection_rate: 0.3,
            drain_rate: 0.8,
            credit_latency: 2,
            link_down_rate: 0.05,
            tiles_x: 2,
            tiles_y: 2,
            locals_x: 3,
            locals_y: 3,
            num_vc_classes: 2,
        }
    }
}
