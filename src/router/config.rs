use anyhow::{bail, Result};
use serde::Deserialize;

use crate::base::mask::MAX_WIDTH;
use crate::sim::config::Config;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RouterConfig {
    /// credit-tracked output ports
    pub num_ports: usize,
    /// input queues contending for one output
    pub num_inputs: usize,
    /// downstream buffer slots per port; credits saturate here
    pub queue_depth: u32,
    /// bit `c` set: VC class `c` may take a SerDes hop
    pub serdes_vc_mask: u32,
}

impl Config for RouterConfig {}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            num_ports: 5,
            num_inputs: 5,
            queue_depth: 8,
            serdes_vc_mask: 0b1,
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_ports == 0 || self.num_ports > MAX_WIDTH {
            bail!("num_ports must be in 1..={}, got {}", MAX_WIDTH, self.num_ports);
        }
        if self.num_inputs == 0 || self.num_inputs > MAX_WIDTH {
            bail!("num_inputs must be in 1..={}, got {}", MAX_WIDTH, self.num_inputs);
        }
        if self.queue_depth == 0 {
            bail!("queue_depth must be non-zero");
        }
        Ok(())
    }

    pub fn serdes_eligible(&self, vc_class: u8) -> bool {
        (vc_class as usize) < MAX_WIDTH && (self.serdes_vc_mask >> vc_class) & 1 == 1
    }
}
