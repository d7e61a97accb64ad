use std::sync::Arc;

use log::{debug, trace};

use crate::base::behavior::{ModuleBehaviors, Parameterizable};
use crate::base::mask::PortMask;
use crate::base::module::{module, IsModule, ModuleBase};
use crate::router::config::RouterConfig;

/// Increment clamped at `max`.
pub fn sat_inc(value: u32, max: u32) -> u32 {
    value.saturating_add(1).min(max)
}

/// Decrement clamped at zero.
pub fn sat_dec(value: u32) -> u32 {
    value.saturating_sub(1)
}

/// Signals sampled on each clock edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreditInputs {
    pub rst: bool,
    /// downstream consumed a slot, one pulse per port
    pub consumed: PortMask,
    /// downstream freed a slot, one pulse per port
    pub credit_returned: PortMask,
}

#[derive(Debug, Default)]
pub struct CreditState {
    credits: Vec<u32>,
}

/// Per-port credit counters tracking free downstream buffer slots.
pub struct CreditManager {
    base: ModuleBase<CreditState, RouterConfig>,
    inputs: CreditInputs,
}

module!(CreditManager, CreditState, RouterConfig,);

impl CreditManager {
    /// `config` is expected to have passed `RouterConfig::validate`. Ports at
    /// or past `MAX_WIDTH` cannot be addressed by the pulse masks and never
    /// report as sendable.
    pub fn new(config: Arc<RouterConfig>) -> Self {
        let mut me = CreditManager {
            base: ModuleBase::with_state(CreditState {
                credits: vec![config.queue_depth; config.num_ports],
            }),
            inputs: CreditInputs::default(),
        };
        me.init_conf(config);
        me
    }

    pub fn set_inputs(&mut self, inputs: CreditInputs) {
        self.inputs = inputs;
    }

    pub fn inputs_mut(&mut self) -> &mut CreditInputs {
        &mut self.inputs
    }

    /// Committed counter for `port`.
    pub fn credits(&self, port: usize) -> u32 {
        self.state().credits[port]
    }

    /// Bit `p` set iff port `p` has at least one credit.
    pub fn can_send(&self) -> PortMask {
        self.state()
            .credits
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(p, _)| p)
            .collect()
    }

    /// Same-cycle passthrough of `credit_returned`, independent of reset.
    pub fn upstream_credit(&self) -> PortMask {
        self.inputs.credit_returned.truncate(self.conf().num_ports)
    }

    fn next_credit(&self, port: usize, current: u32) -> u32 {
        let consumed = self.inputs.consumed.get(port);
        let returned = self.inputs.credit_returned.get(port);
        match (consumed, returned) {
            (true, false) => {
                if current == 0 {
                    trace!("credit port {}: underflow absorbed", port);
                }
                sat_dec(current)
            }
            (false, true) => {
                let depth = self.conf().queue_depth;
                if current == depth {
                    trace!("credit port {}: overflow absorbed", port);
                }
                sat_inc(current, depth)
            }
            _ => current,
        }
    }
}

impl ModuleBehaviors for CreditManager {
    fn tick_one(&mut self) {
        self.base.cycle += 1;
        if self.inputs.rst {
            self.reset();
            return;
        }
        let next: Vec<u32> = self
            .state()
            .credits
            .iter()
            .enumerate()
            .map(|(port, &c)| self.next_credit(port, c))
            .collect();
        trace!("cycle {}: credits {:?}", self.base.cycle, next);
        self.state_mut().credits = next;
    }

    fn reset(&mut self) {
        debug!("credit manager reset");
        let depth = self.conf().queue_depth;
        self.state_mut().credits.iter_mut().for_each(|c| *c = depth);
    }
}
