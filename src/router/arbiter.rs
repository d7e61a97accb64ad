use std::sync::Arc;

use log::{debug, trace};

use crate::base::behavior::{ModuleBehaviors, Parameterizable};
use crate::base::mask::PortMask;
use crate::base::module::{module, IsModule, ModuleBase};
use crate::router::config::RouterConfig;

/// Pointer value after reset. The scan starts one past it, so input 1 wins
/// the first cycle in which every input has data.
pub const RESET_POINTER: usize = 0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArbiterInputs {
    pub rst: bool,
    /// bit set: that input has nothing to offer
    pub queue_empty: PortMask,
    pub downstream_ready: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grant {
    pub valid: bool,
    /// one-hot or all-zero; doubles as the FIFO read enable
    pub mask: PortMask,
}

impl Grant {
    pub const NONE: Grant = Grant {
        valid: false,
        mask: PortMask::EMPTY,
    };

    pub fn to(input: usize) -> Self {
        Grant {
            valid: true,
            mask: PortMask::onehot(input),
        }
    }

    pub fn input(&self) -> Option<usize> {
        self.mask.single()
    }
}

/// First set bit of `requests` scanning upward from `start`, wrapping once.
pub fn rr_scan(requests: PortMask, start: usize, n: usize) -> Option<usize> {
    (0..n).map(|offset| (start + offset) % n).find(|&idx| requests.get(idx))
}

#[derive(Debug)]
pub struct ArbiterState {
    last_granted: usize,
}

impl Default for ArbiterState {
    fn default() -> Self {
        Self {
            last_granted: RESET_POINTER,
        }
    }
}

/// Round-robin arbiter draining at most one input queue per cycle into a
/// shared output.
pub struct OutputArbiter {
    base: ModuleBase<ArbiterState, RouterConfig>,
    inputs: ArbiterInputs,
}

module!(OutputArbiter, ArbiterState, RouterConfig,);

impl OutputArbiter {
    /// `config` is expected to have passed `RouterConfig::validate`; with
    /// zero inputs the arbiter never grants.
    pub fn new(config: Arc<RouterConfig>) -> Self {
        let num_inputs = config.num_inputs;
        let mut me = OutputArbiter {
            base: ModuleBase::default(),
            inputs: ArbiterInputs {
                rst: false,
                queue_empty: PortMask::full(num_inputs),
                downstream_ready: false,
            },
        };
        me.init_conf(config);
        me
    }

    pub fn set_inputs(&mut self, inputs: ArbiterInputs) {
        self.inputs = inputs;
    }

    pub fn inputs_mut(&mut self) -> &mut ArbiterInputs {
        &mut self.inputs
    }

    pub fn last_granted(&self) -> usize {
        self.state().last_granted
    }

    /// Inputs offering data this cycle.
    pub fn requests(&self) -> PortMask {
        (!self.inputs.queue_empty).truncate(self.conf().num_inputs)
    }

    /// Combinational grant for the currently driven inputs.
    pub fn grant(&self) -> Grant {
        if self.inputs.rst || !self.inputs.downstream_ready {
            return Grant::NONE;
        }
        let n = self.conf().num_inputs;
        let Some(start) = (self.state().last_granted + 1).checked_rem(n) else {
            return Grant::NONE;
        };
        rr_scan(self.requests(), start, n).map_or(Grant::NONE, Grant::to)
    }
}

impl ModuleBehaviors for OutputArbiter {
    fn tick_one(&mut self) {
        self.base.cycle += 1;
        if self.inputs.rst {
            self.reset();
            return;
        }
        if let Some(input) = self.grant().input() {
            trace!("cycle {}: granted input {}", self.base.cycle, input);
            self.state_mut().last_granted = input;
        }
    }

    fn reset(&mut self) {
        debug!("output arbiter reset");
        self.state_mut().last_granted = RESET_POINTER;
    }
}
