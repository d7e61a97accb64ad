//! Seeded randomized checks of the credit manager and output arbiter against
//! reference models.

use std::sync::Arc;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use crate::base::behavior::ModuleBehaviors;
use crate::base::mask::PortMask;
use crate::router::arbiter::{ArbiterInputs, OutputArbiter};
use crate::router::config::RouterConfig;
use crate::router::credit::{CreditInputs, CreditManager};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StressReport {
    pub name: String,
    pub cycles: u64,
    pub errors: u64,
}

impl StressReport {
    pub fn passed(&self) -> bool {
        self.errors == 0
    }

    fn log(&self) {
        if self.passed() {
            info!("{}: {} cycles, no mismatches", self.name, self.cycles);
        } else {
            warn!("{}: {} mismatches in {} cycles", self.name, self.errors, self.cycles);
        }
    }
}

fn random_mask<R: Rng>(rng: &mut R, width: usize) -> PortMask {
    PortMask::from_bits(rng.gen::<u32>()).truncate(width)
}

/// Random consume/return pulses kept inside the legal range of a shadow
/// counter model, followed by an idle edge, checking `can_send` each round.
pub fn credit_stress(config: Arc<RouterConfig>, cycles: u64, rng: &mut StdRng) -> StressReport {
    let num_ports = config.num_ports;
    let depth = config.queue_depth;
    let mut dut = CreditManager::new(Arc::clone(&config));
    let mut shadow = vec![depth; num_ports];
    let mut errors = 0;

    for _ in 0..cycles {
        let mut consumed = random_mask(rng, num_ports);
        let mut returned = random_mask(rng, num_ports);
        for (p, &credit) in shadow.iter().enumerate() {
            if credit == 0 {
                consumed.set(p, false);
            }
            if credit == depth {
                returned.set(p, false);
            }
        }
        dut.set_inputs(CreditInputs {
            rst: false,
            consumed,
            credit_returned: returned,
        });
        if dut.upstream_credit() != returned {
            errors += 1;
        }
        dut.tick_one();
        dut.set_inputs(CreditInputs::default());
        dut.tick_one();

        for (p, credit) in shadow.iter_mut().enumerate() {
            match (consumed.get(p), returned.get(p)) {
                (true, false) => *credit -= 1,
                (false, true) => *credit += 1,
                _ => {}
            }
            if dut.can_send().get(p) != (*credit != 0) || dut.credits(p) != *credit {
                errors += 1;
            }
        }
    }

    let report = StressReport {
        name: "credit".to_string(),
        cycles,
        errors,
    };
    report.log();
    report
}

/// Random empty masks with downstream ready 80% of the time.
pub fn arbiter_stress(config: Arc<RouterConfig>, cycles: u64, rng: &mut StdRng) -> StressReport {
    let n = config.num_inputs;
    let mut dut = OutputArbiter::new(Arc::clone(&config));
    let mut expected_ptr = dut.last_granted();
    let mut errors = 0;

    for _ in 0..cycles {
        let queue_empty = random_mask(rng, n);
        let ready = rng.gen_bool(0.8);
        dut.set_inputs(ArbiterInputs {
            rst: false,
            queue_empty,
            downstream_ready: ready,
        });
        let available = (!queue_empty).truncate(n);
        let grant = dut.grant();

        let expected = if ready {
            (1..=n)
                .map(|offset| (expected_ptr + offset) % n)
                .find(|&idx| available.get(idx))
        } else {
            None
        };
        if grant.mask.count() > 1 || grant.valid != !grant.mask.is_empty() {
            errors += 1;
        }
        if grant.input() != expected {
            errors += 1;
        }
        if let Some(idx) = expected {
            expected_ptr = idx;
        }
        dut.tick_one();
        if dut.last_granted() != expected_ptr {
            errors += 1;
        }
    }

    let report = StressReport {
        name: "arbiter".to_string(),
        cycles,
        errors,
    };
    report.log();
    report
}
