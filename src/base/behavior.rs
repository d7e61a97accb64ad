use std::sync::Arc;

/// Clocked behavior shared by every stateful block in the router.
pub trait ModuleBehaviors {
    /// Active clock edge: commit next-state from the currently driven inputs.
    fn tick_one(&mut self);

    /// Power-on initialization. Leaves the module in the same state a held
    /// synchronous reset would.
    fn reset(&mut self);

    fn tick(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.tick_one();
        }
    }
}

pub trait Parameterizable {
    type ConfigType;

    fn conf(&self) -> &Self::ConfigType;

    fn init_conf(&mut self, conf: Arc<Self::ConfigType>);
}
