use std::collections::VecDeque;
use std::sync::Arc;

use crate::base::behavior::*;
use crate::base::module::{IsModule, ModuleBase};

#[derive(Debug)]
pub struct QueueState<T> {
    pub storage: VecDeque<T>,
    max_size: usize,
}

impl<T> Default for QueueState<T> {
    fn default() -> Self {
        Self {
            storage: VecDeque::new(),
            max_size: 0,
        }
    }
}

/// Bounded FIFO holding packets waiting at one router input.
#[derive(Debug)]
pub struct InputQueue<T> {
    base: ModuleBase<QueueState<T>, usize>,
}

impl<T> ModuleBehaviors for InputQueue<T> {
    fn tick_one(&mut self) {
        self.base.cycle += 1;
    }

    fn reset(&mut self) {
        self.state_mut().storage.clear();
    }
}

impl<T> IsModule for InputQueue<T> {
    type StateType = QueueState<T>;
    type ConfigType = usize;

    fn base(&mut self) -> &mut ModuleBase<QueueState<T>, usize> {
        &mut self.base
    }

    fn base_ref(&self) -> &ModuleBase<QueueState<T>, usize> {
        &self.base
    }
}

impl<T> InputQueue<T> {
    pub fn new(capacity: Arc<usize>) -> Self {
        let mut me = InputQueue {
            base: ModuleBase::with_state(QueueState {
                storage: VecDeque::with_capacity(*capacity),
                max_size: *capacity,
            }),
        };
        me.init_conf(capacity);
        me
    }

    /// Returns the item back if the queue is full.
    pub fn try_enq(&mut self, data: T) -> Result<(), T> {
        let state = self.state_mut();
        if state.storage.len() >= state.max_size {
            return Err(data);
        }
        state.storage.push_back(data);
        Ok(())
    }

    pub fn try_deq(&mut self) -> Option<T> {
        self.state_mut().storage.pop_front()
    }

    pub fn peek(&self) -> Option<&T> {
        self.state().storage.front()
    }

    pub fn len(&self) -> usize {
        self.state().storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().storage.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= *self.conf()
    }
}
