//! Background Tasks Module
//!
//! Periodic maintenance running alongside foreground cache calls.
//!
//! # Tasks
//! - Cache sweeper: one per named cache, removes expired entries
//! - Global maintenance: sweeps every cache and trims high-occupancy ones
//! - Memory monitor: sheds entries registry-wide under memory pressure

mod cleanup;
mod memory;

use std::collections::HashMap;

use tokio::task::JoinHandle;

pub use cleanup::{
    run_global_maintenance, spawn_cache_sweeper, spawn_global_maintenance, sweep_interval,
    MaintenanceReport,
};
pub use memory::{
    check_memory_pressure, relieve_memory_pressure, spawn_memory_monitor, MemoryProbe,
    MemoryStats, NoMemoryProbe, PressureCheck, SystemMemoryProbe,
};

// == Task Set ==
/// Handles of every background task a registry owns.
#[derive(Debug, Default)]
pub(crate) struct TaskSet {
    sweepers: HashMap<String, JoinHandle<()>>,
    global: Option<JoinHandle<()>>,
    memory: Option<JoinHandle<()>>,
}

impl TaskSet {
    /// Registers the sweeper of `name`, aborting any previous one.
    pub(crate) fn add_sweeper(&mut self, name: &str, handle: JoinHandle<()>) {
        if let Some(previous) = self.sweepers.insert(name.to_string(), handle) {
            previous.abort();
        }
    }

    #[cfg(test)]
    pub(crate) fn has_sweeper(&self, name: &str) -> bool {
        self.sweepers
            .get(name)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// True while the global maintenance and memory monitor tasks are live.
    pub(crate) fn maintenance_running(&self) -> bool {
        let live = |handle: &Option<JoinHandle<()>>| {
            handle.as_ref().is_some_and(|h| !h.is_finished())
        };
        live(&self.global) && live(&self.memory)
    }

    pub(crate) fn set_maintenance(&mut self, global: JoinHandle<()>, memory: JoinHandle<()>) {
        for previous in [self.global.replace(global), self.memory.replace(memory)]
            .into_iter()
            .flatten()
        {
            previous.abort();
        }
    }

    /// Number of tasks that have not finished.
    pub(crate) fn active(&self) -> usize {
        self.sweepers
            .values()
            .chain(self.global.iter())
            .chain(self.memory.iter())
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Aborts every task and forgets its handle. Returns how many were aborted.
    pub(crate) fn abort_all(&mut self) -> usize {
        let handles: Vec<JoinHandle<()>> = self
            .sweepers
            .drain()
            .map(|(_, handle)| handle)
            .chain(self.global.take())
            .chain(self.memory.take())
            .collect();

        for handle in &handles {
            handle.abort();
        }
        handles.len()
    }
}
