use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use ioengine_expr::{new_symbol_table, FunctionRecord, PluginFunction, SymbolTable};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Owns the plugin registry and the engine-wide configuration a fragment
/// read is planned and executed against (`spec.md` §5 "single
/// engine-context value"). The built-in function table itself lives in
/// `ioengine_expr` as a process-wide `once_cell::sync::Lazy`, matching
/// `crates/core/src/vm.rs`'s treatment of statically available tables;
/// `EngineContext` only owns the *user-registered* plugins layered on
/// top of it.
///
/// The registry is a reader-biased `parking_lot::RwLock`: fragment reads
/// take a read guard to resolve a function, registration takes a write
/// guard. No code here ever holds that guard across a call into
/// `ArraySource`, satisfying the lock-ordering invariant in §5.
pub struct EngineContext {
    plugins: RwLock<HashMap<String, FunctionRecord>>,
    pub config: EngineConfig,
    in_flight_bytes: AtomicU64,
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        EngineContext {
            plugins: RwLock::new(HashMap::new()),
            config,
            in_flight_bytes: AtomicU64::new(0),
        }
    }

    /// Cooperative `memory_check` at an allocation boundary (`spec.md`
    /// §5): reserves `bytes` against the process-wide ceiling
    /// (`config.memory_buffer`), refusing with a typed [`EngineError`]
    /// if the reservation would exceed it. The returned guard releases
    /// the reservation on drop, so concurrent fragment reads that
    /// jointly exceed the budget are refused rather than silently
    /// allocating past it.
    pub(crate) fn reserve_memory(&self, bytes: u64) -> Result<MemoryReservation<'_>, EngineError> {
        loop {
            let current = self.in_flight_bytes.load(Ordering::Acquire);
            let next = current
                .checked_add(bytes)
                .ok_or_else(|| EngineError::Memory(format!("allocation of {bytes} bytes overflows the in-flight counter")))?;
            if next > self.config.memory_buffer {
                return Err(EngineError::Memory(format!(
                    "in-flight allocations would reach {next} bytes, over the {} byte budget",
                    self.config.memory_buffer
                )));
            }
            if self
                .in_flight_bytes
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(MemoryReservation { ctx: self, bytes });
            }
        }
    }

    pub fn register_plugin(&self, name: impl Into<String>, record: FunctionRecord) {
        self.plugins.write().insert(name.into(), record);
    }

    pub fn plugin(&self, name: &str) -> Option<Arc<dyn PluginFunction>> {
        self.plugins.read().get(name).map(|r| r.plugin.clone())
    }

    /// A fresh symbol table pre-populated with every plugin registered on
    /// this context. Built-ins are never copied in (see the struct docs):
    /// a query's evaluator always consults `ioengine_expr::lookup_builtin`
    /// first, so a registered plugin here can shadow another
    /// user-registered plugin but never a built-in.
    pub fn new_symbol_table(&self) -> SymbolTable {
        let mut table = new_symbol_table();
        for (name, record) in self.plugins.read().iter() {
            table.add_function(
                name.clone(),
                FunctionRecord {
                    arity: record.arity,
                    plugin: record.plugin.clone(),
                },
            );
        }
        table
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        EngineContext::new(EngineConfig::default())
    }
}

/// RAII guard for a [`EngineContext::reserve_memory`] reservation. Releases
/// its share of the in-flight counter on drop, whether the read that
/// requested it finishes normally or bails out early on error.
pub struct MemoryReservation<'a> {
    ctx: &'a EngineContext,
    bytes: u64,
}

impl Drop for MemoryReservation<'_> {
    fn drop(&mut self) {
        self.ctx.in_flight_bytes.fetch_sub(self.bytes, Ordering::AcqRel);
    }
}
