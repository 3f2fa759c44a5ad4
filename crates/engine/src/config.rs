/// Cache geometry and memory budget the planner and transposer are tuned
/// against (`spec.md` §4.5, §5). Constructed by the caller; loading these
/// from a config file is out of scope here, mirroring
/// `crates/core/src/config.rs`'s split between "what a config value is"
/// and "how it's loaded".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub cache_line_size: u64,
    pub cache_size: u64,
    pub memory_buffer: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cache_line_size: 64,
            cache_size: 8 * 1024 * 1024,
            memory_buffer: 512 * 1024 * 1024,
        }
    }
}
