pub mod bootstrap;
pub mod sampler;

pub use bootstrap::build_sampler;
pub use sampler::{CycleOutcome, Sampler, SamplerConfig};
