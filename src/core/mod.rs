pub mod failure;
pub mod partition;
pub mod reading;
pub mod sample;

pub use failure::{ErrorContext, FailureRecord};
pub use partition::Partitions;
pub use reading::LocationReading;
pub use sample::Sample;
