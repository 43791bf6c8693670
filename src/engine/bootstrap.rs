use super::Sampler;
use crate::config::ProbeConfig;
use crate::core::Partitions;
use crate::error::StartupError;
use crate::sink::Persister;
use crate::sources::{CoreLocationSource, HttpAddressSource};
use log::info;

/// Wire the real sources and the configured sink into a sampler.
pub fn build_sampler(config: &ProbeConfig, device_id: &str) -> Result<Sampler, StartupError> {
    let target = config.sink_target()?;
    let partitions = Partitions::for_device(device_id);
    info!(
        "Using partitions {} / {} (device {})",
        partitions.data, partitions.errors, device_id
    );

    let connector = target.connector(&config.database, partitions, config.sink_timeout());
    let persister = Persister::new(connector, config.retry_policy())
        .with_operation_timeout(config.sink_timeout());

    let location = CoreLocationSource::new(&config.location_command, config.location_timeout());
    let address = HttpAddressSource::new(&config.ip_endpoint, config.ip_timeout());

    Ok(Sampler::new(
        config.sampler(),
        Box::new(location),
        Box::new(address),
        persister,
    ))
}
