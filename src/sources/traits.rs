use crate::core::LocationReading;
use anyhow::Result;
use async_trait::async_trait;

/// Anything that can report where the device is right now
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Short name used in log lines (e.g., "corelocationcli")
    fn name(&self) -> &str;

    /// Take one reading. Implementations must return within a bounded time.
    async fn read_location(&self) -> Result<LocationReading>;
}

/// Anything that can report the device's public network address
#[async_trait]
pub trait AddressSource: Send + Sync {
    fn name(&self) -> &str;

    /// Look up the current address. Implementations must return within a
    /// bounded time.
    async fn public_address(&self) -> Result<String>;
}

#[async_trait]
impl<T: LocationSource + ?Sized> LocationSource for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn read_location(&self) -> Result<LocationReading> {
        (**self).read_location().await
    }
}

#[async_trait]
impl<T: AddressSource + ?Sized> AddressSource for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn public_address(&self) -> Result<String> {
        (**self).public_address().await
    }
}
