pub mod corelocation;
pub mod device_id;
pub mod mock;
pub mod public_ip;
pub mod traits;

pub use corelocation::CoreLocationSource;
pub use device_id::resolve_device_id;
pub use public_ip::HttpAddressSource;
pub use traits::{AddressSource, LocationSource};
