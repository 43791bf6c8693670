use crate::error::StartupError;
use log::info;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

const SERIAL_KEY: &str = "\"IOPlatformSerialNumber\" = \"";
const IOREG_TIMEOUT: Duration = Duration::from_secs(10);
/// Only the platform-expert node, not the whole registry
const IOREG_ARGS: [&str; 3] = ["-rd1", "-c", "IOPlatformExpertDevice"];

/// Pull the platform serial number out of `ioreg` output.
///
/// Matches lines like `|   "IOPlatformSerialNumber" = "K6N2JW336H"`.
pub fn parse_platform_serial(ioreg_output: &str) -> Option<String> {
    ioreg_output.lines().find_map(|line| {
        let (_, rest) = line.split_once(SERIAL_KEY)?;
        let serial = rest.split('"').next()?.trim();
        (!serial.is_empty()).then(|| serial.to_string())
    })
}

/// Ask the IO registry for the hardware serial number.
pub async fn query_platform_serial() -> Result<String, StartupError> {
    let mut command = Command::new("ioreg");
    command
        .args(IOREG_ARGS)
        .kill_on_drop(true);

    let output = timeout(IOREG_TIMEOUT, command.output())
        .await
        .map_err(|_| StartupError::DeviceIdUnavailable("ioreg timed out".to_string()))?
        .map_err(|e| StartupError::DeviceIdUnavailable(format!("failed to run ioreg: {e}")))?;

    if !output.status.success() {
        return Err(StartupError::DeviceIdUnavailable(format!(
            "ioreg exited with {}",
            output.status
        )));
    }

    parse_platform_serial(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        StartupError::DeviceIdUnavailable("IOPlatformSerialNumber not found".to_string())
    })
}

/// Resolve the device identifier once at startup.
///
/// A configured override wins over the hardware lookup.
pub async fn resolve_device_id(configured: Option<&str>) -> Result<String, StartupError> {
    if let Some(id) = configured.map(str::trim).filter(|id| !id.is_empty()) {
        validate_device_id(id)?;
        info!("Using configured device id {}", id);
        return Ok(id.to_string());
    }

    let id = query_platform_serial().await?;
    validate_device_id(&id)?;
    info!("Resolved device id {} from platform serial", id);
    Ok(id)
}

/// The id becomes part of collection and file names.
pub fn validate_device_id(id: &str) -> Result<(), StartupError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StartupError::DeviceIdUnavailable(format!(
            "device id {id:?} contains characters not allowed in partition names"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform_serial() {
        let output = r#"
+-o J314sAP  <class IOPlatformExpertDevice, id 0x100000213>
    {
      "IOPlatformUUID" = "0A1B2C3D-0000-1111-2222-333344445555"
      "IOPlatformSerialNumber" = "K6N2JW336H"
      "manufacturer" = <"Apple Inc.">
    }
"#;
        assert_eq!(parse_platform_serial(output).as_deref(), Some("K6N2JW336H"));
    }

    #[test]
    fn test_parse_full_registry_dump() {
        let output = r#"
+-o Root  <class IORegistryEntry, id 0x100000100>
  | {
  |   "IOKitBuildVersion" = "Darwin Kernel Version 23.4.0"
  | }
  +-o J314sAP  <class IOPlatformExpertDevice, id 0x100000213>
    | {
    |   "IOPlatformSerialNumber" = "K6N2JW336H"
    | }
"#;
        assert_eq!(parse_platform_serial(output).as_deref(), Some("K6N2JW336H"));
        assert_eq!(IOREG_ARGS, ["-rd1", "-c", "IOPlatformExpertDevice"]);
    }

    #[test]
    fn test_parse_platform_serial_missing() {
        assert_eq!(parse_platform_serial("\"IOPlatformUUID\" = \"abc\""), None);
        assert_eq!(parse_platform_serial("\"IOPlatformSerialNumber\" = \"\""), None);
    }

    #[test]
    fn test_validate_device_id() {
        assert!(validate_device_id("K6N2JW336H").is_ok());
        assert!(validate_device_id("lab-mac_01").is_ok());
        assert!(validate_device_id("").is_err());
        assert!(validate_device_id("a.b").is_err());
        assert!(validate_device_id("a b").is_err());
    }

    #[tokio::test]
    async fn test_configured_id_wins() {
        let id = resolve_device_id(Some("  BENCH01 ")).await.unwrap();
        assert_eq!(id, "BENCH01");
    }
}
