//! Utility functions for beacon-core.

use btleplug::platform::PeripheralId;

/// Format a peripheral ID as a string.
///
/// On macOS, peripheral IDs are UUIDs. On other platforms, they may be
/// MAC addresses or other formats. This function extracts the useful
/// identifier string.
pub fn format_peripheral_id(id: &PeripheralId) -> String {
    strip_peripheral_debug(&format!("{:?}", id))
}

fn strip_peripheral_debug(debug: &str) -> String {
    debug
        .trim_start_matches("PeripheralId(")
        .trim_end_matches(')')
        .to_string()
}

/// Pick the identifier for a peripheral.
///
/// On macOS where addresses are 00:00:00:00:00:00, uses the peripheral ID.
/// On other platforms, uses the Bluetooth address.
pub fn create_identifier(address: &str, peripheral_id: &PeripheralId) -> String {
    if is_placeholder_address(address) {
        format_peripheral_id(peripheral_id)
    } else {
        address.to_string()
    }
}

/// Whether an address is the all-zero placeholder reported by CoreBluetooth.
pub fn is_placeholder_address(address: &str) -> bool {
    address == "00:00:00:00:00:00"
}

/// Compare two MAC addresses ignoring case and separators.
///
/// Strings containing anything other than hex digits, `:` and `-` never match.
pub fn addresses_match(a: &str, b: &str) -> bool {
    let normalize = |s: &str| -> Option<String> {
        if !s.chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '-') {
            return None;
        }
        Some(
            s.chars()
                .filter(char::is_ascii_hexdigit)
                .map(|c| c.to_ascii_lowercase())
                .collect(),
        )
    };
    match (normalize(a), normalize(b)) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_peripheral_debug() {
        assert_eq!(
            strip_peripheral_debug("PeripheralId(AA:BB:CC:DD:EE:FF)"),
            "AA:BB:CC:DD:EE:FF"
        );
    }

    #[test]
    fn test_placeholder_address() {
        assert!(is_placeholder_address("00:00:00:00:00:00"));
        assert!(!is_placeholder_address("AA:BB:CC:DD:EE:FF"));
    }

    #[test]
    fn test_addresses_match() {
        assert!(addresses_match("AA:BB:CC:DD:EE:FF", "aabbccddeeff"));
        assert!(addresses_match("aa-bb-cc-dd-ee-ff", "AA:BB:CC:DD:EE:FF"));
        assert!(!addresses_match("AA:BB:CC:DD:EE:FF", "AA:BB:CC:DD:EE:00"));
        assert!(!addresses_match("", ""));
        assert!(!addresses_match("Leafony", "eaf"));
    }
}
