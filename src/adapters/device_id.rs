//! Device identity derived from the MAC address.
//!
//! Produces a stable MQTT client id in the form `pinbridge-xxyyzz`
//! (last 3 bytes of the 6-byte MAC in lowercase hex). The same MAC is
//! handed to the Ethernet controller, so the id survives reboots and
//! matches what the DHCP server sees.

/// Fixed-size client id string: "pinbridge-xxyyzz" (16 chars).
pub type ClientIdString = heapless::String<24>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: the buffer is exactly the 6 bytes the call writes.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: a deterministic, locally administered MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0x02, 0x50, 0x42, 0xDE, 0xCA, 0xFE]
}

/// Derive the MQTT client id from the last 3 MAC bytes.
pub fn client_id(mac: &MacAddress) -> ClientIdString {
    let mut id = ClientIdString::new();
    use core::fmt::Write;
    let _ = write!(id, "pinbridge-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    id
}

/// Colon-separated form for logs.
pub fn format_mac(mac: &MacAddress) -> heapless::String<17> {
    let mut s = heapless::String::new();
    use core::fmt::Write;
    let _ = write!(
        s,
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
    s
}
