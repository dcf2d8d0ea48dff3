use std::net::IpAddr;
use std::time::SystemTime;

/// Published whenever a hostname's resolved address sequence changes.
///
/// Address comparison is ordered: a reordering by the upstream counts as a
/// change. Subscribers that only care about membership should compare the
/// sets themselves.
#[derive(Debug, Clone)]
pub struct AddressChangeEvent {
    pub hostname: String,
    pub old_addresses: Vec<IpAddr>,
    pub new_addresses: Vec<IpAddr>,
    pub timestamp: SystemTime,
    /// Cache TTL the new addresses were stored with, in milliseconds.
    pub ttl_ms: u64,
    /// "AAAA" when any new address is IPv6, "A" otherwise.
    pub record_type: String,
    pub source: String,
    pub is_authoritative: bool,
}
