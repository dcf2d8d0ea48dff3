const MAX_HOSTNAME_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

fn is_valid_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_LABEL_LENGTH {
        return false;
    }
    if !bytes[0].is_ascii_alphanumeric() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}

/// Validate a hostname per RFC 1035: nonempty ASCII, at most 253 octets,
/// dot-separated labels of 1-63 octets with alphanumeric first and last
/// characters. A single trailing dot is swallowed by the label splitter
/// and accepted; doubled or interior dots produce an empty label and are
/// rejected.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > MAX_HOSTNAME_LENGTH || !hostname.is_ascii() {
        return false;
    }
    let hostname = hostname.strip_suffix('.').unwrap_or(hostname);
    hostname.split('.').all(is_valid_label)
}

/// DNS names are case-insensitive (RFC 4343); all cache and metrics keys use
/// the lowercase form.
pub fn normalize(hostname: &str) -> String {
    hostname.to_ascii_lowercase()
}
