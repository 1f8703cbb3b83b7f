//! String helpers.

use std::net::IpAddr;

/// Decode bytes as UTF-8, replacing invalid sequences.
pub fn makestr(data: impl AsRef<[u8]>) -> String {
    String::from_utf8_lossy(data.as_ref()).into_owned()
}

/// IP version of `address`: `Some(4)`, `Some(6)`, or `None` when it is not
/// an IP address.
pub fn ip_version(address: &str) -> Option<u8> {
    match address.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => Some(4),
        Ok(IpAddr::V6(_)) => Some(6),
        Err(_) => {
            tracing::debug!("not a valid IP address: {}", address);
            None
        }
    }
}
