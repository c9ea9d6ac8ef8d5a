//! Common utilities shared by the client, the runner and the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Parse a "listening at:" address from server output.
/// Handles IPv6 format [::]:PORT by converting to 127.0.0.1:PORT
pub fn parse_listen_address(line: &str) -> Option<String> {
    if let Some(addr_start) = line.find("listening at:") {
        let addr_part = &line[addr_start + "listening at:".len()..];
        let addr = addr_part.trim().to_string();
        let addr = if addr.starts_with("[::]:") {
            addr.replace("[::]:", "127.0.0.1:")
        } else {
            addr
        };
        Some(addr)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listen_address() {
        assert_eq!(
            parse_listen_address("mock_embedly listening at: 127.0.0.1:4000"),
            Some("127.0.0.1:4000".to_string())
        );
        assert_eq!(
            parse_listen_address("listening at: [::]:4001"),
            Some("127.0.0.1:4001".to_string())
        );
        assert_eq!(parse_listen_address("starting up"), None);
    }
}
