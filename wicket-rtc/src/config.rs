/// ICE servers handed to the peer connection at creation.
///
/// The default list is fixed at build time: two project STUN servers plus
/// Google's public one. There is no CLI knob for it; that is a known
/// limitation of the current design.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// STUN/TURN URLs, e.g. `stun:stun.l.google.com:19302`. An empty list
    /// restricts negotiation to host candidates (loopback tests use this).
    pub ice_servers: Vec<String>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                "stun:140.113.56.70:3478".to_string(),
                "stun:hare1039.nctu.me:3478".to_string(),
                "stun:stun.l.google.com:19302".to_string(),
            ],
        }
    }
}

impl PeerConfig {
    /// Host-candidates-only configuration.
    pub fn without_ice_servers() -> Self {
        Self {
            ice_servers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_carries_stun_servers() {
        let config = PeerConfig::default();
        assert_eq!(config.ice_servers.len(), 3);
        assert!(config.ice_servers.iter().all(|url| url.starts_with("stun:")));
    }
}
