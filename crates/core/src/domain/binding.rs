// Published-Port Inspect Output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// One host-side binding of a published container port, as reported by
/// `inspect --format '{{json .NetworkSettings.Ports}}'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    #[serde(rename = "HostIp")]
    pub host_ip: String,
    #[serde(rename = "HostPort")]
    pub host_port: String,
}

impl PortBinding {
    /// The host port as a number; `None` when the runtime reported
    /// something unparseable.
    pub fn host_port_u16(&self) -> Option<u16> {
        self.host_port.parse().ok()
    }
}

/// Parse inspect port JSON into `{container_port: bindings}`.
///
/// The runtime prints the literal string `null` when nothing is published,
/// and a per-port `null` for exposed-but-unpublished ports. Keys look like
/// `"80/tcp"`; only the numeric part is kept.
pub fn parse_port_mappings(raw: &str) -> Result<BTreeMap<u16, Vec<PortBinding>>> {
    if raw == "null" {
        return Ok(BTreeMap::new());
    }

    let parsed: BTreeMap<String, Option<Vec<PortBinding>>> = serde_json::from_str(raw)?;

    let mut ports = BTreeMap::new();
    for (port_spec, bindings) in parsed {
        let container_port: u16 = port_spec
            .split('/')
            .next()
            .unwrap_or(&port_spec)
            .parse()
            .map_err(|_| HarnessError::MalformedPortSpec(port_spec.clone()))?;
        ports.insert(container_port, bindings.unwrap_or_default());
    }

    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_null_output() {
        let ports = parse_port_mappings("null").unwrap();
        assert!(ports.is_empty());
    }

    #[test]
    fn test_parse_with_ports() {
        let raw = r#"{"80/tcp": [{"HostIp": "0.0.0.0", "HostPort": "8080"}],
                      "443/tcp": [{"HostIp": "0.0.0.0", "HostPort": "8443"}]}"#;
        let ports = parse_port_mappings(raw).unwrap();
        assert_eq!(ports[&80][0].host_port, "8080");
        assert_eq!(ports[&443][0].host_port, "8443");
    }

    #[test]
    fn test_parse_unpublished_port_is_empty() {
        let raw = r#"{"80/tcp": null}"#;
        let ports = parse_port_mappings(raw).unwrap();
        assert!(ports[&80].is_empty());
    }

    #[test]
    fn test_parse_malformed_port_spec() {
        let raw = r#"{"http/tcp": []}"#;
        let err = parse_port_mappings(raw).unwrap_err();
        assert!(matches!(err, HarnessError::MalformedPortSpec(_)));
    }

    #[test]
    fn test_host_port_u16() {
        let binding = PortBinding {
            host_ip: "0.0.0.0".to_string(),
            host_port: "8080".to_string(),
        };
        assert_eq!(binding.host_port_u16(), Some(8080));

        let bad = PortBinding {
            host_ip: String::new(),
            host_port: "not-a-port".to_string(),
        };
        assert_eq!(bad.host_port_u16(), None);
    }
}
