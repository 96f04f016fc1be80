use serde::Deserialize;

/// Payload of `host/getVersion.json`, the cheapest authenticated endpoint
/// and therefore the standard token probe.
#[derive(Debug, Clone, Deserialize)]
pub struct HostVersion {
    pub version: String,
    #[serde(default)]
    pub apiversion: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_payload() {
        let json = r#"{"version":"1.36.12","apiversion":"2.0"}"#;
        let v: HostVersion = serde_json::from_str(json).unwrap();
        assert_eq!(v.version, "1.36.12");
        assert_eq!(v.apiversion, "2.0");
    }
}
