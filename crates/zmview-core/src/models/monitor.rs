use serde::{Deserialize, Serialize};

/// A single camera/recording source managed by the ZoneMinder server.
///
/// Read-only projection of server data, re-fetched per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: String,
    pub name: String,
    pub day_events: u32,
    pub enabled: bool,
    pub function: String,
    pub status: String,
}

/// Wire shape of `monitors.json`.
#[derive(Debug, Deserialize)]
pub struct MonitorsResponse {
    #[serde(default)]
    pub monitors: Vec<MonitorEntry>,
}

impl MonitorsResponse {
    pub fn into_monitors(self) -> Vec<Monitor> {
        self.monitors.iter().map(MonitorEntry::to_monitor).collect()
    }
}

/// One element of the `monitors` array: the monitor record plus its
/// runtime status sidecar.
#[derive(Debug, Deserialize)]
pub struct MonitorEntry {
    #[serde(rename = "Monitor")]
    pub monitor: RawMonitor,
    #[serde(rename = "Monitor_Status", default)]
    pub status: Option<RawMonitorStatus>,
}

impl MonitorEntry {
    /// Map the stringly-typed server record into the domain shape:
    /// `Enabled` is "1" or "0", `DayEvents` is a decimal string that may be
    /// absent or malformed and then counts as zero.
    pub fn to_monitor(&self) -> Monitor {
        Monitor {
            id: self.monitor.id.clone(),
            name: self.monitor.name.clone(),
            day_events: self
                .monitor
                .day_events
                .as_deref()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            enabled: self.monitor.enabled.as_deref() == Some("1"),
            function: self.monitor.function.clone().unwrap_or_default(),
            status: self
                .status
                .as_ref()
                .and_then(|s| s.status.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawMonitor {
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "DayEvents", default)]
    pub day_events: Option<String>,
    #[serde(rename = "Enabled", default)]
    pub enabled: Option<String>,
    #[serde(rename = "Function", default)]
    pub function: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawMonitorStatus {
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_monitors_response() {
        let json = r#"{"monitors":[
            {"Monitor":{"Id":"1","Name":"Garage","DayEvents":"12","Enabled":"1","Function":"Modect"},
             "Monitor_Status":{"Status":"Connected"}},
            {"Monitor":{"Id":"2","Name":"Driveway","DayEvents":"0","Enabled":"0","Function":"Monitor"},
             "Monitor_Status":{"Status":"NotRunning"}}
        ]}"#;

        let monitors: Vec<Monitor> =
            serde_json::from_str::<MonitorsResponse>(json).unwrap().into_monitors();
        assert_eq!(monitors.len(), 2);

        let garage = &monitors[0];
        assert_eq!(garage.id, "1");
        assert_eq!(garage.name, "Garage");
        assert_eq!(garage.day_events, 12);
        assert!(garage.enabled);
        assert_eq!(garage.function, "Modect");
        assert_eq!(garage.status, "Connected");

        assert!(!monitors[1].enabled);
        assert_eq!(monitors[1].status, "NotRunning");
    }

    #[test]
    fn test_enabled_coercion_only_accepts_one() {
        for (raw, expected) in [
            (Some("1"), true),
            (Some("0"), false),
            (Some("true"), false),
            (Some(""), false),
            (None, false),
        ] {
            let entry = MonitorEntry {
                monitor: RawMonitor {
                    id: "3".to_string(),
                    name: "Porch".to_string(),
                    day_events: None,
                    enabled: raw.map(str::to_string),
                    function: None,
                },
                status: None,
            };
            assert_eq!(entry.to_monitor().enabled, expected, "Enabled={:?}", raw);
        }
    }

    #[test]
    fn test_day_events_coercion_defaults_to_zero() {
        for raw in [None, Some(""), Some("n/a"), Some("-3")] {
            let entry = MonitorEntry {
                monitor: RawMonitor {
                    id: "3".to_string(),
                    name: "Porch".to_string(),
                    day_events: raw.map(str::to_string),
                    enabled: Some("1".to_string()),
                    function: None,
                },
                status: None,
            };
            assert_eq!(entry.to_monitor().day_events, 0, "DayEvents={:?}", raw);
        }
    }

    #[test]
    fn test_missing_status_sidecar() {
        let json = r#"{"monitors":[{"Monitor":{"Id":"5","Name":"Attic","Enabled":"1"}}]}"#;
        let monitors = serde_json::from_str::<MonitorsResponse>(json)
            .unwrap()
            .into_monitors();
        assert_eq!(monitors[0].status, "");
        assert_eq!(monitors[0].function, "");
        assert_eq!(monitors[0].day_events, 0);
    }
}
