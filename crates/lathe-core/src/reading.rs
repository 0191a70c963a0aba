use serde::Serialize;

/// Value carried by a single datapoint. Serializes untagged, so a float
/// renders as a bare number and the phase label as a bare string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DatapointValue {
    Float(f64),
    Text(String),
}

impl From<f64> for DatapointValue {
    fn from(value: f64) -> Self {
        DatapointValue::Float(value)
    }
}

impl From<&str> for DatapointValue {
    fn from(value: &str) -> Self {
        DatapointValue::Text(value.to_string())
    }
}

impl From<String> for DatapointValue {
    fn from(value: String) -> Self {
        DatapointValue::Text(value)
    }
}

/// One named sensor field inside a measurement group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Datapoint {
    pub name: String,
    pub value: DatapointValue,
}

/// A named measurement group: one asset, one timestamp, an ordered set of
/// datapoints emitted together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub asset: String,
    pub ts_ms: u64,
    pub datapoints: Vec<Datapoint>,
}

impl Reading {
    pub fn new(asset: impl Into<String>, ts_ms: u64) -> Self {
        Self {
            asset: asset.into(),
            ts_ms,
            datapoints: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<DatapointValue>) -> Self {
        self.datapoints.push(Datapoint {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    /// Numeric datapoint lookup by name.
    pub fn float(&self, name: &str) -> Option<f64> {
        self.datapoints.iter().find_map(|dp| match &dp.value {
            DatapointValue::Float(v) if dp.name == name => Some(*v),
            _ => None,
        })
    }

    /// Text datapoint lookup by name.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.datapoints.iter().find_map(|dp| match &dp.value {
            DatapointValue::Text(v) if dp.name == name => Some(v.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_ordered_datapoints() {
        let reading = Reading::new("lathe", 1_000)
            .with("rpm", 500.0)
            .with("state", "Cutting");
        assert_eq!(reading.datapoints.len(), 2);
        assert_eq!(reading.datapoints[0].name, "rpm");
        assert_eq!(reading.float("rpm"), Some(500.0));
        assert_eq!(reading.text("state"), Some("Cutting"));
        assert_eq!(reading.float("state"), None);
        assert_eq!(reading.float("missing"), None);
    }

    #[test]
    fn serializes_values_untagged() {
        let reading = Reading::new("latheVibration", 42)
            .with("rms", 1000.0)
            .with("note", "ok");
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["asset"], "latheVibration");
        assert_eq!(json["ts_ms"], 42);
        assert_eq!(json["datapoints"][0]["value"], 1000.0);
        assert_eq!(json["datapoints"][1]["value"], "ok");
    }
}
