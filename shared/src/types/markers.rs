//! Instrumentation marker payloads
//!
//! Markers are NVTX ranges that were open on the launching thread when the
//! kernel was issued. The decoder sorts them into buckets by origin; the
//! buckets are attached verbatim to exactly one kernel record.

use serde::{Deserialize, Serialize};

/// A structured per-call marker emitted by the framework instrumentation
///
/// Older traces carry the marker as dictionary literal text
/// (`"{'mod': 'torch', 'op': 'sigmoid', 'args': [...]}"`), newer ones as a
/// JSON object. Both are validated the same way by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFrameworkMarker {
    Literal(String),
    Object(serde_json::Map<String, serde_json::Value>),
}

impl RawFrameworkMarker {
    /// Text form of the marker, used in error reports
    pub fn to_text(&self) -> String {
        match self {
            RawFrameworkMarker::Literal(s) => s.clone(),
            RawFrameworkMarker::Object(map) => {
                serde_json::Value::Object(map.clone()).to_string()
            }
        }
    }
}

impl From<&str> for RawFrameworkMarker {
    fn from(s: &str) -> Self {
        RawFrameworkMarker::Literal(s.to_string())
    }
}

/// Marker buckets attached to one kernel launch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkerInfo {
    /// User annotated layer ranges
    pub layer_markers: Vec<String>,

    /// Python call-stack trace markers
    pub trace_markers: Vec<String>,

    /// Module `repr()` markers
    pub repr_markers: Vec<String>,

    /// Structured per-call markers from the framework instrumentation
    #[serde(alias = "pyprofMarkers")]
    pub framework_markers: Vec<RawFrameworkMarker>,

    /// Autograd sequence markers (`"<op>, seq = N"`)
    pub seq_markers: Vec<String>,

    /// Everything that matched no other bucket
    pub other_markers: Vec<String>,

    /// Alternate sequence markers
    pub alt_markers: Vec<String>,

    /// Sequence ids parsed out of `seq_markers`
    pub seq_id: Vec<i64>,

    /// Sequence ids parsed out of `alt_markers`
    pub alt_seq_id: Vec<i64>,

    /// Layer names parsed out of `layer_markers`
    pub layer: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_marker_forms() {
        let json = r#"{
            "pyprofMarkers": [
                "{'mod': 'torch', 'op': 'sigmoid', 'args': []}",
                {"mod": "torch.nn.functional", "op": "linear", "args": []}
            ]
        }"#;
        let markers: MarkerInfo = serde_json::from_str(json).unwrap();

        assert_eq!(markers.framework_markers.len(), 2);
        assert!(matches!(
            markers.framework_markers[0],
            RawFrameworkMarker::Literal(_)
        ));
        match &markers.framework_markers[1] {
            RawFrameworkMarker::Object(map) => assert_eq!(map["op"], "linear"),
            other => panic!("expected object marker, got {:?}", other),
        }
    }

    #[test]
    fn test_object_marker_text() {
        let mut map = serde_json::Map::new();
        map.insert("op".to_string(), "relu".into());
        let marker = RawFrameworkMarker::Object(map);
        assert_eq!(marker.to_text(), r#"{"op":"relu"}"#);
    }
}
