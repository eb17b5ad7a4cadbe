use serde::{Deserialize, Serialize};

/// Coarse reachability of the compute service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeStatus {
    Up,
    Partial,
    Down,
}

/// Body of `GET /status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub ok: bool,
    pub compute: ComputeStatus,
    pub time: String, // ISO 8601 timestamp
}

impl StatusReport {
    pub fn new(compute: ComputeStatus) -> Self {
        Self {
            ok: compute == ComputeStatus::Up,
            compute,
            time: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ComputeStatus {
    /// Combine the outcome of the individual endpoint checks
    pub fn from_checks(passed: usize, total: usize) -> Self {
        if total > 0 && passed == total {
            ComputeStatus::Up
        } else if passed > 0 {
            ComputeStatus::Partial
        } else {
            ComputeStatus::Down
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_checks() {
        assert_eq!(ComputeStatus::from_checks(2, 2), ComputeStatus::Up);
        assert_eq!(ComputeStatus::from_checks(1, 2), ComputeStatus::Partial);
        assert_eq!(ComputeStatus::from_checks(0, 2), ComputeStatus::Down);
        assert_eq!(ComputeStatus::from_checks(0, 0), ComputeStatus::Down);
    }

    #[test]
    fn test_report_serialization() {
        let report = StatusReport::new(ComputeStatus::Down);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["compute"], "down");
        assert!(chrono::DateTime::parse_from_rfc3339(json["time"].as_str().unwrap()).is_ok());
    }
}
