use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A bookable time slot of one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub agent_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_booked: Option<bool>,
}

impl Availability {
    /// A slot with no booking flag is treated as open.
    pub fn booked(&self) -> bool {
        self.is_booked.unwrap_or(false)
    }
}

/// Body for creating or updating a slot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub agent_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot() {
        let json = r#"{"id":4,"agentId":2,"agentName":"Jo","date":"2025-05-01","startTime":"09:00:00","endTime":"09:30:00","isBooked":true}"#;
        let slot: Availability = serde_json::from_str(json).unwrap();
        assert!(slot.booked());
        assert_eq!(slot.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn test_null_or_missing_booking_flag_is_open() {
        let json = r#"{"agentId":2,"date":"2025-05-01","startTime":"09:00:00","endTime":"09:30:00","isBooked":null}"#;
        let slot: Availability = serde_json::from_str(json).unwrap();
        assert_eq!(slot.is_booked, None);
        assert!(!slot.booked());

        let json = r#"{"agentId":2,"date":"2025-05-01","startTime":"09:00:00","endTime":"09:30:00"}"#;
        let slot: Availability = serde_json::from_str(json).unwrap();
        assert!(!slot.booked());
    }

    #[test]
    fn test_request_wire_format() {
        let request = AvailabilityRequest {
            agent_id: 2,
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["date"], "2025-05-01");
        assert_eq!(json["startTime"], "09:00:00");
    }
}
