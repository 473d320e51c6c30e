use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("unknown appointment status: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentType {
    Consultation,
    ClaimAssistance,
    PolicyReview,
    NewPolicy,
    Renewal,
    Other,
}

impl AppointmentType {
    pub const ALL: [AppointmentType; 6] = [
        AppointmentType::Consultation,
        AppointmentType::ClaimAssistance,
        AppointmentType::PolicyReview,
        AppointmentType::NewPolicy,
        AppointmentType::Renewal,
        AppointmentType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "CONSULTATION",
            AppointmentType::ClaimAssistance => "CLAIM_ASSISTANCE",
            AppointmentType::PolicyReview => "POLICY_REVIEW",
            AppointmentType::NewPolicy => "NEW_POLICY",
            AppointmentType::Renewal => "RENEWAL",
            AppointmentType::Other => "OTHER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "Consultation",
            AppointmentType::ClaimAssistance => "Claim Assistance",
            AppointmentType::PolicyReview => "Policy Review",
            AppointmentType::NewPolicy => "New Policy",
            AppointmentType::Renewal => "Renewal",
            AppointmentType::Other => "Other",
        }
    }
}

impl FromStr for AppointmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown appointment type: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub agent_id: Option<i64>,
    pub agent_name: Option<String>,
    pub agent_specialization: Option<String>,
    pub appointment_date_time: NaiveDateTime,
    pub status: AppointmentStatus,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl Appointment {
    pub fn summary(&self) -> String {
        format!(
            "#{} {} with {} ({}) - {}",
            self.id,
            self.appointment_date_time.format("%Y-%m-%d %H:%M"),
            self.agent_name.as_deref().unwrap_or("unassigned"),
            self.appointment_type.label(),
            self.status
        )
    }
}

/// Booking request sent when creating an appointment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub customer_id: i64,
    pub agent_id: i64,
    pub appointment_date_time: NaiveDateTime,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_appointment() {
        let json = r#"{"id":12,"customerId":3,"customerName":"Sam","agentId":5,"agentName":"Jo Smith","appointmentDateTime":"2025-03-04T14:30:00","status":"NO_SHOW","type":"CLAIM_ASSISTANCE","notes":null,"createdAt":"2025-03-01T09:00:00"}"#;
        let appt: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(appt.status, AppointmentStatus::NoShow);
        assert_eq!(appt.appointment_type, AppointmentType::ClaimAssistance);
        assert_eq!(
            appt.summary(),
            "#12 2025-03-04 14:30 with Jo Smith (Claim Assistance) - NO_SHOW"
        );
    }

    #[test]
    fn test_appointment_type_from_str() {
        assert_eq!("policy-review".parse::<AppointmentType>(), Ok(AppointmentType::PolicyReview));
        assert_eq!("NEW_POLICY".parse::<AppointmentType>(), Ok(AppointmentType::NewPolicy));
        assert!("lunch".parse::<AppointmentType>().is_err());
    }

    #[test]
    fn test_appointment_status_from_str() {
        assert_eq!("no-show".parse::<AppointmentStatus>(), Ok(AppointmentStatus::NoShow));
        assert_eq!("confirmed".parse::<AppointmentStatus>(), Ok(AppointmentStatus::Confirmed));
        assert!("lost".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_request_wire_format() {
        let request = AppointmentRequest {
            customer_id: 1,
            agent_id: 2,
            appointment_date_time: "2025-03-04T14:30:00".parse().unwrap(),
            appointment_type: AppointmentType::Renewal,
            notes: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "RENEWAL");
        assert_eq!(json["appointmentDateTime"], "2025-03-04T14:30:00");
        assert!(json.get("notes").is_none());
    }
}
