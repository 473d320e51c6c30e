use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Appointment;

/// Account as listed by the admin endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Analytics {
    pub total_appointments: i64,
    pub pending_appointments: i64,
    pub confirmed_appointments: i64,
    pub completed_appointments: i64,
    pub cancelled_appointments: i64,

    pub total_users: i64,
    pub total_agents: i64,
    pub total_policies: i64,
    #[serde(rename = "totalAIQueries")]
    pub total_ai_queries: i64,

    pub appointments_by_type: BTreeMap<String, i64>,
    pub appointments_by_agent: BTreeMap<String, i64>,
    pub appointments_by_month: BTreeMap<String, i64>,
    pub appointments_by_status: BTreeMap<String, i64>,

    pub recent_appointments: Vec<Appointment>,
    pub weekly_stats: Vec<serde_json::Value>,
    pub monthly_stats: Vec<serde_json::Value>,

    pub ai_query_categories: BTreeMap<String, i64>,
    pub average_response_time: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_analytics() {
        let json = r#"{"totalAppointments":10,"pendingAppointments":4,"totalAIQueries":7,"appointmentsByStatus":{"PENDING":4,"CONFIRMED":6}}"#;
        let analytics: Analytics = serde_json::from_str(json).unwrap();
        assert_eq!(analytics.total_appointments, 10);
        assert_eq!(analytics.total_ai_queries, 7);
        assert_eq!(analytics.appointments_by_status.get("CONFIRMED"), Some(&6));
        assert!(analytics.recent_appointments.is_empty());
    }
}
