//! Typed backend resource endpoints.
//!
//! Thin wrappers that build an `ApiRequest` and send it through the
//! pipeline, so every resource call gets the same token handling.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

use super::{ApiClient, ApiError, ApiRequest};
use crate::models::{
    Agent, AiQueryRequest, AiQueryResponse, Analytics, Appointment, AppointmentRequest,
    AppointmentStatus, Availability, AvailabilityRequest, User,
};

/// Wire format of `LocalDateTime` query parameters
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

impl ApiClient {
    // ===== Agents =====

    pub async fn fetch_agents(&self) -> Result<Vec<Agent>, ApiError> {
        self.call(ApiRequest::get("/agents")).await
    }

    pub async fn fetch_available_agents(&self) -> Result<Vec<Agent>, ApiError> {
        self.call(ApiRequest::get("/agents/available")).await
    }

    pub async fn fetch_top_agents(&self) -> Result<Vec<Agent>, ApiError> {
        self.call(ApiRequest::get("/agents/top")).await
    }

    pub async fn fetch_agent(&self, id: i64) -> Result<Agent, ApiError> {
        self.call(ApiRequest::get(format!("/agents/{}", id))).await
    }

    /// Agent profile belonging to a user account.
    pub async fn fetch_agent_by_user(&self, user_id: i64) -> Result<Agent, ApiError> {
        self.call(ApiRequest::get(format!("/agents/user/{}", user_id)))
            .await
    }

    pub async fn fetch_agents_by_specialization(
        &self,
        specialization: &str,
    ) -> Result<Vec<Agent>, ApiError> {
        self.call(ApiRequest::get(format!(
            "/agents/specialization/{}",
            specialization
        )))
        .await
    }

    pub async fn create_agent(&self, agent: &Agent) -> Result<Agent, ApiError> {
        self.call(ApiRequest::post("/agents").json(agent)?).await
    }

    pub async fn update_agent(&self, id: i64, agent: &Agent) -> Result<Agent, ApiError> {
        self.call(ApiRequest::put(format!("/agents/{}", id)).json(agent)?)
            .await
    }

    pub async fn delete_agent(&self, id: i64) -> Result<(), ApiError> {
        self.call_empty(ApiRequest::delete(format!("/agents/{}", id)))
            .await
    }

    // ===== Availability =====

    pub async fn fetch_agent_availability(&self, agent_id: i64) -> Result<Vec<Availability>, ApiError> {
        self.call(ApiRequest::get(format!("/availability/agent/{}", agent_id)))
            .await
    }

    /// Unbooked slots of an agent on or after `from_date`.
    pub async fn fetch_available_slots(
        &self,
        agent_id: i64,
        from_date: NaiveDate,
    ) -> Result<Vec<Availability>, ApiError> {
        let request = ApiRequest::get(format!("/availability/agent/{}/available", agent_id))
            .query("fromDate", from_date);
        self.call(request).await
    }

    pub async fn fetch_availability_on(
        &self,
        agent_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Availability>, ApiError> {
        self.call(ApiRequest::get(format!(
            "/availability/agent/{}/date/{}",
            agent_id, date
        )))
        .await
    }

    pub async fn fetch_availability_between(
        &self,
        agent_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Availability>, ApiError> {
        let request = ApiRequest::get(format!("/availability/agent/{}/range", agent_id))
            .query("startDate", start_date)
            .query("endDate", end_date);
        self.call(request).await
    }

    pub async fn create_availability(
        &self,
        slot: &AvailabilityRequest,
    ) -> Result<Availability, ApiError> {
        self.call(ApiRequest::post("/availability").json(slot)?).await
    }

    pub async fn update_availability(
        &self,
        id: i64,
        slot: &AvailabilityRequest,
    ) -> Result<Availability, ApiError> {
        self.call(ApiRequest::put(format!("/availability/{}", id)).json(slot)?)
            .await
    }

    /// Booked slots cannot be deleted; the backend answers with an error.
    pub async fn delete_availability(&self, id: i64) -> Result<(), ApiError> {
        self.call_empty(ApiRequest::delete(format!("/availability/{}", id)))
            .await
    }

    // ===== Appointments =====

    pub async fn fetch_appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        self.call(ApiRequest::get("/appointments")).await
    }

    pub async fn fetch_appointment(&self, id: i64) -> Result<Appointment, ApiError> {
        self.call(ApiRequest::get(format!("/appointments/{}", id)))
            .await
    }

    pub async fn fetch_customer_appointments(
        &self,
        customer_id: i64,
    ) -> Result<Vec<Appointment>, ApiError> {
        self.call(ApiRequest::get(format!(
            "/appointments/customer/{}",
            customer_id
        )))
        .await
    }

    pub async fn fetch_agent_appointments(&self, agent_id: i64) -> Result<Vec<Appointment>, ApiError> {
        self.call(ApiRequest::get(format!("/appointments/agent/{}", agent_id)))
            .await
    }

    pub async fn fetch_appointments_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>, ApiError> {
        let request = ApiRequest::get("/appointments/range")
            .query("startDate", start.format(DATE_TIME_FORMAT))
            .query("endDate", end.format(DATE_TIME_FORMAT));
        self.call(request).await
    }

    pub async fn book_appointment(
        &self,
        booking: &AppointmentRequest,
    ) -> Result<Appointment, ApiError> {
        self.call(ApiRequest::post("/appointments").json(booking)?)
            .await
    }

    pub async fn update_appointment_status(
        &self,
        id: i64,
        status: AppointmentStatus,
        reason: Option<&str>,
    ) -> Result<Appointment, ApiError> {
        let request = ApiRequest::put(format!("/appointments/{}/status", id))
            .json(&json!({ "status": status, "reason": reason }))?;
        self.call(request).await
    }

    pub async fn delete_appointment(&self, id: i64) -> Result<(), ApiError> {
        self.call_empty(ApiRequest::delete(format!("/appointments/{}", id)))
            .await
    }

    // ===== AI Assistant =====

    pub async fn ask_assistant(&self, query: &AiQueryRequest) -> Result<AiQueryResponse, ApiError> {
        self.call(ApiRequest::post("/ai/query").json(query)?).await
    }

    // ===== Admin =====

    pub async fn fetch_analytics(&self) -> Result<Analytics, ApiError> {
        self.call(ApiRequest::get("/admin/analytics")).await
    }

    pub async fn fetch_monthly_analytics(&self) -> Result<serde_json::Value, ApiError> {
        self.call(ApiRequest::get("/admin/analytics/monthly")).await
    }

    pub async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        self.call(ApiRequest::get("/admin/users")).await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        self.call_empty(ApiRequest::delete(format!("/admin/users/{}", user_id)))
            .await
    }

    pub async fn update_user_role(&self, user_id: i64, role: &str) -> Result<User, ApiError> {
        let request = ApiRequest::put(format!("/admin/users/{}/role", user_id))
            .json(&json!({ "role": role }))?;
        self.call(request).await
    }

    // ===== Health =====

    pub async fn health_check(&self) -> Result<serde_json::Value, ApiError> {
        self.call(ApiRequest::get("/health").public()).await
    }
}
