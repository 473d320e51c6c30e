use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiQueryRequest {
    pub question: String,
    pub is_voice_query: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiQueryResponse {
    pub answer: String,
    pub category: Option<String>,
    /// Backend processing time in milliseconds
    pub response_time: Option<i32>,
    #[serde(default)]
    pub can_book_appointment: Option<bool>,
    pub suggested_action: Option<String>,
}

impl AiQueryResponse {
    pub fn offers_booking(&self) -> bool {
        self.can_book_appointment.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_with_null_booking_flag() {
        let json = r#"{"answer":"Renewals take 2 days.","category":"POLICY","responseTime":120,"canBookAppointment":null,"suggestedAction":null}"#;
        let response: AiQueryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.can_book_appointment, None);
        assert!(!response.offers_booking());
    }

    #[test]
    fn test_parse_response_offering_booking() {
        let json = r#"{"answer":"An agent can help.","canBookAppointment":true}"#;
        let response: AiQueryResponse = serde_json::from_str(json).unwrap();
        assert!(response.offers_booking());
        assert!(response.suggested_action.is_none());
    }

    #[test]
    fn test_request_wire_format() {
        let request = AiQueryRequest {
            question: "How do I file a claim?".to_string(),
            is_voice_query: false,
            user_id: Some(3),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["isVoiceQuery"], false);
        assert_eq!(json["userId"], 3);
    }
}
