use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub experience_years: Option<i32>,
    pub rating: Option<f64>,
    pub total_appointments: Option<i32>,
    pub is_available: Option<bool>,
}

impl Agent {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("Unnamed agent")
    }

    pub fn display_rating(&self) -> String {
        match self.rating {
            Some(rating) => format!("{:.1}/5", rating),
            None => "unrated".to_string(),
        }
    }
}
