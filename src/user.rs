use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::timestamp;

/// The signed-in user. The login endpoint returns a reduced shape (no
/// timestamps, no `is_active`), so everything past the identity is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    pub user: User,
}

fn bearer() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_response_user_has_reduced_shape() {
        let resp: LoginResponse = serde_json::from_value(json!({
            "access_token": "tok",
            "token_type": "bearer",
            "user": {
                "_id": "u1",
                "email": "a@b.co",
                "username": "ann",
                "full_name": "Ann Lee",
                "is_verified": false
            }
        }))
        .unwrap();
        assert_eq!(resp.user.id, "u1");
        assert!(!resp.user.is_verified);
        assert!(resp.user.created_at.is_none());
    }

    #[test]
    fn profile_update_skips_unset_fields() {
        let body = serde_json::to_value(ProfileUpdate {
            username: Some("ann_2".into()),
            ..ProfileUpdate::default()
        })
        .unwrap();
        assert_eq!(body, json!({ "username": "ann_2" }));
    }
}
