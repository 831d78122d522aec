use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Portal role carried in the token's user metadata, falling back to the JWT role claim.
    pub fn portal_role(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.get("role"))
            .and_then(|role| role.as_str())
            .or(self.role.as_deref())
    }

    pub fn is_admin(&self) -> bool {
        self.portal_role() == Some("admin")
    }
}
