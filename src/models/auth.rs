use serde::{Deserialize, Serialize};

/// Grant types accepted by the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    ClientCredentials,
    Password,
    Refresh,
}

/// Body posted to the token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub grant_type: GrantType,
    pub client_id: String,
    pub client_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenRequest {
    pub fn client_credentials(client_id: &str, client_secret: &str) -> Self {
        Self {
            grant_type: GrantType::ClientCredentials,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            username: None,
            password: None,
            refresh_token: None,
        }
    }

    pub fn password(client_id: &str, client_secret: &str, username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            grant_type: GrantType::Password,
            ..Self::client_credentials(client_id, client_secret)
        }
    }

    pub fn refresh(client_id: &str, client_secret: &str, refresh_token: &str) -> Self {
        Self {
            refresh_token: Some(refresh_token.to_string()),
            grant_type: GrantType::Refresh,
            ..Self::client_credentials(client_id, client_secret)
        }
    }
}

/// Token endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_token_expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub resource_owner: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}
