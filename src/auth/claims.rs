use serde::{Deserialize, Serialize};

/// Claims carried by a Cognito access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CognitoClaims {
    pub sub: String,            // Cognito user id
    pub exp: i64,               // Expiration timestamp
    pub iat: i64,               // Issued at timestamp
    pub iss: String,            // Issuer (the user pool URL)
    pub token_use: String,      // "access" or "id"
    pub client_id: Option<String>,
    pub username: Option<String>,
}
