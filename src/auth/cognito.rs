use serde_json::{json, Value};

use crate::{AppError, AppResult};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

/// Tokens returned by a successful password or refresh-token grant.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

/// Result of a GetUser lookup.
#[derive(Debug, Clone)]
pub struct CognitoUser {
    pub username: String,
    pub attributes: Value,
    pub mfa_enabled: bool,
}

/// Thin client for the Cognito IdP target API. Every call is a single
/// x-amz-json-1.1 POST; provider rejections come back as `__type` codes
/// which are mapped to user-facing messages.
pub struct CognitoClient {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

impl CognitoClient {
    pub fn new(endpoint: String, client_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            client_id,
        }
    }

    /// USER_PASSWORD_AUTH sign-in.
    pub async fn initiate_auth(&self, username: &str, password: &str) -> AppResult<AuthTokens> {
        let body = json!({
            "AuthFlow": "USER_PASSWORD_AUTH",
            "ClientId": self.client_id,
            "AuthParameters": {
                "USERNAME": username.trim(),
                "PASSWORD": password,
            }
        });

        let response = self.call("InitiateAuth", body).await?;
        auth_result_tokens(&response)
    }

    /// REFRESH_TOKEN_AUTH grant. The provider does not rotate the refresh
    /// token on this flow, so only a new access token comes back.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let body = json!({
            "AuthFlow": "REFRESH_TOKEN_AUTH",
            "ClientId": self.client_id,
            "AuthParameters": {
                "REFRESH_TOKEN": refresh_token,
            }
        });

        let response = self.call("InitiateAuth", body).await?;
        auth_result_tokens(&response)
    }

    /// Look up the user and attributes behind an access token.
    pub async fn get_user(&self, access_token: &str) -> AppResult<CognitoUser> {
        let body = json!({ "AccessToken": access_token });
        let response = self.call("GetUser", body).await?;

        let username = response
            .get("Username")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let mut attributes = serde_json::Map::new();
        if let Some(attrs) = response.get("UserAttributes").and_then(|v| v.as_array()) {
            for attr in attrs {
                if let (Some(name), Some(value)) = (
                    attr.get("Name").and_then(|v| v.as_str()),
                    attr.get("Value").and_then(|v| v.as_str()),
                ) {
                    attributes.insert(name.to_string(), Value::String(value.to_string()));
                }
            }
        }

        let mfa_enabled = response
            .get("MFAOptions")
            .and_then(|v| v.as_array())
            .map(|opts| !opts.is_empty())
            .unwrap_or(false);

        Ok(CognitoUser {
            username,
            attributes: Value::Object(attributes),
            mfa_enabled,
        })
    }

    /// Invalidate every token issued for the user. Callers treat failures
    /// as non-fatal; the local session is cleared regardless.
    pub async fn global_sign_out(&self, access_token: &str) -> AppResult<()> {
        let body = json!({ "AccessToken": access_token });
        self.call("GlobalSignOut", body).await?;
        Ok(())
    }

    pub async fn sign_up(&self, username: &str, password: &str, email: &str) -> AppResult<Value> {
        let body = json!({
            "ClientId": self.client_id,
            "Username": username.trim(),
            "Password": password,
            "UserAttributes": [
                { "Name": "email", "Value": email.trim() }
            ]
        });

        self.call("SignUp", body).await
    }

    pub async fn confirm_sign_up(&self, username: &str, code: &str) -> AppResult<()> {
        let body = json!({
            "ClientId": self.client_id,
            "Username": username.trim(),
            "ConfirmationCode": code.trim(),
        });

        self.call("ConfirmSignUp", body).await?;
        Ok(())
    }

    pub async fn resend_confirmation_code(&self, username: &str) -> AppResult<()> {
        let body = json!({
            "ClientId": self.client_id,
            "Username": username.trim(),
        });

        self.call("ResendConfirmationCode", body).await?;
        Ok(())
    }

    async fn call(&self, operation: &str, body: Value) -> AppResult<Value> {
        let target = format!("{}.{}", TARGET_PREFIX, operation);

        let response = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/x-amz-json-1.1")
            .header("X-Amz-Target", &target)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, operation, "Cognito request failed");
                AppError::Internal("The identity provider could not be reached.".to_string())
            })?;

        let status = response.status();
        let payload: Value = response.json().await.map_err(|e| {
            tracing::error!(error = %e, operation, "Failed to parse Cognito response");
            AppError::Internal("The identity provider returned an unreadable response.".to_string())
        })?;

        if status.is_success() {
            return Ok(payload);
        }

        let (code, raw_message) = parse_provider_error(&payload);
        tracing::warn!(status = %status, code, raw_message, operation, "Cognito rejected the request");

        Err(map_provider_error(code, raw_message))
    }
}

fn auth_result_tokens(response: &Value) -> AppResult<AuthTokens> {
    let result = response.get("AuthenticationResult").ok_or_else(|| {
        // A challenge (MFA, new-password-required) instead of tokens.
        AppError::Unauthorized("Sign-in did not complete. Additional verification is required.".to_string())
    })?;

    let access_token = result
        .get("AccessToken")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::Internal("The identity provider returned no access token.".to_string()))?
        .to_string();

    let refresh_token = result
        .get("RefreshToken")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let expires_in = result.get("ExpiresIn").and_then(|v| v.as_i64()).unwrap_or(3600);

    Ok(AuthTokens {
        access_token,
        refresh_token,
        expires_in,
    })
}

/// Extract the `__type` code and message from a provider error body. The
/// code sometimes arrives namespaced (`com.amazon...#NotAuthorizedException`);
/// only the fragment after `#` matters.
fn parse_provider_error(payload: &Value) -> (&str, &str) {
    let code = payload
        .get("__type")
        .and_then(|v| v.as_str())
        .map(|t| t.rsplit('#').next().unwrap_or(t))
        .unwrap_or("Unknown");

    let message = payload
        .get("message")
        .or_else(|| payload.get("Message"))
        .and_then(|v| v.as_str())
        .unwrap_or("");

    (code, message)
}

/// Fixed provider-code to user-facing-message table.
fn map_provider_error(code: &str, raw_message: &str) -> AppError {
    match code {
        "NotAuthorizedException" => {
            AppError::Unauthorized("Incorrect username or password.".to_string())
        }
        "UserNotConfirmedException" => {
            AppError::Unauthorized("Email verification is required before signing in.".to_string())
        }
        "UserNotFoundException" => {
            AppError::Unauthorized("No account exists with that username.".to_string())
        }
        "PasswordResetRequiredException" => {
            AppError::Unauthorized("A password reset is required for this account.".to_string())
        }
        "TooManyRequestsException" => {
            AppError::RateLimited("Too many requests. Please try again shortly.".to_string())
        }
        "LimitExceededException" => {
            AppError::RateLimited("Attempt limit exceeded. Please try again later.".to_string())
        }
        "InvalidParameterException" => {
            AppError::BadRequest("The submitted details were not valid.".to_string())
        }
        "InvalidPasswordException" => {
            AppError::BadRequest("The password does not meet the pool's requirements.".to_string())
        }
        "UsernameExistsException" => {
            AppError::Conflict("An account with that username already exists.".to_string())
        }
        "CodeMismatchException" => {
            AppError::BadRequest("The confirmation code does not match.".to_string())
        }
        "ExpiredCodeException" => {
            AppError::BadRequest("The confirmation code has expired. Request a new one.".to_string())
        }
        "InvalidUserPoolConfigurationException" => {
            AppError::Internal("The user pool is not configured correctly.".to_string())
        }
        _ => {
            tracing::error!(code, raw_message, "Unmapped Cognito error code");
            AppError::Internal("The identity provider rejected the request.".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_error_strips_namespace() {
        let payload = serde_json::json!({
            "__type": "com.amazonaws.cognito#NotAuthorizedException",
            "message": "Incorrect username or password."
        });

        let (code, message) = parse_provider_error(&payload);
        assert_eq!(code, "NotAuthorizedException");
        assert_eq!(message, "Incorrect username or password.");
    }

    #[test]
    fn test_parse_provider_error_bare_code() {
        let payload = serde_json::json!({
            "__type": "UserNotFoundException",
            "Message": "User does not exist."
        });

        let (code, message) = parse_provider_error(&payload);
        assert_eq!(code, "UserNotFoundException");
        assert_eq!(message, "User does not exist.");
    }

    #[test]
    fn test_wrong_credentials_map_to_unauthorized() {
        match map_provider_error("NotAuthorizedException", "") {
            AppError::Unauthorized(msg) => assert!(msg.contains("Incorrect username or password")),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn test_throttling_maps_to_rate_limited() {
        assert!(matches!(
            map_provider_error("TooManyRequestsException", ""),
            AppError::RateLimited(_)
        ));
        assert!(matches!(
            map_provider_error("LimitExceededException", ""),
            AppError::RateLimited(_)
        ));
    }

    #[test]
    fn test_unknown_code_maps_to_generic_internal() {
        match map_provider_error("SomethingNewException", "details") {
            AppError::Internal(msg) => assert!(!msg.contains("SomethingNewException")),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn test_auth_result_tokens_reads_all_fields() {
        let response = serde_json::json!({
            "AuthenticationResult": {
                "AccessToken": "access123",
                "RefreshToken": "refresh456",
                "ExpiresIn": 7200
            }
        });

        let tokens = auth_result_tokens(&response).unwrap();
        assert_eq!(tokens.access_token, "access123");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh456"));
        assert_eq!(tokens.expires_in, 7200);
    }

    #[test]
    fn test_challenge_response_is_rejected() {
        let response = serde_json::json!({
            "ChallengeName": "NEW_PASSWORD_REQUIRED"
        });

        assert!(matches!(
            auth_result_tokens(&response),
            Err(AppError::Unauthorized(_))
        ));
    }
}
