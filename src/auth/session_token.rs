use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Mint the signed bearer value handed to the client after sign-in.
/// Token format: base64(session_id:expiry_timestamp:hmac_signature).
/// The expiry mirrors the session row's `expires_at`; the row stays
/// authoritative, this stamp just lets obviously stale tokens fail fast.
pub fn generate_session_token(
    session_id: Uuid,
    expires_at_unix: i64,
    secret: &str,
) -> Result<String, AppError> {
    let payload = format!("{}:{}", session_id, expires_at_unix);

    let signature = create_hmac_signature(&payload, secret)?;
    let token_data = format!("{}:{}", payload, signature);

    Ok(STANDARD.encode(token_data.as_bytes()))
}

/// Validate a session token and extract the session id.
pub fn validate_session_token(token: &str, secret: &str) -> Result<Uuid, AppError> {
    let decoded_bytes = STANDARD
        .decode(token)
        .map_err(|_| AppError::Unauthorized("Invalid session token format".to_string()))?;

    let decoded = String::from_utf8(decoded_bytes)
        .map_err(|_| AppError::Unauthorized("Invalid session token encoding".to_string()))?;

    // Parse token: session_id:expiry_time:signature
    let parts: Vec<&str> = decoded.split(':').collect();

    if parts.len() != 3 {
        return Err(AppError::Unauthorized("Invalid session token structure".to_string()));
    }

    let session_id: Uuid = parts[0]
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid session id in token".to_string()))?;

    let expiry_time: i64 = parts[1]
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid expiry time in token".to_string()))?;

    let token_signature = parts[2];

    let current_time = chrono::Utc::now().timestamp();
    if current_time > expiry_time {
        return Err(AppError::Unauthorized(
            "Your session has expired. Please sign in again.".to_string(),
        ));
    }

    // Verify HMAC signature in constant time
    let payload = format!("{}:{}", session_id, expiry_time);
    let expected_signature = create_hmac_signature(&payload, secret)?;

    let matches: bool = token_signature
        .as_bytes()
        .ct_eq(expected_signature.as_bytes())
        .into();

    if !matches {
        return Err(AppError::Unauthorized("Invalid session token".to_string()));
    }

    Ok(session_id)
}

/// Create HMAC-SHA256 signature for the given data
fn create_hmac_signature(data: &str, secret: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("HMAC initialization error: {}", e)))?;

    mac.update(data.as_bytes());

    let result = mac.finalize();
    let code_bytes = result.into_bytes();

    Ok(hex::encode(code_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    #[test]
    fn test_generate_and_validate_token() {
        let session_id = Uuid::new_v4();
        let expiry = chrono::Utc::now().timestamp() + 3600;

        let token = generate_session_token(session_id, expiry, SECRET).unwrap();
        let validated = validate_session_token(&token, SECRET).unwrap();

        assert_eq!(session_id, validated);
    }

    #[test]
    fn test_invalid_token_format() {
        let result = validate_session_token("not_even_base64!!", SECRET);

        assert!(result.is_err());
    }

    #[test]
    fn test_token_with_wrong_secret() {
        let session_id = Uuid::new_v4();
        let expiry = chrono::Utc::now().timestamp() + 3600;

        let token = generate_session_token(session_id, expiry, SECRET).unwrap();
        let result = validate_session_token(&token, "a_different_secret_entirely");

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let session_id = Uuid::new_v4();
        let expiry = chrono::Utc::now().timestamp() - 60;

        let token = generate_session_token(session_id, expiry, SECRET).unwrap();
        let result = validate_session_token(&token, SECRET);

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_tampered_payload_fails_signature_check() {
        let session_id = Uuid::new_v4();
        let expiry = chrono::Utc::now().timestamp() + 3600;

        let token = generate_session_token(session_id, expiry, SECRET).unwrap();
        let decoded = String::from_utf8(STANDARD.decode(&token).unwrap()).unwrap();
        let mut parts: Vec<String> = decoded.split(':').map(String::from).collect();
        parts[0] = Uuid::new_v4().to_string();
        let forged = STANDARD.encode(parts.join(":").as_bytes());

        assert!(validate_session_token(&forged, SECRET).is_err());
    }
}
