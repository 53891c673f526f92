use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use super::{claims::CognitoClaims, jwks::JwksCache};

/// Validate a Cognito access token against the pool's signing keys:
/// signature, expiry, issuer, and that the token really is an access token
/// rather than an id token.
pub async fn validate_access_token(
    token: &str,
    jwks_cache: &JwksCache,
    expected_issuer: &str,
) -> Result<CognitoClaims, String> {
    let header = decode_header(token).map_err(|e| format!("Failed to decode JWT header: {}", e))?;
    let kid = header.kid.ok_or("Missing kid in JWT header")?;

    let decoding_key = jwks_cache.get_decoding_key(&kid).await?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[expected_issuer]);
    validation.validate_exp = true;

    let claims = decode::<CognitoClaims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Access token validation failed: {}", e))?
        .claims;

    if claims.token_use != "access" {
        return Err(format!(
            "Expected an access token, got token_use={}",
            claims.token_use
        ));
    }

    Ok(claims)
}
