use jsonwebtoken::{jwk::JwkSet, DecodingKey};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Holds the user pool's JWKS document so token validation does not hit
/// the Cognito endpoint on every request. The document is refetched after
/// an hour; Cognito signing keys rotate rarely.
pub struct JwksCache {
    http: reqwest::Client,
    cache: Cache<(), Arc<JwkSet>>,
    jwks_url: String,
}

impl JwksCache {
    pub fn new(jwks_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            cache: Cache::builder()
                .time_to_live(Duration::from_secs(3600))
                .build(),
            jwks_url,
        }
    }

    async fn document(&self) -> Result<Arc<JwkSet>, String> {
        if let Some(jwks) = self.cache.get(&()).await {
            return Ok(jwks);
        }

        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch JWKS: {}", e))?
            .error_for_status()
            .map_err(|e| format!("JWKS endpoint rejected the request: {}", e))?;

        let jwks = response
            .json::<JwkSet>()
            .await
            .map(Arc::new)
            .map_err(|e| format!("Failed to parse JWKS: {}", e))?;

        self.cache.insert((), jwks.clone()).await;

        Ok(jwks)
    }

    pub async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, String> {
        let jwks = self.document().await?;

        let jwk = jwks
            .keys
            .iter()
            .find(|key| key.common.key_id.as_deref() == Some(kid))
            .ok_or_else(|| format!("The user pool published no key with kid {}", kid))?;

        DecodingKey::from_jwk(jwk).map_err(|e| format!("Unusable JWKS key: {}", e))
    }
}
