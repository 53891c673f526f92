use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub aws_region: String,
    pub cognito_client_id: String,
    pub cognito_user_pool_id: String,
    pub session_secret: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let aws_region = env::var("AWS_REGION")
            .unwrap_or_else(|_| "ap-northeast-2".to_string());

        let cognito_client_id = env::var("COGNITO_CLIENT_ID")
            .map_err(|_| "COGNITO_CLIENT_ID must be set".to_string())?;

        let cognito_user_pool_id = env::var("COGNITO_USER_POOL_ID")
            .map_err(|_| "COGNITO_USER_POOL_ID must be set".to_string())?;

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET must be set".to_string())?;

        if session_secret.len() < 32 {
            return Err("SESSION_SECRET must be at least 32 characters".to_string());
        }

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| format!("PORT is not a valid port number: {}", raw))?,
            Err(_) => 8080,
        };

        Ok(Self {
            database_url,
            aws_region,
            cognito_client_id,
            cognito_user_pool_id,
            session_secret,
            port,
        })
    }

    /// Endpoint for the Cognito IdP target API in this region.
    pub fn cognito_endpoint(&self) -> String {
        format!("https://cognito-idp.{}.amazonaws.com/", self.aws_region)
    }

    /// Issuer embedded in tokens minted by this user pool.
    pub fn token_issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.aws_region, self.cognito_user_pool_id
        )
    }

    /// JWKS document URL for the user pool's signing keys.
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.token_issuer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(region: &str, pool: &str) -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/leavedesk".to_string(),
            aws_region: region.to_string(),
            cognito_client_id: "client123".to_string(),
            cognito_user_pool_id: pool.to_string(),
            session_secret: "0123456789abcdef0123456789abcdef".to_string(),
            port: 8080,
        }
    }

    #[test]
    fn test_derived_cognito_urls() {
        let config = config_for("eu-west-1", "eu-west-1_AbCdEf123");

        assert_eq!(
            config.cognito_endpoint(),
            "https://cognito-idp.eu-west-1.amazonaws.com/"
        );
        assert_eq!(
            config.token_issuer(),
            "https://cognito-idp.eu-west-1.amazonaws.com/eu-west-1_AbCdEf123"
        );
        assert!(config.jwks_url().ends_with("/.well-known/jwks.json"));
    }
}
