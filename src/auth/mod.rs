pub mod claims;
pub mod cognito;
pub mod jwks;
pub mod jwt;
pub mod session;
pub mod session_token;
pub mod validation;

pub use claims::CognitoClaims;
pub use cognito::{AuthTokens, CognitoClient, CognitoUser};
pub use jwks::JwksCache;
pub use jwt::validate_access_token;
pub use session::{SessionStore, MAX_LOGIN_ATTEMPTS, SESSION_TTL_HOURS};
pub use session_token::{generate_session_token, validate_session_token};
