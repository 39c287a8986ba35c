/// JWT issuing and validation for Strak.
///
/// Tokens are signed with RS256 only. Keys are loaded once at startup from PEM
/// strings and kept in process-wide cells; every other function in this module
/// fails until `initialize_jwt_keys` has been called.
///
/// Two token kinds exist:
///
/// - **access** tokens (1 hour) authenticate API requests
/// - **refresh** tokens (30 days) can only be exchanged for a new pair
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 1;
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;
const JWT_ALGORITHM: Algorithm = Algorithm::RS256;
const ISSUER: &str = "strak-social";

static JWT_ENCODING_KEY: OnceCell<EncodingKey> = OnceCell::new();
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id
    pub jti: String,
    pub token_type: TokenType,
    pub username: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("Invalid user ID in token: {e}"))
    }
}

/// Token pair handed to clients after register, login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Initialize signing and verification keys. Can only succeed once per process.
pub fn initialize_jwt_keys(private_key_pem: &str, public_key_pem: &str) -> Result<()> {
    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;
    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    JWT_ENCODING_KEY
        .set(encoding_key)
        .map_err(|_| anyhow!("JWT encoding key already initialized"))?;
    JWT_DECODING_KEY
        .set(decoding_key)
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    tracing::debug!("JWT signing and verification keys initialized");
    Ok(())
}

fn encoding_key() -> Result<&'static EncodingKey> {
    JWT_ENCODING_KEY
        .get()
        .ok_or_else(|| anyhow!("JWT keys not initialized"))
}

fn decoding_key() -> Result<&'static DecodingKey> {
    JWT_DECODING_KEY
        .get()
        .ok_or_else(|| anyhow!("JWT keys not initialized"))
}

fn issue(user_id: Uuid, username: &str, token_type: TokenType, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iss: ISSUER.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        jti: Uuid::new_v4().to_string(),
        token_type,
        username: username.to_string(),
    };

    encode(&Header::new(JWT_ALGORITHM), &claims, encoding_key()?)
        .map_err(|e| anyhow!("Failed to sign {token_type:?} token: {e}"))
}

pub fn generate_access_token(user_id: Uuid, username: &str) -> Result<String> {
    issue(
        user_id,
        username,
        TokenType::Access,
        Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS),
    )
}

pub fn generate_refresh_token(user_id: Uuid, username: &str) -> Result<String> {
    issue(
        user_id,
        username,
        TokenType::Refresh,
        Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
    )
}

pub fn generate_token_pair(user_id: Uuid, username: &str) -> Result<TokenPair> {
    Ok(TokenPair {
        access_token: generate_access_token(user_id, username)?,
        refresh_token: generate_refresh_token(user_id, username)?,
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_EXPIRY_HOURS * 3600,
    })
}

/// Verify signature, issuer and expiry, and return the claims.
pub fn validate_token(token: &str) -> Result<Claims> {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;
    validation.set_issuer(&[ISSUER]);

    decode::<Claims>(token, decoding_key()?, &validation)
        .map(|data| data.claims)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}

/// Validate a token and require it to be of the given kind.
pub fn validate_token_of_type(token: &str, expected: TokenType) -> Result<Claims> {
    let claims = validate_token(token)?;
    if claims.token_type != expected {
        return Err(anyhow!(
            "Expected {expected:?} token, got {:?}",
            claims.token_type
        ));
    }
    Ok(claims)
}
