//! HS256 JWT token service.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tradeboard_core::domain::Role;
use tradeboard_core::ports::{AuthError, IssuedToken, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";

/// JWT token service configuration.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: 24,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());

        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        Self {
            secret,
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(24),
        }
    }
}

/// Wire claims. `user_id` and `role` travel as plain strings.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: String,
    role: String,
    exp: i64,
    #[serde(default)]
    iat: i64,
}

/// JWT-based token service. Only HS256 is ever accepted.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.required_spec_claims = ["exp".to_string()].into_iter().collect();

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: TimeDelta::hours(config.expiration_hours),
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            AuthError::InvalidSignature
        }
        _ => AuthError::Malformed(err.to_string()),
    }
}

/// The `alg` named in the token header, if the header is readable at all.
///
/// jsonwebtoken fails on algorithms it does not know (`none`) while parsing the
/// header, which would otherwise surface as a malformed token.
fn header_algorithm(token: &str) -> Option<String> {
    let segment = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    let header: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    header.get("alg")?.as_str().map(str::to_string)
}

impl TokenService for JwtTokenService {
    fn issue(&self, subject: Uuid, role: &Role, ttl: TimeDelta) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + ttl;

        let claims = Claims {
            user_id: subject.to_string(),
            role: role.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        if header_algorithm(token).is_some_and(|alg| alg != "HS256") {
            return Err(AuthError::InvalidSignature);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(map_decode_error)?;

        // jsonwebtoken accepts exp == now; the token is dead at its expiry second.
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }

        let user_id = Uuid::parse_str(&data.claims.user_id)
            .map_err(|e| AuthError::Malformed(format!("user_id: {e}")))?;

        Ok(TokenClaims {
            user_id,
            role: Role::new(&data.claims.role),
            exp: data.claims.exp,
        })
    }

    fn default_ttl(&self) -> TimeDelta {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: secret.to_string(),
            expiration_hours: 1,
        })
    }

    #[test]
    fn issue_then_verify_round_trips_identity() {
        let service = service("test-secret-key");
        let user_id = Uuid::new_v4();

        let issued = service.issue(user_id, &Role::author(), service.default_ttl()).unwrap();
        let claims = service.verify(&issued.token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.role, Role::author());
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = service("test-secret-key");
        let issued = service
            .issue(Uuid::new_v4(), &Role::free(), TimeDelta::seconds(-5))
            .unwrap();

        assert!(matches!(service.verify(&issued.token), Err(AuthError::Expired)));
    }

    #[test]
    fn token_expiring_now_is_rejected() {
        let service = service("test-secret-key");
        let issued = service.issue(Uuid::new_v4(), &Role::free(), TimeDelta::zero()).unwrap();

        assert!(matches!(service.verify(&issued.token), Err(AuthError::Expired)));
    }

    #[test]
    fn foreign_secret_is_invalid_signature() {
        let issued = service("secret-a")
            .issue(Uuid::new_v4(), &Role::admin(), TimeDelta::hours(1))
            .unwrap();

        assert!(matches!(
            service("secret-b").verify(&issued.token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_payload_fails() {
        let service = service("test-secret-key");
        let issued = service.issue(Uuid::new_v4(), &Role::free(), TimeDelta::hours(1)).unwrap();

        let mut parts: Vec<String> = issued.token.split('.').map(str::to_string).collect();
        let forged = Claims {
            user_id: Uuid::new_v4().to_string(),
            role: "admin".to_string(),
            exp: Utc::now().timestamp() + 3600,
            iat: 0,
        };
        let forged_token = encode(
            &Header::new(Algorithm::HS256),
            &forged,
            &EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();
        parts[1] = forged_token.split('.').nth(1).unwrap().to_string();

        assert!(service.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let service = service("test-secret-key");
        let claims = Claims {
            user_id: Uuid::new_v4().to_string(),
            role: "free".to_string(),
            exp: Utc::now().timestamp() + 3600,
            iat: 0,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key"),
        )
        .unwrap();

        assert!(matches!(service.verify(&token), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn unsigned_none_algorithm_is_invalid_signature() {
        let service = service("test-secret-key");
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(
            serde_json::json!({
                "user_id": Uuid::new_v4().to_string(),
                "role": "admin",
                "exp": Utc::now().timestamp() + 3600,
            })
            .to_string(),
        );

        assert!(matches!(
            service.verify(&format!("{header}.{claims}.")),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let service = service("test-secret-key");
        assert!(matches!(service.verify("not-a-token"), Err(AuthError::Malformed(_))));
    }

    #[test]
    fn non_uuid_subject_is_malformed() {
        let service = service("test-secret-key");
        let claims = Claims {
            user_id: "42".to_string(),
            role: "free".to_string(),
            exp: Utc::now().timestamp() + 3600,
            iat: 0,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key"),
        )
        .unwrap();

        assert!(matches!(service.verify(&token), Err(AuthError::Malformed(_))));
    }
}
