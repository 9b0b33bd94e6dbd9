use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use uuid::Uuid;

use super::dtos::Claims;
use crate::{AppError, AppResult};

/// Validate a bearer/handshake token and return its claims.
///
/// Shared by the REST auth middleware and the WebSocket handshake so both
/// transports apply the same verification rule.
pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(token_data.claims)
}

/// Parse the claims subject into a user id.
pub fn subject_id(claims: &Claims) -> AppResult<Uuid> {
    Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Authentication("Invalid user id in token".to_string()))
}
