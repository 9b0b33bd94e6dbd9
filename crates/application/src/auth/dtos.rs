use serde::{Deserialize, Serialize};

// ============ JWT Claims ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a string (UUID)
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}
