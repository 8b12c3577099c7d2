use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::password::{PasswordPolicy, Strength, ValidationResult};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidatePasswordRequest {
    pub password: String,
    /// Overrides the server policy for this call.
    #[serde(default)]
    pub policy: Option<PasswordPolicy>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidatePasswordResponse {
    pub valid: bool,
    pub errors: Vec<String>,
    pub strength: Strength,
    pub score: u8,
    pub feedback: Vec<String>,
}

impl ValidatePasswordResponse {
    pub fn new(result: ValidationResult, feedback: Vec<String>) -> Self {
        Self {
            valid: result.valid,
            errors: result.errors,
            strength: result.strength,
            score: result.score,
            feedback,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GeneratePasswordRequest {
    #[schema(example = 16)]
    pub length: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeneratePasswordResponse {
    pub password: String,
    pub strength: Strength,
    pub score: u8,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BreachCheckRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BreachCheckResponse {
    pub breached: bool,
}
