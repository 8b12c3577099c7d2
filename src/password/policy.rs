use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_MIN_LENGTH: usize = 8;

/// Characters that satisfy the "special character" requirement.
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_numbers: bool,
    pub require_special_chars: bool,
    /// Also fail passwords that trip the weak-pattern heuristics.
    pub reject_weak_patterns: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            require_uppercase: true,
            require_lowercase: true,
            require_numbers: true,
            require_special_chars: true,
            reject_weak_patterns: false,
        }
    }
}

impl PasswordPolicy {
    pub fn with_min_length(min_length: usize) -> Self {
        Self {
            min_length,
            ..Self::default()
        }
    }

    pub fn strict() -> Self {
        Self {
            reject_weak_patterns: true,
            ..Self::default()
        }
    }
}

pub fn is_special_char(c: char) -> bool {
    SPECIAL_CHARS.contains(c)
}
