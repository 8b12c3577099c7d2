//! Password policy, strength scoring, generation and hashing.

mod breach;
mod feedback;
mod generator;
mod hashing;
mod policy;
mod strength;

pub use breach::{check_password_breached, is_common_password, BreachChecker, LocalDenylist, COMMON_PASSWORDS};
pub use feedback::password_feedback;
pub use generator::{generate_strong_password, DEFAULT_GENERATED_LENGTH, MIN_GENERATED_LENGTH};
pub use hashing::{hash_password, verify_password};
pub use policy::{is_special_char, PasswordPolicy, DEFAULT_MIN_LENGTH, SPECIAL_CHARS};
pub use strength::{score_password, validate_password, Strength, ValidationResult, WeakPatterns};
