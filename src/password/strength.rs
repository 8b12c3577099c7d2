use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::breach::is_common_password;
use super::policy::{is_special_char, PasswordPolicy};

const MAX_LENGTH_POINTS: u32 = 40;
const POINTS_PER_CHAR: u32 = 2;
const POINTS_PER_CLASS: i32 = 15;
const SEQUENTIAL_PENALTY: i32 = 15;
const REPEATED_PENALTY: i32 = 10;
const DICTIONARY_PENALTY: i32 = 15;
const COMMON_PASSWORD_CAP: i32 = 10;

const SEQUENCES: [&str; 5] = [
    "0123456789",
    "abcdefghijklmnopqrstuvwxyz",
    "qwertyuiop",
    "asdfghjkl",
    "zxcvbnm",
];

const DICTIONARY_WORDS: [&str; 15] = [
    "password", "admin", "login", "welcome", "letmein", "qwerty", "monkey", "dragon", "master", "shadow",
    "sunshine", "football", "iloveyou", "princess", "secret",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Strength {
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl Strength {
    pub fn as_str(self) -> &'static str {
        match self {
            Strength::Weak => "weak",
            Strength::Medium => "medium",
            Strength::Strong => "strong",
            Strength::VeryStrong => "very-strong",
        }
    }

    /// Bands a score; a password that failed validation never rates above medium.
    pub fn from_score(score: u8, valid: bool) -> Self {
        let band = match score {
            0..=39 => Strength::Weak,
            40..=59 => Strength::Medium,
            60..=79 => Strength::Strong,
            _ => Strength::VeryStrong,
        };

        if !valid && band > Strength::Medium {
            Strength::Medium
        } else {
            band
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub strength: Strength,
    pub score: u8,
}

/// Heuristic findings used for both scoring and the strict policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeakPatterns {
    pub common: bool,
    pub sequential: bool,
    pub repeated: bool,
    pub dictionary: bool,
}

impl WeakPatterns {
    pub fn detect(password: &str) -> Self {
        let lowered = password.to_lowercase();
        Self {
            common: is_common_password(password),
            sequential: has_sequential_run(&lowered),
            repeated: has_repeated_run(password),
            dictionary: DICTIONARY_WORDS.iter().any(|word| lowered.contains(word)),
        }
    }

    pub fn any(&self) -> bool {
        self.common || self.sequential || self.repeated || self.dictionary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CharClasses {
    upper: bool,
    lower: bool,
    digit: bool,
    special: bool,
}

impl CharClasses {
    fn of(password: &str) -> Self {
        password.chars().fold(Self::default(), |mut classes, c| {
            classes.upper |= c.is_uppercase();
            classes.lower |= c.is_lowercase();
            classes.digit |= c.is_ascii_digit();
            classes.special |= is_special_char(c);
            classes
        })
    }

    fn count(&self) -> i32 {
        [self.upper, self.lower, self.digit, self.special]
            .into_iter()
            .filter(|present| *present)
            .count() as i32
    }
}

fn has_sequential_run(lowered: &str) -> bool {
    let chars: Vec<char> = lowered.chars().collect();
    chars.windows(3).any(|window| {
        let forward: String = window.iter().collect();
        let backward: String = window.iter().rev().collect();
        SEQUENCES
            .iter()
            .any(|sequence| sequence.contains(&forward) || sequence.contains(&backward))
    })
}

fn has_repeated_run(password: &str) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars.windows(3).any(|window| window[0] == window[1] && window[1] == window[2])
}

/// Advisory 0-100 score. Independent of the policy.
pub fn score_password(password: &str) -> u8 {
    let length = password.chars().count() as u32;
    let patterns = WeakPatterns::detect(password);

    let mut score = (length * POINTS_PER_CHAR).min(MAX_LENGTH_POINTS) as i32;
    score += CharClasses::of(password).count() * POINTS_PER_CLASS;

    if patterns.sequential {
        score -= SEQUENTIAL_PENALTY;
    }
    if patterns.repeated {
        score -= REPEATED_PENALTY;
    }
    if patterns.dictionary {
        score -= DICTIONARY_PENALTY;
    }
    if patterns.common {
        score = score.min(COMMON_PASSWORD_CAP);
    }

    score.clamp(0, 100) as u8
}

pub fn validate_password(password: &str, policy: &PasswordPolicy) -> ValidationResult {
    let mut errors = Vec::new();
    let classes = CharClasses::of(password);

    if password.chars().count() < policy.min_length {
        errors.push(format!(
            "Password must be at least {} characters long",
            policy.min_length
        ));
    }
    if policy.require_uppercase && !classes.upper {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if policy.require_lowercase && !classes.lower {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if policy.require_numbers && !classes.digit {
        errors.push("Password must contain at least one number".to_string());
    }
    if policy.require_special_chars && !classes.special {
        errors.push("Password must contain at least one special character (!@#$%^&*...)".to_string());
    }

    if policy.reject_weak_patterns {
        let patterns = WeakPatterns::detect(password);
        if patterns.common {
            errors.push("Password is too common and easily guessable".to_string());
        }
        if patterns.sequential {
            errors.push("Password contains sequential characters (e.g., 123, abc)".to_string());
        }
        if patterns.repeated {
            errors.push("Password contains too many repeated characters".to_string());
        }
        if patterns.dictionary {
            errors.push("Password contains common dictionary words".to_string());
        }
    }

    let score = score_password(password);
    let valid = errors.is_empty();

    tracing::debug!(valid, score, error_count = errors.len(), "password validated");

    ValidationResult {
        valid,
        errors,
        strength: Strength::from_score(score, valid),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(password: &str) -> ValidationResult {
        validate_password(password, &PasswordPolicy::default())
    }

    #[test]
    fn strong_password_is_valid() {
        let result = validate("Tr0ub4dor&3");
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.score, 82);
        assert_eq!(result.strength, Strength::VeryStrong);
    }

    #[test]
    fn every_failed_requirement_is_reported_in_order() {
        let result = validate("short");
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "Password must be at least 8 characters long",
                "Password must contain at least one uppercase letter",
                "Password must contain at least one number",
                "Password must contain at least one special character (!@#$%^&*...)",
            ]
        );
        assert_eq!(result.score, 25);
        assert_eq!(result.strength, Strength::Weak);
    }

    #[test]
    fn failing_password_never_rates_above_medium() {
        let result = validate("Short1");
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.score, 57);
        assert_eq!(result.strength, Strength::Medium);

        assert_eq!(Strength::from_score(95, false), Strength::Medium);
        assert_eq!(Strength::from_score(20, false), Strength::Weak);
    }

    #[test]
    fn common_passwords_are_capped() {
        assert!(score_password("password123") <= 10);
        assert!(score_password("Password123") <= 10);
        assert_eq!(validate("password123").strength, Strength::Weak);
    }

    #[test]
    fn scores_follow_documented_weights() {
        assert_eq!(score_password("weak"), 23);
        assert_eq!(score_password("Str0ng!P@ssW0rd"), 90);
        assert_eq!(score_password("MyP@ssW0rdGood!"), 90);
        assert_eq!(score_password("MyPass123word!"), 73);
        assert!(score_password("MyPass123word!") < score_password("MyP@ssW0rdGood!"));
    }

    #[test]
    fn score_is_clamped_and_length_points_are_capped() {
        let long = format!("A!1{}", "ab".repeat(50));
        assert_eq!(score_password(&long), 100);
        assert_eq!(score_password(""), 0);
    }

    #[test]
    fn bands_have_expected_boundaries() {
        assert_eq!(Strength::from_score(39, true), Strength::Weak);
        assert_eq!(Strength::from_score(40, true), Strength::Medium);
        assert_eq!(Strength::from_score(59, true), Strength::Medium);
        assert_eq!(Strength::from_score(60, true), Strength::Strong);
        assert_eq!(Strength::from_score(79, true), Strength::Strong);
        assert_eq!(Strength::from_score(80, true), Strength::VeryStrong);
    }

    #[test]
    fn empty_password_fails_every_check() {
        let result = validate("");
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 5);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let result = validate_password("Ünïcødé1!", &PasswordPolicy::with_min_length(9));
        assert!(result.valid, "{:?}", result.errors);
        assert!(!validate_password("Ünïcødé1!", &PasswordPolicy::with_min_length(10)).valid);
    }

    #[test]
    fn heuristics_detect_weak_patterns() {
        assert!(WeakPatterns::detect("xx123yy").sequential);
        assert!(WeakPatterns::detect("xxCBAyy").sequential);
        assert!(WeakPatterns::detect("zzQWEzz").sequential);
        assert!(WeakPatterns::detect("aaab").repeated);
        assert!(!WeakPatterns::detect("aab").repeated);
        assert!(WeakPatterns::detect("MyAdminPass").dictionary);
        assert!(WeakPatterns::detect("LetMeIn").common);
        assert!(!WeakPatterns::detect("Tr0ub4dor&3").any());
    }

    #[test]
    fn strict_policy_appends_heuristic_errors() {
        let relaxed = validate("Abcdef1!");
        assert!(relaxed.valid);

        let strict = validate_password("Abcdef1!", &PasswordPolicy::strict());
        assert!(!strict.valid);
        assert_eq!(
            strict.errors,
            vec!["Password contains sequential characters (e.g., 123, abc)"]
        );

        let strict = validate_password("Passw0rd!!!x", &PasswordPolicy::strict());
        assert!(strict
            .errors
            .contains(&"Password contains too many repeated characters".to_string()));
    }

    #[test]
    fn relaxed_requirements_skip_class_checks() {
        let policy = PasswordPolicy {
            require_uppercase: false,
            require_special_chars: false,
            ..PasswordPolicy::default()
        };
        assert!(validate_password("lowercase1", &policy).valid);
    }
}
