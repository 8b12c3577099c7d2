use async_trait::async_trait;

use crate::errors::AppError;

/// Well-known leaked passwords, lowercase. Matching is exact and case-insensitive.
pub const COMMON_PASSWORDS: [&str; 26] = [
    "password",
    "password1",
    "password123",
    "123456",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty",
    "qwerty123",
    "abc123",
    "admin",
    "admin123",
    "letmein",
    "welcome",
    "welcome1",
    "monkey",
    "dragon",
    "master",
    "iloveyou",
    "111111",
    "000000",
    "sunshine",
    "football",
    "trustno1",
    "passw0rd",
    "p@ssw0rd",
];

pub fn is_common_password(password: &str) -> bool {
    let lowered = password.to_lowercase();
    COMMON_PASSWORDS.iter().any(|common| *common == lowered)
}

pub fn check_password_breached(password: &str) -> bool {
    is_common_password(password)
}

/// Source of known-compromised passwords. The bundled implementation is a
/// static list; a remote breach database can sit behind the same trait.
#[async_trait]
pub trait BreachChecker: Send + Sync {
    async fn is_breached(&self, password: &str) -> Result<bool, AppError>;
}

#[derive(Debug, Clone, Default)]
pub struct LocalDenylist {
    extra: Vec<String>,
}

impl LocalDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds site-specific entries on top of the bundled list.
    pub fn with_entries<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra
            .extend(entries.into_iter().map(|entry| entry.as_ref().to_lowercase()));
        self
    }

    pub fn contains(&self, password: &str) -> bool {
        if is_common_password(password) {
            return true;
        }

        let lowered = password.to_lowercase();
        self.extra.iter().any(|entry| *entry == lowered)
    }
}

#[async_trait]
impl BreachChecker for LocalDenylist {
    async fn is_breached(&self, password: &str) -> Result<bool, AppError> {
        Ok(self.contains(password))
    }
}
