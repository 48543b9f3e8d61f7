use std::collections::HashMap;
use tracing::warn;

/// Identity established by a login or a valid bearer token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Bad credentials")]
    BadCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Credential check used at login, and user lookup for token holders.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError>;

    fn load_user(&self, username: &str) -> Option<Principal>;
}

/// Salted bcrypt hash of a password, the format stored in `AUTH_USERS`.
/// `cost` is the bcrypt work factor (4 to 31).
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

#[derive(Debug, Clone)]
struct UserEntry {
    role: String,
    password_hash: String,
}

/// Fixed set of users loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<String, UserEntry>,
}

impl UserDirectory {
    /// Parse `username:role:bcrypt-hash` entries; malformed entries are skipped.
    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut users = HashMap::new();
        for entry in entries {
            let parts: Vec<&str> = entry.as_ref().trim().splitn(3, ':').collect();
            match parts.as_slice() {
                [username, role, hash] if !username.is_empty() && hash.starts_with("$2") => {
                    users.insert(
                        username.to_string(),
                        UserEntry {
                            role: role.to_string(),
                            password_hash: hash.to_string(),
                        },
                    );
                }
                _ => warn!("Skipping malformed user entry"),
            }
        }
        Self { users }
    }

    /// Add or replace a user whose password is already hashed.
    pub fn with_user(mut self, username: &str, role: &str, password_hash: impl Into<String>) -> Self {
        self.users.insert(
            username.to_string(),
            UserEntry {
                role: role.to_string(),
                password_hash: password_hash.into(),
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Authenticator for UserDirectory {
    fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        let entry = self.users.get(username).ok_or(AuthError::BadCredentials)?;
        // A hash that fails to parse matches no password
        if !bcrypt::verify(password, &entry.password_hash).unwrap_or(false) {
            return Err(AuthError::BadCredentials);
        }
        Ok(Principal {
            username: username.to_string(),
            role: entry.role.clone(),
        })
    }

    fn load_user(&self, username: &str) -> Option<Principal> {
        self.users.get(username).map(|entry| Principal {
            username: username.to_string(),
            role: entry.role.clone(),
        })
    }
}
