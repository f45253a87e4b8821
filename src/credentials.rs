//! Username/password credential store
//!
//! The proxy only ever reads credentials; the user-management commands of
//! the binary are the sole writers. Users are kept in a TOML file:
//!
//! ```toml
//! [users]
//! alice = "secret"
//! bob = "hunter2"
//! ```

use crate::error::SocksdError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Minimum password length accepted when adding users
pub const MIN_PASSWORD_LENGTH: usize = 3;

/// Read-only view of the credentials consulted during authentication
///
/// Implementations must be safe to query from many sessions at once.
pub trait CredentialStore: Send + Sync {
    /// Password registered for `username`
    fn lookup(&self, username: &str) -> Option<&str>;

    /// Whether no credentials are configured
    fn is_empty(&self) -> bool;

    /// Check a username/password pair
    ///
    /// An empty store disables authentication, so every pair is accepted.
    fn authenticate(&self, username: &str, password: &str) -> bool {
        if self.is_empty() {
            debug!("No users configured, authentication disabled");
            return true;
        }

        match self.lookup(username) {
            Some(expected) if expected == password => true,
            Some(_) => {
                warn!("Authentication failed: invalid password for user: {}", username);
                false
            }
            None => {
                warn!("Authentication failed: user not found: {}", username);
                false
            }
        }
    }
}

/// On-disk layout of the users file
#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: BTreeMap<String, String>,
}

/// Credential store backed by an optional TOML file
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    path: Option<PathBuf>,
    users: BTreeMap<String, String>,
}

impl UserStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an in-memory store from username/password pairs
    pub fn from_users<I, U, P>(users: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        UserStore {
            path: None,
            users: users
                .into_iter()
                .map(|(u, p)| (u.into(), p.into()))
                .collect(),
        }
    }

    /// Load users from `path`
    ///
    /// A missing file yields an empty store bound to `path`, so that
    /// authentication is disabled and users can still be added later.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SocksdError> {
        let path = path.as_ref();

        if !path.exists() {
            warn!("Authentication file not found: {:?}", path);
            return Ok(UserStore {
                path: Some(path.to_path_buf()),
                users: BTreeMap::new(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let file: UsersFile = toml::from_str(&content).map_err(|e| {
            SocksdError::Credentials(format!("invalid users file {:?}: {}", path, e))
        })?;

        info!("Loaded {} users from {:?}", file.users.len(), path);

        Ok(UserStore {
            path: Some(path.to_path_buf()),
            users: file.users,
        })
    }

    /// Write the store back to its file, if it has one
    pub fn save(&self) -> Result<(), SocksdError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = UsersFile {
            users: self.users.clone(),
        };
        let content = toml::to_string_pretty(&file)
            .map_err(|e| SocksdError::Credentials(format!("failed to encode users: {}", e)))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Add a user and persist the change
    ///
    /// The in-memory insert is rolled back if the file cannot be written.
    pub fn add_user(&mut self, username: &str, password: &str) -> Result<(), SocksdError> {
        if username.is_empty() || password.is_empty() {
            return Err(SocksdError::Credentials(
                "username and password must not be empty".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SocksdError::Credentials(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if self.users.contains_key(username) {
            return Err(SocksdError::Credentials(format!(
                "user {} already exists",
                username
            )));
        }

        self.users.insert(username.to_string(), password.to_string());
        if let Err(e) = self.save() {
            self.users.remove(username);
            return Err(e);
        }

        info!("User {} added", username);
        Ok(())
    }

    /// Remove a user and persist the change
    pub fn remove_user(&mut self, username: &str) -> Result<(), SocksdError> {
        if self.users.remove(username).is_none() {
            return Err(SocksdError::Credentials(format!(
                "user {} not found",
                username
            )));
        }

        self.save()?;
        info!("User {} removed", username);
        Ok(())
    }

    /// Configured usernames in sorted order
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    /// Number of configured users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// File backing this store
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl CredentialStore for UserStore {
    fn lookup(&self, username: &str) -> Option<&str> {
        self.users.get(username).map(String::as_str)
    }

    fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
