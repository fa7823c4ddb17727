//! User accounts and the per-invocation login.
//!
//! Accounts live in `users.toml` as two tables, `[users]` (salted SHA-256
//! hex digests) and `[user_roles]`. While no account exists the tool runs
//! in open mode: whoever runs it acts as an admin.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AuthError, Result, StoreError};

pub const USERS_FILE: &str = "users.toml";
pub const PROTECTED_USER: &str = "admin";
const PASSWORD_SALT: &str = "matforvaring_salt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: BTreeMap<String, String>,
    #[serde(default)]
    user_roles: BTreeMap<String, Role>,
}

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(PASSWORD_SALT.as_bytes());
    hex::encode(hasher.finalize())
}

/// Who is running this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    /// `None` when accounts exist but nobody logged in
    pub role: Option<Role>,
}

impl Actor {
    pub fn require_login(&self) -> Result<()> {
        match self.role {
            Some(_) => Ok(()),
            None => Err(AuthError::LoginRequired.into()),
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        match self.role {
            Some(Role::Admin) => Ok(()),
            Some(Role::User) => Err(AuthError::AdminRequired.into()),
            None => Err(AuthError::LoginRequired.into()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}

pub struct UserDirectory {
    path: PathBuf,
    file: UsersFile,
}

impl UserDirectory {
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(USERS_FILE);
        let file = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| StoreError::FileRead {
                path: path.display().to_string(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| AuthError::Parse {
                path: path.display().to_string(),
                source: e,
            })?
        } else {
            UsersFile::default()
        };
        Ok(Self { path, file })
    }

    pub fn is_empty(&self) -> bool {
        self.file.users.is_empty()
    }

    fn role_of(&self, username: &str) -> Role {
        self.file.user_roles.get(username).copied().unwrap_or_default()
    }

    /// Names and roles, without password hashes.
    pub fn list_users(&self) -> Vec<(String, Role)> {
        self.file
            .users
            .keys()
            .map(|name| (name.clone(), self.role_of(name)))
            .collect()
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<Role> {
        let stored = self
            .file
            .users
            .get(username)
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;
        if hash_password(password) != *stored {
            log::warn!("Failed login for {}", username);
            return Err(AuthError::WrongPassword.into());
        }
        Ok(self.role_of(username))
    }

    /// Resolve the actor for this run from `--user` and the password.
    pub fn login(&self, username: Option<&str>, password: Option<&str>, fallback: &str) -> Result<Actor> {
        if self.is_empty() {
            return Ok(Actor {
                name: username.unwrap_or(fallback).to_string(),
                role: Some(Role::Admin),
            });
        }
        match (username, password) {
            (Some(name), Some(password)) => {
                let role = self.authenticate(name, password)?;
                log::info!("Logged in as {} ({})", name, role);
                Ok(Actor {
                    name: name.to_string(),
                    role: Some(role),
                })
            }
            (Some(_), None) => Err(AuthError::LoginRequired.into()),
            (None, _) => Ok(Actor {
                name: fallback.to_string(),
                role: None,
            }),
        }
    }

    pub fn add_user(&mut self, username: &str, password: &str, role: Role) -> Result<()> {
        if self.file.users.contains_key(username) {
            return Err(AuthError::UserExists(username.to_string()).into());
        }
        self.file
            .users
            .insert(username.to_string(), hash_password(password));
        self.file.user_roles.insert(username.to_string(), role);
        self.save()
    }

    pub fn delete_user(&mut self, username: &str) -> Result<()> {
        if !self.file.users.contains_key(username) {
            return Err(AuthError::UnknownUser(username.to_string()).into());
        }
        if username == PROTECTED_USER {
            return Err(AuthError::ProtectedUser.into());
        }
        self.file.users.remove(username);
        self.file.user_roles.remove(username);
        self.save()
    }

    pub fn change_password(&mut self, username: &str, new_password: &str) -> Result<()> {
        let slot = self
            .file
            .users
            .get_mut(username)
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;
        *slot = hash_password(new_password);
        self.save()
    }

    fn save(&self) -> Result<()> {
        let content = toml::to_string(&self.file).map_err(AuthError::from)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content).map_err(|e| StoreError::FileWrite {
            path: self.path.display().to_string(),
            source: e,
        })?;
        log::info!("Saved users to {}", self.path.display());
        Ok(())
    }
}
