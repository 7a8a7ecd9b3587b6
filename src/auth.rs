use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AuthError;
use crate::store::{Store, User};

const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const TOKEN_LEN: usize = 32;
const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Admins hold every role; users only their own.
    pub fn grants(self, required: Role) -> bool {
        self == Role::Admin || required == Role::User
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Sign-in capability handed to the UI and the admin CLI.
pub trait Authenticator {
    fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Whether `session` is still live and carries `role`.
    fn require_role(&self, session: &Session, role: Role) -> bool;
}

/// Password and session handling over the [`Store`].
#[derive(Debug)]
pub struct AuthService {
    store: Store,
    hash_rounds: u32,
    session_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(store: Store, hash_rounds: u32, session_ttl: std::time::Duration) -> Self {
        Self {
            store,
            hash_rounds: hash_rounds.max(1),
            session_ttl: chrono::Duration::from_std(session_ttl)
                .unwrap_or_else(|_| chrono::Duration::hours(24)),
        }
    }

    pub fn from_config(store: Store, config: &AppConfig) -> Self {
        Self::new(store, config.password_hash_rounds, config.session_ttl)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Validates and creates an account, then signs it in.
    pub fn register(&self, username: &str, password: &str, confirm: &str) -> Result<Session, AuthError> {
        if password != confirm {
            return Err(AuthError::Validation("passwords don't match".to_string()));
        }
        let user = self.create_user(username, password, false)?;
        info!(user = user.username.as_str(), "registered new user");
        self.start_session(&user)
    }

    /// Creates an account without signing it in.
    pub fn create_user(&self, username: &str, password: &str, is_admin: bool) -> Result<User, AuthError> {
        let username = username.trim();
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(AuthError::Validation(format!(
                "username must be at least {MIN_USERNAME_LEN} characters"
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.store.user_by_username(username)?.is_some() {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }
        let hash = hash_password(password, self.hash_rounds);
        Ok(self.store.create_user(username, &hash, is_admin)?)
    }

    /// Looks up a live session by token.
    pub fn resume(&self, token: &str) -> Result<Session, AuthError> {
        let record = self
            .store
            .session(token)?
            .ok_or(AuthError::SessionExpired)?;
        if Utc::now() >= record.expires_at {
            self.store.delete_session(token)?;
            return Err(AuthError::SessionExpired);
        }
        let user = self
            .store
            .user_by_id(record.user_id)?
            .ok_or(AuthError::SessionExpired)?;
        Ok(session_for(&user, record.token, record.expires_at))
    }

    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.store.delete_session(token)?;
        Ok(())
    }

    /// Seeds an admin account when the user table is empty.
    pub fn ensure_admin(&self, username: &str, password: &str) -> Result<Option<User>, AuthError> {
        if self.store.user_count()? > 0 {
            return Ok(None);
        }
        let user = self.create_user(username, password, true)?;
        warn!(user = user.username.as_str(), "seeded default admin account");
        Ok(Some(user))
    }

    fn start_session(&self, user: &User) -> Result<Session, AuthError> {
        let now = Utc::now();
        self.store.purge_expired_sessions(now)?;
        let token = new_token();
        let expires_at = now + self.session_ttl;
        self.store.create_session(&token, user.id, expires_at)?;
        Ok(session_for(user, token, expires_at))
    }
}

impl Authenticator for AuthService {
    fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let user = self
            .store
            .user_by_username(&credentials.username)?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&credentials.password, &user.password_hash) {
            warn!(user = credentials.username.as_str(), "rejected sign-in");
            return Err(AuthError::InvalidCredentials);
        }
        info!(user = user.username.as_str(), "signed in");
        self.start_session(&user)
    }

    fn require_role(&self, session: &Session, role: Role) -> bool {
        if session.is_expired(Utc::now()) || !session.role.grants(role) {
            return false;
        }
        match self.store.session(&session.token) {
            Ok(Some(record)) => record.user_id == session.user_id,
            Ok(None) => false,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "session lookup failed");
                false
            }
        }
    }
}

fn session_for(user: &User, token: String, expires_at: DateTime<Utc>) -> Session {
    Session {
        token,
        user_id: user.id,
        username: user.username.clone(),
        role: if user.is_admin { Role::Admin } else { Role::User },
        expires_at,
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `pbkdf2-sha256$<rounds>$<salt>$<hash>` with a random salt.
pub fn hash_password(password: &str, rounds: u32) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, rounds, &mut hash);
    format!(
        "{HASH_SCHEME}${rounds}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Checks `password` against an encoded hash. Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(expected))
    else {
        return false;
    };
    if rounds == 0 || expected.is_empty() {
        return false;
    }
    let mut actual = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, rounds, &mut actual);
    constant_time_eq(&actual, &expected)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trip() {
        let encoded = hash_password("secret1", 1_000);
        assert!(encoded.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("secret1", &encoded));
        assert!(!verify_password("secret2", &encoded));
    }

    #[test]
    fn same_password_gets_fresh_salt() {
        assert_ne!(hash_password("secret1", 1_000), hash_password("secret1", 1_000));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "pbkdf2-sha256$abc$AAAA$AAAA"));
        assert!(!verify_password("x", "bcrypt$10$AAAA$AAAA"));
    }

    #[test]
    fn admin_grants_user_role() {
        assert!(Role::Admin.grants(Role::User));
        assert!(Role::User.grants(Role::User));
        assert!(!Role::User.grants(Role::Admin));
    }
}
