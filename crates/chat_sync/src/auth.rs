//! Authentication seam and the account flows built on it

use crate::path::PathResolver;
use crate::session::register_user;
use crate::store::RemoteStore;
use crate::{Result, SyncError};
use chat_common::sanitizer::LogSanitizer;
use chat_common::AuthInfo;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Authentication side of the remote backend
pub trait Authenticator: Send + Sync {
    /// Open a session with email and password
    fn authenticate(&self, email: &str, password: &str) -> Result<AuthInfo>;

    /// Register a new account. Does not open a session.
    fn create_account(&self, email: &str, password: &str) -> Result<()>;

    /// Session left open by a previous run, if any
    fn resume_session(&self) -> Option<AuthInfo>;

    /// Close the active session
    fn end_session(&self);
}

#[derive(Default)]
struct AuthState {
    /// email -> password digest
    accounts: HashMap<String, String>,
    active: Option<AuthInfo>,
    issued: u64,
}

/// Accounts kept in process memory
#[derive(Default)]
pub struct MemoryAuth {
    state: Mutex<AuthState>,
}

fn password_digest(email: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Authenticator for MemoryAuth {
    fn authenticate(&self, email: &str, password: &str) -> Result<AuthInfo> {
        let mut state = self.state();
        let matches = state
            .accounts
            .get(email)
            .is_some_and(|digest| *digest == password_digest(email, password));
        if !matches {
            return Err(SyncError::Unauthorized("invalid email or password".to_string()));
        }

        state.issued += 1;
        let mut hasher = Sha256::new();
        hasher.update(email.as_bytes());
        hasher.update(state.issued.to_be_bytes());
        let info = AuthInfo {
            email: email.to_string(),
            token: format!("{:x}", hasher.finalize()),
        };
        state.active = Some(info.clone());
        Ok(info)
    }

    fn create_account(&self, email: &str, password: &str) -> Result<()> {
        if email.is_empty() || password.is_empty() {
            return Err(SyncError::InvalidCredentials(
                "email and password are required".to_string(),
            ));
        }
        let mut state = self.state();
        if state.accounts.contains_key(email) {
            return Err(SyncError::AccountExists(email.to_string()));
        }
        state
            .accounts
            .insert(email.to_string(), password_digest(email, password));
        Ok(())
    }

    fn resume_session(&self) -> Option<AuthInfo> {
        self.state().active.clone()
    }

    fn end_session(&self) {
        self.state().active = None;
    }
}

/// Login, sign-up and logout as the client performs them
pub struct AccountService<A: Authenticator, S: RemoteStore> {
    auth: A,
    store: Arc<S>,
    resolver: PathResolver,
    sanitizer: LogSanitizer,
}

impl<A: Authenticator, S: RemoteStore> AccountService<A, S> {
    pub fn new(auth: A, store: Arc<S>, resolver: PathResolver) -> Self {
        Self {
            auth,
            store,
            resolver,
            sanitizer: LogSanitizer::new(),
        }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthInfo> {
        match self.auth.authenticate(email, password) {
            Ok(info) => {
                tracing::info!("{}", self.sanitizer.sanitize(&format!("logged in as {}", email)));
                Ok(info)
            }
            Err(e) => {
                tracing::warn!("{}", self.sanitizer.sanitize(&format!("login failed for {}: {}", email, e)));
                Err(e)
            }
        }
    }

    /// Create the account, list the user in the users collection, then log in
    pub fn sign_up(&self, email: &str, password: &str) -> Result<AuthInfo> {
        if let Err(e) = self.auth.create_account(email, password) {
            tracing::warn!("{}", self.sanitizer.sanitize(&format!("sign-up failed for {}: {}", email, e)));
            return Err(e);
        }
        register_user(&*self.store, &self.resolver, email);
        self.login(email, password)
    }

    /// Session left by a previous run; `None` means the user must log in
    pub fn resume(&self) -> Option<AuthInfo> {
        let info = self.auth.resume_session();
        if info.is_none() {
            tracing::debug!("no session to resume");
        }
        info
    }

    pub fn logout(&self) {
        self.auth.end_session();
        tracing::info!("logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn service() -> (Arc<MemoryStore>, AccountService<MemoryAuth, MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = AccountService::new(MemoryAuth::new(), Arc::clone(&store), PathResolver::default());
        (store, service)
    }

    #[test]
    fn test_sign_up_registers_user_and_logs_in() {
        let (store, service) = service();
        let info = service.sign_up("alice@example.com", "secret").unwrap();

        assert_eq!(info.email, "alice@example.com");
        assert!(!info.token.is_empty());
        assert_eq!(store.children("users").len(), 1);
        assert_eq!(service.resume(), Some(info));
    }

    #[test]
    fn test_duplicate_sign_up_rejected() {
        let (store, service) = service();
        service.sign_up("alice@example.com", "secret").unwrap();

        let err = service.sign_up("alice@example.com", "other").unwrap_err();
        assert!(matches!(err, SyncError::AccountExists(_)));
        assert_eq!(store.children("users").len(), 1);
    }

    #[test]
    fn test_wrong_password_rejected() {
        let (_store, service) = service();
        service.sign_up("bob@example.com", "right").unwrap();
        service.logout();

        let err = service.login("bob@example.com", "wrong").unwrap_err();
        assert!(matches!(err, SyncError::Unauthorized(_)));
        assert!(service.resume().is_none());
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let (store, service) = service();
        let err = service.sign_up("", "secret").unwrap_err();
        assert!(matches!(err, SyncError::InvalidCredentials(_)));
        assert!(store.children("users").is_empty());
    }

    #[test]
    fn test_tokens_differ_between_sessions() {
        let (_store, service) = service();
        let first = service.sign_up("carol@example.com", "pw").unwrap();
        let second = service.login("carol@example.com", "pw").unwrap();
        assert_ne!(first.token, second.token);
    }
}
