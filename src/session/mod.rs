//! Client-side session state.
//!
//! A [`SessionProvider`] publishes the signed-in principal and its role on a
//! `watch` channel. Consumers (the [`AuthGuard`], the catalog view) receive the
//! provider explicitly instead of reading shared global state.

pub mod guard;

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::{AuthError, Backend, BackendError, ResetError};
use crate::types::{Role, Session};

pub use guard::{AuthGuard, Navigator, Route};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Provider has not reported yet
    #[default]
    Loading,
    SignedOut,
    SignedIn { session: Session, role: Role },
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::SignedIn { session, .. } => Some(session),
            _ => None,
        }
    }

    /// `Role::Unknown` unless signed in with a resolved role
    pub fn role(&self) -> Role {
        match self {
            SessionState::SignedIn { role, .. } => *role,
            _ => Role::Unknown,
        }
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self, SessionState::Loading)
    }
}

/// Source of the current session, with change notification
pub trait SessionProvider: Send + Sync {
    fn on_session_change(&self) -> watch::Receiver<SessionState>;

    fn get_session(&self) -> Option<Session> {
        self.on_session_change().borrow().session().cloned()
    }
}

/// Session provider backed by the store backend's auth and role services
pub struct BackendSessionProvider {
    backend: Arc<dyn Backend>,
    state: watch::Sender<SessionState>,
}

impl BackendSessionProvider {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self { backend, state }
    }

    /// Report the first value, e.g. a session restored from storage
    pub async fn restore(&self, session: Option<Session>) {
        match session {
            Some(session) => self.establish(session).await,
            None => {
                self.state.send_replace(SessionState::SignedOut);
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.backend.sign_in(email, password).await?;
        info!("Signed in as {}", session.user.email);
        self.establish(session.clone()).await;
        Ok(session)
    }

    /// Sign in with a password recovery token
    pub async fn recover(&self, token: &str) -> Result<Session, AuthError> {
        let session = self.backend.recover(token).await?;
        self.establish(session.clone()).await;
        Ok(session)
    }

    pub fn sign_out(&self) {
        self.state.send_replace(SessionState::SignedOut);
        info!("Signed out");
    }

    pub async fn reset_password_for_email(&self, email: &str) -> Result<(), ResetError> {
        self.backend.reset_password_for_email(email).await
    }

    pub async fn update_password(&self, password: &str) -> Result<(), AuthError> {
        let session = self.get_session().ok_or(AuthError::NotSignedIn)?;
        self.backend.update_password(session.user.id, password).await?;
        Ok(())
    }

    /// Publish the session with an unresolved role, then look the role up
    async fn establish(&self, session: Session) {
        self.state.send_replace(SessionState::SignedIn {
            session: session.clone(),
            role: Role::Unknown,
        });

        match self.backend.get_role(session.user.id).await {
            Ok(role) => self.apply_role(&session, role),
            Err(err) => warn!("Role lookup failed for {}: {}", session.user.email, err),
        }
    }

    /// Apply a role lookup result unless the session changed meanwhile
    fn apply_role(&self, session: &Session, resolved: Role) {
        let applied = self.state.send_if_modified(|state| match state {
            SessionState::SignedIn { session: current, role } if current.access_token == session.access_token => {
                let changed = *role != resolved;
                *role = resolved;
                changed
            }
            _ => false,
        });
        if !applied {
            debug!("Role {:?} for {} not applied", resolved, session.user.email);
        }
    }

    /// Lookup without publishing; used by callers that hold their own session
    pub async fn role_for(&self, session: &Session) -> Result<Role, BackendError> {
        self.backend.get_role(session.user.id).await
    }
}

impl SessionProvider for BackendSessionProvider {
    fn on_session_change(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    async fn provider() -> (BackendSessionProvider, MemoryBackend) {
        let backend = MemoryBackend::new();
        backend.add_user("admin@domo.store", "admin-pass", Role::Admin).await.unwrap();
        backend.add_user("cashier@domo.store", "cashier-pass", Role::Cashier).await.unwrap();
        backend.add_user("limbo@domo.store", "limbo-pass", Role::Unknown).await.unwrap();
        (BackendSessionProvider::new(Arc::new(backend.clone())), backend)
    }

    #[tokio::test]
    async fn starts_loading_until_restored() {
        let (provider, _) = provider().await;
        assert_eq!(*provider.on_session_change().borrow(), SessionState::Loading);
        provider.restore(None).await;
        assert_eq!(*provider.on_session_change().borrow(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn sign_in_resolves_role() {
        let (provider, _) = provider().await;
        let mut rx = provider.on_session_change();

        provider.sign_in("cashier@domo.store", "cashier-pass").await.unwrap();
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.role(), Role::Cashier);
        assert_eq!(provider.get_session().unwrap().user.email, "cashier@domo.store");
    }

    #[tokio::test]
    async fn missing_role_stays_unknown() {
        let (provider, _) = provider().await;
        provider.sign_in("limbo@domo.store", "limbo-pass").await.unwrap();
        let state = provider.on_session_change().borrow().clone();
        assert!(state.session().is_some());
        assert_eq!(state.role(), Role::Unknown);
        assert_eq!(state.role().is_admin(), None);
    }

    #[tokio::test]
    async fn late_role_result_is_ignored_after_sign_out() {
        let (provider, _) = provider().await;
        let session = provider.sign_in("admin@domo.store", "admin-pass").await.unwrap();
        provider.sign_out();

        provider.apply_role(&session, Role::Admin);
        assert_eq!(*provider.on_session_change().borrow(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn wrong_password_keeps_state() {
        let (provider, _) = provider().await;
        provider.restore(None).await;
        let err = provider.sign_in("admin@domo.store", "nope").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(*provider.on_session_change().borrow(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn update_password_needs_session() {
        let (provider, _) = provider().await;
        assert!(matches!(
            provider.update_password("new-password").await,
            Err(AuthError::NotSignedIn)
        ));

        provider.sign_in("cashier@domo.store", "cashier-pass").await.unwrap();
        provider.update_password("brand-new-pass").await.unwrap();
        provider.sign_out();
        assert!(provider.sign_in("cashier@domo.store", "brand-new-pass").await.is_ok());
    }
}
