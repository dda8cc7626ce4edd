use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{SessionProvider, SessionState};
use crate::types::{Role, Session};

/// Screens of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    ForgetPassword,
    SetPassword,
    AuditLogs,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::ForgetPassword => "/forget-password",
            Route::SetPassword => "/set-password",
            Route::AuditLogs => "/audit-logs",
        }
    }

    /// Screens reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::ForgetPassword | Route::SetPassword)
    }
}

pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, route: Route);
}

/// Session-derived view for protected screens.
///
/// Redirects to [`Route::Login`] once the provider reports no session, never
/// while it is still loading.
#[derive(Clone)]
pub struct AuthGuard {
    rx: watch::Receiver<SessionState>,
    admin_only: bool,
}

impl AuthGuard {
    pub fn new(provider: &dyn SessionProvider) -> Self {
        Self {
            rx: provider.on_session_change(),
            admin_only: false,
        }
    }

    /// Guard for admin screens; a resolved cashier is sent home
    pub fn require_admin(provider: &dyn SessionProvider) -> Self {
        Self {
            rx: provider.on_session_change(),
            admin_only: true,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.rx.borrow().session().is_some()
    }

    pub fn session(&self) -> Option<Session> {
        self.rx.borrow().session().cloned()
    }

    pub fn role(&self) -> Role {
        self.rx.borrow().role()
    }

    /// `None` until the role is known
    pub fn is_admin(&self) -> Option<bool> {
        self.role().is_admin()
    }

    /// Where a screen under this guard should go for `state`, if anywhere
    pub fn redirect_for(&self, state: &SessionState) -> Option<Route> {
        redirect(self.admin_only, state)
    }

    /// Follow session changes until the provider goes away
    pub async fn run<N: Navigator>(mut self, navigator: N) {
        let admin_only = self.admin_only;
        let mut last = None;
        loop {
            let target = redirect(admin_only, &self.rx.borrow_and_update());
            if target != last {
                if let Some(route) = target {
                    debug!("Auth guard redirecting to {}", route.path());
                    navigator.navigate(route);
                }
                last = target;
            }
            if self.rx.changed().await.is_err() {
                break;
            }
        }
    }

    pub fn spawn<N: Navigator>(self, navigator: N) -> JoinHandle<()> {
        tokio::spawn(self.run(navigator))
    }
}

fn redirect(admin_only: bool, state: &SessionState) -> Option<Route> {
    match state {
        SessionState::Loading => None,
        SessionState::SignedOut => Some(Route::Login),
        SessionState::SignedIn { role, .. } => {
            if admin_only && role.is_admin() == Some(false) {
                Some(Route::Home)
            } else {
                None
            }
        }
    }
}
