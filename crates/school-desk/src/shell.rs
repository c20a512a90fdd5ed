use std::sync::{Arc, Mutex};

use crate::api::ApiError;
use crate::domain::TenantRef;
use crate::session::SessionHandle;
use crate::store::SelectionStore;

/// Screens the shell can navigate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    SchoolYears,
    SignIn,
    SignUp,
    VerifyEmail,
    PasswordReset,
    Waitlist,
}

impl Route {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "/dashboard",
            Self::SchoolYears => "/dashboard/school-years",
            Self::SignIn => "/auth/sign-in",
            Self::SignUp => "/auth/sign-up",
            Self::VerifyEmail => "/auth/verify-email",
            Self::PasswordReset => "/auth/password-reset",
            Self::Waitlist => "/waitlist",
        }
    }

    /// Auth pages never bounce to sign-in on a 401, avoiding redirect loops.
    pub const fn is_auth_page(self) -> bool {
        matches!(
            self,
            Self::SignIn | Self::SignUp | Self::VerifyEmail | Self::PasswordReset
        )
    }
}

/// Layout chrome state that is not resource-specific: the current route and
/// the forced sign-out rule.
#[derive(Debug)]
pub struct Shell {
    session: Arc<SessionHandle>,
    route: Mutex<Route>,
}

impl Shell {
    pub fn new(session: Arc<SessionHandle>) -> Self {
        Self {
            session,
            route: Mutex::new(Route::Dashboard),
        }
    }

    pub fn current_route(&self) -> Route {
        *self.route.lock().expect("route mutex poisoned")
    }

    pub fn navigate(&self, route: Route) {
        let mut guard = self.route.lock().expect("route mutex poisoned");
        *guard = route;
    }

    /// Applies the global 401 rule: sign the user out and land on sign-in,
    /// unless we are already on an auth page. Other errors pass through
    /// without touching navigation.
    pub fn absorb_api_error(&self, err: &ApiError) {
        if !err.is_unauthorized() {
            return;
        }
        self.session.clear();
        let current = self.current_route();
        if !current.is_auth_page() {
            tracing::info!(from = current.path(), "session rejected, redirecting to sign-in");
            self.navigate(Route::SignIn);
        }
    }

    /// Context-switcher helper: changing tenant keeps the year selection in
    /// place; the management screen re-derives it on its next load.
    pub fn switch_tenant(&self, store: &SelectionStore, tenant: Option<TenantRef>) {
        store.set_selected_tenant(tenant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserRole};
    use crate::session::Session;

    fn signed_in_shell() -> (Shell, Arc<SessionHandle>) {
        let session = Arc::new(SessionHandle::new());
        session.set(Session {
            token: "tok".to_string(),
            user: User {
                id: "u1".to_string(),
                email: "a@b.c".to_string(),
                display_name: "A".to_string(),
                role: UserRole::Admin,
                email_verified: true,
            },
        });
        let shell = Shell::new(session.clone());
        (shell, session)
    }

    #[test]
    fn unauthorized_on_dashboard_forces_sign_out_and_redirect() {
        let (shell, session) = signed_in_shell();
        shell.navigate(Route::Dashboard);

        shell.absorb_api_error(&ApiError::Auth { status: 401 });

        assert!(!session.is_authenticated());
        assert_eq!(shell.current_route(), Route::SignIn);
    }

    #[test]
    fn unauthorized_on_sign_in_does_not_loop() {
        let (shell, session) = signed_in_shell();
        shell.navigate(Route::SignIn);

        shell.absorb_api_error(&ApiError::Auth { status: 401 });

        assert!(!session.is_authenticated());
        assert_eq!(shell.current_route(), Route::SignIn);
    }

    #[test]
    fn forbidden_does_not_alter_navigation_or_session() {
        let (shell, session) = signed_in_shell();
        shell.navigate(Route::SchoolYears);

        shell.absorb_api_error(&ApiError::Auth { status: 403 });

        assert!(session.is_authenticated());
        assert_eq!(shell.current_route(), Route::SchoolYears);
    }
}
