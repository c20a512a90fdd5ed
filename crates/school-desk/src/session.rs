use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::domain::{User, UserRole};

/// Bearer token plus the profile of the signed-in user, as issued by the
/// auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Shared holder for the active session.
///
/// Every resource call reads the token from here; a 401 clears it through
/// the shell's forced sign-out path.
#[derive(Debug, Default)]
pub struct SessionHandle {
    inner: Mutex<Option<Session>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, session: Session) {
        let mut guard = self.inner.lock().expect("session mutex poisoned");
        *guard = Some(session);
    }

    pub fn clear(&self) {
        let mut guard = self.inner.lock().expect("session mutex poisoned");
        *guard = None;
    }

    pub fn token(&self) -> Option<String> {
        let guard = self.inner.lock().expect("session mutex poisoned");
        guard.as_ref().map(|session| session.token.clone())
    }

    pub fn current_user(&self) -> Option<User> {
        let guard = self.inner.lock().expect("session mutex poisoned");
        guard.as_ref().map(|session| session.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user()
            .map(|user| user.role == UserRole::Admin)
            .unwrap_or(false)
    }
}
