use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;

use crate::domain::User;
use crate::session::Session;

use super::{ApiClient, ApiError, QueryParams};

#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
struct EmailBody {
    email: String,
}

#[derive(Debug, Clone, Serialize)]
struct TokenBody {
    token: String,
}

/// Client for `/auth`: sign-in/out, registration, e-mail verification, and
/// password reset. Token lifecycle beyond "hold the bearer token" stays on
/// the backend.
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// On success the returned session is also installed on the shared
    /// [`crate::session::SessionHandle`].
    pub async fn sign_in(&self, input: &SignInRequest) -> Result<Session, ApiError> {
        let session: Session = self
            .client
            .send_json(Method::POST, "/auth/sign-in", input)
            .await?;
        self.client.session().set(session.clone());
        Ok(session)
    }

    pub async fn sign_up(&self, input: &SignUpRequest) -> Result<User, ApiError> {
        self.client
            .send_json(Method::POST, "/auth/sign-up", input)
            .await
    }

    pub async fn verify_email(&self, token: &str) -> Result<(), ApiError> {
        let body = TokenBody {
            token: token.to_string(),
        };
        self.client
            .send_unit(Method::POST, "/auth/verify-email", Some(&body))
            .await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        let body = EmailBody {
            email: email.to_string(),
        };
        self.client
            .send_unit(Method::POST, "/auth/password-reset", Some(&body))
            .await
    }

    pub async fn reset_password(&self, input: &ResetPasswordRequest) -> Result<(), ApiError> {
        self.client
            .send_unit(Method::POST, "/auth/password-reset/confirm", Some(input))
            .await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.client.get_json("/auth/me", &QueryParams::new()).await
    }

    /// Best effort on the wire; the local session is cleared regardless.
    pub async fn sign_out(&self) -> Result<(), ApiError> {
        let result = self
            .client
            .send_unit::<()>(Method::POST, "/auth/sign-out", None)
            .await;
        self.client.session().clear();
        result
    }
}
