use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;

use super::{ApiClient, ApiError};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub email: String,
    pub school_name: String,
}

/// Client for `/waitlist`; join is the only operation the app exposes.
#[derive(Debug, Clone)]
pub struct WaitlistApi {
    client: Arc<ApiClient>,
}

impl WaitlistApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn join(&self, entry: &WaitlistEntry) -> Result<(), ApiError> {
        self.client
            .send_unit(Method::POST, "/waitlist", Some(entry))
            .await
    }
}
