//! BlueLink vendor API client.
//!
//! Thin async wrapper around the vendor's REST endpoints: token login,
//! device listing, and the state-attribute update that carries the weekly
//! program. The service speaks JSON and expects the mobile app's
//! User-Agent.

use std::time::Duration;

use reqwest::{header, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::api::{AuthenticationKey, Device, LoginDetails, StateData};

const DEFAULT_BASE_URL: &str = "https://sd2.bluelinksmartconnect.com/api/v1/braeburn/";
const USER_AGENT: &str = "Braeburn/13 CFNetwork/1406.0.4 Darwin/22.4.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure of a vendor API call.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request failed with status {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("not logged in")]
    NotAuthenticated,
}

/// Client for the vendor REST API. Call [`VendorClient::login`] once; the
/// returned token authorizes every later request.
pub struct VendorClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl VendorClient {
    /// Client against the production service.
    pub fn new() -> Result<Self, ClientError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against an arbitrary endpoint (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(VendorClient {
            base_url,
            http,
            token: None,
        })
    }

    /// Exchange credentials for an API token and retain it.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        let details = LoginDetails {
            username: username.to_string(),
            password: password.to_string(),
        };
        let auth: AuthenticationKey = self.post("rest-auth/login/", &details, false).await?;
        self.token = Some(format!("Token {}", auth.key));
        debug!("logged in to vendor API");
        Ok(())
    }

    /// List the thermostats registered to the account.
    pub async fn devices(&self) -> Result<Vec<Device>, ClientError> {
        self.get("devices/").await
    }

    /// Upload new state attributes (the weekly program) to a device.
    pub async fn set_device_attributes(
        &self,
        uuid: &str,
        state: &StateData,
    ) -> Result<Device, ClientError> {
        self.post(&format!("manage/{uuid}/setstateattr/"), state, true)
            .await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(header::ACCEPT, "application/json");
        Self::response(self.authorize(request)?.send().await?).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        authorized: bool,
    ) -> Result<T, ClientError> {
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header(header::ACCEPT, "application/json")
            .json(body);
        if authorized {
            request = self.authorize(request)?;
        }
        Self::response(request.send().await?).await
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_ref().ok_or(ClientError::NotAuthenticated)?;
        Ok(request.header(header::AUTHORIZATION, token))
    }

    async fn response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }
        Ok(response.json().await?)
    }
}
