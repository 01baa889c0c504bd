use std::io;
use std::path::Path;

use common::release::ReleaseMeta;
use derive_more::{Display, Error, From};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::AuthenticationConfig;

/// Response header carrying the session token after a successful login.
const USER_TOKEN_HEADER: &str = "x-user-token";

/// Update server API errors.
#[derive(Debug, Display, From, Error)]
pub(crate) enum ApiError {
    /// HTTP client error.
    Http(reqwest::Error),

    /// IO-related error.
    Io(io::Error),

    /// Requested resource does not exist on the server (HTTP 404).
    #[display(fmt = "resource was not found on the update server")]
    NotFound,

    /// Any other non-success response.
    #[display(fmt = "update server responded with {}: {}", status, body)]
    Status {
        /// HTTP status code of the response.
        status: u16,

        /// Response body, if it could be read.
        body: String,
    },

    /// Login response did not carry a session token.
    #[display(fmt = "update server response did not carry a session token")]
    MissingToken,
}

/// JSON request body wrapping the serialized release manifest.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedDataRequest<'a> {
    /// The manifest, pre-serialized to a JSON string.
    signed_data: &'a str,
}

/// JSON request body used to open a session.
#[derive(Serialize)]
struct LoginRequest<'a> {
    /// Account name.
    login: &'a str,

    /// Account password.
    password: &'a str,
}

/// JSON request body used to create the app record.
#[derive(Serialize)]
struct CreateAppRequest<'a> {
    /// Unique machine-readable app code.
    code: &'a str,

    /// Human-readable app name.
    name: &'a str,
}

/// JSON request body used to create an update channel.
#[derive(Serialize)]
struct CreateChannelRequest<'a> {
    /// Platform the channel belongs to.
    platform: &'a str,

    /// Channel key.
    code: &'a str,

    /// Human-readable channel name.
    name: &'a str,
}

/// JSON response body returned by record creation requests.
#[derive(Deserialize)]
pub(crate) struct CreatedRecord {
    /// Server-assigned record identifier.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Authenticated client for the update server API.
///
/// Carries the server address and session token explicitly, so every
/// caller that talks to the server holds exactly one of these instead of
/// sharing process-wide transport state.
pub(crate) struct ApiClient {
    /// Underlying HTTP client.
    http: reqwest::Client,

    /// Server API address without a trailing slash.
    base_url: String,

    /// Bearer session token.
    token: String,
}

impl ApiClient {
    /// Creates a client for the given server address and session token.
    pub fn new(server_path: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: server_path.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
        }
    }

    /// Creates a client from the stored authentication config.
    pub fn from_auth(auth: &AuthenticationConfig) -> Self {
        Self::new(auth.server_path(), auth.token())
    }

    /// Joins an endpoint path onto the server address.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetches the latest published release of a channel.
    ///
    /// Returns [`ApiError::NotFound`] when the channel has no releases yet.
    pub async fn latest_release(&self, channel_id: &str) -> Result<ReleaseMeta, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/deploy/{channel_id}/meta/latest")))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Submits the release manifest for a server-side diff.
    ///
    /// The returned `filesMap` is the subset of files the server wants
    /// uploaded, mapping each source path to the name it should be stored
    /// under inside the update archive.
    pub async fn check_update(
        &self,
        channel_id: &str,
        signed_data: &str,
    ) -> Result<ReleaseMeta, ApiError> {
        let response = self
            .http
            .post(self.url(&format!("/deploy/{channel_id}?check=1")))
            .bearer_auth(&self.token)
            .json(&SignedDataRequest { signed_data })
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Publishes a release: the manifest, plus the update archive when one
    /// was built.
    pub async fn publish_release(
        &self,
        channel_id: &str,
        signed_data: &str,
        archive: Option<&Path>,
    ) -> Result<(), ApiError> {
        let mut form = Form::new().text("signedData", signed_data.to_owned());

        if let Some(path) = archive {
            let contents = tokio::fs::read(path).await?;
            form = form.part(
                "update",
                Part::bytes(contents)
                    .file_name("update.zip")
                    .mime_str("application/zip")?,
            );
        }

        let response = self
            .http
            .post(self.url(&format!("/deploy/{channel_id}")))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        check_status(response).await?;

        Ok(())
    }

    /// Creates the app record on the server.
    pub async fn create_app(&self, code: &str, name: &str) -> Result<CreatedRecord, ApiError> {
        let response = self
            .http
            .post(self.url("/app"))
            .bearer_auth(&self.token)
            .json(&CreateAppRequest { code, name })
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Creates an update channel record on the server.
    pub async fn create_channel(
        &self,
        app_id: &str,
        platform: &str,
        code: &str,
        name: &str,
    ) -> Result<CreatedRecord, ApiError> {
        let response = self
            .http
            .post(self.url(&format!("/app/{app_id}/channel")))
            .bearer_auth(&self.token)
            .json(&CreateChannelRequest {
                platform,
                code,
                name,
            })
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Closes the current session on the server.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/auth/logout"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        check_status(response).await?;

        Ok(())
    }
}

/// Opens a session and returns its token.
///
/// Stands alone because no token exists yet at login time.
pub(crate) async fn login(
    server_path: &str,
    username: &str,
    password: &str,
) -> Result<String, ApiError> {
    let response = reqwest::Client::new()
        .post(format!(
            "{}/auth/login",
            server_path.trim_end_matches('/')
        ))
        .json(&LoginRequest {
            login: username,
            password,
        })
        .send()
        .await?;

    let response = check_status(response).await?;

    let token = response
        .headers()
        .get(USER_TOKEN_HEADER)
        .ok_or(ApiError::MissingToken)?
        .to_str()
        .map_err(|_| ApiError::MissingToken)?
        .to_owned();

    Ok(token)
}

/// Maps non-success responses to [`ApiError`] variants, keeping 404
/// distinguishable since the deploy protocol treats it as "no release yet".
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }

    Err(ApiError::Status {
        status: status.as_u16(),
        body: response.text().await.unwrap_or_default(),
    })
}
