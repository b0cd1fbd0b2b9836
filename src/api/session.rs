use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("login failed: response carried no access token")]
    LoginRejected,
    #[error("connection error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to load {path}: HTTP {status}")]
    Load { path: String, status: StatusCode },
    #[error("failed to save {path}: HTTP {status}")]
    Save { path: String, status: StatusCode },
    #[error("not logged in")]
    NoToken,
}

#[derive(Serialize)]
struct Credentials<'a> {
    project_name: &'a str,
    password: &'a str,
}

/// One authenticated connection to the backend. Constructed at startup,
/// carries the bearer token from login until logout.
pub struct Session {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl Session {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    /// POST /login. Success is keyed off the presence of `access_token`
    /// in the response body, not the HTTP status.
    pub async fn login(&mut self, project: &str, password: &str) -> Result<(), ApiError> {
        let url = format!("{}/login", self.base_url);
        debug!("POST /login project={project}");
        let response = self
            .client
            .post(&url)
            .json(&Credentials {
                project_name: project,
                password,
            })
            .send()
            .await?;
        debug!("status {}", response.status());

        let body: Value = response.json().await.unwrap_or(Value::Null);
        match body.get("access_token").and_then(Value::as_str) {
            Some(token) => {
                self.token = Some(token.to_string());
                Ok(())
            }
            None => Err(ApiError::LoginRejected),
        }
    }

    /// POST /projects. `Ok(true)` on a 2xx status, `Ok(false)` on any
    /// other status; transport failures are `Err(Network)`.
    pub async fn register(&self, project: &str, password: &str) -> Result<bool, ApiError> {
        let url = format!("{}/projects", self.base_url);
        debug!("POST /projects project={project}");
        let response = self
            .client
            .post(&url)
            .json(&Credentials {
                project_name: project,
                password,
            })
            .send()
            .await?;
        debug!("status {}", response.status());
        Ok(response.status().is_success())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::NoToken)?;
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET /{path}");
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let status = response.status();
        debug!("status {status}");
        if !status.is_success() {
            return Err(ApiError::Load {
                path: path.to_string(),
                status,
            });
        }
        Ok(response.json().await?)
    }

    pub async fn put(&self, path: &str, payload: &Value) -> Result<(), ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::NoToken)?;
        let url = format!("{}/{}", self.base_url, path);
        debug!("PUT /{path}");
        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        debug!("status {status}");
        if !status.is_success() {
            return Err(ApiError::Save {
                path: path.to_string(),
                status,
            });
        }
        Ok(())
    }
}
