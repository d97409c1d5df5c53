// src/services/upstream.rs
//! Client for the text-generation backend.
//!
//! Each [`BackendProfile`] has exactly one request contract:
//! - `LocalGenerate`: `POST <base>/api/generate` with `{model, prompt, stream, options}`
//! - `HostedInference`: `POST <base>/models/<model>` with `{inputs, parameters}` and a bearer token
//!
//! Calls are single attempts with a bounded timeout. There is no retry.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const TEMPERATURE: f32 = 0.3;
const TOP_P: f32 = 0.9;
const LOCAL_NUM_PREDICT: u32 = 1000;
const HOSTED_MAX_NEW_TOKENS: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendProfile {
    LocalGenerate,
    HostedInference,
}

impl BackendProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendProfile::LocalGenerate => "local-generate",
            BackendProfile::HostedInference => "hosted-inference",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            BackendProfile::LocalGenerate => "http://localhost:11434",
            BackendProfile::HostedInference => "https://api-inference.huggingface.co",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            BackendProfile::LocalGenerate => "llama3:latest",
            BackendProfile::HostedInference => "mistralai/Mistral-7B-Instruct-v0.2",
        }
    }

    /// On-box generation is slower than a hosted endpoint.
    pub fn default_timeout(&self) -> Duration {
        match self {
            BackendProfile::LocalGenerate => Duration::from_secs(60),
            BackendProfile::HostedInference => Duration::from_secs(30),
        }
    }
}

impl fmt::Display for BackendProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown backend profile: {0}")]
pub struct UnknownProfile(String);

impl FromStr for BackendProfile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "local-generate" | "ollama" => Ok(BackendProfile::LocalGenerate),
            "hosted" | "hosted-inference" | "huggingface" | "hf" => {
                Ok(BackendProfile::HostedInference)
            }
            other => Err(UnknownProfile(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("backend credential is not configured")]
    MissingCredential,
    #[error("backend credential is not a valid header value")]
    InvalidCredential,
    #[error("network error: {0}")]
    Network(String),
}

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Serialize)]
struct LocalGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: LocalOptions,
}

#[derive(Debug, Serialize)]
struct LocalOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct HostedInferenceRequest<'a> {
    inputs: &'a str,
    parameters: HostedParameters,
}

#[derive(Debug, Serialize)]
struct HostedParameters {
    temperature: f32,
    top_p: f32,
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    profile: BackendProfile,
    base_url: String,
    model: String,
    credential: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("profile", &self.profile)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            profile: config.profile,
            base_url: config.backend_base_url.trim_end_matches('/').to_string(),
            model: config.model_name.clone(),
            credential: config.credential.clone(),
            timeout: config.upstream_timeout,
        })
    }

    pub fn profile(&self) -> BackendProfile {
        self.profile
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn generate_url(&self) -> String {
        match self.profile {
            BackendProfile::LocalGenerate => format!("{}/api/generate", self.base_url),
            BackendProfile::HostedInference => self.model_url(),
        }
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }

    /// Send `prompt` with the configured profile's contract.
    pub async fn generate(&self, prompt: &str) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.generate_url();
        match self.profile {
            BackendProfile::LocalGenerate => {
                let payload = LocalGenerateRequest {
                    model: &self.model,
                    prompt,
                    stream: false,
                    options: LocalOptions {
                        temperature: TEMPERATURE,
                        top_p: TOP_P,
                        num_predict: LOCAL_NUM_PREDICT,
                    },
                };
                self.post_json(&url, &payload, HeaderMap::new(), self.timeout).await
            }
            BackendProfile::HostedInference => {
                let headers = self.auth_headers()?;
                let payload = HostedInferenceRequest {
                    inputs: prompt,
                    parameters: HostedParameters {
                        temperature: TEMPERATURE,
                        top_p: TOP_P,
                        max_new_tokens: HOSTED_MAX_NEW_TOKENS,
                        return_full_text: false,
                    },
                };
                self.post_json(&url, &payload, headers, self.timeout).await
            }
        }
    }

    /// One POST, one attempt.
    pub async fn post_json<T>(
        &self,
        url: &str,
        payload: &T,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<UpstreamResponse, UpstreamError>
    where
        T: Serialize + ?Sized,
    {
        let request = self.http.post(url).headers(headers).json(payload).timeout(timeout);
        send(request, timeout).await
    }

    /// Cheap reachability check used by `/health`.
    pub async fn probe(&self) -> Result<UpstreamResponse, UpstreamError> {
        self.get_metadata(PROBE_TIMEOUT).await
    }

    /// Model listing (local) or model metadata (hosted).
    pub async fn list_models(&self) -> Result<UpstreamResponse, UpstreamError> {
        self.get_metadata(self.timeout).await
    }

    async fn get_metadata(&self, timeout: Duration) -> Result<UpstreamResponse, UpstreamError> {
        let request = match self.profile {
            BackendProfile::LocalGenerate => self.http.get(self.tags_url()),
            BackendProfile::HostedInference => {
                self.http.get(self.model_url()).headers(self.auth_headers()?)
            }
        };
        send(request.timeout(timeout), timeout).await
    }

    fn auth_headers(&self) -> Result<HeaderMap, UpstreamError> {
        let token = self.credential.as_deref().ok_or(UpstreamError::MissingCredential)?;
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| UpstreamError::InvalidCredential)?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

async fn send(
    request: RequestBuilder,
    timeout: Duration,
) -> Result<UpstreamResponse, UpstreamError> {
    let response = request.send().await.map_err(|e| network_error(e, timeout))?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| network_error(e, timeout))?;
    Ok(UpstreamResponse { status, body })
}

fn network_error(err: reqwest::Error, timeout: Duration) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Network(format!("timed out after {}s", timeout.as_secs_f32()))
    } else {
        UpstreamError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(profile: BackendProfile, credential: Option<&str>) -> UpstreamClient {
        let mut config = Config::from_lookup(|_| None);
        config.profile = profile;
        config.backend_base_url = "http://backend:9000/".to_string();
        config.model_name = "tiny".to_string();
        config.credential = credential.map(str::to_string);
        UpstreamClient::new(&config).unwrap()
    }

    #[test]
    fn profile_parsing() {
        assert_eq!("ollama".parse::<BackendProfile>().unwrap(), BackendProfile::LocalGenerate);
        assert_eq!(" Hosted ".parse::<BackendProfile>().unwrap(), BackendProfile::HostedInference);
        assert!("openai".parse::<BackendProfile>().is_err());
    }

    #[test]
    fn endpoints_follow_profile() {
        let local = client(BackendProfile::LocalGenerate, None);
        assert_eq!(local.generate_url(), "http://backend:9000/api/generate");

        let hosted = client(BackendProfile::HostedInference, Some("k"));
        assert_eq!(hosted.generate_url(), "http://backend:9000/models/tiny");
    }

    #[test]
    fn payload_shapes() {
        let local = serde_json::to_value(LocalGenerateRequest {
            model: "tiny",
            prompt: "p",
            stream: false,
            options: LocalOptions {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                num_predict: LOCAL_NUM_PREDICT,
            },
        })
        .unwrap();
        assert_eq!(local["stream"], false);
        assert_eq!(local["options"]["num_predict"], 1000);

        let hosted = serde_json::to_value(HostedInferenceRequest {
            inputs: "p",
            parameters: HostedParameters {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                max_new_tokens: HOSTED_MAX_NEW_TOKENS,
                return_full_text: false,
            },
        })
        .unwrap();
        assert_eq!(hosted["inputs"], "p");
        assert_eq!(hosted["parameters"]["return_full_text"], false);
    }

    #[test]
    fn auth_header_is_bearer() {
        let hosted = client(BackendProfile::HostedInference, Some("hf_abc"));
        let headers = hosted.auth_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer hf_abc");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[tokio::test]
    async fn hosted_without_credential_fails_before_io() {
        let hosted = client(BackendProfile::HostedInference, None);
        let err = hosted.generate("hi").await.unwrap_err();
        assert!(matches!(err, UpstreamError::MissingCredential));
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let mut config = Config::from_lookup(|_| None);
        config.backend_base_url = "http://127.0.0.1:9".to_string();
        config.upstream_timeout = Duration::from_secs(2);
        let local = UpstreamClient::new(&config).unwrap();
        let err = local.probe().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Network(_)));
    }
}
