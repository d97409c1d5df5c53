// src/config.rs
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::services::upstream::BackendProfile;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 8000;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:8000";
pub const DEFAULT_STATIC_DIR: &str = "static";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant specialized in guiding school personnel through discipline incident procedures. 

Your role is to:
1. Help users report and document discipline incidents properly
2. Guide them through required forms and procedures
3. Ensure proper timelines are followed
4. Identify who needs to be notified
5. Provide step-by-step guidance

Key areas you help with:
- Incident documentation and reporting
- Required forms (incident reports, suspension forms, etc.)
- Communication requirements (parents, administrators, district office)
- Timeline requirements for different types of incidents
- Follow-up procedures and monitoring

Ask clarifying questions to understand:
- What type of incident occurred
- Who was involved (students, staff)
- Severity level
- When and where it happened
- Any immediate actions already taken

Be thorough, professional, and ensure compliance with school policies. Always prioritize student safety and due process.

If you need specific policy details that aren't provided, guide the user to check their school's specific handbook or contact their administrator.";

/// Immutable runtime settings, resolved once at startup.
#[derive(Clone)]
pub struct Config {
    pub profile: BackendProfile,
    pub backend_base_url: String,
    pub model_name: String,
    pub port: u16,
    pub credential: Option<String>,
    pub system_prompt: String,
    pub max_prompt_chars: usize,
    pub allowed_origins: Vec<String>,
    pub debug: bool,
    pub upstream_timeout: Duration,
    pub static_dir: String,
}

impl Config {
    /// Resolve from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let profile = match get("BACKEND_PROFILE") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "unknown BACKEND_PROFILE, using local");
                BackendProfile::LocalGenerate
            }),
            None => BackendProfile::LocalGenerate,
        };

        let backend_base_url = get("BACKEND_URL")
            .unwrap_or_else(|| profile.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let upstream_timeout = get("UPSTREAM_TIMEOUT_SECS")
            .and_then(|raw| parse_or_warn::<u64>("UPSTREAM_TIMEOUT_SECS", &raw))
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(|| profile.default_timeout());

        let allowed_origins = get("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Self {
            model_name: get("MODEL_NAME").unwrap_or_else(|| profile.default_model().to_string()),
            port: get("PORT")
                .and_then(|raw| parse_or_warn("PORT", &raw))
                .unwrap_or(DEFAULT_PORT),
            credential: get("API_KEY").or_else(|| get("HF_API_KEY")),
            system_prompt: get("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_prompt_chars: get("MAX_PROMPT_CHARS")
                .and_then(|raw| parse_or_warn("MAX_PROMPT_CHARS", &raw))
                .unwrap_or(DEFAULT_MAX_PROMPT_CHARS),
            debug: get("DEBUG_DIAGNOSTICS").is_some_and(|v| is_truthy(&v)),
            static_dir: get("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            profile,
            backend_base_url,
            allowed_origins,
            upstream_timeout,
        }
    }

    /// Only the hosted profile needs a bearer token.
    pub fn credential_required(&self) -> bool {
        self.profile == BackendProfile::HostedInference
    }

    pub fn credential_missing(&self) -> bool {
        self.credential_required() && self.credential.is_none()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("profile", &self.profile)
            .field("backend_base_url", &self.backend_base_url)
            .field("model_name", &self.model_name)
            .field("port", &self.port)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("max_prompt_chars", &self.max_prompt_chars)
            .field("allowed_origins", &self.allowed_origins)
            .field("debug", &self.debug)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

fn parse_or_warn<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting, using default");
            None
        }
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
