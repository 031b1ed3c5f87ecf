use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use waypoint_ai::{OpenAiAuthScheme, OpenAiConfig};
use waypoint_gateway::{ChatServerConfig, DEFAULT_APP_NAME};
use waypoint_specialist::SpecialistConfig;
use waypoint_supervisor::{ActionRegistry, SupervisorConfig, DEFAULT_MODEL};

const MODEL_REQUEST_TIMEOUT_MS: u64 = 120_000;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum CliApiAuthScheme {
    Bearer,
    ApiKeyHeader,
}

impl From<CliApiAuthScheme> for OpenAiAuthScheme {
    fn from(value: CliApiAuthScheme) -> Self {
        match value {
            CliApiAuthScheme::Bearer => OpenAiAuthScheme::Bearer,
            CliApiAuthScheme::ApiKeyHeader => OpenAiAuthScheme::ApiKeyHeader,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "waypoint",
    about = "Trip-planning supervisor that coordinates specialist agents",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long,
        env = "WAYPOINT_MODEL",
        default_value = DEFAULT_MODEL,
        global = true,
        help = "Model name sent to the reasoning endpoint"
    )]
    pub(crate) model: String,

    #[arg(
        long,
        env = "WAYPOINT_API_BASE",
        global = true,
        help = "Base URL of the OpenAI-compatible reasoning endpoint (for example https://<workspace>/serving-endpoints)"
    )]
    pub(crate) api_base: Option<String>,

    #[arg(
        long,
        env = "WAYPOINT_API_KEY",
        global = true,
        hide_env_values = true,
        help = "API key or token for the reasoning endpoint"
    )]
    pub(crate) api_key: Option<String>,

    #[arg(
        long = "api-auth-scheme",
        env = "WAYPOINT_API_AUTH_SCHEME",
        value_enum,
        default_value = "bearer",
        global = true,
        help = "How the API key is sent: Authorization bearer or api-key header"
    )]
    pub(crate) api_auth_scheme: CliApiAuthScheme,

    #[arg(
        long = "api-version",
        env = "WAYPOINT_API_VERSION",
        global = true,
        help = "Optional api-version query parameter for the reasoning endpoint"
    )]
    pub(crate) api_version: Option<String>,

    #[arg(
        long = "api-organization",
        env = "WAYPOINT_API_ORGANIZATION",
        global = true,
        help = "Optional organization header for the reasoning endpoint"
    )]
    pub(crate) api_organization: Option<String>,

    #[arg(
        long,
        env = "WAYPOINT_MAX_TURNS",
        default_value_t = waypoint_supervisor::DEFAULT_MAX_TURNS,
        value_parser = parse_positive_usize,
        global = true,
        help = "Maximum reasoning turns per run before giving up"
    )]
    pub(crate) max_turns: usize,

    #[arg(
        long = "specialist-timeout-ms",
        env = "WAYPOINT_SPECIALIST_TIMEOUT_MS",
        default_value_t = 120_000,
        value_parser = parse_positive_u64,
        global = true,
        help = "Bounded wait for each specialist call in milliseconds"
    )]
    pub(crate) specialist_timeout_ms: u64,

    #[arg(
        long = "specialist-auth-token",
        env = "WAYPOINT_SPECIALIST_AUTH_TOKEN",
        global = true,
        hide_env_values = true,
        help = "Optional bearer token sent to every specialist"
    )]
    pub(crate) specialist_auth_token: Option<String>,

    #[arg(
        long = "weather-url",
        env = "AGENT_WEATHER_URL",
        default_value = "http://localhost:8003",
        global = true
    )]
    pub(crate) weather_url: String,

    #[arg(
        long = "packing-url",
        env = "AGENT_PACKING_URL",
        default_value = "http://localhost:8004",
        global = true
    )]
    pub(crate) packing_url: String,

    #[arg(
        long = "activities-url",
        env = "AGENT_ACTIVITIES_URL",
        default_value = "http://localhost:8005",
        global = true
    )]
    pub(crate) activities_url: String,

    #[arg(
        long = "budget-url",
        env = "AGENT_BUDGET_URL",
        default_value = "http://localhost:8006",
        global = true
    )]
    pub(crate) budget_url: String,

    #[arg(
        long = "transport-url",
        env = "AGENT_TRANSPORT_URL",
        default_value = "http://localhost:8007",
        global = true
    )]
    pub(crate) transport_url: String,

    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum CliCommand {
    /// Serve the chat gateway.
    Serve {
        #[arg(
            long,
            env = "WAYPOINT_BIND",
            default_value = "0.0.0.0:8000",
            help = "Socket address for the HTTP server"
        )]
        bind: String,

        #[arg(
            long = "static-dir",
            env = "WAYPOINT_STATIC_DIR",
            help = "Directory holding index.html for GET /"
        )]
        static_dir: Option<PathBuf>,
    },
    /// Run one request and print progress events as JSON lines.
    Ask { message: String },
    /// Check every configured specialist's health endpoint.
    Probe,
}

impl Cli {
    /// Specialist endpoints in catalog order, named after their registry entries.
    pub(crate) fn specialist_configs(&self, registry: &ActionRegistry) -> Vec<SpecialistConfig> {
        [
            ("weather", &self.weather_url),
            ("packing", &self.packing_url),
            ("activities", &self.activities_url),
            ("budget", &self.budget_url),
            ("transport", &self.transport_url),
        ]
        .into_iter()
        .map(|(key, url)| SpecialistConfig {
            display_name: registry.display_name(key).to_string(),
            request_timeout_ms: self.specialist_timeout_ms,
            auth_token: self.specialist_auth_token.clone(),
            ..SpecialistConfig::new(key, url.clone())
        })
        .collect()
    }

    pub(crate) fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            model: self.model.clone(),
            max_turns: self.max_turns,
            ..SupervisorConfig::default()
        }
    }

    pub(crate) fn openai_config(&self) -> Result<OpenAiConfig, String> {
        let api_base = self
            .api_base
            .as_deref()
            .map(str::trim)
            .filter(|base| !base.is_empty())
            .ok_or_else(|| "--api-base (WAYPOINT_API_BASE) is required".to_string())?;
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| "--api-key (WAYPOINT_API_KEY) is required".to_string())?;
        Ok(OpenAiConfig {
            api_base: api_base.to_string(),
            api_key: api_key.to_string(),
            organization: non_blank(self.api_organization.as_deref()),
            request_timeout_ms: MODEL_REQUEST_TIMEOUT_MS,
            auth_scheme: self.api_auth_scheme.into(),
            api_version: non_blank(self.api_version.as_deref()),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn chat_server_config(bind: &str, static_dir: Option<PathBuf>) -> ChatServerConfig {
    ChatServerConfig {
        bind: bind.to_string(),
        static_dir,
        app_name: DEFAULT_APP_NAME.to_string(),
    }
}
