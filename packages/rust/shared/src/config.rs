//! Application configuration for Transdoc.
//!
//! Service config lives at `~/.transdoc/transdoc.toml`.
//! CLI flags override config file values, which override defaults.
//! Access tokens are never stored in the file, only the env var names.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransdocError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "transdoc.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".transdoc";

// ---------------------------------------------------------------------------
// Config structs (matching transdoc.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Gemini on Vertex AI.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Google Docs / Drive target.
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Source page title lookup.
    #[serde(default)]
    pub title: TitleConfig,

    /// Markers recognized in model output.
    #[serde(default)]
    pub lexicon: LexiconConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Google Cloud project hosting the model.
    #[serde(default)]
    pub project_id: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Language the summary is translated into.
    #[serde(default = "default_target_language")]
    pub target_language: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Name of the env var holding the OAuth access token.
    ///
    /// The token is read once at startup and never refreshed. Short-lived
    /// OAuth tokens (about one hour) need a restart to rotate.
    #[serde(default = "default_token_env")]
    pub access_token_env: String,

    /// Override for the regional Vertex AI endpoint (tests, proxies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            region: default_region(),
            model: default_model(),
            target_language: default_target_language(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            access_token_env: default_token_env(),
            endpoint: None,
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl GenerationConfig {
    /// Base URL of the Vertex AI API for the configured region.
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.region),
        }
    }
}

fn default_region() -> String {
    "us-central1".into()
}
fn default_model() -> String {
    "gemini-2.0-flash-lite-001".into()
}
fn default_target_language() -> String {
    "Japanese".into()
}
fn default_temperature() -> f32 {
    0.5
}
fn default_max_output_tokens() -> u32 {
    2048
}
fn default_top_k() -> u32 {
    40
}
fn default_top_p() -> f32 {
    0.9
}
fn default_token_env() -> String {
    "GOOGLE_OAUTH_ACCESS_TOKEN".into()
}
fn default_generation_timeout() -> u64 {
    120
}

/// `[documents]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Identity every created document is shared with.
    #[serde(default)]
    pub share_with: String,

    /// Drive permission role: reader, commenter or writer.
    #[serde(default = "default_share_role")]
    pub share_role: String,

    /// Maximum operations per mutation request. Unset sends one batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Name of the env var holding the OAuth access token.
    ///
    /// The token is read once at startup and never refreshed. Short-lived
    /// OAuth tokens (about one hour) need a restart to rotate.
    #[serde(default = "default_token_env")]
    pub access_token_env: String,

    #[serde(default = "default_docs_base_url")]
    pub docs_base_url: String,

    #[serde(default = "default_drive_base_url")]
    pub drive_base_url: String,

    #[serde(default = "default_documents_timeout")]
    pub timeout_secs: u64,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            share_with: String::new(),
            share_role: default_share_role(),
            batch_size: None,
            access_token_env: default_token_env(),
            docs_base_url: default_docs_base_url(),
            drive_base_url: default_drive_base_url(),
            timeout_secs: default_documents_timeout(),
        }
    }
}

fn default_share_role() -> String {
    "reader".into()
}
fn default_docs_base_url() -> String {
    "https://docs.googleapis.com".into()
}
fn default_drive_base_url() -> String {
    "https://www.googleapis.com".into()
}
fn default_documents_timeout() -> u64 {
    30
}

/// `[title]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleConfig {
    /// Whether to fetch the source page to read its `<title>`.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_title_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_title_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_title_timeout() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0 Safari/537.36"
        .into()
}

/// `[lexicon]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconConfig {
    /// Line prefixes that open and close a code fence.
    #[serde(default = "default_fence_markers")]
    pub fence_markers: Vec<String>,

    /// Bullet glyphs accepted in addition to `-`, `*` and `1.`.
    #[serde(default = "default_bullet_glyphs")]
    pub bullet_glyphs: Vec<String>,

    /// Headings that introduce the keyword section (case-insensitive).
    #[serde(default = "default_keyword_headings")]
    pub keyword_headings: Vec<String>,

    /// Header line emitted above the keyword terms in the document.
    #[serde(default = "default_keywords_label")]
    pub keywords_label: String,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            fence_markers: default_fence_markers(),
            bullet_glyphs: default_bullet_glyphs(),
            keyword_headings: default_keyword_headings(),
            keywords_label: default_keywords_label(),
        }
    }
}

fn default_fence_markers() -> Vec<String> {
    vec!["```".into(), "~~~".into()]
}
fn default_bullet_glyphs() -> Vec<String> {
    vec!["・".into(), "•".into()]
}
fn default_keyword_headings() -> Vec<String> {
    [
        "keywords",
        "key words",
        "related keywords",
        "tags",
        "キーワード",
        "関連キーワード",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_keywords_label() -> String {
    "Keywords".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.transdoc/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| TransdocError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.transdoc/transdoc.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TransdocError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TransdocError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TransdocError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TransdocError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TransdocError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read an access token from the named env var.
///
/// Called once when the service starts; the returned token is held for the
/// life of the process.
pub fn resolve_token(var_name: &str) -> Result<SecretString> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(SecretString::from(val)),
        _ => Err(TransdocError::config(format!(
            "access token not found. Set the {var_name} environment variable \
             (e.g. `gcloud auth print-access-token`)."
        ))),
    }
}

/// Check everything the service needs before it starts taking requests.
pub fn validate_service_config(config: &AppConfig) -> Result<()> {
    if config.generation.project_id.trim().is_empty() {
        return Err(TransdocError::config(
            "generation.project_id is not set in the config file",
        ));
    }
    if config.documents.share_with.trim().is_empty() {
        return Err(TransdocError::config(
            "documents.share_with is not set in the config file",
        ));
    }
    if !matches!(
        config.documents.share_role.as_str(),
        "reader" | "commenter" | "writer"
    ) {
        return Err(TransdocError::config(format!(
            "documents.share_role must be reader, commenter or writer (got '{}')",
            config.documents.share_role
        )));
    }
    if config.documents.batch_size == Some(0) {
        return Err(TransdocError::config("documents.batch_size must be at least 1"));
    }
    if config.lexicon.fence_markers.iter().any(|m| m.trim().is_empty()) {
        return Err(TransdocError::config("lexicon.fence_markers contains an empty marker"));
    }
    resolve_token(&config.generation.access_token_env)?;
    resolve_token(&config.documents.access_token_env)?;
    Ok(())
}
