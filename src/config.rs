//! Configuration for braindump.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (BRAINDUMP_HOME, OPENAI_API_KEY,
//!    SUPABASE_URL, SUPABASE_ANON_KEY, ...)
//! 2. Config file (.braindump/config.yaml)
//! 3. Defaults (~/.braindump)
//!
//! Config file discovery:
//! - Searches current directory and parents for .braindump/config.yaml
//! - A relative `paths.home` is resolved against the config file's parent

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub openai: Option<OpenAiConfig>,
    #[serde(default)]
    pub supabase: Option<SupabaseConfig>,
    #[serde(default)]
    pub recording: Option<RecordingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to the config file)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiConfig {
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub transcription_model: Option<String>,
    pub tasks_model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub functions_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordingConfig {
    pub limit_secs: Option<u32>,
    pub quick_limit_secs: Option<u32>,
}

/// Resolved configuration with absolute paths and filled-in defaults
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to braindump home (state directory)
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub openai: OpenAiSettings,
    pub supabase: SupabaseSettings,
    pub recording: RecordingSettings,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_base: String,
    /// Empty when neither env nor config provides one; validated at the
    /// point a provider client is actually constructed
    pub api_key: String,
    pub transcription_model: String,
    pub tasks_model: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            transcription_model: "whisper-1".to_string(),
            tasks_model: "gpt-3.5-turbo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
    pub functions_url: String,
}

#[derive(Debug, Clone)]
pub struct RecordingSettings {
    /// Recording ceiling for the primary flow (seconds)
    pub limit_secs: u32,
    /// Ceiling for the quick flow (`record --quick`)
    pub quick_limit_secs: u32,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            limit_secs: 120,
            quick_limit_secs: 10,
        }
    }
}

impl ResolvedConfig {
    /// Directory holding the persisted collections
    pub fn store_dir(&self) -> PathBuf {
        self.home.join("store")
    }

    /// Directory holding finalized recordings
    pub fn recordings_dir(&self) -> PathBuf {
        self.home.join("recordings")
    }
}

/// Derive the edge-functions base from the project url when the config
/// does not name one (`https://x.supabase.co` → `https://x.functions.supabase.co`)
fn derive_functions_url(url: &str) -> String {
    if let Some(host) = url.strip_suffix(".supabase.co") {
        return format!("{}.functions.supabase.co", host);
    }
    format!("{}/functions/v1", url.trim_end_matches('/'))
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".braindump").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// First non-empty of: env var, config value, default
fn pick(env_var: &str, file_value: Option<&String>, default: &str) -> String {
    if let Ok(v) = std::env::var(env_var) {
        if !v.is_empty() {
            return v;
        }
    }
    file_value
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".braindump");

    let config_file = find_config_file();
    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    // Resolve home: env > config file (relative to .braindump/) > default
    let home = if let Ok(env_home) = std::env::var("BRAINDUMP_HOME") {
        PathBuf::from(env_home)
    } else if let Some(home_path) = file.as_ref().and_then(|f| f.paths.home.as_ref()) {
        let base = config_file
            .as_ref()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));
        resolve_path(base, home_path)
    } else {
        default_home
    };

    let openai_file = file.as_ref().and_then(|f| f.openai.clone()).unwrap_or_default();
    let openai_defaults = OpenAiSettings::default();
    let openai = OpenAiSettings {
        api_base: pick(
            "OPENAI_API_BASE",
            openai_file.api_base.as_ref(),
            &openai_defaults.api_base,
        ),
        api_key: pick("OPENAI_API_KEY", openai_file.api_key.as_ref(), ""),
        transcription_model: openai_file
            .transcription_model
            .unwrap_or(openai_defaults.transcription_model),
        tasks_model: openai_file.tasks_model.unwrap_or(openai_defaults.tasks_model),
    };

    let supabase_file = file
        .as_ref()
        .and_then(|f| f.supabase.clone())
        .unwrap_or_default();
    let url = pick("SUPABASE_URL", supabase_file.url.as_ref(), "");
    let functions_default = if url.is_empty() {
        String::new()
    } else {
        derive_functions_url(&url)
    };
    let supabase = SupabaseSettings {
        functions_url: pick(
            "SUPABASE_FUNCTIONS_URL",
            supabase_file.functions_url.as_ref(),
            &functions_default,
        ),
        anon_key: pick("SUPABASE_ANON_KEY", supabase_file.anon_key.as_ref(), ""),
        url,
    };

    let recording_file = file
        .as_ref()
        .and_then(|f| f.recording.clone())
        .unwrap_or_default();
    let recording_defaults = RecordingSettings::default();
    let recording = RecordingSettings {
        limit_secs: recording_file.limit_secs.unwrap_or(recording_defaults.limit_secs),
        quick_limit_secs: recording_file
            .quick_limit_secs
            .unwrap_or(recording_defaults.quick_limit_secs),
    };

    Ok(ResolvedConfig {
        home,
        config_file,
        openai,
        supabase,
        recording,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

// ============================================================================
// Convenience functions
// ============================================================================

/// Get the braindump home directory (state)
pub fn braindump_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the store directory ($BRAINDUMP_HOME/store)
pub fn store_dir() -> Result<PathBuf> {
    Ok(config()?.store_dir())
}

/// Get the recordings directory ($BRAINDUMP_HOME/recordings)
pub fn recordings_dir() -> Result<PathBuf> {
    Ok(config()?.recordings_dir())
}
