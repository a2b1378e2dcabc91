//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::models::SelectionPolicy;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Workspace, output and log locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// Object storage gateway pool and credentials.
    #[serde(default)]
    pub storage: StorageSettings,

    /// External tool locations and invocation policy.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for the workspace and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Local directory that receives the fetched clip and all artifacts.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: String,

    /// Name of the video produced by the video tool inside the workspace.
    #[serde(default = "default_output_filename")]
    pub output_filename: String,

    /// Folder for job logs and state manifests.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_workspace_dir() -> String {
    "/tmp_data_1".to_string()
}

fn default_output_filename() -> String {
    "dv_default.mp4".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            workspace_dir: default_workspace_dir(),
            output_filename: default_output_filename(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Destination bucket for published videos.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Access key for the gateway pool.
    #[serde(default)]
    pub access_key_id: String,

    /// Secret key for the gateway pool.
    #[serde(default)]
    pub secret_access_key: String,

    /// Interchangeable gateway endpoints.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// How one endpoint is picked from the pool.
    #[serde(default)]
    pub selection: SelectionPolicy,

    /// Connect timeout used by health-aware selection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Signing region (gateways ignore it, the signer needs one).
    #[serde(default = "default_region")]
    pub region: String,

    /// Allow plaintext HTTP endpoints.
    #[serde(default = "default_true")]
    pub allow_http: bool,

    /// Browser-facing base URL printed next to the uploaded key.
    #[serde(default = "default_public_url_base")]
    pub public_url_base: String,

    /// Leading component of every published key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Upload attempts before giving up (1 = no retry).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between upload attempts.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_bucket() -> String {
    "datahub".to_string()
}

/// Gateway nodes 10.199.199.83 through .96.
fn default_endpoints() -> Vec<String> {
    (83..=96)
        .map(|node| format!("http://10.199.199.{}:8082/", node))
        .collect()
}

fn default_connect_timeout_ms() -> u64 {
    500
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_public_url_base() -> String {
    "http://10.199.2.100:8082/TenantAI:datahub/".to_string()
}

fn default_key_prefix() -> String {
    "parsed_data".to_string()
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            endpoints: default_endpoints(),
            selection: SelectionPolicy::default(),
            connect_timeout_ms: default_connect_timeout_ms(),
            region: default_region(),
            allow_http: true,
            public_url_base: default_public_url_base(),
            key_prefix: default_key_prefix(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// External tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Recursive copy tool used by the fetch stage.
    #[serde(default = "default_fetch_program")]
    pub fetch_program: String,

    /// Config file handed to the fetch tool with `-c`.
    #[serde(default = "default_fetch_config")]
    pub fetch_config: String,

    /// Abort the pipeline when the fetch tool fails.
    #[serde(default)]
    pub fail_on_fetch_error: bool,

    /// Simulation-world renderer binary.
    #[serde(default = "default_render_binary")]
    pub render_binary: String,

    /// Vehicle parameter file passed to the renderer.
    #[serde(default = "default_vehicle_config")]
    pub vehicle_config: String,

    /// Program that turns rendered frames into a video.
    #[serde(default = "default_video_program")]
    pub video_program: String,

    /// Arguments placed before the workspace path.
    #[serde(default = "default_video_args")]
    pub video_args: Vec<String>,

    /// Working directory for the video tool (inherited when unset).
    #[serde(default)]
    pub video_working_dir: Option<String>,

    /// X display forced for the video tool.
    #[serde(default = "default_display")]
    pub display: String,
}

fn default_fetch_program() -> String {
    "s3cmd".to_string()
}

fn default_fetch_config() -> String {
    "/home/sti/.s3cfg".to_string()
}

fn default_render_binary() -> String {
    "/app/clip_poster/modules/simulation_world/build/aloha".to_string()
}

fn default_vehicle_config() -> String {
    "/app/clip_poster/modules/config/vehicle_param.pb.txt".to_string()
}

fn default_video_program() -> String {
    "node".to_string()
}

fn default_video_args() -> Vec<String> {
    vec!["index.js".to_string()]
}

fn default_display() -> String {
    ":99".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            fetch_program: default_fetch_program(),
            fetch_config: default_fetch_config(),
            fail_on_fetch_error: false,
            render_binary: default_render_binary(),
            vehicle_config: default_vehicle_config(),
            video_program: default_video_program(),
            video_args: default_video_args(),
            video_working_dir: None,
            display: default_display(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Keep tool output out of the log unless a tool fails.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines shown after a failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Prefix log lines with a wall-clock time.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    25
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_timestamps: true,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Storage,
    Tools,
    Logging,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Paths,
        ConfigSection::Storage,
        ConfigSection::Tools,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Storage => "storage",
            ConfigSection::Tools => "tools",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the table in generated files.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Workspace and log locations",
            ConfigSection::Storage => "Object storage gateway pool",
            ConfigSection::Tools => "External tools",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
