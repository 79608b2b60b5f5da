use serde::Deserialize;

/// Event service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    /// PostgreSQL connection URL. Env var: `DB_URL`.
    pub db_url: String,
    /// SMTP submission host. Empty means the mailer runs unconfigured.
    #[serde(default)]
    pub smtp_host: String,
    /// SMTP submission port (STARTTLS). Env var: `SMTP_PORT`, default 587.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username; also the From address.
    #[serde(default)]
    pub smtp_user: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_pass: String,
    /// Public base URL used in emailed download links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Reserved for the admin surface; unused by this service.
    #[serde(default)]
    pub jwt_secret: String,
    /// When true, an OTP that could not be emailed is echoed in the
    /// `/register` response. Never inferred from build mode.
    #[serde(default)]
    pub dev_mode: bool,
    /// TCP port to listen on. Env var: `APP_PORT`, default 8000.
    #[serde(default = "default_app_port")]
    pub app_port: u16,
    /// Directory for generated card documents.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
    /// Prefix of sequential team ids, e.g. `HACK` yields `HACK-001`.
    #[serde(default = "default_team_id_prefix")]
    pub team_id_prefix: String,
    /// Event policy: maximum members per team (leader included).
    #[serde(default = "default_max_team_size")]
    pub max_team_size: usize,
    /// Directory containing the DejaVu card fonts.
    #[serde(default = "default_font_dir")]
    pub font_dir: String,
    /// Institutional banner printed at the top of every card.
    #[serde(default = "default_event_banner")]
    pub event_banner: String,
    /// Event title printed on every card.
    #[serde(default = "default_event_title")]
    pub event_title: String,
}

impl EventConfig {
    /// Load the configuration from the environment.
    ///
    /// # Panics
    ///
    /// Panics if a required env var is missing or cannot be deserialized;
    /// the service refuses to start half-configured.
    pub fn from_env() -> Self {
        envy::from_env().expect("failed to load config from environment")
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_base_url() -> String {
    "http://localhost:8000".to_owned()
}

fn default_app_port() -> u16 {
    8000
}

fn default_assets_dir() -> String {
    "assets".to_owned()
}

fn default_team_id_prefix() -> String {
    "HACK".to_owned()
}

fn default_max_team_size() -> usize {
    50
}

fn default_font_dir() -> String {
    "/usr/share/fonts/truetype/dejavu".to_owned()
}

fn default_event_banner() -> String {
    "Department of Computer Science".to_owned()
}

fn default_event_title() -> String {
    "HackReg 2026".to_owned()
}
