use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_FLASH_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_PRO_MODEL: &str = "gemini-3-pro-image-preview";

/// Environment variables consulted for the API key, in priority order.
pub const API_KEY_VARS: [&str; 3] = ["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub flash_model: String,
    pub pro_model: String,
    pub require_broker_for_pro: bool,
    pub output_dir: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        StudioConfig {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            flash_model: DEFAULT_FLASH_MODEL.to_string(),
            pro_model: DEFAULT_PRO_MODEL.to_string(),
            require_broker_for_pro: false,
            output_dir: PathBuf::from("."),
        }
    }
}

impl StudioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = API_KEY_VARS.iter().find_map(|name| non_empty_env(name));
        let api_base = non_empty_env("GEMINI_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);
        let flash_model = non_empty_env("GENZ_FLASH_MODEL").unwrap_or(defaults.flash_model);
        let pro_model = non_empty_env("GENZ_PRO_MODEL").unwrap_or(defaults.pro_model);
        let require_broker_for_pro = env::var("GENZ_REQUIRE_BROKER")
            .ok()
            .map_or(false, |val| val.trim().eq_ignore_ascii_case("true"));
        let output_dir = non_empty_env("GENZ_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        StudioConfig {
            api_key,
            api_base,
            flash_model,
            pro_model,
            require_broker_for_pro,
            output_dir,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, flash: impl Into<String>, pro: impl Into<String>) -> Self {
        self.flash_model = flash.into();
        self.pro_model = pro.into();
        self
    }

    pub fn with_broker_required(mut self, required: bool) -> Self {
        self.require_broker_for_pro = required;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

pub(crate) fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
