/// Device configuration
use crate::error::{ConfigError, ConfigResult};
use audiohal_core::StreamConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of the environment variables that override file settings,
/// e.g. `AUDIOHAL__OUTPUT__SAMPLE_RATE=44100`
pub const ENV_PREFIX: &str = "AUDIOHAL";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Driver module name, used in logs and dumps
    #[serde(default = "default_module")]
    pub module: String,

    /// Stream config for `open_default_output_stream`
    #[serde(default = "StreamConfig::output_default")]
    pub output: StreamConfig,

    /// Stream config for `open_default_input_stream`
    #[serde(default = "StreamConfig::input_default")]
    pub input: StreamConfig,

    /// Log every dispatched completion event
    #[serde(default)]
    pub trace_callbacks: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
            output: StreamConfig::output_default(),
            input: StreamConfig::input_default(),
            trace_callbacks: false,
        }
    }
}

impl DeviceConfig {
    /// Load configuration from an optional TOML file and the environment
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        Self::load_from(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(path: Option<&Path>, env: config::Environment) -> ConfigResult<Self> {
        // Defaults go in as a source so partial tables still deserialize
        let mut settings =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        // Missing file is fine, defaults apply
        if let Some(path) = path.filter(|p| p.exists()) {
            settings = settings
                .add_source(config::File::from(path).format(config::FileFormat::Toml));
        }

        settings = settings.add_source(env.separator("__").try_parsing(true));

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.module.trim().is_empty() {
            return Err(ConfigError::invalid("module name is empty"));
        }

        for (name, stream) in [("output", &self.output), ("input", &self.input)] {
            if stream.sample_rate == 0 {
                return Err(ConfigError::invalid(format!("{name}.sample_rate is 0")));
            }
            if stream.channel_mask.0 == 0 {
                return Err(ConfigError::invalid(format!("{name}.channel_mask is empty")));
            }
        }

        Ok(())
    }
}

fn default_module() -> String {
    "primary".to_string()
}
