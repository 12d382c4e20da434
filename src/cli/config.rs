//! Operator configuration file handling
//!
//! Settings for one sign deployment: which serial device to use, where the
//! web server listens, where module files live and how to log. Module files
//! themselves (what the sign shows) are separate, see `simplesign::modules`.

use serde::{Deserialize, Serialize};
use simplesign::logging::DEFAULT_LOG_FILE;
use simplesign::runner::DEFAULT_TEXT_FILES;
use simplesign::sign::DEFAULT_BAUD_RATE;
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default web server port
pub const DEFAULT_PORT: u16 = 8000;

const DEFAULT_BIND: &str = "0.0.0.0";

/// simplesign operator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimpleSignConfig {
    #[serde(default)]
    pub sign: SignConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub modules: ModulesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial link to the sign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignConfig {
    /// Serial device; guessed when unset
    pub device: Option<PathBuf>,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Text files allocated on the sign
    #[serde(default = "default_text_files")]
    pub text_files: usize,
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Custom front page; the built-in page is used when unset
    pub frontend: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulesConfig {
    /// Directory searched for `<name>.toml` module files
    #[serde(default = "default_modules_dir")]
    pub dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file, appended to alongside stderr
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_text_files() -> usize {
    DEFAULT_TEXT_FILES
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_LOG_FILE))
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            device: None,
            baud_rate: DEFAULT_BAUD_RATE,
            text_files: DEFAULT_TEXT_FILES,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: DEFAULT_PORT,
            frontend: None,
        }
    }
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            dir: default_modules_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: default_log_file(),
        }
    }
}

impl SimpleSignConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: SimpleSignConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Load `path`, writing a commented default file first if it is missing
    pub fn load_or_create(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.exists() {
            Self::create_default(path)?;
            tracing::info!("Created default config at {}", path.display());
        }
        Self::load(path)
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(modules_dir: &Path) -> String {
        format!(
            r#"# simplesign configuration
#
# Command line flags (-d, -p, -v, --log-file) override these values.

[sign]
# Serial device the sign is attached to. When unset, the first of
# /dev/ttyS0, /dev/tty.usbserial and /dev/tty.PL2303* that exists is used.
# device = "/dev/ttyUSB0"

baud_rate = {baud_rate}

# Text files allocated on the sign (1-93); one message per file
text_files = {text_files}

[server]
bind = "{bind}"
port = {port}

# Custom front page; {{{{recent}}}}, {{{{colors}}}} and {{{{modes}}}} are filled in
# frontend = "/etc/simplesign/frontend.html"

[modules]
# Directory holding <name>.toml module files
dir = '{modules_dir}'

[logging]
# Log level: trace, debug, info, warn, error
level = "{level}"

# Log file, appended to alongside stderr
file = "{log_file}"
"#,
            baud_rate = DEFAULT_BAUD_RATE,
            text_files = DEFAULT_TEXT_FILES,
            bind = DEFAULT_BIND,
            port = DEFAULT_PORT,
            modules_dir = modules_dir.display(),
            level = DEFAULT_LOG_LEVEL,
            log_file = DEFAULT_LOG_FILE,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml(&default_modules_dir());

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// ~/.local/share/simplesign (or the platform equivalent)
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("simplesign")
}

pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

pub fn default_modules_dir() -> PathBuf {
    default_data_dir().join("modules")
}

/// Config path from `--config`, or the default
pub fn resolve_config_path(config: Option<String>) -> PathBuf {
    config.map(PathBuf::from).unwrap_or_else(default_config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SimpleSignConfig::default();

        assert_eq!(config.sign.device, None);
        assert_eq!(config.sign.baud_rate, 9600);
        assert_eq!(config.sign.text_files, 60);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, Some(PathBuf::from("simplesign.log")));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = SimpleSignConfig::default();
        config.sign.device = Some(PathBuf::from("/dev/ttyUSB0"));
        config.server.port = 8080;
        fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = SimpleSignConfig::load(&config_path).unwrap();
        assert_eq!(loaded.sign.device, Some(PathBuf::from("/dev/ttyUSB0")));
        assert_eq!(loaded.server.port, 8080);
    }

    #[test]
    fn test_create_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        SimpleSignConfig::create_default(&config_path).unwrap();
        assert!(config_path.exists());

        let config = SimpleSignConfig::load(&config_path).unwrap();
        assert_eq!(config.sign.device, None);
        assert_eq!(config.modules.dir, default_modules_dir());
    }

    #[test]
    fn test_generate_default_toml() {
        let toml = SimpleSignConfig::generate_default_toml(Path::new("/srv/sign/modules"));

        assert!(toml.contains("dir = '/srv/sign/modules'"));
        assert!(toml.contains("port = 8000"));
        assert!(toml.contains("{{recent}}"));
        assert!(toml.contains("# device = "));
    }

    #[test]
    fn test_load_config_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        fs::write(&config_path, "[sign]\ndevice = \"/dev/ttyS1\"\n").unwrap();

        let config = SimpleSignConfig::load(&config_path).unwrap();
        assert_eq!(config.sign.device, Some(PathBuf::from("/dev/ttyS1")));
        assert_eq!(config.sign.baud_rate, 9600);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_or_create() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = SimpleSignConfig::load_or_create(&config_path).unwrap();
        assert!(config_path.exists());
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn test_load_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[server]\nport = \"eighty\"\n").unwrap();

        let err = SimpleSignConfig::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
