use clap::{Parser, Subcommand};

pub mod config;
pub mod devices;
pub mod modules;
pub mod preview;
pub mod run;
pub mod version;

#[derive(Parser)]
#[command(name = "simplesign")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Periodically renders messages to an LED sign", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drive the sign and serve the web front end
    Run {
        /// Module deciding what the sign shows (built-in name, module file name or path)
        #[arg(short, long, default_value = "sample")]
        module: String,

        /// Serial device the sign is attached to (guessed if not specified)
        #[arg(short, long)]
        device: Option<String>,

        /// Web server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Log at debug level
        #[arg(short, long)]
        verbose: bool,

        /// Path to config file (default: ~/.local/share/simplesign/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Log file, appended to alongside stderr
        #[arg(long)]
        log_file: Option<String>,

        /// Log sign writes instead of opening a serial device
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the sequence a module would show right now
    Preview {
        #[arg(short, long, default_value = "sample")]
        module: String,

        #[arg(long)]
        config: Option<String>,
    },

    /// List selectable modules
    Modules {
        #[arg(long)]
        config: Option<String>,
    },

    /// List candidate serial devices
    Devices,

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run {
            module,
            device,
            port,
            verbose,
            config,
            log_file,
            dry_run,
        } => run::execute(module, device, port, verbose, config, log_file, dry_run).await,
        Commands::Preview { module, config } => preview::execute(module, config).await,
        Commands::Modules { config } => modules::execute(config),
        Commands::Devices => {
            devices::execute();
            Ok(())
        }
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::parse_from(["simplesign", "run"]);

        match cli.command {
            Commands::Run {
                module,
                device,
                port,
                verbose,
                config,
                log_file,
                dry_run,
            } => {
                assert_eq!(module, "sample");
                assert_eq!(device, None);
                assert_eq!(port, None);
                assert!(!verbose);
                assert_eq!(config, None);
                assert_eq!(log_file, None);
                assert!(!dry_run);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_short_flags() {
        let cli = Cli::parse_from([
            "simplesign",
            "run",
            "-m",
            "office",
            "-d",
            "/dev/ttyUSB0",
            "-p",
            "8080",
            "-v",
        ]);

        match cli.command {
            Commands::Run {
                module,
                device,
                port,
                verbose,
                ..
            } => {
                assert_eq!(module, "office");
                assert_eq!(device, Some("/dev/ttyUSB0".to_string()));
                assert_eq!(port, Some(8080));
                assert!(verbose);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_all_options() {
        let cli = Cli::parse_from([
            "simplesign",
            "run",
            "--module",
            "/etc/simplesign/lobby.toml",
            "--config",
            "/etc/simplesign/config.toml",
            "--log-file",
            "/var/log/simplesign.log",
            "--dry-run",
        ]);

        match cli.command {
            Commands::Run {
                module,
                config,
                log_file,
                dry_run,
                ..
            } => {
                assert_eq!(module, "/etc/simplesign/lobby.toml");
                assert_eq!(config, Some("/etc/simplesign/config.toml".to_string()));
                assert_eq!(log_file, Some("/var/log/simplesign.log".to_string()));
                assert!(dry_run);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_port() {
        assert!(Cli::try_parse_from(["simplesign", "run", "-p", "eighty"]).is_err());
        assert!(Cli::try_parse_from(["simplesign", "run", "-p", "70000"]).is_err());
    }

    #[test]
    fn test_cli_parse_preview() {
        let cli = Cli::parse_from(["simplesign", "preview", "-m", "office"]);

        match cli.command {
            Commands::Preview { module, config } => {
                assert_eq!(module, "office");
                assert_eq!(config, None);
            }
            _ => panic!("Expected Preview command"),
        }
    }

    #[test]
    fn test_cli_parse_modules() {
        let cli = Cli::parse_from(["simplesign", "modules", "--config", "/tmp/c.toml"]);
        assert!(matches!(cli.command, Commands::Modules { config: Some(_) }));
    }

    #[test]
    fn test_cli_parse_devices_and_version() {
        let cli = Cli::parse_from(["simplesign", "devices"]);
        assert!(matches!(cli.command, Commands::Devices));

        let cli = Cli::parse_from(["simplesign", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_unknown_command() {
        assert!(Cli::try_parse_from(["simplesign", "register"]).is_err());
    }
}
