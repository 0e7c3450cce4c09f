//! Command-line overrides for the daemon configuration.
//!
//! Values given on the command line take precedence over the configuration
//! file, which in turn takes precedence over the built-in defaults.

use camino::Utf8PathBuf;
use clap::Parser;

use crate::config::{Config, ConfigError};
use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Command-line interface of the `dicod` daemon.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "dicod", about = "DICT protocol dictionary server", version)]
pub struct Cli {
    /// JSON configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,
    /// Endpoint to listen on, e.g. `tcp://0.0.0.0:2628` or `unix:///run/dicod.sock`.
    #[arg(long, value_name = "ENDPOINT")]
    pub listen: Option<SocketEndpoint>,
    /// `tracing` filter directive.
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,
    /// Log output format (`json` or `compact`).
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,
    /// Enables a protocol capability; may be repeated.
    #[arg(long = "capability", value_name = "NAME")]
    pub capabilities: Vec<String>,
    /// Strategy used when a client asks for the default (`.`).
    #[arg(long, value_name = "NAME")]
    pub default_strategy: Option<String>,
    /// Logs every protocol line exchanged with clients.
    #[arg(long)]
    pub transcript: bool,
    /// Reports query statistics at the end of DEFINE and MATCH replies.
    #[arg(long)]
    pub timing: bool,
}

impl Cli {
    /// Loads the configuration file, if any, and applies the overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// when the merged configuration is inconsistent.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let base = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        let merged = self.apply(base);
        merged.validate()?;
        Ok(merged)
    }

    /// Overlays the command-line values onto `config`.
    #[must_use]
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(listen) = &self.listen {
            config.listen = listen.clone();
        }
        if let Some(filter) = &self.log_filter {
            config.log_filter.clone_from(filter);
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        for capability in &self.capabilities {
            if !config.capabilities.contains(capability) {
                config.capabilities.push(capability.clone());
            }
        }
        if let Some(strategy) = &self.default_strategy {
            config.default_strategy = Some(strategy.clone());
        }
        config.transcript |= self.transcript;
        config.timing |= self.timing;
        config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use rstest::rstest;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dicod").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn no_arguments_keep_defaults() {
        let config = parse(&[]).load().expect("load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--listen",
            "unix:///tmp/dicod.sock",
            "--log-filter",
            "debug",
            "--log-format",
            "compact",
            "--capability",
            "xlev",
            "--capability",
            "mime",
            "--default-strategy",
            "prefix",
            "--transcript",
            "--timing",
        ]);
        let config = cli.load().expect("load");
        assert_eq!(config.listen, SocketEndpoint::unix("/tmp/dicod.sock"));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.capabilities, ["xlev", "mime"]);
        assert_eq!(config.default_strategy.as_deref(), Some("prefix"));
        assert!(config.transcript);
        assert!(config.timing);
    }

    #[test]
    fn flags_override_the_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(br#"{ "log_filter": "warn", "capabilities": ["mime"] }"#)
            .expect("write");
        let path = file.path().to_str().expect("utf-8 path");
        let config = parse(&["--config", path, "--capability", "mime", "--capability", "xlev"])
            .load()
            .expect("load");
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.capabilities, ["mime", "xlev"]);
    }

    #[rstest]
    #[case(&["--listen", "udp://host"])]
    #[case(&["--log-format", "pretty"])]
    #[case(&["--frobnicate"])]
    fn rejects_bad_arguments(#[case] args: &[&str]) {
        let result = Cli::try_parse_from(std::iter::once("dicod").chain(args.iter().copied()));
        assert!(result.is_err());
    }
}
