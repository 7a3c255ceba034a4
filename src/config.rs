//! Command-line configuration
//!
//! [`Cli`] is what `clap` parses; [`Config`] is the validated form the rest of
//! the program uses.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::playback::DEFAULT_SPEED;
use crate::session::{FileTracer, HttpTracer, Tracer, TracerError};

/// Where the tracer service listens unless told otherwise
pub const DEFAULT_TRACER_URL: &str = "http://127.0.0.1:5000/trace";

/// Request timeout for the tracer, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Speed multipliers offered by the viewer, in `SPEED_STEP` increments
pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 5.0;
pub const SPEED_STEP: f64 = 0.5;

#[derive(Debug, Parser)]
#[command(
    name = "traceds",
    version,
    about = "Step through the data structures of a traced program"
)]
pub struct Cli {
    /// Program source to trace
    pub file: PathBuf,

    /// Tracer endpoint that accepts {"code": ...} and returns frames
    #[arg(long, env = "TRACEDS_TRACER_URL", default_value = DEFAULT_TRACER_URL)]
    pub tracer_url: String,

    /// Replay a saved tracer response instead of contacting the tracer
    #[arg(long)]
    pub trace_file: Option<PathBuf>,

    /// Initial playback speed multiplier
    #[arg(long, default_value_t = DEFAULT_SPEED)]
    pub speed: f64,

    /// Tracer request timeout in seconds
    #[arg(long = "timeout-secs", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Write logs to this file (the viewer owns the terminal)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print every step's view as a JSON line instead of opening the viewer
    #[arg(long)]
    pub dump: bool,
}

/// Which tracer a session talks to
#[derive(Debug, Clone, PartialEq)]
pub enum TracerTarget {
    Http { url: String, timeout: Duration },
    File(PathBuf),
}

/// Validated configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source_path: PathBuf,
    pub tracer: TracerTarget,
    pub speed: f64,
    pub log_file: Option<PathBuf>,
    pub dump: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidSpeed(f64),
    InvalidTimeout,
    InvalidTracerUrl(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSpeed(speed) => write!(
                f,
                "Invalid speed {}: expected a value between {} and {}",
                speed, MIN_SPEED, MAX_SPEED
            ),
            ConfigError::InvalidTimeout => write!(f, "Timeout must be at least one second"),
            ConfigError::InvalidTracerUrl(url) => {
                write!(f, "Invalid tracer URL '{}': expected http:// or https://", url)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&cli.speed) {
            return Err(ConfigError::InvalidSpeed(cli.speed));
        }

        let tracer = match cli.trace_file {
            Some(path) => TracerTarget::File(path),
            None => {
                if cli.timeout_secs == 0 {
                    return Err(ConfigError::InvalidTimeout);
                }
                let url = cli.tracer_url.trim().to_string();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::InvalidTracerUrl(url));
                }
                TracerTarget::Http {
                    url,
                    timeout: Duration::from_secs(cli.timeout_secs),
                }
            }
        };

        Ok(Config {
            source_path: cli.file,
            tracer,
            speed: cli.speed,
            log_file: cli.log_file,
            dump: cli.dump,
        })
    }
}

impl Config {
    /// Build the tracer client this configuration points at
    pub fn build_tracer(&self) -> Result<Arc<dyn Tracer>, TracerError> {
        Ok(match &self.tracer {
            TracerTarget::Http { url, timeout } => Arc::new(HttpTracer::new(url.clone(), *timeout)?),
            TracerTarget::File(path) => Arc::new(FileTracer::new(path)),
        })
    }
}

/// Next speed up or down the viewer's scale, clamped to its range
pub fn adjust_speed(speed: f64, steps: i32) -> f64 {
    (speed + SPEED_STEP * f64::from(steps)).clamp(MIN_SPEED, MAX_SPEED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Result<Config, ConfigError> {
        let cli = Cli::try_parse_from(std::iter::once("traceds").chain(args.iter().copied()))
            .expect("arguments should parse");
        Config::try_from(cli)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["prog.py", "--tracer-url", DEFAULT_TRACER_URL]).unwrap();
        assert_eq!(config.source_path, PathBuf::from("prog.py"));
        assert_eq!(config.speed, DEFAULT_SPEED);
        assert_eq!(
            config.tracer,
            TracerTarget::Http {
                url: DEFAULT_TRACER_URL.to_string(),
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            }
        );
        assert!(!config.dump);
    }

    #[test]
    fn test_trace_file_wins_over_url() {
        let config = parse(&["prog.py", "--trace-file", "saved.json", "--dump"]).unwrap();
        assert_eq!(config.tracer, TracerTarget::File(PathBuf::from("saved.json")));
        assert!(config.dump);
    }

    #[rstest]
    #[case(&["prog.py", "--speed", "0"], ConfigError::InvalidSpeed(0.0))]
    #[case(&["prog.py", "--speed", "9"], ConfigError::InvalidSpeed(9.0))]
    #[case(&["prog.py", "--tracer-url", "ftp://host", "--timeout-secs", "3"], ConfigError::InvalidTracerUrl("ftp://host".to_string()))]
    #[case(&["prog.py", "--tracer-url", "http://h/trace", "--timeout-secs", "0"], ConfigError::InvalidTimeout)]
    fn test_invalid_configs(#[case] args: &[&str], #[case] expected: ConfigError) {
        assert_eq!(parse(args), Err(expected));
    }

    #[rstest]
    #[case(1.0, 1, 1.5)]
    #[case(1.0, -1, 0.5)]
    #[case(0.5, -1, 0.5)]
    #[case(5.0, 1, 5.0)]
    fn test_adjust_speed(#[case] speed: f64, #[case] steps: i32, #[case] expected: f64) {
        assert_eq!(adjust_speed(speed, steps), expected);
    }
}
