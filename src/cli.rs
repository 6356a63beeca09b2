use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::constants::DEFAULT_OUTPUT_PREFIX;
use crate::models::RunConfiguration;

/// Command-line arguments for the host-snapshot tool.
///
/// A plain invocation collects every domain into the output directory.
#[derive(Parser, Debug)]
#[clap(name = "host-snapshot", about = "One-shot diagnostic snapshot of the local host")]
pub struct Args {
    /// Output directory (default: <tmp>/host-snapshot-<hostname>-<YYYYmmdd-HHMMSS>)
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Widen the external scanner from the Downloads folder to the whole user profile
    #[clap(long)]
    pub deep: bool,

    /// Also bundle the output directory into <output>.zip
    #[clap(long)]
    pub zip: bool,

    /// Path to settings YAML file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the default settings file
    InitConfig {
        /// Path to output settings file
        #[clap(default_value = "host-snapshot.yaml")]
        path: PathBuf,
    },
}

/// Default output directory name for a host at a point in time
pub fn default_output_name(hostname: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}-{}", DEFAULT_OUTPUT_PREFIX, hostname, at.format("%Y%m%d-%H%M%S"))
}

impl Args {
    /// Build the run configuration. The output root is fixed here, once.
    pub fn run_configuration(&self, hostname: &str, at: DateTime<Utc>, temp_dir: &Path) -> RunConfiguration {
        let output_root = match &self.output {
            Some(path) => path.clone(),
            None => temp_dir.join(default_output_name(hostname, at)),
        };
        RunConfiguration {
            output_root,
            deep_mode: self.deep,
            archive: self.zip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_values() {
        let args = Args::parse_from(["host-snapshot"]);

        assert!(args.output.is_none());
        assert!(!args.deep);
        assert!(!args.zip);
        assert!(!args.verbose);
        assert!(args.config.is_none());
        assert!(args.command.is_none());
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "host-snapshot",
            "--output", "/cases/ws-17",
            "--deep",
            "--zip",
            "-c", "/etc/host-snapshot.yaml",
            "-v",
        ]);

        assert_eq!(args.output, Some(PathBuf::from("/cases/ws-17")));
        assert!(args.deep);
        assert!(args.zip);
        assert_eq!(args.config, Some(PathBuf::from("/etc/host-snapshot.yaml")));
        assert!(args.verbose);
    }

    #[test]
    fn test_init_config_subcommand() {
        let args = Args::parse_from(["host-snapshot", "init-config", "custom.yaml"]);
        match args.command {
            Some(Commands::InitConfig { path }) => assert_eq!(path, PathBuf::from("custom.yaml")),
            _ => panic!("Expected InitConfig command"),
        }

        let args = Args::parse_from(["host-snapshot", "init-config"]);
        match args.command {
            Some(Commands::InitConfig { path }) => assert_eq!(path, PathBuf::from("host-snapshot.yaml")),
            _ => panic!("Expected InitConfig command"),
        }
    }

    #[test]
    fn test_default_output_root_is_timestamped() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 52).unwrap();
        let args = Args::parse_from(["host-snapshot", "--deep"]);

        let run = args.run_configuration("ws-17", at, Path::new("/tmp"));
        assert_eq!(run.output_root, PathBuf::from("/tmp/host-snapshot-ws-17-20240115-143052"));
        assert!(run.deep_mode);
        assert!(!run.archive);
    }

    #[test]
    fn test_explicit_output_wins() {
        let args = Args::parse_from(["host-snapshot", "-o", "/cases/out", "--zip"]);
        let run = args.run_configuration("ws-17", Utc::now(), Path::new("/tmp"));
        assert_eq!(run.output_root, PathBuf::from("/cases/out"));
        assert!(run.archive);
    }
}
