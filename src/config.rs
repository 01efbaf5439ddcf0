use crate::cli::{Cli, OutputFormat};
use crate::error::InstallError;
use crate::platform::Platform;
use crate::remote::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

pub const APP_NAME: &str = "setup-butler";
pub const TOOL_CACHE_DIR_NAME: &str = "tool-cache";
pub const BASE_URL_ENV: &str = "SETUP_BUTLER_BASE_URL";

/// Everything the installer needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Raw `version` input; validated only when a download is needed.
    pub requested_version: Option<String>,
    pub self_update: bool,
    pub temp_dir: PathBuf,
    pub tool_cache_dir: PathBuf,
    pub platform: Platform,
    pub base_url: String,
    pub output: OutputFormat,
}

/// Name of the environment variable an action input arrives in.
pub fn input_env_key(name: &str) -> String {
    format!("INPUT_{}", name.trim().replace(' ', "_").to_uppercase())
}

/// `true` only for a trimmed, case-insensitive "true".
pub fn parse_flag(value: &str) -> bool {
    value.trim().to_lowercase() == "true"
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

fn get_input(env: &HashMap<String, String>, name: &str) -> Option<String> {
    non_empty(env.get(&input_env_key(name)))
        .or_else(|| non_empty(env.get(&input_env_key(&name.replace('-', "_")))))
}

pub fn default_tool_cache_dir() -> Result<PathBuf> {
    let path = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?
        .join(APP_NAME)
        .join(TOOL_CACHE_DIR_NAME);
    tracing::debug!("Default tool cache directory: {}", path.display());
    Ok(path)
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_sources(cli, &env, Platform::current()?)
    }

    /// Merges CLI flags over environment values.
    pub fn from_sources(
        cli: &Cli,
        env: &HashMap<String, String>,
        platform: Platform,
    ) -> Result<Self> {
        let requested_version = cli
            .tool_version
            .clone()
            .or_else(|| get_input(env, "version"));

        let self_update = cli
            .self_update
            .clone()
            .or_else(|| get_input(env, "self-update"))
            .map_or(true, |v| parse_flag(&v));

        let temp_dir = cli
            .temp_dir
            .clone()
            .or_else(|| non_empty(env.get("RUNNER_TEMP")).map(PathBuf::from))
            .ok_or(InstallError::MissingTempDir)?;

        let tool_cache_dir = match cli
            .tool_cache
            .clone()
            .or_else(|| non_empty(env.get("RUNNER_TOOL_CACHE")).map(PathBuf::from))
        {
            Some(dir) => dir,
            None => default_tool_cache_dir().context("Could not locate a tool cache directory")?,
        };

        let base_url = cli
            .base_url
            .clone()
            .or_else(|| non_empty(env.get(BASE_URL_ENV)))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Settings {
            requested_version,
            self_update,
            temp_dir,
            tool_cache_dir,
            platform,
            base_url,
            output: cli.output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["setup-butler"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn input_keys_follow_runner_naming() {
        assert_eq!(input_env_key("version"), "INPUT_VERSION");
        assert_eq!(input_env_key("self-update"), "INPUT_SELF-UPDATE");
        assert_eq!(input_env_key("tool cache"), "INPUT_TOOL_CACHE");
    }

    #[test]
    fn defaults_come_from_runner_environment() {
        let settings = Settings::from_sources(
            &cli(&[]),
            &env(&[("RUNNER_TEMP", "/tmp/runner"), ("RUNNER_TOOL_CACHE", "/opt/hostedtoolcache")]),
            Platform::Linux,
        )
        .unwrap();

        assert_eq!(settings.requested_version, None);
        assert!(settings.self_update);
        assert_eq!(settings.temp_dir, PathBuf::from("/tmp/runner"));
        assert_eq!(settings.tool_cache_dir, PathBuf::from("/opt/hostedtoolcache"));
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.output, OutputFormat::Text);
    }

    #[test]
    fn inputs_are_read_from_environment() {
        let settings = Settings::from_sources(
            &cli(&[]),
            &env(&[
                ("RUNNER_TEMP", "/tmp/runner"),
                ("RUNNER_TOOL_CACHE", "/cache"),
                ("INPUT_VERSION", " 15.21.0 "),
                ("INPUT_SELF-UPDATE", "FALSE"),
            ]),
            Platform::Darwin,
        )
        .unwrap();

        assert_eq!(settings.requested_version.as_deref(), Some(" 15.21.0 "));
        assert!(!settings.self_update);
        assert_eq!(settings.platform, Platform::Darwin);
    }

    #[test]
    fn underscore_input_name_is_accepted() {
        let settings = Settings::from_sources(
            &cli(&[]),
            &env(&[
                ("RUNNER_TEMP", "/tmp/runner"),
                ("RUNNER_TOOL_CACHE", "/cache"),
                ("INPUT_SELF_UPDATE", "no"),
            ]),
            Platform::Linux,
        )
        .unwrap();

        assert!(!settings.self_update);
    }

    #[test]
    fn cli_flags_override_environment() {
        let settings = Settings::from_sources(
            &cli(&[
                "--tool-version",
                "1.2.3",
                "--self-update",
                "true",
                "--temp-dir",
                "/work/tmp",
                "--tool-cache",
                "/work/cache",
                "--base-url",
                "http://127.0.0.1:9000/butler",
            ]),
            &env(&[
                ("RUNNER_TEMP", "/tmp/runner"),
                ("RUNNER_TOOL_CACHE", "/cache"),
                ("INPUT_VERSION", "latest"),
                ("INPUT_SELF-UPDATE", "false"),
                (BASE_URL_ENV, "http://ignored"),
            ]),
            Platform::Windows,
        )
        .unwrap();

        assert_eq!(settings.requested_version.as_deref(), Some("1.2.3"));
        assert!(settings.self_update);
        assert_eq!(settings.temp_dir, PathBuf::from("/work/tmp"));
        assert_eq!(settings.tool_cache_dir, PathBuf::from("/work/cache"));
        assert_eq!(settings.base_url, "http://127.0.0.1:9000/butler");
    }

    #[test]
    fn missing_temp_dir_is_a_configuration_error() {
        let err = Settings::from_sources(
            &cli(&[]),
            &env(&[("RUNNER_TOOL_CACHE", "/cache"), ("RUNNER_TEMP", "  ")]),
            Platform::Linux,
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::MissingTempDir)
        ));
    }
}
