use crate::error::ShellError;

use serde::Deserialize;
use std::path::PathBuf;
use std::{env, fs, io};

const CONFIG_ENV: &str = "ISH_CONFIG";

/// Settings read from `$ISH_CONFIG` or `~/.config/ish/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Longest accepted input line, in bytes.
	pub max_line: usize,
	pub heredoc_prompt: String,
	pub color_prompt: bool,
	/// Default log filter when `ISH_LOG` is unset.
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Config {
		Config {
			max_line: 200,
			heredoc_prompt: "> ".to_string(),
			color_prompt: true,
			log_level: "warn".to_string(),
		}
	}
}

impl Config {
	pub fn path() -> Option<PathBuf> {
		if let Some(p) = env::var_os(CONFIG_ENV) {
			return Some(PathBuf::from(p));
		}
		env::var_os("HOME").map(|home| PathBuf::from(home).join(".config/ish/config.toml"))
	}

	pub fn parse(text: &str) -> Result<Config, ShellError> {
		Ok(toml::from_str(text)?)
	}

	/// A missing file is not an error.
	pub fn load() -> Result<Config, ShellError> {
		let path = match Config::path() {
			Some(p) => p,
			None => return Ok(Config::default()),
		};
		match fs::read_to_string(&path) {
			Ok(text) => Config::parse(&text),
			Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
			Err(e) => Err(e.into()),
		}
	}
}
