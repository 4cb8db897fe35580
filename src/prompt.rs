use log::warn;
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const BLUE: &str = "\x1b[1;34m";
const RESET: &str = "\x1b[0m";
const FALLBACK: &str = "ish$ ";

pub fn render(user: Option<&str>, cwd: Option<&Path>, color: bool) -> String {
	let cwd = match cwd {
		Some(cwd) => cwd,
		None => return FALLBACK.to_string(),
	};
	let body = format!("{}@ish:{}", user.unwrap_or("?"), cwd.display());
	if color {
		format!("{}{}{}$ ", BLUE, body, RESET)
	} else {
		format!("{}$ ", body)
	}
}

/// Prompt for the current user and working directory.
pub fn current(color: bool) -> String {
	let user = env::var("USER").ok();
	let cwd: Option<PathBuf> = match nix::unistd::getcwd() {
		Ok(p) => Some(p),
		Err(e) => {
			warn!("getcwd: {}", e);
			None
		},
	};
	render(user.as_deref(), cwd.as_deref(), color)
}

/// Writes the current prompt to `out` and flushes it, for input that does
/// not come through the line editor.
pub fn show<W: Write>(out: &mut W, color: bool) -> io::Result<()> {
	out.write_all(current(color).as_bytes())?;
	out.flush()
}
