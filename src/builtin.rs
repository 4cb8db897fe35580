use crate::error::BuiltinError;
use crate::global::State;

use std::io::Write;

/// What the shell loop does after a line.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Flow {
	Continue(i32),
	Exit(i32),
}

/// Built-ins run inside the shell; `out` is the shell's stdout or the file
/// a `>`/`>>` on the command line names.
pub type Builtin = fn(&mut State, &[String], &mut dyn Write) -> Result<Flow, BuiltinError>;

pub(crate) const HELP: &str = "\
Built-in commands:
  cd <directory>   change the working directory
  exit [n], quit   leave the shell
  help             show this help
Operators: cmd | cmd, < file, > file, >> file, << DELIMITER, * and ? wildcards
";

pub fn builtin_cd(_: &mut State, args: &[String], _: &mut dyn Write) -> Result<Flow, BuiltinError> {
	let path = match args {
		[] => return Err(BuiltinError::MissingArgument),
		[path] => path,
		_ => return Err(BuiltinError::TooManyArguments),
	};
	nix::unistd::chdir(path.as_str())
		.map_err(|errno| BuiltinError::ChangeDirFailed { path: path.clone(), errno })?;
	Ok(Flow::Continue(0))
}

pub fn builtin_exit(state: &mut State, args: &[String], _: &mut dyn Write) -> Result<Flow, BuiltinError> {
	match args.first() {
		None => Ok(Flow::Exit(state.last_status)),
		Some(arg) => arg
			.parse::<i32>()
			.map(Flow::Exit)
			.map_err(|_| BuiltinError::BadExitCode(arg.clone())),
	}
}

pub fn builtin_help(_: &mut State, _: &[String], out: &mut dyn Write) -> Result<Flow, BuiltinError> {
	let written = out.write_all(HELP.as_bytes()).and_then(|_| out.flush());
	Ok(Flow::Continue(if written.is_ok() { 0 } else { 1 }))
}

pub fn match_builtin(name: &str) -> Option<Builtin> {
	match name {
		"cd" => Some(builtin_cd),
		"exit" | "quit" => Some(builtin_exit),
		"help" => Some(builtin_help),
		_ => None,
	}
}
