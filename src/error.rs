use nix::errno::Errno;
use std::io;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
	#[error("syntax error: empty command in pipeline")]
	EmptyPipeline,
	#[error("input line longer than {max} bytes")]
	LineTooLong { max: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedirectionError {
	#[error("missing operand after '{operator}'")]
	MissingOperand { operator: &'static str },
	#[error("{path}: {errno}")]
	OpenFailed { path: String, errno: Errno },
	#[error("heredoc: {0}")]
	Heredoc(Errno),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuiltinError {
	#[error("usage: cd <directory>")]
	MissingArgument,
	#[error("cd: too many arguments")]
	TooManyArguments,
	#[error("cd: {path}: {errno}")]
	ChangeDirFailed { path: String, errno: Errno },
	#[error("exit: {0}: numeric argument required")]
	BadExitCode(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
	#[error("pipe: {0}")]
	Pipe(Errno),
	#[error("fork: {0}")]
	Fork(Errno),
	#[error("wait: {0}")]
	Wait(Errno),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecError {
	#[error("{0}: command not found")]
	NotFound(String),
	#[error("{program}: {errno}")]
	Failed { program: String, errno: Errno },
	#[error("{0:?}: argument contains a nul byte")]
	InvalidArgument(String),
}

impl ExecError {
	/// Status the child exits with when it cannot replace its image.
	pub fn status(&self) -> i32 {
		match *self {
			ExecError::NotFound(_) => 127,
			ExecError::Failed { .. } | ExecError::InvalidArgument(_) => 126,
		}
	}
}

/// A pipeline that could not be carried out completely. Whatever was
/// spawned before the fault has already been reaped.
#[derive(Debug, Error)]
#[error("stage {stage}: {source}")]
pub struct PipelineError {
	pub stage: usize,
	#[source]
	pub source: SpawnError,
	pub reaped: Vec<crate::job::ExitStatus>,
}

#[derive(Debug, Error)]
pub enum ShellError {
	#[error(transparent)]
	Parse(#[from] ParseError),
	#[error(transparent)]
	Redirection(#[from] RedirectionError),
	#[error(transparent)]
	Builtin(#[from] BuiltinError),
	#[error(transparent)]
	Pipeline(#[from] PipelineError),
	#[error(transparent)]
	Readline(#[from] rustyline::error::ReadlineError),
	#[error("io error: {0}")]
	Io(#[from] io::Error),
	#[error("config: {0}")]
	Config(#[from] toml::de::Error),
}
