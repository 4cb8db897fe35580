use std::os::unix::io::{OwnedFd, RawFd};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectType { Input, Output, Append, Heredoc }

impl RedirectType {
	pub fn from_operator(token: &str) -> Option<RedirectType> {
		match token {
			"<" => Some(RedirectType::Input),
			">" => Some(RedirectType::Output),
			">>" => Some(RedirectType::Append),
			"<<" => Some(RedirectType::Heredoc),
			_ => None,
		}
	}

	/// Splits a word that starts with an operator into the operator and
	/// the rest, e.g. `<<EOF` or `>>log`. Longer operators are tried first.
	pub fn split_operator(word: &str) -> Option<(RedirectType, &str)> {
		for op in ["<<", ">>", "<", ">"] {
			if let Some(rest) = word.strip_prefix(op) {
				return RedirectType::from_operator(op).map(|typ| (typ, rest));
			}
		}
		None
	}

	pub fn operator(self) -> &'static str {
		match self {
			RedirectType::Input => "<",
			RedirectType::Output => ">",
			RedirectType::Append => ">>",
			RedirectType::Heredoc => "<<",
		}
	}

	/// Descriptor the redirection replaces in the child.
	pub fn target_fd(self) -> RawFd {
		match self {
			RedirectType::Input | RedirectType::Heredoc => libc::STDIN_FILENO,
			RedirectType::Output | RedirectType::Append => libc::STDOUT_FILENO,
		}
	}
}

/// One redirection operator together with its operand (a path, or the
/// heredoc delimiter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
	pub typ: RedirectType,
	pub target: String,
}

/// A single pipeline stage as produced by the tokenizer. `words[0]` is the
/// program name; redirection operators are still present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
	pub words: Vec<String>,
}

impl Command {
	pub fn name(&self) -> &str {
		&self.words[0]
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
	pub commands: Vec<Command>,
}

impl Pipeline {
	pub fn len(&self) -> usize {
		self.commands.len()
	}

	pub fn is_empty(&self) -> bool {
		self.commands.is_empty()
	}
}

/// What gets attached to a descriptor in the child.
#[derive(Debug)]
pub enum BindingSource {
	/// Opened in the child right before exec, so an open failure only kills
	/// that child.
	File { path: PathBuf, typ: RedirectType },
	/// Read end of a captured heredoc.
	Pipe(OwnedFd),
}

#[derive(Debug)]
pub struct DescriptorBinding {
	pub fd: RawFd,
	pub source: BindingSource,
	pub redirect: Redirect,
}

/// A command with its operators stripped out.
#[derive(Debug, Default)]
pub struct Resolved {
	pub args: Vec<String>,
	pub bindings: Vec<DescriptorBinding>,
}
