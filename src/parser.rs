use crate::error::ParseError;
use crate::types::*;

use glob::MatchOptions;
use log::debug;

type ParseResult<T> = Result<T, ParseError>;

const PIPE: char = '|';

fn is_wildcard(c: char) -> bool {
	c == '*' || c == '?'
}

/// Only `*` and `?` are wildcards here; brackets are matched literally.
fn to_glob_pattern(word: &str) -> String {
	let mut pattern = String::with_capacity(word.len());
	for c in word.chars() {
		match c {
			'[' => pattern.push_str("[[]"),
			']' => pattern.push_str("[]]"),
			_ => pattern.push(c),
		}
	}
	pattern
}

/// Expands `word` against the current directory. Without any match the
/// word is kept as is.
pub fn expand_word(word: &str) -> Vec<String> {
	if !word.chars().any(is_wildcard) {
		return vec![word.to_string()];
	}
	let options = MatchOptions {
		case_sensitive: true,
		require_literal_separator: true,
		require_literal_leading_dot: true,
	};
	let mut matches: Vec<String> = match glob::glob_with(&to_glob_pattern(word), options) {
		Ok(paths) => paths
			.filter_map(Result::ok)
			.map(|p| p.to_string_lossy().into_owned())
			.collect(),
		Err(e) => {
			debug!("bad pattern {:?}: {}", word, e);
			vec![]
		},
	};
	if matches.is_empty() {
		return vec![word.to_string()];
	}
	matches.sort();
	matches
}

fn parse_command(raw: &str) -> ParseResult<Command> {
	let mut words: Vec<String> = vec![];
	for word in raw.split_whitespace() {
		words.extend(expand_word(word));
	}
	if words.is_empty() {
		return Err(ParseError::EmptyPipeline);
	}
	Ok(Command { words })
}

/// Splits `line` into pipeline stages on `|`, then each stage into words.
/// A leading, trailing or doubled `|` yields `EmptyPipeline`.
pub fn parse(line: &str) -> ParseResult<Pipeline> {
	let commands = line
		.split(PIPE)
		.map(parse_command)
		.collect::<ParseResult<Vec<Command>>>()?;
	debug!("parsed {} stage(s)", commands.len());
	Ok(Pipeline { commands })
}
