//! Runs real pipelines through `ForkExec`. The last stage always writes to
//! a file so the harness's own stdout stays clean.

use crate::error::ParseError;
use crate::eval;
use crate::heredoc::ForkedHeredoc;
use crate::job::ExitStatus;
use crate::parser;
use crate::spawn::ForkExec;
use crate::types::*;

use std::{env, fs};
use std::io::Cursor;
use std::path::PathBuf;

struct Sandbox {
	dir: tempfile::TempDir,
}

impl Sandbox {
	fn new() -> Sandbox {
		Sandbox { dir: tempfile::tempdir().unwrap() }
	}

	fn path(&self, name: &str) -> PathBuf {
		self.dir.path().join(name)
	}

	/// Expands `{name}` into an absolute path inside the sandbox.
	fn line(&self, template: &str) -> String {
		let mut out = String::new();
		let mut rest = template;
		while let Some(open) = rest.find('{') {
			let close = open + rest[open..].find('}').unwrap();
			out.push_str(&rest[..open]);
			out.push_str(self.path(&rest[open + 1..close]).to_str().unwrap());
			rest = &rest[close + 1..];
		}
		out.push_str(rest);
		out
	}

	fn write(&self, name: &str, content: &str) {
		fs::write(self.path(name), content).unwrap();
	}

	fn read(&self, name: &str) -> String {
		fs::read_to_string(self.path(name)).unwrap()
	}

	fn run_with_input(&self, template: &str, input: &str) -> Vec<ExitStatus> {
		let line = self.line(template);
		let pipeline = parser::parse(&line).unwrap();
		let mut heredoc = ForkedHeredoc::new(Cursor::new(input.as_bytes().to_vec()), "");
		let stages = eval::resolve_pipeline(&pipeline, &mut heredoc);
		eval::execute(&mut ForkExec, stages).unwrap()
	}

	fn run(&self, template: &str) -> Vec<ExitStatus> {
		self.run_with_input(template, "")
	}

	/// Runs `line` as typed, from inside the sandbox. What the last stage
	/// would print on the terminal is returned instead; an explicit
	/// redirection on that stage still takes precedence.
	fn run_typed(&self, line: &str, input: &str) -> (Vec<ExitStatus>, String) {
		let terminal = self.path(".terminal");
		let _guard = crate::cwd_lock();
		let before = env::current_dir().unwrap();
		env::set_current_dir(self.dir.path()).unwrap();

		let pipeline = parser::parse(line).unwrap();
		let mut heredoc = ForkedHeredoc::new(Cursor::new(input.as_bytes().to_vec()), "");
		let mut stages = eval::resolve_pipeline(&pipeline, &mut heredoc);
		if let Some(Ok(last)) = stages.last_mut() {
			last.bindings.insert(0, DescriptorBinding {
				fd: libc::STDOUT_FILENO,
				source: BindingSource::File { path: terminal.clone(), typ: RedirectType::Output },
				redirect: Redirect { typ: RedirectType::Output, target: terminal.display().to_string() },
			});
		}
		let statuses = eval::execute(&mut ForkExec, stages);

		env::set_current_dir(before).unwrap();
		(statuses.unwrap(), fs::read_to_string(&terminal).unwrap_or_default())
	}
}

fn exited(codes: &[i32]) -> Vec<ExitStatus> {
	codes.iter().map(|&c| ExitStatus::Exited(c)).collect()
}

#[test]
fn single_command_status() {
	let sb = Sandbox::new();
	assert_eq!(sb.run("ls / > {out}"), exited(&[0]));
	assert!(!sb.read("out").is_empty());
	assert_eq!(sb.run("false"), exited(&[1]));
}

#[test]
fn three_stage_pipeline() {
	let sb = Sandbox::new();
	sb.write("a.txt", "foo 1\nbar\nfoo 2\nbaz\n");
	assert_eq!(sb.run("cat {a.txt} | grep foo | wc -l > {count}"), exited(&[0, 0, 0]));
	assert_eq!(sb.read("count").trim(), "2");
}

#[test]
fn truncate_then_append() {
	let sb = Sandbox::new();
	sb.write("out.txt", "old contents that must go\n");
	assert_eq!(sb.run("echo hi > {out.txt}"), exited(&[0]));
	assert_eq!(sb.read("out.txt"), "hi\n");
	assert_eq!(sb.run("echo hi >> {out.txt}"), exited(&[0]));
	assert_eq!(sb.read("out.txt"), "hi\nhi\n");
}

#[test]
fn input_from_file() {
	let sb = Sandbox::new();
	sb.write("unsorted.txt", "pear\napple\nfig\n");
	assert_eq!(sb.run("sort < {unsorted.txt} > {sorted.txt}"), exited(&[0]));
	assert_eq!(sb.read("sorted.txt"), "apple\nfig\npear\n");
}

#[test]
fn heredoc_feeds_stdin() {
	let sb = Sandbox::new();
	assert_eq!(sb.run_with_input("cat << EOF > {out}", "a\nb\nEOF\nignored\n"), exited(&[0]));
	assert_eq!(sb.read("out"), "a\nb\n");
}

#[test]
fn explicit_redirect_beats_pipe() {
	let sb = Sandbox::new();
	assert_eq!(sb.run("echo hi > {first} | cat > {second}"), exited(&[0, 0]));
	assert_eq!(sb.read("first"), "hi\n");
	assert_eq!(sb.read("second"), "");
}

#[test]
fn explicit_input_beats_pipe() {
	let sb = Sandbox::new();
	sb.write("in", "from file\n");
	assert_eq!(sb.run("echo from pipe | cat < {in} > {out}"), exited(&[0, 0]));
	assert_eq!(sb.read("out"), "from file\n");
}

#[test]
fn missing_program_still_counts() {
	let sb = Sandbox::new();
	let statuses = sb.run("ish-no-such-program-42 | cat > {out}");
	assert_eq!(statuses, exited(&[127, 0]));
	assert_eq!(sb.read("out"), "");
}

#[test]
fn failing_middle_stage_does_not_stop_siblings() {
	let sb = Sandbox::new();
	let statuses = sb.run("true | cat < {missing} | cat > {out}");
	assert_eq!(statuses, exited(&[0, 1, 0]));
	assert_eq!(sb.read("out"), "");
}

#[test]
fn missing_operand_is_local_to_its_stage() {
	let sb = Sandbox::new();
	let statuses = sb.run("true | cat >");
	assert_eq!(statuses.len(), 2);
	assert_eq!(statuses[1], ExitStatus::Exited(1));
}

#[test]
fn redirection_alone_creates_the_file() {
	let sb = Sandbox::new();
	assert_eq!(sb.run("> {empty}"), exited(&[0]));
	assert!(sb.path("empty").exists());
}

#[test]
fn output_larger_than_a_pipe_buffer() {
	let sb = Sandbox::new();
	let statuses = sb.run("seq 1 200000 | cat | wc -l > {count}");
	assert_eq!(statuses, exited(&[0, 0, 0]));
	assert_eq!(sb.read("count").trim(), "200000");
}

#[test]
fn typed_single_command() {
	let sb = Sandbox::new();
	sb.write("a.txt", "");
	assert_eq!(sb.run_typed("ls", ""), (exited(&[0]), "a.txt\n".to_string()));
}

#[test]
fn typed_three_stage_pipeline() {
	let sb = Sandbox::new();
	sb.write("a.txt", "foo\nbar\nfood\n");
	let (statuses, out) = sb.run_typed("cat a.txt | grep foo | wc -l", "");
	assert_eq!(statuses, exited(&[0, 0, 0]));
	assert_eq!(out.trim(), "2");
}

#[test]
fn typed_output_redirection() {
	let sb = Sandbox::new();
	assert_eq!(sb.run_typed("echo hi > out.txt", ""), (exited(&[0]), String::new()));
	assert_eq!(sb.read("out.txt"), "hi\n");
	assert_eq!(sb.run_typed("echo hi >> out.txt", ""), (exited(&[0]), String::new()));
	assert_eq!(sb.read("out.txt"), "hi\nhi\n");
}

#[test]
fn typed_redirection_without_spaces() {
	let sb = Sandbox::new();
	sb.write("unsorted.txt", "b\na\n");
	assert_eq!(sb.run_typed("echo hi >out.txt", ""), (exited(&[0]), String::new()));
	assert_eq!(sb.run_typed("echo hi >>out.txt", ""), (exited(&[0]), String::new()));
	assert_eq!(sb.read("out.txt"), "hi\nhi\n");
	assert_eq!(sb.run_typed("sort <unsorted.txt", ""), (exited(&[0]), "a\nb\n".to_string()));
}

#[test]
fn typed_input_redirection() {
	let sb = Sandbox::new();
	sb.write("unsorted.txt", "pear\napple\nfig\n");
	assert_eq!(sb.run_typed("sort < unsorted.txt", ""), (exited(&[0]), "apple\nfig\npear\n".to_string()));
}

#[test]
fn typed_heredoc() {
	let sb = Sandbox::new();
	assert_eq!(sb.run_typed("cat <<EOF", "a\nb\nEOF\n"), (exited(&[0]), "a\nb\n".to_string()));
}

#[test]
fn typed_leading_pipe() {
	assert_eq!(parser::parse("| ls"), Err(ParseError::EmptyPipeline));
}
