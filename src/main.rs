use ish::builtin::Flow;
use ish::config::Config;
use ish::error::{ParseError, ShellError};
use ish::eval;
use ish::global::State;
use ish::heredoc::ForkedHeredoc;
use ish::input::{self, RawStdin, ReadLine};
use ish::prompt;
use ish::spawn::{self, ForkExec};

use log::{debug, warn};
use nix::sys::signal::{self, SigHandler};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, IsTerminal, Write};
use std::process;

enum Source {
	Editor(DefaultEditor),
	Raw(RawStdin),
}

impl Source {
	fn open() -> Result<Source, ShellError> {
		if io::stdin().is_terminal() {
			Ok(Source::Editor(DefaultEditor::new()?))
		} else {
			Ok(Source::Raw(RawStdin))
		}
	}

	fn next_line(&mut self, state: &State) -> Result<ReadLine, ShellError> {
		let max = state.config.max_line;
		match *self {
			Source::Editor(ref mut rl) => match rl.readline(&prompt::current(state.config.color_prompt)) {
				Ok(line) => {
					if line.len() > max {
						return Ok(ReadLine::TooLong);
					}
					let _ = rl.add_history_entry(line.as_str());
					Ok(ReadLine::Line(line))
				},
				Err(ReadlineError::Interrupted) => Ok(ReadLine::Line(String::new())),
				Err(ReadlineError::Eof) => Ok(ReadLine::Eof),
				Err(e) => Err(e.into()),
			},
			Source::Raw(ref mut raw) => {
				// stdout may be a pipe or a file here; keep the prompt out of it.
				let _ = prompt::show(&mut io::stderr(), state.config.color_prompt);
				Ok(input::read_line(raw, Some(max))?)
			},
		}
	}
}

fn init_logging(config: &Config) {
	env_logger::Builder::from_env(env_logger::Env::new().filter_or("ISH_LOG", &config.log_level))
		.format_timestamp(None)
		.init();
}

fn run(state: &mut State) -> Result<i32, ShellError> {
	let mut source = Source::open()?;
	let mut builder = ForkExec;
	let mut heredoc = ForkedHeredoc::new(RawStdin, &state.config.heredoc_prompt);
	loop {
		let line = match source.next_line(state)? {
			ReadLine::Line(line) => line,
			ReadLine::TooLong => {
				eprintln!("ish: {}", ParseError::LineTooLong { max: state.config.max_line });
				continue;
			},
			ReadLine::Eof => {
				println!();
				return Ok(state.last_status);
			},
		};
		if line.trim().is_empty() {
			continue;
		}
		debug!("line: {:?}", line);
		match eval::eval_line(state, &line, &mut builder, &mut heredoc) {
			Ok(Flow::Continue(_)) => {},
			Ok(Flow::Exit(code)) => return Ok(code),
			Err(ShellError::Pipeline(e)) => {
				eprintln!("ish: {}", e);
				state.last_status = e.reaped.last().map_or(1, |s| s.code());
			},
			Err(e @ ShellError::Builtin(_)) | Err(e @ ShellError::Redirection(_)) => {
				eprintln!("ish: {}", e);
				state.last_status = 1;
			},
			Err(e) => {
				eprintln!("ish: {}", e);
				state.last_status = 2;
			},
		}
		let _ = io::stdout().flush();
	}
}

fn main() {
	let (config, config_err) = match Config::load() {
		Ok(c) => (c, None),
		Err(e) => (Config::default(), Some(e)),
	};
	init_logging(&config);
	if let Some(e) = config_err {
		warn!("ignoring configuration: {}", e);
	}
	for &sig in &spawn::SHELL_IGNORED {
		let _ = unsafe { signal::signal(sig, SigHandler::SigIgn) };
	}

	let mut state = State::new(config);
	let code = match run(&mut state) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("ish: {}", e);
			1
		},
	};
	process::exit(code)
}
