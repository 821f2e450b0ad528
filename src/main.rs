use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::{env, process};

use cvv::config::{self, Config, Emit};
use cvv::{CompileError, parser, tokenizer};
use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

#[derive(Debug, Snafu)]
enum AppError {
  #[snafu(display("cannot read '{}': {source}", path.display()))]
  Read { path: PathBuf, source: io::Error },

  #[snafu(display("cannot write '{}': {source}", path.display()))]
  Write { path: PathBuf, source: io::Error },

  #[snafu(display("cannot write to stdout: {source}"))]
  Stdout { source: io::Error },

  #[snafu(display("{source}"))]
  Compile { source: CompileError },
}

fn run(config: &Config) -> Result<(), AppError> {
  let source = fs::read_to_string(&config.input).context(ReadSnafu {
    path: config.input.clone(),
  })?;
  debug!(input = %config.input.display(), bytes = source.len(), "read source");

  let output = match config.emit {
    Emit::Asm => cvv::compile(&source).context(CompileSnafu)?,
    Emit::Tokens => tokenizer::tokenize(&source)
      .context(CompileSnafu)?
      .iter()
      .map(|token| format!("{token}\n"))
      .collect(),
    Emit::Ast => {
      let tokens = tokenizer::tokenize(&source).context(CompileSnafu)?;
      parser::parse(tokens, &source)
        .context(CompileSnafu)?
        .iter()
        .map(|node| format!("{node}\n"))
        .collect()
    }
  };

  match &config.output {
    Some(path) => {
      fs::write(path, output).context(WriteSnafu { path: path.clone() })?;
      info!(output = %path.display(), "wrote output");
    }
    None => io::stdout()
      .write_all(output.as_bytes())
      .context(StdoutSnafu)?,
  }
  Ok(())
}

fn main() {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_target(false)
    .with_max_level(config::log_level())
    .init();

  let config = match Config::from_args(env::args().skip(1)) {
    Ok(config) => config,
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  };

  if let Err(err) = run(&config) {
    eprintln!("{err}");
    process::exit(1);
  }
}
