//! Command-line and environment configuration for the `cvv` binary.

use std::env;
use std::path::PathBuf;

use snafu::{OptionExt, Snafu, ensure};
use tracing::Level;

pub const USAGE: &str = "usage: cvv <input> [-o <output>] [--emit asm|tokens|ast]";

/// Environment variable holding the log level (`error` .. `trace`).
pub const LOG_ENV: &str = "CVV_LOG";

#[derive(Debug, Snafu)]
pub enum ConfigError {
  #[snafu(display("missing input file\n{USAGE}"))]
  MissingInput,

  #[snafu(display("option '{option}' needs a value\n{USAGE}"))]
  MissingValue { option: String },

  #[snafu(display("unknown emit kind '{value}', expected asm, tokens or ast"))]
  UnknownEmit { value: String },

  #[snafu(display("unexpected argument '{arg}'\n{USAGE}"))]
  UnexpectedArgument { arg: String },
}

/// What the binary writes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emit {
  #[default]
  Asm,
  Tokens,
  Ast,
}

impl Emit {
  fn parse(value: &str) -> Result<Self, ConfigError> {
    match value {
      "asm" => Ok(Self::Asm),
      "tokens" => Ok(Self::Tokens),
      "ast" => Ok(Self::Ast),
      _ => UnknownEmitSnafu { value }.fail(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub input: PathBuf,
  /// `None` writes to stdout.
  pub output: Option<PathBuf>,
  pub emit: Emit,
}

impl Config {
  /// Parse arguments, not including the program name.
  pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
  where
    I: IntoIterator<Item = String>,
  {
    let mut input = None;
    let mut output = None;
    let mut emit = Emit::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
      match arg.as_str() {
        "-o" => {
          let value = args.next().context(MissingValueSnafu { option: "-o" })?;
          output = Some(PathBuf::from(value));
        }
        "--emit" => {
          let value = args.next().context(MissingValueSnafu { option: "--emit" })?;
          emit = Emit::parse(&value)?;
        }
        _ if arg.starts_with("--emit=") => {
          emit = Emit::parse(&arg["--emit=".len()..])?;
        }
        _ => {
          ensure!(
            input.is_none() && !arg.starts_with('-'),
            UnexpectedArgumentSnafu { arg }
          );
          input = Some(PathBuf::from(arg));
        }
      }
    }

    Ok(Self {
      input: input.context(MissingInputSnafu)?,
      output,
      emit,
    })
  }
}

/// Log level from `CVV_LOG`, falling back to `warn` when unset or invalid.
pub fn log_level() -> Level {
  env::var(LOG_ENV)
    .ok()
    .and_then(|value| value.trim().parse().ok())
    .unwrap_or(Level::WARN)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|arg| arg.to_string()).collect()
  }

  #[test]
  fn input_only_defaults_to_asm_on_stdout() {
    let config = Config::from_args(args(&["prog.c"])).unwrap();
    assert_eq!(
      config,
      Config {
        input: PathBuf::from("prog.c"),
        output: None,
        emit: Emit::Asm,
      }
    );
  }

  #[test]
  fn output_and_emit_options() {
    let config = Config::from_args(args(&["-o", "out.s", "prog.c", "--emit", "ast"])).unwrap();
    assert_eq!(config.output, Some(PathBuf::from("out.s")));
    assert_eq!(config.emit, Emit::Ast);

    let config = Config::from_args(args(&["prog.c", "--emit=tokens"])).unwrap();
    assert_eq!(config.emit, Emit::Tokens);
  }

  #[test]
  fn misuse_is_reported() {
    assert!(matches!(
      Config::from_args(args(&[])),
      Err(ConfigError::MissingInput)
    ));
    assert!(matches!(
      Config::from_args(args(&["prog.c", "-o"])),
      Err(ConfigError::MissingValue { .. })
    ));
    assert!(matches!(
      Config::from_args(args(&["prog.c", "--emit", "bin"])),
      Err(ConfigError::UnknownEmit { .. })
    ));
    assert!(matches!(
      Config::from_args(args(&["a.c", "b.c"])),
      Err(ConfigError::UnexpectedArgument { .. })
    ));
    assert!(matches!(
      Config::from_args(args(&["-x", "a.c"])),
      Err(ConfigError::UnexpectedArgument { .. })
    ));
  }
}
