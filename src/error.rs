//! Shared error utilities used across the compilation pipeline.
//!
//! Every error is fatal: the first one raised aborts the run. Lexical and
//! syntactic errors point at the offending byte with a caret under the
//! source line; semantic errors name the variables and functions involved.

use std::fmt;

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// 1-based line/column of a byte offset in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
  pub line: usize,
  pub column: usize,
}

impl Location {
  pub fn of(source: &str, loc: usize) -> Self {
    let safe_loc = clamp_to_boundary(source, loc);
    let before = &source[..safe_loc];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    let column = source[line_start..safe_loc].chars().count() + 1;
    Self { line, column }
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  #[snafu(display("{location}: lexical error: {message}\n{snippet}"))]
  Lex {
    location: Location,
    message: String,
    snippet: String,
  },

  #[snafu(display("{location}: syntax error: {message}\n{snippet}"))]
  Syntax {
    location: Location,
    message: String,
    snippet: String,
  },

  #[snafu(display("undefined variable '{name}' in function '{function}'"))]
  UndefinedVariable { name: String, function: String },

  #[snafu(display("variable '{name}' is already declared in this scope of function '{function}'"))]
  DuplicateVariable { name: String, function: String },

  #[snafu(display("function '{name}' is defined more than once"))]
  DuplicateFunction { name: String },

  #[snafu(display(
    "function '{name}' was declared with {expected} parameter(s) but is redeclared with {found}"
  ))]
  ConflictingDeclaration {
    name: String,
    expected: usize,
    found: usize,
  },

  #[snafu(display("function name '{name}' clashes with a generated label or a register"))]
  ReservedFunctionName { name: String },

  #[snafu(display("call to undeclared function '{name}'"))]
  UndefinedFunction { name: String },

  #[snafu(display("function '{name}' takes {expected} argument(s) but {found} were supplied"))]
  ArityMismatch {
    name: String,
    expected: usize,
    found: usize,
  },

  #[snafu(display("'break' outside of a loop in function '{function}'"))]
  BreakOutsideLoop { function: String },

  #[snafu(display("'continue' outside of a loop in function '{function}'"))]
  ContinueOutsideLoop { function: String },

  #[snafu(display("malformed node sequence: {message}"))]
  MalformedNodes { message: String },
}

impl CompileError {
  /// Lexical error anchored at a byte offset in the source.
  pub fn lex_at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    LexSnafu {
      location: Location::of(source, loc),
      message,
      snippet: snippet(source, loc),
    }
    .build()
  }

  /// Syntax error anchored at a byte offset in the source.
  pub fn syntax_at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    SyntaxSnafu {
      location: Location::of(source, loc),
      message,
      snippet: snippet(source, loc),
    }
    .build()
  }

  /// Coarse classification, handy for callers that only care about the stage.
  pub fn stage(&self) -> &'static str {
    match self {
      Self::Lex { .. } => "lexer",
      Self::Syntax { .. } => "parser",
      _ => "codegen",
    }
  }
}

/// Render the source line containing `loc` with a caret beneath it.
fn snippet(source: &str, loc: usize) -> String {
  let safe_loc = clamp_to_boundary(source, loc);
  let line_start = source[..safe_loc].rfind('\n').map_or(0, |idx| idx + 1);
  let line_end = source[safe_loc..]
    .find('\n')
    .map_or(source.len(), |idx| safe_loc + idx);
  let line = source[line_start..line_end].trim_end_matches('\r');
  let char_offset = source[line_start..safe_loc].chars().count();
  format!("{line}\n{}^", " ".repeat(char_offset))
}

fn clamp_to_boundary(source: &str, loc: usize) -> usize {
  let mut safe_loc = loc.min(source.len());
  while !source.is_char_boundary(safe_loc) {
    safe_loc -= 1;
  }
  safe_loc
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn location_counts_lines_and_columns_from_one() {
    let source = "int main() {\n  return @;\n}";
    let loc = source.find('@').unwrap();
    assert_eq!(Location::of(source, loc), Location { line: 2, column: 10 });
  }

  #[test]
  fn snippet_points_at_offending_byte() {
    let source = "int x;\nreturn 1 $ 2;";
    let err = CompileError::lex_at(source, source.find('$').unwrap(), "illegal character '$'");
    let rendered = err.to_string();
    assert!(rendered.starts_with("2:10: lexical error: illegal character '$'"));
    assert!(rendered.ends_with("return 1 $ 2;\n         ^"));
  }

  #[test]
  fn location_past_end_is_clamped() {
    let source = "int";
    assert_eq!(Location::of(source, 99), Location { line: 1, column: 4 });
  }
}
