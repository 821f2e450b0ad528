//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer knows nothing about grammar beyond recognising punctuators,
//! keywords, identifiers and integer literals. Two-character operators are
//! matched before single-character ones, and characters the language has no
//! use for are rejected rather than skipped.

use std::fmt;

use tracing::debug;

use crate::error::{CompileError, CompileResult};

/// Reserved words. Anything else shaped like an identifier is an `Ident`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
  Int,
  Return,
  If,
  Else,
  For,
  Do,
  While,
  Break,
  Continue,
}

impl Keyword {
  pub fn from_ident(text: &str) -> Option<Self> {
    let keyword = match text {
      "int" => Self::Int,
      "return" => Self::Return,
      "if" => Self::If,
      "else" => Self::Else,
      "for" => Self::For,
      "do" => Self::Do,
      "while" => Self::While,
      "break" => Self::Break,
      "continue" => Self::Continue,
      _ => return None,
    };
    Some(keyword)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Int => "int",
      Self::Return => "return",
      Self::If => "if",
      Self::Else => "else",
      Self::For => "for",
      Self::Do => "do",
      Self::While => "while",
      Self::Break => "break",
      Self::Continue => "continue",
    }
  }
}

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  LParen,
  RParen,
  LBrace,
  RBrace,
  Semicolon,
  Comma,
  Colon,
  Question,
  Assign,
  Plus,
  Minus,
  Star,
  Slash,
  Bang,
  Tilde,
  Lt,
  Le,
  Gt,
  Ge,
  EqEq,
  Ne,
  AndAnd,
  OrOr,
  Keyword(Keyword),
  Ident,
  Num,
  Eof,
}

impl TokenKind {
  fn punctuator(symbol: &str) -> Option<Self> {
    let kind = match symbol {
      "(" => Self::LParen,
      ")" => Self::RParen,
      "{" => Self::LBrace,
      "}" => Self::RBrace,
      ";" => Self::Semicolon,
      "," => Self::Comma,
      ":" => Self::Colon,
      "?" => Self::Question,
      "=" => Self::Assign,
      "+" => Self::Plus,
      "-" => Self::Minus,
      "*" => Self::Star,
      "/" => Self::Slash,
      "!" => Self::Bang,
      "~" => Self::Tilde,
      "<" => Self::Lt,
      "<=" => Self::Le,
      ">" => Self::Gt,
      ">=" => Self::Ge,
      "==" => Self::EqEq,
      "!=" => Self::Ne,
      "&&" => Self::AndAnd,
      "||" => Self::OrOr,
      _ => return None,
    };
    Some(kind)
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Keyword(keyword) => write!(f, "KEYWORD({})", keyword.as_str()),
      other => write!(f, "{}", format!("{other:?}").to_uppercase()),
    }
  }
}

/// Lexical information needed by later stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub text: String,
  pub value: Option<i32>,
  pub loc: usize,
}

impl Token {
  pub fn new(kind: TokenKind, text: impl Into<String>, loc: usize) -> Self {
    Self {
      kind,
      text: text.into(),
      value: None,
      loc,
    }
  }

  fn number(text: String, value: i32, loc: usize) -> Self {
    Self {
      kind: TokenKind::Num,
      text,
      value: Some(value),
      loc,
    }
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} -> {}", self.kind, self.text)
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if !c.is_ascii() {
      let ch = input[i..].chars().next().unwrap_or('\u{FFFD}');
      return Err(CompileError::lex_at(
        input,
        i,
        format!("non-ASCII character '{ch}'"),
      ));
    }

    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if input[i..].starts_with("/*") {
      let body = i + 2;
      let Some(close) = input[body..].find("*/") else {
        return Err(CompileError::lex_at(input, i, "unterminated block comment"));
      };
      i = body + close + 2;
      continue;
    }

    if input[i..].starts_with("//") {
      while i < bytes.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
        i += 1;
      }
      continue;
    }

    if c.is_ascii_alphabetic() {
      let start = i;
      while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
      }
      let text = &input[start..i];
      let kind = Keyword::from_ident(text).map_or(TokenKind::Ident, TokenKind::Keyword);
      tokens.push(Token::new(kind, text, start));
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
        i += 1;
      }
      if i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        let mut end = i;
        while end < bytes.len() && bytes[end].is_ascii_alphanumeric() {
          end += 1;
        }
        return Err(CompileError::lex_at(
          input,
          start,
          format!("malformed token '{}'", &input[start..end]),
        ));
      }
      let text: String = input[start..i].chars().filter(|ch| *ch != '_').collect();
      let value = text.parse::<i32>().map_err(|err| {
        CompileError::lex_at(
          input,
          start,
          format!("integer literal out of range: {err}"),
        )
      })?;
      tokens.push(Token::number(text, value, start));
      continue;
    }

    if let Some(kind) = input.get(i..i + 2).and_then(TokenKind::punctuator) {
      tokens.push(Token::new(kind, &input[i..i + 2], i));
      i += 2;
      continue;
    }

    if let Some(kind) = TokenKind::punctuator(&input[i..=i]) {
      tokens.push(Token::new(kind, &input[i..=i], i));
      i += 1;
      continue;
    }

    let message = match c {
      b'&' => "expected '&&', found a lone '&'".to_string(),
      b'|' => "expected '||', found a lone '|'".to_string(),
      b'`' | b'@' | b'#' | b'$' | b'\\' | b'_' => format!("illegal character '{}'", c as char),
      _ => format!("invalid token: '{}'", c as char),
    };
    return Err(CompileError::lex_at(input, i, message));
  }

  tokens.push(Token::new(TokenKind::Eof, "EOF", input.len()));
  debug!(count = tokens.len(), "tokenized source");
  Ok(tokens)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
      .unwrap()
      .into_iter()
      .map(|token| token.kind)
      .collect()
  }

  #[test]
  fn lexes_minimal_function() {
    assert_eq!(
      kinds("int main() { return 2; }"),
      vec![
        TokenKind::Keyword(Keyword::Int),
        TokenKind::Ident,
        TokenKind::LParen,
        TokenKind::RParen,
        TokenKind::LBrace,
        TokenKind::Keyword(Keyword::Return),
        TokenKind::Num,
        TokenKind::Semicolon,
        TokenKind::RBrace,
        TokenKind::Eof,
      ]
    );
  }

  #[test]
  fn two_character_operators_win_over_single() {
    use TokenKind::*;
    assert_eq!(
      kinds("a<=b>=c==d!=e&&f||!g<h>i=j"),
      vec![
        Ident, Le, Ident, Ge, Ident, EqEq, Ident, Ne, Ident, AndAnd, Ident, OrOr, Bang, Ident, Lt,
        Ident, Gt, Ident, Assign, Ident, Eof,
      ]
    );
  }

  #[test]
  fn keywords_match_exactly() {
    let tokens = tokenize("int integer while whilex _").err();
    assert!(tokens.is_some(), "leading underscore is illegal");

    let tokens = tokenize("int integer while whilex do_it").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Int));
    assert_eq!(tokens[1].kind, TokenKind::Ident);
    assert_eq!(tokens[2].kind, TokenKind::Keyword(Keyword::While));
    assert_eq!(tokens[3].kind, TokenKind::Ident);
    assert_eq!(tokens[4].kind, TokenKind::Ident);
    assert_eq!(tokens[4].text, "do_it");
  }

  #[test]
  fn underscores_are_stripped_from_literals() {
    let tokens = tokenize("1_000_000").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Num);
    assert_eq!(tokens[0].value, Some(1_000_000));
    assert_eq!(tokens[0].text, "1000000");
  }

  #[test]
  fn digit_followed_by_letter_is_malformed() {
    let err = tokenize("int main() { return 12ab; }").unwrap_err();
    assert!(err.to_string().contains("malformed token '12ab'"), "{err}");
  }

  #[test]
  fn out_of_range_literal_is_rejected() {
    let err = tokenize("return 2147483648;").unwrap_err();
    assert!(err.to_string().contains("out of range"), "{err}");
  }

  #[test]
  fn comments_are_skipped() {
    use TokenKind::*;
    assert_eq!(
      kinds("/* a * b */ x /* nested /* */ y // tail\n z // no newline"),
      vec![Ident, Ident, Ident, Eof]
    );
  }

  #[test]
  fn unterminated_block_comment_is_an_error() {
    let err = tokenize("int x; /* never closed").unwrap_err();
    assert!(err.to_string().contains("unterminated block comment"));
  }

  #[test]
  fn rejects_reserved_and_non_ascii_characters() {
    for source in ["a @ b", "#include", "$x", "a \\ b", "`", "x = é;", "a % b"] {
      let err = tokenize(source).unwrap_err();
      assert_eq!(err.stage(), "lexer", "{source}");
    }
  }

  #[test]
  fn lone_ampersand_and_pipe_are_errors() {
    assert!(tokenize("a & b").unwrap_err().to_string().contains("'&&'"));
    assert!(tokenize("a | b").unwrap_err().to_string().contains("'||'"));
  }

  #[test]
  fn eof_token_always_terminates() {
    let tokens = tokenize("   \n\t  ").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
    assert_eq!(tokens[0].loc, 7);
  }

  #[test]
  fn tokens_display_kind_and_text() {
    let tokens = tokenize("return x;").unwrap();
    assert_eq!(tokens[0].to_string(), "KEYWORD(return) -> return");
    assert_eq!(tokens[1].to_string(), "IDENT -> x");
    assert_eq!(tokens[2].to_string(), "SEMICOLON -> ;");
  }

  quickcheck::quickcheck! {
    fn literal_value_survives_separators(value: u32, split: u8) -> bool {
      let value = (value % (i32::MAX as u32)) as i32;
      let digits = value.to_string();
      let cut = (split as usize % digits.len()).max(1).min(digits.len());
      let spelled = if cut < digits.len() {
        format!("{}_{}", &digits[..cut], &digits[cut..])
      } else {
        digits.clone()
      };
      tokenize(&spelled)
        .map(|tokens| tokens[0].value == Some(value))
        .unwrap_or(false)
    }
  }
}
