//! Recursive-descent parser producing a flat, evaluation-ordered node list.
//!
//! Each precedence tier has its own helper that delegates to the next
//! tighter tier for its operands. Instead of building a tree, every helper
//! appends nodes to one output vector in the order a stack machine needs
//! them: operands first, then the operator; control-flow markers around the
//! nodes of their bodies.

use std::ops::Range;

use tracing::debug;

use crate::ast::{BinaryOp, LogicalOp, Node, UnaryOp};
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Keyword, Token, TokenKind};

/// Parse a whole translation unit: a sequence of function declarations.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Vec<Node>> {
  let mut parser = Parser::new(TokenStream::new(tokens, source));

  while !parser.stream.is_eof() {
    parser.parse_function()?;
  }

  debug!(count = parser.nodes.len(), "parsed token stream");
  Ok(parser.nodes)
}

/// Move the post clause of a `for` loop behind the loop body.
///
/// The post clause is parsed before the body but has to run after it on
/// every iteration. `nodes[post]` must be immediately followed by the body,
/// which runs to the end of the slice.
pub fn move_post_clause(nodes: &mut [Node], post: Range<usize>) {
  let len = post.len();
  nodes[post.start..].rotate_left(len);
}

struct Parser<'a> {
  stream: TokenStream<'a>,
  nodes: Vec<Node>,
}

impl<'a> Parser<'a> {
  fn new(stream: TokenStream<'a>) -> Self {
    Self {
      stream,
      nodes: Vec::new(),
    }
  }

  fn emit(&mut self, node: Node) {
    self.nodes.push(node);
  }

  // function := "int" IDENT "(" params? ")" (block | ";")
  fn parse_function(&mut self) -> CompileResult<()> {
    self.stream.skip_keyword(Keyword::Int)?;
    let name = self.stream.get_ident()?;
    self.stream.skip(TokenKind::LParen)?;

    let mut params = Vec::new();
    if !self.stream.equal(TokenKind::RParen) {
      loop {
        self.stream.skip_keyword(Keyword::Int)?;
        params.push(self.stream.get_ident()?);
        if self.stream.equal(TokenKind::RParen) {
          break;
        }
        self.stream.skip(TokenKind::Comma)?;
      }
    }

    let has_body = !self.stream.equal(TokenKind::Semicolon);
    self.emit(Node::Function {
      name,
      arity: params.len(),
      has_body,
    });
    for param in params {
      self.emit(Node::var_decl(param));
    }

    if has_body {
      if !self.stream.at(TokenKind::LBrace) {
        return Err(self.stream.unexpected("expected a function body or ';'"));
      }
      self.parse_block()?;
    }
    Ok(())
  }

  // block := "{" block_item* "}"
  fn parse_block(&mut self) -> CompileResult<()> {
    self.stream.skip(TokenKind::LBrace)?;
    self.emit(Node::BlockOpen);
    while !self.stream.equal(TokenKind::RBrace) {
      if self.stream.is_eof() {
        return Err(self.stream.unexpected("expected \"}\" before end of input"));
      }
      self.parse_block_item()?;
    }
    self.emit(Node::BlockClose);
    Ok(())
  }

  fn parse_block_item(&mut self) -> CompileResult<()> {
    if self.stream.at_keyword(Keyword::Int) {
      self.parse_declaration(false)
    } else {
      self.parse_stmt()
    }
  }

  // declaration := "int" IDENT ("=" expression)? ";"
  fn parse_declaration(&mut self, require_init: bool) -> CompileResult<()> {
    self.stream.skip_keyword(Keyword::Int)?;
    let name = self.stream.get_ident()?;
    self.emit(Node::var_decl(name.clone()));

    if self.stream.equal(TokenKind::Assign) {
      self.parse_expr()?;
      self.emit(Node::assign(name));
      self.emit(Node::Discard);
    } else if require_init {
      return Err(self.stream.unexpected("expected \"=\" initializer"));
    }

    self.stream.skip(TokenKind::Semicolon)
  }

  fn parse_stmt(&mut self) -> CompileResult<()> {
    let Some(kind) = self.stream.peek_kind(0) else {
      return Err(self.stream.unexpected("expected a statement"));
    };

    match kind {
      TokenKind::LBrace => self.parse_block(),
      TokenKind::Semicolon => {
        self.stream.advance();
        Ok(())
      }
      TokenKind::Keyword(Keyword::Return) => {
        self.stream.advance();
        self.parse_expr()?;
        self.stream.skip(TokenKind::Semicolon)?;
        self.emit(Node::Return);
        Ok(())
      }
      TokenKind::Keyword(Keyword::If) => self.parse_if(),
      TokenKind::Keyword(Keyword::While) => self.parse_while(),
      TokenKind::Keyword(Keyword::Do) => self.parse_do_while(),
      TokenKind::Keyword(Keyword::For) => self.parse_for(),
      TokenKind::Keyword(Keyword::Break) => {
        self.stream.advance();
        self.stream.skip(TokenKind::Semicolon)?;
        self.emit(Node::Break);
        Ok(())
      }
      TokenKind::Keyword(Keyword::Continue) => {
        self.stream.advance();
        self.stream.skip(TokenKind::Semicolon)?;
        self.emit(Node::Continue);
        Ok(())
      }
      _ => {
        self.parse_expr()?;
        self.stream.skip(TokenKind::Semicolon)?;
        self.emit(Node::Discard);
        Ok(())
      }
    }
  }

  // "if" "(" expression ")" stmt ("else" stmt)?
  //
  // A dangling else binds to the nearest if: the recursive call for the
  // then-branch consumes it first.
  fn parse_if(&mut self) -> CompileResult<()> {
    self.stream.skip_keyword(Keyword::If)?;
    self.parse_paren_expr()?;
    self.emit(Node::IfCondition);
    self.parse_stmt()?;
    self.emit(Node::IfBody);
    if self.stream.equal(TokenKind::Keyword(Keyword::Else)) {
      self.parse_stmt()?;
    }
    self.emit(Node::IfEnd);
    Ok(())
  }

  fn parse_while(&mut self) -> CompileResult<()> {
    self.stream.skip_keyword(Keyword::While)?;
    self.emit(Node::LoopLabel);
    self.parse_paren_expr()?;
    self.emit(Node::LoopTest);
    self.parse_stmt()?;
    self.emit(Node::LoopNext);
    self.emit(Node::LoopEnd);
    Ok(())
  }

  fn parse_do_while(&mut self) -> CompileResult<()> {
    self.stream.skip_keyword(Keyword::Do)?;
    self.emit(Node::LoopLabel);
    self.parse_stmt()?;
    self.emit(Node::LoopNext);
    self.stream.skip_keyword(Keyword::While)?;
    self.parse_paren_expr()?;
    self.stream.skip(TokenKind::Semicolon)?;
    self.emit(Node::LoopTest);
    self.emit(Node::LoopEnd);
    Ok(())
  }

  // "for" "(" (declaration | expression? ";") expression? ";" expression? ")" stmt
  fn parse_for(&mut self) -> CompileResult<()> {
    self.stream.skip_keyword(Keyword::For)?;
    self.stream.skip(TokenKind::LParen)?;

    // A declared counter lives in its own scope around the whole loop.
    let scoped = self.stream.at_keyword(Keyword::Int);
    if scoped {
      self.emit(Node::BlockOpen);
      self.parse_declaration(true)?;
    } else {
      self.parse_optional_expr_stmt(TokenKind::Semicolon)?;
    }

    self.emit(Node::LoopLabel);
    if !self.stream.at(TokenKind::Semicolon) {
      self.parse_expr()?;
      self.emit(Node::LoopTest);
    }
    self.stream.skip(TokenKind::Semicolon)?;

    let post_start = self.nodes.len();
    self.emit(Node::LoopNext);
    self.parse_optional_expr_stmt(TokenKind::RParen)?;
    let post = post_start..self.nodes.len();

    self.parse_stmt()?;
    move_post_clause(&mut self.nodes, post);
    self.emit(Node::LoopEnd);

    if scoped {
      self.emit(Node::BlockClose);
    }
    Ok(())
  }

  /// An optional expression whose value is dropped, closed by `terminator`.
  fn parse_optional_expr_stmt(&mut self, terminator: TokenKind) -> CompileResult<()> {
    if !self.stream.equal(terminator) {
      self.parse_expr()?;
      self.emit(Node::Discard);
      self.stream.skip(terminator)?;
    }
    Ok(())
  }

  fn parse_paren_expr(&mut self) -> CompileResult<()> {
    self.stream.skip(TokenKind::LParen)?;
    self.parse_expr()?;
    self.stream.skip(TokenKind::RParen)
  }

  // expression := IDENT "=" expression | conditional
  fn parse_expr(&mut self) -> CompileResult<()> {
    let is_assignment = self.stream.peek_kind(0) == Some(TokenKind::Ident)
      && self.stream.peek_kind(1) == Some(TokenKind::Assign);

    if is_assignment {
      let name = self.stream.get_ident()?;
      self.stream.skip(TokenKind::Assign)?;
      self.parse_expr()?;
      self.emit(Node::assign(name));
      return Ok(());
    }

    self.parse_conditional()
  }

  // conditional := logical_or ("?" expression ":" conditional)?
  fn parse_conditional(&mut self) -> CompileResult<()> {
    self.parse_logical_or()?;

    if self.stream.equal(TokenKind::Question) {
      self.emit(Node::TernaryQuestion);
      self.parse_expr()?;
      self.stream.skip(TokenKind::Colon)?;
      self.emit(Node::TernaryColon);
      self.parse_conditional()?;
      self.emit(Node::TernaryEnd);
    }

    Ok(())
  }

  fn parse_logical_or(&mut self) -> CompileResult<()> {
    self.parse_logical_and()?;

    while self.stream.equal(TokenKind::OrOr) {
      self.emit(Node::LogicalTest(LogicalOp::Or));
      self.parse_logical_and()?;
      self.emit(Node::Logical(LogicalOp::Or));
    }

    Ok(())
  }

  fn parse_logical_and(&mut self) -> CompileResult<()> {
    self.parse_equality()?;

    while self.stream.equal(TokenKind::AndAnd) {
      self.emit(Node::LogicalTest(LogicalOp::And));
      self.parse_equality()?;
      self.emit(Node::Logical(LogicalOp::And));
    }

    Ok(())
  }

  fn parse_equality(&mut self) -> CompileResult<()> {
    self.parse_relational()?;

    loop {
      let op = match self.stream.peek_kind(0) {
        Some(TokenKind::EqEq) => BinaryOp::Eq,
        Some(TokenKind::Ne) => BinaryOp::Ne,
        _ => break,
      };

      self.stream.advance();
      self.parse_relational()?;
      self.emit(Node::Binary(op));
    }

    Ok(())
  }

  fn parse_relational(&mut self) -> CompileResult<()> {
    self.parse_add()?;

    loop {
      let op = match self.stream.peek_kind(0) {
        Some(TokenKind::Lt) => BinaryOp::Lt,
        Some(TokenKind::Le) => BinaryOp::Le,
        Some(TokenKind::Gt) => BinaryOp::Gt,
        Some(TokenKind::Ge) => BinaryOp::Ge,
        _ => break,
      };

      self.stream.advance();
      self.parse_add()?;
      self.emit(Node::Binary(op));
    }

    Ok(())
  }

  fn parse_add(&mut self) -> CompileResult<()> {
    self.parse_mul()?;

    loop {
      let op = match self.stream.peek_kind(0) {
        Some(TokenKind::Plus) => BinaryOp::Add,
        Some(TokenKind::Minus) => BinaryOp::Sub,
        _ => break,
      };

      self.stream.advance();
      self.parse_mul()?;
      self.emit(Node::Binary(op));
    }

    Ok(())
  }

  fn parse_mul(&mut self) -> CompileResult<()> {
    self.parse_factor()?;

    loop {
      let op = match self.stream.peek_kind(0) {
        Some(TokenKind::Star) => BinaryOp::Mul,
        Some(TokenKind::Slash) => BinaryOp::Div,
        _ => break,
      };

      self.stream.advance();
      self.parse_factor()?;
      self.emit(Node::Binary(op));
    }

    Ok(())
  }

  // factor := INT | IDENT | IDENT "(" args? ")" | unary_op factor | "(" expression ")"
  fn parse_factor(&mut self) -> CompileResult<()> {
    let unary = match self.stream.peek_kind(0) {
      Some(TokenKind::Minus) => Some(UnaryOp::Neg),
      Some(TokenKind::Bang) => Some(UnaryOp::Not),
      Some(TokenKind::Tilde) => Some(UnaryOp::Complement),
      _ => None,
    };
    if let Some(op) = unary {
      self.stream.advance();
      self.parse_factor()?;
      self.emit(Node::Unary(op));
      return Ok(());
    }

    if self.stream.equal(TokenKind::LParen) {
      self.parse_expr()?;
      return self.stream.skip(TokenKind::RParen);
    }

    if self.stream.peek_kind(0) == Some(TokenKind::Ident) {
      let name = self.stream.get_ident()?;
      if self.stream.equal(TokenKind::LParen) {
        let argc = self.parse_call_args()?;
        self.emit(Node::call(name, argc));
      } else {
        self.emit(Node::var_ref(name));
      }
      return Ok(());
    }

    let value = self.stream.get_number()?;
    self.emit(Node::Constant(value));
    Ok(())
  }

  /// Argument expressions in source order; the opening parenthesis is
  /// already consumed.
  fn parse_call_args(&mut self) -> CompileResult<usize> {
    let mut argc = 0;
    if self.stream.equal(TokenKind::RParen) {
      return Ok(argc);
    }

    loop {
      self.parse_expr()?;
      argc += 1;
      if self.stream.equal(TokenKind::RParen) {
        return Ok(argc);
      }
      self.stream.skip(TokenKind::Comma)?;
    }
  }
}

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  /// Take ownership of the token stream; the parser will advance `pos` as it consumes input.
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Kind of the token `offset` positions ahead, without consuming anything.
  fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
    self.tokens.get(self.pos + offset).map(|token| token.kind)
  }

  fn advance(&mut self) {
    if self.pos < self.tokens.len() {
      self.pos += 1;
    }
  }

  fn at(&self, kind: TokenKind) -> bool {
    self.peek_kind(0) == Some(kind)
  }

  fn at_keyword(&self, keyword: Keyword) -> bool {
    self.at(TokenKind::Keyword(keyword))
  }

  /// Consume the current token if it has the given kind.
  fn equal(&mut self, kind: TokenKind) -> bool {
    if self.at(kind) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, kind: TokenKind) -> CompileResult<()> {
    if self.equal(kind) {
      Ok(())
    } else {
      Err(self.unexpected(format!("expected {}", expected_text(kind))))
    }
  }

  fn skip_keyword(&mut self, keyword: Keyword) -> CompileResult<()> {
    self.skip(TokenKind::Keyword(keyword))
  }

  /// Error pointing at the current token. The end-of-input sentinel spells
  /// itself `EOF`.
  fn unexpected(&self, expected: impl Into<String>) -> CompileError {
    let (loc, got) = self
      .peek()
      .map_or((self.source.len(), "EOF"), |token| (token.loc, token.text.as_str()));
    CompileError::syntax_at(
      self.source,
      loc,
      format!("{}, but got \"{got}\"", expected.into()),
    )
  }

  /// Parse the current token as an integer literal.
  fn get_number(&mut self) -> CompileResult<i32> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Num
    {
      let value = token.value.ok_or_else(|| {
        CompileError::syntax_at(
          self.source,
          token.loc,
          "internal error: numeric token missing value",
        )
      })?;
      self.pos += 1;
      return Ok(value);
    }

    Err(self.unexpected("expected an expression"))
  }

  /// Parse the current token as an identifier.
  fn get_ident(&mut self) -> CompileResult<String> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Ident
    {
      let name = token.text.clone();
      self.pos += 1;
      return Ok(name);
    }

    Err(self.unexpected("expected an identifier"))
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek_kind(0), Some(TokenKind::Eof) | None)
  }
}

fn expected_text(kind: TokenKind) -> String {
  let text = match kind {
    TokenKind::LParen => "(",
    TokenKind::RParen => ")",
    TokenKind::LBrace => "{",
    TokenKind::RBrace => "}",
    TokenKind::Semicolon => ";",
    TokenKind::Comma => ",",
    TokenKind::Colon => ":",
    TokenKind::Assign => "=",
    TokenKind::Keyword(keyword) => keyword.as_str(),
    TokenKind::Ident => return "an identifier".to_string(),
    other => return other.to_string(),
  };
  format!("\"{text}\"")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer::tokenize;

  fn parse_src(source: &str) -> CompileResult<Vec<Node>> {
    parse(tokenize(source)?, source)
  }

  /// Nodes of `main`'s body, without the function header and outer braces.
  fn body(source: &str) -> Vec<Node> {
    let src = format!("int main() {{ {source} }}");
    let nodes = parse_src(&src).unwrap();
    nodes[2..nodes.len() - 1].to_vec()
  }

  fn c(value: i32) -> Node {
    Node::Constant(value)
  }

  fn v(name: &str) -> Node {
    Node::var_ref(name)
  }

  #[test]
  fn parses_return_constant() {
    assert_eq!(
      parse_src("int main() { return 2; }").unwrap(),
      vec![
        Node::Function {
          name: "main".into(),
          arity: 0,
          has_body: true,
        },
        Node::BlockOpen,
        c(2),
        Node::Return,
        Node::BlockClose,
      ]
    );
  }

  #[test]
  fn precedence_orders_operands_before_operators() {
    assert_eq!(
      body("return 1 + 2 * 3 - 4;"),
      vec![
        c(1),
        c(2),
        c(3),
        Node::Binary(BinaryOp::Mul),
        Node::Binary(BinaryOp::Add),
        c(4),
        Node::Binary(BinaryOp::Sub),
        Node::Return,
      ]
    );
  }

  #[test]
  fn comparison_binds_looser_than_arithmetic() {
    assert_eq!(
      body("return 1 < 2 + 3 == 0;"),
      vec![
        c(1),
        c(2),
        c(3),
        Node::Binary(BinaryOp::Add),
        Node::Binary(BinaryOp::Lt),
        c(0),
        Node::Binary(BinaryOp::Eq),
        Node::Return,
      ]
    );
  }

  #[test]
  fn unary_operators_nest() {
    assert_eq!(
      body("return -~!(1);"),
      vec![
        c(1),
        Node::Unary(UnaryOp::Not),
        Node::Unary(UnaryOp::Complement),
        Node::Unary(UnaryOp::Neg),
        Node::Return,
      ]
    );
  }

  #[test]
  fn logical_operators_test_left_operand_first() {
    assert_eq!(
      body("return 1 || 0 && 2;"),
      vec![
        c(1),
        Node::LogicalTest(LogicalOp::Or),
        c(0),
        Node::LogicalTest(LogicalOp::And),
        c(2),
        Node::Logical(LogicalOp::And),
        Node::Logical(LogicalOp::Or),
        Node::Return,
      ]
    );
  }

  #[test]
  fn assignment_is_right_associative() {
    assert_eq!(
      body("int a; int b; a = b = 3;"),
      vec![
        Node::var_decl("a"),
        Node::var_decl("b"),
        c(3),
        Node::assign("b"),
        Node::assign("a"),
        Node::Discard,
      ]
    );
  }

  #[test]
  fn identifier_without_equals_is_an_expression() {
    assert_eq!(
      body("int a; a == 1;"),
      vec![
        Node::var_decl("a"),
        v("a"),
        c(1),
        Node::Binary(BinaryOp::Eq),
        Node::Discard,
      ]
    );
  }

  #[test]
  fn declaration_initializer_is_an_assignment() {
    assert_eq!(
      body("int a = 1;"),
      vec![Node::var_decl("a"), c(1), Node::assign("a"), Node::Discard]
    );
  }

  #[test]
  fn ternary_is_right_associative() {
    assert_eq!(
      body("return 1 ? 2 : 3 ? 4 : 5;"),
      vec![
        c(1),
        Node::TernaryQuestion,
        c(2),
        Node::TernaryColon,
        c(3),
        Node::TernaryQuestion,
        c(4),
        Node::TernaryColon,
        c(5),
        Node::TernaryEnd,
        Node::TernaryEnd,
        Node::Return,
      ]
    );
  }

  #[test]
  fn dangling_else_binds_to_nearest_if() {
    assert_eq!(
      body("if (1) if (2) return 3; else return 4;"),
      vec![
        c(1),
        Node::IfCondition,
        c(2),
        Node::IfCondition,
        c(3),
        Node::Return,
        Node::IfBody,
        c(4),
        Node::Return,
        Node::IfEnd,
        Node::IfBody,
        Node::IfEnd,
      ]
    );
  }

  #[test]
  fn while_loop_layout() {
    assert_eq!(
      body("while (1) break;"),
      vec![
        Node::LoopLabel,
        c(1),
        Node::LoopTest,
        Node::Break,
        Node::LoopNext,
        Node::LoopEnd,
      ]
    );
  }

  #[test]
  fn do_while_tests_after_body() {
    assert_eq!(
      body("do continue; while (0);"),
      vec![
        Node::LoopLabel,
        Node::Continue,
        Node::LoopNext,
        c(0),
        Node::LoopTest,
        Node::LoopEnd,
      ]
    );
  }

  #[test]
  fn for_post_clause_moves_after_body() {
    assert_eq!(
      body("for (int i = 0; i < 3; i = i + 1) i;"),
      vec![
        Node::BlockOpen,
        Node::var_decl("i"),
        c(0),
        Node::assign("i"),
        Node::Discard,
        Node::LoopLabel,
        v("i"),
        c(3),
        Node::Binary(BinaryOp::Lt),
        Node::LoopTest,
        v("i"),
        Node::Discard,
        Node::LoopNext,
        v("i"),
        c(1),
        Node::Binary(BinaryOp::Add),
        Node::assign("i"),
        Node::Discard,
        Node::LoopEnd,
        Node::BlockClose,
      ]
    );
  }

  #[test]
  fn empty_for_clauses_omit_their_nodes() {
    assert_eq!(
      body("for (;;) break;"),
      vec![Node::LoopLabel, Node::Break, Node::LoopNext, Node::LoopEnd]
    );
  }

  #[test]
  fn for_declaration_requires_initializer() {
    let err = parse_src("int main() { for (int i; i < 3;) ; }").unwrap_err();
    assert!(err.to_string().contains("expected \"=\" initializer"), "{err}");
  }

  #[test]
  fn move_post_clause_rotates_range_behind_tail() {
    let mut nodes = vec![c(0), c(1), c(2), c(3), c(4)];
    move_post_clause(&mut nodes, 1..3);
    assert_eq!(nodes, vec![c(0), c(3), c(4), c(1), c(2)]);
  }

  #[test]
  fn call_arguments_precede_call() {
    assert_eq!(
      body("return add(1, 2 + 3, f());"),
      vec![
        c(1),
        c(2),
        c(3),
        Node::Binary(BinaryOp::Add),
        Node::call("f", 0),
        Node::call("add", 3),
        Node::Return,
      ]
    );
  }

  #[test]
  fn parameters_become_declarations() {
    assert_eq!(
      parse_src("int add(int a, int b); int f() { return 0; }").unwrap()[..3],
      [
        Node::Function {
          name: "add".into(),
          arity: 2,
          has_body: false,
        },
        Node::var_decl("a"),
        Node::var_decl("b"),
      ]
    );
  }

  #[test]
  fn break_outside_loop_is_accepted_syntactically() {
    assert_eq!(body("break;"), vec![Node::Break]);
  }

  #[test]
  fn empty_statement_produces_nothing() {
    assert_eq!(body(";;"), Vec::<Node>::new());
  }

  #[test]
  fn reports_offending_token() {
    let err = parse_src("int main() { return 2 }").unwrap_err();
    assert_eq!(err.stage(), "parser");
    assert!(
      err.to_string().contains("expected \";\", but got \"}\""),
      "{err}"
    );

    let err = parse_src("int main() { return; }").unwrap_err();
    assert!(err.to_string().contains("expected an expression"), "{err}");

    let err = parse_src("int main(int) { return 0; }").unwrap_err();
    assert!(err.to_string().contains("expected an identifier"), "{err}");

    let err = parse_src("int main() { return 0;").unwrap_err();
    assert!(err.to_string().contains("but got \"EOF\""), "{err}");

    let err = parse_src("return 0;").unwrap_err();
    assert!(err.to_string().contains("expected \"int\""), "{err}");
  }
}
