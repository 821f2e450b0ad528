//! Flat AST: the parser's output and the code generator's input.
//!
//! Nodes are stored in evaluation order rather than as a tree. Operands come
//! before the operator that consumes them, and control-flow markers bracket
//! the nodes of their bodies, so a single forward pass is enough to emit
//! stack-machine code.

use std::fmt;

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Neg,
  Not,
  Complement,
}

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
}

/// Short-circuit operators. The left operand is tested by a
/// [`Node::LogicalTest`] before the right operand is evaluated, and a
/// [`Node::Logical`] joins both paths after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
  And,
  Or,
}

impl LogicalOp {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::And => "&&",
      Self::Or => "||",
    }
  }
}

impl UnaryOp {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::Neg => "-",
      Self::Not => "!",
      Self::Complement => "~",
    }
  }
}

impl BinaryOp {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::Add => "+",
      Self::Sub => "-",
      Self::Mul => "*",
      Self::Div => "/",
      Self::Eq => "==",
      Self::Ne => "!=",
      Self::Lt => "<",
      Self::Le => "<=",
      Self::Gt => ">",
      Self::Ge => ">=",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
  /// Function header. Followed by `arity` [`Node::VarDecl`] parameters and,
  /// when `has_body` is set, a `BlockOpen` .. `BlockClose` body.
  Function {
    name: String,
    arity: usize,
    has_body: bool,
  },
  VarDecl {
    name: String,
  },
  Return,
  BlockOpen,
  BlockClose,
  /// Drops the value left by an expression statement.
  Discard,

  LoopLabel,
  LoopTest,
  /// Target of `continue`; the post clause of a `for` follows it.
  LoopNext,
  LoopEnd,
  Break,
  Continue,

  IfCondition,
  IfBody,
  IfEnd,

  Constant(i32),
  VarRef {
    name: String,
  },
  Assign {
    name: String,
  },
  Unary(UnaryOp),
  Binary(BinaryOp),
  LogicalTest(LogicalOp),
  Logical(LogicalOp),
  TernaryQuestion,
  TernaryColon,
  TernaryEnd,
  Call {
    name: String,
    argc: usize,
  },
}

impl Node {
  pub fn var_decl(name: impl Into<String>) -> Self {
    Self::VarDecl { name: name.into() }
  }

  pub fn var_ref(name: impl Into<String>) -> Self {
    Self::VarRef { name: name.into() }
  }

  pub fn assign(name: impl Into<String>) -> Self {
    Self::Assign { name: name.into() }
  }

  pub fn call(name: impl Into<String>, argc: usize) -> Self {
    Self::Call {
      name: name.into(),
      argc,
    }
  }
}

impl fmt::Display for Node {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Function {
        name,
        arity,
        has_body,
      } => {
        let kind = if *has_body { "definition" } else { "prototype" };
        write!(f, "function {name}/{arity} ({kind})")
      }
      Self::VarDecl { name } => write!(f, "declare {name}"),
      Self::Return => f.write_str("return"),
      Self::BlockOpen => f.write_str("block_open"),
      Self::BlockClose => f.write_str("block_close"),
      Self::Discard => f.write_str("discard"),
      Self::LoopLabel => f.write_str("loop_label"),
      Self::LoopTest => f.write_str("loop_test"),
      Self::LoopNext => f.write_str("loop_next"),
      Self::LoopEnd => f.write_str("loop_end"),
      Self::Break => f.write_str("break"),
      Self::Continue => f.write_str("continue"),
      Self::IfCondition => f.write_str("if_condition"),
      Self::IfBody => f.write_str("if_body"),
      Self::IfEnd => f.write_str("if_end"),
      Self::Constant(value) => write!(f, "constant {value}"),
      Self::VarRef { name } => write!(f, "load {name}"),
      Self::Assign { name } => write!(f, "store {name}"),
      Self::Unary(op) => write!(f, "unary {}", op.symbol()),
      Self::Binary(op) => write!(f, "binary {}", op.symbol()),
      Self::LogicalTest(op) => write!(f, "test {}", op.symbol()),
      Self::Logical(op) => write!(f, "logical {}", op.symbol()),
      Self::TernaryQuestion => f.write_str("ternary_question"),
      Self::TernaryColon => f.write_str("ternary_colon"),
      Self::TernaryEnd => f.write_str("ternary_end"),
      Self::Call { name, argc } => write!(f, "call {name}/{argc}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_is_one_line_per_node() {
    let nodes = [
      Node::Function {
        name: "main".into(),
        arity: 0,
        has_body: true,
      },
      Node::BlockOpen,
      Node::Constant(2),
      Node::LogicalTest(LogicalOp::Or),
      Node::var_ref("a"),
      Node::Logical(LogicalOp::Or),
      Node::Binary(BinaryOp::Add),
      Node::call("f", 1),
      Node::Return,
    ];
    let rendered: Vec<String> = nodes.iter().map(Node::to_string).collect();
    assert_eq!(
      rendered,
      [
        "function main/0 (definition)",
        "block_open",
        "constant 2",
        "test ||",
        "load a",
        "logical ||",
        "binary +",
        "call f/1",
        "return",
      ]
    );
  }
}
