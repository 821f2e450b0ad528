//! Code generation: lower the flat node list into 32-bit x86 assembly.
//!
//! The emitter is a stack machine. Every expression pushes exactly one value
//! and consumers pop their operands, so statements leave the stack balanced.
//! Locals are pushed onto the frame as they are declared and addressed
//! relative to `ebp`; closing a block pops them again. Output uses GNU as
//! Intel syntax.

use std::collections::HashMap;

use snafu::{OptionExt, ensure};
use tracing::{debug, trace};

use crate::ast::{BinaryOp, LogicalOp, Node, UnaryOp};
use crate::error::{
  ArityMismatchSnafu, BreakOutsideLoopSnafu, CompileResult, ConflictingDeclarationSnafu,
  ContinueOutsideLoopSnafu, DuplicateFunctionSnafu, DuplicateVariableSnafu, MalformedNodesSnafu,
  ReservedFunctionNameSnafu, UndefinedFunctionSnafu, UndefinedVariableSnafu,
};

const WORD: i32 = 4;

/// Names the assembler reads as registers or operand keywords, whatever
/// their case.
const RESERVED_SYMBOLS: &[&str] = &[
  "eax", "ebx", "ecx", "edx", "esi", "edi", "esp", "ebp", "eip", "ax", "bx", "cx", "dx", "si",
  "di", "sp", "bp", "al", "ah", "bl", "bh", "cl", "ch", "dl", "dh", "cs", "ds", "es", "fs", "gs",
  "ss", "st", "byte", "word", "dword", "qword", "ptr", "offset",
];

/// Emit assembly for a whole translation unit.
pub fn generate(nodes: &[Node]) -> CompileResult<String> {
  let mut state = CodegenState::new();
  for node in nodes {
    trace!(%node, "lowering node");
    state.emit_node(node)?;
  }
  state.finish()
}

/// A local variable or parameter and its frame offset from `ebp`.
#[derive(Debug, Clone)]
struct Slot {
  name: String,
  offset: i32,
}

/// Labels of one loop. `locals` is the number of live locals when the loop
/// was entered; `break` and `continue` pop anything declared since.
#[derive(Debug, Clone, Copy)]
struct LoopLabels {
  head: usize,
  next: usize,
  locals: usize,
}

impl LoopLabels {
  fn head(&self) -> String {
    format!("label{}", self.head)
  }

  fn next(&self) -> String {
    format!("label{}", self.next)
  }

  fn end(&self) -> String {
    format!("end_label{}", self.head)
  }
}

/// Labels of a two-way branch: `alt` is taken when the test fails, `end`
/// joins both paths.
#[derive(Debug, Clone, Copy)]
struct BranchLabels {
  id: usize,
}

impl BranchLabels {
  fn alt(&self) -> String {
    format!("label{}", self.id)
  }

  fn end(&self) -> String {
    format!("end_label{}", self.id)
  }
}

/// Open control-flow constructs, innermost last.
#[derive(Debug, Clone, Copy)]
enum Pending {
  Loop(LoopLabels),
  If(BranchLabels),
  Ternary(BranchLabels),
  Logical(LogicalOp, BranchLabels),
}

#[derive(Debug, Clone, Copy)]
struct Signature {
  arity: usize,
  defined: bool,
}

/// The function whose nodes are currently being lowered.
#[derive(Debug)]
struct FunctionCtx {
  name: String,
  arity: usize,
  has_body: bool,
  params_seen: usize,
  awaiting_body: bool,
}

struct CodegenState {
  asm: String,
  symbols: Vec<Slot>,
  scopes: Vec<usize>,
  locals: usize,
  next_label: usize,
  pending: Vec<Pending>,
  functions: HashMap<String, Signature>,
  /// Calls made before their callee was declared, checked once the whole
  /// unit has been seen.
  forward_calls: Vec<(String, usize)>,
  function: Option<FunctionCtx>,
}

impl CodegenState {
  fn new() -> Self {
    let mut asm = String::new();
    asm.push_str(".intel_syntax noprefix\n");
    asm.push_str(".text\n");
    Self {
      asm,
      symbols: Vec::new(),
      scopes: Vec::new(),
      locals: 0,
      next_label: 0,
      pending: Vec::new(),
      functions: HashMap::new(),
      forward_calls: Vec::new(),
      function: None,
    }
  }

  fn finish(self) -> CompileResult<String> {
    ensure!(
      self.pending.is_empty() && self.scopes.is_empty(),
      MalformedNodesSnafu {
        message: "input ended inside an open block or control-flow construct",
      }
    );
    if let Some(function) = &self.function {
      ensure!(
        function.params_seen == function.arity && !function.awaiting_body,
        MalformedNodesSnafu {
          message: format!("function '{}' is missing parameters or body", function.name),
        }
      );
    }
    for (name, argc) in &self.forward_calls {
      let signature = self
        .functions
        .get(name)
        .context(UndefinedFunctionSnafu { name })?;
      ensure!(
        signature.arity == *argc,
        ArityMismatchSnafu {
          name,
          expected: signature.arity,
          found: *argc,
        }
      );
    }
    debug!(lines = self.asm.lines().count(), "generated assembly");
    Ok(self.asm)
  }

  fn ins(&mut self, instruction: &str) {
    self.asm.push_str("    ");
    self.asm.push_str(instruction);
    self.asm.push('\n');
  }

  fn define(&mut self, label: &str) {
    self.asm.push_str(label);
    self.asm.push_str(":\n");
  }

  fn alloc_label(&mut self) -> usize {
    let id = self.next_label;
    self.next_label += 1;
    id
  }

  fn function_name(&self) -> String {
    self
      .function
      .as_ref()
      .map_or_else(String::new, |function| function.name.clone())
  }

  fn emit_node(&mut self, node: &Node) -> CompileResult<()> {
    match node {
      Node::Function {
        name,
        arity,
        has_body,
      } => self.emit_function(name, *arity, *has_body),
      Node::VarDecl { name } => self.emit_declaration(name),
      Node::BlockOpen => self.open_scope(),
      Node::BlockClose => self.close_scope(),
      Node::Return => {
        self.in_body("return")?;
        self.ins("pop eax");
        self.emit_epilogue();
        Ok(())
      }
      Node::Discard => {
        self.ins("pop eax");
        Ok(())
      }

      Node::LoopLabel => {
        let labels = LoopLabels {
          head: self.alloc_label(),
          next: self.alloc_label(),
          locals: self.locals,
        };
        self.pending.push(Pending::Loop(labels));
        self.define(&labels.head());
        Ok(())
      }
      Node::LoopTest => {
        let labels = self.innermost_loop("loop test")?;
        self.emit_branch_if_zero(&labels.end());
        Ok(())
      }
      Node::LoopNext => {
        let labels = self.innermost_loop("loop continue target")?;
        self.define(&labels.next());
        Ok(())
      }
      Node::LoopEnd => {
        let Some(Pending::Loop(labels)) = self.pending.pop() else {
          return MalformedNodesSnafu {
            message: "loop end without a matching loop label",
          }
          .fail();
        };
        self.ins(&format!("jmp {}", labels.head()));
        self.define(&labels.end());
        Ok(())
      }
      Node::Break => {
        let labels = self
          .enclosing_loop()
          .with_context(|| BreakOutsideLoopSnafu {
            function: self.function_name(),
          })?;
        self.unwind_to(labels.locals);
        self.ins(&format!("jmp {}", labels.end()));
        Ok(())
      }
      Node::Continue => {
        let labels = self
          .enclosing_loop()
          .with_context(|| ContinueOutsideLoopSnafu {
            function: self.function_name(),
          })?;
        self.unwind_to(labels.locals);
        self.ins(&format!("jmp {}", labels.next()));
        Ok(())
      }

      Node::IfCondition => {
        let labels = BranchLabels {
          id: self.alloc_label(),
        };
        self.emit_branch_if_zero(&labels.alt());
        self.pending.push(Pending::If(labels));
        Ok(())
      }
      Node::IfBody => {
        let Some(Pending::If(labels)) = self.pending.last().copied() else {
          return MalformedNodesSnafu {
            message: "if body without a matching condition",
          }
          .fail();
        };
        self.ins(&format!("jmp {}", labels.end()));
        self.define(&labels.alt());
        Ok(())
      }
      Node::IfEnd => {
        let Some(Pending::If(labels)) = self.pending.pop() else {
          return MalformedNodesSnafu {
            message: "if end without a matching condition",
          }
          .fail();
        };
        self.define(&labels.end());
        Ok(())
      }

      Node::TernaryQuestion => {
        let labels = BranchLabels {
          id: self.alloc_label(),
        };
        self.emit_branch_if_zero(&labels.alt());
        self.pending.push(Pending::Ternary(labels));
        Ok(())
      }
      Node::TernaryColon => {
        let Some(Pending::Ternary(labels)) = self.pending.last().copied() else {
          return MalformedNodesSnafu {
            message: "':' without a matching '?'",
          }
          .fail();
        };
        self.ins(&format!("jmp {}", labels.end()));
        self.define(&labels.alt());
        Ok(())
      }
      Node::TernaryEnd => {
        let Some(Pending::Ternary(labels)) = self.pending.pop() else {
          return MalformedNodesSnafu {
            message: "conditional end without a matching '?'",
          }
          .fail();
        };
        self.define(&labels.end());
        Ok(())
      }

      Node::Constant(value) => {
        self.ins(&format!("mov eax, {value}"));
        self.ins("push eax");
        Ok(())
      }
      Node::VarRef { name } => {
        let offset = self.lookup(name)?;
        self.ins(&format!("mov eax, {}", frame_operand(offset)));
        self.ins("push eax");
        Ok(())
      }
      Node::Assign { name } => {
        let offset = self.lookup(name)?;
        self.ins("pop eax");
        self.ins(&format!("mov {}, eax", frame_operand(offset)));
        self.ins("push eax");
        Ok(())
      }
      Node::Unary(op) => {
        self.emit_unary(*op);
        Ok(())
      }
      Node::LogicalTest(op) => {
        let labels = BranchLabels {
          id: self.alloc_label(),
        };
        self.ins("pop eax");
        self.ins("cmp eax, 0");
        // `&&` is decided by a false left operand, `||` by a true one.
        let jump = match op {
          LogicalOp::And => "je",
          LogicalOp::Or => "jne",
        };
        self.ins(&format!("{jump} {}", labels.alt()));
        self.pending.push(Pending::Logical(*op, labels));
        Ok(())
      }
      Node::Logical(op) => self.emit_logical_result(*op),
      Node::Binary(op) => {
        self.emit_binary(*op);
        Ok(())
      }
      Node::Call { name, argc } => self.emit_call(name, *argc),
    }
  }

  fn emit_function(&mut self, name: &str, arity: usize, has_body: bool) -> CompileResult<()> {
    ensure!(
      self.scopes.is_empty() && self.pending.is_empty(),
      MalformedNodesSnafu {
        message: format!("function '{name}' starts inside another function"),
      }
    );
    ensure!(!is_reserved_symbol(name), ReservedFunctionNameSnafu { name });

    match self.functions.get_mut(name) {
      Some(signature) => {
        ensure!(
          signature.arity == arity,
          ConflictingDeclarationSnafu {
            name,
            expected: signature.arity,
            found: arity,
          }
        );
        ensure!(
          !(has_body && signature.defined),
          DuplicateFunctionSnafu { name }
        );
        signature.defined |= has_body;
      }
      None => {
        self.functions.insert(
          name.to_string(),
          Signature {
            arity,
            defined: has_body,
          },
        );
      }
    }

    self.symbols.clear();
    self.locals = 0;
    self.function = Some(FunctionCtx {
      name: name.to_string(),
      arity,
      has_body,
      params_seen: 0,
      awaiting_body: has_body,
    });

    if has_body {
      self.asm.push_str(&format!(".globl {name}\n"));
      self.define(name);
      self.ins("push ebp");
      self.ins("mov ebp, esp");
    }
    Ok(())
  }

  fn emit_declaration(&mut self, name: &str) -> CompileResult<()> {
    let Some(function) = self.function.as_mut() else {
      return MalformedNodesSnafu {
        message: format!("declaration of '{name}' outside of a function"),
      }
      .fail();
    };

    if function.params_seen < function.arity {
      // Arguments are pushed left to right, so the last one sits right above
      // the return address.
      let index = function.params_seen;
      function.params_seen += 1;
      if !function.has_body {
        return Ok(());
      }
      let from_last = (function.arity - 1 - index) as i32;
      let offset = 2 * WORD + WORD * from_last;
      return self.declare(name, offset);
    }

    self.in_body("declaration")?;
    let offset = -WORD * (self.locals as i32 + 1);
    self.declare(name, offset)?;
    self.locals += 1;
    self.ins("push 0");
    Ok(())
  }

  fn declare(&mut self, name: &str, offset: i32) -> CompileResult<()> {
    let scope_start = self.scopes.last().copied().unwrap_or(0);
    ensure!(
      !self.symbols[scope_start..].iter().any(|slot| slot.name == name),
      DuplicateVariableSnafu {
        name,
        function: self.function_name(),
      }
    );
    self.symbols.push(Slot {
      name: name.to_string(),
      offset,
    });
    Ok(())
  }

  /// Most recent declaration wins, which is what makes shadowing work.
  fn lookup(&self, name: &str) -> CompileResult<i32> {
    self
      .symbols
      .iter()
      .rev()
      .find(|slot| slot.name == name)
      .map(|slot| slot.offset)
      .with_context(|| UndefinedVariableSnafu {
        name,
        function: self.function_name(),
      })
  }

  fn open_scope(&mut self) -> CompileResult<()> {
    let Some(function) = self.function.as_mut() else {
      return MalformedNodesSnafu {
        message: "block outside of a function",
      }
      .fail();
    };

    if function.awaiting_body {
      ensure!(
        function.params_seen == function.arity,
        MalformedNodesSnafu {
          message: format!("body of '{}' starts before its parameters", function.name),
        }
      );
      // Parameters share the outermost scope of the body.
      function.awaiting_body = false;
      self.scopes.push(0);
      return Ok(());
    }

    self.in_body("block")?;
    self.scopes.push(self.symbols.len());
    Ok(())
  }

  fn close_scope(&mut self) -> CompileResult<()> {
    let mark = self.scopes.pop().context(MalformedNodesSnafu {
      message: "block close without a matching block open",
    })?;

    if self.scopes.is_empty() {
      ensure!(
        self.pending.is_empty(),
        MalformedNodesSnafu {
          message: "function body closed inside a control-flow construct",
        }
      );
      self.symbols.clear();
      self.locals = 0;
      if !self.asm.ends_with("    ret\n") {
        self.ins("mov eax, 0");
        self.emit_epilogue();
      }
      return Ok(());
    }

    let count = self.symbols.len() - mark;
    self.symbols.truncate(mark);
    if count > 0 {
      self.ins(&format!("add esp, {}", WORD * count as i32));
      self.locals -= count;
    }
    Ok(())
  }

  fn in_body(&self, what: &str) -> CompileResult<()> {
    ensure!(
      !self.scopes.is_empty(),
      MalformedNodesSnafu {
        message: format!("{what} outside of a function body"),
      }
    );
    Ok(())
  }

  fn innermost_loop(&self, what: &str) -> CompileResult<LoopLabels> {
    match self.pending.last() {
      Some(Pending::Loop(labels)) => Ok(*labels),
      _ => MalformedNodesSnafu {
        message: format!("{what} outside of its loop"),
      }
      .fail(),
    }
  }

  /// Innermost loop, looking through any if statements nested inside it.
  fn enclosing_loop(&self) -> Option<LoopLabels> {
    self.pending.iter().rev().find_map(|pending| match pending {
      Pending::Loop(labels) => Some(*labels),
      _ => None,
    })
  }

  fn unwind_to(&mut self, locals: usize) {
    let extra = self.locals.saturating_sub(locals);
    if extra > 0 {
      self.ins(&format!("add esp, {}", WORD * extra as i32));
    }
  }

  fn emit_epilogue(&mut self) {
    self.ins("mov esp, ebp");
    self.ins("pop ebp");
    self.ins("ret");
  }

  fn emit_branch_if_zero(&mut self, target: &str) {
    self.ins("pop eax");
    self.ins("cmp eax, 0");
    self.ins(&format!("je {target}"));
  }

  fn emit_unary(&mut self, op: UnaryOp) {
    self.ins("pop eax");
    match op {
      UnaryOp::Neg => {
        self.ins("neg eax");
        self.ins("push eax");
      }
      UnaryOp::Complement => {
        self.ins("not eax");
        self.ins("push eax");
      }
      UnaryOp::Not => {
        self.ins("xor ecx, ecx");
        self.ins("cmp eax, 0");
        self.ins("sete cl");
        self.ins("push ecx");
      }
    }
  }

  /// Only caller-saved registers are touched: the right operand goes to
  /// `ecx` and comparison results are built in `edx`.
  fn emit_binary(&mut self, op: BinaryOp) {
    self.ins("pop ecx");
    self.ins("pop eax");
    let set = match op {
      BinaryOp::Add => {
        self.ins("add eax, ecx");
        None
      }
      BinaryOp::Sub => {
        self.ins("sub eax, ecx");
        None
      }
      BinaryOp::Mul => {
        self.ins("imul eax, ecx");
        None
      }
      BinaryOp::Div => {
        self.ins("cdq");
        self.ins("idiv ecx");
        None
      }
      BinaryOp::Eq => Some("sete"),
      BinaryOp::Ne => Some("setne"),
      BinaryOp::Lt => Some("setl"),
      BinaryOp::Le => Some("setle"),
      BinaryOp::Gt => Some("setg"),
      BinaryOp::Ge => Some("setge"),
    };

    match set {
      Some(set) => {
        self.ins("xor edx, edx");
        self.ins("cmp eax, ecx");
        self.ins(&format!("{set} dl"));
        self.ins("push edx");
      }
      None => self.ins("push eax"),
    }
  }

  /// Right operand of `&&`/`||` has been evaluated; normalise it to 0/1 and
  /// join with the short-circuit path.
  fn emit_logical_result(&mut self, op: LogicalOp) -> CompileResult<()> {
    let labels = match self.pending.pop() {
      Some(Pending::Logical(pending_op, labels)) if pending_op == op => labels,
      _ => {
        return MalformedNodesSnafu {
          message: format!("'{}' without a matching left operand test", op.symbol()),
        }
        .fail();
      }
    };
    let short_circuit_value = match op {
      LogicalOp::And => 0,
      LogicalOp::Or => 1,
    };

    self.ins("pop eax");
    self.ins("cmp eax, 0");
    self.ins("mov eax, 0");
    self.ins("setne al");
    self.ins(&format!("jmp {}", labels.end()));
    self.define(&labels.alt());
    self.ins(&format!("mov eax, {short_circuit_value}"));
    self.define(&labels.end());
    self.ins("push eax");
    Ok(())
  }

  fn emit_call(&mut self, name: &str, argc: usize) -> CompileResult<()> {
    match self.functions.get(name) {
      Some(signature) => {
        ensure!(
          signature.arity == argc,
          ArityMismatchSnafu {
            name,
            expected: signature.arity,
            found: argc,
          }
        );
      }
      None => {
        debug!(name, argc, "call ahead of declaration");
        self.forward_calls.push((name.to_string(), argc));
      }
    }

    self.ins(&format!("call {name}"));
    if argc > 0 {
      self.ins(&format!("add esp, {}", WORD * argc as i32));
    }
    self.ins("push eax");
    Ok(())
  }
}

fn frame_operand(offset: i32) -> String {
  format!("DWORD PTR [ebp{offset:+}]")
}

/// Function names are emitted as-is, so they must not read as a register or
/// match a numbered `labelN`/`end_labelN`.
fn is_reserved_symbol(name: &str) -> bool {
  let numbered = |prefix: &str| {
    name
      .strip_prefix(prefix)
      .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
  };
  numbered("label")
    || numbered("end_label")
    || RESERVED_SYMBOLS
      .iter()
      .any(|reserved| reserved.eq_ignore_ascii_case(name))
}
