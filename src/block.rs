//! Flowchart blocks.
//!
//! A block is one node of a thread's control-flow graph. Successors are stored
//! as [`BlockId`]s and resolved through the owning [`Thread`][crate::thread::Thread]
//! at execution time, so back-edges (loops) need no special handling.

use std::fmt;
use std::str::FromStr;

use crate::types::{BlockId, Value};

/// Comparison operator of a DECISION block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CmpOp {
    /// `var == constant`
    Eq,
    /// `var < constant`
    Lt,
}

impl CmpOp {
    pub fn eval(self, lhs: Value, rhs: Value) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Lt => lhs < rhs,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Lt => "<",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CmpOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(CmpOp::Eq),
            "<" => Ok(CmpOp::Lt),
            _ => Err(format!("Operator must be '==' or '<', got '{}'", s)),
        }
    }
}

/// Condition of a DECISION block: `var op constant`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Condition {
    pub var: String,
    pub op: CmpOp,
    pub constant: Value,
}

impl Condition {
    pub fn new(var: impl Into<String>, op: CmpOp, constant: Value) -> Self {
        Self {
            var: var.into(),
            op,
            constant,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.var, self.op, self.constant)
    }
}

/// Right-hand side of an ASSIGN block.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Source {
    /// A literal, truncated to 32 bits when assigned.
    Const(u64),
    /// Copy of another variable (0 if never written).
    Var(String),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Const(c) => write!(f, "{}", c),
            Source::Var(name) => f.write_str(name),
        }
    }
}

/// Variant tag of a block, without its payload.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlockType {
    Start,
    End,
    Assign,
    Input,
    Print,
    Decision,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockType::Start => "START",
            BlockType::End => "END",
            BlockType::Assign => "ASSIGN",
            BlockType::Input => "INPUT",
            BlockType::Print => "PRINT",
            BlockType::Decision => "DECISION",
        };
        f.write_str(s)
    }
}

/// Block payload. Every kind except END has at least one successor.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum BlockKind {
    Start {
        next: BlockId,
    },
    End,
    Assign {
        target: String,
        source: Source,
        next: BlockId,
    },
    Input {
        var: String,
        next: BlockId,
    },
    Print {
        var: String,
        next: BlockId,
    },
    Decision {
        condition: Condition,
        on_true: BlockId,
        on_false: BlockId,
    },
}

/// A flowchart block. Immutable once built: edits replace the whole block.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self { id, kind }
    }

    pub fn start(id: u32, next: u32) -> Self {
        Self::new(BlockId::new(id), BlockKind::Start { next: BlockId::new(next) })
    }

    pub fn end(id: u32) -> Self {
        Self::new(BlockId::new(id), BlockKind::End)
    }

    pub fn assign_const(id: u32, target: impl Into<String>, value: u64, next: u32) -> Self {
        Self::new(
            BlockId::new(id),
            BlockKind::Assign {
                target: target.into(),
                source: Source::Const(value),
                next: BlockId::new(next),
            },
        )
    }

    pub fn assign_var(
        id: u32,
        target: impl Into<String>,
        source: impl Into<String>,
        next: u32,
    ) -> Self {
        Self::new(
            BlockId::new(id),
            BlockKind::Assign {
                target: target.into(),
                source: Source::Var(source.into()),
                next: BlockId::new(next),
            },
        )
    }

    pub fn input(id: u32, var: impl Into<String>, next: u32) -> Self {
        Self::new(
            BlockId::new(id),
            BlockKind::Input {
                var: var.into(),
                next: BlockId::new(next),
            },
        )
    }

    pub fn print(id: u32, var: impl Into<String>, next: u32) -> Self {
        Self::new(
            BlockId::new(id),
            BlockKind::Print {
                var: var.into(),
                next: BlockId::new(next),
            },
        )
    }

    pub fn decision(
        id: u32,
        condition: Condition,
        on_true: u32,
        on_false: u32,
    ) -> Self {
        Self::new(
            BlockId::new(id),
            BlockKind::Decision {
                condition,
                on_true: BlockId::new(on_true),
                on_false: BlockId::new(on_false),
            },
        )
    }

    pub fn block_type(&self) -> BlockType {
        match self.kind {
            BlockKind::Start { .. } => BlockType::Start,
            BlockKind::End => BlockType::End,
            BlockKind::Assign { .. } => BlockType::Assign,
            BlockKind::Input { .. } => BlockType::Input,
            BlockKind::Print { .. } => BlockType::Print,
            BlockKind::Decision { .. } => BlockType::Decision,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, BlockKind::Input { .. })
    }

    /// All successor ids of this block (none for END, two for DECISION).
    pub fn successors(&self) -> Vec<BlockId> {
        match &self.kind {
            BlockKind::End => vec![],
            BlockKind::Start { next }
            | BlockKind::Assign { next, .. }
            | BlockKind::Input { next, .. }
            | BlockKind::Print { next, .. } => vec![*next],
            BlockKind::Decision { on_true, on_false, .. } => vec![*on_true, *on_false],
        }
    }

    /// Names of the variables this block reads or writes.
    pub fn variables(&self) -> Vec<&str> {
        match &self.kind {
            BlockKind::Start { .. } | BlockKind::End => vec![],
            BlockKind::Assign { target, source, .. } => match source {
                Source::Const(_) => vec![target.as_str()],
                Source::Var(name) => vec![target.as_str(), name.as_str()],
            },
            BlockKind::Input { var, .. } | BlockKind::Print { var, .. } => vec![var.as_str()],
            BlockKind::Decision { condition, .. } => vec![condition.var.as_str()],
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.id)?;
        match &self.kind {
            BlockKind::Start { next } => write!(f, "START -> {}", next),
            BlockKind::End => write!(f, "END"),
            BlockKind::Assign { target, source, next } => write!(f, "{} = {} -> {}", target, source, next),
            BlockKind::Input { var, next } => write!(f, "INPUT {} -> {}", var, next),
            BlockKind::Print { var, next } => write!(f, "PRINT {} -> {}", var, next),
            BlockKind::Decision {
                condition,
                on_true,
                on_false,
            } => write!(f, "IF {} ? {} : {}", condition, on_true, on_false),
        }
    }
}
