//! Abstract Syntax Tree node types
//!
//! Trees arrive already built (from a script compiler or a JSON scenario);
//! nothing in this crate parses task-script text.

use super::control::{Branch, ExecutionState};
use super::values::ValueKind;
use serde::{Deserialize, Serialize};

/// Source location used only for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    /// Line (1-indexed, 0 when unknown)
    pub line: usize,
    /// Column (1-indexed, 0 when unknown)
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

fn is_default_span(span: &Span) -> bool {
    *span == Span::default()
}

fn is_not_started(state: &ExecutionState) -> bool {
    *state == ExecutionState::NotStarted
}

fn is_zero(idx: &usize) -> bool {
    *idx == 0
}

/* ===================== Expressions ===================== */

/// Expression AST node
///
/// Expressions are immutable and never mutate the world. The owning task is
/// not stored in the node; it is supplied through the evaluation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(flatten)]
    pub kind: ExprKind,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExprKind {
    // Literals
    LitBool { v: bool },
    LitPos { x: i64, y: i64, z: i64 },

    // Boolean combinators (both operands are always evaluated)
    And { left: Box<Expr>, right: Box<Expr> },
    Or { left: Box<Expr>, right: Box<Expr> },
    Not { inner: Box<Expr> },

    // Unit predicates
    IsEnemy { unit: Box<Expr> },
    IsFriend { unit: Box<Expr> },
    CarriesItem { unit: Box<Expr> },
    IsAlive { unit: Box<Expr> },

    // Position predicates
    IsSolid { pos: Box<Expr> },
    IsPassable { pos: Box<Expr> },

    // Unit selectors
    This,
    AnyUnit,
    Friend,
    Enemy,
    SelectedUnit,

    // Position selectors
    Here,
    PositionOf { unit: Box<Expr> },
    NextTo { pos: Box<Expr> },
    Boulder,
    Log,
    Workshop,
    SelectedPos,

    /// Read of a variable bound by an earlier assignment
    Var { name: String },
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            span: Span::default(),
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.span = Span::new(line, column);
        self
    }

    /// The kind this expression produces, if fixed by its variant.
    ///
    /// Variable reads return `None`: their kind is only known once bound.
    pub fn static_kind(&self) -> Option<ValueKind> {
        use ExprKind::*;
        match &self.kind {
            LitBool { .. } | And { .. } | Or { .. } | Not { .. } | IsEnemy { .. }
            | IsFriend { .. } | CarriesItem { .. } | IsAlive { .. } | IsSolid { .. }
            | IsPassable { .. } => Some(ValueKind::Boolean),
            This | AnyUnit | Friend | Enemy | SelectedUnit => Some(ValueKind::Unit),
            LitPos { .. } | Here | PositionOf { .. } | NextTo { .. } | Boulder | Log
            | Workshop | SelectedPos => Some(ValueKind::Position),
            Var { .. } => None,
        }
    }

    /// Direct sub-expressions, left to right
    pub fn children(&self) -> Vec<&Expr> {
        use ExprKind::*;
        match &self.kind {
            And { left, right } | Or { left, right } => vec![left, right],
            Not { inner } => vec![inner],
            IsEnemy { unit } | IsFriend { unit } | CarriesItem { unit } | IsAlive { unit }
            | PositionOf { unit } => vec![unit],
            IsSolid { pos } | IsPassable { pos } | NextTo { pos } => vec![pos],
            _ => Vec::new(),
        }
    }
}

/* ===================== Statements ===================== */

/// The long-running effects an action statement hands to the unit collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    MoveTo,
    WorkAt,
    Attack,
    Follow,
}

impl ActionKind {
    /// What the target expression must evaluate to
    pub fn target_kind(self) -> ValueKind {
        match self {
            ActionKind::MoveTo | ActionKind::WorkAt => ValueKind::Position,
            ActionKind::Attack | ActionKind::Follow => ValueKind::Unit,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionKind::MoveTo => "moveTo",
            ActionKind::WorkAt => "work",
            ActionKind::Attack => "attack",
            ActionKind::Follow => "follow",
        };
        f.write_str(name)
    }
}

/// Statement AST node
///
/// Unlike expressions, statements carry their own execution state so a task can
/// be stepped once per tick and pick up where the previous step left off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(flatten)]
    pub kind: StmtKind,
    #[serde(default, skip_serializing_if = "is_not_started")]
    pub state: ExecutionState,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StmtKind {
    Sequence {
        body: Vec<Stmt>,
        /// Index of the active child
        #[serde(default, skip_serializing_if = "is_zero")]
        idx: usize,
    },
    If {
        test: Expr,
        then_s: Box<Stmt>,
        #[serde(default)]
        else_s: Option<Box<Stmt>>,
        /// Branch chosen when the condition was evaluated
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<Branch>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    Assign {
        name: String,
        expr: Expr,
    },
    Print {
        expr: Expr,
    },
    Action {
        action: ActionKind,
        target: Expr,
    },
    Break,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            state: ExecutionState::NotStarted,
            span: Span::default(),
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.span = Span::new(line, column);
        self
    }

    /// Return this statement and everything below it to `NotStarted`
    pub fn reset(&mut self) {
        self.state = ExecutionState::NotStarted;
        match &mut self.kind {
            StmtKind::Sequence { body, idx } => {
                *idx = 0;
                body.iter_mut().for_each(Stmt::reset);
            }
            StmtKind::If {
                then_s,
                else_s,
                branch,
                ..
            } => {
                *branch = None;
                then_s.reset();
                if let Some(else_s) = else_s {
                    else_s.reset();
                }
            }
            StmtKind::While { body, .. } => body.reset(),
            StmtKind::Assign { .. }
            | StmtKind::Print { .. }
            | StmtKind::Action { .. }
            | StmtKind::Break => {}
        }
    }

    /// Deep copy with every execution state returned to `NotStarted`
    pub fn fresh_copy(&self) -> Stmt {
        let mut copy = self.clone();
        copy.reset();
        copy
    }

    /// True if this node and every descendant is `NotStarted`
    pub fn is_pristine(&self) -> bool {
        if self.state != ExecutionState::NotStarted {
            return false;
        }
        match &self.kind {
            StmtKind::Sequence { body, idx } => *idx == 0 && body.iter().all(Stmt::is_pristine),
            StmtKind::If {
                then_s,
                else_s,
                branch,
                ..
            } => {
                branch.is_none()
                    && then_s.is_pristine()
                    && else_s.as_ref().map_or(true, |s| s.is_pristine())
            }
            StmtKind::While { body, .. } => body.is_pristine(),
            _ => true,
        }
    }

    /// Expressions held directly by this statement
    pub fn expressions(&self) -> Vec<&Expr> {
        match &self.kind {
            StmtKind::If { test, .. } | StmtKind::While { test, .. } => vec![test],
            StmtKind::Assign { expr, .. } | StmtKind::Print { expr } => vec![expr],
            StmtKind::Action { target, .. } => vec![target],
            StmtKind::Sequence { .. } | StmtKind::Break => Vec::new(),
        }
    }
}
