//! Constructors for statement and expression trees
//!
//! Script compilation happens outside this crate; these helpers are how Rust
//! callers put trees together directly.

use super::types::{ActionKind, Expr, ExprKind, Stmt, StmtKind};

fn boxed(e: Expr) -> Box<Expr> {
    Box::new(e)
}

// Expressions

pub fn lit(v: bool) -> Expr {
    Expr::new(ExprKind::LitBool { v })
}

pub fn pos(x: i64, y: i64, z: i64) -> Expr {
    Expr::new(ExprKind::LitPos { x, y, z })
}

pub fn var(name: &str) -> Expr {
    Expr::new(ExprKind::Var {
        name: name.to_string(),
    })
}

pub fn and(left: Expr, right: Expr) -> Expr {
    Expr::new(ExprKind::And {
        left: boxed(left),
        right: boxed(right),
    })
}

pub fn or(left: Expr, right: Expr) -> Expr {
    Expr::new(ExprKind::Or {
        left: boxed(left),
        right: boxed(right),
    })
}

pub fn not(inner: Expr) -> Expr {
    Expr::new(ExprKind::Not { inner: boxed(inner) })
}

pub fn is_enemy(unit: Expr) -> Expr {
    Expr::new(ExprKind::IsEnemy { unit: boxed(unit) })
}

pub fn is_friend(unit: Expr) -> Expr {
    Expr::new(ExprKind::IsFriend { unit: boxed(unit) })
}

pub fn carries_item(unit: Expr) -> Expr {
    Expr::new(ExprKind::CarriesItem { unit: boxed(unit) })
}

pub fn is_alive(unit: Expr) -> Expr {
    Expr::new(ExprKind::IsAlive { unit: boxed(unit) })
}

pub fn is_solid(at: Expr) -> Expr {
    Expr::new(ExprKind::IsSolid { pos: boxed(at) })
}

pub fn is_passable(at: Expr) -> Expr {
    Expr::new(ExprKind::IsPassable { pos: boxed(at) })
}

pub fn this() -> Expr {
    Expr::new(ExprKind::This)
}

pub fn any_unit() -> Expr {
    Expr::new(ExprKind::AnyUnit)
}

pub fn friend() -> Expr {
    Expr::new(ExprKind::Friend)
}

pub fn enemy() -> Expr {
    Expr::new(ExprKind::Enemy)
}

pub fn selected_unit() -> Expr {
    Expr::new(ExprKind::SelectedUnit)
}

pub fn here() -> Expr {
    Expr::new(ExprKind::Here)
}

pub fn position_of(unit: Expr) -> Expr {
    Expr::new(ExprKind::PositionOf { unit: boxed(unit) })
}

pub fn next_to(at: Expr) -> Expr {
    Expr::new(ExprKind::NextTo { pos: boxed(at) })
}

pub fn boulder() -> Expr {
    Expr::new(ExprKind::Boulder)
}

pub fn log() -> Expr {
    Expr::new(ExprKind::Log)
}

pub fn workshop() -> Expr {
    Expr::new(ExprKind::Workshop)
}

pub fn selected_pos() -> Expr {
    Expr::new(ExprKind::SelectedPos)
}

// Statements

pub fn seq(body: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::Sequence { body, idx: 0 })
}

pub fn if_else(test: Expr, then_s: Stmt, else_s: Option<Stmt>) -> Stmt {
    Stmt::new(StmtKind::If {
        test,
        then_s: Box::new(then_s),
        else_s: else_s.map(Box::new),
        branch: None,
    })
}

pub fn while_loop(test: Expr, body: Stmt) -> Stmt {
    Stmt::new(StmtKind::While {
        test,
        body: Box::new(body),
    })
}

pub fn assign(name: &str, expr: Expr) -> Stmt {
    Stmt::new(StmtKind::Assign {
        name: name.to_string(),
        expr,
    })
}

pub fn print(expr: Expr) -> Stmt {
    Stmt::new(StmtKind::Print { expr })
}

pub fn action(action: ActionKind, target: Expr) -> Stmt {
    Stmt::new(StmtKind::Action { action, target })
}

pub fn move_to(target: Expr) -> Stmt {
    action(ActionKind::MoveTo, target)
}

pub fn work_at(target: Expr) -> Stmt {
    action(ActionKind::WorkAt, target)
}

pub fn attack(target: Expr) -> Stmt {
    action(ActionKind::Attack, target)
}

pub fn follow(target: Expr) -> Stmt {
    action(ActionKind::Follow, target)
}

pub fn brk() -> Stmt {
    Stmt::new(StmtKind::Break)
}
