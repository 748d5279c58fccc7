//! User-formula support: lexer, Pratt parser, and a whitelisted AST
//! interpreter over [`Complex`](crate::complex::Complex).
//!
//! There is deliberately no compilation surface here — formulas only ever
//! run through the tree walker against a closed function set, so a formula
//! string cannot reach host code.

mod ast;
mod eval;
mod lexer;
mod parser;

pub use ast::{BinaryOp, Expr, Func, UnaryOp, Variable};
pub use eval::{eval, Env};
pub use lexer::{tokenize, SpannedToken, Token};
pub use parser::parse;

use std::collections::BTreeSet;

use crate::complex::Complex;
use crate::error::CoreError;

/// A parsed, ready-to-evaluate formula.
#[derive(Debug, Clone)]
pub struct CompiledFormula {
    source: String,
    expr: Expr,
    power: f64,
}

impl CompiledFormula {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The dominant power of `z`, for smooth-coloring finalization.
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Evaluate one iteration step.
    pub fn eval(&self, z: Complex, c: Complex, p: Complex, n: f64) -> Result<Complex, CoreError> {
        eval(&self.expr, &Env { z, c, p, n })
    }
}

/// Parse and prepare a formula for repeated evaluation.
pub fn compile(formula: &str) -> Result<CompiledFormula, CoreError> {
    let expr = parse(formula)?;
    let power = expr.estimate_power();
    Ok(CompiledFormula {
        source: formula.to_string(),
        expr,
        power,
    })
}

/// A structured validation report for UI display.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub error: Option<String>,
    pub position: Option<usize>,
}

/// Validate a formula without keeping the AST.
pub fn validate(formula: &str) -> ValidationReport {
    match parse(formula) {
        Ok(_) => ValidationReport {
            valid: true,
            error: None,
            position: None,
        },
        Err(e) => ValidationReport {
            valid: false,
            position: e.position(),
            error: Some(e.to_string()),
        },
    }
}

/// The set of environment variables a formula reads.
pub fn dependencies(formula: &str) -> Result<BTreeSet<Variable>, CoreError> {
    Ok(parse(formula)?.variables())
}
