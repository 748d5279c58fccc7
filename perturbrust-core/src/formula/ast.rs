use std::collections::BTreeSet;

/// Variables the evaluation environment provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Variable {
    /// The current iterate.
    Z,
    /// The parameter (pixel in Mandelbrot mode, fixed constant in Julia
    /// mode).
    C,
    /// The pixel coordinate, independent of mode.
    P,
    /// The iteration index as a real.
    N,
}

impl Variable {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Z => "z",
            Self::C => "c",
            Self::P => "p",
            Self::N => "n",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// The closed function whitelist. Unknown names fail at parse time, so an
/// AST can only ever call what is listed here — there is no route from a
/// formula string to host code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Cot,
    Sec,
    Csc,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Exp,
    Log,
    Log10,
    Log2,
    Sqrt,
    Cbrt,
    Abs,
    Arg,
    Conj,
    Real,
    Imag,
    Norm,
    Floor,
    Ceil,
    Round,
    Frac,
    Sign,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "cot" => Self::Cot,
            "sec" => Self::Sec,
            "csc" => Self::Csc,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "asinh" => Self::Asinh,
            "acosh" => Self::Acosh,
            "atanh" => Self::Atanh,
            "exp" => Self::Exp,
            "log" | "ln" => Self::Log,
            "log10" => Self::Log10,
            "log2" => Self::Log2,
            "sqrt" => Self::Sqrt,
            "cbrt" => Self::Cbrt,
            "abs" => Self::Abs,
            "arg" => Self::Arg,
            "conj" => Self::Conj,
            "real" | "re" => Self::Real,
            "imag" | "im" => Self::Imag,
            "norm" => Self::Norm,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            "frac" => Self::Frac,
            "sign" => Self::Sign,
            _ => return None,
        })
    }

    /// All whitelisted functions take exactly one argument.
    pub fn arity(&self) -> usize {
        1
    }
}

/// A parsed formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// `v·i` — an imaginary literal or the unit itself.
    Imaginary(f64),
    Variable(Variable),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Func,
        arg: Box<Expr>,
    },
}

impl Expr {
    /// Collect the environment variables this expression reads.
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut set = BTreeSet::new();
        self.collect_variables(&mut set);
        set
    }

    fn collect_variables(&self, set: &mut BTreeSet<Variable>) {
        match self {
            Self::Number(_) | Self::Imaginary(_) => {}
            Self::Variable(v) => {
                set.insert(*v);
            }
            Self::Unary { operand, .. } => operand.collect_variables(set),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(set);
                rhs.collect_variables(set);
            }
            Self::Call { arg, .. } => arg.collect_variables(set),
        }
    }

    /// Estimate the dominant power of `z`, used to seed smooth coloring for
    /// custom formulas. Scans for `z^k` with a constant integer `k` and
    /// takes the largest; defaults to 2.
    pub fn estimate_power(&self) -> f64 {
        let mut max_power: f64 = 0.0;
        self.scan_powers(&mut max_power);
        if max_power >= 2.0 {
            max_power
        } else {
            2.0
        }
    }

    fn scan_powers(&self, max_power: &mut f64) {
        match self {
            Self::Binary {
                op: BinaryOp::Pow,
                lhs,
                rhs,
            } => {
                if matches!(**lhs, Expr::Variable(Variable::Z)) {
                    if let Expr::Number(k) = **rhs {
                        if k > *max_power {
                            *max_power = k;
                        }
                    }
                }
                lhs.scan_powers(max_power);
                rhs.scan_powers(max_power);
            }
            Self::Binary { lhs, rhs, .. } => {
                lhs.scan_powers(max_power);
                rhs.scan_powers(max_power);
            }
            Self::Unary { operand, .. } => operand.scan_powers(max_power),
            Self::Call { arg, .. } => arg.scan_powers(max_power),
            _ => {}
        }
    }
}
