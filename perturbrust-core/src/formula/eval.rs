use crate::complex::Complex;
use crate::error::CoreError;
use crate::formula::ast::{BinaryOp, Expr, Func, UnaryOp, Variable};

/// The read-only environment a formula evaluates against.
#[derive(Debug, Clone, Copy)]
pub struct Env {
    pub z: Complex,
    pub c: Complex,
    /// The pixel coordinate, independent of Julia mode.
    pub p: Complex,
    /// The iteration index.
    pub n: f64,
}

fn eval_error(message: impl Into<String>) -> CoreError {
    CoreError::FormulaEval(message.into())
}

/// Evaluate an expression. Pure tree walk; no host evaluation of any kind.
///
/// Runtime failures — division by a zero denominator, a non-finite
/// intermediate — surface as `FormulaEval` errors so the kernel can abort
/// the sample cleanly.
pub fn eval(expr: &Expr, env: &Env) -> Result<Complex, CoreError> {
    let value = eval_node(expr, env)?;
    if !value.is_finite() {
        return Err(eval_error("non-finite result"));
    }
    Ok(value)
}

fn eval_node(expr: &Expr, env: &Env) -> Result<Complex, CoreError> {
    match expr {
        Expr::Number(v) => Ok(Complex::new(*v, 0.0)),
        Expr::Imaginary(v) => Ok(Complex::new(0.0, *v)),
        Expr::Variable(var) => Ok(match var {
            Variable::Z => env.z,
            Variable::C => env.c,
            Variable::P => env.p,
            Variable::N => Complex::new(env.n, 0.0),
        }),
        Expr::Unary { op, operand } => {
            let v = eval_node(operand, env)?;
            Ok(match op {
                UnaryOp::Neg => -v,
            })
        }
        Expr::Binary { op, lhs, rhs } => {
            let a = eval_node(lhs, env)?;
            let b = eval_node(rhs, env)?;
            match op {
                BinaryOp::Add => Ok(a + b),
                BinaryOp::Sub => Ok(a - b),
                BinaryOp::Mul => Ok(a * b),
                BinaryOp::Div => {
                    if b.norm_sq() == 0.0 {
                        return Err(eval_error("division by zero"));
                    }
                    Ok(a / b)
                }
                BinaryOp::Pow => Ok(pow_dispatch(a, b)),
            }
        }
        Expr::Call { func, arg } => {
            let v = eval_node(arg, env)?;
            apply(*func, v)
        }
    }
}

/// `^` dispatch on the value of the right operand: integer power for an
/// integer real, real power for a non-integer real, full complex power
/// otherwise.
fn pow_dispatch(base: Complex, exponent: Complex) -> Complex {
    if exponent.im == 0.0 {
        let x = exponent.re;
        if x.fract() == 0.0 && x.abs() <= i32::MAX as f64 {
            return base.powi(x as i32);
        }
        return base.powf(x);
    }
    base.powc(exponent)
}

fn apply(func: Func, v: Complex) -> Result<Complex, CoreError> {
    let reciprocal = |w: Complex, name: &str| {
        if w.norm_sq() == 0.0 {
            Err(eval_error(format!("{name} pole")))
        } else {
            Ok(w.recip())
        }
    };
    match func {
        Func::Sin => Ok(v.sin()),
        Func::Cos => Ok(v.cos()),
        Func::Tan => Ok(v.tan()),
        Func::Cot => reciprocal(v.tan(), "cot"),
        Func::Sec => reciprocal(v.cos(), "sec"),
        Func::Csc => reciprocal(v.sin(), "csc"),
        Func::Asin => Ok(v.asin()),
        Func::Acos => Ok(v.acos()),
        Func::Atan => Ok(v.atan()),
        Func::Sinh => Ok(v.sinh()),
        Func::Cosh => Ok(v.cosh()),
        Func::Tanh => Ok(v.tanh()),
        Func::Asinh => Ok(v.asinh()),
        Func::Acosh => Ok(v.acosh()),
        Func::Atanh => Ok(v.atanh()),
        Func::Exp => Ok(v.exp()),
        Func::Log => Ok(v.ln()),
        Func::Log10 => Ok(v.log10()),
        Func::Log2 => Ok(v.log2()),
        Func::Sqrt => Ok(v.sqrt()),
        Func::Cbrt => Ok(v.cbrt()),
        Func::Abs => Ok(Complex::new(v.norm(), 0.0)),
        Func::Arg => Ok(Complex::new(v.arg(), 0.0)),
        Func::Conj => Ok(v.conj()),
        Func::Real => Ok(Complex::new(v.re, 0.0)),
        Func::Imag => Ok(Complex::new(v.im, 0.0)),
        Func::Norm => Ok(Complex::new(v.norm_sq(), 0.0)),
        Func::Floor => Ok(v.floor()),
        Func::Ceil => Ok(v.ceil()),
        Func::Round => Ok(v.round()),
        Func::Frac => Ok(v.fract()),
        Func::Sign => Ok(v.signum()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parser::parse;

    fn env() -> Env {
        Env {
            z: Complex::new(0.5, -0.25),
            c: Complex::new(1.0, 0.0),
            p: Complex::ZERO,
            n: 3.0,
        }
    }

    fn run(formula: &str, env: &Env) -> Complex {
        eval(&parse(formula).unwrap(), env).unwrap()
    }

    fn approx(a: Complex, b: Complex) -> bool {
        (a - b).norm() < 1e-12
    }

    #[test]
    fn reference_formulas_at_fixed_point() {
        // Hand-computed values at z = 0, c = 1, p = 0, n = 0.
        let env = Env {
            z: Complex::ZERO,
            c: Complex::ONE,
            p: Complex::ZERO,
            n: 0.0,
        };
        assert!(approx(run("z^2+c", &env), Complex::ONE));
        assert!(approx(run("z^3+c", &env), Complex::ONE));
        assert!(approx(run("sin(z)+c", &env), Complex::ONE));
        assert!(approx(run("conj(z)^2+c", &env), Complex::ONE));
        assert!(approx(run("z^2+c+p*conj(z)", &env), Complex::ONE));
    }

    #[test]
    fn division_by_zero_variable_fails() {
        // z^2 + c/z at z = 0 divides by zero.
        let env = Env {
            z: Complex::ZERO,
            c: Complex::ONE,
            p: Complex::ZERO,
            n: 0.0,
        };
        let expr = parse("z^2+c/z").unwrap();
        assert!(eval(&expr, &env).is_err());
        // …but is fine anywhere else.
        let env2 = Env {
            z: Complex::ONE,
            ..env
        };
        assert!(approx(eval(&expr, &env2).unwrap(), Complex::new(2.0, 0.0)));
    }

    #[test]
    fn variables_read_from_environment() {
        let e = env();
        assert!(approx(run("z", &e), e.z));
        assert!(approx(run("c", &e), e.c));
        assert!(approx(run("p", &e), e.p));
        assert!(approx(run("n", &e), Complex::new(3.0, 0.0)));
    }

    #[test]
    fn imaginary_arithmetic() {
        let e = env();
        assert!(approx(run("i*i", &e), Complex::new(-1.0, 0.0)));
        assert!(approx(run("2i + 3", &e), Complex::new(3.0, 2.0)));
        // Euler: e^(iπ) = −1.
        assert!(approx(run("exp(i*pi)", &e), Complex::new(-1.0, 0.0)));
    }

    #[test]
    fn pow_dispatch_on_exponent_kind() {
        let e = env();
        // Integer exponent goes through exact binary exponentiation.
        assert!(approx(run("(1+i)^4", &e), Complex::new(-4.0, 0.0)));
        // Real non-integer exponent.
        let got = run("4^0.5", &e);
        assert!(approx(got, Complex::new(2.0, 0.0)));
        // Complex exponent: i^i = e^(−π/2).
        let ii = run("i^i", &e);
        assert!((ii.re - (-std::f64::consts::FRAC_PI_2).exp()).abs() < 1e-12);
        assert!(ii.im.abs() < 1e-12);
    }

    #[test]
    fn component_functions() {
        let e = env();
        assert!(approx(run("real(z)", &e), Complex::new(0.5, 0.0)));
        assert!(approx(run("imag(z)", &e), Complex::new(-0.25, 0.0)));
        assert!(approx(run("abs(3+4i)", &e), Complex::new(5.0, 0.0)));
        assert!(approx(run("norm(3+4i)", &e), Complex::new(25.0, 0.0)));
    }

    #[test]
    fn reciprocal_trig_poles() {
        let e = env();
        // cot(0) = cos(0)/sin(0) is a pole.
        let expr = parse("cot(0)").unwrap();
        assert!(eval(&expr, &e).is_err());
        assert!(eval(&parse("cot(1)").unwrap(), &e).is_ok());
    }

    #[test]
    fn log_of_zero_is_an_error() {
        let e = env();
        // ln(0) = −∞, caught by the finiteness check.
        assert!(eval(&parse("log(0)").unwrap(), &e).is_err());
    }
}
