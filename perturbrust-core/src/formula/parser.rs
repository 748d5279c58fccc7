use std::f64::consts::{E, PI, TAU};

use crate::error::CoreError;
use crate::formula::ast::{BinaryOp, Expr, Func, UnaryOp, Variable};
use crate::formula::lexer::{tokenize, SpannedToken, Token};

/// The golden ratio, exposed as the constant `phi`.
const PHI: f64 = 1.618_033_988_749_895;

/// Parse a formula into an AST.
///
/// Pratt (precedence-climbing) grammar: `^` binds tightest and associates
/// right, then `*`/`/`, then `+`/`-`; unary `+`/`-` sit between `*` and `^`
/// so `-z^2` reads as `-(z^2)`. Unknown identifiers — anything that is not
/// a variable, a constant, or a whitelisted function — are parse errors, so
/// host-code strings never survive to evaluation.
pub fn parse(input: &str) -> Result<Expr, CoreError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        input_len: input.len(),
    };
    let expr = parser.parse_expr(0)?;
    if let Some(t) = parser.peek() {
        return Err(parse_error(t.position, "unexpected trailing token"));
    }
    Ok(expr)
}

fn parse_error(position: usize, message: impl Into<String>) -> CoreError {
    CoreError::FormulaParse {
        position,
        message: message.into(),
    }
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    input_len: usize,
}

/// Binding powers: returns `(left, right)`; right > left gives left
/// associativity, right < left gives right associativity.
fn infix_binding_power(op: &Token) -> Option<(u8, u8, BinaryOp)> {
    Some(match op {
        Token::Plus => (1, 2, BinaryOp::Add),
        Token::Minus => (1, 2, BinaryOp::Sub),
        Token::Star => (3, 4, BinaryOp::Mul),
        Token::Slash => (3, 4, BinaryOp::Div),
        Token::Caret => (8, 7, BinaryOp::Pow),
        _ => return None,
    })
}

/// Right binding power of prefix `+`/`-`.
const PREFIX_BP: u8 = 5;

impl Parser {
    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn end_position(&self) -> usize {
        self.input_len
    }

    fn expect_rparen(&mut self, open_position: usize) -> Result<(), CoreError> {
        match self.advance() {
            Some(SpannedToken {
                token: Token::RParen,
                ..
            }) => Ok(()),
            Some(t) => Err(parse_error(t.position, "expected closing parenthesis")),
            None => Err(parse_error(
                open_position,
                "unterminated parenthesis",
            )),
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, CoreError> {
        let mut lhs = self.parse_prefix()?;

        while let Some(next) = self.peek() {
            let Some((left_bp, right_bp, op)) = infix_binding_power(&next.token) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(right_bp)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, CoreError> {
        let Some(t) = self.advance() else {
            return Err(parse_error(self.end_position(), "unexpected end of formula"));
        };
        match t.token {
            Token::Number(v) => Ok(Expr::Number(v)),
            Token::Imaginary(v) => Ok(Expr::Imaginary(v)),
            Token::Plus => self.parse_expr(PREFIX_BP),
            Token::Minus => {
                let operand = self.parse_expr(PREFIX_BP)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            Token::LParen => {
                let inner = self.parse_expr(0)?;
                self.expect_rparen(t.position)?;
                Ok(inner)
            }
            Token::Ident(name) => self.parse_ident(name, t.position),
            _ => Err(parse_error(t.position, "unexpected token")),
        }
    }

    fn parse_ident(&mut self, name: String, position: usize) -> Result<Expr, CoreError> {
        // Function call?
        if matches!(
            self.peek(),
            Some(SpannedToken {
                token: Token::LParen,
                ..
            })
        ) {
            let Some(func) = Func::from_name(&name) else {
                return Err(parse_error(position, format!("unknown function {name:?}")));
            };
            let open = self.advance().unwrap();
            let mut args = vec![self.parse_expr(0)?];
            while matches!(
                self.peek(),
                Some(SpannedToken {
                    token: Token::Comma,
                    ..
                })
            ) {
                self.advance();
                args.push(self.parse_expr(0)?);
            }
            self.expect_rparen(open.position)?;
            if args.len() != func.arity() {
                return Err(parse_error(
                    position,
                    format!(
                        "{name} expects {} argument, got {}",
                        func.arity(),
                        args.len()
                    ),
                ));
            }
            return Ok(Expr::Call {
                func,
                arg: Box::new(args.pop().unwrap()),
            });
        }

        // Variable, the imaginary unit, or a constant.
        match name.as_str() {
            "z" => Ok(Expr::Variable(Variable::Z)),
            "c" => Ok(Expr::Variable(Variable::C)),
            "p" => Ok(Expr::Variable(Variable::P)),
            "n" => Ok(Expr::Variable(Variable::N)),
            "i" => Ok(Expr::Imaginary(1.0)),
            "pi" => Ok(Expr::Number(PI)),
            "e" => Ok(Expr::Number(E)),
            "tau" => Ok(Expr::Number(TAU)),
            "phi" => Ok(Expr::Number(PHI)),
            _ => Err(parse_error(
                position,
                format!("unknown identifier {name:?}"),
            )),
        }
    }
}
