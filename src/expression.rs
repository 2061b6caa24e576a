//! Expression parsing and evaluation for parameter ties
//!
//! Tie expressions such as `2 * f0.Height + 0.5` are parsed into a small AST
//! with nom and evaluated against an [`EvaluationContext`] that supplies the
//! current values of the referenced parameters. Identifiers may contain
//! `.`-separated segments so that composite parameter names can be used
//! directly as variables.

use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, multispace0, satisfy},
    combinator::{opt, recognize, value},
    multi::{fold_many0, many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },
}

type ExprResult<T> = Result<T, ExpressionError>;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant number
    Number(f64),

    /// Variable reference, possibly dotted (`f1.A0`)
    Variable(String),

    /// Negation
    Neg(Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Function call
    Function(String, Vec<Expression>),
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn apply(self, lhs: f64, rhs: f64) -> ExprResult<f64> {
        match self {
            Self::Add => Ok(lhs + rhs),
            Self::Sub => Ok(lhs - rhs),
            Self::Mul => Ok(lhs * rhs),
            Self::Div if rhs == 0.0 => Err(ExpressionError::DivisionByZero),
            Self::Div => Ok(lhs / rhs),
            Self::Pow => Ok(lhs.powf(rhs)),
        }
    }

    fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Pow => '^',
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
            Self::Pow => 3,
        }
    }
}

/// Context for expression evaluation, providing variable values
pub trait EvaluationContext {
    /// Get the value of a variable
    fn get_variable(&self, name: &str) -> ExprResult<f64>;
}

impl EvaluationContext for HashMap<String, f64> {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }
}

impl Expression {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> ExprResult<Self> {
        match sum(input.trim()) {
            Ok((remainder, expr)) => {
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("Unexpected trailing characters: '{}'", remainder),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: e.to_string(),
            }),
        }
    }

    /// Evaluate the expression with the given context
    pub fn evaluate<C: EvaluationContext + ?Sized>(&self, context: &C) -> ExprResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),

            Self::Variable(name) => context.get_variable(name),

            Self::Neg(expr) => Ok(-expr.evaluate(context)?),

            Self::Binary(op, left, right) => {
                op.apply(left.evaluate(context)?, right.evaluate(context)?)
            }

            Self::Function(name, args) => {
                let builtin = Builtin::lookup(name).ok_or_else(|| {
                    ExpressionError::UndefinedFunction { name: name.clone() }
                })?;
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(context))
                    .collect::<ExprResult<Vec<f64>>>()?;
                builtin.call(name, &values)
            }
        }
    }

    /// All variable names used in the expression, sorted and deduplicated
    pub fn variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Self::Number(_) => {}
            Self::Variable(name) => vars.push(name.clone()),
            Self::Neg(expr) => expr.collect_variables(vars),
            Self::Binary(_, left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }
            Self::Function(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }
}

impl Expression {
    /// Copy of the expression with every variable renamed by `rename`.
    pub fn map_variables<F: Fn(&str) -> String>(&self, rename: &F) -> Expression {
        match self {
            Self::Number(n) => Self::Number(*n),
            Self::Variable(name) => Self::Variable(rename(name)),
            Self::Neg(expr) => Self::Neg(Box::new(expr.map_variables(rename))),
            Self::Binary(op, left, right) => Self::Binary(
                *op,
                Box::new(left.map_variables(rename)),
                Box::new(right.map_variables(rename)),
            ),
            Self::Function(name, args) => Self::Function(
                name.clone(),
                args.iter().map(|a| a.map_variables(rename)).collect(),
            ),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Variable(name) => f.write_str(name),
            Self::Neg(expr) => match expr.as_ref() {
                Self::Binary(..) => write!(f, "-({})", expr),
                _ => write!(f, "-{}", expr),
            },
            Self::Binary(op, left, right) => write!(
                f,
                "{}{}{}",
                Operand(left, *op),
                op.symbol(),
                Operand(right, *op)
            ),
            Self::Function(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Operand of a binary operator, parenthesized when it is itself a binary
/// expression of lower or equal precedence.
struct Operand<'a>(&'a Expression, BinaryOp);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expression::Binary(inner, ..) if inner.precedence() <= self.1.precedence() => {
                write!(f, "({})", self.0)
            }
            _ => write!(f, "{}", self.0),
        }
    }
}

/// Functions callable from an expression.
#[derive(Clone, Copy)]
enum Builtin {
    Unary(fn(f64) -> f64),
    /// Folds two or more arguments from the given start value.
    Fold(fn(f64, f64) -> f64, f64),
}

impl Builtin {
    fn lookup(name: &str) -> Option<Self> {
        let builtin = match name {
            "sin" => Self::Unary(f64::sin),
            "cos" => Self::Unary(f64::cos),
            "tan" => Self::Unary(f64::tan),
            "exp" => Self::Unary(f64::exp),
            "log" | "ln" => Self::Unary(f64::ln),
            "log10" => Self::Unary(f64::log10),
            "sqrt" => Self::Unary(f64::sqrt),
            "abs" => Self::Unary(f64::abs),
            "max" => Self::Fold(f64::max, f64::NEG_INFINITY),
            "min" => Self::Fold(f64::min, f64::INFINITY),
            _ => return None,
        };
        Some(builtin)
    }

    fn call(self, name: &str, args: &[f64]) -> ExprResult<f64> {
        match (self, args) {
            (Self::Unary(f), [arg]) => Ok(f(*arg)),
            (Self::Fold(f, start), args) if args.len() >= 2 => {
                Ok(args.iter().copied().fold(start, f))
            }
            (Self::Unary(_), _) => Err(ExpressionError::InvalidOperation {
                message: format!("{}() takes 1 argument, got {}", name, args.len()),
            }),
            (Self::Fold(..), _) => Err(ExpressionError::InvalidOperation {
                message: format!("{}() takes at least 2 arguments, got {}", name, args.len()),
            }),
        }
    }
}

// Grammar, lowest precedence first:
//   sum     = term (('+' | '-') term)*
//   term    = power (('*' | '/') power)*
//   power   = unary ('^' power)?
//   unary   = '-' unary | atom
//   atom    = name ('(' args ')')? | number | '(' sum ')'

type ParseError<'a> = nom::error::Error<&'a str>;

fn padded<'a, O, P>(parser: P) -> impl Parser<&'a str, Output = O, Error = ParseError<'a>>
where
    P: Parser<&'a str, Output = O, Error = ParseError<'a>>,
{
    delimited(multispace0, parser, multispace0)
}

/// One identifier segment (`Height`, `f0`, `_tmp`)
fn segment(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// A possibly dotted name (`f1.f0.A0`)
fn name(input: &str) -> IResult<&str, &str> {
    recognize(pair(segment, many0(preceded(char('.'), segment)))).parse(input)
}

fn call_or_variable(input: &str) -> IResult<&str, Expression> {
    let (input, name) = name(input)?;
    let (input, args) = opt(delimited(
        padded(char('(')),
        separated_list0(padded(char(',')), sum),
        preceded(multispace0, char(')')),
    ))
    .parse(input)?;
    let expr = match args {
        Some(args) => Expression::Function(name.to_string(), args),
        None => Expression::Variable(name.to_string()),
    };
    Ok((input, expr))
}

fn number(input: &str) -> IResult<&str, Expression> {
    let (input, n) = double(input)?;
    Ok((input, Expression::Number(n)))
}

fn atom(input: &str) -> IResult<&str, Expression> {
    // Names go before numbers: `double` would read `inf` or `nan`.
    alt((
        call_or_variable,
        number,
        delimited(char('('), sum, preceded(multispace0, char(')'))),
    ))
    .parse(input)
}

fn unary(input: &str) -> IResult<&str, Expression> {
    preceded(
        multispace0,
        alt((
            preceded(char('-'), unary).map(|e| Expression::Neg(Box::new(e))),
            atom,
        )),
    )
    .parse(input)
}

fn power(input: &str) -> IResult<&str, Expression> {
    let (input, base) = unary(input)?;
    let (input, exponent) = opt(preceded(padded(char('^')), power)).parse(input)?;
    let expr = match exponent {
        Some(exponent) => binary(base, (BinaryOp::Pow, exponent)),
        None => base,
    };
    Ok((input, expr))
}

fn binary(lhs: Expression, (op, rhs): (BinaryOp, Expression)) -> Expression {
    Expression::Binary(op, Box::new(lhs), Box::new(rhs))
}

fn term(input: &str) -> IResult<&str, Expression> {
    let (input, first) = power(input)?;
    let op = alt((value(BinaryOp::Mul, char('*')), value(BinaryOp::Div, char('/'))));
    fold_many0(pair(padded(op), power), move || first.clone(), binary).parse(input)
}

fn sum(input: &str) -> IResult<&str, Expression> {
    let (input, first) = term(input)?;
    let op = alt((value(BinaryOp::Add, char('+')), value(BinaryOp::Sub, char('-'))));
    fold_many0(pair(padded(op), term), move || first.clone(), binary).parse(input)
}
