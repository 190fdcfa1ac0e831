//! Calculator tool
//!
//! Spoken arithmetic is normalised ("15% of 200", "6 times 7") and then
//! evaluated by a small recursive-descent parser. Nothing is ever passed to
//! an interpreter.

use crate::context::ToolContext;
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolOutput};
use crate::schema::ParamSchema;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

static PERCENT_OF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:%|percent)\s*of\s*").expect("PERCENT_OF is a compile-time constant")
});

static TIMES_X: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d)])\s*x\s*([\d(])").expect("TIMES_X is a compile-time constant"));

const WORD_OPERATORS: &[(&str, &str)] = &[
    ("multiplied by", "*"),
    ("divided by", "/"),
    ("to the power of", "^"),
    ("plus", "+"),
    ("minus", "-"),
    ("times", "*"),
    ("×", "*"),
    ("÷", "/"),
    ("**", "^"),
];

/// Calculator tool
pub struct CalculatorTool {
    definition: ToolDefinition,
}

impl CalculatorTool {
    /// Create a new calculator tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "calculator",
            "Perform mathematical calculations. Use for any math questions.",
        )
        .with_parameters(ParamSchema::object().required_property(
            "expression",
            ParamSchema::string().describe(
                "Expression to evaluate, e.g. '(25 * 4) + 10', 'sqrt(144)', '15% of 200'",
            ),
        ));
        Self { definition }
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for CalculatorTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<ToolOutput> {
        let expression = args["expression"].as_str().unwrap_or_default();
        let result = evaluate(expression)?;
        let shown = format_number(result);
        Ok(ToolOutput::new(
            format!("{expression} = {shown}"),
            json!({ "expression": expression, "result": result }),
        ))
    }
}

/// Evaluate a spoken or written arithmetic expression, rounded to 4 places.
pub fn evaluate(expression: &str) -> Result<f64> {
    let normalized = normalize(expression);
    let tokens = tokenize(&normalized)?;
    if tokens.is_empty() {
        return Err(Error::ExecutionFailed("empty expression".into()));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if let Some(tok) = parser.peek() {
        return Err(Error::ExecutionFailed(format!(
            "Calculation error: unexpected {tok:?}"
        )));
    }
    if !value.is_finite() {
        return Err(Error::ExecutionFailed("result is not a finite number".into()));
    }
    Ok((value * 10_000.0).round() / 10_000.0)
}

fn normalize(expression: &str) -> String {
    let mut expr = expression
        .trim()
        .trim_end_matches(['?', '='])
        .to_lowercase();

    expr = PERCENT_OF.replace_all(&expr, "($1/100)*").into_owned();
    for (word, op) in WORD_OPERATORS {
        expr = expr.replace(word, op);
    }
    loop {
        let next = TIMES_X.replace_all(&expr, "$1*$2").into_owned();
        if next == expr {
            break;
        }
        expr = next;
    }
    expr
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    LParen,
    RParen,
    Comma,
    Ident(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text.parse::<f64>().map_err(|_| {
                    Error::ExecutionFailed(format!("Calculation error: bad number '{text}'"))
                })?;
                tokens.push(Token::Num(n));
            }
            c if c.is_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '+' | '-' | '*' | '/' | '^' | '%' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => {
                return Err(Error::ExecutionFailed(format!(
                    "Invalid character '{other}' in expression"
                )))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn peek_op(&self) -> Option<char> {
        match self.peek() {
            Some(Token::Op(c)) => Some(*c),
            _ => None,
        }
    }

    /// Whether the token at `at` can start an operand.
    fn operand_at(&self, at: usize) -> bool {
        matches!(
            self.tokens.get(at),
            Some(Token::Num(_) | Token::LParen | Token::Ident(_) | Token::Op('-' | '+'))
        )
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek_op() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        loop {
            match self.peek_op() {
                Some('*') => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some('/') => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(Error::ExecutionFailed("Cannot divide by zero".into()));
                    }
                    value /= rhs;
                }
                Some('%') if self.operand_at(self.pos + 1) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(Error::ExecutionFailed("Cannot divide by zero".into()));
                    }
                    value %= rhs;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64> {
        match self.peek_op() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some('+') => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.postfix()?;
        if self.peek_op() == Some('^') {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    /// A trailing `%` not followed by an operand means "per cent".
    fn postfix(&mut self) -> Result<f64> {
        let mut value = self.primary()?;
        while self.peek_op() == Some('%') && !self.operand_at(self.pos + 1) {
            self.pos += 1;
            value /= 100.0;
        }
        Ok(value)
    }

    fn primary(&mut self) -> Result<f64> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect_rparen()?;
                Ok(value)
            }
            Some(Token::Ident(name)) => self.identifier(&name),
            Some(tok) => Err(Error::ExecutionFailed(format!(
                "Calculation error: unexpected {tok:?}"
            ))),
            None => Err(Error::ExecutionFailed(
                "Calculation error: expression ended early".into(),
            )),
        }
    }

    fn identifier(&mut self, name: &str) -> Result<f64> {
        match name {
            "pi" => return Ok(std::f64::consts::PI),
            "e" => return Ok(std::f64::consts::E),
            _ => {}
        }

        if self.peek() != Some(&Token::LParen) {
            return Err(Error::ExecutionFailed(format!(
                "Calculation error: unknown name '{name}'"
            )));
        }
        self.pos += 1;
        let mut args = vec![self.expr()?];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            args.push(self.expr()?);
        }
        self.expect_rparen()?;

        let unary = |f: fn(f64) -> f64| -> Result<f64> {
            match args.as_slice() {
                [x] => Ok(f(*x)),
                _ => Err(Error::ExecutionFailed(format!(
                    "Calculation error: {name} takes one argument"
                ))),
            }
        };

        match name {
            "sqrt" => unary(f64::sqrt),
            "abs" => unary(f64::abs),
            "round" => unary(f64::round),
            "sin" => unary(f64::sin),
            "cos" => unary(f64::cos),
            "tan" => unary(f64::tan),
            "log" | "ln" => unary(f64::ln),
            "log10" => unary(f64::log10),
            "min" => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
            "max" => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            "pow" => match args.as_slice() {
                [b, e] => Ok(b.powf(*e)),
                _ => Err(Error::ExecutionFailed(
                    "Calculation error: pow takes two arguments".into(),
                )),
            },
            other => Err(Error::ExecutionFailed(format!(
                "Calculation error: unknown function '{other}'"
            ))),
        }
    }

    fn expect_rparen(&mut self) -> Result<()> {
        match self.next() {
            Some(Token::RParen) => Ok(()),
            _ => Err(Error::ExecutionFailed(
                "Calculation error: missing ')'".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolErrorKind;

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(evaluate("(25 * 4) + 10").unwrap(), 110.0);
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("-2^2").unwrap(), -4.0);
        assert_eq!(evaluate("2^3^2").unwrap(), 512.0);
    }

    #[test]
    fn test_spoken_forms() {
        assert_eq!(evaluate("15% of 200").unwrap(), 30.0);
        assert_eq!(evaluate("6 times 7").unwrap(), 42.0);
        assert_eq!(evaluate("10 divided by 4").unwrap(), 2.5);
        assert_eq!(evaluate("3 multiplied by 3 plus 1").unwrap(), 10.0);
        assert_eq!(evaluate("12 x 3").unwrap(), 36.0);
        assert!(evaluate("what is sqrt(144)?").is_err());
        assert_eq!(evaluate("sqrt(144)?").unwrap(), 12.0);
    }

    #[test]
    fn test_percent_and_modulo() {
        assert_eq!(evaluate("50%").unwrap(), 0.5);
        assert_eq!(evaluate("10 % 3").unwrap(), 1.0);
    }

    #[test]
    fn test_rounds_to_four_places() {
        assert_eq!(evaluate("10 / 3").unwrap(), 3.3333);
        assert_eq!(format_number(evaluate("10 / 3").unwrap()), "3.3333");
        assert_eq!(format_number(42.0), "42");
    }

    #[test]
    fn test_division_by_zero() {
        let err = evaluate("5 / 0").unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::ExecutionFailed);
        assert!(err.to_string().contains("divide by zero"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(evaluate("import os").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("").is_err());
    }
}
