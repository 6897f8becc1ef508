//! Arithmetic expression evaluation without handing the model a shell.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::require_str;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;
use crate::registry::{ToolHandler, ToolRegistry};

pub fn register(registry: &mut ToolRegistry) -> AgentResult<()> {
    registry.register(
        Tool::new(
            "calculator",
            "Evaluate a mathematical expression. Supports + - * / % ^, parentheses, the functions sin cos tan sqrt exp ln log abs, and the constants pi and e.",
            json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "The expression to evaluate, e.g. sqrt(2) * (3 + 4)"
                    }
                },
                "required": ["expression"]
            }),
        ),
        Box::new(Calculator),
    )
}

struct Calculator;

#[async_trait]
impl ToolHandler for Calculator {
    async fn call(&self, args: Value) -> AgentResult<Value> {
        let expression = require_str(&args, "expression")?;
        let value = evaluate(expression)
            .map_err(|e| AgentError::InvalidParameters(format!("'{expression}': {e}")))?;
        if !value.is_finite() {
            return Err(AgentError::ExecutionError(format!(
                "'{expression}' has no finite value"
            )));
        }
        Ok(json!(value))
    }
}

pub fn evaluate(expression: &str) -> Result<f64, String> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("unexpected trailing input at token {}", parser.pos));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
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
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| format!("bad number literal '{literal}'"))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            c => return Err(format!("unexpected character '{c}'")),
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
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: Token) -> Result<(), String> {
        match self.next() {
            Some(found) if found == token => Ok(()),
            Some(found) => Err(format!("expected {token:?}, found {found:?}")),
            None => Err(format!("expected {token:?}, found end of input")),
        }
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.next();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.next();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.next();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.next();
                    value /= self.unary()?;
                }
                Some(Token::Percent) => {
                    self.next();
                    value %= self.unary()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, String> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.next();
            return Ok(-self.unary()?);
        }
        self.power()
    }

    // exponentiation binds tighter than unary minus on the right: 2^-1 works
    fn power(&mut self) -> Result<f64, String> {
        let base = self.atom()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.next();
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, String> {
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "pi" => Ok(std::f64::consts::PI),
                "e" => Ok(std::f64::consts::E),
                _ => {
                    self.expect(Token::LParen)?;
                    let argument = self.expr()?;
                    self.expect(Token::RParen)?;
                    apply_function(&name, argument)
                }
            },
            Some(token) => Err(format!("unexpected {token:?}")),
            None => Err("unexpected end of input".to_string()),
        }
    }
}

fn apply_function(name: &str, x: f64) -> Result<f64, String> {
    match name {
        "sin" => Ok(x.sin()),
        "cos" => Ok(x.cos()),
        "tan" => Ok(x.tan()),
        "sqrt" => Ok(x.sqrt()),
        "exp" => Ok(x.exp()),
        "ln" => Ok(x.ln()),
        "log" => Ok(x.log10()),
        "abs" => Ok(x.abs()),
        _ => Err(format!("unknown function '{name}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_precedence_and_parentheses() {
        assert!(close(evaluate("2 + 3 * 4").unwrap(), 14.0));
        assert!(close(evaluate("(2 + 3) * 4").unwrap(), 20.0));
        assert!(close(evaluate("10 % 4 + 7 / 2").unwrap(), 5.5));
    }

    #[test]
    fn test_unary_minus_and_power() {
        assert!(close(evaluate("-3 + 5").unwrap(), 2.0));
        assert!(close(evaluate("2^10").unwrap(), 1024.0));
        assert!(close(evaluate("2^-1").unwrap(), 0.5));
        assert!(close(evaluate("-2^2").unwrap(), -4.0));
    }

    #[test]
    fn test_functions_and_constants() {
        assert!(close(evaluate("sin(0)").unwrap(), 0.0));
        assert!(close(evaluate("sqrt(2) * sqrt(2)").unwrap(), 2.0));
        assert!(close(evaluate("cos(pi)").unwrap(), -1.0));
        assert!(close(evaluate("ln(e)").unwrap(), 1.0));
        assert!(close(evaluate("log(1000)").unwrap(), 3.0));
        assert!(close(evaluate("abs(-4.5)").unwrap(), 4.5));
    }

    #[test]
    fn test_errors() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("nope(3)").is_err());
        assert!(evaluate("2 $ 3").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 2").is_err());
    }

    #[tokio::test]
    async fn test_tool_call_surface() {
        let result = Calculator
            .call(json!({"expression": "3 * (1 + 1)"}))
            .await
            .unwrap();
        assert_eq!(result, json!(6.0));

        let err = Calculator.call(json!({"expression": "1/0 - 1/0"})).await;
        assert!(err.is_err());
    }
}
