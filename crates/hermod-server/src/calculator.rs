//! Arithmetic for the `calculate` tool.
//!
//! Grammar:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('-' | '+') factor | '(' expr ')' | number
//! ```

use crate::error::{ToolError, ToolResult};

/// Evaluate `expression`.
pub fn evaluate(expression: &str) -> ToolResult<f64> {
    let mut parser = Parser {
        chars: expression.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
    };
    if parser.chars.is_empty() {
        return Err(ToolError::Calculation("empty expression".to_string()));
    }

    let value = parser.expr()?;
    if let Some(c) = parser.peek() {
        return Err(ToolError::Calculation(format!(
            "unexpected '{}' at position {}",
            c,
            parser.pos + 1
        )));
    }
    Ok(value)
}

/// Render a result without a trailing `.0` for whole numbers.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> ToolResult<f64> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> ToolResult<f64> {
        let mut value = self.factor()?;
        loop {
            if self.eat('*') {
                value *= self.factor()?;
            } else if self.eat('/') {
                let divisor = self.factor()?;
                if divisor == 0.0 {
                    return Err(ToolError::Calculation("division by zero".to_string()));
                }
                value /= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    fn factor(&mut self) -> ToolResult<f64> {
        if self.eat('-') {
            return Ok(-self.factor()?);
        }
        if self.eat('+') {
            return self.factor();
        }
        if self.eat('(') {
            let value = self.expr()?;
            if !self.eat(')') {
                return Err(ToolError::Calculation("missing closing parenthesis".to_string()));
            }
            return Ok(value);
        }
        self.number()
    }

    fn number(&mut self) -> ToolResult<f64> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some(c) => ToolError::Calculation(format!(
                    "unexpected '{}' at position {}",
                    c,
                    self.pos + 1
                )),
                None => ToolError::Calculation("unexpected end of expression".to_string()),
            });
        }

        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| ToolError::Calculation(format!("invalid number '{}'", literal)))
    }
}
