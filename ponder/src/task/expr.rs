//! Exact arithmetic for validating answers: `+ - * /`, parentheses, unary minus, integers.
//!
//! Values are kept as reduced fractions so `8 / (3 - 8 / 3)` evaluates to exactly 24.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprError {
    #[error("parse error at {pos}: {message}")]
    Parse { pos: usize, message: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
}

/// Reduced fraction with a positive denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rational {
    num: i64,
    den: i64,
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Rational {
    pub fn new(num: i64, den: i64) -> Result<Self, ExprError> {
        if den == 0 {
            return Err(ExprError::DivisionByZero);
        }
        let g = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1);
        let (mut num, mut den) = match i64::try_from(g) {
            Ok(g) => (num / g, den / g),
            // g == 2^63: both are 0 or i64::MIN
            Err(_) => (num.signum(), den.signum()),
        };
        if den < 0 {
            num = num.checked_neg().ok_or(ExprError::Overflow)?;
            den = den.checked_neg().ok_or(ExprError::Overflow)?;
        }
        Ok(Self { num, den })
    }

    pub fn integer(n: i64) -> Self {
        Self { num: n, den: 1 }
    }

    pub fn is_integer(&self, n: i64) -> bool {
        self.den == 1 && self.num == n
    }

    fn add(self, o: Self) -> Result<Self, ExprError> {
        let num = self
            .num
            .checked_mul(o.den)
            .and_then(|a| o.num.checked_mul(self.den).and_then(|b| a.checked_add(b)))
            .ok_or(ExprError::Overflow)?;
        let den = self.den.checked_mul(o.den).ok_or(ExprError::Overflow)?;
        Self::new(num, den)
    }

    fn neg(self) -> Result<Self, ExprError> {
        Ok(Self {
            num: self.num.checked_neg().ok_or(ExprError::Overflow)?,
            den: self.den,
        })
    }

    fn mul(self, o: Self) -> Result<Self, ExprError> {
        let num = self.num.checked_mul(o.num).ok_or(ExprError::Overflow)?;
        let den = self.den.checked_mul(o.den).ok_or(ExprError::Overflow)?;
        Self::new(num, den)
    }

    fn div(self, o: Self) -> Result<Self, ExprError> {
        if o.num == 0 {
            return Err(ExprError::DivisionByZero);
        }
        self.mul(Self::new(o.den, o.num)?)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.src.get(self.pos).copied()
    }

    fn error(&self, message: &str) -> ExprError {
        ExprError::Parse {
            pos: self.pos,
            message: message.to_string(),
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Rational, ExprError> {
        let mut acc = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                b'+' => {
                    self.pos += 1;
                    acc = acc.add(self.term()?)?;
                }
                b'-' => {
                    self.pos += 1;
                    acc = acc.add(self.term()?.neg()?)?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Rational, ExprError> {
        let mut acc = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                b'*' | b'x' | b'X' => {
                    self.pos += 1;
                    acc = acc.mul(self.factor()?)?;
                }
                b'/' => {
                    self.pos += 1;
                    acc = acc.div(self.factor()?)?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    // factor := '-' factor | '(' expr ')' | integer
    fn factor(&mut self) -> Result<Rational, ExprError> {
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                self.factor()?.neg()
            }
            Some(b'(') => {
                self.pos += 1;
                let v = self.expr()?;
                if self.peek() != Some(b')') {
                    return Err(self.error("expected ')'"));
                }
                self.pos += 1;
                Ok(v)
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while self.pos < self.src.len() && self.src[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
                let text = std::str::from_utf8(&self.src[start..self.pos])
                    .map_err(|_| self.error("invalid number"))?;
                let n: i64 = text.parse().map_err(|_| ExprError::Overflow)?;
                Ok(Rational::integer(n))
            }
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }
}

/// Evaluates an arithmetic expression exactly. `x`/`X` are accepted as multiplication.
pub fn evaluate(src: &str) -> Result<Rational, ExprError> {
    let mut p = Parser {
        src: src.as_bytes(),
        pos: 0,
    };
    let v = p.expr()?;
    if p.peek().is_some() {
        return Err(p.error("trailing input"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_precedence_and_parentheses() {
        assert!(evaluate("4 + 5 * 4").unwrap().is_integer(24));
        assert!(evaluate("(10 - 4) * (5 - 1)").unwrap().is_integer(24));
        assert!(evaluate("-3 + 27").unwrap().is_integer(24));
    }

    /// **Scenario**: fractions stay exact, so 8 / (3 - 8 / 3) is exactly 24.
    #[test]
    fn evaluates_fractions_exactly() {
        let v = evaluate("8 / (3 - 8 / 3)").unwrap();
        assert!(v.is_integer(24), "{}", v);
        assert_eq!(evaluate("1 / 3").unwrap().to_string(), "1/3");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(evaluate("(1 + 2"), Err(ExprError::Parse { .. })));
        assert!(matches!(evaluate("1 +"), Err(ExprError::Parse { .. })));
        assert!(matches!(evaluate("2 ^ 3"), Err(ExprError::Parse { .. })));
        assert_eq!(evaluate("4 / (2 - 2)"), Err(ExprError::DivisionByZero));
    }

    /// **Scenario**: results reaching i64::MIN are reduced and negated without panicking.
    #[test]
    fn i64_min_is_handled_without_panic() {
        let min = evaluate("0 - 9223372036854775807 - 1").unwrap();
        assert!(min.is_integer(i64::MIN));
        assert_eq!(evaluate("0 - 9223372036854775807 - 1 - 1"), Err(ExprError::Overflow));
        assert_eq!(evaluate("-(0 - 9223372036854775807 - 1)"), Err(ExprError::Overflow));
        assert_eq!(evaluate("1 / (0 - 9223372036854775807 - 1)"), Err(ExprError::Overflow));
        assert!(Rational::new(i64::MIN, i64::MIN).unwrap().is_integer(1));
        assert!(Rational::new(0, i64::MIN).unwrap().is_integer(0));
        assert_eq!(Rational::new(6, -4).unwrap().to_string(), "-3/2");
    }

    #[test]
    fn accepts_x_as_multiplication() {
        assert!(evaluate("6 x 4").unwrap().is_integer(24));
    }
}
