//! Reader for the s-expression form produced by `Display for Term`.
//!
//! Atoms are `true`/`false`, decimal integers, `x<n>` for formal arguments,
//! `?` for a hole and anything else for a symbol. Compound forms are `ite`,
//! the operators of [`Op`], and otherwise an application `(f a1 .. an)`.

use std::iter::Peekable;
use std::str::FromStr;

use thiserror::Error;

use crate::term::{Op, Term, TermKind, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermParseError {
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Unexpected token '{token}' at offset {position}")]
    UnexpectedToken { token: String, position: usize },
    #[error("'{op}' expects {expected} argument(s), found {found}")]
    Arity {
        op: String,
        expected: usize,
        found: usize,
    },
    #[error("Trailing input at offset {0}")]
    Trailing(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Atom(&'a str),
}

impl Token<'_> {
    fn text(&self) -> String {
        match self {
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
            Token::Atom(a) => a.to_string(),
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Iterator for Lexer<'a> {
    type Item = (usize, Token<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
        let start = self.pos;
        let c = trimmed.chars().next()?;
        match c {
            '(' => {
                self.pos += 1;
                Some((start, Token::Open))
            }
            ')' => {
                self.pos += 1;
                Some((start, Token::Close))
            }
            _ => {
                let len = trimmed
                    .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
                    .unwrap_or(trimmed.len());
                self.pos += len;
                Some((start, Token::Atom(&trimmed[..len])))
            }
        }
    }
}

struct Reader<'a> {
    tokens: Peekable<Lexer<'a>>,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            tokens: Lexer { input, pos: 0 }.peekable(),
        }
    }

    fn term(&mut self) -> Result<Term, TermParseError> {
        match self.tokens.next() {
            None => Err(TermParseError::UnexpectedEnd),
            Some((_, Token::Atom(a))) => Ok(atom(a)),
            Some((_, Token::Open)) => self.compound(),
            Some((position, t)) => Err(TermParseError::UnexpectedToken {
                token: t.text(),
                position,
            }),
        }
    }

    fn compound(&mut self) -> Result<Term, TermParseError> {
        let head = match self.tokens.next() {
            None => return Err(TermParseError::UnexpectedEnd),
            Some((_, Token::Atom(a))) => a,
            Some((position, t)) => {
                return Err(TermParseError::UnexpectedToken {
                    token: t.text(),
                    position,
                });
            }
        };
        let mut args = vec![];
        loop {
            match self.tokens.peek() {
                None => return Err(TermParseError::UnexpectedEnd),
                Some((_, Token::Close)) => {
                    self.tokens.next();
                    break;
                }
                Some(_) => args.push(self.term()?),
            }
        }
        build(head, args)
    }
}

fn atom(a: &str) -> Term {
    match a {
        "true" => return Term::bool(true),
        "false" => return Term::bool(false),
        "?" => return Term::hole(),
        _ => {}
    }
    if let Ok(i) = a.parse::<i64>() {
        return Term::int(i);
    }
    if let Some(index) = a.strip_prefix('x').and_then(|i| i.parse::<usize>().ok()) {
        return Term::var(index);
    }
    Term::symbol(a)
}

fn arity(op: &str, expected: usize, args: &[Term]) -> Result<(), TermParseError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(TermParseError::Arity {
            op: op.to_string(),
            expected,
            found: args.len(),
        })
    }
}

fn build(head: &str, mut args: Vec<Term>) -> Result<Term, TermParseError> {
    if head == "ite" {
        arity(head, 3, &args)?;
        let otherwise = args.remove(2);
        let then = args.remove(1);
        return Ok(Term::ite(args.remove(0), then, otherwise));
    }
    match Op::from_name(head) {
        Some(Op::Sub) if args.len() == 1 => Ok(Term::op(Op::Neg, args)),
        Some(Op::Not) => {
            arity(head, 1, &args)?;
            Ok(Term::op(Op::Not, args))
        }
        Some(op @ (Op::Eq | Op::Lt | Op::Le | Op::Gt | Op::Ge)) => {
            arity(head, 2, &args)?;
            Ok(Term::op(op, args))
        }
        Some(op) => Ok(Term::op(op, args)),
        None => Ok(Term::eval(head, args)),
    }
}

pub fn parse_term(input: &str) -> Result<Term, TermParseError> {
    let mut reader = Reader::new(input);
    let term = reader.term()?;
    match reader.tokens.next() {
        None => Ok(term),
        Some((position, _)) => Err(TermParseError::Trailing(position)),
    }
}

impl FromStr for Term {
    type Err = TermParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_term(s)
    }
}

impl Term {
    /// Parses a value-producing constant such as `3` or `false`.
    pub fn parse_value(input: &str) -> Option<Value> {
        match parse_term(input).ok()?.kind() {
            TermKind::Const(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::term::parse::{TermParseError, parse_term};
    use crate::term::{Op, Term, Value};

    #[test]
    fn reads_what_display_writes() {
        let inputs = [
            "(ite (> x0 -3) (f 1) (not b))",
            "(and (= x1 2) (< x0 x1) (or p q))",
            "(- (+ x0 1))",
            "(- x0 1 2)",
            "(g)",
            "?",
        ];
        for input in inputs {
            let t = parse_term(input).unwrap();
            assert_eq!(t.to_string(), input);
        }
    }

    #[test]
    fn resolves_unary_minus() {
        assert_eq!(
            parse_term("(- x0)").unwrap(),
            Term::op(Op::Neg, vec![Term::var(0)])
        );
    }

    #[test]
    fn reports_errors() {
        assert_eq!(parse_term("(f 1"), Err(TermParseError::UnexpectedEnd));
        assert_eq!(parse_term("f 1"), Err(TermParseError::Trailing(2)));
        assert!(matches!(
            parse_term("(ite c t)"),
            Err(TermParseError::Arity { expected: 3, found: 2, .. })
        ));
        assert!(matches!(
            parse_term(")"),
            Err(TermParseError::UnexpectedToken { position: 0, .. })
        ));
    }

    #[test]
    fn parses_values() {
        assert_eq!(Term::parse_value("-12"), Some(Value::Int(-12)));
        assert_eq!(Term::parse_value("true"), Some(Value::Bool(true)));
        assert_eq!(Term::parse_value("x0"), None);
    }
}
