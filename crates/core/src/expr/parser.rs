//! Tokenizer, parser and tree evaluator for the built-in expression
//! language.
//!
//! Precedence, loosest first: `|`, `&`, `!`, comparisons and regex
//! matches, `+ -`, `*`, unary `-`.

use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use super::error::ExprError;
use super::value::Value;
use super::Expr;
use crate::journal::Transaction;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Str(String),
    Regex(String),
    Date(NaiveDate),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Lexed {
    token: Token,
    position: usize,
}

const TWO_CHAR_OPS: [&str; 8] = ["==", "!=", "<=", ">=", "=~", "!~", "&&", "||"];
const ONE_CHAR_OPS: [&str; 8] = ["<", ">", "!", "&", "|", "+", "-", "*"];

fn tokenize(text: &str) -> Result<Vec<Lexed>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = if c.is_ascii_digit() {
            let mut literal = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    literal.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            let number = Decimal::from_str(&literal)
                .map_err(|_| ExprError::parse(position, format!("invalid number '{literal}'")))?;
            Token::Number(number)
        } else if c == '"' || c == '/' || c == '[' {
            chars.next();
            let close = match c {
                '[' => ']',
                other => other,
            };
            let mut body = String::new();
            let mut closed = false;
            while let Some((_, d)) = chars.next() {
                if d == '\\' {
                    if let Some((_, escaped)) = chars.next() {
                        // Regex escapes other than the delimiter stay intact.
                        if c == '/' && escaped != '/' {
                            body.push('\\');
                        }
                        body.push(escaped);
                    }
                } else if d == close {
                    closed = true;
                    break;
                } else {
                    body.push(d);
                }
            }
            if !closed {
                return Err(ExprError::parse(position, format!("unterminated '{c}' literal")));
            }
            match c {
                '"' => Token::Str(body),
                '/' => Token::Regex(body),
                _ => {
                    let date = NaiveDate::parse_from_str(body.trim(), "%Y-%m-%d")
                        .or_else(|_| NaiveDate::parse_from_str(body.trim(), "%Y/%m/%d"))
                        .map_err(|_| ExprError::parse(position, format!("invalid date [{body}]")))?;
                    Token::Date(date)
                }
            }
        } else if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            Token::Ident(ident)
        } else if c == '(' {
            chars.next();
            Token::LParen
        } else if c == ')' {
            chars.next();
            Token::RParen
        } else {
            let rest = &text[position..];
            if let Some(op) = TWO_CHAR_OPS.iter().find(|op| rest.starts_with(**op)) {
                chars.next();
                chars.next();
                Token::Op(op)
            } else if let Some(op) = ONE_CHAR_OPS.iter().find(|op| rest.starts_with(**op)) {
                chars.next();
                Token::Op(op)
            } else {
                return Err(ExprError::parse(position, format!("unexpected character '{c}'")));
            }
        };
        tokens.push(Lexed { token, position });
    }

    Ok(tokens)
}

/// Transaction fields an identifier can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Amount,
    Total,
    Account,
    Payee,
    Date,
    Code,
    Commodity,
    Note,
    Virtual,
}

impl Field {
    fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "amount" | "a" | "t" => Some(Self::Amount),
            "total" | "T" => Some(Self::Total),
            "account" | "A" => Some(Self::Account),
            "payee" | "P" => Some(Self::Payee),
            "date" | "d" => Some(Self::Date),
            "code" => Some(Self::Code),
            "commodity" => Some(Self::Commodity),
            "note" => Some(Self::Note),
            "virtual" => Some(Self::Virtual),
            _ => None,
        }
    }

    fn resolve(self, xact: &Transaction) -> Value {
        match self {
            Self::Amount => Value::Amount(xact.amount.clone()),
            Self::Total => Value::Balance(xact.total.clone()),
            Self::Account => Value::Text(xact.account.clone()),
            Self::Payee => Value::Text(xact.payee().to_string()),
            Self::Date => Value::Date(xact.date()),
            Self::Code => xact.entry.code.clone().map_or(Value::Null, Value::Text),
            Self::Commodity => Value::Text(xact.amount.commodity.symbol().to_string()),
            Self::Note => xact.note.clone().map_or(Value::Null, Value::Text),
            Self::Virtual => Value::Bool(xact.is_virtual),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn from_op(op: &str) -> Option<Self> {
        match op {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

#[derive(Debug)]
enum Node {
    Literal(Value),
    Field(Field),
    Not(Box<Node>),
    Neg(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Compare(CmpOp, Box<Node>, Box<Node>),
    Add(Box<Node>, Box<Node>),
    Sub(Box<Node>, Box<Node>),
    Mul(Box<Node>, Box<Node>),
    Match {
        subject: Box<Node>,
        pattern: Regex,
        negate: bool,
    },
}

impl Node {
    fn eval(&self, xact: &Transaction) -> Result<Value, ExprError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Field(field) => Ok(field.resolve(xact)),
            Self::Not(inner) => Ok(Value::Bool(!inner.eval(xact)?.is_truthy())),
            Self::Neg(inner) => inner.eval(xact)?.checked_neg(),
            Self::And(lhs, rhs) => Ok(Value::Bool(
                lhs.eval(xact)?.is_truthy() && rhs.eval(xact)?.is_truthy(),
            )),
            Self::Or(lhs, rhs) => Ok(Value::Bool(
                lhs.eval(xact)?.is_truthy() || rhs.eval(xact)?.is_truthy(),
            )),
            Self::Compare(op, lhs, rhs) => {
                let left = lhs.eval(xact)?;
                let right = rhs.eval(xact)?;
                if matches!(op, CmpOp::Eq | CmpOp::Ne)
                    && (left == Value::Null || right == Value::Null)
                {
                    return Ok(Value::Bool((left == right) == (*op == CmpOp::Eq)));
                }
                let ordering = left.try_compare(&right, op.symbol())?;
                Ok(Value::Bool(match op {
                    CmpOp::Eq => ordering.is_eq(),
                    CmpOp::Ne => ordering.is_ne(),
                    CmpOp::Lt => ordering.is_lt(),
                    CmpOp::Le => ordering.is_le(),
                    CmpOp::Gt => ordering.is_gt(),
                    CmpOp::Ge => ordering.is_ge(),
                }))
            }
            Self::Add(lhs, rhs) => lhs.eval(xact)?.checked_add(rhs.eval(xact)?),
            Self::Sub(lhs, rhs) => lhs.eval(xact)?.checked_sub(rhs.eval(xact)?),
            Self::Mul(lhs, rhs) => lhs.eval(xact)?.checked_mul(rhs.eval(xact)?),
            Self::Match {
                subject,
                pattern,
                negate,
            } => {
                let matched = match subject.eval(xact)? {
                    Value::Text(text) => pattern.is_match(&text),
                    Value::Null => false,
                    other => {
                        return Err(ExprError::TypeMismatch {
                            op: "=~",
                            left: other.type_name(),
                            right: "regex",
                        });
                    }
                };
                Ok(Value::Bool(matched != *negate))
            }
        }
    }
}

struct Parser {
    tokens: Vec<Lexed>,
    cursor: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|lexed| &lexed.token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map_or(self.end, |lexed| lexed.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|lexed| lexed.token.clone());
        self.cursor += 1;
        token
    }

    /// Consumes the next token if it is one of `ops` or one of the
    /// keyword spellings in `words`.
    fn eat(&mut self, ops: &[&'static str], words: &[&str]) -> Option<&'static str> {
        let found = match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => Some(*op),
            Some(Token::Ident(word)) if words.contains(&word.as_str()) => Some(ops[0]),
            _ => None,
        };
        if found.is_some() {
            self.cursor += 1;
        }
        found
    }

    fn parse_or(&mut self) -> Result<Node, ExprError> {
        let mut node = self.parse_and()?;
        while self.eat(&["|", "||"], &["or"]).is_some() {
            node = Node::Or(Box::new(node), Box::new(self.parse_and()?));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<Node, ExprError> {
        let mut node = self.parse_not()?;
        while self.eat(&["&", "&&"], &["and"]).is_some() {
            node = Node::And(Box::new(node), Box::new(self.parse_not()?));
        }
        Ok(node)
    }

    fn parse_not(&mut self) -> Result<Node, ExprError> {
        if self.eat(&["!"], &["not"]).is_some() {
            return Ok(Node::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, ExprError> {
        let lhs = self.parse_additive()?;
        let op = match self.peek() {
            Some(Token::Op(op)) => *op,
            _ => return Ok(lhs),
        };

        if let Some(cmp) = CmpOp::from_op(op) {
            self.cursor += 1;
            let rhs = self.parse_additive()?;
            return Ok(Node::Compare(cmp, Box::new(lhs), Box::new(rhs)));
        }

        if op == "=~" || op == "!~" {
            self.cursor += 1;
            let position = self.position();
            let pattern = match self.advance() {
                Some(Token::Regex(pattern) | Token::Str(pattern)) => compile_regex(&pattern)?,
                _ => return Err(ExprError::parse(position, format!("expected regex after '{op}'"))),
            };
            return Ok(Node::Match {
                subject: Box::new(lhs),
                pattern,
                negate: op == "!~",
            });
        }

        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Node, ExprError> {
        let mut node = self.parse_multiplicative()?;
        while let Some(op) = self.eat(&["+", "-"], &[]) {
            let rhs = Box::new(self.parse_multiplicative()?);
            node = if op == "+" {
                Node::Add(Box::new(node), rhs)
            } else {
                Node::Sub(Box::new(node), rhs)
            };
        }
        Ok(node)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, ExprError> {
        let mut node = self.parse_unary()?;
        while self.eat(&["*"], &[]).is_some() {
            node = Node::Mul(Box::new(node), Box::new(self.parse_unary()?));
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Node, ExprError> {
        if self.eat(&["-"], &[]).is_some() {
            return Ok(Node::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, ExprError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(n)) => Ok(Node::Literal(Value::Number(n))),
            Some(Token::Str(s)) => Ok(Node::Literal(Value::Text(s))),
            Some(Token::Date(d)) => Ok(Node::Literal(Value::Date(d))),
            // A bare regex matches against the account, as in `/Food/`.
            Some(Token::Regex(pattern)) => Ok(Node::Match {
                subject: Box::new(Node::Field(Field::Account)),
                pattern: compile_regex(&pattern)?,
                negate: false,
            }),
            Some(Token::Ident(ident)) => match ident.as_str() {
                "true" => Ok(Node::Literal(Value::Bool(true))),
                "false" => Ok(Node::Literal(Value::Bool(false))),
                _ => Field::from_ident(&ident)
                    .map(Node::Field)
                    .ok_or(ExprError::UnknownIdentifier(ident)),
            },
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ExprError::parse(self.position(), "expected ')'")),
                }
            }
            Some(other) => Err(ExprError::parse(position, format!("unexpected token {other:?}"))),
            None => Err(ExprError::parse(position, "unexpected end of input")),
        }
    }
}

fn compile_regex(pattern: &str) -> Result<Regex, ExprError> {
    Regex::new(pattern).map_err(|e| ExprError::InvalidRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// An expression compiled by the built-in evaluator.
#[derive(Debug)]
pub struct CompiledExpr {
    source: String,
    root: Node,
}

impl CompiledExpr {
    /// Parses `text` into an evaluable tree.
    ///
    /// # Errors
    ///
    /// Returns an `ExprError` for malformed text, unknown identifiers or
    /// invalid regex literals.
    pub fn compile(text: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser {
            tokens,
            cursor: 0,
            end: text.len(),
        };
        let root = parser.parse_or()?;
        if parser.cursor < parser.tokens.len() {
            return Err(ExprError::parse(parser.position(), "unexpected trailing input"));
        }
        Ok(Self {
            source: text.to_string(),
            root,
        })
    }
}

impl Expr for CompiledExpr {
    fn eval(&self, xact: &Transaction) -> Result<Value, ExprError> {
        self.root.eval(xact)
    }

    fn source(&self) -> &str {
        &self.source
    }
}
