//! Hand-rolled lexer and recursive-descent parser for the constraint and
//! domain micro-language.
//!
//! The grammar is small enough that a parser generator would be more
//! machinery than grammar:
//!
//! ```text
//! constraint := operand relop operand ( '|' counter ( ',' counter )* )?
//! operand    := '$' ident ( '[' ( int | ident ) ']' )? ( ('+'|'-') int )?
//!             | int | char-lit | string-lit | ident
//! counter    := ident 'in' bound
//! bound      := limit '..' limit | limit
//! limit      := int | ident | 'size' '(' ident ')'
//! domain     := band '..' band | item ( ',' item )*
//! band       := int | char-lit | 'size' '(' ident ')'
//! relop      := '=' | '==' | '<>' | '!=' | '>' | '>=' | '<' | '<='
//! ```

use crate::{
    error::{Error, Result},
    language::ast::{
        Band, ConstraintExpr, CounterDecl, CounterPolicy, DomainExpr, ExpanderDecl, LimitExpr,
        Literal, Operand, RelOp, Subscript, VariableRef,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Dollar,
    Ident(String),
    Int(i64),
    CharLit(char),
    StrLit(String),
    LBracket,
    RBracket,
    LParen,
    RParen,
    DotDot,
    Comma,
    Pipe,
    Plus,
    Minus,
    Op(RelOp),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Dollar => write!(f, "$"),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Int(n) => write!(f, "{}", n),
            Token::CharLit(c) => write!(f, "'{}'", c),
            Token::StrLit(s) => write!(f, "\"{}\"", s),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::DotDot => write!(f, ".."),
            Token::Comma => write!(f, ","),
            Token::Pipe => write!(f, "|"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Op(op) => write!(f, "{:?}", op),
        }
    }
}

fn lex(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '$' => {
                chars.next();
                tokens.push(Token::Dollar);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '.' => {
                chars.next();
                if chars.peek() == Some(&'.') {
                    chars.next();
                    tokens.push(Token::DotDot);
                } else {
                    return Err(Error::parse(text, "expected '..'"));
                }
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                }
                tokens.push(Token::Op(RelOp::Equals));
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(RelOp::NotEqual));
                } else {
                    return Err(Error::parse(text, "expected '!='"));
                }
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some(&'>') => {
                        chars.next();
                        tokens.push(Token::Op(RelOp::NotEqual));
                    }
                    Some(&'=') => {
                        chars.next();
                        tokens.push(Token::Op(RelOp::LessOrEqual));
                    }
                    _ => tokens.push(Token::Op(RelOp::Less)),
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(RelOp::GreaterOrEqual));
                } else {
                    tokens.push(Token::Op(RelOp::Greater));
                }
            }
            '\'' => {
                chars.next();
                let Some(lit) = chars.next() else {
                    return Err(Error::parse(text, "unterminated character literal"));
                };
                if chars.next() != Some('\'') {
                    return Err(Error::parse(text, "unterminated character literal"));
                }
                tokens.push(Token::CharLit(lit));
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => s.push(c),
                        None => return Err(Error::parse(text, "unterminated string literal")),
                    }
                }
                tokens.push(Token::StrLit(s));
            }
            c if c.is_ascii_digit() => {
                let mut n: i64 = 0;
                while let Some(&d) = chars.peek() {
                    if let Some(digit) = d.to_digit(10) {
                        chars.next();
                        n = n
                            .checked_mul(10)
                            .and_then(|n| n.checked_add(digit as i64))
                            .ok_or_else(|| {
                                Error::parse(text, "integer literal out of range")
                            })?;
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Int(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut s = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        chars.next();
                        s.push(d);
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(s));
            }
            other => {
                return Err(Error::parse(text, format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Result<Self> {
        Ok(Self {
            text,
            tokens: lex(text)?,
            pos: 0,
        })
    }

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

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.text, message)
    }

    fn expect_ident(&mut self, what: &str) -> Result<String> {
        match self.next() {
            Some(Token::Ident(s)) => Ok(s),
            other => Err(self.error(format!("expected {}, found {}", what, describe(other)))),
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => Err(self.error(format!("expected {}, found {}", what, describe(other)))),
        }
    }

    fn at_end(&self) -> bool {
        self.pos == self.tokens.len()
    }

    fn parse_constraint(&mut self) -> Result<ConstraintExpr> {
        let lhs = self.parse_operand()?;
        let op = match self.next() {
            Some(Token::Op(op)) => op,
            other => {
                return Err(self.error(format!(
                    "expected relational operator, found {}",
                    describe(other)
                )))
            }
        };
        let rhs = self.parse_operand()?;

        let expander = if self.eat(&Token::Pipe) {
            Some(self.parse_expander()?)
        } else {
            None
        };

        if !self.at_end() {
            return Err(self.error("trailing input after constraint"));
        }

        let mut expr = ConstraintExpr {
            lhs,
            op,
            rhs,
            expander,
        };
        reclassify_counters(&mut expr);
        Ok(expr)
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        match self.next() {
            Some(Token::Dollar) => {
                let name = self.expect_ident("variable name after '$'")?;
                let mut var = VariableRef::new(name);

                if self.eat(&Token::LBracket) {
                    var.subscript = Some(match self.next() {
                        Some(Token::Int(n)) => Subscript::Index(n),
                        Some(Token::Ident(counter)) => Subscript::Counter(counter),
                        other => {
                            return Err(self.error(format!(
                                "expected subscript, found {}",
                                describe(other)
                            )))
                        }
                    });
                    self.expect(Token::RBracket, "']'")?;
                }

                let sign = match self.peek() {
                    Some(Token::Plus) => Some(crate::language::ast::ArithOp::Add),
                    Some(Token::Minus) => Some(crate::language::ast::ArithOp::Subtract),
                    _ => None,
                };
                if let Some(op) = sign {
                    self.pos += 1;
                    match self.next() {
                        Some(Token::Int(n)) => var.offset = Some((op, n)),
                        other => {
                            return Err(self.error(format!(
                                "expected integer offset, found {}",
                                describe(other)
                            )))
                        }
                    }
                }

                Ok(Operand::Variable(var))
            }
            Some(Token::Int(n)) => Ok(Operand::Literal(Literal::Int(n))),
            Some(Token::Minus) => match self.next() {
                Some(Token::Int(n)) => Ok(Operand::Literal(Literal::Int(-n))),
                other => Err(self.error(format!("expected integer, found {}", describe(other)))),
            },
            Some(Token::CharLit(c)) => Ok(Operand::Literal(Literal::Char(c))),
            Some(Token::StrLit(s)) => Ok(Operand::Literal(Literal::Item(s))),
            Some(Token::Ident(s)) => Ok(Operand::Literal(Literal::Item(s))),
            other => Err(self.error(format!("expected operand, found {}", describe(other)))),
        }
    }

    fn parse_expander(&mut self) -> Result<ExpanderDecl> {
        let mut counters = vec![self.parse_counter()?];
        while self.eat(&Token::Comma) {
            counters.push(self.parse_counter()?);
        }
        Ok(ExpanderDecl { counters })
    }

    fn parse_counter(&mut self) -> Result<CounterDecl> {
        let name = self.expect_ident("counter name")?;
        match self.next() {
            Some(Token::Ident(kw)) if kw == "in" => {}
            other => {
                return Err(self.error(format!("expected 'in', found {}", describe(other))));
            }
        }
        let first = self.parse_limit()?;
        let policy = if self.eat(&Token::DotDot) {
            CounterPolicy::Range(first, self.parse_limit()?)
        } else {
            CounterPolicy::Count(first)
        };
        Ok(CounterDecl { name, policy })
    }

    fn parse_limit(&mut self) -> Result<LimitExpr> {
        match self.next() {
            Some(Token::Int(n)) => Ok(LimitExpr::Literal(n)),
            Some(Token::Ident(s)) if s == "size" => {
                self.expect(Token::LParen, "'('")?;
                let entity = self.expect_ident("entity name")?;
                self.expect(Token::RParen, "')'")?;
                Ok(LimitExpr::Size(entity))
            }
            Some(Token::Ident(s)) => Ok(LimitExpr::Counter(s)),
            other => Err(self.error(format!("expected bound, found {}", describe(other)))),
        }
    }

    fn parse_domain(&mut self) -> Result<DomainExpr> {
        // A range domain has exactly two bands; anything else is an item list.
        let start = self.pos;
        if let Ok(lower) = self.parse_band() {
            if self.eat(&Token::DotDot) {
                let upper = self.parse_band()?;
                if !self.at_end() {
                    return Err(self.error("trailing input after range domain"));
                }
                return Ok(DomainExpr::Range { lower, upper });
            }
        }
        self.pos = start;

        let mut items = vec![self.parse_item()?];
        while self.eat(&Token::Comma) {
            items.push(self.parse_item()?);
        }
        if !self.at_end() {
            return Err(self.error("trailing input after list domain"));
        }
        Ok(DomainExpr::List(items))
    }

    fn parse_band(&mut self) -> Result<Band> {
        match self.next() {
            Some(Token::Int(n)) => Ok(Band::Int(n)),
            Some(Token::Minus) => match self.next() {
                Some(Token::Int(n)) => Ok(Band::Int(-n)),
                other => Err(self.error(format!("expected integer, found {}", describe(other)))),
            },
            Some(Token::CharLit(c)) => Ok(Band::Char(c)),
            Some(Token::Ident(s)) if s == "size" => {
                self.expect(Token::LParen, "'('")?;
                let entity = self.expect_ident("entity name")?;
                self.expect(Token::RParen, "')'")?;
                Ok(Band::Size(entity))
            }
            other => Err(self.error(format!("expected band, found {}", describe(other)))),
        }
    }

    fn parse_item(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::StrLit(s)) | Some(Token::Ident(s)) => Ok(s),
            other => Err(self.error(format!("expected item, found {}", describe(other)))),
        }
    }
}

fn describe(token: Option<Token>) -> String {
    match token {
        Some(t) => format!("'{}'", t),
        None => "end of input".to_string(),
    }
}

/// A bare identifier is lexed as an item literal; once the expander clause is
/// known, identifiers matching a declared counter are reclassified as counter
/// references so the repeater and converter can tell them apart.
fn reclassify_counters(expr: &mut ConstraintExpr) {
    let Some(expander) = &expr.expander else {
        return;
    };
    let names: Vec<&str> = expander.counters.iter().map(|c| c.name.as_str()).collect();

    for operand in [&mut expr.lhs, &mut expr.rhs] {
        if let Operand::Literal(Literal::Item(name)) = operand {
            if names.contains(&name.as_str()) {
                *operand = Operand::Counter(std::mem::take(name));
            }
        }
    }
}

/// Parses a constraint expression, including any trailing expander clause.
pub fn parse_constraint(text: &str) -> Result<ConstraintExpr> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::parse(text, "empty expression"));
    }
    Parser::new(trimmed)?.parse_constraint()
}

/// Parses an inline domain expression (range or item list).
pub fn parse_domain(text: &str) -> Result<DomainExpr> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::parse(text, "empty domain expression"));
    }
    Parser::new(trimmed)?.parse_domain()
}
