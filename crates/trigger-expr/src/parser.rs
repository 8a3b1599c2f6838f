//! Recursive-descent parser with precedence climbing for binary operators

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::CompileError;
use crate::eval::Evaluator;
use crate::lexer::{Token, TokenKind, tokenize};
use crate::value::Value;

/// Parse `source` into a tree. Blank input yields `None`.
pub(crate) fn parse(source: &str, evaluator: &Evaluator) -> Result<Option<Expr>, CompileError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        filter_depth: 0,
        evaluator,
    };
    let expr = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(CompileError::new(
            format!("unexpected {}", describe(&token.kind)),
            token.offset,
        ));
    }
    Ok(Some(expr))
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    filter_depth: usize,
    evaluator: &'a Evaluator,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn offset(&self) -> usize {
        self.peek().map(|t| t.offset).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), CompileError> {
        if self.eat(&kind) {
            return Ok(());
        }
        let found = self
            .peek_kind()
            .map(describe)
            .unwrap_or_else(|| "end of expression".to_string());
        Err(CompileError::new(
            format!("expected {}, found {}", describe(&kind), found),
            self.offset(),
        ))
    }

    fn expect_ident(&mut self) -> Result<(String, usize), CompileError> {
        let offset = self.offset();
        match self.advance() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Ok((name, offset)),
            Some(token) => Err(CompileError::new(
                format!("expected identifier, found {}", describe(&token.kind)),
                token.offset,
            )),
            None => Err(CompileError::new(
                "expected identifier, found end of expression",
                offset,
            )),
        }
    }

    fn expression(&mut self) -> Result<Expr, CompileError> {
        let test = self.binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.expression()?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr, CompileError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Op(symbol)) => match BinaryOp::from_symbol(symbol) {
                    Some(op) if op.precedence() >= min_precedence => op,
                    _ => break,
                },
                _ => break,
            };
            self.pos += 1;
            let right = self.binary(op.precedence() + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, CompileError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Bang) => UnaryOp::Not,
            Some(TokenKind::Op("-")) => UnaryOp::Negate,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    self.pos += 1;
                    let (name, _) = self.expect_ident()?;
                    expr = Expr::Identifier {
                        name,
                        from: Some(Box::new(expr)),
                        relative: false,
                    };
                }
                Some(TokenKind::LBracket) => {
                    self.pos += 1;
                    self.filter_depth += 1;
                    let predicate = self.expression();
                    self.filter_depth -= 1;
                    let predicate = predicate?;
                    self.expect(TokenKind::RBracket)?;
                    let relative = predicate.references_relative();
                    expr = Expr::Filter {
                        subject: Box::new(expr),
                        predicate: Box::new(predicate),
                        relative,
                    };
                }
                Some(TokenKind::Pipe) => {
                    self.pos += 1;
                    let (name, offset) = self.expect_ident()?;
                    if !self.evaluator.has_transform(&name) {
                        return Err(CompileError::new(
                            format!("unknown transform '{}'", name),
                            offset,
                        ));
                    }
                    let args = if self.eat(&TokenKind::LParen) {
                        self.arguments()?
                    } else {
                        Vec::new()
                    };
                    expr = Expr::Transform {
                        name,
                        subject: Box::new(expr),
                        args,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Comma-separated arguments after an opening parenthesis
    fn arguments(&mut self) -> Result<Vec<Expr>, CompileError> {
        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&TokenKind::RParen) {
                return Ok(args);
            }
            self.expect(TokenKind::Comma)?;
        }
    }

    fn primary(&mut self) -> Result<Expr, CompileError> {
        let offset = self.offset();
        let token = match self.advance() {
            Some(token) => token,
            None => {
                return Err(CompileError::new(
                    "unexpected end of expression",
                    offset,
                ));
            }
        };

        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::String(s))),
            TokenKind::Bool(b) => Ok(Expr::Literal(Value::Bool(b))),
            TokenKind::Null => Ok(Expr::Literal(Value::Null)),
            TokenKind::Undefined => Ok(Expr::Literal(Value::Undefined)),
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                let mut items = Vec::new();
                if !self.eat(&TokenKind::RBracket) {
                    loop {
                        items.push(self.expression()?);
                        if self.eat(&TokenKind::RBracket) {
                            break;
                        }
                        self.expect(TokenKind::Comma)?;
                    }
                }
                Ok(Expr::ArrayLiteral(items))
            }
            TokenKind::LBrace => self.object_literal(),
            TokenKind::Dot => {
                if self.filter_depth == 0 {
                    return Err(CompileError::new(
                        "relative identifier outside of a filter",
                        token.offset,
                    ));
                }
                let (name, _) = self.expect_ident()?;
                Ok(Expr::Identifier {
                    name,
                    from: None,
                    relative: true,
                })
            }
            TokenKind::Ident(name) => {
                if self.eat(&TokenKind::LParen) {
                    if !self.evaluator.has_function(&name) {
                        return Err(CompileError::new(
                            format!("unknown function '{}'", name),
                            token.offset,
                        ));
                    }
                    let args = self.arguments()?;
                    return Ok(Expr::FunctionCall { name, args });
                }
                Ok(Expr::Identifier {
                    name,
                    from: None,
                    relative: false,
                })
            }
            other => Err(CompileError::new(
                format!("unexpected {}", describe(&other)),
                token.offset,
            )),
        }
    }

    fn object_literal(&mut self) -> Result<Expr, CompileError> {
        let mut entries = Vec::new();
        if self.eat(&TokenKind::RBrace) {
            return Ok(Expr::ObjectLiteral(entries));
        }
        loop {
            let offset = self.offset();
            let key = match self.advance().map(|t| t.kind) {
                Some(TokenKind::Ident(key)) | Some(TokenKind::Str(key)) => key,
                _ => return Err(CompileError::new("expected object key", offset)),
            };
            self.expect(TokenKind::Colon)?;
            entries.push((key, self.expression()?));
            if self.eat(&TokenKind::RBrace) {
                return Ok(Expr::ObjectLiteral(entries));
            }
            self.expect(TokenKind::Comma)?;
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number {}", n),
        TokenKind::Str(s) => format!("string '{}'", s),
        TokenKind::Ident(name) => format!("identifier '{}'", name),
        TokenKind::Bool(b) => format!("'{}'", b),
        TokenKind::Null => "'null'".to_string(),
        TokenKind::Undefined => "'undefined'".to_string(),
        TokenKind::Op(op) => format!("'{}'", op),
        TokenKind::Bang => "'!'".to_string(),
        TokenKind::Dot => "'.'".to_string(),
        TokenKind::Comma => "','".to_string(),
        TokenKind::Colon => "':'".to_string(),
        TokenKind::Question => "'?'".to_string(),
        TokenKind::Pipe => "'|'".to_string(),
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
        TokenKind::LBracket => "'['".to_string(),
        TokenKind::RBracket => "']'".to_string(),
        TokenKind::LBrace => "'{'".to_string(),
        TokenKind::RBrace => "'}'".to_string(),
    }
}
