//! Tokenizer

use crate::error::CompileError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    Bool(bool),
    Null,
    Undefined,
    /// Binary operator, including `in` and `-`
    Op(&'static str),
    Bang,
    Dot,
    Comma,
    Colon,
    Question,
    Pipe,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Longest operators first so `>=` wins over `>`
const OPERATORS: &[&str] = &[
    "==", "!=", ">=", "<=", "&&", "||", "//", ">", "<", "+", "-", "*", "/", "%", "^",
];

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;

        if c.is_ascii_digit() {
            pos = scan_number(bytes, pos);
            let text = &source[start..pos];
            let n: f64 = text
                .parse()
                .map_err(|_| CompileError::new(format!("invalid number '{}'", text), start))?;
            tokens.push(Token {
                kind: TokenKind::Number(n),
                offset: start,
            });
            continue;
        }

        if c == b'\'' || c == b'"' {
            let (text, end) = scan_string(source, pos)?;
            pos = end;
            tokens.push(Token {
                kind: TokenKind::Str(text),
                offset: start,
            });
            continue;
        }

        if is_ident_start(c) {
            while pos < bytes.len() && is_ident_continue(bytes[pos]) {
                pos += 1;
            }
            let kind = match &source[start..pos] {
                "true" => TokenKind::Bool(true),
                "false" => TokenKind::Bool(false),
                "null" => TokenKind::Null,
                "undefined" => TokenKind::Undefined,
                "in" => TokenKind::Op("in"),
                word => TokenKind::Ident(word.to_string()),
            };
            tokens.push(Token { kind, offset: start });
            continue;
        }

        if let Some(op) = OPERATORS
            .iter()
            .find(|op| source[pos..].starts_with(**op))
        {
            pos += op.len();
            tokens.push(Token {
                kind: TokenKind::Op(*op),
                offset: start,
            });
            continue;
        }

        let kind = match c {
            b'!' => TokenKind::Bang,
            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b'?' => TokenKind::Question,
            b'|' => TokenKind::Pipe,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            _ => {
                let ch = source[pos..].chars().next().unwrap_or('?');
                return Err(CompileError::new(
                    format!("unexpected character '{}'", ch),
                    start,
                ));
            }
        };
        pos += 1;
        tokens.push(Token { kind, offset: start });
    }

    Ok(tokens)
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_ident_continue(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn scan_number(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos + 1 < bytes.len() && bytes[pos] == b'.' && bytes[pos + 1].is_ascii_digit() {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    pos
}

fn scan_string(source: &str, start: usize) -> Result<(String, usize), CompileError> {
    let mut chars = source[start..].char_indices();
    let quote = match chars.next() {
        Some((_, q)) => q,
        None => return Err(CompileError::new("unterminated string", start)),
    };
    let mut text = String::new();

    while let Some((i, ch)) = chars.next() {
        match ch {
            c if c == quote => return Ok((text, start + i + c.len_utf8())),
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, 'r')) => text.push('\r'),
                Some((_, escaped)) => text.push(escaped),
                None => break,
            },
            c => text.push(c),
        }
    }

    Err(CompileError::new("unterminated string", start))
}
