//! Character-level scanner. Grounded in the teacher's `Lexer`, which produced
//! a flat stream of single-`char` tokens; here the scanner groups characters
//! into idents/numbers/strings up front and stamps every token with a
//! `codemap::Span`, which the rest of the pipeline relies on for diagnostics.

use codemap::{File, Span};
use std::sync::Arc;

use crate::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    file: Arc<File>,
}

impl Lexer {
    pub fn new(file: Arc<File>) -> Self {
        let chars: Vec<char> = file.source().chars().collect();
        Lexer {
            chars,
            pos: 0,
            file,
        }
    }

    fn span(&self, start: usize) -> Span {
        // `codemap::File` offsets are byte offsets; since most Sass source is
        // ASCII-heavy we track char index as a byte-offset approximation is
        // unsafe for multi-byte content, so we recompute the byte offset by
        // re-encoding the slice up to `start`/`self.pos` once per token.
        let byte_start: usize = self.chars[..start].iter().map(|c| c.len_utf8()).sum();
        let byte_end: usize = self.chars[..self.pos].iter().map(|c| c.len_utf8()).sum();
        self.file
            .span
            .subspan(byte_start as u64, byte_end as u64)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    pub fn next_token(&mut self) -> Token {
        let start = self.pos;
        match self.peek() {
            None => Token::new(TokenKind::Eof, self.span(start)),
            Some(c) if c.is_whitespace() => {
                while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                    self.bump();
                }
                Token::new(TokenKind::Whitespace, self.span(start))
            }
            Some('/') if self.peek_at(1) == Some('/') => {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.bump();
                }
                Token::new(TokenKind::LineComment, self.span(start))
            }
            Some('/') if self.peek_at(1) == Some('*') => {
                self.bump();
                self.bump();
                let mut text = String::new();
                loop {
                    match self.peek() {
                        None => break,
                        Some('*') if self.peek_at(1) == Some('/') => {
                            self.bump();
                            self.bump();
                            break;
                        }
                        Some(c) => {
                            text.push(c);
                            self.bump();
                        }
                    }
                }
                Token::new(TokenKind::Comment(text), self.span(start))
            }
            Some('$') => {
                self.bump();
                let name = self.eat_ident_text();
                Token::new(TokenKind::Variable(name), self.span(start))
            }
            Some('#') if self.peek_at(1) == Some('{') => {
                self.bump();
                self.bump();
                Token::new(TokenKind::InterpolationStart, self.span(start))
            }
            Some('#') => {
                self.bump();
                Token::new(TokenKind::Hash, self.span(start))
            }
            Some(c) if c == '"' || c == '\'' => {
                let quote = c;
                self.bump();
                let mut text = String::new();
                loop {
                    match self.peek() {
                        None => break,
                        Some(c) if c == quote => {
                            self.bump();
                            break;
                        }
                        Some('\\') => {
                            self.bump();
                            if let Some(escaped) = self.bump() {
                                text.push(escaped);
                            }
                        }
                        Some(c) => {
                            text.push(c);
                            self.bump();
                        }
                    }
                }
                Token::new(TokenKind::Str(text, Some(quote)), self.span(start))
            }
            Some(c) if c.is_ascii_digit() => {
                let mut text = String::new();
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    text.push(self.bump().unwrap());
                }
                if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit())
                {
                    text.push(self.bump().unwrap());
                    while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                        text.push(self.bump().unwrap());
                    }
                }
                if matches!(self.peek(), Some('e') | Some('E'))
                    && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit() || c == '+' || c == '-')
                {
                    text.push(self.bump().unwrap());
                    if matches!(self.peek(), Some('+') | Some('-')) {
                        text.push(self.bump().unwrap());
                    }
                    while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                        text.push(self.bump().unwrap());
                    }
                }
                Token::new(TokenKind::Number(text), self.span(start))
            }
            Some(c) if is_ident_start(c) => {
                let name = self.eat_ident_text();
                Token::new(TokenKind::Ident(name), self.span(start))
            }
            Some(c) => {
                self.bump();
                Token::new(TokenKind::Symbol(c), self.span(start))
            }
        }
    }

    fn eat_ident_text(&mut self) -> String {
        let mut text = String::new();
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            text.push(self.bump().unwrap());
        }
        text
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut out = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = matches!(tok.kind, TokenKind::Eof);
            out.push(tok);
            if is_eof {
                break;
            }
        }
        out
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || c as u32 > 127
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c as u32 > 127
}
