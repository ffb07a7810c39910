//! Parses a resolved selector string (post-interpolation) into a
//! `SelectorList`. A small hand-written scanner over `&str`, since by this
//! point interpolation has already been evaluated to plain text.

use codemap::Span;

use crate::error::{SassError, SassResult};
use crate::selector::{
    Combinator, ComplexComponent, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector,
};

struct SelectorParser<'a> {
    chars: Vec<char>,
    pos: usize,
    span: Span,
    src: &'a str,
}

pub fn parse_selector_list(src: &str, span: Span) -> SassResult<SelectorList> {
    let mut parser = SelectorParser {
        chars: src.chars().collect(),
        pos: 0,
        span,
        src,
    };
    parser.parse_list()
}

impl<'a> SelectorParser<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn err(&self, msg: &str) -> SassError {
        SassError::syntax(format!("{} (in selector \"{}\")", msg, self.src), self.span)
    }

    fn parse_list(&mut self) -> SassResult<SelectorList> {
        let mut complexes = Vec::new();
        self.skip_ws();
        if self.peek().is_none() {
            return Ok(SelectorList { complexes });
        }
        loop {
            complexes.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    self.skip_ws();
                }
                _ => break,
            }
        }
        Ok(SelectorList { complexes })
    }

    fn parse_complex(&mut self) -> SassResult<ComplexSelector> {
        let mut components = Vec::new();
        self.skip_ws();
        loop {
            if let Some(comb) = self.try_combinator() {
                components.push(ComplexComponent::Combinator(comb));
                self.skip_ws();
                continue;
            }
            match self.peek() {
                None | Some(',') => break,
                _ => {
                    let compound = self.parse_compound()?;
                    components.push(ComplexComponent::Compound(compound));
                }
            }
            let before = self.pos;
            self.skip_ws();
            if self.peek().is_none() || self.peek() == Some(',') {
                break;
            }
            if self.try_combinator_peek() {
                continue;
            }
            if before == self.pos {
                break;
            }
            components.push(ComplexComponent::Combinator(Combinator::Descendant));
        }
        Ok(ComplexSelector {
            components,
            line_break: false,
        })
    }

    fn try_combinator_peek(&self) -> bool {
        matches!(self.peek(), Some('>') | Some('+') | Some('~'))
    }

    fn try_combinator(&mut self) -> Option<Combinator> {
        match self.peek() {
            Some('>') => {
                self.bump();
                self.skip_ws();
                Some(Combinator::Child)
            }
            Some('+') => {
                self.bump();
                self.skip_ws();
                Some(Combinator::NextSibling)
            }
            Some('~') => {
                self.bump();
                self.skip_ws();
                Some(Combinator::LaterSibling)
            }
            _ => None,
        }
    }

    fn parse_compound(&mut self) -> SassResult<CompoundSelector> {
        let mut components = Vec::new();
        loop {
            match self.peek() {
                Some('*') => {
                    self.bump();
                    components.push(SimpleSelector::Universal);
                }
                Some('.') => {
                    self.bump();
                    let name = self.parse_ident()?;
                    components.push(SimpleSelector::Class(name));
                }
                Some('#') => {
                    self.bump();
                    let name = self.parse_ident()?;
                    components.push(SimpleSelector::Id(name));
                }
                Some('%') => {
                    self.bump();
                    let name = self.parse_ident()?;
                    components.push(SimpleSelector::Placeholder(name));
                }
                Some('&') => {
                    self.bump();
                    components.push(SimpleSelector::Parent);
                }
                Some('[') => {
                    self.bump();
                    components.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.bump();
                    let is_class = if self.peek() == Some(':') {
                        self.bump();
                        false
                    } else {
                        true
                    };
                    let name = self.parse_ident()?;
                    let (argument, selector) = if self.peek() == Some('(') {
                        self.bump();
                        let inner_start = self.pos;
                        let mut depth = 1;
                        while depth > 0 {
                            match self.bump() {
                                Some('(') => depth += 1,
                                Some(')') => depth -= 1,
                                Some(_) => {}
                                None => return Err(self.err("expected \")\".")),
                            }
                        }
                        let inner: String = self.chars[inner_start..self.pos - 1].iter().collect();
                        if is_selector_pseudo(&name) {
                            let nested = parse_selector_list(inner.trim(), self.span)?;
                            (None, Some(Box::new(nested)))
                        } else {
                            (Some(inner), None)
                        }
                    } else {
                        (None, None)
                    };
                    components.push(SimpleSelector::Pseudo {
                        name,
                        is_class,
                        argument,
                        selector,
                    });
                }
                Some(c) if is_ident_start(c) => {
                    let name = self.parse_ident()?;
                    components.push(SimpleSelector::Type(name));
                }
                _ => break,
            }
        }
        if components.is_empty() {
            return Err(self.err("expected selector."));
        }
        Ok(CompoundSelector { components })
    }

    fn parse_attribute(&mut self) -> SassResult<SimpleSelector> {
        self.skip_ws();
        let name = self.parse_ident()?;
        self.skip_ws();
        let op = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(SimpleSelector::Attribute {
                    name,
                    op: None,
                    value: None,
                    case_insensitive: false,
                });
            }
            Some('=') => {
                self.bump();
                "=".to_string()
            }
            Some(c) if matches!(c, '~' | '|' | '^' | '$' | '*') => {
                let c = self.bump().unwrap();
                if self.peek() != Some('=') {
                    return Err(self.err("expected \"=\"."));
                }
                self.bump();
                format!("{}=", c)
            }
            _ => return Err(self.err("expected \"]\".")),
        };
        self.skip_ws();
        let value = if matches!(self.peek(), Some('"') | Some('\'')) {
            let quote = self.bump().unwrap();
            let mut s = String::new();
            while self.peek() != Some(quote) {
                match self.bump() {
                    Some(c) => s.push(c),
                    None => return Err(self.err("unterminated attribute value.")),
                }
            }
            self.bump();
            s
        } else {
            self.parse_ident()?
        };
        self.skip_ws();
        let case_insensitive = matches!(self.peek(), Some('i') | Some('I'));
        if case_insensitive {
            self.bump();
            self.skip_ws();
        }
        if self.peek() != Some(']') {
            return Err(self.err("expected \"]\"."));
        }
        self.bump();
        Ok(SimpleSelector::Attribute {
            name,
            op: Some(op),
            value: Some(value),
            case_insensitive,
        })
    }

    fn parse_ident(&mut self) -> SassResult<String> {
        let mut s = String::new();
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            s.push(self.bump().unwrap());
        }
        if s.is_empty() {
            return Err(self.err("expected identifier."));
        }
        Ok(s)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || c as u32 > 127
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c as u32 > 127
}

fn is_selector_pseudo(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "is" | "matches" | "not" | "has" | "where" | "host" | "host-context" | "slotted" | "current" | "any"
    )
}
