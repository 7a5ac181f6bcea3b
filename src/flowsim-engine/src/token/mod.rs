// Copyright 2026 The Flowsim Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::str::CharIndices;

use lazy_static::lazy_static;
use unicode_xid::UnicodeXID;

use self::Token::*;
use crate::common::ErrorCode::*;
use crate::common::{EquationError, ErrorCode};


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'input> {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    LParen,
    RParen,
    Comma,
    Ident(&'input str),
    Num(&'input str),
}

fn error<T>(code: ErrorCode, start: usize, end: usize) -> Result<T, EquationError> {
    Err(EquationError {
        start: start as u16,
        end: end as u16,
        code,
    })
}

pub type Spanned<T> = (usize, T, usize);

pub struct Lexer<'input> {
    text: &'input str,
    chars: CharIndices<'input>,
    lookahead: Option<(usize, char)>,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        let mut t = Lexer {
            text: input,
            chars: input.char_indices(),
            lookahead: None,
        };
        t.bump();
        t
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.bump_n(1)
    }

    fn bump_n(&mut self, n: usize) -> Option<(usize, char)> {
        assert!(n > 0);
        self.lookahead = self.chars.nth(n - 1);
        self.lookahead
    }

    fn word(&mut self, idx0: usize) -> Spanned<&'input str> {
        match self.take_while(is_identifier_continue) {
            Some(end) => (idx0, &self.text[idx0..end], end),
            None => (idx0, &self.text[idx0..], self.text.len()),
        }
    }

    fn take_while<F>(&mut self, mut keep_going: F) -> Option<usize>
    where
        F: FnMut(char) -> bool,
    {
        self.take_until(|c| !keep_going(c))
    }

    fn take_until<F>(&mut self, mut terminate: F) -> Option<usize>
    where
        F: FnMut(char) -> bool,
    {
        loop {
            match self.lookahead {
                None => {
                    return None;
                }
                Some((idx1, c)) => {
                    if terminate(c) {
                        return Some(idx1);
                    } else {
                        self.bump();
                    }
                }
            }
        }
    }

    fn identifierish(&mut self, idx0: usize) -> Spanned<Token<'input>> {
        let (start, word, end) = self.word(idx0);
        (start, Ident(word), end)
    }

    fn number(&mut self, idx0: usize) -> Result<Spanned<Token<'input>>, EquationError> {
        use regex::{Match, Regex};

        lazy_static! {
            static ref NUMBER_RE: Regex =
                Regex::new(r"^\d*(\.\d*)?([eE][-+]?(\d*(\.\d*)?)?)?").unwrap();
        }

        let m: Match = match NUMBER_RE.find(&self.text[idx0..]) {
            Some(m) => m,
            None => return error(ExpectedNumber, idx0, idx0 + 1),
        };

        self.bump_n(m.end());

        let end = idx0 + m.end();
        let lexeme = &self.text[idx0..end];
        // the regex is permissive about partial fractions and exponents;
        // anything it matched that the float grammar rejects is an
        // invalid number, not two tokens
        if lexeme.parse::<f64>().is_err() {
            return error(ExpectedNumber, idx0, end);
        }
        Ok((idx0, Num(lexeme), end))
    }

    #[allow(clippy::unnecessary_wraps)]
    fn consume(
        &mut self,
        i: usize,
        tok: Token<'input>,
        len: usize,
    ) -> Option<Result<Spanned<Token<'input>>, EquationError>> {
        self.bump();
        Some(Ok((i, tok, i + len)))
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Result<Spanned<Token<'input>>, EquationError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            return match self.lookahead {
                Some((i, '+')) => self.consume(i, Plus, 1),
                Some((i, '-')) => self.consume(i, Minus, 1),
                Some((i, '*')) => self.consume(i, Mul, 1),
                Some((i, '/')) => self.consume(i, Div, 1),
                Some((i, '%')) => self.consume(i, Mod, 1),
                Some((i, '(')) => self.consume(i, LParen, 1),
                Some((i, ')')) => self.consume(i, RParen, 1),
                Some((i, ',')) => self.consume(i, Comma, 1),
                Some((i, '=')) => {
                    match self.bump() {
                        Some((_, '=')) => self.consume(i, Eq, 2),
                        // a single '=' is not assignment-as-expression
                        _ => Some(error(InvalidToken, i, i + 1)),
                    }
                }
                Some((i, '!')) => {
                    match self.bump() {
                        Some((_, '=')) => self.consume(i, Neq, 2),
                        _ => Some(error(InvalidToken, i, i + 1)),
                    }
                }
                Some((i, '<')) => {
                    match self.bump() {
                        Some((_, '=')) => self.consume(i, Lte, 2),
                        // we've already bumped, don't consume
                        _ => Some(Ok((i, Lt, i + 1))),
                    }
                }
                Some((i, '>')) => {
                    match self.bump() {
                        Some((_, '=')) => self.consume(i, Gte, 2),
                        // we've already bumped, don't consume
                        _ => Some(Ok((i, Gt, i + 1))),
                    }
                }
                Some((i, c)) if is_identifier_start(c) => Some(Ok(self.identifierish(i))),
                Some((i, c)) if is_number_start(c) => Some(self.number(i)),
                Some((_, c)) if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                Some((i, _)) => {
                    self.bump(); // eat whatever is killing us
                    let end = match self.lookahead {
                        Some((end, _)) => end,
                        None => self.text.len(),
                    };
                    Some(error(InvalidToken, i, end))
                }
                None => None,
            };
        }
    }
}

fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn is_identifier_start(c: char) -> bool {
    UnicodeXID::is_xid_start(c) || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    UnicodeXID::is_xid_continue(c)
}
