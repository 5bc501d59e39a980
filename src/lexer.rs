//! Tokeniser: byte stream -> [`Token`] stream. Grounded on the teacher's
//! `byte_iter.rs` peek/read shape, generalised from MIDI's fixed 4-byte
//! chunk tags down to the single-byte pushback spec §4.1 actually needs, and
//! on `core/message.rs`'s match-the-leading-byte dispatch style.

use crate::error::{self, LibResult};
use crate::reader::Reader;
use crate::token::Token;
use std::io::Read;

/// 31 characters plus terminator (spec §4.1).
const MAX_TOKEN_LEN: usize = 31;

const SP: u8 = b' ';
const HT: u8 = b'\t';
const LF: u8 = b'\n';
const CR: u8 = b'\r';

fn is_whitespace(b: u8) -> bool {
    matches!(b, SP | HT | LF | CR)
}

fn is_accidental(b: u8) -> bool {
    matches!(b, b'x' | b'X' | b's' | b'S' | b'n' | b'N' | b'h' | b'H' | b't' | b'T')
}

fn is_register(b: u8) -> bool {
    matches!(b, b'\'' | b',')
}

fn is_rhythm_suffix(b: u8) -> bool {
    matches!(b, b'\'' | b'.' | b',')
}

fn is_atomic(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'[' | b']' | b'R' | b'r' | b'/' | b'$' | b'@' | b'{' | b':' | b'}' | b'=' | b'~' | b'-'
    )
}

fn is_param_op(b: u8) -> bool {
    matches!(b, b'\\' | b'^' | b'&' | b'+' | b'`')
}

fn is_key_op(b: u8) -> bool {
    matches!(b, b'*' | b'!')
}

pub(crate) struct Lexer<R: Read> {
    reader: Reader<R>,
}

impl<R: Read> Lexer<R> {
    pub(crate) fn new(reader: Reader<R>) -> Self {
        Self { reader }
    }

    fn push(buf: &mut String, b: u8, line: u32) -> LibResult<()> {
        if buf.len() >= MAX_TOKEN_LEN {
            return error::LongToken { line: Some(line) }.fail();
        }
        buf.push(b as char);
        Ok(())
    }

    /// Skips whitespace and `#`-to-end-of-line comments. Returns the first
    /// substantive byte and the line it starts on, or `None` at end of
    /// input.
    fn skip_trivia(&mut self) -> LibResult<Option<(u8, u32)>> {
        loop {
            let b = match self.reader.next_byte()? {
                None => return Ok(None),
                Some(b) => b,
            };
            if is_whitespace(b) {
                continue;
            }
            if b == b'#' {
                loop {
                    match self.reader.next_byte()? {
                        None => return Ok(None),
                        Some(LF) => {
                            self.reader.pushback(LF);
                            break;
                        }
                        Some(_) => continue,
                    }
                }
                continue;
            }
            let line = self.reader.line();
            return Ok(Some((b, line)));
        }
    }

    pub(crate) fn next_token(&mut self) -> LibResult<Token> {
        let (first, line) = match self.skip_trivia()? {
            None => return Ok(Token::Eof { line: self.reader.line() }),
            Some(pair) => pair,
        };

        if matches!(first, b'A'..=b'G' | b'a'..=b'g') {
            return self.lex_pitch(first, line);
        }
        if first.is_ascii_digit() {
            return self.lex_rhythm(first, line);
        }
        if is_atomic(first) {
            return Ok(Token::Atomic { ch: first, line });
        }
        if is_param_op(first) {
            return self.lex_param(first, line);
        }
        if is_key_op(first) {
            return self.lex_key(first, line);
        }
        error::BadChar { line: Some(line) }.fail()
    }

    fn lex_pitch(&mut self, first: u8, line: u32) -> LibResult<Token> {
        let mut buf = String::new();
        Self::push(&mut buf, first, line)?;
        loop {
            let b = match self.reader.next_byte()? {
                None => break,
                Some(b) => b,
            };
            if is_accidental(b) || is_register(b) {
                Self::push(&mut buf, b, line)?;
            } else {
                self.reader.pushback(b);
                break;
            }
        }
        Ok(Token::Pitch { text: buf, line })
    }

    fn lex_rhythm(&mut self, first: u8, line: u32) -> LibResult<Token> {
        let mut buf = String::new();
        Self::push(&mut buf, first, line)?;
        if let Some(b) = self.reader.next_byte()? {
            if is_rhythm_suffix(b) {
                Self::push(&mut buf, b, line)?;
            } else {
                self.reader.pushback(b);
            }
        }
        Ok(Token::Rhythm { text: buf, line })
    }

    fn lex_param(&mut self, op: u8, line: u32) -> LibResult<Token> {
        let mut payload = String::new();
        loop {
            match self.reader.next_byte()? {
                None => return error::ParamTk { line: Some(line) }.fail(),
                Some(b';') => break,
                Some(b) if is_whitespace(b) => return error::ParamTk { line: Some(line) }.fail(),
                Some(b) => Self::push(&mut payload, b, line)?,
            }
        }
        Ok(Token::Param { op, payload, line })
    }

    fn lex_key(&mut self, op: u8, line: u32) -> LibResult<Token> {
        match self.reader.next_byte()? {
            None => error::KeyToken { line: Some(line) }.fail(),
            Some(b) if is_whitespace(b) => error::KeyToken { line: Some(line) }.fail(),
            Some(ch) => Ok(Token::Key { op, ch, line }),
        }
    }
}
