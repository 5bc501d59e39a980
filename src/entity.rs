//! Entity parser: turns a token stream into pitch sets, durations and VM
//! operator calls (spec §4.2). Dispatch is purely on the first token's
//! shape, as the teacher's `Message::parse`/`MetaEvent::parse` dispatch on a
//! leading status byte.

use crate::error::{self, LibResult};
use crate::event::Score;
use crate::lexer::Lexer;
use crate::pitch::decode_pitch;
use crate::pitchset::PitchSet;
use crate::reader::Reader;
use crate::rhythm::{decode_single_duration, sum_group};
use crate::token::Token;
use crate::vm::Vm;
use std::io::Read;

/// Practical nesting-depth ceiling for `(...)` pitch-set groups (spec
/// §4.2: "practical overflow -> TooDeep"). Matches the VM's stack depth so
/// the two bounded-recursion limits in this crate read as one number.
const MAX_GROUP_DEPTH: u32 = 1024;

fn parse_signed_param(payload: &str, line: u32) -> LibResult<i32> {
    payload.parse::<i32>().map_err(|_| ()).or_else(|_| error::BadOp { line: Some(line) }.fail())
}

fn decode_articulation(ch: u8, line: u32) -> LibResult<u8> {
    match ch {
        b'0'..=b'9' => Ok(ch - b'0'),
        b'A'..=b'Z' => Ok(10 + (ch - b'A')),
        b'a'..=b'z' => Ok(36 + (ch - b'a')),
        _ => error::BadOp { line: Some(line) }.fail(),
    }
}

/// Parses a `(...)` pitch-set group, already past the opening `(`.
fn build_pitch_group<R: Read>(lexer: &mut Lexer<R>) -> LibResult<PitchSet> {
    let mut ps = PitchSet::new();
    let mut depth: u32 = 1;
    loop {
        let tok = lexer.next_token()?;
        let line = tok.line();
        match tok {
            Token::Eof { .. } => return error::Unclosed { line: Some(line) }.fail(),
            Token::Atomic { ch: b'(', .. } => {
                depth = depth
                    .checked_add(1)
                    .filter(|&d| d <= MAX_GROUP_DEPTH)
                    .ok_or(())
                    .or_else(|_| error::TooDeep { line: Some(line) }.fail())?;
            }
            Token::Atomic { ch: b')', .. } => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Token::Atomic { ch: b'R', .. } | Token::Atomic { ch: b'r', .. } => {}
            Token::Pitch { text, .. } => ps.add(decode_pitch(&text, line)?),
            _ => return error::Unclosed { line: Some(line) }.fail(),
        }
    }
    Ok(ps)
}

/// Parses a `[...]` rhythm group, already past the opening `[`.
fn build_rhythm_group<R: Read>(lexer: &mut Lexer<R>) -> LibResult<i64> {
    let mut components = Vec::new();
    loop {
        let tok = lexer.next_token()?;
        let line = tok.line();
        match tok {
            Token::Eof { .. } => return error::Unclosed { line: Some(line) }.fail(),
            Token::Atomic { ch: b']', .. } => break,
            Token::Rhythm { text, .. } => components.push((text, line)),
            _ => return error::Unclosed { line: Some(line) }.fail(),
        }
    }
    sum_group(&components)
}

/// Compiles a full Noir source stream into a [`Score`].
pub(crate) fn compile<R: Read>(source: R) -> LibResult<Score> {
    let reader = Reader::new(source)?;
    let mut lexer = Lexer::new(reader);
    let mut vm = Vm::new();

    loop {
        let tok = lexer.next_token()?;
        let line = tok.line();
        match tok {
            Token::Eof { .. } => {
                vm.eof(line)?;
                break;
            }
            Token::Pitch { text, .. } => {
                let mut ps = PitchSet::new();
                ps.add(decode_pitch(&text, line)?);
                vm.pitch_set(ps, line)?;
            }
            Token::Rhythm { text, .. } => {
                let q = decode_single_duration(&text, line)?;
                vm.duration(q, line)?;
            }
            Token::Param { op, payload, .. } => {
                let n = parse_signed_param(&payload, line)?;
                match op {
                    b'\\' => vm.repeat_n(n as i64, line)?,
                    b'^' => vm.push_trans(n, line)?,
                    b'&' => vm.set_base_layer(n as i64, line)?,
                    b'+' => vm.push_layer(n as i64, line)?,
                    b'`' => vm.cue(n as i64, line)?,
                    _ => unreachable!("lexer only emits known parameter operators"),
                }
            }
            Token::Key { op, ch, .. } => {
                let k = decode_articulation(ch, line)?;
                match op {
                    b'*' => vm.set_imm_art(k),
                    b'!' => vm.push_art(k, line)?,
                    _ => unreachable!("lexer only emits known key operators"),
                }
            }
            Token::Atomic { ch, .. } => match ch {
                b'(' => {
                    let ps = build_pitch_group(&mut lexer)?;
                    vm.pitch_set(ps, line)?;
                }
                b'R' | b'r' => vm.pitch_set(PitchSet::new(), line)?,
                b'[' => {
                    let q = build_rhythm_group(&mut lexer)?;
                    vm.duration(q, line)?;
                }
                b')' | b']' => return error::Right { line: Some(line) }.fail(),
                b'/' => vm.repeat(line)?,
                b'$' => vm.new_section(line)?,
                b'@' => vm.rewind_section(line)?,
                b'{' => vm.push_loc(line)?,
                b':' => vm.return_loc(line)?,
                b'}' => vm.pop_loc(line)?,
                b'=' => vm.pop_trans(line)?,
                b'~' => vm.pop_art(line)?,
                b'-' => vm.pop_layer(line)?,
                _ => unreachable!("lexer only emits known atomic operators"),
            },
        }
    }
    Ok(vm.into_score())
}
