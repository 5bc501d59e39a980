//! Duration decode: a rhythm token (digit + optional suffix) to a quanta
//! count, per spec §4.2. `0` quanta is the grace sentinel and never carries
//! a suffix.

use crate::error::{self, LibResult};

pub(crate) const GRACE: i64 = 0;

fn base_quanta(digit: char, line: u32) -> LibResult<i64> {
    Ok(match digit {
        '1' => 6,
        '2' => 12,
        '3' => 24,
        '4' => 48,
        '5' => 96,
        '6' => 192,
        '7' => 384,
        '8' => 32,
        '9' => 64,
        _ => return error::BadDur { line: Some(line) }.fail(),
    })
}

/// Decodes one rhythm token (e.g. `"5"`, `"5'"`, `"5."`, `"5,"`, or the grace
/// token `"0"`) into a quanta count. Returns `GRACE` (`0`) for the grace
/// token.
pub(crate) fn decode_single_duration(text: &str, line: u32) -> LibResult<i64> {
    let mut chars = text.chars();
    let digit = chars.next().expect("rhythm token always has a leading digit");
    if digit == '0' {
        if chars.next().is_some() {
            return error::BadDur { line: Some(line) }.fail();
        }
        return Ok(GRACE);
    }
    let base = base_quanta(digit, line)?;
    let q = match chars.next() {
        None => base,
        Some('\'') => base
            .checked_mul(2)
            .ok_or(())
            .or_else(|_| error::LongDur { line: Some(line) }.fail())?,
        Some('.') => base
            .checked_mul(3)
            .map(|v| v / 2)
            .ok_or(())
            .or_else(|_| error::LongDur { line: Some(line) }.fail())?,
        Some(',') => base / 2,
        Some(_) => unreachable!("lexer only accumulates valid rhythm suffix characters"),
    };
    Ok(q)
}

/// Sums the component durations of a `[ ... ]` rhythm group. Fails with
/// `InGrace` if any component is the grace token.
pub(crate) fn sum_group(components: &[(String, u32)]) -> LibResult<i64> {
    let mut total: i64 = 0;
    for (text, line) in components {
        let q = decode_single_duration(text, *line)?;
        if q == GRACE {
            return error::InGrace { line: Some(*line) }.fail();
        }
        total = total
            .checked_add(q)
            .ok_or(())
            .or_else(|_| error::LongDur { line: Some(*line) }.fail())?;
    }
    Ok(total)
}
