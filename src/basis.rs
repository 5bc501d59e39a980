//! Time basis: the unit `t` and `dur` fields are counted in (spec §3, §4.6).
//! The compiler itself always works in `Q96`; `R44100`/`R48000` exist so a
//! file produced by resampling downstream can still round-trip through this
//! codec.

use crate::error::{self, LibResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Basis {
    /// 96 quanta per quarter note.
    Q96,
    /// 44,100 quanta per second.
    R44100,
    /// 48,000 quanta per second.
    R48000,
}

impl Default for Basis {
    fn default() -> Self {
        Basis::Q96
    }
}

impl Basis {
    pub(crate) fn code(self) -> u16 {
        match self {
            Basis::Q96 => 0,
            Basis::R44100 => 1,
            Basis::R48000 => 2,
        }
    }

    pub(crate) fn from_code(code: u16) -> LibResult<Self> {
        match code {
            0 => Ok(Basis::Q96),
            1 => Ok(Basis::R44100),
            2 => Ok(Basis::R48000),
            _ => error::BadFile.fail(),
        }
    }
}
