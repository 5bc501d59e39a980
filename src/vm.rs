//! The stateful virtual machine: registers, four bounded stacks, note
//! emission, and grace-note retrofitting (spec §3 "VM state", §4.3).
//!
//! Packaged as a value whose lifetime is one compile (spec §9), rather than
//! the source's module-global state with a lazy-init flag.

use crate::error::{self, LibResult};
use crate::event::{NoteEvent, Score};
use crate::pitchset::PitchSet;
use crate::rhythm::GRACE;
use snafu::OptionExt;

const MAX_STACK_DEPTH: usize = 1024;
const MAX_SECTION_INDEX: u32 = 65_534;
const CUE_MAX: i64 = 0x3d_ffff;
const CURSOR_MAX: i64 = i32::MAX as i64;

/// A one-based layer number (`&<n>`/`+<n>`'s operand), validated once here
/// instead of repeating the same `1..=65536` bound check at each call site.
ranged!(LayerNumber, i64, 1, 65536, BadLayer, pub(crate));

/// A `(section, layer_i)` pair, as spec §3 declares `layer_stack` and
/// `base_layer`'s element type. The section half is kept for parity with
/// that declared type; note emission always takes its `sect` from the VM's
/// current section, not from a stacked layer entry.
type Layer = (u32, u16);

#[derive(Debug, Default)]
struct BoundedStack<T> {
    items: Vec<T>,
}

impl<T: Copy> BoundedStack<T> {
    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn peek(&self) -> Option<T> {
        self.items.last().copied()
    }

    fn push(&mut self, value: T, line: u32) -> LibResult<()> {
        if self.items.len() >= MAX_STACK_DEPTH {
            return error::StackFull { line: Some(line) }.fail();
        }
        self.items.push(value);
        Ok(())
    }

    fn pop(&mut self, line: u32) -> LibResult<T> {
        self.items.pop().context(error::Underflow { line: Some(line) })
    }
}

pub(crate) struct Vm {
    score: Score,

    cursor: u32,
    pitch_reg: Option<PitchSet>,
    dur_reg: Option<i64>,
    sect: u32,
    baset: u32,
    base_layer: Layer,
    imm_art: Option<u8>,
    grace_count: i64,
    grace_offset: i64,

    location_stack: BoundedStack<u32>,
    trans_stack: BoundedStack<i32>,
    layer_stack: BoundedStack<Layer>,
    art_stack: BoundedStack<u8>,
}

impl Vm {
    pub(crate) fn new() -> Self {
        Self {
            score: Score::new(),
            cursor: 0,
            pitch_reg: None,
            dur_reg: None,
            sect: 0,
            baset: 0,
            base_layer: (0, 0),
            imm_art: None,
            grace_count: 0,
            grace_offset: 0,
            location_stack: BoundedStack::default(),
            trans_stack: BoundedStack::default(),
            layer_stack: BoundedStack::default(),
            art_stack: BoundedStack::default(),
        }
    }

    /// Consumes the VM, handing back the score it built. Call only after
    /// [`Vm::eof`] has succeeded.
    pub(crate) fn into_score(self) -> Score {
        self.score
    }

    fn require_stacks_empty(&self, line: u32) -> LibResult<()> {
        if !self.location_stack.is_empty()
            || !self.trans_stack.is_empty()
            || !self.layer_stack.is_empty()
            || !self.art_stack.is_empty()
        {
            return error::Linger { line: Some(line) }.fail();
        }
        if self.imm_art.is_some() {
            return error::DangleArt { line: Some(line) }.fail();
        }
        Ok(())
    }

    /// Clears `pitch_reg`/`dur_reg` and flushes any pending grace run. Used
    /// at the three boundaries (`$`, `@`, `:`) spec §4.3 calls "reset
    /// current registers".
    fn reset_registers(&mut self) {
        self.flush_grace();
        self.pitch_reg = None;
        self.dur_reg = None;
    }

    /// Grace flush (spec §4.3): rewrites the last `grace_count` events'
    /// `dur` so offsets run chronologically, then clears grace state.
    fn flush_grace(&mut self) {
        if self.grace_count > 0 {
            let k = self.grace_offset;
            let tail = self.score.tail_mut(self.grace_count as usize);
            for note in tail.iter_mut() {
                let orig = -(note.dur as i64);
                note.dur = (-((k + 1) - orig)) as i32;
            }
        }
        self.grace_count = 0;
        self.grace_offset = 0;
    }

    fn advance(&mut self, d: i64, line: u32) -> LibResult<()> {
        if d <= 0 {
            return Ok(());
        }
        let new = self.cursor as i64 + d;
        if new > CURSOR_MAX {
            return error::LongPiece { line: Some(line) }.fail();
        }
        self.cursor = new as u32;
        Ok(())
    }

    fn current_layer(&self) -> Layer {
        self.layer_stack.peek().unwrap_or(self.base_layer)
    }

    fn current_art(&mut self) -> u8 {
        if let Some(a) = self.imm_art.take() {
            a
        } else {
            self.art_stack.peek().unwrap_or(0)
        }
    }

    /// Repeat semantics (spec §4.3): emits one note per pitch in `pitch_reg`
    /// (ascending), or none for a rest, then advances the cursor.
    fn repeat_once(&mut self, line: u32) -> LibResult<()> {
        let pitch_reg = self.pitch_reg.context(error::NoPitch { line: Some(line) })?;
        let dur_reg = self.dur_reg.context(error::NoDur { line: Some(line) })?;

        if dur_reg == GRACE {
            self.grace_offset = self
                .grace_offset
                .checked_add(1)
                .context(error::HugeGrace { line: Some(line) })?;
        }
        let d: i64 = if self.grace_offset > 0 { -self.grace_offset } else { dur_reg };

        let art = self.current_art();
        let layer = self.current_layer();
        let t = self.cursor;
        let sect = self.sect as u16;

        for pitch in pitch_reg.iter_ascending() {
            let note = NoteEvent {
                t,
                dur: d as i32,
                pitch: pitch.get(),
                art: art as u16,
                sect,
                layer_i: layer.1,
            };
            if !self.score.append_note(note) {
                return error::ManyNotes { line: Some(line) }.fail();
            }
            if d < 0 {
                self.grace_count = self
                    .grace_count
                    .checked_add(1)
                    .context(error::HugeGrace { line: Some(line) })?;
            }
        }
        self.advance(d, line)
    }

    pub(crate) fn pitch_set(&mut self, ps: PitchSet, line: u32) -> LibResult<()> {
        let mut transposed = ps;
        let delta = self.trans_stack.peek().unwrap_or(0);
        if delta != 0 {
            transposed.transpose(delta, Some(line))?;
        }
        self.pitch_reg = Some(transposed);
        self.repeat_once(line)
    }

    pub(crate) fn duration(&mut self, q: i64, _line: u32) -> LibResult<()> {
        if self.dur_reg == Some(GRACE) && q != GRACE {
            self.flush_grace();
        }
        self.dur_reg = Some(q);
        Ok(())
    }

    pub(crate) fn repeat(&mut self, line: u32) -> LibResult<()> {
        self.repeat_once(line)
    }

    pub(crate) fn repeat_n(&mut self, n: i64, line: u32) -> LibResult<()> {
        if n < 1 {
            return error::MultCount { line: Some(line) }.fail();
        }
        for _ in 0..n {
            self.repeat_once(line)?;
        }
        Ok(())
    }

    pub(crate) fn new_section(&mut self, line: u32) -> LibResult<()> {
        self.require_stacks_empty(line)?;
        self.reset_registers();
        let new_sect = self.sect + 1;
        if new_sect > MAX_SECTION_INDEX {
            return error::ManySect { line: Some(line) }.fail();
        }
        if !self.score.add_section(self.cursor) {
            return error::ManySect { line: Some(line) }.fail();
        }
        self.sect = new_sect;
        self.baset = self.cursor;
        self.base_layer = (self.sect, 0);
        Ok(())
    }

    pub(crate) fn rewind_section(&mut self, line: u32) -> LibResult<()> {
        self.require_stacks_empty(line)?;
        self.reset_registers();
        self.cursor = self.baset;
        self.base_layer.1 = 0;
        Ok(())
    }

    pub(crate) fn push_loc(&mut self, line: u32) -> LibResult<()> {
        self.location_stack.push(self.cursor, line)
    }

    pub(crate) fn return_loc(&mut self, line: u32) -> LibResult<()> {
        if self.imm_art.is_some() {
            return error::DangleArt { line: Some(line) }.fail();
        }
        let loc = self.location_stack.peek().context(error::NoLoc { line: Some(line) })?;
        self.reset_registers();
        self.cursor = loc;
        Ok(())
    }

    pub(crate) fn pop_loc(&mut self, line: u32) -> LibResult<()> {
        self.location_stack.pop(line).map(|_| ())
    }

    pub(crate) fn push_trans(&mut self, n: i32, line: u32) -> LibResult<()> {
        let top = self.trans_stack.peek().unwrap_or(0) as i64;
        let new = top + n as i64;
        if new < i32::MIN as i64 || new > i32::MAX as i64 {
            return error::HugeTrans { line: Some(line) }.fail();
        }
        self.trans_stack.push(new as i32, line)
    }

    pub(crate) fn pop_trans(&mut self, line: u32) -> LibResult<()> {
        self.trans_stack.pop(line).map(|_| ())
    }

    pub(crate) fn set_imm_art(&mut self, k: u8) {
        self.imm_art = Some(k);
    }

    pub(crate) fn push_art(&mut self, k: u8, line: u32) -> LibResult<()> {
        self.art_stack.push(k, line)
    }

    pub(crate) fn pop_art(&mut self, line: u32) -> LibResult<()> {
        self.art_stack.pop(line).map(|_| ())
    }

    pub(crate) fn set_base_layer(&mut self, n: i64, line: u32) -> LibResult<()> {
        let layer = LayerNumber::new(n, Some(line))?;
        self.base_layer.1 = (layer.get() - 1) as u16;
        Ok(())
    }

    pub(crate) fn push_layer(&mut self, n: i64, line: u32) -> LibResult<()> {
        let layer = LayerNumber::new(n, Some(line))?;
        self.layer_stack.push((self.sect, (layer.get() - 1) as u16), line)
    }

    pub(crate) fn pop_layer(&mut self, line: u32) -> LibResult<()> {
        self.layer_stack.pop(line).map(|_| ())
    }

    pub(crate) fn cue(&mut self, c: i64, line: u32) -> LibResult<()> {
        if !(0..=CUE_MAX).contains(&c) {
            return error::CueNum { line: Some(line) }.fail();
        }
        self.flush_grace();
        let note = NoteEvent {
            t: self.cursor,
            dur: 0,
            pitch: 0,
            art: (c >> 16) as u16,
            sect: self.sect as u16,
            layer_i: (c & 0xffff) as u16,
        };
        if !self.score.append_note(note) {
            return error::ManyNotes { line: Some(line) }.fail();
        }
        Ok(())
    }

    pub(crate) fn eof(&mut self, line: u32) -> LibResult<()> {
        self.require_stacks_empty(line)?;
        self.flush_grace();
        Ok(())
    }
}
