//! In-memory stand-ins for the hardware seams. Unit tests drive them directly;
//! the daemon's simulate mode runs the whole appliance on them.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::hal::{DigitalIo, HygroProbe, Level, ProbeError, Reading, TextScreen};

/// Digital lines held in a shared map. Clones share the same lines, so a test
/// can keep one handle while the component under test owns another. Lines
/// float low until driven or forced.
#[derive(Clone, Default)]
pub struct MemIo {
    lines: Rc<RefCell<HashMap<u8, LineState>>>,
}

#[derive(Default)]
struct LineState {
    level: Option<Level>,
    writes: Vec<Level>,
}

impl MemIo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces a line from outside, as though external hardware drove it.
    pub fn force(&self, pin: u8, level: Level) {
        self.lines.borrow_mut().entry(pin).or_default().level = Some(level);
    }

    /// Current level on a line.
    #[must_use]
    pub fn level(&self, pin: u8) -> Level {
        self.lines
            .borrow()
            .get(&pin)
            .and_then(|l| l.level)
            .unwrap_or(Level::Low)
    }

    /// Every level written to a line through [`DigitalIo`], oldest first.
    #[must_use]
    pub fn writes(&self, pin: u8) -> Vec<Level> {
        self.lines
            .borrow()
            .get(&pin)
            .map_or_else(Vec::new, |l| l.writes.clone())
    }
}

impl DigitalIo for MemIo {
    type Error = Infallible;

    fn write_level(&mut self, pin: u8, level: Level) -> Result<(), Infallible> {
        let mut lines = self.lines.borrow_mut();
        let line = lines.entry(pin).or_default();
        line.level = Some(level);
        line.writes.push(level);
        Ok(())
    }

    fn read_level(&mut self, pin: u8) -> Result<Level, Infallible> {
        Ok(self.level(pin))
    }
}

/// Character panel kept in a shared grid of bytes. Clones share the grid.
#[derive(Clone)]
pub struct MemScreen {
    inner: Rc<RefCell<ScreenState>>,
}

struct ScreenState {
    cells: Vec<Vec<u8>>,
    col: u8,
    row: u8,
    visible: bool,
}

impl MemScreen {
    /// 16x2 panel, the appliance's stock geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(16, 2)
    }

    #[must_use]
    pub fn with_size(cols: u8, rows: u8) -> Self {
        let cells = vec![vec![b' '; cols as usize]; rows as usize];
        Self {
            inner: Rc::new(RefCell::new(ScreenState {
                cells,
                col: 0,
                row: 0,
                visible: true,
            })),
        }
    }

    #[must_use]
    pub fn visible(&self) -> bool {
        self.inner.borrow().visible
    }

    #[must_use]
    pub fn byte_at(&self, col: u8, row: u8) -> u8 {
        self.inner.borrow().cells[row as usize][col as usize]
    }

    /// `len` cells starting at (col, row), as a string.
    #[must_use]
    pub fn text_at(&self, col: u8, row: u8, len: usize) -> String {
        let inner = self.inner.borrow();
        let line = &inner.cells[row as usize];
        line[col as usize..col as usize + len]
            .iter()
            .map(|&b| char::from(b))
            .collect()
    }

    /// Contents of one row.
    #[must_use]
    pub fn line(&self, row: u8) -> String {
        let inner = self.inner.borrow();
        self.text_at(0, row, inner.cells[row as usize].len())
    }

    /// Whole grid, rows joined with newlines.
    #[must_use]
    pub fn frame(&self) -> String {
        let rows = self.inner.borrow().cells.len();
        (0..rows)
            .map(|r| self.line(r as u8))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn put(&self, b: u8) {
        let mut s = self.inner.borrow_mut();
        let (col, row) = (s.col as usize, s.row as usize);
        if row < s.cells.len() && col < s.cells[row].len() {
            s.cells[row][col] = b;
        }
        // The cursor keeps advancing past the edge, like DDRAM addressing;
        // out-of-range cells just swallow the write.
        s.col = s.col.saturating_add(1);
    }
}

impl Default for MemScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl TextScreen for MemScreen {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Infallible> {
        let mut s = self.inner.borrow_mut();
        for row in &mut s.cells {
            row.fill(b' ');
        }
        s.col = 0;
        s.row = 0;
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Infallible> {
        let mut s = self.inner.borrow_mut();
        s.col = col;
        s.row = row;
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), Infallible> {
        for b in text.bytes() {
            self.put(b);
        }
        Ok(())
    }

    fn write_byte(&mut self, b: u8) -> Result<(), Infallible> {
        self.put(b);
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), Infallible> {
        self.inner.borrow_mut().visible = visible;
        Ok(())
    }
}

/// Delay source that only counts milliseconds. Clones share the counter;
/// microsecond delays are ignored.
#[derive(Clone, Default)]
pub struct MemDelay {
    total_ms: Rc<Cell<u64>>,
}

impl MemDelay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn total_ms(&self) -> u64 {
        self.total_ms.get()
    }
}

impl DelayMs<u16> for MemDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.total_ms.set(self.total_ms.get() + u64::from(ms));
    }
}

impl DelayUs<u16> for MemDelay {
    fn delay_us(&mut self, _us: u16) {}
}

/// Probe that replays a canned script of results. A one-shot script repeats
/// its final entry once exhausted; a cycling script wraps around.
pub struct ScriptedProbe {
    script: Vec<Result<Reading, ProbeError>>,
    pos: usize,
    looping: bool,
}

impl ScriptedProbe {
    #[must_use]
    pub fn new(script: Vec<Result<Reading, ProbeError>>) -> Self {
        Self {
            script,
            pos: 0,
            looping: false,
        }
    }

    #[must_use]
    pub fn cycle(script: Vec<Result<Reading, ProbeError>>) -> Self {
        Self {
            script,
            pos: 0,
            looping: true,
        }
    }
}

impl HygroProbe for ScriptedProbe {
    fn read(&mut self) -> Result<Reading, ProbeError> {
        if self.script.is_empty() {
            return Err(ProbeError::Timeout);
        }
        let res = self.script[self.pos];
        if self.pos + 1 < self.script.len() {
            self.pos += 1;
        } else if self.looping {
            self.pos = 0;
        }
        res
    }
}
