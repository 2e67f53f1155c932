use anyhow::Context;
use doorlock_core::types::GestureSymbol;
use std::collections::VecDeque;
use std::io::{self, BufRead, Lines};

/// Parse one stable gesture token, range-checked against `max_fingers`.
pub fn parse_symbol(token: &str, max_fingers: u8) -> anyhow::Result<GestureSymbol> {
    let symbol: GestureSymbol = token
        .parse()
        .with_context(|| format!("bad gesture token '{token}'"))?;
    match symbol.count() {
        Some(n) => Ok(GestureSymbol::from_count(u32::from(n), max_fingers)?),
        None => Ok(symbol),
    }
}

/// Parse one raw frame reading. No range check: the stabilizer drops
/// impossible counts itself.
pub fn parse_reading(token: &str) -> anyhow::Result<Option<u8>> {
    let symbol: GestureSymbol = token
        .parse()
        .with_context(|| format!("bad gesture token '{token}'"))?;
    Ok(symbol.count())
}

/// Whitespace-separated tokens from a line-oriented reader.
pub struct Tokens<R> {
    lines: Lines<R>,
    pending: VecDeque<String>,
}

impl<R: BufRead> Tokens<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            pending: VecDeque::new(),
        }
    }
}

impl<R: BufRead> Iterator for Tokens<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(Ok(token));
            }
            match self.lines.next()? {
                Ok(line) => self
                    .pending
                    .extend(line.split_whitespace().map(str::to_string)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
