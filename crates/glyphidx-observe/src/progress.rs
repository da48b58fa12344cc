use std::io::{self, Stderr, Write};

pub const DEFAULT_BAR_LEN: usize = 60;

/// Terminal progress bar for single-pass batch jobs.
///
/// Redraws `\r[####    ] 42%` in place, only when the integer percentage
/// changes, so a scan over millions of entries emits at most 101 updates.
/// The reporter owns its last-drawn state; nothing is process-global.
pub struct Progress<W: Write = Stderr> {
    out: W,
    total: u64,
    done: u64,
    last_percent: Option<u32>,
    bar_len: usize,
}

impl Progress<Stderr> {
    pub fn stderr(total: u64) -> Self {
        Self::new(io::stderr(), total)
    }
}

impl<W: Write> Progress<W> {
    pub fn new(out: W, total: u64) -> Self {
        Self {
            out,
            total,
            done: 0,
            last_percent: None,
            bar_len: DEFAULT_BAR_LEN,
        }
    }

    pub fn with_bar_len(mut self, bar_len: usize) -> Self {
        self.bar_len = bar_len;
        self
    }

    pub fn done(&self) -> u64 {
        self.done
    }

    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        let done = self.done.min(self.total) as u128;
        let total = self.total as u128;
        ((done * 200 + total) / (2 * total)) as u32
    }

    fn filled(&self) -> usize {
        if self.total == 0 {
            return self.bar_len;
        }
        let done = self.done.min(self.total) as u128;
        let total = self.total as u128;
        let len = self.bar_len as u128;
        ((done * len * 2 + total) / (2 * total)) as usize
    }

    /// Records one finished item. Returns `true` if the bar was redrawn.
    pub fn advance(&mut self) -> io::Result<bool> {
        self.advance_by(1)
    }

    pub fn advance_by(&mut self, n: u64) -> io::Result<bool> {
        self.done = self.done.saturating_add(n);
        let percent = self.percent();
        if self.last_percent.is_some_and(|p| p >= percent) {
            return Ok(false);
        }
        self.last_percent = Some(percent);

        let filled = self.filled();
        let hashes = "#".repeat(filled);
        let spaces = " ".repeat(self.bar_len.saturating_sub(filled));
        write!(self.out, "\r[{hashes}{spaces}] {percent}%")?;
        self.out.flush()?;
        Ok(true)
    }

    /// Terminates the bar line (if one was drawn) and returns the writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.last_percent.is_some() {
            writeln!(self.out)?;
            self.out.flush()?;
        }
        Ok(self.out)
    }
}
