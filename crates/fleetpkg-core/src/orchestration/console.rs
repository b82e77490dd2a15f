//! Operator-facing output, filtered by verbosity.

use std::io::Write;

use crate::config::Verbosity;

/// Writes progress to `out` and failures to `err`.
pub struct Console<'w> {
    out: Box<dyn Write + 'w>,
    err: Box<dyn Write + 'w>,
    verbosity: Verbosity,
}

impl<'w> Console<'w> {
    pub fn new(out: impl Write + 'w, err: impl Write + 'w, verbosity: Verbosity) -> Self {
        Self {
            out: Box::new(out),
            err: Box::new(err),
            verbosity,
        }
    }

    /// Process stdout and stderr.
    pub fn stdio(verbosity: Verbosity) -> Console<'static> {
        Console::new(std::io::stdout(), std::io::stderr(), verbosity)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Step headers; hidden in quiet mode.
    pub fn step(&mut self, message: &str) -> anyhow::Result<()> {
        if self.verbosity != Verbosity::Quiet {
            writeln!(self.out, "{message}")?;
        }
        Ok(())
    }

    /// Extra detail shown only in verbose mode.
    pub fn detail(&mut self, message: &str) -> anyhow::Result<()> {
        if self.verbosity == Verbosity::Verbose {
            writeln!(self.out, "  {message}")?;
        }
        Ok(())
    }

    /// Raw broker stdout; suppressed in quiet mode.
    pub fn broker_output(&mut self, text: &str) -> anyhow::Result<()> {
        if self.verbosity != Verbosity::Quiet && !text.is_empty() {
            self.out.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                writeln!(self.out)?;
            }
        }
        Ok(())
    }

    /// Requested results; printed regardless of verbosity.
    pub fn result(&mut self, message: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{message}")?;
        Ok(())
    }

    pub fn warning(&mut self, message: &str) -> anyhow::Result<()> {
        writeln!(self.err, "warning: {message}")?;
        Ok(())
    }

    pub fn error(&mut self, message: &str) -> anyhow::Result<()> {
        writeln!(self.err, "{message}")?;
        Ok(())
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.out.flush()?;
        self.err.flush()?;
        Ok(())
    }
}
