//! Per-run diagnostic log backed by an anonymous temporary file.
//!
//! The file is unlinked at creation and released when the log is dropped, so
//! every exit path cleans it up.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use anyhow::Context;

#[derive(Debug)]
pub struct DiagnosticLog {
    file: File,
    len: u64,
}

impl DiagnosticLog {
    pub fn new() -> anyhow::Result<Self> {
        let file = tempfile::tempfile().context("Failed to create diagnostic log")?;
        Ok(Self { file, len: 0 })
    }

    /// Append `text`, adding a trailing newline when missing.
    pub fn append(&mut self, text: &str) -> anyhow::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.file
            .write_all(text.as_bytes())
            .context("Failed to write diagnostic log")?;
        self.len += text.len() as u64;
        if !text.ends_with('\n') {
            self.file
                .write_all(b"\n")
                .context("Failed to write diagnostic log")?;
            self.len += 1;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Everything appended so far.
    pub fn contents(&mut self) -> anyhow::Result<String> {
        let mut out = String::new();
        self.file.seek(SeekFrom::Start(0))?;
        self.file
            .read_to_string(&mut out)
            .context("Failed to read diagnostic log")?;
        self.file.seek(SeekFrom::End(0))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_accumulate_in_order() {
        let mut log = DiagnosticLog::new().unwrap();
        assert!(log.is_empty());
        log.append("first").unwrap();
        log.append("second\n").unwrap();
        assert_eq!(log.contents().unwrap(), "first\nsecond\n");
    }

    #[test]
    fn reading_does_not_disturb_appends() {
        let mut log = DiagnosticLog::new().unwrap();
        log.append("one").unwrap();
        let _ = log.contents().unwrap();
        log.append("two").unwrap();
        assert_eq!(log.contents().unwrap(), "one\ntwo\n");
    }

    #[test]
    fn empty_text_is_ignored() {
        let mut log = DiagnosticLog::new().unwrap();
        log.append("").unwrap();
        assert!(log.is_empty());
    }
}
