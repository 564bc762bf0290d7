//! Parse State Module
//!
//! Accumulator owned by exactly one parse pass.

use crate::models::Record;

// == Parse State ==
/// Records emitted so far, the character buffer and the capture flag, plus
/// backend-specific scratch data (`T`) for partially built records.
#[derive(Debug)]
pub struct ParseState<T> {
    records: Vec<Record>,
    buf: String,
    capture: bool,
    /// Backend-specific partial record data
    pub scratch: T,
}

impl<T> ParseState<T> {
    pub fn new(scratch: T) -> Self {
        Self {
            records: Vec::new(),
            buf: String::new(),
            capture: false,
            scratch,
        }
    }

    /// Starts collecting character data into an empty buffer.
    pub fn start_capture(&mut self) {
        self.buf.clear();
        self.capture = true;
    }

    pub fn is_capturing(&self) -> bool {
        self.capture
    }

    /// Appends character data verbatim; ignored unless capturing.
    pub fn append(&mut self, text: &str) {
        if self.capture {
            self.buf.push_str(text);
        }
    }

    /// Returns the collected characters, clearing the buffer and the capture flag.
    pub fn take_buffer(&mut self) -> String {
        self.capture = false;
        std::mem::take(&mut self.buf)
    }

    /// Enqueues a finished record.
    pub fn emit(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_ignored_without_capture() {
        let mut state = ParseState::new(());
        state.append("ignored");
        assert_eq!(state.take_buffer(), "");
    }

    #[test]
    fn test_capture_and_take() {
        let mut state = ParseState::new(());
        state.start_capture();
        state.append("Austen, ");
        state.append("Jane");
        assert!(state.is_capturing());

        assert_eq!(state.take_buffer(), "Austen, Jane");
        assert!(!state.is_capturing());
        assert_eq!(state.take_buffer(), "");
    }

    #[test]
    fn test_emit_keeps_order() {
        let mut state = ParseState::new(());
        state.emit(Record::new("1", "first"));
        state.emit(Record::new("2", "second"));

        let ids: Vec<_> = state.into_records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
