use std::io::{self, Write};

use crate::error::{Result, SerdesError};
use crate::json::JsonWriter;

const DOCUMENT: &str = "document";

/// DocumentState is the life cycle of the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// Nothing has been written yet.
    Empty,
    /// `{"results":[` has been written and results may be appended.
    Opened,
    /// The envelope is closed and flushed. Terminal.
    Closed,
}

/// Document owns the output stream and the `{"results":[...],"log":[...]}`
/// envelope around the rendered results.
pub struct Document<W: Write> {
    json: JsonWriter<W>,
    state: DocumentState,
}

impl<W: Write> Document<W> {
    pub fn new(out: W) -> Self {
        Self {
            json: JsonWriter::new(out),
            state: DocumentState::Empty,
        }
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// results opens the envelope if needed and returns the writer positioned
    /// inside the `results` array.
    pub fn results(&mut self) -> Result<&mut JsonWriter<W>> {
        self.ensure_open(DOCUMENT)?;
        Ok(&mut self.json)
    }

    /// write_result appends one already rendered result entry. Stream failures,
    /// including opening the envelope, are reported against `source_id`.
    pub fn write_result(&mut self, source_id: &str, rendered: &[u8]) -> Result<()> {
        self.ensure_open(source_id)?;
        self.json
            .write_raw_value(rendered)
            .map_err(|e| SerdesError::serialization(source_id, e))
    }

    fn ensure_open(&mut self, writer: &str) -> Result<()> {
        match self.state {
            DocumentState::Closed => Err(SerdesError::Closed),
            DocumentState::Empty => {
                self.open()
                    .map_err(|e| SerdesError::serialization(writer, e))?;
                self.state = DocumentState::Opened;
                Ok(())
            }
            DocumentState::Opened => Ok(()),
        }
    }

    /// close ends the `results` array, appends the query log when given and
    /// flushes the stream. An envelope that was never opened is opened first so
    /// the document is always well formed.
    pub fn close(&mut self, logs: Option<&[String]>) -> Result<()> {
        self.results()?;
        self.finish(logs)
            .map_err(|e| SerdesError::serialization(DOCUMENT, e))?;
        self.state = DocumentState::Closed;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.json.into_inner()
    }

    fn open(&mut self) -> io::Result<()> {
        self.json.start_object()?;
        self.json.start_array_field("results")
    }

    fn finish(&mut self, logs: Option<&[String]>) -> io::Result<()> {
        self.json.end_array()?;
        if let Some(logs) = logs {
            self.json.start_array_field("log")?;
            for line in logs {
                self.json.write_string(line)?;
            }
            self.json.end_array()?;
        }
        self.json.end_object()?;
        self.json.flush()
    }
}

#[cfg(test)]
mod tests {
    use crate::document::{Document, DocumentState};
    use crate::error::SerdesError;

    #[test]
    fn test_empty_document() {
        let mut doc = Document::new(Vec::new());
        assert_eq!(doc.state(), DocumentState::Empty);
        doc.close(None).unwrap();
        assert_eq!(doc.state(), DocumentState::Closed);
        assert_eq!(String::from_utf8(doc.into_inner()).unwrap(), r#"{"results":[]}"#);
    }

    #[test]
    fn test_results_and_log() {
        let mut doc = Document::new(Vec::new());
        doc.write_result("a:ds", br#"{"source":"a:ds"}"#).unwrap();
        assert_eq!(doc.state(), DocumentState::Opened);
        doc.write_result("b:ds", br#"{"source":"b:ds"}"#).unwrap();
        doc.close(Some(&["took 3ms".to_string()])).unwrap();

        assert_eq!(
            String::from_utf8(doc.into_inner()).unwrap(),
            r#"{"results":[{"source":"a:ds"},{"source":"b:ds"}],"log":["took 3ms"]}"#
        );
    }

    #[test]
    fn test_closed_is_terminal() {
        let mut doc = Document::new(Vec::new());
        doc.close(None).unwrap();
        assert!(matches!(doc.results(), Err(SerdesError::Closed)));
        assert!(matches!(doc.write_result("a", b"{}"), Err(SerdesError::Closed)));
        assert!(matches!(doc.close(None), Err(SerdesError::Closed)));
    }
}
