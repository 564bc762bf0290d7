//! Streaming Record Parser Module
//!
//! Drives quick-xml events through a PathTracker and dispatches to handlers
//! registered by full element path.

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ReconcileError, Result};
use crate::models::Record;
use crate::parser::{ParseState, PathTracker};

/// Element passed to enter handlers.
#[derive(Debug)]
pub struct Element<'a> {
    /// Full slash-delimited path of the element
    pub path: &'a str,
    /// Attributes as (local name, unescaped value) pairs
    pub attributes: &'a [(String, String)],
}

impl Element<'_> {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Invoked when the parser enters a registered path.
pub type EnterHandler<T> = Box<dyn Fn(&mut ParseState<T>, &Element<'_>) + Send + Sync>;

/// Invoked when the parser leaves a registered path.
pub type ExitHandler<T> = Box<dyn Fn(&mut ParseState<T>, &str) + Send + Sync>;

// == Streaming Record Parser ==
/// Path-keyed event parser producing a completed list of records per pass.
///
/// Handlers are registered with the builder methods before the parser is
/// used and are never changed afterwards, so one parser can serve many
/// concurrent passes.
pub struct StreamingRecordParser<T> {
    factory: fn() -> T,
    enter: HashMap<String, EnterHandler<T>>,
    exit: HashMap<String, ExitHandler<T>>,
}

impl<T> StreamingRecordParser<T> {
    /// Creates a parser whose passes start from `factory()` scratch state.
    pub fn new(factory: fn() -> T) -> Self {
        Self {
            factory,
            enter: HashMap::new(),
            exit: HashMap::new(),
        }
    }

    /// Registers a handler for entering `path`.
    pub fn on_enter<F>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut ParseState<T>, &Element<'_>) + Send + Sync + 'static,
    {
        self.enter.insert(path.to_string(), Box::new(handler));
        self
    }

    /// Registers a handler for leaving `path`.
    pub fn on_exit<F>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut ParseState<T>, &str) + Send + Sync + 'static,
    {
        self.exit.insert(path.to_string(), Box::new(handler));
        self
    }

    /// Captures the text content of `path` and hands it to `handler` on exit.
    pub fn on_text<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut ParseState<T>, String) + Send + Sync + 'static,
    {
        self.on_enter(path, |state, _| state.start_capture())
            .on_exit(path, move |state, _| {
                let text = state.take_buffer();
                handler(state, text);
            })
    }

    // == Parse ==
    /// Parses one response with fresh scratch state from the factory.
    pub fn parse<R: BufRead>(&self, input: R) -> Result<Vec<Record>> {
        self.parse_with(input, (self.factory)())
    }

    /// Parses one response starting from the given scratch state.
    ///
    /// Malformed markup aborts the pass; records emitted before the failure
    /// are dropped with the state.
    pub fn parse_with<R: BufRead>(&self, input: R, scratch: T) -> Result<Vec<Record>> {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(false);

        let mut path = PathTracker::new();
        let mut state = ParseState::new(scratch);
        let mut seen_root = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    open_root(&path, &mut seen_root)?;
                    self.enter_element(&mut state, &mut path, e)?;
                }
                Event::Empty(ref e) => {
                    open_root(&path, &mut seen_root)?;
                    self.enter_element(&mut state, &mut path, e)?;
                    self.exit_element(&mut state, &mut path)?;
                }
                Event::End(_) => self.exit_element(&mut state, &mut path)?,
                Event::Text(ref e) => {
                    // Unescaped even when discarded so bad entity references fail the pass
                    let text = e.unescape()?;
                    if path.is_empty() {
                        if !text.trim().is_empty() {
                            return Err(ReconcileError::Parse(
                                "Text outside the root element".to_string(),
                            ));
                        }
                    } else {
                        state.append(&text);
                    }
                }
                Event::CData(e) => {
                    if path.is_empty() {
                        return Err(ReconcileError::Parse(
                            "CDATA outside the root element".to_string(),
                        ));
                    }
                    let bytes = e.into_inner();
                    state.append(utf8(&bytes)?);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            return Err(ReconcileError::Parse(
                "Document has no root element".to_string(),
            ));
        }
        if !path.is_empty() {
            return Err(ReconcileError::Parse(format!(
                "Document ended inside {}",
                path.current_path()
            )));
        }

        Ok(state.into_records())
    }

    fn enter_element(
        &self,
        state: &mut ParseState<T>,
        path: &mut PathTracker,
        start: &BytesStart<'_>,
    ) -> Result<()> {
        path.push(utf8(start.name().as_ref())?);
        let current = path.current_path();

        if let Some(handler) = self.enter.get(&current) {
            let attributes = collect_attributes(start)?;
            handler(
                state,
                &Element {
                    path: &current,
                    attributes: &attributes,
                },
            );
        }
        Ok(())
    }

    fn exit_element(&self, state: &mut ParseState<T>, path: &mut PathTracker) -> Result<()> {
        let current = path.current_path();
        if let Some(handler) = self.exit.get(&current) {
            handler(state, &current);
        }

        path.pop()
            .map(|_| ())
            .ok_or_else(|| ReconcileError::Parse("End tag without matching start".to_string()))
    }
}

/// Allows exactly one top-level element per document.
fn open_root(path: &PathTracker, seen_root: &mut bool) -> Result<()> {
    if path.is_empty() {
        if *seen_root {
            return Err(ReconcileError::Parse(
                "Document has more than one root element".to_string(),
            ));
        }
        *seen_root = true;
    }
    Ok(())
}

/// Collects attributes with namespace prefixes stripped from their names.
fn collect_attributes(start: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = utf8(attr.key.as_ref())?;
        let local = key.split_once(':').map(|(_, local)| local).unwrap_or(key);
        attributes.push((local.to_string(), attr.unescape_value()?.into_owned()));
    }
    Ok(attributes)
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| ReconcileError::Parse(format!("Invalid UTF-8: {}", e)))
}
