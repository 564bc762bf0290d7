//! Path Tracker Module
//!
//! Tracks the element nesting path during one streaming parse.

// == Path Tracker ==
/// Stack of local element names from the document root to the current element.
///
/// Not shared between threads; each parse pass owns its own tracker.
#[derive(Debug, Default)]
pub struct PathTracker {
    elements: Vec<String>,
}

impl PathTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Enters an element. A namespace prefix (`ns2:VIAFCluster`) is dropped.
    pub fn push(&mut self, name: &str) {
        let local = name.split_once(':').map(|(_, local)| local).unwrap_or(name);
        self.elements.push(local.to_string());
    }

    // == Pop ==
    /// Leaves the innermost element.
    ///
    /// Returns None when nothing is open, which means the caller saw an end
    /// tag without a matching start.
    pub fn pop(&mut self) -> Option<String> {
        self.elements.pop()
    }

    // == Current Path ==
    /// Open elements joined by `/`, outermost first, without a leading delimiter.
    pub fn current_path(&self) -> String {
        self.elements.join("/")
    }

    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
