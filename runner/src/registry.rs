//! Named test procedures in registration order, and which of them run.

use crate::browser::Browser;

/// Names starting with this run alone (together with any filtered names).
pub const FOCUS_MARKER: char = '_';

pub type TestFn<B> = Box<dyn Fn(&mut B) -> anyhow::Result<()>>;

pub struct TestEntry<B> {
    name: String,
    procedure: TestFn<B>,
}

impl<B> TestEntry<B> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(&self, browser: &mut B) -> anyhow::Result<()> {
        (self.procedure)(browser)
    }
}

pub struct TestRegistry<B> {
    entries: Vec<TestEntry<B>>,
}

impl<B: Browser> Default for TestRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Browser> TestRegistry<B> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a test. Duplicate names are kept and run twice.
    pub fn test<F>(&mut self, name: &str, procedure: F) -> &mut Self
    where
        F: Fn(&mut B) -> anyhow::Result<()> + 'static,
    {
        self.entries.push(TestEntry {
            name: name.to_string(),
            procedure: Box::new(procedure),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(TestEntry::name)
    }

    /// True when `filters` or a focus name narrow the run to a subset.
    pub fn is_narrowed(&self, filters: &[String]) -> bool {
        !filters.is_empty() || self.names().any(is_focused)
    }

    /// Entries to run, in registration order.
    pub fn select(&self, filters: &[String]) -> Vec<&TestEntry<B>> {
        if !self.is_narrowed(filters) {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|e| is_focused(e.name()) || filters.iter().any(|f| f == e.name()))
            .collect()
    }
}

fn is_focused(name: &str) -> bool {
    name.starts_with(FOCUS_MARKER)
}
