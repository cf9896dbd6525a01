//! Ordered check results.
//!
//! A [`CheckList`] is append-only and preserves evaluation order. Renderers
//! and the structured record both walk it front to back, so the order in
//! which the engines push entries is the order operators see.

use serde::Serialize;

/// A named diagnostic entry with a boolean outcome and free-text detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl Check {
    pub fn new(name: impl Into<String>, ok: bool, detail: impl Into<String>) -> Self {
        Self { name: name.into(), ok, detail: detail.into() }
    }

    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, true, detail)
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, false, detail)
    }
}

/// Append-only, evaluation-ordered sequence of checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CheckList(Vec<Check>);

impl CheckList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, check: Check) {
        self.0.push(check);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Check> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries whose outcome is false.
    pub fn failures(&self) -> usize {
        self.0.iter().filter(|c| !c.ok).count()
    }

    /// First entry with the given name.
    pub fn find(&self, name: &str) -> Option<&Check> {
        self.0.iter().find(|c| c.name == name)
    }

    pub fn as_slice(&self) -> &[Check] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a CheckList {
    type Item = &'a Check;
    type IntoIter = std::slice::Iter<'a, Check>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Check> for CheckList {
    fn from_iter<I: IntoIterator<Item = Check>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
