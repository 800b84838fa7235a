//! Batches of targets.

use super::Target;
use crate::result::{BatchResult, EditResult};
use crate::transform::BodyPosition;
use regex::Regex;
use std::path::Path;

/// An ordered collection of targets with batch operations.
///
/// Batch operations run on every target and collect the individual results;
/// a failing target never stops the batch.
#[derive(Debug, Clone, Default)]
pub struct TargetList<'s> {
    targets: Vec<Target<'s>>,
}

impl<'s> TargetList<'s> {
    pub fn new(targets: Vec<Target<'s>>) -> Self {
        Self { targets }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Target<'s>> {
        self.targets.iter()
    }

    pub fn first(&self) -> Option<&Target<'s>> {
        self.targets.first()
    }

    pub fn last(&self) -> Option<&Target<'s>> {
        self.targets.last()
    }

    pub fn get(&self, index: usize) -> Option<&Target<'s>> {
        self.targets.get(index)
    }

    pub fn filter(&self, predicate: impl Fn(&Target<'s>) -> bool) -> Self {
        self.targets.iter().filter(|t| predicate(t)).cloned().collect()
    }

    /// Targets whose file is `path`.
    pub fn in_file(&self, path: &Path) -> Self {
        self.filter(|t| t.file_path().as_deref() == Some(path))
    }

    /// Targets whose name matches `pattern`. An invalid pattern matches
    /// nothing.
    pub fn matching(&self, pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => self.filter(|t| t.name().is_some_and(|n| regex.is_match(&n))),
            Err(_) => Self::default(),
        }
    }

    /// Runs `operation` on every target.
    pub fn for_each(&self, operation: impl Fn(&Target<'s>) -> EditResult) -> BatchResult {
        BatchResult::new(self.targets.iter().map(operation).collect())
    }

    pub fn add_decorator(&self, decorator: &str) -> BatchResult {
        self.for_each(|t| t.add_decorator(decorator))
    }

    pub fn remove_decorator(&self, name: &str) -> BatchResult {
        self.for_each(|t| t.remove_decorator(name))
    }

    /// Renames every target whose name matches `pattern`, replacing the
    /// match with `replacement` (`$1` style groups allowed).
    pub fn rename(&self, pattern: &str, replacement: &str) -> BatchResult {
        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(error) => return BatchResult::new(vec![EditResult::from_error(error.into())]),
        };
        self.for_each(|t| {
            let Some(name) = t.name() else {
                return t.rename(replacement);
            };
            let new_name = regex.replace(&name, replacement);
            if new_name == name.as_str() {
                return EditResult::unchanged(format!("No changes needed for {t}"));
            }
            t.rename(&new_name)
        })
    }

    pub fn delete(&self) -> BatchResult {
        self.for_each(|t| t.delete())
    }

    pub fn insert_statement(&self, code: &str, position: BodyPosition) -> BatchResult {
        self.for_each(|t| t.insert_statement(code, position))
    }

    pub fn convert_to_async(&self) -> BatchResult {
        self.for_each(|t| t.convert_to_async())
    }
}

impl<'s> FromIterator<Target<'s>> for TargetList<'s> {
    fn from_iter<I: IntoIterator<Item = Target<'s>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'s> IntoIterator for TargetList<'s> {
    type Item = Target<'s>;
    type IntoIter = std::vec::IntoIter<Target<'s>>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.into_iter()
    }
}

impl<'a, 's> IntoIterator for &'a TargetList<'s> {
    type Item = &'a Target<'s>;
    type IntoIter = std::slice::Iter<'a, Target<'s>>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}
