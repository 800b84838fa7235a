//! Resolution of named elements to files and lines.

use crate::cst::{ElementPath, PositionIndex};
use crate::error::Result;
use crate::session::Session;
use crate::transform::not_found;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an element was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub file: PathBuf,
    /// 1-based line of the definition, counting decorators.
    pub line: usize,
}

/// The kind of element a search looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Class,
    Function,
}

/// Looks elements up across a session's working set.
///
/// Files are searched in sorted order and the first match wins; ambiguous
/// names are not reported. Files that fail to parse are skipped.
pub struct TargetResolver<'s> {
    session: &'s Session,
}

impl<'s> TargetResolver<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Resolves `element`. With a bound file the element is only verified
    /// to still exist there.
    pub fn resolve(&self, element: &ElementPath, bound: Option<&Path>) -> Result<Resolution> {
        if let Some(file) = bound {
            let index = self.session.parse(file)?.positions();
            return match line_of(&index, element) {
                Some(line) => Ok(Resolution {
                    file: file.to_path_buf(),
                    line,
                }),
                None => Err(not_found(element)),
            };
        }

        for file in self.session.files()? {
            let Some(index) = self.index(file) else {
                continue;
            };
            if let Some(line) = line_of(&index, element) {
                debug!(%element, file = %file.display(), line, "resolved");
                return Ok(Resolution {
                    file: file.clone(),
                    line,
                });
            }
        }
        debug!(%element, "not found in working set");
        Err(not_found(element))
    }

    /// Every module-level class or function whose name matches `pattern`,
    /// in file order then source order.
    pub fn find_all(&self, kind: ElementKind, pattern: &Regex) -> Result<Vec<(PathBuf, ElementPath)>> {
        let mut found = Vec::new();
        for file in self.session.files()? {
            let Some(index) = self.index(file) else {
                continue;
            };
            found.extend(
                matching(&index, kind, pattern)
                    .into_iter()
                    .map(|path| (file.clone(), path)),
            );
        }
        Ok(found)
    }

    /// Module-level classes or functions of one file whose names match
    /// `pattern`.
    pub fn find_in(&self, file: &Path, kind: ElementKind, pattern: &Regex) -> Result<Vec<ElementPath>> {
        let index = self.session.parse(file)?.positions();
        Ok(matching(&index, kind, pattern))
    }

    /// Methods of `class` in `file` whose names match `pattern`.
    pub fn methods_of(&self, file: &Path, class: &str, pattern: &Regex) -> Result<Vec<ElementPath>> {
        let tree = self.session.parse(file)?;
        let class_def = tree
            .find_class(class)
            .ok_or_else(|| not_found(&ElementPath::class(class)))?;
        Ok(class_def
            .methods()
            .iter()
            .filter(|m| pattern.is_match(m.name()))
            .map(|m| ElementPath::method(class, m.name()))
            .collect())
    }

    fn index(&self, file: &Path) -> Option<PositionIndex> {
        match self.session.parse(file) {
            Ok(tree) => Some(tree.positions()),
            Err(error) => {
                debug!(file = %file.display(), %error, "skipping file");
                None
            }
        }
    }
}

fn matching(index: &PositionIndex, kind: ElementKind, pattern: &Regex) -> Vec<ElementPath> {
    match kind {
        ElementKind::Class => index
            .classes
            .iter()
            .filter(|c| !c.name.contains('.') && pattern.is_match(&c.name))
            .map(|c| ElementPath::class(c.name.as_str()))
            .collect(),
        ElementKind::Function => index
            .functions
            .iter()
            .filter(|f| pattern.is_match(&f.name))
            .map(|f| ElementPath::function(f.name.as_str()))
            .collect(),
    }
}

fn line_of(index: &PositionIndex, element: &ElementPath) -> Option<usize> {
    match element {
        ElementPath::Class(name) => index.class(name).map(|c| c.start_line),
        ElementPath::Function(name) => index.function(name).map(|f| f.start_line),
        ElementPath::Method { class, name } => index.method(class, name).map(|m| m.start_line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditError;
    use std::fs;
    use tempfile::TempDir;

    fn working_set(files: &[(&str, &str)]) -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let session = Session::open(dir.path()).unwrap();
        (dir, session)
    }

    #[test]
    fn test_first_file_in_sorted_order_wins() {
        let (dir, session) = working_set(&[
            ("b.py", "class Config:\n    pass\n"),
            ("a.py", "x = 1\n\n\nclass Config:\n    pass\n"),
        ]);
        let at = session
            .resolver()
            .resolve(&ElementPath::class("Config"), None)
            .unwrap();
        assert_eq!(at.file, dir.path().join("a.py"));
        assert_eq!(at.line, 4);
    }

    #[test]
    fn test_unparsable_files_are_skipped() {
        let (dir, session) = working_set(&[
            ("0.py", "def broken(:\n"),
            ("1.py", "def helper():\n    pass\n"),
        ]);
        let at = session
            .resolver()
            .resolve(&ElementPath::function("helper"), None)
            .unwrap();
        assert_eq!(at.file, dir.path().join("1.py"));

        let all = session
            .resolver()
            .find_all(ElementKind::Function, &Regex::new(".*").unwrap())
            .unwrap();
        assert_eq!(all, vec![(dir.path().join("1.py"), ElementPath::function("helper"))]);
    }

    #[test]
    fn test_bound_file_is_not_searched_beyond() {
        let (dir, session) = working_set(&[
            ("a.py", "def other():\n    pass\n"),
            ("b.py", "def helper():\n    pass\n"),
        ]);
        let err = session
            .resolver()
            .resolve(&ElementPath::function("helper"), Some(&dir.path().join("a.py")))
            .unwrap_err();
        assert!(matches!(err, EditError::NotFound(_)));

        let at = session
            .resolver()
            .resolve(&ElementPath::function("helper"), Some(&dir.path().join("b.py")))
            .unwrap();
        assert_eq!(at.line, 1);
    }

    #[test]
    fn test_methods_of_filters_by_pattern() {
        let (dir, session) = working_set(&[(
            "svc.py",
            "class Service:\n    def get_a(self):\n        pass\n\n    def put_a(self):\n        pass\n",
        )]);
        let methods = session
            .resolver()
            .methods_of(&dir.path().join("svc.py"), "Service", &Regex::new("^get_").unwrap())
            .unwrap();
        assert_eq!(methods, vec![ElementPath::method("Service", "get_a")]);
    }
}
