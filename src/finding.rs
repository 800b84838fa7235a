//! Findings reported by analysis collaborators.
//!
//! Analysis tools (complexity scoring, vulnerability scanning, duplicate
//! detection) report [`Finding`] records. A [`FindingList`] filters, groups
//! and summarizes them, and converts them into targets so a finding can be
//! acted on with the same operations as any looked-up element.

use crate::session::Session;
use crate::target::{Target, TargetList};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Category such as `high_complexity` or `sql_injection`.
    #[serde(rename = "type")]
    pub kind: String,
    pub file_path: PathBuf,
    /// 1-based.
    pub line_number: usize,
    /// The class, function or `Class.method` the finding is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub message: String,
    pub severity: Severity,
    /// A measured value, such as a complexity score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub context: IndexMap<String, serde_json::Value>,
}

impl Finding {
    pub fn new(
        kind: impl Into<String>,
        file_path: impl Into<PathBuf>,
        line_number: usize,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            kind: kind.into(),
            file_path: file_path.into(),
            line_number,
            name: None,
            message: message.into(),
            severity,
            value: None,
            context: IndexMap::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Addresses the named element in the finding's file.
    ///
    /// `Class.method` names a method; a bare name is looked up as a class,
    /// then as a function.
    pub fn to_target<'s>(&self, session: &'s Session) -> Target<'s> {
        let file = session.file(self.file_path.clone());
        let Some(name) = &self.name else {
            return file;
        };
        if let Some((class, method)) = name.rsplit_once('.') {
            return file.find_class(class).find_method(method);
        }
        let class = file.find_class(name);
        if class.is_error() {
            let function = file.find_function(name);
            if !function.is_error() {
                return function;
            }
        }
        class
    }
}

/// Counts of a finding list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FindingSummary {
    pub total: usize,
    pub by_severity: IndexMap<Severity, usize>,
    pub by_kind: IndexMap<String, usize>,
    pub files: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FindingList {
    findings: Vec<Finding>,
}

impl FindingList {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.findings.iter()
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    fn filtered(&self, keep: impl Fn(&Finding) -> bool) -> Self {
        self.findings.iter().filter(|f| keep(f)).cloned().collect()
    }

    pub fn filter_by_kind(&self, kind: &str) -> Self {
        self.filtered(|f| f.kind == kind)
    }

    /// Findings at or above `minimum`.
    pub fn filter_by_severity(&self, minimum: Severity) -> Self {
        self.filtered(|f| f.severity >= minimum)
    }

    pub fn in_file(&self, path: &Path) -> Self {
        self.filtered(|f| f.file_path == path)
    }

    pub fn in_lines(&self, lines: RangeInclusive<usize>) -> Self {
        self.filtered(|f| lines.contains(&f.line_number))
    }

    /// Groups by kind, in order of first appearance.
    pub fn group_by_kind(&self) -> IndexMap<String, FindingList> {
        let mut groups: IndexMap<String, FindingList> = IndexMap::new();
        for finding in &self.findings {
            groups
                .entry(finding.kind.clone())
                .or_default()
                .push(finding.clone());
        }
        groups
    }

    /// Groups by file, in order of first appearance.
    pub fn group_by_file(&self) -> IndexMap<PathBuf, FindingList> {
        let mut groups: IndexMap<PathBuf, FindingList> = IndexMap::new();
        for finding in &self.findings {
            groups
                .entry(finding.file_path.clone())
                .or_default()
                .push(finding.clone());
        }
        groups
    }

    /// Most severe first; ties keep their order.
    pub fn sort_by_severity(&self) -> Self {
        let mut findings = self.findings.clone();
        findings.sort_by_key(|f| Reverse(f.severity));
        Self::new(findings)
    }

    /// By file, then line.
    pub fn sort_by_location(&self) -> Self {
        let mut findings = self.findings.clone();
        findings.sort_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then(a.line_number.cmp(&b.line_number))
        });
        Self::new(findings)
    }

    /// Highest value first; findings without a value go last.
    pub fn sort_by_value(&self) -> Self {
        let mut findings = self.findings.clone();
        findings.sort_by(|a, b| match (a.value, b.value) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Self::new(findings)
    }

    pub fn summary(&self) -> FindingSummary {
        let mut summary = FindingSummary {
            total: self.findings.len(),
            ..FindingSummary::default()
        };
        for finding in &self.findings {
            *summary.by_severity.entry(finding.severity).or_default() += 1;
            *summary.by_kind.entry(finding.kind.clone()).or_default() += 1;
        }
        summary.by_severity.sort_by(|a, _, b, _| b.cmp(a));
        summary.files = self.group_by_file().len();
        summary
    }

    /// One target per finding, addressing the element it names.
    pub fn to_targets<'s>(&self, session: &'s Session) -> TargetList<'s> {
        self.findings.iter().map(|f| f.to_target(session)).collect()
    }
}

impl FromIterator<Finding> for FindingList {
    fn from_iter<I: IntoIterator<Item = Finding>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for FindingList {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetKind;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> FindingList {
        vec![
            Finding::new("high_complexity", "a.py", 10, "too complex", Severity::Warning)
                .name("parse")
                .value(14.0),
            Finding::new("sql_injection", "b.py", 3, "raw query", Severity::Critical)
                .name("Repo.find"),
            Finding::new("high_complexity", "a.py", 2, "too complex", Severity::Warning)
                .name("load")
                .value(22.0),
            Finding::new("unused_import", "b.py", 1, "os unused", Severity::Info),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_filters() {
        let findings = sample();
        assert_eq!(findings.filter_by_kind("high_complexity").len(), 2);
        assert_eq!(findings.filter_by_severity(Severity::Warning).len(), 3);
        assert_eq!(findings.in_file(Path::new("b.py")).len(), 2);
        assert_eq!(findings.in_lines(1..=3).len(), 3);
    }

    #[test]
    fn test_grouping_and_sorting() {
        let findings = sample();
        let by_kind = findings.group_by_kind();
        assert_eq!(
            by_kind.keys().collect::<Vec<_>>(),
            vec!["high_complexity", "sql_injection", "unused_import"]
        );

        let sorted = findings.sort_by_severity();
        assert_eq!(sorted.iter().next().unwrap().severity, Severity::Critical);

        let by_value = findings.sort_by_value();
        let names: Vec<_> = by_value.iter().map(|f| f.name.clone()).collect();
        assert_eq!(names[0].as_deref(), Some("load"));
        assert_eq!(names[1].as_deref(), Some("parse"));

        let by_location = findings.sort_by_location();
        assert_eq!(by_location.iter().next().unwrap().line_number, 2);
    }

    #[test]
    fn test_summary() {
        let summary = sample().summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.files, 2);
        assert_eq!(summary.by_severity[&Severity::Warning], 2);
        assert_eq!(summary.by_severity.keys().next(), Some(&Severity::Critical));
        assert_eq!(summary.by_kind["high_complexity"], 2);
    }

    #[test]
    fn test_json_uses_type_key() {
        let json = r#"[{"type": "duplicate_code", "file_path": "x.py", "line_number": 4,
                       "message": "dup", "severity": "error"}]"#;
        let findings = FindingList::from_json(json).unwrap();
        assert_eq!(findings.iter().next().unwrap().kind, "duplicate_code");
        let out = serde_json::to_string(&findings).unwrap();
        assert!(out.contains("\"type\":\"duplicate_code\""));
    }

    #[test]
    fn test_to_targets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repo.py");
        fs::write(
            &path,
            "class Repo:\n    def find(self, q):\n        pass\n\n\ndef load():\n    pass\n",
        )
        .unwrap();
        let session = Session::open(dir.path()).unwrap();

        let findings: FindingList = vec![
            Finding::new("sql_injection", &path, 2, "raw query", Severity::Critical).name("Repo.find"),
            Finding::new("high_complexity", &path, 6, "complex", Severity::Warning).name("load"),
            Finding::new("style", &path, 1, "file level", Severity::Info),
            Finding::new("stale", &path, 1, "gone", Severity::Info).name("Gone"),
        ]
        .into_iter()
        .collect();

        let targets = findings.to_targets(&session);
        let kinds: Vec<_> = targets.iter().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TargetKind::Method,
                TargetKind::Function,
                TargetKind::File,
                TargetKind::Error
            ]
        );
    }
}
