//! Golden cases for the scripted parse driver.
//!
//! A case file is TOML with one `[[case]]` table per scenario:
//!
//! ```toml
//! [[case]]
//! name = "write lands after div"
//! input = "<div>a"
//! policy = "splice_at_token"
//! writes = [{ on = "push", tag = "div", text = "b</div>" }]
//! expected = """
//! #document
//!   <html>
//! """
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CaseFile {
    #[serde(rename = "case")]
    cases: Vec<DriverCase>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverCase {
    pub name: String,
    pub input: String,
    #[serde(default)]
    pub policy: CasePolicy,
    /// Parse as the content of a detached element with this tag name.
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub writes: Vec<CaseWrite>,
    /// Suspend whenever an element with one of these names is pushed.
    #[serde(default)]
    pub suspend_on: Vec<String>,
    /// Text the host writes at each suspension, in order.
    #[serde(default)]
    pub host_writes: Vec<String>,
    /// Expected snapshot of the document (or of the context element).
    pub expected: String,
}

impl DriverCase {
    /// Snapshot lines with surrounding blank lines removed.
    pub fn expected_lines(&self) -> Vec<String> {
        self.expected
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CasePolicy {
    #[default]
    SpliceAtToken,
    Deferred,
}

/// Listener-issued write.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CaseWrite {
    pub on: WriteTrigger,
    pub tag: String,
    pub text: String,
    /// Write on every matching event instead of the first one only.
    #[serde(default)]
    pub repeat: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WriteTrigger {
    Push,
    Pop,
    EndTag,
}

pub fn parse_driver_cases(content: &str, origin: &str) -> Vec<DriverCase> {
    let file: CaseFile = toml::from_str(content)
        .unwrap_or_else(|err| panic!("invalid driver case file {origin}: {err}"));
    for case in &file.cases {
        assert!(
            !case.expected_lines().is_empty(),
            "case {:?} in {origin} has no expected lines",
            case.name
        );
    }
    file.cases
}

pub fn load_driver_cases(path: &Path) -> Vec<DriverCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read driver cases {path:?}: {err}"));
    parse_driver_cases(&content, &path.display().to_string())
}
