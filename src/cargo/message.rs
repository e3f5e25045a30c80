//! Wire types for cargo's `--message-format=json` stream
//!
//! Only the fields this tool reads are modelled. Every field is defaulted so
//! that records from older or newer cargo versions still decode.

use serde::Deserialize;

/// One line of cargo's structured output, discriminated by `reason`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum CargoMessage {
    CompilerArtifact(ArtifactMessage),
    CompilerMessage(CompilerMessage),
    #[serde(other)]
    Other,
}

impl CargoMessage {
    /// Decode a single line; malformed or non-record lines yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        serde_json::from_str(line).ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactMessage {
    /// Missing freshness is treated as fresh, i.e. not rebuilt
    #[serde(default = "default_fresh")]
    pub fresh: bool,
    #[serde(default)]
    pub target: ArtifactTarget,
}

fn default_fresh() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactTarget {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub src_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompilerMessage {
    pub message: RustcDiagnostic,
}

/// A rustc diagnostic; children share the same shape
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RustcDiagnostic {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<DiagnosticCode>,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub spans: Vec<DiagnosticSpan>,
    #[serde(default)]
    pub children: Vec<RustcDiagnostic>,
}

impl RustcDiagnostic {
    pub fn code_str(&self) -> Option<&str> {
        self.code.as_ref().and_then(|c| c.code.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagnosticCode {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagnosticSpan {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub line_start: u32,
    #[serde(default)]
    pub column_start: u32,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub suggested_replacement: Option<String>,
}

/// Captured stdout separated into structured records and free text
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SplitOutput<'a> {
    /// Trimmed lines that decode as JSON objects
    pub structured: Vec<&'a str>,
    /// Everything else that is not blank, untrimmed
    pub text: Vec<&'a str>,
}

/// Separate structured records from free-text lines (test harness output)
pub fn split_output(raw: &str) -> SplitOutput<'_> {
    let mut split = SplitOutput::default();
    for line in raw.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        if is_json_object(stripped) {
            split.structured.push(stripped);
        } else {
            split.text.push(line);
        }
    }
    split
}

fn is_json_object(line: &str) -> bool {
    line.starts_with('{')
        && serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(line).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_artifact_defaults_to_fresh() {
        let msg = CargoMessage::parse(r#"{"reason":"compiler-artifact","target":{"name":"x"}}"#);
        match msg {
            Some(CargoMessage::CompilerArtifact(a)) => {
                assert!(a.fresh);
                assert_eq!(a.target.name, "x");
                assert!(a.target.src_path.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_compiler_message() {
        let line = r#"{"reason":"compiler-message","package_id":"p","message":{"message":"cannot find value `x`","code":{"code":"E0425","explanation":"..."},"level":"error","spans":[{"file_name":"src/main.rs","line_start":3,"line_end":3,"column_start":5,"column_end":6,"is_primary":true,"suggested_replacement":null}],"children":[],"rendered":"error"}}"#;
        match CargoMessage::parse(line) {
            Some(CargoMessage::CompilerMessage(m)) => {
                assert_eq!(m.message.code_str(), Some("E0425"));
                assert_eq!(m.message.level, "error");
                assert_eq!(m.message.spans[0].line_start, 3);
                assert!(m.message.spans[0].is_primary);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_reason_and_garbage() {
        assert!(matches!(
            CargoMessage::parse(r#"{"reason":"build-finished","success":true}"#),
            Some(CargoMessage::Other)
        ));
        assert!(CargoMessage::parse("test foo ... ok").is_none());
        assert!(CargoMessage::parse(r#"{"reason":"compiler-message"#).is_none());
        assert!(CargoMessage::parse(r#"{"no_reason":1}"#).is_none());
    }

    #[test]
    fn test_null_code_is_none() {
        let line = r#"{"reason":"compiler-message","message":{"message":"aborting due to 2 previous errors","code":null,"level":"error","spans":[],"children":[]}}"#;
        match CargoMessage::parse(line) {
            Some(CargoMessage::CompilerMessage(m)) => assert_eq!(m.message.code_str(), None),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_split_output() {
        let raw = "{\"reason\":\"build-finished\",\"success\":true}\n\nrunning 1 test\n  {not json\ntest a ... ok\n";
        let split = split_output(raw);
        assert_eq!(split.structured, vec![r#"{"reason":"build-finished","success":true}"#]);
        assert_eq!(split.text, vec!["running 1 test", "  {not json", "test a ... ok"]);
    }
}
