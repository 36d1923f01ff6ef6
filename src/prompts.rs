pub const ANALYSIS_INSTRUCTIONS: &str = r#"You are a senior software engineer reviewing an open-source repository.
Read the repository context below and suggest concrete improvements a maintainer could act on:
code quality, structure, tests, documentation, tooling and security.
"#;

pub const RESPONSE_FORMAT: &str = r#"
Respond with a single JSON object and nothing else:
{"summary": "<one paragraph describing what the project does and its current state>",
 "improvements": ["<specific, actionable improvement>", "..."]}

If you cannot produce JSON, use exactly this layout instead:
SUMMARY:
<one paragraph>
IMPROVEMENTS:
- <improvement>
- <improvement>
"#;

pub const SOURCE_OPEN: &str = "<SOURCE_CODE>\n";
pub const SOURCE_CLOSE: &str = "</SOURCE_CODE>\n";

/// Marker appended where content was cut to fit the prompt budget
pub const TRUNCATION_MARKER: &str = "\n[truncated]\n";
