//! Script inlining into page templates.

/// Marker in a placeholder pattern replaced by the script's file name.
pub const SCRIPT_MARKER: &str = "{script}";

/// Errors raised when a template's placeholder cannot be substituted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InlineError {
    #[error("placeholder `{tag}` not found")]
    PlaceholderMissing { tag: String },

    #[error("placeholder `{tag}` appears {count} times, expected once")]
    PlaceholderRepeated { tag: String, count: usize },
}

/// The script tag a template uses to reference its paired script.
///
/// The pattern names the script through [`SCRIPT_MARKER`], e.g.
/// `<script type="module" src="./{script}"></script>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pattern: String,
}

impl Placeholder {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Exact tag referencing `script_name`.
    pub fn tag_for(&self, script_name: &str) -> String {
        self.pattern.replace(SCRIPT_MARKER, script_name)
    }

    /// Replace the tag referencing `script_name` with an inline module script.
    ///
    /// The tag must occur exactly once in `html`.
    pub fn inline(&self, html: &str, script_name: &str, code: &str) -> Result<String, InlineError> {
        let tag = self.tag_for(script_name);

        match html.matches(&tag).count() {
            0 => Err(InlineError::PlaceholderMissing { tag }),
            1 => Ok(html.replacen(&tag, &module_script(code), 1)),
            count => Err(InlineError::PlaceholderRepeated { tag, count }),
        }
    }
}

impl Default for Placeholder {
    fn default() -> Self {
        Self::new(r#"<script type="module" src="./{script}"></script>"#)
    }
}

fn module_script(code: &str) -> String {
    format!("<script type=\"module\">\n{}\n</script>", code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<body>
<div id="app"></div>
<script type="module" src="./ex1.js"></script>
</body>"#;

    #[test]
    fn inlines_script() {
        let html = Placeholder::default()
            .inline(PAGE, "ex1.js", "console.log(1);")
            .unwrap();

        assert!(html.contains("<script type=\"module\">\nconsole.log(1);\n</script>"));
        assert!(!html.contains("src=\"./ex1.js\""));
    }

    #[test]
    fn reports_missing_placeholder() {
        let result = Placeholder::default().inline(PAGE, "ex2.js", "");

        assert_eq!(
            result,
            Err(InlineError::PlaceholderMissing {
                tag: r#"<script type="module" src="./ex2.js"></script>"#.to_string()
            })
        );
    }

    #[test]
    fn reports_repeated_placeholder() {
        let page = format!("{}\n{}", PAGE, r#"<script type="module" src="./ex1.js"></script>"#);

        let result = Placeholder::default().inline(&page, "ex1.js", "");

        assert!(matches!(
            result,
            Err(InlineError::PlaceholderRepeated { count: 2, .. })
        ));
    }

    #[test]
    fn supports_custom_patterns() {
        let placeholder = Placeholder::new("<!-- inline {script} -->");

        let html = placeholder
            .inline("<p></p><!-- inline main.js -->", "main.js", "go();")
            .unwrap();

        assert_eq!(html, "<p></p><script type=\"module\">\ngo();\n</script>");
    }
}
