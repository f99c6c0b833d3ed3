//! Markup formatter for published pages.
//!
//! Produces a stable layout for generated HTML: block elements on their own
//! lines, indented by nesting depth; runs of text and inline elements joined
//! on one line with collapsed whitespace; script bodies kept line for line and
//! style bodies reprinted through lightningcss. Output has no time-dependent content
//! and formatting already formatted markup returns it unchanged.

/// Options controlling the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Spaces per nesting level
    pub indent: usize,

    /// Minify `<style>` contents instead of pretty-printing them
    pub minify_css: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            minify_css: false,
        }
    }
}

/// Errors raised on malformed markup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("line {line}: unterminated tag")]
    UnterminatedTag { line: usize },

    #[error("line {line}: unterminated comment")]
    UnterminatedComment { line: usize },

    #[error("line {line}: <{tag}> has no closing tag")]
    UnterminatedRawText { tag: String, line: usize },

    #[error("line {line}: closing tag </{tag}> has no matching open element")]
    StrayClosingTag { tag: String, line: usize },

    #[error("line {line}: expected </{expected}> but found </{found}>")]
    MismatchedClosingTag {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("line {line}: <{tag}> is never closed")]
    UnclosedElement { tag: String, line: usize },

    #[error("line {line}: invalid CSS: {message}")]
    Css { line: usize, message: String },
}

/// Elements that never have content.
const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements laid out within a line of text.
const INLINE: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "button", "cite", "code", "data", "dfn", "em", "i",
    "img", "input", "kbd", "label", "mark", "q", "s", "samp", "small", "span", "strong", "sub",
    "sup", "time", "u", "var", "wbr",
];

/// Elements whose end tag may be omitted.
const OPTIONAL_END: &[&str] = &[
    "body", "caption", "colgroup", "dd", "dt", "head", "html", "li", "optgroup", "option", "p",
    "rb", "rp", "rt", "rtc", "tbody", "td", "tfoot", "th", "thead", "tr",
];

/// Elements whose content is not markup.
const RAW_TEXT: &[&str] = &["script", "style", "pre", "textarea"];

/// HTML pretty printer.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    options: FormatOptions,
}

impl Formatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    /// Format a complete document or fragment.
    pub fn format(&self, source: &str) -> Result<String, FormatError> {
        let tokens = tokenize(source)?;

        let mut printer = Printer::new(&self.options);
        for Spanned { token, line } in tokens {
            printer.push(token, line)?;
        }

        printer.finish()
    }
}

#[derive(Debug)]
enum Token<'a> {
    Doctype(&'a str),
    Comment(&'a str),
    Text(&'a str),
    Start {
        name: String,
        raw: &'a str,
        self_closing: bool,
    },
    End {
        name: String,
        raw: &'a str,
    },
    RawText {
        name: String,
        open: &'a str,
        body: &'a str,
    },
}

#[derive(Debug)]
struct Spanned<'a> {
    token: Token<'a>,
    line: usize,
}

/// Tracks the 1-based line of increasing byte offsets.
struct LineCounter<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    fn at(&mut self, pos: usize) -> usize {
        self.line += self.src[self.pos..pos].matches('\n').count();
        self.pos = pos;
        self.line
    }
}

fn tokenize(src: &str) -> Result<Vec<Spanned<'_>>, FormatError> {
    let mut tokens = Vec::new();
    let mut lines = LineCounter::new(src);
    let mut pos = 0;

    while pos < src.len() {
        let line = lines.at(pos);
        let rest = &src[pos..];

        if !rest.starts_with('<') {
            let end = rest.find('<').unwrap_or(rest.len());
            tokens.push(Spanned {
                token: Token::Text(&rest[..end]),
                line,
            });
            pos += end;
            continue;
        }

        if rest.starts_with("<!--") {
            let end = rest[4..]
                .find("-->")
                .ok_or(FormatError::UnterminatedComment { line })?;
            let len = 4 + end + 3;
            tokens.push(Spanned {
                token: Token::Comment(&rest[..len]),
                line,
            });
            pos += len;
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').ok_or(FormatError::UnterminatedTag { line })?;
            tokens.push(Spanned {
                token: Token::Doctype(&rest[..=end]),
                line,
            });
            pos += end + 1;
            continue;
        }

        let after = rest[1..].chars().next();
        let is_end = after == Some('/')
            && rest[2..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic());

        if is_end {
            let end = rest.find('>').ok_or(FormatError::UnterminatedTag { line })?;
            tokens.push(Spanned {
                token: Token::End {
                    name: tag_name(&rest[2..]),
                    raw: &rest[..=end],
                },
                line,
            });
            pos += end + 1;
            continue;
        }

        if !after.is_some_and(|c| c.is_ascii_alphabetic()) {
            // A bare `<` is text.
            let end = rest[1..].find('<').map_or(rest.len(), |i| i + 1);
            tokens.push(Spanned {
                token: Token::Text(&rest[..end]),
                line,
            });
            pos += end;
            continue;
        }

        let end = find_tag_end(rest).ok_or(FormatError::UnterminatedTag { line })?;
        let raw = &rest[..=end];
        let name = tag_name(&rest[1..]);
        let self_closing = raw.ends_with("/>");
        pos += end + 1;

        if RAW_TEXT.contains(&name.as_str()) && !self_closing {
            let closing = format!("</{}", name);
            let body_len = src[pos..]
                .to_ascii_lowercase()
                .find(&closing)
                .ok_or_else(|| FormatError::UnterminatedRawText {
                    tag: name.clone(),
                    line,
                })?;
            let body = &src[pos..pos + body_len];
            let close_end = src[pos + body_len..].find('>').ok_or_else(|| {
                FormatError::UnterminatedRawText {
                    tag: name.clone(),
                    line,
                }
            })?;
            pos += body_len + close_end + 1;
            tokens.push(Spanned {
                token: Token::RawText { name, open: raw, body },
                line,
            });
            continue;
        }

        tokens.push(Spanned {
            token: Token::Start {
                name,
                raw,
                self_closing,
            },
            line,
        });
    }

    Ok(tokens)
}

/// Byte offset of the `>` closing a start tag, skipping quoted attribute values.
fn find_tag_end(tag: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in tag.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(i),
            None => {}
        }
    }
    None
}

fn tag_name(s: &str) -> String {
    s.chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Collapse whitespace outside quoted attribute values.
fn normalize_tag(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut quote = None;
    let mut pending_space = false;

    for c in raw.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => pending_space = true,
            None => {
                if pending_space && c != '>' {
                    out.push(' ');
                }
                pending_space = false;
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }

    out
}

/// Append text to an inline run, collapsing whitespace.
fn push_text(run: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !run.is_empty() && !run.ends_with(' ') {
                run.push(' ');
            }
        } else {
            run.push(c);
        }
    }
}

/// Drop the whitespace-only lines around a script body.
///
/// Interior lines are returned untouched: they may sit inside a template
/// literal, where indentation and trailing spaces are part of the value.
fn trim_blank_lines(body: &str) -> Vec<&str> {
    let lines: Vec<&str> = body.lines().collect();
    let blank = |l: &&str| l.trim().is_empty();

    let Some(first) = lines.iter().position(|l| !blank(l)) else {
        return Vec::new();
    };
    let last = lines.iter().rposition(|l| !blank(l)).unwrap_or(first);
    lines[first..=last].to_vec()
}

/// Strip the common leading indentation and surrounding blank lines.
fn dedent(body: &str) -> Vec<String> {
    let lines: Vec<&str> = body.lines().map(str::trim_end).collect();

    let Some(first) = lines.iter().position(|l| !l.is_empty()) else {
        return Vec::new();
    };
    let last = lines.iter().rposition(|l| !l.is_empty()).unwrap_or(first);
    let lines = &lines[first..=last];

    let common = lines
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| {
            let offset = l.char_indices().nth(common).map_or(l.len(), |(i, _)| i);
            l[offset..].to_string()
        })
        .collect()
}

/// Reprint a stylesheet with lightningcss.
fn format_css(css: &str, minify: bool) -> Result<String, String> {
    use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

    let stylesheet = StyleSheet::parse(css, ParserOptions::default()).map_err(|e| e.to_string())?;

    let printed = stylesheet
        .to_css(PrinterOptions {
            minify,
            ..Default::default()
        })
        .map_err(|e| e.to_string())?;

    Ok(printed.code)
}

/// An element still waiting for its end tag.
#[derive(Debug)]
struct Open {
    name: String,
    block: bool,
    line: usize,
    /// Index of the output line holding the start tag (block elements only)
    start_line: Option<usize>,
}

struct Printer<'o> {
    options: &'o FormatOptions,
    lines: Vec<String>,
    run: String,
    stack: Vec<Open>,
}

impl<'o> Printer<'o> {
    fn new(options: &'o FormatOptions) -> Self {
        Self {
            options,
            lines: Vec::new(),
            run: String::new(),
            stack: Vec::new(),
        }
    }

    fn depth(&self) -> usize {
        self.stack.iter().filter(|o| o.block).count()
    }

    fn emit(&mut self, depth: usize, text: &str) {
        let pad = " ".repeat(depth * self.options.indent);
        self.lines.push(format!("{}{}", pad, text));
    }

    fn take_run(&mut self) -> String {
        let text = self.run.trim().to_string();
        self.run.clear();
        text
    }

    fn flush(&mut self) {
        let text = self.take_run();
        if !text.is_empty() {
            self.emit(self.depth(), &text);
        }
    }

    fn push(&mut self, token: Token<'_>, line: usize) -> Result<(), FormatError> {
        match token {
            Token::Doctype(raw) => {
                self.flush();
                self.emit(self.depth(), &normalize_tag(raw));
            }
            Token::Comment(raw) => {
                self.flush();
                self.emit(self.depth(), raw.trim());
            }
            Token::Text(text) => push_text(&mut self.run, text),
            Token::Start {
                name,
                raw,
                self_closing,
            } => self.open(name, raw, self_closing, line),
            Token::End { name, raw } => self.close(name, raw, line)?,
            Token::RawText { name, open, body } => self.raw_text(&name, open, body, line)?,
        }
        Ok(())
    }

    fn open(&mut self, name: String, raw: &str, self_closing: bool, line: usize) {
        let tag = normalize_tag(raw);
        let void = self_closing || VOID.contains(&name.as_str());

        if INLINE.contains(&name.as_str()) {
            self.run.push_str(&tag);
            if !void {
                self.stack.push(Open {
                    name,
                    block: false,
                    line,
                    start_line: None,
                });
            }
            return;
        }

        while self
            .stack
            .last()
            .is_some_and(|top| closes_implicitly(&top.name, &name))
        {
            if let Some(previous) = self.stack.pop() {
                self.finish_element(previous, None);
            }
        }

        self.flush();
        self.emit(self.depth(), &tag);

        if !void {
            self.stack.push(Open {
                name,
                block: true,
                line,
                start_line: Some(self.lines.len() - 1),
            });
        }
    }

    fn close(&mut self, name: String, raw: &str, line: usize) -> Result<(), FormatError> {
        let Some(pos) = self.stack.iter().rposition(|o| o.name == name) else {
            return Err(FormatError::StrayClosingTag { tag: name, line });
        };

        let unwound = self.stack.split_off(pos + 1);
        if let Some(open) = unwound
            .iter()
            .rev()
            .find(|o| !OPTIONAL_END.contains(&o.name.as_str()))
        {
            return Err(FormatError::MismatchedClosingTag {
                expected: open.name.clone(),
                found: name,
                line,
            });
        }
        for open in unwound.into_iter().rev() {
            self.finish_element(open, None);
        }

        if let Some(open) = self.stack.pop() {
            self.finish_element(open, Some(normalize_tag(raw)));
        }
        Ok(())
    }

    /// Emit whatever remains of a popped element and its end tag.
    fn finish_element(&mut self, open: Open, end_tag: Option<String>) {
        if !open.block {
            if let Some(end_tag) = end_tag {
                self.run.push_str(&end_tag);
            }
            return;
        }

        // Nothing but inline content since the start tag: keep it on one line.
        if open.start_line.is_some() && open.start_line == self.lines.len().checked_sub(1) {
            let text = self.take_run();
            if let Some(last) = self.lines.last_mut() {
                last.push_str(&text);
                if let Some(end_tag) = end_tag {
                    last.push_str(&end_tag);
                }
            }
            return;
        }

        let text = self.take_run();
        let depth = self.depth();
        if !text.is_empty() {
            self.emit(depth + 1, &text);
        }
        if let Some(end_tag) = end_tag {
            self.emit(depth, &end_tag);
        }
    }

    fn raw_text(&mut self, name: &str, open: &str, body: &str, line: usize) -> Result<(), FormatError> {
        self.flush();
        let depth = self.depth();
        let open = normalize_tag(open);
        let close = format!("</{}>", name);

        if name == "pre" || name == "textarea" {
            self.emit(depth, &format!("{}{}{}", open, body, close));
            return Ok(());
        }

        if name == "style" && !body.trim().is_empty() {
            let css = format_css(body, self.options.minify_css)
                .map_err(|message| FormatError::Css { line, message })?;

            self.emit(depth, &open);
            for l in dedent(&css) {
                if l.is_empty() {
                    self.lines.push(String::new());
                } else {
                    self.emit(depth + 1, &l);
                }
            }
            self.emit(depth, &close);
            return Ok(());
        }

        let lines = trim_blank_lines(body);
        if lines.is_empty() {
            self.emit(depth, &format!("{}{}", open, close));
            return Ok(());
        }

        self.emit(depth, &open);
        self.lines.extend(lines.into_iter().map(str::to_string));
        self.emit(depth, &close);
        Ok(())
    }

    fn finish(mut self) -> Result<String, FormatError> {
        while let Some(open) = self.stack.pop() {
            if !OPTIONAL_END.contains(&open.name.as_str()) {
                return Err(FormatError::UnclosedElement {
                    tag: open.name,
                    line: open.line,
                });
            }
            self.finish_element(open, None);
        }
        self.flush();

        let mut out = self.lines.join("\n");
        out.push('\n');
        Ok(out)
    }
}

/// Whether opening `next` implicitly ends an open `current` element.
fn closes_implicitly(current: &str, next: &str) -> bool {
    match current {
        "li" | "p" | "option" | "tr" => current == next,
        "dt" | "dd" => next == "dt" || next == "dd",
        "td" | "th" => next == "td" || next == "th" || next == "tr",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn format(source: &str) -> Result<String, FormatError> {
        Formatter::default().format(source)
    }

    #[test]
    fn formats_document() {
        let source = r#"<!DOCTYPE html>
<html>
<head>
<title>Week 1</title>
</head>
<body>
<div   class="app" >
<p>Hello
   <strong>world</strong>!</p>
</div>
<script type="module">
    const a = 1;

    if (a) {
      console.log(a);
    }
</script>
</body>
</html>
"#;

        let expected = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Week 1</title>
  </head>
  <body>
    <div class="app">
      <p>Hello <strong>world</strong>!</p>
    </div>
    <script type="module">
    const a = 1;

    if (a) {
      console.log(a);
    }
    </script>
  </body>
</html>
"#;

        assert_eq!(format(source).unwrap(), expected);
    }

    #[test]
    fn formatting_is_idempotent() {
        let source = "<html><body><ul id=\"exercise-list\"></ul>\n<!-- nav -->\n<p>a <a href=\"./x.html\">x</a></p><pre>  keep\n   this</pre><script>\n\t\tlet x = 1;\n</script></body></html>";

        let once = format(source).unwrap();
        let twice = format(&once).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn keeps_empty_script_tags_on_one_line() {
        let html = format("<body>\n<script type=\"module\" src=\"./ex1.js\"></script>\n</body>").unwrap();

        assert_eq!(
            html,
            "<body>\n  <script type=\"module\" src=\"./ex1.js\"></script>\n</body>\n"
        );
    }

    #[test]
    fn closes_optional_end_tags() {
        let html = format("<ul><li>a<li>b</ul>").unwrap();

        assert_eq!(html, "<ul>\n  <li>a\n  <li>b\n</ul>\n");
    }

    #[test]
    fn leaves_void_elements_open() {
        let html = format("<head><meta charset=\"utf-8\"><link rel=\"icon\" href=\"a.png\" /></head>").unwrap();

        assert_eq!(
            html,
            "<head>\n  <meta charset=\"utf-8\">\n  <link rel=\"icon\" href=\"a.png\" />\n</head>\n"
        );
    }

    #[test]
    fn preserves_quoted_attribute_whitespace() {
        let html = format("<div title=\"a   b\"  data-x='>'></div>").unwrap();

        assert_eq!(html, "<div title=\"a   b\" data-x='>'></div>\n");
    }

    #[test]
    fn reprints_styles() {
        let html = format("<style>body{margin:0}</style>").unwrap();

        assert!(html.starts_with("<style>\n"));
        assert!(html.contains("margin: 0"));
        assert!(html.ends_with("</style>\n"));
    }

    #[test]
    fn minifies_styles_when_configured() {
        let formatter = Formatter::new(FormatOptions {
            minify_css: true,
            ..Default::default()
        });

        let html = formatter
            .format("<style>\n.a {\n  color: red;\n}\n</style>")
            .unwrap();

        assert!(html.contains(".a{color:red}"));
    }

    #[test]
    fn rejects_stray_closing_tag() {
        let result = format("<div><p>text</span></div>");

        assert_eq!(
            result,
            Err(FormatError::StrayClosingTag {
                tag: "span".to_string(),
                line: 1
            })
        );
    }

    #[test]
    fn rejects_mismatched_closing_tag() {
        let result = format("<div>\n<span>\n</div>");

        assert_eq!(
            result,
            Err(FormatError::MismatchedClosingTag {
                expected: "span".to_string(),
                found: "div".to_string(),
                line: 3
            })
        );
    }

    #[test]
    fn rejects_unclosed_element() {
        let result = format("<section>\n<div>");

        assert_eq!(
            result,
            Err(FormatError::UnclosedElement {
                tag: "div".to_string(),
                line: 2
            })
        );
    }

    #[test]
    fn rejects_unterminated_constructs() {
        assert_eq!(
            format("<p>\n<div class=\"a"),
            Err(FormatError::UnterminatedTag { line: 2 })
        );
        assert_eq!(
            format("<!-- open"),
            Err(FormatError::UnterminatedComment { line: 1 })
        );
        assert_eq!(
            format("<script>let a;"),
            Err(FormatError::UnterminatedRawText {
                tag: "script".to_string(),
                line: 1
            })
        );
    }

    #[test]
    fn treats_bare_angle_brackets_as_text() {
        let html = format("<p>a < b</p>").unwrap();

        assert_eq!(html, "<p>a < b</p>\n");
    }

    #[test]
    fn keeps_template_literals_intact() {
        let source = "<body>\n<script type=\"module\">\n  const msg = `a\n  b   \nc`;\n\tdocument.body.textContent = msg;\n</script>\n</body>";

        let html = format(source).unwrap();

        assert!(
            html.contains("  const msg = `a\n  b   \nc`;\n\tdocument.body.textContent = msg;\n"),
            "{}",
            html
        );
        assert_eq!(format(&html).unwrap(), html);
    }

    #[test]
    fn keeps_shader_sources_intact() {
        let shader = "const fragment = /* glsl */ `\n    void main() {\n      gl_FragColor = vec4(1.0);\n    }\n`;";
        let source = format!("<html><body><script>\n\n{}\n\n</script></body></html>", shader);

        let html = format(&source).unwrap();

        assert!(html.contains(&format!("<script>\n{}\n    </script>", shader)), "{}", html);
    }

    #[test]
    fn trims_blank_lines_around_scripts() {
        assert_eq!(
            trim_blank_lines("\n \n  a  \n\n    b\n\t\n"),
            vec!["  a  ", "", "    b"]
        );
        assert!(trim_blank_lines(" \n\t\n").is_empty());
    }

    #[test]
    fn dedents_style_bodies() {
        assert_eq!(
            dedent("\n\n    a\n      b\n\n    c\n  \n"),
            vec!["a", "  b", "", "c"]
        );
        assert!(dedent(" \n\t\n").is_empty());
    }
}
