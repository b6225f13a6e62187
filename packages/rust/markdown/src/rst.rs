//! reStructuredText to markdown normalizer.
//!
//! Handles the Sphinx/MyST dialect used by the WPILib docs: section titles,
//! admonitions, images and figures, tab groups, remote includes, code blocks
//! and the common inline roles. The scan is cursor based over the input
//! lines; each construct inspects the lines ahead of the cursor and consumes
//! as many as it owns. Anything unrecognized is passed through or dropped, so
//! [`normalize`] never fails.

use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Patterns (compiled once)
// ---------------------------------------------------------------------------

/// Lines that produce no output: includes, `:orphan:`, label targets and
/// substitution definitions.
static SKIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\.\.\s+include::|:orphan:|\.\.\s+_[^:]*:|\.\.\s+\|[^|]+\|\s+[\w-]+::)")
        .expect("skip regex")
});

static ADMONITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\.\.\s+(note|warning|important|tip|caution|danger|todo|seealso)::\s*(.*)$")
        .expect("admonition regex")
});

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\.\s+image::\s*(.*)$").expect("image regex"));

static FIGURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\.\s+figure::\s*(.*)$").expect("figure regex"));

static ALT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":alt:\s*(.*)$").expect("alt regex"));

static TAB_SET_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\.\s+tab-set-code::").expect("tab-set-code regex"));

static TAB_SET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\.\s+tab-set::").expect("tab-set regex"));

static TAB_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{3,}\.\.\s+tab-item::\s*(.*)$").expect("tab-item regex"));

static REMOTE_INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\.\.\s+remoteliteralinclude::\s*(.*)$").expect("remoteliteralinclude regex")
});

static LANGUAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":language:\s*(.*)$").expect("language regex"));

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.\.\s+(?:code-block|code|sourcecode)::\s*(.*)$").expect("code-block regex")
});

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\.\s+[\w-]+::").expect("directive regex"));

/// Inline substitutions, applied in order. Later rules must not re-match
/// text produced by earlier ones.
static INLINE_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r":ref:`\s*([^<`]+?)\s*<[^>]+>`", "${1}"),
        (r":ref:`([^`]+)`", "${1}"),
        (r":doc:`([^`]+)`", "${1}"),
        (r":term:`([^`]+)`", "*${1}*"),
        (r":external:[^`]+`\s*([^<`]+?)\s*<[^>]+>`", "${1}"),
        (r":external:[^`]+`([^`]+)`", "`${1}`"),
        (r":(?:guilabel|menuselection):`([^`]+)`", "**${1}**"),
        (r":(?:file|command):`([^`]+)`", "`${1}`"),
        (r"``([^`]+)``", "`${1}`"),
        (r"\|reg\|", "\u{00AE}"),
        (r"\\\s+", " "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("inline regex"), replacement))
    .collect()
});

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Convert reStructuredText to markdown.
///
/// Total: any input yields output, and the output never contains more than
/// one consecutive blank line.
pub fn normalize(source: &str) -> String {
    let lines: Vec<&str> = source
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();

    let mut scanner = Scanner::new(&lines);
    scanner.run();
    collapse_blank_lines(&scanner.out.join("\n"))
}

/// Apply the inline role substitutions to a single line.
pub fn convert_inline(line: &str) -> String {
    let mut converted = line.to_string();
    for (re, replacement) in INLINE_RULES.iter() {
        if re.is_match(&converted) {
            converted = re.replace_all(&converted, *replacement).into_owned();
        }
    }
    converted
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct Scanner<'a> {
    lines: &'a [&'a str],
    pos: usize,
    out: Vec<String>,
}

impl<'a> Scanner<'a> {
    fn new(lines: &'a [&'a str]) -> Self {
        Self {
            lines,
            pos: 0,
            out: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<&'a str> {
        self.lines.get(self.pos + offset).copied()
    }

    fn run(&mut self) {
        while let Some(line) = self.peek(0) {
            if SKIP_RE.is_match(line) {
                self.pos += 1;
                continue;
            }

            let consumed = self.overline_title(line)
                || self.section_title(line)
                || self.admonition(line)
                || self.image(line)
                || self.figure(line)
                || self.tab_set_code(line)
                || self.tab_set(line)
                || self.remote_include(line)
                || self.code_block(line)
                || self.unknown_directive(line);

            if !consumed {
                self.out.push(convert_inline(line));
                self.pos += 1;
            }
        }
    }

    /// `=====` / `Title` / `=====`, always level 1.
    fn overline_title(&mut self, line: &str) -> bool {
        let (Some(title), Some(under)) = (self.peek(1), self.peek(2)) else {
            return false;
        };
        let Some(over_char) = underline_char(line) else {
            return false;
        };
        if is_blank(title) || underline_char(under) != Some(over_char) {
            return false;
        }

        self.out.push(format!("# {}", convert_inline(title.trim())));
        self.pos += 3;
        true
    }

    /// `Title` followed by an underline at least as long as the title.
    fn section_title(&mut self, line: &str) -> bool {
        let Some(next) = self.peek(1) else {
            return false;
        };
        let Some(ch) = underline_char(next) else {
            return false;
        };
        if is_blank(line)
            || line.starts_with(char::is_whitespace)
            || line.starts_with("..")
            || underline_char(line).is_some()
        {
            return false;
        }
        if next.trim_end().chars().count() < line.trim_end().chars().count() {
            return false;
        }

        let level = match ch {
            '=' => 1,
            '-' => 2,
            '~' => 3,
            _ => 4,
        };
        self.out.push(format!(
            "{} {}",
            "#".repeat(level),
            convert_inline(line.trim())
        ));
        self.pos += 2;
        true
    }

    fn admonition(&mut self, line: &str) -> bool {
        let Some(caps) = ADMONITION_RE.captures(line) else {
            return false;
        };
        let label = capitalize(&caps[1]);
        let mut body: Vec<&str> = Vec::new();
        let first = caps.get(2).map_or("", |m| m.as_str().trim());
        if !first.is_empty() {
            body.push(first);
        }
        self.pos += 1;

        while let Some(l) = self.peek(0) {
            if is_blank(l) {
                // paragraph break, kept as a double space after the join
                if body.last().is_some_and(|prev| !prev.is_empty()) {
                    body.push("");
                }
            } else if indent_of(l) >= 3 {
                body.push(l.trim());
            } else {
                break;
            }
            self.pos += 1;
        }

        if body.last().is_some_and(|prev| prev.is_empty()) {
            body.pop();
        }

        let text = convert_inline(&body.join(" "));
        self.out.push(String::new());
        self.out
            .push(format!("> **{label}:** {text}").trim_end().to_string());
        self.out.push(String::new());
        true
    }

    fn image(&mut self, line: &str) -> bool {
        let Some(caps) = IMAGE_RE.captures(line) else {
            return false;
        };
        let src = caps[1].trim().to_string();
        self.pos += 1;

        let mut alt = String::new();
        while let Some(l) = self.peek(0) {
            if !is_option(l) {
                break;
            }
            if let Some(c) = ALT_RE.captures(l) {
                alt = c[1].trim().to_string();
            }
            self.pos += 1;
        }

        self.out.push(format!("![{alt}]({src})"));
        true
    }

    /// Like an image, but the indented caption/legend body is discarded.
    fn figure(&mut self, line: &str) -> bool {
        let Some(caps) = FIGURE_RE.captures(line) else {
            return false;
        };
        let src = caps[1].trim().to_string();
        self.pos += 1;

        let mut alt = String::new();
        while let Some(l) = self.peek(0) {
            if !is_blank(l) && indent_of(l) < 3 {
                break;
            }
            if let Some(c) = ALT_RE.captures(l) {
                alt = c[1].trim().to_string();
            }
            self.pos += 1;
        }

        self.out.push(format!("![{alt}]({src})"));
        self.out.push(String::new());
        true
    }

    /// Flat code tabs: the body is dedented and normalized in place.
    fn tab_set_code(&mut self, line: &str) -> bool {
        if !TAB_SET_CODE_RE.is_match(line) {
            return false;
        }
        self.pos += 1;
        self.skip_options();

        let mut body: Vec<&str> = Vec::new();
        while let Some(l) = self.peek(0) {
            if !is_blank(l) && indent_of(l) == 0 {
                break;
            }
            body.push(l);
            self.pos += 1;
        }

        let indent = common_indent(&body);
        let dedented: Vec<&str> = body.iter().map(|l| strip_indent(l, indent)).collect();
        self.emit_nested(&dedented);
        true
    }

    /// Named tabs: `   .. tab-item:: Name` with content at six spaces.
    fn tab_set(&mut self, line: &str) -> bool {
        if !TAB_SET_RE.is_match(line) {
            return false;
        }
        self.pos += 1;
        self.skip_options();
        self.skip_blank();

        while let Some(l) = self.peek(0) {
            let Some(caps) = TAB_ITEM_RE.captures(l) else {
                break;
            };
            let name = caps[1].trim().to_string();
            self.out.push(String::new());
            self.out.push(format!("**{name}:**"));
            self.pos += 1;
            self.skip_options();

            let mut body: Vec<&str> = Vec::new();
            while let Some(b) = self.peek(0) {
                if TAB_ITEM_RE.is_match(b) || (!is_blank(b) && indent_of(b) < 6) {
                    break;
                }
                body.push(strip_indent(b, 6));
                self.pos += 1;
            }

            self.emit_nested(&body);
            self.skip_blank();
        }
        true
    }

    /// Replaced by a reference line; the remote file is never fetched.
    fn remote_include(&mut self, line: &str) -> bool {
        let Some(caps) = REMOTE_INCLUDE_RE.captures(line) else {
            return false;
        };
        let url = caps[1].trim().to_string();
        self.pos += 1;

        let mut lang = String::new();
        while let Some(l) = self.peek(0) {
            if !is_option(l) {
                break;
            }
            if let Some(c) = LANGUAGE_RE.captures(l) {
                lang = c[1].trim().to_string();
            }
            self.pos += 1;
        }

        let label = if lang.is_empty() { "code" } else { lang.as_str() };
        self.out.push(String::new());
        self.out.push(format!("*See source: [{label}]({url})*"));
        self.out.push(String::new());
        true
    }

    fn code_block(&mut self, line: &str) -> bool {
        let Some(caps) = CODE_BLOCK_RE.captures(line) else {
            return false;
        };
        let lang = caps[1].trim().to_string();
        self.pos += 1;
        self.skip_options();
        self.skip_blank();

        let mut body: Vec<&str> = Vec::new();
        while let Some(l) = self.peek(0) {
            if is_blank(l) {
                // The block ends at a blank line unless indented code follows.
                let continues = self.lines[self.pos..]
                    .iter()
                    .find(|n| !is_blank(n))
                    .is_some_and(|n| indent_of(n) >= 3);
                if !continues {
                    break;
                }
            } else if indent_of(l) < 3 {
                break;
            }
            body.push(l);
            self.pos += 1;
        }

        let indent = common_indent(&body);
        self.out.push(format!("```{lang}"));
        self.out
            .extend(body.iter().map(|l| strip_indent(l, indent).to_string()));
        self.out.push("```".to_string());
        true
    }

    /// Drop the directive line and its options; the body passes through.
    fn unknown_directive(&mut self, line: &str) -> bool {
        if !DIRECTIVE_RE.is_match(line) {
            return false;
        }
        self.pos += 1;
        self.skip_options();
        true
    }

    fn skip_options(&mut self) {
        while self.peek(0).is_some_and(is_option) {
            self.pos += 1;
        }
    }

    fn skip_blank(&mut self) {
        while self.peek(0).is_some_and(is_blank) {
            self.pos += 1;
        }
    }

    fn emit_nested(&mut self, lines: &[&str]) {
        let nested = normalize(&lines.join("\n"));
        self.out.push(String::new());
        if !nested.is_empty() {
            self.out.extend(nested.lines().map(str::to_string));
            self.out.push(String::new());
        }
    }
}

// ---------------------------------------------------------------------------
// Line helpers
// ---------------------------------------------------------------------------

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Directive option line such as `   :alt: text`.
fn is_option(line: &str) -> bool {
    indent_of(line) >= 3 && line.trim_start().starts_with(':')
}

/// The repeated character of a section underline, if `line` is one.
fn underline_char(line: &str) -> Option<char> {
    let line = line.trim_end();
    let first = line.chars().next()?;
    if !matches!(first, '=' | '-' | '~' | '^' | '"') {
        return None;
    }
    if line.chars().count() < 3 || !line.chars().all(|c| c == first) {
        return None;
    }
    Some(first)
}

/// Smallest indentation among non-blank lines.
fn common_indent(lines: &[&str]) -> usize {
    lines
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0)
}

/// Remove up to `n` leading whitespace characters.
fn strip_indent(line: &str, n: usize) -> &str {
    let mut rest = line;
    for _ in 0..n {
        match rest.chars().next() {
            Some(c) if c.is_whitespace() => rest = &rest[c.len_utf8()..],
            _ => break,
        }
    }
    rest
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Blank out whitespace-only lines, keep at most one blank line in a row, trim.
fn collapse_blank_lines(text: &str) -> String {
    let mut result: Vec<&str> = Vec::new();
    let mut prev_blank = false;

    for line in text.lines() {
        let blank = is_blank(line);
        if blank && prev_blank {
            continue;
        }
        result.push(if blank { "" } else { line });
        prev_blank = blank;
    }

    result.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_blank_run(text: &str, run: usize) -> bool {
        let mut count = 0;
        for line in text.split('\n') {
            if line.trim().is_empty() {
                count += 1;
                if count >= run {
                    return true;
                }
            } else {
                count = 0;
            }
        }
        false
    }

    // --- Titles ---

    #[test]
    fn underlined_title_becomes_h1() {
        assert_eq!(normalize("Title\n====="), "# Title");
        assert_eq!(normalize("Title\n=========="), "# Title");
    }

    #[test]
    fn underline_char_selects_level() {
        assert_eq!(normalize("Sub\n---"), "## Sub");
        assert_eq!(normalize("Deeper\n~~~~~~"), "### Deeper");
        assert_eq!(normalize("Deepest\n^^^^^^^"), "#### Deepest");
        assert_eq!(normalize("Quoted\n\"\"\"\"\"\""), "#### Quoted");
    }

    #[test]
    fn short_underline_is_not_a_title() {
        let out = normalize("A long title\n===");
        assert!(!out.starts_with('#'));
        assert!(out.contains("A long title"));
    }

    #[test]
    fn overline_title_is_level_one() {
        assert_eq!(
            normalize("==========\nDrivetrain\n==========\n\nBody text."),
            "# Drivetrain\n\nBody text."
        );
    }

    // --- Admonitions ---

    #[test]
    fn note_becomes_callout() {
        assert_eq!(normalize(".. note:: hello"), "> **Note:** hello");
    }

    #[test]
    fn admonition_body_is_flattened() {
        let rst = ".. warning:: Motors can\n   move unexpectedly.\n\n   Keep clear.\n\nAfter";
        assert_eq!(
            normalize(rst),
            "> **Warning:** Motors can move unexpectedly.  Keep clear.\n\nAfter"
        );
    }

    #[test]
    fn admonition_keeps_paragraph_breaks() {
        assert_eq!(
            normalize(".. note:: First para.\n\n   Second para."),
            "> **Note:** First para.  Second para."
        );
        assert_eq!(
            normalize(".. note:: One.\n\n\n   Two.\n\n   Three.\n\nAfter"),
            "> **Note:** One.  Two.  Three.\n\nAfter"
        );
    }

    #[test]
    fn admonition_body_gets_inline_roles() {
        let out = normalize(".. tip::\n\n   Use ``Timer.delay()`` sparingly.");
        assert_eq!(out, "> **Tip:** Use `Timer.delay()` sparingly.");
    }

    // --- Images ---

    #[test]
    fn image_with_alt() {
        let rst = ".. image:: images/wiring.png\n   :alt: Wiring diagram\n   :width: 500";
        assert_eq!(normalize(rst), "![Wiring diagram](images/wiring.png)");
    }

    #[test]
    fn figure_caption_is_discarded() {
        let rst = ".. figure:: images/field.svg\n   :alt: Field\n\n   The 2025 field layout.\n\nNext.";
        assert_eq!(normalize(rst), "![Field](images/field.svg)\n\nNext.");
    }

    // --- Tabs ---

    #[test]
    fn tab_set_flattens_named_tabs() {
        let rst = "\
.. tab-set::

   .. tab-item:: Java
      :sync: java

      .. code-block:: java

         PIDController pid = new PIDController(kP, kI, kD);

   .. tab-item:: C++
      :sync: cpp

      .. code-block:: cpp

         frc::PIDController pid{kP, kI, kD};

Next paragraph.";

        let expected = "\
**Java:**

```java
PIDController pid = new PIDController(kP, kI, kD);
```

**C++:**

```cpp
frc::PIDController pid{kP, kI, kD};
```

Next paragraph.";

        assert_eq!(normalize(rst), expected);
    }

    #[test]
    fn tab_set_code_passes_code_blocks_through() {
        let rst = "\
.. tab-set-code::

   .. code-block:: java

      var x = 1;

   .. code-block:: python

      x = 1";

        assert_eq!(
            normalize(rst),
            "```java\nvar x = 1;\n```\n\n```python\nx = 1\n```"
        );
    }

    // --- Remote includes and code blocks ---

    #[test]
    fn remote_include_becomes_reference() {
        let rst = "   .. remoteliteralinclude:: https://github.com/wpilibsuite/allwpilib/raw/main/Robot.java\n      :language: java\n      :lines: 10-20";
        assert_eq!(
            normalize(rst),
            "*See source: [java](https://github.com/wpilibsuite/allwpilib/raw/main/Robot.java)*"
        );
    }

    #[test]
    fn remote_include_without_language() {
        let out = normalize(".. remoteliteralinclude:: https://example.com/a.py");
        assert_eq!(out, "*See source: [code](https://example.com/a.py)*");
    }

    #[test]
    fn code_block_keeps_relative_indentation() {
        let rst = "\
.. code-block:: java
   :linenos:

   int x = 1;
   if (x > 0) {
       run();
   }

After.";
        assert_eq!(
            normalize(rst),
            "```java\nint x = 1;\nif (x > 0) {\n    run();\n}\n```\n\nAfter."
        );
    }

    #[test]
    fn code_block_spans_inner_blank_lines() {
        let rst = ".. code-block:: python\n\n   a = 1\n\n   b = 2\n\nDone.";
        assert_eq!(normalize(rst), "```python\na = 1\n\nb = 2\n```\n\nDone.");
    }

    // --- Skips and unknown directives ---

    #[test]
    fn metadata_directives_are_skipped() {
        let rst = ":orphan:\n\n.. include:: <isonum.txt>\n\n.. _pid-control:\n\nIntro text.";
        assert_eq!(normalize(rst), "Intro text.");
    }

    #[test]
    fn unknown_directive_drops_line_and_options() {
        let rst = ".. toctree::\n   :maxdepth: 1\n\n   intro\n   setup";
        let out = normalize(rst);
        assert!(!out.contains("toctree"));
        assert!(!out.contains("maxdepth"));
        assert!(out.contains("intro"));
        assert!(out.contains("setup"));
    }

    // --- Inline roles ---

    #[test]
    fn double_backticks_become_code_span() {
        assert_eq!(normalize("Call ``code`` here"), "Call `code` here");
    }

    #[test]
    fn inline_roles_convert_in_order() {
        assert_eq!(convert_inline(":ref:`PID docs <docs/pid:pid>`"), "PID docs");
        assert_eq!(convert_inline(":ref:`pid-control`"), "pid-control");
        assert_eq!(convert_inline(":doc:`/docs/software/basics`"), "/docs/software/basics");
        assert_eq!(convert_inline(":term:`robot`"), "*robot*");
        assert_eq!(
            convert_inline(":external:py:class:`Timer <wpilib.Timer>`"),
            "Timer"
        );
        assert_eq!(convert_inline(":external:py:class:`wpilib.Timer`"), "`wpilib.Timer`");
        assert_eq!(convert_inline(":guilabel:`Deploy`"), "**Deploy**");
        assert_eq!(convert_inline(":menuselection:`File --> Save`"), "**File --> Save**");
        assert_eq!(convert_inline(":file:`build.gradle`"), "`build.gradle`");
        assert_eq!(convert_inline(":command:`./gradlew`"), "`./gradlew`");
        assert_eq!(convert_inline("FIRST|reg| Robotics"), "FIRST\u{00AE} Robotics");
        assert_eq!(convert_inline("a\\  b"), "a b");
    }

    // --- Blank lines and totality ---

    #[test]
    fn blank_runs_collapse_to_one() {
        assert_eq!(normalize("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize("a\n   \n\t\n\nb"), "a\n\nb");
    }

    #[test]
    fn crlf_input_is_handled() {
        assert_eq!(normalize("Title\r\n=====\r\n\r\nText\r\n"), "# Title\n\nText");
    }

    #[test]
    fn normalizer_is_total() {
        let inputs = [
            "",
            "\n\n\n",
            ".. note::",
            ".. code-block::",
            ".. tab-set::",
            ".. tab-set-code::",
            ".. image::",
            ".. figure::",
            ".. remoteliteralinclude::",
            ".. toctree::\n   :maxdepth: 2",
            "=====",
            "===\n===\n===",
            "Title\n",
            "   .. tab-item:: Orphan tab",
            ":ref:`unterminated",
            "é\n===\n\n\n\n\n☃",
        ];
        for input in inputs {
            let out = normalize(input);
            assert!(!has_blank_run(&out, 2), "blank run in output for {input:?}");
        }
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(".. toctree::\n   :maxdepth: 2"), "");
    }

    #[test]
    fn fixture_document_normalizes() {
        let rst = std::fs::read_to_string("../../../fixtures/rst/pidcontroller.rst")
            .expect("read rst fixture");
        let md = normalize(&rst);

        assert!(md.starts_with("# PID Control in WPILib"));
        assert!(md.contains("## Using the PIDController Class"));
        assert!(md.contains("> **Note:**"));
        assert!(md.contains("**Java:**"));
        assert!(md.contains("```java"));
        assert!(md.contains("`PIDController`"));
        assert!(md.contains("*See source: [java]("));
        assert!(!md.contains(".. "));
        assert!(!has_blank_run(&md, 2));
    }
}
