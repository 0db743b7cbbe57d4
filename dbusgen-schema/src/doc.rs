//! Documentation comments attached to introspection elements.
//!
//! A comment documents the element that follows it when its first line names
//! that element:
//!
//! ```text
//! <!-- Resize:
//!      @size: New partition size in bytes.
//!      @since 2.7.2
//!
//!      Resizes the partition.
//! -->
//! <method name="Resize">
//! ```
//!
//! Anything that does not fit this shape is kept as prose; a comment is never
//! a reason to reject a document.

use std::collections::BTreeMap;

/// Structured view of a documentation comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    /// Name of the documented element.
    pub symbol: String,
    /// Text following `Symbol:` on the first line.
    pub brief: Option<String>,
    /// `@name: description` lines, keyed by name.
    pub params: BTreeMap<String, String>,
    /// Version from an `@since` line.
    pub since: Option<String>,
    /// Free text paragraphs.
    pub paragraphs: Vec<String>,
    /// The comment text as it appeared in the document.
    pub raw: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Begin,
    Params,
    Body,
}

impl DocComment {
    /// Parses the text of an XML comment.
    ///
    /// Returns `None` when the comment does not start with a `Symbol:` line.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut doc = Self {
            raw: text.to_string(),
            ..Self::default()
        };
        let mut state = State::Begin;
        let mut paragraph: Vec<&str> = Vec::new();

        for line in text.lines().map(str::trim) {
            match state {
                State::Begin => {
                    if line.is_empty() {
                        continue;
                    }
                    let (symbol, brief) = match line.find(": ") {
                        Some(idx) => (&line[..idx], line[idx + 2..].trim()),
                        None => (line.strip_suffix(':')?, ""),
                    };
                    if symbol.is_empty() || symbol.contains(char::is_whitespace) {
                        return None;
                    }
                    doc.symbol = symbol.to_string();
                    if !brief.is_empty() {
                        doc.brief = Some(brief.to_string());
                    }
                    state = State::Params;
                }
                State::Params => {
                    if line.is_empty() {
                        state = State::Body;
                    } else if let Some(version) = parse_since(line) {
                        doc.since = Some(version);
                    } else if let Some((name, text)) = parse_param(line) {
                        doc.params.insert(name.to_string(), text.to_string());
                    } else {
                        state = State::Body;
                        paragraph.push(line);
                    }
                }
                State::Body => {
                    if line.is_empty() {
                        doc.flush_paragraph(&mut paragraph);
                    } else if let Some(version) = parse_since(line) {
                        doc.since = Some(version);
                    } else {
                        paragraph.push(line);
                    }
                }
            }
        }
        doc.flush_paragraph(&mut paragraph);

        if state == State::Begin {
            return None;
        }
        Some(doc)
    }

    /// Returns true if this comment documents an element named `name`.
    #[must_use]
    pub fn documents(&self, name: &str) -> bool {
        self.symbol == name
    }

    /// Returns the description of a parameter or member.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns the free text joined into one string, paragraphs separated by
    /// blank lines.
    #[must_use]
    pub fn body(&self) -> String {
        self.paragraphs.join("\n\n")
    }

    fn flush_paragraph(&mut self, lines: &mut Vec<&str>) {
        if !lines.is_empty() {
            self.paragraphs.push(lines.join("\n"));
            lines.clear();
        }
    }
}

/// Parses `@since VERSION`; malformed versions are left to the prose.
fn parse_since(line: &str) -> Option<String> {
    let rest = line.strip_prefix("@since")?;
    if !rest.starts_with([' ', '\t', ':']) {
        return None;
    }
    let version = rest.trim_start_matches(':').trim();
    let well_formed = !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
    well_formed.then(|| version.to_string())
}

fn parse_param(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('@')?;
    let idx = rest.find(": ")?;
    let name = &rest[..idx];
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, rest[idx + 2..].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESIZE: &str = "Resize:
                 @size: New partition size in bytes, 0 for maximal size.
                 @options: Options.
                 @since 2.7.2

                 Resizes the partition.

                 The partition will not change its position but might be slightly bigger
                 than requested due to sector counts and alignment (e.g. 1MiB).
            ";

    #[test]
    fn test_parse_full_comment() {
        let doc = DocComment::parse(RESIZE).expect("doc comment");

        assert_eq!(doc.symbol, "Resize");
        assert_eq!(doc.brief, None);
        assert_eq!(
            doc.param("size"),
            Some("New partition size in bytes, 0 for maximal size.")
        );
        assert_eq!(doc.param("options"), Some("Options."));
        assert_eq!(doc.since.as_deref(), Some("2.7.2"));
        assert_eq!(doc.paragraphs.len(), 2);
        assert_eq!(doc.paragraphs[0], "Resizes the partition.");
        assert!(doc.paragraphs[1].ends_with("alignment (e.g. 1MiB)."));
        assert!(doc.documents("Resize"));
    }

    #[test]
    fn test_parse_brief_on_symbol_line() {
        let doc = DocComment::parse("org.example.Foo: An example interface.").expect("doc");
        assert_eq!(doc.symbol, "org.example.Foo");
        assert_eq!(doc.brief.as_deref(), Some("An example interface."));
        assert!(doc.paragraphs.is_empty());
    }

    #[test]
    fn test_plain_comment_is_not_documentation() {
        assert!(DocComment::parse("just a note about this file").is_none());
        assert!(DocComment::parse("   \n  ").is_none());
        assert!(DocComment::parse("two words: here").is_none());
    }

    #[test]
    fn test_malformed_since_kept_as_text() {
        let doc = DocComment::parse("Run:\n@since soon\nStarts running.").expect("doc");
        assert_eq!(doc.since, None);
        assert_eq!(doc.paragraphs, vec!["@since soon\nStarts running.".to_string()]);
    }

    #[test]
    fn test_since_inside_body() {
        let doc = DocComment::parse("Run:\n\nStarts running.\n@since 1.4").expect("doc");
        assert_eq!(doc.since.as_deref(), Some("1.4"));
        assert_eq!(doc.body(), "Starts running.");
    }
}
