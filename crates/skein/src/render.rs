//! Indented thread rendering to stdout.

use console::{Style, Term};
use skein_fedi::Status;
use skein_hn::Comment;
use skein_thread::{CommentNode, ThreadResult};

/// Renders resolved threads as indented plain text.
pub(crate) struct ThreadPrinter {
    term: Term,
    author: Style,
    viewed: Style,
    dim: Style,
}

impl ThreadPrinter {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stdout(),
            author: Style::new().cyan(),
            viewed: Style::new().magenta().bold(),
            dim: Style::new().dim(),
        }
    }

    /// Print a federated thread, marking the post the caller asked for.
    pub(crate) fn print_fedi(&self, thread: &ThreadResult<Status>) {
        thread.root.walk(&mut |node, depth| {
            let indent = "  ".repeat(depth);
            let status = &node.payload;
            let name = format!("@{}", status.account.acct);
            let styled_name = if status.id == thread.original_post.id {
                self.viewed.apply_to(format!("{name} *"))
            } else {
                self.author.apply_to(name)
            };
            let stamp = status.created_at.format("%Y-%m-%d %H:%M");
            let _ = self.term.write_line(&format!(
                "{indent}{styled_name} {}",
                self.dim.apply_to(format!("({stamp})"))
            ));
            if !status.spoiler_text.is_empty() {
                let _ = self
                    .term
                    .write_line(&format!("{indent}[CW] {}", status.spoiler_text));
            }
            self.print_body(&indent, &status.content);
        });
    }

    /// Print an ordered story forest.
    pub(crate) fn print_hn(&self, forest: &[CommentNode<Comment>]) {
        for top_level in forest {
            top_level.walk(&mut |node, depth| {
                let indent = "  ".repeat(depth);
                let comment = &node.payload;
                let author = comment.author.as_deref().unwrap_or("[deleted]");
                let _ = self
                    .term
                    .write_line(&format!("{indent}{}", self.author.apply_to(author)));
                if let Some(text) = &comment.comment_text {
                    self.print_body(&indent, text);
                }
            });
        }
    }

    fn print_body(&self, indent: &str, html: &str) {
        for line in strip_html(html).lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let _ = self.term.write_line(&format!("{indent}{line}"));
        }
        let _ = self.term.write_line("");
    }
}

/// Reduce an HTML fragment to plain text.
///
/// Both sources serve comment bodies as small HTML fragments. Tags are
/// dropped, paragraph and line breaks become newlines, and the handful of
/// entities the platforms actually emit are decoded. Not a general HTML
/// renderer.
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        if in_tag {
            if ch == '>' {
                in_tag = false;
                let name = tag.to_ascii_lowercase();
                if name.starts_with("br") || name.starts_with("/p") {
                    text.push('\n');
                }
                tag.clear();
            } else {
                tag.push(ch);
            }
        } else if ch == '<' {
            in_tag = true;
        } else {
            text.push(ch);
        }
    }
    decode_entities(text.trim())
}

fn decode_entities(text: &str) -> String {
    // `&amp;` last, so already-escaped entities decode once, not twice.
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_strip_html_drops_tags_keeps_text() {
        let text = strip_html("<p>Hello <a href=\"https://example.org\">there</a></p>");

        assert_eq!(text, "Hello there");
    }

    #[test]
    fn test_strip_html_turns_breaks_into_newlines() {
        let text = strip_html("<p>one</p><p>two<br>three</p>");

        assert_eq!(text, "one\ntwo\nthree");
    }

    #[test]
    fn test_strip_html_decodes_common_entities() {
        let text = strip_html("a &lt; b &amp;&amp; c &gt; d");

        assert_eq!(text, "a < b && c > d");
    }

    #[test]
    fn test_strip_html_decodes_escaped_entity_once() {
        let text = strip_html("literal &amp;lt; stays");

        assert_eq!(text, "literal &lt; stays");
    }

    #[test]
    fn test_strip_html_plain_text_unchanged() {
        let text = strip_html("no markup here");

        assert_eq!(text, "no markup here");
    }
}
