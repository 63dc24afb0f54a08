//! Layout cleanup: strip multi-column artifacts from converted HTML.
//!
//! The converter has no HTML equivalent for the LaTeX `multicols`
//! environment, so its markers leak into the output in two shapes:
//!
//! * the environment delimiters as literal text, either bare
//!   (`\begin{multicols}{2}` … `\end{multicols}`) or wrapped in their own
//!   paragraphs (`<p>\begin{multicols}</p>`);
//! * the column-count argument as a standalone numbered paragraph
//!   (`<p>2</p>`) directly after a wrapped opener.
//!
//! E-readers reflow a single column, so the right fix is plain removal.
//! This is pure, stateless text substitution: applying it twice yields the
//! same result as once, and it never touches image placeholders (the
//! patterns only match the literal environment text). It must run before
//! the placeholder rewriter so placeholders are never nested inside markup
//! the cleaner would otherwise corrupt.

use once_cell::sync::Lazy;
use regex::Regex;

/// Paragraph-wrapped opener, optionally followed by the column-count
/// paragraph the converter splits off the argument.
static RE_OPEN_WRAPPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<p>\s*\\begin\{multicols\}(?:\{\d+\})?\s*</p>\s*(?:<p>\s*\d+\s*</p>\s*)?")
        .unwrap()
});

/// Paragraph-wrapped closer.
static RE_CLOSE_WRAPPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<p>\s*\\end\{multicols\}\s*</p>\s*").unwrap());

/// Bare delimiters leaked outside any paragraph.
static RE_OPEN_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\begin\{multicols\}(?:\{\d+\})?").unwrap());
static RE_CLOSE_BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\end\{multicols\}").unwrap());

/// Remove all known multi-column layout artifacts.
pub fn clean(html: &str) -> String {
    let s = RE_OPEN_WRAPPED.replace_all(html, "");
    let s = RE_CLOSE_WRAPPED.replace_all(&s, "");
    let s = RE_OPEN_BARE.replace_all(&s, "");
    RE_CLOSE_BARE.replace_all(&s, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_wrapped_open_with_count_paragraph() {
        let html = "<p>\\begin{multicols}</p>\n<p>2</p>\n<p>body</p>\n<p>\\end{multicols}</p>\n";
        assert_eq!(clean(html), "<p>body</p>\n");
    }

    #[test]
    fn removes_wrapped_open_with_inline_argument() {
        let html = "<p>\\begin{multicols}{3}</p>\n<p>body</p>\n<p>\\end{multicols}</p>\n";
        assert_eq!(clean(html), "<p>body</p>\n");
    }

    #[test]
    fn removes_bare_delimiters() {
        let html = "\\begin{multicols}{2}<p>body</p>\\end{multicols}";
        assert_eq!(clean(html), "<p>body</p>");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let html = "<p>\\begin{multicols}</p>\n<p>2</p>\n<p>a</p>\n<p>\\end{multicols}</p>\n<p>b</p>";
        let once = clean(html);
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn plain_html_passes_through() {
        let html = "<h1>Title</h1>\n<p>Nothing multi-column here.</p>";
        assert_eq!(clean(html), html);
    }

    #[test]
    fn numbered_paragraph_alone_is_kept() {
        // A bare <p>2</p> with no multicols opener before it is content.
        let html = "<p>2</p><p>ordinary</p>";
        assert_eq!(clean(html), html);
    }

    #[test]
    fn placeholders_are_untouched() {
        let html = "<p>\\begin{multicols}{2}</p><embed src=\"fig.pdf\" /><p>\\end{multicols}</p>";
        assert_eq!(clean(html), "<embed src=\"fig.pdf\" />");
    }
}
