//! Comment and whitespace stripping.
//!
//! Not syntax aware: a `//` inside a JS string or regex literal that is not
//! preceded by `:`, `\` or `'` is treated as a comment.

use std::sync::LazyLock;

use regex::Regex;

/// Non-nested `/* ... */`.
static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/").expect("valid comment pattern")
});

static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n\t]").expect("valid whitespace pattern"));

static SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid space pattern"));

pub fn minify_css(text: &str) -> String {
    let mut out = squeeze(&BLOCK_COMMENT.replace_all(text, ""));
    // Dropping line breaks can join a `/` and `*` into a new comment.
    while BLOCK_COMMENT.is_match(&out) {
        out = squeeze(&BLOCK_COMMENT.replace_all(&out, ""));
    }
    out
}

/// [`minify_css`] plus `": "` → `":"`, for `<style>` blocks the crate emits.
pub fn minify_inline_css(text: &str) -> String {
    minify_css(text).replace(": ", ":")
}

pub fn minify_js(text: &str) -> String {
    squeeze(&strip_js_comments(text))
}

/// Drop line breaks and tabs, then collapse space runs.
fn squeeze(text: &str) -> String {
    let flat = LINE_BREAKS.replace_all(text, "");
    SPACE_RUN.replace_all(&flat, " ").into_owned()
}

/// Single left-to-right pass so a `//` inside a block comment (or a `/*`
/// inside a line comment) is consumed by the comment that started first.
fn strip_js_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] != b'/' {
            i += 1;
            continue;
        }
        let end = match bytes[i + 1] {
            b'*' => text[i + 2..].find("*/").map(|close| i + 2 + close + 2),
            b'/' if !matches!(i.checked_sub(1).map(|p| bytes[p]), Some(b':' | b'\\' | b'\'')) => {
                Some(text[i..].find('\n').map_or(text.len(), |nl| i + nl))
            }
            _ => None,
        };
        match end {
            Some(end) => {
                out.push_str(&text[copied..i]);
                copied = end;
                i = end;
            }
            None => i += 1,
        }
    }

    out.push_str(&text[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_comment_split_by_line_breaks() {
        let once = minify_css("a{}/\n* x *\n/b{}");
        assert_eq!(once, "a{}b{}");
        assert_eq!(minify_css(&once), once);
    }

    #[test]
    fn test_css_strips_comments_and_whitespace() {
        let css = "/* header */\nbody {\n\tcolor: red;   margin: 0;\n}\n/* a ** b */p{}";
        assert_eq!(minify_css(css), "body {color: red; margin: 0;}p{}");
    }

    #[test]
    fn test_css_idempotent() {
        let css = "/* x */\n.a  {  color :  blue ; }\r\n\t.b { top: 0 }";
        let once = minify_css(css);
        assert_eq!(minify_css(&once), once);

        let inline = minify_inline_css(css);
        assert_eq!(minify_inline_css(&inline), inline);
    }

    #[test]
    fn test_inline_css_tightens_colons() {
        assert_eq!(minify_inline_css(".a {\n  color: red;\n}"), ".a { color:red;}");
    }

    #[test]
    fn test_js_line_comments() {
        let js = "var a = 1; // one\nvar u = 'http://x.test'; // two\nvar b = 2;";
        assert_eq!(minify_js(js), "var a = 1; var u = 'http://x.test'; var b = 2;");
    }

    #[test]
    fn test_js_guarded_slashes_kept() {
        assert_eq!(minify_js("a = '//b';"), "a = '//b';");
        assert_eq!(minify_js(r"re = /\//;"), r"re = /\//;");
    }

    #[test]
    fn test_js_block_comment_wins() {
        assert_eq!(minify_js("a(); /* // not a line */ b();"), "a(); b();");
        assert_eq!(minify_js("a(); // /* open\nb();"), "a(); b();");
    }

    #[test]
    fn test_js_unclosed_block_kept() {
        assert_eq!(minify_js("a(); /* open"), "a(); /* open");
    }
}
