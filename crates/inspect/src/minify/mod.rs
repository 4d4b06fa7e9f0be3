//! Minification Verifier
//!
//! Content counts as minified when it is byte-for-byte equal to its canonical
//! form. Each [`MinificationClass`] has its own canonicalization; all of them
//! are idempotent.

mod css;
mod html;
mod script;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{ensure, CheckError, Verdict};

/// Content class, selecting the canonicalization algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinificationClass {
    Html,
    Css,
    Script,
}

impl MinificationClass {
    pub fn name(&self) -> &'static str {
        match self {
            MinificationClass::Html => "html",
            MinificationClass::Css => "css",
            MinificationClass::Script => "js",
        }
    }
}

impl fmt::Display for MinificationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MinificationClass {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(MinificationClass::Html),
            "css" => Ok(MinificationClass::Css),
            "js" | "script" | "javascript" => Ok(MinificationClass::Script),
            _ => Err(CheckError::precondition(format!(
                "{} is not a minifiable content class. Allowed classes are: html,css,js",
                s
            ))),
        }
    }
}

/// Canonical (minified) form of `content`
pub fn canonicalize(content: &str, class: MinificationClass) -> String {
    match class {
        MinificationClass::Html => html::canonicalize(content),
        MinificationClass::Css => css::canonicalize(content),
        MinificationClass::Script => script::canonicalize(content),
    }
}

pub fn is_minified(content: &str, class: MinificationClass) -> bool {
    let canonical = canonicalize(content, class);
    if canonical != content {
        debug!(
            "{} content differs from canonical form ({} -> {} chars)",
            class,
            content.chars().count(),
            canonical.chars().count()
        );
        return false;
    }
    true
}

/// Verifies that fetched content is already in canonical form
#[derive(Debug, Clone, Default)]
pub struct MinificationVerifier;

impl MinificationVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Judge `content` fetched from `source`; the diagnostic embeds the content
    pub fn verify(&self, content: &str, class: MinificationClass, source: &str) -> Verdict {
        ensure(is_minified(content, class), || {
            format!("{} resource {} is not minified:\n{}", class, source, content)
        })
    }
}

// Scanning helpers shared by the canonicalizers

/// Whitespace as understood by the canonicalizers
pub(crate) fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

pub(crate) fn starts_with(chars: &[char], at: usize, pattern: &str) -> bool {
    let mut i = at;
    for p in pattern.chars() {
        if chars.get(i) != Some(&p) {
            return false;
        }
        i += 1;
    }
    true
}

/// Index after the whitespace run starting at `from`
pub(crate) fn skip_spaces(chars: &[char], from: usize) -> usize {
    let mut i = from;
    while i < chars.len() && is_space(chars[i]) {
        i += 1;
    }
    i
}

/// End (exclusive) of the quoted literal opening at `start`.
///
/// `None` when the literal is unterminated; only backtick literals may span
/// lines.
pub(crate) fn quoted_end(chars: &[char], start: usize) -> Option<usize> {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return Some(i + 1),
            '\n' if quote != '`' => return None,
            _ => i += 1,
        }
    }
    None
}

/// End (exclusive) of the block comment opening at `start`
pub(crate) fn comment_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 2;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return Some(i + 2);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const HTML_CORPUS: &[&str] = &[
        "<div>\n  <p>Hi</p>\n</div>",
        "<p>two  words</p>  <br/>\t",
        "  <html><head>\n<title> Home </title></head></html>\n",
        "text only",
    ];

    const CSS_CORPUS: &[&str] = &[
        "a { color: red; }",
        "/*! keep */\nbody , p > a  ~ b + c { margin : 0 auto ; ; }",
        "a :hover { x: y }",
        "a[href *= \"x\"] { content: \"a  ;  b\" !important }",
        "@media screen and (max-width: 100px) {\n  .a { b: c; }\n}",
        "/* drop */ p { } /* unterminated",
        "a / /* x */ * b",
    ];

    const SCRIPT_CORPUS: &[&str] = &[
        "function f( x ) { return x + 1; }",
        "var s = \"a  b\" ; // trailing\nvar u = 'http://x' ;",
        "/*! license */\nvar re = /a b/g ;\nif ( re.test( s ) ) { go( ) ; }",
        "x = a / b / c ;",
        "a/* c */b; /*@cc_on keep */ var t = `x ${ y }`;",
        "return   /re/ + 1",
        "i = i + +j; k = k - -1;",
    ];

    fn classes() -> Vec<(MinificationClass, &'static [&'static str])> {
        vec![
            (MinificationClass::Html, HTML_CORPUS),
            (MinificationClass::Css, CSS_CORPUS),
            (MinificationClass::Script, SCRIPT_CORPUS),
        ]
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        for (class, corpus) in classes() {
            for input in corpus {
                let once = canonicalize(input, class);
                assert_eq!(canonicalize(&once, class), once, "{} input {:?}", class, input);
            }
        }
    }

    #[test]
    fn test_canonical_form_is_minified() {
        for (class, corpus) in classes() {
            for input in corpus {
                assert!(is_minified(&canonicalize(input, class), class), "{} input {:?}", class, input);
            }
        }
    }

    #[test]
    fn test_single_extra_space_is_not_minified() {
        assert!(is_minified("a{color:red}", MinificationClass::Css));
        assert!(!is_minified("a{color:red} ", MinificationClass::Css));
        assert!(!is_minified("a{color: red}", MinificationClass::Css));
    }

    #[test]
    fn test_space_after_regex_before_punctuation_is_not_minified() {
        assert!(!is_minified("var re=/a b/g ;", MinificationClass::Script));
        assert!(is_minified("var re=/a b/g;", MinificationClass::Script));
    }

    #[test]
    fn test_verifier_embeds_content_in_diagnostic() {
        let verdict = MinificationVerifier::new().verify(
            "a { color: red; }",
            MinificationClass::Css,
            "https://x.com/site.css",
        );
        let message = verdict.unwrap_err().to_string();
        assert!(message.contains("https://x.com/site.css"));
        assert!(message.contains("a { color: red; }"));
    }

    #[test_case("html", MinificationClass::Html)]
    #[test_case("CSS", MinificationClass::Css)]
    #[test_case("js", MinificationClass::Script)]
    #[test_case("javascript", MinificationClass::Script)]
    fn test_class_names(name: &str, expected: MinificationClass) {
        assert_eq!(name.parse::<MinificationClass>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_class_is_precondition() {
        assert!("xml".parse::<MinificationClass>().unwrap_err().is_precondition());
    }

    #[test]
    fn test_quoted_end() {
        let chars: Vec<char> = r#""a\"b" rest"#.chars().collect();
        assert_eq!(quoted_end(&chars, 0), Some(6));
        let open: Vec<char> = "'abc\n'".chars().collect();
        assert_eq!(quoted_end(&open, 0), None);
    }
}
