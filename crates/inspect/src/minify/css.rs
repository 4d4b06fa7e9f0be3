use super::{comment_end, is_space, quoted_end, skip_spaces, starts_with};

/// Whitespace after these characters is insignificant
const OPENERS: &[char] = &['{', '}', ';', ',', '>', '~', '+', '[', '(', ':', '='];

/// Whitespace before these characters is insignificant
const CLOSERS: &[char] = &['{', '}', ';', ',', '>', '~', '+', '=', ']', ')'];

const ATTRIBUTE_OPERATORS: [&str; 5] = ["*=", "$=", "~=", "^=", "|="];

pub(super) fn canonicalize(css: &str) -> String {
    compact(&strip_comments(css))
}

/// Remove comments other than `/*! ... */`, leaving string literals intact
fn strip_comments(css: &str) -> String {
    let chars: Vec<char> = css.chars().collect();
    let mut out = String::with_capacity(css.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '"' || c == '\'' {
            if let Some(end) = quoted_end(&chars, i) {
                out.extend(&chars[i..end]);
                i = end;
                continue;
            }
        } else if starts_with(&chars, i, "/*") {
            if let Some(end) = comment_end(&chars, i) {
                if chars.get(i + 2) == Some(&'!') {
                    out.extend(&chars[i..end]);
                } else if out.ends_with('/') && chars.get(end) == Some(&'*') {
                    // removing the comment must not open a new one
                    out.push(' ');
                }
                i = end;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }

    out.trim_matches(is_space).to_string()
}

fn compact(css: &str) -> String {
    let chars: Vec<char> = css.chars().collect();
    let mut out = String::with_capacity(css.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        let literal_end = match c {
            '"' | '\'' => quoted_end(&chars, i),
            '/' if chars.get(i + 1) == Some(&'*') => comment_end(&chars, i),
            _ => None,
        };
        if let Some(end) = literal_end {
            out.extend(&chars[i..end]);
            i = end;
            continue;
        }

        if is_space(c) {
            let end = skip_spaces(&chars, i);
            if keeps_space(&out, &chars, end) {
                out.push(c);
            }
            i = end;
            continue;
        }

        if c == ';' {
            // `;` runs closing a block are dropped entirely
            let mut end = i;
            while end < chars.len() && (chars[end] == ';' || is_space(chars[end])) {
                end += 1;
            }
            if chars.get(end) == Some(&'}') {
                i = end;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    out.trim_matches(is_space).to_string()
}

/// Whether the whitespace run ending before `next` is significant
fn keeps_space(out: &str, chars: &[char], next: usize) -> bool {
    let (Some(prev), Some(&following)) = (out.chars().last(), chars.get(next)) else {
        return false;
    };

    if prev == '/' && following == '*' {
        return true;
    }
    if OPENERS.contains(&prev) || CLOSERS.contains(&following) {
        return false;
    }
    if starts_with(chars, next, "!important")
        || ATTRIBUTE_OPERATORS.iter().any(|op| starts_with(chars, next, op))
    {
        return false;
    }
    if following == ':' {
        return opens_block(chars, next);
    }
    true
}

/// A colon belongs to a selector when an unmatched `{` comes before the end
/// of the current declaration
fn opens_block(chars: &[char], colon: usize) -> bool {
    let mut i = colon + 1;
    while i < chars.len() {
        match chars[i] {
            '"' | '\'' => {
                i = quoted_end(chars, i).unwrap_or(i + 1);
                continue;
            }
            '{' => return true,
            '}' | ';' => return false,
            _ => {}
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("a { color: red; }", "a{color:red}"; "declaration block")]
    #[test_case("body , p > a ~ b + c { margin : 0 auto }", "body,p>a~b+c{margin:0 auto}"; "combinators")]
    #[test_case("a :hover { x: y }", "a :hover{x:y}"; "pseudo class keeps descendant space")]
    #[test_case("a  b\n{x:y}", "a b{x:y}"; "descendant space collapses")]
    #[test_case("p { a: b ;  ; }", "p{a:b}"; "semicolon run before brace")]
    #[test_case("a[ href *= \"x\" ] {}", "a[href*=\"x\"]{}"; "attribute operator")]
    #[test_case("a { color: red !important; }", "a{color:red!important}"; "important")]
    #[test_case("@media screen and ( max-width: 9px ) {}", "@media screen and (max-width:9px){}"; "media query")]
    fn test_canonicalize(input: &str, expected: &str) {
        assert_eq!(canonicalize(input), expected);
    }

    #[test]
    fn test_strings_are_preserved() {
        assert_eq!(
            canonicalize("a::after { content: \"x  ;  }\" ; }"),
            "a::after{content:\"x  ;  }\"}"
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(canonicalize("/* gone */ a { }"), "a{}");
        assert_eq!(canonicalize("/*! kept */\na{}"), "/*! kept */\na{}");
        assert_eq!(canonicalize("a{} /* unterminated"), "a{}/* unterminated");
    }

    #[test]
    fn test_removed_comment_does_not_open_another() {
        let once = canonicalize("a / /* x */ * b");
        assert_eq!(once, "a / * b");
        assert_eq!(canonicalize(&once), once);
    }
}
