use super::{is_space, skip_spaces};

/// Drop every whitespace run that touches a tag boundary (follows `>` or
/// precedes `<`). Whitespace between two text characters is kept.
pub(super) fn canonicalize(html: &str) -> String {
    let chars: Vec<char> = html.chars().collect();
    let mut out = String::with_capacity(html.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !is_space(c) {
            out.push(c);
            i += 1;
            continue;
        }

        let end = skip_spaces(&chars, i);
        let after_tag = i > 0 && chars[i - 1] == '>';
        let before_tag = chars.get(end) == Some(&'<');
        if !after_tag && !before_tag {
            out.extend(&chars[i..end]);
        }
        i = end;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("<div>\n  <p>Hi</p>\n</div>", "<div><p>Hi</p></div>")]
    #[test_case("<p>two  words</p>", "<p>two  words</p>")]
    #[test_case("<b>bold</b> text", "<b>bold</b>text")]
    #[test_case("text <i>x</i>", "text<i>x</i>")]
    #[test_case("  leading and trailing  ", "  leading and trailing  ")]
    #[test_case("\r\n<br/>\t", "<br/>")]
    fn test_canonicalize(input: &str, expected: &str) {
        assert_eq!(canonicalize(input), expected);
    }
}
