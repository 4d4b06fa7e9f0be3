use super::{comment_end, is_space, quoted_end, skip_spaces};

/// Whitespace next to any of these is insignificant
const PUNCTUATION: &str = "!%&*()-=+[]{}|;:,.<>?/";

/// Characters after which a `/` starts a regular expression literal
const REGEX_PRECEDERS: &str = "(,=:[!&|?{};~+-*%<>";

const REGEX_KEYWORDS: [&str; 7] = ["return", "typeof", "case", "in", "of", "void", "delete"];

pub(super) fn canonicalize(js: &str) -> String {
    compact(&strip_comments(js))
}

fn is_identifier(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_preserved_comment(comment: &[char]) -> bool {
    comment.get(2) == Some(&'!') || comment[2..].starts_with(&['@', 'c', 'c', '_', 'o', 'n'])
}

fn trim_end_spaces(out: &mut String) {
    let kept = out.trim_end_matches(is_space).len();
    out.truncate(kept);
}

/// Drop comments (except `/*!` and `/*@cc_on`) and the whitespace around
/// string literals and removed block comments
fn strip_comments(js: &str) -> String {
    let chars: Vec<char> = js.chars().collect();
    let mut out = String::with_capacity(js.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                let end = (i + 2).min(chars.len());
                out.extend(&chars[i..end]);
                i = end;
                continue;
            }
            '"' | '\'' | '`' => {
                if let Some(end) = quoted_end(&chars, i) {
                    trim_end_spaces(&mut out);
                    out.extend(&chars[i..end]);
                    i = skip_spaces(&chars, end);
                    continue;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                if let Some(end) = comment_end(&chars, i) {
                    if is_preserved_comment(&chars[i..end]) {
                        out.extend(&chars[i..end]);
                        i = end;
                        continue;
                    }
                    trim_end_spaces(&mut out);
                    let next = skip_spaces(&chars, end);
                    let joins_words = out.chars().last().is_some_and(is_identifier)
                        && chars.get(next).copied().is_some_and(is_identifier);
                    if joins_words {
                        out.push(' ');
                    }
                    i = next;
                    continue;
                }
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                let after_assignment = i > 0 && matches!(chars[i - 1], ':' | '=');
                if !after_assignment {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                    continue;
                }
            }
            _ => {}
        }
        out.push(c);
        i += 1;
    }

    out.trim_matches(is_space).to_string()
}

/// Collapse whitespace around punctuation, keeping literals, comments and
/// regular expressions verbatim
fn compact(js: &str) -> String {
    let chars: Vec<char> = js.chars().collect();
    let mut out = String::with_capacity(js.len());
    let mut after_regex = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if is_space(c) {
            let end = skip_spaces(&chars, i);
            if let (Some(prev), Some(&next)) = (out.chars().last(), chars.get(end)) {
                if after_regex {
                    if fuses(prev, next) || !PUNCTUATION.contains(next) {
                        out.push(' ');
                    }
                } else if fuses(prev, next) || !(PUNCTUATION.contains(prev) || PUNCTUATION.contains(next)) {
                    out.extend(&chars[i..end]);
                }
            }
            i = end;
            continue;
        }

        after_regex = false;
        let literal_end = match c {
            '"' | '\'' | '`' => quoted_end(&chars, i),
            '/' if chars.get(i + 1) == Some(&'*') => comment_end(&chars, i),
            '/' if regex_allowed(&out) => {
                let end = regex_end(&chars, i);
                after_regex = end.is_some();
                end
            }
            _ => None,
        };

        match literal_end {
            Some(end) => {
                out.extend(&chars[i..end]);
                i = end;
            }
            None => {
                out.push(c);
                i += 1;
            }
        }
    }

    out.trim_matches(is_space).to_string()
}

/// Joining these would change the token stream (`//`, `/*`, `++`, `--`)
fn fuses(prev: char, next: char) -> bool {
    matches!((prev, next), ('/', '/') | ('/', '*') | ('+', '+') | ('-', '-'))
}

fn regex_allowed(out: &str) -> bool {
    let code = out.trim_end_matches(is_space);
    match code.chars().last() {
        None => true,
        Some(c) if REGEX_PRECEDERS.contains(c) => true,
        Some(c) if is_identifier(c) => {
            let word = code.rsplit(|c: char| !is_identifier(c)).next().unwrap_or_default();
            REGEX_KEYWORDS.contains(&word)
        }
        _ => false,
    }
}

/// End (exclusive, flags included) of a regular expression literal at `start`.
///
/// The literal closes at the first unescaped `/` on the same line that is
/// followed by whitespace, `.`, `,`, `;`, `)`, `]`, a flag letter or the end
/// of input.
fn regex_end(chars: &[char], start: usize) -> Option<usize> {
    if matches!(chars.get(start + 1), None | Some('/') | Some('*')) {
        return None;
    }

    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '\n' | '\r' => return None,
            '/' => {
                let closes = chars
                    .get(i + 1)
                    .map_or(true, |&f| is_space(f) || ".,;)]gimsuy".contains(f));
                if closes {
                    let mut end = i + 1;
                    while chars.get(end).is_some_and(|f| f.is_ascii_alphabetic()) {
                        end += 1;
                    }
                    return Some(end);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}
