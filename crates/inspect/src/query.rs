//! Structural queries over parsed HTML.
//!
//! A [`Query`] names an element tag and an optional [`Predicate`] tree.
//! Narrowing a query (for example by host scope) adds a predicate node; the
//! query is never rewritten as text.

use std::fmt;

use scraper::{ElementRef, Html};

/// Test applied to one attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrTest {
    Present,
    Prefix(String),
    Contains(String),
    Suffix(String),
    EqualsIgnoreCase(String),
}

impl AttrTest {
    fn matches(&self, value: &str) -> bool {
        match self {
            AttrTest::Present => true,
            AttrTest::Prefix(p) => value.starts_with(p.as_str()),
            AttrTest::Contains(s) => value.contains(s.as_str()),
            AttrTest::Suffix(s) => value.ends_with(s.as_str()),
            AttrTest::EqualsIgnoreCase(s) => value.trim().eq_ignore_ascii_case(s),
        }
    }
}

/// Predicate tree evaluated against a candidate element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Attr { name: String, test: AttrTest },
    /// Element has an ancestor with this tag
    Within(String),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn has_attr(name: &str) -> Self {
        Self::attr(name, AttrTest::Present)
    }

    pub fn attr_prefix(name: &str, prefix: impl Into<String>) -> Self {
        Self::attr(name, AttrTest::Prefix(prefix.into()))
    }

    pub fn attr_contains(name: &str, needle: impl Into<String>) -> Self {
        Self::attr(name, AttrTest::Contains(needle.into()))
    }

    pub fn attr_suffix(name: &str, suffix: impl Into<String>) -> Self {
        Self::attr(name, AttrTest::Suffix(suffix.into()))
    }

    pub fn attr_eq_ignore_case(name: &str, value: impl Into<String>) -> Self {
        Self::attr(name, AttrTest::EqualsIgnoreCase(value.into()))
    }

    pub fn within(tag: &str) -> Self {
        Predicate::Within(tag.to_ascii_lowercase())
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Conjunction, flattening nested `All` nodes
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::All(mut left), Predicate::All(right)) => {
                left.extend(right);
                Predicate::All(left)
            }
            (Predicate::All(mut left), other) => {
                left.push(other);
                Predicate::All(left)
            }
            (this, Predicate::All(mut right)) => {
                right.insert(0, this);
                Predicate::All(right)
            }
            (this, other) => Predicate::All(vec![this, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Any(mut alternatives) => {
                alternatives.push(other);
                Predicate::Any(alternatives)
            }
            this => Predicate::Any(vec![this, other]),
        }
    }

    fn attr(name: &str, test: AttrTest) -> Self {
        Predicate::Attr {
            name: name.to_ascii_lowercase(),
            test,
        }
    }

    pub fn matches(&self, element: &ElementRef<'_>) -> bool {
        match self {
            Predicate::Attr { name, test } => element
                .value()
                .attr(name)
                .is_some_and(|value| test.matches(value)),
            Predicate::Within(tag) => element.ancestors().any(|node| {
                node.value()
                    .as_element()
                    .is_some_and(|el| el.name().eq_ignore_ascii_case(tag))
            }),
            Predicate::All(parts) => parts.iter().all(|p| p.matches(element)),
            Predicate::Any(parts) => parts.iter().any(|p| p.matches(element)),
            Predicate::Not(inner) => !inner.matches(element),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Attr { name, test } => match test {
                AttrTest::Present => write!(f, "@{}", name),
                AttrTest::Prefix(p) => write!(f, "starts-with(@{},{:?})", name, p),
                AttrTest::Contains(s) => write!(f, "contains(@{},{:?})", name, s),
                AttrTest::Suffix(s) => write!(f, "ends-with(@{},{:?})", name, s),
                AttrTest::EqualsIgnoreCase(s) => write!(f, "lower-case(@{})={:?}", name, s),
            },
            Predicate::Within(tag) => write!(f, "ancestor::{}", tag),
            Predicate::All(parts) => write_joined(f, parts, " and "),
            Predicate::Any(parts) => write_joined(f, parts, " or "),
            Predicate::Not(inner) => write!(f, "not({})", inner),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Predicate], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", part)?;
    }
    write!(f, ")")
}

/// Elements with a given tag, optionally narrowed by a predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    tag: String,
    predicate: Option<Predicate>,
}

impl Query {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            predicate: None,
        }
    }

    /// Narrow the query; successive filters are conjoined
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn within(self, ancestor: &str) -> Self {
        self.filter(Predicate::within(ancestor))
    }

    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn matches(&self, element: &ElementRef<'_>) -> bool {
        element.value().name().eq_ignore_ascii_case(&self.tag)
            && self.predicate.as_ref().map_or(true, |p| p.matches(element))
    }

    /// Matching elements in document order
    pub fn select<'a>(&self, html: &'a Html) -> Vec<ElementRef<'a>> {
        html.tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| self.matches(el))
            .collect()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "//{}", self.tag)?;
        if let Some(predicate) = &self.predicate {
            write!(f, "[{}]", predicate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <link rel="stylesheet" href="/css/site.css">
  <style>body{margin:0}</style>
</head>
<body>
  <link rel="stylesheet" href="https://cdn.other.com/late.css">
  <img src="/img/a.png" alt="A">
  <img src="https://cdn.other.com/b.png">
  <img src="/img/c.gif" alt="">
</body>
</html>"#;

    fn srcs(elements: &[ElementRef<'_>], attr: &str) -> Vec<String> {
        elements
            .iter()
            .filter_map(|el| el.value().attr(attr).map(String::from))
            .collect()
    }

    #[test]
    fn test_tag_and_contains() {
        let html = Html::parse_document(PAGE);
        let query = Query::tag("img").filter(Predicate::attr_contains("src", ".png"));
        let found = query.select(&html);
        assert_eq!(srcs(&found, "src"), vec!["/img/a.png", "https://cdn.other.com/b.png"]);
    }

    #[test]
    fn test_within_ancestor() {
        let html = Html::parse_document(PAGE);
        let query = Query::tag("link").within("head");
        assert_eq!(srcs(&query.select(&html), "href"), vec!["/css/site.css"]);
        assert_eq!(Query::tag("style").within("head").select(&html).len(), 1);
    }

    #[test]
    fn test_any_and_not() {
        let html = Html::parse_document(PAGE);
        let local = Predicate::attr_prefix("src", "https://x.com").or(Predicate::attr_prefix("src", "/"));
        let query = Query::tag("img").filter(local.clone());
        assert_eq!(query.select(&html).len(), 2);

        let external = Query::tag("img").filter(Predicate::has_attr("src").and(local.negate()));
        assert_eq!(srcs(&external.select(&html), "src"), vec!["https://cdn.other.com/b.png"]);
    }

    #[test]
    fn test_filters_conjoin() {
        let query = Query::tag("img")
            .filter(Predicate::attr_contains("src", ".png"))
            .filter(Predicate::attr_prefix("src", "/"));
        assert!(matches!(query.predicate(), Some(Predicate::All(parts)) if parts.len() == 2));
    }

    #[test]
    fn test_display_reads_like_xpath() {
        let query = Query::tag("link")
            .within("head")
            .filter(Predicate::attr_contains("href", ".css"));
        assert_eq!(
            query.to_string(),
            r#"//link[(ancestor::head and contains(@href,".css"))]"#
        );
    }
}
