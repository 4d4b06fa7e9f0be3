//! Sitemap schema profiles and the content-model rules they enforce
//!
//! The bundled XSD files are the reference for each profile. Content models
//! and facets are applied by the rules below; the `xsd:any` wildcards are read
//! from the bundled schema itself.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::xml::{XmlDocument, XmlElement, XmlError};
use super::SITEMAP_NS;
use crate::error::CheckError;

const CHANGE_FREQUENCIES: [&str; 7] = ["always", "hourly", "daily", "weekly", "monthly", "yearly", "never"];

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?\d{4,})-(\d{2})-(\d{2})(Z|[+-]\d{2}:\d{2})?$").expect("date regex must compile")
});

static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?\d{4,})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
        .expect("dateTime regex must compile")
});

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("decimal regex must compile"));

/// Schema profile a sitemap is validated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SitemapProfile {
    #[default]
    UrlSet,
    SitemapIndex,
    Multilingual,
}

impl SitemapProfile {
    pub const ALL: [SitemapProfile; 3] = [
        SitemapProfile::UrlSet,
        SitemapProfile::SitemapIndex,
        SitemapProfile::Multilingual,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SitemapProfile::UrlSet => "urlset",
            SitemapProfile::SitemapIndex => "index",
            SitemapProfile::Multilingual => "multilanguage",
        }
    }

    pub fn schema_file(&self) -> &'static str {
        match self {
            SitemapProfile::UrlSet => "sitemap.xsd",
            SitemapProfile::SitemapIndex => "siteindex.xsd",
            SitemapProfile::Multilingual => "sitemap_xhtml.xsd",
        }
    }

    /// The bundled XSD for this profile
    pub fn schema(&self) -> &'static str {
        match self {
            SitemapProfile::UrlSet => include_str!("../../schemas/sitemap.xsd"),
            SitemapProfile::SitemapIndex => include_str!("../../schemas/siteindex.xsd"),
            SitemapProfile::Multilingual => include_str!("../../schemas/sitemap_xhtml.xsd"),
        }
    }

    /// Wildcards declared by the bundled XSD
    pub fn wildcards(&self) -> Result<SchemaWildcards, XmlError> {
        let schema = XmlDocument::parse(self.schema())?;
        let target = schema.root.attribute("targetNamespace");
        Ok(SchemaWildcards {
            root: declared_wildcard(&schema.root, self.root_name(), target),
            entry: declared_wildcard(&schema.root, self.entry_name(), target),
        })
    }

    fn entry_name(&self) -> &'static str {
        match self {
            SitemapProfile::SitemapIndex => "sitemap",
            SitemapProfile::UrlSet | SitemapProfile::Multilingual => "url",
        }
    }

    fn root_name(&self) -> &'static str {
        match self {
            SitemapProfile::SitemapIndex => "sitemapindex",
            SitemapProfile::UrlSet | SitemapProfile::Multilingual => "urlset",
        }
    }
}

impl fmt::Display for SitemapProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SitemapProfile {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "urlset" | "url-set" | "default" => Ok(SitemapProfile::UrlSet),
            "index" | "sitemapindex" | "sitemap-index" => Ok(SitemapProfile::SitemapIndex),
            "multilanguage" | "multilingual" | "xhtml" => Ok(SitemapProfile::Multilingual),
            _ => Err(CheckError::precondition(format!(
                "{} is not a sitemap profile. Allowed profiles are: urlset,index,multilanguage",
                s
            ))),
        }
    }
}

/// How an `xsd:any` wildcard treats the elements it admits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessContents {
    Strict,
    Lax,
    Skip,
}

/// Namespace constraint of an `xsd:any` wildcard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WildcardNamespace {
    Any,
    /// Any namespace except the target one and no namespace
    Other(Option<String>),
    /// `None` stands for unqualified elements
    Listed(Vec<Option<String>>),
}

impl WildcardNamespace {
    pub fn admits(&self, namespace: Option<&str>) -> bool {
        match self {
            WildcardNamespace::Any => true,
            WildcardNamespace::Other(target) => namespace.is_some() && namespace != target.as_deref(),
            WildcardNamespace::Listed(allowed) => allowed.iter().any(|ns| ns.as_deref() == namespace),
        }
    }
}

impl fmt::Display for WildcardNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WildcardNamespace::Any => f.write_str("##any"),
            WildcardNamespace::Other(_) => f.write_str("##other"),
            WildcardNamespace::Listed(allowed) => {
                let names: Vec<&str> = allowed.iter().map(|ns| ns.as_deref().unwrap_or("##local")).collect();
                f.write_str(&names.join(" "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wildcard {
    pub namespace: WildcardNamespace,
    pub process_contents: ProcessContents,
}

/// `xsd:any` declarations inside the root and entry content models
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaWildcards {
    pub root: Option<Wildcard>,
    pub entry: Option<Wildcard>,
}

/// First `xsd:any` within the global element declaration `name`
fn declared_wildcard(schema: &XmlElement, name: &str, target: Option<&str>) -> Option<Wildcard> {
    let declaration = schema
        .children_named(XSD_NS, "element")
        .find(|el| el.attribute("name") == Some(name))?;
    let any = declaration.descendants().into_iter().find(|el| el.is(XSD_NS, "any"))?;

    let namespace = match any.attribute("namespace").map(str::trim).unwrap_or("##any") {
        "##any" => WildcardNamespace::Any,
        "##other" => WildcardNamespace::Other(target.map(str::to_string)),
        list => WildcardNamespace::Listed(
            list.split_whitespace()
                .map(|token| match token {
                    "##local" => None,
                    "##targetNamespace" => target.map(str::to_string),
                    uri => Some(uri.to_string()),
                })
                .collect(),
        ),
    };
    let process_contents = match any.attribute("processContents").map(str::trim) {
        Some("lax") => ProcessContents::Lax,
        Some("skip") => ProcessContents::Skip,
        _ => ProcessContents::Strict,
    };
    Some(Wildcard {
        namespace,
        process_contents,
    })
}

/// One schema rule broken by a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Slash-separated element path, e.g. `/urlset/url[2]/loc`
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Check `document` against `profile`, collecting every violation
pub fn validate(document: &XmlDocument, profile: SitemapProfile) -> Vec<Violation> {
    let mut validator = Validator {
        profile,
        wildcards: SchemaWildcards::default(),
        violations: Vec::new(),
    };
    match profile.wildcards() {
        Ok(wildcards) => {
            validator.wildcards = wildcards;
            validator.root(&document.root);
        }
        Err(e) => validator.report("/", format!("schema {} cannot be read: {}", profile.schema_file(), e)),
    }
    validator.violations
}

struct Validator {
    profile: SitemapProfile,
    wildcards: SchemaWildcards,
    violations: Vec<Violation>,
}

impl Validator {
    fn report(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(Violation {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn root(&mut self, root: &XmlElement) {
        let path = format!("/{}", root.name);
        if !root.is(SITEMAP_NS, self.profile.root_name()) {
            self.report(
                &path,
                format!(
                    "No matching global declaration available for the validation root {}",
                    root.expanded_name()
                ),
            );
            return;
        }

        self.attributes(root, &path);
        self.element_only(root, &path);

        match self.profile {
            SitemapProfile::SitemapIndex => self.repeated(root, &path, "sitemap", Self::sitemap),
            SitemapProfile::UrlSet | SitemapProfile::Multilingual => {
                self.repeated(root, &path, "url", Self::url)
            }
        }
    }

    /// One or more `name` children, each checked by `check`
    fn repeated(&mut self, parent: &XmlElement, path: &str, name: &str, check: fn(&mut Self, &XmlElement, &str)) {
        let leading = self.wildcards.root.clone();
        let mut seen = 0;
        for child in &parent.children {
            if child.is(SITEMAP_NS, name) {
                seen += 1;
                check(self, child, &format!("{}/{}[{}]", path, name, seen));
            } else if let Some(wildcard) = leading
                .as_ref()
                .filter(|w| seen == 0 && w.namespace.admits(child.namespace.as_deref()))
            {
                self.wildcard_content(wildcard, child, path);
            } else {
                self.unexpected(child, path, name);
            }
        }
        if seen == 0 {
            self.report(path, format!("Missing child element(s). Expected is ( {} ).", name));
        }
    }

    /// `loc`, `lastmod?`, `changefreq?`, `priority?`, then wildcard content
    fn url(&mut self, url: &XmlElement, path: &str) {
        self.attributes(url, path);
        self.element_only(url, path);

        let mut children = url.children.iter().peekable();
        match children.peek() {
            Some(first) if first.is(SITEMAP_NS, "loc") => {
                self.loc(first, &format!("{}/loc", path));
                children.next();
            }
            Some(first) => {
                self.unexpected(first, path, "loc");
                return;
            }
            None => {
                self.report(path, "Missing child element(s). Expected is ( loc ).");
                return;
            }
        }

        let optional: [(&str, fn(&mut Self, &XmlElement, &str)); 3] = [
            ("lastmod", Self::lastmod),
            ("changefreq", Self::changefreq),
            ("priority", Self::priority),
        ];
        for (name, check) in optional {
            if let Some(child) = children.next_if(|c| c.is(SITEMAP_NS, name)) {
                check(self, child, &format!("{}/{}", path, name));
            }
        }

        let trailing = self.wildcards.entry.clone();
        for child in children {
            match &trailing {
                Some(wildcard) if wildcard.namespace.admits(child.namespace.as_deref()) => {
                    self.wildcard_content(wildcard, child, path)
                }
                Some(wildcard) => self.unexpected(child, path, &wildcard.namespace.to_string()),
                None => self.unexpected(child, path, "end of url"),
            }
        }
    }

    /// `loc` and optional `lastmod` in any order, each at most once
    fn sitemap(&mut self, sitemap: &XmlElement, path: &str) {
        self.attributes(sitemap, path);
        self.element_only(sitemap, path);

        let mut seen_loc = false;
        let mut seen_lastmod = false;
        for child in &sitemap.children {
            if child.is(SITEMAP_NS, "loc") && !seen_loc {
                seen_loc = true;
                self.loc(child, &format!("{}/loc", path));
            } else if child.is(SITEMAP_NS, "lastmod") && !seen_lastmod {
                seen_lastmod = true;
                self.lastmod(child, &format!("{}/lastmod", path));
            } else {
                self.unexpected(child, path, "loc, lastmod");
            }
        }
        if !seen_loc {
            self.report(path, "Missing child element(s). Expected is ( loc ).");
        }
    }

    fn loc(&mut self, loc: &XmlElement, path: &str) {
        if self.simple_content(loc, path) {
            if let Err(message) = check_loc(&loc.text) {
                self.report(path, message);
            }
        }
    }

    fn lastmod(&mut self, lastmod: &XmlElement, path: &str) {
        if self.simple_content(lastmod, path) && !is_w3c_datetime(lastmod.text.trim()) {
            self.report(
                path,
                format!("'{}' is not a valid value of the union type 'tLastmod'.", lastmod.text),
            );
        }
    }

    fn changefreq(&mut self, changefreq: &XmlElement, path: &str) {
        if self.simple_content(changefreq, path) && !CHANGE_FREQUENCIES.contains(&changefreq.text.as_str()) {
            self.report(
                path,
                format!(
                    "[facet 'enumeration'] The value '{}' is not an element of the set {{{}}}.",
                    changefreq.text,
                    CHANGE_FREQUENCIES.map(|f| format!("'{}'", f)).join(", ")
                ),
            );
        }
    }

    fn priority(&mut self, priority: &XmlElement, path: &str) {
        if !self.simple_content(priority, path) {
            return;
        }
        let value = priority.text.trim();
        if !DECIMAL.is_match(value) {
            self.report(path, format!("'{}' is not a valid value of the atomic type 'xs:decimal'.", value));
            return;
        }
        match value.parse::<f64>() {
            Ok(v) if (0.0..=1.0).contains(&v) => {}
            _ => self.report(
                path,
                format!("The value '{}' must lie between 0.0 and 1.0 inclusive.", value),
            ),
        }
    }

    /// Simple-typed elements carry no child elements or attributes
    fn simple_content(&mut self, element: &XmlElement, path: &str) -> bool {
        self.attributes(element, path);
        if !element.children.is_empty() {
            self.report(
                path,
                "Element content is not allowed, because the content type is a simple type definition.",
            );
            return false;
        }
        true
    }

    fn element_only(&mut self, element: &XmlElement, path: &str) {
        if !element.text.trim().is_empty() {
            self.report(
                path,
                "Character content other than whitespace is not allowed because the content type is 'element-only'.",
            );
        }
    }

    fn attributes(&mut self, element: &XmlElement, path: &str) {
        for attr in &element.attributes {
            if !attr.is_namespace_declaration() && attr.namespace.as_deref() != Some(XSI_NS) {
                self.report(path, format!("The attribute '{}' is not allowed.", attr.qualified_name));
            }
        }
    }

    /// No schema is bundled for foreign namespaces: strict wildcards reject
    /// what they admit, lax and skip wildcards accept it unchecked
    fn wildcard_content(&mut self, wildcard: &Wildcard, element: &XmlElement, path: &str) {
        if wildcard.process_contents == ProcessContents::Strict {
            self.strict_wildcard(element, path);
        }
    }

    fn strict_wildcard(&mut self, element: &XmlElement, path: &str) {
        self.report(
            &format!("{}/{}", path, element.name),
            format!(
                "No matching global element declaration available for {}, but demanded by the strict wildcard.",
                element.expanded_name()
            ),
        );
    }

    fn unexpected(&mut self, element: &XmlElement, path: &str, expected: &str) {
        self.report(
            &format!("{}/{}", path, element.name),
            format!(
                "This element is not expected. Expected is ( {} ).",
                expected
            ),
        );
    }
}

/// `xsd:anyURI` with the 12..=2048 length facets, after whitespace collapse
fn check_loc(raw: &str) -> Result<(), String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.contains(' ') {
        return Err(format!("'{}' is not a valid value of the atomic type 'xs:anyURI'.", collapsed));
    }
    let length = collapsed.chars().count();
    if length < 12 {
        return Err(format!(
            "[facet 'minLength'] The value '{}' has a length of '{}'; this underruns the allowed minimum length of '12'.",
            collapsed, length
        ));
    }
    if length > 2048 {
        return Err(format!(
            "[facet 'maxLength'] The value has a length of '{}'; this exceeds the allowed maximum length of '2048'.",
            length
        ));
    }
    Ok(())
}

/// `xsd:date` or `xsd:dateTime`
fn is_w3c_datetime(value: &str) -> bool {
    if let Some(caps) = DATE.captures(value) {
        return valid_date(&caps[1], &caps[2], &caps[3]) && caps.get(4).map_or(true, |z| valid_zone(z.as_str()));
    }
    if let Some(caps) = DATE_TIME.captures(value) {
        let time = match (caps[4].parse::<u32>(), caps[5].parse::<u32>(), caps[6].parse::<u32>()) {
            (Ok(24), Ok(0), Ok(0)) => caps.get(7).map_or(true, |f| f.as_str().trim_matches(|c: char| c == '.' || c == '0').is_empty()),
            (Ok(h), Ok(m), Ok(s)) => NaiveTime::from_hms_opt(h, m, s).is_some(),
            _ => false,
        };
        return time
            && valid_date(&caps[1], &caps[2], &caps[3])
            && caps.get(8).map_or(true, |z| valid_zone(z.as_str()));
    }
    false
}

fn valid_date(year: &str, month: &str, day: &str) -> bool {
    match (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>()) {
        (Ok(y), Ok(m), Ok(d)) => y != 0 && NaiveDate::from_ymd_opt(y, m, d).is_some(),
        _ => false,
    }
}

fn valid_zone(zone: &str) -> bool {
    if zone == "Z" {
        return true;
    }
    let Some((hours, minutes)) = zone[1..].split_once(':') else {
        return false;
    };
    match (hours.parse::<u32>(), minutes.parse::<u32>()) {
        (Ok(14), Ok(0)) => true,
        (Ok(h), Ok(m)) => h < 14 && m < 60,
        _ => false,
    }
}
