//! Resource Locator: elements of a page that reference embedded resources

use std::fmt;
use std::str::FromStr;

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::error::CheckError;
use crate::query::{Predicate, Query};

/// Raster image formats recognised by `img[src]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
        }
    }
}

/// Classification of embedded resources, each with a fixed match rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Image(ImageFormat),
    Icon,
    Stylesheet,
    InlineStylesheetInHead,
    LinkedStylesheetInHead,
    Script,
}

impl ResourceType {
    pub const ALL: [ResourceType; 8] = [
        ResourceType::Image(ImageFormat::Png),
        ResourceType::Image(ImageFormat::Jpeg),
        ResourceType::Image(ImageFormat::Gif),
        ResourceType::Icon,
        ResourceType::Stylesheet,
        ResourceType::InlineStylesheetInHead,
        ResourceType::LinkedStylesheetInHead,
        ResourceType::Script,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Image(format) => format.extension(),
            ResourceType::Icon => "ico",
            ResourceType::Stylesheet => "css",
            ResourceType::InlineStylesheetInHead => "css-inline-head",
            ResourceType::LinkedStylesheetInHead => "css-link-head",
            ResourceType::Script => "js",
        }
    }

    /// Attribute holding the resource URL, if the element references one
    pub fn locator_attribute(&self) -> Option<&'static str> {
        match self {
            ResourceType::Image(_) | ResourceType::Script => Some("src"),
            ResourceType::Icon | ResourceType::Stylesheet | ResourceType::LinkedStylesheetInHead => {
                Some("href")
            }
            ResourceType::InlineStylesheetInHead => None,
        }
    }

    /// Structural match rule for this resource type
    pub fn match_rule(&self) -> Query {
        match self {
            ResourceType::Image(format) => {
                Query::tag("img").filter(Predicate::attr_contains("src", format!(".{}", format.extension())))
            }
            ResourceType::Icon => Query::tag("link").filter(Predicate::attr_contains("href", ".ico")),
            ResourceType::Stylesheet => Query::tag("link").filter(Predicate::attr_contains("href", ".css")),
            ResourceType::InlineStylesheetInHead => Query::tag("style").within("head"),
            ResourceType::LinkedStylesheetInHead => ResourceType::Stylesheet.match_rule().within("head"),
            ResourceType::Script => Query::tag("script").filter(Predicate::attr_contains("src", ".js")),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceType {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = match wanted.as_str() {
            "jpg" => "jpeg",
            "javascript" => "js",
            other => other,
        };
        ResourceType::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| {
                let allowed: Vec<&str> = ResourceType::ALL.iter().map(|t| t.name()).collect();
                CheckError::precondition(format!(
                    "{} resource type is not valid. Allowed types are: {}",
                    s,
                    allowed.join(",")
                ))
            })
    }
}

/// Which hosts a located resource may come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostScope {
    Any,
    /// Same origin as the page under test, or any value beginning with `/`
    SelfHosted,
    /// Neither same origin nor beginning with `/`
    External,
    /// Begins with the given host or with `/`
    Host(String),
}

impl HostScope {
    /// Parse the host argument of cache judgments: `internal`, `external`
    /// or an explicit host prefix.
    pub fn parse(host: &str) -> Self {
        match host.trim() {
            "internal" => HostScope::SelfHosted,
            "external" => HostScope::External,
            "" | "any" => HostScope::Any,
            explicit => HostScope::Host(explicit.to_string()),
        }
    }

    fn predicate(&self, attribute: &str, base_origin: &str) -> Option<Predicate> {
        let local = |prefix: &str| {
            Predicate::attr_prefix(attribute, prefix).or(root_relative(attribute))
        };
        match self {
            HostScope::Any => None,
            HostScope::SelfHosted => Some(local(base_origin)),
            HostScope::Host(host) => Some(local(host)),
            HostScope::External => Some(Predicate::has_attr(attribute).and(local(base_origin).negate())),
        }
    }
}

impl fmt::Display for HostScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostScope::Any => f.write_str("any"),
            HostScope::SelfHosted => f.write_str("internal"),
            HostScope::External => f.write_str("external"),
            HostScope::Host(host) => f.write_str(host),
        }
    }
}

/// `/path`, and also the protocol-relative `//host/path`
fn root_relative(attribute: &str) -> Predicate {
    Predicate::attr_prefix(attribute, "/")
}

/// One element referencing an embedded resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    pub tag: String,
    pub locator_attribute: Option<&'static str>,
    pub url: Option<String>,
    pub is_async: bool,
    pub is_deferred: bool,
    /// Outer HTML of the element, for diagnostics
    pub html: String,
}

impl ResourceReference {
    fn from_element(element: &ElementRef<'_>, resource_type: ResourceType) -> Self {
        let value = element.value();
        let locator_attribute = resource_type.locator_attribute();
        Self {
            tag: value.name().to_string(),
            locator_attribute,
            url: locator_attribute.and_then(|attr| value.attr(attr)).map(String::from),
            is_async: value.attr("async").is_some(),
            is_deferred: value.attr("defer").is_some(),
            html: element.html(),
        }
    }

    pub fn loads_non_blocking(&self) -> bool {
        self.is_async || self.is_deferred
    }
}

/// Finds resource references in HTML documents
#[derive(Debug, Clone, Default)]
pub struct ResourceLocator;

impl ResourceLocator {
    pub fn new() -> Self {
        Self
    }

    /// Build the scoped query for `resource_type`.
    ///
    /// Types without a locator attribute (inline styles) cannot be scoped by
    /// host and match regardless of scope.
    pub fn query(&self, resource_type: ResourceType, scope: &HostScope, base_origin: &str) -> Query {
        let rule = resource_type.match_rule();
        match resource_type
            .locator_attribute()
            .and_then(|attr| scope.predicate(attr, base_origin))
        {
            Some(predicate) => rule.filter(predicate),
            None => rule,
        }
    }

    /// Elements of `html` referencing `resource_type` within `scope`
    pub fn locate(
        &self,
        html: &str,
        resource_type: ResourceType,
        scope: &HostScope,
        base_origin: &str,
    ) -> Vec<ResourceReference> {
        let document = Html::parse_document(html);
        let query = self.query(resource_type, scope, base_origin);
        let found: Vec<ResourceReference> = query
            .select(&document)
            .iter()
            .map(|el| ResourceReference::from_element(el, resource_type))
            .collect();

        debug!("{} matched {} element(s)", query, found.len());
        found
    }
}
