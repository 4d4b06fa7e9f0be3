//! Robots Permission Evaluator
//!
//! Parses robots.txt (RFC 9309) and evaluates paths for a crawler identity:
//! the longest matching rule wins, `Allow` wins ties, and groups naming the
//! crawler take precedence over the `*` group.

use std::fmt;

use regex::Regex;
use seoprobe_common::{BrowserSession, DEFAULT_CRAWLER};
use tracing::{debug, warn};
use url::Url;

/// Simulated crawler user agent used to evaluate robots rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerIdentity {
    user_agent: String,
}

impl CrawlerIdentity {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Product token matched against `User-agent` lines, e.g. `googlebot`
    /// for `Googlebot/2.1`
    pub fn product_token(&self) -> String {
        self.user_agent
            .split(|c: char| c == '/' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    fn matches(&self, agent: &str) -> bool {
        let token = self.product_token();
        !token.is_empty() && agent.trim().eq_ignore_ascii_case(&token)
    }
}

impl Default for CrawlerIdentity {
    fn default() -> Self {
        Self::new(DEFAULT_CRAWLER)
    }
}

impl fmt::Display for CrawlerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_agent)
    }
}

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    pattern: String,
    matcher: Regex,
}

impl Rule {
    fn new(allow: bool, pattern: &str) -> Option<Self> {
        let mut source = String::from("^");
        let (body, anchored) = match pattern.strip_suffix('$') {
            Some(body) => (body, true),
            None => (pattern, false),
        };
        for (i, part) in body.split('*').enumerate() {
            if i > 0 {
                source.push_str(".*");
            }
            source.push_str(&regex::escape(part));
        }
        if anchored {
            source.push('$');
        }

        match Regex::new(&source) {
            Ok(matcher) => Some(Self {
                allow,
                pattern: pattern.to_string(),
                matcher,
            }),
            Err(e) => {
                warn!("ignoring robots rule {:?}: {}", pattern, e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

/// A parsed robots exclusion document
#[derive(Debug, Clone, Default)]
pub struct RobotsTxt {
    groups: Vec<Group>,
    sitemaps: Vec<String>,
}

impl RobotsTxt {
    /// No restrictions, as for a missing robots.txt
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Everything disallowed, as for an unreachable robots.txt
    pub fn disallow_all() -> Self {
        Self {
            groups: vec![Group {
                agents: vec!["*".to_string()],
                rules: Rule::new(false, "/").into_iter().collect(),
            }],
            sitemaps: Vec::new(),
        }
    }

    pub fn parse(text: &str) -> Self {
        let mut robots = Self::default();
        let mut current: Option<Group> = None;
        let mut collecting_agents = false;

        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "user-agent" => {
                    if !collecting_agents {
                        robots.groups.extend(current.take());
                    }
                    current
                        .get_or_insert_with(Group::default)
                        .agents
                        .push(value.to_string());
                    collecting_agents = true;
                }
                key @ ("allow" | "disallow") => {
                    collecting_agents = false;
                    let Some(group) = current.as_mut() else {
                        debug!("robots rule outside of a group: {}", line);
                        continue;
                    };
                    if value.is_empty() {
                        continue;
                    }
                    group.rules.extend(Rule::new(key == "allow", value));
                }
                "sitemap" => {
                    if !value.is_empty() && !robots.sitemaps.iter().any(|s| s == value) {
                        robots.sitemaps.push(value.to_string());
                    }
                }
                _ => {}
            }
        }
        robots.groups.extend(current);
        robots
    }

    /// Sitemap locations declared in the document, in declaration order
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Whether `crawler` may fetch `path` (a path, or an absolute URL)
    pub fn is_allowed(&self, crawler: &CrawlerIdentity, path: &str) -> bool {
        let path = request_path(path);
        if path == "/robots.txt" {
            return true;
        }

        let mut rules: Vec<&Rule> = self
            .groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| crawler.matches(a)))
            .flat_map(|g| g.rules.iter())
            .collect();
        if rules.is_empty() && !self.names(crawler) {
            rules = self
                .groups
                .iter()
                .filter(|g| g.agents.iter().any(|a| a == "*"))
                .flat_map(|g| g.rules.iter())
                .collect();
        }

        let verdict = rules
            .into_iter()
            .filter(|rule| rule.matcher.is_match(&path))
            .max_by_key(|rule| (rule.pattern.len(), rule.allow));

        match verdict {
            Some(rule) => {
                debug!(
                    "{} {} by {:?} for {}",
                    path,
                    if rule.allow { "allowed" } else { "disallowed" },
                    rule.pattern,
                    crawler
                );
                rule.allow
            }
            None => true,
        }
    }

    fn names(&self, crawler: &CrawlerIdentity) -> bool {
        self.groups
            .iter()
            .any(|g| g.agents.iter().any(|a| crawler.matches(a)))
    }
}

/// Path and query of `target`, which may be an absolute URL
fn request_path(target: &str) -> String {
    let target = target.trim();
    match Url::parse(target) {
        Ok(url) if url.has_host() => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        _ if target.starts_with('/') => target.to_string(),
        _ => format!("/{}", target),
    }
}

/// Retrieves and evaluates the robots.txt of the site under test
#[derive(Debug, Clone, Default)]
pub struct RobotsEvaluator;

impl RobotsEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn robots_url(&self, session: &BrowserSession) -> String {
        format!("{}/robots.txt", session.base_origin())
    }

    /// Fetch robots.txt: 2xx is parsed, 4xx allows everything, 5xx and
    /// transport failures disallow everything.
    pub fn load(&self, session: &mut BrowserSession) -> RobotsTxt {
        let url = self.robots_url(session);
        match session.probe(&url) {
            Ok(doc) if (200..300).contains(&doc.status) => RobotsTxt::parse(&doc.body),
            Ok(doc) if (400..500).contains(&doc.status) => {
                debug!("{} answered {}, no restrictions apply", url, doc.status);
                RobotsTxt::allow_all()
            }
            Ok(doc) => {
                warn!("{} answered {}, treating the site as disallowed", url, doc.status);
                RobotsTxt::disallow_all()
            }
            Err(e) => {
                warn!("{} unreachable ({}), treating the site as disallowed", url, e);
                RobotsTxt::disallow_all()
            }
        }
    }

    pub fn is_allowed(&self, session: &mut BrowserSession, crawler: &CrawlerIdentity, path: &str) -> bool {
        self.load(session).is_allowed(crawler, path)
    }

    pub fn list_sitemaps(&self, session: &mut BrowserSession) -> Vec<String> {
        self.load(session).sitemaps
    }
}
