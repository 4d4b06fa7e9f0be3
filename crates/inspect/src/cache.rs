//! Cache Policy Verifier

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use seoprobe_common::{BrowserSession, Headers};
use tracing::debug;

use crate::error::{CheckError, Verdict};
use crate::resource::ResourceReference;

/// Why a response is not eligible for long-lived browser caching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheViolation {
    MissingHeader,
    NoCache,
    ZeroMaxAge,
}

impl CacheViolation {
    /// Inspect the `Cache-Control` header(s) of a response
    pub fn of(headers: &Headers) -> Option<Self> {
        let Some(value) = headers.joined("cache-control") else {
            return Some(CacheViolation::MissingHeader);
        };

        for directive in value.split(',') {
            let (name, argument) = match directive.split_once('=') {
                Some((name, argument)) => (name, Some(argument.trim().trim_matches('"'))),
                None => (directive, None),
            };
            let name = name.trim().to_ascii_lowercase();

            if name == "no-cache" {
                return Some(CacheViolation::NoCache);
            }
            if name == "max-age" && argument.and_then(|a| a.parse::<u64>().ok()) == Some(0) {
                return Some(CacheViolation::ZeroMaxAge);
            }
        }
        None
    }

    /// Diagnostic naming `subject`, e.g. `png resources` or a URL
    pub fn describe(&self, subject: &str) -> String {
        format!("Browser cache is not enabled for {}. {}", subject, self)
    }
}

impl fmt::Display for CacheViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheViolation::MissingHeader => f.write_str("Cache-Control HTTP header was not received."),
            CacheViolation::NoCache => f.write_str("Cache-Control HTTP header is \"no-cache\"."),
            CacheViolation::ZeroMaxAge => f.write_str("Cache-Control HTTP header is \"max-age=0\"."),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CachePolicyVerifier;

impl CachePolicyVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Probe `url` and report its caching policy.
    ///
    /// The session's current page is left as it was.
    pub fn inspect(&self, session: &mut BrowserSession, url: &str) -> Result<Option<CacheViolation>, CheckError> {
        let probe = session
            .probe(url)
            .map_err(|e| CheckError::transport(format!("Could not fetch {} to read its caching policy", url), e))?;
        let violation = CacheViolation::of(&probe.headers);
        debug!("cache policy of {}: {:?}", probe.url, violation);
        Ok(violation)
    }

    pub fn is_cacheable(&self, session: &mut BrowserSession, url: &str) -> Verdict {
        match self.inspect(session, url)? {
            Some(violation) => Err(CheckError::assertion(violation.describe(url))),
            None => Ok(()),
        }
    }

    /// One element of `candidates`, chosen uniformly at random
    pub fn sample<'a, R: Rng + ?Sized>(
        &self,
        candidates: &'a [ResourceReference],
        rng: &mut R,
    ) -> Option<&'a ResourceReference> {
        candidates.choose(rng)
    }
}
