//! Judgment outcomes: assertion failures, wrapped transport failures and
//! precondition errors

use thiserror::Error;
use tracing::debug;

/// Outcome of a judgment
pub type Verdict = Result<(), CheckError>;

/// Why a judgment did not hold
#[derive(Error, Debug)]
pub enum CheckError {
    /// The judgment was evaluated and the expected property did not hold
    #[error("{0}")]
    Assertion(String),

    /// A fetch or parse failed while evaluating the judgment.
    ///
    /// Counts as an assertion failure; the cause stays reachable through
    /// [`std::error::Error::source`].
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: seoprobe_common::Error,
    },

    /// The judgment was invoked out of order or with an unusable argument
    #[error("precondition violated: {0}")]
    Precondition(String),
}

impl CheckError {
    pub fn assertion(message: impl Into<String>) -> Self {
        CheckError::Assertion(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        CheckError::Precondition(message.into())
    }

    pub fn transport(message: impl Into<String>, source: seoprobe_common::Error) -> Self {
        CheckError::Transport {
            message: message.into(),
            source,
        }
    }

    /// Assertion-shaped: the judgment ran and the property did not hold
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckError::Assertion(_) | CheckError::Transport { .. })
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, CheckError::Precondition(_))
    }
}

/// Fail with `message` unless `condition` holds
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> Verdict {
    if condition {
        Ok(())
    } else {
        Err(CheckError::Assertion(message()))
    }
}

/// Invert a judgment.
///
/// Success becomes an assertion failure carrying `message`; an assertion
/// failure becomes success. Precondition errors pass through unchanged, so an
/// inverted judgment never hides a usage mistake.
pub fn inverse(verdict: Verdict, message: impl Into<String>) -> Verdict {
    match verdict {
        Ok(()) => Err(CheckError::Assertion(message.into())),
        Err(e) if e.is_failure() => {
            debug!("inverted failure: {}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_inverse_of_success_fails_with_given_message() {
        let err = inverse(Ok(()), "The page is indexable.").unwrap_err();
        assert!(err.is_failure());
        assert_eq!(err.to_string(), "The page is indexable.");
    }

    #[test]
    fn test_inverse_of_assertion_is_success() {
        assert!(inverse(Err(CheckError::assertion("nope")), "unused").is_ok());
    }

    #[test]
    fn test_inverse_of_transport_failure_is_success() {
        let err = CheckError::transport(
            "Sitemap url https://x.com/sitemap.xml is not valid",
            seoprobe_common::Error::transport("https://x.com/sitemap.xml", "refused"),
        );
        assert!(err.source().is_some());
        assert!(inverse(Err(err), "unused").is_ok());
    }

    #[test]
    fn test_inverse_propagates_precondition() {
        let err = inverse(Err(CheckError::precondition("load a sitemap first")), "unused").unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains("load a sitemap first"));
    }

    #[test]
    fn test_ensure() {
        assert!(ensure(true, || unreachable!()).is_ok());
        let err = ensure(false, || "broken".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "broken");
    }
}
