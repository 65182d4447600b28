use std::{error::Error as StdError, sync::Arc};

use reqwest::redirect::{Attempt, Policy};

use crate::{Error, Logger};

/// Hop limit applied to every logical call.
pub const MAX_REDIRECTS: usize = 10;

/// Raised from inside the redirect callback; surfaced as [`Error::TooManyRedirects`].
#[derive(Debug, thiserror::Error)]
#[error("stopped after {hops} redirects")]
pub(crate) struct RedirectLimitExceeded {
    pub(crate) hops: usize,
}

/// Decides whether a redirect hop is followed.
///
/// The hop history comes from the [`Attempt`] that `reqwest` threads through
/// each request, so no counter is shared between concurrent calls.
#[derive(Clone, Debug)]
pub(crate) struct RedirectPolicy {
    max_hops: usize,
    logger: Arc<dyn Logger>,
}

impl RedirectPolicy {
    pub(crate) fn new(max_hops: usize, logger: Arc<dyn Logger>) -> Self {
        Self { max_hops, logger }
    }

    /// `previous` holds every URL already requested in this call, starting
    /// with the original one.
    pub(crate) fn check(&self, next: &str, previous: usize) -> Result<(), RedirectLimitExceeded> {
        self.logger.debugf(format_args!("Redirecting to {next}"));
        if previous >= self.max_hops {
            return Err(RedirectLimitExceeded { hops: previous });
        }
        Ok(())
    }

    pub(crate) fn into_reqwest(self) -> Policy {
        Policy::custom(move |attempt: Attempt<'_>| {
            let previous = attempt.previous().len();
            match self.check(attempt.url().as_str(), previous) {
                Ok(()) => attempt.follow(),
                Err(err) => attempt.error(err),
            }
        })
    }
}

/// Finds a redirect-limit failure inside a `reqwest` error chain.
pub(crate) fn redirect_limit_error(err: &reqwest::Error) -> Option<Error> {
    if !err.is_redirect() {
        return None;
    }
    let mut source = err.source();
    while let Some(current) = source {
        if let Some(limit) = current.downcast_ref::<RedirectLimitExceeded>() {
            return Some(Error::TooManyRedirects { hops: limit.hops });
        }
        source = current.source();
    }
    Some(Error::TooManyRedirects { hops: MAX_REDIRECTS })
}
