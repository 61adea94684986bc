/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use reqwest::StatusCode;
use std::error::Error;
use std::time::Duration;

/// Bounded exponential backoff for transient transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub wait_min: Duration,
    pub wait_max: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            wait_min: Duration::from_secs(1),
            wait_max: Duration::from_secs(30),
            max_retries: 10,
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `attempt + 1`, doubling from `wait_min` up to `wait_max`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.wait_min.saturating_mul(factor).min(self.wait_max)
    }

    pub fn retry_status(status: StatusCode) -> bool {
        status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED
    }

    pub fn retry_error(err: &reqwest::Error) -> bool {
        if err.is_redirect() || err.is_builder() {
            return false;
        }

        !is_tls_trust_failure(err)
    }
}

/// Walks the source chain looking for a certificate verification failure.
/// Retrying those never helps, the peer will present the same certificate.
pub fn is_tls_trust_failure(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);

    while let Some(e) = current {
        let message = e.to_string().to_lowercase();

        if message.contains("unknownissuer")
            || message.contains("unknown issuer")
            || message.contains("invalid peer certificate")
            || message.contains("certificate verify failed")
            || message.contains("self signed certificate")
            || message.contains("self-signed certificate")
        {
            return true;
        }

        current = e.source();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapped {
        message: &'static str,
        inner: Option<Box<Wrapped>>,
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    impl Error for Wrapped {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            self.inner.as_deref().map(|e| e as &(dyn Error + 'static))
        }
    }

    #[test]
    fn test_backoff_doubles_until_cap() {
        let policy = RetryPolicy::default();
        let waits: Vec<u64> = (0..8).map(|a| policy.backoff(a).as_secs()).collect();
        assert_eq!(waits, vec![1, 2, 4, 8, 16, 30, 30, 30]);
        assert_eq!(policy.backoff(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_retry_status() {
        assert!(RetryPolicy::retry_status(StatusCode::BAD_GATEWAY));
        assert!(RetryPolicy::retry_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(RetryPolicy::retry_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!RetryPolicy::retry_status(StatusCode::NOT_IMPLEMENTED));
        assert!(!RetryPolicy::retry_status(StatusCode::NOT_FOUND));
        assert!(!RetryPolicy::retry_status(StatusCode::OK));
    }

    #[test]
    fn test_tls_trust_failure_in_source_chain() {
        let err = Wrapped {
            message: "error sending request",
            inner: Some(Box::new(Wrapped {
                message: "client error (Connect)",
                inner: Some(Box::new(Wrapped {
                    message: "invalid peer certificate: UnknownIssuer",
                    inner: None,
                })),
            })),
        };
        assert!(is_tls_trust_failure(&err));

        let err = Wrapped {
            message: "error sending request",
            inner: Some(Box::new(Wrapped {
                message: "connection refused",
                inner: None,
            })),
        };
        assert!(!is_tls_trust_failure(&err));
    }
}
