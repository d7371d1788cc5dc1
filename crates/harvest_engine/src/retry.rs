use std::time::Duration;

use harvest_core::{AcceptedRecord, AppId, ItemOutcome, RecordFilter, Rejection};

use crate::{DetailPayload, FailureKind, FetchError};

/// Fixed-tier backoff for detail fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_base: Duration,
    /// Added once per previous attempt on top of `rate_limit_base`.
    pub rate_limit_step: Duration,
    pub server_fault_delay: Duration,
    pub network_delay: Duration,
    /// Paid after every attempt, whatever its result, before the slot is released.
    pub politeness_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_base: Duration::from_secs(15),
            rate_limit_step: Duration::from_secs(5),
            server_fault_delay: Duration::from_secs(2),
            network_delay: Duration::from_secs(1),
            politeness_delay: Duration::from_millis(1200),
        }
    }
}

/// Result of a single fetch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(AcceptedRecord),
    FilteredOut(Rejection),
    RetryAfter(Duration),
    /// Terminal without output and without retry.
    Fatal(ItemOutcome),
    /// Retryable failure on the last allowed attempt. The backoff is still
    /// served before the slot is released.
    Drop(Duration),
}

impl RetryPolicy {
    /// Backoff before retrying after `kind` on zero-based `attempt`;
    /// `None` when the failure is not retryable.
    pub fn backoff(&self, kind: &FailureKind, attempt: u32) -> Option<Duration> {
        match kind {
            FailureKind::RateLimited => Some(self.rate_limit_base + self.rate_limit_step * attempt),
            FailureKind::ServerFault(_) => Some(self.server_fault_delay),
            FailureKind::Network | FailureKind::Timeout => Some(self.network_delay),
            FailureKind::InvalidUrl
            | FailureKind::AuthRejected(_)
            | FailureKind::HttpStatus(_)
            | FailureKind::MalformedResponse => None,
        }
    }

    pub fn classify(
        &self,
        attempt: u32,
        app_id: AppId,
        result: Result<DetailPayload, FetchError>,
        filter: &RecordFilter,
    ) -> AttemptOutcome {
        match result {
            Ok(DetailPayload::Available(details)) => match filter.apply(app_id, &details) {
                Ok(record) => AttemptOutcome::Success(record),
                Err(rejection) => AttemptOutcome::FilteredOut(rejection),
            },
            Ok(DetailPayload::Unavailable) => AttemptOutcome::Fatal(ItemOutcome::Unavailable),
            Err(err) => match self.backoff(&err.kind, attempt) {
                Some(delay) if attempt + 1 >= self.max_attempts => AttemptOutcome::Drop(delay),
                Some(delay) => AttemptOutcome::RetryAfter(delay),
                None => AttemptOutcome::Fatal(match err.kind {
                    FailureKind::AuthRejected(code) | FailureKind::HttpStatus(code) => {
                        ItemOutcome::RejectedStatus(code)
                    }
                    _ => ItemOutcome::Unavailable,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::{AppDetails, FilterCriteria};

    fn err(kind: FailureKind) -> Result<DetailPayload, FetchError> {
        Err(FetchError::new(kind, "test"))
    }

    #[test]
    fn rate_limit_backoff_escalates_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff(&FailureKind::RateLimited, 0),
            Some(Duration::from_secs(15))
        );
        assert_eq!(
            policy.backoff(&FailureKind::RateLimited, 1),
            Some(Duration::from_secs(20))
        );
        assert_eq!(
            policy.backoff(&FailureKind::ServerFault(502), 1),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            policy.backoff(&FailureKind::Timeout, 0),
            Some(Duration::from_secs(1))
        );
        assert_eq!(policy.backoff(&FailureKind::HttpStatus(404), 0), None);
    }

    #[test]
    fn retryable_failure_on_last_attempt_drops_after_its_backoff() {
        let policy = RetryPolicy::default();
        let filter = RecordFilter::new(FilterCriteria::default());
        assert_eq!(
            policy.classify(1, 1, err(FailureKind::RateLimited), &filter),
            AttemptOutcome::RetryAfter(Duration::from_secs(20))
        );
        assert_eq!(
            policy.classify(2, 1, err(FailureKind::RateLimited), &filter),
            AttemptOutcome::Drop(Duration::from_secs(25))
        );
        assert_eq!(
            policy.classify(2, 1, err(FailureKind::ServerFault(503)), &filter),
            AttemptOutcome::Drop(Duration::from_secs(2))
        );
    }

    #[test]
    fn unlisted_statuses_and_bad_payloads_are_terminal() {
        let policy = RetryPolicy::default();
        let filter = RecordFilter::new(FilterCriteria::default());
        assert_eq!(
            policy.classify(0, 1, err(FailureKind::HttpStatus(404)), &filter),
            AttemptOutcome::Fatal(ItemOutcome::RejectedStatus(404))
        );
        assert_eq!(
            policy.classify(0, 1, err(FailureKind::MalformedResponse), &filter),
            AttemptOutcome::Fatal(ItemOutcome::Unavailable)
        );
        assert_eq!(
            policy.classify(0, 1, Ok(DetailPayload::Unavailable), &filter),
            AttemptOutcome::Fatal(ItemOutcome::Unavailable)
        );
    }

    #[test]
    fn available_payload_goes_through_the_filter() {
        let policy = RetryPolicy::default();
        let filter = RecordFilter::new(FilterCriteria::default());
        let details = AppDetails {
            kind: Some("music".to_string()),
            ..AppDetails::default()
        };
        assert_eq!(
            policy.classify(0, 1, Ok(DetailPayload::Available(details)), &filter),
            AttemptOutcome::FilteredOut(Rejection::WrongType {
                found: Some("music".to_string())
            })
        );
    }
}
