use crate::domain::document::Document;
use crate::error::{AppError, Result};
use time::{Duration, OffsetDateTime};

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::hours(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Not yet expired; fully mutable.
    Active,
    /// Past `expires_at` but inside the grace period; readable, not mutable.
    Expired,
    /// Past `expires_at + grace_period`; eligible for physical deletion.
    Reclaimable,
}

/// Pure expiration rules over a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    grace_period: Duration,
}

impl ExpirationPolicy {
    #[must_use]
    pub const fn new(grace_period: Duration) -> Self {
        Self { grace_period }
    }

    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        self.grace_period
    }

    #[must_use]
    pub fn is_expired(&self, document: &Document, now: OffsetDateTime) -> bool {
        document.is_expired_at(now)
    }

    /// A grace deadline past the representable range never becomes reclaimable.
    #[must_use]
    pub fn should_cleanup(&self, document: &Document, now: OffsetDateTime) -> bool {
        document
            .expires_at()
            .instant()
            .checked_add(self.grace_period)
            .is_some_and(|deadline| now > deadline)
    }

    /// # Errors
    /// Returns `AppError::Expired` if the document can no longer be mutated.
    pub fn validate_access(&self, document: &Document, now: OffsetDateTime) -> Result<()> {
        if self.is_expired(document, now) {
            return Err(AppError::Expired);
        }
        Ok(())
    }

    #[must_use]
    pub fn lifecycle(&self, document: &Document, now: OffsetDateTime) -> Lifecycle {
        if self.should_cleanup(document, now) {
            Lifecycle::Reclaimable
        } else if self.is_expired(document, now) {
            Lifecycle::Expired
        } else {
            Lifecycle::Active
        }
    }
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}
