use time::{Duration, OffsetDateTime};

pub const DEFAULT_EXPIRATION: Duration = Duration::hours(24);
pub const MIN_EXPIRATION: Duration = Duration::minutes(1);
pub const MAX_EXPIRATION: Duration = Duration::days(7);

/// An absolute instant after which a document or attachment is expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpirationTime(OffsetDateTime);

impl ExpirationTime {
    /// `now + duration`, with `duration` clamped into `[MIN_EXPIRATION, MAX_EXPIRATION]`.
    #[must_use]
    pub fn new(duration: Duration, now: OffsetDateTime) -> Self {
        Self(now + duration.clamp(MIN_EXPIRATION, MAX_EXPIRATION))
    }

    #[must_use]
    pub fn default_from(now: OffsetDateTime) -> Self {
        Self::new(DEFAULT_EXPIRATION, now)
    }

    /// Restores a previously stored instant without clamping.
    #[must_use]
    pub const fn from_instant(instant: OffsetDateTime) -> Self {
        Self(instant)
    }

    #[must_use]
    pub const fn instant(&self) -> OffsetDateTime {
        self.0
    }

    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.0
    }

    #[must_use]
    pub fn remaining(&self, now: OffsetDateTime) -> Duration {
        (self.0 - now).max(Duration::ZERO)
    }

    /// Pushes the instant forward by `duration`, never past `now + MAX_EXPIRATION`.
    #[must_use]
    pub fn extend_by(&self, duration: Duration, now: OffsetDateTime) -> Self {
        let cap = now + MAX_EXPIRATION;
        Self(self.0.checked_add(duration).map_or(cap, |extended| extended.min(cap)))
    }

    #[must_use]
    pub fn human_readable(&self, now: OffsetDateTime) -> String {
        let remaining = self.remaining(now);
        if remaining.is_zero() {
            return "Expired".to_string();
        }

        let hours = remaining.whole_hours();
        if hours >= 24 {
            let days = hours / 24;
            return if days == 1 { "Expires in 1 day".to_string() } else { format!("Expires in {days} days") };
        }
        if hours > 0 {
            return if hours == 1 { "Expires in 1 hour".to_string() } else { format!("Expires in {hours} hours") };
        }

        let minutes = remaining.whole_minutes();
        if minutes == 1 { "Expires in 1 minute".to_string() } else { format!("Expires in {minutes} minutes") }
    }
}

impl std::fmt::Display for ExpirationTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::days(20_000)
    }

    #[test]
    fn test_new_clamps_duration() {
        let now = now();
        assert_eq!(ExpirationTime::new(Duration::hours(24), now).remaining(now), Duration::hours(24));
        assert_eq!(ExpirationTime::new(Duration::seconds(30), now).remaining(now), MIN_EXPIRATION);
        assert_eq!(ExpirationTime::new(Duration::days(10), now).remaining(now), MAX_EXPIRATION);
        assert_eq!(ExpirationTime::default_from(now).remaining(now), DEFAULT_EXPIRATION);
    }

    #[test]
    fn test_is_expired_is_strict() {
        let now = now();
        let exp = ExpirationTime::from_instant(now);
        assert!(!exp.is_expired_at(now));
        assert!(exp.is_expired_at(now + Duration::nanoseconds(1)));
        assert!(ExpirationTime::from_instant(now - Duration::hours(1)).is_expired_at(now));
        assert!(!ExpirationTime::from_instant(now + Duration::hours(1)).is_expired_at(now));
    }

    #[test]
    fn test_remaining_floors_at_zero() {
        let now = now();
        assert_eq!(ExpirationTime::from_instant(now - Duration::hours(1)).remaining(now), Duration::ZERO);
        assert_eq!(ExpirationTime::from_instant(now + Duration::hours(2)).remaining(now), Duration::hours(2));
    }

    #[test]
    fn test_extend_by_reclamps_to_max() {
        let now = now();
        let exp = ExpirationTime::from_instant(now + Duration::hours(1));
        assert_eq!(exp.extend_by(Duration::hours(2), now).remaining(now), Duration::hours(3));

        let near_max = ExpirationTime::new(Duration::days(6), now);
        assert_eq!(near_max.extend_by(Duration::days(3), now).remaining(now), MAX_EXPIRATION);
        assert_eq!(exp.extend_by(Duration::MAX, now).remaining(now), MAX_EXPIRATION);
    }

    #[test]
    fn test_human_readable() {
        let now = now();
        let at = |d: Duration| ExpirationTime::from_instant(now + d).human_readable(now);

        assert_eq!(at(-Duration::minutes(5)), "Expired");
        assert_eq!(at(Duration::days(3) + Duration::minutes(1)), "Expires in 3 days");
        assert_eq!(at(Duration::hours(25)), "Expires in 1 day");
        assert_eq!(at(Duration::minutes(90)), "Expires in 1 hour");
        assert_eq!(at(Duration::hours(5) + Duration::seconds(1)), "Expires in 5 hours");
        assert_eq!(at(Duration::seconds(90)), "Expires in 1 minute");
        assert_eq!(at(Duration::minutes(42)), "Expires in 42 minutes");
    }
}
