//! Bitemporal fields and millisecond time helpers.
//!
//! Valid time (`valid_from`/`valid_to`) says when a fact held in the world.
//! Transaction time (`created_at`/`expired_at`) says when this version was the
//! system's current belief. Closing edges are write-once and never precede
//! their opening edges.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::TemporalError;

/// Truncate to whole milliseconds, the precision the backend stores.
pub fn truncate_millis(t: DateTime<Utc>) -> DateTime<Utc> {
    from_millis(t.timestamp_millis()).unwrap_or(t)
}

/// Epoch milliseconds.
pub fn to_millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

/// Inverse of [`to_millis`]. `None` when out of chrono's range.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Current time at millisecond precision.
pub fn now_millis() -> DateTime<Utc> {
    truncate_millis(Utc::now())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitemporal {
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub expired_at: Option<DateTime<Utc>>,
}

impl Bitemporal {
    /// Open on both axes at `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        let at = truncate_millis(at);
        Self {
            valid_from: at,
            valid_to: None,
            created_at: at,
            expired_at: None,
        }
    }

    /// Rebuild from stored values, checking ordering.
    pub fn from_parts(
        valid_from: DateTime<Utc>,
        valid_to: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        expired_at: Option<DateTime<Utc>>,
    ) -> Result<Self, TemporalError> {
        let mut t = Self {
            valid_from: truncate_millis(valid_from),
            valid_to: None,
            created_at: truncate_millis(created_at),
            expired_at: None,
        };
        if let Some(end) = valid_to {
            t.invalidate(end)?;
        }
        if let Some(end) = expired_at {
            t.expire(end)?;
        }
        Ok(t)
    }

    /// Close valid time. Write-once, never before `valid_from`.
    pub fn invalidate(&mut self, at: DateTime<Utc>) -> Result<(), TemporalError> {
        if self.valid_to.is_some() {
            return Err(TemporalError::AlreadySet { field: "valid_to" });
        }
        let at = truncate_millis(at);
        if at < self.valid_from {
            return Err(TemporalError::Regression {
                field: "valid_to",
                at,
                bound: self.valid_from,
            });
        }
        self.valid_to = Some(at);
        Ok(())
    }

    /// Close transaction time. Write-once, never before `created_at`.
    pub fn expire(&mut self, at: DateTime<Utc>) -> Result<(), TemporalError> {
        if self.expired_at.is_some() {
            return Err(TemporalError::AlreadySet { field: "expired_at" });
        }
        let at = truncate_millis(at);
        if at < self.created_at {
            return Err(TemporalError::Regression {
                field: "expired_at",
                at,
                bound: self.created_at,
            });
        }
        self.expired_at = Some(at);
        Ok(())
    }

    /// Still the system's current belief.
    pub fn is_current(&self) -> bool {
        self.expired_at.is_none()
    }

    /// Held in the world at `t`.
    pub fn is_valid_at(&self, t: DateTime<Utc>) -> bool {
        self.valid_from <= t && self.valid_to.map_or(true, |end| t < end)
    }

    /// Current and valid at `t`.
    pub fn is_live_at(&self, t: DateTime<Utc>) -> bool {
        self.is_current() && self.is_valid_at(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn closing_edges_are_write_once() {
        let t0 = now_millis();
        let mut t = Bitemporal::new(t0);
        t.expire(t0 + Duration::seconds(1)).unwrap();
        assert!(matches!(
            t.expire(t0 + Duration::seconds(2)),
            Err(TemporalError::AlreadySet { .. })
        ));
    }

    #[test]
    fn closing_edge_cannot_precede_opening_edge() {
        let t0 = now_millis();
        let mut t = Bitemporal::new(t0);
        assert!(matches!(
            t.invalidate(t0 - Duration::milliseconds(1)),
            Err(TemporalError::Regression { .. })
        ));
        assert!(t.valid_to.is_none());
    }

    #[test]
    fn truncation_drops_sub_millisecond_precision() {
        let t = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let truncated = truncate_millis(t);
        assert_eq!(truncated.timestamp_subsec_nanos(), 123_000_000);
        assert_eq!(from_millis(to_millis(truncated)), Some(truncated));
    }
}
