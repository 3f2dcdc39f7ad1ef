//! Project lifecycle status, derived from the clock.
//!
//! The stored status column is only a cached view of this function; every
//! read path recomputes it and writes the result back if it changed.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ProjectStatus {
    NotStarted = 0,
    Active = 1,
    Ended = 2,
}

impl ProjectStatus {
    /// Pure derivation: before the window is not-started, past the deadline
    /// is ended, everything in between (boundaries included) is active.
    #[must_use]
    pub fn derive(now: NaiveDateTime, start: NaiveDateTime, deadline: NaiveDateTime) -> Self {
        if now < start {
            Self::NotStarted
        } else if now > deadline {
            Self::Ended
        } else {
            Self::Active
        }
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::Active,
            2 => Self::Ended,
            _ => Self::NotStarted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_before_start_is_not_started() {
        let status = ProjectStatus::derive(at(1, 8), at(1, 9), at(30, 18));
        assert_eq!(status, ProjectStatus::NotStarted);
    }

    #[test]
    fn test_within_window_is_active() {
        let status = ProjectStatus::derive(at(15, 12), at(1, 9), at(30, 18));
        assert_eq!(status, ProjectStatus::Active);
    }

    #[test]
    fn test_after_deadline_is_ended() {
        let status = ProjectStatus::derive(at(30, 19), at(1, 9), at(30, 18));
        assert_eq!(status, ProjectStatus::Ended);
    }

    #[test]
    fn test_boundaries_count_as_active() {
        assert_eq!(
            ProjectStatus::derive(at(1, 9), at(1, 9), at(30, 18)),
            ProjectStatus::Active
        );
        assert_eq!(
            ProjectStatus::derive(at(30, 18), at(1, 9), at(30, 18)),
            ProjectStatus::Active
        );
    }

    #[test]
    fn test_i32_round_trip() {
        for status in [
            ProjectStatus::NotStarted,
            ProjectStatus::Active,
            ProjectStatus::Ended,
        ] {
            assert_eq!(ProjectStatus::from_i32(status.as_i32()), status);
        }
        assert_eq!(ProjectStatus::from_i32(42), ProjectStatus::NotStarted);
    }
}
