use chrono::{DateTime, Duration, Utc};

/// Hours before kick-off at which presence confirmation opens.
pub const CONFIRMATION_WINDOW_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantStatus {
    Pending,
    Confirmed,
    Waitlist,
    Declined,
    Cancelled,
    Attended,
    NoShow,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Pending => "pending",
            ParticipantStatus::Confirmed => "confirmed",
            ParticipantStatus::Waitlist => "waitlist",
            ParticipantStatus::Declined => "declined",
            ParticipantStatus::Cancelled => "cancelled",
            ParticipantStatus::Attended => "attended",
            ParticipantStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ParticipantStatus::Pending),
            "confirmed" => Some(ParticipantStatus::Confirmed),
            "waitlist" => Some(ParticipantStatus::Waitlist),
            "declined" => Some(ParticipantStatus::Declined),
            "cancelled" => Some(ParticipantStatus::Cancelled),
            "attended" => Some(ParticipantStatus::Attended),
            "no_show" => Some(ParticipantStatus::NoShow),
            _ => None,
        }
    }

    /// Whether this status holds one of the match's seats
    /// (counted in `current_players`).
    pub fn is_seated(&self) -> bool {
        matches!(self, ParticipantStatus::Pending | ParticipantStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Open,
    Confirmed,
    Full,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Open => "open",
            MatchStatus::Confirmed => "confirmed",
            MatchStatus::Full => "full",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(MatchStatus::Open),
            "confirmed" => Some(MatchStatus::Confirmed),
            "full" => Some(MatchStatus::Full),
            "cancelled" => Some(MatchStatus::Cancelled),
            _ => None,
        }
    }
}

/// Seat decision for a new join.
///
/// A join below capacity takes a seat as `pending`; a join at capacity
/// queues as `waitlist`. Never fails: a full match still accepts joins.
///
/// # Examples
///
/// ```
/// use infra::roster::{seat_for_join, ParticipantStatus};
///
/// assert_eq!(seat_for_join(9, 10), ParticipantStatus::Pending);
/// assert_eq!(seat_for_join(10, 10), ParticipantStatus::Waitlist);
/// ```
pub fn seat_for_join(current_players: i32, max_players: i32) -> ParticipantStatus {
    if current_players < max_players {
        ParticipantStatus::Pending
    } else {
        ParticipantStatus::Waitlist
    }
}

/// Recomputed match status after a seat change.
///
/// `full` at capacity, `confirmed` once quorum (`min_players`) is reached,
/// `open` below quorum. Cancellation is terminal and never recomputed;
/// callers skip cancelled matches entirely.
pub fn match_status_for(current_players: i32, min_players: i32, max_players: i32) -> MatchStatus {
    if current_players >= max_players {
        MatchStatus::Full
    } else if current_players >= min_players {
        MatchStatus::Confirmed
    } else {
        MatchStatus::Open
    }
}

/// Whether the confirmation window is open for a match starting at
/// `match_date`: strictly before kick-off and at most 48 hours out.
pub fn in_confirmation_window(now: DateTime<Utc>, match_date: DateTime<Utc>) -> bool {
    let until_start = match_date - now;
    until_start > Duration::zero() && until_start <= Duration::hours(CONFIRMATION_WINDOW_HOURS)
}

/// Whether a seated participant still owes a confirmation.
pub fn needs_confirmation(
    now: DateTime<Utc>,
    match_date: DateTime<Utc>,
    status: ParticipantStatus,
    confirmed_at: Option<DateTime<Utc>>,
) -> bool {
    status == ParticipantStatus::Pending
        && confirmed_at.is_none()
        && in_confirmation_window(now, match_date)
}

/// Whether an unconfirmed pending seat may be released back to the
/// waitlist. True once the release deadline is inside `release_before`
/// of kick-off, as long as the participant has held the seat for at
/// least `join_grace` (late joiners keep time to react).
pub fn is_releasable(
    now: DateTime<Utc>,
    match_date: DateTime<Utc>,
    joined_at: DateTime<Utc>,
    release_before: Duration,
    join_grace: Duration,
) -> bool {
    let until_start = match_date - now;
    until_start > Duration::zero()
        && until_start <= release_before
        && now - joined_at >= join_grace
}
