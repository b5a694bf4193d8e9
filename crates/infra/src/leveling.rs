/// XP awarded to the organizer for each match created.
pub const XP_MATCH_CREATED: i32 = 50;
/// XP awarded to a participant marked as attended.
pub const XP_MATCH_ATTENDED: i32 = 25;

/// League floors, lowest first. A player sits in the highest league whose
/// floor their total XP reaches.
pub const LEAGUES: [(&str, i64); 5] = [
    ("bronze", 0),
    ("silver", 1_000),
    ("gold", 5_000),
    ("diamond", 15_000),
    ("master", 50_000),
];

/// Level curve: level N needs `(N - 1)^2 * 100` total XP
///
/// # Examples
///
/// ```
/// use infra::leveling::level_for_xp;
///
/// assert_eq!(level_for_xp(0), 1);
/// assert_eq!(level_for_xp(100), 2);
/// assert_eq!(level_for_xp(400), 3);
/// ```
pub fn level_for_xp(total_xp: i64) -> i32 {
    if total_xp <= 0 {
        return 1;
    }
    ((total_xp as f64 / 100.0).sqrt().floor() as i32) + 1
}

/// Total XP at which `level` begins.
pub fn xp_for_level(level: i32) -> i64 {
    if level <= 1 {
        return 0;
    }
    let base = (level - 1) as i64;
    base * base * 100
}

pub fn league_for_xp(total_xp: i64) -> &'static str {
    LEAGUES
        .iter()
        .rev()
        .find(|(_, floor)| total_xp >= *floor)
        .map(|(name, _)| *name)
        .unwrap_or("bronze")
}

/// Fraction of the way from the current level to the next, in `0.0..1.0`.
pub fn progress_to_next_level(total_xp: i64) -> f64 {
    let total_xp = total_xp.max(0);
    let level = level_for_xp(total_xp);
    let floor = xp_for_level(level);
    let ceiling = xp_for_level(level + 1);
    (total_xp - floor) as f64 / (ceiling - floor) as f64
}
