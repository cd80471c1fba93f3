/// Computes the timestamp at which a reminder should fire, given the start
/// of the thing to remind about and how long before it the reminder should go out.
///
/// The result may lie in the past when the entity starts sooner than
/// `lead_time_millis` from now. That is still a valid fire time: the job is
/// due immediately.
pub fn compute_fire_at(target_ts: i64, lead_time_millis: i64) -> i64 {
    target_ts.saturating_sub(lead_time_millis)
}

/// Millis left until `fire_at`, clamped to zero for fire times in the past.
pub fn delay_until(fire_at: i64, now: i64) -> i64 {
    fire_at.saturating_sub(now).max(0)
}
