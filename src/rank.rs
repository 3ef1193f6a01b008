use crate::xeno::Recording;

const WORST_RANK: u8 = 99;

/// Maps the catalog's quality tier (A best .. E worst) to a sortable rank.
/// Unrecognized or missing tiers are demoted to the worst rank rather than
/// rejected, matching the catalog's permissive grading.
pub fn quality_rank(tier: Option<&str>) -> u8 {
    match tier.map(str::trim) {
        Some("A") => 1,
        Some("B") => 2,
        Some("C") => 3,
        Some("D") => 4,
        Some("E") => 5,
        _ => WORST_RANK,
    }
}

/// Stable-sorts records by quality rank ascending and truncates to `cap`.
///
/// With `only_high_quality`, records outside tier A are excluded before
/// capping, so the cap is filled with A-tier records only. A cap of zero
/// selects nothing.
pub fn select(records: &[Recording], cap: usize, only_high_quality: bool) -> Vec<Recording> {
    let mut eligible: Vec<Recording> = records
        .iter()
        .filter(|record| !only_high_quality || quality_rank(record.q.as_deref()) == 1)
        .cloned()
        .collect();
    // sort_by_key is stable: equal ranks keep discovery order.
    eligible.sort_by_key(|record| quality_rank(record.q.as_deref()));
    eligible.truncate(cap);
    eligible
}
