//! Largest-remainder (Hamilton) apportionment.

/// Round fractional quotas to integers that sum to `total`.
///
/// Each quota is floored, then the `total - Σ floor` leftover seats go one
/// apiece to the quotas with the largest fractional remainders. Equal
/// remainders are served in input order. At most one extra seat is handed to
/// each quota, so when the quotas sum to less than `total` the result sums to
/// less as well. Negative and non-finite quotas count as zero.
///
/// # Examples
///
/// ```
/// use moat_portfolio::largest_remainder;
///
/// // 30 seats over weights 0.45 / 0.35 / 0.20 -> 13.5 / 10.5 / 6.0
/// let counts = largest_remainder(&[13.5, 10.5, 6.0], 30);
/// assert_eq!(counts, vec![14, 10, 6]);
/// assert_eq!(counts.iter().sum::<usize>(), 30);
/// ```
pub fn largest_remainder(quotas: &[f64], total: usize) -> Vec<usize> {
    let quotas: Vec<f64> = quotas
        .iter()
        .map(|&q| if q.is_finite() && q > 0.0 { q } else { 0.0 })
        .collect();

    let mut counts: Vec<usize> = quotas.iter().map(|q| q.floor() as usize).collect();
    let assigned: usize = counts.iter().sum();
    let remaining = total.saturating_sub(assigned);

    let mut order: Vec<usize> = (0..quotas.len()).collect();
    // Stable sort keeps input order among equal remainders.
    order.sort_by(|&a, &b| {
        let ra = quotas[a] - quotas[a].floor();
        let rb = quotas[b] - quotas[b].floor();
        rb.total_cmp(&ra)
    });

    for &idx in order.iter().take(remaining) {
        counts[idx] += 1;
    }
    counts
}
