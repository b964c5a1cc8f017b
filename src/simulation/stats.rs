//! Summary statistics over trial outcomes

/// Percentile of an ascending-sorted slice, linear interpolation between ranks.
/// `p` is in percent (0-100). Empty input gives 0.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n as f64 - 1.0);
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            if lower == upper {
                sorted[lower]
            } else {
                let w = rank - lower as f64;
                sorted[lower] * (1.0 - w) + sorted[upper] * w
            }
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

pub fn sort_ascending(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}
