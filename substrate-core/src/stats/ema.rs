//! Exponential moving averages and the adaptive learning rate.

/// `alpha·x + (1 − alpha)·old`.
pub fn ema(old: f64, x: f64, alpha: f64) -> f64 {
    alpha * x + (1.0 - alpha) * old
}

/// Learning rate `1 − exp(−Δt/τ̂)` clipped to `[min, max]`.
///
/// `tau` is the record's smoothed inter-update interval. Without one
/// (`None` or non-positive) the caller's `first` rate is used.
pub fn adaptive_eta(dt_seconds: f64, tau: Option<f64>, first: f64, min: f64, max: f64) -> f64 {
    let eta = match tau {
        Some(tau) if tau > 0.0 && dt_seconds.is_finite() => 1.0 - (-dt_seconds / tau).exp(),
        _ => first,
    };
    if eta.is_finite() {
        eta.clamp(min, max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_moves_toward_input() {
        let v = ema(0.0, 1.0, 0.1);
        assert!((v - 0.1).abs() < 1e-12);
        assert!(ema(v, 1.0, 0.1) > v);
    }

    #[test]
    fn frequent_records_adapt_faster() {
        let fast = adaptive_eta(1.0, Some(1.0), 0.15, 0.01, 0.95);
        let slow = adaptive_eta(1.0, Some(100.0), 0.15, 0.01, 0.95);
        assert!(fast > slow);
        assert!((0.01..=0.95).contains(&slow));
    }

    #[test]
    fn unknown_interval_uses_first_rate() {
        assert_eq!(adaptive_eta(1.0, None, 0.15, 0.01, 0.95), 0.15);
    }
}
