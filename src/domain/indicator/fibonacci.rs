//! Fibonacci retracement levels from a single day's high/low range.
//!
//! Levels are measured down from the high: level(r) = high - r × (high - low).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibonacciLevels {
    pub fib_0: f64,
    pub fib_236: f64,
    pub fib_382: f64,
    pub fib_500: f64,
    pub fib_618: f64,
    pub fib_786: f64,
    pub fib_100: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FibonacciSignal {
    #[default]
    Neutral,
    StrongSupport,
    Support,
    Resistance,
}

impl FibonacciSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            FibonacciSignal::Neutral => "neutral",
            FibonacciSignal::StrongSupport => "strong_support",
            FibonacciSignal::Support => "support",
            FibonacciSignal::Resistance => "resistance",
        }
    }
}

pub fn calculate_fibonacci_levels(high: f64, low: f64) -> FibonacciLevels {
    let diff = high - low;
    FibonacciLevels {
        fib_0: high,
        fib_236: high - 0.236 * diff,
        fib_382: high - 0.382 * diff,
        fib_500: high - 0.500 * diff,
        fib_618: high - 0.618 * diff,
        fib_786: high - 0.786 * diff,
        fib_100: low,
    }
}

pub fn fibonacci_signal(price: f64, levels: &FibonacciLevels) -> FibonacciSignal {
    if price <= levels.fib_618 {
        FibonacciSignal::StrongSupport
    } else if price <= levels.fib_382 {
        FibonacciSignal::Support
    } else if price >= levels.fib_382 {
        FibonacciSignal::Resistance
    } else {
        // only reachable for NaN prices
        FibonacciSignal::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_over_range() {
        let levels = calculate_fibonacci_levels(110.0, 100.0);
        assert!((levels.fib_0 - 110.0).abs() < 1e-10);
        assert!((levels.fib_236 - 107.64).abs() < 1e-10);
        assert!((levels.fib_382 - 106.18).abs() < 1e-10);
        assert!((levels.fib_500 - 105.0).abs() < 1e-10);
        assert!((levels.fib_618 - 103.82).abs() < 1e-10);
        assert!((levels.fib_786 - 102.14).abs() < 1e-10);
        assert!((levels.fib_100 - 100.0).abs() < 1e-10);
    }

    #[test]
    fn levels_descend_from_high() {
        let l = calculate_fibonacci_levels(50.0, 40.0);
        assert!(l.fib_0 > l.fib_236);
        assert!(l.fib_236 > l.fib_382);
        assert!(l.fib_382 > l.fib_500);
        assert!(l.fib_500 > l.fib_618);
        assert!(l.fib_618 > l.fib_786);
        assert!(l.fib_786 > l.fib_100);
    }

    #[test]
    fn signal_zones() {
        let levels = calculate_fibonacci_levels(110.0, 100.0);
        assert_eq!(fibonacci_signal(101.0, &levels), FibonacciSignal::StrongSupport);
        assert_eq!(fibonacci_signal(105.0, &levels), FibonacciSignal::Support);
        assert_eq!(fibonacci_signal(108.0, &levels), FibonacciSignal::Resistance);
        assert_eq!(fibonacci_signal(f64::NAN, &levels), FibonacciSignal::Neutral);
    }

    #[test]
    fn flat_day_is_strong_support() {
        let levels = calculate_fibonacci_levels(100.0, 100.0);
        assert_eq!(fibonacci_signal(100.0, &levels), FibonacciSignal::StrongSupport);
    }
}
