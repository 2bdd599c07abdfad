//! Floating-point arithmetic under a selectable IEEE-754 rounding mode.
//!
//! Every operation is computed with the default round-to-nearest result and
//! corrected by one ulp when the exact error term shows the nearest result
//! lies on the wrong side of the true value. The error terms come from
//! TwoSum (addition) and fused multiply-add (product, quotient, square root),
//! which are exact for the finite, normal operands the VM produces.

/// IEEE-754 rounding direction selected by `CFROUND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMode {
    /// Round to nearest, ties to even.
    #[default]
    Nearest,
    /// Round toward negative infinity.
    Down,
    /// Round toward positive infinity.
    Up,
    /// Round toward zero.
    TowardZero,
}

impl RoundingMode {
    /// Mode encoded by the two low bits of `bits`.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        match bits & 3 {
            0 => Self::Nearest,
            1 => Self::Down,
            2 => Self::Up,
            _ => Self::TowardZero,
        }
    }
}

/// Step `nearest` one ulp toward the exact value when `mode` requires it.
///
/// `err` is `exact - nearest` (only its sign matters).
#[inline]
fn correct(nearest: f64, err: f64, mode: RoundingMode) -> f64 {
    match mode {
        RoundingMode::Nearest => nearest,
        RoundingMode::Up if err > 0.0 => nearest.next_up(),
        RoundingMode::Down if err < 0.0 => nearest.next_down(),
        RoundingMode::TowardZero if nearest > 0.0 && err < 0.0 => nearest.next_down(),
        RoundingMode::TowardZero if nearest < 0.0 && err > 0.0 => nearest.next_up(),
        _ => nearest,
    }
}

/// Result for a finite exact value that rounded to infinity under nearest.
#[inline]
fn overflow(nearest: f64, mode: RoundingMode) -> f64 {
    match mode {
        RoundingMode::Down | RoundingMode::TowardZero if nearest > 0.0 => f64::MAX,
        RoundingMode::Up | RoundingMode::TowardZero if nearest < 0.0 => f64::MIN,
        _ => nearest,
    }
}

/// `a + b` rounded per `mode`.
#[inline]
pub fn add(a: f64, b: f64, mode: RoundingMode) -> f64 {
    let sum = a + b;
    if mode == RoundingMode::Nearest || !a.is_finite() || !b.is_finite() {
        return sum;
    }
    if sum.is_infinite() {
        return overflow(sum, mode);
    }
    if sum == 0.0 {
        // Exact zero: only round-down yields -0 from operands of mixed sign.
        return if mode == RoundingMode::Down && (a.is_sign_negative() || b.is_sign_negative()) {
            -0.0
        } else {
            sum
        };
    }
    let b_virtual = sum - a;
    let a_virtual = sum - b_virtual;
    let err = (a - a_virtual) + (b - b_virtual);
    correct(sum, err, mode)
}

/// `a - b` rounded per `mode`.
#[inline]
pub fn sub(a: f64, b: f64, mode: RoundingMode) -> f64 {
    add(a, -b, mode)
}

/// `a * b` rounded per `mode`.
#[inline]
pub fn mul(a: f64, b: f64, mode: RoundingMode) -> f64 {
    let product = a * b;
    if mode == RoundingMode::Nearest || !a.is_finite() || !b.is_finite() {
        return product;
    }
    if product.is_infinite() {
        return overflow(product, mode);
    }
    let err = if product == 0.0 && a != 0.0 && b != 0.0 {
        // Underflowed to zero; the exact product carries the sign.
        if a.is_sign_negative() == b.is_sign_negative() { 1.0 } else { -1.0 }
    } else {
        a.mul_add(b, -product)
    };
    correct(product, err, mode)
}

/// `a / b` rounded per `mode`.
#[inline]
pub fn div(a: f64, b: f64, mode: RoundingMode) -> f64 {
    let quotient = a / b;
    if mode == RoundingMode::Nearest || !a.is_finite() || !b.is_finite() || b == 0.0 {
        return quotient;
    }
    if quotient.is_infinite() {
        return overflow(quotient, mode);
    }
    // a - q*b has the sign of (a/b - q) * b.
    let remainder = (-quotient).mul_add(b, a);
    let err = if b > 0.0 { remainder } else { -remainder };
    correct(quotient, err, mode)
}

/// `sqrt(a)` rounded per `mode`.
#[inline]
pub fn sqrt(a: f64, mode: RoundingMode) -> f64 {
    let root = a.sqrt();
    if mode == RoundingMode::Nearest || !root.is_finite() || root == 0.0 {
        return root;
    }
    let err = (-root).mul_add(root, a);
    correct(root, err, mode)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    const TINY: f64 = 1.0 / (1u64 << 60) as f64;

    #[test]
    fn test_mode_from_bits() {
        assert_eq!(RoundingMode::from_bits(0), RoundingMode::Nearest);
        assert_eq!(RoundingMode::from_bits(1), RoundingMode::Down);
        assert_eq!(RoundingMode::from_bits(2), RoundingMode::Up);
        assert_eq!(RoundingMode::from_bits(7), RoundingMode::TowardZero);
    }

    #[test]
    fn test_add_directed() {
        assert_eq!(add(1.0, TINY, RoundingMode::Nearest), 1.0);
        assert_eq!(add(1.0, TINY, RoundingMode::Down), 1.0);
        assert_eq!(add(1.0, TINY, RoundingMode::Up), 1.0f64.next_up());
        assert_eq!(add(1.0, TINY, RoundingMode::TowardZero), 1.0);

        assert_eq!(add(1.0, -TINY, RoundingMode::Down), 1.0f64.next_down());
        assert_eq!(add(1.0, -TINY, RoundingMode::TowardZero), 1.0f64.next_down());
        assert_eq!(add(-1.0, TINY, RoundingMode::TowardZero), (-1.0f64).next_up());
        assert_eq!(add(-1.0, -TINY, RoundingMode::Down), (-1.0f64).next_down());

        // Exact sums are untouched.
        for mode in [RoundingMode::Down, RoundingMode::Up, RoundingMode::TowardZero] {
            assert_eq!(add(1.5, 2.25, mode), 3.75);
            assert_eq!(sub(1.5, 2.25, mode), -0.75);
        }
    }

    #[test]
    fn test_signed_zero() {
        assert!(add(1.0, -1.0, RoundingMode::Down).is_sign_negative());
        assert!(add(1.0, -1.0, RoundingMode::Up).is_sign_positive());
        assert!(add(1.0, -1.0, RoundingMode::Nearest).is_sign_positive());
        assert!(add(0.0, 0.0, RoundingMode::Down).is_sign_positive());
        assert!(add(-0.0, -0.0, RoundingMode::Up).is_sign_negative());
    }

    #[test]
    fn test_overflow() {
        assert_eq!(add(f64::MAX, f64::MAX, RoundingMode::Down), f64::MAX);
        assert_eq!(add(f64::MAX, f64::MAX, RoundingMode::TowardZero), f64::MAX);
        assert_eq!(add(f64::MAX, f64::MAX, RoundingMode::Up), f64::INFINITY);
        assert_eq!(mul(f64::MIN, 2.0, RoundingMode::Up), f64::MIN);
        assert_eq!(mul(f64::MIN, 2.0, RoundingMode::Down), f64::NEG_INFINITY);
        // Just above MAX rounds to MAX under nearest but past it upward.
        let ulp = f64::MAX - f64::MAX.next_down();
        assert_eq!(add(f64::MAX, ulp / 4.0, RoundingMode::Up), f64::INFINITY);
    }

    #[test]
    fn test_mul_div_sqrt_bracket_exact_value() {
        let third_down = div(1.0, 3.0, RoundingMode::Down);
        let third_up = div(1.0, 3.0, RoundingMode::Up);
        assert_eq!(third_down.next_up(), third_up);
        assert_eq!(div(1.0, 3.0, RoundingMode::TowardZero), third_down);
        assert_eq!(div(-1.0, 3.0, RoundingMode::TowardZero), -third_down);
        assert_eq!(div(1.0, -3.0, RoundingMode::Down), -third_up);

        let root_down = sqrt(2.0, RoundingMode::Down);
        let root_up = sqrt(2.0, RoundingMode::Up);
        assert_eq!(root_down.next_up(), root_up);
        assert_eq!(sqrt(4.0, RoundingMode::Up), 2.0);

        let x = 1.0 + f64::EPSILON;
        let p_down = mul(x, x, RoundingMode::Down);
        let p_up = mul(x, x, RoundingMode::Up);
        assert_eq!(p_down.next_up(), p_up);
        assert_eq!(mul(3.0, 0.5, RoundingMode::Up), 1.5);
    }
}
