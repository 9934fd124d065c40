use num::bigint::BigInt;
use num::rational::BigRational;
use num::traits::{One, ToPrimitive, Zero};

/// Arithmetic used to carry probability mass through the running-sum lattice.
///
/// The exact engine instantiates it with [`BigRational`], the approximate one
/// with `f64`; the recursion itself is shared.
pub trait PathWeight: Clone {
    fn zero() -> Self;

    fn one() -> Self;

    fn is_zero(&self) -> bool;

    /// `self * numerator / denominator`
    fn scale(&self, numerator: u64, denominator: u64) -> Self;

    fn accumulate(&mut self, other: Self);

    fn to_f64(&self) -> f64;
}

impl PathWeight for f64 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    #[inline]
    fn scale(&self, numerator: u64, denominator: u64) -> Self {
        self * (numerator as f64 / denominator as f64)
    }

    #[inline]
    fn accumulate(&mut self, other: Self) {
        *self += other;
    }

    fn to_f64(&self) -> f64 {
        *self
    }
}

impl PathWeight for BigRational {
    fn zero() -> Self {
        Zero::zero()
    }

    fn one() -> Self {
        One::one()
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn scale(&self, numerator: u64, denominator: u64) -> Self {
        self * BigRational::new(BigInt::from(numerator), BigInt::from(denominator))
    }

    fn accumulate(&mut self, other: Self) {
        *self += other;
    }

    fn to_f64(&self) -> f64 {
        ratio_to_f64(self)
    }
}

/// Converts a rational to the nearest `f64` without overflowing on huge
/// numerators and denominators.
fn ratio_to_f64(ratio: &BigRational) -> f64 {
    let (numer, denom) = (ratio.numer(), ratio.denom());
    if Zero::is_zero(numer) {
        return 0.0;
    }

    // keep 64 significant bits in the integer quotient
    let shift = 64 + denom.bits() as i64 - numer.bits() as i64;
    let quotient = if shift >= 0 {
        (numer << shift as usize) / denom
    } else {
        numer / (denom << (-shift) as usize)
    };

    match quotient.to_f64() {
        Some(q) => scale_by_power_of_two(q, -shift),
        None => f64::NAN,
    }
}

fn scale_by_power_of_two(mut value: f64, mut exponent: i64) -> f64 {
    const STEP: i64 = 1000;
    while exponent > STEP {
        value *= 2f64.powi(STEP as i32);
        exponent -= STEP;
    }
    while exponent < -STEP && value != 0.0 {
        value *= 2f64.powi(-STEP as i32);
        exponent += STEP;
    }
    value * 2f64.powi(exponent as i32)
}
