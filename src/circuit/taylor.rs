use super::{ConfigurationError, ScaledCiphertext, ScaledEvaluator, check_depth, check_magnitude};
use crate::{
    Result,
    backend::HomomorphicBackend,
    codec::{CodecError, PlaintextModulus, Scale, decode_integer, encode},
};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaylorTerm {
    pub degree: u32,
    pub coefficient: f64,
}

impl TaylorTerm {
    pub fn new(degree: u32, coefficient: f64) -> Self {
        Self {
            degree,
            coefficient,
        }
    }
}

/// Fixed-point evaluation plan for `sum c_k x^k`.
///
/// `x` is encoded at the input scale `s`. Every coefficient is encoded as
/// `round(c_k * denom * s^(max - k))`, which puts each term `c_k x^k` at the
/// common scale `denom * s^max` so the terms can be summed directly.
#[derive(Debug, Clone, PartialEq)]
pub struct TaylorPlan {
    terms: Vec<TaylorTerm>,
    input_scale: Scale,
    denominator: u128,
}

/// Per-term ciphertexts and their sum, all at the plan's combined scale.
/// A constant term is folded into `sum` only.
#[derive(Debug, Clone)]
pub struct TaylorEvaluation<C> {
    pub terms: Vec<ScaledCiphertext<C>>,
    pub sum: ScaledCiphertext<C>,
}

impl TaylorPlan {
    pub fn new(terms: Vec<TaylorTerm>, input_scale: u128, denominator: u128) -> Result<Self> {
        if terms.iter().all(|term| term.degree == 0) {
            return Err(ConfigurationError::EmptyPlan.into());
        }
        let mut terms = terms;
        terms.sort_by_key(|term| term.degree);
        Ok(Self {
            terms,
            input_scale: Scale::integer(input_scale)?,
            denominator: Scale::integer(denominator)?.numerator(),
        })
    }

    /// Odd-degree Maclaurin series of `sin` up to `order`, with denominator
    /// `order!` so that every coefficient becomes an integer.
    pub fn sine(order: u32, input_scale: u128) -> Result<Self> {
        let max_degree = if order % 2 == 0 { order.saturating_sub(1) } else { order };
        if max_degree == 0 {
            return Err(ConfigurationError::EmptyPlan.into());
        }
        let mut terms = Vec::new();
        let mut factorial = 1u128;
        for degree in 1..=max_degree {
            factorial = factorial
                .checked_mul(degree as u128)
                .ok_or(CodecError::ScaleOverflow)?;
            if degree % 2 == 1 {
                let sign = if (degree / 2) % 2 == 0 { 1.0 } else { -1.0 };
                terms.push(TaylorTerm::new(degree, sign / factorial as f64));
            }
        }
        Self::new(terms, input_scale, factorial)
    }

    pub fn terms(&self) -> &[TaylorTerm] {
        &self.terms
    }

    pub fn input_scale(&self) -> Scale {
        self.input_scale
    }

    pub fn denominator(&self) -> u128 {
        self.denominator
    }

    pub fn max_degree(&self) -> u32 {
        self.terms.last().map_or(0, |term| term.degree)
    }

    /// `ceil(log2(max_degree))` levels for the powers plus one for the
    /// coefficient products.
    pub fn required_depth(&self) -> usize {
        power_depth(self.max_degree()) + 1
    }

    /// `denom * s^max_degree`.
    pub fn combined_scale(&self) -> Result<Scale> {
        Ok(Scale::integer(self.denominator)?.checked_mul(self.input_scale.pow(self.max_degree())?)?)
    }

    /// `round(c_k * denom * s^(max - k))` for every term.
    pub fn integer_coefficients(&self) -> Result<Vec<i128>> {
        let max = self.max_degree();
        self.terms
            .iter()
            .map(|term| {
                let scale =
                    Scale::integer(self.denominator)?.checked_mul(self.input_scale.pow(max - term.degree)?)?;
                let value = (term.coefficient * scale.as_f64()).round();
                if !value.is_finite() || value.abs() >= i128::MAX as f64 {
                    return Err(CodecError::IntegerOverflow.into());
                }
                Ok(value as i128)
            })
            .collect()
    }

    /// Checks depth and every intermediate magnitude for `|x| <= input_bound`.
    pub fn validate(&self, modulus: PlaintextModulus, available_depth: usize, input_bound: f64) -> Result<()> {
        let bound = encode(input_bound.abs(), self.input_scale, modulus)?.unsigned_abs();
        self.validate_integer_bound(modulus, available_depth, bound)
    }

    fn validate_integer_bound(&self, modulus: PlaintextModulus, available_depth: usize, bound: u128) -> Result<()> {
        check_depth(self.required_depth(), available_depth)?;

        for degree in self.power_ladder() {
            check_magnitude(pow_bound(bound, degree), modulus, format!("x^{degree}"))?;
        }

        let mut total = 0u128;
        for (term, coefficient) in self.terms.iter().zip(self.integer_coefficients()?) {
            let magnitude = coefficient
                .unsigned_abs()
                .saturating_mul(pow_bound(bound, term.degree));
            check_magnitude(magnitude, modulus, format!("term x^{}", term.degree))?;
            total = total.saturating_add(magnitude);
        }
        check_magnitude(total, modulus, "sum")?;
        Ok(())
    }

    /// Integer-domain reference: `sum ic_k x^k` for an already scaled `x`.
    pub fn evaluate_integer(&self, x: i128) -> Result<i128> {
        let mut sum = 0i128;
        for (term, coefficient) in self.terms.iter().zip(self.integer_coefficients()?) {
            let value = x
                .checked_pow(term.degree)
                .and_then(|power| power.checked_mul(coefficient))
                .ok_or(CodecError::IntegerOverflow)?;
            sum = sum.checked_add(value).ok_or(CodecError::IntegerOverflow)?;
        }
        Ok(sum)
    }

    /// Real-valued polynomial, without quantization.
    pub fn evaluate_real(&self, x: f64) -> f64 {
        self.terms
            .iter()
            .map(|term| term.coefficient * x.powi(term.degree as i32))
            .sum()
    }

    /// Divides an integer result by the combined scale.
    pub fn decode(&self, value: i128) -> Result<f64> {
        Ok(decode_integer(value, self.combined_scale()?))
    }

    /// Evaluates the plan on `x`, which must be encoded at the input scale.
    ///
    /// Validates depth and magnitudes first; nothing is computed when the
    /// plan does not fit.
    #[instrument(skip_all, fields(max_degree = self.max_degree()))]
    pub fn evaluate<B: HomomorphicBackend>(
        &self,
        evaluator: &ScaledEvaluator<B>,
        x: &ScaledCiphertext<B::Ciphertext>,
    ) -> Result<TaylorEvaluation<B::Ciphertext>> {
        if x.scale() != self.input_scale {
            return Err(CodecError::ScaleMismatch {
                left: x.scale(),
                right: self.input_scale,
            }
            .into());
        }
        self.validate_integer_bound(evaluator.modulus(), evaluator.remaining_depth(x), x.bound())?;

        let mut powers = HashMap::from([(1u32, x.clone())]);
        for degree in self.power_ladder() {
            if degree > 1 {
                let low = largest_power_of_two_below(degree);
                let product = evaluator.mul(&powers[&low], &powers[&(degree - low)])?;
                powers.insert(degree, product);
            }
        }

        let max = self.max_degree();
        let mut terms = Vec::with_capacity(self.terms.len());
        let mut constant = 0i128;
        for (term, coefficient) in self.terms.iter().zip(self.integer_coefficients()?) {
            if term.degree == 0 {
                constant += coefficient;
                continue;
            }
            let coefficient_scale =
                Scale::integer(self.denominator)?.checked_mul(self.input_scale.pow(max - term.degree)?)?;
            terms.push(evaluator.mul_scaled_integer(&powers[&term.degree], coefficient, coefficient_scale)?);
        }

        let mut sum = terms[0].clone();
        for term in &terms[1..] {
            sum = evaluator.add(&sum, term)?;
        }
        if constant != 0 {
            sum = evaluator.add_integer(&sum, constant)?;
        }
        debug!(terms = terms.len(), bound = sum.bound(), "taylor sum ready");
        Ok(TaylorEvaluation { terms, sum })
    }

    /// Every power the ladder computes, in increasing order.
    fn power_ladder(&self) -> BTreeSet<u32> {
        let mut needed = BTreeSet::new();
        let mut pending: Vec<u32> = self.terms.iter().map(|t| t.degree).filter(|&d| d > 0).collect();
        while let Some(degree) = pending.pop() {
            if !needed.insert(degree) || degree == 1 {
                continue;
            }
            let low = largest_power_of_two_below(degree);
            pending.push(low);
            pending.push(degree - low);
        }
        needed
    }
}

/// Largest power of two strictly below `k` (`k >= 2`).
fn largest_power_of_two_below(k: u32) -> u32 {
    1 << (31 - (k - 1).leading_zeros())
}

fn power_depth(degree: u32) -> usize {
    if degree <= 1 {
        0
    } else {
        (32 - (degree - 1).leading_zeros()) as usize
    }
}

fn pow_bound(bound: u128, degree: u32) -> u128 {
    bound.checked_pow(degree).unwrap_or(u128::MAX)
}
