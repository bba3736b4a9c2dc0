use super::{ConfigurationError, ScaledCiphertext, ScaledEvaluator, check_depth, check_magnitude};
use crate::{
    Result,
    backend::HomomorphicBackend,
    codec::{PlaintextModulus, Scale},
};
use tracing::instrument;

/// Product of two polynomials packed one coefficient per slot.
///
/// Coefficient `i` of each operand is isolated with a unit selector and
/// rotated into slot 0, so every pair `(i, j)` with `i + j = d` multiplies
/// into slot 0 of the ciphertext for output degree `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolynomialProduct {
    lhs_len: usize,
    rhs_len: usize,
}

impl PolynomialProduct {
    pub fn new(lhs_len: usize, rhs_len: usize) -> Result<Self> {
        if lhs_len == 0 || rhs_len == 0 {
            return Err(ConfigurationError::EmptyPlan.into());
        }
        Ok(Self { lhs_len, rhs_len })
    }

    pub fn output_len(&self) -> usize {
        self.lhs_len + self.rhs_len - 1
    }

    /// Selector multiply, then the ciphertext product.
    pub fn required_depth(&self) -> usize {
        2
    }

    pub fn rotation_offsets(&self) -> Vec<i64> {
        (1..self.lhs_len.max(self.rhs_len)).map(|i| i as i64).collect()
    }

    pub fn validate(
        &self,
        modulus: PlaintextModulus,
        available_depth: usize,
        row_size: usize,
        lhs_bound: u128,
        rhs_bound: u128,
    ) -> Result<()> {
        let widest = self.lhs_len.max(self.rhs_len);
        if widest > row_size {
            return Err(ConfigurationError::WidthExceedsRow {
                width: widest,
                row_size,
            }
            .into());
        }
        check_depth(self.required_depth(), available_depth)?;
        let product = check_magnitude(lhs_bound.saturating_mul(rhs_bound), modulus, "coefficient product")?;
        let pairs = self.lhs_len.min(self.rhs_len) as u128;
        check_magnitude(product.saturating_mul(pairs), modulus, "coefficient sum")?;
        Ok(())
    }

    /// Schoolbook product over the integers.
    pub fn plain_reference(lhs: &[i64], rhs: &[i64]) -> Vec<i128> {
        if lhs.is_empty() || rhs.is_empty() {
            return Vec::new();
        }
        let mut out = vec![0i128; lhs.len() + rhs.len() - 1];
        for (i, &a) in lhs.iter().enumerate() {
            for (j, &b) in rhs.iter().enumerate() {
                out[i + j] += a as i128 * b as i128;
            }
        }
        out
    }

    /// Returns one ciphertext per output degree, holding the coefficient in
    /// slot 0.
    #[instrument(skip_all, fields(lhs_len = self.lhs_len, rhs_len = self.rhs_len))]
    pub fn evaluate<B: HomomorphicBackend>(
        &self,
        evaluator: &ScaledEvaluator<B>,
        lhs: &ScaledCiphertext<B::Ciphertext>,
        rhs: &ScaledCiphertext<B::Ciphertext>,
    ) -> Result<Vec<ScaledCiphertext<B::Ciphertext>>> {
        let available = evaluator
            .remaining_depth(lhs)
            .min(evaluator.remaining_depth(rhs));
        self.validate(
            evaluator.modulus(),
            available,
            evaluator.backend().row_size(),
            lhs.bound(),
            rhs.bound(),
        )?;

        let lhs_terms = isolate(evaluator, lhs, self.lhs_len)?;
        let rhs_terms = isolate(evaluator, rhs, self.rhs_len)?;

        let mut outputs = Vec::with_capacity(self.output_len());
        for degree in 0..self.output_len() {
            let mut sum: Option<ScaledCiphertext<B::Ciphertext>> = None;
            let first = degree.saturating_sub(self.rhs_len - 1);
            for i in first..=degree.min(self.lhs_len - 1) {
                let product = evaluator.mul(&lhs_terms[i], &rhs_terms[degree - i])?;
                sum = Some(match sum {
                    None => product,
                    Some(acc) => evaluator.add(&acc, &product)?,
                });
            }
            outputs.push(sum.ok_or(ConfigurationError::EmptyPlan)?);
        }
        Ok(outputs)
    }
}

/// `rot(x * e_i, i)` for every `i < len`: coefficient `i` alone, in slot 0.
fn isolate<B: HomomorphicBackend>(
    evaluator: &ScaledEvaluator<B>,
    value: &ScaledCiphertext<B::Ciphertext>,
    len: usize,
) -> Result<Vec<ScaledCiphertext<B::Ciphertext>>> {
    (0..len)
        .map(|i| {
            let mut selector = vec![0i128; i + 1];
            selector[i] = 1;
            let selected = evaluator.mul_slots(value, &selector, Scale::ONE)?;
            evaluator.rotate(&selected, i as i64)
        })
        .collect()
}
