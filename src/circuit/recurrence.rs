use super::{ScaledCiphertext, ScaledEvaluator, check_depth, check_magnitude};
use crate::{
    Result,
    backend::HomomorphicBackend,
    codec::{CodecError, PlaintextModulus, Scale, encode},
};
use tracing::{debug, instrument};

/// Encrypted `(sin θ, cos θ)` pair.
#[derive(Debug, Clone)]
pub struct RecurrenceState<C> {
    pub sin: ScaledCiphertext<C>,
    pub cos: ScaledCiphertext<C>,
}

/// Advances `(sin θ, cos θ)` by a small angle `d` with the first-order
/// rotation `s' = s + c*d`, `c' = c - s*d`.
///
/// The products `c*d` and `s*d` pick up an extra factor of the step scale
/// `S`, so `s` and `c` are raised by `S` before they are combined. Each step
/// therefore costs one level and multiplies the scale by `S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinCosRecurrence {
    step: f64,
    scale: Scale,
    step_integer: i128,
}

impl SinCosRecurrence {
    pub fn new(step: f64, scale: u128, modulus: PlaintextModulus) -> Result<Self> {
        let scale = Scale::integer(scale)?;
        let step_integer = encode(step, scale, modulus)?;
        Ok(Self {
            step,
            scale,
            step_integer,
        })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// `round(d * S)`.
    pub fn step_integer(&self) -> i128 {
        self.step_integer
    }

    pub fn initial<B: HomomorphicBackend>(
        &self,
        evaluator: &mut ScaledEvaluator<B>,
        theta: f64,
    ) -> Result<RecurrenceState<B::Ciphertext>> {
        Ok(RecurrenceState {
            sin: evaluator.encrypt(&[theta.sin()], self.scale)?,
            cos: evaluator.encrypt(&[theta.cos()], self.scale)?,
        })
    }

    /// Checks that `steps` steps from values bounded by `S` fit both the
    /// depth and the modulus.
    pub fn validate(&self, modulus: PlaintextModulus, available_depth: usize, steps: usize) -> Result<()> {
        self.validate_from(modulus, available_depth, steps, self.scale.numerator())
    }

    fn validate_from(
        &self,
        modulus: PlaintextModulus,
        available_depth: usize,
        steps: usize,
        initial_bound: u128,
    ) -> Result<()> {
        check_depth(steps, available_depth)?;
        let growth = self
            .scale
            .numerator()
            .saturating_add(self.step_integer.unsigned_abs());
        let mut bound = initial_bound;
        for step in 1..=steps {
            bound = check_magnitude(bound.saturating_mul(growth), modulus, format!("step {step}"))?;
        }
        Ok(())
    }

    /// One recurrence step.
    pub fn advance<B: HomomorphicBackend>(
        &self,
        evaluator: &ScaledEvaluator<B>,
        state: &RecurrenceState<B::Ciphertext>,
    ) -> Result<RecurrenceState<B::Ciphertext>> {
        let target = state.sin.scale().checked_mul(self.scale)?;
        let sin_up = evaluator.rescale_to(&state.sin, target)?;
        let cos_up = evaluator.rescale_to(&state.cos, target)?;
        let cos_d = evaluator.mul_scaled_integer(&state.cos, self.step_integer, self.scale)?;
        let sin_d = evaluator.mul_scaled_integer(&state.sin, self.step_integer, self.scale)?;
        Ok(RecurrenceState {
            sin: evaluator.add(&sin_up, &cos_d)?,
            cos: evaluator.sub(&cos_up, &sin_d)?,
        })
    }

    /// Runs `steps` steps after validating the whole run up-front.
    #[instrument(skip_all, fields(steps = steps))]
    pub fn run<B: HomomorphicBackend>(
        &self,
        evaluator: &ScaledEvaluator<B>,
        state: RecurrenceState<B::Ciphertext>,
        steps: usize,
    ) -> Result<RecurrenceState<B::Ciphertext>> {
        if state.sin.scale() != state.cos.scale() {
            return Err(CodecError::ScaleMismatch {
                left: state.sin.scale(),
                right: state.cos.scale(),
            }
            .into());
        }
        let available = evaluator
            .remaining_depth(&state.sin)
            .min(evaluator.remaining_depth(&state.cos));
        let bound = state.sin.bound().max(state.cos.bound());
        self.validate_from(evaluator.modulus(), available, steps, bound)?;

        let mut state = state;
        for _ in 0..steps {
            state = self.advance(evaluator, &state)?;
        }
        debug!(scale = %state.sin.scale(), bound = state.sin.bound(), "recurrence finished");
        Ok(state)
    }

    /// Exact integer recurrence from already scaled `(sin, cos)`.
    pub fn integer_reference(&self, sin: i128, cos: i128, steps: usize) -> Result<(i128, i128)> {
        let s = self.scale.numerator() as i128;
        let d = self.step_integer;
        let (mut sin, mut cos) = (sin, cos);
        for _ in 0..steps {
            let next_sin = sin
                .checked_mul(s)
                .zip(cos.checked_mul(d))
                .and_then(|(a, b)| a.checked_add(b))
                .ok_or(CodecError::IntegerOverflow)?;
            let next_cos = cos
                .checked_mul(s)
                .zip(sin.checked_mul(d))
                .and_then(|(a, b)| a.checked_sub(b))
                .ok_or(CodecError::IntegerOverflow)?;
            (sin, cos) = (next_sin, next_cos);
        }
        Ok((sin, cos))
    }

    /// The same first-order recurrence in floating point.
    pub fn plain_reference(&self, theta: f64, steps: usize) -> (f64, f64) {
        let (mut sin, mut cos) = (theta.sin(), theta.cos());
        for _ in 0..steps {
            (sin, cos) = (sin + cos * self.step, cos - sin * self.step);
        }
        (sin, cos)
    }
}
