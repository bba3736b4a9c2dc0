use super::{ConfigurationError, ScaledCiphertext, ScaledEvaluator, check_depth, check_magnitude};
use crate::{
    Result,
    backend::HomomorphicBackend,
    codec::{PlaintextModulus, Scale},
};
use tracing::{instrument, trace};

/// Which neighbour each kernel tap reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftDirection {
    /// `out[i] += kernel[k] * x[i - k]` (slots rotate right).
    #[default]
    Convolution,
    /// `out[i] += kernel[k] * x[i + k]` (slots rotate left).
    Correlation,
}

/// Slot-wise 1-D convolution built from rotations and masks.
///
/// Tap `k` only contributes to slots in `[k, width - k)`. The mask zeroes the
/// boundary slots so values wrapped around the rotation row never leak into
/// the result, which reproduces zero padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftedConvolution {
    kernel: Vec<i64>,
    width: usize,
    direction: ShiftDirection,
}

impl ShiftedConvolution {
    pub fn new(kernel: Vec<i64>, width: usize, direction: ShiftDirection) -> Result<Self> {
        // With zero width no tap reaches any slot.
        if kernel.is_empty() || width == 0 {
            return Err(ConfigurationError::EmptyKernel.into());
        }
        Ok(Self {
            kernel,
            width,
            direction,
        })
    }

    pub fn kernel(&self) -> &[i64] {
        &self.kernel
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn direction(&self) -> ShiftDirection {
        self.direction
    }

    /// A mask step and a kernel step.
    pub fn required_depth(&self) -> usize {
        2
    }

    /// Slots `[k, width - k)`, empty once `2k >= width`.
    pub fn mask(&self, tap: usize) -> Vec<i128> {
        (0..self.width)
            .map(|i| i128::from(i >= tap && i + tap < self.width))
            .collect()
    }

    /// Rotation offsets whose keys [`evaluate`](Self::evaluate) needs.
    pub fn rotation_offsets(&self) -> Vec<i64> {
        self.active_taps()
            .filter(|&tap| tap > 0)
            .map(|tap| self.offset(tap))
            .collect()
    }

    pub fn validate(
        &self,
        modulus: PlaintextModulus,
        available_depth: usize,
        row_size: usize,
        input_bound: u128,
    ) -> Result<()> {
        if self.width > row_size {
            return Err(ConfigurationError::WidthExceedsRow {
                width: self.width,
                row_size,
            }
            .into());
        }
        check_depth(self.required_depth(), available_depth)?;
        let mut total = 0u128;
        for tap in self.active_taps() {
            let magnitude = input_bound.saturating_mul(self.kernel[tap].unsigned_abs() as u128);
            check_magnitude(magnitude, modulus, format!("tap {tap}"))?;
            total = total.saturating_add(magnitude);
        }
        check_magnitude(total, modulus, "accumulator")?;
        Ok(())
    }

    /// The same masked sum computed in the clear.
    pub fn plain_reference(&self, input: &[i64]) -> Vec<i128> {
        let at = |index: usize| input.get(index).copied().unwrap_or(0) as i128;
        let mut output = vec![0i128; self.width];
        for tap in self.active_taps() {
            let weight = self.kernel[tap] as i128;
            for (i, out) in output.iter_mut().enumerate().take(self.width - tap).skip(tap) {
                let source = match self.direction {
                    ShiftDirection::Convolution => i - tap,
                    ShiftDirection::Correlation => i + tap,
                };
                *out += weight * at(source);
            }
        }
        output
    }

    /// Evaluates the convolution on `input`, whose first `width` slots of
    /// the first row hold the signal.
    #[instrument(skip_all, fields(taps = self.kernel.len(), width = self.width))]
    pub fn evaluate<B: HomomorphicBackend>(
        &self,
        evaluator: &ScaledEvaluator<B>,
        input: &ScaledCiphertext<B::Ciphertext>,
    ) -> Result<ScaledCiphertext<B::Ciphertext>> {
        self.validate(
            evaluator.modulus(),
            evaluator.remaining_depth(input),
            evaluator.backend().row_size(),
            input.bound(),
        )?;

        let mut accumulator: Option<ScaledCiphertext<B::Ciphertext>> = None;
        for tap in self.active_taps() {
            let shifted = evaluator.rotate(input, self.offset(tap))?;
            let mask = self.mask(tap);
            let masked = evaluator.mul_slots(&shifted, &mask, Scale::ONE)?;
            let weights: Vec<i128> = mask.iter().map(|&bit| bit * self.kernel[tap] as i128).collect();
            let weighted = evaluator.mul_slots(&masked, &weights, Scale::ONE)?;
            trace!(tap, offset = self.offset(tap), "accumulated tap");
            accumulator = Some(match accumulator {
                None => weighted,
                Some(sum) => evaluator.add(&sum, &weighted)?,
            });
        }
        Ok(accumulator.ok_or(ConfigurationError::EmptyKernel)?)
    }

    fn active_taps(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.kernel.len()).filter(|&tap| 2 * tap < self.width)
    }

    fn offset(&self, tap: usize) -> i64 {
        match self.direction {
            ShiftDirection::Convolution => -(tap as i64),
            ShiftDirection::Correlation => tap as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, backend::SlotSimulator};

    const INPUT: [i64; 8] = [0, 5, 2, 4, 0, 0, 0, 0];
    const KERNEL: [i64; 3] = [5, 2, 4];

    fn evaluator(slots: usize) -> ScaledEvaluator<SlotSimulator> {
        let modulus = PlaintextModulus::new(65537).unwrap();
        ScaledEvaluator::new(SlotSimulator::new(modulus, slots, 2).unwrap())
    }

    #[test]
    fn plain_reference_in_both_directions() {
        let conv = ShiftedConvolution::new(KERNEL.to_vec(), 8, ShiftDirection::Convolution).unwrap();
        assert_eq!(conv.plain_reference(&INPUT), vec![0, 25, 20, 44, 16, 16, 0, 0]);
        let corr = ShiftedConvolution::new(KERNEL.to_vec(), 8, ShiftDirection::Correlation).unwrap();
        assert_eq!(corr.plain_reference(&INPUT), vec![0, 29, 18, 20, 0, 0, 0, 0]);
    }

    #[test]
    fn masks_and_offsets() {
        let conv = ShiftedConvolution::new(KERNEL.to_vec(), 8, ShiftDirection::Convolution).unwrap();
        assert_eq!(conv.mask(2), vec![0, 0, 1, 1, 1, 1, 0, 0]);
        assert_eq!(conv.rotation_offsets(), vec![-1, -2]);
        let narrow = ShiftedConvolution::new(KERNEL.to_vec(), 3, ShiftDirection::Correlation).unwrap();
        assert_eq!(narrow.rotation_offsets(), vec![1]);
        assert_eq!(
            ShiftedConvolution::new(vec![], 8, ShiftDirection::Convolution).unwrap_err(),
            Error::Configuration(ConfigurationError::EmptyKernel)
        );
    }

    #[test]
    fn simulated_evaluation_is_exact() {
        for direction in [ShiftDirection::Convolution, ShiftDirection::Correlation] {
            let conv = ShiftedConvolution::new(KERNEL.to_vec(), 8, direction).unwrap();
            let mut ev = evaluator(16);
            ev.backend_mut()
                .generate_rotation_keys(&conv.rotation_offsets())
                .unwrap();
            let input: Vec<i128> = INPUT.iter().map(|&v| v as i128).collect();
            let x = ev.encrypt_integers(&input, Scale::ONE).unwrap();
            let out = conv.evaluate(&ev, &x).unwrap();
            assert_eq!(ev.decrypt_integers(&out).unwrap()[..8], conv.plain_reference(&INPUT)[..]);
        }
    }

    #[test]
    fn validation() {
        let conv = ShiftedConvolution::new(KERNEL.to_vec(), 8, ShiftDirection::Convolution).unwrap();
        let modulus = PlaintextModulus::new(65537).unwrap();
        assert!(conv.validate(modulus, 2, 8, 100).is_ok());
        assert_eq!(
            conv.validate(modulus, 2, 4, 100).unwrap_err(),
            Error::Configuration(ConfigurationError::WidthExceedsRow { width: 8, row_size: 4 })
        );
        assert!(matches!(
            conv.validate(modulus, 1, 8, 100),
            Err(Error::Configuration(ConfigurationError::InsufficientDepth { required: 2, .. }))
        ));
        assert!(matches!(
            conv.validate(modulus, 2, 8, 3000),
            Err(Error::Configuration(ConfigurationError::ModulusTooSmall { .. }))
        ));
    }
}
