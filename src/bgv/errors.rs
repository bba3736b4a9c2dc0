use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RnsError {
    #[error("ring degree must be a power of two, got {degree}")]
    InvalidDegree { degree: usize },
    #[error("RNS basis must contain at least one modulus")]
    EmptyBasis,
    #[error("modulus {modulus} is not NTT-friendly for degree {degree}")]
    NonNttFriendlyModulus { modulus: u64, degree: usize },
    #[error("modulus {modulus} appears more than once in the basis")]
    DuplicateModulus { modulus: u64 },
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },
    #[error("channel length mismatch: expected {expected}, got {actual}")]
    ChannelLengthMismatch { expected: usize, actual: usize },
    #[error("coefficient {coefficient} is not reduced modulo {modulus}")]
    NonReducedCoefficient { coefficient: u64, modulus: u64 },
    #[error("ciphertext modulus of {bits} bits exceeds the {limit}-bit reconstruction limit")]
    ModulusTooLarge { bits: u32, limit: u32 },
}

pub type RnsResult<T> = Result<T, RnsError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BgvError {
    #[error("ring dimension must be a power of two >= 8, got {0}")]
    InvalidRingDimension(usize),
    #[error("invalid plaintext modulus {0}")]
    InvalidPlaintextModulus(u64),
    #[error("plaintext modulus {modulus} does not support packing for ring dimension {ring_degree}")]
    NotBatchFriendly { modulus: u64, ring_degree: usize },
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },
    #[error(
        "ring dimension {ring_degree} with a {modulus_bits}-bit modulus exceeds the \
         128-bit security bound of {max_bits} bits"
    )]
    InsecureParameters {
        ring_degree: usize,
        modulus_bits: u32,
        max_bits: u32,
    },
    #[error("slot value {value} is not reduced modulo {modulus}")]
    ValueNotReduced { value: u64, modulus: u64 },
    #[error("{given} values exceed the {slots} available slots")]
    TooManySlots { given: usize, slots: usize },
    #[error("multiplicative depth exhausted: level {required} exceeds maximum {max_depth}")]
    DepthExhausted { required: usize, max_depth: usize },
    #[error("noise estimate of {noise_bits:.1} bits exceeds the {budget_bits:.1}-bit budget")]
    NoiseBudgetExhausted { noise_bits: f64, budget_bits: f64 },
    #[error("no relinearization key has been generated")]
    MissingRelinearizationKey,
    #[error("no rotation key for offset {offset}")]
    MissingRotationKey { offset: i64 },
    #[error("no key pair has been generated")]
    MissingKeys,
    #[error("operands belong to different contexts")]
    ContextMismatch,
    #[error(transparent)]
    Rns(#[from] RnsError),
}

pub type BgvResult<T> = Result<T, BgvError>;
