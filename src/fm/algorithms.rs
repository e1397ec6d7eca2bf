//! The eight MA-5 operator algorithms.
//!
//! ```text
//! 0  (FB)1 -> 2
//! 1  (FB)1 + 2
//! 2  (FB)1 + 2 + (FB)3 + 4
//! 3  ((FB)1 + (2 -> 3)) -> 4
//! 4  (FB)1 -> 2 -> 3 -> 4
//! 5  ((FB)1 -> 2) + ((FB)3 -> 4)
//! 6  (FB)1 + (2 -> 3 -> 4)
//! 7  (FB)1 + (2 -> 3) + 4
//! ```

use crate::OPERATOR_COUNT;

pub const NUM_ALGORITHMS: usize = 8;

const IS_MODULATOR: [[bool; OPERATOR_COUNT]; NUM_ALGORITHMS] = [
    [true, false, false, false],
    [false, false, false, false],
    [false, false, false, false],
    [true, true, true, false],
    [true, true, true, false],
    [true, false, true, false],
    [false, true, true, false],
    [false, true, false, false],
];

const IS_CARRIER: [[bool; OPERATOR_COUNT]; NUM_ALGORITHMS] = [
    [false, true, false, false],
    [true, true, false, false],
    [true, true, true, true],
    [false, false, false, true],
    [false, false, false, true],
    [false, true, false, true],
    [true, false, false, true],
    [true, false, true, true],
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    #[default]
    Alg0,
    Alg1,
    Alg2,
    Alg3,
    Alg4,
    Alg5,
    Alg6,
    Alg7,
}

impl<T> From<T> for Algorithm
where
    T: Into<usize>,
{
    fn from(value: T) -> Self {
        match value.into() & 7 {
            1 => Algorithm::Alg1,
            2 => Algorithm::Alg2,
            3 => Algorithm::Alg3,
            4 => Algorithm::Alg4,
            5 => Algorithm::Alg5,
            6 => Algorithm::Alg6,
            7 => Algorithm::Alg7,
            _ => Algorithm::Alg0,
        }
    }
}

impl Algorithm {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether `op` feeds another operator in this algorithm.
    #[inline]
    pub fn is_modulator(self, op: usize) -> bool {
        IS_MODULATOR[self.index()][op]
    }

    /// Whether `op` is mixed into the channel output in this algorithm.
    #[inline]
    pub fn is_carrier(self, op: usize) -> bool {
        IS_CARRIER[self.index()][op]
    }
}
