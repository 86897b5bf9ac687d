//! Composite Key Derivation
//!
//! Folds an ordered tuple of heterogeneous configuration attributes (tensor
//! dimensions, strides, paddings, dilations, an element-type tag, ...) into one
//! fixed-width [`CacheKey`].
//!
//! # Algorithm
//!
//! Starting from a seed of zero, every value is mixed into the accumulator
//! left-to-right:
//!
//! ```text
//! seed ^= hash(value) + 0x9e3779b9 + (seed << 6) + (seed >> 2)
//! ```
//!
//! The step is non-commutative: the same attributes in a different order give
//! a different key, so a call site must always pass its attributes in the same
//! order. Sequences hash by folding their own elements with the same step from
//! a zero seed, and that result is then mixed into the parent like any scalar.
//!
//! Scalar hashes come from the [`KeyHash`] trait rather than `core::hash`, so
//! keys are stable across builds, platforms and hasher implementations.
//! Integers hash to their own value, which keeps keys identical to those of
//! embedders using the identity integer hash of common C++ standard libraries.
//!
//! # Example
//!
//! ```rust
//! use autotune_cache::compose_key;
//! use autotune_cache::key::{conv_key, DataType};
//!
//! let x_dims: Vec<i64> = vec![1, 3, 224, 224];
//! let w_dims: Vec<i64> = vec![64, 3, 7, 7];
//! let strides = [2i32, 2];
//! let paddings = [3i32, 3];
//! let dilations = [1i32, 1];
//!
//! let key = conv_key(&x_dims, &w_dims, &strides, &paddings, &dilations, DataType::Float32);
//! assert_eq!(
//!     key,
//!     compose_key!(&x_dims, &w_dims, &strides, &paddings, &dilations, DataType::Float32)
//! );
//! ```

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Fixed-width key identifying one cached configuration.
pub type CacheKey = u64;

/// Additive constant of the combining step (the 32-bit golden ratio).
pub const MIX_CONSTANT: u64 = 0x9e37_79b9;

/// A stable scalar hash used as input to [`hash_combine`].
///
/// Implementations must be pure: equal values always produce the same hash,
/// independent of process, platform or build.
pub trait KeyHash {
    /// Returns the scalar hash of `self`.
    fn key_hash(&self) -> u64;
}

/// Mixes the hash of `value` into `seed`.
#[inline]
pub fn hash_combine<T: KeyHash + ?Sized>(seed: &mut u64, value: &T) {
    let s = *seed;
    *seed = s
        ^ value
            .key_hash()
            .wrapping_add(MIX_CONSTANT)
            .wrapping_add(s << 6)
            .wrapping_add(s >> 2);
}

/// Folds every item of `values` into a key starting from a zero seed.
///
/// Equivalent to `compose_key!` over the items in iteration order.
pub fn compose_key_from<I>(values: I) -> CacheKey
where
    I: IntoIterator,
    I::Item: KeyHash,
{
    let mut seed = 0;
    for value in values {
        hash_combine(&mut seed, &value);
    }
    seed
}

/// Builds a [`CacheKey`] from any number of [`KeyHash`] values.
///
/// Values may be of different types; they are combined left-to-right from a
/// zero seed. `compose_key!()` yields `0`.
///
/// ```rust
/// use autotune_cache::compose_key;
///
/// let a = compose_key!(1i64, 2i64);
/// let b = compose_key!(2i64, 1i64);
/// assert_ne!(a, b);
/// assert_eq!(a, compose_key!(1i64, 2i64));
/// ```
#[macro_export]
macro_rules! compose_key {
    () => {
        0u64
    };
    ($($value:expr),+ $(,)?) => {{
        let mut seed: u64 = 0;
        $(
            $crate::key::hash_combine(&mut seed, &$value);
        )+
        seed
    }};
}

macro_rules! impl_key_hash_unsigned {
    ($($t:ty),*) => {
        $(
            impl KeyHash for $t {
                #[inline]
                fn key_hash(&self) -> u64 {
                    u64::from(*self)
                }
            }
        )*
    };
}

// Signed values are sign-extended to 64 bits before reinterpretation.
macro_rules! impl_key_hash_signed {
    ($($t:ty),*) => {
        $(
            impl KeyHash for $t {
                #[inline]
                fn key_hash(&self) -> u64 {
                    i64::from(*self) as u64
                }
            }
        )*
    };
}

impl_key_hash_unsigned!(u8, u16, u32);
impl_key_hash_signed!(i8, i16, i32, i64);

impl KeyHash for u64 {
    #[inline]
    fn key_hash(&self) -> u64 {
        *self
    }
}

impl KeyHash for usize {
    #[inline]
    fn key_hash(&self) -> u64 {
        *self as u64
    }
}

impl KeyHash for isize {
    #[inline]
    fn key_hash(&self) -> u64 {
        *self as i64 as u64
    }
}

impl KeyHash for u128 {
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn key_hash(&self) -> u64 {
        let mut seed = 0;
        hash_combine(&mut seed, &((*self >> 64) as u64));
        hash_combine(&mut seed, &(*self as u64));
        seed
    }
}

impl KeyHash for i128 {
    #[inline]
    fn key_hash(&self) -> u64 {
        (*self as u128).key_hash()
    }
}

impl KeyHash for bool {
    #[inline]
    fn key_hash(&self) -> u64 {
        u64::from(*self)
    }
}

impl KeyHash for char {
    #[inline]
    fn key_hash(&self) -> u64 {
        u64::from(*self)
    }
}

impl KeyHash for f32 {
    #[inline]
    fn key_hash(&self) -> u64 {
        if *self == 0.0 {
            0
        } else {
            u64::from(self.to_bits())
        }
    }
}

impl KeyHash for f64 {
    #[inline]
    fn key_hash(&self) -> u64 {
        if *self == 0.0 {
            0
        } else {
            self.to_bits()
        }
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl KeyHash for str {
    fn key_hash(&self) -> u64 {
        self.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
    }
}

impl KeyHash for String {
    #[inline]
    fn key_hash(&self) -> u64 {
        self.as_str().key_hash()
    }
}

impl<T: KeyHash> KeyHash for [T] {
    fn key_hash(&self) -> u64 {
        let mut seed = 0;
        for value in self {
            hash_combine(&mut seed, value);
        }
        seed
    }
}

impl<T: KeyHash, const N: usize> KeyHash for [T; N] {
    #[inline]
    fn key_hash(&self) -> u64 {
        self.as_slice().key_hash()
    }
}

impl<T: KeyHash> KeyHash for Vec<T> {
    #[inline]
    fn key_hash(&self) -> u64 {
        self.as_slice().key_hash()
    }
}

impl<T: KeyHash + ?Sized> KeyHash for &T {
    #[inline]
    fn key_hash(&self) -> u64 {
        (**self).key_hash()
    }
}

impl<T: KeyHash + ?Sized> KeyHash for Box<T> {
    #[inline]
    fn key_hash(&self) -> u64 {
        (**self).key_hash()
    }
}

/// Element type of the tensors an algorithm operates on.
///
/// Part of most algorithm keys: the best kernel for `float16` is rarely the
/// best one for `float32`. The discriminants are fixed and form the key hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DataType {
    /// Unknown or unset element type.
    Undefined = 0,
    /// Boolean.
    Bool = 1,
    /// Unsigned 8-bit integer.
    UInt8 = 2,
    /// Signed 8-bit integer.
    Int8 = 3,
    /// Unsigned 16-bit integer.
    UInt16 = 4,
    /// Signed 16-bit integer.
    Int16 = 5,
    /// Unsigned 32-bit integer.
    UInt32 = 6,
    /// Signed 32-bit integer.
    Int32 = 7,
    /// Unsigned 64-bit integer.
    UInt64 = 8,
    /// Signed 64-bit integer.
    Int64 = 9,
    /// IEEE 754 single precision.
    Float32 = 10,
    /// IEEE 754 double precision.
    Float64 = 11,
    /// Complex number of two `Float32`.
    Complex64 = 12,
    /// Complex number of two `Float64`.
    Complex128 = 13,
    /// IEEE 754 half precision.
    Float16 = 15,
    /// Brain floating point.
    BFloat16 = 16,
}

impl DataType {
    /// Lowercase name of the type, as used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Undefined => "undefined",
            DataType::Bool => "bool",
            DataType::UInt8 => "uint8",
            DataType::Int8 => "int8",
            DataType::UInt16 => "uint16",
            DataType::Int16 => "int16",
            DataType::UInt32 => "uint32",
            DataType::Int32 => "int32",
            DataType::UInt64 => "uint64",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Complex64 => "complex64",
            DataType::Complex128 => "complex128",
            DataType::Float16 => "float16",
            DataType::BFloat16 => "bfloat16",
        }
    }
}

impl KeyHash for DataType {
    #[inline]
    fn key_hash(&self) -> u64 {
        *self as u8 as u64
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key of a convolution configuration.
///
/// Combines input and filter shapes, strides, paddings, dilations and the
/// element type, in that order.
pub fn conv_key(
    x_dims: &[i64],
    w_dims: &[i64],
    strides: &[i32],
    paddings: &[i32],
    dilations: &[i32],
    dtype: DataType,
) -> CacheKey {
    crate::compose_key!(x_dims, w_dims, strides, paddings, dilations, dtype)
}
