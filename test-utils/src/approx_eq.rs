// Copyright 2023 Xayn AG
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::fmt::Debug;

use float_cmp::{ApproxEq, F32Margin, F64Margin};
use ndarray::{ArrayBase, Data, Dimension};

/// Compares two floats or sequences of floats with approximate equality.
///
/// # Examples
///
/// ```
/// use diversify_test_utils::assert_approx_eq;
/// assert_approx_eq!(f32, 0.150_391_55, 0.150_391_6, ulps = 3);
/// assert_approx_eq!(f64, [0.25, 1.25], vec![0.25, 1.25]);
/// assert_approx_eq!(f64, (1.0, 2.0), [1.0, 2.000_1], epsilon = 1e-3);
/// ```
///
/// The number of `ulps` defaults to `2` and `epsilon` to `0` if not specified. Two NaN values
/// are considered equal, since the assertion checks for an expected outcome.
#[macro_export]
macro_rules! assert_approx_eq {
    ($t:ty, $left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!($t, $left, $right, epsilon = 0., ulps = 2)
    };
    ($t:ty, $left:expr, $right:expr, ulps = $ulps:expr $(,)?) => {
        $crate::assert_approx_eq!($t, $left, $right, epsilon = 0., ulps = $ulps)
    };
    ($t:ty, $left:expr, $right:expr, epsilon = $epsilon:expr $(,)?) => {
        $crate::assert_approx_eq!($t, $left, $right, epsilon = $epsilon, ulps = 2)
    };
    ($t:ty, $left:expr, $right:expr, epsilon = $epsilon:expr, ulps = $ulps:expr $(,)?) => {
        $crate::check_approx_eq::<$t>(
            &$crate::FloatSequence::<$t>::flatten(&$left),
            &$crate::FloatSequence::<$t>::flatten(&$right),
            $epsilon,
            $ulps,
        )
    };
}

/// The float types supported by [`assert_approx_eq!`].
pub trait Float: ApproxEq + Copy + Debug {
    #[doc(hidden)]
    fn margin(epsilon: f64, ulps: i64) -> Self::Margin;

    #[doc(hidden)]
    fn is_nan(self) -> bool;
}

impl Float for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn margin(epsilon: f64, ulps: i64) -> F32Margin {
        F32Margin {
            epsilon: epsilon as f32,
            ulps: ulps as i32,
        }
    }

    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
}

impl Float for f64 {
    fn margin(epsilon: f64, ulps: i64) -> F64Margin {
        F64Margin { epsilon, ulps }
    }

    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }
}

/// Flattens a "thing" into its float values in logical order.
///
/// Only meant as a helper for [`assert_approx_eq!`].
pub trait FloatSequence<T> {
    fn flatten(&self) -> Vec<T>;
}

impl FloatSequence<f32> for f32 {
    fn flatten(&self) -> Vec<f32> {
        vec![*self]
    }
}

impl FloatSequence<f64> for f64 {
    fn flatten(&self) -> Vec<f64> {
        vec![*self]
    }
}

impl<T> FloatSequence<T> for [T]
where
    T: Float,
{
    fn flatten(&self) -> Vec<T> {
        self.to_vec()
    }
}

impl<T, const N: usize> FloatSequence<T> for [T; N]
where
    T: Float,
{
    fn flatten(&self) -> Vec<T> {
        self.to_vec()
    }
}

impl<T> FloatSequence<T> for Vec<T>
where
    T: Float,
{
    fn flatten(&self) -> Vec<T> {
        self.clone()
    }
}

impl<T> FloatSequence<T> for (T, T)
where
    T: Float,
{
    fn flatten(&self) -> Vec<T> {
        vec![self.0, self.1]
    }
}

impl<T, S> FloatSequence<T> for &S
where
    S: FloatSequence<T> + ?Sized,
{
    fn flatten(&self) -> Vec<T> {
        (**self).flatten()
    }
}

impl<T, S, D> FloatSequence<T> for ArrayBase<S, D>
where
    T: Float,
    S: Data<Elem = T>,
    D: Dimension,
{
    fn flatten(&self) -> Vec<T> {
        self.iter().copied().collect()
    }
}

/// Panics if the sequences differ in length or in any value beyond the margin.
#[doc(hidden)]
#[track_caller]
pub fn check_approx_eq<T>(left: &[T], right: &[T], epsilon: f64, ulps: i64)
where
    T: Float,
{
    assert_eq!(
        left.len(),
        right.len(),
        "Approximated equal assertion failed: lengths differ {left:?} != {right:?}",
    );
    for (index, (&l, &r)) in left.iter().zip(right).enumerate() {
        if l.is_nan() && r.is_nan() {
            continue;
        }
        assert!(
            l.approx_eq(r, T::margin(epsilon, ulps)),
            "Approximated equal assertion failed (ulps={ulps:?}, epsilon={epsilon:?}) at index {index}: {l:?} != {r:?}",
        );
    }
}

#[cfg(test)]
mod tests {
    use std::panic::catch_unwind;

    use ndarray::arr1;

    #[test]
    fn test_scalar_ulps() {
        assert_approx_eq!(f32, 0.150_391_55, 0.150_391_6, ulps = 3);
        catch_unwind(|| assert_approx_eq!(f32, 0.150_391_55, 0.150_391_6, ulps = 2)).unwrap_err();
    }

    #[test]
    fn test_sequences() {
        assert_approx_eq!(f32, &[0.25, 1.25], arr1(&[0.25, 1.25]));
        assert_approx_eq!(f64, vec![0.5, 2.], [0.5, 2.]);
        assert_approx_eq!(f64, (0., 0.), [0., 0.]);
        assert_approx_eq!(f32, &0.5_f32, 0.5);
        assert_approx_eq!(f64, &&[1.5], vec![1.5]);
    }

    #[test]
    #[should_panic(expected = "at index 1")]
    fn test_value_mismatch() {
        assert_approx_eq!(f32, &[0.35, 4.35], arr1(&[0.35, 4.45]));
    }

    #[test]
    #[should_panic(expected = "lengths differ")]
    fn test_length_mismatch() {
        assert_approx_eq!(f64, [1., 2., 3.], [1., 2.]);
    }

    #[test]
    fn test_nan_equals_nan() {
        assert_approx_eq!(f32, [3.1, f32::NAN], [3.1, f32::NAN]);
    }

    #[test]
    fn test_epsilon() {
        assert_approx_eq!(f32, 0.125, 0.625, epsilon = 0.5);
        catch_unwind(|| assert_approx_eq!(f32, 0.125, 0.625, epsilon = 0.49)).unwrap_err();
    }
}
