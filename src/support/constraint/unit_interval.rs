use std::cmp::Ordering;

use super::{Constrained, Constraint, ConstraintError};

/// Supplies 0 and 1 for types used in unit-interval constraints.
///
/// Implement this trait for your type `T` if you want to use it with
/// `Constrained<T, UnitIntervalLowerOpen>`. Implementations should ensure
/// that `zero() ≤ one()` under the type's `PartialOrd` so the interval is
/// well-formed.
pub trait UnitBounds: PartialOrd {
    fn zero() -> Self;
    fn one() -> Self;
}

impl UnitBounds for f32 {
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
}

impl UnitBounds for f64 {
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
}

/// Marker type enforcing that a value lies in the left-open unit interval: `0 < x ≤ 1`.
///
/// Window proportions use this constraint: a winding that is allotted no span
/// at all cannot hold its turns, so zero is excluded, while a single winding
/// may claim the whole window.
///
/// # Examples
///
/// ```
/// use coil_layout::support::constraint::{Constrained, UnitIntervalLowerOpen};
///
/// let a = Constrained::<_, UnitIntervalLowerOpen>::new(0.25).unwrap();
/// assert_eq!(a.into_inner(), 0.25);
///
/// let b = UnitIntervalLowerOpen::new(1.0).unwrap();
/// assert_eq!(b.as_ref(), &1.0);
///
/// assert!(UnitIntervalLowerOpen::new(0.0).is_err());
/// assert!(UnitIntervalLowerOpen::new(1.5).is_err());
/// assert!(UnitIntervalLowerOpen::new(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitIntervalLowerOpen;

impl UnitIntervalLowerOpen {
    /// Constructs `Constrained<T, UnitIntervalLowerOpen>` if 0 < value ≤ 1.
    ///
    /// # Errors
    ///
    /// Fails if the value is outside the lower-open unit interval:
    ///
    /// - [`ConstraintError::BelowMinimum`] if less than or equal to zero.
    /// - [`ConstraintError::AboveMaximum`] if greater than one.
    /// - [`ConstraintError::NotANumber`] if comparison is undefined (e.g., NaN).
    pub fn new<T: UnitBounds>(
        value: T,
    ) -> Result<Constrained<T, UnitIntervalLowerOpen>, ConstraintError> {
        Constrained::<T, UnitIntervalLowerOpen>::new(value)
    }
}

impl<T: UnitBounds> Constraint<T> for UnitIntervalLowerOpen {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match (value.partial_cmp(&T::zero()), value.partial_cmp(&T::one())) {
            (None, _) | (_, None) => Err(ConstraintError::NotANumber),
            (Some(Ordering::Less | Ordering::Equal), _) => Err(ConstraintError::BelowMinimum),
            (_, Some(Ordering::Greater)) => Err(ConstraintError::AboveMaximum),
            _ => Ok(()),
        }
    }
}
