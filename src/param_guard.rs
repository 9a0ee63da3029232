use std::error::Error;

use crate::{dataset::DatasetBase, traits::Fit};

/// Builder-style settings which have to be validated before they reach numeric code.
///
/// Every algorithm crate exposes an unchecked `*Params` type (the builder users mutate) and a
/// `*ValidParams` type holding the same fields once they passed validation. Only the latter
/// implements [`Fit`]; the blanket implementation below makes fitting with the unchecked builder
/// validate first and surface the validation failure through the algorithm's error type.
///
/// ```ignore
/// // an empty step budget never reaches the path builder
/// let err = LarParams::new().max_steps(0).fit(&dataset).unwrap_err();
/// ```
///
/// `check_ref()` and `check()` must apply the same rules.
pub trait ParamGuard {
    /// Settings after validation
    type Checked;
    /// Reason a validation failed
    type Error: Error;

    /// Validates in place, handing out a reference to the validated settings
    fn check_ref(&self) -> Result<&Self::Checked, Self::Error>;

    /// Validates and converts into the validated settings
    fn check(self) -> Result<Self::Checked, Self::Error>;

    /// Validates and panics on invalid settings, meant for tests and examples
    fn check_unwrap(self) -> Self::Checked
    where
        Self: Sized,
    {
        match self.check() {
            Ok(checked) => checked,
            Err(err) => panic!("invalid parameters: {}", err),
        }
    }
}

impl<R, T, E, P: ParamGuard> Fit<R, T, E> for P
where
    P::Checked: Fit<R, T, E>,
    E: Error + From<crate::error::Error> + From<P::Error>,
{
    type Object = <<P as ParamGuard>::Checked as Fit<R, T, E>>::Object;

    fn fit(&self, dataset: &DatasetBase<R, T>) -> Result<Self::Object, E> {
        self.check_ref()?.fit(dataset)
    }
}
