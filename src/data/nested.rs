use ndarray::{ArrayViewD, Axis};

use super::error::{LoadError, LoadResult};

/// Strip `levels` single-element wrapper axes from `value` and return the
/// 0-d element left at the bottom.
///
/// Upstream exports store scalars as nested one-element containers
/// (`[[128.0]]`, `[['Fp1']]`). Every level must hold exactly one element and
/// nothing may remain after the last level; anything else is a format error
/// naming `what`.
pub fn unwrap_scalar<T: Clone>(value: ArrayViewD<'_, T>, levels: usize, what: &str) -> LoadResult<T> {
    let mut current = value;
    for level in 0..levels {
        if current.ndim() == 0 {
            return Err(LoadError::format(format!(
                "{what}: expected {levels} levels of nesting, found {level}"
            )));
        }
        let len = current.len_of(Axis(0));
        if len != 1 {
            return Err(LoadError::format(format!(
                "{what}: nesting level {level} holds {len} elements, expected exactly one"
            )));
        }
        current = current.index_axis_move(Axis(0), 0);
    }
    if current.ndim() != 0 {
        return Err(LoadError::format(format!(
            "{what}: {} nesting levels remain after unwrapping {levels}, expected a scalar",
            current.ndim()
        )));
    }
    current
        .first()
        .cloned()
        .ok_or_else(|| LoadError::format(format!("{what}: no scalar found")))
}

#[cfg(test)]
mod tests {
    use ndarray::{arr0, ArrayD, IxDyn};

    use super::*;
    use crate::data::error::ErrorKind;

    #[test]
    fn unwraps_two_levels() {
        let label = ArrayD::from_shape_vec(IxDyn(&[1, 1]), vec!["Cz".to_string()]).unwrap();
        assert_eq!(unwrap_scalar(label.view(), 2, "label").unwrap(), "Cz");
    }

    #[test]
    fn zero_levels_takes_a_bare_scalar() {
        let rate = arr0(250.0).into_dyn();
        assert_eq!(unwrap_scalar(rate.view(), 0, "fs").unwrap(), 250.0);
    }

    #[test]
    fn wrapper_with_two_elements_fails() {
        let rate = ArrayD::from_shape_vec(IxDyn(&[1, 2]), vec![128.0, 256.0]).unwrap();
        let err = unwrap_scalar(rate.view(), 2, "fs").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("level 1 holds 2 elements"));
    }

    #[test]
    fn too_shallow_fails() {
        let rate = ArrayD::from_shape_vec(IxDyn(&[1]), vec![128.0]).unwrap();
        let err = unwrap_scalar(rate.view(), 2, "fs").unwrap_err();
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn leftover_axes_fail() {
        let label =
            ArrayD::from_shape_vec(IxDyn(&[1, 1, 1]), vec!["Fp1".to_string()]).unwrap();
        let err = unwrap_scalar(label.view(), 2, "label[0]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().starts_with("format error: label[0]"));
    }
}
