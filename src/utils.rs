#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    state::options::{FitPolicy, QRange},
    workspace::spectrum::Histogram,
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

#[cfg(feature = "python-bindings")]
fn extract_vec<'py>(py: Python<'py>, raw: &Bound<'py, PyAny>, name: &str) -> PyResult<Array1<f64>> {
    let arr = extract_f64_array(py, raw)?;
    let slice = arr.as_slice().map_err(|_| {
        PyValueError::new_err(format!("{name} must be a 1-D contiguous float64 array or sequence"))
    })?;
    Ok(Array1::from(slice.to_vec()))
}

/// Build an intensity profile from Python arrays of bin edges, values and
/// uncertainties. NaN values mark undefined bins.
#[cfg(feature = "python-bindings")]
pub fn extract_profile<'py>(
    py: Python<'py>, q_edges: &Bound<'py, PyAny>, intensity: &Bound<'py, PyAny>,
    errors: &Bound<'py, PyAny>,
) -> PyResult<Histogram> {
    let x = extract_vec(py, q_edges, "q_edges")?;
    let y = extract_vec(py, intensity, "intensity")?;
    let e = extract_vec(py, errors, "errors")?;
    Histogram::new(x, y, e).map_err(|err| PyValueError::new_err(err.to_string()))
}

/// Map a policy name and its fixed values onto [`FitPolicy`].
#[cfg(feature = "python-bindings")]
pub fn extract_fit_policy(policy: Option<&str>, scale: Option<f64>, shift: Option<f64>) -> PyResult<FitPolicy> {
    let required = |value: Option<f64>, name: &str, policy: &str| {
        value.ok_or_else(|| PyValueError::new_err(format!("{name} must be provided when policy='{policy}'")))
    };
    let policy_str = policy.unwrap_or("both").to_lowercase();
    let fit = match policy_str.as_str() {
        "both" => FitPolicy::Both,
        "none" | "no_fit" => FitPolicy::NoFit {
            scale: required(scale, "scale", "no_fit")?,
            shift: required(shift, "shift", "no_fit")?,
        },
        "shift_only" | "shift" => FitPolicy::ShiftOnly { scale: required(scale, "scale", "shift_only")? },
        "scale_only" | "scale" => FitPolicy::ScaleOnly { shift: required(shift, "shift", "scale_only")? },
        other => {
            return Err(PyValueError::new_err(format!(
                "invalid fit policy {:?} (expected 'both', 'no_fit', 'shift_only', or 'scale_only')",
                other
            )));
        }
    };
    Ok(fit)
}

/// Optional Q interval from its two bounds; both or neither must be given.
#[cfg(feature = "python-bindings")]
pub fn extract_fit_range(q_min: Option<f64>, q_max: Option<f64>) -> PyResult<Option<QRange>> {
    match (q_min, q_max) {
        (None, None) => Ok(None),
        (Some(min), Some(max)) if min < max => Ok(Some(QRange { min, max })),
        (Some(min), Some(max)) => {
            Err(PyValueError::new_err(format!("fit range must satisfy q_min < q_max, got {min} >= {max}")))
        }
        _ => Err(PyValueError::new_err("q_min and q_max must be given together")),
    }
}
