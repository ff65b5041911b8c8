//! sans_reduction — small-angle neutron scattering reduction core with
//! optional Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and, with the `python-bindings`
//! feature, as the PyO3 bridge that exposes the bank merge to Python via the
//! `_sans_reduction` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the reduction modules as the public crate surface:
//!   `workspace` (spectra and profiles), `state` (validated configuration),
//!   `services` (collaborator traits and reference implementations),
//!   `normalization` (monitor normalization), `reduction` (per-bank
//!   pipeline), `centre` (beam-centre search), `merge` (LAB/HAB merge) and
//!   `orchestration` (full requests).
//! - Define the `#[pyclass]` wrapper and `#[pymodule]` initializer of the
//!   `_sans_reduction` Python extension.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input validation and error mapping.
//! - The library emits `tracing` events but never installs a subscriber.
//!
//! Conventions
//! -----------
//! - Lengths in metres, wavelengths in Å, momentum transfer in Å⁻¹, time of
//!   flight in µs.
//! - Errors from core Rust code are propagated as rich error types
//!   internally and converted to `PyErr` values at the PyO3 boundary.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   end-to-end test in `tests/integration_reduction_pipeline.rs`.

pub mod centre;
pub mod fitting;
pub mod merge;
pub mod normalization;
pub mod orchestration;
pub mod reduction;
pub mod services;
pub mod state;
pub mod utils;
pub mod workspace;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    merge::merger::{merge_banks, MergeResult},
    utils::{extract_fit_policy, extract_fit_range, extract_profile},
};

/// MergedProfile — Python-facing result of a LAB/HAB merge.
///
/// Purpose
/// -------
/// Hold a [`MergeResult`] for Python callers and expose the merged profile
/// and the applied bank relation as properties.
///
/// Fields
/// ------
/// - `inner`: [`MergeResult`]
///   Rust-side merge outcome.
///
/// Notes
/// -----
/// - Native Rust code should call [`merge::merge_banks`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "sans_reduction.merge")]
pub struct MergedProfile {
    pub inner: MergeResult,
}

#[cfg(feature = "python-bindings")]
impl MergedProfile {
    fn column(&self, pick: impl Fn(&workspace::spectrum::Histogram) -> Vec<f64>) -> Vec<f64> {
        self.inner.merged.histogram(0).map(pick).unwrap_or_default()
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl MergedProfile {
    #[getter]
    pub fn scale(&self) -> f64 {
        self.inner.scale
    }

    #[getter]
    pub fn shift(&self) -> f64 {
        self.inner.shift
    }

    #[getter]
    pub fn policy(&self) -> String {
        self.inner.policy.to_string()
    }

    #[getter]
    pub fn overlap_bins(&self) -> usize {
        self.inner.overlap_bins
    }

    #[getter]
    pub fn q_edges(&self) -> Vec<f64> {
        self.column(|h| h.x.to_vec())
    }

    #[getter]
    pub fn intensity(&self) -> Vec<f64> {
        self.column(|h| h.y.to_vec())
    }

    #[getter]
    pub fn errors(&self) -> Vec<f64> {
        self.column(|h| h.e.to_vec())
    }
}

/// Merge a LAB and a HAB intensity profile on one Q grid.
///
/// Parameters
/// ----------
/// - `q_edges`: shared bin edges, length `n + 1`.
/// - `lab`, `lab_errors`, `hab`, `hab_errors`: per-bin intensities and
///   uncertainties, length `n`; NaN marks an undefined bin.
/// - `policy`: `"both"` (default), `"no_fit"`, `"shift_only"` or
///   `"scale_only"`; `scale` / `shift` carry the fixed values.
/// - `q_min`, `q_max`: optional fit interval.
///
/// Errors
/// ------
/// - `ValueError` for malformed arrays, unknown policies, missing fixed
///   values and every `MergeError`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "merge_banks",
    signature = (q_edges, lab, lab_errors, hab, hab_errors, policy = None, scale = None, shift = None, q_min = None, q_max = None),
    text_signature = "(q_edges, lab, lab_errors, hab, hab_errors, /, policy=None, scale=None, shift=None, \
                      q_min=None, q_max=None)"
)]
#[allow(clippy::too_many_arguments)]
pub fn py_merge_banks<'py>(
    py: Python<'py>, q_edges: &Bound<'py, PyAny>, lab: &Bound<'py, PyAny>, lab_errors: &Bound<'py, PyAny>,
    hab: &Bound<'py, PyAny>, hab_errors: &Bound<'py, PyAny>, policy: Option<&str>, scale: Option<f64>,
    shift: Option<f64>, q_min: Option<f64>, q_max: Option<f64>,
) -> PyResult<MergedProfile> {
    let lab = extract_profile(py, q_edges, lab, lab_errors)?;
    let hab = extract_profile(py, q_edges, hab, hab_errors)?;
    let policy = extract_fit_policy(policy, scale, shift)?;
    let fit_range = extract_fit_range(q_min, q_max)?;
    let inner = merge_banks(&lab, &hab, policy, fit_range)?;
    Ok(MergedProfile { inner })
}

/// _sans_reduction — PyO3 module initializer for the Python extension.
///
/// Registers the `merge` submodule and makes it importable as
/// `sans_reduction.merge`.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _sans_reduction<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let merge_mod = PyModule::new(_py, "merge")?;
    merge_module(_py, m, &merge_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("sans_reduction.merge", merge_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn merge_module<'py>(
    _py: Python, sans_reduction: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<MergedProfile>()?;
    m.add_function(wrap_pyfunction!(py_merge_banks, m)?)?;
    sans_reduction.add_submodule(m)?;
    Ok(())
}
