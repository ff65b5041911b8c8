//! Elastic time-of-flight ↔ wavelength conversion.
//!
//! `λ [Å] = (h / mₙ) · t / L` with `t` in µs and `L` the total flight path in
//! metres, which gives the factor [`TOF_TO_WAVELENGTH`]. Detector pixels use
//! `L = L1 + L2`; upstream monitors (`z < 0`) use `L = L1 + z`.
use crate::{
    services::{
        errors::{UpstreamError, UpstreamResult},
        traits::{ConversionMode, UnitConverter},
    },
    workspace::{
        matrix::Workspace,
        spectrum::{Histogram, Spectrum, SpectrumData},
        units::XUnit,
    },
};

/// `h / mₙ` in Å·m/µs.
pub const TOF_TO_WAVELENGTH: f64 = 0.003_956_034;

/// Total flight path of `spectrum` for a primary path `l1`.
pub fn flight_path(l1: f64, spectrum: &Spectrum) -> f64 {
    let z = spectrum.position[2];
    if z < 0.0 { l1 + z } else { l1 + spectrum.l2() }
}

/// Reference converter handling elastic TOF ↔ wavelength.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElasticConverter;

impl ElasticConverter {
    fn convert_spectrum(
        &self, l1: f64, spectrum: &Spectrum, factor: impl Fn(f64) -> f64,
    ) -> UpstreamResult<Spectrum> {
        let path = flight_path(l1, spectrum);
        if !path.is_finite() || path <= 0.0 {
            return Err(UpstreamError::Conversion {
                detector_id: spectrum.detector_id,
                reason: "flight path must be positive",
            });
        }
        let k = factor(path);
        let data = match &spectrum.data {
            SpectrumData::Histogram(h) => SpectrumData::Histogram(Histogram::with_mask(
                h.x.mapv(|x| x * k),
                h.y.clone(),
                h.e.clone(),
                h.masked.clone(),
            )?),
            SpectrumData::Events(ev) => {
                let mut out = ev.clone();
                out.x.iter_mut().for_each(|x| *x *= k);
                SpectrumData::Events(out)
            }
        };
        Ok(spectrum.with_data(data))
    }
}

impl UnitConverter for ElasticConverter {
    fn convert(
        &self, ws: &Workspace, target: XUnit, mode: ConversionMode, _fixed_energy: Option<f64>,
    ) -> UpstreamResult<Workspace> {
        if ws.unit == target {
            return Ok(ws.clone());
        }
        let factor: fn(f64) -> f64 = match (ws.unit, target, mode) {
            (XUnit::TimeOfFlight, XUnit::Wavelength, ConversionMode::Elastic) => {
                |path| TOF_TO_WAVELENGTH / path
            }
            (XUnit::Wavelength, XUnit::TimeOfFlight, ConversionMode::Elastic) => {
                |path| path / TOF_TO_WAVELENGTH
            }
            (from, to, mode) => {
                return Err(UpstreamError::UnsupportedUnit { from, to, mode: mode.to_string() })
            }
        };
        let spectra = ws
            .spectra
            .iter()
            .map(|s| self.convert_spectrum(ws.l1, s, factor))
            .collect::<UpstreamResult<Vec<_>>>()?;
        Ok(Workspace::new(target, ws.l1, spectra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Verify the TOF → wavelength factor for a pixel and an upstream monitor.
    //
    // Given
    // -----
    // - L1 = 10 m, a pixel at z = 4 m on axis and a monitor at z = -5 m,
    //   both with edges [10000, 20000] µs.
    //
    // Expect
    // ------
    // - Pixel edges scaled by 0.003956034/14, monitor edges by
    //   0.003956034/5; counts unchanged.
    fn tof_to_wavelength_uses_flight_path() {
        let h = Histogram::from_counts(array![10_000.0, 20_000.0], array![7.0]).unwrap();
        let ws = Workspace::new(
            XUnit::TimeOfFlight,
            10.0,
            vec![Spectrum::histogram(1, [0.0, 0.0, 4.0], h.clone()), Spectrum::histogram(2, [0.0, 0.0, -5.0], h)],
        );

        let out = ElasticConverter.convert(&ws, XUnit::Wavelength, ConversionMode::Elastic, None).unwrap();

        assert_eq!(out.unit, XUnit::Wavelength);
        let pixel = out.histogram(0).unwrap();
        assert_relative_eq!(pixel.x[0], 10_000.0 * TOF_TO_WAVELENGTH / 14.0, epsilon = 1e-12);
        assert_eq!(pixel.y[0], 7.0);
        let monitor = out.histogram(1).unwrap();
        assert_relative_eq!(monitor.x[1], 20_000.0 * TOF_TO_WAVELENGTH / 5.0, epsilon = 1e-12);
    }

    #[test]
    fn unsupported_combinations_fail() {
        let ws = Workspace::new(XUnit::TimeOfFlight, 10.0, Vec::new());
        let err = ElasticConverter
            .convert(&ws, XUnit::MomentumTransfer, ConversionMode::Elastic, None)
            .unwrap_err();
        assert!(matches!(err, UpstreamError::UnsupportedUnit { to: XUnit::MomentumTransfer, .. }));
        assert!(ElasticConverter
            .convert(&ws, XUnit::Wavelength, ConversionMode::Direct, Some(25.0))
            .is_err());
    }
}
