//! Density model - water and moist air densities for gravimetric conversion
//!
//! Water density follows Tanaka et al. (2001); moist air density uses the
//! simplified formula of ISO 8655-6 Annex A. Both return g/mL.
//!
//! The formulas are only meaningful inside normal laboratory conditions:
//! water between 0 and 40 °C and ambient air well above absolute zero.
//! Inputs outside that domain still produce a number; callers that need a
//! guard should check [`water_temperature_in_domain`] or the finiteness of
//! [`conversion_factor`].

/// Reference temperature for volumetric glassware (°C)
pub const REFERENCE_TEMPERATURE: f64 = 20.0;

/// Default density of the balance reference weights (g/mL, stainless steel)
pub const DEFAULT_REFERENCE_DENSITY: f64 = 8.0;

/// Offset between Celsius and Kelvin
pub const KELVIN_OFFSET: f64 = 273.15;

/// Lower end of the water density formula's validity range (°C)
pub const WATER_TEMPERATURE_MIN: f64 = 0.0;

/// Upper end of the water density formula's validity range (°C)
pub const WATER_TEMPERATURE_MAX: f64 = 40.0;

// Tanaka et al. coefficients
const TANAKA_A1: f64 = -3.983035;
const TANAKA_A2: f64 = 301.797;
const TANAKA_A3: f64 = 522528.9;
const TANAKA_A4: f64 = 69.34881;
const TANAKA_A5: f64 = 0.99997495;

/// Density of air-free water at `tw` °C (g/mL)
pub fn water_density(tw: f64) -> f64 {
    TANAKA_A5
        * (1.0
            - (tw + TANAKA_A1).powi(2) * (tw + TANAKA_A2)
                / (TANAKA_A3 * (tw + TANAKA_A4)))
}

/// Density of moist air (g/mL)
///
/// * `ta` - ambient temperature in °C
/// * `ua` - relative humidity in %
/// * `pa` - atmospheric pressure in hPa
///
/// Not finite when `ta` is -273.15 °C.
pub fn air_density(ta: f64, ua: f64, pa: f64) -> f64 {
    (1.0 / 1000.0) * (0.34848 * pa - 0.009 * ua * (0.061 * ta).exp()) / (ta + KELVIN_OFFSET)
}

/// Mass-to-volume conversion factor Z (mL/g)
///
/// Combines the water density, air buoyancy on the reference weights and
/// the thermal expansion of the instrument (`alpha`, °C⁻¹) relative to 20 °C.
pub fn conversion_factor(rho_w: f64, rho_a: f64, rho_b: f64, alpha: f64, tw: f64) -> f64 {
    1.0 / (rho_w - rho_a) * (1.0 - rho_a / rho_b) * (1.0 - alpha * (tw - REFERENCE_TEMPERATURE))
}

/// Whether `tw` lies inside the water density formula's domain
pub fn water_temperature_in_domain(tw: f64) -> bool {
    (WATER_TEMPERATURE_MIN..=WATER_TEMPERATURE_MAX).contains(&tw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_water_density_reference_points() {
        // Reference values from the Tanaka table
        assert_abs_diff_eq!(water_density(20.0), 0.998203, epsilon = 1e-5);
        assert_abs_diff_eq!(water_density(25.0), 0.997047, epsilon = 1e-5);
        assert_abs_diff_eq!(water_density(15.0), 0.999103, epsilon = 1e-5);
        assert_abs_diff_eq!(water_density(4.0), 0.999975, epsilon = 1e-5);
    }

    #[test]
    fn test_water_density_maximum_near_4c() {
        let at_max = water_density(3.983035);
        assert!(at_max > water_density(0.0));
        assert!(at_max > water_density(10.0));
        assert_abs_diff_eq!(at_max, 0.99997495, epsilon = 1e-9);
    }

    #[test]
    fn test_air_density_order_of_magnitude() {
        let rho = air_density(20.0, 50.0, 1013.25);
        assert!((rho - 0.0012).abs() / 0.0012 < 0.05, "got {}", rho);
    }

    #[test]
    fn test_air_density_degenerate_temperature() {
        assert!(!air_density(-KELVIN_OFFSET, 50.0, 1013.25).is_finite());
    }

    #[test]
    fn test_conversion_factor_typical() {
        let rho_w = water_density(20.0);
        let rho_a = air_density(20.0, 50.0, 1013.25);
        let z = conversion_factor(rho_w, rho_a, DEFAULT_REFERENCE_DENSITY, 0.0, 20.0);
        // ISO 8655-6 tabulates Z = 1.0029 mL/g at 20 °C, 1013 hPa
        assert_abs_diff_eq!(z, 1.0029, epsilon = 1e-4);
    }

    #[test]
    fn test_expansion_term_vanishes_at_reference() {
        let z0 = conversion_factor(0.998, 0.0012, 8.0, 0.0, 20.0);
        let z1 = conversion_factor(0.998, 0.0012, 8.0, 9.9e-6, 20.0);
        assert_eq!(z0, z1);
    }

    #[test]
    fn test_domain_check() {
        assert!(water_temperature_in_domain(0.0));
        assert!(water_temperature_in_domain(40.0));
        assert!(!water_temperature_in_domain(-0.5));
        assert!(!water_temperature_in_domain(41.0));
    }

    proptest! {
        #[test]
        fn water_density_decreases_above_maximum(t in 4.0f64..39.0) {
            prop_assert!(water_density(t + 0.5) < water_density(t));
        }

        #[test]
        fn water_density_stays_physical(t in 0.0f64..=40.0) {
            let rho = water_density(t);
            prop_assert!(rho > 0.99 && rho < 1.0);
        }
    }
}
