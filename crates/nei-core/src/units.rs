// nei-core/src/units.rs

use uom::si::f64::{
    ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
    VolumetricNumberDensity as UomVolumetricNumberDensity,
};

// Public canonical unit types (SI, f64)
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;
pub type NumberDensity = UomVolumetricNumberDensity;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

/// Temperature from a thermal energy `k_B T` given in electron-volts.
#[inline]
pub fn ev(v: f64) -> Temperature {
    k(v * constants::KELVIN_PER_EV)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn per_cm3(v: f64) -> NumberDensity {
    use uom::si::volumetric_number_density::per_cubic_centimeter;
    NumberDensity::new::<per_cubic_centimeter>(v)
}

#[inline]
pub fn per_m3(v: f64) -> NumberDensity {
    use uom::si::volumetric_number_density::per_cubic_meter;
    NumberDensity::new::<per_cubic_meter>(v)
}

#[inline]
pub fn to_kelvin(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

#[inline]
pub fn to_seconds(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

/// Number density magnitude in cm⁻³, the unit the rate tables are built for.
#[inline]
pub fn to_per_cm3(n: NumberDensity) -> f64 {
    use uom::si::volumetric_number_density::per_cubic_centimeter;
    n.get::<per_cubic_centimeter>()
}

pub mod constants {
    /// Boltzmann constant expressed as kelvin per electron-volt.
    pub const KELVIN_PER_EV: f64 = 11_604.518_12;

    /// Rydberg energy in electron-volts.
    pub const RYDBERG_EV: f64 = 13.605_693_122;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _t = k(1.0e6);
        let _dt = s(0.1);
        let _n = per_cm3(1.0e9);
        let _n_si = per_m3(1.0e15);
    }

    #[test]
    fn density_units_convert() {
        let n = per_m3(1.0e6);
        assert!((to_per_cm3(n) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn electron_volt_temperature() {
        let t = ev(1.0);
        assert!((to_kelvin(t) - constants::KELVIN_PER_EV).abs() < 1e-9);
    }

    #[test]
    fn accessors_round_trip() {
        assert_eq!(to_kelvin(k(4.0e4)), 4.0e4);
        assert_eq!(to_seconds(s(12.5)), 12.5);
        assert!((to_per_cm3(per_cm3(3.0e8)) / 3.0e8 - 1.0).abs() < 1e-12);
    }
}
