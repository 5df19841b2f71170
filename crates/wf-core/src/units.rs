// wf-core/src/units.rs

use uom::si::f64::{
    Energy as UomEnergy, MassDensity as UomMassDensity, MassRate as UomMassRate,
    Power as UomPower, Pressure as UomPressure, Ratio as UomRatio, Time as UomTime,
    Volume as UomVolume, VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type Density = UomMassDensity;
pub type Energy = UomEnergy;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Pressure = UomPressure;
pub type Ratio = UomRatio;
pub type Time = UomTime;
pub type Volume = UomVolume;
pub type VolumeRate = UomVolumeRate;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn m3ps(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_second;
    VolumeRate::new::<cubic_meter_per_second>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn watt(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

pub mod constants {
    use super::*;

    /// Density of water assumed by the zero-order property model.
    pub const WATER_DENSITY_KG_M3: f64 = 1000.0;

    /// Standard atmosphere.
    pub const P_ATM_PA: f64 = 101_325.0;

    #[inline]
    pub fn water_density() -> Density {
        kg_per_m3(WATER_DENSITY_KG_M3)
    }

    /// Seconds in one operating year (365 d).
    pub fn seconds_per_year() -> f64 {
        use uom::si::time::{day, second};
        Time::new::<day>(365.0).get::<second>()
    }

    /// Joules in one kilowatt-hour.
    pub fn joules_per_kwh() -> f64 {
        use uom::si::energy::{joule, kilowatt_hour};
        Energy::new::<kilowatt_hour>(1.0).get::<joule>()
    }

    /// Seconds in one hour; converts kWh/m3 intensities against m3/s flows.
    pub fn seconds_per_hour() -> f64 {
        use uom::si::time::{hour, second};
        Time::new::<hour>(1.0).get::<second>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _b = bar(65.0);
        let _mdot = kgps(1.2);
        let _q = m3ps(0.014);
        let _w = watt(10.0);
        let _dt = s(0.1);
        let _r = unitless(0.5);
        let _rho = constants::water_density();
    }

    #[test]
    fn bar_is_1e5_pa() {
        use uom::si::pressure::pascal;
        assert!((bar(1.0).get::<pascal>() - 1e5).abs() < 1e-9);
    }

    #[test]
    fn conversion_constants() {
        assert!((constants::seconds_per_year() - 31_536_000.0).abs() < 1e-6);
        assert!((constants::joules_per_kwh() - 3.6e6).abs() < 1e-6);
        assert!((constants::seconds_per_hour() - 3600.0).abs() < 1e-9);
    }
}
