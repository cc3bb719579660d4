// bf-core/src/units.rs

use uom::si::f64::{Length as UomLength, Ratio as UomRatio, Velocity as UomVelocity};

// Physical inputs of a case (SI, f64)
pub type Length = UomLength;
pub type Ratio = UomRatio;
pub type Velocity = UomVelocity;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

/// Kinematic viscosity (m^2/s) that yields `reynolds` for a flow of speed
/// `velocity` over length `length`: nu = V*L/Re.
pub fn kinematic_viscosity_for(velocity: Velocity, length: Length, reynolds: Ratio) -> f64 {
    use uom::si::length::meter;
    use uom::si::ratio::ratio;
    use uom::si::velocity::meter_per_second;
    velocity.get::<meter_per_second>() * length.get::<meter>() / reynolds.get::<ratio>()
}
