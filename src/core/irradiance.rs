use crate::core::solar::{direct_normal_irradiance, SolarPosition};
use crate::core::units::SOLAR_CONSTANT;

/// Projection of horizontal irradiance measurements onto a tilted module
/// surface: a direct component via the angle of incidence, an anisotropic
/// diffuse sky component (Reindl/HDKR) and a ground-reflected component.
///
/// Surface orientation convention follows the sun-path calculations:
/// azimuth 0 faces south, 90 east, -90 west; tilt is measured from
/// horizontal, 0 flat to 90 vertical.

#[derive(Clone, Copy, Debug, Default)]
pub struct PlaneOfArrayIrradiance {
    pub direct: f64,
    pub diffuse: f64,
    pub ground_reflected: f64,
    pub total: f64,
}

/// Angle of incidence of the solar beam on an inclined surface, determined as
/// a function of the solar hour angle and solar declination.
pub fn angle_of_incidence(
    position: &SolarPosition,
    tilt: f64,
    orientation: f64,
    latitude: f64,
) -> f64 {
    let tilt = tilt.to_radians();
    let orientation = orientation.to_radians();
    let latitude = latitude.to_radians();
    let solar_declination = position.declination.to_radians();
    let solar_hour_angle = position.hour_angle.to_radians();

    (solar_declination.sin() * latitude.sin() * tilt.cos()
        - solar_declination.sin() * latitude.cos() * tilt.sin() * orientation.cos()
        + solar_declination.cos() * latitude.cos() * tilt.cos() * solar_hour_angle.cos()
        + solar_declination.cos()
            * latitude.sin()
            * tilt.sin()
            * orientation.cos()
            * solar_hour_angle.cos()
        + solar_declination.cos() * tilt.sin() * orientation.sin() * solar_hour_angle.sin())
    .acos()
    .to_degrees()
}

/// Total irradiance incident on the tilted surface for one timestep.
///
/// `diffuse_horizontal` and `direct_horizontal` are the decomposed horizontal
/// measurements in W/m2; the direct normal component is derived internally,
/// including the near-horizon substitution.
pub fn plane_of_array_irradiance(
    position: &SolarPosition,
    tilt: f64,
    orientation: f64,
    latitude: f64,
    diffuse_horizontal: f64,
    direct_horizontal: f64,
    albedo: f64,
) -> PlaneOfArrayIrradiance {
    let direct_normal = direct_normal_irradiance(direct_horizontal, position.zenith);
    let cos_incidence = angle_of_incidence(position, tilt, orientation, latitude)
        .to_radians()
        .cos()
        // no backside illumination
        .max(0.);

    let direct = (direct_normal * cos_incidence).max(0.);

    // incidence-weighted solid angle of the circumsolar region as seen by the
    // tilted surface relative to the horizontal, with the denominator kept
    // away from zero near the horizon
    let beam_ratio = cos_incidence
        / position
            .zenith
            .to_radians()
            .cos()
            .max(85f64.to_radians().cos());

    // anisotropy index and horizon brightening factor of the Reindl model;
    // the brightening is the root of the beam share of global horizontal
    let anisotropy_index = (direct_normal / SOLAR_CONSTANT).clamp(0., 1.);
    let global_horizontal = direct_horizontal + diffuse_horizontal;
    let brightening = if global_horizontal > 0. {
        (direct_horizontal / global_horizontal).sqrt()
    } else {
        0.
    };

    let tilt_rad = tilt.to_radians();
    let diffuse = (diffuse_horizontal
        * ((1. - anisotropy_index)
            * ((1. + tilt_rad.cos()) / 2.)
            * (1. + brightening * (tilt_rad / 2.).sin().powi(3))
            + anisotropy_index * beam_ratio))
        .max(0.);

    let onto_ground = diffuse_horizontal + direct_normal * position.altitude.to_radians().sin();
    let ground_reflected = (onto_ground * albedo * ((1. - tilt_rad.cos()) / 2.)).max(0.);

    PlaneOfArrayIrradiance {
        direct,
        diffuse,
        ground_reflected,
        total: direct + diffuse + ground_reflected,
    }
}
