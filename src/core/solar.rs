use crate::core::units::{DAYS_PER_YEAR, MINUTES_PER_HOUR, SECONDS_PER_HOUR};
use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike};

/// Sun-path calculations needed to project irradiance onto a tilted module.
///
/// All angles are degrees unless noted otherwise. The solar position is
/// evaluated per timestamp from the day of the year and the local clock time;
/// for coarse series the position is averaged over sub-hourly samples within
/// the step so that an hourly irradiance value is paired with the mean sun
/// angles of that hour rather than a single instant.

/// Zenith angle above which direct normal irradiance is no longer derived by
/// dividing by cos(zenith). Near the horizon that division blows up on tiny
/// angle errors, so the direct horizontal value is substituted unchanged.
pub const ZENITH_SUBSTITUTION_LIMIT: f64 = 88.;

/// Interval between sun-angle samples when averaging over a series step.
const SAMPLE_MINUTES: i64 = 10;

#[derive(Clone, Copy, Debug)]
pub struct SolarPosition {
    /// Angular position of the sun at solar noon with respect to the equator.
    pub declination: f64,
    /// Hour angle, positive before solar noon, negative after.
    pub hour_angle: f64,
    /// Solar altitude (elevation), clipped into [0, 90].
    pub altitude: f64,
    /// Solar zenith angle, complement of the altitude.
    pub zenith: f64,
}

/// Sun position for a single instant.
pub fn solar_position(
    timestamp: DateTime<FixedOffset>,
    latitude: f64,
    longitude: f64,
) -> SolarPosition {
    let day_of_year = timestamp.ordinal();
    let declination = solar_declination(earth_orbit_deviation(day_of_year));
    let clock_hour = timestamp.hour() as f64
        + timestamp.minute() as f64 / MINUTES_PER_HOUR as f64
        + timestamp.second() as f64 / SECONDS_PER_HOUR as f64;
    let utc_offset_hours = timestamp.offset().local_minus_utc() as f64 / SECONDS_PER_HOUR as f64;
    let solar_time = clock_hour
        - equation_of_time(day_of_year) / MINUTES_PER_HOUR as f64
        - time_shift(utc_offset_hours, longitude);
    let hour_angle = solar_hour_angle(solar_time);
    let altitude = solar_altitude(latitude, declination, hour_angle);

    SolarPosition {
        declination,
        hour_angle,
        altitude,
        zenith: 90. - altitude,
    }
}

/// Mean sun position over one series step starting at `timestamp`.
///
/// Steps of half an hour or less are represented by their midpoint; longer
/// steps are sampled every ten minutes and the sun angles averaged.
pub fn averaged_solar_position(
    timestamp: DateTime<FixedOffset>,
    step: Duration,
    latitude: f64,
    longitude: f64,
) -> SolarPosition {
    if step <= Duration::minutes(30) {
        return solar_position(timestamp + step / 2, latitude, longitude);
    }

    let samples = (step.num_minutes() / SAMPLE_MINUTES).max(1);
    let sample_step = step / samples as i32;
    let positions = (0..samples)
        .map(|i| {
            solar_position(
                timestamp + sample_step * i as i32 + sample_step / 2,
                latitude,
                longitude,
            )
        })
        .collect::<Vec<_>>();

    let n = positions.len() as f64;
    let altitude = positions.iter().map(|p| p.altitude).sum::<f64>() / n;
    SolarPosition {
        declination: positions.iter().map(|p| p.declination).sum::<f64>() / n,
        hour_angle: positions.iter().map(|p| p.hour_angle).sum::<f64>() / n,
        altitude,
        zenith: 90. - altitude,
    }
}

/// Derives direct normal irradiance from direct irradiance on the horizontal
/// plane. Beyond [`ZENITH_SUBSTITUTION_LIMIT`] the horizontal value is passed
/// through unchanged.
pub fn direct_normal_irradiance(direct_horizontal: f64, zenith: f64) -> f64 {
    if zenith > ZENITH_SUBSTITUTION_LIMIT {
        direct_horizontal
    } else {
        direct_horizontal / zenith.to_radians().cos()
    }
}

/// Projects direct normal irradiance back onto the horizontal plane.
pub fn direct_horizontal_irradiance(direct_normal: f64, zenith: f64) -> f64 {
    (direct_normal * zenith.to_radians().cos()).max(0.)
}

fn earth_orbit_deviation(day_of_year: u32) -> f64 {
    (360. / DAYS_PER_YEAR as f64) * day_of_year as f64
}

fn solar_declination(earth_orbit_deviation: f64) -> f64 {
    let earth_orbit_deviation = earth_orbit_deviation.to_radians();

    0.33281 - 22.984 * earth_orbit_deviation.cos()
        - 0.3499 * (2. * earth_orbit_deviation).cos()
        - 0.1398 * (3. * earth_orbit_deviation).cos()
        + 3.7872 * earth_orbit_deviation.sin()
        + 0.03205 * (2. * earth_orbit_deviation).sin()
        + 0.07187 * (3. * earth_orbit_deviation).sin()
}

/// Equation of time in minutes for a 1-indexed day of the year.
fn equation_of_time(day_of_year: u32) -> f64 {
    let nday = day_of_year as i32;
    match nday {
        _ if nday < 21 => 2.6 + 0.44 * nday as f64,
        _ if nday < 136 => 5.2 + 9. * ((nday - 43) as f64 * 0.0357).cos(),
        _ if nday < 241 => 1.4 - 5. * ((nday - 135) as f64 * 0.0449).cos(),
        _ if nday < 336 => -6.3 - 10. * ((nday - 306) as f64 * 0.036).cos(),
        _ => 0.45 * (nday - 359) as f64,
    }
}

/// Shift in hours between clock time and solar time caused by the offset of
/// the location from the timezone meridian.
fn time_shift(utc_offset_hours: f64, longitude: f64) -> f64 {
    utc_offset_hours - longitude / 15.
}

fn solar_hour_angle(solar_time: f64) -> f64 {
    let mut angle = (180 / 12) as f64 * (12. - solar_time);

    if angle > 180. {
        angle -= 360.;
    } else if angle < -180. {
        angle += 360.;
    }

    angle
}

/// Angle between the solar beam and the horizontal surface, clipped into
/// [0, 90] so that geometry below the horizon never enters the irradiance
/// calculations.
fn solar_altitude(latitude: f64, solar_declination: f64, solar_hour_angle: f64) -> f64 {
    let latitude = latitude.to_radians();
    let solar_declination = solar_declination.to_radians();
    let solar_hour_angle = solar_hour_angle.to_radians();

    let asol = (solar_declination.sin() * latitude.sin()
        + solar_declination.cos() * latitude.cos() * solar_hour_angle.cos())
    .asin()
    .to_degrees();

    asol.clamp(0., 90.)
}
