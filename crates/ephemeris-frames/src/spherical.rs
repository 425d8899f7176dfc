//! Cartesian ↔ spherical conversion for position vectors.
//!
//! The compute layer reduces every state vector to ecliptic or
//! equatorial angles plus a distance, so the only shape needed here is
//! a longitude/latitude/radius triple with conversions both ways.

/// A position in spherical form: longitude in `[0, 360)` degrees
/// measured in the x-y plane from +x toward +y, latitude in
/// `[-90, 90]` degrees above that plane, radius in km.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalCoords {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub distance_km: f64,
}

impl SphericalCoords {
    /// Reduce a Cartesian vector (km) to spherical form. The zero
    /// vector maps to the origin with both angles zero.
    pub fn from_cartesian(v: &[f64; 3]) -> Self {
        let [x, y, z] = *v;
        let r = (x * x + y * y + z * z).sqrt();
        if r == 0.0 {
            return Self { lon_deg: 0.0, lat_deg: 0.0, distance_km: 0.0 };
        }
        Self {
            lon_deg: y.atan2(x).to_degrees().rem_euclid(360.0),
            lat_deg: (z / r).asin().to_degrees(),
            distance_km: r,
        }
    }

    /// Back to a Cartesian vector in km.
    pub fn to_cartesian(self) -> [f64; 3] {
        let lon = self.lon_deg.to_radians();
        let lat = self.lat_deg.to_radians();
        let in_plane = self.distance_km * lat.cos();
        [in_plane * lon.cos(), in_plane * lon.sin(), self.distance_km * lat.sin()]
    }
}
