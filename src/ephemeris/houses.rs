//! House system calculations using Swiss Ephemeris

/// Placidus house system code for Swiss Ephemeris
pub const HOUSE_PLACIDUS: i8 = b'P' as i8;
/// Porphyry, used where Placidus is undefined (polar latitudes)
pub const HOUSE_PORPHYRY: i8 = b'O' as i8;

/// Result of house calculation
#[derive(Debug, Clone)]
pub struct HousePositions {
    pub system: i8,
    /// Ascendant (1st house cusp)
    pub ascendant: f64,
    /// Midheaven (10th house cusp)
    pub midheaven: f64,
    /// House cusps (12 houses, index 0 = 1st house)
    pub cusps: [f64; 12],
}

impl HousePositions {
    /// Shift every longitude by `offset` degrees (e.g. minus the ayanamsa)
    pub fn shifted(&self, offset: f64) -> Self {
        let mut cusps = self.cusps;
        for cusp in cusps.iter_mut() {
            *cusp = (*cusp + offset).rem_euclid(360.0);
        }
        Self {
            system: self.system,
            ascendant: (self.ascendant + offset).rem_euclid(360.0),
            midheaven: (self.midheaven + offset).rem_euclid(360.0),
            cusps,
        }
    }
}

/// Calculate house positions for a given time and location
pub fn calc_houses(
    julian_day: f64,
    latitude: f64,
    longitude: f64,
    house_system: i8,
) -> Result<HousePositions, String> {
    // Swiss Ephemeris uses a 13-element array for cusps (index 1-12)
    // and a 10-element array for special points
    let mut cusps: [f64; 13] = [0.0; 13];
    let mut ascmc: [f64; 10] = [0.0; 10];

    let ret = unsafe {
        libswisseph_sys::swe_houses(
            julian_day,
            latitude,
            longitude,
            house_system as i32,
            cusps.as_mut_ptr(),
            ascmc.as_mut_ptr(),
        )
    };

    if ret < 0 {
        return Err(format!(
            "{} houses undefined at latitude {:.2}",
            house_system_name(house_system),
            latitude
        ));
    }

    let mut house_cusps: [f64; 12] = [0.0; 12];
    house_cusps.copy_from_slice(&cusps[1..13]);

    Ok(HousePositions {
        system: house_system,
        ascendant: ascmc[0],
        midheaven: ascmc[1],
        cusps: house_cusps,
    })
}

/// Placidus, falling back to Porphyry where Placidus has no solution
pub fn calc_houses_with_fallback(
    julian_day: f64,
    latitude: f64,
    longitude: f64,
) -> Result<HousePositions, String> {
    calc_houses(julian_day, latitude, longitude, HOUSE_PLACIDUS).or_else(|err| {
        tracing::debug!(error = %err, "falling back to Porphyry houses");
        calc_houses(julian_day, latitude, longitude, HOUSE_PORPHYRY)
    })
}

/// Determine which house (1-12) a longitude falls in
pub fn planet_in_house(planet_longitude: f64, house_cusps: &[f64; 12]) -> u8 {
    let lon = planet_longitude.rem_euclid(360.0);

    for i in 0..12 {
        let cusp_start = house_cusps[i];
        let cusp_end = house_cusps[(i + 1) % 12];

        let in_house = if cusp_start <= cusp_end {
            lon >= cusp_start && lon < cusp_end
        } else {
            // Wraps through 0° Aries
            lon >= cusp_start || lon < cusp_end
        };

        if in_house {
            return (i + 1) as u8;
        }
    }

    1
}

/// Get house system name from code
pub fn house_system_name(code: i8) -> &'static str {
    match code as u8 as char {
        'P' => "Placidus",
        'O' => "Porphyry",
        _ => "Unknown",
    }
}
