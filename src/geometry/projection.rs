//! Coordinate reference resolution.
//!
//! All derived geometry uses one fixed regional projection: a Lambert
//! Conformal Conic on GRS80 matching NAD83 / Washington North. Rasters are
//! stamped with the custom PROJ definition and its registered equivalent,
//! [`REGIONAL_EPSG`], so that readers without the custom string still resolve
//! the CRS.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

/// EPSG code of the registered equivalent of [`REGIONAL_PROJ`].
pub const REGIONAL_EPSG: i32 = 32148;

/// EPSG code for geographic WGS84 coordinates (point tables).
pub const WGS84_EPSG: i32 = 4326;

/// Custom PROJ definition of the regional projection.
pub const REGIONAL_PROJ: &str = "+proj=lcc +lat_1=47.5 +lat_2=48.73333333333333 \
+lon_0=-120.8333333333333 +lat_0=47.0 +x_0=500000.0 +y_0=0.0 \
+ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs";

const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Project a point from one EPSG CRS to another using proj4rs + crs-definitions.
///
/// The regional EPSG code resolves to [`REGIONAL_PROJ`] even when the
/// crs-definitions database would give a slightly different spelling.
///
/// # Errors
/// Returns an error if an EPSG code is unknown or the transformation fails.
#[inline]
pub fn project_point(source_epsg: i32, target_epsg: i32, x: f64, y: f64) -> Result<(f64, f64), String> {
    if source_epsg == target_epsg {
        return Ok((x, y));
    }

    let source_str = resolve_proj_string(source_epsg)
        .ok_or_else(|| format!("EPSG:{source_epsg} is not in the crs-definitions database"))?;
    let target_str = resolve_proj_string(target_epsg)
        .ok_or_else(|| format!("EPSG:{target_epsg} is not in the crs-definitions database"))?;

    project_with_proj_strings(
        source_str,
        is_geographic_crs(source_epsg),
        target_str,
        is_geographic_crs(target_epsg),
        x,
        y,
    )
}

/// Regional projected metres to WGS84 longitude/latitude.
///
/// # Errors
/// Returns an error if the inverse projection fails.
pub fn regional_to_lon_lat(x: f64, y: f64) -> Result<(f64, f64), String> {
    project_with_proj_strings(REGIONAL_PROJ, false, WGS84_PROJ, true, x, y)
}

/// WGS84 longitude/latitude to regional projected metres.
///
/// # Errors
/// Returns an error if the projection fails.
pub fn lon_lat_to_regional(lon: f64, lat: f64) -> Result<(f64, f64), String> {
    project_with_proj_strings(WGS84_PROJ, true, REGIONAL_PROJ, false, lon, lat)
}

/// Get the PROJ4 string for an EPSG code from the crs-definitions database.
#[inline]
#[must_use]
pub fn get_proj_string(epsg: i32) -> Option<&'static str> {
    u16::try_from(epsg)
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
}

fn resolve_proj_string(epsg: i32) -> Option<&'static str> {
    if epsg == REGIONAL_EPSG {
        Some(REGIONAL_PROJ)
    } else {
        get_proj_string(epsg)
    }
}

/// Check if an EPSG code represents a geographic (lon/lat) CRS.
#[inline]
#[must_use]
pub fn is_geographic_crs(epsg: i32) -> bool {
    if epsg == REGIONAL_EPSG {
        return false;
    }
    if let Some(proj_str) = get_proj_string(epsg) {
        proj_str.contains("+proj=longlat")
    } else {
        epsg == WGS84_EPSG || (4000..5000).contains(&epsg)
    }
}

fn project_with_proj_strings(
    source: &str,
    source_is_geographic: bool,
    target: &str,
    target_is_geographic: bool,
    x: f64,
    y: f64,
) -> Result<(f64, f64), String> {
    let source_proj =
        Proj::from_proj_string(source).map_err(|e| format!("Invalid source projection `{source}`: {e:?}"))?;
    let target_proj =
        Proj::from_proj_string(target).map_err(|e| format!("Invalid target projection `{target}`: {e:?}"))?;

    // proj4rs uses radians for geographic coordinates
    let mut point = if source_is_geographic {
        (x.to_radians(), y.to_radians(), 0.0)
    } else {
        (x, y, 0.0)
    };

    transform(&source_proj, &target_proj, &mut point).map_err(|e| format!("Transform failed: {e:?}"))?;

    if target_is_geographic {
        Ok((point.0.to_degrees(), point.1.to_degrees()))
    } else {
        Ok((point.0, point.1))
    }
}
