//! ESRI ASCII grid reader.
//!
//! ```text
//! ncols        4
//! nrows        3
//! xllcorner    296000.0
//! yllcorner    131000.0
//! cellsize     1.0
//! NODATA_value -9999
//! 1.0 2.0 3.0 4.0
//! ...
//! ```
//!
//! Non-square cells may be given as a `dx`/`dy` pair in place of
//! `cellsize`, as GDAL writes them.
//!
//! Raw grids carry no CRS; the reader stamps them with the regional
//! projection.

use std::path::Path;

use crate::error::{ViewerError, ViewerResult};
use crate::geometry::projection::REGIONAL_EPSG;
use crate::geometry::BoundingBox;
use crate::raster::Raster;

#[derive(Debug, Default)]
struct GridHeader {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<(f64, bool)>,
    yll: Option<(f64, bool)>,
    cellsize: Option<f64>,
    dx: Option<f64>,
    dy: Option<f64>,
    nodata: Option<f64>,
}

impl GridHeader {
    /// Cell width and height, from `dx`/`dy` or a square `cellsize`.
    fn resolution(&self) -> Result<(f64, f64), String> {
        let (dx, dy) = match (self.dx, self.dy, self.cellsize) {
            (Some(dx), Some(dy), _) => (dx, dy),
            (None, None, Some(size)) => (size, size),
            (Some(_), None, _) => return Err("`dx` given without `dy`".to_string()),
            (None, Some(_), _) => return Err("`dy` given without `dx`".to_string()),
            (None, None, None) => return Err("missing `cellsize`".to_string()),
        };
        for size in [dx, dy] {
            if !(size.is_finite() && size > 0.0) {
                return Err(format!("invalid cellsize {size}"));
            }
        }
        Ok((dx, dy))
    }
}

/// Read an ASCII grid file.
///
/// # Errors
/// Returns an error if the file cannot be read or is malformed.
pub fn read_ascii_grid(path: &Path) -> ViewerResult<Raster> {
    let text = std::fs::read_to_string(path).map_err(|e| ViewerError::io(path, e))?;
    parse_ascii_grid(&text).map_err(|message| ViewerError::Grid {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse ASCII grid text.
///
/// # Errors
/// Returns a description of the first problem found.
pub fn parse_ascii_grid(text: &str) -> Result<Raster, String> {
    let mut header = GridHeader::default();
    let mut lines = text.lines().enumerate().peekable();

    // Header lines start with a keyword; the first numeric line starts the body
    while let Some((_, line)) = lines.peek() {
        let line = line.trim();
        if line.is_empty() {
            lines.next();
            continue;
        }
        let mut parts = line.split_whitespace();
        let Some(key) = parts.next() else { break };
        if !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
            break;
        }
        let value = parts
            .next()
            .ok_or_else(|| format!("header `{key}` has no value"))?;
        apply_header(&mut header, key, value)?;
        lines.next();
    }

    let ncols = header.ncols.ok_or("missing `ncols`")?;
    let nrows = header.nrows.ok_or("missing `nrows`")?;
    let (xll, x_is_center) = header.xll.ok_or("missing `xllcorner`/`xllcenter`")?;
    let (yll, y_is_center) = header.yll.ok_or("missing `yllcorner`/`yllcenter`")?;
    let (dx, dy) = header.resolution()?;

    if ncols == 0 || nrows == 0 {
        return Err(format!("empty grid ({ncols}x{nrows})"));
    }

    let expected = ncols
        .checked_mul(nrows)
        .ok_or_else(|| format!("grid {ncols}x{nrows} is too large"))?;
    // Header sizes are untrusted; every value takes at least two bytes of text
    let mut pixels = Vec::with_capacity(expected.min(text.len() / 2));
    for (line_idx, line) in lines {
        for token in line.split_whitespace() {
            if pixels.len() == expected {
                return Err(format!(
                    "more than {expected} values for a {ncols}x{nrows} grid (line {})",
                    line_idx + 1
                ));
            }
            let value: f32 = token
                .parse()
                .map_err(|_| format!("invalid value `{token}` on line {}", line_idx + 1))?;
            pixels.push(value);
        }
    }
    if pixels.len() != expected {
        return Err(format!(
            "expected {expected} values for a {ncols}x{nrows} grid, found {}",
            pixels.len()
        ));
    }

    let minx = if x_is_center { xll - dx / 2.0 } else { xll };
    let miny = if y_is_center { yll - dy / 2.0 } else { yll };
    // Allow cast precision loss: grid sizes are far below 2^53
    #[allow(clippy::cast_precision_loss)]
    let bounds = BoundingBox::new(
        minx,
        miny,
        minx + dx * ncols as f64,
        miny + dy * nrows as f64,
    );

    Ok(Raster {
        pixels,
        width: ncols,
        height: nrows,
        crs: REGIONAL_EPSG,
        bounds,
        resolution: (dx, dy),
        nodata: header.nodata,
    })
}

fn apply_header(header: &mut GridHeader, key: &str, value: &str) -> Result<(), String> {
    let number = || -> Result<f64, String> {
        value
            .parse::<f64>()
            .map_err(|_| format!("header `{key}` has invalid value `{value}`"))
    };
    let count = || -> Result<usize, String> {
        value
            .parse::<usize>()
            .map_err(|_| format!("header `{key}` has invalid value `{value}`"))
    };

    match key.to_ascii_lowercase().as_str() {
        "ncols" => header.ncols = Some(count()?),
        "nrows" => header.nrows = Some(count()?),
        "xllcorner" => header.xll = Some((number()?, false)),
        "xllcenter" => header.xll = Some((number()?, true)),
        "yllcorner" => header.yll = Some((number()?, false)),
        "yllcenter" => header.yll = Some((number()?, true)),
        "cellsize" => header.cellsize = Some(number()?),
        "dx" => header.dx = Some(number()?),
        "dy" => header.dy = Some(number()?),
        "nodata_value" => header.nodata = Some(number()?),
        other => return Err(format!("unknown header `{other}`")),
    }
    Ok(())
}
