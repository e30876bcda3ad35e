//! GeoTIFF reader for raster artifacts.
//!
//! Reads back what [`crate::geotiff_writer`] produces: the first band of a
//! single-image TIFF, georeferenced through ModelPixelScale + ModelTiepoint,
//! with the CRS taken from the GeoKey directory.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use crate::error::{ViewerError, ViewerResult};
use crate::geometry::projection::REGIONAL_EPSG;
use crate::geometry::BoundingBox;
use crate::geotiff_writer::{
    GDAL_NODATA, GEOGRAPHIC_TYPE_GEO_KEY, GEOTIFF_GEOKEYDIRECTORY, GEOTIFF_MODELPIXELSCALE,
    GEOTIFF_MODELTIEPOINT, PROJECTED_CS_TYPE_GEO_KEY,
};
use crate::raster::Raster;

/// Read a GeoTIFF file into a [`Raster`].
///
/// # Errors
/// Returns an error if the file cannot be opened or lacks georeferencing.
pub fn read_geotiff(path: &Path) -> ViewerResult<Raster> {
    let file = File::open(path).map_err(|e| ViewerError::io(path, e))?;
    decode_geotiff(BufReader::new(file)).map_err(|message| ViewerError::GeoTiffRead {
        path: path.to_path_buf(),
        message,
    })
}

/// Decode GeoTIFF bytes from any seekable reader.
///
/// # Errors
/// Returns a description of the first problem found.
pub fn decode_geotiff<R: Read + Seek>(reader: R) -> Result<Raster, String> {
    let mut decoder = Decoder::new(reader).map_err(|e| format!("Failed to create TIFF decoder: {e}"))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| format!("Failed to get image dimensions: {e}"))?;
    let (width, height) = (width as usize, height as usize);

    let scale = read_f64_tag(&mut decoder, GEOTIFF_MODELPIXELSCALE)?
        .ok_or("missing ModelPixelScale tag")?;
    let tiepoint = read_f64_tag(&mut decoder, GEOTIFF_MODELTIEPOINT)?
        .ok_or("missing ModelTiepoint tag")?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err("truncated georeferencing tags".to_string());
    }

    let crs = read_crs(&mut decoder)?.unwrap_or(REGIONAL_EPSG);
    let nodata = read_nodata(&mut decoder)?;

    let image = decoder
        .read_image()
        .map_err(|e| format!("Failed to read image: {e}"))?;
    let samples = to_f32(image);
    let expected = width * height;
    if samples.len() < expected {
        return Err(format!(
            "image holds {} samples, expected at least {expected}",
            samples.len()
        ));
    }
    // Multi-band images are interleaved; keep the first band
    let bands = samples.len() / expected;
    let pixels = if bands > 1 {
        samples.iter().step_by(bands).copied().collect()
    } else {
        samples
    };

    // Tiepoint (i, j, k, x, y, z) maps pixel (i, j) to world (x, y)
    let (res_x, res_y) = (scale[0], scale[1]);
    let minx = tiepoint[3] - tiepoint[0] * res_x;
    let maxy = tiepoint[4] + tiepoint[1] * res_y;
    // Allow cast precision loss: raster extents only need f64 precision
    #[allow(clippy::cast_precision_loss)]
    let bounds = BoundingBox::new(
        minx,
        maxy - res_y * height as f64,
        minx + res_x * width as f64,
        maxy,
    );

    Ok(Raster {
        pixels,
        width,
        height,
        crs,
        bounds,
        resolution: (res_x, res_y),
        nodata,
    })
}

fn read_f64_tag<R: Read + Seek>(decoder: &mut Decoder<R>, tag: u16) -> Result<Option<Vec<f64>>, String> {
    let Some(value) = decoder
        .find_tag(Tag::Unknown(tag))
        .map_err(|e| format!("Failed to read tag {tag}: {e}"))?
    else {
        return Ok(None);
    };
    value
        .into_f64_vec()
        .map(Some)
        .map_err(|e| format!("Tag {tag} is not a DOUBLE array: {e}"))
}

/// EPSG code from the GeoKey directory, `None` when no CRS key is present.
fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<i32>, String> {
    let Some(value) = decoder
        .find_tag(Tag::Unknown(GEOTIFF_GEOKEYDIRECTORY))
        .map_err(|e| format!("Failed to read GeoKeyDirectory: {e}"))?
    else {
        return Ok(None);
    };
    let keys = value
        .into_u32_vec()
        .map_err(|e| format!("GeoKeyDirectory is not a SHORT array: {e}"))?;
    Ok(crs_from_geokeys(&keys))
}

fn crs_from_geokeys(keys: &[u32]) -> Option<i32> {
    // Header is 4 values; entries are [KeyID, TIFFTagLocation, Count, Value]
    let count = *keys.get(3)? as usize;
    keys.get(4..)?
        .chunks_exact(4)
        .take(count)
        .find(|entry| {
            entry[1] == 0
                && (entry[0] == u32::from(PROJECTED_CS_TYPE_GEO_KEY)
                    || entry[0] == u32::from(GEOGRAPHIC_TYPE_GEO_KEY))
        })
        .and_then(|entry| i32::try_from(entry[3]).ok())
        // 32767 is the GeoTIFF "user-defined" code
        .filter(|code| *code != 32767)
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<f64>, String> {
    let Some(value) = decoder
        .find_tag(Tag::Unknown(GDAL_NODATA))
        .map_err(|e| format!("Failed to read GDAL_NODATA: {e}"))?
    else {
        return Ok(None);
    };
    let text = value
        .into_string()
        .map_err(|e| format!("GDAL_NODATA is not ASCII: {e}"))?;
    let text = text.trim_matches(char::from(0)).trim();
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("GDAL_NODATA `{text}` is not a number"))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn to_f32(data: DecodingResult) -> Vec<f32> {
    match data {
        DecodingResult::U8(values) => values.iter().map(|&v| f32::from(v)).collect(),
        DecodingResult::U16(values) => values.iter().map(|&v| f32::from(v)).collect(),
        DecodingResult::U32(values) => values.iter().map(|&v| v as f32).collect(),
        DecodingResult::U64(values) => values.iter().map(|&v| v as f32).collect(),
        DecodingResult::I8(values) => values.iter().map(|&v| f32::from(v)).collect(),
        DecodingResult::I16(values) => values.iter().map(|&v| f32::from(v)).collect(),
        DecodingResult::I32(values) => values.iter().map(|&v| v as f32).collect(),
        DecodingResult::I64(values) => values.iter().map(|&v| v as f32).collect(),
        DecodingResult::F16(values) => values.iter().map(|v| v.to_f32()).collect(),
        DecodingResult::F32(values) => values,
        DecodingResult::F64(values) => values.iter().map(|&v| v as f32).collect(),
    }
}
