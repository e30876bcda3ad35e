//! GeoTIFF writer for raster artifacts.
//!
//! Writes a single-band Float32 GeoTIFF with the georeferencing needed to
//! place it again on read: pixel scale, tie point, a GeoKey directory naming
//! the EPSG code plus a citation carrying the custom PROJ string, and the
//! `GDAL_NODATA` tag.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use transect_viewer::grid::read_ascii_grid;
//! use transect_viewer::geotiff_writer::GeoTiffCompression;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let raster = read_ascii_grid(Path::new("Elevation/dem_2012.asc"))?;
//!     raster
//!         .geotiff_writer()
//!         .compression(GeoTiffCompression::Deflate)
//!         .write("Elevation/GeoData/dem_2012.tif")?;
//!     Ok(())
//! }
//! ```

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Tag;

use crate::casting::usize_to_u32;
use crate::geometry::projection::{get_proj_string, is_geographic_crs, REGIONAL_EPSG, REGIONAL_PROJ};
use crate::raster::Raster;

// Private TIFF tags used by GeoTIFF and GDAL
pub(crate) const GEOTIFF_MODELPIXELSCALE: u16 = 33550;
pub(crate) const GEOTIFF_MODELTIEPOINT: u16 = 33922;
pub(crate) const GEOTIFF_GEOKEYDIRECTORY: u16 = 34735;
pub(crate) const GEOTIFF_GEOASCIIPARAMS: u16 = 34737;
pub(crate) const GDAL_NODATA: u16 = 42113;

// GeoKey directory entries
pub(crate) const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GT_CITATION_GEO_KEY: u16 = 1026;
pub(crate) const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
pub(crate) const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

// Model and raster type codes
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Compression of cached raster artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoTiffCompression {
    #[default]
    None,
    Lzw,
    /// zlib at the fast level
    Deflate,
}

/// Failure while encoding a raster artifact.
#[derive(Debug, thiserror::Error)]
pub enum GeoTiffWriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TIFF encoding error: {0}")]
    TiffEncode(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<tiff::TiffError> for GeoTiffWriteError {
    fn from(e: tiff::TiffError) -> Self {
        Self::TiffEncode(e.to_string())
    }
}

/// Encodes one [`Raster`] as a GeoTIFF artifact.
pub struct GeoTiffWriter<'a> {
    raster: &'a Raster,
    compression: GeoTiffCompression,
}

impl<'a> GeoTiffWriter<'a> {
    #[must_use]
    pub fn new(raster: &'a Raster) -> Self {
        Self {
            raster,
            compression: GeoTiffCompression::default(),
        }
    }

    #[must_use]
    pub fn compression(mut self, compression: GeoTiffCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Create `path` and encode into it.
    pub fn write<P: AsRef<Path>>(self, path: P) -> Result<(), GeoTiffWriteError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Encode into an arbitrary seekable sink.
    pub fn write_to<W: Write + Seek>(self, writer: W) -> Result<(), GeoTiffWriteError> {
        let raster = self.raster;

        if raster.width == 0 || raster.height == 0 {
            return Err(GeoTiffWriteError::InvalidData(
                "Raster has zero dimensions".to_string(),
            ));
        }
        if raster.pixels.len() != raster.width * raster.height {
            return Err(GeoTiffWriteError::InvalidData(format!(
                "Raster has {} pixels, expected {}x{}",
                raster.pixels.len(),
                raster.width,
                raster.height
            )));
        }

        let width = usize_to_u32(raster.width).map_err(GeoTiffWriteError::InvalidData)?;
        let height = usize_to_u32(raster.height).map_err(GeoTiffWriteError::InvalidData)?;

        let compression = match self.compression {
            GeoTiffCompression::None => Compression::Uncompressed,
            GeoTiffCompression::Lzw => Compression::Lzw,
            GeoTiffCompression::Deflate => Compression::Deflate(tiff::encoder::DeflateLevel::Fast),
        };

        let mut encoder = TiffEncoder::new(writer)?.with_compression(compression);
        let mut image = encoder.new_image::<Gray32Float>(width, height)?;
        self.write_geotiff_tags(image.encoder())?;
        image.write_data(&raster.pixels)?;
        Ok(())
    }

    fn write_geotiff_tags<W: Write + Seek, K: tiff::encoder::TiffKind>(
        &self,
        dir: &mut tiff::encoder::DirectoryEncoder<W, K>,
    ) -> Result<(), GeoTiffWriteError> {
        let raster = self.raster;

        // ModelPixelScale: [ScaleX, ScaleY, ScaleZ]
        let pixel_scale = [raster.resolution.0, raster.resolution.1, 0.0];
        dir.write_tag(Tag::Unknown(GEOTIFF_MODELPIXELSCALE), pixel_scale.as_slice())?;

        // ModelTiepoint: pixel (0, 0) -> world (minx, maxy)
        let tiepoint = [0.0, 0.0, 0.0, raster.bounds.minx, raster.bounds.maxy, 0.0];
        dir.write_tag(Tag::Unknown(GEOTIFF_MODELTIEPOINT), tiepoint.as_slice())?;

        let citation = self.citation();
        let geokeys = self.build_geokey_directory(citation.as_deref());
        dir.write_tag(Tag::Unknown(GEOTIFF_GEOKEYDIRECTORY), geokeys.as_slice())?;

        if let Some(citation) = citation {
            dir.write_tag(Tag::Unknown(GEOTIFF_GEOASCIIPARAMS), citation.as_str())?;
        }

        if let Some(nodata) = raster.nodata {
            dir.write_tag(Tag::Unknown(GDAL_NODATA), nodata.to_string().as_str())?;
        }

        Ok(())
    }

    /// GeoAsciiParams payload: the PROJ string followed by the `|` terminator.
    fn citation(&self) -> Option<String> {
        let proj = if self.raster.crs == REGIONAL_EPSG {
            Some(REGIONAL_PROJ)
        } else {
            get_proj_string(self.raster.crs)
        };
        proj.map(|p| format!("{p}|"))
    }

    fn build_geokey_directory(&self, citation: Option<&str>) -> Vec<u16> {
        // [KeyDirectoryVersion, KeyRevision, MinorRevision, NumberOfKeys,
        //  KeyID, TIFFTagLocation, Count, Value_Offset, ...] sorted by KeyID
        let raster = self.raster;
        let is_geographic = is_geographic_crs(raster.crs);
        // Codes outside u16 cannot be expressed as a GeoKey value
        let crs_code = u16::try_from(raster.crs).unwrap_or(32767);

        let mut entries: Vec<[u16; 4]> = vec![
            [
                GT_MODEL_TYPE_GEO_KEY,
                0,
                1,
                if is_geographic {
                    MODEL_TYPE_GEOGRAPHIC
                } else {
                    MODEL_TYPE_PROJECTED
                },
            ],
            [GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA],
        ];

        if let Some(citation) = citation {
            let count = u16::try_from(citation.len()).unwrap_or(u16::MAX);
            entries.push([GT_CITATION_GEO_KEY, GEOTIFF_GEOASCIIPARAMS, count, 0]);
        }

        if is_geographic {
            entries.push([GEOGRAPHIC_TYPE_GEO_KEY, 0, 1, crs_code]);
        } else {
            entries.push([PROJECTED_CS_TYPE_GEO_KEY, 0, 1, crs_code]);
        }

        let mut keys = vec![1, 1, 0, entries.len() as u16];
        for entry in entries {
            keys.extend_from_slice(&entry);
        }
        keys
    }
}

impl Raster {
    /// Encode with default options into `path`.
    pub fn write_geotiff<P: AsRef<Path>>(&self, path: P) -> Result<(), GeoTiffWriteError> {
        GeoTiffWriter::new(self).write(path)
    }

    /// Writer that can be configured before encoding.
    #[must_use]
    pub fn geotiff_writer(&self) -> GeoTiffWriter<'_> {
        GeoTiffWriter::new(self)
    }

    /// Encode this raster as GeoTIFF bytes.
    pub fn to_geotiff_bytes(&self) -> Result<Vec<u8>, GeoTiffWriteError> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        GeoTiffWriter::new(self).write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }
}
