//! Writes generation results to disk: OBJ mesh, PNG color preview, RON placements.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use strata_terrain::{PlacementRequest, PrototypeId, SpawnRule, TerrainMesh};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode png: {0}")]
    Png(#[from] png::EncodingError),

    #[error("failed to serialize placements: {0}")]
    Ron(#[from] ron::Error),
}

/// Wavefront OBJ with the `v x y z r g b` vertex-color extension.
pub fn write_obj(mesh: &TerrainMesh, out: &mut impl Write) -> Result<(), ExportError> {
    writeln!(out, "# strata terrain {}x{}", mesh.grid.width, mesh.grid.depth)?;
    for v in &mesh.vertices {
        let p = v.position;
        writeln!(
            out,
            "v {} {} {} {} {} {}",
            p.x, p.y, p.z, v.color.r, v.color.g, v.color.b
        )?;
    }
    for [a, b, c] in &mesh.triangles {
        // OBJ indices are 1-based.
        writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    Ok(())
}

pub fn write_obj_file(mesh: &TerrainMesh, path: &Path) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_obj(mesh, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Top-down image of vertex colors, one pixel per vertex, row-major RGBA.
#[derive(Clone, Debug)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PreviewImage {
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = pixel_offset(self.width, x, y);
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }
}

/// Byte offset of pixel `(x, y)` in a row-major RGBA buffer.
fn pixel_offset(width: u32, x: u32, y: u32) -> usize {
    (y as usize * width as usize + x as usize) * 4
}

pub fn render_preview(mesh: &TerrainMesh) -> PreviewImage {
    let width = mesh.grid.width + 1;
    let height = mesh.grid.depth + 1;
    let pixels = mesh
        .vertices
        .iter()
        .flat_map(|v| v.color.to_rgba8())
        .collect();
    PreviewImage {
        width,
        height,
        pixels,
    }
}

pub fn write_png(image: &PreviewImage, path: &Path) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    encode_png(image, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Encode `image` as an 8-bit RGBA PNG into `out`.
pub fn encode_png(image: &PreviewImage, out: &mut impl Write) -> Result<(), ExportError> {
    let mut encoder = png::Encoder::new(out, image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.pixels)?;
    writer.finish()?;
    Ok(())
}

/// One line of `placements.ron`.
#[derive(Debug, Serialize)]
struct PlacementRecord {
    prototype: PrototypeId,
    rule: usize,
    vertex: u32,
    position: [f64; 3],
    orientation: [f64; 4],
}

pub fn placements_to_ron(
    requests: &[PlacementRequest],
    rules: &[SpawnRule],
) -> Result<String, ExportError> {
    let records: Vec<PlacementRecord> = requests
        .iter()
        .filter_map(|r| {
            rules.get(r.rule_index).map(|rule| PlacementRecord {
                prototype: rule.prototype,
                rule: r.rule_index,
                vertex: r.vertex_index,
                position: r.world_position.to_array(),
                orientation: r.orientation.to_array(),
            })
        })
        .collect();
    let pretty = ron::ser::PrettyConfig::new().depth_limit(1);
    Ok(ron::ser::to_string_pretty(&records, pretty)?)
}

pub fn write_placements_file(
    requests: &[PlacementRequest],
    rules: &[SpawnRule],
    path: &Path,
) -> Result<(), ExportError> {
    std::fs::write(path, placements_to_ron(requests, rules)?)?;
    Ok(())
}
