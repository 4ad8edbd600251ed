//! STL reading and writing.
//!
//! Both binary and ASCII files are read. Every facet becomes three fresh
//! vertices; no welding is done.

use std::path::Path;

use anyhow::{bail, Context, Result};
use meshbvh::MeshGeometry;

const HEADER_BYTES: usize = 80;
const FACET_BYTES: usize = 50;

/// Load an STL file into an indexed geometry.
pub fn read_stl(path: &Path) -> Result<MeshGeometry> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let geometry = parse_stl(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    log::info!(
        "loaded {} triangles from {}",
        geometry.triangle_count(),
        path.display()
    );
    Ok(geometry)
}

/// Parse STL bytes, detecting binary or ASCII.
pub fn parse_stl(bytes: &[u8]) -> Result<MeshGeometry> {
    let positions = match binary_facet_count(bytes) {
        Some(count) => parse_binary(bytes, count),
        None if starts_with_solid(bytes) => {
            let text = std::str::from_utf8(bytes).context("ASCII STL is not valid UTF-8")?;
            parse_ascii(text)?
        }
        None => bail!("not an STL file ({} bytes)", bytes.len()),
    };
    let mut geometry = MeshGeometry::non_indexed(positions);
    geometry.ensure_index();
    Ok(geometry)
}

/// Facet count if the length matches the binary layout exactly. ASCII files
/// also start with "solid", so the size check decides.
fn binary_facet_count(bytes: &[u8]) -> Option<usize> {
    let count_bytes: [u8; 4] = bytes.get(HEADER_BYTES..HEADER_BYTES + 4)?.try_into().ok()?;
    let count = u32::from_le_bytes(count_bytes) as usize;
    (bytes.len() == HEADER_BYTES + 4 + count * FACET_BYTES).then_some(count)
}

fn starts_with_solid(bytes: &[u8]) -> bool {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    bytes[start..].starts_with(b"solid")
}

fn parse_binary(bytes: &[u8], count: usize) -> Vec<f32> {
    let mut positions = Vec::with_capacity(count * 9);
    for facet in bytes[HEADER_BYTES + 4..].chunks_exact(FACET_BYTES) {
        // Skip the stored normal; it is recomputed from the winding.
        for value in facet[12..48].chunks_exact(4) {
            positions.push(f32::from_le_bytes([value[0], value[1], value[2], value[3]]));
        }
    }
    positions
}

fn parse_ascii(text: &str) -> Result<Vec<f32>> {
    let mut positions = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let mut words = line.split_whitespace();
        if words.next() != Some("vertex") {
            continue;
        }
        for _ in 0..3 {
            let word = words
                .next()
                .with_context(|| format!("line {}: vertex needs three coordinates", line_no + 1))?;
            let value: f32 = word
                .parse()
                .with_context(|| format!("line {}: bad coordinate `{word}`", line_no + 1))?;
            positions.push(value);
        }
    }
    if positions.len() % 9 != 0 {
        bail!("vertex count {} is not a multiple of three", positions.len() / 3);
    }
    Ok(positions)
}

/// Encode the triangles of `geometry`, in index order, as binary STL.
pub fn to_binary_stl(geometry: &MeshGeometry) -> Vec<u8> {
    let tri_count = geometry.triangle_count();
    let mut data = Vec::with_capacity(HEADER_BYTES + 4 + tri_count * FACET_BYTES);

    let mut header = [b' '; HEADER_BYTES];
    let label = b"meshbvh STL export";
    header[..label.len()].copy_from_slice(label);
    data.extend_from_slice(&header);
    data.extend_from_slice(&(tri_count as u32).to_le_bytes());

    for tri in 0..tri_count as u32 {
        let triangle = geometry.triangle(tri);
        let normal = if triangle.is_degenerate() {
            meshbvh_math::Vec3::z()
        } else {
            triangle.normal()
        };
        for v in normal.iter() {
            data.extend_from_slice(&v.to_le_bytes());
        }
        for p in triangle.points() {
            for v in p.coords.iter() {
                data.extend_from_slice(&v.to_le_bytes());
            }
        }
        // Attribute byte count
        data.extend_from_slice(&0u16.to_le_bytes());
    }
    data
}
