//! QR codes that open the web client on a given variant.

use super::subsets::VariantSubset;
use super::table::VariantTable;
use anyhow::{anyhow, Context, Result};
use qrcode::render::svg;
use qrcode::QrCode;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_QR_SIZE: u32 = 720;

/// Client URL that starts a game on `key`.
pub fn variant_url(base_url: &str, key: &str) -> String {
    format!("{}/?variant={}", base_url.trim_end_matches('/'), key)
}

/// Renders `url` as an SVG QR code at least `size` pixels wide.
pub fn render_svg(url: &str, size: u32) -> Result<String> {
    let code = QrCode::new(url.as_bytes())
        .map_err(|e| anyhow!("Failed to encode {} as a QR code: {}", url, e))?;
    Ok(code
        .render()
        .min_dimensions(size, size)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

/// Writes `<KEY>.svg` into `dir` for every variant of `subset`.
/// Returns the number of files written.
pub fn write_qr_codes(
    table: &VariantTable,
    subset: VariantSubset,
    dir: &Path,
    base_url: &str,
    size: u32,
) -> Result<usize> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let entries = subset.select(table);
    for entry in &entries {
        let key = entry.variant.key.to_string();
        let svg = render_svg(&variant_url(base_url, &key), size)?;
        let path = dir.join(format!("{}.svg", key));
        std::fs::write(&path, svg).with_context(|| format!("Failed to write {:?}", path))?;
        debug!("Wrote {:?}", path);
    }
    Ok(entries.len())
}
