//! PNG export of hex maps
//!
//! Pixels are mapped back to world positions and looked up through the grid,
//! so cells come out as proper hexagons. North (the highest row) is at the
//! top of the image.

use image::{ImageBuffer, Rgb, RgbImage};

use crate::ascii::cell_color;
use crate::cell::HexCell;
use crate::generator::ClimateData;
use crate::grid::HexGrid;
use crate::metrics::{cell_center, Vec3, INNER_DIAMETER, INNER_RADIUS, OUTER_RADIUS};

const BACKGROUND: [u8; 3] = [16, 16, 24];
const RIVER_COLOR: [u8; 3] = [40, 90, 220];

/// What a PNG export shows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ImageLayer {
    #[default]
    Terrain,
    Elevation,
    Moisture,
}

impl ImageLayer {
    pub fn all() -> &'static [Self] {
        &[Self::Terrain, Self::Elevation, Self::Moisture]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Terrain => "terrain",
            Self::Elevation => "elevation",
            Self::Moisture => "moisture",
        }
    }
}

/// Size in pixels of a map rendered at `scale` pixels per world unit.
pub fn image_size(grid: &HexGrid, scale: f32) -> (u32, u32) {
    let width = (grid.cell_count_x() as f32 + 0.5) * INNER_DIAMETER * scale;
    let height = ((grid.cell_count_z() - 1).max(0) as f32 * 1.5 + 2.0) * OUTER_RADIUS * scale;
    (width.ceil().max(1.0) as u32, height.ceil().max(1.0) as u32)
}

/// Render one layer of the map into an image.
pub fn render_layer(grid: &HexGrid, climate: &[ClimateData], layer: ImageLayer, scale: f32) -> RgbImage {
    let (width, height) = image_size(grid, scale);
    let mut img: RgbImage = ImageBuffer::from_pixel(width, height, Rgb(BACKGROUND));
    let top = height as f32 / scale - OUTER_RADIUS;

    for py in 0..height {
        for px in 0..width {
            let position = Vec3::new(
                (px as f32 + 0.5) / scale - INNER_RADIUS,
                0.0,
                top - (py as f32 + 0.5) / scale,
            );
            let Some(index) = grid.cell_index_at_position(position) else {
                continue;
            };
            let cell = &grid.cells()[index];
            let color = match layer {
                ImageLayer::Terrain => {
                    let (r, g, b) = cell_color(cell);
                    [r, g, b]
                }
                ImageLayer::Elevation => elevation_color(cell),
                ImageLayer::Moisture => {
                    spectral_colormap(climate.get(index).map_or(0.0, |c| c.moisture))
                }
            };
            img.put_pixel(px, py, Rgb(color));
        }
    }

    if layer == ImageLayer::Terrain {
        draw_rivers(grid, &mut img, scale, top);
    }
    img
}

/// Export one layer as a PNG.
pub fn export_map_png(
    grid: &HexGrid,
    climate: &[ClimateData],
    layer: ImageLayer,
    scale: f32,
    path: &str,
) -> Result<(), image::ImageError> {
    render_layer(grid, climate, layer, scale).save(path)
}

fn elevation_color(cell: &HexCell) -> [u8; 3] {
    if cell.is_underwater() {
        let (r, g, b) = crate::ascii::water_color(cell.water_level() - cell.elevation());
        return [r, g, b];
    }
    spectral_colormap((cell.elevation() as f32 / 10.0).clamp(0.0, 1.0))
}

fn draw_rivers(grid: &HexGrid, img: &mut RgbImage, scale: f32, top: f32) {
    let to_pixel = |p: Vec3| ((p.x + INNER_RADIUS) * scale, (top - p.z) * scale);

    for cell in grid.cells() {
        let Some(direction) = cell.outgoing_river() else {
            continue;
        };
        let Some(next) = cell.neighbor(direction) else {
            continue;
        };
        let from = center_of(cell);
        let to = center_of(&grid.cells()[next]);
        // seam crossings on wrapping maps
        if (to.x - from.x).abs() > INNER_DIAMETER * 1.5 {
            continue;
        }
        draw_line(img, to_pixel(from), to_pixel(to), RIVER_COLOR);
    }
}

fn center_of(cell: &HexCell) -> Vec3 {
    let coordinates = cell.coordinates();
    cell_center(coordinates.offset_column(), coordinates.z())
}

fn draw_line(img: &mut RgbImage, from: (f32, f32), to: (f32, f32), color: [u8; 3]) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = from.0 + (to.0 - from.0) * t;
        let y = from.1 + (to.1 - from.1) * t;
        if x >= 0.0 && y >= 0.0 && (x as u32) < img.width() && (y as u32) < img.height() {
            img.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }
}

/// Spectral colormap (matplotlib style): dark blue -> cyan -> green -> yellow -> orange -> red
fn spectral_colormap(t: f32) -> [u8; 3] {
    let colors: [[f32; 3]; 11] = [
        [0.37, 0.31, 0.64],
        [0.20, 0.53, 0.74],
        [0.40, 0.76, 0.65],
        [0.67, 0.87, 0.64],
        [0.90, 0.96, 0.60],
        [1.00, 1.00, 0.75],
        [1.00, 0.88, 0.55],
        [0.99, 0.68, 0.38],
        [0.96, 0.43, 0.26],
        [0.84, 0.24, 0.31],
        [0.62, 0.00, 0.26],
    ];

    let t_scaled = t.clamp(0.0, 1.0) * 10.0;
    let idx = (t_scaled as usize).min(9);
    let frac = t_scaled - idx as f32;

    let c1 = colors[idx];
    let c2 = colors[idx + 1];

    [
        ((c1[0] + (c2[0] - c1[0]) * frac) * 255.0) as u8,
        ((c1[1] + (c2[1] - c1[1]) * frac) * 255.0) as u8,
        ((c1[2] + (c2[2] - c1[2]) * frac) * 255.0) as u8,
    ]
}
