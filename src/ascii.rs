//! ASCII rendering and export for hex maps
//!
//! Rows are printed north (highest row) first. Every cell takes two columns
//! and odd rows are shifted right by one column, so the text lines up like
//! the staggered offset layout of the grid.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;

use crate::cell::{HexCell, TerrainType};
use crate::generator::{ClimateData, GenerationReport};
use crate::grid::HexGrid;

/// ASCII rendering modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AsciiMode {
    /// Terrain material, water and plants
    #[default]
    Terrain,
    /// Elevation digits, water shown as `~`
    Elevation,
    /// Moisture gradient from the last climate run
    Moisture,
    /// River flow arrows
    Rivers,
    /// Fog of war: visible, explored and unknown cells
    Visibility,
    /// The grid's current path, labelled with turn numbers
    Path,
}

impl AsciiMode {
    pub fn name(&self) -> &'static str {
        match self {
            AsciiMode::Terrain => "Terrain",
            AsciiMode::Elevation => "Elevation",
            AsciiMode::Moisture => "Moisture",
            AsciiMode::Rivers => "Rivers",
            AsciiMode::Visibility => "Visibility",
            AsciiMode::Path => "Path",
        }
    }

    pub fn all() -> &'static [AsciiMode] {
        &[
            AsciiMode::Terrain,
            AsciiMode::Elevation,
            AsciiMode::Moisture,
            AsciiMode::Rivers,
            AsciiMode::Visibility,
            AsciiMode::Path,
        ]
    }
}

impl std::str::FromStr for AsciiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AsciiMode::all()
            .iter()
            .copied()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown view '{s}'"))
    }
}

/// Get ASCII character for a cell's terrain
pub fn terrain_char(cell: &HexCell) -> char {
    if cell.is_underwater() {
        return if cell.elevation() < 0 { '~' } else { '.' };
    }
    match cell.terrain_type() {
        TerrainType::Sand => 'd',
        TerrainType::Grass if cell.plant_level() >= 2 => 'T',
        TerrainType::Grass => '"',
        TerrainType::Mud if cell.plant_level() >= 2 => 'B',
        TerrainType::Mud => ':',
        TerrainType::Stone => '^',
        TerrainType::Snow => '#',
    }
}

/// Get ASCII character for elevation: `~` under water, else the digit
pub fn elevation_char(cell: &HexCell) -> char {
    if cell.is_underwater() {
        '~'
    } else {
        char::from_digit(cell.elevation().clamp(0, 9) as u32, 10).unwrap_or('9')
    }
}

/// Get ASCII character for moisture
pub fn moisture_char(moisture: f32) -> char {
    const CHARS: &[char] = &['_', '.', '-', ':', ';', '=', '+', '#', '%', '~'];
    let idx = (moisture.clamp(0.0, 1.0) * (CHARS.len() - 1) as f32) as usize;
    CHARS[idx.min(CHARS.len() - 1)]
}

/// Arrow for the outgoing river, `o` for a river end, terrain otherwise
pub fn river_char(cell: &HexCell) -> char {
    use crate::coordinates::HexDirection::*;
    match cell.outgoing_river() {
        Some(NE) => '/',
        Some(E) => '>',
        Some(SE) => '\\',
        Some(SW) => ',',
        Some(W) => '<',
        Some(NW) => '`',
        None if cell.has_incoming_river() => 'o',
        None if cell.is_underwater() => '~',
        None => ' ',
    }
}

/// Visible cells show terrain, explored ones a dot, the rest stay blank
pub fn visibility_char(cell: &HexCell) -> char {
    if !cell.explorable() {
        'X'
    } else if cell.unit().is_some() {
        '@'
    } else if cell.is_visible() {
        terrain_char(cell)
    } else if cell.is_explored() {
        '.'
    } else {
        ' '
    }
}

fn cell_char(grid: &HexGrid, climate: &[ClimateData], index: usize, mode: AsciiMode) -> char {
    let cell = &grid.cells()[index];
    match mode {
        AsciiMode::Terrain => terrain_char(cell),
        AsciiMode::Elevation => elevation_char(cell),
        AsciiMode::Moisture => moisture_char(climate.get(index).map_or(0.0, |c| c.moisture)),
        AsciiMode::Rivers => river_char(cell),
        AsciiMode::Visibility => visibility_char(cell),
        AsciiMode::Path => {
            let step = grid
                .current_path()
                .and_then(|path| path.cells().iter().position(|&c| c == index).map(|i| (path, i)));
            match step {
                Some((path, 0)) if path.len() > 1 => 'S',
                Some((path, i)) => {
                    char::from_digit(path.turn_label(i).clamp(0, 9) as u32, 10).unwrap_or('+')
                }
                None => terrain_char(cell),
            }
        }
    }
}

/// Render a map to ASCII string
pub fn render_ascii_map(grid: &HexGrid, climate: &[ClimateData], mode: AsciiMode) -> String {
    let width = grid.cell_count_x().max(0) as usize;
    let height = grid.cell_count_z().max(0) as usize;
    let mut result = String::with_capacity((width * 2 + 2) * height);

    for z in (0..height).rev() {
        if z % 2 == 1 {
            result.push(' ');
        }
        for x in 0..width {
            result.push(cell_char(grid, climate, x + z * width, mode));
            result.push(' ');
        }
        result.push('\n');
    }

    result
}

/// Print ASCII map to stdout
pub fn print_ascii_map(grid: &HexGrid, climate: &[ClimateData], mode: AsciiMode) {
    print!("{}", render_ascii_map(grid, climate, mode));
}

/// Generate legend for terrain characters
pub fn terrain_legend() -> String {
    let mut legend = String::new();
    legend.push_str("=== TERRAIN LEGEND ===\n");
    legend.push_str("  ~ Deep water   . Shallows\n");
    legend.push_str("  d Sand         \" Grass       T Woodland\n");
    legend.push_str("  : Mud          B Bog         ^ Stone       # Snow\n");
    legend
}

/// Count land cells per terrain type
pub fn calculate_terrain_stats(grid: &HexGrid) -> BTreeMap<String, usize> {
    let mut stats = BTreeMap::new();
    for cell in grid.cells() {
        let key = if cell.is_underwater() {
            "water".to_string()
        } else {
            cell.terrain_type().to_string()
        };
        *stats.entry(key).or_insert(0) += 1;
    }
    stats
}

// ============================================================================
// COLORIZED ASCII RENDERING
// ============================================================================

/// Base color of a terrain type
pub fn terrain_color(terrain: TerrainType) -> (u8, u8, u8) {
    match terrain {
        TerrainType::Sand => (222, 200, 140),
        TerrainType::Grass => (110, 160, 70),
        TerrainType::Mud => (120, 100, 70),
        TerrainType::Stone => (130, 130, 130),
        TerrainType::Snow => (235, 240, 245),
    }
}

/// Water gets darker with depth
pub fn water_color(depth: i32) -> (u8, u8, u8) {
    let t = (depth.clamp(0, 6) as f32) / 6.0;
    ((60.0 - t * 40.0) as u8, (120.0 - t * 70.0) as u8, (200.0 - t * 80.0) as u8)
}

/// Display color of a cell: water by depth, land by terrain darkened with plants
pub fn cell_color(cell: &HexCell) -> (u8, u8, u8) {
    if cell.is_underwater() {
        return water_color(cell.water_level() - cell.elevation());
    }
    let (r, g, b) = terrain_color(cell.terrain_type());
    let shade = 1.0 - cell.plant_level() as f32 * 0.1;
    ((r as f32 * shade) as u8, (g as f32 * shade) as u8, (b as f32 * shade) as u8)
}

/// Format a single character with ANSI true color (24-bit) - foreground and background
pub fn ansi_colored_char(ch: char, fg: (u8, u8, u8), bg: (u8, u8, u8)) -> String {
    format!(
        "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m{}\x1b[0m",
        fg.0, fg.1, fg.2,
        bg.0, bg.1, bg.2,
        ch
    )
}

/// Render a colorized ASCII map to string with ANSI codes
pub fn render_colored_ascii_map(grid: &HexGrid, climate: &[ClimateData], mode: AsciiMode) -> String {
    let width = grid.cell_count_x().max(0) as usize;
    let height = grid.cell_count_z().max(0) as usize;
    // Estimate: each cell needs ~40 bytes for ANSI codes
    let mut result = String::with_capacity(width * height * 45);

    for z in (0..height).rev() {
        if z % 2 == 1 {
            result.push(' ');
        }
        for x in 0..width {
            let index = x + z * width;
            let cell = &grid.cells()[index];
            let bg = match mode {
                AsciiMode::Visibility if !cell.is_explored() => (20, 20, 20),
                _ => cell_color(cell),
            };
            let fg = (bg.0.saturating_sub(70), bg.1.saturating_sub(70), bg.2.saturating_sub(70));
            let ch = cell_char(grid, climate, index, mode);
            result.push_str(&ansi_colored_char(ch, fg, bg));
            result.push_str(&ansi_colored_char(' ', fg, bg));
        }
        result.push_str("\x1b[0m\n");
    }

    result
}

/// Print colorized ASCII map to stdout
pub fn print_colored_ascii_map(grid: &HexGrid, climate: &[ClimateData], mode: AsciiMode) {
    print!("{}", render_colored_ascii_map(grid, climate, mode));
}

/// Export a map summary with every view to a text file
pub fn export_map_file(
    grid: &HexGrid,
    climate: &[ClimateData],
    report: Option<&GenerationReport>,
    path: &Path,
) -> io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "=== HEX WORLD MAP FILE ===")?;
    writeln!(file, "Size: {}x{}", grid.cell_count_x(), grid.cell_count_z())?;
    writeln!(file, "Wrapping: {}", grid.wrapping())?;
    writeln!(file, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    if let Some(report) = report {
        writeln!(file, "{report}")?;
    }
    writeln!(file)?;

    for mode in [AsciiMode::Terrain, AsciiMode::Elevation, AsciiMode::Rivers] {
        writeln!(file, "=== MAP ({} View) ===", mode.name())?;
        write!(file, "{}", render_ascii_map(grid, climate, mode))?;
        writeln!(file)?;
    }
    if !climate.is_empty() {
        writeln!(file, "=== MAP (Moisture View) ===")?;
        write!(file, "{}", render_ascii_map(grid, climate, AsciiMode::Moisture))?;
        writeln!(file)?;
    }

    write!(file, "{}", terrain_legend())?;
    writeln!(file)?;

    writeln!(file, "=== STATISTICS ===")?;
    let total = grid.cell_count().max(1);
    for (name, count) in calculate_terrain_stats(grid) {
        writeln!(file, "  {:<8} {:>6} ({:.1}%)", name, count, count as f32 * 100.0 / total as f32)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::HexDirection;
    use crate::metrics::MapMetrics;
    use crate::unit::MovementRules;

    fn grid() -> HexGrid {
        HexGrid::with_size(10, 5, false, MapMetrics::default()).unwrap()
    }

    #[test]
    fn test_layout_staggers_odd_rows() {
        let grid = grid();
        let text = render_ascii_map(&grid, &[], AsciiMode::Elevation);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        // top line is row 4 (even), next is row 3 (odd)
        assert!(lines[0].starts_with('0'));
        assert!(lines[1].starts_with(" 0"));
        assert_eq!(lines[0].len(), 20);
    }

    #[test]
    fn test_elevation_and_water_chars() {
        let mut grid = grid();
        let dry = grid.cell_index_at_offset(0, 0).unwrap();
        let wet = grid.cell_index_at_offset(1, 0).unwrap();
        grid.set_elevation(dry, 4);
        grid.set_water_level(wet, 2);
        assert_eq!(elevation_char(&grid.cells()[dry]), '4');
        assert_eq!(elevation_char(&grid.cells()[wet]), '~');
        assert_eq!(terrain_char(&grid.cells()[wet]), '.');
    }

    #[test]
    fn test_river_arrows() {
        let mut grid = grid();
        let a = grid.cell_index_at_offset(2, 2).unwrap();
        grid.set_outgoing_river(a, HexDirection::E);
        let b = grid.neighbor(a, HexDirection::E).unwrap();
        assert_eq!(river_char(&grid.cells()[a]), '>');
        assert_eq!(river_char(&grid.cells()[b]), 'o');
    }

    #[test]
    fn test_path_view_marks_turns() {
        let mut grid = grid();
        for cell in grid.cells.iter_mut() {
            cell.explored = true;
        }
        let from = grid.cell_index_at_offset(1, 2).unwrap();
        let to = grid.cell_index_at_offset(4, 2).unwrap();
        grid.find_path(from, to, MovementRules::default()).unwrap();
        assert_eq!(cell_char(&grid, &[], from, AsciiMode::Path), 'S');
        assert_eq!(cell_char(&grid, &[], to, AsciiMode::Path), '0');
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("rivers".parse::<AsciiMode>().unwrap(), AsciiMode::Rivers);
        assert!("plates".parse::<AsciiMode>().is_err());
    }
}
