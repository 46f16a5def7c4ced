//! Region partition: where land growth may start.
//!
//! Regions are half-open offset rectangles. Wrapping maps drop the x border
//! for full-width regions (there is no edge to keep away from) but keep the
//! region border between side-by-side regions.

use tracing::debug;

use super::GenerationRun;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapRegion {
    pub x_min: i32,
    pub x_max: i32,
    pub z_min: i32,
    pub z_max: i32,
}

impl MapRegion {
    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.x_min && x < self.x_max && z >= self.z_min && z < self.z_max
    }
}

/// Split a `width` x `height` map into `count` regions. Two regions are laid
/// side by side when `split_vertically` is true, stacked otherwise.
#[allow(clippy::too_many_arguments)]
pub fn partition(
    width: i32,
    height: i32,
    wrapping: bool,
    count: i32,
    map_border_x: i32,
    map_border_z: i32,
    region_border: i32,
    split_vertically: bool,
) -> Vec<MapRegion> {
    let mut border_x = if wrapping { region_border } else { map_border_x };
    let mut regions = Vec::with_capacity(4);

    match count {
        2 if split_vertically => {
            let left = MapRegion {
                x_min: border_x,
                x_max: width / 2 - region_border,
                z_min: map_border_z,
                z_max: height - map_border_z,
            };
            let right = MapRegion {
                x_min: width / 2 + region_border,
                x_max: width - border_x,
                ..left
            };
            regions.push(left);
            regions.push(right);
        }
        2 => {
            if wrapping {
                border_x = 0;
            }
            let bottom = MapRegion {
                x_min: border_x,
                x_max: width - border_x,
                z_min: map_border_z,
                z_max: height / 2 - region_border,
            };
            let top = MapRegion {
                z_min: height / 2 + region_border,
                z_max: height - map_border_z,
                ..bottom
            };
            regions.push(bottom);
            regions.push(top);
        }
        3 => {
            let first = MapRegion {
                x_min: border_x,
                x_max: width / 3 - region_border,
                z_min: map_border_z,
                z_max: height - map_border_z,
            };
            let second = MapRegion {
                x_min: width / 3 + region_border,
                x_max: width * 2 / 3 - region_border,
                ..first
            };
            let third = MapRegion {
                x_min: width * 2 / 3 + region_border,
                x_max: width - border_x,
                ..first
            };
            regions.extend([first, second, third]);
        }
        4 => {
            let bottom_left = MapRegion {
                x_min: border_x,
                x_max: width / 2 - region_border,
                z_min: map_border_z,
                z_max: height / 2 - region_border,
            };
            let bottom_right = MapRegion {
                x_min: width / 2 + region_border,
                x_max: width - border_x,
                ..bottom_left
            };
            let top_right = MapRegion {
                z_min: height / 2 + region_border,
                z_max: height - map_border_z,
                ..bottom_right
            };
            let top_left = MapRegion {
                x_min: border_x,
                x_max: width / 2 - region_border,
                ..top_right
            };
            regions.extend([bottom_left, bottom_right, top_right, top_left]);
        }
        _ => {
            if wrapping {
                border_x = 0;
            }
            regions.push(MapRegion {
                x_min: border_x,
                x_max: width - border_x,
                z_min: map_border_z,
                z_max: height - map_border_z,
            });
        }
    }

    regions
}

impl GenerationRun<'_> {
    pub(crate) fn create_regions(&mut self) {
        // only a two-way split consumes a random value
        let split_vertically = self.config.region_count == 2 && self.value() < 0.5;
        self.regions = partition(
            self.grid.cell_count_x(),
            self.grid.cell_count_z(),
            self.grid.wrapping(),
            self.config.region_count,
            self.config.map_border_x,
            self.config.map_border_z,
            self.config.region_border,
            split_vertically,
        );
        debug!(regions = ?self.regions, "created regions");
    }

    /// Random cell index inside `region`, clamped to the grid.
    pub(crate) fn random_cell(&mut self, region: MapRegion) -> usize {
        let x = self.range(region.x_min, region.x_max);
        let z = self.range(region.z_min, region.z_max);
        let x = x.clamp(0, self.grid.cell_count_x() - 1);
        let z = z.clamp(0, self.grid.cell_count_z() - 1);
        (x + z * self.grid.cell_count_x()) as usize
    }
}
