//! Water cycle simulation
//!
//! Every cell carries a cloud and a moisture amount. Each cycle water
//! evaporates into clouds, clouds rain back down, clouds drift with the
//! wind and moisture runs off downhill or seeps across level ground. The
//! cycle reads one buffer and writes the next, so cell order never matters.

use tracing::debug;

use super::GenerationRun;

/// Number of water cycles simulated per map.
pub const CLIMATE_CYCLES: usize = 40;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClimateData {
    pub clouds: f32,
    pub moisture: f32,
}

impl GenerationRun<'_> {
    pub(crate) fn create_climate(&mut self) {
        let initial = ClimateData {
            clouds: 0.0,
            moisture: self.config.starting_moisture,
        };
        self.climate = vec![initial; self.cell_count];
        let mut next = vec![ClimateData::default(); self.cell_count];

        for _ in 0..CLIMATE_CYCLES {
            for index in 0..self.cell_count {
                self.evolve_climate(index, &mut next);
            }
            // contributions arrive after a cell's own cap, so cap again here
            for data in next.iter_mut() {
                data.moisture = data.moisture.min(1.0);
            }
            std::mem::swap(&mut self.climate, &mut next);
        }

        debug!(cycles = CLIMATE_CYCLES, "climate simulated");
    }

    fn evolve_climate(&mut self, index: usize, next: &mut [ClimateData]) {
        let config = self.config;
        let cell = &self.grid.cells[index];
        let mut climate = self.climate[index];

        if cell.is_underwater() {
            climate.moisture = 1.0;
            climate.clouds += config.evaporation_factor;
        } else {
            let evaporation = climate.moisture * config.evaporation_factor;
            climate.moisture -= evaporation;
            climate.clouds += evaporation;
        }

        let precipitation = climate.clouds * config.precipitation_factor;
        climate.clouds -= precipitation;
        climate.moisture += precipitation;

        // high ground holds fewer clouds
        let cloud_maximum = 1.0 - cell.view_elevation() as f32 / (config.elevation_maximum as f32 + 1.0);
        if climate.clouds > cloud_maximum {
            climate.moisture += climate.clouds - cloud_maximum;
            climate.clouds = cloud_maximum;
        }

        let main_dispersal_direction = config.wind_direction.opposite();
        let cloud_dispersal = climate.clouds * (1.0 / (5.0 + config.wind_strength));
        let runoff = climate.moisture * config.runoff_factor * (1.0 / 6.0);
        let seepage = climate.moisture * config.seepage_factor * (1.0 / 6.0);

        let view_elevation = cell.view_elevation();
        for (direction, neighbor) in cell.neighbors() {
            let target = &mut next[neighbor];
            if direction == main_dispersal_direction {
                target.clouds += cloud_dispersal * config.wind_strength;
            } else {
                target.clouds += cloud_dispersal;
            }

            let elevation_delta = self.grid.cells[neighbor].view_elevation() - view_elevation;
            if elevation_delta < 0 {
                climate.moisture -= runoff;
                target.moisture += runoff;
            } else if elevation_delta == 0 {
                climate.moisture -= seepage;
                target.moisture += seepage;
            }
        }

        let own = &mut next[index];
        own.moisture = (own.moisture + climate.moisture).min(1.0);
        self.climate[index] = ClimateData::default();
    }
}

#[cfg(test)]
mod tests {
    use crate::generator::{ClimateData, GenerationRun, GeneratorConfig};
    use crate::grid::HexGrid;
    use crate::metrics::MapMetrics;

    fn simulate(grid: &mut HexGrid, config: &GeneratorConfig) -> Vec<ClimateData> {
        let mut run = GenerationRun::new(grid, config, 1);
        run.create_climate();
        run.climate
    }

    #[test]
    fn test_flooded_map_is_saturated() {
        let mut grid = HexGrid::with_size(20, 15, false, MapMetrics::default()).unwrap();
        for index in 0..grid.cell_count() {
            grid.set_water_level(index, 3);
        }
        let climate = simulate(&mut grid, &GeneratorConfig::default());
        assert!(climate.iter().all(|c| c.moisture > 0.99 && c.moisture <= 1.0));
    }

    #[test]
    fn test_dry_map_stays_dry() {
        let mut grid = HexGrid::with_size(20, 15, false, MapMetrics::default()).unwrap();
        let config = GeneratorConfig {
            starting_moisture: 0.0,
            ..Default::default()
        };
        let climate = simulate(&mut grid, &config);
        assert!(climate.iter().all(|c| *c == ClimateData::default()));
    }

    #[test]
    fn test_moisture_stays_in_range() {
        let mut grid = HexGrid::with_size(20, 15, false, MapMetrics::default()).unwrap();
        // sea on the left, a raised plateau on the right
        for index in 0..grid.cell_count() {
            grid.set_water_level(index, 3);
            if grid.cells()[index].coordinates().offset_column() >= 10 {
                grid.set_elevation(index, 5);
            }
        }
        let climate = simulate(&mut grid, &GeneratorConfig::default());
        for data in &climate {
            assert!(data.moisture >= 0.0 && data.moisture <= 1.0);
            assert!(data.clouds >= 0.0);
        }
    }
}
