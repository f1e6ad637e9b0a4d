use crate::constants::{
    DEFAULT_CELL_SIZE, DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH, SEED_DENSITY_EXPONENT,
};
use winit::dpi::PhysicalSize;

/// Grid dimensions and on-screen cell size, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    pub cell_size: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_WIDTH, DEFAULT_GRID_HEIGHT, DEFAULT_CELL_SIZE)
    }
}

impl GridConfig {
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        assert!(width > 0 && height > 0, "grid must be at least 1x1");
        assert!(cell_size > 0, "cell size must be at least one pixel");
        Self {
            width,
            height,
            cell_size,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Live-cell target for a random seed: `floor((width * height)^0.8)`.
    pub fn seed_target(&self) -> usize {
        (self.cell_count() as f64).powf(SEED_DENSITY_EXPONENT).floor() as usize
    }

    pub fn window_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.width * self.cell_size, self.height * self.cell_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_original_viewer() {
        let config = GridConfig::default();
        assert_eq!(config.width, 100);
        assert_eq!(config.height, 100);
        assert_eq!(config.cell_size, 4);
        assert_eq!(config.window_size(), PhysicalSize::new(400, 400));
    }

    #[test]
    fn seed_target_is_floor_of_power() {
        assert_eq!(GridConfig::new(1, 1, 1).seed_target(), 1);
        assert_eq!(GridConfig::new(2, 1, 1).seed_target(), 1); // 2^0.8 ~ 1.74
        assert_eq!(GridConfig::new(3, 3, 1).seed_target(), 5); // 9^0.8 ~ 5.80
        assert_eq!(GridConfig::new(100, 100, 1).seed_target(), 1584); // 10000^0.8 ~ 1584.89
    }

    #[test]
    fn seed_target_never_exceeds_cell_count() {
        for (w, h) in [(1, 1), (2, 2), (7, 3), (100, 100)] {
            let config = GridConfig::new(w, h, 1);
            assert!(config.seed_target() <= config.cell_count());
        }
    }

    #[test]
    #[should_panic(expected = "grid must be at least 1x1")]
    fn zero_width_rejected() {
        GridConfig::new(0, 10, 4);
    }
}
