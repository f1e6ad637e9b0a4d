// --- Global viewer constants ---
pub const BACKGROUND_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

pub const DEFAULT_GRID_WIDTH: u32 = 100;
pub const DEFAULT_GRID_HEIGHT: u32 = 100;
// Edge length of one cell on screen, in pixels.
pub const DEFAULT_CELL_SIZE: u32 = 4;

pub const DEAD: u8 = 0;
pub const ALIVE: u8 = 1;

/// A random seed marks `floor((width * height)^0.8)` cells alive.
pub const SEED_DENSITY_EXPONENT: f64 = 0.8;

// Must match @workgroup_size in update.wgsl.
pub const COMPUTE_WORKGROUP_SIZE: u32 = 8;

pub const FPS_UPDATE_INTERVAL_SECS: f64 = 0.5;
