use crate::config::GridConfig;
use crate::constants::{ALIVE, DEAD};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use rayon::prelude::*;

pub type SimRng = StdRng;

/// Which of the two grids holds the generation being read this frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ActiveBuffer {
    A,
    B,
}

/// A fixed-size 2D field of 8-bit cell values.
pub struct CellGrid {
    width: u32,
    height: u32,
    cells: Vec<u8>,
}

impl CellGrid {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "grid must be at least 1x1");
        Self {
            width,
            height,
            cells: vec![DEAD; width as usize * height as usize],
        }
    }

    /// Cells outside [0,W)x[0,H) read as dead.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return DEAD;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        debug_assert!(x < self.width && y < self.height);
        self.cells[y as usize * self.width as usize + x as usize] = value;
    }

    pub fn clear(&mut self) {
        self.cells.fill(DEAD);
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != DEAD).count()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }
}

/// Next state of one cell as a pure function of its current state and the
/// number of live cells among its eight neighbors.
pub trait Rule: Sync {
    fn next_state(&self, alive: bool, live_neighbors: u32) -> bool;
}

/// B3/S23, classic Life. Mirrors the rule compiled into update.wgsl.
pub struct ConwayRule;

impl Rule for ConwayRule {
    fn next_state(&self, alive: bool, live_neighbors: u32) -> bool {
        live_neighbors == 3 || (alive && live_neighbors == 2)
    }
}

#[inline]
fn live_neighbors(grid: &CellGrid, x: i32, y: i32) -> u32 {
    let mut count = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            if grid.get(x + dx, y + dy) != DEAD {
                count += 1;
            }
        }
    }
    count
}

/// One full update: reads every cell of `current`, writes every cell of
/// `next`. Each output row is owned by exactly one rayon task and the input
/// grid is only read, matching the hazard rules of the compute dispatch.
pub fn step<R: Rule>(current: &CellGrid, next: &mut CellGrid, rule: &R) {
    assert_eq!(current.width, next.width);
    assert_eq!(current.height, next.height);
    let width = current.width as usize;
    next.cells
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let alive = current.get(x as i32, y as i32) != DEAD;
                let neighbors = live_neighbors(current, x as i32, y as i32);
                *out = if rule.next_state(alive, neighbors) {
                    ALIVE
                } else {
                    DEAD
                };
            }
        });
}

/// Double-buffered grid pair plus the generation counter whose parity
/// decides which grid is current.
pub struct SimulationState {
    config: GridConfig,
    grid_a: CellGrid,
    grid_b: CellGrid,
    generation: u64,
    rng: SimRng,
}

impl SimulationState {
    pub fn new(config: GridConfig) -> Self {
        Self::with_rng(config, SimRng::from_entropy())
    }

    pub fn with_rng(config: GridConfig, rng: SimRng) -> Self {
        Self {
            config,
            grid_a: CellGrid::new(config.width, config.height),
            grid_b: CellGrid::new(config.width, config.height),
            generation: 0,
            rng,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_buffer(&self) -> ActiveBuffer {
        if self.generation % 2 == 0 {
            ActiveBuffer::A
        } else {
            ActiveBuffer::B
        }
    }

    pub fn current(&self) -> &CellGrid {
        match self.active_buffer() {
            ActiveBuffer::A => &self.grid_a,
            ActiveBuffer::B => &self.grid_b,
        }
    }

    pub fn current_cells(&self) -> &[u8] {
        self.current().as_bytes()
    }

    /// Completes one frame; flips which grid is current for the next tick.
    pub fn advance(&mut self) {
        self.generation += 1;
    }

    /// Resets the generation counter to 0 and reseeds the grid that is
    /// current at generation 0. A random seed marks `floor((W*H)^0.8)`
    /// distinct cells alive; positions are sampled without replacement, so
    /// the live count hits the target exactly.
    pub fn restart(&mut self, randomize: bool) {
        self.generation = 0;
        self.grid_a.clear();
        self.grid_b.clear();
        if randomize {
            let total = self.config.cell_count();
            let target = self.config.seed_target().min(total);
            for i in index::sample(&mut self.rng, total, target) {
                self.grid_a.cells[i] = ALIVE;
            }
        }
        log::debug!(
            "restart(randomize: {}): {} live cells",
            randomize,
            self.grid_a.live_count()
        );
    }

    /// Advances one generation on the CPU. The compute shader is the
    /// production path; this one drives the same `Rule` contract for tests
    /// and headless use.
    pub fn step_cpu<R: Rule>(&mut self, rule: &R) {
        match self.active_buffer() {
            ActiveBuffer::A => step(&self.grid_a, &mut self.grid_b, rule),
            ActiveBuffer::B => step(&self.grid_b, &mut self.grid_a, rule),
        }
        self.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(config: GridConfig) -> SimulationState {
        SimulationState::with_rng(config, SimRng::seed_from_u64(42))
    }

    #[test]
    fn restart_without_randomize_clears_everything() {
        for (w, h) in [(1, 1), (3, 3), (17, 5), (100, 100)] {
            let mut sim = seeded(GridConfig::new(w, h, 1));
            sim.restart(true);
            sim.restart(false);
            assert_eq!(sim.current().live_count(), 0, "{}x{}", w, h);
            assert_eq!(sim.generation(), 0);
        }
    }

    #[test]
    fn restart_with_randomize_hits_seed_target() {
        for (w, h) in [(1, 1), (2, 1), (10, 10), (100, 100)] {
            let config = GridConfig::new(w, h, 1);
            let mut sim = seeded(config);
            sim.restart(true);
            let live = sim.current().live_count();
            assert_eq!(live, config.seed_target().min(config.cell_count()));
            assert!(live <= config.seed_target());
            if config.cell_count() > 1 {
                assert!(live >= 1);
            }
        }
    }

    #[test]
    fn restart_resets_generation_counter() {
        let mut sim = seeded(GridConfig::new(5, 5, 1));
        sim.step_cpu(&ConwayRule);
        sim.step_cpu(&ConwayRule);
        sim.step_cpu(&ConwayRule);
        assert_eq!(sim.generation(), 3);
        sim.restart(false);
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.active_buffer(), ActiveBuffer::A);
    }

    #[test]
    fn generation_parity_selects_buffer() {
        let mut sim = seeded(GridConfig::new(4, 4, 1));
        assert_eq!(sim.active_buffer(), ActiveBuffer::A);
        sim.advance();
        assert_eq!(sim.active_buffer(), ActiveBuffer::B);
        sim.advance();
        assert_eq!(sim.active_buffer(), ActiveBuffer::A);
    }

    #[test]
    fn step_never_writes_the_input_grid() {
        let mut sim = seeded(GridConfig::new(8, 8, 1));
        sim.restart(true);

        let input = sim.grid_a.cells.clone();
        sim.step_cpu(&ConwayRule); // reads A, writes B
        assert_eq!(sim.grid_a.cells, input);

        let input = sim.grid_b.cells.clone();
        sim.step_cpu(&ConwayRule); // roles swapped: reads B, writes A
        assert_eq!(sim.grid_b.cells, input);
    }

    #[test]
    fn all_dead_stays_dead() {
        let mut sim = seeded(GridConfig::new(3, 3, 1));
        sim.restart(false);
        sim.step_cpu(&ConwayRule);
        assert_eq!(sim.current().live_count(), 0);
    }

    #[test]
    fn lone_cell_dies() {
        let mut sim = seeded(GridConfig::new(3, 3, 1));
        sim.restart(false);
        sim.grid_a.set(1, 1, ALIVE);
        sim.step_cpu(&ConwayRule);
        assert_eq!(sim.current().live_count(), 0);
    }

    #[test]
    fn blinker_oscillates() {
        let mut sim = seeded(GridConfig::new(3, 3, 1));
        sim.restart(false);
        for x in 0..3 {
            sim.grid_a.set(x, 1, ALIVE);
        }

        sim.step_cpu(&ConwayRule);
        let vertical = sim.current();
        for y in 0..3 {
            assert_eq!(vertical.get(1, y), ALIVE);
        }
        assert_eq!(vertical.live_count(), 3);

        sim.step_cpu(&ConwayRule);
        let horizontal = sim.current();
        for x in 0..3 {
            assert_eq!(horizontal.get(x, 1), ALIVE);
        }
        assert_eq!(horizontal.live_count(), 3);
    }

    #[test]
    fn block_is_a_still_life() {
        // A 2x2 block against the dead-outside boundary.
        let mut sim = seeded(GridConfig::new(4, 4, 1));
        sim.restart(false);
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            sim.grid_a.set(x, y, ALIVE);
        }
        let before = sim.grid_a.cells.clone();
        sim.step_cpu(&ConwayRule);
        assert_eq!(sim.current().as_bytes(), &before[..]);
    }

    #[test]
    fn synthetic_rule_is_injectable() {
        struct AlwaysAlive;
        impl Rule for AlwaysAlive {
            fn next_state(&self, _alive: bool, _live_neighbors: u32) -> bool {
                true
            }
        }

        let mut sim = seeded(GridConfig::new(5, 3, 1));
        sim.restart(false);
        sim.step_cpu(&AlwaysAlive);
        assert_eq!(sim.current().live_count(), 15);
    }
}
