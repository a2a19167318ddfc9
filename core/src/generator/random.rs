use super::*;

/// Places mines uniformly at random, optionally keeping the start cell (and
/// for [`StartCell::AlwaysZero`] its neighbors too) clear.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
    start: Coord2,
    start_cell: StartCell,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64, start: Coord2, start_cell: StartCell) -> Self {
        Self {
            seed,
            start,
            start_cell,
        }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout {
        use StartCell::*;
        use rand::prelude::*;

        let total_cells = config.total_cells();
        let size = config.size.to_nd_index();

        if config.mines >= total_cells {
            if config.mines > total_cells {
                log::warn!(
                    "Layout already full, requested {} mines but only {} fit",
                    config.mines,
                    total_cells
                );
            }
            return MineLayout::from_mine_mask(Array2::from_elem(size, true));
        }

        let mut reserved: Array2<bool> = Array2::default(size);
        if in_bounds(self.start, config.size) {
            let start_cell = match self.start_cell {
                Random => Random,
                SimpleSafe | AlwaysZero if config.mines + 1 > total_cells => {
                    log::warn!("Cannot make start cell safe, fallback to random");
                    Random
                }
                SimpleSafe => SimpleSafe,
                AlwaysZero => {
                    let zone = reserved.iter_neighbors(self.start).count() as CellCount + 1;
                    if config.mines + zone > total_cells {
                        log::warn!("Cannot make start cell zero, fallback to simple safe");
                        SimpleSafe
                    } else {
                        AlwaysZero
                    }
                }
            };

            match start_cell {
                Random => {}
                SimpleSafe => reserved[self.start.to_nd_index()] = true,
                AlwaysZero => {
                    reserved[self.start.to_nd_index()] = true;
                    for coords in reserved.iter_neighbors(self.start) {
                        reserved[coords.to_nd_index()] = true;
                    }
                }
            }
        } else {
            log::warn!("Start cell {:?} is off the board, ignoring it", self.start);
        }

        let mut candidates: Vec<usize> = reserved
            .iter()
            .enumerate()
            .filter(|&(_, &is_reserved)| !is_reserved)
            .map(|(i, _)| i)
            .collect();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let (chosen, _) = candidates.partial_shuffle(&mut rng, config.mines.into());

        let mut mine_mask: Array2<bool> = Array2::default(size);
        let cols = usize::from(config.size.1);
        for &i in chosen.iter() {
            mine_mask[[i / cols, i % cols]] = true;
        }

        let layout = MineLayout::from_mine_mask(mine_mask);
        if layout.mine_count() != config.mines {
            log::warn!(
                "Generated layout count mismatch, actual: {}, requested: {}",
                layout.mine_count(),
                config.mines
            );
        }
        layout
    }
}
