use std::time::{Duration, Instant};

use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use super::{grid::Grid, snake::Snake, P2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Grow by one.
    Common,
    /// Grow by one and move faster for a while.
    SpeedBoost,
    /// Grow by two.
    DoubleGrowth,
    /// Shrink by two.
    Hazard,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [
        ItemKind::Common,
        ItemKind::SpeedBoost,
        ItemKind::DoubleGrowth,
        ItemKind::Hazard,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ItemKind::Common => "apple",
            ItemKind::SpeedBoost => "pepper",
            ItemKind::DoubleGrowth => "meat",
            ItemKind::Hazard => "bomb",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub pos: P2,
    pub kind: ItemKind,
    pub expires: Instant,
}

impl Item {
    pub fn new(pos: P2, kind: ItemKind, expires: Instant) -> Self {
        Self { pos, kind, expires }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires
    }
}

/// The items currently on the board.
pub struct ItemPool {
    items: Vec<Item>,
    capacity: usize,
    lifetime: Duration,
    kinds: Option<WeightedIndex<u32>>,
}

impl ItemPool {
    /// `weights` follow the order of [`ItemKind::ALL`]. All zero means
    /// every spawn is `Common`.
    pub fn new(capacity: usize, lifetime: Duration, weights: [u32; 4]) -> Self {
        let kinds = WeightedIndex::new(weights).ok();

        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            lifetime,
            kinds,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Place an item as is. Overlap checks are the caller's business.
    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn at(&self, p: P2) -> Option<&Item> {
        self.items.iter().find(|item| item.pos == p)
    }

    /// Remove and return the first item at `p`.
    pub fn take_at(&mut self, p: P2) -> Option<Item> {
        let i = self.items.iter().position(|item| item.pos == p)?;
        Some(self.items.remove(i))
    }

    /// Remove expired items, returning how many went.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !item.is_expired(now));
        before - self.items.len()
    }

    /// Cells an item may spawn on: open, off the snake, not holding
    /// another item.
    pub fn free_cells(&self, grid: &Grid, snake: &Snake) -> Vec<P2> {
        grid.open_cells()
            .filter(|&p| !snake.occupies(p) && self.at(p).is_none())
            .collect()
    }

    /// Top the pool up to capacity. Positions are drawn uniformly from the
    /// free cells, so a full board just leaves the pool short.
    pub fn refill(&mut self, grid: &Grid, snake: &Snake, rng: &mut impl Rng, now: Instant) -> usize {
        if self.items.len() >= self.capacity {
            return 0;
        }

        let mut free = self.free_cells(grid, snake);
        let mut added = 0;

        while self.items.len() < self.capacity && !free.is_empty() {
            let pos = free.swap_remove(rng.gen_range(0..free.len()));
            let kind = match &self.kinds {
                Some(kinds) => ItemKind::ALL[kinds.sample(rng)],
                None => ItemKind::Common,
            };

            self.items.push(Item::new(pos, kind, now + self.lifetime));
            added += 1;
        }

        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Direction;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    const WEIGHTS: [u32; 4] = [50, 15, 20, 15];

    #[test]
    fn spawns_never_overlap() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = Grid::new(6, 4);
        let now = Instant::now();

        for round in 0..200 {
            let snake = Snake::new(P2(3 + round % 2, 2), 4, Direction::Right);
            let mut pool = ItemPool::new(8, Duration::from_secs(10), WEIGHTS);

            pool.refill(&grid, &snake, &mut rng, now);
            assert_eq!(pool.len(), 8);

            let mut seen = HashSet::new();
            for item in pool.items() {
                assert!(!snake.occupies(item.pos));
                assert!(grid.contains(item.pos));
                assert!(seen.insert(item.pos), "two items on {:?}", item.pos);
            }
        }
    }

    #[test]
    fn full_board_leaves_pool_short() {
        let mut rng = StdRng::seed_from_u64(1);
        let grid = Grid::new(3, 1);
        let snake = Snake::new(P2(1, 0), 2, Direction::Right);
        let mut pool = ItemPool::new(3, Duration::from_secs(1), WEIGHTS);

        assert_eq!(pool.refill(&grid, &snake, &mut rng, Instant::now()), 1);
        assert_eq!(pool.items()[0].pos, P2(2, 0));

        assert_eq!(pool.refill(&grid, &snake, &mut rng, Instant::now()), 0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn walls_are_not_free() {
        let grid = Grid::with_border(4, 4);
        let snake = Snake::new(P2(1, 1), 1, Direction::Right);
        let pool = ItemPool::new(3, Duration::from_secs(1), WEIGHTS);

        let free = pool.free_cells(&grid, &snake);
        assert_eq!(free.len(), 3);
        assert!(free.iter().all(|&p| !grid.is_wall(p)));
    }

    #[test]
    fn expiry_sweep() {
        let now = Instant::now();
        let mut pool = ItemPool::new(3, Duration::from_secs(1), WEIGHTS);

        pool.push(Item::new(P2(0, 0), ItemKind::Common, now));
        pool.push(Item::new(P2(1, 0), ItemKind::Hazard, now + Duration::from_secs(5)));

        assert_eq!(pool.expire(now + Duration::from_millis(1)), 1);
        assert_eq!(pool.items()[0].kind, ItemKind::Hazard);
    }

    #[test]
    fn take_at_removes_first_match_only() {
        let now = Instant::now();
        let mut pool = ItemPool::new(3, Duration::from_secs(1), WEIGHTS);

        pool.push(Item::new(P2(2, 2), ItemKind::Common, now));
        pool.push(Item::new(P2(2, 2), ItemKind::Hazard, now));

        assert_eq!(pool.take_at(P2(2, 2)).map(|i| i.kind), Some(ItemKind::Common));
        assert_eq!(pool.len(), 1);
        assert!(pool.take_at(P2(0, 0)).is_none());
    }

    #[test]
    fn zero_weights_fall_back_to_common() {
        let mut rng = StdRng::seed_from_u64(9);
        let grid = Grid::new(5, 5);
        let snake = Snake::new(P2(0, 0), 1, Direction::Right);
        let mut pool = ItemPool::new(5, Duration::from_secs(1), [0; 4]);

        pool.refill(&grid, &snake, &mut rng, Instant::now());
        assert!(pool.items().iter().all(|i| i.kind == ItemKind::Common));
    }
}
