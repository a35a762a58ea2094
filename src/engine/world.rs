use std::time::{Duration, Instant};

use rand::rngs::StdRng;

use crate::{
    data::{Config, INITIAL_LENGTH},
    game::{
        food::{Item, ItemKind, ItemPool},
        grid::Grid,
        snake::Snake,
        Direction, P2,
    },
    graphics::compositor::Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Wall,
    Itself,
    /// A hazard would have shrunk the snake below one cell.
    Starved,
    Vanished,
}

impl Cause {
    pub fn describe(self) -> &'static str {
        match self {
            Cause::Wall => "hit a wall",
            Cause::Itself => "ran into itself",
            Cause::Starved => "shrank to nothing",
            Cause::Vanished => "lost its body",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Moved { ate: Option<ItemKind> },
    Over(Cause),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Applied,
    /// Reversal or no change. The intent is spent.
    Rejected,
    /// A turn already happened this tick; try again after the next one.
    Deferred,
}

#[derive(Debug, Clone, Copy)]
struct SpeedBoost {
    until: Instant,
    interval: Duration,
}

/// Everything the logic thread mutates. Time comes in from outside so
/// the whole thing can be driven step by step.
pub struct World {
    config: Config,
    grid: Grid,
    snake: Snake,
    items: ItemPool,
    rng: StdRng,
    interval: Duration,
    boost: Option<SpeedBoost>,
    turned: bool,
    score: u32,
    ticks: u64,
}

impl World {
    pub fn new(config: &Config, rng: StdRng, now: Instant) -> Self {
        let (w, h) = config.board_size();

        let grid = if config.border_walls {
            Grid::with_border(w, h)
        } else {
            Grid::new(w, h)
        };

        let items = ItemPool::new(
            config.max_items,
            config.item_lifetime(),
            config.item_weights.as_array(),
        );

        let mut world = Self {
            config: config.clone(),
            snake: Self::spawn_snake(&grid),
            grid,
            items,
            rng,
            interval: config.interval_for(INITIAL_LENGTH),
            boost: None,
            turned: false,
            score: 0,
            ticks: 0,
        };

        world.reset(now);
        world
    }

    fn spawn_snake(grid: &Grid) -> Snake {
        let center = P2(grid.width(), grid.height()).center();
        Snake::new(center, INITIAL_LENGTH, Direction::Right)
    }

    /// Back to the starting position with a fresh set of items.
    pub fn reset(&mut self, now: Instant) {
        self.snake = Self::spawn_snake(&self.grid);
        self.items.clear();
        self.items.refill(&self.grid, &self.snake, &mut self.rng, now);

        self.interval = self.config.interval_for(self.snake.len());
        self.boost = None;
        self.turned = false;
        self.score = 0;
        self.ticks = 0;

        self.rederive();
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn items(&self) -> &[Item] {
        self.items.items()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_boosted(&self) -> bool {
        self.boost.is_some()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// At most one turn lands between two ticks.
    pub fn steer(&mut self, direction: Direction) -> Steer {
        if !self.snake.is_alive() {
            return Steer::Rejected;
        }

        if self.turned {
            return Steer::Deferred;
        }

        if self.snake.change_direction(direction) {
            self.turned = true;
            Steer::Applied
        } else {
            Steer::Rejected
        }
    }

    /// Put an item down as is, e.g. to stage a position.
    pub fn place_item(&mut self, pos: P2, kind: ItemKind, now: Instant) {
        self.items
            .push(Item::new(pos, kind, now + self.config.item_lifetime()));
        self.rederive();
    }

    pub fn replace_snake(&mut self, snake: Snake) {
        self.interval = self.config.interval_for(snake.len());
        self.snake = snake;
        self.rederive();
    }

    pub fn tick(&mut self, now: Instant) -> Tick {
        if !self.snake.is_alive() || self.snake.is_empty() {
            return Tick::Over(Cause::Vanished);
        }

        self.ticks += 1;
        self.turned = false;

        let head = self.snake.advance();
        let eaten = self.items.take_at(head).map(|item| item.kind);

        let mut hazard = false;

        match eaten {
            Some(ItemKind::Common) => {
                self.snake.grow();
                self.score += 1;
            }
            Some(ItemKind::DoubleGrowth) => {
                self.snake.grow();
                self.snake.grow();
                self.score += 2;
            }
            Some(ItemKind::SpeedBoost) => {
                self.snake.grow();
                self.score += 1;
                self.start_boost(now);
            }
            Some(ItemKind::Hazard) => {
                hazard = true;
                self.score = self.score.saturating_sub(2);
            }
            None => {}
        }

        self.snake.settle();

        if hazard && !(self.snake.shrink() && self.snake.shrink()) {
            return self.end(Cause::Starved);
        }

        if self.snake.is_empty() {
            return self.end(Cause::Vanished);
        }

        let (w, h) = (self.grid.width(), self.grid.height());

        if self.snake.hits_wall(w, h) || self.grid.is_wall(head) {
            return self.end(Cause::Wall);
        }

        if self.snake.hits_self() {
            return self.end(Cause::Itself);
        }

        if self.boost.is_some_and(|b| now >= b.until) {
            self.boost = None;
        }

        self.items.expire(now);
        self.items
            .refill(&self.grid, &self.snake, &mut self.rng, now);

        self.interval = match self.boost {
            Some(b) => b.interval,
            None => self.config.interval_for(self.snake.len()),
        };

        self.rederive();

        Tick::Moved { ate: eaten }
    }

    fn start_boost(&mut self, now: Instant) {
        let until = now + self.config.speed_boost();

        // Eating another one while boosted only extends it.
        let interval = match self.boost {
            Some(b) => b.interval,
            None => self.config.boosted(self.interval),
        };

        self.boost = Some(SpeedBoost { until, interval });
    }

    fn end(&mut self, cause: Cause) -> Tick {
        self.snake.kill();
        self.boost = None;
        self.rederive();
        Tick::Over(cause)
    }

    fn rederive(&mut self) {
        let items = self.items.items().iter().map(|item| (item.pos, item.kind));
        self.grid.rederive(self.snake.body(), items);
    }

    /// A copy of what the renderer needs, taken under the lock.
    pub fn snapshot(&self) -> Frame {
        Frame {
            snake: self.snake.clone(),
            items: self
                .items
                .items()
                .iter()
                .map(|item| (item.pos, item.kind))
                .collect(),
            game_over: !self.snake.is_alive(),
        }
    }
}
