use std::collections::VecDeque;

use super::{Direction, P2};

/// Shape of a body segment, decided by where its two neighbours are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyShape {
    Vertical,
    Horizontal,
    CornerUL,
    CornerUR,
    CornerDL,
    CornerDR,
}

/// Classify a segment from the directions pointing at its predecessor
/// (towards the head) and its successor (towards the tail).
///
/// Corners are named after the two sides the neighbours sit on, so a
/// segment with one neighbour above and one to the left is `CornerUL`
/// whichever of them is nearer the head.
pub fn body_shape(pred: Direction, succ: Direction) -> BodyShape {
    use Direction::*;

    match (pred.is_vertical(), succ.is_vertical()) {
        (true, true) => BodyShape::Vertical,
        (false, false) => BodyShape::Horizontal,
        _ => {
            let (v, h) = if pred.is_vertical() {
                (pred, succ)
            } else {
                (succ, pred)
            };

            match (v, h) {
                (Up, Left) => BodyShape::CornerUL,
                (Up, _) => BodyShape::CornerUR,
                (_, Left) => BodyShape::CornerDL,
                _ => BodyShape::CornerDR,
            }
        }
    }
}

/// The player. Body is stored head first.
#[derive(Debug, Clone)]
pub struct Snake {
    body: VecDeque<P2>,
    direction: Direction,
    alive: bool,
    growth: u32,
}

impl Snake {
    /// A straight snake with its head at `head`, trailing away from
    /// `direction`.
    pub fn new(head: P2, len: usize, direction: Direction) -> Self {
        let back = direction.opposite().offset();
        let body = (0..len.max(1) as i32).map(|i| head + back * i).collect();

        Self {
            body,
            direction,
            alive: true,
            growth: 0,
        }
    }

    /// Used to set up specific positions. The caller is responsible for
    /// handing in an orthogonal chain.
    pub fn with_body(body: impl IntoIterator<Item = P2>, direction: Direction) -> Self {
        let body: VecDeque<P2> = body.into_iter().collect();
        let alive = !body.is_empty();

        Self {
            body,
            direction,
            alive,
            growth: 0,
        }
    }

    pub fn head(&self) -> P2 {
        self.body.front().copied().unwrap_or_default()
    }

    pub fn body(&self) -> &VecDeque<P2> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Push a new head one cell ahead. The tail stays until `settle`.
    pub fn advance(&mut self) -> P2 {
        let head = self.head() + self.direction.offset();
        self.body.push_front(head);
        head
    }

    /// Finish a move: drop the tail, unless growth is owed.
    pub fn settle(&mut self) {
        if self.growth > 0 {
            self.growth -= 1;
        } else {
            self.body.pop_back();
        }
    }

    pub fn move_forward(&mut self) {
        if !self.alive || self.body.is_empty() {
            return;
        }

        self.advance();
        self.settle();
    }

    /// Turning back onto the own neck is refused. Returns whether the
    /// facing changed.
    pub fn change_direction(&mut self, direction: Direction) -> bool {
        if direction == self.direction || direction == self.direction.opposite() {
            return false;
        }

        self.direction = direction;
        true
    }

    /// Lengthen by one on the next move.
    pub fn grow(&mut self) {
        self.growth += 1;
    }

    /// Drop the tail cell. A snake of length 1 can not shrink, the
    /// caller decides what that means.
    pub fn shrink(&mut self) -> bool {
        if self.body.len() <= 1 {
            return false;
        }

        self.body.pop_back();
        true
    }

    pub fn occupies(&self, p: P2) -> bool {
        self.body.contains(&p)
    }

    pub fn hits_self(&self) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|&p| p == head)
    }

    pub fn hits_wall(&self, width: i32, height: i32) -> bool {
        let P2(x, y) = self.head();
        x < 0 || x >= width || y < 0 || y >= height
    }

    /// Shape of the segment at `i`, for `0 < i < len - 1`.
    pub fn shape_at(&self, i: usize) -> Option<BodyShape> {
        if i == 0 || i + 1 >= self.body.len() {
            return None;
        }

        let cur = self.body[i];
        let pred = Direction::from_offset(self.body[i - 1] - cur)?;
        let succ = Direction::from_offset(self.body[i + 1] - cur)?;

        Some(body_shape(pred, succ))
    }

    /// Direction from the tail cell towards the rest of the body.
    pub fn tail_direction(&self) -> Option<Direction> {
        let n = self.body.len();
        if n < 2 {
            return None;
        }

        Direction::from_offset(self.body[n - 2] - self.body[n - 1])
    }

    pub fn is_connected(&self) -> bool {
        self.body
            .iter()
            .zip(self.body.iter().skip(1))
            .all(|(&a, &b)| (a - b).l1() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    #[test]
    fn starts_straight_behind_the_head() {
        let s = Snake::new(P2(10, 6), 3, Direction::Right);

        assert_eq!(
            s.body().iter().copied().collect::<Vec<_>>(),
            vec![P2(10, 6), P2(9, 6), P2(8, 6)]
        );
        assert!(s.is_connected());
        assert!(s.is_alive());
    }

    #[test]
    fn stays_connected_on_a_random_walk() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut s = Snake::new(P2(0, 0), 3, Direction::Right);

        for step in 0..2000 {
            let d = *Direction::ALL.choose(&mut rng).unwrap();
            s.change_direction(d);

            match step % 7 {
                0 => s.grow(),
                3 => {
                    s.shrink();
                }
                _ => {}
            }

            s.move_forward();

            assert!(s.is_connected(), "broken chain at step {step}");
            assert!(s.len() >= 1);
        }
    }

    #[test]
    fn reversal_is_rejected() {
        for d in Direction::ALL {
            let mut s = Snake::new(P2(5, 5), 3, d);

            assert!(!s.change_direction(d.opposite()));
            assert_eq!(s.direction(), d);
        }

        let mut s = Snake::new(P2(5, 5), 3, Direction::Right);
        assert!(s.change_direction(Direction::Up));
        assert_eq!(s.direction(), Direction::Up);
    }

    #[test]
    fn growth_shows_up_after_one_move() {
        let mut s = Snake::new(P2(5, 5), 3, Direction::Right);

        s.move_forward();
        assert_eq!(s.len(), 3);

        s.grow();
        assert_eq!(s.len(), 3);

        s.move_forward();
        assert_eq!(s.len(), 4);
        assert_eq!(s.head(), P2(7, 5));

        s.move_forward();
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn shrink_refuses_the_last_cell() {
        let mut s = Snake::new(P2(5, 5), 2, Direction::Right);

        assert!(s.shrink());
        assert_eq!(s.len(), 1);

        assert!(!s.shrink());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn wall_predicate_matches_bounds() {
        let (w, h) = (20, 12);

        for x in -2..w + 2 {
            for y in -2..h + 2 {
                let s = Snake::with_body([P2(x, y)], Direction::Up);
                let inside = (0..w).contains(&x) && (0..h).contains(&y);

                assert_eq!(s.hits_wall(w, h), !inside, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn detects_running_into_itself() {
        // A coil: moving up lands on a cell the body still covers after the tail moves.
        let mut s = Snake::with_body(
            [P2(2, 2), P2(2, 3), P2(3, 3), P2(3, 2), P2(3, 1), P2(2, 1), P2(1, 1)],
            Direction::Up,
        );
        s.advance();
        s.settle();

        assert!(s.hits_self());
    }

    #[test]
    fn classifies_body_shapes() {
        use Direction::*;

        assert_eq!(body_shape(Up, Down), BodyShape::Vertical);
        assert_eq!(body_shape(Left, Right), BodyShape::Horizontal);

        assert_eq!(body_shape(Up, Left), BodyShape::CornerUL);
        assert_eq!(body_shape(Left, Up), BodyShape::CornerUL);
        assert_eq!(body_shape(Up, Right), BodyShape::CornerUR);
        assert_eq!(body_shape(Right, Up), BodyShape::CornerUR);
        assert_eq!(body_shape(Down, Left), BodyShape::CornerDL);
        assert_eq!(body_shape(Left, Down), BodyShape::CornerDL);
        assert_eq!(body_shape(Down, Right), BodyShape::CornerDR);
        assert_eq!(body_shape(Right, Down), BodyShape::CornerDR);
    }

    #[test]
    fn shapes_and_tail_of_a_bent_snake() {
        // Head at the top, going up; body turns right at (1, 1).
        let s = Snake::with_body([P2(1, 0), P2(1, 1), P2(2, 1), P2(3, 1)], Direction::Up);

        assert_eq!(s.shape_at(0), None);
        assert_eq!(s.shape_at(1), Some(BodyShape::CornerUR));
        assert_eq!(s.shape_at(2), Some(BodyShape::Horizontal));
        assert_eq!(s.shape_at(3), None);
        assert_eq!(s.tail_direction(), Some(Direction::Left));
    }
}
