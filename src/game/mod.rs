pub mod food;
pub mod grid;
pub mod snake;

use std::ops;

/// A cell coordinate on the board, or a pixel coordinate on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct P2(pub i32, pub i32);

impl P2 {
    pub fn center(self) -> P2 {
        P2(self.0 / 2, self.1 / 2)
    }

    /// Manhattan length. Neighbouring cells are exactly 1 apart.
    pub fn l1(self) -> i32 {
        self.0.abs() + self.1.abs()
    }
}

impl ops::Add for P2 {
    type Output = P2;
    fn add(self, rhs: P2) -> P2 {
        P2(self.0 + rhs.0, self.1 + rhs.1)
    }
}

impl ops::Sub for P2 {
    type Output = P2;
    fn sub(self, rhs: P2) -> P2 {
        P2(self.0 - rhs.0, self.1 - rhs.1)
    }
}

impl ops::Mul<i32> for P2 {
    type Output = P2;
    fn mul(self, rhs: i32) -> P2 {
        P2(self.0 * rhs, self.1 * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Screen space: y grows downwards.
    pub fn offset(self) -> P2 {
        match self {
            Direction::Up => P2(0, -1),
            Direction::Down => P2(0, 1),
            Direction::Left => P2(-1, 0),
            Direction::Right => P2(1, 0),
        }
    }

    pub fn from_offset(p: P2) -> Option<Direction> {
        match p {
            P2(0, -1) => Some(Direction::Up),
            P2(0, 1) => Some(Direction::Down),
            P2(-1, 0) => Some(Direction::Left),
            P2(1, 0) => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}
