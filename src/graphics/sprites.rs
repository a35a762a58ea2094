use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use super::bitmap::{BitmapError, BitmapReader};
use crate::game::{
    food::ItemKind,
    snake::{BodyShape, Snake},
    Direction,
};

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("resource directory {0} does not exist")]
    MissingDir(PathBuf),
    #[error("missing sprite {0}")]
    Missing(PathBuf),
    #[error("sprite {path} is unusable: {source}")]
    Invalid { path: PathBuf, source: BitmapError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteId {
    Head(Direction),
    Body(BodyShape),
    Tail(Direction),
    Item(ItemKind),
    /// The two checkerboard tiles.
    Grass(bool),
    GameOver,
}

impl SpriteId {
    pub fn file_name(self) -> &'static str {
        use BodyShape::*;
        use Direction::*;

        match self {
            SpriteId::Head(Up) => "head_up.bmp",
            SpriteId::Head(Down) => "head_down.bmp",
            SpriteId::Head(Left) => "head_left.bmp",
            SpriteId::Head(Right) => "head_right.bmp",

            SpriteId::Body(Vertical) => "body_up&down.bmp",
            SpriteId::Body(Horizontal) => "body_left&right.bmp",
            SpriteId::Body(CornerUL) => "body_UL.bmp",
            SpriteId::Body(CornerUR) => "body_UR.bmp",
            SpriteId::Body(CornerDL) => "body_DL.bmp",
            SpriteId::Body(CornerDR) => "body_DR.bmp",

            SpriteId::Tail(Up) => "tail_up.bmp",
            SpriteId::Tail(Down) => "tail_down.bmp",
            SpriteId::Tail(Left) => "tail_left.bmp",
            SpriteId::Tail(Right) => "tail_right.bmp",

            SpriteId::Item(ItemKind::Common) => "apple.bmp",
            SpriteId::Item(ItemKind::SpeedBoost) => "pepper.bmp",
            SpriteId::Item(ItemKind::DoubleGrowth) => "meat.bmp",
            SpriteId::Item(ItemKind::Hazard) => "bomb.bmp",

            SpriteId::Grass(false) => "grass1.bmp",
            SpriteId::Grass(true) => "grass2.bmp",

            SpriteId::GameOver => "game_over.bmp",
        }
    }

    pub fn is_mandatory(self) -> bool {
        matches!(
            self,
            SpriteId::Head(_)
                | SpriteId::Body(BodyShape::Vertical | BodyShape::Horizontal)
                | SpriteId::Item(ItemKind::Common)
                | SpriteId::Grass(_)
        )
    }

    pub fn all() -> Vec<SpriteId> {
        use BodyShape::*;

        let mut ids = Vec::with_capacity(21);

        ids.extend(Direction::ALL.map(SpriteId::Head));
        ids.extend(
            [Vertical, Horizontal, CornerUL, CornerUR, CornerDL, CornerDR].map(SpriteId::Body),
        );
        ids.extend(Direction::ALL.map(SpriteId::Tail));
        ids.extend(ItemKind::ALL.map(SpriteId::Item));
        ids.extend([SpriteId::Grass(false), SpriteId::Grass(true), SpriteId::GameOver]);

        ids
    }
}

fn straight(d: Direction) -> SpriteId {
    if d.is_vertical() {
        SpriteId::Body(BodyShape::Vertical)
    } else {
        SpriteId::Body(BodyShape::Horizontal)
    }
}

/// Sprite for segment `i` of the snake, and what to draw instead when the
/// first choice is missing.
pub fn segment_sprite(snake: &Snake, i: usize) -> (SpriteId, SpriteId) {
    let last = snake.len().saturating_sub(1);

    if i == 0 {
        let head = SpriteId::Head(snake.direction());
        return (head, head);
    }

    if i == last {
        let d = snake.tail_direction().unwrap_or(snake.direction());
        return (SpriteId::Tail(d), straight(d));
    }

    let body = snake.body();
    let towards_head = Direction::from_offset(body[i - 1] - body[i]).unwrap_or(snake.direction());

    match snake.shape_at(i) {
        Some(shape) => (SpriteId::Body(shape), straight(towards_head)),
        None => (straight(towards_head), straight(towards_head)),
    }
}

/// Paths of the sprites found in the resource directory.
pub struct SpriteSet {
    paths: HashMap<SpriteId, PathBuf>,
}

impl SpriteSet {
    /// Check the directory up front: every mandatory sprite has to be
    /// there with a readable header, optional ones are noted if absent.
    pub fn load(dir: &Path) -> Result<Self, ResourceError> {
        if !dir.is_dir() {
            return Err(ResourceError::MissingDir(dir.to_path_buf()));
        }

        info!("Loading sprites from {}", dir.display());

        let mut paths = HashMap::new();

        for id in SpriteId::all() {
            let path = dir.join(id.file_name());

            if !path.is_file() {
                if id.is_mandatory() {
                    return Err(ResourceError::Missing(path));
                }

                warn!("Optional sprite {} not found, using a fallback", id.file_name());
                continue;
            }

            if let Err(source) = BitmapReader::open(&path) {
                if id.is_mandatory() {
                    return Err(ResourceError::Invalid { path, source });
                }

                warn!("Optional sprite {} is unusable ({source}), using a fallback", id.file_name());
                continue;
            }

            debug!("Found {}", path.display());
            paths.insert(id, path);
        }

        Ok(Self { paths })
    }

    pub fn get(&self, id: SpriteId) -> Option<&Path> {
        self.paths.get(&id).map(PathBuf::as_path)
    }

    /// First of `ids` that was found.
    pub fn first(&self, ids: &[SpriteId]) -> Option<&Path> {
        ids.iter().find_map(|&id| self.get(id))
    }

    /// An item sprite, falling back to the common one.
    pub fn item(&self, kind: ItemKind) -> Option<&Path> {
        self.first(&[SpriteId::Item(kind), SpriteId::Item(ItemKind::Common)])
    }
}
