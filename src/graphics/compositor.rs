use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use super::{
    bitmap::bitmap_size,
    sprites::{segment_sprite, SpriteId, SpriteSet},
    Argb, Surface,
};
use crate::{
    data::Config,
    game::{food::ItemKind, snake::Snake, P2},
};

/// What one frame shows. Copied out of the world so drawing happens
/// without holding the game lock.
#[derive(Debug, Clone)]
pub struct Frame {
    pub snake: Snake,
    pub items: Vec<(P2, ItemKind)>,
    pub game_over: bool,
}

pub struct Compositor {
    surface: Surface,
    sprites: SpriteSet,
    cell: i32,
    board: (i32, i32),
    key: Argb,
    overlay: Option<P2>,
    failed: HashSet<PathBuf>,
}

fn blit(
    surface: &mut Surface,
    failed: &mut HashSet<PathBuf>,
    path: &Path,
    origin: P2,
    key: Option<Argb>,
) {
    let result = match key {
        Some(key) => surface.draw_bitmap_transparent(path, origin, key),
        None => surface.draw_bitmap(path, origin),
    };

    if let Err(e) = result {
        if failed.insert(path.to_path_buf()) {
            warn!("Skipping {}: {e}", path.display());
        } else {
            debug!("Skipping {}: {e}", path.display());
        }
    }
}

impl Compositor {
    pub fn new(surface: Surface, sprites: SpriteSet, config: &Config) -> Self {
        let area = P2(
            config.screen_width.min(surface.width()) as i32,
            config.screen_height.min(surface.height()) as i32,
        );

        let overlay = sprites
            .get(SpriteId::GameOver)
            .and_then(|path| match bitmap_size(path) {
                Ok((w, h)) => Some((area - P2(w as i32, h as i32)).center()),
                Err(e) => {
                    warn!("Game over overlay unusable: {e}");
                    None
                }
            });

        Self {
            surface,
            sprites,
            cell: config.cell_size as i32,
            board: config.board_size(),
            key: config.transparent_color,
            overlay,
            failed: HashSet::new(),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn into_surface(self) -> Surface {
        self.surface
    }

    fn origin(&self, cell: P2) -> P2 {
        cell * self.cell
    }

    /// Tile the checkerboard from the sprite files, bypassing the cache.
    pub fn compose_terrain(&mut self) {
        let (w, h) = self.board;

        for y in 0..h {
            for x in 0..w {
                let origin = self.origin(P2(x, y));
                let id = SpriteId::Grass((x + y) % 2 == 1);

                if let Some(path) = self.sprites.get(id) {
                    blit(&mut self.surface, &mut self.failed, path, origin, None);
                }
            }
        }
    }

    /// Terrain layer: copied from the cache, composed and cached on the
    /// first call.
    pub fn draw_terrain(&mut self) {
        if self.surface.restore_background() {
            return;
        }

        debug!("Composing terrain");
        self.compose_terrain();
        self.surface.capture_background();
    }

    pub fn draw_frame(&mut self, frame: &Frame) {
        self.draw_terrain();

        for &(pos, kind) in &frame.items {
            let origin = self.origin(pos);

            if let Some(path) = self.sprites.item(kind) {
                blit(&mut self.surface, &mut self.failed, path, origin, Some(self.key));
            }
        }

        // Tail first so the head ends up on top.
        for i in (0..frame.snake.len()).rev() {
            let origin = self.origin(frame.snake.body()[i]);
            let (wanted, fallback) = segment_sprite(&frame.snake, i);

            if let Some(path) = self.sprites.first(&[wanted, fallback]) {
                blit(&mut self.surface, &mut self.failed, path, origin, Some(self.key));
            }
        }

        if frame.game_over {
            if let (Some(origin), Some(path)) = (self.overlay, self.sprites.get(SpriteId::GameOver)) {
                blit(&mut self.surface, &mut self.failed, path, origin, Some(self.key));
            }
        }

        self.surface.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::{snake::BodyShape, Direction},
        graphics::{
            bitmap::fixtures,
            sprites::tests::{color_of, write_sprites},
        },
    };

    fn config() -> Config {
        Config {
            screen_width: 8,
            screen_height: 8,
            cell_size: 2,
            ..Config::default()
        }
    }

    fn compositor(dir: &Path, optional: bool) -> Compositor {
        write_sprites(dir, 2, optional);
        let sprites = SpriteSet::load(dir).unwrap();
        Compositor::new(Surface::memory(8, 8, 4).unwrap(), sprites, &config())
    }

    fn at(c: &Compositor, cell: P2) -> Argb {
        let P2(x, y) = cell * 2;
        c.surface().pixel(x, y).unwrap()
    }

    #[test]
    fn terrain_is_a_checkerboard() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = compositor(dir.path(), false);
        c.draw_terrain();

        assert_eq!(at(&c, P2(0, 0)), color_of(SpriteId::Grass(false)));
        assert_eq!(at(&c, P2(1, 0)), color_of(SpriteId::Grass(true)));
        assert_eq!(at(&c, P2(1, 1)), color_of(SpriteId::Grass(false)));
        assert_eq!(at(&c, P2(3, 2)), color_of(SpriteId::Grass(true)));
    }

    #[test]
    fn cached_terrain_matches_a_full_recomposite() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = compositor(dir.path(), true);

        c.draw_terrain();
        let first = c.surface().bytes().to_vec();

        let frame = Frame {
            snake: Snake::new(P2(2, 1), 3, Direction::Right),
            items: vec![(P2(3, 3), ItemKind::Common)],
            game_over: true,
        };
        c.draw_frame(&frame);
        assert_ne!(c.surface().bytes(), &first[..]);

        // the cache must not touch the files again
        std::fs::remove_file(dir.path().join("grass1.bmp")).unwrap();
        c.draw_terrain();
        assert_eq!(c.surface().bytes(), &first[..]);

        let mut fresh = compositor(dir.path(), true);
        fresh.compose_terrain();
        assert_eq!(fresh.surface().bytes(), &first[..]);
    }

    #[test]
    fn frame_layers() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = compositor(dir.path(), true);

        let frame = Frame {
            snake: Snake::with_body([P2(1, 0), P2(1, 1), P2(2, 1), P2(3, 1)], Direction::Up),
            items: vec![(P2(0, 3), ItemKind::Hazard)],
            game_over: false,
        };
        c.draw_frame(&frame);

        assert_eq!(at(&c, P2(1, 0)), color_of(SpriteId::Head(Direction::Up)));
        assert_eq!(at(&c, P2(1, 1)), color_of(SpriteId::Body(BodyShape::CornerUR)));
        assert_eq!(at(&c, P2(2, 1)), color_of(SpriteId::Body(BodyShape::Horizontal)));
        assert_eq!(at(&c, P2(3, 1)), color_of(SpriteId::Tail(Direction::Left)));
        assert_eq!(at(&c, P2(0, 3)), color_of(SpriteId::Item(ItemKind::Hazard)));
        assert_eq!(at(&c, P2(0, 0)), color_of(SpriteId::Grass(false)));
    }

    #[test]
    fn missing_optional_sprites_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = compositor(dir.path(), false);

        let frame = Frame {
            snake: Snake::with_body([P2(1, 0), P2(1, 1), P2(2, 1), P2(3, 1)], Direction::Up),
            items: vec![(P2(0, 3), ItemKind::SpeedBoost)],
            game_over: true,
        };
        c.draw_frame(&frame);

        let vertical = color_of(SpriteId::Body(BodyShape::Vertical));
        let horizontal = color_of(SpriteId::Body(BodyShape::Horizontal));

        assert_eq!(at(&c, P2(1, 1)), vertical);
        assert_eq!(at(&c, P2(3, 1)), horizontal);
        assert_eq!(at(&c, P2(0, 3)), color_of(SpriteId::Item(ItemKind::Common)));
        // no overlay without its sprite
        assert_eq!(at(&c, P2(2, 2)), color_of(SpriteId::Grass(false)));
    }

    #[test]
    fn overlay_is_centered_and_cut_out() {
        let dir = tempfile::tempdir().unwrap();
        write_sprites(dir.path(), 2, false);

        let red: Argb = 0xFF_FF_00_00;
        let key = Config::default().transparent_color;
        // 4x2 overlay, white corners are transparent
        fixtures::write(
            dir.path(),
            "game_over.bmp",
            4,
            2,
            24,
            &[key, red, red, red, red, red, red, key],
        );

        let sprites = SpriteSet::load(dir.path()).unwrap();
        let mut c = Compositor::new(Surface::memory(8, 8, 4).unwrap(), sprites, &config());

        let frame = Frame {
            snake: Snake::new(P2(0, 0), 1, Direction::Right),
            items: vec![],
            game_over: true,
        };
        c.draw_frame(&frame);

        // (8 - 4) / 2 = 2, (8 - 2) / 2 = 3
        let s = c.surface();
        assert_eq!(s.pixel(2, 3), Some(color_of(SpriteId::Grass(false))));
        assert_eq!(s.pixel(3, 3), Some(red));
        assert_eq!(s.pixel(5, 4), Some(color_of(SpriteId::Grass(false))));
        assert_eq!(s.pixel(4, 4), Some(red));
        assert_eq!(s.pixel(1, 3), Some(color_of(SpriteId::Grass(true))));
    }
}
