use std::{
    io::{Read, Seek},
    path::Path,
};

use super::{
    bitmap::{BitmapError, BitmapReader},
    Argb, Surface,
};
use crate::game::P2;

impl Surface {
    /// Decode the bitmap at `path` straight onto the surface with its top
    /// left corner at `origin`.
    pub fn draw_bitmap(&mut self, path: &Path, origin: P2) -> Result<(), BitmapError> {
        self.blit(BitmapReader::open(path)?, origin, None)
    }

    /// Like `draw_bitmap`, but pixels equal to `key` are left alone.
    pub fn draw_bitmap_transparent(
        &mut self,
        path: &Path,
        origin: P2,
        key: Argb,
    ) -> Result<(), BitmapError> {
        self.blit(BitmapReader::open(path)?, origin, Some(key))
    }

    /// Rows already written stay written if the file turns out short.
    pub fn blit<R: Read + Seek>(
        &mut self,
        mut reader: BitmapReader<R>,
        origin: P2,
        key: Option<Argb>,
    ) -> Result<(), BitmapError> {
        let header = *reader.header();

        while let Some((r, row)) = reader.next_row()? {
            let y = origin.1 + header.image_row(r) as i32;

            for (x, &color) in row.iter().enumerate() {
                if key == Some(color) {
                    continue;
                }

                self.put_pixel(origin.0 + x as i32, y, color);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::TRANSPARENT,
        graphics::{bitmap::fixtures, Pixel},
    };

    const RED: Argb = 0xFF_FF_00_00;
    const BLUE: Argb = 0xFF_00_00_FF;

    #[test]
    fn bottom_up_file_lands_upright() {
        let dir = tempfile::tempdir().unwrap();
        // top row red, bottom row blue
        let path = fixtures::write(dir.path(), "a.bmp", 2, 2, 24, &[RED, RED, BLUE, BLUE]);

        let mut s = Surface::memory(5, 5, 4).unwrap();
        s.draw_bitmap(&path, P2(1, 2)).unwrap();

        assert_eq!(s.pixel(1, 2), Some(RED));
        assert_eq!(s.pixel(2, 2), Some(RED));
        assert_eq!(s.pixel(1, 3), Some(BLUE));
        assert_eq!(s.pixel(2, 3), Some(BLUE));
        assert_eq!(s.pixel(0, 2), Some(0));
        assert_eq!(s.pixel(1, 4), Some(0));
    }

    #[test]
    fn top_down_file_maps_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write(dir.path(), "a.bmp", 1, -2, 32, &[RED, BLUE]);

        let mut s = Surface::memory(2, 2, 4).unwrap();
        s.draw_bitmap(&path, P2(0, 0)).unwrap();

        assert_eq!(s.pixel(0, 0), Some(RED));
        assert_eq!(s.pixel(0, 1), Some(BLUE));
    }

    #[test]
    fn transparent_pixels_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write(
            dir.path(),
            "cut.bmp",
            2,
            2,
            24,
            &[TRANSPARENT, RED, BLUE, TRANSPARENT],
        );

        let mut s = Surface::memory(2, 2, 4).unwrap();
        s.fill(Argb::black());
        s.draw_bitmap_transparent(&path, P2(0, 0), TRANSPARENT).unwrap();

        assert_eq!(s.pixel(0, 0), Some(Argb::black()));
        assert_eq!(s.pixel(1, 0), Some(RED));
        assert_eq!(s.pixel(0, 1), Some(BLUE));
        assert_eq!(s.pixel(1, 1), Some(Argb::black()));

        // the opaque path writes the sentinel like any other color
        s.draw_bitmap(&path, P2(0, 0)).unwrap();
        assert_eq!(s.pixel(0, 0), Some(TRANSPARENT));
    }

    #[test]
    fn clips_at_the_edges() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::solid(dir.path(), "sq.bmp", 3, RED);

        let mut s = Surface::memory(4, 4, 3).unwrap();
        s.draw_bitmap(&path, P2(2, -1)).unwrap();

        assert_eq!(s.pixel(2, 0), Some(RED & 0x00_FF_FF_FF));
        assert_eq!(s.pixel(3, 1), Some(RED & 0x00_FF_FF_FF));
        assert_eq!(s.pixel(1, 0), Some(0));
        assert_eq!(s.pixel(2, 2), Some(0));
    }

    #[test]
    fn malformed_file_draws_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.bmp");
        std::fs::write(&path, b"this is not a bitmap at all, honestly").unwrap();

        let mut s = Surface::memory(2, 2, 4).unwrap();
        assert!(matches!(
            s.draw_bitmap(&path, P2(0, 0)),
            Err(BitmapError::BadMagic(_))
        ));
        assert!(s.bytes().iter().all(|&b| b == 0));

        assert!(matches!(
            s.draw_bitmap(&dir.path().join("missing.bmp"), P2(0, 0)),
            Err(BitmapError::Io(_))
        ));
    }
}
