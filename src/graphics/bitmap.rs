//! Reader for the subset of Windows bitmaps the sprites come in:
//! uncompressed 24 or 32 bits per pixel, either row order.
//!
//! Pixels are handed out one scanline at a time, already packed as ARGB.

use std::{
    fs::File,
    io::{self, BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use super::{Argb, Pixel};

pub const MAGIC: u16 = 0x4D42;

const OFFSET_DATA: usize = 0x0A;
const OFFSET_WIDTH: usize = 0x12;
const OFFSET_HEIGHT: usize = 0x16;
const OFFSET_DEPTH: usize = 0x1C;

/// Bytes needed to reach the last field we read.
const HEADER_LEN: usize = OFFSET_DEPTH + 2;

/// Anything wider or taller than this is a corrupt header, not a sprite.
const MAX_SIDE: u32 = 1 << 14;

#[derive(Debug, thiserror::Error)]
pub enum BitmapError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("not a bitmap (magic {0:#06x})")]
    BadMagic(u16),
    #[error("file ends inside the {0}")]
    Truncated(&'static str),
    #[error("{0} bits per pixel is not supported")]
    UnsupportedDepth(u16),
    #[error("bad dimensions {width}x{height}")]
    BadDimensions { width: i32, height: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpHeader {
    pub data_offset: u32,
    pub width: u32,
    pub height: u32,
    /// Positive height in the file: last scanline first.
    pub bottom_up: bool,
    pub depth: u16,
}

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

impl BmpHeader {
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Result<Self, BitmapError> {
        let magic = u16_at(bytes, 0);
        if magic != MAGIC {
            return Err(BitmapError::BadMagic(magic));
        }

        let width = u32_at(bytes, OFFSET_WIDTH) as i32;
        let height = u32_at(bytes, OFFSET_HEIGHT) as i32;

        if width <= 0 || height == 0 || width as u32 > MAX_SIDE || height.unsigned_abs() > MAX_SIDE {
            return Err(BitmapError::BadDimensions { width, height });
        }

        let depth = u16_at(bytes, OFFSET_DEPTH);
        if depth != 24 && depth != 32 {
            return Err(BitmapError::UnsupportedDepth(depth));
        }

        Ok(Self {
            data_offset: u32_at(bytes, OFFSET_DATA),
            width: width as u32,
            height: height.unsigned_abs(),
            bottom_up: height > 0,
            depth,
        })
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.depth as usize / 8
    }

    /// Scanline length on disk, padded to 4 bytes.
    pub fn row_len(&self) -> usize {
        (self.width as usize * self.bytes_per_pixel() + 3) / 4 * 4
    }

    /// Image row (top = 0) that file scanline `r` holds.
    pub fn image_row(&self, r: u32) -> u32 {
        if self.bottom_up {
            self.height - 1 - r
        } else {
            r
        }
    }
}

fn read_full(reader: &mut impl Read, buf: &mut [u8], what: &'static str) -> Result<(), BitmapError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => BitmapError::Truncated(what),
        _ => BitmapError::Io(e),
    })
}

pub struct BitmapReader<R> {
    header: BmpHeader,
    reader: R,
    raw: Vec<u8>,
    row: Vec<Argb>,
    next: u32,
}

impl BitmapReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, BitmapError> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read + Seek> BitmapReader<R> {
    pub fn new(mut reader: R) -> Result<Self, BitmapError> {
        let mut bytes = [0u8; HEADER_LEN];
        read_full(&mut reader, &mut bytes, "header")?;

        let header = BmpHeader::parse(&bytes)?;
        reader.seek(SeekFrom::Start(header.data_offset as u64))?;

        Ok(Self {
            raw: vec![0; header.row_len()],
            row: Vec::with_capacity(header.width as usize),
            header,
            reader,
            next: 0,
        })
    }

    pub fn header(&self) -> &BmpHeader {
        &self.header
    }

    /// The next scanline in file order, with its index in the file.
    /// `None` once every scanline has been read.
    pub fn next_row(&mut self) -> Result<Option<(u32, &[Argb])>, BitmapError> {
        if self.next >= self.header.height {
            return Ok(None);
        }

        read_full(&mut self.reader, &mut self.raw, "pixel data")?;

        let bpp = self.header.bytes_per_pixel();
        let width = self.header.width as usize;

        self.row.clear();
        self.row.extend(self.raw[..width * bpp].chunks_exact(bpp).map(|px| {
            let alpha = if bpp == 4 { px[3] } else { 0xFF };
            Argb::from_bgra(px[0], px[1], px[2], alpha)
        }));

        let r = self.next;
        self.next += 1;

        Ok(Some((r, &self.row)))
    }
}

/// Width and height from the header alone.
pub fn bitmap_size(path: &Path) -> Result<(u32, u32), BitmapError> {
    let reader = BitmapReader::open(path)?;
    let h = reader.header();
    Ok((h.width, h.height))
}


#[cfg(test)]
mod tests {
    use super::{fixtures::encode, *};
    use std::io::Cursor;

    fn rows(bytes: Vec<u8>) -> Result<Vec<(u32, Vec<Argb>)>, BitmapError> {
        let mut reader = BitmapReader::new(Cursor::new(bytes))?;
        let mut out = Vec::new();

        while let Some((r, row)) = reader.next_row()? {
            out.push((r, row.to_vec()));
        }

        Ok(out)
    }

    #[test]
    fn header_fields() {
        let bytes = encode(3, -2, 32, &[0; 6]);
        let reader = BitmapReader::new(Cursor::new(bytes)).unwrap();

        assert_eq!(
            *reader.header(),
            BmpHeader {
                data_offset: 54,
                width: 3,
                height: 2,
                bottom_up: false,
                depth: 32,
            }
        );
        assert_eq!(reader.header().row_len(), 12);
    }

    #[test]
    fn twenty_four_bit_is_opaque() {
        let pixels = [0x00_11_22_33, 0x7F_44_55_66, 0xFF_77_88_99, 0x00_00_00_00];
        let decoded = rows(encode(2, 2, 24, &pixels)).unwrap();

        for (_, row) in &decoded {
            assert!(row.iter().all(|c| c.decompose()[0] == 0xFF));
        }

        // bottom-up: first scanline in the file is the bottom image row
        assert_eq!(decoded[0].1, vec![0xFF_77_88_99, 0xFF_00_00_00]);
        assert_eq!(decoded[1].1, vec![0xFF_11_22_33, 0xFF_44_55_66]);
    }

    #[test]
    fn thirty_two_bit_keeps_alpha() {
        let pixels = [0x00_11_22_33, 0x7F_44_55_66, 0xFF_77_88_99];
        let decoded = rows(encode(3, -1, 32, &pixels)).unwrap();

        assert_eq!(decoded, vec![(0, pixels.to_vec())]);
    }

    #[test]
    fn padded_rows() {
        // 5 pixels * 3 bytes = 15, padded to 16
        let pixels: Vec<Argb> = (0..10).map(|i| 0xFF_00_00_00 | i).collect();
        let bytes = encode(5, -2, 24, &pixels);
        assert_eq!(bytes.len(), 54 + 32);

        let decoded = rows(bytes).unwrap();
        assert_eq!(decoded[0].1, pixels[..5]);
        assert_eq!(decoded[1].1, pixels[5..]);
    }

    #[test]
    fn image_row_flips_bottom_up_files() {
        let header = BitmapReader::new(Cursor::new(encode(1, 4, 24, &[0; 4])))
            .unwrap()
            .header()
            .to_owned();

        assert_eq!(
            (0..4).map(|r| header.image_row(r)).collect::<Vec<_>>(),
            vec![3, 2, 1, 0]
        );

        let header = BmpHeader {
            bottom_up: false,
            ..header
        };
        assert_eq!(header.image_row(1), 1);
    }

    #[test]
    fn bad_magic() {
        let mut bytes = encode(1, 1, 24, &[0]);
        bytes[0] = b'X';

        assert!(matches!(rows(bytes), Err(BitmapError::BadMagic(_))));
    }

    #[test]
    fn unsupported_depth() {
        let mut bytes = encode(1, 1, 24, &[0]);
        bytes[OFFSET_DEPTH] = 8;

        assert!(matches!(rows(bytes), Err(BitmapError::UnsupportedDepth(8))));
    }

    #[test]
    fn bad_dimensions() {
        let mut bytes = encode(1, 1, 24, &[0]);
        bytes[OFFSET_HEIGHT..OFFSET_HEIGHT + 4].copy_from_slice(&0i32.to_le_bytes());

        assert!(matches!(rows(bytes), Err(BitmapError::BadDimensions { .. })));
    }

    #[test]
    fn short_files() {
        let bytes = encode(2, 2, 24, &[0; 4]);

        assert!(matches!(
            rows(bytes[..20].to_vec()),
            Err(BitmapError::Truncated("header"))
        ));

        let mut reader = BitmapReader::new(Cursor::new(bytes[..bytes.len() - 3].to_vec())).unwrap();
        assert!(reader.next_row().unwrap().is_some());
        assert!(matches!(reader.next_row(), Err(BitmapError::Truncated("pixel data"))));
    }
}
