pub mod bitmap;
pub mod blend;
pub mod compositor;
pub mod draw;
pub mod sprites;

use std::io;

pub type Argb = u32;

/// Packed color helpers. Colors travel through the pipeline as ARGB in a
/// `u32`; only the point write knows about the device pixel size.
pub(crate) trait Pixel: Copy + Sized + std::fmt::Debug {
    fn black() -> Self;

    fn decompose(self) -> [u8; 4];
    fn compose(array: [u8; 4]) -> Self;

    /// From the byte order bitmap files store pixels in.
    fn from_bgra(b: u8, g: u8, r: u8, a: u8) -> Self;
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("could not open {path}: {source}")]
    Open { path: String, source: io::Error },
    #[error("{request} failed: {source}")]
    ScreenInfo {
        request: &'static str,
        source: io::Error,
    },
    #[error("could not map {len} bytes of display memory: {source}")]
    Map { len: usize, source: io::Error },
    #[error("{0} bits per pixel is not supported")]
    UnsupportedDepth(u32),
    #[error("backing store holds {have} bytes, geometry needs {need}")]
    TooSmall { have: usize, need: usize },
    #[error("window: {0}")]
    Window(String),
}

/// The memory a surface draws into.
pub trait Backing: Send {
    fn bytes(&self) -> &[u8];
    fn bytes_mut(&mut self) -> &mut [u8];

    /// Called when a frame is complete. Mapped device memory is already
    /// on screen, so the default does nothing.
    fn present(&mut self) {}
}

impl Backing for Vec<u8> {
    fn bytes(&self) -> &[u8] {
        self
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Visible resolution.
    pub width: u32,
    pub height: u32,
    /// Addressable resolution, at least the visible one.
    pub virtual_width: u32,
    pub virtual_height: u32,
    pub bytes_per_pixel: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32, bytes_per_pixel: u32) -> Self {
        Self {
            width,
            height,
            virtual_width: width,
            virtual_height: height,
            bytes_per_pixel,
        }
    }

    pub fn len(&self) -> usize {
        self.virtual_width as usize * self.virtual_height as usize * self.bytes_per_pixel as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn check_depth(bits_per_pixel: u32) -> Result<u32, DisplayError> {
        match bits_per_pixel {
            16 | 24 | 32 => Ok(bits_per_pixel / 8),
            _ => Err(DisplayError::UnsupportedDepth(bits_per_pixel)),
        }
    }
}

/// A drawable view of display memory plus the cached terrain layer.
pub struct Surface {
    backing: Box<dyn Backing>,
    geometry: Geometry,
    background: Option<Vec<u8>>,
}

impl Surface {
    pub fn new(backing: Box<dyn Backing>, geometry: Geometry) -> Result<Self, DisplayError> {
        Geometry::check_depth(geometry.bytes_per_pixel * 8)?;

        let (have, need) = (backing.bytes().len(), geometry.len());
        if have < need {
            return Err(DisplayError::TooSmall { have, need });
        }

        Ok(Self {
            backing,
            geometry,
            background: None,
        })
    }

    /// A surface over plain memory.
    pub fn memory(width: u32, height: u32, bytes_per_pixel: u32) -> Result<Self, DisplayError> {
        let geometry = Geometry::new(width, height, bytes_per_pixel);
        Self::new(Box::new(vec![0u8; geometry.len()]), geometry)
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn width(&self) -> u32 {
        self.geometry.width
    }

    pub fn height(&self) -> u32 {
        self.geometry.height
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.geometry.bytes_per_pixel as usize
    }

    pub fn bytes(&self) -> &[u8] {
        self.backing.bytes()
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        let g = &self.geometry;

        if x < 0 || y < 0 || x as u32 >= g.virtual_width || y as u32 >= g.virtual_height {
            return None;
        }

        Some((x as usize + y as usize * g.virtual_width as usize) * g.bytes_per_pixel as usize)
    }

    /// Write the low bytes of `color` at (x, y). Outside the virtual
    /// screen this does nothing.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Argb) {
        let Some(at) = self.offset(x, y) else {
            return;
        };

        let n = self.bytes_per_pixel();
        if let Some(dst) = self.backing.bytes_mut().get_mut(at..at + n) {
            dst.copy_from_slice(&color.to_le_bytes()[..n]);
        }
    }

    /// Read back what `put_pixel` stored. Bytes the device does not keep
    /// come back as zero.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Argb> {
        let at = self.offset(x, y)?;
        let n = self.bytes_per_pixel();
        let src = self.backing.bytes().get(at..at + n)?;

        let mut bytes = [0u8; 4];
        bytes[..n].copy_from_slice(src);
        Some(u32::from_le_bytes(bytes))
    }

    pub fn fill(&mut self, color: Argb) {
        let n = self.bytes_per_pixel();
        let color = color.to_le_bytes();
        let len = self.geometry.len();

        self.backing.bytes_mut()[..len]
            .chunks_exact_mut(n)
            .for_each(|px| px.copy_from_slice(&color[..n]));
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Remember the current contents as the terrain layer.
    pub fn capture_background(&mut self) {
        let len = self.geometry.len();
        let bytes = &self.backing.bytes()[..len];

        match &mut self.background {
            Some(shadow) => shadow.copy_from_slice(bytes),
            None => self.background = Some(bytes.to_vec()),
        }
    }

    /// Copy the cached terrain back. Returns false if nothing was cached.
    pub fn restore_background(&mut self) -> bool {
        let Some(shadow) = &self.background else {
            return false;
        };

        self.backing.bytes_mut()[..shadow.len()].copy_from_slice(shadow);
        true
    }

    pub fn invalidate_background(&mut self) {
        self.background = None;
    }

    pub fn present(&mut self) {
        self.backing.present();
    }
}
