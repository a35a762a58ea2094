//! The Linux framebuffer device, mapped into memory.

use std::{
    fs::{File, OpenOptions},
    io,
    os::fd::AsRawFd,
    path::Path,
    ptr, slice,
};

use log::{info, warn};

use crate::graphics::{Backing, DisplayError, Geometry, Surface};

const FBIOGET_VSCREENINFO: u32 = 0x4600;
const FBIOGET_FSCREENINFO: u32 = 0x4602;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// `struct fb_var_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct VarScreenInfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct FixScreenInfo {
    id: [u8; 16],
    smem_start: libc::c_ulong,
    smem_len: u32,
    kind: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: libc::c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

fn query<T: Default>(file: &File, request: u32, name: &'static str) -> Result<T, DisplayError> {
    let mut info = T::default();

    // SAFETY: `T` is the repr(C) struct the request fills in.
    let ret = unsafe { libc::ioctl(file.as_raw_fd(), request as _, &mut info as *mut T) };

    if ret < 0 {
        return Err(DisplayError::ScreenInfo {
            request: name,
            source: io::Error::last_os_error(),
        });
    }

    Ok(info)
}

/// Mapped device memory. Unmapped on drop, the descriptor closes with
/// the file.
pub struct FbDevice {
    ptr: *mut u8,
    len: usize,
    _file: File,
}

// SAFETY: the mapping is owned exclusively and only reached through
// `&self`/`&mut self`.
unsafe impl Send for FbDevice {}

impl FbDevice {
    fn map(file: File, len: usize) -> Result<Self, DisplayError> {
        // SAFETY: a fresh shared mapping of an open descriptor; the result
        // is checked before use.
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(DisplayError::Map {
                len,
                source: io::Error::last_os_error(),
            });
        }

        Ok(Self {
            ptr: ptr.cast(),
            len,
            _file: file,
        })
    }
}

impl Backing for FbDevice {
    fn bytes(&self) -> &[u8] {
        // SAFETY: `ptr` maps `len` bytes for as long as `self` lives.
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` makes the borrow unique.
        unsafe { slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for FbDevice {
    fn drop(&mut self) {
        // SAFETY: unmapping exactly what `map` mapped, once.
        let ret = unsafe { libc::munmap(self.ptr.cast(), self.len) };

        if ret != 0 {
            warn!(
                "Could not unmap the framebuffer: {}",
                io::Error::last_os_error()
            );
        }
    }
}

fn geometry(var: &VarScreenInfo) -> Result<Geometry, DisplayError> {
    let bytes_per_pixel = Geometry::check_depth(var.bits_per_pixel)?;

    Ok(Geometry {
        width: var.xres,
        height: var.yres,
        virtual_width: var.xres_virtual.max(var.xres),
        virtual_height: var.yres_virtual.max(var.yres),
        bytes_per_pixel,
    })
}

/// Open and map a framebuffer device as a drawable surface.
pub fn open(path: &Path) -> Result<Surface, DisplayError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| DisplayError::Open {
            path: path.display().to_string(),
            source,
        })?;

    let fix: FixScreenInfo = query(&file, FBIOGET_FSCREENINFO, "FBIOGET_FSCREENINFO")?;
    let var: VarScreenInfo = query(&file, FBIOGET_VSCREENINFO, "FBIOGET_VSCREENINFO")?;

    let geometry = geometry(&var)?;
    let row = geometry.virtual_width * geometry.bytes_per_pixel;

    if fix.line_length != 0 && fix.line_length != row {
        warn!(
            "Line length is {} bytes, expected {row}; the picture may be skewed",
            fix.line_length
        );
    }

    info!(
        "{}: {}x{} ({}x{} virtual), {} bpp",
        path.display(),
        geometry.width,
        geometry.height,
        geometry.virtual_width,
        geometry.virtual_height,
        var.bits_per_pixel
    );

    let device = FbDevice::map(file, geometry.len())?;
    Surface::new(Box::new(device), geometry)
}
