use super::{Argb, Pixel};

impl Pixel for Argb {
    fn black() -> Argb {
        0xFF_00_00_00
    }

    fn decompose(self) -> [u8; 4] {
        self.to_be_bytes()
    }

    fn compose(array: [u8; 4]) -> Argb {
        Argb::from_be_bytes(array)
    }

    fn from_bgra(b: u8, g: u8, r: u8, a: u8) -> Argb {
        Argb::compose([a, r, g, b])
    }
}

/// Drop alpha, as window surfaces want `0RGB`.
pub fn to_xrgb(c: Argb) -> u32 {
    c & 0x00_FF_FF_FF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgra_reassembles_as_argb() {
        assert_eq!(Argb::from_bgra(0x33, 0x22, 0x11, 0x80), 0x80_11_22_33);
        assert_eq!(Argb::from_bgra(0xFF, 0xFF, 0xFF, 0xFF), 0xFF_FF_FF_FF);
        assert_eq!(Argb::black().decompose(), [0xFF, 0, 0, 0]);
        assert_eq!(to_xrgb(0x80_11_22_33), 0x00_11_22_33);
    }
}
