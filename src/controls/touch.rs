//! Swipe gestures from an evdev touch screen.

use std::{
    fs::{File, OpenOptions},
    io::{self, Read},
    mem::size_of,
    os::unix::fs::OpenOptionsExt,
    path::Path,
};

use log::{debug, trace};

use super::{InputError, InputEvent, InputSource};
use crate::game::{Direction, P2};

pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;
pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const BTN_TOUCH: u16 = 0x14a;

/// One `struct input_event`, minus the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    const TIME: usize = size_of::<libc::timeval>();
    pub const SIZE: usize = Self::TIME + 8;

    /// `bytes` must hold at least `SIZE` bytes in native byte order.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let b = bytes.get(Self::TIME..Self::SIZE)?;

        Some(Self {
            kind: u16::from_ne_bytes([b[0], b[1]]),
            code: u16::from_ne_bytes([b[2], b[3]]),
            value: i32::from_ne_bytes([b[4], b[5], b[6], b[7]]),
        })
    }

    #[cfg(test)]
    pub fn encode(self) -> Vec<u8> {
        let mut out = vec![0u8; Self::TIME];
        out.extend_from_slice(&self.kind.to_ne_bytes());
        out.extend_from_slice(&self.code.to_ne_bytes());
        out.extend_from_slice(&self.value.to_ne_bytes());
        out
    }
}

/// Turns press, move, release sequences into directions.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold: i32,
    range: P2,
    screen: P2,
    pos: P2,
    start: Option<P2>,
}

impl SwipeTracker {
    /// `range` is what the device reports, `screen` what it maps onto.
    pub fn new(threshold: i32, range: (i32, i32), screen: (i32, i32)) -> Self {
        Self {
            threshold,
            range: P2(range.0.max(2), range.1.max(2)),
            screen: P2(screen.0.max(1), screen.1.max(1)),
            pos: P2(0, 0),
            start: None,
        }
    }

    fn scale(raw: i32, range: i32, screen: i32) -> i32 {
        (raw as i64 * (screen - 1) as i64 / (range - 1) as i64) as i32
    }

    pub fn position(&self) -> P2 {
        self.pos
    }

    pub fn feed(&mut self, ev: RawEvent) -> Option<Direction> {
        match (ev.kind, ev.code) {
            (EV_ABS, ABS_X) => {
                self.pos.0 = Self::scale(ev.value, self.range.0, self.screen.0);
                None
            }
            (EV_ABS, ABS_Y) => {
                self.pos.1 = Self::scale(ev.value, self.range.1, self.screen.1);
                None
            }
            (EV_KEY, BTN_TOUCH) if ev.value == 1 => {
                self.start = Some(self.pos);
                None
            }
            (EV_KEY, BTN_TOUCH) if ev.value == 0 => {
                let start = self.start.take()?;
                classify(self.pos - start, self.threshold)
            }
            _ => None,
        }
    }
}

/// The dominant axis wins, horizontal on a tie. Anything shorter than
/// `threshold` is a tap.
pub fn classify(delta: P2, threshold: i32) -> Option<Direction> {
    let P2(dx, dy) = delta;

    if dx.abs() >= dy.abs() {
        if dx.abs() < threshold {
            return None;
        }

        Some(if dx > 0 { Direction::Right } else { Direction::Left })
    } else {
        if dy.abs() < threshold {
            return None;
        }

        Some(if dy > 0 { Direction::Down } else { Direction::Up })
    }
}

pub struct TouchSource<R = File> {
    name: String,
    reader: R,
    pending: Vec<u8>,
    tracker: SwipeTracker,
}

impl TouchSource<File> {
    /// Opened non-blocking so polling never stalls the input thread.
    pub fn open(path: &Path, tracker: SwipeTracker) -> Result<Self, InputError> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|source| InputError::Open {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self::new(path.display().to_string(), file, tracker))
    }
}

impl<R: Read> TouchSource<R> {
    pub fn new(name: String, reader: R, tracker: SwipeTracker) -> Self {
        Self {
            name,
            reader,
            pending: Vec::with_capacity(RawEvent::SIZE * 16),
            tracker,
        }
    }
}

impl<R: Read + Send> InputSource for TouchSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self, out: &mut Vec<InputEvent>) -> Result<(), InputError> {
        let mut buf = [0u8; RawEvent::SIZE * 16];

        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        let whole = self.pending.len() / RawEvent::SIZE * RawEvent::SIZE;

        for chunk in self.pending[..whole].chunks_exact(RawEvent::SIZE) {
            let Some(ev) = RawEvent::decode(chunk) else {
                continue;
            };

            trace!("touch {ev:?}");

            if let Some(d) = self.tracker.feed(ev) {
                debug!("Swipe {}", d.name());
                out.push(InputEvent::Turn(d));
            }
        }

        self.pending.drain(..whole);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tracker() -> SwipeTracker {
        SwipeTracker::new(30, (1024, 600), (800, 480))
    }

    fn swipe(from: (i32, i32), to: (i32, i32)) -> Vec<RawEvent> {
        let abs = |code, value| RawEvent { kind: EV_ABS, code, value };
        let touch = |value| RawEvent { kind: EV_KEY, code: BTN_TOUCH, value };

        vec![
            abs(ABS_X, from.0),
            abs(ABS_Y, from.1),
            touch(1),
            abs(ABS_X, to.0),
            abs(ABS_Y, to.1),
            touch(0),
        ]
    }

    #[test]
    fn classifies_by_dominant_axis() {
        assert_eq!(classify(P2(40, 10), 30), Some(Direction::Right));
        assert_eq!(classify(P2(-40, 39), 30), Some(Direction::Left));
        assert_eq!(classify(P2(5, 31), 30), Some(Direction::Down));
        assert_eq!(classify(P2(-5, -90), 30), Some(Direction::Up));
        assert_eq!(classify(P2(30, 30), 30), Some(Direction::Right));
    }

    #[test]
    fn short_drags_are_taps() {
        assert_eq!(classify(P2(29, 0), 30), None);
        assert_eq!(classify(P2(0, -29), 30), None);
        assert_eq!(classify(P2(0, 0), 30), None);
    }

    #[test]
    fn raw_coordinates_are_scaled() {
        let mut t = tracker();
        t.feed(RawEvent { kind: EV_ABS, code: ABS_X, value: 1023 });
        t.feed(RawEvent { kind: EV_ABS, code: ABS_Y, value: 599 });
        assert_eq!(t.position(), P2(799, 479));

        t.feed(RawEvent { kind: EV_ABS, code: ABS_X, value: 512 });
        assert_eq!(t.position().0, 512 * 799 / 1023);
    }

    #[test]
    fn release_without_press_does_nothing() {
        let mut t = tracker();
        let release = RawEvent { kind: EV_KEY, code: BTN_TOUCH, value: 0 };
        assert_eq!(t.feed(release), None);
    }

    #[test]
    fn reads_swipes_from_an_event_stream() {
        let mut bytes: Vec<u8> = swipe((100, 300), (100, 100))
            .into_iter()
            .chain(swipe((100, 100), (400, 120)))
            .chain(swipe((300, 300), (310, 305)))
            .flat_map(RawEvent::encode)
            .collect();

        // a trailing half event waits for the rest
        let half = RawEvent { kind: EV_KEY, code: BTN_TOUCH, value: 1 }.encode();
        bytes.extend_from_slice(&half[..RawEvent::SIZE / 2]);

        let mut source = TouchSource::new("test".into(), Cursor::new(bytes), tracker());
        let mut out = Vec::new();
        source.poll(&mut out).unwrap();

        assert_eq!(
            out,
            vec![
                InputEvent::Turn(Direction::Up),
                InputEvent::Turn(Direction::Right)
            ]
        );
        assert_eq!(source.pending.len(), RawEvent::SIZE / 2);
    }
}
