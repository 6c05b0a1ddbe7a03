use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub const DEFAULT_X: u32 = 400;
pub const DEFAULT_Y: u32 = 200;
pub const DEFAULT_WIDTH: u32 = 400;
pub const DEFAULT_HEIGHT: u32 = 300;

/// The screen rectangle captured each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    FullScreen,
    Custom { x: u32, y: u32, width: u32, height: u32 },
}

impl Region {
    /// Bounding box as (left, top, right, bottom). Full screen has none.
    /// Edges saturate at `u32::MAX`; capture clamps to monitor bounds anyway.
    pub fn bbox(&self) -> Option<(u32, u32, u32, u32)> {
        match *self {
            Region::FullScreen => None,
            Region::Custom { x, y, width, height } => {
                Some((x, y, x.saturating_add(width), y.saturating_add(height)))
            }
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(*self, Region::Custom { width, height, .. } if width == 0 || height == 0)
    }
}

/// Region selection shared between the UI thread and the capture worker.
///
/// The four coordinates are independent atomics with no atomicity between
/// them: a snapshot taken during an edit may mix old and new values. The
/// worker re-reads the region every iteration, so a torn read is only ever
/// visible for a single frame.
pub struct SharedRegion {
    custom: AtomicBool,
    x: AtomicU32,
    y: AtomicU32,
    width: AtomicU32,
    height: AtomicU32,
}

impl SharedRegion {
    pub fn new() -> Self {
        Self {
            custom: AtomicBool::new(false),
            x: AtomicU32::new(DEFAULT_X),
            y: AtomicU32::new(DEFAULT_Y),
            width: AtomicU32::new(DEFAULT_WIDTH),
            height: AtomicU32::new(DEFAULT_HEIGHT),
        }
    }

    pub fn snapshot(&self) -> Region {
        if self.custom.load(Ordering::Relaxed) {
            Region::Custom {
                x: self.x.load(Ordering::Relaxed),
                y: self.y.load(Ordering::Relaxed),
                width: self.width.load(Ordering::Relaxed),
                height: self.height.load(Ordering::Relaxed),
            }
        } else {
            Region::FullScreen
        }
    }

    pub fn set_custom_enabled(&self, enabled: bool) {
        self.custom.store(enabled, Ordering::Relaxed);
    }

    pub fn set_rect(&self, x: u32, y: u32, width: u32, height: u32) {
        self.x.store(x, Ordering::Relaxed);
        self.y.store(y, Ordering::Relaxed);
        self.width.store(width, Ordering::Relaxed);
        self.height.store(height, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.set_rect(DEFAULT_X, DEFAULT_Y, DEFAULT_WIDTH, DEFAULT_HEIGHT);
    }
}

impl Default for SharedRegion {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod region_test {
    use super::*;

    #[test]
    fn test_bbox_from_corner_and_size() {
        let region = Region::Custom { x: 400, y: 200, width: 400, height: 300 };
        assert_eq!(region.bbox(), Some((400, 200, 800, 500)));
    }

    #[test]
    fn test_bbox_saturates_instead_of_overflowing() {
        let region = Region::Custom { x: u32::MAX - 10, y: 5, width: 100, height: u32::MAX };
        assert_eq!(region.bbox(), Some((u32::MAX - 10, 5, u32::MAX, u32::MAX)));
    }

    #[test]
    fn test_full_screen_has_no_bbox() {
        assert_eq!(Region::FullScreen.bbox(), None);
    }

    #[test]
    fn test_zero_size_region_is_degenerate() {
        assert!(Region::Custom { x: 10, y: 10, width: 0, height: 50 }.is_degenerate());
        assert!(Region::Custom { x: 10, y: 10, width: 50, height: 0 }.is_degenerate());
        assert!(!Region::Custom { x: 10, y: 10, width: 50, height: 50 }.is_degenerate());
    }

    #[test]
    fn test_shared_region_defaults_to_full_screen() {
        let shared = SharedRegion::new();
        assert_eq!(shared.snapshot(), Region::FullScreen);
    }

    #[test]
    fn test_shared_region_snapshot_and_reset() {
        let shared = SharedRegion::new();
        shared.set_custom_enabled(true);
        shared.set_rect(10, 20, 100, 200);
        assert_eq!(
            shared.snapshot(),
            Region::Custom { x: 10, y: 20, width: 100, height: 200 }
        );

        shared.reset();
        assert_eq!(
            shared.snapshot(),
            Region::Custom {
                x: DEFAULT_X,
                y: DEFAULT_Y,
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT
            }
        );
    }
}
