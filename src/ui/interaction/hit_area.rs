//! Tap regions for touch interaction.
//!
//! Screens register button rectangles while rendering and the manager hit
//! tests taps against them. Regions are rebuilt from scratch every frame, so
//! rendering the same view-state twice yields the same list.

use ratatui::layout::Rect;

/// A tappable rectangle bound to a screen-specific button id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitArea<B> {
    pub rect: Rect,
    pub button: B,
}

impl<B> HitArea<B> {
    pub fn new(rect: Rect, button: B) -> Self {
        Self { rect, button }
    }

    /// Right and bottom edges are exclusive.
    #[inline]
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.rect.x
            && x < self.rect.x.saturating_add(self.rect.width)
            && y >= self.rect.y
            && y < self.rect.y.saturating_add(self.rect.height)
    }
}

/// Ordered registry of a screen's tap regions.
#[derive(Debug, Clone)]
pub struct HitRegions<B> {
    areas: Vec<HitArea<B>>,
}

impl<B> Default for HitRegions<B> {
    fn default() -> Self {
        Self { areas: Vec::new() }
    }
}

impl<B: Copy> HitRegions<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the start of each render.
    pub fn clear(&mut self) {
        self.areas.clear();
    }

    /// Empty rectangles are skipped so a clipped button can't be tapped.
    pub fn register(&mut self, rect: Rect, button: B) {
        if rect.width == 0 || rect.height == 0 {
            return;
        }
        self.areas.push(HitArea::new(rect, button));
    }

    /// First region in registration order that contains the point.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<B> {
        self.areas
            .iter()
            .find(|area| area.contains(x, y))
            .map(|area| area.button)
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HitArea<B>> {
        self.areas.iter()
    }

    /// Centre cell of the first region bound to `button`. Used to synthesize
    /// taps in tests and benchmarks.
    pub fn center_of(&self, button: B) -> Option<(u16, u16)>
    where
        B: PartialEq,
    {
        self.areas.iter().find(|a| a.button == button).map(|a| {
            (
                a.rect.x + a.rect.width / 2,
                a.rect.y + a.rect.height / 2,
            )
        })
    }
}
