//! Scroll anchoring around content mutations.
//!
//! Offsets are in pixels. `scroll_top` is the distance from the top of the
//! content to the top of the viewport; it is clamped to
//! `0..=scroll_height - client_height` by the surface.

/// Pixel distance.
pub type Px = u32;

/// A scrollable viewport over content of known height.
pub trait ScrollSurface {
    fn scroll_top(&self) -> Px;
    /// Move the viewport; implementations clamp to the valid range.
    fn set_scroll_top(&mut self, top: Px);
    /// Total content height.
    fn scroll_height(&self) -> Px;
    /// Viewport height.
    fn client_height(&self) -> Px;

    /// Largest valid `scroll_top`.
    fn max_scroll_top(&self) -> Px {
        self.scroll_height().saturating_sub(self.client_height())
    }
}

/// Place the viewport so the bottom of the content sits `distance` pixels
/// below the top of the viewport's frame (`distance == 0` scrolls to the
/// end).
pub fn back_to_scroll<S: ScrollSurface + ?Sized>(surface: &mut S, distance: Px) {
    let top = surface.scroll_height().saturating_sub(distance);
    surface.set_scroll_top(top);
}

pub fn back_to_bottom<S: ScrollSurface + ?Sized>(surface: &mut S) {
    back_to_scroll(surface, 0);
}

/// Correction that must be applied once more on the next tick, after layout
/// caught up with a prepend.
#[must_use = "queue the reanchor for the next tick"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reanchor {
    pub distance: Px,
}

impl Reanchor {
    pub fn apply<S: ScrollSurface + ?Sized>(self, surface: &mut S) {
        back_to_scroll(surface, self.distance);
    }
}

/// Bottom-stickiness policy with a fixed detection threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollAnchor {
    threshold: Px,
}

impl ScrollAnchor {
    pub fn new(threshold: Px) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Px {
        self.threshold
    }

    /// Viewport is within `threshold` pixels of the end of the content.
    pub fn is_at_bottom<S: ScrollSurface + ?Sized>(&self, surface: &S) -> bool {
        let bottom_gap = surface
            .scroll_height()
            .saturating_sub(surface.client_height())
            .saturating_sub(self.threshold);
        surface.scroll_top() >= bottom_gap
    }

    /// Run `mutation`; if the viewport was at the bottom before, scroll back
    /// to the end afterwards.
    pub fn run_preserving_bottom<S, R>(&self, surface: &mut S, mutation: impl FnOnce(&mut S) -> R) -> R
    where
        S: ScrollSurface + ?Sized,
    {
        let at_end = self.is_at_bottom(surface);
        let result = mutation(surface);
        if at_end {
            back_to_bottom(surface);
        }
        result
    }

    /// Run `mutation` (typically a prepend), then keep the content bottom
    /// `distance` pixels below the viewport top.
    ///
    /// The returned [`Reanchor`] repeats the correction; the caller runs it on
    /// the next tick.
    pub fn anchor_at_distance_from_bottom<S, R>(
        &self,
        surface: &mut S,
        distance: Px,
        mutation: impl FnOnce(&mut S) -> R,
    ) -> (R, Reanchor)
    where
        S: ScrollSurface + ?Sized,
    {
        let result = mutation(surface);
        back_to_scroll(surface, distance);
        (result, Reanchor { distance })
    }
}
