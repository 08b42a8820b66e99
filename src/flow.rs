//! Page flow: breaks the page before an item would cross the bottom margin.

use log::debug;

use crate::config::Geometry;
use crate::pdf::Canvas;
use crate::section::RenderState;

#[derive(Debug, Clone, Copy)]
pub struct PageFlow {
    geometry: Geometry,
}

impl PageFlow {
    pub fn new(geometry: Geometry) -> Self {
        PageFlow { geometry }
    }

    /// Make room for an item reaching `extent` points below the cursor.
    ///
    /// Returns true when a page break was emitted. No break is taken while
    /// the cursor is still at the top of a fresh page, so an item taller
    /// than a page is drawn where it is.
    pub fn ensure_room<C: Canvas>(
        &self,
        state: &mut RenderState,
        canvas: &mut C,
        extent: f32,
    ) -> bool {
        let fits = state.y - extent >= self.geometry.bottom;
        let fresh_page = state.y >= self.geometry.continuation_top;
        if fits || fresh_page {
            return false;
        }
        canvas.new_page();
        state.page += 1;
        state.y = self.geometry.continuation_top;
        debug!("Page break, now on page {}", state.page + 1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RenderConfig, MM};
    use crate::trace::{DrawOp, TraceCanvas};

    #[test]
    fn breaks_only_when_the_item_crosses_the_margin() {
        let geometry = RenderConfig::default().geometry();
        let flow = PageFlow::new(geometry);
        let mut canvas = TraceCanvas::default();
        let mut state = RenderState::new(geometry.top);

        state.y = geometry.bottom + 5.0 * MM;
        assert!(!flow.ensure_room(&mut state, &mut canvas, 4.0 * MM));
        assert_eq!(state.page, 0);

        assert!(flow.ensure_room(&mut state, &mut canvas, 6.0 * MM));
        assert_eq!(state.page, 1);
        assert_eq!(state.y, geometry.continuation_top);
        assert_eq!(canvas.ops(), &[DrawOp::PageBreak]);
    }

    #[test]
    fn oversized_items_do_not_loop() {
        let geometry = RenderConfig::default().geometry();
        let flow = PageFlow::new(geometry);
        let mut canvas = TraceCanvas::default();
        let mut state = RenderState::new(geometry.top);
        assert!(!flow.ensure_room(&mut state, &mut canvas, geometry.page_height));
        assert!(canvas.ops().is_empty());
    }
}
