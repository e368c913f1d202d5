//! `RenderEncoder`/`Painter`: an interface-level draw-tree layer stack, built
//! on an `easy_tree::Tree<DrawCommand>` with a depth-first pre/post visitor.
//! This exists only so `FillSTC` and `Glyph` consumers have a realistic
//! caller to draw through — not a rendering engine in its own right.

use crate::contour::Contour;
use crate::glyph::Glyph;

/// One node's payload in the draw tree: either a leaf draw (fill or glyph)
/// or a layer boundary a child subtree renders into.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Fill { contour_version: u64 },
    Glyph { glyph_index: u32 },
    Layer { opaque: bool },
}

/// Pre-order/post-order visit of a node during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalEvent {
    Pre(usize),
    Post(usize),
}

/// Depth-first traversal plan: the full event sequence plus each node's
/// depth in the tree (root = 0).
pub struct TraversalPlan {
    pub events: Vec<TraversalEvent>,
    pub depths: std::collections::HashMap<usize, usize>,
}

/// Builds a `DrawCommand` tree by pushing/popping layers and appending
/// leaf draws under whichever layer is currently on top of the cursor
/// stack.
pub struct RenderEncoder {
    tree: easy_tree::Tree<DrawCommand>,
    cursor_stack: Vec<usize>,
    pause_depth: u32,
}

impl Default for RenderEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEncoder {
    pub fn new() -> Self {
        RenderEncoder {
            tree: easy_tree::Tree::new(),
            cursor_stack: Vec::new(),
            pause_depth: 0,
        }
    }

    fn append(&mut self, command: DrawCommand) -> usize {
        match self.cursor_stack.last() {
            Some(&parent) => self.tree.add_child(parent, command),
            None => self.tree.add_node(command),
        }
    }

    /// Opens a new layer under the current cursor and makes it the cursor.
    pub fn push_layer(&mut self, opaque: bool) -> usize {
        let id = self.append(DrawCommand::Layer { opaque });
        self.cursor_stack.push(id);
        id
    }

    /// Closes the innermost open layer, restoring its parent as the cursor.
    pub fn pop_layer(&mut self) {
        debug_assert!(!self.cursor_stack.is_empty(), "pop_layer with no open layer");
        self.cursor_stack.pop();
    }

    pub fn draw_fill(&mut self, contour: &Contour) -> usize {
        self.append(DrawCommand::Fill {
            contour_version: contour.version(),
        })
    }

    pub fn draw_glyph(&mut self, glyph: &Glyph) -> usize {
        self.append(DrawCommand::Glyph {
            glyph_index: glyph.index().0,
        })
    }

    /// Between `begin_pause_snapshot()` and a matching `end_pause_snapshot()`,
    /// draws are assumed not to overlap, enabling batch fusion downstream.
    /// Nestable; only the outermost pair's boundary is externally visible.
    pub fn begin_pause_snapshot(&mut self) {
        self.pause_depth += 1;
    }

    pub fn end_pause_snapshot(&mut self) {
        debug_assert!(self.pause_depth > 0, "end_pause_snapshot without begin_pause_snapshot");
        self.pause_depth -= 1;
    }

    pub fn in_pause_snapshot(&self) -> bool {
        self.pause_depth > 0
    }

    pub fn depth_of(&self, node_id: usize) -> usize {
        let mut depth = 0;
        let mut current = node_id;
        while let Some(parent) = self.tree.parent_index_unchecked(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    pub fn children(&self, node_id: usize) -> &Vec<usize> {
        self.tree.children(node_id)
    }

    /// Runs a full depth-first traversal, recording pre/post events and each
    /// node's depth — the shape `plan_traversal` in the traversal grounding
    /// computes to drive stencil-ref assignment.
    pub fn plan_traversal(&mut self) -> TraversalPlan {
        type State = (Vec<TraversalEvent>, std::collections::HashMap<usize, usize>, Vec<usize>);

        let pre_fn = |node_id: usize, _cmd: &mut DrawCommand, state: &mut State| {
            let (events, depths, depth_stack) = state;
            depths.insert(node_id, depth_stack.len());
            depth_stack.push(node_id);
            events.push(TraversalEvent::Pre(node_id));
        };
        let post_fn = |node_id: usize, _cmd: &mut DrawCommand, state: &mut State| {
            let (events, _depths, depth_stack) = state;
            depth_stack.pop();
            events.push(TraversalEvent::Post(node_id));
        };

        let mut state: State = (Vec::new(), std::collections::HashMap::new(), Vec::new());
        self.tree.traverse_mut(pre_fn, post_fn, &mut state);

        TraversalPlan {
            events: state.0,
            depths: state.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::math::point;

    fn dummy_contour() -> std::rc::Rc<Contour> {
        Contour::new(crate::contour::ContourData::new(point(0.0, 0.0)))
    }

    #[test]
    fn push_pop_restores_parent_cursor() {
        let mut encoder = RenderEncoder::new();
        let root = encoder.push_layer(true);
        let contour = dummy_contour();
        let a = encoder.draw_fill(&contour);
        encoder.pop_layer();
        let sibling_layer = encoder.push_layer(false);

        assert_eq!(encoder.depth_of(root), 0);
        assert_eq!(encoder.depth_of(a), 1);
        assert_eq!(encoder.depth_of(sibling_layer), 1);
        assert!(encoder.children(root).contains(&a));
        assert!(encoder.children(root).contains(&sibling_layer));
    }

    #[test]
    fn pause_snapshot_nests() {
        let mut encoder = RenderEncoder::new();
        assert!(!encoder.in_pause_snapshot());
        encoder.begin_pause_snapshot();
        encoder.begin_pause_snapshot();
        assert!(encoder.in_pause_snapshot());
        encoder.end_pause_snapshot();
        assert!(encoder.in_pause_snapshot());
        encoder.end_pause_snapshot();
        assert!(!encoder.in_pause_snapshot());
    }

    #[test]
    fn traversal_plan_visits_every_node_twice() {
        let mut encoder = RenderEncoder::new();
        let root = encoder.push_layer(true);
        let child = encoder.push_layer(false);
        let contour = dummy_contour();
        encoder.draw_fill(&contour);
        encoder.pop_layer();
        encoder.pop_layer();

        let plan = encoder.plan_traversal();
        assert_eq!(plan.events.len(), 6);
        assert_eq!(plan.depths.get(&root), Some(&0));
        assert_eq!(plan.depths.get(&child), Some(&1));
    }
}
