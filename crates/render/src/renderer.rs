use blockworld_common::CellCoord;
use blockworld_kernel::World;

/// Which part of the world to draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderView {
    /// Horizontal layer (y) to draw.
    pub layer: i32,
    /// Draw buried cells too, instead of only materialized ones.
    pub xray: bool,
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads world state and a view configuration, then produces
/// output. It never mutates the world.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given world state and view.
    fn render(&self, world: &World, view: &RenderView) -> Self::Output;
}

/// Draws one horizontal slice of the grid as text, one row per z.
///
/// Materialized cells use their type glyph, hidden solid cells `?` (unless
/// `xray`), empty cells `.`, and empty cells holding vegetation `v`.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, world: &World, view: &RenderView) -> String {
        let [sx, _, sz] = world.grid().extent();
        let mut out = String::new();
        out.push_str(&format!(
            "=== World (tick={}, layer y={}) ===\n",
            world.tick(),
            view.layer
        ));
        for z in 0..sz as i32 {
            for x in 0..sx as i32 {
                let c = CellCoord::new(x, view.layer, z);
                let cell = world.cell_type(c);
                let glyph = if cell.is_empty() {
                    if world.has_vegetation(c) { 'v' } else { '.' }
                } else if view.xray || world.is_materialized(c) {
                    cell.glyph()
                } else {
                    '?'
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}
