//! Character-cell scatter plot of a snapshot.
//!
//! [`ScatterPlot`] maps positions onto a fixed `width × height` grid whose
//! axes both span `[-bounds, bounds]`, giving a bird's-eye view of the
//! system. [`TerminalView`] is a [`SnapshotConsumer`] that renders each
//! delivered snapshot and writes the frame to any `Write` sink.

use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gyre_core::{EngineGeneration, Snapshot, SnapshotConsumer, TickId};
use tracing::warn;

const POINT: char = '*';
const EMPTY: char = ' ';
const AXIS_H: char = '-';
const AXIS_V: char = '|';
const ORIGIN: char = '+';

// ── Frame ──────────────────────────────────────────────────────────

/// One rendered plot.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    cells: Vec<char>,
    plotted: usize,
    clipped: usize,
    generation: EngineGeneration,
    tick: TickId,
}

impl Frame {
    /// Columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The character at `(col, row)`; row 0 is the top (`y = +bounds`).
    pub fn cell(&self, col: usize, row: usize) -> Option<char> {
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(self.cells[row * self.width + col])
    }

    /// Positions drawn inside the axes.
    pub fn plotted(&self) -> usize {
        self.plotted
    }

    /// Positions outside `[-bounds, bounds]` or not finite.
    pub fn clipped(&self) -> usize {
        self.clipped
    }

    /// Generation of the rendered snapshot.
    pub fn generation(&self) -> EngineGeneration {
        self.generation
    }

    /// Tick of the rendered snapshot.
    pub fn tick_id(&self) -> TickId {
        self.tick
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = "-".repeat(self.width);
        writeln!(f, "+{border}+")?;
        for row in self.cells.chunks(self.width) {
            let line: String = row.iter().collect();
            writeln!(f, "|{line}|")?;
        }
        writeln!(f, "+{border}+")?;
        write!(
            f,
            "gen {} tick {} | {} shown, {} outside",
            self.generation, self.tick, self.plotted, self.clipped
        )
    }
}

// ── ScatterPlot ────────────────────────────────────────────────────

/// Renders snapshots onto a fixed character grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatterPlot {
    width: usize,
    height: usize,
    grid: bool,
}

impl Default for ScatterPlot {
    fn default() -> Self {
        Self {
            width: 64,
            height: 32,
            grid: true,
        }
    }
}

impl ScatterPlot {
    /// A plot of `width × height` cells. Each dimension is at least 1.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            ..Self::default()
        }
    }

    /// Draw (or omit) the axes through the origin.
    pub fn with_grid(mut self, grid: bool) -> Self {
        self.grid = grid;
        self
    }

    /// Render `snapshot` with both axes spanning `[-bounds, bounds]`.
    pub fn render(&self, snapshot: &Snapshot, bounds: f64) -> Frame {
        let mut cells = vec![EMPTY; self.width * self.height];
        if self.grid {
            let mid_col = self.width / 2;
            let mid_row = self.height / 2;
            for col in 0..self.width {
                cells[mid_row * self.width + col] = AXIS_H;
            }
            for row in 0..self.height {
                cells[row * self.width + mid_col] = AXIS_V;
            }
            cells[mid_row * self.width + mid_col] = ORIGIN;
        }

        let mut plotted = 0;
        let mut clipped = 0;
        for p in snapshot.positions() {
            match self.locate(p.x, p.y, bounds) {
                Some((col, row)) => {
                    cells[row * self.width + col] = POINT;
                    plotted += 1;
                }
                None => clipped += 1,
            }
        }

        Frame {
            width: self.width,
            height: self.height,
            cells,
            plotted,
            clipped,
            generation: snapshot.generation(),
            tick: snapshot.tick_id(),
        }
    }

    /// Map a position to `(col, row)`, or `None` if it is off the plot.
    fn locate(&self, x: f64, y: f64, bounds: f64) -> Option<(usize, usize)> {
        let drawable = bounds.is_finite() && bounds > 0.0 && x.is_finite() && y.is_finite();
        if !drawable {
            return None;
        }
        if x.abs() > bounds || y.abs() > bounds {
            return None;
        }
        let span = 2.0 * bounds;
        let col = (((x + bounds) / span) * self.width as f64) as usize;
        let up = (((y + bounds) / span) * self.height as f64) as usize;
        // `x == bounds` lands one past the last cell.
        let col = col.min(self.width - 1);
        let row = self.height - 1 - up.min(self.height - 1);
        Some((col, row))
    }
}

// ── SharedBounds ───────────────────────────────────────────────────

/// Axis half-width shared between a command surface and a view.
///
/// The plot follows the bounds setting as it changes, not the bounds the
/// current engine was built with.
#[derive(Clone, Debug)]
pub struct SharedBounds(Arc<AtomicU64>);

impl SharedBounds {
    /// Start at `bounds`.
    pub fn new(bounds: f64) -> Self {
        Self(Arc::new(AtomicU64::new(bounds.to_bits())))
    }

    /// Current value.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Replace the value.
    pub fn set(&self, bounds: f64) {
        self.0.store(bounds.to_bits(), Ordering::Relaxed);
    }
}

// ── TerminalView ───────────────────────────────────────────────────

/// Consumer that renders every delivered snapshot to a writer.
pub struct TerminalView<W> {
    plot: ScatterPlot,
    bounds: SharedBounds,
    out: W,
    clear: bool,
    frames: u64,
}

impl<W: Write + Send> TerminalView<W> {
    /// Render with `plot` into `out`, reading the axis range from `bounds`.
    pub fn new(plot: ScatterPlot, bounds: SharedBounds, out: W) -> Self {
        Self {
            plot,
            bounds,
            out,
            clear: false,
            frames: 0,
        }
    }

    /// Clear the terminal before each frame.
    pub fn clearing(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, frame: &Frame) -> std::io::Result<()> {
        if self.clear {
            write!(self.out, "\x1b[H\x1b[2J")?;
        }
        writeln!(self.out, "{frame}")?;
        self.out.flush()
    }
}

impl<W: Write + Send> SnapshotConsumer for TerminalView<W> {
    fn consume(&mut self, snapshot: &Snapshot) {
        let frame = self.plot.render(snapshot, self.bounds.get());
        match self.write_frame(&frame) {
            Ok(()) => self.frames += 1,
            Err(e) => warn!(error = %e, "failed to write frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyre_core::Position;

    fn snapshot(points: &[(f64, f64)]) -> Snapshot {
        let positions: Vec<Position> = points.iter().map(|&(x, y)| Position::new(x, y)).collect();
        Snapshot::from_positions(EngineGeneration(3), TickId(9), positions)
    }

    #[test]
    fn corners_map_to_corner_cells() {
        let plot = ScatterPlot::new(10, 5).with_grid(false);
        let frame = plot.render(&snapshot(&[(-10.0, 10.0), (10.0, -10.0)]), 10.0);
        assert_eq!(frame.cell(0, 0), Some(POINT));
        assert_eq!(frame.cell(9, 4), Some(POINT));
        assert_eq!(frame.plotted(), 2);
        assert_eq!(frame.clipped(), 0);
    }

    #[test]
    fn points_outside_bounds_are_clipped() {
        let plot = ScatterPlot::new(8, 8);
        let frame = plot.render(
            &snapshot(&[(0.5, 0.5), (11.0, 0.0), (0.0, -30.0), (f64::NAN, 0.0)]),
            10.0,
        );
        assert_eq!(frame.plotted(), 1);
        assert_eq!(frame.clipped(), 3);
    }

    #[test]
    fn grid_draws_axes_under_points() {
        let plot = ScatterPlot::new(9, 9);
        let empty = plot.render(&snapshot(&[]), 1.0);
        assert_eq!(empty.cell(4, 4), Some(ORIGIN));
        assert_eq!(empty.cell(0, 4), Some(AXIS_H));
        assert_eq!(empty.cell(4, 0), Some(AXIS_V));

        let with_origin = plot.render(&snapshot(&[(0.0, 0.0)]), 1.0);
        assert_eq!(with_origin.cell(4, 4), Some(POINT));
    }

    #[test]
    fn display_includes_border_and_caption() {
        let frame = ScatterPlot::new(4, 2).render(&snapshot(&[(0.0, 0.0)]), 5.0);
        let text = frame.to_string();
        assert_eq!(text.lines().count(), 5);
        assert!(text.starts_with("+----+"));
        assert!(text.ends_with("gen 3 tick 9 | 1 shown, 0 outside"));
    }

    #[test]
    fn terminal_view_follows_shared_bounds() {
        let bounds = SharedBounds::new(100.0);
        let mut view = TerminalView::new(ScatterPlot::new(4, 4), bounds.clone(), Vec::new());
        let snap = snapshot(&[(50.0, 50.0)]);
        view.consume(&snap);
        bounds.set(25.0);
        view.consume(&snap);
        assert_eq!(view.frames(), 2);
        let text = String::from_utf8(view.into_inner()).unwrap();
        assert!(text.contains("1 shown, 0 outside"));
        assert!(text.contains("0 shown, 1 outside"));
    }
}
