use crate::error::{ConfigError, GridAxis};

/// Span of grid lines a panel covers. Line 0 is the container's left/top
/// edge and line `n + 1` its right/bottom edge for `n` separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub start_col: usize,
    pub start_row: usize,
    pub end_col: usize,
    pub end_row: usize,
}

impl GridCell {
    pub const fn new(start_col: usize, start_row: usize, end_col: usize, end_row: usize) -> Self {
        Self { start_col, start_row, end_col, end_row }
    }
}

/// Integer pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PanelRect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Proportional grid of named panels.
///
/// Separators are fractions of the container in `(0, 1)`, strictly
/// increasing. Every grid line is snapped to a whole pixel with `floor`
/// and the far edge is always the container size, so a panel's size is
/// the difference between its two snapped lines and neighbouring panels
/// share their boundary pixel exactly.
#[derive(Debug, Clone)]
pub struct GridLayout {
    columns: Vec<f32>,
    rows: Vec<f32>,
    panels: Vec<(String, GridCell)>,
}

impl GridLayout {
    pub fn new(columns: &[f32], rows: &[f32]) -> Result<Self, ConfigError> {
        validate(columns, GridAxis::Columns)?;
        validate(rows, GridAxis::Rows)?;
        Ok(Self { columns: columns.to_vec(), rows: rows.to_vec(), panels: Vec::new() })
    }

    /// Number of columns, one more than the separators.
    pub fn column_count(&self) -> usize {
        self.columns.len() + 1
    }

    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }

    /// Place a panel. Cells must be non-empty and inside the grid.
    pub fn add(&mut self, name: impl Into<String>, cell: GridCell) -> Result<(), ConfigError> {
        let columns = self.column_count();
        let rows = self.row_count();
        if cell.start_col >= cell.end_col
            || cell.start_row >= cell.end_row
            || cell.end_col > columns
            || cell.end_row > rows
        {
            return Err(ConfigError::InvalidGridCell {
                start: (cell.start_col, cell.start_row),
                end: (cell.end_col, cell.end_row),
                columns,
                rows,
            });
        }
        self.panels.push((name.into(), cell));
        Ok(())
    }

    pub fn panels(&self) -> impl Iterator<Item = (&str, GridCell)> + '_ {
        self.panels.iter().map(|(name, cell)| (name.as_str(), *cell))
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Rectangle of `cell` inside a `width` x `height` container.
    pub fn rect(&self, cell: GridCell, width: u32, height: u32) -> PanelRect {
        let x0 = edge(&self.columns, cell.start_col, width);
        let x1 = edge(&self.columns, cell.end_col, width);
        let y0 = edge(&self.rows, cell.start_row, height);
        let y1 = edge(&self.rows, cell.end_row, height);
        PanelRect { x: x0, y: y0, width: x1.saturating_sub(x0), height: y1.saturating_sub(y0) }
    }

    /// Rectangle of the panel called `name`, if one was added.
    pub fn panel(&self, name: &str, width: u32, height: u32) -> Option<PanelRect> {
        self.panels
            .iter()
            .find(|(panel, _)| panel == name)
            .map(|(_, cell)| self.rect(*cell, width, height))
    }

    /// Every panel with its rectangle, in insertion order.
    pub fn layout(&self, width: u32, height: u32) -> Vec<(&str, PanelRect)> {
        self.panels
            .iter()
            .map(|(name, cell)| (name.as_str(), self.rect(*cell, width, height)))
            .collect()
    }

    /// Pixel positions of the inner grid lines, for the debug overlay.
    pub fn separator_lines(&self, width: u32, height: u32) -> (Vec<u32>, Vec<u32>) {
        let xs = (1..self.column_count()).map(|i| edge(&self.columns, i, width)).collect();
        let ys = (1..self.row_count()).map(|i| edge(&self.rows, i, height)).collect();
        (xs, ys)
    }
}

fn validate(separators: &[f32], axis: GridAxis) -> Result<(), ConfigError> {
    if separators.iter().any(|s| !s.is_finite() || *s <= 0.0 || *s >= 1.0) {
        return Err(ConfigError::InvalidSeparators { axis, reason: "separators must lie strictly between 0 and 1" });
    }
    if separators.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(ConfigError::InvalidSeparators { axis, reason: "separators must be strictly increasing" });
    }
    Ok(())
}

fn edge(separators: &[f32], line: usize, total: u32) -> u32 {
    if line == 0 {
        0
    } else if line > separators.len() {
        total
    } else {
        ((separators[line - 1] as f64 * total as f64).floor() as u32).min(total)
    }
}
