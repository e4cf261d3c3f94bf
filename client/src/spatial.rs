use curacao_shared::AreaFeature;
use curacao_shared::geo::unproject;

const GRID_COLS: usize = 32;
const GRID_ROWS: usize = 32;

/// Uniform grid over projected area bounding boxes. Candidates from a cell are
/// confirmed with an exact point-in-polygon test.
/// Rebuilt only when the dataset changes.
pub struct SpatialGrid {
    cells: Vec<Vec<usize>>,
    min_x: f64,
    min_y: f64,
    cell_w: f64,
    cell_h: f64,
}

impl SpatialGrid {
    pub fn build(features: &[AreaFeature]) -> Self {
        let boxes: Vec<_> = features
            .iter()
            .map(|f| (!f.bounds.is_empty()).then(|| f.bounds.projected()))
            .collect();

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for &(l, t, r, b) in boxes.iter().flatten() {
            min_x = min_x.min(l);
            min_y = min_y.min(t);
            max_x = max_x.max(r);
            max_y = max_y.max(b);
        }
        if min_x > max_x || min_y > max_y {
            return Self {
                cells: Vec::new(),
                min_x: 0.0,
                min_y: 0.0,
                cell_w: 1.0,
                cell_h: 1.0,
            };
        }

        let cell_w = ((max_x - min_x) / GRID_COLS as f64).max(f64::EPSILON);
        let cell_h = ((max_y - min_y) / GRID_ROWS as f64).max(f64::EPSILON);
        let mut cells = vec![Vec::new(); GRID_COLS * GRID_ROWS];

        for (idx, bbox) in boxes.iter().enumerate() {
            let Some((l, t, r, b)) = *bbox else {
                continue;
            };
            let col_start = Self::clamp_index((l - min_x) / cell_w, GRID_COLS);
            let col_end = Self::clamp_index((r - min_x) / cell_w, GRID_COLS);
            let row_start = Self::clamp_index((t - min_y) / cell_h, GRID_ROWS);
            let row_end = Self::clamp_index((b - min_y) / cell_h, GRID_ROWS);
            for row in row_start..=row_end {
                for col in col_start..=col_end {
                    cells[row * GRID_COLS + col].push(idx);
                }
            }
        }

        Self {
            cells,
            min_x,
            min_y,
            cell_w,
            cell_h,
        }
    }

    fn clamp_index(v: f64, len: usize) -> usize {
        (v.floor().max(0.0) as usize).min(len - 1)
    }

    /// Index of the topmost area (last drawn) containing the world point.
    pub fn find_at(&self, features: &[AreaFeature], wx: f64, wy: f64) -> Option<usize> {
        if self.cells.is_empty() {
            return None;
        }
        let col = ((wx - self.min_x) / self.cell_w).floor();
        let row = ((wy - self.min_y) / self.cell_h).floor();
        if col < 0.0 || row < 0.0 || col >= GRID_COLS as f64 || row >= GRID_ROWS as f64 {
            return None;
        }

        let point = unproject(wx, wy);
        let cell = &self.cells[row as usize * GRID_COLS + col as usize];
        cell.iter().rev().copied().find(|&idx| {
            features
                .get(idx)
                .is_some_and(|f| f.bounds.contains(point) && f.shape.contains(point))
        })
    }
}
