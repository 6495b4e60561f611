use super::geometry::Rect;
use crate::models::LayoutMode;
use serde::{Deserialize, Serialize};

/// A rendered item the dragged box can land on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Droppable {
    pub id: String,
    pub rect: Rect,
}

impl Droppable {
    pub fn new(id: impl Into<String>, rect: Rect) -> Self {
        Droppable {
            id: id.into(),
            rect,
        }
    }
}

/// Lay `ids` out left-to-right, top-to-bottom in `columns` equal cells
pub fn grid_layout<S: AsRef<str>>(
    ids: &[S],
    columns: usize,
    cell_width: f32,
    cell_height: f32,
) -> Vec<Droppable> {
    let columns = columns.max(1);
    ids.iter()
        .enumerate()
        .map(|(index, id)| {
            let row = (index / columns) as f32;
            let col = (index % columns) as f32;
            Droppable::new(
                id.as_ref(),
                Rect::new(col * cell_width, row * cell_height, cell_width, cell_height),
            )
        })
        .collect()
}

/// Stack `ids` as full-width rows, first id on top
pub fn list_layout<S: AsRef<str>>(ids: &[S], row_width: f32, row_height: f32) -> Vec<Droppable> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| {
            Droppable::new(
                id.as_ref(),
                Rect::new(0.0, index as f32 * row_height, row_width, row_height),
            )
        })
        .collect()
}

/// Rule for deciding which item the dragged box is currently over.
///
/// Both rules only look at ids and boxes, so the move they lead to is the
/// same regardless of how the surface is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionStrategy {
    /// Card grid: the box with the largest 2-D overlap wins
    Grid,
    /// Table rows: the row with the largest vertical overlap wins, provided
    /// the dragged box is still horizontally inside the table
    VerticalList,
}

impl CollisionStrategy {
    /// Pick the drop candidate for `dragged` among `candidates`.
    ///
    /// Ties go to the candidate whose center is nearest. `None` when the
    /// dragged box is outside every candidate.
    pub fn detect<'a>(&self, dragged: &Rect, candidates: &'a [Droppable]) -> Option<&'a str> {
        let center = dragged.center();

        candidates
            .iter()
            .filter_map(|candidate| {
                let score = match self {
                    CollisionStrategy::Grid => dragged.intersection_area(&candidate.rect),
                    CollisionStrategy::VerticalList => {
                        if dragged.horizontal_overlap(&candidate.rect) > 0.0 {
                            dragged.vertical_overlap(&candidate.rect)
                        } else {
                            0.0
                        }
                    }
                };
                (score > 0.0).then(|| (candidate, score, center.distance_to(candidate.rect.center())))
            })
            .max_by(|(_, score_a, dist_a), (_, score_b, dist_b)| {
                score_a
                    .total_cmp(score_b)
                    .then_with(|| dist_b.total_cmp(dist_a))
            })
            .map(|(candidate, _, _)| candidate.id.as_str())
    }
}

impl From<LayoutMode> for CollisionStrategy {
    fn from(mode: LayoutMode) -> Self {
        match mode {
            LayoutMode::Grid => CollisionStrategy::Grid,
            LayoutMode::Table => CollisionStrategy::VerticalList,
        }
    }
}
