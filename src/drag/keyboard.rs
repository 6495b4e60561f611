use super::geometry::Rect;
use super::strategy::Droppable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Keyboard equivalents of the pointer gesture.
///
/// `PickUp` on the focused item starts a drag, `Move`/`MoveTo` shift the drop
/// candidate, `Drop` commits and `Cancel` abandons it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardCommand {
    PickUp(String),
    Move(Direction),
    MoveTo(String),
    Drop,
    Cancel,
}

/// Nearest droppable strictly on the `direction` side of `from`.
///
/// Candidates are ranked by distance along the travel axis first and
/// cross-axis drift second, so in a grid `Down` stays in the same column
/// when it can.
pub fn neighbor<'a>(from: &Rect, direction: Direction, candidates: &'a [Droppable]) -> Option<&'a str> {
    let origin = from.center();

    candidates
        .iter()
        .filter_map(|candidate| {
            let center = candidate.rect.center();
            let (along, across) = match direction {
                Direction::Up => (origin.y - center.y, (center.x - origin.x).abs()),
                Direction::Down => (center.y - origin.y, (center.x - origin.x).abs()),
                Direction::Left => (origin.x - center.x, (center.y - origin.y).abs()),
                Direction::Right => (center.x - origin.x, (center.y - origin.y).abs()),
            };
            (along > 0.0).then_some((candidate.id.as_str(), along, across))
        })
        .min_by(|(_, along_a, across_a), (_, along_b, across_b)| {
            along_a
                .total_cmp(along_b)
                .then_with(|| across_a.total_cmp(across_b))
        })
        .map(|(id, _, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::strategy::{grid_layout, list_layout};

    #[test]
    fn test_grid_neighbors() {
        // a b c
        // d e
        let layout = grid_layout(&["a", "b", "c", "d", "e"], 3, 100.0, 80.0);
        let b = layout[1].rect;

        assert_eq!(neighbor(&b, Direction::Down, &layout), Some("e"));
        assert_eq!(neighbor(&b, Direction::Left, &layout), Some("a"));
        assert_eq!(neighbor(&b, Direction::Right, &layout), Some("c"));
        assert_eq!(neighbor(&b, Direction::Up, &layout), None);
    }

    #[test]
    fn test_list_has_no_sideways_neighbor() {
        let layout = list_layout(&["a", "b", "c"], 400.0, 40.0);
        let b = layout[1].rect;

        assert_eq!(neighbor(&b, Direction::Up, &layout), Some("a"));
        assert_eq!(neighbor(&b, Direction::Down, &layout), Some("c"));
        assert_eq!(neighbor(&b, Direction::Left, &layout), None);
    }
}
