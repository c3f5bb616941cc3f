use atelier_core::id::ObjectId;
use kurbo::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

/// Per-member translation that aligns each member's bounds against the
/// union of all members' bounds. Members already in place are omitted.
pub fn align(alignment: Alignment, members: &[(ObjectId, Rect)]) -> Vec<(ObjectId, Vec2)> {
    let Some(first) = members.first() else {
        return Vec::new();
    };
    let frame = members.iter().fold(first.1, |acc, (_, r)| acc.union(*r));
    members
        .iter()
        .map(|(id, r)| {
            let delta = match alignment {
                Alignment::Left => Vec2::new(frame.x0 - r.x0, 0.0),
                Alignment::Center => Vec2::new(frame.center().x - r.center().x, 0.0),
                Alignment::Right => Vec2::new(frame.x1 - r.x1, 0.0),
                Alignment::Top => Vec2::new(0.0, frame.y0 - r.y0),
                Alignment::Middle => Vec2::new(0.0, frame.center().y - r.center().y),
                Alignment::Bottom => Vec2::new(0.0, frame.y1 - r.y1),
            };
            (*id, delta)
        })
        .filter(|(_, d)| *d != Vec2::ZERO)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn members() -> Vec<(ObjectId, Rect)> {
        vec![
            (ObjectId::intern("al_a"), Rect::new(0.0, 0.0, 100.0, 50.0)),
            (ObjectId::intern("al_b"), Rect::new(200.0, 100.0, 240.0, 300.0)),
        ]
    }

    #[test]
    fn left_and_right() {
        assert_eq!(
            align(Alignment::Left, &members()),
            vec![(ObjectId::intern("al_b"), Vec2::new(-200.0, 0.0))]
        );
        assert_eq!(
            align(Alignment::Right, &members()),
            vec![(ObjectId::intern("al_a"), Vec2::new(140.0, 0.0))]
        );
    }

    #[test]
    fn centers_use_the_selection_frame() {
        let moves = align(Alignment::Middle, &members());
        assert_eq!(moves, vec![
            (ObjectId::intern("al_a"), Vec2::new(0.0, 125.0)),
            (ObjectId::intern("al_b"), Vec2::new(0.0, -50.0)),
        ]);
        assert!(align(Alignment::Top, &[]).is_empty());
    }
}
