//! Star display for a mean rating.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Star {
    Filled,
    Half,
    Empty,
}

impl Star {
    pub fn glyph(self) -> char {
        match self {
            Star::Filled => '★',
            Star::Half => '⯪',
            Star::Empty => '☆',
        }
    }
}

/// Five stars in position order. Position `i` is filled when the mean reaches
/// `i`, half when it reaches `i - 0.5`.
pub fn render_stars(mean: f64) -> [Star; 5] {
    std::array::from_fn(|index| {
        let position = (index + 1) as f64;
        if mean >= position {
            Star::Filled
        } else if mean >= position - 0.5 {
            Star::Half
        } else {
            Star::Empty
        }
    })
}

pub fn stars_text(mean: f64) -> String {
    render_stars(mean).iter().map(|star| star.glyph()).collect()
}

#[cfg(test)]
mod tests {
    use super::{Star::*, *};

    #[test]
    fn half_star_at_three_and_a_half() {
        assert_eq!(render_stars(3.5), [Filled, Filled, Filled, Half, Empty]);
    }

    #[test]
    fn bounds() {
        assert_eq!(render_stars(0.0), [Empty; 5]);
        assert_eq!(render_stars(5.0), [Filled; 5]);
        assert_eq!(render_stars(0.5), [Half, Empty, Empty, Empty, Empty]);
    }

    #[test]
    fn just_below_half() {
        assert_eq!(render_stars(4.4), [Filled, Filled, Filled, Filled, Empty]);
        assert_eq!(render_stars(4.5), [Filled, Filled, Filled, Filled, Half]);
    }

    #[test]
    fn text() {
        assert_eq!(stars_text(2.0), "★★☆☆☆");
    }
}
