/// Number of distinct series colors before the palette wraps around.
pub const PALETTE_SIZE: usize = 6;

const BORDER_COLORS: [&str; PALETTE_SIZE] = [
    "rgba(0,0,255,1.0)",
    "rgba(155,0,155,1.0)",
    "rgba(0,255,0,1.0)",
    "rgba(255,0,0,1.0)",
    "rgba(56,95,70,1.0)",
    "rgba(218,95,70,1.0)",
];

const FILL_COLORS: [&str; PALETTE_SIZE] = [
    "rgba(106,168,251,0.5)",
    "rgba(123,73,173,0.5)",
    "rgba(106,251,116,0.5)",
    "rgba(251,106,106,0.5)",
    "rgba(56,95,70,0.5)",
    "rgba(218,95,70,0.5)",
];

/// `(border, fill)` colors of the series at position `index`.
///
/// Series past the end of the palette reuse colors from the start.
pub const fn colors(index: usize) -> (&'static str, &'static str) {
    let slot = index % PALETTE_SIZE;
    (BORDER_COLORS[slot], FILL_COLORS[slot])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_colors() {
        assert_eq!(colors(0), ("rgba(0,0,255,1.0)", "rgba(106,168,251,0.5)"));
        assert_eq!(colors(3), ("rgba(255,0,0,1.0)", "rgba(251,106,106,0.5)"));
    }

    #[test]
    fn test_palette_wraps_around() {
        for index in 0..PALETTE_SIZE {
            assert_eq!(colors(index), colors(index + PALETTE_SIZE));
        }
        assert_eq!(colors(6), colors(0));
        assert_eq!(colors(13), colors(1));
    }

    #[test]
    fn test_colors_are_distinct() {
        let borders: std::collections::HashSet<_> =
            (0..PALETTE_SIZE).map(|index| colors(index).0).collect();

        assert_eq!(borders.len(), PALETTE_SIZE);
    }
}
