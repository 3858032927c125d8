/// Link color of a red-black node (the color of the link from its parent).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Color {
    Red,
    Black,
}

impl Color {
    #[inline]
    pub(crate) const fn flipped(self) -> Self {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    #[inline]
    pub(crate) const fn is_red(self) -> bool {
        matches!(self, Color::Red)
    }
}
