use super::{food::ItemKind, P2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellLabel {
    Empty,
    Wall,
    SnakeHead,
    SnakeBody,
    Item(ItemKind),
}

/// Fixed-size board of cell labels.
///
/// Two layers are kept: the static layer (walls, set once) and the
/// derived layer that gets rebuilt from the snake and the items every
/// tick. Reads outside the board return `Wall`.
pub struct Grid {
    width: i32,
    height: i32,
    terrain: Vec<CellLabel>,
    cells: Vec<CellLabel>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let (width, height) = (width.max(0), height.max(0));
        let len = (width * height) as usize;

        Self {
            width,
            height,
            terrain: vec![CellLabel::Empty; len],
            cells: vec![CellLabel::Empty; len],
        }
    }

    /// A board whose outer ring is wall.
    pub fn with_border(width: i32, height: i32) -> Self {
        let mut grid = Self::new(width, height);

        for x in 0..grid.width {
            grid.set_static(P2(x, 0), CellLabel::Wall);
            grid.set_static(P2(x, grid.height - 1), CellLabel::Wall);
        }

        for y in 0..grid.height {
            grid.set_static(P2(0, y), CellLabel::Wall);
            grid.set_static(P2(grid.width - 1, y), CellLabel::Wall);
        }

        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, p: P2) -> bool {
        p.0 >= 0 && p.0 < self.width && p.1 >= 0 && p.1 < self.height
    }

    fn index(&self, p: P2) -> Option<usize> {
        self.contains(p)
            .then(|| (p.1 * self.width + p.0) as usize)
    }

    pub fn get(&self, p: P2) -> CellLabel {
        self.index(p).map_or(CellLabel::Wall, |i| self.cells[i])
    }

    /// The label the cell falls back to when nothing occupies it.
    pub fn terrain(&self, p: P2) -> CellLabel {
        self.index(p).map_or(CellLabel::Wall, |i| self.terrain[i])
    }

    /// Out of bounds writes are ignored.
    pub fn set(&mut self, p: P2, label: CellLabel) {
        if let Some(i) = self.index(p) {
            self.cells[i] = label;
        }
    }

    pub fn set_static(&mut self, p: P2, label: CellLabel) {
        if let Some(i) = self.index(p) {
            self.terrain[i] = label;
            self.cells[i] = label;
        }
    }

    pub fn is_wall(&self, p: P2) -> bool {
        self.terrain(p) == CellLabel::Wall
    }

    /// Drop every dynamic label, leaving only the static layer.
    pub fn clear(&mut self) {
        self.cells.copy_from_slice(&self.terrain);
    }

    /// Rebuild the dynamic layer. Items go first so the snake wins any
    /// overlap, which should not happen anyway.
    pub fn rederive<'a>(
        &mut self,
        body: impl IntoIterator<Item = &'a P2>,
        items: impl IntoIterator<Item = (P2, ItemKind)>,
    ) {
        self.clear();

        for (p, kind) in items {
            self.set(p, CellLabel::Item(kind));
        }

        let mut body = body.into_iter();

        if let Some(&head) = body.next() {
            for &p in body {
                self.set(p, CellLabel::SnakeBody);
            }
            self.set(head, CellLabel::SnakeHead);
        }
    }

    /// Every in-bounds cell that is not wall.
    pub fn open_cells(&self) -> impl Iterator<Item = P2> + '_ {
        let w = self.width;
        self.terrain
            .iter()
            .enumerate()
            .filter(|(_, l)| **l != CellLabel::Wall)
            .map(move |(i, _)| P2(i as i32 % w, i as i32 / w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_as_wall() {
        let g = Grid::new(4, 3);

        assert_eq!(g.get(P2(0, 0)), CellLabel::Empty);
        assert_eq!(g.get(P2(3, 2)), CellLabel::Empty);
        assert_eq!(g.get(P2(-1, 0)), CellLabel::Wall);
        assert_eq!(g.get(P2(4, 0)), CellLabel::Wall);
        assert_eq!(g.get(P2(0, 3)), CellLabel::Wall);
        assert_eq!(g.get(P2(0, -1)), CellLabel::Wall);
    }

    #[test]
    fn rederive_restores_static_walls() {
        let mut g = Grid::with_border(5, 5);
        assert!(g.is_wall(P2(0, 2)));
        assert_eq!(g.open_cells().count(), 9);

        let body = [P2(0, 2), P2(1, 2)];
        g.rederive(&body, [(P2(3, 3), ItemKind::Common)]);

        assert_eq!(g.get(P2(0, 2)), CellLabel::SnakeHead);
        assert_eq!(g.get(P2(1, 2)), CellLabel::SnakeBody);
        assert_eq!(g.get(P2(3, 3)), CellLabel::Item(ItemKind::Common));

        let body = [P2(2, 2), P2(1, 2)];
        g.rederive(&body, []);

        assert_eq!(g.get(P2(0, 2)), CellLabel::Wall);
        assert_eq!(g.get(P2(3, 3)), CellLabel::Empty);
        assert_eq!(g.get(P2(2, 2)), CellLabel::SnakeHead);
    }

    #[test]
    fn writes_outside_are_ignored() {
        let mut g = Grid::new(2, 2);
        g.set(P2(5, 5), CellLabel::SnakeHead);
        g.set_static(P2(-1, 0), CellLabel::Empty);

        assert_eq!(g.open_cells().count(), 4);
        assert!(g.open_cells().all(|p| g.get(p) == CellLabel::Empty));
    }
}
