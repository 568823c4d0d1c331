use crate::domain::coordinate::{Coordinate, Offset};
use crate::domain::models::{Color, Piece};
use smallvec::SmallVec;
use std::fmt;

/// Largest board edge the serialization format can carry.
pub const MAX_DIMENSION: usize = 7;

/// A square either holds a piece or is empty.
pub type Tile = Option<Piece>;

type PawnList = SmallVec<[Coordinate; MAX_DIMENSION]>;

/// Rectangular grid of tiles plus cached per-color projections: the pawn
/// list (master first, students in row-major order) and the master-captured
/// flag. The caches always agree with the grid.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    grid: Vec<Tile>,
    width: usize,
    height: usize,
    red_pawns: PawnList,
    blue_pawns: PawnList,
    red_master_captured: bool,
    blue_master_captured: bool,
}

impl Board {
    /// The starting layout: each player's master on their temple, students
    /// on the rest of their home row.
    pub fn new(width: usize, height: usize) -> Board {
        let mut grid = vec![None; checked_area(width, height)];

        for x in 0..width {
            grid[x] = Some(Piece {
                color: Color::Red,
                master: x == Self::temple(Color::Red, width, height).x,
            });
            grid[(height - 1) * width + x] = Some(Piece {
                color: Color::Blue,
                master: x == Self::temple(Color::Blue, width, height).x,
            });
        }

        Self::from_grid(grid, width, height)
    }

    /// Builds a board from an explicit grid, deriving the cached
    /// projections. The grid must describe a legal position: at most one
    /// master and at most `width` pieces per color.
    pub fn from_grid(grid: Vec<Tile>, width: usize, height: usize) -> Board {
        assert_eq!(grid.len(), checked_area(width, height));

        let mut board = Board {
            grid,
            width,
            height,
            red_pawns: PawnList::new(),
            blue_pawns: PawnList::new(),
            red_master_captured: false,
            blue_master_captured: false,
        };
        board.rebuild_pawn_caches();

        for color in [Color::Red, Color::Blue] {
            assert!(
                board.pawn_coordinates(color).len() <= width,
                "more than {width} {color} pieces"
            );
        }

        board
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn grid(&self) -> &[Tile] {
        &self.grid
    }

    pub fn on_board(&self, coordinate: Coordinate) -> bool {
        coordinate.x < self.width && coordinate.y < self.height
    }

    /// The outer option distinguishes off-board from an empty tile.
    pub fn tile(&self, coordinate: Coordinate) -> Option<Tile> {
        if !self.on_board(coordinate) {
            return None;
        }
        Some(self.grid[self.tile_id(coordinate)])
    }

    /// The temple is the centre of a player's home row; reaching the
    /// opponent's temple with the master wins.
    pub fn temple(color: Color, width: usize, height: usize) -> Coordinate {
        if color.is_top() {
            Coordinate::new((width - 1) / 2, 0)
        } else {
            Coordinate::new(width / 2, height - 1)
        }
    }

    /// Pawns of a color, master first when present, then students in
    /// row-major order.
    pub fn pawn_coordinates(&self, color: Color) -> &[Coordinate] {
        match color {
            Color::Red => &self.red_pawns,
            Color::Blue => &self.blue_pawns,
        }
    }

    pub fn master_captured(&self, color: Color) -> bool {
        match color {
            Color::Red => self.red_master_captured,
            Color::Blue => self.blue_master_captured,
        }
    }

    /// Slides the piece at `source` by `offset`, capturing whatever stands
    /// on the destination. The caller has validated the move.
    pub fn do_move(&mut self, source: Coordinate, offset: Offset) {
        let destination = source
            .try_add(offset)
            .filter(|c| self.on_board(*c))
            .expect("move destination off the board");

        let source_id = self.tile_id(source);
        let piece = self.grid[source_id].take().expect("no piece on source tile");

        let destination_id = self.tile_id(destination);
        self.grid[destination_id] = Some(piece);

        self.rebuild_pawn_caches();
    }

    /// Red wins if Blue's master is gone or Red's master stands on Blue's
    /// temple; symmetrically for Blue. A student on a temple decides
    /// nothing.
    pub fn is_finished(&self) -> Option<Color> {
        let red_master = self.master_position(Color::Red);
        let blue_master = self.master_position(Color::Blue);

        match (red_master, blue_master) {
            (None, _) => return Some(Color::Blue),
            (_, None) => return Some(Color::Red),
            _ => {}
        }

        if red_master == Some(Self::temple(Color::Blue, self.width, self.height)) {
            return Some(Color::Red);
        }
        if blue_master == Some(Self::temple(Color::Red, self.width, self.height)) {
            return Some(Color::Blue);
        }

        None
    }

    fn master_position(&self, color: Color) -> Option<Coordinate> {
        if self.master_captured(color) {
            return None;
        }
        self.pawn_coordinates(color).first().copied()
    }

    fn tile_id(&self, coordinate: Coordinate) -> usize {
        coordinate.y * self.width + coordinate.x
    }

    fn rebuild_pawn_caches(&mut self) {
        self.red_pawns.clear();
        self.blue_pawns.clear();

        let mut red_master = None;
        let mut blue_master = None;

        for (id, tile) in self.grid.iter().enumerate() {
            let Some(piece) = tile else { continue };
            let coordinate = Coordinate::new(id % self.width, id / self.width);

            match (piece.color, piece.master) {
                (Color::Red, true) => red_master = Some(coordinate),
                (Color::Red, false) => self.red_pawns.push(coordinate),
                (Color::Blue, true) => blue_master = Some(coordinate),
                (Color::Blue, false) => self.blue_pawns.push(coordinate),
            }
        }

        if let Some(master) = red_master {
            self.red_pawns.insert(0, master);
        }
        if let Some(master) = blue_master {
            self.blue_pawns.insert(0, master);
        }

        self.red_master_captured = red_master.is_none();
        self.blue_master_captured = blue_master.is_none();
    }
}

fn checked_area(width: usize, height: usize) -> usize {
    assert!(
        (1..=MAX_DIMENSION).contains(&width),
        "board width {width} out of bounds"
    );
    assert!(
        (2..=MAX_DIMENSION).contains(&height),
        "board height {height} out of bounds"
    );
    width * height
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for y in 0..self.height {
            for x in 0..self.width {
                let character = match self.grid[y * self.width + x] {
                    None => '.',
                    Some(Piece { color: Color::Red, master: true }) => 'M',
                    Some(Piece { color: Color::Red, master: false }) => 'S',
                    Some(Piece { color: Color::Blue, master: true }) => 'm',
                    Some(Piece { color: Color::Blue, master: false }) => 's',
                };
                write!(f, "{character}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
