//! randomized backtracking maze on a step‑2 lattice
//!
//! Even coordinates are rooms, odd coordinates the walls between them.
//! The carved walk is a single corridor; it only biases the cave generator
//! and is never rendered.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

const DIRECTIONS: [IVec2; 4] = [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y];

/// the first corridor always leaves the start heading +x
const FIRST_DIRECTION: IVec2 = IVec2::X;

#[derive(Clone, Debug)]
pub struct Maze {
    size: usize,
    open: Vec<bool>,
    start: IVec2,
    end: IVec2,
    path_len: usize,
    complete: bool,
}

impl Maze {
    /// Moves a walk must make before the maze counts as finished.
    ///
    /// Signed: tiny lattices need a negative length and succeed at once.
    pub fn required_len(size: usize) -> i64 {
        (size * size / 4) as i64 - 9
    }

    /// Carve a maze of `size × size` starting from `start`, snapped to a room
    /// that has another room east of it.
    ///
    /// `budget` caps the number of search visits. When it runs out, or no walk
    /// of the required length exists, the longest walk seen is kept and
    /// `complete()` reports `false`.
    pub fn generate<R: Rng>(size: usize, start: IVec2, budget: usize, rng: &mut R) -> Self {
        let required = Self::required_len(size);
        if size == 0 {
            return Self {
                size,
                open: Vec::new(),
                start: IVec2::ZERO,
                end: IVec2::ZERO,
                path_len: 0,
                complete: required <= 0,
            };
        }

        let max_room = ((size - 1) & !1) as i32;
        // the forced first move needs a room to the east
        let max_start_x = (max_room - 2).max(0);
        let start = IVec2::new(
            (start.x & !1).clamp(0, max_start_x),
            (start.y & !1).clamp(0, max_room),
        );

        let mut carver = Carver {
            size,
            open: vec![false; size * size],
            path: vec![start],
            best: vec![start],
            required,
            visits: 0,
            budget,
            rng,
        };
        carver.set(start, true);

        let complete = carver.carve(start);
        if !complete {
            carver.restore_best();
        }

        let path = if complete { &carver.path } else { &carver.best };
        let end = *path.last().unwrap_or(&start);
        let path_len = path.len() - 1;

        Self {
            size,
            open: carver.open,
            start,
            end,
            path_len,
            complete,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start(&self) -> IVec2 {
        self.start
    }

    /// last room of the walk
    pub fn end(&self) -> IVec2 {
        self.end
    }

    /// room‑to‑room moves along the kept walk
    pub fn path_len(&self) -> usize {
        self.path_len
    }

    pub fn complete(&self) -> bool {
        self.complete
    }

    /// out of bounds reads as closed
    pub fn is_open(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.size as i32 || y >= self.size as i32 {
            return false;
        }
        self.open[y as usize * self.size + x as usize]
    }

    pub fn open_count(&self) -> usize {
        self.open.iter().filter(|&&o| o).count()
    }
}

/* ===========================================================
   recursive search state
   =========================================================== */
struct Carver<'a, R: Rng> {
    size: usize,
    open: Vec<bool>,
    path: Vec<IVec2>,
    best: Vec<IVec2>,
    required: i64,
    visits: usize,
    budget: usize,
    rng: &'a mut R,
}

impl<R: Rng> Carver<'_, R> {
    fn in_bounds(&self, c: IVec2) -> bool {
        c.x >= 0 && c.y >= 0 && c.x < self.size as i32 && c.y < self.size as i32
    }

    fn closed(&self, c: IVec2) -> bool {
        self.in_bounds(c) && !self.open[c.y as usize * self.size + c.x as usize]
    }

    fn set(&mut self, c: IVec2, value: bool) {
        let idx = c.y as usize * self.size + c.x as usize;
        self.open[idx] = value;
    }

    /// Extend the walk from `cell`. Every mark made here is either kept on
    /// success or undone before returning `false`.
    fn carve(&mut self, cell: IVec2) -> bool {
        if self.path.len() as i64 - 1 >= self.required {
            return true;
        }
        if self.visits >= self.budget {
            return false;
        }
        self.visits += 1;

        let mut dirs = DIRECTIONS;
        let candidates: &[IVec2] = if self.path.len() == 1 {
            std::slice::from_ref(&FIRST_DIRECTION)
        } else {
            dirs.shuffle(&mut *self.rng);
            &dirs
        };

        for &dir in candidates {
            let wall = cell + dir;
            let next = cell + dir * 2;
            if !self.closed(wall) || !self.closed(next) {
                continue;
            }

            self.set(wall, true);
            self.set(next, true);
            self.path.push(next);
            if self.path.len() > self.best.len() {
                self.best.clone_from(&self.path);
            }

            if self.carve(next) {
                return true;
            }

            self.path.pop();
            self.set(next, false);
            self.set(wall, false);
        }
        false
    }

    /// re‑open the longest walk after an exhausted search
    fn restore_best(&mut self) {
        self.open.iter_mut().for_each(|o| *o = false);
        let best = std::mem::take(&mut self.best);
        self.set(best[0], true);
        for pair in best.windows(2) {
            let wall = (pair[0] + pair[1]) / 2;
            self.set(wall, true);
            self.set(pair[1], true);
        }
        self.best = best;
    }
}
