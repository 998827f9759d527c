//! Dense 3D storage for labels, patterns, and wave slots.

use glam::IVec3;
use ndarray::{s, Array3};

/// An integer point in 3D. Also used for the unit offsets between neighboring slots.
pub type Point = IVec3;

/// A box of values with local coordinates in `[0, size)`.
///
/// The array is indexed `[z, y, x]`, so iteration order has X varying fastest.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Lattice<T> {
    data: Array3<T>,
}

fn shape(size: Point) -> (usize, usize, usize) {
    let extent = |c: i32| c.max(0) as usize;

    (extent(size.z), extent(size.y), extent(size.x))
}

fn point_from_index((z, y, x): (usize, usize, usize)) -> Point {
    Point::new(x as i32, y as i32, z as i32)
}

impl<T: Clone> Lattice<T> {
    pub fn fill(size: Point, value: T) -> Self {
        Lattice {
            data: Array3::from_elem(shape(size), value),
        }
    }

    /// Copies the sub-box with minimum `min` and size `size` into a new lattice. Returns `None` if
    /// any part of the box falls outside of `self`.
    pub fn copy_extent(&self, min: Point, size: Point) -> Option<Lattice<T>> {
        let (lo, hi) = self.extent_bounds(min, size)?;

        Some(Lattice {
            data: self
                .data
                .slice(s![lo[0]..hi[0], lo[1]..hi[1], lo[2]..hi[2]])
                .to_owned(),
        })
    }

    /// Writes all of `src` into `self` with its origin at `min`. Returns `false` and writes nothing
    /// if `src` does not fit.
    pub fn copy_into(&mut self, src: &Lattice<T>, min: Point) -> bool {
        let (lo, hi) = match self.extent_bounds(min, src.size()) {
            Some(bounds) => bounds,
            None => return false,
        };
        self.data
            .slice_mut(s![lo[0]..hi[0], lo[1]..hi[1], lo[2]..hi[2]])
            .assign(&src.data);

        true
    }

    /// Overwrite every value with `value`.
    pub fn set_all(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> Lattice<T> {
    pub fn from_fn<F: FnMut(Point) -> T>(size: Point, mut f: F) -> Self {
        Lattice {
            data: Array3::from_shape_fn(shape(size), |i| f(point_from_index(i))),
        }
    }

    pub fn size(&self) -> Point {
        point_from_index(self.data.dim())
    }

    pub fn volume(&self) -> usize {
        self.data.len()
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.cmpge(Point::ZERO).all() && p.cmplt(self.size()).all()
    }

    /// The array index of `p`, or `None` if `p` is out of bounds. Every coordinate lookup goes
    /// through here.
    fn index(&self, p: &Point) -> Option<[usize; 3]> {
        if self.contains(p) {
            Some([p.z as usize, p.y as usize, p.x as usize])
        } else {
            None
        }
    }

    /// Array index ranges of the box `[min, min + size)`, if it is non-empty and inside `self`.
    fn extent_bounds(&self, min: Point, size: Point) -> Option<([usize; 3], [usize; 3])> {
        if size.min_element() <= 0 {
            return None;
        }
        let lo = self.index(&min)?;
        let last = self.index(&(min + size - Point::ONE))?;

        Some((lo, [last[0] + 1, last[1] + 1, last[2] + 1]))
    }

    pub fn get(&self, p: &Point) -> Option<&T> {
        let i = self.index(p)?;

        self.data.get(i)
    }

    pub fn get_mut(&mut self, p: &Point) -> Option<&mut T> {
        let i = self.index(p)?;

        self.data.get_mut(i)
    }

    /// All values with X varying fastest.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Point, &T)> {
        self.data
            .indexed_iter()
            .map(|(i, v)| (point_from_index(i), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Point, &mut T)> {
        self.data
            .indexed_iter_mut()
            .map(|(i, v)| (point_from_index(i), v))
    }

    pub fn map<S, F: FnMut(&T) -> S>(&self, f: F) -> Lattice<S> {
        Lattice {
            data: self.data.map(f),
        }
    }
}
