use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Something that names a slot in an `IdVec`.
pub trait Id: Copy + Into<usize> + From<usize> {}

/// A vector keyed by a typed ID. Elements are only ever appended, so an ID stays valid once handed
/// out.
#[derive(Clone, Debug)]
pub struct IdVec<I, T> {
    data: Vec<T>,
    marker: PhantomData<I>,
}

impl<I, T> IdVec<I, T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.data
    }
}

impl<I, T: Clone> IdVec<I, T> {
    pub fn fill(value: T, len: usize) -> Self {
        IdVec::new(vec![value; len])
    }
}

impl<I: Id, T> IdVec<I, T> {
    /// Appends `value` and returns its new ID.
    pub fn push(&mut self, value: T) -> I {
        self.data.push(value);

        I::from(self.data.len() - 1)
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.data.get(id.into())
    }

    pub fn ids(&self) -> impl Iterator<Item = I> {
        (0..self.data.len()).map(I::from)
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.data.iter().enumerate().map(|(i, d)| (I::from(i), d))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, d)| (I::from(i), d))
    }
}

impl<I: Id, T> Index<I> for IdVec<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        &self.data[id.into()]
    }
}

impl<I: Id, T> IndexMut<I> for IdVec<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.data[id.into()]
    }
}
