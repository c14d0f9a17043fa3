/// Groups an iterator into `Vec` batches of at most `size` items.
/// The last batch may be shorter; an empty batch is never yielded.
#[derive(Debug)]
pub struct Batches<I> {
    inner: I,
    size: usize,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<I::Item> = self.inner.by_ref().take(self.size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

pub trait BatchesExt: Iterator + Sized {
    /// A `size` of zero is treated as one.
    fn batches(self, size: usize) -> Batches<Self> {
        Batches {
            inner: self,
            size: size.max(1),
        }
    }
}

impl<I: Iterator> BatchesExt for I {}
