use smallvec::{SmallVec, smallvec};

use crate::predicate::PredicateKey;

/// Permutations of a single dimension, most specific first.
pub type Axis = SmallVec<[PredicateKey; 8]>;

/// One candidate key tuple.
pub type KeyBuf = SmallVec<[PredicateKey; 4]>;

/// Cartesian product of per-dimension permutations.
///
/// The rightmost dimension advances fastest, so every combination that is more
/// specific in an earlier dimension is visited before any combination that widens it.
#[derive(Clone, Debug)]
pub struct KeyPermutations {
	axes: SmallVec<[Axis; 4]>,
	cursor: SmallVec<[usize; 4]>,
	done: bool,
}

impl KeyPermutations {
	pub(crate) fn new(axes: SmallVec<[Axis; 4]>) -> Self {
		let done = axes.iter().any(|axis| axis.is_empty());
		Self {
			cursor: smallvec![0; axes.len()],
			axes,
			done,
		}
	}

	/// A product that yields nothing.
	pub(crate) fn exhausted() -> Self {
		Self {
			axes: SmallVec::new(),
			cursor: SmallVec::new(),
			done: true,
		}
	}

	/// Returns the per-dimension permutation lists.
	pub fn axes(&self) -> &[Axis] {
		&self.axes
	}

	fn advance(&mut self) {
		let mut dim = self.axes.len();
		loop {
			if dim == 0 {
				self.done = true;
				return;
			}
			dim -= 1;
			self.cursor[dim] += 1;
			if self.cursor[dim] < self.axes[dim].len() {
				return;
			}
			self.cursor[dim] = 0;
		}
	}
}

impl Iterator for KeyPermutations {
	type Item = KeyBuf;

	fn next(&mut self) -> Option<KeyBuf> {
		if self.done {
			return None;
		}
		let item = self
			.axes
			.iter()
			.zip(&self.cursor)
			.map(|(axis, &at)| axis[at].clone())
			.collect();
		self.advance();
		Some(item)
	}
}
