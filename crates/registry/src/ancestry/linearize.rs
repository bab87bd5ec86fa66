//! C3 linearization.
//!
//! Merges the ancestor sequences of every parent, plus the parent list itself, into
//! one order that preserves each input's relative order. At each step the head of the
//! leftmost sequence that does not appear in the tail of any other sequence is taken,
//! which gives earlier parents priority on ties.

use super::AncestorKey;

/// Returns the merged lineage for a key with the given `parents` (excluding the key).
///
/// On conflict, returns the names of the heads that could not be ordered.
pub(super) fn c3_merge(parents: &[AncestorKey]) -> Result<Vec<AncestorKey>, Vec<String>> {
	match parents {
		[] => return Ok(Vec::new()),
		[single] => return Ok(single.ancestors().cloned().collect()),
		_ => {}
	}

	let owned: Vec<Vec<AncestorKey>> = parents
		.iter()
		.map(|p| p.ancestors().cloned().collect())
		.chain(std::iter::once(parents.to_vec()))
		.collect();
	let mut seqs: Vec<&[AncestorKey]> = owned.iter().map(Vec::as_slice).collect();

	let capacity = seqs.iter().map(|s| s.len()).sum();
	let mut merged = Vec::with_capacity(capacity);

	loop {
		seqs.retain(|s| !s.is_empty());
		if seqs.is_empty() {
			return Ok(merged);
		}

		let head = seqs
			.iter()
			.map(|s| &s[0])
			.find(|candidate| !seqs.iter().any(|s| s[1..].contains(candidate)))
			.cloned();

		let Some(head) = head else {
			let mut remaining: Vec<String> = seqs.iter().map(|s| s[0].name().to_string()).collect();
			remaining.dedup();
			return Err(remaining);
		};

		for seq in seqs.iter_mut() {
			if seq[0] == head {
				*seq = &seq[1..];
			}
		}
		merged.push(head);
	}
}
