//! Byte-level splice primitives shared by the file editor, message editor,
//! and cleanup engine.

use crate::model::ByteRange;

pub fn delete_range(bytes: &[u8], range: ByteRange) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len().saturating_sub(range.end - range.begin));
    out.extend_from_slice(&bytes[..range.begin]);
    out.extend_from_slice(&bytes[range.end..]);
    out
}

pub fn replace_range(bytes: &[u8], range: ByteRange, new_text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() - (range.end - range.begin) + new_text.len());
    out.extend_from_slice(&bytes[..range.begin]);
    out.extend_from_slice(new_text);
    out.extend_from_slice(&bytes[range.end..]);
    out
}

pub fn insert_at(bytes: &[u8], offset: usize, new_text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + new_text.len());
    out.extend_from_slice(&bytes[..offset]);
    out.extend_from_slice(new_text);
    out.extend_from_slice(&bytes[offset..]);
    out
}

/// One pending splice, keyed by the offset it anchors on so a batch of them
/// can be applied in descending order without invalidating each other's
/// offsets (spec §4.6 pass 2).
pub enum Patch {
    Insert(usize, String),
    Delete(ByteRange),
    Replace(ByteRange, String),
}

impl Patch {
    fn start(&self) -> usize {
        match self {
            Patch::Insert(offset, _) => *offset,
            Patch::Delete(range) | Patch::Replace(range, _) => range.begin,
        }
    }

    fn range(&self) -> Option<ByteRange> {
        match self {
            Patch::Insert(..) => None,
            Patch::Delete(range) | Patch::Replace(range, _) => Some(*range),
        }
    }
}

/// Check that every range-based patch is pairwise disjoint, per P7.
pub fn assert_disjoint(patches: &[Patch]) -> crate::error::Result<()> {
    let mut ranges: Vec<ByteRange> = patches.iter().filter_map(Patch::range).collect();
    ranges.sort_by_key(|r| r.begin);
    for w in ranges.windows(2) {
        if w[0].overlaps(&w[1]) {
            return Err(crate::error::ApiLevelError::InternalOverlap);
        }
    }
    Ok(())
}

/// Apply every patch to `bytes`, highest offset first, so no patch's
/// recorded offset is invalidated by one applied before it.
pub fn apply_patches_descending(bytes: &[u8], mut patches: Vec<Patch>) -> Vec<u8> {
    patches.sort_by_key(|p| std::cmp::Reverse(p.start()));
    let mut out = bytes.to_vec();
    for patch in patches {
        out = match patch {
            Patch::Insert(offset, text) => insert_at(&out, offset, text.as_bytes()),
            Patch::Delete(range) => delete_range(&out, range),
            Patch::Replace(range, text) => replace_range(&out, range, text.as_bytes()),
        };
    }
    out
}
