use super::locks::render_block_path;
use crate::block::Block;
use crate::diagnostics::{Diagnostics, Recovery};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

/// Builds a new tree from `translated`, taking every locked subtree from `target` instead.
///
/// Indices count named blocks only. A lock that points past the end of either tree is
/// recorded and skipped.
pub fn apply_locks(
    translated: &[Block],
    target: &[Block],
    locks: &[Vec<usize>],
    diagnostics: &mut Diagnostics,
) -> Vec<Block> {
    let relative: Vec<&[usize]> = locks
        .iter()
        .map(Vec::as_slice)
        .filter(|lock| !lock.is_empty())
        .collect();
    if relative.is_empty() {
        return translated.to_vec();
    }
    merge_level(translated, target, &relative, &[], diagnostics)
}

fn merge_level(
    translated: &[Block],
    target: &[Block],
    locks: &[&[usize]],
    parent: &[usize],
    diagnostics: &mut Diagnostics,
) -> Vec<Block> {
    let target_named: Vec<&Block> = target.iter().filter(|b| !b.is_freeform()).collect();
    let translated_named = translated.iter().filter(|b| !b.is_freeform()).count();

    let mut whole: AHashSet<usize> = AHashSet::new();
    let mut nested: AHashMap<usize, Vec<&[usize]>> = AHashMap::new();
    for lock in locks {
        match lock.split_first() {
            Some((index, [])) => {
                whole.insert(*index);
            }
            Some((index, rest)) => nested.entry(*index).or_default().push(rest),
            None => {}
        }
    }

    let requested: Vec<usize> = whole.iter().chain(nested.keys()).copied().unique().sorted().collect();
    for index in requested {
        if index >= translated_named || index >= target_named.len() {
            let mut path = parent.to_vec();
            path.push(index);
            diagnostics.record(
                Recovery::LockOutOfRange,
                format!(
                    "lock '{}' skipped: translated has {} blocks, target has {}",
                    render_block_path(&path),
                    translated_named,
                    target_named.len()
                ),
            );
            whole.remove(&index);
            nested.remove(&index);
        }
    }

    let mut named_index = 0;
    let mut merged = Vec::with_capacity(translated.len());
    for block in translated {
        if block.is_freeform() {
            merged.push(block.clone());
            continue;
        }
        let index = named_index;
        named_index += 1;

        if whole.contains(&index) {
            log::debug!("Keeping locked block {} from target", index);
            merged.push(target_named[index].clone());
        } else if let Some(child_locks) = nested.get(&index) {
            let mut path = parent.to_vec();
            path.push(index);
            let mut block = block.clone();
            block.inner_blocks = merge_level(
                &block.inner_blocks,
                &target_named[index].inner_blocks,
                child_locks,
                &path,
                diagnostics,
            );
            merged.push(block);
        } else {
            merged.push(block.clone());
        }
    }
    merged
}
