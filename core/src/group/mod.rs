//! Hierarchical grouping: a row-index set partitioned into a tree of
//! blocks and groups, one level per grouped column. Groups and blocks live
//! in per-tree arenas and reference each other by id, so the parent/child
//! back-edges never form ownership cycles.

pub mod aggregate;

pub use aggregate::{AggSpec, AggValue, Aggregate, NumAcc};

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::column::Column;
use crate::error::ViewError;
use crate::sort::top_k_by;
use crate::view::TableView;

pub type GroupId = usize;
pub type BlockId = usize;

/// A set of row indices sharing one value of its block's column.
#[derive(Debug, Clone)]
pub struct Group {
    /// Dense key assigned in first-occurrence order within the block.
    pub key: u32,
    pub indices: Vec<u32>,
    pub parent_group: Option<GroupId>,
    pub block: BlockId,
    pub child_block: Option<BlockId>,
    /// Parallel to the tree's aggregate specs; empty when none requested.
    pub aggregates: Vec<AggValue>,
    /// Set when top-K truncation dropped some of this group's children.
    pub incomplete: bool,
}

/// A flat partition of one parent's indices at one level.
#[derive(Debug, Clone)]
pub struct Block {
    pub parent_group: Option<GroupId>,
    pub level: usize,
    /// Group ids in display order once the block is sorted.
    pub groups: Vec<GroupId>,
    /// Indices the level column could not resolve; elided from the subtree.
    pub unmapped: Vec<u32>,
    /// Groups discarded by top-K truncation.
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct GroupedLevel {
    pub column: String,
    pub blocks: Vec<BlockId>,
}

/// Per-block ordering policy for one grouped column.
#[derive(Clone)]
pub enum GroupCompare {
    /// Compare by the block column's value at each group's first row.
    Value,
    /// Compare by an aggregate resolved on each group's accumulated state.
    Aggregate(AggSpec),
    Custom(Arc<dyn Fn(&Group, &Group) -> Ordering + Send + Sync>),
}

impl fmt::Debug for GroupCompare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupCompare::Value => f.write_str("Value"),
            GroupCompare::Aggregate(spec) => f.debug_tuple("Aggregate").field(spec).finish(),
            GroupCompare::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupRequest {
    pub group_columns: Vec<String>,
    /// Non-grouped columns to accumulate per group.
    pub aggregates: Vec<AggSpec>,
    pub overrides: HashMap<String, GroupCompare>,
    /// Sort direction per grouped column; ascending when absent.
    pub ascending: HashMap<String, bool>,
    /// Keep only the K best groups per block.
    pub limit: Option<usize>,
}

impl GroupRequest {
    pub fn new<S: Into<String>>(group_columns: impl IntoIterator<Item = S>) -> Self {
        Self { group_columns: group_columns.into_iter().map(Into::into).collect(), ..Default::default() }
    }

    pub fn aggregate(mut self, spec: AggSpec) -> Self {
        self.aggregates.push(spec);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, compare: GroupCompare) -> Self {
        self.overrides.insert(column.into(), compare);
        self
    }

    pub fn descending(mut self, column: impl Into<String>) -> Self {
        self.ascending.insert(column.into(), false);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The grouped state of a view: arenas of groups and blocks plus the level
/// roster. Block 0 is always the first block.
#[derive(Debug, Clone, Default)]
pub struct GroupTree {
    pub levels: Vec<GroupedLevel>,
    pub blocks: Vec<Block>,
    pub groups: Vec<Group>,
    pub aggregates: Vec<AggSpec>,
}

impl GroupTree {
    pub fn first_block(&self) -> &Block { &self.blocks[0] }

    /// Rows a group occupies in a rowspanned rendering: 1 for leaves, the
    /// sum of child heights otherwise.
    pub fn height(&self, g: GroupId) -> usize {
        match self.groups[g].child_block {
            None => 1,
            Some(b) => self.blocks[b].groups.iter().map(|&c| self.height(c)).sum(),
        }
    }

    pub fn subgroup_count(&self, g: GroupId) -> usize { self.groups[g].child_block.map_or(0, |b| self.blocks[b].groups.len()) }

    /// Leaf groups in depth-first, in-block display order.
    pub fn leaves(&self) -> Vec<GroupId> {
        let mut out = Vec::new();
        for &g in &self.first_block().groups {
            self.collect_leaves(g, &mut out);
        }
        out
    }

    fn collect_leaves(&self, g: GroupId, out: &mut Vec<GroupId>) {
        match self.groups[g].child_block {
            None => out.push(g),
            Some(b) => {
                for &child in &self.blocks[b].groups {
                    self.collect_leaves(child, out);
                }
            }
        }
    }

    /// Ancestors of a leaf from the root down, including the leaf itself.
    pub fn lineage(&self, leaf: GroupId) -> Vec<GroupId> {
        let mut chain = vec![leaf];
        let mut cur = leaf;
        while let Some(parent) = self.groups[cur].parent_group {
            chain.push(parent);
            cur = parent;
        }
        chain.reverse();
        chain
    }
}

/// Build the block/group tree for `input` over the view's columns. The
/// cancellation token is consulted between blocks; a cancelled build
/// returns with no partial tree observable.
pub(crate) fn build(view: &TableView, input: &[u32], request: &GroupRequest, cancel: &CancelToken) -> Result<GroupTree, ViewError> {
    let mut tree = GroupTree { aggregates: request.aggregates.clone(), ..Default::default() };

    // level 0: one block over the whole input
    let first_column = request.group_columns.first().ok_or(ViewError::EmptyGrouping)?;
    populate_block(view, &mut tree, 0, None, first_column, input, cancel)?;
    tree.levels.push(GroupedLevel { column: first_column.clone(), blocks: vec![0] });

    for (level, column_name) in request.group_columns.iter().enumerate().skip(1) {
        let mut level_blocks = Vec::new();
        let parent_blocks: Vec<BlockId> = tree.levels[level - 1].blocks.clone();
        for parent_block in parent_blocks {
            for slot in 0..tree.blocks[parent_block].groups.len() {
                let parent_group = tree.blocks[parent_block].groups[slot];
                let block_id = populate_block(view, &mut tree, level, Some(parent_group), column_name, &[], cancel)?;
                tree.groups[parent_group].child_block = Some(block_id);
                level_blocks.push(block_id);
            }
        }
        tree.levels.push(GroupedLevel { column: column_name.clone(), blocks: level_blocks });
    }

    if !tree.aggregates.is_empty() {
        accumulate_aggregates(view, &mut tree)?;
    }
    sort_blocks(view, &mut tree, request)?;
    Ok(tree)
}

/// Partition one parent's indices into a new block at `level`. For the
/// first block the parent is `None` and `input` carries the indices;
/// otherwise they are read from the parent group.
fn populate_block(
    view: &TableView,
    tree: &mut GroupTree,
    level: usize,
    parent_group: Option<GroupId>,
    column_name: &str,
    input: &[u32],
    cancel: &CancelToken,
) -> Result<BlockId, ViewError> {
    if cancel.is_cancelled() {
        return Err(ViewError::Cancelled);
    }
    let column = view.column(column_name).ok_or_else(|| ViewError::UnknownColumn(column_name.to_string()))?;
    let grouped = match parent_group {
        None => column.group_indices(input),
        Some(g) => column.group_indices(&tree.groups[g].indices),
    };

    let parent_len = parent_group.map_or(input.len(), |g| tree.groups[g].indices.len());
    debug_assert_eq!(grouped.total(), parent_len, "block reconciliation for column {column_name:?}");
    debug!(column = column_name, level, groups = grouped.groups.len(), unmapped = grouped.unmapped.len(), "grouped block");

    let block_id = tree.blocks.len();
    let mut group_ids = Vec::with_capacity(grouped.groups.len());
    for (key, indices) in grouped.groups.into_iter().enumerate() {
        let group_id = tree.groups.len();
        tree.groups.push(Group {
            key: key as u32,
            indices,
            parent_group,
            block: block_id,
            child_block: None,
            aggregates: Vec::new(),
            incomplete: false,
        });
        group_ids.push(group_id);
    }
    tree.blocks.push(Block { parent_group, level, groups: group_ids, unmapped: grouped.unmapped, dropped: 0 });
    Ok(block_id)
}

/// Compute aggregate state at the deepest level and fold it upward level by
/// level. Subgroup counts are read from the tree shape directly.
fn accumulate_aggregates(view: &TableView, tree: &mut GroupTree) -> Result<(), ViewError> {
    let specs = tree.aggregates.clone();
    let mut columns: Vec<Option<Arc<Column>>> = Vec::with_capacity(specs.len());
    for spec in &specs {
        match spec.kind {
            Aggregate::RowCount | Aggregate::SubgroupCount => columns.push(None),
            _ => columns.push(Some(view.column_arc(&spec.column).ok_or_else(|| ViewError::UnknownColumn(spec.column.clone()))?)),
        }
    }

    for level in (0..tree.levels.len()).rev() {
        let block_ids = tree.levels[level].blocks.clone();
        for block_id in block_ids {
            for slot in 0..tree.blocks[block_id].groups.len() {
                let group_id = tree.blocks[block_id].groups[slot];
                let child_count = tree.subgroup_count(group_id) as u64;
                let folded: Vec<AggValue> = specs
                    .iter()
                    .zip(&columns)
                    .enumerate()
                    .map(|(slot, (spec, column))| match spec.kind {
                        Aggregate::SubgroupCount => AggValue::Subgroups(child_count),
                        _ => match tree.groups[group_id].child_block {
                            None => AggValue::leaf(spec, column.as_deref(), &tree.groups[group_id].indices, child_count),
                            Some(child_block) => {
                                let children = &tree.blocks[child_block].groups;
                                children
                                    .iter()
                                    .map(|&c| tree.groups[c].aggregates[slot].clone())
                                    .reduce(|a, b| a.fold(&b))
                                    // all children unmapped away: neutral state
                                    .unwrap_or_else(|| AggValue::leaf(spec, column.as_deref(), &[], 0))
                            }
                        },
                    })
                    .collect();
                tree.groups[group_id].aggregates = folded;
            }
        }
    }
    Ok(())
}

/// Sort each block's groups: by column value at the group's first row
/// unless overridden, direction per the request, ties broken by group key.
/// With a limit, a bounded heap keeps only the K best groups per block;
/// the rest are counted as dropped and the parent group flagged incomplete.
fn sort_blocks(view: &TableView, tree: &mut GroupTree, request: &GroupRequest) -> Result<(), ViewError> {
    for level in 0..tree.levels.len() {
        let column_name = tree.levels[level].column.clone();
        let column = view.column(&column_name).ok_or_else(|| ViewError::UnknownColumn(column_name.clone()))?;
        let compare = request.overrides.get(&column_name).cloned().unwrap_or(GroupCompare::Value);
        let ascending = request.ascending.get(&column_name).copied().unwrap_or(true);

        let block_ids = tree.levels[level].blocks.clone();
        for block_id in block_ids {
            // aggregate-driven ordering resolves each group's state once
            let agg_keys: Option<HashMap<GroupId, AggValue>> = match &compare {
                GroupCompare::Aggregate(spec) => Some(resolve_aggregates(view, tree, block_id, spec)?),
                _ => None,
            };
            let mut ordered = tree.blocks[block_id].groups.clone();
            let before = ordered.len();
            {
                let cmp = |&a: &GroupId, &b: &GroupId| {
                    let ga = &tree.groups[a];
                    let gb = &tree.groups[b];
                    let primary = match &compare {
                        GroupCompare::Value => column.compare(ga.indices[0], gb.indices[0]),
                        GroupCompare::Aggregate(_) => agg_keys
                            .as_ref()
                            .and_then(|keys| Some(keys.get(&a)?.compare(keys.get(&b)?)))
                            .unwrap_or(Ordering::Equal),
                        GroupCompare::Custom(f) => f(ga, gb),
                    };
                    let primary = if ascending { primary } else { primary.reverse() };
                    primary.then(ga.key.cmp(&gb.key))
                };
                match request.limit {
                    Some(limit) if before > limit => top_k_by(&mut ordered, limit, cmp),
                    _ => ordered.sort_by(cmp),
                }
            }
            let dropped = before - ordered.len();
            tree.blocks[block_id].groups = ordered;
            if dropped > 0 {
                tree.blocks[block_id].dropped = dropped;
                warn!(block = block_id, dropped, "top-K truncation dropped groups");
                if let Some(parent) = tree.blocks[block_id].parent_group {
                    tree.groups[parent].incomplete = true;
                }
            }
        }
    }
    Ok(())
}

fn resolve_aggregates(view: &TableView, tree: &GroupTree, block_id: BlockId, spec: &AggSpec) -> Result<HashMap<GroupId, AggValue>, ViewError> {
    let stored = tree.aggregates.iter().position(|s| s == spec);
    let column = match (stored, spec.kind) {
        (None, Aggregate::RowCount | Aggregate::SubgroupCount) | (Some(_), _) => None,
        (None, _) => Some(view.column_arc(&spec.column).ok_or_else(|| ViewError::UnknownColumn(spec.column.clone()))?),
    };
    Ok(tree.blocks[block_id]
        .groups
        .iter()
        .map(|&g| {
            let group = &tree.groups[g];
            let value = match stored {
                Some(slot) => group.aggregates[slot].clone(),
                None => AggValue::leaf(spec, column.as_deref(), &group.indices, tree.subgroup_count(g) as u64),
            };
            (g, value)
        })
        .collect())
}
