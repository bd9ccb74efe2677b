use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::carton::Carton;
use crate::model::PackedItemList;
use crate::sort::{DefaultItemSorter, ItemSorter};

/// Rotation permutations allowed for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// Must be placed in its defined orientation only.
    Never,
    /// Can be turned sideways 90°, but cannot be placed *on* its side,
    /// e.g. fragile "this way up" items.
    KeepFlat,
    /// No handling restrictions, the item can be placed in any orientation.
    BestFit,
}

/// Hook for caller-defined placement constraints, e.g. max N batteries per
/// carton, or no stacking of a given SKU. Only attach one if you actually
/// need it, evaluating the hook slows the packing down.
pub trait PlacementConstraint {
    /// Can this item be placed at the proposed position?
    ///
    /// `packed` is the list of items already placed in `carton`; `(x, y, z)`
    /// and `(width, length, depth)` describe the proposed placement in
    /// real-world carton coordinates.
    #[allow(clippy::too_many_arguments)]
    fn can_be_packed(
        &self,
        carton: &Carton,
        packed: &PackedItemList,
        x: u32,
        y: u32,
        z: u32,
        width: u32,
        length: u32,
        depth: u32,
    ) -> bool;
}

/// An item to be packed. Dimensions are mm, weight is g.
#[derive(Clone, Serialize, Deserialize)]
pub struct Item {
    /// Item SKU, description etc.
    pub description: String,
    pub width: u32,
    pub length: u32,
    pub depth: u32,
    pub weight: u32,
    pub rotation: Rotation,
    #[serde(skip)]
    constraint: Option<Rc<dyn PlacementConstraint>>,
}

impl Item {
    pub fn new(
        description: impl Into<String>,
        width: u32,
        length: u32,
        depth: u32,
        weight: u32,
        rotation: Rotation,
    ) -> Self {
        Self {
            description: description.into(),
            width,
            length,
            depth,
            weight,
            rotation,
            constraint: None,
        }
    }

    /// Attach a placement constraint hook.
    pub fn with_constraint(mut self, constraint: Rc<dyn PlacementConstraint>) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn volume(&self) -> u64 {
        self.width as u64 * self.length as u64 * self.depth as u64
    }

    pub fn has_constraint(&self) -> bool {
        self.constraint.is_some()
    }

    pub(crate) fn constraint(&self) -> Option<&Rc<dyn PlacementConstraint>> {
        self.constraint.as_ref()
    }

    /// Dimensions as a sorted triple, used to test dimensional equivalence.
    pub fn sorted_dimensions(&self) -> [u32; 3] {
        let mut dims = [self.width, self.length, self.depth];
        dims.sort_unstable();
        dims
    }

    /// Is the supplied item the same size as this one (in some rotation)?
    pub fn is_same_dimensions(&self, other: &Item) -> bool {
        self.sorted_dimensions() == other.sorted_dimensions()
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("description", &self.description)
            .field("width", &self.width)
            .field("length", &self.length)
            .field("depth", &self.depth)
            .field("weight", &self.weight)
            .field("rotation", &self.rotation)
            .field("constrained", &self.constraint.is_some())
            .finish()
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.description == other.description
            && self.width == other.width
            && self.length == other.length
            && self.depth == other.depth
            && self.weight == other.weight
            && self.rotation == other.rotation
    }
}

/// List of items to be packed, ordered by the configured item sorter.
///
/// The list sorts lazily: mutations mark it dirty and the next read through
/// an ordered accessor re-sorts. The front of the queue is the next item to
/// pack.
#[derive(Clone)]
pub struct ItemList {
    items: VecDeque<Rc<Item>>,
    is_sorted: bool,
    sorter: Rc<dyn ItemSorter>,
}

impl ItemList {
    pub fn new() -> Self {
        Self::with_sorter(Rc::new(DefaultItemSorter))
    }

    pub fn with_sorter(sorter: Rc<dyn ItemSorter>) -> Self {
        Self {
            items: VecDeque::new(),
            is_sorted: false,
            sorter,
        }
    }

    /// Bulk create. `pre_sorted` marks the given order as authoritative.
    pub fn from_vec(items: Vec<Rc<Item>>, pre_sorted: bool) -> Self {
        Self {
            items: items.into(),
            is_sorted: pre_sorted,
            sorter: Rc::new(DefaultItemSorter),
        }
    }

    pub fn insert(&mut self, item: impl Into<Rc<Item>>, qty: u32) {
        let item = item.into();
        let qty = qty.max(1);
        for _ in 0..qty {
            self.items.push_back(Rc::clone(&item));
        }
        self.is_sorted = false;
    }

    /// Remove one occurrence of `item` (by identity).
    pub fn remove(&mut self, item: &Rc<Item>) {
        if let Some(pos) = self.items.iter().position(|i| Rc::ptr_eq(i, item)) {
            self.items.remove(pos);
        }
    }

    /// Remove the source item of every packed item in `packed`.
    pub fn remove_packed(&mut self, packed: &PackedItemList) {
        for packed_item in packed.iter() {
            self.remove(&packed_item.item);
        }
    }

    /// Remove and return the top item.
    pub fn extract(&mut self) -> Option<Rc<Item>> {
        self.sort_if_needed();
        self.items.pop_front()
    }

    /// The top item without removing it.
    pub fn top(&mut self) -> Option<&Rc<Item>> {
        self.sort_if_needed();
        self.items.front()
    }

    /// The top item of an already-ordered list.
    pub(crate) fn peek_top(&self) -> Option<&Rc<Item>> {
        debug_assert!(self.is_sorted || self.items.is_empty());
        self.items.front()
    }

    /// A copy of the first `n` items of an already-ordered list.
    pub(crate) fn peek_top_n(&self, n: usize) -> ItemList {
        debug_assert!(self.is_sorted || self.items.is_empty());
        Self {
            items: self.items.iter().take(n).cloned().collect(),
            is_sorted: true,
            sorter: Rc::clone(&self.sorter),
        }
    }

    /// A copy of the first `n` items.
    pub fn top_n(&mut self, n: usize) -> ItemList {
        self.sort_if_needed();
        self.peek_top_n(n)
    }

    /// Put `items` back at the front of the queue, ahead of everything else.
    /// The resulting order is treated as authoritative.
    pub(crate) fn requeue_front(&mut self, items: Vec<Rc<Item>>) {
        self.sort_if_needed();
        for item in items.into_iter().rev() {
            self.items.push_front(item);
        }
        self.is_sorted = true;
    }

    /// Iterate in packing order.
    pub fn iter(&mut self) -> impl Iterator<Item = &Rc<Item>> {
        self.sort_if_needed();
        self.items.iter()
    }

    /// Iterate in the current internal order, without sorting.
    pub(crate) fn raw_iter(&self) -> impl Iterator<Item = &Rc<Item>> {
        self.items.iter()
    }

    /// An ordered copy of this list.
    pub(crate) fn clone_sorted(&mut self) -> ItemList {
        self.sort_if_needed();
        self.clone()
    }

    /// Treat the current order as authoritative, suppressing the sorter.
    pub fn mark_sorted(&mut self) {
        self.is_sorted = true;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_volume(&self) -> u64 {
        self.items.iter().map(|i| i.volume()).sum()
    }

    /// Does this list contain items with constrained placement criteria?
    pub fn has_constrained_items(&self) -> bool {
        self.items.iter().any(|i| i.has_constraint())
    }

    /// Does this list contain items which cannot be rotated?
    pub fn has_no_rotation_items(&self) -> bool {
        self.items.iter().any(|i| i.rotation == Rotation::Never)
    }

    fn sort_if_needed(&mut self) {
        if !self.is_sorted {
            let sorter = Rc::clone(&self.sorter);
            self.items
                .make_contiguous()
                .sort_by(|a, b| sorter.compare(a, b));
            self.is_sorted = true;
        }
    }
}

impl Default for ItemList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ItemList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}
