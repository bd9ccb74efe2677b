//! Orientation selection: which rotations are legal for an item, which are
//! stable, and which is the best choice in a given context. The sorter's
//! lookahead runs a stripped-down volume pack against synthetic working
//! volumes, memoised in a per-pack cache.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use crate::carton::Carton;
use crate::item::{Item, ItemList, Rotation};
use crate::model::PackedItemList;
use crate::packer::volume::VolumePacker;

/// How many upcoming items the lookahead simulation considers. Kept small,
/// the simulation is recursive and gets slow.
pub(crate) const LOOKAHEAD_ITEMS: usize = 8;

/// Tipping-angle threshold in radians (~15°) below which an orientation is
/// considered unstable.
const STABILITY_THRESHOLD: f64 = 0.261;

/// An item to be packed, in a specific orientation. Immutable after creation.
#[derive(Debug, Clone)]
pub struct OrientatedItem {
    pub item: Rc<Item>,
    pub width: u32,
    pub length: u32,
    pub depth: u32,
    pub surface_footprint: u64,
    sorted_dimensions: [u32; 3],
}

impl OrientatedItem {
    pub fn new(item: Rc<Item>, width: u32, length: u32, depth: u32) -> Self {
        let mut sorted_dimensions = [width, length, depth];
        sorted_dimensions.sort_unstable();
        Self {
            item,
            width,
            length,
            depth,
            surface_footprint: width as u64 * length as u64,
            sorted_dimensions,
        }
    }

    /// Is this orientation stable (low centre of gravity)? The tipping point
    /// must exceed ~15°. Assumes equal weight distribution.
    pub fn is_stable(&self) -> bool {
        let depth = self.depth.max(1) as f64;
        let min_dim = self.width.min(self.length) as f64;
        (min_dim / depth).atan() > STABILITY_THRESHOLD
    }

    /// Is the supplied item the same size as this one?
    pub fn is_same_dimensions(&self, item: &Item) -> bool {
        self.sorted_dimensions == item.sorted_dimensions()
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct LookaheadKey {
    width_left: u32,
    length_left: u32,
    width: u32,
    length: u32,
    row_length: u32,
    depth_left: u32,
    next_items: Vec<(u32, u32, u32, u32, Rotation)>,
}

impl LookaheadKey {
    fn new(
        width_left: u32,
        length_left: u32,
        width: u32,
        length: u32,
        row_length: u32,
        depth_left: u32,
        next_items: &ItemList,
    ) -> Self {
        Self {
            width_left,
            length_left,
            width,
            length,
            row_length,
            depth_left,
            next_items: next_items
                .raw_iter()
                .map(|i| (i.width, i.length, i.depth, i.weight, i.rotation))
                .collect(),
        }
    }
}

/// Memoised forward-simulation scores. Owned by the packer for the duration
/// of one pack and cleared at the start of the next; hits must be exact.
#[derive(Debug, Default)]
pub struct LookaheadCache {
    scores: HashMap<LookaheadKey, usize>,
}

impl LookaheadCache {
    pub fn clear(&mut self) {
        self.scores.clear();
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn get(&self, key: &LookaheadKey) -> Option<usize> {
        self.scores.get(key).copied()
    }

    fn insert(&mut self, key: LookaheadKey, score: usize) {
        self.scores.insert(key, score);
    }
}

/// Figures out the orientations legal for an item in a given context.
pub struct OrientatedItemFactory {
    carton: Rc<Carton>,
    single_pass_mode: bool,
    carton_is_rotated: bool,
    empty_carton_stable_cache: HashMap<([u32; 3], Rotation), bool>,
}

impl OrientatedItemFactory {
    pub fn new(carton: Rc<Carton>) -> Self {
        Self {
            carton,
            single_pass_mode: false,
            carton_is_rotated: false,
            empty_carton_stable_cache: HashMap::new(),
        }
    }

    pub fn set_single_pass_mode(&mut self, single_pass_mode: bool) {
        self.single_pass_mode = single_pass_mode;
    }

    pub fn set_carton_is_rotated(&mut self, carton_is_rotated: bool) {
        self.carton_is_rotated = carton_is_rotated;
    }

    /// The best orientation for an item, or `None` if nothing fits.
    #[allow(clippy::too_many_arguments)]
    pub fn best_orientation(
        &mut self,
        item: &Rc<Item>,
        prev_item: Option<&OrientatedItem>,
        next_items: &ItemList,
        width_left: u32,
        length_left: u32,
        depth_left: u32,
        row_length: u32,
        x: u32,
        y: u32,
        z: u32,
        packed: &PackedItemList,
        consider_stability: bool,
        cache: &Rc<RefCell<LookaheadCache>>,
    ) -> Option<OrientatedItem> {
        self.sorted_orientations(
            item,
            prev_item,
            next_items,
            width_left,
            length_left,
            depth_left,
            row_length,
            x,
            y,
            z,
            packed,
            consider_stability,
            cache,
        )
        .into_iter()
        .next()
    }

    /// All usable orientations for an item, best first.
    #[allow(clippy::too_many_arguments)]
    pub fn sorted_orientations(
        &mut self,
        item: &Rc<Item>,
        prev_item: Option<&OrientatedItem>,
        next_items: &ItemList,
        width_left: u32,
        length_left: u32,
        depth_left: u32,
        row_length: u32,
        x: u32,
        y: u32,
        z: u32,
        packed: &PackedItemList,
        consider_stability: bool,
        cache: &Rc<RefCell<LookaheadCache>>,
    ) -> Vec<OrientatedItem> {
        let possible = self.possible_orientations(
            item, prev_item, width_left, length_left, depth_left, x, y, z, packed,
        );
        let mut usable = if consider_stability {
            self.usable_orientations(item, possible)
        } else {
            possible
        };

        if usable.len() > 1 {
            let sorter = OrientatedItemSorter {
                factory: &*self,
                single_pass_mode: self.single_pass_mode,
                width_left,
                length_left,
                depth_left,
                next_items,
                row_length,
                x,
                y,
                z,
                packed,
                cache,
            };
            usable.sort_by(|a, b| sorter.compare(a, b));
        }

        usable
    }

    /// All orientations of an item that fit the remaining space and survive
    /// the item's placement constraint, if any.
    #[allow(clippy::too_many_arguments)]
    pub fn possible_orientations(
        &self,
        item: &Rc<Item>,
        prev_item: Option<&OrientatedItem>,
        width_left: u32,
        length_left: u32,
        depth_left: u32,
        x: u32,
        y: u32,
        z: u32,
        packed: &PackedItemList,
    ) -> Vec<OrientatedItem> {
        let mut orientations: Vec<OrientatedItem> = Self::permutations(item, prev_item)
            .into_iter()
            .filter(|[w, l, d]| *w <= width_left && *l <= length_left && *d <= depth_left)
            .map(|[w, l, d]| OrientatedItem::new(Rc::clone(item), w, l, d))
            .collect();

        // Constraint hooks see real-world coordinates, so a rotated carton
        // swaps x<->y and width<->length. Lookahead working volumes skip the
        // hook entirely.
        if let Some(constraint) = item.constraint() {
            if !self.carton.is_working_volume() {
                orientations.retain(|o| {
                    if self.carton_is_rotated {
                        constraint.can_be_packed(
                            &self.carton,
                            packed,
                            y,
                            x,
                            z,
                            o.length,
                            o.width,
                            o.depth,
                        )
                    } else {
                        constraint.can_be_packed(
                            &self.carton,
                            packed,
                            x,
                            y,
                            z,
                            o.width,
                            o.length,
                            o.depth,
                        )
                    }
                });
            }
        }

        orientations
    }

    /// Filter by stability. Stable orientations are preferred; the unstable
    /// set is usable only when the item has no stable orientation even in an
    /// empty carton (it then has no choice).
    fn usable_orientations(
        &mut self,
        item: &Rc<Item>,
        possible: Vec<OrientatedItem>,
    ) -> Vec<OrientatedItem> {
        let mut stable = Vec::new();
        let mut unstable = Vec::new();

        for orientation in possible {
            // An orientation spanning the full inner depth cannot tip over.
            if orientation.is_stable() || self.carton.inner_depth == orientation.depth {
                stable.push(orientation);
            } else {
                unstable.push(orientation);
            }
        }

        if !stable.is_empty() {
            return stable;
        }
        if !unstable.is_empty() && !self.has_stable_orientation_in_empty_carton(item) {
            return unstable;
        }
        Vec::new()
    }

    fn has_stable_orientation_in_empty_carton(&mut self, item: &Rc<Item>) -> bool {
        let key = ([item.width, item.length, item.depth], item.rotation);
        if let Some(&cached) = self.empty_carton_stable_cache.get(&key) {
            return cached;
        }

        let orientations = self.possible_orientations(
            item,
            None,
            self.carton.inner_width,
            self.carton.inner_length,
            self.carton.inner_depth,
            0,
            0,
            0,
            &PackedItemList::new(),
        );
        let has_stable = orientations.iter().any(|o| o.is_stable());

        self.empty_carton_stable_cache.insert(key, has_stable);
        has_stable
    }

    /// Dimension permutations permitted by the item's rotation policy,
    /// deduplicated in insertion order. Items with the same dimension
    /// multiset as the previous one reuse its orientation to keep rows tidy.
    fn permutations(item: &Item, prev_item: Option<&OrientatedItem>) -> Vec<[u32; 3]> {
        if let Some(prev) = prev_item {
            if prev.is_same_dimensions(item) {
                return vec![[prev.width, prev.length, prev.depth]];
            }
        }

        let (w, l, d) = (item.width, item.length, item.depth);
        let mut permutations: Vec<[u32; 3]> = vec![[w, l, d]];
        let add = |p: [u32; 3], out: &mut Vec<[u32; 3]>| {
            if !out.contains(&p) {
                out.push(p);
            }
        };

        if item.rotation != Rotation::Never {
            // simple 2D rotation
            add([l, w, d], &mut permutations);
        }
        if item.rotation == Rotation::BestFit {
            // add 3D rotation if we're allowed
            add([w, d, l], &mut permutations);
            add([l, d, w], &mut permutations);
            add([d, w, l], &mut permutations);
            add([d, l, w], &mut permutations);
        }

        permutations
    }
}

/// Strict total order over candidate orientations for a given context:
/// exact fits, then lookahead, then minimum gap, then footprint.
pub(crate) struct OrientatedItemSorter<'a> {
    pub(crate) factory: &'a OrientatedItemFactory,
    pub(crate) single_pass_mode: bool,
    pub(crate) width_left: u32,
    pub(crate) length_left: u32,
    pub(crate) depth_left: u32,
    pub(crate) next_items: &'a ItemList,
    pub(crate) row_length: u32,
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) z: u32,
    pub(crate) packed: &'a PackedItemList,
    pub(crate) cache: &'a Rc<RefCell<LookaheadCache>>,
}

impl OrientatedItemSorter<'_> {
    pub(crate) fn compare(&self, a: &OrientatedItem, b: &OrientatedItem) -> Ordering {
        // prefer exact fits, in width/length/depth order
        let a_width_left = self.width_left - a.width;
        let b_width_left = self.width_left - b.width;
        let decider = exact_fit_decider(a_width_left, b_width_left);
        if decider != Ordering::Equal {
            return decider;
        }

        let decider = exact_fit_decider(self.length_left - a.length, self.length_left - b.length);
        if decider != Ordering::Equal {
            return decider;
        }

        let decider = exact_fit_decider(self.depth_left - a.depth, self.depth_left - b.depth);
        if decider != Ordering::Equal {
            return decider;
        }

        // prefer leaving room for the next item(s)
        if !self.single_pass_mode && !self.next_items.is_empty() {
            let decider = self.look_ahead_decider(a, b, a_width_left, b_width_left);
            if decider != Ordering::Equal {
                return decider;
            }
        }

        // otherwise prefer leaving the minimum possible gap, or the greatest
        // footprint
        let a_min_gap = a_width_left.min(self.length_left - a.length);
        let b_min_gap = b_width_left.min(self.length_left - b.length);
        if a_min_gap != b_min_gap {
            return a_min_gap.cmp(&b_min_gap);
        }

        b.surface_footprint.cmp(&a.surface_footprint)
    }

    fn look_ahead_decider(
        &self,
        a: &OrientatedItem,
        b: &OrientatedItem,
        a_width_left: u32,
        b_width_left: u32,
    ) -> Ordering {
        let next_item = match self.next_items.peek_top() {
            Some(item) => item,
            None => return Ordering::Equal,
        };

        let next_fits_a = self.factory.possible_orientations(
            next_item,
            Some(a),
            a_width_left,
            self.length_left,
            self.depth_left,
            self.x,
            self.y,
            self.z,
            self.packed,
        );
        let next_fits_b = self.factory.possible_orientations(
            next_item,
            Some(b),
            b_width_left,
            self.length_left,
            self.depth_left,
            self.x,
            self.y,
            self.z,
            self.packed,
        );

        if !next_fits_a.is_empty() && next_fits_b.is_empty() {
            return Ordering::Less;
        }
        if !next_fits_b.is_empty() && next_fits_a.is_empty() {
            return Ordering::Greater;
        }

        // not an easy either/or, do a partial lookahead
        let additional_a = self.additional_items_packed(a);
        let additional_b = self.additional_items_packed(b);
        additional_b.cmp(&additional_a)
    }

    /// Approximation of a forward-looking packing: how many of the upcoming
    /// items still pack if this orientation is chosen? Not an actual packing
    /// (that has additional logic regarding constraints and stackability),
    /// this focuses purely on fit.
    pub(crate) fn additional_items_packed(&self, prev_item: &OrientatedItem) -> usize {
        let current_row_length = self.row_length.max(prev_item.length);
        let mut items_to_pack = self.next_items.peek_top_n(LOOKAHEAD_ITEMS);
        let top_n_count = items_to_pack.len();

        let key = LookaheadKey::new(
            self.width_left,
            self.length_left,
            prev_item.width,
            prev_item.length,
            current_row_length,
            self.depth_left,
            &items_to_pack,
        );
        if let Some(cached) = self.cache.borrow().get(&key) {
            return cached;
        }

        // fill out the rest of the current row...
        let row_volume = Rc::new(Carton::working_volume(
            self.width_left - prev_item.width,
            current_row_length,
            self.depth_left,
        ));
        let mut packer = VolumePacker::new(row_volume, &mut items_to_pack, Rc::clone(self.cache));
        packer.set_single_pass_mode(true);
        let row_packed = packer.pack();
        items_to_pack.remove_packed(&row_packed.items);

        // ...then whatever rows come after it
        let next_rows_volume = Rc::new(Carton::working_volume(
            self.width_left,
            self.length_left.saturating_sub(current_row_length),
            self.depth_left,
        ));
        let mut packer =
            VolumePacker::new(next_rows_volume, &mut items_to_pack, Rc::clone(self.cache));
        packer.set_single_pass_mode(true);
        let next_rows_packed = packer.pack();
        items_to_pack.remove_packed(&next_rows_packed.items);

        let packed_count = top_n_count - items_to_pack.len();
        self.cache.borrow_mut().insert(key, packed_count);
        packed_count
    }
}

fn exact_fit_decider(a_left: u32, b_left: u32) -> Ordering {
    if a_left == 0 && b_left > 0 {
        Ordering::Less
    } else if a_left > 0 && b_left == 0 {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(w: u32, l: u32, d: u32, rotation: Rotation) -> Rc<Item> {
        Rc::new(Item::new("test", w, l, d, 100, rotation))
    }

    #[test]
    fn stability_follows_tipping_angle() {
        let flat = OrientatedItem::new(item(100, 100, 10, Rotation::BestFit), 100, 100, 10);
        assert!(flat.is_stable());

        let tall = OrientatedItem::new(item(2, 2, 100, Rotation::BestFit), 2, 2, 100);
        assert!(!tall.is_stable());

        // zero depth never divides by zero
        let sheet = OrientatedItem::new(item(100, 100, 0, Rotation::BestFit), 100, 100, 0);
        assert!(sheet.is_stable());
    }

    #[test]
    fn permutation_count_by_rotation_policy() {
        assert_eq!(
            OrientatedItemFactory::permutations(&item(1, 2, 3, Rotation::Never), None).len(),
            1
        );
        assert_eq!(
            OrientatedItemFactory::permutations(&item(1, 2, 3, Rotation::KeepFlat), None).len(),
            2
        );
        assert_eq!(
            OrientatedItemFactory::permutations(&item(1, 2, 3, Rotation::BestFit), None).len(),
            6
        );
    }

    #[test]
    fn equal_dimensions_collapse_duplicate_permutations() {
        assert_eq!(
            OrientatedItemFactory::permutations(&item(5, 5, 5, Rotation::BestFit), None).len(),
            1
        );
        assert_eq!(
            OrientatedItemFactory::permutations(&item(5, 5, 9, Rotation::BestFit), None).len(),
            3
        );
    }

    #[test]
    fn sticky_orientation_for_identical_previous_item() {
        let prev = OrientatedItem::new(item(3, 2, 1, Rotation::BestFit), 3, 2, 1);
        let perms =
            OrientatedItemFactory::permutations(&item(1, 2, 3, Rotation::BestFit), Some(&prev));
        assert_eq!(perms, vec![[3, 2, 1]]);
    }

    #[test]
    fn keep_flat_never_changes_depth() {
        let factory = OrientatedItemFactory::new(Rc::new(Carton::working_volume(100, 100, 100)));
        let orientations = factory.possible_orientations(
            &item(10, 20, 5, Rotation::KeepFlat),
            None,
            100,
            100,
            100,
            0,
            0,
            0,
            &PackedItemList::new(),
        );
        assert_eq!(orientations.len(), 2);
        assert!(orientations.iter().all(|o| o.depth == 5));
    }

    #[test]
    fn fit_filter_drops_oversized_orientations() {
        let factory = OrientatedItemFactory::new(Rc::new(Carton::working_volume(10, 10, 25)));
        let orientations = factory.possible_orientations(
            &item(10, 20, 5, Rotation::BestFit),
            None,
            10,
            10,
            25,
            0,
            0,
            0,
            &PackedItemList::new(),
        );
        // only the stood-up orientations fit a 10x10 footprint
        assert!(!orientations.is_empty());
        assert!(orientations.iter().all(|o| o.depth == 20));
    }

    #[test]
    fn exact_fit_decider_prefers_zero_slack() {
        assert_eq!(exact_fit_decider(0, 3), Ordering::Less);
        assert_eq!(exact_fit_decider(3, 0), Ordering::Greater);
        assert_eq!(exact_fit_decider(0, 0), Ordering::Equal);
        assert_eq!(exact_fit_decider(2, 3), Ordering::Equal);
    }

    #[test]
    fn lookahead_cache_hit_matches_fresh_simulation() {
        let carton = Rc::new(Carton::working_volume(100, 100, 100));
        let factory = OrientatedItemFactory::new(Rc::clone(&carton));
        let cache = Rc::new(RefCell::new(LookaheadCache::default()));

        let mut next_items = ItemList::new();
        next_items.insert(item(30, 30, 30, Rotation::BestFit), 2);
        next_items.insert(item(20, 20, 20, Rotation::BestFit), 1);
        next_items.top(); // force ordering

        let packed = PackedItemList::new();
        let sorter = OrientatedItemSorter {
            factory: &factory,
            single_pass_mode: false,
            width_left: 100,
            length_left: 100,
            depth_left: 100,
            next_items: &next_items,
            row_length: 0,
            x: 0,
            y: 0,
            z: 0,
            packed: &packed,
            cache: &cache,
        };

        let candidate = OrientatedItem::new(item(40, 40, 40, Rotation::BestFit), 40, 40, 40);
        let fresh = sorter.additional_items_packed(&candidate);
        assert!(!cache.borrow().is_empty());
        let cached = sorter.additional_items_packed(&candidate);
        assert_eq!(fresh, cached);

        cache.borrow_mut().clear();
        let refreshed = sorter.additional_items_packed(&candidate);
        assert_eq!(fresh, refreshed);
    }
}
