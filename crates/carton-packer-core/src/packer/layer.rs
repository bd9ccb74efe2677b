//! Fills a single horizontal layer with a row-major sweep, recursing into
//! sub-rectangles for opportunistic stacking and row back-fill.

use std::cell::RefCell;
use std::rc::Rc;

use crate::carton::Carton;
use crate::item::{Item, ItemList};
use crate::model::{PackedItem, PackedItemList, PackedLayer};
use crate::packer::orientation::{LookaheadCache, OrientatedItem, OrientatedItemFactory};

pub struct LayerPacker {
    carton: Rc<Carton>,
    single_pass_mode: bool,
    strict_item_ordering: bool,
    factory: OrientatedItemFactory,
    cache: Rc<RefCell<LookaheadCache>>,
}

impl LayerPacker {
    pub fn new(carton: Rc<Carton>, cache: Rc<RefCell<LookaheadCache>>) -> Self {
        let factory = OrientatedItemFactory::new(Rc::clone(&carton));
        Self {
            carton,
            single_pass_mode: false,
            strict_item_ordering: false,
            factory,
            cache,
        }
    }

    pub fn set_single_pass_mode(&mut self, single_pass_mode: bool) {
        self.single_pass_mode = single_pass_mode;
        self.factory.set_single_pass_mode(single_pass_mode);
    }

    pub fn set_carton_is_rotated(&mut self, carton_is_rotated: bool) {
        self.factory.set_carton_is_rotated(carton_is_rotated);
    }

    pub fn set_strict_item_ordering(&mut self, strict: bool) {
        self.strict_item_ordering = strict;
    }

    /// Pack items into an individual layer: the slab at `z = start_z` from
    /// `(start_x, start_y)` to `(width_for_layer, length_for_layer)`, up to
    /// `depth_for_layer` high.
    ///
    /// The shared item queue is consumed as items are placed; skipped items
    /// are re-queued in front, so requeues are visible to the caller.
    /// `guideline_layer_depth` is the stacking ceiling discovered by a
    /// preliminary pass (0 means "use the placed item's own depth").
    #[allow(clippy::too_many_arguments)]
    pub fn pack_layer(
        &mut self,
        items: &mut ItemList,
        packed: &mut PackedItemList,
        start_x: u32,
        start_y: u32,
        start_z: u32,
        width_for_layer: u32,
        length_for_layer: u32,
        depth_for_layer: u32,
        guideline_layer_depth: u32,
        consider_stability: bool,
        mut first_item: Option<OrientatedItem>,
    ) -> PackedLayer {
        let mut layer = PackedLayer::new();
        let mut x = start_x;
        let mut y = start_y;
        let z = start_z;
        let mut row_length: u32 = 0;
        let mut prev_item: Option<OrientatedItem> = None;
        let mut skipped_items: Vec<Rc<Item>> = Vec::new();

        while let Some(item_to_pack) = items.extract() {
            // skip items that will never fit e.g. too heavy
            let remaining_weight = (self.carton.max_weight as u64)
                .saturating_sub(self.carton.empty_weight as u64)
                .saturating_sub(packed.weight());
            if item_to_pack.weight as u64 > remaining_weight {
                continue;
            }

            let orientated = if first_item
                .as_ref()
                .is_some_and(|f| Rc::ptr_eq(&f.item, &item_to_pack))
            {
                first_item.take()
            } else {
                self.factory.best_orientation(
                    &item_to_pack,
                    prev_item.as_ref(),
                    items,
                    width_for_layer.saturating_sub(x),
                    length_for_layer.saturating_sub(y),
                    depth_for_layer,
                    row_length,
                    x,
                    y,
                    z,
                    packed,
                    consider_stability,
                    &self.cache,
                )
            };

            if let Some(orientated) = orientated {
                let packed_item = PackedItem::from_orientated(&orientated, x, y, z);
                layer.insert(packed_item.clone());
                packed.insert(packed_item.clone());

                row_length = row_length.max(packed_item.length);

                // Figure out if we can stack items on top of this rather than
                // side by side, e.g. when we've packed a tall item and have
                // just put a shorter one next to it.
                let layer_depth = if guideline_layer_depth > 0 {
                    guideline_layer_depth
                } else {
                    layer.depth()
                };
                let stackable_depth = layer_depth.saturating_sub(packed_item.depth);
                if stackable_depth > 0 {
                    let stacked = self.pack_layer(
                        items,
                        packed,
                        x,
                        y,
                        z + packed_item.depth,
                        x + packed_item.width,
                        y + packed_item.length,
                        stackable_depth,
                        stackable_depth,
                        consider_stability,
                        None,
                    );
                    layer.merge(stacked);
                }

                x += packed_item.width;

                // might be space available lengthwise across the width of
                // this item, up to the current row length
                let backfill = self.pack_layer(
                    items,
                    packed,
                    x - packed_item.width,
                    y + packed_item.length,
                    z,
                    x,
                    y + row_length,
                    depth_for_layer,
                    layer.depth(),
                    consider_stability,
                    None,
                );
                layer.merge(backfill);

                prev_item = Some(orientated);

                if items.is_empty() && !skipped_items.is_empty() {
                    items.requeue_front(std::mem::take(&mut skipped_items));
                }
                continue;
            }

            if !self.strict_item_ordering && !items.is_empty() {
                // skip for now, move on to the next item. A contiguous run of
                // identical items is known to fail the same way, so park the
                // run too. The last one is not parked, it needs to trigger
                // the reset logic below.
                skipped_items.push(Rc::clone(&item_to_pack));
                while items.len() > 1
                    && items
                        .top()
                        .is_some_and(|top| top.is_same_dimensions(&item_to_pack))
                {
                    let same = items.extract().expect("non-empty list");
                    skipped_items.push(same);
                }
                continue;
            }

            if x > start_x {
                // close the row and sweep again from the left edge
                y += row_length;
                x = start_x;
                row_length = 0;
                skipped_items.push(item_to_pack);
                items.requeue_front(std::mem::take(&mut skipped_items));
                prev_item = None;
                continue;
            }

            // nowhere left to put it
            skipped_items.push(item_to_pack);
            items.requeue_front(std::mem::take(&mut skipped_items));
            return layer;
        }

        layer
    }
}
