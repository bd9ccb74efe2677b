//! Plain-struct C ABI for embedding the orientation and lookahead
//! heuristics in other runtimes. Stateless apart from a thread-local
//! lookahead memo, which callers clear explicitly between unrelated
//! workloads.

use std::cell::RefCell;
use std::rc::Rc;
use std::slice;

use crate::carton::Carton;
use crate::item::{Item, ItemList, Rotation};
use crate::model::PackedItemList;
use crate::packer::orientation::{
    LookaheadCache, OrientatedItem, OrientatedItemFactory, OrientatedItemSorter,
};

thread_local! {
    static LOOKAHEAD_CACHE: Rc<RefCell<LookaheadCache>> =
        Rc::new(RefCell::new(LookaheadCache::default()));
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiItem {
    pub width: u32,
    pub length: u32,
    pub depth: u32,
    pub weight: u32,
    /// 0 = never, 1 = keep flat, anything else = best fit.
    pub rotation: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiCarton {
    pub inner_width: u32,
    pub inner_length: u32,
    pub inner_depth: u32,
    pub max_weight: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiOrientatedItem {
    pub width: u32,
    pub length: u32,
    pub depth: u32,
    pub surface_footprint: u64,
}

fn rotation_from(raw: u32) -> Rotation {
    match raw {
        0 => Rotation::Never,
        1 => Rotation::KeepFlat,
        _ => Rotation::BestFit,
    }
}

/// # Safety
/// `items` must point to `count` valid `FfiItem`s, or be null with `count` 0.
unsafe fn items_from_raw(items: *const FfiItem, count: usize) -> ItemList {
    if items.is_null() || count == 0 {
        return ItemList::from_vec(Vec::new(), true);
    }
    let raw = unsafe { slice::from_raw_parts(items, count) };
    let converted = raw
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Rc::new(Item::new(
                format!("item {index}"),
                item.width,
                item.length,
                item.depth,
                item.weight,
                rotation_from(item.rotation),
            ))
        })
        .collect();
    // the caller's order is authoritative
    ItemList::from_vec(converted, true)
}

/// How many of the upcoming items still pack alongside the previous
/// orientation. Returns the packed count.
///
/// # Safety
/// `items` must point to `item_count` valid `FfiItem`s, or be null with
/// `item_count` 0.
#[no_mangle]
pub unsafe extern "C" fn carton_packer_calculate_lookahead(
    prev_width: u32,
    prev_length: u32,
    prev_depth: u32,
    items: *const FfiItem,
    item_count: usize,
    width_left: u32,
    length_left: u32,
    depth_left: u32,
    row_length: u32,
    max_lookahead: usize,
) -> usize {
    if item_count == 0 || max_lookahead == 0 || prev_width > width_left {
        return 0;
    }
    let next_items = unsafe { items_from_raw(items, item_count.min(max_lookahead)) };

    let prev_item = OrientatedItem::new(
        Rc::new(Item::new(
            "previous",
            prev_width,
            prev_length,
            prev_depth,
            0,
            Rotation::BestFit,
        )),
        prev_width,
        prev_length,
        prev_depth,
    );

    LOOKAHEAD_CACHE.with(|cache| {
        let carton = Rc::new(Carton::working_volume(width_left, length_left, depth_left));
        let factory = OrientatedItemFactory::new(carton);
        let packed = PackedItemList::new();
        let sorter = OrientatedItemSorter {
            factory: &factory,
            single_pass_mode: false,
            width_left,
            length_left,
            depth_left,
            next_items: &next_items,
            row_length,
            x: 0,
            y: 0,
            z: 0,
            packed: &packed,
            cache,
        };
        sorter.additional_items_packed(&prev_item)
    })
}

/// Pick the best orientation for `item` in the given space, writing it
/// through `out_orientation`. Returns 1 on success, 0 when nothing fits.
///
/// # Safety
/// `item`, `carton` and `out_orientation` must be valid pointers;
/// `next_items` must point to `next_item_count` valid `FfiItem`s, or be null
/// with `next_item_count` 0.
#[no_mangle]
pub unsafe extern "C" fn carton_packer_best_orientation(
    item: *const FfiItem,
    next_items: *const FfiItem,
    next_item_count: usize,
    width_left: u32,
    length_left: u32,
    depth_left: u32,
    row_length: u32,
    packed_weight: u32,
    carton: *const FfiCarton,
    out_orientation: *mut FfiOrientatedItem,
) -> i32 {
    if item.is_null() || carton.is_null() || out_orientation.is_null() {
        return 0;
    }
    let raw_item = unsafe { &*item };
    let raw_carton = unsafe { &*carton };

    // too heavy is an immediate no-fit
    let remaining_weight = (raw_carton.max_weight as u64).saturating_sub(packed_weight as u64);
    if raw_item.weight as u64 > remaining_weight {
        return 0;
    }

    let item = Rc::new(Item::new(
        "item",
        raw_item.width,
        raw_item.length,
        raw_item.depth,
        raw_item.weight,
        rotation_from(raw_item.rotation),
    ));
    let carton = Rc::new(Carton::new(
        "carton",
        raw_carton.inner_width,
        raw_carton.inner_length,
        raw_carton.inner_depth,
        0,
        raw_carton.inner_width,
        raw_carton.inner_length,
        raw_carton.inner_depth,
        raw_carton.max_weight,
    ));
    let next_items = unsafe { items_from_raw(next_items, next_item_count) };

    LOOKAHEAD_CACHE.with(|cache| {
        let mut factory = OrientatedItemFactory::new(carton);
        let best = factory.best_orientation(
            &item,
            None,
            &next_items,
            width_left,
            length_left,
            depth_left,
            row_length,
            0,
            0,
            0,
            &PackedItemList::new(),
            true,
            cache,
        );
        match best {
            Some(orientation) => {
                unsafe {
                    *out_orientation = FfiOrientatedItem {
                        width: orientation.width,
                        length: orientation.length,
                        depth: orientation.depth,
                        surface_footprint: orientation.surface_footprint,
                    };
                }
                1
            }
            None => 0,
        }
    })
}

#[no_mangle]
pub extern "C" fn carton_packer_clear_lookahead_cache() {
    LOOKAHEAD_CACHE.with(|cache| cache.borrow_mut().clear());
}

#[no_mangle]
pub extern "C" fn carton_packer_lookahead_cache_size() -> usize {
    LOOKAHEAD_CACHE.with(|cache| cache.borrow().len())
}
