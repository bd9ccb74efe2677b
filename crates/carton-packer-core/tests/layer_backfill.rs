use carton_packer_core::{Carton, Item, Packer, Rotation};

#[test]
fn row_backfill_uses_the_strip_behind_a_short_item() {
    // The pillar fixes a 20-deep row along y; each cube then leaves a
    // 10x10 strip behind itself (same column, further back) that the
    // back-fill recursion must reclaim.
    let mut packer = Packer::new();
    packer.add_item(Item::new("pillar", 10, 20, 10, 100, Rotation::Never), 1);
    packer.add_item(Item::new("cube", 10, 10, 10, 50, Rotation::BestFit), 2);
    packer.add_carton(Carton::new("box", 22, 22, 12, 0, 20, 20, 10, 1000));

    let mut packed = packer.pack().expect("fits exactly");
    assert_eq!(packed.len(), 1);

    let carton = packed.iter().next().unwrap();
    assert_eq!(carton.volume_utilisation(), 100.0);

    let pillar = carton
        .items
        .iter()
        .find(|i| i.item.description == "pillar")
        .unwrap();
    assert_eq!((pillar.x, pillar.y, pillar.z), (0, 0, 0));

    let mut cube_positions: Vec<(u32, u32, u32)> = carton
        .items
        .iter()
        .filter(|i| i.item.description == "cube")
        .map(|i| (i.x, i.y, i.z))
        .collect();
    cube_positions.sort_unstable();

    // the first cube sits beside the pillar; the second lands in the strip
    // directly behind the first cube, not to its left
    assert_eq!(cube_positions, vec![(10, 0, 0), (10, 10, 0)]);
}
