use carton_packer_core::{Carton, Item, Packer, Rotation};

#[test]
fn single_item_fills_its_carton_exactly() {
    let mut packer = Packer::new();
    packer.add_item(Item::new("cube", 10, 10, 10, 100, Rotation::BestFit), 1);
    packer.add_carton(Carton::new("snug", 12, 12, 12, 10, 10, 10, 10, 1000));

    let mut packed = packer.pack().expect("fits");
    assert_eq!(packed.len(), 1);

    let carton = packed.iter().next().unwrap();
    assert_eq!(carton.volume_utilisation(), 100.0);
    assert_eq!(carton.items.len(), 1);

    let item = carton.items.iter().next().unwrap();
    assert_eq!((item.x, item.y, item.z), (0, 0, 0));
    assert_eq!((item.width, item.length, item.depth), (10, 10, 10));
    assert_eq!(carton.weight(), 110);
    assert!(packer.unpacked_items().is_empty());
}

#[test]
fn empty_input_gives_empty_result() {
    let mut packer = Packer::new();
    packer.add_carton(Carton::new("unused", 12, 12, 12, 10, 10, 10, 10, 1000));

    let packed = packer.pack().expect("nothing to do");
    assert!(packed.is_empty());
}

#[test]
fn zero_volume_items_are_legal() {
    let mut packer = Packer::new();
    packer.add_item(Item::new("voucher", 0, 0, 0, 0, Rotation::BestFit), 2);
    packer.add_carton(Carton::new("box", 12, 12, 12, 10, 10, 10, 10, 1000));

    let mut packed = packer.pack().expect("zero-volume items always fit");
    assert_eq!(packed.len(), 1);
    let carton = packed.iter().next().unwrap();
    assert_eq!(carton.items.len(), 2);
    for item in carton.items.iter() {
        assert_eq!((item.x, item.y, item.z), (0, 0, 0));
    }
}
