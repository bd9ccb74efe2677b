use std::time::Duration;

use carton_packer_core::{Carton, Item, Packer, PackerConfig, PackerError, Rotation};

#[test]
fn zero_budget_times_out_at_the_first_iteration() {
    let config = PackerConfig::builder()
        .timeout(Some(Duration::ZERO))
        .build();
    let mut packer = Packer::with_config(config);
    packer.add_item(Item::new("cube", 10, 10, 10, 100, Rotation::BestFit), 1);
    packer.add_carton(Carton::new("box", 12, 12, 12, 0, 10, 10, 10, 1000));

    match packer.pack() {
        Err(PackerError::Timeout { spent, budget }) => {
            assert_eq!(budget, Duration::ZERO);
            assert!(spent >= budget);
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[test]
fn generous_budget_does_not_interfere() {
    let config = PackerConfig::builder()
        .timeout(Some(Duration::from_secs(3600)))
        .build();
    let mut packer = Packer::with_config(config);
    packer.add_item(Item::new("cube", 10, 10, 10, 100, Rotation::BestFit), 1);
    packer.add_carton(Carton::new("box", 12, 12, 12, 0, 10, 10, 10, 1000));

    let packed = packer.pack().expect("plenty of time");
    assert_eq!(packed.len(), 1);
}
