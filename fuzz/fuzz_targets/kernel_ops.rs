#![no_main]

// Drives the kernel with arbitrary assign/remove sequences and checks that a
// grant on one apple never answers for another, and that reverse queries
// agree with has_perm.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use olp_core::fixtures::*;

#[derive(Arbitrary, Debug)]
enum Op {
    Assign { holder: u8, target: Option<u8> },
    Remove { holder: u8, target: Option<u8> },
    Join { holder: u8, group: u8 },
    RemoveAll { holder: u8 },
}

fuzz_target!(|ops: Vec<Op>| {
    let fx = Fixture::new();
    for op in &ops {
        match *op {
            Op::Assign { holder, target } => {
                let target = target.map(|t| apple(t.into()));
                let _ = fx.kernel.assign(&user(holder.into()), CAN_EAT, target.as_ref());
            }
            Op::Remove { holder, target } => {
                let target = target.map(|t| apple(t.into()));
                let _ = fx.kernel.remove(&user(holder.into()), CAN_EAT, target.as_ref());
            }
            Op::Join { holder, group: g } => fx.join(&user(holder.into()), &group(g.into())),
            Op::RemoveAll { holder } => {
                let _ = fx.kernel.remove_all_permissions(&user(holder.into()));
            }
        }
    }

    for holder in 0..4u64 {
        let principal = active(user(holder));
        let Ok(objects) = fx.kernel.objects_accessible_to(&principal, CAN_EAT, None) else {
            continue;
        };
        for object in &objects {
            assert!(object.is_model(APPLE));
            assert_eq!(fx.kernel.has_perm(&principal, CAN_EAT, Some(object)).ok(), Some(true));
        }
    }
});
