use proptest::prelude::*;
use std::collections::BTreeSet;

use olp_core::fixtures::*;
use olp_core::EntityRef;

#[derive(Debug, Clone)]
enum Op {
    Assign { holder: u64, perm: usize, target: Option<u64> },
    Remove { holder: u64, perm: usize, target: Option<u64> },
    RemoveAll { holder: u64 },
}

const PERMS: [&str; 2] = [CAN_EAT, CAN_BE_AWESOME];

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3u64, 0..2usize, proptest::option::of(0..4u64))
            .prop_map(|(holder, perm, target)| Op::Assign { holder, perm, target }),
        (0..3u64, 0..2usize, proptest::option::of(0..4u64))
            .prop_map(|(holder, perm, target)| Op::Remove { holder, perm, target }),
        (0..3u64).prop_map(|holder| Op::RemoveAll { holder }),
    ]
}

type Triple = (u64, usize, Option<u64>);

proptest! {
    /// The kernel agrees with a plain set model of (holder, permission, target).
    #[test]
    fn prop_kernel_matches_set_model(ops in proptest::collection::vec(op(), 0..40)) {
        let fx = Fixture::new();
        let mut model: BTreeSet<Triple> = BTreeSet::new();
        let target = |t: Option<u64>| t.map(apple);

        for op in &ops {
            match *op {
                Op::Assign { holder, perm, target: t } => {
                    prop_assert!(fx.kernel.assign(&user(holder), PERMS[perm], target(t).as_ref()).unwrap());
                    model.insert((holder, perm, t));
                }
                Op::Remove { holder, perm, target: t } => {
                    prop_assert!(fx.kernel.remove(&user(holder), PERMS[perm], target(t).as_ref()).unwrap());
                    model.remove(&(holder, perm, t));
                }
                Op::RemoveAll { holder } => {
                    fx.kernel.remove_all_permissions(&user(holder)).unwrap();
                    model.retain(|(h, _, _)| *h != holder);
                }
            }
        }

        for holder in 0..3u64 {
            let principal = active(user(holder));
            for (perm, name) in PERMS.iter().enumerate() {
                for t in [None, Some(0), Some(1), Some(2), Some(3)] {
                    let expected = model.contains(&(holder, perm, t));
                    prop_assert_eq!(fx.kernel.has_perm(&principal, *name, target(t).as_ref()).unwrap(), expected);
                }
                let expected: BTreeSet<EntityRef> = model
                    .iter()
                    .filter(|(h, p, t)| *h == holder && *p == perm && t.is_some())
                    .filter_map(|(_, _, t)| target(*t))
                    .collect();
                prop_assert_eq!(fx.kernel.objects_accessible_to(&principal, *name, None).unwrap(), expected);
            }
        }
    }

    /// A grant on one object never leaks onto a different object id or model.
    #[test]
    fn prop_object_grants_do_not_leak(granted in 0..50u64, probe in 0..50u64) {
        let fx = Fixture::new();
        fx.kernel.assign(&user(1), CAN_EAT, Some(&apple(granted))).unwrap();
        let principal = active(user(1));

        prop_assert_eq!(fx.kernel.has_perm(&principal, CAN_EAT, Some(&apple(probe))).unwrap(), granted == probe);
        prop_assert!(!fx.kernel.has_perm(&principal, CAN_EAT, Some(&orange(granted))).unwrap());
    }
}
