use proptest::prelude::*;

use olp_core::{AccessError, Permission, PermissionName};

proptest! {
    /// Well-formed names parse back into their halves.
    #[test]
    fn prop_well_formed_names_parse(ns in "[a-z_]{1,12}", code in "[a-z_]{1,16}") {
        let raw = format!("{ns}.{code}");
        let name = PermissionName::parse(&raw).unwrap();
        prop_assert_eq!(name.namespace, ns.as_str());
        prop_assert_eq!(name.codename, code.as_str());
        prop_assert_eq!(Permission::new(ns.clone(), code.clone()).name(), raw);
    }

    /// Names without a delimiter are rejected as invalid input, never panicking.
    #[test]
    fn prop_names_without_delimiter_are_invalid(raw in "[^.]{0,24}") {
        prop_assert!(matches!(PermissionName::parse(&raw), Err(AccessError::InvalidInput(_))));
    }

    /// Parsing arbitrary input either succeeds with non-empty halves or fails cleanly.
    #[test]
    fn prop_parse_total(raw in any::<String>()) {
        if let Ok(name) = PermissionName::parse(&raw) {
            prop_assert!(!name.namespace.is_empty());
            prop_assert!(!name.codename.is_empty());
            prop_assert!(!name.codename.contains('.'));
        }
    }
}
