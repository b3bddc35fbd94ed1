#![no_main]

// Parsing never panics, and anything it accepts prints back to the same name.

use libfuzzer_sys::fuzz_target;
use olp_core::{Permission, PermissionName};

fuzz_target!(|raw: &str| {
    if let Ok(name) = PermissionName::parse(raw) {
        assert_eq!(Permission::new(name.namespace, name.codename).name(), raw);
    }
});
