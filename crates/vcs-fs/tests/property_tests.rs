use proptest::prelude::*;
use vcs_fs::{NormalizedPath, to_unix_path};

proptest! {
    #[test]
    fn normalized_paths_never_contain_backslashes(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        prop_assert!(!path.as_str().contains('\\'));
    }

    #[test]
    fn unix_path_is_idempotent(s in "\\PC*") {
        let once = to_unix_path(&s);
        prop_assert_eq!(to_unix_path(&once), once.clone());
        prop_assert_eq!(once.len(), s.len());
    }

    #[test]
    fn native_roundtrip_is_stable(s in "[a-zA-Z0-9_./\\\\-]{0,40}") {
        let path = NormalizedPath::new(&s);
        let roundtripped = NormalizedPath::new(path.to_native());
        prop_assert_eq!(path, roundtripped);
    }
}
