mod common;

use testca_harness::loader::{CustomActionLibrary, LoaderError, SessionHandle};

#[test]
fn load_resolve_and_call_do_nothing_with_null_handle() {
    let lib = CustomActionLibrary::load(common::fixture_path()).expect("load fixture");
    let code = lib
        .invoke("DoNothing", SessionHandle::NULL)
        .expect("invoke DoNothing");
    assert_eq!(code, 0);
}

#[test]
fn do_nothing_accepts_any_handle_value() {
    let lib = CustomActionLibrary::load(common::fixture_path()).expect("load fixture");
    for raw in [1usize, 0x1234, 0xDEAD_BEEF, usize::MAX] {
        let code = lib
            .invoke("DoNothing", SessionHandle(raw))
            .expect("invoke DoNothing");
        assert_eq!(code, 0, "handle {raw:#x}");
    }
}

#[test]
fn repeated_calls_and_reloads_are_identical() {
    let path = common::fixture_path();
    for _ in 0..10 {
        let lib = CustomActionLibrary::load(path).expect("load fixture");
        let entry = lib.entry_point("DoNothing").expect("resolve DoNothing");
        for _ in 0..10 {
            // SAFETY: DoNothing 的签名与 EntryPoint 一致，且不解引用句柄。
            let code = unsafe { entry(std::ptr::null_mut()) };
            assert_eq!(code, 0);
        }
    }
}

#[test]
fn missing_export_is_reported_by_name() {
    let lib = CustomActionLibrary::load(common::fixture_path()).expect("load fixture");
    let err = lib
        .invoke("DoSomething", SessionHandle::NULL)
        .expect_err("DoSomething is not exported");
    assert!(matches!(err, LoaderError::MissingEntryPoint { .. }));
    assert!(err.to_string().contains("DoSomething"), "{err}");
}

#[test]
fn empty_or_nul_entry_names_are_rejected() {
    let lib = CustomActionLibrary::load(common::fixture_path()).expect("load fixture");
    for name in ["", "Do\0Nothing"] {
        let err = lib
            .invoke(name, SessionHandle::NULL)
            .expect_err("invalid entry name");
        assert!(matches!(err, LoaderError::InvalidEntryPoint(_)));
    }
}
