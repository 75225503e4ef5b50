use super::*;

// =============================================================================
// env_bool: uses unique env var names to avoid races with parallel tests.
// =============================================================================

#[test]
fn env_bool_true_variants() {
    for (i, val) in ["1", "true", "yes", "on", " TRUE "].iter().enumerate() {
        let key = format!("__TEST_BS_EB_TRUE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(true), "expected true for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_false_variants() {
    for (i, val) in ["0", "false", "no", "off"].iter().enumerate() {
        let key = format!("__TEST_BS_EB_FALSE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(false), "expected false for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_invalid_or_unset_returns_none() {
    let key = "__TEST_BS_EB_INVALID_4411__";
    unsafe { std::env::set_var(key, "maybe") };
    assert_eq!(env_bool(key), None);
    unsafe { std::env::remove_var(key) };
    assert_eq!(env_bool("__TEST_BS_EB_SURELY_UNSET_42__"), None);
}

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_uses_default_when_unset() {
    assert_eq!(env_parse("__TEST_BS_EP_UNSET_77__", 42_u32).unwrap(), 42);
}

#[test]
fn env_parse_reads_trimmed_value() {
    let key = "__TEST_BS_EP_VALUE_78__";
    unsafe { std::env::set_var(key, " 8080 ") };
    assert_eq!(env_parse(key, 0_u16).unwrap(), 8080);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_reports_invalid_value() {
    let key = "__TEST_BS_EP_BAD_79__";
    unsafe { std::env::set_var(key, "lots") };
    let err = env_parse(key, 0_u32).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { value, .. } if value == "lots"));
    unsafe { std::env::remove_var(key) };
}
