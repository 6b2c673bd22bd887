use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PropelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PropelError::structure("x")
            .to_string()
            .contains("structure error:")
    );
    assert!(
        PropelError::animation("x")
            .to_string()
            .contains("animation error:")
    );
    assert!(
        PropelError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        PropelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn only_structure_errors_are_structural() {
    assert!(PropelError::structure("missing Transform").is_structural());
    assert!(!PropelError::evaluation("x").is_structural());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PropelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
