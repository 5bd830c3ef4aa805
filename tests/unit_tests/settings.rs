use mortar::error::MortarError;
use mortar::settings::{
    FailureAction, InterfaceVariant, MortarSettings, ProjectionFailurePolicy, TangentPolicy,
};
use std::collections::BTreeSet;

#[test]
fn defaults_describe_dual_basis_tying() {
    let settings = MortarSettings::default();
    assert_eq!(settings.variant, InterfaceVariant::Tie);
    assert!(settings.dual_basis);
    assert!(!settings.rotate_normals);
    assert!(!settings.adjust);
    assert_eq!(settings.gap_sign, -1.0);
    assert_eq!(settings.tangent_policy, TangentPolicy::Midpoint);
    assert!(settings.always_inactive.is_empty());
    assert!(settings.validate().is_ok());
}

#[test]
fn failure_policy_depends_on_variant() {
    let tie = MortarSettings::tie().failure_policy();
    assert_eq!(tie.segmentation, FailureAction::Abort);
    assert_eq!(tie.integration, FailureAction::Abort);

    let contact = MortarSettings::contact().failure_policy();
    assert_eq!(contact.segmentation, FailureAction::SkipPair);
    assert_eq!(contact.integration, FailureAction::Abort);

    let explicit = ProjectionFailurePolicy {
        segmentation: FailureAction::SkipPair,
        integration: FailureAction::SkipPair,
    };
    let settings = MortarSettings {
        projection_failures: Some(explicit),
        ..MortarSettings::tie()
    };
    assert_eq!(settings.failure_policy(), explicit);
}

#[test]
fn settings_load_from_partial_json() {
    let json = r#"{
        "variant": "Contact",
        "gap_sign": 1.0,
        "always_inactive": [3, 7],
        "maximum_distance": 0.5,
        "projection_failures": { "segmentation": "Abort", "integration": "SkipPair" }
    }"#;
    let settings: MortarSettings = serde_json::from_str(json).unwrap();

    assert_eq!(settings.variant, InterfaceVariant::Contact);
    assert_eq!(settings.gap_sign, 1.0);
    assert_eq!(settings.always_inactive, BTreeSet::from([3, 7]));
    assert_eq!(settings.maximum_distance, Some(0.5));
    assert_eq!(settings.failure_policy().integration, FailureAction::SkipPair);
    // Unspecified fields keep their defaults
    assert!(settings.dual_basis);
    assert_eq!(settings.quadrature_order, None);
}

#[test]
fn invalid_settings_are_rejected() {
    let bad_sign = MortarSettings {
        gap_sign: 0.5,
        ..MortarSettings::default()
    };
    assert!(matches!(bad_sign.validate(), Err(MortarError::Configuration(_))));

    let bad_distance = MortarSettings {
        maximum_distance: Some(-1.0),
        ..MortarSettings::default()
    };
    assert!(matches!(bad_distance.validate(), Err(MortarError::Configuration(_))));

    let bad_order = MortarSettings {
        quadrature_order: Some(0),
        ..MortarSettings::default()
    };
    assert!(matches!(bad_order.validate(), Err(MortarError::Configuration(_))));
}
