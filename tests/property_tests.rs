//! Property-based tests for wifite-setup
//!
//! These tests verify:
//! - Answer matching is case- and whitespace-insensitive, and nothing else passes
//! - Hardware addresses normalize to one canonical form
//! - Binding records survive their on-disk line format
//! - Stage ordering is strictly forward

use proptest::prelude::*;

// =============================================================================
// Confirmation answers
// =============================================================================

use wifite_setup::confirm::AffirmativeSet;

proptest! {
    /// Any casing of the token with surrounding blanks is accepted
    #[test]
    fn affirmative_ignores_case_and_padding(
        upper in any::<bool>(),
        left in "[ \t]{0,3}",
        right in "[ \t\r\n]{0,3}",
    ) {
        let set = AffirmativeSet::default();
        let token = if upper { "S" } else { "s" };
        let answer = format!("{}{}{}", left, token, right);
        prop_assert!(set.accepts(&answer));
    }

    /// Anything that is not the token after trimming is a refusal
    #[test]
    fn other_answers_are_refusals(answer in "[a-zA-Z0-9 ]{0,8}") {
        prop_assume!(answer.trim().to_lowercase() != "s");
        prop_assert!(!AffirmativeSet::default().accepts(&answer));
    }
}

// =============================================================================
// Device identity
// =============================================================================

use wifite_setup::identity::DeviceIdentity;

proptest! {
    /// Six hex octets parse to the upper-case form, whatever the input case
    #[test]
    fn identity_normalizes_to_upper(octets in prop::array::uniform6(any::<u8>()), lower in any::<bool>()) {
        let canonical = octets
            .iter()
            .map(|o| format!("{:02X}", o))
            .collect::<Vec<_>>()
            .join(":");
        let input = if lower { canonical.to_lowercase() } else { canonical.clone() };
        let identity = DeviceIdentity::parse(&input).unwrap();
        prop_assert_eq!(identity.as_str(), canonical.as_str());
    }

    /// Inputs without exactly six octets are never accepted
    #[test]
    fn identity_rejects_wrong_octet_count(count in 1usize..12) {
        prop_assume!(count != 6);
        let input = vec!["ab"; count].join(":");
        prop_assert!(DeviceIdentity::parse(&input).is_err());
    }
}

// =============================================================================
// Binding record
// =============================================================================

use wifite_setup::binding::BindingRecord;

proptest! {
    /// to_line → parse gives back the same record
    #[test]
    fn binding_line_roundtrip(fingerprint in "[0-9a-f]{64}", octets in prop::array::uniform6(any::<u8>())) {
        let address = octets
            .iter()
            .map(|o| format!("{:02x}", o))
            .collect::<Vec<_>>()
            .join(":");
        let device = DeviceIdentity::parse(&address).unwrap();
        let record = BindingRecord::new(fingerprint, &device);
        let parsed = BindingRecord::parse(&record.to_line()).unwrap();
        prop_assert_eq!(parsed, record);
    }

    /// A line without a separator is never a valid record
    #[test]
    fn binding_requires_separator(line in "[^,]{0,40}") {
        prop_assert!(BindingRecord::parse(&line).is_err());
    }
}

// =============================================================================
// Stage ordering
// =============================================================================

use wifite_setup::install_state::InstallStage;

proptest! {
    /// Walking next() from any stage only ever moves forward
    #[test]
    fn next_stage_is_later(index in 0usize..8) {
        let stages = InstallStage::all_stages();
        let stage = stages[index % stages.len()];
        if let Some(next) = stage.next() {
            prop_assert!(next.order() > stage.order());
        } else {
            prop_assert!(stage.is_terminal());
        }
    }
}
