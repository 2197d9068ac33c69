//! Granted-action capability flags

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Capability tokens the current actor holds on one specific record.
    ///
    /// Bulk-action gating unions these flags across a whole selection and
    /// tests membership on the union; it never checks records individually.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GrantedActions: u8 {
        /// Record may be opened in the detail view
        const VIEW = 0b0000_0001;
        /// Record fields may be edited
        const UPDATE = 0b0000_0010;
        /// Record may be deleted
        const DELETE = 0b0000_0100;
        /// Full control, including permission grants
        const MANAGE = 0b0000_1000;
    }
}

impl Default for GrantedActions {
    fn default() -> Self {
        Self::empty()
    }
}

impl GrantedActions {
    /// Build a grant set from host capability tokens. Unknown tokens are
    /// ignored; this engine only gates on the four it knows.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut grants = Self::empty();
        for token in tokens {
            match token.as_ref().trim().to_ascii_lowercase().as_str() {
                "view" | "read" => grants |= Self::VIEW,
                "update" | "edit" => grants |= Self::UPDATE,
                "delete" => grants |= Self::DELETE,
                "manage" | "admin" => grants |= Self::MANAGE,
                _ => {}
            }
        }
        grants
    }

    /// Deletion is allowed by `delete` or by the blanket `manage` grant.
    pub fn allows_delete(&self) -> bool {
        self.intersects(Self::DELETE | Self::MANAGE)
    }

    /// Editing is allowed by `update` or by the blanket `manage` grant.
    pub fn allows_update(&self) -> bool {
        self.intersects(Self::UPDATE | Self::MANAGE)
    }

    /// Permission grants require `manage` specifically.
    pub fn allows_manage(&self) -> bool {
        self.contains(Self::MANAGE)
    }
}

// Manual serde implementation (bitflags 2.x + serde)
impl Serialize for GrantedActions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GrantedActions {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Self::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid GrantedActions bits: {:#04x}", bits))
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_token() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("view".to_string()),
            Just("update".to_string()),
            Just("delete".to_string()),
            Just("manage".to_string()),
            "[a-z]{1,12}",
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: union over a token list is monotone; adding tokens never
        /// removes a capability.
        #[test]
        fn prop_from_tokens_monotone(
            base in prop::collection::vec(arb_token(), 0..6),
            extra in prop::collection::vec(arb_token(), 0..6),
        ) {
            let small = GrantedActions::from_tokens(&base);
            let mut all = base.clone();
            all.extend(extra);
            let big = GrantedActions::from_tokens(&all);
            prop_assert!(big.contains(small));
        }

        /// Property: serde round-trips any valid flag combination.
        #[test]
        fn prop_serde_roundtrip(bits in 0u8..16) {
            let grants = GrantedActions::from_bits(bits).unwrap();
            let json = serde_json::to_string(&grants).unwrap();
            let back: GrantedActions = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, grants);
        }
    }
}
