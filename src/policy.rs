//! Policy catalog and filename-based policy resolution.
//!
//! A *policy* is a named recipe: an ascending list of target widths plus
//! encode options. The catalog is process-wide configuration, built once
//! at startup and passed explicitly into the encoder and batch runner —
//! never reached for as ambient global state, so tests can substitute
//! their own width tables.
//!
//! ## Resolution
//!
//! [`PolicyCatalog::resolve`] is a pure, total function over all identity
//! strings. An explicit policy from the caller always wins; otherwise the
//! lowercased identity is tested against a fixed, ordered predicate chain
//! (`_hero` → HERO, `_card` → CARD, `_icon`/`icon_` → ICON,
//! `_logo`/`logo_` → LOGO, `_general` → GENERAL). The order matters:
//! an identity containing both `_hero` and `_logo` resolves to HERO
//! because HERO is tested first, not because of any specificity rule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the five built-in policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyName {
    Hero,
    Card,
    General,
    Icon,
    Logo,
}

/// Policy applied when no override is given and no filename hint matches.
pub const DEFAULT_POLICY: PolicyName = PolicyName::General;

impl PolicyName {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyName::Hero => "HERO",
            PolicyName::Card => "CARD",
            PolicyName::General => "GENERAL",
            PolicyName::Icon => "ICON",
            PolicyName::Logo => "LOGO",
        }
    }

    /// Name of the per-policy output subdirectory.
    pub fn dir_name(self) -> &'static str {
        match self {
            PolicyName::Hero => "hero",
            PolicyName::Card => "card",
            PolicyName::General => "general",
            PolicyName::Icon => "icon",
            PolicyName::Logo => "logo",
        }
    }

    /// Case-insensitive parse of a policy name, e.g. from a CLI flag.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "HERO" => Some(PolicyName::Hero),
            "CARD" => Some(PolicyName::Card),
            "GENERAL" => Some(PolicyName::General),
            "ICON" => Some(PolicyName::Icon),
            "LOGO" => Some(PolicyName::Logo),
            _ => None,
        }
    }
}

impl fmt::Display for PolicyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a policy's per-width output is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// One still image (AVIF) per width.
    SingleImage,
    /// One self-contained icon container (ICO) per width, source
    /// letterboxed onto a square transparent canvas.
    MultiResIconBundle,
}

impl OutputKind {
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::SingleImage => "avif",
            OutputKind::MultiResIconBundle => "ico",
        }
    }
}

/// Encode parameters shared by all widths of a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Lossy quality, 0–100.
    pub quality: u32,
    /// Encoder effort, 0–9. `None` falls back to the pipeline default (4).
    pub effort: Option<u32>,
}

/// A named recipe of target widths and encode parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub name: PolicyName,
    /// Target widths, strictly ascending, no duplicates.
    pub widths: Vec<u32>,
    pub encode: EncodeOptions,
    pub output_kind: OutputKind,
}

impl Policy {
    pub fn new(
        name: PolicyName,
        widths: Vec<u32>,
        encode: EncodeOptions,
        output_kind: OutputKind,
    ) -> Self {
        debug_assert!(
            widths.windows(2).all(|w| w[0] < w[1]),
            "policy widths must be strictly ascending"
        );
        Self {
            name,
            widths,
            encode,
            output_kind,
        }
    }
}

/// Static registry of the five policies. Immutable after construction.
#[derive(Debug, Clone)]
pub struct PolicyCatalog {
    pub hero: Policy,
    pub card: Policy,
    pub general: Policy,
    pub icon: Policy,
    pub logo: Policy,
}

impl PolicyCatalog {
    /// The stock policy table.
    pub fn standard() -> Self {
        let q50 = EncodeOptions {
            quality: 50,
            effort: None,
        };
        Self {
            hero: Policy::new(
                PolicyName::Hero,
                vec![400, 720, 800, 1200, 1440],
                EncodeOptions {
                    quality: 50,
                    effort: Some(4),
                },
                OutputKind::SingleImage,
            ),
            card: Policy::new(
                PolicyName::Card,
                vec![320, 480, 640, 960],
                q50,
                OutputKind::SingleImage,
            ),
            general: Policy::new(
                PolicyName::General,
                vec![320, 640, 960, 1200],
                q50,
                OutputKind::SingleImage,
            ),
            // Quality is carried for consistency; the icon container
            // embeds lossless PNG data and ignores it.
            icon: Policy::new(
                PolicyName::Icon,
                vec![16, 32, 48, 64, 128],
                EncodeOptions {
                    quality: 100,
                    effort: None,
                },
                OutputKind::MultiResIconBundle,
            ),
            logo: Policy::new(
                PolicyName::Logo,
                vec![128, 192, 256, 384, 512],
                q50,
                OutputKind::SingleImage,
            ),
        }
    }

    pub fn get(&self, name: PolicyName) -> &Policy {
        match name {
            PolicyName::Hero => &self.hero,
            PolicyName::Card => &self.card,
            PolicyName::General => &self.general,
            PolicyName::Icon => &self.icon,
            PolicyName::Logo => &self.logo,
        }
    }

    /// Select exactly one policy for an input identity.
    ///
    /// Priority: explicit policy > suffix/embedded-segment hints (in the
    /// documented order) > prefix hints for icon/logo > DEFAULT_POLICY.
    /// Total over all strings; no error is possible.
    pub fn resolve(&self, identity: &str, explicit: Option<PolicyName>) -> PolicyName {
        if let Some(name) = explicit {
            return name;
        }
        let n = identity.to_lowercase();
        if n.ends_with("_hero") || n.contains("_hero_") {
            PolicyName::Hero
        } else if n.ends_with("_card") || n.contains("_card_") {
            PolicyName::Card
        } else if n.ends_with("_icon") || n.contains("_icon_") || n.starts_with("icon_") {
            PolicyName::Icon
        } else if n.ends_with("_logo") || n.contains("_logo_") || n.starts_with("logo_") {
            PolicyName::Logo
        } else {
            DEFAULT_POLICY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(identity: &str) -> PolicyName {
        PolicyCatalog::standard().resolve(identity, None)
    }

    #[test]
    fn suffix_hints_select_their_policy() {
        assert_eq!(resolve("banner_hero"), PolicyName::Hero);
        assert_eq!(resolve("product_card"), PolicyName::Card);
        assert_eq!(resolve("brand_logo"), PolicyName::Logo);
        assert_eq!(resolve("app_icon"), PolicyName::Icon);
        assert_eq!(resolve("photo_general"), PolicyName::General);
    }

    #[test]
    fn embedded_segment_hints_match() {
        assert_eq!(resolve("x_hero_variant"), PolicyName::Hero);
        assert_eq!(resolve("x_card_02"), PolicyName::Card);
        assert_eq!(resolve("x_icon_dark"), PolicyName::Icon);
        assert_eq!(resolve("x_logo_dark"), PolicyName::Logo);
    }

    #[test]
    fn prefix_hints_only_for_icon_and_logo() {
        assert_eq!(resolve("icon_settings"), PolicyName::Icon);
        assert_eq!(resolve("logo_acme"), PolicyName::Logo);
        // No prefix rule for hero/card.
        assert_eq!(resolve("hero_banner"), PolicyName::General);
        assert_eq!(resolve("card_product"), PolicyName::General);
    }

    #[test]
    fn unknown_identities_default_to_general() {
        assert_eq!(resolve("photo"), PolicyName::General);
        assert_eq!(resolve(""), PolicyName::General);
        assert_eq!(resolve("heroic_tale"), PolicyName::General);
    }

    #[test]
    fn resolution_is_case_insensitive() {
        assert_eq!(resolve("Banner_HERO"), PolicyName::Hero);
        assert_eq!(resolve("ICON_app"), PolicyName::Icon);
    }

    #[test]
    fn overlapping_hints_resolve_by_chain_order() {
        // Contains both _hero_ and _logo: HERO is tested first.
        assert_eq!(resolve("x_hero_logo"), PolicyName::Hero);
        // Contains _card and icon_ prefix: CARD is tested before ICON.
        assert_eq!(resolve("icon_set_card"), PolicyName::Card);
    }

    #[test]
    fn explicit_policy_bypasses_inference() {
        let catalog = PolicyCatalog::standard();
        assert_eq!(
            catalog.resolve("banner_hero", Some(PolicyName::Icon)),
            PolicyName::Icon
        );
    }

    #[test]
    fn standard_widths_are_ascending() {
        let catalog = PolicyCatalog::standard();
        for name in [
            PolicyName::Hero,
            PolicyName::Card,
            PolicyName::General,
            PolicyName::Icon,
            PolicyName::Logo,
        ] {
            let widths = &catalog.get(name).widths;
            assert!(widths.windows(2).all(|w| w[0] < w[1]), "{name} not sorted");
        }
    }

    #[test]
    fn standard_table_matches_expected_values() {
        let catalog = PolicyCatalog::standard();
        assert_eq!(catalog.hero.widths, vec![400, 720, 800, 1200, 1440]);
        assert_eq!(catalog.card.widths, vec![320, 480, 640, 960]);
        assert_eq!(catalog.general.widths, vec![320, 640, 960, 1200]);
        assert_eq!(catalog.icon.widths, vec![16, 32, 48, 64, 128]);
        assert_eq!(catalog.logo.widths, vec![128, 192, 256, 384, 512]);
        assert_eq!(catalog.hero.encode.effort, Some(4));
        assert_eq!(catalog.icon.encode.quality, 100);
        assert_eq!(catalog.icon.output_kind, OutputKind::MultiResIconBundle);
    }

    #[test]
    fn policy_name_parse_round_trips() {
        for name in ["hero", "CARD", "General", "ICON", "logo"] {
            let parsed = PolicyName::parse(name).unwrap();
            assert!(parsed.as_str().eq_ignore_ascii_case(name));
        }
        assert_eq!(PolicyName::parse("thumbnail"), None);
    }
}
