//! The effect kinds a modifier can name and their default configurations.

use crate::modifier::{Config, ConfigValue, Corners};

/// Every effect the library can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    HueSaturation,
    BrightnessContrast,
    Vibrance,
    Denoise,
    Sharpness,
    Noise,
    Sepia,
    Vignette,
    TriangleBlur,
    ZoomBlur,
    TiltShiftBlur,
    LensBlur,
    Swirl,
    BulgePinch,
    Perspective,
    /// Rendered by the library but not offered by `add`.
    Exposure,
}

impl EffectKind {
    /// The kinds `add` can create, in catalog order.
    pub const CATALOG: [EffectKind; 15] = [
        EffectKind::HueSaturation,
        EffectKind::BrightnessContrast,
        EffectKind::Vibrance,
        EffectKind::Denoise,
        EffectKind::Sharpness,
        EffectKind::Noise,
        EffectKind::Sepia,
        EffectKind::Vignette,
        EffectKind::TriangleBlur,
        EffectKind::ZoomBlur,
        EffectKind::TiltShiftBlur,
        EffectKind::LensBlur,
        EffectKind::Swirl,
        EffectKind::BulgePinch,
        EffectKind::Perspective,
    ];

    const ALL: [EffectKind; 16] = [
        EffectKind::HueSaturation,
        EffectKind::BrightnessContrast,
        EffectKind::Vibrance,
        EffectKind::Denoise,
        EffectKind::Sharpness,
        EffectKind::Noise,
        EffectKind::Sepia,
        EffectKind::Vignette,
        EffectKind::TriangleBlur,
        EffectKind::ZoomBlur,
        EffectKind::TiltShiftBlur,
        EffectKind::LensBlur,
        EffectKind::Swirl,
        EffectKind::BulgePinch,
        EffectKind::Perspective,
        EffectKind::Exposure,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            EffectKind::HueSaturation => "Hue/Saturation",
            EffectKind::BrightnessContrast => "Brightness/Contrast",
            EffectKind::Vibrance => "Vibrance",
            EffectKind::Denoise => "Denoise",
            EffectKind::Sharpness => "Sharpness",
            EffectKind::Noise => "Noise",
            EffectKind::Sepia => "Sepia",
            EffectKind::Vignette => "Vignette",
            EffectKind::TriangleBlur => "Triangle Blur",
            EffectKind::ZoomBlur => "Zoom Blur",
            EffectKind::TiltShiftBlur => "Tilt Shift Blur",
            EffectKind::LensBlur => "Lens Blur",
            EffectKind::Swirl => "Swirl",
            EffectKind::BulgePinch => "Bulge/Pinch",
            EffectKind::Perspective => "Perspective",
            EffectKind::Exposure => "Exposure",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.display_name().eq_ignore_ascii_case(name))
    }

    pub fn in_catalog(self) -> bool {
        self != EffectKind::Exposure
    }

    /// A fresh configuration with every key at zero.
    pub fn default_config(self) -> Config {
        let entries: Vec<(&str, ConfigValue)> = match self {
            EffectKind::HueSaturation => vec![("hue", scalar()), ("saturation", scalar())],
            EffectKind::BrightnessContrast => {
                vec![("brightness", scalar()), ("contrast", scalar())]
            }
            EffectKind::Vibrance => vec![("amount", scalar())],
            EffectKind::Denoise => vec![("exponent", scalar())],
            EffectKind::Sharpness => vec![("radius", scalar()), ("strength", scalar())],
            EffectKind::Noise => vec![("amount", scalar())],
            EffectKind::Sepia => vec![("amount", scalar())],
            EffectKind::Vignette => vec![("size", scalar()), ("amount", scalar())],
            EffectKind::TriangleBlur => vec![("radius", scalar())],
            EffectKind::ZoomBlur => vec![("strength", scalar()), ("cursorAt", pair())],
            EffectKind::TiltShiftBlur => vec![
                ("cursorAt", pair()),
                ("angle", scalar()),
                ("blurRadius", scalar()),
                ("gradientRadius", scalar()),
            ],
            EffectKind::LensBlur => vec![
                ("radius", scalar()),
                ("brightness", scalar()),
                ("angle", scalar()),
            ],
            EffectKind::Swirl => vec![
                ("cursorAt", pair()),
                ("angle", scalar()),
                ("radius", scalar()),
            ],
            EffectKind::BulgePinch => vec![
                ("cursorAt", pair()),
                ("strength", scalar()),
                ("radius", scalar()),
            ],
            EffectKind::Perspective => {
                vec![("cursorsAt", ConfigValue::Corners(Corners::default()))]
            }
            EffectKind::Exposure => vec![("amount", scalar())],
        };
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}

fn scalar() -> ConfigValue {
    ConfigValue::Scalar(0.0)
}

fn pair() -> ConfigValue {
    ConfigValue::Pair([0.0, 0.0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(EffectKind::from_name("sepia"), Some(EffectKind::Sepia));
        assert_eq!(
            EffectKind::from_name("TILT SHIFT BLUR"),
            Some(EffectKind::TiltShiftBlur)
        );
        assert_eq!(
            EffectKind::from_name("bulge/pinch"),
            Some(EffectKind::BulgePinch)
        );
        assert_eq!(EffectKind::from_name("Posterize"), None);
    }

    #[test]
    fn catalog_has_fifteen_entries_without_exposure() {
        assert_eq!(EffectKind::CATALOG.len(), 15);
        assert!(!EffectKind::CATALOG.contains(&EffectKind::Exposure));
        assert!(!EffectKind::Exposure.in_catalog());
        assert_eq!(EffectKind::from_name("exposure"), Some(EffectKind::Exposure));
    }

    #[test]
    fn default_keys_match_catalog_order() {
        let keys = |kind: EffectKind| -> Vec<String> {
            kind.default_config().keys().cloned().collect()
        };
        assert_eq!(keys(EffectKind::Vignette), ["size", "amount"]);
        assert_eq!(
            keys(EffectKind::TiltShiftBlur),
            ["cursorAt", "angle", "blurRadius", "gradientRadius"]
        );
        assert_eq!(keys(EffectKind::Perspective), ["cursorsAt"]);
    }

    #[test]
    fn defaults_are_zero() {
        for kind in EffectKind::CATALOG {
            for (key, value) in kind.default_config() {
                let zero = match value {
                    ConfigValue::Scalar(value) => value == 0.0,
                    ConfigValue::Pair(pair) => pair == [0.0, 0.0],
                    ConfigValue::Corners(corners) => corners == Corners::default(),
                };
                assert!(zero, "{} {key} is not zero", kind.display_name());
            }
        }
    }

    #[test]
    fn default_configs_are_independent() {
        let mut first = EffectKind::Sepia.default_config();
        first.insert("amount".into(), ConfigValue::Scalar(1.0));
        assert_eq!(
            EffectKind::Sepia.default_config()["amount"],
            ConfigValue::Scalar(0.0)
        );
    }
}
