//! Human-readable timbre summaries.

use super::{DerivedCoefficients, Material};

/// Describes the configured instrument in one sentence.
///
/// The text is a pure function of the derived coefficients, so the same
/// body always reads the same. UIs surface this verbatim; nothing parses
/// it back.
pub fn describe(material: Material, coeffs: &DerivedCoefficients) -> String {
    let character = match material {
        Material::Wood => "warm and rounded",
        Material::Metal => "bright and clangorous",
        Material::Glass => "pure and ringing",
        Material::Plastic => "dull and boxy",
    };

    let attack = if coeffs.envelope.attack < 0.02 {
        "speaks instantly"
    } else if coeffs.envelope.attack < 0.08 {
        "speaks quickly"
    } else {
        "swells slowly"
    };

    let sustain = if coeffs.envelope.sustain >= 0.75 {
        "holds its tone while a key is down"
    } else if coeffs.envelope.sustain >= 0.35 {
        "settles to a moderate sustain"
    } else {
        "fades away even while held"
    };

    let size = if coeffs.saturation_drive.is_some() {
        "oversized, driving the output into saturation"
    } else if coeffs.volume_factor > 1.0 {
        "big and loud"
    } else if coeffs.volume_factor < 0.5 {
        "small and quiet"
    } else {
        "balanced in size"
    };

    format!("a {material} piano, {character}; it {attack} and {sustain}; the body is {size}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyDimensions;

    #[test]
    fn reference_wood_reads_warm_and_balanced() {
        let coeffs = DerivedCoefficients::derive(BodyDimensions::default(), Material::Wood);
        let text = describe(Material::Wood, &coeffs);
        assert!(text.contains("warm and rounded"), "{text}");
        assert!(text.contains("balanced in size"), "{text}");
        assert!(!text.contains("saturation"), "{text}");
    }

    #[test]
    fn oversized_metal_mentions_saturation() {
        let dims = BodyDimensions::new(400.0, 400.0, 400.0);
        let coeffs = DerivedCoefficients::derive(dims, Material::Metal);
        let text = describe(Material::Metal, &coeffs);
        assert!(text.contains("bright and clangorous"), "{text}");
        assert!(text.contains("saturation"), "{text}");
        assert!(text.contains("swells slowly"), "{text}");
    }

    #[test]
    fn description_is_deterministic() {
        let dims = BodyDimensions::new(80.0, 280.0, 40.0);
        let coeffs = DerivedCoefficients::derive(dims, Material::Glass);
        assert_eq!(
            describe(Material::Glass, &coeffs),
            describe(Material::Glass, &coeffs)
        );
    }
}
