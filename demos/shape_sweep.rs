/// Sweeps the body editor's ranges one axis at a time and prints the
/// synthesis coefficients each shape derives. Pure math, no audio.

use corpus_synth::body::{describe, BodyDimensions, DerivedCoefficients, Material};

fn main() {
    println!("=== Materials at the reference body (150 x 140 x 100 cm) ===\n");
    for material in Material::ALL {
        let coeffs = DerivedCoefficients::derive(BodyDimensions::default(), material);
        println!("{}:", material);
        for partial in &coeffs.partials {
            println!(
                "  partial {:>8} at {:.2}x, gain {:.2}",
                format!("{:?}", partial.waveform),
                partial.ratio,
                partial.gain
            );
        }
        println!(
            "  filter  {:?} {:.0} Hz, Q {:.2}, makeup {:.2}\n",
            coeffs.filter.kind, coeffs.filter.cutoff_hz, coeffs.filter.q, coeffs.filter.gain
        );
    }

    println!("=== Height drives envelope speed (wood, 150 x 140 x H) ===\n");
    println!("{:>8}  {:>10}  {:>10}", "H (cm)", "attack (s)", "decay (s)");
    for height in [30.0, 100.0, 200.0, 300.0, 400.0] {
        let dims = BodyDimensions::new(150.0, 140.0, height);
        let env = DerivedCoefficients::derive(dims, Material::Wood).envelope;
        println!("{:>8.0}  {:>10.3}  {:>10.3}", height, env.attack, env.decay);
    }

    println!("\n=== Width drives sustain (wood, 150 x W x 100) ===\n");
    println!("{:>8}  {:>8}", "W (cm)", "sustain");
    for width in [30.0, 100.0, 200.0, 300.0, 400.0] {
        let dims = BodyDimensions::new(150.0, width, 100.0);
        let env = DerivedCoefficients::derive(dims, Material::Wood).envelope;
        println!("{:>8.0}  {:>8.2}", width, env.sustain);
    }

    println!("\n=== Length drives release and filter tracking (L x 140 x 100) ===\n");
    println!(
        "{:>8}  {:>11}  {:>14}  {:>13}",
        "L (cm)", "release (s)", "wood cutoff", "metal cutoff"
    );
    for length in [30.0, 150.0, 250.0, 350.0, 400.0] {
        let dims = BodyDimensions::new(length, 140.0, 100.0);
        let wood = DerivedCoefficients::derive(dims, Material::Wood);
        let metal = DerivedCoefficients::derive(dims, Material::Metal);
        println!(
            "{:>8.0}  {:>11.3}  {:>11.0} Hz  {:>10.0} Hz",
            length, wood.envelope.release, wood.filter.cutoff_hz, metal.filter.cutoff_hz
        );
    }

    println!("\n=== Volume drives gain, then saturation (cubes) ===\n");
    println!(
        "{:>8}  {:>8}  {:>8}  {:>6}",
        "side", "vol fac", "gain", "drive"
    );
    for side in [30.0, 100.0, 146.0, 150.0, 200.0, 300.0, 400.0] {
        let dims = BodyDimensions::new(side, side, side);
        let coeffs = DerivedCoefficients::derive(dims, Material::Wood);
        let drive = match coeffs.saturation_drive {
            Some(d) => format!("{:.2}", d),
            None => "-".to_string(),
        };
        println!(
            "{:>8.0}  {:>8.3}  {:>8.3}  {:>6}",
            side, coeffs.volume_factor, coeffs.master_gain, drive
        );
    }

    println!("\n=== Four bodies, described ===\n");
    let gallery = [
        ("practice box", BodyDimensions::new(60.0, 50.0, 40.0), Material::Plastic),
        ("parlor upright", BodyDimensions::default(), Material::Wood),
        ("vitrine", BodyDimensions::new(120.0, 320.0, 180.0), Material::Glass),
        ("foundry slab", BodyDimensions::new(400.0, 400.0, 400.0), Material::Metal),
    ];
    for (name, dims, material) in gallery {
        let coeffs = DerivedCoefficients::derive(dims, material);
        println!("{:>14}: {}", name, describe(material, &coeffs));
    }
}
