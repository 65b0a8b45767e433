use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use haarindex::signature::{HaarSignature, NUM_CHANNELS, NUM_COEFS, NUM_PIXELS_SQUARED};

/// Average luminance of a colored (non-grayscale) test image.
pub const COLOR_AVGL: [f64; NUM_CHANNELS] = [0.5, 0.05, -0.04];

/// Average luminance of a grayscale test image.
pub const GRAY_AVGL: [f64; NUM_CHANNELS] = [0.5, 0.0, 0.0];

/// Build a signature, panicking on invalid input.
pub fn signature(avgl: [f64; NUM_CHANNELS], coefs: [[i16; NUM_COEFS]; NUM_CHANNELS]) -> HaarSignature {
    HaarSignature::new(avgl, coefs).expect("test signature should be valid")
}

/// Coefficients `start, -(start + 1), start + 2, ...` for every channel.
/// Channels get disjoint ranges so no two slots share a bucket.
pub fn sequential_coefs(start: i16) -> [[i16; NUM_COEFS]; NUM_CHANNELS] {
    let mut coefs = [[0i16; NUM_COEFS]; NUM_CHANNELS];
    for (c, channel) in coefs.iter_mut().enumerate() {
        for (i, coef) in channel.iter_mut().enumerate() {
            let magnitude = start + (c * NUM_COEFS + i) as i16;
            *coef = if i % 2 == 0 { magnitude } else { -magnitude };
        }
    }
    coefs
}

/// A colored signature with sequential coefficients starting at `start`.
pub fn sequential_signature(start: i16) -> HaarSignature {
    signature(COLOR_AVGL, sequential_coefs(start))
}

/// Copy of `sig` where the first `count` coefficients of channel 0 are
/// replaced by fresh values starting at `fresh_start`.
pub fn with_changed_coefs(sig: &HaarSignature, count: usize, fresh_start: i16) -> HaarSignature {
    let mut coefs = [[0i16; NUM_COEFS]; NUM_CHANNELS];
    for (c, channel) in coefs.iter_mut().enumerate() {
        *channel = *sig.coefs(c);
    }
    for (i, coef) in coefs[0].iter_mut().take(count).enumerate() {
        *coef = fresh_start + i as i16;
    }
    signature(*sig.avglf(), coefs)
}

/// Copy of `sig` with a different average luminance.
pub fn with_avgl(sig: &HaarSignature, avgl: [f64; NUM_CHANNELS]) -> HaarSignature {
    let mut coefs = [[0i16; NUM_COEFS]; NUM_CHANNELS];
    for (c, channel) in coefs.iter_mut().enumerate() {
        *channel = *sig.coefs(c);
    }
    signature(avgl, coefs)
}

/// A random colored signature with distinct coefficients per channel.
pub fn random_signature(rng: &mut StdRng) -> HaarSignature {
    let mut coefs = [[0i16; NUM_COEFS]; NUM_CHANNELS];
    for channel in coefs.iter_mut() {
        let positions = sample(rng, NUM_PIXELS_SQUARED - 1, NUM_COEFS);
        for (coef, pos) in channel.iter_mut().zip(positions.iter()) {
            let magnitude = (pos + 1) as i16;
            *coef = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
        }
    }

    let chroma = |rng: &mut StdRng| {
        let v: f64 = rng.gen_range(0.01..0.2);
        if rng.gen_bool(0.5) {
            v
        } else {
            -v
        }
    };
    let avgl = [rng.gen_range(0.1..0.9), chroma(rng), chroma(rng)];
    signature(avgl, coefs)
}

/// `n` random signatures from a fixed seed.
pub fn random_signatures(n: usize, seed: u64) -> Vec<HaarSignature> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| random_signature(&mut rng)).collect()
}
