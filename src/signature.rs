//! Haar wavelet image signatures.
//!
//! A signature holds, per YIQ color channel, the positions of the
//! `NUM_COEFS` largest-magnitude Haar coefficients of a 128x128 normalized
//! image (negative when the coefficient was negative), plus the average
//! luminance of each channel. Computing signatures from pixels happens
//! elsewhere; this module only validates, encodes and decodes them.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{HaarIndexError, Result};

/// Side length of the normalized image the transform runs on.
pub const NUM_PIXELS: usize = 128;

/// Number of coefficient positions; every coefficient magnitude is below this.
pub const NUM_PIXELS_SQUARED: usize = NUM_PIXELS * NUM_PIXELS;

/// Coefficients kept per color channel.
pub const NUM_COEFS: usize = 40;

/// Color channels stored in every signature (Y, I, Q).
pub const NUM_CHANNELS: usize = 3;

/// Encoded blob length: luminance as f64, then coefficients as i16.
pub const SIGNATURE_BYTES: usize = NUM_CHANNELS * 8 + NUM_CHANNELS * NUM_COEFS * 2;

/// Chroma luminance below this total marks a grayscale image.
const GRAYSCALE_THRESHOLD: f64 = 6.0 / 1000.0;

/// A validated Haar signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SignatureRepr", into = "SignatureRepr")]
pub struct HaarSignature {
    avglf: [f64; NUM_CHANNELS],
    coefs: [[i16; NUM_COEFS]; NUM_CHANNELS],
}

impl HaarSignature {
    /// Build a signature, rejecting luminance that is non-finite or outside
    /// the `f32` range the index scores in, and coefficients outside the
    /// 128x128 position range.
    pub fn new(
        avglf: [f64; NUM_CHANNELS],
        coefs: [[i16; NUM_COEFS]; NUM_CHANNELS],
    ) -> Result<Self> {
        if let Some(v) = avglf.iter().find(|v| !v.is_finite()) {
            return Err(HaarIndexError::InvalidSignature(format!(
                "average luminance must be finite, got {v}"
            )));
        }
        if let Some(v) = avglf.iter().find(|v| v.abs() > f32::MAX as f64) {
            return Err(HaarIndexError::InvalidSignature(format!(
                "average luminance {v} exceeds the f32 range"
            )));
        }
        for (c, channel) in coefs.iter().enumerate() {
            if let Some(coef) = channel
                .iter()
                .find(|coef| coef.unsigned_abs() as usize >= NUM_PIXELS_SQUARED)
            {
                return Err(HaarIndexError::InvalidSignature(format!(
                    "coefficient {coef} in channel {c} is out of range"
                )));
            }
        }
        Ok(Self { avglf, coefs })
    }

    /// Average luminance per channel.
    pub fn avglf(&self) -> &[f64; NUM_CHANNELS] {
        &self.avglf
    }

    /// Coefficients of one channel.
    pub fn coefs(&self, color: usize) -> &[i16; NUM_COEFS] {
        &self.coefs[color]
    }

    pub fn is_grayscale(&self) -> bool {
        self.avglf[1].abs() + self.avglf[2].abs() < GRAYSCALE_THRESHOLD
    }

    /// Channels that take part in indexing and scoring.
    pub fn num_colors(&self) -> usize {
        if self.is_grayscale() {
            1
        } else {
            NUM_CHANNELS
        }
    }

    /// Every `(color, coefficient)` pair of the active channels, in slot order.
    pub fn each_coef(&self) -> impl Iterator<Item = (usize, i16)> + '_ {
        self.coefs[..self.num_colors()]
            .iter()
            .enumerate()
            .flat_map(|(c, channel)| channel.iter().map(move |&coef| (c, coef)))
    }

    /// Decode a signature blob.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != SIGNATURE_BYTES {
            return Err(HaarIndexError::InvalidSignature(format!(
                "expected {SIGNATURE_BYTES} bytes, got {}",
                data.len()
            )));
        }

        let mut buf = data;
        let mut avglf = [0.0; NUM_CHANNELS];
        for v in avglf.iter_mut() {
            *v = buf.get_f64_le();
        }
        let mut coefs = [[0i16; NUM_COEFS]; NUM_CHANNELS];
        for channel in coefs.iter_mut() {
            for coef in channel.iter_mut() {
                *coef = buf.get_i16_le();
            }
        }
        Self::new(avglf, coefs)
    }

    /// Encode this signature as a blob accepted by [`HaarSignature::from_bytes`].
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(SIGNATURE_BYTES);
        for v in &self.avglf {
            buf.put_f64_le(*v);
        }
        for channel in &self.coefs {
            for coef in channel {
                buf.put_i16_le(*coef);
            }
        }
        buf.freeze()
    }
}

/// Serde form: fixed arrays longer than 32 have no derived impls.
#[derive(Serialize, Deserialize)]
struct SignatureRepr {
    avglf: [f64; NUM_CHANNELS],
    coefs: Vec<Vec<i16>>,
}

impl TryFrom<SignatureRepr> for HaarSignature {
    type Error = HaarIndexError;

    fn try_from(repr: SignatureRepr) -> Result<Self> {
        if repr.coefs.len() != NUM_CHANNELS {
            return Err(HaarIndexError::InvalidSignature(format!(
                "expected {NUM_CHANNELS} channels, got {}",
                repr.coefs.len()
            )));
        }
        let mut coefs = [[0i16; NUM_COEFS]; NUM_CHANNELS];
        for (dst, src) in coefs.iter_mut().zip(repr.coefs) {
            *dst = src.try_into().map_err(|v: Vec<i16>| {
                HaarIndexError::InvalidSignature(format!(
                    "expected {NUM_COEFS} coefficients, got {}",
                    v.len()
                ))
            })?;
        }
        HaarSignature::new(repr.avglf, coefs)
    }
}

impl From<HaarSignature> for SignatureRepr {
    fn from(sig: HaarSignature) -> Self {
        Self {
            avglf: sig.avglf,
            coefs: sig.coefs.iter().map(|c| c.to_vec()).collect(),
        }
    }
}
