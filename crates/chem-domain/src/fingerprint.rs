//! Fingerprints binarios y similitud de Tanimoto.
//!
//! El motor entrega cada fingerprint como cadena de `0`/`1`; aquí se empaqueta
//! en palabras de 64 bits junto con su tipo. La similitud es
//! intersección / unión sobre posiciones de bit, con unión vacía = 0.
use std::fmt;

use chemengine::FingerprintKind;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::SimilarityError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PackedFingerprint")]
pub struct Fingerprint {
    kind: FingerprintKind,
    n_bits: usize,
    words: Vec<u64>,
}

/// Forma serializada sin validar; `Fingerprint` solo se acepta si las palabras
/// cubren exactamente `n_bits` y no hay bits activos más allá.
#[derive(Deserialize)]
struct PackedFingerprint {
    kind: FingerprintKind,
    n_bits: usize,
    words: Vec<u64>,
}

impl TryFrom<PackedFingerprint> for Fingerprint {
    type Error = SimilarityError;

    fn try_from(packed: PackedFingerprint) -> Result<Self, Self::Error> {
        let PackedFingerprint { kind, n_bits, words } = packed;
        if words.len() != n_bits.div_ceil(64) {
            return Err(SimilarityError::MalformedWords { n_bits, words: words.len() });
        }
        let tail = n_bits % 64;
        if let (Some(last), true) = (words.last(), tail != 0) {
            if last >> tail != 0 {
                return Err(SimilarityError::BitOutOfRange { n_bits });
            }
        }
        Ok(Self { kind, n_bits, words })
    }
}

impl Fingerprint {
    /// Construye el fingerprint desde la cadena binaria del motor.
    pub fn from_bit_string(kind: FingerprintKind, bits: &str) -> Result<Self, SimilarityError> {
        let mut words = vec![0u64; bits.len().div_ceil(64)];
        for (position, c) in bits.chars().enumerate() {
            match c {
                '1' => words[position / 64] |= 1u64 << (position % 64),
                '0' => {}
                found => return Err(SimilarityError::InvalidBit { position, found }),
            }
        }
        Ok(Self { kind, n_bits: bits.len(), words })
    }

    pub fn kind(&self) -> &FingerprintKind {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.n_bits
    }

    pub fn is_empty(&self) -> bool {
        self.n_bits == 0
    }

    pub fn get(&self, position: usize) -> Option<bool> {
        (position < self.n_bits).then(|| (self.words[position / 64] >> (position % 64)) & 1 == 1)
    }

    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn to_bit_string(&self) -> String {
        (0..self.n_bits).map(|i| if self.get(i) == Some(true) { '1' } else { '0' }).collect()
    }

    /// SHA-256 (hex) del tipo y los bits; identifica el fingerprint en eventos.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.kind.to_string().as_bytes());
        hasher.update((self.n_bits as u64).to_le_bytes());
        for word in &self.words {
            hasher.update(word.to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}/{} bits]", self.kind, self.count_ones(), self.n_bits)
    }
}

/// Coeficiente de Tanimoto (Jaccard) entre dos fingerprints del mismo tipo y
/// longitud. Dos fingerprints sin ningún bit activo dan exactamente `0.0`.
pub fn tanimoto(a: &Fingerprint, b: &Fingerprint) -> Result<f64, SimilarityError> {
    if a.kind != b.kind {
        return Err(SimilarityError::KindMismatch { left: a.kind, right: b.kind });
    }
    if a.n_bits != b.n_bits {
        return Err(SimilarityError::LengthMismatch { left: a.n_bits, right: b.n_bits });
    }
    let (intersection, union) = a.words
                                 .iter()
                                 .zip(&b.words)
                                 .fold((0u32, 0u32), |(i, u), (x, y)| (i + (x & y).count_ones(), u + (x | y).count_ones()));
    Ok(ratio(intersection, union))
}

/// Igual que `tanimoto` pero directamente sobre cadenas `0`/`1`.
pub fn tanimoto_bits(a: &str, b: &str) -> Result<f64, SimilarityError> {
    let (left, right) = (a.chars().count(), b.chars().count());
    if left != right {
        return Err(SimilarityError::LengthMismatch { left, right });
    }
    let mut intersection = 0u32;
    let mut union = 0u32;
    for (position, (x, y)) in a.chars().zip(b.chars()).enumerate() {
        let x = bit(position, x)?;
        let y = bit(position, y)?;
        if x || y {
            union += 1;
        }
        if x && y {
            intersection += 1;
        }
    }
    Ok(ratio(intersection, union))
}

fn bit(position: usize, c: char) -> Result<bool, SimilarityError> {
    match c {
        '0' => Ok(false),
        '1' => Ok(true),
        found => Err(SimilarityError::InvalidBit { position, found }),
    }
}

fn ratio(intersection: u32, union: u32) -> f64 {
    if union == 0 {
        0.0
    } else {
        f64::from(intersection) / f64::from(union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(bits: &str) -> Fingerprint {
        Fingerprint::from_bit_string(FingerprintKind::morgan(), bits).unwrap()
    }

    #[test]
    fn test_basic_ratio() {
        // intersección 1 (pos 0), unión 3 (pos 0, 1, 2)
        assert!((tanimoto(&fp("1100"), &fp("1010")).unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(tanimoto_bits("1100", "1010").unwrap(), tanimoto(&fp("1100"), &fp("1010")).unwrap());
    }

    #[test]
    fn test_zero_union_is_zero() {
        assert_eq!(tanimoto(&fp("0000"), &fp("0000")).unwrap(), 0.0);
        assert_eq!(tanimoto_bits("", "").unwrap(), 0.0);
    }

    #[test]
    fn test_disjoint_is_zero_identical_is_one() {
        assert_eq!(tanimoto(&fp("1010"), &fp("0101")).unwrap(), 0.0);
        assert_eq!(tanimoto(&fp("0110"), &fp("0110")).unwrap(), 1.0);
    }

    #[test]
    fn test_length_mismatch_is_reported() {
        assert_eq!(tanimoto(&fp("1010"), &fp("10100")),
                   Err(SimilarityError::LengthMismatch { left: 4, right: 5 }));
        assert_eq!(tanimoto_bits("11", "1"), Err(SimilarityError::LengthMismatch { left: 2, right: 1 }));
    }

    #[test]
    fn test_kind_mismatch_is_reported() {
        let a = fp("1010");
        let b = Fingerprint::from_bit_string(FingerprintKind::Pattern, "1010").unwrap();
        assert!(matches!(tanimoto(&a, &b), Err(SimilarityError::KindMismatch { .. })));
    }

    #[test]
    fn test_invalid_bits() {
        assert_eq!(Fingerprint::from_bit_string(FingerprintKind::Pattern, "10x1").unwrap_err(),
                   SimilarityError::InvalidBit { position: 2, found: 'x' });
        assert!(tanimoto_bits("1021", "1001").is_err());
    }

    #[test]
    fn test_packing_crosses_word_boundaries() {
        let mut s = "0".repeat(130);
        s.replace_range(63..65, "11");
        s.replace_range(129..130, "1");
        let f = fp(&s);
        assert_eq!(f.len(), 130);
        assert_eq!(f.count_ones(), 3);
        assert_eq!(f.get(64), Some(true));
        assert_eq!(f.get(130), None);
        assert_eq!(f.to_bit_string(), s);
    }

    #[test]
    fn test_deserialize_checks_packing() {
        let f = fp("1011");
        let back: Fingerprint = serde_json::from_value(serde_json::to_value(&f).unwrap()).unwrap();
        assert_eq!(back, f);

        let short = serde_json::json!({ "kind": { "kind": "pattern" }, "n_bits": 200, "words": [] });
        let err = serde_json::from_value::<Fingerprint>(short).unwrap_err();
        assert!(err.to_string().contains("200 bits"), "{err}");

        // Bit 4 activo en un fingerprint de 4 bits
        let overflow = serde_json::json!({ "kind": { "kind": "pattern" }, "n_bits": 4, "words": [0b1_0001] });
        assert!(serde_json::from_value::<Fingerprint>(overflow).is_err());

        let full = serde_json::json!({ "kind": { "kind": "pattern" }, "n_bits": 64, "words": [u64::MAX] });
        assert_eq!(serde_json::from_value::<Fingerprint>(full).unwrap().count_ones(), 64);
    }

    #[test]
    fn test_digest_depends_on_kind() {
        let a = fp("1010");
        let b = Fingerprint::from_bit_string(FingerprintKind::Pattern, "1010").unwrap();
        assert_eq!(a.digest(), fp("1010").digest());
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Dos cadenas binarias de la misma longitud.
    fn equal_pair() -> impl Strategy<Value = (String, String)> {
        (1usize..300).prop_flat_map(|n| (proptest::collection::vec(any::<bool>(), n), proptest::collection::vec(any::<bool>(), n)))
                     .prop_map(|(a, b)| (to_bits(&a), to_bits(&b)))
    }

    fn to_bits(v: &[bool]) -> String {
        v.iter().map(|b| if *b { '1' } else { '0' }).collect()
    }

    proptest! {
        #[test]
        fn self_similarity_is_one_unless_empty((a, _b) in equal_pair()) {
            let f = Fingerprint::from_bit_string(FingerprintKind::morgan(), &a).unwrap();
            let s = tanimoto(&f, &f).unwrap();
            if f.count_ones() == 0 {
                prop_assert_eq!(s, 0.0);
            } else {
                prop_assert_eq!(s, 1.0);
            }
        }

        #[test]
        fn symmetric_and_bounded((a, b) in equal_pair()) {
            let fa = Fingerprint::from_bit_string(FingerprintKind::Pattern, &a).unwrap();
            let fb = Fingerprint::from_bit_string(FingerprintKind::Pattern, &b).unwrap();
            let ab = tanimoto(&fa, &fb).unwrap();
            let ba = tanimoto(&fb, &fa).unwrap();
            prop_assert_eq!(ab, ba);
            prop_assert!((0.0..=1.0).contains(&ab));
        }

        #[test]
        fn packed_and_string_forms_agree((a, b) in equal_pair()) {
            let fa = Fingerprint::from_bit_string(FingerprintKind::morgan(), &a).unwrap();
            let fb = Fingerprint::from_bit_string(FingerprintKind::morgan(), &b).unwrap();
            prop_assert_eq!(tanimoto(&fa, &fb).unwrap(), tanimoto_bits(&a, &b).unwrap());
        }
    }
}
