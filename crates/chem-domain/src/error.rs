use chemengine::FingerprintKind;
use thiserror::Error;

/// Errores al comparar fingerprints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimilarityError {
    #[error("fingerprints de distinta longitud: {left} vs {right} bits")]
    LengthMismatch { left: usize, right: usize },
    #[error("fingerprints de distinto tipo: {left} vs {right}")]
    KindMismatch { left: FingerprintKind, right: FingerprintKind },
    #[error("carácter no binario '{found}' en la posición {position}")]
    InvalidBit { position: usize, found: char },
    #[error("{words} palabras no cubren un fingerprint de {n_bits} bits")]
    MalformedWords { n_bits: usize, words: usize },
    #[error("bits activos más allá de la longitud {n_bits}")]
    BitOutOfRange { n_bits: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_messages() {
        let e = SimilarityError::LengthMismatch { left: 2048, right: 1024 };
        assert_eq!(e.to_string(), "fingerprints de distinta longitud: 2048 vs 1024 bits");
        let e = SimilarityError::KindMismatch { left: FingerprintKind::morgan(), right: FingerprintKind::Pattern };
        assert_eq!(e.to_string(), "fingerprints de distinto tipo: morgan(r=2, bits=2048) vs pattern");
    }
}
