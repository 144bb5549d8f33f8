//! Ejemplos fijos ofrecidos por la interfaz.
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExampleMolecule {
    pub name: &'static str,
    pub smiles: &'static str,
}

/// Par de ejemplo para el modo comparación. `expected` es sólo una etiqueta
/// descriptiva; no se verifica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExamplePair {
    pub name: &'static str,
    pub reference: &'static str,
    pub comparison: &'static str,
    pub expected: &'static str,
}

pub const EXAMPLES: &[ExampleMolecule] = &[ExampleMolecule { name: "Aspirin", smiles: "CC(=O)Oc1ccccc1C(=O)O" },
                                           ExampleMolecule { name: "Caffeine", smiles: "CN1C=NC2=C1C(=O)N(C(=O)N2C)C" },
                                           ExampleMolecule { name: "Ibuprofen", smiles: "CC(C)Cc1ccc(cc1)C(C)C(=O)O" },
                                           ExampleMolecule { name: "Paracetamol", smiles: "CC(=O)Nc1ccc(O)cc1" },
                                           ExampleMolecule { name: "Benzene", smiles: "c1ccccc1" },
                                           ExampleMolecule { name: "Ethanol", smiles: "CCO" }];

pub const EXAMPLE_PAIRS: &[ExamplePair] = &[ExamplePair { name: "Aspirin vs Salicylic acid",
                                                          reference: "CC(=O)Oc1ccccc1C(=O)O",
                                                          comparison: "Oc1ccccc1C(=O)O",
                                                          expected: "~0.5 (related)" },
                                            ExamplePair { name: "Caffeine vs Theobromine",
                                                          reference: "CN1C=NC2=C1C(=O)N(C(=O)N2C)C",
                                                          comparison: "CN1C=NC2=C1C(=O)NC(=O)N2C",
                                                          expected: "~0.6 (very similar)" },
                                            ExamplePair { name: "Ibuprofen vs Naproxen",
                                                          reference: "CC(C)Cc1ccc(cc1)C(C)C(=O)O",
                                                          comparison: "COc1ccc2cc(ccc2c1)C(C)C(=O)O",
                                                          expected: "~0.3 (same class)" },
                                            ExamplePair { name: "Benzene vs Ethanol",
                                                          reference: "c1ccccc1",
                                                          comparison: "CCO",
                                                          expected: "~0.1 (unrelated)" }];

pub fn example(index: usize) -> Option<&'static ExampleMolecule> {
    EXAMPLES.get(index)
}

pub fn example_pair(index: usize) -> Option<&'static ExamplePair> {
    EXAMPLE_PAIRS.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() {
        assert_eq!(example(0).map(|e| e.name), Some("Aspirin"));
        assert!(example(EXAMPLES.len()).is_none());
        assert_eq!(example_pair(3).map(|p| p.comparison), Some("CCO"));
        assert!(example_pair(99).is_none());
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = EXAMPLES.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EXAMPLES.len());
    }
}
