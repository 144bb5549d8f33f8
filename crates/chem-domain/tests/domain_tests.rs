use chem_domain::{derive_fingerprint, tanimoto, Descriptor, RenderOptions, StructureRecord};
use chemengine::{FingerprintKind, MockEngine};

const ASPIRIN: &str = "CC(=O)Oc1ccccc1C(=O)O";
const SALICYLIC_ACID: &str = "Oc1ccccc1C(=O)O";

#[test]
fn test_records_are_fresh_per_submission() {
    // Dos renders de la misma notación son iguales pero independientes
    let engine = MockEngine::new();
    let a = StructureRecord::render(&engine, ASPIRIN, &RenderOptions::default()).unwrap().unwrap();
    let b = StructureRecord::render(&engine, ASPIRIN, &RenderOptions::default()).unwrap().unwrap();
    assert_eq!(a, b);
    assert_eq!(engine.parse_calls(), 2);
}

#[test]
fn test_record_descriptors_subset() {
    let engine = MockEngine::new();
    let rec = StructureRecord::render(&engine, ASPIRIN, &RenderOptions::default()).unwrap().unwrap();
    assert_eq!(rec.descriptors().get(Descriptor::HeavyAtoms), Some("13"));
    assert_eq!(rec.descriptors().get(Descriptor::Rings), Some("1"));
    // El motor mock no calcula estos
    assert_eq!(rec.descriptors().get(Descriptor::MolecularWeight), None);
}

#[test]
fn test_similar_structures_score_high() {
    let engine = MockEngine::new();
    let kind = FingerprintKind::morgan();
    let a = derive_fingerprint(&engine, ASPIRIN, &kind).unwrap().unwrap();
    let b = derive_fingerprint(&engine, SALICYLIC_ACID, &kind).unwrap().unwrap();
    let score = tanimoto(&a, &b).unwrap();
    assert!(score > 0.3, "score = {score}");
    assert!(score < 1.0);
}

#[test]
fn test_unrelated_structures_score_low() {
    let engine = MockEngine::new();
    let kind = FingerprintKind::morgan();
    let benzene = derive_fingerprint(&engine, "c1ccccc1", &kind).unwrap().unwrap();
    let ethanol = derive_fingerprint(&engine, "CCO", &kind).unwrap().unwrap();
    let score = tanimoto(&benzene, &ethanol).unwrap();
    assert!(score < 0.3, "score = {score}");
}

#[test]
fn test_different_lengths_are_rejected() {
    let engine = MockEngine::new();
    let a = derive_fingerprint(&engine, "CCO", &FingerprintKind::Morgan { radius: 2, n_bits: 1024 }).unwrap().unwrap();
    let b = derive_fingerprint(&engine, "CCO", &FingerprintKind::Morgan { radius: 2, n_bits: 2048 }).unwrap().unwrap();
    assert!(tanimoto(&a, &b).is_err());
}
