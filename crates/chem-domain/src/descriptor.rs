//! Descriptores mostrados por registro. Cada entrada es opcional: si el motor
//! no la calcula simplemente no aparece.
use std::fmt;

use chemengine::RawDescriptors;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Descriptor {
    #[serde(rename = "amw")]
    MolecularWeight,
    #[serde(rename = "CrippenClogP")]
    LogP,
    #[serde(rename = "NumHBD")]
    HBondDonors,
    #[serde(rename = "NumHBA")]
    HBondAcceptors,
    #[serde(rename = "tpsa")]
    PolarSurfaceArea,
    #[serde(rename = "NumRotatableBonds")]
    RotatableBonds,
    #[serde(rename = "NumRings")]
    Rings,
    #[serde(rename = "NumAromaticRings")]
    AromaticRings,
    #[serde(rename = "NumHeavyAtoms")]
    HeavyAtoms,
    #[serde(rename = "FractionCSP3")]
    FractionCsp3,
}

impl Descriptor {
    /// Orden de presentación.
    pub const ALL: [Descriptor; 10] = [Descriptor::MolecularWeight,
                                       Descriptor::LogP,
                                       Descriptor::HBondDonors,
                                       Descriptor::HBondAcceptors,
                                       Descriptor::PolarSurfaceArea,
                                       Descriptor::RotatableBonds,
                                       Descriptor::Rings,
                                       Descriptor::AromaticRings,
                                       Descriptor::HeavyAtoms,
                                       Descriptor::FractionCsp3];

    /// Clave con la que el motor reporta el valor.
    pub fn engine_key(&self) -> &'static str {
        match self {
            Descriptor::MolecularWeight => "amw",
            Descriptor::LogP => "CrippenClogP",
            Descriptor::HBondDonors => "NumHBD",
            Descriptor::HBondAcceptors => "NumHBA",
            Descriptor::PolarSurfaceArea => "tpsa",
            Descriptor::RotatableBonds => "NumRotatableBonds",
            Descriptor::Rings => "NumRings",
            Descriptor::AromaticRings => "NumAromaticRings",
            Descriptor::HeavyAtoms => "NumHeavyAtoms",
            Descriptor::FractionCsp3 => "FractionCSP3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Descriptor::MolecularWeight => "Molecular Weight",
            Descriptor::LogP => "LogP",
            Descriptor::HBondDonors => "H-Bond Donors",
            Descriptor::HBondAcceptors => "H-Bond Acceptors",
            Descriptor::PolarSurfaceArea => "TPSA",
            Descriptor::RotatableBonds => "Rotatable Bonds",
            Descriptor::Rings => "Rings",
            Descriptor::AromaticRings => "Aromatic Rings",
            Descriptor::HeavyAtoms => "Heavy Atoms",
            Descriptor::FractionCsp3 => "Fraction Csp3",
        }
    }

    /// Decimales al formatear; los conteos son enteros.
    pub fn decimals(&self) -> usize {
        match self {
            Descriptor::MolecularWeight | Descriptor::LogP | Descriptor::PolarSurfaceArea => 2,
            Descriptor::FractionCsp3 => 3,
            _ => 0,
        }
    }

    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.decimals(), value)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bolsa de descriptores ya formateados, en el orden de `Descriptor::ALL`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSet(IndexMap<Descriptor, String>);

impl DescriptorSet {
    /// Toma los valores conocidos y finitos; ignora claves desconocidas.
    pub fn from_raw(raw: &RawDescriptors) -> Self {
        Self(Descriptor::ALL.iter()
                            .filter_map(|d| {
                                raw.get(d.engine_key())
                                   .filter(|v| v.is_finite())
                                   .map(|v| (*d, d.format(*v)))
                            })
                            .collect())
    }

    pub fn get(&self, descriptor: Descriptor) -> Option<&str> {
        self.0.get(&descriptor).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Descriptor, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_by_kind() {
        assert_eq!(Descriptor::MolecularWeight.format(180.158), "180.16");
        assert_eq!(Descriptor::HBondDonors.format(1.0), "1");
        assert_eq!(Descriptor::FractionCsp3.format(0.11111), "0.111");
    }

    #[test]
    fn from_raw_keeps_known_finite_values_in_order() {
        let mut raw = RawDescriptors::new();
        raw.insert("NumHeavyAtoms".into(), 13.0);
        raw.insert("amw".into(), 180.159);
        raw.insert("tpsa".into(), f64::NAN);
        raw.insert("Unknown".into(), 1.0);
        let set = DescriptorSet::from_raw(&raw);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(Descriptor::MolecularWeight), Some("180.16"));
        assert_eq!(set.get(Descriptor::PolarSurfaceArea), None);
        let order: Vec<_> = set.iter().map(|(d, _)| *d).collect();
        assert_eq!(order, vec![Descriptor::MolecularWeight, Descriptor::HeavyAtoms]);
    }

    #[test]
    fn serializes_with_engine_keys() {
        let mut raw = RawDescriptors::new();
        raw.insert("NumHBD".into(), 1.0);
        let v = serde_json::to_value(DescriptorSet::from_raw(&raw)).unwrap();
        assert_eq!(v, serde_json::json!({"NumHBD": "1"}));
    }
}
