// chem-domain library entry point
pub mod descriptor;
pub mod error;
pub mod fingerprint;
pub mod record;
pub use descriptor::{Descriptor, DescriptorSet};
pub use error::SimilarityError;
pub use fingerprint::{tanimoto, tanimoto_bits, Fingerprint};
pub use record::{derive_fingerprint, RenderOptions, StructureRecord};
