//! chem-core: flujo de comparación de dos estructuras.
pub mod catalog;
pub mod controller;
pub mod errors;
pub mod event;
pub mod session;
pub mod state;

pub use catalog::{ExampleMolecule, ExamplePair, EXAMPLES, EXAMPLE_PAIRS};
pub use controller::{ComparisonController, ControllerOptions};
pub use errors::Advisory;
pub use event::{EventStore, InMemoryEventStore, SessionEvent, SessionEventKind};
pub use session::{ComparisonSession, Similarity};
pub use state::{Role, WorkflowState};
