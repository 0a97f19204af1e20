//! Prelude module - common imports for guessbook users
//!
//! ```rust
//! use guessbook::prelude::*;
//! ```

pub use crate::{
    // Simulation
    generate_results,
    simulate,
    CancellationToken,
    // Document types
    Cell,
    Diagnostic,
    Document,
    // Extension traits
    DocumentSimulationExt,
    // Error types
    Error,
    Result,
    // Analysis
    SensitivityRecord,
    Sensitivities,
    SimulationOptions,
    SimulationResults,
    Summary,
};
