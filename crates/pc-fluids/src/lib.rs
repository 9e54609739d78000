//! pc-fluids: equation-of-state oracle for the compressor cycle model.
//!
//! Provides:
//! - Working-fluid species and compositions
//! - The full state tuple (T, p, v, u, h, s) returned by every query
//! - `FluidModel` trait with `(p, T)`, `(u, v)` and `(T, x)` queries
//! - CoolProp backend for real fluid properties
//! - Calorically perfect ideal-gas backend
//!
//! # Example
//!
//! ```no_run
//! use pc_fluids::{CoolPropModel, Composition, FluidModel, Species, StateInput};
//! use pc_core::units::{pa, k};
//!
//! let model = CoolPropModel::new();
//! let comp = Composition::pure(Species::Propane);
//! let input = StateInput::PT {
//!     p: pa(3.0e5),
//!     t: k(282.65),
//! };
//!
//! let state = model.state(input, &comp).unwrap();
//! println!("v = {} m³/kg", state.specific_volume());
//! ```

pub mod composition;
pub mod coolprop;
pub mod error;
pub mod ideal_gas;
pub mod model;
pub mod species;
pub mod state;

pub use composition::Composition;
pub use coolprop::CoolPropModel;
pub use error::{FluidError, FluidResult};
pub use ideal_gas::IdealGasModel;
pub use model::FluidModel;
pub use species::Species;
pub use state::{SpecEnergy, SpecEnthalpy, SpecEntropy, SpecVolume, StateInput, ThermoState};
