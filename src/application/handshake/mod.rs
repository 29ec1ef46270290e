pub mod errors;
pub mod fsm_machine;
pub mod fsm_types;

pub use errors::*;
pub use fsm_machine::*;
pub use fsm_types::*;

// Single import path for everything the machine exposes.
pub mod fsm {
    pub use super::errors::*;
    pub use super::fsm_machine::*;
    pub use super::fsm_types::*;
}
