//! Cyclic module interface
//!
//! Modules with a plain-data input (e.g. segment mapping, command dispatch)
//! implement [`State`], so that the control loop drives all of them the same
//! way: `init` once per session, then `proc` once per cycle.

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The internal state of a cyclic module.
pub trait State {
    /// Data needed to initialise the module, usually its parameters.
    type InitData;
    type InitError;

    /// Data consumed by one cycle.
    type InputData;
    /// Data produced by one cycle.
    type OutputData;
    /// What happened during one cycle, for logging and archiving.
    type StatusReport;
    type ProcError;

    /// (Re)initialise the module, discarding any previous state.
    fn init(&mut self, init_data: Self::InitData)
        -> Result<(), Self::InitError>;

    /// Run one cycle of the module.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
