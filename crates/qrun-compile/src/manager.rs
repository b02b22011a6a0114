//! Pass manager for orchestrating decomposition.

use tracing::{debug, info, instrument};

use crate::error::CompileResult;
use crate::pass::{Pass, Program};
use crate::property::PropertySet;

/// Manages and executes a sequence of decomposition passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes on the given program.
    #[instrument(skip(self, program, properties), fields(circuit = %program.name))]
    pub fn run(&self, program: &mut Program, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on circuit with {} qubits",
            self.passes.len(),
            program.num_qubits
        );

        for pass in &self.passes {
            if pass.should_run(program, properties) {
                debug!("Running pass: {}", pass.name());
                pass.run(program, properties)?;
                debug!(
                    "Pass {} completed, ops: {}",
                    pass.name(),
                    program.operations.len()
                );
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            "Pass manager completed, ops: {}",
            program.operations.len()
        );

        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
