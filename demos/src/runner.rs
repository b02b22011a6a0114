//! End-to-end runner: build, decompose, execute, aggregate.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, info};

use qrun_compile::DecomposedCircuit;
use qrun_hal::{
    Backend, BitOrder, ExecutionRequest, ExecutionResult, HalResult, QrunConfig, Session,
    to_distribution, to_integer_counts,
};
use qrun_ir::Circuit;

use crate::circuits::Algorithm;

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The algorithm that ran.
    pub algorithm: Algorithm,
    /// The logical circuit as built.
    pub circuit: Circuit,
    /// The circuit as submitted.
    pub decomposed: DecomposedCircuit,
    /// Shots requested.
    pub shots: u32,
    /// The validated result.
    pub result: ExecutionResult,
    /// Relative frequency of each bitstring.
    pub distribution: BTreeMap<String, f64>,
    /// Counts keyed by the MSB-first integer value of each bitstring.
    pub integers: BTreeMap<u64, u64>,
}

impl RunReport {
    /// The most frequent bitstring and its count.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.result.counts.most_frequent()
    }
}

/// Runs one [`Algorithm`] on a backend.
pub struct AlgorithmRunner {
    /// The algorithm to run.
    pub algorithm: Algorithm,
    /// Shot count. Defaults to [`Algorithm::default_shots`].
    pub shots: u32,
}

impl AlgorithmRunner {
    /// Create a runner with the algorithm's default shot count.
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            shots: algorithm.default_shots(),
        }
    }

    /// Set the number of shots.
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    /// Build the logical circuit from the configured register pools.
    pub fn build(&self, config: &QrunConfig) -> HalResult<Circuit> {
        Ok(self
            .algorithm
            .build(config.backend.qubit_pool, config.backend.clbit_pool)?)
    }

    /// Build, decompose for `backend` and execute inside a session.
    pub async fn run(&self, backend: Arc<dyn Backend>, config: &QrunConfig) -> HalResult<RunReport> {
        let circuit = self.build(config)?;
        let decomposed = backend.capabilities().decomposer().decompose(&circuit)?;
        debug!(
            algorithm = %self.algorithm,
            logical_ops = circuit.num_ops(),
            native_ops = decomposed.operations().len(),
            physical_qubits = decomposed.num_physical_qubits(),
            "Circuit decomposed"
        );

        let request = ExecutionRequest::new(decomposed.clone(), self.shots, backend.name());
        let result = Session::scope(backend, config.execution.clone(), |session| {
            async move { session.submit(&request).await }.boxed()
        })
        .await?;

        let distribution = to_distribution(&result);
        let integers = to_integer_counts(&result, BitOrder::MsbFirst)?;
        info!(
            algorithm = %self.algorithm,
            shots = self.shots,
            outcomes = result.counts.len(),
            "Run complete"
        );

        Ok(RunReport {
            algorithm: self.algorithm,
            circuit,
            decomposed,
            shots: self.shots,
            result,
            distribution,
            integers,
        })
    }
}

/// Run `algorithm` with `shots`, or its default shot count.
pub async fn run(
    algorithm: Algorithm,
    backend: Arc<dyn Backend>,
    config: &QrunConfig,
    shots: Option<u32>,
) -> HalResult<RunReport> {
    let mut runner = AlgorithmRunner::new(algorithm);
    if let Some(shots) = shots {
        runner = runner.with_shots(shots);
    }
    runner.run(backend, config).await
}
