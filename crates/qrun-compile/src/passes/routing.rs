//! Routing pass for inserting SWAP chains.

use tracing::debug;

use qrun_ir::{Operation, QubitId};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind, Program};
use crate::passes::translation::{lower, translate};
use crate::property::{CouplingMap, Layout, NativeGateSet, PropertySet};

/// Basic routing pass.
///
/// Walks the operations in order. Before each two-qubit operation whose
/// qubits are not adjacent, moves the first qubit along a shortest path
/// until it neighbours the second, emitting one translated SWAP per hop and
/// updating the running layout. Every operation, measurements included, is
/// then rewritten onto physical qubit indices.
///
/// An operation on three or more qubits stays whole when every pair is
/// already adjacent. Otherwise it is expanded by its decomposition rule and
/// the pieces are routed one by one.
pub struct BasicRouting;

impl Pass for BasicRouting {
    fn name(&self) -> &'static str {
        "BasicRouting"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, program: &mut Program, properties: &mut PropertySet) -> CompileResult<()> {
        let coupling_map = properties
            .coupling_map
            .as_ref()
            .ok_or(CompileError::MissingCouplingMap)?;
        let natives = properties
            .native_gates
            .as_ref()
            .ok_or(CompileError::MissingNativeGates)?;
        let layout = properties
            .layout
            .as_mut()
            .ok_or(CompileError::MissingLayout)?;

        let mut router = Router {
            coupling_map,
            natives,
            layout,
            routed: Vec::with_capacity(program.operations.len()),
            swaps: 0,
        };
        for op in &program.operations {
            router.route(op)?;
        }

        debug!("BasicRouting inserted {} swap(s)", router.swaps);
        program.operations = router.routed;
        Ok(())
    }

    fn should_run(&self, _program: &Program, properties: &PropertySet) -> bool {
        properties.coupling_map.is_some() && properties.layout.is_some()
    }
}

struct Router<'a> {
    coupling_map: &'a CouplingMap,
    natives: &'a NativeGateSet,
    layout: &'a mut Layout,
    routed: Vec<Operation>,
    swaps: usize,
}

impl Router<'_> {
    fn route(&mut self, op: &Operation) -> CompileResult<()> {
        let qubits = op.qubits();
        match qubits.as_slice() {
            [q0, q1] => self.bring_adjacent(*q0, *q1)?,
            [_] => {}
            _ => {
                if !self.all_adjacent(&qubits)? {
                    let pieces = lower(op, self.natives)?;
                    debug!("BasicRouting expanded '{}' into {} operation(s)", op.name(), pieces.len());
                    for piece in &pieces {
                        self.route(piece)?;
                    }
                    return Ok(());
                }
            }
        }

        let layout = &*self.layout;
        let physical = op.try_map_qubits(&mut |q| {
            layout
                .physical(q)
                .map(QubitId)
                .ok_or(CompileError::QubitNotMapped(q))
        })?;
        self.routed.push(physical);
        Ok(())
    }

    fn physical(&self, q: QubitId) -> CompileResult<u32> {
        self.layout.physical(q).ok_or(CompileError::QubitNotMapped(q))
    }

    /// Move `q0` next to `q1`, inserting translated swaps.
    fn bring_adjacent(&mut self, q0: QubitId, q1: QubitId) -> CompileResult<()> {
        let p0 = self.physical(q0)?;
        let p1 = self.physical(q1)?;

        if self.coupling_map.is_connected(p0, p1) {
            return Ok(());
        }

        let path = self
            .coupling_map
            .shortest_path(p0, p1)
            .ok_or(CompileError::RoutingInfeasible { from: p0, to: p1 })?;

        let hops = path.len().saturating_sub(2);
        for pair in path.windows(2).take(hops) {
            let swap = Operation::swap(QubitId(pair[0]), QubitId(pair[1]));
            self.routed.extend(translate(&swap, self.natives)?);
            self.layout.swap(pair[0], pair[1]);
        }

        self.swaps += hops;
        Ok(())
    }

    fn all_adjacent(&self, qubits: &[QubitId]) -> CompileResult<bool> {
        for (i, &a) in qubits.iter().enumerate() {
            for &b in &qubits[i + 1..] {
                if !self.coupling_map.is_connected(self.physical(a)?, self.physical(b)?) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::TrivialLayout;
    use qrun_ir::{CircuitBuilder, ClbitId, StandardGate};

    fn route(builder: CircuitBuilder, coupling_map: CouplingMap, natives: NativeGateSet) -> (Program, PropertySet) {
        let mut program = Program::from(&builder.build());
        let mut props = PropertySet::new().with_target(coupling_map, natives);
        TrivialLayout.run(&mut program, &mut props).unwrap();
        BasicRouting.run(&mut program, &mut props).unwrap();
        (program, props)
    }

    #[test]
    fn test_connected_needs_no_swap() {
        let mut builder = CircuitBuilder::with_size("test", 2, 0);
        builder.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();

        let (program, props) = route(builder, CouplingMap::linear(5), NativeGateSet::universal());

        assert_eq!(program.operations.len(), 2);
        assert_eq!(props.layout, props.initial_layout);
    }

    #[test]
    fn test_distant_pair_gets_swap_chain() {
        let mut builder = CircuitBuilder::with_size("test", 4, 1);
        builder
            .cx(QubitId(0), QubitId(3))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap();

        let (program, props) = route(builder, CouplingMap::linear(4), NativeGateSet::universal());

        // Two swaps move logical 0 from slot 0 to slot 2.
        assert_eq!(
            program.operations,
            vec![
                Operation::swap(QubitId(0), QubitId(1)),
                Operation::swap(QubitId(1), QubitId(2)),
                Operation::two(StandardGate::CX, QubitId(2), QubitId(3)),
                Operation::measure(QubitId(2), ClbitId(0)),
            ]
        );
        let layout = props.layout.unwrap();
        assert_eq!(layout.physical(QubitId(0)), Some(2));
        assert_eq!(layout.physical(QubitId(1)), Some(0));
        assert_eq!(layout.physical(QubitId(2)), Some(1));
    }

    #[test]
    fn test_swaps_are_translated() {
        let mut builder = CircuitBuilder::with_size("test", 3, 0);
        builder.cz(QubitId(0), QubitId(2)).unwrap();

        let natives = NativeGateSet::origin();
        let (program, _) = route(builder, CouplingMap::linear(3), natives.clone());

        assert!(program.operations.iter().all(|op| natives.is_native(op)));
        assert!(program.operations.len() > 1);
    }

    #[test]
    fn test_swap_through_unused_slot() {
        let mut builder = CircuitBuilder::with_size("test", 2, 0);
        builder.cx(QubitId(0), QubitId(1)).unwrap();

        // 0 - 2 - 1: the middle physical qubit holds no logical qubit.
        let map = CouplingMap::from_edges(3, [(0, 2), (2, 1)]).unwrap();
        let (program, props) = route(builder, map, NativeGateSet::universal());

        assert_eq!(program.operations[0], Operation::swap(QubitId(0), QubitId(2)));
        assert_eq!(
            program.operations[1],
            Operation::two(StandardGate::CX, QubitId(2), QubitId(1))
        );
        assert_eq!(props.layout.unwrap().logical(0), None);
    }

    #[test]
    fn test_disconnected_is_infeasible() {
        let mut builder = CircuitBuilder::with_size("test", 4, 0);
        builder.cx(QubitId(0), QubitId(3)).unwrap();

        let mut program = Program::from(&builder.build());
        let map = CouplingMap::from_edges(4, [(0, 1), (2, 3)]).unwrap();
        let mut props = PropertySet::new().with_target(map, NativeGateSet::universal());
        TrivialLayout.run(&mut program, &mut props).unwrap();

        assert!(matches!(
            BasicRouting.run(&mut program, &mut props),
            Err(CompileError::RoutingInfeasible { from: 0, to: 3 })
        ));
    }

    #[test]
    fn test_three_qubit_native_on_adjacent_chain_stays_whole() {
        let mut builder = CircuitBuilder::with_size("test", 3, 0);
        builder.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();

        let (program, _) = route(builder, CouplingMap::full(3), NativeGateSet::universal());
        assert_eq!(program.operations.len(), 1);
        assert_eq!(program.operations[0].name(), "ccx");
    }

    #[test]
    fn test_three_qubit_native_expands_when_not_adjacent() {
        let mut builder = CircuitBuilder::with_size("test", 3, 0);
        builder.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();

        let map = CouplingMap::linear(3);
        let (program, _) = route(builder, map.clone(), NativeGateSet::universal());

        assert!(program.operations.iter().all(|op| op.num_qubits() <= 2));
        for op in &program.operations {
            if let [a, b] = op.qubits().as_slice() {
                assert!(map.is_connected(a.0, b.0), "{op:?} is off the coupling map");
            }
        }
    }
}
