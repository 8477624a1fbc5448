//! Variable dependency graph
//!
//! An edge `x -> y` means some value stored into `x` was computed from a
//! LOAD_VAR of `y`. Values are traced backwards through the producing
//! instructions of their registers.

use super::defs_uses::{defined_variable, used_variable};
use crate::shared::models::{IrInstruction, Opcode, Register};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: FxHashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn build(instructions: &[IrInstruction]) -> Self {
        let producers: FxHashMap<Register, usize> = instructions
            .iter()
            .enumerate()
            .filter_map(|(idx, inst)| inst.result_reg.map(|r| (r, idx)))
            .collect();

        let mut graph = Self::default();
        for inst in instructions {
            if inst.opcode != Opcode::StoreVar {
                continue;
            }
            let Some(target) = defined_variable(inst) else {
                continue;
            };
            graph.node(target);
            for source in source_variables(instructions, &producers, inst) {
                graph.add_edge(target, &source);
            }
        }
        tracing::trace!(
            "dependency graph: {} variables, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), idx);
        idx
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        let (a, b) = (self.node(from), self.node(to));
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, ());
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn variables(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        vars.sort_unstable();
        vars
    }

    /// Variables read directly when computing values stored into `var`
    pub fn dependencies_of(&self, var: &str) -> Vec<&str> {
        self.neighbors(var, Direction::Outgoing)
    }

    /// Variables whose stored values read `var` directly
    pub fn dependents_of(&self, var: &str) -> Vec<&str> {
        self.neighbors(var, Direction::Incoming)
    }

    fn neighbors(&self, var: &str, dir: Direction) -> Vec<&str> {
        let Some(&idx) = self.nodes.get(var) else {
            return Vec::new();
        };
        let set: BTreeSet<&str> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = if dir == Direction::Outgoing { e.target() } else { e.source() };
                self.graph[other].as_str()
            })
            .collect();
        set.into_iter().collect()
    }

    /// Everything `var` depends on through any chain of stores, sorted.
    /// Contains `var` itself only when it sits on a cycle.
    pub fn transitive_dependencies(&self, var: &str) -> Vec<&str> {
        let Some(&start) = self.nodes.get(var) else {
            return Vec::new();
        };
        let mut reached = BTreeSet::new();
        for next in self.graph.neighbors(start) {
            let mut dfs = Dfs::new(&self.graph, next);
            while let Some(n) = dfs.next(&self.graph) {
                reached.insert(self.graph[n].as_str());
            }
        }
        reached.into_iter().collect()
    }

    pub fn is_self_dependent(&self, var: &str) -> bool {
        self.transitive_dependencies(var).contains(&var)
    }
}

/// LOAD_VAR names feeding the value operand of a STORE_VAR
fn source_variables(
    instructions: &[IrInstruction],
    producers: &FxHashMap<Register, usize>,
    store: &IrInstruction,
) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut seen: FxHashSet<Register> = FxHashSet::default();
    let mut stack: Vec<Register> = store.used_registers().collect();
    while let Some(reg) = stack.pop() {
        if !seen.insert(reg) {
            continue;
        }
        let Some(&idx) = producers.get(&reg) else {
            continue;
        };
        let producer = &instructions[idx];
        match used_variable(producer) {
            Some(name) => {
                names.insert(name.to_string());
            }
            None => stack.extend(producer.used_registers()),
        }
    }
    names
}
