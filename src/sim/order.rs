use std::collections::VecDeque;

use fxhash::FxHashMap;
use log::info;

use crate::error::{Error, Result};
use crate::netlist::{Cell, CellId, Module, SigBit, SigMap};

/// Classification of cells for truth table derivation
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum CellKind {
    /// Inverter (`$_NOT_`)
    Not,
    /// 2-input And (`$_AND_`)
    And,
    /// Flip-flop or latch: the module is not combinational
    Sequential,
    /// Timing annotation, with no logic function
    Annotation,
    /// Anything else
    Unsupported,
}

/// Prefixes of the Yosys internal flip-flop and latch gates
const SEQUENTIAL_PREFIXES: [&str; 12] = [
    "$_DFF_",
    "$_DFFE_",
    "$_DFFSR_",
    "$_DFFSRE_",
    "$_SDFF_",
    "$_SDFFE_",
    "$_SDFFCE_",
    "$_ALDFF_",
    "$_ALDFFE_",
    "$_DLATCH_",
    "$_DLATCHSR_",
    "$_SR_",
];

impl CellKind {
    /// Classify a cell type
    pub fn classify(cell_type: &str) -> CellKind {
        match cell_type {
            "$_NOT_" => CellKind::Not,
            "$_AND_" => CellKind::And,
            "$_FF_" => CellKind::Sequential,
            "$specify2" | "$specify3" | "$specrule" => CellKind::Annotation,
            _ => {
                if SEQUENTIAL_PREFIXES.iter().any(|p| cell_type.starts_with(p)) {
                    CellKind::Sequential
                } else {
                    CellKind::Unsupported
                }
            }
        }
    }

    /// Input ports read by a logic gate
    pub fn input_ports(&self) -> &'static [&'static str] {
        match self {
            CellKind::And => &["B", "A"],
            CellKind::Not => &["A"],
            _ => &[],
        }
    }
}

/// Canonical bit connected to a single-bit port, if connected
pub(crate) fn port_bit(sigmap: &SigMap, cell: &Cell, port: &str) -> Option<SigBit> {
    match cell.port(port) {
        Some(s) if s.len() == 1 => Some(sigmap.map_bit(s[0])),
        _ => None,
    }
}

/// Directed graph between logic cells, from driver to reader
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    fanouts: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Create a graph without edges
    pub fn new(nb_nodes: usize) -> Self {
        DependencyGraph {
            fanouts: vec![Vec::new(); nb_nodes],
        }
    }

    /// Return the number of nodes
    pub fn nb_nodes(&self) -> usize {
        self.fanouts.len()
    }

    /// Add an edge from a driver to one of its readers
    pub fn add_edge(&mut self, from: usize, to: usize) {
        self.fanouts[from].push(to);
    }

    /// Topologically sort the graph
    ///
    /// Nodes without pending dependencies are visited lowest index first.
    /// On failure, returns the nodes of a shortest cycle, in edge order.
    pub fn topo_sort(&self) -> std::result::Result<Vec<usize>, Vec<usize>> {
        // Count the input dependencies of each node
        let mut count_deps = vec![0u32; self.nb_nodes()];
        for fanout in &self.fanouts {
            for d in fanout {
                count_deps[*d] += 1;
            }
        }

        // Start with nodes with no dependencies
        let mut to_visit: Vec<usize> = (0..self.nb_nodes())
            .rev()
            .filter(|v| count_deps[*v] == 0)
            .collect();
        let mut order = Vec::new();
        while let Some(v) = to_visit.pop() {
            order.push(v);
            for d in self.fanouts[v].iter().rev() {
                count_deps[*d] -= 1;
                if count_deps[*d] == 0 {
                    to_visit.push(*d);
                }
            }
        }

        if order.len() != self.nb_nodes() {
            let remaining: Vec<bool> = count_deps.iter().map(|c| *c != 0).collect();
            return Err(self.shortest_cycle(&remaining));
        }
        Ok(order)
    }

    /// Strongly connected component of each of the given nodes, `usize::MAX` for the others
    fn components(&self, remaining: &[bool]) -> Vec<usize> {
        // Iterative Tarjan, with an explicit stack of (node, next fanout position)
        let n = self.nb_nodes();
        let mut index = vec![usize::MAX; n];
        let mut low = vec![0; n];
        let mut on_stack = vec![false; n];
        let mut stack = Vec::new();
        let mut comp = vec![usize::MAX; n];
        let mut next_index = 0;
        let mut nb_comps = 0;
        for root in 0..n {
            if !remaining[root] || index[root] != usize::MAX {
                continue;
            }
            index[root] = next_index;
            low[root] = next_index;
            next_index += 1;
            stack.push(root);
            on_stack[root] = true;
            let mut call = vec![(root, 0)];
            while let Some((v, pos)) = call.pop() {
                if let Some(&d) = self.fanouts[v].get(pos) {
                    call.push((v, pos + 1));
                    if !remaining[d] {
                        continue;
                    }
                    if index[d] == usize::MAX {
                        index[d] = next_index;
                        low[d] = next_index;
                        next_index += 1;
                        stack.push(d);
                        on_stack[d] = true;
                        call.push((d, 0));
                    } else if on_stack[d] {
                        low[v] = low[v].min(index[d]);
                    }
                    continue;
                }
                if let Some(&(parent, _)) = call.last() {
                    low[parent] = low[parent].min(low[v]);
                }
                if low[v] == index[v] {
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        comp[w] = nb_comps;
                        if w == v {
                            break;
                        }
                    }
                    nb_comps += 1;
                }
            }
        }
        comp
    }

    /// Find a shortest cycle among the given nodes
    ///
    /// Only nodes of a non-trivial strongly connected component are searched from,
    /// so that the logic downstream of a loop is not explored.
    fn shortest_cycle(&self, remaining: &[bool]) -> Vec<usize> {
        let n = self.nb_nodes();
        if let Some(v) = (0..n).find(|v| remaining[*v] && self.fanouts[*v].contains(v)) {
            return vec![v];
        }
        let comp = self.components(remaining);
        let mut comp_size = vec![0usize; n];
        for c in &comp {
            if *c != usize::MAX {
                comp_size[*c] += 1;
            }
        }

        let mut best: Option<Vec<usize>> = None;
        for start in 0..n {
            if comp[start] == usize::MAX || comp_size[comp[start]] < 2 {
                continue;
            }
            // Breadth-first search back to the start node, inside its component
            let mut pred = vec![usize::MAX; n];
            let mut queue = VecDeque::from([start]);
            let mut closing = None;
            'search: while let Some(v) = queue.pop_front() {
                for d in &self.fanouts[v] {
                    if comp[*d] != comp[start] {
                        continue;
                    }
                    if *d == start {
                        closing = Some(v);
                        break 'search;
                    }
                    if pred[*d] == usize::MAX {
                        pred[*d] = v;
                        queue.push_back(*d);
                    }
                }
            }
            let Some(last) = closing else {
                continue;
            };
            let mut cycle = vec![last];
            let mut cur = last;
            while cur != start {
                cur = pred[cur];
                cycle.push(cur);
            }
            cycle.reverse();
            if best.as_ref().map_or(true, |b| cycle.len() < b.len()) {
                // No self-loop: two nodes is the shortest possible
                let done = cycle.len() == 2;
                best = Some(cycle);
                if done {
                    break;
                }
            }
        }
        best.unwrap_or_default()
    }
}

/// Order the logic cells of a module so that each cell comes after its drivers
///
/// Returns `None` if the module contains flip-flops or latches. Annotations are
/// left out of the order.
pub fn combinational_order(m: &Module, sigmap: &SigMap) -> Result<Option<Vec<CellId>>> {
    let mut nodes = Vec::new();
    for (id, cell) in m.cells() {
        match CellKind::classify(cell.cell_type()) {
            CellKind::Annotation => continue,
            CellKind::Sequential => {
                info!(
                    "Ignoring module '{}' which isn't purely combinational.",
                    m.name()
                );
                return Ok(None);
            }
            CellKind::Unsupported => {
                return Err(Error::UnsupportedCell {
                    module: m.name().to_owned(),
                    cell: cell.name().to_owned(),
                    cell_type: cell.cell_type().to_owned(),
                });
            }
            CellKind::Not | CellKind::And => nodes.push(id),
        }
    }

    let mut driver = FxHashMap::<SigBit, usize>::default();
    for (i, id) in nodes.iter().enumerate() {
        if let Some(y) = port_bit(sigmap, m.cell(*id), "Y") {
            driver.insert(y, i);
        }
    }

    let mut graph = DependencyGraph::new(nodes.len());
    for (i, id) in nodes.iter().enumerate() {
        let cell = m.cell(*id);
        for port in CellKind::classify(cell.cell_type()).input_ports() {
            if let Some(bit) = port_bit(sigmap, cell, port) {
                if let Some(d) = driver.get(&bit) {
                    graph.add_edge(*d, i);
                }
            }
        }
    }

    match graph.topo_sort() {
        Ok(order) => Ok(Some(order.into_iter().map(|i| nodes[i]).collect())),
        Err(cycle) => Err(Error::CombinationalLoop {
            module: m.name().to_owned(),
            cells: cycle
                .into_iter()
                .map(|i| m.cell(nodes[i]).name().to_owned())
                .collect(),
        }),
    }
}
