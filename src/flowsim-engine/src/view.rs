// Copyright 2026 The Flowsim Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Read-only stock-and-flow projection over a frame.
//!
//! The view buckets nodes by type, indexes the edges the compiler
//! cares about, and checks the structural invariants that must hold
//! before any formula is even parsed.  It never mutates the frame.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::builtins::{is_builtin_fn, is_builtin_var};
use crate::common::{EquationError, ErrorCode, NodeIssue};
use crate::frame::{Frame, Object, ObjectId, ObjectType, SimSpecs};

fn structural(obj: &Object, details: &str) -> NodeIssue {
    NodeIssue::new(
        obj.id,
        obj.name(),
        EquationError {
            start: 0,
            end: 0,
            code: ErrorCode::BadStructure,
        },
    )
    .with_details(details.to_owned())
}

pub struct StockFlowView<'a> {
    frame: &'a Frame,
    issues: Vec<NodeIssue>,
    stocks: Vec<ObjectId>,
    flows: Vec<ObjectId>,
    auxiliaries: Vec<ObjectId>,
    graphical_functions: Vec<ObjectId>,
    delays: Vec<ObjectId>,
    // flow -> the stock it drains / fills
    drains: HashMap<ObjectId, ObjectId>,
    fills: HashMap<ObjectId, ObjectId>,
    // target -> incoming Parameter edge origins, in edge order
    params: HashMap<ObjectId, Vec<ObjectId>>,
    specs: SimSpecs,
}

impl<'a> StockFlowView<'a> {
    pub fn new(frame: &'a Frame) -> Self {
        let mut view = StockFlowView {
            frame,
            issues: Vec::new(),
            stocks: Vec::new(),
            flows: Vec::new(),
            auxiliaries: Vec::new(),
            graphical_functions: Vec::new(),
            delays: Vec::new(),
            drains: HashMap::new(),
            fills: HashMap::new(),
            params: HashMap::new(),
            specs: SimSpecs::default(),
        };

        view.bucket_nodes();
        view.index_edges();
        view.check_parameter_fan_in();
        view.check_names();
        view.read_sim_specs();

        view
    }

    fn bucket_nodes(&mut self) {
        for obj in self.frame.nodes() {
            match obj.ty {
                ObjectType::Stock => self.stocks.push(obj.id),
                ObjectType::Flow => self.flows.push(obj.id),
                ObjectType::Auxiliary => self.auxiliaries.push(obj.id),
                ObjectType::GraphicalFunction => self.graphical_functions.push(obj.id),
                ObjectType::Delay => self.delays.push(obj.id),
                _ => {}
            }
        }
        // frames that went through persistence may enumerate in any order
        self.stocks.sort_unstable();
        self.flows.sort_unstable();
        self.auxiliaries.sort_unstable();
        self.graphical_functions.sort_unstable();
        self.delays.sort_unstable();
    }

    fn endpoint(&self, id: ObjectId) -> Option<&'a Object> {
        match self.frame.get(id) {
            Some(obj) if obj.ty.is_node() => Some(obj),
            _ => None,
        }
    }

    fn index_edges(&mut self) {
        let mut issues = Vec::new();
        for edge in self.frame.edges() {
            let (origin_id, target_id) = match edge.endpoints {
                Some(endpoints) => endpoints,
                None => {
                    issues.push(structural(edge, "edge is missing its endpoints"));
                    continue;
                }
            };
            let origin = self.endpoint(origin_id);
            let target = self.endpoint(target_id);
            let (origin, target) = match (origin, target) {
                (Some(origin), Some(target)) => (origin, target),
                _ => {
                    issues.push(structural(edge, "edge endpoint does not exist"));
                    continue;
                }
            };

            match edge.ty {
                ObjectType::Drains => {
                    if origin.ty != ObjectType::Stock || target.ty != ObjectType::Flow {
                        issues.push(structural(edge, "drains edge must run stock -> flow"));
                        continue;
                    }
                    if self.drains.insert(target.id, origin.id).is_some() {
                        issues.push(structural(target, "flow has more than one drains edge"));
                    }
                }
                ObjectType::Fills => {
                    if origin.ty != ObjectType::Flow || target.ty != ObjectType::Stock {
                        issues.push(structural(edge, "fills edge must run flow -> stock"));
                        continue;
                    }
                    if self.fills.insert(origin.id, target.id).is_some() {
                        issues.push(structural(origin, "flow has more than one fills edge"));
                    }
                }
                ObjectType::Parameter => {
                    if !origin.ty.is_computed() || !target.ty.is_computed() {
                        issues.push(structural(
                            edge,
                            "parameter edge endpoints must be computed nodes",
                        ));
                        continue;
                    }
                    self.params.entry(target.id).or_default().push(origin.id);
                }
                // implicit flow edges are derived from flows at compile
                // time; a stored one carries no extra information
                ObjectType::ImplicitFlow => {}
                ObjectType::ChartSeries | ObjectType::ControlBinding => {}
                _ => {}
            }
        }
        self.issues.append(&mut issues);
    }

    fn check_parameter_fan_in(&mut self) {
        let mut issues = Vec::new();
        for &gf in self.graphical_functions.iter() {
            if self.parameters(gf).len() > 1 {
                let obj = self.frame.get(gf).unwrap();
                issues.push(structural(
                    obj,
                    "graphical function takes at most one input parameter",
                ));
            }
        }
        self.issues.append(&mut issues);
    }

    fn check_names(&mut self) {
        let mut by_name: BTreeMap<&str, Vec<ObjectId>> = BTreeMap::new();
        for obj in self.frame.nodes() {
            if let Some(name) = obj.name() {
                by_name.entry(name).or_default().push(obj.id);
            }
        }

        for (name, ids) in by_name.iter() {
            let reserved = is_builtin_var(name) || is_builtin_fn(name);
            if ids.len() < 2 && !reserved {
                continue;
            }
            let details = if reserved {
                format!("'{name}' is a reserved builtin name")
            } else {
                format!("'{name}' names more than one node")
            };
            for &id in ids.iter() {
                self.issues.push(
                    NodeIssue::new(
                        id,
                        Some(name),
                        EquationError {
                            start: 0,
                            end: 0,
                            code: ErrorCode::DuplicateName,
                        },
                    )
                    .with_details(details.clone()),
                );
            }
        }
    }

    fn read_sim_specs(&mut self) {
        let mut simulations = self
            .frame
            .nodes()
            .filter(|obj| obj.ty == ObjectType::Simulation);

        let first = match simulations.next() {
            Some(obj) => obj,
            None => return,
        };
        for extra in simulations {
            self.issues.push(structural(
                extra,
                "frame holds more than one simulation object",
            ));
        }

        let mut specs = SimSpecs::default();
        if let Some(initial_time) = first.attr_f64("initial_time") {
            specs.initial_time = initial_time;
        }
        if let Some(time_delta) = first.attr_f64("time_delta") {
            specs.time_delta = time_delta;
        }
        if let Some(steps) = first.attr_i64("steps") {
            specs.steps = steps.max(0) as usize;
        }
        if !(specs.time_delta.is_finite() && specs.time_delta > 0.0) {
            self.issues.push(
                NodeIssue::new(
                    first.id,
                    first.name(),
                    EquationError {
                        start: 0,
                        end: 0,
                        code: ErrorCode::BadSimSpecs,
                    },
                )
                .with_details("time_delta must be positive and finite".to_owned()),
            );
            specs.time_delta = SimSpecs::default().time_delta;
        }
        self.specs = specs;
    }

    pub fn issues(&self) -> &[NodeIssue] {
        &self.issues
    }

    pub fn frame(&self) -> &'a Frame {
        self.frame
    }

    pub fn sim_specs(&self) -> SimSpecs {
        self.specs
    }

    pub fn stocks(&self) -> &[ObjectId] {
        &self.stocks
    }

    pub fn flows(&self) -> &[ObjectId] {
        &self.flows
    }

    pub fn auxiliaries(&self) -> &[ObjectId] {
        &self.auxiliaries
    }

    pub fn graphical_functions(&self) -> &[ObjectId] {
        &self.graphical_functions
    }

    pub fn delays(&self) -> &[ObjectId] {
        &self.delays
    }

    /// All computed nodes in ascending id order.
    pub fn computed_nodes(&self) -> Vec<ObjectId> {
        let mut nodes: Vec<ObjectId> = Vec::with_capacity(
            self.stocks.len()
                + self.flows.len()
                + self.auxiliaries.len()
                + self.graphical_functions.len()
                + self.delays.len(),
        );
        nodes.extend_from_slice(&self.stocks);
        nodes.extend_from_slice(&self.flows);
        nodes.extend_from_slice(&self.auxiliaries);
        nodes.extend_from_slice(&self.graphical_functions);
        nodes.extend_from_slice(&self.delays);
        nodes.sort_unstable();
        nodes
    }

    pub fn flow_drains(&self, flow: ObjectId) -> Option<ObjectId> {
        self.drains.get(&flow).copied()
    }

    pub fn flow_fills(&self, flow: ObjectId) -> Option<ObjectId> {
        self.fills.get(&flow).copied()
    }

    /// Origins of the incoming `Parameter` edges of `target`.
    pub fn parameters(&self, target: ObjectId) -> &[ObjectId] {
        self.params
            .get(&target)
            .map(|origins| origins.as_slice())
            .unwrap_or(&[])
    }

    pub fn stock_inflows(&self, stock: ObjectId) -> Vec<ObjectId> {
        self.flows
            .iter()
            .copied()
            .filter(|flow| self.fills.get(flow) == Some(&stock))
            .collect()
    }

    pub fn stock_outflows(&self, stock: ObjectId) -> Vec<ObjectId> {
        self.flows
            .iter()
            .copied()
            .filter(|flow| self.drains.get(flow) == Some(&stock))
            .collect()
    }

    pub fn delayed_inflow(&self, stock: ObjectId) -> bool {
        self.frame
            .get(stock)
            .and_then(|obj| obj.attr_bool("delayed_inflow"))
            .unwrap_or(false)
    }

    pub fn allows_negative(&self, stock: ObjectId) -> bool {
        self.frame
            .get(stock)
            .and_then(|obj| obj.attr_bool("allows_negative"))
            .unwrap_or(false)
    }

    pub fn flow_priority(&self, flow: ObjectId) -> i64 {
        self.frame
            .get(flow)
            .and_then(|obj| obj.attr_i64("priority"))
            .unwrap_or(0)
    }

    /// For every flow with both a drain S1 and a fill S2, the logical
    /// ordering edge S1 -> S2.  These exist only to order stocks and
    /// are never stored in the frame.
    pub fn implicit_flow_edges(&self) -> Vec<(ObjectId, ObjectId)> {
        self.flows
            .iter()
            .filter_map(|flow| {
                let from = self.drains.get(flow)?;
                let to = self.fills.get(flow)?;
                if from == to { None } else { Some((*from, *to)) }
            })
            .collect()
    }

    /// Kahn-style topological order over stocks along implicit-flow
    /// edges.  A stock marked `delayed_inflow` has its incoming edges
    /// removed first; that is how user-declared stock cycles are
    /// broken.  A residual cycle is a compile error.
    pub fn sorted_stocks(&self) -> Result<Vec<ObjectId>, NodeIssue> {
        let delayed: HashSet<ObjectId> = self
            .stocks
            .iter()
            .copied()
            .filter(|&stock| self.delayed_inflow(stock))
            .collect();

        let edges: Vec<(ObjectId, ObjectId)> = self
            .implicit_flow_edges()
            .into_iter()
            .filter(|(_, to)| !delayed.contains(to))
            .collect();

        let mut indegree: BTreeMap<ObjectId, usize> =
            self.stocks.iter().map(|&stock| (stock, 0)).collect();
        let mut successors: BTreeMap<ObjectId, Vec<ObjectId>> = BTreeMap::new();
        for &(from, to) in edges.iter() {
            *indegree.entry(to).or_insert(0) += 1;
            successors.entry(from).or_default().push(to);
        }

        let mut ready: BTreeSet<ObjectId> = indegree
            .iter()
            .filter(|&(_, &n)| n == 0)
            .map(|(&stock, _)| stock)
            .collect();
        let mut order: Vec<ObjectId> = Vec::with_capacity(self.stocks.len());

        while let Some(&stock) = ready.iter().next() {
            ready.remove(&stock);
            order.push(stock);
            if let Some(succs) = successors.get(&stock) {
                for &succ in succs.iter() {
                    let n = indegree.get_mut(&succ).unwrap();
                    *n -= 1;
                    if *n == 0 {
                        ready.insert(succ);
                    }
                }
            }
        }

        if order.len() == self.stocks.len() {
            return Ok(order);
        }

        let in_order: HashSet<ObjectId> = order.iter().copied().collect();
        let cycle: Vec<ObjectId> = self
            .stocks
            .iter()
            .copied()
            .filter(|stock| !in_order.contains(stock))
            .collect();
        let names: Vec<String> = cycle
            .iter()
            .map(|&id| {
                self.frame
                    .get(id)
                    .and_then(|obj| obj.name())
                    .map(|name| name.to_owned())
                    .unwrap_or_else(|| format!("#{id}"))
            })
            .collect();
        let first = cycle[0];
        Err(NodeIssue::new(
            first,
            self.frame.get(first).and_then(|obj| obj.name()),
            EquationError {
                start: 0,
                end: 0,
                code: ErrorCode::UnresolvedStockCycle,
            },
        )
        .with_details(names.join(", ")))
    }
}
