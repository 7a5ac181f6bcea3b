// Copyright 2026 The Flowsim Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Lowers a frame into an executable `CompiledModel`.
//!
//! Passes: structural validation (in the view) -> parse each formula ->
//! bind names through `Parameter` edges -> type check -> dependency
//! graphs -> evaluation orders -> state layout -> emit.  Issues are
//! accumulated across all nodes; the compiler never stops at the first
//! problem.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use smallvec::SmallVec;

use crate::ast;
use crate::builtins::Ty;
use crate::common::{EquationError, EquationResult, ErrorCode, Ident, NodeIssue};
use crate::frame::{Frame, ObjectId, ObjectType, Point, SimSpecs};
use crate::parser;
use crate::view::StockFlowView;

pub use crate::ast::BinaryOp;
pub use crate::builtins::BuiltinFn;

pub(crate) const TIME_OFF: usize = 0;
pub(crate) const DT_OFF: usize = 1;
pub(crate) const IMPLICIT_VAR_COUNT: usize = 2;

/// A bound expression: no free names, variables are state-vector
/// offsets.
#[derive(PartialEq, Clone, Debug)]
pub enum Expr {
    Const(f64),
    Var(usize),
    App(BuiltinFn<Expr>),
    Op2(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Time,
    TimeDelta,
    Stock,
    Flow,
    Auxiliary,
    GraphicalFunction,
    Delay,
}

/// Queryable description of one slot in the state vector.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotInfo {
    pub ident: Ident,
    pub kind: SlotKind,
    pub object: Option<ObjectId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledStock {
    pub ident: Ident,
    pub off: usize,
    pub initial: Expr,
    pub allows_negative: bool,
    pub delayed_inflow: bool,
    /// Flow offsets, sorted by flow priority ascending, ties broken by
    /// object id ascending.
    pub inflows: SmallVec<[usize; 4]>,
    pub outflows: SmallVec<[usize; 4]>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Step,
}

impl Interpolation {
    fn from_attr(method: &str) -> Option<Self> {
        match method {
            "step" => Some(Interpolation::Step),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledGraphicalFunction {
    pub off: usize,
    pub input: usize,
    pub points: Vec<Point>,
    pub interpolation: Interpolation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayKind {
    Delay1,
}

impl DelayKind {
    fn from_attr(kind: &str) -> Option<Self> {
        match kind {
            "delay1" => Some(DelayKind::Delay1),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledDelay {
    pub off: usize,
    pub input: usize,
    pub duration: f64,
    pub kind: DelayKind,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum StepBody {
    Formula(Expr),
    /// Index into `CompiledModel::graphicals`.
    Graphical(usize),
    /// Index into `CompiledModel::delays`; initialization only -- the
    /// delay's output starts at its input's initial value.
    DelaySeed(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RunStep {
    pub off: usize,
    pub body: StepBody,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledModel {
    pub layout: Vec<SlotInfo>,
    pub specs: SimSpecs,
    /// In stock evaluation order (drain-side before fill-side).
    pub stocks: Vec<CompiledStock>,
    /// Offsets of all flows.
    pub flows: Vec<usize>,
    pub graphicals: Vec<CompiledGraphicalFunction>,
    pub delays: Vec<CompiledDelay>,
    /// Total order over all computed-node slots: parameter
    /// dependencies, implicit-flow edges, and flow -> stock edges all
    /// point forward in it.
    pub eval_order: Vec<usize>,
    /// Warning-class issues from a successful compile.
    pub warnings: Vec<NodeIssue>,
    pub(crate) offsets: HashMap<Ident, usize>,
    pub(crate) runlist_init: Vec<RunStep>,
    pub(crate) runlist_step: Vec<RunStep>,
}

impl CompiledModel {
    pub fn n_slots(&self) -> usize {
        self.layout.len()
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.offsets.get(name).copied()
    }
}

fn slot_kind(ty: ObjectType) -> SlotKind {
    match ty {
        ObjectType::Stock => SlotKind::Stock,
        ObjectType::Flow => SlotKind::Flow,
        ObjectType::Auxiliary => SlotKind::Auxiliary,
        ObjectType::GraphicalFunction => SlotKind::GraphicalFunction,
        ObjectType::Delay => SlotKind::Delay,
        _ => unreachable!("only computed nodes own slots"),
    }
}

struct Binder<'a> {
    scope: &'a HashMap<&'a str, usize>,
}

impl Binder<'_> {
    fn lower(&self, expr: &ast::Expr) -> EquationResult<(Expr, Ty)> {
        let result = match expr {
            ast::Expr::Const(_, n, _) => (Expr::Const(*n), Ty::Real),
            ast::Expr::Var(id, loc) => match self.scope.get(id.as_str()) {
                Some(&off) => (Expr::Var(off), Ty::Real),
                None => {
                    return eqn_err!(UnknownVariable, loc.start, loc.end);
                }
            },
            ast::Expr::Op1(op, arg, _loc) => {
                let arg_expr = self.expect(arg, Ty::Real)?;
                match op {
                    ast::UnaryOp::Positive => (arg_expr, Ty::Real),
                    ast::UnaryOp::Negative => (
                        Expr::Op2(
                            BinaryOp::Sub,
                            Box::new(Expr::Const(0.0)),
                            Box::new(arg_expr),
                        ),
                        Ty::Real,
                    ),
                }
            }
            ast::Expr::Op2(op, l, r, _loc) => {
                let l = self.expect(l, Ty::Real)?;
                let r = self.expect(r, Ty::Real)?;
                let ty = if op.is_comparison() { Ty::Bool } else { Ty::Real };
                (Expr::Op2(*op, Box::new(l), Box::new(r)), ty)
            }
            ast::Expr::App(func, args, loc) => {
                macro_rules! arity {
                    ($n:expr) => {{
                        if args.len() != $n {
                            return eqn_err!(BadBuiltinArgs, loc.start, loc.end);
                        }
                    }};
                }
                macro_rules! variadic {
                    ($builtin_fn:tt, $ty:expr) => {{
                        if args.is_empty() {
                            return eqn_err!(BadBuiltinArgs, loc.start, loc.end);
                        }
                        let args: EquationResult<Vec<Expr>> =
                            args.iter().map(|arg| self.expect(arg, $ty)).collect();
                        (Expr::App(BuiltinFn::$builtin_fn(args?)), $ty)
                    }};
                }

                match func.as_str() {
                    "abs" => {
                        arity!(1);
                        let a = self.expect(&args[0], Ty::Real)?;
                        (Expr::App(BuiltinFn::Abs(Box::new(a))), Ty::Real)
                    }
                    "ceiling" => {
                        arity!(1);
                        let a = self.expect(&args[0], Ty::Real)?;
                        (Expr::App(BuiltinFn::Ceiling(Box::new(a))), Ty::Real)
                    }
                    "floor" => {
                        arity!(1);
                        let a = self.expect(&args[0], Ty::Real)?;
                        (Expr::App(BuiltinFn::Floor(Box::new(a))), Ty::Real)
                    }
                    "round" => {
                        arity!(1);
                        let a = self.expect(&args[0], Ty::Real)?;
                        (Expr::App(BuiltinFn::Round(Box::new(a))), Ty::Real)
                    }
                    "not" => {
                        arity!(1);
                        let a = self.expect(&args[0], Ty::Bool)?;
                        (Expr::App(BuiltinFn::Not(Box::new(a))), Ty::Bool)
                    }
                    "power" => {
                        arity!(2);
                        let a = self.expect(&args[0], Ty::Real)?;
                        let b = self.expect(&args[1], Ty::Real)?;
                        (
                            Expr::App(BuiltinFn::Power(Box::new(a), Box::new(b))),
                            Ty::Real,
                        )
                    }
                    "sum" => variadic!(Sum, Ty::Real),
                    "min" => variadic!(Min, Ty::Real),
                    "max" => variadic!(Max, Ty::Real),
                    "and" => variadic!(And, Ty::Bool),
                    "or" => variadic!(Or, Ty::Bool),
                    "if" => {
                        arity!(3);
                        let cond = self.expect(&args[0], Ty::Bool)?;
                        let t = self.expect(&args[1], Ty::Real)?;
                        let f = self.expect(&args[2], Ty::Real)?;
                        (
                            Expr::App(BuiltinFn::If(
                                Box::new(cond),
                                Box::new(t),
                                Box::new(f),
                            )),
                            Ty::Real,
                        )
                    }
                    _ => {
                        return eqn_err!(UnknownBuiltin, loc.start, loc.end);
                    }
                }
            }
        };
        Ok(result)
    }

    fn expect(&self, expr: &ast::Expr, want: Ty) -> EquationResult<Expr> {
        let (bound, ty) = self.lower(expr)?;
        if ty != want {
            let loc = expr.get_loc();
            return eqn_err!(TypeMismatch, loc.start, loc.end);
        }
        Ok(bound)
    }
}

/// Kahn topological sort over `nodes` with deterministic (ascending)
/// tie-breaking.  On a cycle the stuck nodes are returned as the error.
fn kahn(nodes: &[usize], edges: &[(usize, usize)]) -> Result<Vec<usize>, Vec<usize>> {
    let mut indegree: BTreeMap<usize, usize> = nodes.iter().map(|&n| (n, 0)).collect();
    let mut successors: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &(from, to) in edges.iter() {
        debug_assert!(indegree.contains_key(&from) && indegree.contains_key(&to));
        *indegree.get_mut(&to).unwrap() += 1;
        successors.entry(from).or_default().push(to);
    }

    let mut ready: BTreeSet<usize> = indegree
        .iter()
        .filter(|&(_, &n)| n == 0)
        .map(|(&node, _)| node)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(&node) = ready.iter().next() {
        ready.remove(&node);
        order.push(node);
        if let Some(succs) = successors.get(&node) {
            for &succ in succs.iter() {
                let n = indegree.get_mut(&succ).unwrap();
                *n -= 1;
                if *n == 0 {
                    ready.insert(succ);
                }
            }
        }
    }

    if order.len() == nodes.len() {
        Ok(order)
    } else {
        let done: BTreeSet<usize> = order.into_iter().collect();
        Err(nodes.iter().copied().filter(|n| !done.contains(n)).collect())
    }
}

struct NodeData {
    id: ObjectId,
    off: usize,
    ty: ObjectType,
    body: Option<StepBody>,
    initial: Option<StepBody>,
    /// Offsets of the computed nodes this node's value depends on.
    deps: BTreeSet<usize>,
}

pub fn compile(frame: &Frame) -> Result<CompiledModel, Vec<NodeIssue>> {
    let view = StockFlowView::new(frame);
    let mut issues: Vec<NodeIssue> = view.issues().to_vec();

    let computed = view.computed_nodes();

    // state layout: builtins first, then one slot per computed node
    let mut layout = vec![
        SlotInfo {
            ident: "time".to_owned(),
            kind: SlotKind::Time,
            object: None,
        },
        SlotInfo {
            ident: "time_delta".to_owned(),
            kind: SlotKind::TimeDelta,
            object: None,
        },
    ];
    debug_assert_eq!(IMPLICIT_VAR_COUNT, layout.len());
    let mut offsets: HashMap<Ident, usize> = HashMap::new();
    offsets.insert("time".to_owned(), TIME_OFF);
    offsets.insert("time_delta".to_owned(), DT_OFF);
    let mut node_off: HashMap<ObjectId, usize> = HashMap::new();
    for &id in computed.iter() {
        let obj = frame.get(id).unwrap();
        let off = layout.len();
        let ident = obj
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("unnamed_{id}"));
        layout.push(SlotInfo {
            ident: ident.clone(),
            kind: slot_kind(obj.ty),
            object: Some(id),
        });
        offsets.insert(ident, off);
        node_off.insert(id, off);
    }

    let mut graphicals: Vec<CompiledGraphicalFunction> = Vec::new();
    let mut delays: Vec<CompiledDelay> = Vec::new();
    let mut nodes: Vec<NodeData> = Vec::with_capacity(computed.len());

    for &id in computed.iter() {
        let obj = frame.get(id).unwrap();
        let off = node_off[&id];
        let ident = obj.name();
        let mut data = NodeData {
            id,
            off,
            ty: obj.ty,
            body: None,
            initial: None,
            deps: BTreeSet::new(),
        };

        match obj.ty {
            ObjectType::Stock | ObjectType::Flow | ObjectType::Auxiliary => {
                let text = match obj.attr_str("formula") {
                    Some(text) => text,
                    None => {
                        issues.push(NodeIssue::new(
                            id,
                            ident,
                            EquationError {
                                start: 0,
                                end: 0,
                                code: ErrorCode::EmptyEquation,
                            },
                        ));
                        nodes.push(data);
                        continue;
                    }
                };
                let parsed = match parser::parse(text) {
                    Ok(Some(expr)) => expr,
                    Ok(None) => {
                        issues.push(NodeIssue::new(
                            id,
                            ident,
                            EquationError {
                                start: 0,
                                end: 0,
                                code: ErrorCode::EmptyEquation,
                            },
                        ));
                        nodes.push(data);
                        continue;
                    }
                    Err(err) => {
                        issues.push(NodeIssue::new(id, ident, err));
                        nodes.push(data);
                        continue;
                    }
                };

                // names visible to this formula: builtins plus the
                // origins of incoming Parameter edges
                let mut scope: HashMap<&str, usize> = HashMap::new();
                scope.insert("time", TIME_OFF);
                scope.insert("time_delta", DT_OFF);
                let mut origin_offs: BTreeMap<&str, usize> = BTreeMap::new();
                for &origin in view.parameters(id) {
                    let origin_obj = frame.get(origin).unwrap();
                    match origin_obj.name() {
                        Some(name) => {
                            scope.insert(name, node_off[&origin]);
                            origin_offs.insert(name, node_off[&origin]);
                        }
                        None => {
                            issues.push(
                                NodeIssue::new(
                                    id,
                                    ident,
                                    EquationError {
                                        start: 0,
                                        end: 0,
                                        code: ErrorCode::BadStructure,
                                    },
                                )
                                .with_details(format!(
                                    "parameter origin #{origin} has no name"
                                )),
                            );
                        }
                    }
                }

                let mut used: BTreeSet<Ident> = BTreeSet::new();
                parsed.collect_idents(&mut used);
                for name in origin_offs.keys() {
                    if !used.contains(*name) {
                        issues.push(
                            NodeIssue::new(
                                id,
                                ident,
                                EquationError {
                                    start: 0,
                                    end: 0,
                                    code: ErrorCode::UnusedInput,
                                },
                            )
                            .with_details(format!("input '{name}' is never referenced")),
                        );
                    }
                }

                let binder = Binder { scope: &scope };
                match binder.lower(&parsed) {
                    Ok((expr, Ty::Real)) => {
                        data.deps = used
                            .iter()
                            .filter_map(|name| origin_offs.get(name.as_str()).copied())
                            .collect();
                        let body = StepBody::Formula(expr);
                        if obj.ty == ObjectType::Stock {
                            data.initial = Some(body);
                        } else {
                            data.initial = Some(body.clone());
                            data.body = Some(body);
                        }
                    }
                    Ok((_, Ty::Bool)) => {
                        let loc = parsed.get_loc();
                        issues.push(NodeIssue::new(
                            id,
                            ident,
                            EquationError {
                                start: loc.start,
                                end: loc.end,
                                code: ErrorCode::TypeMismatch,
                            },
                        ));
                    }
                    Err(err) => {
                        let details = text
                            .get(err.start as usize..err.end as usize)
                            .map(|s| s.to_owned());
                        let mut issue = NodeIssue::new(id, ident, err);
                        if let Some(details) = details {
                            issue = issue.with_details(details);
                        }
                        issues.push(issue);
                    }
                }
            }
            ObjectType::GraphicalFunction => {
                let params = view.parameters(id);
                if params.is_empty() {
                    issues.push(
                        NodeIssue::new(
                            id,
                            ident,
                            EquationError {
                                start: 0,
                                end: 0,
                                code: ErrorCode::BadStructure,
                            },
                        )
                        .with_details(
                            "graphical function requires an input parameter".to_owned(),
                        ),
                    );
                    nodes.push(data);
                    continue;
                }
                // fan-in > 1 was already reported by the view
                let input = node_off[&params[0]];
                let points = obj
                    .attr_points("graphical_function_points")
                    .map(|points| points.to_vec())
                    .unwrap_or_default();
                let interpolation = match obj.attr_str("interpolation_method") {
                    None => Interpolation::Step,
                    Some(method) => match Interpolation::from_attr(method) {
                        Some(interpolation) => interpolation,
                        None => {
                            eprintln!(
                                "warning, unknown interpolation '{method}', using 'step'"
                            );
                            Interpolation::Step
                        }
                    },
                };
                let index = graphicals.len();
                graphicals.push(CompiledGraphicalFunction {
                    off,
                    input,
                    points,
                    interpolation,
                });
                data.deps.insert(input);
                data.body = Some(StepBody::Graphical(index));
                data.initial = Some(StepBody::Graphical(index));
            }
            ObjectType::Delay => {
                let params = view.parameters(id);
                if params.len() != 1 {
                    issues.push(
                        NodeIssue::new(
                            id,
                            ident,
                            EquationError {
                                start: 0,
                                end: 0,
                                code: ErrorCode::BadStructure,
                            },
                        )
                        .with_details(
                            "delay requires exactly one input parameter".to_owned(),
                        ),
                    );
                    nodes.push(data);
                    continue;
                }
                let duration = match obj.attr_f64("delay_duration") {
                    Some(duration) if duration.is_finite() && duration >= 0.0 => duration,
                    _ => {
                        issues.push(
                            NodeIssue::new(
                                id,
                                ident,
                                EquationError {
                                    start: 0,
                                    end: 0,
                                    code: ErrorCode::BadStructure,
                                },
                            )
                            .with_details(
                                "delay_duration must be a non-negative number".to_owned(),
                            ),
                        );
                        nodes.push(data);
                        continue;
                    }
                };
                let kind = match obj.attr_str("delay_output_type") {
                    None => DelayKind::Delay1,
                    Some(kind) => match DelayKind::from_attr(kind) {
                        Some(kind) => kind,
                        None => {
                            eprintln!(
                                "warning, unknown delay output type '{kind}', using 'delay1'"
                            );
                            DelayKind::Delay1
                        }
                    },
                };
                let input = node_off[&params[0]];
                let index = delays.len();
                delays.push(CompiledDelay {
                    off,
                    input,
                    duration,
                    kind,
                });
                data.deps.insert(input);
                data.initial = Some(StepBody::DelaySeed(index));
                // at step time the output comes out of the buffer; no
                // in-step computation
            }
            _ => unreachable!("computed_nodes returns only computed nodes"),
        }

        nodes.push(data);
    }

    let by_off: HashMap<usize, &NodeData> = nodes.iter().map(|data| (data.off, data)).collect();
    let is_stock =
        |off: usize| matches!(by_off.get(&off), Some(data) if data.ty == ObjectType::Stock);

    // stock ordering along implicit flow edges
    let stock_order: Vec<ObjectId> = match view.sorted_stocks() {
        Ok(order) => order,
        Err(issue) => {
            issues.push(issue);
            view.stocks().to_vec()
        }
    };

    // per-stock flow lists, sorted by (priority, id)
    let flow_offsets = |mut flows: Vec<ObjectId>| -> SmallVec<[usize; 4]> {
        flows.sort_by_key(|&flow| (view.flow_priority(flow), flow));
        flows.iter().map(|flow| node_off[flow]).collect()
    };

    // the total evaluation order: parameter dependencies between
    // non-stock nodes, flow -> stock integration edges, and
    // implicit-flow edges between stocks (minus those into
    // delayed-inflow stocks, which read the previous step)
    let all_offs: Vec<usize> = nodes.iter().map(|data| data.off).collect();
    let mut step_edges: Vec<(usize, usize)> = Vec::new();
    for data in nodes.iter() {
        for &dep in data.deps.iter() {
            if !is_stock(dep) {
                step_edges.push((dep, data.off));
            }
        }
    }
    for &stock in stock_order.iter() {
        let off = node_off[&stock];
        for flow in view
            .stock_inflows(stock)
            .into_iter()
            .chain(view.stock_outflows(stock))
        {
            step_edges.push((node_off[&flow], off));
        }
    }
    for (from, to) in view.implicit_flow_edges() {
        if !view.delayed_inflow(to) {
            step_edges.push((node_off[&from], node_off[&to]));
        }
    }

    let eval_order = match kahn(&all_offs, &step_edges) {
        Ok(order) => order,
        Err(stuck) => {
            // a cycle purely among stocks was already reported by the
            // stock ordering; anything else is a formula cycle
            if stuck.iter().any(|&off| !is_stock(off)) {
                let names: Vec<&str> = stuck
                    .iter()
                    .map(|&off| layout[off].ident.as_str())
                    .collect();
                let first = stuck[0];
                issues.push(
                    NodeIssue::new(
                        by_off[&first].id,
                        Some(layout[first].ident.as_str()),
                        EquationError {
                            start: 0,
                            end: 0,
                            code: ErrorCode::FormulaCycle,
                        },
                    )
                    .with_details(names.join(", ")),
                );
            }
            Vec::new()
        }
    };

    // initialization order: stocks join the graph through their
    // initial expressions, delays through their inputs
    let init_edges: Vec<(usize, usize)> = nodes
        .iter()
        .flat_map(|data| data.deps.iter().map(|&dep| (dep, data.off)).collect::<Vec<_>>())
        .collect();
    let init_order = match kahn(&all_offs, &init_edges) {
        Ok(order) => order,
        Err(stuck) => {
            let names: Vec<&str> = stuck
                .iter()
                .map(|&off| layout[off].ident.as_str())
                .collect();
            let first = stuck[0];
            issues.push(
                NodeIssue::new(
                    by_off[&first].id,
                    Some(layout[first].ident.as_str()),
                    EquationError {
                        start: 0,
                        end: 0,
                        code: ErrorCode::FormulaCycle,
                    },
                )
                .with_details(names.join(", ")),
            );
            Vec::new()
        }
    };

    if issues.iter().any(|issue| !issue.is_warning()) {
        return Err(issues);
    }

    let runlist_init: Vec<RunStep> = init_order
        .iter()
        .filter_map(|&off| {
            let data = by_off[&off];
            data.initial.clone().map(|body| RunStep { off, body })
        })
        .collect();
    let runlist_step: Vec<RunStep> = eval_order
        .iter()
        .filter_map(|&off| {
            let data = by_off[&off];
            data.body.clone().map(|body| RunStep { off, body })
        })
        .collect();

    let stocks: Vec<CompiledStock> = stock_order
        .iter()
        .map(|&stock| {
            let off = node_off[&stock];
            let initial = match by_off[&off].initial {
                Some(StepBody::Formula(ref expr)) => expr.clone(),
                _ => unreachable!("stock formulas were checked above"),
            };
            CompiledStock {
                ident: layout[off].ident.clone(),
                off,
                initial,
                allows_negative: view.allows_negative(stock),
                delayed_inflow: view.delayed_inflow(stock),
                inflows: flow_offsets(view.stock_inflows(stock)),
                outflows: flow_offsets(view.stock_outflows(stock)),
            }
        })
        .collect();

    let flows: Vec<usize> = view.flows().iter().map(|flow| node_off[flow]).collect();

    let warnings = issues;
    Ok(CompiledModel {
        layout,
        specs: view.sim_specs(),
        stocks,
        flows,
        graphicals,
        delays,
        eval_order,
        warnings,
        offsets,
        runlist_init,
        runlist_step,
    })
}

/// Like [`compile`], but collapses a failed report into a single
/// model-level error for callers that do not need the per-node issue
/// list.
pub fn compile_strict(frame: &Frame) -> crate::common::Result<CompiledModel> {
    match compile(frame) {
        Ok(model) => Ok(model),
        Err(issues) => {
            let details: Vec<String> = issues.iter().map(|issue| issue.to_string()).collect();
            model_err!(NodesHaveErrors, details.join("; "))
        }
    }
}
