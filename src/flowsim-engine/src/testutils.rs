// Copyright 2026 The Flowsim Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::frame::{AttrValue, Frame, ObjectId, ObjectType};

pub(crate) fn x_stock(frame: &mut Frame, name: &str, formula: &str) -> ObjectId {
    let id = frame.add_node(ObjectType::Stock, Some(name));
    frame.set_attr(id, "formula", AttrValue::String(formula.to_owned()));
    id
}

pub(crate) fn x_flow(frame: &mut Frame, name: &str, formula: &str) -> ObjectId {
    let id = frame.add_node(ObjectType::Flow, Some(name));
    frame.set_attr(id, "formula", AttrValue::String(formula.to_owned()));
    id
}

pub(crate) fn x_aux(frame: &mut Frame, name: &str, formula: &str) -> ObjectId {
    let id = frame.add_node(ObjectType::Auxiliary, Some(name));
    frame.set_attr(id, "formula", AttrValue::String(formula.to_owned()));
    id
}

pub(crate) fn x_param(frame: &mut Frame, origin: ObjectId, target: ObjectId) -> ObjectId {
    frame.add_edge(ObjectType::Parameter, origin, target)
}

pub(crate) fn x_drains(frame: &mut Frame, stock: ObjectId, flow: ObjectId) -> ObjectId {
    frame.add_edge(ObjectType::Drains, stock, flow)
}

pub(crate) fn x_fills(frame: &mut Frame, flow: ObjectId, stock: ObjectId) -> ObjectId {
    frame.add_edge(ObjectType::Fills, flow, stock)
}

pub(crate) fn x_sim_specs(frame: &mut Frame, initial_time: f64, time_delta: f64, steps: i64) {
    let sim = frame.add_node(ObjectType::Simulation, None);
    frame.set_attr(sim, "initial_time", AttrValue::Float(initial_time));
    frame.set_attr(sim, "time_delta", AttrValue::Float(time_delta));
    frame.set_attr(sim, "steps", AttrValue::Int(steps));
}

/// Compound interest: `account` integrates a `fill` flow computed from
/// an `interest` auxiliary.
pub(crate) fn bank_account() -> Frame {
    let mut frame = Frame::new();
    let account = x_stock(&mut frame, "account", "100");
    let rate = x_aux(&mut frame, "rate", "0.02");
    let interest = x_aux(&mut frame, "interest", "account * rate");
    let fill = x_flow(&mut frame, "fill", "interest");
    x_param(&mut frame, rate, interest);
    x_param(&mut frame, account, interest);
    x_param(&mut frame, interest, fill);
    x_fills(&mut frame, fill, account);
    frame
}

/// `a` drains into `b` at a constant rate.
pub(crate) fn two_tank() -> Frame {
    let mut frame = Frame::new();
    let a = x_stock(&mut frame, "a", "100");
    let b = x_stock(&mut frame, "b", "0");
    let f = x_flow(&mut frame, "f", "10");
    x_drains(&mut frame, a, f);
    x_fills(&mut frame, f, b);
    frame
}

/// Two stocks passing quantity around a loop.  Legal only when one of
/// them reads its inflow with a one-step delay.
pub(crate) fn stock_cycle(delayed: bool) -> Frame {
    let mut frame = Frame::new();
    let a = x_stock(&mut frame, "a", "100");
    let b = x_stock(&mut frame, "b", "0");
    let forward = x_flow(&mut frame, "forward", "10");
    let back = x_flow(&mut frame, "back", "10");
    x_drains(&mut frame, a, forward);
    x_fills(&mut frame, forward, b);
    x_drains(&mut frame, b, back);
    x_fills(&mut frame, back, a);
    if delayed {
        frame.set_attr(a, "delayed_inflow", AttrValue::Bool(true));
    }
    frame
}
