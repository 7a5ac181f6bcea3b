// Copyright 2026 The Flowsim Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use float_cmp::approx_eq;

use flowsim_engine::{
    AttrValue, ErrorCode, Frame, Method, ObjectId, ObjectType, Point, SimSpecs, Simulator,
    compile,
};

fn stock(frame: &mut Frame, name: &str, formula: &str) -> ObjectId {
    let id = frame.add_node(ObjectType::Stock, Some(name));
    frame.set_attr(id, "formula", AttrValue::String(formula.to_owned()));
    id
}

fn flow(frame: &mut Frame, name: &str, formula: &str) -> ObjectId {
    let id = frame.add_node(ObjectType::Flow, Some(name));
    frame.set_attr(id, "formula", AttrValue::String(formula.to_owned()));
    id
}

fn aux(frame: &mut Frame, name: &str, formula: &str) -> ObjectId {
    let id = frame.add_node(ObjectType::Auxiliary, Some(name));
    frame.set_attr(id, "formula", AttrValue::String(formula.to_owned()));
    id
}

fn param(frame: &mut Frame, origin: ObjectId, target: ObjectId) {
    frame.add_edge(ObjectType::Parameter, origin, target);
}

fn specs(initial_time: f64, time_delta: f64, steps: usize) -> SimSpecs {
    SimSpecs {
        initial_time,
        time_delta,
        steps,
    }
}

#[test]
fn simulate_bank_account() {
    let mut frame = Frame::new();
    let account = stock(&mut frame, "account", "100");
    let rate = aux(&mut frame, "rate", "0.02");
    let interest = aux(&mut frame, "interest", "account * rate");
    let fill = flow(&mut frame, "fill", "interest");
    param(&mut frame, rate, interest);
    param(&mut frame, account, interest);
    param(&mut frame, interest, fill);
    frame.add_edge(ObjectType::Fills, fill, account);

    let model = compile(&frame).unwrap();
    let mut sim = Simulator::new(&model, Method::Euler).with_specs(specs(0.0, 1.0, 10)).unwrap();
    sim.initialize();
    assert_eq!(10, sim.run_to_end());

    let results = sim.into_results();
    let got = results.value(10, "account").unwrap();
    assert!(
        approx_eq!(f64, 100.0 * 1.02f64.powi(10), got, epsilon = 1e-4),
        "account[10] = {got}"
    );
}

#[test]
fn simulate_two_tank_drain() {
    let mut frame = Frame::new();
    let a = stock(&mut frame, "a", "100");
    let b = stock(&mut frame, "b", "0");
    let f = flow(&mut frame, "f", "10");
    frame.add_edge(ObjectType::Drains, a, f);
    frame.add_edge(ObjectType::Fills, f, b);

    let model = compile(&frame).unwrap();
    let mut sim = Simulator::new(&model, Method::Euler).with_specs(specs(0.0, 1.0, 20)).unwrap();
    sim.initialize();
    sim.run_to_end();

    let results = sim.into_results();
    assert_eq!(Some(0.0), results.value(10, "a"));
    // the stock never goes negative...
    for step in 0..=20 {
        assert!(results.value(step, "a").unwrap() >= 0.0);
    }
    // ...and the denied outflow does not keep filling b
    assert_eq!(Some(100.0), results.value(20, "b"));
    assert!(results.non_finite().is_empty());
}

#[test]
fn outflow_priority_rations_a_dry_stock() {
    // two outflows want 60 each out of 100: the lower-priority flow
    // drains in full, the higher-priority flow is denied the
    // remainder, and each sink receives exactly what was granted
    let mut frame = Frame::new();
    let tank = stock(&mut frame, "tank", "100");
    let low_sink = stock(&mut frame, "low_sink", "0");
    let high_sink = stock(&mut frame, "high_sink", "0");
    let low = flow(&mut frame, "low", "60");
    let high = flow(&mut frame, "high", "60");
    frame.set_attr(low, "priority", AttrValue::Int(1));
    frame.set_attr(high, "priority", AttrValue::Int(2));
    frame.add_edge(ObjectType::Drains, tank, low);
    frame.add_edge(ObjectType::Fills, low, low_sink);
    frame.add_edge(ObjectType::Drains, tank, high);
    frame.add_edge(ObjectType::Fills, high, high_sink);

    let model = compile(&frame).unwrap();
    let mut sim = Simulator::new(&model, Method::Euler).with_specs(specs(0.0, 1.0, 2)).unwrap();
    sim.initialize();
    sim.run_to_end();

    let results = sim.into_results();
    assert_eq!(Some(0.0), results.value(1, "tank"));
    assert_eq!(Some(60.0), results.value(1, "low_sink"));
    assert_eq!(Some(40.0), results.value(1, "high_sink"));
    // a dry tank grants nothing on the next step
    assert_eq!(Some(0.0), results.value(2, "tank"));
    assert_eq!(Some(60.0), results.value(2, "low_sink"));
    assert_eq!(Some(40.0), results.value(2, "high_sink"));
}

/// Predator-prey, integrated with RK4.  The rates put the equilibrium
/// near the initial populations, so the run traces a clean cycle:
/// both stocks stay strictly positive and the shark peak trails the
/// fish peak by about a quarter period.
#[test]
fn simulate_lotka_volterra() {
    let mut frame = Frame::new();
    let fish = stock(&mut frame, "fish", "1000");
    let shark = stock(&mut frame, "shark", "10");

    let births = flow(&mut frame, "fish_births", "fish * 0.1");
    let caught = flow(&mut frame, "fish_caught", "0.1 * fish * shark / 10.5");
    let spawned = flow(&mut frame, "shark_spawned", "0.1 * fish * shark / 950");
    let starved = flow(&mut frame, "shark_starved", "shark * 0.1");

    frame.add_edge(ObjectType::Fills, births, fish);
    frame.add_edge(ObjectType::Drains, fish, caught);
    frame.add_edge(ObjectType::Fills, spawned, shark);
    frame.add_edge(ObjectType::Drains, shark, starved);

    param(&mut frame, fish, births);
    param(&mut frame, fish, caught);
    param(&mut frame, shark, caught);
    param(&mut frame, fish, spawned);
    param(&mut frame, shark, spawned);
    param(&mut frame, shark, starved);

    let model = compile(&frame).unwrap();
    let dt = 0.1;
    let mut sim = Simulator::new(&model, Method::RungeKutta4).with_specs(specs(0.0, dt, 1000)).unwrap();
    sim.initialize();
    sim.run_to_end();

    let results = sim.into_results();
    assert_eq!(1001, results.step_count);

    for name in ["fish", "shark"] {
        for step in 0..results.step_count {
            let value = results.value(step, name).unwrap();
            assert!(value > 0.0, "{name} must stay positive, step {step}");
        }
    }

    // linearized period 2*pi/sqrt(0.1 * 0.1) ~= 62.8; search within
    // the first cycle so the second fish peak cannot shadow the first
    let period = 2.0 * std::f64::consts::PI / 0.1;
    let first_cycle = (period / dt) as usize;
    let peak_of = |name: &str| -> usize {
        let mut peak_step = 0;
        let mut peak = f64::MIN;
        for step in 0..first_cycle.min(results.step_count) {
            let value = results.value(step, name).unwrap();
            if value > peak {
                peak = value;
                peak_step = step;
            }
        }
        peak_step
    };

    let fish_peak = peak_of("fish");
    let shark_peak = peak_of("shark");
    assert!(shark_peak > fish_peak);

    // the shark peak should lag the fish peak by roughly a quarter
    // period
    let lag = (shark_peak - fish_peak) as f64 * dt;
    assert!(
        lag > 0.15 * period && lag < 0.35 * period,
        "lag {lag} vs period {period}"
    );
}

#[test]
fn stock_cycle_without_delay_fails_to_compile() {
    let mut frame = Frame::new();
    let a = stock(&mut frame, "a", "100");
    let b = stock(&mut frame, "b", "0");
    let forward = flow(&mut frame, "forward", "10");
    let back = flow(&mut frame, "back", "10");
    frame.add_edge(ObjectType::Drains, a, forward);
    frame.add_edge(ObjectType::Fills, forward, b);
    frame.add_edge(ObjectType::Drains, b, back);
    frame.add_edge(ObjectType::Fills, back, a);

    let issues = compile(&frame).unwrap_err();
    let cycle = issues
        .iter()
        .find(|issue| issue.error.code == ErrorCode::UnresolvedStockCycle)
        .expect("expected an unresolved stock cycle");
    assert_eq!(Some("a, b".to_owned()), cycle.details);

    // marking one stock delayed breaks the cycle
    frame.set_attr(a, "delayed_inflow", AttrValue::Bool(true));
    assert!(compile(&frame).is_ok());
}

#[test]
fn unknown_name_is_reported_per_node() {
    let mut frame = Frame::new();
    let broken = aux(&mut frame, "broken", "foo + 1");
    aux(&mut frame, "fine", "2 + 2");

    let issues = compile(&frame).unwrap_err();
    assert_eq!(1, issues.len());
    assert_eq!(ErrorCode::UnknownVariable, issues[0].error.code);
    assert_eq!(broken, issues[0].id);
    assert_eq!(Some("foo".to_owned()), issues[0].details);
}

#[test]
fn graphical_function_step_lookup() {
    let eval_gf = |input: &str| -> f64 {
        let mut frame = Frame::new();
        let src = aux(&mut frame, "src", input);
        let gf = frame.add_node(ObjectType::GraphicalFunction, Some("table"));
        frame.set_attr(
            gf,
            "graphical_function_points",
            AttrValue::Points(vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 1.0, y: 10.0 },
                Point { x: 2.0, y: 20.0 },
            ]),
        );
        frame.add_edge(ObjectType::Parameter, src, gf);

        let model = compile(&frame).unwrap();
        let mut sim = Simulator::new(&model, Method::Euler).with_specs(specs(0.0, 1.0, 1)).unwrap();
        sim.initialize();
        sim.history().value(0, "table").unwrap()
    };

    assert_eq!(10.0, eval_gf("0.6"));
    assert_eq!(0.0, eval_gf("0.4"));
}

#[test]
fn evaluation_order_is_topologically_sound() {
    let mut frame = Frame::new();
    let a = stock(&mut frame, "upstream", "50");
    let b = stock(&mut frame, "downstream", "0");
    let rate = aux(&mut frame, "rate", "0.5");
    let f = flow(&mut frame, "transfer", "upstream * rate");
    param(&mut frame, a, f);
    param(&mut frame, rate, f);
    frame.add_edge(ObjectType::Drains, a, f);
    frame.add_edge(ObjectType::Fills, f, b);

    let model = compile(&frame).unwrap();
    let index_of = |name: &str| {
        let off = model.offset_of(name).unwrap();
        model
            .eval_order
            .iter()
            .position(|&slot| slot == off)
            .unwrap()
    };

    // parameter dependency: rate feeds the flow
    assert!(index_of("rate") < index_of("transfer"));
    // flow -> stock: the flow is known before either stock integrates
    assert!(index_of("transfer") < index_of("upstream"));
    assert!(index_of("transfer") < index_of("downstream"));
    // implicit flow edge: drain-side stock before fill-side stock
    assert!(index_of("upstream") < index_of("downstream"));
}

#[test]
fn histories_are_bit_identical() {
    let mut frame = Frame::new();
    let tank = stock(&mut frame, "tank", "100");
    let out = flow(&mut frame, "leak", "tank * 0.3");
    param(&mut frame, tank, out);
    frame.add_edge(ObjectType::Drains, tank, out);

    let model = compile(&frame).unwrap();
    let run = |method: Method| {
        let mut sim = Simulator::new(&model, method).with_specs(specs(0.0, 0.25, 64)).unwrap();
        sim.initialize();
        sim.run_to_end();
        sim.into_results()
    };

    for method in [Method::Euler, Method::RungeKutta4] {
        let a = run(method);
        let b = run(method);
        assert_eq!(a.step_count, b.step_count);
        let identical = a
            .data
            .iter()
            .zip(b.data.iter())
            .all(|(x, y)| x.to_bits() == y.to_bits());
        assert!(identical);
    }
}

#[test]
fn rk4_matches_exponential_growth_closely() {
    // du/dt = u, u(0) = 1: RK4 at dt=0.1 should track e^t far better
    // than Euler does
    let build = || {
        let mut frame = Frame::new();
        let u = stock(&mut frame, "u", "1");
        let growth = flow(&mut frame, "growth", "u");
        param(&mut frame, u, growth);
        frame.add_edge(ObjectType::Fills, growth, u);
        frame
    };

    let model = compile(&build()).unwrap();
    let run = |method: Method| {
        let mut sim = Simulator::new(&model, method).with_specs(specs(0.0, 0.1, 10)).unwrap();
        sim.initialize();
        sim.run_to_end();
        sim.into_results().value(10, "u").unwrap()
    };

    let exact = 1.0f64.exp();
    let rk4 = run(Method::RungeKutta4);
    let euler = run(Method::Euler);
    assert!((rk4 - exact).abs() < 1e-5, "rk4 {rk4} vs {exact}");
    assert!((euler - exact).abs() > 1e-3, "euler should be coarser");
    assert!((rk4 - exact).abs() < (euler - exact).abs());
}

#[test]
fn halted_run_reports_executed_steps() {
    let mut frame = Frame::new();
    stock(&mut frame, "level", "5");

    let model = compile(&frame).unwrap();
    let mut sim = Simulator::new(&model, Method::Euler).with_specs(specs(0.0, 1.0, 100)).unwrap();
    sim.initialize();
    assert_eq!(30, sim.run(30));
    sim.set_halted(true);
    assert_eq!(0, sim.run(30));
    sim.set_halted(false);
    assert_eq!(70, sim.run_to_end());
}

#[test]
fn layout_names_every_slot() {
    let mut frame = Frame::new();
    let tank = stock(&mut frame, "tank", "1");
    let leak = flow(&mut frame, "leak", "0.5");
    frame.add_edge(ObjectType::Drains, tank, leak);

    let model = compile(&frame).unwrap();
    let names: Vec<&str> = model
        .layout
        .iter()
        .map(|slot| slot.ident.as_str())
        .collect();
    assert_eq!("time", names[0]);
    assert_eq!("time_delta", names[1]);
    assert!(names.contains(&"tank"));
    assert!(names.contains(&"leak"));
    for slot in model.layout.iter().skip(2) {
        assert!(slot.object.is_some());
    }
}
