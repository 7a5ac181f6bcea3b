// Copyright 2026 The Flowsim Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Owns the run: seeds the state vector, drives the solver one step at
//! a time, shifts delay buffers, and records every committed row.

use std::collections::HashMap;

use float_cmp::approx_eq;

use crate::common::{Ident, Result};
use crate::compiler::{CompiledModel, DT_OFF, TIME_OFF};
use crate::frame::SimSpecs;
use crate::solver::{self, Method, SolverScratch, eval_runlist};

/// The recorded history of a run: one row per committed step, aligned
/// to the model's state layout.
#[derive(Clone, Debug)]
pub struct Results {
    pub offsets: HashMap<Ident, usize>,
    // one large allocation
    pub data: Box<[f64]>,
    pub step_size: usize,
    pub step_count: usize,
    pub specs: SimSpecs,
    non_finite: Vec<(usize, usize)>,
}

impl Results {
    pub fn iter(&self) -> std::iter::Take<std::slice::Chunks<'_, f64>> {
        self.data.chunks(self.step_size).take(self.step_count)
    }

    pub fn row(&self, step: usize) -> Option<&[f64]> {
        if step >= self.step_count {
            return None;
        }
        Some(&self.data[step * self.step_size..(step + 1) * self.step_size])
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.offsets.get(name).copied()
    }

    pub fn value(&self, step: usize, name: &str) -> Option<f64> {
        let off = self.offset_of(name)?;
        self.row(step).map(|row| row[off])
    }

    /// `(step, state-index)` pairs for every committed slot that held a
    /// NaN or infinity.
    pub fn non_finite(&self) -> &[(usize, usize)] {
        &self.non_finite
    }

    pub fn non_finite_at(&self, step: usize) -> impl Iterator<Item = usize> + '_ {
        self.non_finite
            .iter()
            .filter(move |(s, _)| *s == step)
            .map(|(_, off)| *off)
    }

    pub fn print_tsv(&self) {
        let var_names = {
            let offset_name_map: HashMap<usize, &Ident> =
                self.offsets.iter().map(|(k, v)| (*v, k)).collect();
            let mut var_names: Vec<&str> = Vec::with_capacity(self.step_size);
            for i in 0..(self.step_size) {
                let name = offset_name_map
                    .get(&i)
                    .map(|id| id.as_str())
                    .unwrap_or("UNKNOWN");
                var_names.push(name);
            }
            var_names
        };

        for (i, id) in var_names.iter().enumerate() {
            print!("{id}");
            if i == var_names.len() - 1 {
                println!();
            } else {
                print!("\t");
            }
        }

        for curr in self.iter() {
            for (i, val) in curr.iter().enumerate() {
                print!("{val}");
                if i == var_names.len() - 1 {
                    println!();
                } else {
                    print!("\t");
                }
            }
        }
    }
}

struct DelayBuffer {
    data: Box<[f64]>,
    pos: usize,
}

/// FIFO depth for a delay: `ceil(duration / dt)`, with an epsilon
/// guard so an exact multiple does not round up, and at least one
/// slot.
fn delay_depth(duration: f64, dt: f64) -> usize {
    let steps = duration / dt;
    let rounded = steps.round();
    let steps = if approx_eq!(f64, steps, rounded, ulps = 4) {
        rounded
    } else {
        steps.ceil()
    };
    (steps as usize).max(1)
}

pub struct Simulator<'a> {
    model: &'a CompiledModel,
    method: Method,
    specs: SimSpecs,
    data: Vec<f64>,
    step_count: usize,
    delay_bufs: Vec<DelayBuffer>,
    scratch: SolverScratch,
    next_row: Box<[f64]>,
    non_finite: Vec<(usize, usize)>,
    halted: bool,
}

impl<'a> Simulator<'a> {
    pub fn new(model: &'a CompiledModel, method: Method) -> Self {
        Simulator {
            model,
            method,
            specs: model.specs,
            data: Vec::new(),
            step_count: 0,
            delay_bufs: Vec::new(),
            scratch: SolverScratch::new(model),
            next_row: vec![0.0; model.n_slots()].into_boxed_slice(),
            non_finite: Vec::new(),
            halted: false,
        }
    }

    /// Overrides the frame's simulation defaults for this run.
    pub fn with_specs(mut self, specs: SimSpecs) -> Result<Self> {
        if !(specs.time_delta.is_finite() && specs.time_delta > 0.0) {
            return sim_err!(
                BadSimSpecs,
                format!("time_delta must be positive, got {}", specs.time_delta)
            );
        }
        self.specs = specs;
        Ok(self)
    }

    /// Allocates the run's storage and seeds the state at the initial
    /// time: every initial expression in dependency order, delay
    /// buffers prefilled with their input's initial value.
    pub fn initialize(&mut self) -> &[f64] {
        let n = self.model.n_slots();
        self.halted = false;
        self.step_count = 0;
        self.non_finite.clear();
        self.data.clear();
        self.data.reserve_exact((self.specs.steps + 1) * n);

        self.data.resize(n, 0.0);
        let row = &mut self.data[0..n];
        row[TIME_OFF] = self.specs.initial_time;
        row[DT_OFF] = self.specs.time_delta;
        eval_runlist(self.model, &self.model.runlist_init, row);

        self.delay_bufs.clear();
        for delay in self.model.delays.iter() {
            let depth = delay_depth(delay.duration, self.specs.time_delta);
            let initial = self.data[delay.input];
            self.delay_bufs.push(DelayBuffer {
                data: vec![initial; depth].into_boxed_slice(),
                pos: 0,
            });
        }

        self.step_count = 1;
        self.flag_non_finite(0);
        &self.data[0..n]
    }

    fn flag_non_finite(&mut self, step: usize) {
        let n = self.model.n_slots();
        let row = &self.data[step * n..(step + 1) * n];
        for (off, value) in row.iter().enumerate() {
            if !value.is_finite() {
                self.non_finite.push((step, off));
            }
        }
    }

    /// One integration step: stocks advance from the current row's
    /// flow values, delay buffers shift, and every non-stock node is
    /// recomputed at the new time.  Runtime errors never escape; a
    /// non-finite value is committed and flagged on the row.
    pub fn step(&mut self) -> &[f64] {
        if self.step_count == 0 {
            self.initialize();
        }
        let n = self.model.n_slots();
        let curr_start = (self.step_count - 1) * n;
        let prev_start = if self.step_count >= 2 {
            (self.step_count - 2) * n
        } else {
            curr_start
        };

        {
            let curr = &self.data[curr_start..curr_start + n];
            let prev = &self.data[prev_start..prev_start + n];
            let next = &mut self.next_row;
            next.copy_from_slice(curr);
            next[TIME_OFF] = curr[TIME_OFF] + curr[DT_OFF];
            solver::step(self.method, self.model, prev, curr, next, &mut self.scratch);
        }

        // shift delays: write the newest input, then the slot under
        // the cursor is the oldest buffered value and becomes the
        // output at the new time
        for (i, delay) in self.model.delays.iter().enumerate() {
            let input_now = self.data[curr_start + delay.input];
            let buf = &mut self.delay_bufs[i];
            buf.data[buf.pos] = input_now;
            buf.pos = (buf.pos + 1) % buf.data.len();
            self.next_row[delay.off] = buf.data[buf.pos];
        }

        eval_runlist(self.model, &self.model.runlist_step, &mut self.next_row);

        self.data.extend_from_slice(&self.next_row);
        let step = self.step_count;
        self.step_count += 1;
        self.flag_non_finite(step);
        &self.data[step * n..(step + 1) * n]
    }

    /// Runs up to `n` steps, stopping early if halted.  Returns the
    /// number of steps actually executed.
    pub fn run(&mut self, n: usize) -> usize {
        if self.step_count == 0 {
            self.initialize();
        }
        let mut executed = 0;
        for _ in 0..n {
            if self.halted {
                break;
            }
            self.step();
            executed += 1;
        }
        executed
    }

    /// Runs until the configured number of steps have been committed.
    pub fn run_to_end(&mut self) -> usize {
        if self.step_count == 0 {
            self.initialize();
        }
        let remaining = (self.specs.steps + 1).saturating_sub(self.step_count);
        self.run(remaining)
    }

    pub fn reset(&mut self) -> &[f64] {
        self.initialize()
    }

    pub fn set_halted(&mut self, halted: bool) {
        self.halted = halted;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Committed rows so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn time(&self) -> f64 {
        if self.step_count == 0 {
            return self.specs.initial_time;
        }
        let n = self.model.n_slots();
        self.data[(self.step_count - 1) * n + TIME_OFF]
    }

    pub fn row(&self, step: usize) -> Option<&[f64]> {
        if step >= self.step_count {
            return None;
        }
        let n = self.model.n_slots();
        Some(&self.data[step * n..(step + 1) * n])
    }

    /// A copy of the history recorded so far.
    pub fn history(&self) -> Results {
        Results {
            offsets: self.model.offsets.clone(),
            data: self.data.clone().into_boxed_slice(),
            step_size: self.model.n_slots(),
            step_count: self.step_count,
            specs: self.specs,
            non_finite: self.non_finite.clone(),
        }
    }

    /// The history, without copying the rows.
    pub fn into_results(self) -> Results {
        Results {
            offsets: self.model.offsets.clone(),
            data: self.data.into_boxed_slice(),
            step_size: self.model.n_slots(),
            step_count: self.step_count,
            specs: self.specs,
            non_finite: self.non_finite,
        }
    }
}
