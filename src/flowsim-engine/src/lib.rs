// Copyright 2026 The Flowsim Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

#[macro_use]
pub mod common;
pub mod ast;
mod builtins;
pub mod compiler;
pub mod frame;
mod parser;
pub mod sim;
mod solver;
mod token;
pub mod view;

#[cfg(test)]
mod testutils;

pub use self::ast::print_eqn;
pub use self::common::{EquationError, Error, ErrorCode, ErrorKind, Ident, NodeIssue, Result};
pub use self::compiler::{CompiledModel, SlotInfo, SlotKind, compile, compile_strict};
pub use self::frame::{AttrValue, Frame, Object, ObjectId, ObjectType, Point, SimSpecs};
pub use self::sim::{Results, Simulator};
pub use self::solver::Method;
