// Copyright 2026 The Flowsim Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

use crate::frame::ObjectId;

pub type Ident = String;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoError, // will never be produced
    InvalidToken,
    UnrecognizedEof,
    UnrecognizedToken,
    ExtraToken,
    UnclosedParen,
    MissingOperand,
    ExpectedNumber,
    EmptyEquation,
    UnknownVariable,
    UnknownBuiltin,
    BadBuiltinArgs,
    TypeMismatch,
    UnusedInput,
    DuplicateName,
    FormulaCycle,
    UnresolvedStockCycle,
    BadStructure,
    BadSimSpecs,
    NodesHaveErrors,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            NoError => "no_error",
            InvalidToken => "invalid_token",
            UnrecognizedEof => "unrecognized_eof",
            UnrecognizedToken => "unrecognized_token",
            ExtraToken => "extra_token",
            UnclosedParen => "unclosed_paren",
            MissingOperand => "missing_operand",
            ExpectedNumber => "expected_number",
            EmptyEquation => "empty_equation",
            UnknownVariable => "unknown_variable",
            UnknownBuiltin => "unknown_builtin",
            BadBuiltinArgs => "bad_builtin_args",
            TypeMismatch => "type_mismatch",
            UnusedInput => "unused_input",
            DuplicateName => "duplicate_name",
            FormulaCycle => "formula_cycle",
            UnresolvedStockCycle => "unresolved_stock_cycle",
            BadStructure => "bad_structure",
            BadSimSpecs => "bad_sim_specs",
            NodesHaveErrors => "nodes_have_errors",
        };

        write!(f, "{name}")
    }
}

/// An error located within a single formula string.  Formulas are typed
/// by humans for a single node -- u16 is long enough for positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EquationError {
    pub start: u16,
    pub end: u16,
    pub code: ErrorCode,
}

impl fmt::Display for EquationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.end, self.code)
    }
}

#[macro_export]
macro_rules! eqn_err(
    ($code:tt, $start:expr, $end:expr) => {{
        use $crate::common::{EquationError, ErrorCode};
        Err(EquationError{ start: $start as u16, end: $end as u16, code: ErrorCode::$code})
    }}
);

#[macro_export]
macro_rules! model_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error{
            kind: ErrorKind::Model,
            code: ErrorCode::$code,
            details: Some($str),
        })
    }}
);

#[macro_export]
macro_rules! sim_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error {
            kind: ErrorKind::Simulation,
            code: ErrorCode::$code,
            details: Some($str),
        })
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error {
            kind: ErrorKind::Simulation,
            code: ErrorCode::$code,
            details: None,
        })
    }};
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Model,
    Simulation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Model => "ModelError",
            ErrorKind::Simulation => "SimulationError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

/// A compile problem attached to a specific object in the frame.  The
/// compiler accumulates these across all nodes rather than bailing on
/// the first one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeIssue {
    pub id: ObjectId,
    pub ident: Option<Ident>,
    pub error: EquationError,
    pub details: Option<String>,
}

impl NodeIssue {
    pub fn new(id: ObjectId, ident: Option<&str>, error: EquationError) -> Self {
        NodeIssue {
            id,
            ident: ident.map(|s| s.to_owned()),
            error,
            details: None,
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    /// Warnings are carried in the compile report but do not fail
    /// compilation on their own.
    pub fn is_warning(&self) -> bool {
        self.error.code == ErrorCode::UnusedInput
    }
}

impl fmt::Display for NodeIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ident = self.ident.as_deref().unwrap_or("<unnamed>");
        match self.details {
            Some(ref details) => write!(f, "{}#{}: {} ({})", ident, self.id, self.error, details),
            None => write!(f, "{}#{}: {}", ident, self.id, self.error),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
pub type EquationResult<T> = result::Result<T, EquationError>;
