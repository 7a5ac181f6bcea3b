// Copyright 2026 The Flowsim Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeSet;

use crate::common::Ident;

// formulas are strings typed by humans for a single
// node -- u16 is long enough
#[derive(PartialEq, Clone, Copy, Debug, Default)]
pub struct Loc {
    pub start: u16,
    pub end: u16,
}

impl Loc {
    pub fn new(start: usize, end: usize) -> Self {
        Loc {
            start: start as u16,
            end: end as u16,
        }
    }

    pub fn union(&self, rhs: &Self) -> Self {
        Loc {
            start: self.start.min(rhs.start),
            end: self.end.max(rhs.end),
        }
    }
}

// we use Boxes here because we may walk and update ASTs a number of
// times, and we want to avoid copying and reallocating subexpressions
// all over the place.
#[derive(PartialEq, Clone, Debug)]
pub enum Expr {
    Const(String, f64, Loc),
    Var(Ident, Loc),
    App(Ident, Vec<Expr>, Loc),
    Op1(UnaryOp, Box<Expr>, Loc),
    Op2(BinaryOp, Box<Expr>, Box<Expr>, Loc),
}

impl Expr {
    pub fn get_loc(&self) -> Loc {
        match self {
            Expr::Const(_, _, loc) => *loc,
            Expr::Var(_, loc) => *loc,
            Expr::App(_, _, loc) => *loc,
            Expr::Op1(_, _, loc) => *loc,
            Expr::Op2(_, _, _, loc) => *loc,
        }
    }

    /// Collects the names of all variables referenced by this
    /// expression.  Callees of function applications are not variable
    /// references.
    pub(crate) fn collect_idents(&self, idents: &mut BTreeSet<Ident>) {
        match self {
            Expr::Const(_, _, _) => {}
            Expr::Var(id, _) => {
                idents.insert(id.clone());
            }
            Expr::App(_, args, _) => {
                for arg in args.iter() {
                    arg.collect_idents(idents);
                }
            }
            Expr::Op1(_, r, _) => r.collect_idents(idents),
            Expr::Op2(_, l, r, _) => {
                l.collect_idents(idents);
                r.collect_idents(idents);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn strip_loc(self) -> Self {
        let loc = Loc::default();
        match self {
            Expr::Const(s, n, _loc) => Expr::Const(s, n, loc),
            Expr::Var(v, _loc) => Expr::Var(v, loc),
            Expr::App(func, args, _loc) => Expr::App(
                func,
                args.into_iter().map(|arg| arg.strip_loc()).collect(),
                loc,
            ),
            Expr::Op1(op, r, _loc) => Expr::Op1(op, Box::new(r.strip_loc()), loc),
            Expr::Op2(op, l, r, _loc) => {
                Expr::Op2(op, Box::new(l.strip_loc()), Box::new(r.strip_loc()), loc)
            }
        }
    }
}

impl Default for Expr {
    fn default() -> Self {
        Expr::Const("0.0".to_string(), 0.0, Loc::default())
    }
}

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Neq,
}

impl BinaryOp {
    pub(crate) fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Gt | BinaryOp::Lt | BinaryOp::Gte | BinaryOp::Lte | BinaryOp::Eq | BinaryOp::Neq
        )
    }
}

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum UnaryOp {
    Positive,
    Negative,
}

fn child_needs_parens(parent: &Expr, child: &Expr) -> bool {
    match parent {
        // no children so doesn't matter
        Expr::Const(_, _, _) | Expr::Var(_, _) => false,
        // children are comma separated, so no ambiguity possible
        Expr::App(_, _, _) => false,
        Expr::Op1(_, _, _) => matches!(child, Expr::Op2(_, _, _, _)),
        // Op2 renders itself fully parenthesized
        Expr::Op2(_, _, _, _) => false,
    }
}

fn paren_if_necessary(parent: &Expr, child: &Expr, eqn: String) -> String {
    if child_needs_parens(parent, child) {
        format!("({eqn})")
    } else {
        eqn
    }
}

struct PrintVisitor {}

impl PrintVisitor {
    fn walk(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Const(s, _, _) => s.clone(),
            Expr::Var(id, _) => id.clone(),
            Expr::App(func, args, _) => {
                let args: Vec<String> = args.iter().map(|e| self.walk(e)).collect();
                format!("{}({})", func, args.join(", "))
            }
            Expr::Op1(op, l, _) => {
                let l = paren_if_necessary(expr, l, self.walk(l));
                let op: &str = match op {
                    UnaryOp::Positive => "+",
                    UnaryOp::Negative => "-",
                };
                format!("{op}{l}")
            }
            Expr::Op2(op, l, r, _) => {
                let l = self.walk(l);
                let r = self.walk(r);
                let op: &str = match op {
                    BinaryOp::Add => "+",
                    BinaryOp::Sub => "-",
                    BinaryOp::Mul => "*",
                    BinaryOp::Div => "/",
                    BinaryOp::Mod => "%",
                    BinaryOp::Gt => ">",
                    BinaryOp::Lt => "<",
                    BinaryOp::Gte => ">=",
                    BinaryOp::Lte => "<=",
                    BinaryOp::Eq => "==",
                    BinaryOp::Neq => "!=",
                };
                format!("({l} {op} {r})")
            }
        }
    }
}

pub fn print_eqn(expr: &Expr) -> String {
    let mut visitor = PrintVisitor {};
    visitor.walk(expr)
}

#[test]
fn test_print_eqn() {
    assert_eq!(
        "(a + b)",
        print_eqn(&Expr::Op2(
            BinaryOp::Add,
            Box::new(Expr::Var("a".to_string(), Loc::new(1, 2))),
            Box::new(Expr::Var("b".to_string(), Loc::new(5, 6))),
            Loc::new(0, 7),
        ))
    );
    assert_eq!(
        "-a",
        print_eqn(&Expr::Op1(
            UnaryOp::Negative,
            Box::new(Expr::Var("a".to_string(), Loc::new(1, 2))),
            Loc::new(0, 2),
        ))
    );
    assert_eq!(
        "-(a % b)",
        print_eqn(&Expr::Op1(
            UnaryOp::Negative,
            Box::new(Expr::Op2(
                BinaryOp::Mod,
                Box::new(Expr::Var("a".to_string(), Loc::new(2, 3))),
                Box::new(Expr::Var("b".to_string(), Loc::new(6, 7))),
                Loc::new(1, 8),
            )),
            Loc::new(0, 8),
        ))
    );
    assert_eq!(
        "4.7",
        print_eqn(&Expr::Const("4.7".to_string(), 4.7, Loc::new(0, 3)))
    );
    assert_eq!(
        "(a == b)",
        print_eqn(&Expr::Op2(
            BinaryOp::Eq,
            Box::new(Expr::Var("a".to_string(), Loc::new(1, 2))),
            Box::new(Expr::Var("b".to_string(), Loc::new(6, 7))),
            Loc::new(0, 8),
        ))
    );
    assert_eq!(
        "if(c, t, f)",
        print_eqn(&Expr::App(
            "if".to_string(),
            vec![
                Expr::Var("c".to_string(), Loc::new(3, 4)),
                Expr::Var("t".to_string(), Loc::new(6, 7)),
                Expr::Var("f".to_string(), Loc::new(9, 10)),
            ],
            Loc::new(0, 11),
        ))
    );
}

#[test]
fn test_collect_idents() {
    let expr = Expr::Op2(
        BinaryOp::Mul,
        Box::new(Expr::Var("account".to_string(), Loc::new(0, 7))),
        Box::new(Expr::App(
            "max".to_string(),
            vec![
                Expr::Var("rate".to_string(), Loc::new(14, 18)),
                Expr::Const("0".to_string(), 0.0, Loc::new(20, 21)),
            ],
            Loc::new(10, 22),
        )),
        Loc::new(0, 22),
    );
    let mut idents = BTreeSet::new();
    expr.collect_idents(&mut idents);
    let idents: Vec<_> = idents.into_iter().collect();
    // "max" is a callee, not a variable reference
    assert_eq!(vec!["account".to_string(), "rate".to_string()], idents);
}
