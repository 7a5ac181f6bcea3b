// Copyright 2026 The Flowsim Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The immutable design-graph snapshot the compiler consumes.
//!
//! A frame is a flat set of typed objects.  Nodes carry attributes;
//! edges additionally carry an origin and a target object reference.
//! The compiler never mutates a frame -- the builder methods here exist
//! for the object store that produces snapshots, and for tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type ObjectId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    // nodes
    Stock,
    Flow,
    Auxiliary,
    GraphicalFunction,
    Delay,
    Chart,
    Control,
    Note,
    Simulation,
    // edges
    Drains,
    Fills,
    Parameter,
    ImplicitFlow,
    ChartSeries,
    ControlBinding,
}

impl ObjectType {
    pub fn is_edge(&self) -> bool {
        matches!(
            self,
            ObjectType::Drains
                | ObjectType::Fills
                | ObjectType::Parameter
                | ObjectType::ImplicitFlow
                | ObjectType::ChartSeries
                | ObjectType::ControlBinding
        )
    }

    pub fn is_node(&self) -> bool {
        !self.is_edge()
    }

    /// Computed nodes own a slot in the simulation state vector.
    pub fn is_computed(&self) -> bool {
        matches!(
            self,
            ObjectType::Stock
                | ObjectType::Flow
                | ObjectType::Auxiliary
                | ObjectType::GraphicalFunction
                | ObjectType::Delay
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    String(String),
    Points(Vec<Point>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub id: ObjectId,
    pub ty: ObjectType,
    pub attrs: BTreeMap<String, AttrValue>,
    /// `(origin, target)`, present iff this object is an edge.
    pub endpoints: Option<(ObjectId, ObjectId)>,
}

impl Object {
    pub fn name(&self) -> Option<&str> {
        self.attr_str("name")
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        match self.attrs.get(key) {
            Some(AttrValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        match self.attrs.get(key) {
            Some(AttrValue::Float(n)) => Some(*n),
            Some(AttrValue::Int(n)) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn attr_i64(&self, key: &str) -> Option<i64> {
        match self.attrs.get(key) {
            Some(AttrValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        match self.attrs.get(key) {
            Some(AttrValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn attr_points(&self, key: &str) -> Option<&[Point]> {
        match self.attrs.get(key) {
            Some(AttrValue::Points(points)) => Some(points.as_slice()),
            _ => None,
        }
    }

    pub fn origin(&self) -> Option<ObjectId> {
        self.endpoints.map(|(origin, _)| origin)
    }

    pub fn target(&self) -> Option<ObjectId> {
        self.endpoints.map(|(_, target)| target)
    }
}

/// Defaults for a run, read from the frame's at-most-one `Simulation`
/// object or filled in from compile-time defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimSpecs {
    pub initial_time: f64,
    pub time_delta: f64,
    pub steps: usize,
}

impl Default for SimSpecs {
    fn default() -> Self {
        SimSpecs {
            initial_time: 0.0,
            time_delta: 1.0,
            steps: 100,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    objects: Vec<Object>,
    next_id: ObjectId,
}

impl Frame {
    pub fn new() -> Self {
        Default::default()
    }

    fn add_object(
        &mut self,
        ty: ObjectType,
        endpoints: Option<(ObjectId, ObjectId)>,
    ) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.push(Object {
            id,
            ty,
            attrs: BTreeMap::new(),
            endpoints,
        });
        id
    }

    pub fn add_node(&mut self, ty: ObjectType, name: Option<&str>) -> ObjectId {
        debug_assert!(ty.is_node());
        let id = self.add_object(ty, None);
        if let Some(name) = name {
            self.set_attr(id, "name", AttrValue::String(name.to_owned()));
        }
        id
    }

    pub fn add_edge(&mut self, ty: ObjectType, origin: ObjectId, target: ObjectId) -> ObjectId {
        debug_assert!(ty.is_edge());
        self.add_object(ty, Some((origin, target)))
    }

    pub fn set_attr(&mut self, id: ObjectId, key: &str, value: AttrValue) {
        if let Some(obj) = self.objects.iter_mut().find(|obj| obj.id == id) {
            obj.attrs.insert(key.to_owned(), value);
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.iter().find(|obj| obj.id == id)
    }

    /// First-match lookup by node name.
    pub fn lookup_name(&self, name: &str) -> Option<&Object> {
        self.nodes().find(|obj| obj.name() == Some(name))
    }

    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter().filter(|obj| obj.ty.is_node())
    }

    pub fn edges(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter().filter(|obj| obj.ty.is_edge())
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let mut frame = Frame::new();
        let account = frame.add_node(ObjectType::Stock, Some("account"));
        let fill = frame.add_node(ObjectType::Flow, Some("fill"));
        let edge = frame.add_edge(ObjectType::Fills, fill, account);
        frame.set_attr(account, "formula", AttrValue::String("100".to_owned()));

        assert_eq!(3, frame.len());
        assert_eq!(Some("account"), frame.get(account).unwrap().name());
        assert_eq!(Some(fill), frame.get(edge).unwrap().origin());
        assert_eq!(Some(account), frame.get(edge).unwrap().target());
        assert_eq!(account, frame.lookup_name("account").unwrap().id);
        assert!(frame.lookup_name("missing").is_none());
        assert_eq!(
            Some(100.0),
            frame
                .get(account)
                .unwrap()
                .attr_str("formula")
                .and_then(|s| s.parse().ok())
        );
    }

    #[test]
    fn test_attr_accessors() {
        let mut frame = Frame::new();
        let gf = frame.add_node(ObjectType::GraphicalFunction, Some("capacity"));
        frame.set_attr(gf, "priority", AttrValue::Int(3));
        frame.set_attr(gf, "allows_negative", AttrValue::Bool(false));
        frame.set_attr(
            gf,
            "graphical_function_points",
            AttrValue::Points(vec![Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 10.0 }]),
        );

        let gf = frame.get(gf).unwrap();
        assert_eq!(Some(3), gf.attr_i64("priority"));
        assert_eq!(Some(3.0), gf.attr_f64("priority"));
        assert_eq!(Some(false), gf.attr_bool("allows_negative"));
        assert_eq!(2, gf.attr_points("graphical_function_points").unwrap().len());
        assert!(gf.attr_f64("missing").is_none());
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut frame = Frame::new();
        let a = frame.add_node(ObjectType::Stock, Some("a"));
        let b = frame.add_node(ObjectType::Stock, Some("b"));
        let f = frame.add_node(ObjectType::Flow, Some("f"));
        frame.add_edge(ObjectType::Drains, a, f);
        frame.add_edge(ObjectType::Fills, f, b);
        frame.set_attr(f, "formula", AttrValue::String("10".to_owned()));

        let json = serde_json::to_string(&frame).unwrap();
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(frame, back);
    }
}
