//! Strategies for randomized interface configurations.
use crate::element::{Element, ElementFamily};
use crate::problem::{ContactPairing, MortarProblem, Node};
use crate::settings::MortarSettings;
use ::proptest::prelude::*;
use nalgebra::{Point2, Vector2};

pub fn vector2(range: std::ops::Range<f64>) -> impl Strategy<Value = Vector2<f64>> {
    [range.clone(), range].prop_map(|[x, y]| Vector2::new(x, y))
}

/// Parameters of a straight two-element interface along the x axis.
///
/// The slave surface covers `[0, 2]` at `y = 0` with nodes 0, 1, 2, ordered right to left so
/// that its normal points towards negative `y`. The master surface covers
/// `[shift, shift + 2]` at `y = -gap` with nodes 3, 4, 5.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatInterfaceParams {
    pub shift: f64,
    pub gap: f64,
    pub multipliers: [Vector2<f64>; 3],
    pub displacements: [Vector2<f64>; 6],
}

impl FlatInterfaceParams {
    pub fn build(&self, settings: MortarSettings) -> MortarProblem {
        let slave_x = [2.0, 1.0, 0.0];
        let master_x = [self.shift, self.shift + 1.0, self.shift + 2.0];
        let mut nodes = Vec::new();
        for (i, x) in slave_x.iter().enumerate() {
            nodes.push(
                Node::new(i, Point2::new(*x, 0.0))
                    .with_displacement(self.displacements[i])
                    .with_multiplier(self.multipliers[i]),
            );
        }
        for (i, x) in master_x.iter().enumerate() {
            nodes.push(Node::new(3 + i, Point2::new(*x, -self.gap)).with_displacement(self.displacements[3 + i]));
        }

        let segment = |a, b| Element::new(ElementFamily::Seg2, vec![a, b]).expect("Valid segment connectivity");
        let slave = vec![segment(0, 1), segment(1, 2)];
        let master = vec![segment(5, 4), segment(4, 3)];
        MortarProblem::new(nodes, slave, master, ContactPairing::all_to_all(2, 2), settings)
            .expect("Valid interface problem")
    }
}

pub fn flat_interface() -> impl Strategy<Value = FlatInterfaceParams> {
    let shift = -0.5..0.5;
    let gap = -0.2..0.2;
    let multipliers = [vector2(-1.0..1.0), vector2(-1.0..1.0), vector2(-1.0..1.0)];
    let small = || vector2(-0.05..0.05);
    let displacements = [small(), small(), small(), small(), small(), small()];
    (shift, gap, multipliers, displacements).prop_map(|(shift, gap, multipliers, displacements)| {
        FlatInterfaceParams {
            shift,
            gap,
            multipliers,
            displacements,
        }
    })
}
