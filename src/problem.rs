//! Interface problem data: nodes, slave and master elements, pairing and degrees of freedom.
use crate::element::Element;
use crate::error::MortarError;
use crate::fields::Field;
use crate::settings::MortarSettings;
use nalgebra::{DVector, Point2, Vector2};
use rustc_hash::FxHashMap;

/// Number of displacement (and multiplier) components per node.
pub const FIELD_DIM: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: usize,
    pub reference: Point2<f64>,
    pub displacement: Vector2<f64>,
    pub multiplier: Vector2<f64>,
}

impl Node {
    pub fn new(id: usize, reference: Point2<f64>) -> Self {
        Self {
            id,
            reference,
            displacement: Vector2::zeros(),
            multiplier: Vector2::zeros(),
        }
    }

    pub fn with_displacement(mut self, displacement: Vector2<f64>) -> Self {
        self.displacement = displacement;
        self
    }

    pub fn with_multiplier(mut self, multiplier: Vector2<f64>) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Current position `X + u`.
    pub fn position(&self) -> Point2<f64> {
        self.reference + self.displacement
    }
}

/// Candidate master elements for every slave element, as supplied by a broad-phase search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPairing {
    candidates: Vec<Vec<usize>>,
}

impl ContactPairing {
    /// `candidates[s]` lists the master element indices paired with slave element `s`.
    pub fn new(candidates: Vec<Vec<usize>>) -> Self {
        Self { candidates }
    }

    /// Pairs every slave element with every master element.
    pub fn all_to_all(num_slave_elements: usize, num_master_elements: usize) -> Self {
        Self::new(vec![(0..num_master_elements).collect(); num_slave_elements])
    }

    /// Empty for slave elements without candidates.
    pub fn masters_of(&self, slave_element: usize) -> &[usize] {
        self.candidates
            .get(slave_element)
            .map(|masters| masters.as_slice())
            .unwrap_or(&[])
    }

    pub fn num_slave_elements(&self) -> usize {
        self.candidates.len()
    }

    /// All `(slave, master)` pairs in pairing order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.num_slave_elements()).flat_map(move |s| self.masters_of(s).iter().map(move |&m| (s, m)))
    }
}

/// Maps global node ids to a contiguous local index and lays out the unknown vector.
///
/// The unknown vector holds all displacements followed by all multipliers, each ordered by
/// local node index with `x` before `y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofMap {
    local_index: FxHashMap<usize, usize>,
    ids: Vec<usize>,
}

impl DofMap {
    pub fn from_ids(ids: impl IntoIterator<Item = usize>) -> Result<Self, MortarError> {
        let ids: Vec<usize> = ids.into_iter().collect();
        let mut local_index = FxHashMap::default();
        for (local, &id) in ids.iter().enumerate() {
            if local_index.insert(id, local).is_some() {
                return Err(MortarError::Configuration(format!("Duplicate node id {}", id)));
            }
        }
        Ok(Self { local_index, ids })
    }

    pub fn local_index(&self, id: usize) -> Option<usize> {
        self.local_index.get(&id).copied()
    }

    pub fn node_id(&self, local: usize) -> usize {
        self.ids[local]
    }

    pub fn num_nodes(&self) -> usize {
        self.ids.len()
    }

    /// Number of displacement degrees of freedom (equal to the number of multiplier dofs).
    pub fn num_dofs(&self) -> usize {
        FIELD_DIM * self.ids.len()
    }

    pub fn displacement_dof(&self, local: usize, component: usize) -> usize {
        FIELD_DIM * local + component
    }

    pub fn multiplier_dof(&self, local: usize, component: usize) -> usize {
        self.num_dofs() + FIELD_DIM * local + component
    }
}

/// Connectivity in local node indices plus the node to slave element adjacency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InterfaceTopology {
    pub slave_connectivity: Vec<Vec<usize>>,
    pub master_connectivity: Vec<Vec<usize>>,
    /// For every local node, the slave elements it belongs to.
    pub node_slave_elements: Vec<Vec<usize>>,
}

impl InterfaceTopology {
    fn build(dofs: &DofMap, slave_elements: &[Element], master_elements: &[Element]) -> Result<Self, MortarError> {
        let localize = |elements: &[Element], side: &str| -> Result<Vec<Vec<usize>>, MortarError> {
            elements
                .iter()
                .enumerate()
                .map(|(e, element)| {
                    element
                        .connectivity()
                        .iter()
                        .map(|&id| {
                            dofs.local_index(id).ok_or_else(|| {
                                MortarError::Configuration(format!(
                                    "{} element {} references unknown node {}",
                                    side, e, id
                                ))
                            })
                        })
                        .collect()
                })
                .collect()
        };

        let slave_connectivity = localize(slave_elements, "Slave")?;
        let master_connectivity = localize(master_elements, "Master")?;

        let mut node_slave_elements = vec![Vec::new(); dofs.num_nodes()];
        for (e, connectivity) in slave_connectivity.iter().enumerate() {
            for &local in connectivity {
                node_slave_elements[local].push(e);
            }
        }

        Ok(Self {
            slave_connectivity,
            master_connectivity,
            node_slave_elements,
        })
    }

    pub fn is_slave_node(&self, local: usize) -> bool {
        !self.node_slave_elements[local].is_empty()
    }
}

/// A complete mortar interface problem.
///
/// Owns the interface nodes, the slave and master elements, the contact pairing and the
/// settings. Assembly reads the trial state from the unknown vector, so the problem data is
/// only modified to record the nodal state and field snapshots.
#[derive(Debug, Clone)]
pub struct MortarProblem {
    nodes: Vec<Node>,
    slave_elements: Vec<Element>,
    master_elements: Vec<Element>,
    pairing: ContactPairing,
    settings: MortarSettings,
    dofs: DofMap,
    topology: InterfaceTopology,
}

impl MortarProblem {
    pub fn new(
        nodes: Vec<Node>,
        slave_elements: Vec<Element>,
        master_elements: Vec<Element>,
        pairing: ContactPairing,
        settings: MortarSettings,
    ) -> Result<Self, MortarError> {
        settings.validate()?;
        if slave_elements.is_empty() {
            return Err(MortarError::Configuration("No slave elements".to_string()));
        }
        if master_elements.is_empty() {
            return Err(MortarError::Configuration("No master elements".to_string()));
        }
        if pairing.num_slave_elements() > slave_elements.len() {
            return Err(MortarError::Configuration(format!(
                "Pairing lists {} slave elements, but only {} exist",
                pairing.num_slave_elements(),
                slave_elements.len()
            )));
        }
        if let Some((s, m)) = pairing.pairs().find(|&(_, m)| m >= master_elements.len()) {
            return Err(MortarError::Configuration(format!(
                "Slave element {} is paired with non-existent master element {}",
                s, m
            )));
        }

        let dofs = DofMap::from_ids(nodes.iter().map(|node| node.id))?;
        let topology = InterfaceTopology::build(&dofs, &slave_elements, &master_elements)?;

        let mut problem = Self {
            nodes,
            slave_elements,
            master_elements,
            pairing,
            settings,
            dofs,
            topology,
        };
        problem.record_reference_geometry();
        Ok(problem)
    }

    fn record_reference_geometry(&mut self) {
        let nodes = &self.nodes;
        let dofs = &self.dofs;
        for element in self.slave_elements.iter_mut().chain(self.master_elements.iter_mut()) {
            let geometry = element
                .connectivity()
                .iter()
                .filter_map(|&id| dofs.local_index(id))
                .map(|local| nodes[local].reference.coords)
                .collect();
            element.fields_mut().insert(Field::Geometry, 0.0, geometry);
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> Option<&Node> {
        self.dofs.local_index(id).map(|local| &self.nodes[local])
    }

    pub fn slave_elements(&self) -> &[Element] {
        &self.slave_elements
    }

    pub fn master_elements(&self) -> &[Element] {
        &self.master_elements
    }

    pub fn pairing(&self) -> &ContactPairing {
        &self.pairing
    }

    pub fn settings(&self) -> &MortarSettings {
        &self.settings
    }

    pub fn dofs(&self) -> &DofMap {
        &self.dofs
    }

    pub(crate) fn topology(&self) -> &InterfaceTopology {
        &self.topology
    }

    pub(crate) fn slave_elements_mut(&mut self) -> &mut [Element] {
        &mut self.slave_elements
    }

    /// Length of the unknown vector, `2 * num_dofs`.
    pub fn num_unknowns(&self) -> usize {
        2 * self.dofs.num_dofs()
    }

    /// Gathers the current nodal displacements and multipliers into an unknown vector.
    pub fn unknowns(&self) -> DVector<f64> {
        let n = self.dofs.num_dofs();
        let mut x = DVector::zeros(2 * n);
        for (local, node) in self.nodes.iter().enumerate() {
            for c in 0..FIELD_DIM {
                x[self.dofs.displacement_dof(local, c)] = node.displacement[c];
                x[self.dofs.multiplier_dof(local, c)] = node.multiplier[c];
            }
        }
        x
    }

    /// Scatters an unknown vector into the nodes and records displacement and multiplier
    /// snapshots on every element at `time`.
    pub fn set_unknowns(&mut self, x: &DVector<f64>, time: f64) -> Result<(), MortarError> {
        self.check_unknowns(x)?;
        for (local, node) in self.nodes.iter_mut().enumerate() {
            for c in 0..FIELD_DIM {
                node.displacement[c] = x[self.dofs.displacement_dof(local, c)];
                node.multiplier[c] = x[self.dofs.multiplier_dof(local, c)];
            }
        }

        let nodes = &self.nodes;
        let dofs = &self.dofs;
        for element in self.slave_elements.iter_mut().chain(self.master_elements.iter_mut()) {
            let locals: Vec<usize> = element
                .connectivity()
                .iter()
                .filter_map(|&id| dofs.local_index(id))
                .collect();
            let displacement = locals.iter().map(|&l| nodes[l].displacement).collect();
            let multiplier = locals.iter().map(|&l| nodes[l].multiplier).collect();
            element.fields_mut().insert(Field::Displacement, time, displacement);
            element.fields_mut().insert(Field::Multiplier, time, multiplier);
        }
        Ok(())
    }

    pub(crate) fn check_unknowns(&self, x: &DVector<f64>) -> Result<(), MortarError> {
        if x.len() != self.num_unknowns() {
            return Err(MortarError::Configuration(format!(
                "Unknown vector has length {}, expected {}",
                x.len(),
                self.num_unknowns()
            )));
        }
        Ok(())
    }
}
