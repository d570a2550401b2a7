use crate::geometry::Geometry;
use crate::network::{Network, NetworkDescriptors, TopologyBuilder};
use crate::position::{EdgeStarts, Location, PositionResolver};
use crate::{QueryError, Result};

/// A compiled network together with its global coordinate.
///
/// Scenarios are immutable once built and may be shared between threads.
#[derive(Clone, Debug)]
pub struct Scenario {
    name: String,
    network: Network,
    resolver: PositionResolver,
}

impl Scenario {
    /// Builds a scenario from a type providing both its geometry and edge starts.
    pub fn build<G>(name: impl Into<String>, geometry: &G) -> Result<Self>
    where
        G: Geometry + EdgeStarts + ?Sized,
    {
        Self::from_parts(name, geometry, geometry)
    }

    /// Builds a scenario from separate geometry and edge start capabilities.
    ///
    /// Fails if either the network or its edge starts are invalid; no partially
    /// built scenario is ever returned.
    pub fn from_parts(
        name: impl Into<String>,
        geometry: &(impl Geometry + ?Sized),
        starts: &(impl EdgeStarts + ?Sized),
    ) -> Result<Self> {
        let name = name.into();
        let network = TopologyBuilder::new().compile(geometry)?;
        let resolver = PositionResolver::new(&network, starts)?;
        log::info!(
            "built scenario `{}` with {} edges over {:.2} m",
            name,
            network.edge_count(),
            resolver.total_length()
        );
        Ok(Self {
            name,
            network,
            resolver,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn resolver(&self) -> &PositionResolver {
        &self.resolver
    }

    /// The length of the global coordinate in m.
    pub fn total_length(&self) -> f64 {
        self.resolver.total_length()
    }

    /// Converts a position on a link into a global position.
    pub fn global_position(&self, id: &str, pos: f64) -> Result<f64, QueryError> {
        self.resolver.global_position(id, pos)
    }

    /// Finds the link containing a global position.
    pub fn locate(&self, pos: f64) -> Result<Location<'_>, QueryError> {
        self.resolver.locate(pos)
    }

    /// The edge following `edge_id` on its route.
    pub fn next_edge(&self, edge_id: &str) -> Result<&str, QueryError> {
        self.network.next_edge(edge_id)
    }

    pub fn descriptors(&self) -> NetworkDescriptors {
        self.network.descriptors()
    }
}
