//! # Transcriber
//!
//! Owns the resolved blueprint and a pattern-network provider. Every genotype
//! gets its own [`QuerySession`]; the blueprint is shared read-only, so whole
//! populations can be transcribed in parallel with Rayon.

use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;

use weave_core::{
    Blueprint, DimensionProvider, PatternNetworkProvider, TranscriberConfig, WeaveResult,
};

use crate::session::QuerySession;

/// Genotype-to-substrate transcriber
pub struct Transcriber<P> {
    /// Pattern network provider
    provider: P,

    /// Current blueprint; swapped wholesale on resize
    blueprint: RwLock<Arc<Blueprint>>,
}

impl<P> Transcriber<P> {
    /// Resolve configuration and build a transcriber
    pub fn new(
        config: &TranscriberConfig,
        dimensions: &dyn DimensionProvider,
        provider: P,
    ) -> WeaveResult<Self> {
        let blueprint = Blueprint::from_config(config, dimensions)?;
        Ok(Self::from_blueprint(blueprint, provider))
    }

    /// Build a transcriber around an already resolved blueprint
    pub fn from_blueprint(blueprint: Blueprint, provider: P) -> Self {
        Self {
            provider,
            blueprint: RwLock::new(Arc::new(blueprint)),
        }
    }

    /// Snapshot of the current blueprint
    pub fn blueprint(&self) -> Arc<Blueprint> {
        Arc::clone(&self.blueprint.read())
    }

    /// The pattern network provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Give every layer new dimensions
    ///
    /// Sessions created before the resize keep the geometry they started with.
    pub fn resize(
        &self,
        width: Vec<usize>,
        height: Vec<usize>,
        connection_range: Option<usize>,
    ) -> WeaveResult<()> {
        let mut guard = self.blueprint.write();
        let resized = guard.resized(width, height, connection_range)?;
        tracing::info!(
            "Resized substrate to widths {:?}, heights {:?}, connection range {:?}",
            resized.geometry.width(),
            resized.geometry.height(),
            connection_range
        );
        *guard = Arc::new(resized);
        Ok(())
    }

    /// Transcribe one genotype into a fresh query session
    pub fn session<G>(&self, genotype: &G) -> WeaveResult<QuerySession<P::Network>>
    where
        G: ?Sized,
        P: PatternNetworkProvider<G>,
    {
        let network = self.provider.transcribe(genotype)?;
        QuerySession::new(network, self.blueprint())
    }

    /// Transcribe every genotype independently and in parallel
    ///
    /// `build` receives each genotype's own session, typically walks the
    /// substrate's neuron pairs, and returns whatever phenotype it assembled.
    /// Results are in genotype order.
    pub fn transcribe_population<G, T, F>(&self, genotypes: &[G], build: F) -> Vec<WeaveResult<T>>
    where
        G: Sync,
        T: Send,
        P: PatternNetworkProvider<G>,
        F: Fn(&G, &mut QuerySession<P::Network>) -> WeaveResult<T> + Sync + Send,
    {
        let blueprint = self.blueprint();
        genotypes
            .par_iter()
            .map(|genotype| {
                let network = self.provider.transcribe(genotype)?;
                let mut session = QuerySession::new(network, Arc::clone(&blueprint))?;
                build(genotype, &mut session)
            })
            .collect()
    }
}
