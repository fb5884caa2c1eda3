use crate::config::AtlasConfig;
use crate::error::{LightmapAtlasError, Result};
use crate::model::{AllocationId, RawAllocation};
use crate::pipeline::{BuildOutput, build_atlases_from};
use std::collections::HashSet;
use tracing::{info, instrument};

/// Accumulates allocations for one build session and flushes them through the
/// pipeline once their sample memory reaches the configured threshold.
pub struct BatchScheduler {
    cfg: AtlasConfig,
    pending: Vec<RawAllocation>,
    pending_ids: HashSet<AllocationId>,
    pending_bytes: usize,
    next_atlas_id: usize,
    flushes: usize,
}

impl BatchScheduler {
    pub fn new(cfg: AtlasConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            pending: Vec::new(),
            pending_ids: HashSet::new(),
            pending_bytes: 0,
            next_atlas_id: 0,
            flushes: 0,
        })
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.cfg
    }

    /// Queues `allocation`; returns the flushed atlases if this pushed the batch over the threshold.
    pub fn submit(&mut self, allocation: RawAllocation) -> Result<Option<BuildOutput>> {
        if allocation.size_x() == 0 || allocation.size_y() == 0 {
            return Err(LightmapAtlasError::InvalidAllocationSize {
                id: allocation.id(),
                width: allocation.size_x(),
                height: allocation.size_y(),
            });
        }
        let expected = allocation.size_x() as usize * allocation.size_y() as usize;
        if allocation.samples().len() != expected {
            return Err(LightmapAtlasError::SampleCountMismatch {
                id: allocation.id(),
                expected,
                actual: allocation.samples().len(),
            });
        }
        if !self.pending_ids.insert(allocation.id()) {
            return Err(LightmapAtlasError::DuplicateAllocation(allocation.id()));
        }
        self.pending_bytes += allocation.byte_size();
        self.pending.push(allocation);
        self.maybe_flush()
    }

    /// Flushes if pending bytes have reached the threshold.
    pub fn maybe_flush(&mut self) -> Result<Option<BuildOutput>> {
        if self.pending_bytes >= self.cfg.group_flush_threshold_bytes {
            return self.flush().map(Some);
        }
        Ok(None)
    }

    /// Flushes whatever is pending regardless of the threshold.
    pub fn finalize(mut self) -> Result<BuildOutput> {
        self.flush()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_bytes(&self) -> usize {
        self.pending_bytes
    }

    /// Number of flushes that produced output so far.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Atlases emitted so far; the next atlas gets this id.
    pub fn atlases_emitted(&self) -> usize {
        self.next_atlas_id
    }

    #[instrument(skip_all)]
    fn flush(&mut self) -> Result<BuildOutput> {
        let batch = std::mem::take(&mut self.pending);
        let bytes = std::mem::replace(&mut self.pending_bytes, 0);
        self.pending_ids.clear();
        if batch.is_empty() {
            return Ok(BuildOutput::default());
        }
        let count = batch.len();
        let out = build_atlases_from(batch, self.next_atlas_id, &self.cfg)?;
        self.next_atlas_id += out.atlases.len();
        self.flushes += 1;
        info!(
            allocations = count,
            bytes,
            atlases = out.atlases.len(),
            "flushed light-map batch"
        );
        Ok(out)
    }
}
