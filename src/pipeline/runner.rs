//! Per-artifact processing and the run driver.

use bytes::BytesMut;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::report::{ArtifactOutcome, ArtifactReport, BuildSummary, RunReport};
use crate::cache::{ArtifactCache, FingerprintKind, FingerprintStatus};
use crate::common::fs::atomic_write_bytes;
use crate::common::{Error, Fingerprint, Result};
use crate::config::{ArtifactSpec, FailurePolicy, OutputLayout, Settings};
use crate::encoder::{RowEncoder, UniqueIndex};
use crate::grid::GridSource;
use crate::header::{Classifier, ClassifyOptions, FieldDescriptorTree, ROW_DATA};
use crate::schema::{RenderedSchema, SchemaOptions, SchemaWriter};

/// Compiles configured artifacts read from a [`GridSource`].
///
/// # Examples
///
/// ```rust
/// use sheet2pb::config::{ArtifactSpec, Settings};
/// use sheet2pb::grid::{Grid, MemorySource};
/// use sheet2pb::pipeline::Pipeline;
///
/// # fn main() -> sheet2pb::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let grid = Grid::from_rows("Item", [
///     ["required", "optional"],
///     ["uint32", "string"],
///     ["Id", "Name"],
///     ["", ""],
///     ["1", "sword"],
/// ]);
/// let source = MemorySource::new().with_sheet("items", grid);
/// let settings = Settings::new().with_output_root(dir.path());
///
/// let pipeline = Pipeline::from_settings(source, &settings);
/// let report = pipeline.run(&[ArtifactSpec::new("Item").with_source("items", ["Item"])], None)?;
/// assert!(report.is_success());
/// assert!(settings.output_layout().data_path("Item").is_file());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline<S> {
    source: S,
    layout: OutputLayout,
    writer: SchemaWriter,
    classifier: Classifier,
    policy: FailurePolicy,
    parallel: bool,
    jobs: usize,
}

impl<S: GridSource> Pipeline<S> {
    pub fn new(source: S, layout: OutputLayout) -> Self {
        Self {
            source,
            layout,
            writer: SchemaWriter::default(),
            classifier: Classifier::default(),
            policy: FailurePolicy::default(),
            parallel: true,
            jobs: 0,
        }
    }

    /// Configure every option from `settings`.
    pub fn from_settings(source: S, settings: &Settings) -> Self {
        Self::new(source, settings.output_layout())
            .with_schema_options(settings.schema_options())
            .with_classify_options(settings.classify_options())
            .with_failure_policy(settings.failure_policy())
            .with_parallel(settings.parallel)
            .with_jobs(settings.jobs)
    }

    pub fn with_schema_options(mut self, options: SchemaOptions) -> Self {
        self.writer = SchemaWriter::new(options);
        self
    }

    pub fn with_classify_options(mut self, options: ClassifyOptions) -> Self {
        self.classifier = Classifier::new(options);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of worker threads, 0 for the rayon default.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Process `artifacts` and save `cache` when given.
    ///
    /// Without a cache every artifact is rebuilt and every output written.
    /// Under [`FailurePolicy::AbortRun`] the first failure is returned and
    /// the cache is left untouched.
    pub fn run(&self, artifacts: &[ArtifactSpec], cache: Option<&ArtifactCache>) -> Result<RunReport> {
        let results = match (self.parallel, self.thread_pool()?) {
            (true, Some(pool)) => pool.install(|| self.run_parallel(artifacts, cache))?,
            (true, None) => self.run_parallel(artifacts, cache)?,
            (false, _) => self.run_sequential(artifacts, cache)?,
        };

        let mut report = RunReport::default();
        for result in results {
            match result {
                Ok(artifact) => report.artifacts.push(artifact),
                Err(err) => {
                    warn!("{}", err);
                    report.failures.push(err);
                },
            }
        }

        if let Some(cache) = cache {
            let saved = cache.save(&self.layout)?;
            if !saved.changed_schemas.is_empty() || !saved.changed_data.is_empty() {
                info!(
                    review = %cache.paths().review_dir.display(),
                    manifest = %cache.paths().changes_file.display(),
                    "changed outputs copied for review"
                );
            }
            report.saved = Some(saved);
        }
        info!(
            built = report.built(),
            skipped = report.skipped(),
            failed = report.failures.len(),
            "run finished"
        );
        Ok(report)
    }

    fn thread_pool(&self) -> Result<Option<rayon::ThreadPool>> {
        if !self.parallel || self.jobs == 0 {
            return Ok(None);
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map(Some)
            .map_err(|e| Error::Config(format!("cannot start {} workers: {}", self.jobs, e)))
    }

    fn run_parallel(
        &self,
        artifacts: &[ArtifactSpec],
        cache: Option<&ArtifactCache>,
    ) -> Result<Vec<Result<ArtifactReport>>> {
        match self.policy {
            FailurePolicy::ContinueOthers => Ok(artifacts
                .par_iter()
                .map(|spec| self.process(spec, cache))
                .collect()),
            FailurePolicy::AbortRun => {
                let reports: Vec<ArtifactReport> = artifacts
                    .par_iter()
                    .map(|spec| self.process(spec, cache))
                    .collect::<Result<_>>()?;
                Ok(reports.into_iter().map(Ok).collect())
            },
        }
    }

    fn run_sequential(
        &self,
        artifacts: &[ArtifactSpec],
        cache: Option<&ArtifactCache>,
    ) -> Result<Vec<Result<ArtifactReport>>> {
        let mut results = Vec::with_capacity(artifacts.len());
        for spec in artifacts {
            let result = self.process(spec, cache);
            if self.policy == FailurePolicy::AbortRun {
                results.push(Ok(result?));
            } else {
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Process one artifact. Source fingerprints are committed only when the
    /// artifact succeeds.
    pub fn process(&self, spec: &ArtifactSpec, cache: Option<&ArtifactCache>) -> Result<ArtifactReport> {
        let files = spec.files();
        let result = self.fingerprints(&files).and_then(|sources| {
            if let Some(cache) = cache {
                if self.is_unchanged(spec, cache, &sources) {
                    return Ok((sources, ArtifactOutcome::Skipped));
                }
            }
            let summary = self.build(spec, cache)?;
            Ok((sources, ArtifactOutcome::Built(summary)))
        });

        match result {
            Ok((sources, outcome)) => {
                if let Some(cache) = cache {
                    match &outcome {
                        ArtifactOutcome::Skipped => {
                            for file in &files {
                                cache.retain(FingerprintKind::Source, file);
                            }
                            cache.retain(FingerprintKind::Schema, &spec.name);
                            cache.retain(FingerprintKind::Data, &spec.name);
                            info!(artifact = spec.name.as_str(), "sources unchanged, skipped");
                        },
                        ArtifactOutcome::Built(_) => {
                            for (file, hash) in sources {
                                cache.update(FingerprintKind::Source, file, hash);
                            }
                        },
                    }
                }
                Ok(ArtifactReport {
                    name: spec.name.clone(),
                    outcome,
                })
            },
            Err(err) => {
                if let Some(cache) = cache {
                    for file in &files {
                        cache.pin(FingerprintKind::Source, file);
                    }
                    cache.retain(FingerprintKind::Schema, &spec.name);
                    cache.retain(FingerprintKind::Data, &spec.name);
                }
                Err(err.in_artifact(spec.name.as_str()))
            },
        }
    }

    fn fingerprints<'f>(&self, files: &[&'f str]) -> Result<Vec<(&'f str, Fingerprint)>> {
        files
            .iter()
            .map(|&file| {
                if !self.source.exists(file) {
                    return Err(Error::SourceMissing(format!("file {} does not exist", file)));
                }
                Ok((file, self.source.fingerprint(file)?))
            })
            .collect()
    }

    fn is_unchanged(&self, spec: &ArtifactSpec, cache: &ArtifactCache, sources: &[(&str, Fingerprint)]) -> bool {
        let unchanged = sources
            .iter()
            .all(|(file, hash)| cache.peek(FingerprintKind::Source, file, hash) == FingerprintStatus::Unchanged);
        unchanged && self.layout.outputs_exist(&spec.name)
    }

    fn build(&self, spec: &ArtifactSpec, cache: Option<&ArtifactCache>) -> Result<BuildSummary> {
        let mut tree = FieldDescriptorTree::new(spec.name.as_str());
        let mut unique = UniqueIndex::new();
        let mut data = BytesMut::new();
        let mut schema: Option<RenderedSchema> = None;
        let mut diagnostics = Vec::new();
        let mut records = 0;
        let mut invalid_cells = 0;

        for source in &spec.sources {
            for grid in self.source.load(&source.file, &source.sheets)? {
                if grid.row_count() <= ROW_DATA {
                    return Err(Error::EmptySheet {
                        sheet: grid.name().to_string(),
                        rows: grid.row_count(),
                    });
                }
                diagnostics.extend(self.classifier.classify(&grid, &mut tree)?);
                if schema.is_none() {
                    schema = Some(self.writer.render(&tree));
                }

                let mut encoder = RowEncoder::new(&tree, &mut unique);
                records += encoder.encode_grid(&grid, &mut data)?;
                invalid_cells += encoder.invalid_cells();
                debug!(artifact = spec.name.as_str(), sheet = grid.name(), "sheet processed");
            }
        }
        let schema = schema.unwrap_or_else(|| self.writer.render(&tree));

        let schema_status = self.persist(
            cache,
            FingerprintKind::Schema,
            &spec.name,
            schema.hash().clone(),
            schema.text().as_bytes(),
        )?;
        let data_status = self.persist(
            cache,
            FingerprintKind::Data,
            &spec.name,
            Fingerprint::of(&data),
            &data,
        )?;

        info!(
            artifact = spec.name.as_str(),
            records,
            schema = ?schema_status,
            data = ?data_status,
            "artifact built"
        );
        Ok(BuildSummary {
            schema: schema_status,
            data: data_status,
            records,
            invalid_cells,
            diagnostics,
        })
    }

    /// Write an output file when its fingerprint changed or the file is
    /// gone, then record the fingerprint.
    fn persist(
        &self,
        cache: Option<&ArtifactCache>,
        kind: FingerprintKind,
        name: &str,
        hash: Fingerprint,
        bytes: &[u8],
    ) -> Result<FingerprintStatus> {
        let path = match kind {
            FingerprintKind::Schema => self.layout.schema_path(name),
            _ => self.layout.data_path(name),
        };
        let status = cache.map_or(FingerprintStatus::New, |c| c.peek(kind, name, &hash));
        if status.is_changed() || !path.is_file() {
            atomic_write_bytes(&path, bytes)?;
            debug!(artifact = name, file = %path.display(), "wrote {}", kind);
        }
        if let Some(cache) = cache {
            cache.update(kind, name, hash);
        }
        Ok(status)
    }
}
