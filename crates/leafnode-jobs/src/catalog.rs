//! Job catalog: provider wiring, configuration checks and run recording

use chrono::{DateTime, Utc};
use leafnode_core::resolver::DEFAULT_PROVIDER_TIMEOUT;
use leafnode_core::{
    Clock, EnrichmentJob, ImageValidator, JobScope, JobSummary, Provider, Resolver,
};
use leafnode_db::{Database, NewEnrichmentRun};
use leafnode_providers::{
    BookQuery, CoverCandidate, CriterionLink, CriterionSearchLink, FilmQuery, GoogleBooksClient,
    GoogleBooksConfig, HttpConfig, HttpImageProbe, OmdbClient, OmdbConfig, OpenLibraryClient,
    OpenLibraryConfig, PosterCandidate, TmdbClient, TmdbConfig, TrailerCandidate,
    VerifiedCriterionLinks, YouTubeClient, YouTubeConfig, build_client,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::JobError;
use crate::kind::JobKind;
use crate::tasks::{BookCoverTask, CriterionLinkTask, FilmPosterTask, ImageSweepTask, TrailerTask};

/// Batch size and pacing for one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTuning {
    pub batch_size: usize,
    pub delay: Duration,
}

impl JobTuning {
    pub fn defaults(kind: JobKind) -> Self {
        Self {
            batch_size: kind.default_batch_size(),
            delay: kind.default_delay(),
        }
    }
}

/// Limits applied to every run
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Upper bound on rows selected by one run, whatever the caller asks for
    pub max_batch_size: usize,
    pub overrides: HashMap<JobKind, JobTuning>,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            overrides: HashMap::new(),
        }
    }
}

impl JobSettings {
    pub fn tuning(&self, kind: JobKind) -> JobTuning {
        let tuning = self
            .overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| JobTuning::defaults(kind));
        JobTuning {
            batch_size: tuning.batch_size.min(self.max_batch_size),
            ..tuning
        }
    }
}

// ==================== Providers ====================

/// Provider settings gathered from configuration
#[derive(Debug, Clone)]
pub struct ProviderSetConfig {
    pub http: HttpConfig,
    pub google_books: GoogleBooksConfig,
    pub open_library: OpenLibraryConfig,
    pub tmdb: TmdbConfig,
    pub omdb: OmdbConfig,
    pub youtube: YouTubeConfig,
    /// Verified Criterion film pages by title
    pub criterion_links: HashMap<String, String>,
    /// Bound on a single provider lookup
    pub provider_timeout: Duration,
}

impl Default for ProviderSetConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            google_books: GoogleBooksConfig::default(),
            open_library: OpenLibraryConfig::default(),
            tmdb: TmdbConfig::default(),
            omdb: OmdbConfig::default(),
            youtube: YouTubeConfig::default(),
            criterion_links: HashMap::new(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

fn has_key(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

/// Resolver chains for every job, built once at startup
pub struct ProviderSet {
    covers: Arc<Resolver<BookQuery, CoverCandidate>>,
    posters: Arc<Resolver<FilmQuery, PosterCandidate>>,
    trailers: Arc<Resolver<FilmQuery, TrailerCandidate>>,
    criterion: Arc<Resolver<FilmQuery, CriterionLink>>,
    images: ImageValidator,
    /// Configuration keys a job cannot run without
    missing: HashMap<JobKind, Vec<String>>,
}

impl ProviderSet {
    /// Build the HTTP-backed provider chains
    pub fn build(config: &ProviderSetConfig, clock: Arc<dyn Clock>) -> Result<Self, JobError> {
        info!("Initializing enrichment providers");

        let client = build_client(&config.http)
            .map_err(|e| JobError::Configuration(format!("HTTP client: {}", e)))?;
        let images = ImageValidator::new(Arc::new(HttpImageProbe::new(client.clone())));
        let validator = Arc::new(images.clone());

        let mut missing: HashMap<JobKind, Vec<String>> = HashMap::new();

        let covers: Vec<Arc<dyn Provider<BookQuery, CoverCandidate>>> = vec![
            Arc::new(GoogleBooksClient::new(
                config.google_books.clone(),
                client.clone(),
                clock,
            )),
            Arc::new(OpenLibraryClient::new(config.open_library.clone(), client.clone())),
        ];

        let mut posters: Vec<Arc<dyn Provider<FilmQuery, PosterCandidate>>> = Vec::new();
        if has_key(&config.tmdb.api_key) {
            posters.push(Arc::new(TmdbClient::new(config.tmdb.clone(), client.clone())));
        } else {
            missing
                .entry(JobKind::EnrichFilmPosters)
                .or_default()
                .push("providers.tmdb_api_key".to_string());
        }
        if has_key(&config.omdb.api_key) {
            posters.push(Arc::new(OmdbClient::new(config.omdb.clone(), client.clone())));
        } else {
            info!("OMDB API key not set, poster fallback disabled");
        }

        let mut trailers: Vec<Arc<dyn Provider<FilmQuery, TrailerCandidate>>> = Vec::new();
        if has_key(&config.youtube.api_key) {
            trailers.push(Arc::new(YouTubeClient::new(config.youtube.clone(), client.clone())));
        } else {
            missing
                .entry(JobKind::EnrichTrailers)
                .or_default()
                .push("providers.youtube_api_key".to_string());
        }

        let criterion: Vec<Arc<dyn Provider<FilmQuery, CriterionLink>>> = vec![
            Arc::new(VerifiedCriterionLinks::new(config.criterion_links.clone())),
            Arc::new(CriterionSearchLink),
        ];

        for (kind, keys) in &missing {
            warn!("{} is not configured, missing: {}", kind, keys.join(", "));
        }

        let timeout = config.provider_timeout;
        let set = Self {
            covers: Arc::new(
                Resolver::new(covers)
                    .with_validator(validator.clone())
                    .with_timeout(timeout),
            ),
            posters: Arc::new(
                Resolver::new(posters)
                    .with_validator(validator)
                    .with_timeout(timeout),
            ),
            trailers: Arc::new(Resolver::new(trailers).with_timeout(timeout)),
            criterion: Arc::new(Resolver::new(criterion).with_timeout(timeout)),
            images,
            missing,
        };

        info!("Cover providers: {:?}", set.covers.provider_names());
        info!("Poster providers: {:?}", set.posters.provider_names());
        info!("Trailer providers: {:?}", set.trailers.provider_names());
        info!("Criterion providers: {:?}", set.criterion.provider_names());
        Ok(set)
    }

    /// Assemble a set from prepared chains
    pub fn from_parts(
        covers: Resolver<BookQuery, CoverCandidate>,
        posters: Resolver<FilmQuery, PosterCandidate>,
        trailers: Resolver<FilmQuery, TrailerCandidate>,
        criterion: Resolver<FilmQuery, CriterionLink>,
        images: ImageValidator,
    ) -> Self {
        Self {
            covers: Arc::new(covers),
            posters: Arc::new(posters),
            trailers: Arc::new(trailers),
            criterion: Arc::new(criterion),
            images,
            missing: HashMap::new(),
        }
    }

    /// Mark `key` as required but absent for `kind`
    pub fn with_missing(mut self, kind: JobKind, key: impl Into<String>) -> Self {
        self.missing.entry(kind).or_default().push(key.into());
        self
    }

    pub fn missing_config(&self, kind: JobKind) -> &[String] {
        self.missing.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ==================== Catalog ====================

/// Caller's restriction of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRequest {
    pub ids: Option<Vec<String>>,
    pub limit: Option<usize>,
}

/// Runs enrichment jobs by kind
#[derive(Clone)]
pub struct JobCatalog {
    db: Database,
    providers: Arc<ProviderSet>,
    settings: JobSettings,
}

impl JobCatalog {
    pub fn new(db: Database, providers: Arc<ProviderSet>, settings: JobSettings) -> Self {
        Self {
            db,
            providers,
            settings,
        }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    /// Fails when `kind` lacks required configuration
    pub fn check_configuration(&self, kind: JobKind) -> Result<(), JobError> {
        let missing = self.providers.missing_config(kind);
        if missing.is_empty() {
            return Ok(());
        }
        Err(JobError::Configuration(format!(
            "{} requires {}",
            kind,
            missing.join(", ")
        )))
    }

    /// Run one job to completion and record it.
    ///
    /// Configuration is checked before any row is selected.
    pub async fn run(&self, kind: JobKind, request: JobRequest) -> Result<JobSummary, JobError> {
        self.check_configuration(kind)?;

        let tuning = self.settings.tuning(kind);
        let limit = request
            .limit
            .unwrap_or(tuning.batch_size)
            .min(self.settings.max_batch_size);
        let scope = match request.ids {
            Some(ids) => JobScope::for_ids(ids, limit),
            None => JobScope::backlog(limit),
        };

        info!("Starting {} (limit: {}, delay: {:?})", kind, limit, tuning.delay);

        let started_at = Utc::now();
        let job = EnrichmentJob::new(tuning.delay);
        let db = self.db.clone();
        let providers = &self.providers;

        let summary = match kind {
            JobKind::EnrichBookCovers => {
                job.run(&BookCoverTask::new(db, providers.covers.clone()), &scope)
                    .await?
            }
            JobKind::EnrichFilmPosters => {
                job.run(&FilmPosterTask::new(db, providers.posters.clone()), &scope)
                    .await?
            }
            JobKind::EnrichTrailers => {
                job.run(&TrailerTask::new(db, providers.trailers.clone()), &scope)
                    .await?
            }
            JobKind::EnrichCriterionLinks => {
                job.run(&CriterionLinkTask::new(db, providers.criterion.clone()), &scope)
                    .await?
            }
            JobKind::ValidateImages => {
                job.run(&ImageSweepTask::new(db, providers.images.clone()), &scope)
                    .await?
            }
        };

        info!("{}", summary.message(kind.as_str()));
        record_metrics(kind, &summary);
        self.record(kind, &scope, &summary, started_at).await;

        Ok(summary)
    }

    async fn record(
        &self,
        kind: JobKind,
        scope: &JobScope,
        summary: &JobSummary,
        started_at: DateTime<Utc>,
    ) {
        let run = NewEnrichmentRun {
            job: kind.as_str().to_string(),
            started_at,
            finished_at: Utc::now(),
            processed: i64::from(summary.processed),
            successful: i64::from(summary.successful),
            failed: i64::from(summary.failed),
            skipped: i64::from(summary.skipped),
            aborted: summary.aborted,
            errors: summary.errors.clone(),
            scoped: scope.is_scoped(),
        };

        if let Err(e) = self.db.insert_enrichment_run(run).await {
            error!("Failed to record {} run: {}", kind, e);
        }
    }
}

fn record_metrics(kind: JobKind, summary: &JobSummary) {
    let job = kind.as_str();
    metrics::counter!("leafnode_enrichment_runs_total", "job" => job).increment(1);
    for (outcome, count) in [
        ("updated", summary.successful),
        ("unchanged", summary.skipped),
        ("failed", summary.failed),
    ] {
        metrics::counter!(
            "leafnode_enrichment_rows_total",
            "job" => job,
            "outcome" => outcome
        )
        .increment(u64::from(count));
    }
}
