use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};

use crate::config::toml_config::EnrichConfig;
use crate::core::registry::{ServiceRegistry, SharedService};
use crate::core::retry::{RetryExecutor, RetryPolicy};
use crate::domain::model::{EnrichmentReport, ServiceOutcome};
use crate::domain::ports::Subject;

pub const DEFAULT_CONCURRENCY: usize = 2;
/// tokio 的 semaphore 上限
pub const MAX_CONCURRENCY: usize = Semaphore::MAX_PERMITS;

struct Inner<S: Subject> {
    registry: ServiceRegistry<S>,
    executor: RetryExecutor,
    concurrency: usize,
}

/// Fans a subject out to registered enrichment services.
///
/// At most `concurrency` services run at once, each through the retry
/// executor. A `process` call never fails: every requested name gets exactly
/// one [`ServiceOutcome`] in the report.
///
/// Cloning is cheap and shares the registry, so one instance can be handed to
/// every collaborator that creates subjects.
pub struct Orchestrator<S: Subject> {
    inner: Arc<Inner<S>>,
}

impl<S: Subject> Clone for Orchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Subject> Default for Orchestrator<S> {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY, RetryPolicy::default())
    }
}

impl<S: Subject> Orchestrator<S> {
    /// `concurrency` is clamped into `1..=MAX_CONCURRENCY`.
    pub fn new(concurrency: usize, policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: ServiceRegistry::new(),
                executor: RetryExecutor::new(policy),
                concurrency: concurrency.clamp(1, MAX_CONCURRENCY),
            }),
        }
    }

    /// 依 TOML 配置建立 (worker 數與重試策略)，服務需另外註冊
    pub fn from_config(config: &EnrichConfig) -> Self {
        Self::new(config.concurrency(), config.retry_policy())
    }

    pub fn registry(&self) -> &ServiceRegistry<S> {
        &self.inner.registry
    }

    pub fn concurrency(&self) -> usize {
        self.inner.concurrency
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.inner.executor.policy()
    }

    pub fn register(&self, service: SharedService<S>) {
        self.inner.registry.register(service);
    }

    pub fn unregister(&self, name: &str) {
        self.inner.registry.unregister(name);
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.inner.registry.has(name)
    }

    pub fn service_names(&self) -> Vec<String> {
        self.inner.registry.list_names().into_iter().collect()
    }

    /// Run every service registered at call time.
    pub async fn process_all(&self, subject: Arc<S>) -> EnrichmentReport {
        self.process::<&str>(subject, &[]).await
    }

    /// Run the named services (all registered ones when `service_names` is
    /// empty) and wait until each has succeeded or exhausted its retries.
    ///
    /// Duplicate names are dispatched once. Unknown names produce a failed
    /// outcome without taking a worker slot.
    pub async fn process<N: AsRef<str>>(
        &self,
        subject: Arc<S>,
        service_names: &[N],
    ) -> EnrichmentReport {
        let started_at = Utc::now();
        let timer = Instant::now();
        let subject_id = subject.subject_id();

        let requested = if service_names.is_empty() {
            self.service_names()
        } else {
            dedup_names(service_names)
        };

        tracing::debug!(
            "📡 Dispatching {} service(s) for subject {}: {:?}",
            requested.len(),
            subject_id,
            requested
        );

        let mut outcomes = Vec::with_capacity(requested.len());
        let semaphore = Arc::new(Semaphore::new(self.inner.concurrency));
        let mut tasks = JoinSet::new();
        let mut names_by_task = HashMap::new();

        for (name, service) in self.inner.registry.resolve(&requested) {
            let Some(service) = service else {
                tracing::warn!("⚠️ Service {} is not registered", name);
                outcomes.push(ServiceOutcome::not_registered(&name));
                continue;
            };

            let started = Arc::new(AtomicU32::new(0));
            let handle = tasks.spawn(run_service(
                name.clone(),
                service,
                Arc::clone(&subject),
                self.inner.executor,
                Arc::clone(&semaphore),
                Arc::clone(&started),
            ));
            names_by_task.insert(handle.id(), (name, started));
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    names_by_task.remove(&id);
                    outcomes.push(outcome);
                }
                Err(join_err) => {
                    let Some((name, started)) = names_by_task.remove(&join_err.id()) else {
                        tracing::error!("❌ Lost track of an enrichment task: {}", join_err);
                        continue;
                    };
                    let reason = if join_err.is_panic() {
                        "panicked"
                    } else {
                        "was cancelled"
                    };
                    tracing::error!("❌ Service {} {} for subject {}", name, reason, subject_id);
                    outcomes.push(ServiceOutcome::failed(
                        &name,
                        format!("service {} {}", name, reason),
                        started.load(Ordering::Relaxed),
                    ));
                }
            }
        }

        let report = EnrichmentReport {
            subject_id,
            started_at,
            elapsed_ms: timer.elapsed().as_millis() as u64,
            outcomes,
        };

        tracing::info!(
            subject_id = %report.subject_id,
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            elapsed_ms = report.elapsed_ms,
            "Enrichment finished"
        );
        for outcome in report.failed() {
            tracing::debug!(
                "   {} failed: {}",
                outcome.service_name,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }

        report
    }

    /// Start `process` in the background and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_process(
        &self,
        subject: Arc<S>,
        service_names: Vec<String>,
    ) -> JoinHandle<EnrichmentReport> {
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.process(subject, &service_names).await })
    }
}

async fn run_service<S: Subject>(
    name: String,
    service: SharedService<S>,
    subject: Arc<S>,
    executor: RetryExecutor,
    semaphore: Arc<Semaphore>,
    started: Arc<AtomicU32>,
) -> ServiceOutcome {
    // Never closed, so acquisition only fails if the scheduler is torn down.
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return ServiceOutcome::failed(&name, "scheduler closed", 0);
    };

    match executor
        .execute_tracked(service.as_ref(), subject.as_ref(), &started)
        .await
    {
        Ok(attempts) => ServiceOutcome::succeeded(name, attempts),
        Err(exhausted) => {
            ServiceOutcome::failed(name, exhausted.last_error.to_string(), exhausted.attempts)
        }
    }
}

fn dedup_names<N: AsRef<str>>(names: &[N]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|n| n.as_ref())
        .filter(|n| seen.insert(*n))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        assert_eq!(
            dedup_names(&["b", "a", "b", "c", "a"]),
            vec!["b".to_string(), "a".to_string(), "c".to_string()]
        );
    }

    struct Probe;

    impl Subject for Probe {
        fn subject_id(&self) -> String {
            "probe".to_string()
        }
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let orchestrator = Orchestrator::<Probe>::new(0, RetryPolicy::default());
        assert_eq!(orchestrator.concurrency(), 1);
    }

    #[test]
    fn test_huge_concurrency_is_clamped_to_semaphore_limit() {
        let orchestrator = Orchestrator::<Probe>::new(usize::MAX, RetryPolicy::default());
        assert_eq!(orchestrator.concurrency(), MAX_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_process_with_huge_concurrency_does_not_panic() {
        let orchestrator = Orchestrator::<Probe>::new(i64::MAX as usize, RetryPolicy::default());
        let report = orchestrator.process(Arc::new(Probe), &["missing"]).await;

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(
            report.outcomes[0].error.as_deref(),
            Some("service missing not registered")
        );
    }

    #[test]
    fn test_from_config_uses_configured_settings() {
        let config = EnrichConfig::from_toml_str(
            "[orchestrator]\nconcurrency = 5\n\n[retry]\nbase_delay_ms = 10\ncap_delay_ms = 40\ndefault_max_retries = 1\n",
        )
        .unwrap();

        let orchestrator = Orchestrator::<Probe>::from_config(&config);

        assert_eq!(orchestrator.concurrency(), 5);
        assert_eq!(orchestrator.retry_policy(), &config.retry_policy());
        assert_eq!(orchestrator.retry_policy().default_max_retries, 1);
        assert!(orchestrator.service_names().is_empty());
    }

    #[test]
    fn test_from_default_config_matches_default() {
        let orchestrator = Orchestrator::<Probe>::from_config(&EnrichConfig::default());

        assert_eq!(orchestrator.concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(orchestrator.retry_policy(), &RetryPolicy::default());
    }
}
