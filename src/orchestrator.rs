//! Concurrent download of every configured source.
//!
//! Each source gets its own task. Outcomes are handed back over an unbounded
//! channel, so a worker never waits on the consumer. A coordinator task joins
//! every worker before dropping the last sender; the channel closing is
//! therefore the completion signal for the whole batch.
//!
//! Failures are collected, not propagated: a failing list never cancels its
//! siblings, and the caller decides what to do with the batch once all
//! network I/O is over.

use std::future::Future;

use futures_util::future::join_all;
use tokio::sync::mpsc;

use crate::error::{BatchError, FetchError};
use crate::fetch::{FetchedList, InvalidLine, ListFetcher};
use crate::source::Source;
use crate::{Error, Result};

/// Per-source result of a download.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Position of the source in the source list
    pub index: usize,
    pub label: String,
    pub url: String,
    pub domains: Vec<String>,
    pub warnings: Vec<InvalidLine>,
    pub error: Option<FetchError>,
}

impl FetchOutcome {
    /// Whether the source downloaded without a hard error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything a batch of downloads produced.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successful outcomes in arrival order
    pub outcomes: Vec<FetchOutcome>,
    /// Failed sources in arrival order
    pub errors: Vec<BatchError>,
    /// Number of invalid lines dropped across all sources
    pub warnings: usize,
}

impl BatchReport {
    /// Escalate collected failures into a single error.
    pub fn into_result(self) -> Result<Vec<FetchOutcome>> {
        if self.errors.is_empty() {
            Ok(self.outcomes)
        } else {
            Err(Error::FetchBatch(self.errors))
        }
    }
}

/// Download every source concurrently and wait for all of them.
///
/// Exactly one outcome is produced per source, whatever happens to its task.
pub async fn fetch_all(fetcher: &ListFetcher, sources: &[Source]) -> BatchReport {
    fetch_all_with(sources, |source| {
        let fetcher = fetcher.clone();
        async move { fetcher.fetch_list(&source.url).await }
    })
    .await
}

/// [`fetch_all`] with the per-source download supplied by the caller.
pub(crate) async fn fetch_all_with<F, Fut>(sources: &[Source], fetch: F) -> BatchReport
where
    F: FnMut(Source) -> Fut,
    Fut: Future<Output = FetchedList> + Send + 'static,
{
    collect(spawn_workers(sources, fetch)).await
}

/// Spawn one task per source plus the coordinator that closes the channel.
fn spawn_workers<F, Fut>(sources: &[Source], mut fetch: F) -> mpsc::UnboundedReceiver<FetchOutcome>
where
    F: FnMut(Source) -> Fut,
    Fut: Future<Output = FetchedList> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<FetchOutcome>();

    let mut workers = Vec::with_capacity(sources.len());
    for (index, source) in sources.iter().enumerate() {
        let job = source.clone();
        let download = fetch(source.clone());
        let tx = tx.clone();

        let handle = tokio::spawn(async move {
            log::info!("Downloading {}: {}", job.label, job.url);
            let list = download.await;
            log::debug!("{}: scanned {} lines", job.label, list.lines);
            // The receiver outlives every worker, so this cannot fail.
            let _ = tx.send(FetchOutcome {
                index,
                label: job.label,
                url: job.url,
                domains: list.domains,
                warnings: list.warnings,
                error: list.error,
            });
        });
        workers.push(((index, source.clone()), handle));
    }

    // Coordinator: the channel stays open until the last worker is joined.
    tokio::spawn(async move {
        let (jobs, handles): (Vec<(usize, Source)>, Vec<_>) = workers.into_iter().unzip();
        let results = join_all(handles).await;
        for ((index, source), result) in jobs.into_iter().zip(results) {
            if let Err(e) = result {
                log::error!("Download task for {} did not complete: {}", source.label, e);
                let _ = tx.send(FetchOutcome {
                    index,
                    label: source.label,
                    url: source.url.clone(),
                    domains: Vec::new(),
                    warnings: Vec::new(),
                    error: Some(FetchError::Worker {
                        url: source.url,
                        reason: e.to_string(),
                    }),
                });
            }
        }
        drop(tx);
    });

    rx
}

/// Drain the channel until the coordinator closes it.
async fn collect(mut rx: mpsc::UnboundedReceiver<FetchOutcome>) -> BatchReport {
    let mut report = BatchReport::default();
    while let Some(outcome) = rx.recv().await {
        report.warnings += outcome.warnings.len();
        match outcome.error {
            Some(error) => {
                log::error!("Failed to download {}: {}", outcome.label, error);
                report.errors.push(BatchError {
                    label: outcome.label,
                    error,
                });
            }
            None => {
                log::info!(
                    "Downloaded {}: {} domains, {} invalid lines",
                    outcome.label,
                    outcome.domains.len(),
                    outcome.warnings.len()
                );
                report.outcomes.push(outcome);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn outcome(label: &str) -> FetchOutcome {
        FetchOutcome {
            index: 0,
            label: label.to_string(),
            url: format!("http://x/{}.txt", label),
            domains: vec!["example.com".to_string()],
            warnings: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn test_into_result_without_errors() {
        let report = BatchReport {
            outcomes: vec![outcome("CN"), outcome("US")],
            errors: Vec::new(),
            warnings: 0,
        };
        let outcomes = report.into_result().unwrap();
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn test_into_result_escalates_errors() {
        let report = BatchReport {
            outcomes: vec![outcome("CN")],
            errors: vec![BatchError {
                label: "US".to_string(),
                error: FetchError::Worker {
                    url: "http://x/US.txt".to_string(),
                    reason: "task panicked".to_string(),
                },
            }],
            warnings: 0,
        };
        match report.into_result() {
            Err(Error::FetchBatch(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].label, "US");
            }
            other => panic!("unexpected result: {:?}", other.map(|o| o.len())),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_with_no_sources() {
        let fetcher = ListFetcher::new(&Default::default()).unwrap();
        let report = fetch_all(&fetcher, &[]).await;
        assert!(report.outcomes.is_empty());
        assert!(report.errors.is_empty());
    }

    fn numbered_sources(count: usize) -> Vec<Source> {
        (0..count)
            .map(|i| Source {
                label: format!("S{}", i),
                url: format!("http://x/{}.txt", i),
            })
            .collect()
    }

    fn listed(domains: &[&str]) -> FetchedList {
        FetchedList {
            domains: domains.iter().map(|d| d.to_string()).collect(),
            lines: domains.len(),
            ..FetchedList::default()
        }
    }

    #[tokio::test]
    async fn test_panicking_worker_still_yields_an_outcome() {
        let sources = numbered_sources(5);

        let report = fetch_all_with(&sources, |source| async move {
            if source.label == "S2" {
                panic!("list parser crashed");
            }
            listed(&["example.com"])
        })
        .await;

        assert_eq!(report.outcomes.len() + report.errors.len(), 5);
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].label, "S2");
        match &report.errors[0].error {
            FetchError::Worker { url, .. } => assert_eq!(url, "http://x/2.txt"),
            other => panic!("unexpected error: {}", other),
        }
        assert!(report.outcomes.iter().all(|o| o.label != "S2"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_workers_finish_before_consumer_drains() {
        let sources = numbered_sources(50);
        let finished = Arc::new(AtomicUsize::new(0));

        let counter = finished.clone();
        let rx = spawn_workers(&sources, move |source| {
            let counter = counter.clone();
            async move {
                let domain = format!("{}.example.com", source.label.to_lowercase());
                let list = listed(&[domain.as_str()]);
                counter.fetch_add(1, Ordering::SeqCst);
                list
            }
        });

        // Nobody reads the channel yet; every producer must still complete.
        tokio::time::timeout(Duration::from_secs(10), async {
            while finished.load(Ordering::SeqCst) < 50 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("workers blocked on an undrained channel");
        tokio::time::sleep(Duration::from_millis(50)).await;

        let report = collect(rx).await;
        assert!(report.errors.is_empty());
        assert_eq!(report.outcomes.len(), 50);

        let mut indices: Vec<usize> = report.outcomes.iter().map(|o| o.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..50).collect::<Vec<_>>());
        for outcome in &report.outcomes {
            assert_eq!(outcome.label, sources[outcome.index].label);
        }
    }
}
