use futures::stream::{self, StreamExt};
use log::{debug, info, warn};

use aksmarket_market_data::Sleeper;

use super::batch_model::{BatchOptions, BatchReport, DroppedSymbol};
use crate::stocks::RowSource;

/// Fetch rows for `symbols` in contiguous batches.
///
/// Each batch runs at most `min(workers, batch.len())` fetches at once and
/// finishes before the next one starts. The delay is slept between batches,
/// never after the last. Failed symbols end up in [`BatchReport::dropped`].
pub async fn fetch_rows<S>(
    source: &S,
    symbols: &[String],
    options: &BatchOptions,
    sleeper: &dyn Sleeper,
) -> BatchReport
where
    S: RowSource + ?Sized,
{
    let batch_size = options.batch_size.max(1);
    let workers = options.workers.max(1);
    let days = options.days;
    let total_batches = symbols.len().div_ceil(batch_size);

    let mut report = BatchReport {
        batches: total_batches,
        ..Default::default()
    };

    for (index, batch) in symbols.chunks(batch_size).enumerate() {
        let batch_num = index + 1;
        info!(
            "[Batch {}/{}] Fetching {} symbols",
            batch_num,
            total_batches,
            batch.len()
        );

        let fetches: Vec<_> = batch
            .iter()
            .map(|symbol| async move {
                let result = source.fetch_row(symbol, days).await;
                (symbol, result)
            })
            .collect();
        let mut results = stream::iter(fetches).buffer_unordered(workers.min(batch.len()));

        while let Some((symbol, result)) = results.next().await {
            match result {
                Ok(row) => report.rows.push(row),
                Err(e) => {
                    warn!("Error fetching data for {}: {}", symbol, e);
                    report.dropped.push(DroppedSymbol {
                        symbol: symbol.clone(),
                        reason: e.to_string(),
                        rate_limited: e.is_rate_limited(),
                    });
                }
            }
        }

        if batch_num < total_batches {
            let delay = options.delay.next();
            debug!(
                "Batch {} complete. Waiting {:.1}s before next batch",
                batch_num,
                delay.as_secs_f64()
            );
            sleeper.sleep(delay).await;
        }
    }

    if report.dropped.is_empty() {
        info!("Fetched {} of {} symbols", report.rows.len(), symbols.len());
    } else {
        warn!(
            "Fetched {} of {} symbols; dropped: {}",
            report.rows.len(),
            symbols.len(),
            report.dropped_symbols().join(", ")
        );
    }

    report
}
