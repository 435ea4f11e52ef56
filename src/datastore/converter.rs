use tracing::{debug, info, warn};

use super::DataStore;
use crate::error::Result;

/// Progress is logged every this many keys within a table
const PROGRESS_INTERVAL: usize = 100;

/// Totals from a finished conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionReport {
    pub tables: usize,
    pub keys: usize,
}

/// Copy every value from `source` into `destination`, then dispose `source`.
///
/// Existing destination keys are overwritten. Nothing is rolled back if a
/// copy fails part way, but re-running from scratch is safe. `source` is
/// consumed so it cannot be read after disposal.
pub async fn convert_datastore<D, S>(destination: &D, mut source: S) -> Result<ConversionReport>
where
    D: DataStore + ?Sized,
    S: DataStore,
{
    info!("Starting datastore conversion. This could take time...");
    warn!("DO NOT SHUTDOWN UNTIL THIS IS COMPLETE, DATA LOSS COULD OCCUR");

    let mut report = ConversionReport::default();

    for table in source.list_tables().await? {
        info!("Converting table {}... 0", table);
        let mut copied = 0;

        for section in source.list_sections(&table).await? {
            for key in source.list_keys(&table, &section).await? {
                let Some(value) = source.get_string(&table, &section, &key).await? else {
                    debug!("Skipping {}/{}/{}: no value", table, section, key);
                    continue;
                };

                destination
                    .set_string(&table, &section, &key, &value)
                    .await?;
                copied += 1;

                if copied % PROGRESS_INTERVAL == 0 {
                    info!("Converting table {}... {}", table, copied);
                }
            }
        }

        info!("Converted table {}: {} keys", table, copied);
        report.tables += 1;
        report.keys += copied;
    }

    source.dispose().await?;
    info!(
        "Finished converting datastore ({} tables, {} keys)",
        report.tables, report.keys
    );

    Ok(report)
}
