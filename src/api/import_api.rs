// ==========================================
// Apparel Season Reconciliation - Import API
// ==========================================
// Orchestrates the import pipelines: file in, parse, reconcile where
// applicable, persist in chunks, append the audit log.
//
// Dry runs share the entire parse path with live runs and report the
// identical summary statistics; the only difference is that nothing is
// persisted and no log entry is written.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfig};
use crate::domain::records::{
    record_id, CostRecord, ImportLogEntry, ImportSummary, InventoryItem, PricingItem,
    ProductRecord, ReconcileStats, SalesItem,
};
use crate::domain::types::{FileType, ReplaceScope, Table};
use crate::engine::ReconciliationEngine;
use crate::importer::parsers::{landed_cost, line_list, pricing, sales};
use crate::importer::read_workbook;
use crate::persister::{BatchPersister, PersistOptions, PersistReport};
use crate::repository::{ImportLogRepository, SqliteTableStore, TableRow, TableStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

// ==========================================
// Request / response shapes
// ==========================================

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Parse and report only; no persistence, no log entry.
    pub dry_run: bool,
    /// Delete matching rows before insert (season-scoped where the
    /// records carry seasons).
    pub replace_existing: bool,
}

impl ImportOptions {
    pub fn live_replace() -> Self {
        Self {
            dry_run: false,
            replace_existing: true,
        }
    }

    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            replace_existing: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    /// Records persisted (live) or records that would be persisted (dry run).
    pub count: usize,
    pub message: String,
    pub by_season: BTreeMap<String, usize>,
    pub columns_matched: Vec<String>,
    pub failed_rows: usize,
    pub dry_run: bool,
    pub elapsed_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonImportResponse {
    pub products: usize,
    pub costs: usize,
    pub pricing: usize,
    pub stats: ReconcileStats,
    pub failed_rows: usize,
    pub message: String,
    pub dry_run: bool,
    pub elapsed_ms: i64,
}

/// Pre-parsed rows handed over by the reporting collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub record_type: Table,
    pub season: Option<String>,
    pub data: Vec<Value>,
    pub replace_existing: bool,
    /// Validate and report only; no persistence, no log entry.
    #[serde(default)]
    pub dry_run: bool,
}

// ==========================================
// Row conversion
// ==========================================
// Every persisted record becomes a TableRow: key for keyed tables,
// season for season-scoped replace, full record as JSON payload.

pub fn product_row(record: &ProductRecord) -> ApiResult<TableRow> {
    Ok(TableRow::new(
        Some(record.id.clone()),
        Some(record.season.clone()),
        serde_json::to_value(record).map_err(|e| ApiError::InternalError(e.to_string()))?,
    ))
}

pub fn cost_row(record: &CostRecord) -> ApiResult<TableRow> {
    Ok(TableRow::new(
        Some(record.id.clone()),
        Some(record.season.clone()),
        serde_json::to_value(record).map_err(|e| ApiError::InternalError(e.to_string()))?,
    ))
}

pub fn pricing_row(item: &PricingItem) -> ApiResult<TableRow> {
    Ok(TableRow::new(
        Some(record_id(&item.style_number, &item.color_code, &item.season)),
        Some(item.season.clone()),
        serde_json::to_value(item).map_err(|e| ApiError::InternalError(e.to_string()))?,
    ))
}

/// Sales lines are not unique: no key, duplicates are legitimate data.
pub fn sales_row(item: &SalesItem) -> ApiResult<TableRow> {
    Ok(TableRow::new(
        None,
        Some(item.season.clone()),
        serde_json::to_value(item).map_err(|e| ApiError::InternalError(e.to_string()))?,
    ))
}

pub fn inventory_row(item: &InventoryItem) -> ApiResult<TableRow> {
    Ok(TableRow::new(
        Some(format!(
            "{}_{}_{}",
            item.style_number, item.warehouse, item.period
        )),
        None,
        serde_json::to_value(item).map_err(|e| ApiError::InternalError(e.to_string()))?,
    ))
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi<S: TableStore> {
    store: Arc<S>,
    import_log: ImportLogRepository,
    config: ImportConfig,
}

impl ImportApi<SqliteTableStore> {
    /// Production wiring: one SQLite database holds the tables, the
    /// import log and the config overrides.
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let store = Arc::new(SqliteTableStore::new(db_path)?);
        let conn = store.connection();
        let import_log = ImportLogRepository::from_connection(Arc::clone(&conn))?;
        let config = ConfigManager::from_connection(conn)?.import_config()?;
        Ok(Self {
            store,
            import_log,
            config,
        })
    }
}

impl<S: TableStore> ImportApi<S> {
    pub fn with_store(store: Arc<S>, import_log: ImportLogRepository, config: ImportConfig) -> Self {
        Self {
            store,
            import_log,
            config,
        }
    }

    fn persister(&self) -> BatchPersister<S> {
        BatchPersister::new(Arc::clone(&self.store), self.config.retry_policy())
    }

    fn persist_options(&self, table: Table, replace_existing: bool) -> PersistOptions {
        PersistOptions {
            chunk_size: self.config.chunk_size(table),
            replace_existing,
            scope: ReplaceScope::Seasons,
        }
    }

    fn log_run(
        &self,
        file_name: &str,
        file_type: &str,
        season: Option<String>,
        record_count: usize,
    ) -> ApiResult<()> {
        self.import_log.append(&ImportLogEntry {
            id: Uuid::new_v4().to_string(),
            file_name: file_name.to_string(),
            file_type: file_type.to_string(),
            season,
            record_count,
            imported_at: Utc::now(),
        })?;
        Ok(())
    }

    /// Import a standalone pricing or sales file.
    ///
    /// Line-list and landed-cost files go through `import_season`; they
    /// are reconciliation inputs, not standalone tables.
    pub async fn import_file(
        &self,
        path: &str,
        file_type: FileType,
        options: &ImportOptions,
    ) -> ApiResult<ImportResponse> {
        let started = Instant::now();
        let workbook = read_workbook(Path::new(path))?;
        let file_name = workbook.file_name.clone();

        let (table, rows, summary): (Table, Vec<TableRow>, ImportSummary) = match file_type {
            FileType::Pricing => {
                let outcome = pricing::parse(&workbook);
                let rows = outcome
                    .items
                    .iter()
                    .map(pricing_row)
                    .collect::<ApiResult<Vec<_>>>()?;
                (Table::Pricing, rows, outcome.summary)
            }
            FileType::Sales => {
                let outcome = sales::parse(&workbook);
                let rows = outcome
                    .items
                    .iter()
                    .map(sales_row)
                    .collect::<ApiResult<Vec<_>>>()?;
                (Table::Sales, rows, outcome.summary)
            }
            FileType::LineList | FileType::LandedCost => {
                return Err(ApiError::InvalidInput(format!(
                    "{} files are reconciliation inputs; use import_season",
                    file_type
                )));
            }
        };

        if options.dry_run {
            return Ok(ImportResponse {
                count: summary.emitted,
                message: format!("dry run: {} records parsed from {}", summary.emitted, file_name),
                by_season: summary.by_season,
                columns_matched: summary.columns_matched,
                failed_rows: 0,
                dry_run: true,
                elapsed_ms: started.elapsed().as_millis() as i64,
            });
        }

        let report = self
            .persister()
            .persist(table, rows, &self.persist_options(table, options.replace_existing))
            .await?;

        self.log_run(&file_name, &file_type.to_string(), None, report.inserted)?;
        info!(file = %file_name, table = %table, inserted = report.inserted, "file import complete");

        Ok(ImportResponse {
            count: report.inserted,
            message: import_message(&report, &file_name),
            by_season: summary.by_season,
            columns_matched: summary.columns_matched,
            failed_rows: report.failed_rows,
            dry_run: false,
            elapsed_ms: started.elapsed().as_millis() as i64,
        })
    }

    /// The quarterly season run: line list plus optional landed-cost and
    /// pricing files, reconciled and persisted Products then Costs then
    /// Pricing. Products must land before Costs; the reporting layer
    /// joins costs onto products by shared id.
    pub async fn import_season(
        &self,
        line_list_path: &str,
        landed_path: Option<&str>,
        pricing_path: Option<&str>,
        target_season: &str,
        options: &ImportOptions,
    ) -> ApiResult<SeasonImportResponse> {
        let started = Instant::now();
        if target_season.trim().is_empty() {
            return Err(ApiError::InvalidInput("target season is required".to_string()));
        }

        let line_workbook = read_workbook(Path::new(line_list_path))?;
        let file_name = line_workbook.file_name.clone();
        let line_outcome = line_list::parse(&line_workbook);

        // The run is scoped to one season; line-list rows for other
        // seasons are set aside, not errors.
        let total_parsed = line_outcome.items.len();
        let season_items: Vec<_> = line_outcome
            .items
            .into_iter()
            .filter(|item| item.season == target_season)
            .collect();
        if season_items.len() < total_parsed {
            warn!(
                season = target_season,
                kept = season_items.len(),
                skipped = total_parsed - season_items.len(),
                "line-list rows outside the target season skipped"
            );
        }

        let landed_items = match landed_path {
            Some(path) => landed_cost::parse(&read_workbook(Path::new(path))?).items,
            None => Vec::new(),
        };
        let pricing_items = match pricing_path {
            Some(path) => pricing::parse(&read_workbook(Path::new(path))?).items,
            None => Vec::new(),
        };

        let engine = ReconciliationEngine::new();
        let output = engine.reconcile(&season_items, &landed_items, &pricing_items, target_season);

        if options.dry_run {
            return Ok(SeasonImportResponse {
                products: output.products.len(),
                costs: output.costs.len(),
                pricing: pricing_items.len(),
                stats: output.stats,
                failed_rows: 0,
                message: format!(
                    "dry run: {} products reconciled for {}",
                    output.products.len(),
                    target_season
                ),
                dry_run: true,
                elapsed_ms: started.elapsed().as_millis() as i64,
            });
        }

        let persister = self.persister();

        let product_rows = output
            .products
            .iter()
            .map(product_row)
            .collect::<ApiResult<Vec<_>>>()?;
        let product_report = persister
            .persist(
                Table::Products,
                product_rows,
                &self.persist_options(Table::Products, options.replace_existing),
            )
            .await?;

        let cost_rows = output
            .costs
            .iter()
            .map(cost_row)
            .collect::<ApiResult<Vec<_>>>()?;
        let cost_report = persister
            .persist(
                Table::Costs,
                cost_rows,
                &self.persist_options(Table::Costs, options.replace_existing),
            )
            .await?;

        let pricing_report = if pricing_items.is_empty() {
            PersistReport::default()
        } else {
            let pricing_rows = pricing_items
                .iter()
                .map(pricing_row)
                .collect::<ApiResult<Vec<_>>>()?;
            persister
                .persist(
                    Table::Pricing,
                    pricing_rows,
                    &self.persist_options(Table::Pricing, options.replace_existing),
                )
                .await?
        };

        self.log_run(
            &file_name,
            &FileType::LineList.to_string(),
            Some(target_season.to_string()),
            product_report.inserted,
        )?;

        let failed_rows =
            product_report.failed_rows + cost_report.failed_rows + pricing_report.failed_rows;
        info!(
            season = target_season,
            products = product_report.inserted,
            costs = cost_report.inserted,
            pricing = pricing_report.inserted,
            failed_rows,
            "season import complete"
        );

        Ok(SeasonImportResponse {
            products: product_report.inserted,
            costs: cost_report.inserted,
            pricing: pricing_report.inserted,
            stats: output.stats,
            failed_rows,
            message: format!(
                "season {} imported: {} products, {} costs",
                target_season, product_report.inserted, cost_report.inserted
            ),
            dry_run: false,
            elapsed_ms: started.elapsed().as_millis() as i64,
        })
    }

    /// Import pre-parsed records. Each value is validated against the
    /// record shape for its table before anything is persisted; one bad
    /// record rejects the whole request (the caller sent a malformed
    /// batch, not a malformed spreadsheet row).
    pub async fn import_records(&self, request: ImportRequest) -> ApiResult<ImportResponse> {
        let started = Instant::now();
        if request.data.is_empty() {
            return Err(ApiError::InvalidInput("no records supplied".to_string()));
        }

        let rows = validate_records(&request)?;

        let mut by_season: BTreeMap<String, usize> = BTreeMap::new();
        for row in &rows {
            let bucket = row.season.clone().unwrap_or_else(|| "Unknown".to_string());
            *by_season.entry(bucket).or_insert(0) += 1;
        }

        let table = request.record_type;

        if request.dry_run {
            return Ok(ImportResponse {
                count: rows.len(),
                message: format!(
                    "dry run: {} {} records validated",
                    rows.len(),
                    table.name()
                ),
                by_season,
                columns_matched: Vec::new(),
                failed_rows: 0,
                dry_run: true,
                elapsed_ms: started.elapsed().as_millis() as i64,
            });
        }

        let report = self
            .persister()
            .persist(
                table,
                rows,
                &PersistOptions {
                    chunk_size: self.config.chunk_size(table),
                    replace_existing: request.replace_existing,
                    scope: match request.season {
                        Some(_) => ReplaceScope::Seasons,
                        None => ReplaceScope::Table,
                    },
                },
            )
            .await?;

        self.log_run("direct", table.name(), request.season.clone(), report.inserted)?;
        info!(table = %table, inserted = report.inserted, "record import complete");

        Ok(ImportResponse {
            count: report.inserted,
            message: import_message(&report, table.name()),
            by_season,
            columns_matched: Vec::new(),
            failed_rows: report.failed_rows,
            dry_run: false,
            elapsed_ms: started.elapsed().as_millis() as i64,
        })
    }

    /// Recent import-log entries, newest first.
    pub fn import_history(&self, limit: usize) -> ApiResult<Vec<ImportLogEntry>> {
        Ok(self.import_log.list_recent(limit)?)
    }
}

fn import_message(report: &PersistReport, source: &str) -> String {
    if report.chunks_failed == 0 {
        format!("{} records imported from {}", report.inserted, source)
    } else {
        format!(
            "{} records imported from {}; {} rows in {} chunks failed",
            report.inserted, source, report.failed_rows, report.chunks_failed
        )
    }
}

/// Deserialize each value into the typed record for the table, then
/// convert to stored rows. A season supplied on the request overrides
/// each record's own season field before deserialization, so the stored
/// payload, the season column and any season-derived key stay in
/// agreement. Inventory records carry no season and are unaffected.
fn validate_records(request: &ImportRequest) -> ApiResult<Vec<TableRow>> {
    let season_override = request.season.as_deref();
    request
        .data
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let value = apply_season_override(value, season_override);
            match request.record_type {
                Table::Products => {
                    let record: ProductRecord = typed(&value, index)?;
                    product_row(&record)
                }
                Table::Costs => {
                    let record: CostRecord = typed(&value, index)?;
                    cost_row(&record)
                }
                Table::Pricing => {
                    let item: PricingItem = typed(&value, index)?;
                    pricing_row(&item)
                }
                Table::Sales => {
                    let item: SalesItem = typed(&value, index)?;
                    sales_row(&item)
                }
                Table::Inventory => {
                    let item: InventoryItem = typed(&value, index)?;
                    inventory_row(&item)
                }
            }
        })
        .collect()
}

fn apply_season_override(value: &Value, season: Option<&str>) -> Value {
    let mut value = value.clone();
    if let (Some(season), Value::Object(map)) = (season, &mut value) {
        map.insert(
            "season".to_string(),
            Value::String(season.to_string()),
        );
    }
    value
}

fn typed<T: serde::de::DeserializeOwned>(value: &Value, index: usize) -> ApiResult<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| ApiError::ValidationError(format!("record {}: {}", index, e)))
}
