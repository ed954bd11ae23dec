// ==========================================
// Apparel Season Reconciliation - Reconciliation Engine
// ==========================================
// Merges line-list, landed-cost and pricing records for one season into
// unified Product/Cost records. Pure business rules, no I/O.
//
// Price priority is a strict chain, not an average: pricing sheet first,
// then line-list figures. Cost data is modeled at style granularity;
// price and description at style+color granularity.
// ==========================================

use crate::domain::records::{
    record_id, CostRecord, LandedCostItem, LineListItem, PricingItem, ProductRecord,
    ReconcileStats,
};
use crate::domain::types::CostSource;
use std::collections::HashMap;
use tracing::{debug, info};

/// Margin percentage from wholesale and landed cost.
/// Zero when wholesale is non-positive; never divides by zero.
pub fn margin_pct(wholesale: f64, landed: f64) -> f64 {
    if wholesale <= 0.0 {
        0.0
    } else {
        (wholesale - landed) / wholesale * 100.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileOutput {
    pub products: Vec<ProductRecord>,
    pub costs: Vec<CostRecord>,
    pub stats: ReconcileStats,
}

pub struct ReconciliationEngine;

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine
    }

    /// Reconcile one season.
    ///
    /// Steps:
    /// 1. Filter landed costs to the target season.
    /// 2. Dedup landed costs by style, keeping the greatest
    ///    date_requested (ties: last seen wins).
    /// 3. Apply pricing-sheet overrides by (style, color) before cost
    ///    merging, so the margin reflects the overridden wholesale.
    /// 4. Merge landed costs by style; recompute margin; tag cost source.
    /// 5. Emit one Product and one Cost per surviving line-list row,
    ///    sharing a synthetic id.
    ///
    /// A landed cost with no line-list counterpart is dropped, not
    /// promoted to a synthetic product; the drop is counted in stats.
    pub fn reconcile(
        &self,
        line_list: &[LineListItem],
        landed_costs: &[LandedCostItem],
        pricing: &[PricingItem],
        target_season: &str,
    ) -> ReconcileOutput {
        let landed_for_season: Vec<&LandedCostItem> = landed_costs
            .iter()
            .filter(|item| item.season == target_season)
            .collect();

        let deduped = dedup_landed(&landed_for_season);
        let price_overrides = pricing_by_key(pricing);

        let mut stats = ReconcileStats {
            line_list_rows: line_list.len(),
            landed_rows: landed_for_season.len(),
            landed_deduped: deduped.len(),
            ..ReconcileStats::default()
        };

        let mut matched_styles: HashMap<&str, bool> =
            deduped.keys().map(|style| (*style, false)).collect();

        let mut products = Vec::with_capacity(line_list.len());
        let mut costs = Vec::with_capacity(line_list.len());

        for item in line_list {
            let id = record_id(&item.style_number, &item.color_code, &item.season);

            // Pricing-sheet override: never replace with a zero/missing value.
            let mut wholesale = item.wholesale_us;
            let mut msrp = item.msrp_us;
            if let Some(price) =
                price_overrides.get(&(item.style_number.as_str(), item.color_code.as_str()))
            {
                let mut overridden = false;
                if price.price > 0.0 {
                    wholesale = price.price;
                    overridden = true;
                }
                if price.msrp > 0.0 {
                    msrp = price.msrp;
                    overridden = true;
                }
                if overridden {
                    stats.pricing_overrides += 1;
                    debug!(
                        style = %item.style_number,
                        color = %item.color_code,
                        price = price.price,
                        "pricing sheet override applied"
                    );
                }
            }

            // Landed-cost match: by style only. A match with landed <= 0
            // is treated as no match, not as an error.
            let landed_match = deduped
                .get(item.style_number.as_str())
                .filter(|lc| lc.landed_cost > 0.0);

            let (fob_cost, landed_cost, margin, cost_source, date_requested) = match landed_match {
                Some(lc) => {
                    stats.landed_matched += 1;
                    if let Some(flag) = matched_styles.get_mut(item.style_number.as_str()) {
                        *flag = true;
                    }
                    (
                        lc.fob_cost,
                        lc.landed_cost,
                        margin_pct(wholesale, lc.landed_cost),
                        CostSource::LandedSheet,
                        lc.date_requested,
                    )
                }
                None => {
                    // Keep the line list's own figures; only recompute
                    // margin when both sides are present.
                    let margin = if wholesale > 0.0 && item.landed_cost > 0.0 {
                        margin_pct(wholesale, item.landed_cost)
                    } else {
                        item.margin
                    };
                    (
                        item.fob_cost,
                        item.landed_cost,
                        margin,
                        CostSource::LineList,
                        None,
                    )
                }
            };

            products.push(ProductRecord {
                id: id.clone(),
                style_number: item.style_number.clone(),
                style_desc: item.style_desc.clone(),
                color_code: item.color_code.clone(),
                color_desc: item.color_desc.clone(),
                season: item.season.clone(),
                season_type: item.season_type,
                factory: item.factory.clone(),
                country_of_origin: item.country_of_origin.clone(),
                designer: item.designer.clone(),
                developer: item.developer.clone(),
                msrp,
                msrp_ca: item.msrp_ca,
                wholesale,
                wholesale_ca: item.wholesale_ca,
                fob_cost,
                landed_cost,
                margin,
                carry_over: item.carry_over,
                top_seller: item.top_seller,
                smu: item.smu,
                map_protected: item.map_protected,
                cost_source,
            });

            costs.push(CostRecord {
                id,
                style_number: item.style_number.clone(),
                season: item.season.clone(),
                fob_cost,
                duty: landed_match.map(|lc| lc.duty).unwrap_or(0.0),
                tariff: landed_match.map(|lc| lc.tariff).unwrap_or(0.0),
                freight: landed_match.map(|lc| lc.freight).unwrap_or(0.0),
                overhead: landed_match.map(|lc| lc.overhead).unwrap_or(0.0),
                landed_cost,
                margin,
                cost_source,
                date_requested,
            });
        }

        stats.landed_unmatched = matched_styles.values().filter(|hit| !**hit).count();

        info!(
            season = %target_season,
            products = products.len(),
            landed_matched = stats.landed_matched,
            landed_unmatched = stats.landed_unmatched,
            pricing_overrides = stats.pricing_overrides,
            "reconciliation complete"
        );

        ReconcileOutput {
            products,
            costs,
            stats,
        }
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Dedup landed costs by style number, keeping the record with the
/// greatest date_requested. Ties (and missing dates) resolve
/// last-seen-wins; `None` sorts earliest.
fn dedup_landed<'a>(items: &[&'a LandedCostItem]) -> HashMap<&'a str, &'a LandedCostItem> {
    let mut by_style: HashMap<&str, &LandedCostItem> = HashMap::new();
    for item in items {
        match by_style.get(item.style_number.as_str()) {
            Some(existing) if existing.date_requested > item.date_requested => {}
            _ => {
                by_style.insert(item.style_number.as_str(), item);
            }
        }
    }
    by_style
}

fn pricing_by_key(pricing: &[PricingItem]) -> HashMap<(&str, &str), &PricingItem> {
    pricing
        .iter()
        .map(|item| ((item.style_number.as_str(), item.color_code.as_str()), item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn line_item(style: &str, color: &str, wholesale: f64, landed: f64) -> LineListItem {
        LineListItem {
            style_number: style.to_string(),
            color_code: color.to_string(),
            season: "26FA".to_string(),
            wholesale_us: wholesale,
            landed_cost: landed,
            margin: 12.5,
            ..LineListItem::default()
        }
    }

    fn landed_item(style: &str, landed: f64, day: u32) -> LandedCostItem {
        LandedCostItem {
            style_number: style.to_string(),
            season: "26FA".to_string(),
            fob_cost: landed / 2.0,
            landed_cost: landed,
            date_requested: NaiveDate::from_ymd_opt(2026, 3, day),
            ..LandedCostItem::default()
        }
    }

    #[test]
    fn test_margin_pct() {
        assert_eq!(margin_pct(50.0, 20.0), 60.0);
        assert_eq!(margin_pct(0.0, 20.0), 0.0);
        assert_eq!(margin_pct(-5.0, 20.0), 0.0);
    }

    #[test]
    fn test_dedup_keeps_latest_request() {
        let engine = ReconciliationEngine::new();
        let line = vec![line_item("A", "BLK", 45.0, 0.0)];
        let landed = vec![landed_item("A", 10.0, 1), landed_item("A", 12.0, 2)];

        let out = engine.reconcile(&line, &landed, &[], "26FA");
        assert_eq!(out.products[0].landed_cost, 12.0);
        assert_eq!(out.stats.landed_deduped, 1);
    }

    #[test]
    fn test_dedup_tie_last_seen_wins() {
        let engine = ReconciliationEngine::new();
        let line = vec![line_item("A", "BLK", 45.0, 0.0)];
        let mut first = landed_item("A", 10.0, 5);
        let mut second = landed_item("A", 12.0, 5);
        first.freight = 1.0;
        second.freight = 2.0;

        let out = engine.reconcile(&line, &[first, second], &[], "26FA");
        assert_eq!(out.costs[0].freight, 2.0);
    }

    #[test]
    fn test_pricing_priority_and_margin() {
        // Pricing price 50 beats line-list wholesale 45; with landed 20
        // the margin is (50-20)/50*100 = 60.
        let engine = ReconciliationEngine::new();
        let line = vec![line_item("A", "BLK", 45.0, 0.0)];
        let landed = vec![landed_item("A", 20.0, 1)];
        let pricing = vec![PricingItem {
            style_number: "A".to_string(),
            color_code: "BLK".to_string(),
            season: "26FA".to_string(),
            price: 50.0,
            msrp: 110.0,
            ..PricingItem::default()
        }];

        let out = engine.reconcile(&line, &landed, &pricing, "26FA");
        let product = &out.products[0];
        assert_eq!(product.wholesale, 50.0);
        assert_eq!(product.msrp, 110.0);
        assert_eq!(product.margin, 60.0);
        assert_eq!(product.cost_source, CostSource::LandedSheet);
        assert_eq!(out.stats.pricing_overrides, 1);
    }

    #[test]
    fn test_zero_price_override_ignored() {
        let engine = ReconciliationEngine::new();
        let line = vec![line_item("A", "BLK", 45.0, 0.0)];
        let pricing = vec![PricingItem {
            style_number: "A".to_string(),
            color_code: "BLK".to_string(),
            price: 0.0,
            msrp: 0.0,
            ..PricingItem::default()
        }];

        let out = engine.reconcile(&line, &[], &pricing, "26FA");
        assert_eq!(out.products[0].wholesale, 45.0);
        assert_eq!(out.stats.pricing_overrides, 0);
    }

    #[test]
    fn test_landed_zero_treated_as_no_match() {
        let engine = ReconciliationEngine::new();
        let line = vec![line_item("A", "BLK", 45.0, 18.0)];
        let landed = vec![landed_item("A", 0.0, 1)];

        let out = engine.reconcile(&line, &landed, &[], "26FA");
        let product = &out.products[0];
        assert_eq!(product.cost_source, CostSource::LineList);
        assert_eq!(product.landed_cost, 18.0);
        assert_eq!(product.margin, margin_pct(45.0, 18.0));
        assert_eq!(out.stats.landed_matched, 0);
    }

    #[test]
    fn test_no_match_keeps_original_margin_when_costs_incomplete() {
        let engine = ReconciliationEngine::new();
        let line = vec![line_item("A", "BLK", 45.0, 0.0)];

        let out = engine.reconcile(&line, &[], &[], "26FA");
        // Neither side present: the sheet's own margin value survives.
        assert_eq!(out.products[0].margin, 12.5);
    }

    #[test]
    fn test_cost_match_is_style_level_not_color_level() {
        let engine = ReconciliationEngine::new();
        let line = vec![
            line_item("A", "BLK", 50.0, 0.0),
            line_item("A", "NVY", 50.0, 0.0),
        ];
        let landed = vec![landed_item("A", 20.0, 1)];

        let out = engine.reconcile(&line, &landed, &[], "26FA");
        assert_eq!(out.products.len(), 2);
        assert!(out
            .products
            .iter()
            .all(|p| p.cost_source == CostSource::LandedSheet && p.landed_cost == 20.0));
    }

    #[test]
    fn test_landed_without_line_list_entry_is_dropped() {
        // Pinned current behavior: a cost request for a style absent from
        // the line list does not become a synthetic product. A change
        // here must be a deliberate, visible decision.
        let engine = ReconciliationEngine::new();
        let landed = vec![landed_item("GHOST", 20.0, 1)];

        let out = engine.reconcile(&[], &landed, &[], "26FA");
        assert!(out.products.is_empty());
        assert!(out.costs.is_empty());
        assert_eq!(out.stats.landed_unmatched, 1);
    }

    #[test]
    fn test_other_season_landed_filtered_out() {
        let engine = ReconciliationEngine::new();
        let line = vec![line_item("A", "BLK", 45.0, 0.0)];
        let mut landed = landed_item("A", 20.0, 1);
        landed.season = "26SP".to_string();

        let out = engine.reconcile(&line, &[landed], &[], "26FA");
        assert_eq!(out.products[0].cost_source, CostSource::LineList);
        assert_eq!(out.stats.landed_rows, 0);
    }

    #[test]
    fn test_product_and_cost_share_id() {
        let engine = ReconciliationEngine::new();
        let line = vec![line_item("A", "BLK", 45.0, 0.0)];

        let out = engine.reconcile(&line, &[], &[], "26FA");
        assert_eq!(out.products[0].id, out.costs[0].id);
        assert_eq!(out.products[0].id, "A_BLK_26FA");
    }
}
