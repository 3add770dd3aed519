//! Supplier quotes for a recommended reorder, ranked by price, speed and
//! organization preference.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use stockcast_inventory::Item;

use crate::stats::round2;
use crate::tuning::PredictionTuningConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierKind {
    MajorDistributor,
    Specialty,
    Convenience,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    /// Stable slug, referenced by organization preferences.
    pub id: String,
    pub name: String,
    pub kind: SupplierKind,
    pub delivery_days: u32,
    pub minimum_order: u32,
}

impl Supplier {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: SupplierKind,
        delivery_days: u32,
        minimum_order: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            delivery_days,
            minimum_order,
        }
    }
}

/// The fixed set of suppliers quotes are drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierDirectory {
    suppliers: Vec<Supplier>,
}

impl SupplierDirectory {
    pub fn new(suppliers: Vec<Supplier>) -> Self {
        Self { suppliers }
    }

    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }
}

impl Default for SupplierDirectory {
    fn default() -> Self {
        Self::new(vec![
            Supplier::new(
                "metro-foodservice",
                "Metro Foodservice",
                SupplierKind::MajorDistributor,
                2,
                50,
            ),
            Supplier::new(
                "harbor-wholesale",
                "Harbor Wholesale Supply",
                SupplierKind::MajorDistributor,
                3,
                25,
            ),
            Supplier::new(
                "artisan-pantry",
                "Artisan Pantry Co.",
                SupplierKind::Specialty,
                4,
                10,
            ),
            Supplier::new(
                "corner-express",
                "Corner Express",
                SupplierKind::Convenience,
                1,
                1,
            ),
        ])
    }
}

/// Preferred/excluded supplier ids configured by an organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierPreferences {
    pub preferred: Vec<String>,
    pub excluded: Vec<String>,
}

impl SupplierPreferences {
    pub fn is_preferred(&self, supplier_id: &str) -> bool {
        self.preferred.iter().any(|p| p == supplier_id)
    }

    pub fn is_excluded(&self, supplier_id: &str) -> bool {
        self.excluded.iter().any(|p| p == supplier_id)
    }
}

/// Why an option ranks where it does, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionTag {
    PreferredSupplier,
    BestPrice,
    FastestDelivery,
    BestValue,
}

impl OptionTag {
    pub fn weight(&self) -> u8 {
        match self {
            OptionTag::PreferredSupplier => 4,
            OptionTag::BestPrice => 3,
            OptionTag::FastestDelivery => 2,
            OptionTag::BestValue => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingOption {
    pub supplier_id: String,
    pub supplier_name: String,
    pub supplier_kind: SupplierKind,
    pub unit_price: f64,
    /// Requested quantity raised to the supplier minimum.
    pub order_quantity: u32,
    pub total_cost: f64,
    /// Versus buying at the item's current unit cost; negative when dearer.
    pub savings: f64,
    pub delivery_days: u32,
    pub estimated_delivery: DateTime<Utc>,
    pub tag: OptionTag,
}

/// Quote every non-excluded supplier and rank the quotes.
pub fn rank_ordering_options(
    item: &Item,
    quantity: u32,
    directory: &SupplierDirectory,
    preferences: &SupplierPreferences,
    tuning: &PredictionTuningConfig,
    as_of: DateTime<Utc>,
) -> Vec<OrderingOption> {
    let mut options: Vec<OrderingOption> = directory
        .suppliers()
        .iter()
        .filter(|s| !preferences.is_excluded(&s.id))
        .map(|s| quote(item, quantity, s, preferences, tuning, as_of))
        .collect();

    options.sort_by(compare_options);
    options
}

fn quote(
    item: &Item,
    quantity: u32,
    supplier: &Supplier,
    preferences: &SupplierPreferences,
    tuning: &PredictionTuningConfig,
    as_of: DateTime<Utc>,
) -> OrderingOption {
    let factor = match supplier.kind {
        SupplierKind::MajorDistributor => tuning.distributor_price_factor,
        SupplierKind::Specialty | SupplierKind::Convenience => tuning.specialty_price_factor,
    };
    // Exact price drives the tag and savings; only the reported figures are rounded.
    let unit_price = item.unit_cost * factor;
    let order_quantity = quantity.max(supplier.minimum_order);
    let qty = f64::from(order_quantity);

    let tag = if preferences.is_preferred(&supplier.id) {
        OptionTag::PreferredSupplier
    } else if unit_price < item.unit_cost {
        OptionTag::BestPrice
    } else if supplier.delivery_days == 1 {
        OptionTag::FastestDelivery
    } else {
        OptionTag::BestValue
    };

    OrderingOption {
        supplier_id: supplier.id.clone(),
        supplier_name: supplier.name.clone(),
        supplier_kind: supplier.kind,
        unit_price: round2(unit_price),
        order_quantity,
        total_cost: round2(unit_price * qty),
        savings: round2((item.unit_cost - unit_price) * qty),
        delivery_days: supplier.delivery_days,
        estimated_delivery: as_of + Duration::days(i64::from(supplier.delivery_days)),
        tag,
    }
}

fn compare_options(a: &OrderingOption, b: &OrderingOption) -> Ordering {
    b.tag
        .weight()
        .cmp(&a.tag.weight())
        .then_with(|| b.savings.total_cmp(&a.savings))
        .then_with(|| a.delivery_days.cmp(&b.delivery_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcast_core::ItemId;

    fn as_of() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-10T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn item(unit_cost: f64) -> Item {
        Item::new(ItemId::new(), "Olive oil", 4, unit_cost, 6, as_of()).unwrap()
    }

    #[test]
    fn distributors_undercut_current_cost() {
        let opts = rank_ordering_options(
            &item(10.0),
            60,
            &SupplierDirectory::default(),
            &SupplierPreferences::default(),
            &PredictionTuningConfig::default(),
            as_of(),
        );
        assert_eq!(opts.len(), 4);
        assert_eq!(opts[0].tag, OptionTag::BestPrice);
        assert_eq!(opts[0].unit_price, 9.5);
        assert_eq!(opts[0].savings, 30.0);
        assert_eq!(opts[1].tag, OptionTag::BestPrice);
        // Equal savings: faster delivery first.
        assert_eq!(opts[0].supplier_id, "metro-foodservice");
        assert_eq!(opts[2].tag, OptionTag::FastestDelivery);
        assert_eq!(opts[3].tag, OptionTag::BestValue);
        assert_eq!(opts[3].unit_price, 11.0);
    }

    #[test]
    fn minimum_order_raises_quantity() {
        let opts = rank_ordering_options(
            &item(2.0),
            5,
            &SupplierDirectory::default(),
            &SupplierPreferences::default(),
            &PredictionTuningConfig::default(),
            as_of(),
        );
        let metro = opts.iter().find(|o| o.supplier_id == "metro-foodservice").unwrap();
        assert_eq!(metro.order_quantity, 50);
        assert_eq!(metro.total_cost, 95.0);
        assert_eq!(metro.estimated_delivery, as_of() + Duration::days(2));
    }

    #[test]
    fn preferred_supplier_ranks_first_and_excluded_is_dropped() {
        let prefs = SupplierPreferences {
            preferred: vec!["artisan-pantry".to_string()],
            excluded: vec!["harbor-wholesale".to_string()],
        };
        let opts = rank_ordering_options(
            &item(10.0),
            20,
            &SupplierDirectory::default(),
            &prefs,
            &PredictionTuningConfig::default(),
            as_of(),
        );
        assert_eq!(opts.len(), 3);
        assert_eq!(opts[0].supplier_id, "artisan-pantry");
        assert_eq!(opts[0].tag, OptionTag::PreferredSupplier);
        assert!(opts.iter().all(|o| o.supplier_id != "harbor-wholesale"));
    }

    #[test]
    fn cheap_items_keep_the_distributor_discount() {
        let opts = rank_ordering_options(
            &item(0.05),
            100,
            &SupplierDirectory::default(),
            &SupplierPreferences::default(),
            &PredictionTuningConfig::default(),
            as_of(),
        );
        let metro = opts.iter().find(|o| o.supplier_id == "metro-foodservice").unwrap();
        assert_eq!(metro.tag, OptionTag::BestPrice);
        assert_eq!(metro.total_cost, 4.75);
        assert_eq!(metro.savings, 0.25);
        assert_eq!(opts[0].tag, OptionTag::BestPrice);
    }

    #[test]
    fn large_orders_compute_savings_from_the_exact_price() {
        let opts = rank_ordering_options(
            &item(1.23),
            1000,
            &SupplierDirectory::default(),
            &SupplierPreferences::default(),
            &PredictionTuningConfig::default(),
            as_of(),
        );
        let metro = opts.iter().find(|o| o.supplier_id == "metro-foodservice").unwrap();
        assert_eq!(metro.unit_price, 1.17);
        assert_eq!(metro.total_cost, 1168.5);
        assert_eq!(metro.savings, 61.5);
    }
}
