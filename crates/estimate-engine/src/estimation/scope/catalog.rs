use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use super::damage::{DamageType, Severity, Zone};
use super::quantity::Unit;

/// Companion relationships declared on a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionRules {
    /// Codes that must also be present in the room; absence is flagged, not added.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Codes created automatically alongside this entry.
    #[serde(default)]
    pub auto_adds: Vec<String>,
    /// Codes that may not be added to a room where this entry is active.
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// Declarative applicability of a catalog entry. An empty list matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConditions {
    #[serde(default)]
    pub damage_types: Vec<String>,
    #[serde(default)]
    pub severities: Vec<String>,
    #[serde(default)]
    pub room_types: Vec<String>,
    #[serde(default)]
    pub zones: Vec<String>,
}

/// Context fields a condition set is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub damage_type: DamageType,
    pub severity: Severity,
    pub room_type: &'a str,
    pub zone: Zone,
}

impl MatchConditions {
    /// Entries only participate in condition matching when they name a damage type.
    pub fn is_declared(&self) -> bool {
        !self.damage_types.is_empty()
    }

    pub fn matches(&self, context: &MatchContext<'_>) -> bool {
        self.is_declared()
            && field_matches(&self.damage_types, context.damage_type.label())
            && field_matches(&self.severities, context.severity.label())
            && field_matches(&self.room_types, context.room_type)
            && field_matches(&self.zones, context.zone.label())
    }
}

fn field_matches(allowed: &[String], value: &str) -> bool {
    allowed.is_empty()
        || allowed
            .iter()
            .any(|candidate| candidate.trim().eq_ignore_ascii_case(value.trim()))
}

fn install() -> String {
    "install".to_string()
}

/// Read-only catalog line item definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub description: String,
    pub trade_code: String,
    pub unit: Unit,
    pub quantity_formula: String,
    #[serde(default)]
    pub default_waste_factor: f64,
    #[serde(default = "install")]
    pub activity: String,
    #[serde(default)]
    pub life_expectancy_years: Option<f64>,
    #[serde(default)]
    pub companions: CompanionRules,
    #[serde(default)]
    pub conditions: MatchConditions,
}

/// Per-unit cost components for one catalog code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitCosts {
    pub material_cost: f64,
    pub labor_cost: f64,
    pub equipment_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalPrice {
    pub code: String,
    pub region_id: String,
    pub activity: String,
    pub costs: UnitCosts,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog source unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog row {row}: {message}")]
    InvalidRow { row: usize, message: String },
}

/// Read-only catalog and regional price lookups backing scope assembly and pricing.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn lookup_catalog_item(&self, code: &str) -> Result<Option<CatalogEntry>, CatalogError>;

    /// Every price row for `code` in `region_id`, across activities.
    async fn regional_prices(
        &self,
        code: &str,
        region_id: &str,
    ) -> Result<Vec<RegionalPrice>, CatalogError>;

    async fn catalog_entries(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
}

/// Catalog held entirely in memory, keyed by upper-cased code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: BTreeMap<String, CatalogEntry>,
    prices: Vec<RegionalPrice>,
}

fn catalog_key(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: CatalogEntry) -> Self {
        self.insert_entry(entry);
        self
    }

    pub fn with_price(mut self, price: RegionalPrice) -> Self {
        self.prices.push(price);
        self
    }

    pub fn insert_entry(&mut self, entry: CatalogEntry) {
        self.entries.insert(catalog_key(&entry.code), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        catalog_path: P,
        price_path: Q,
    ) -> Result<Self, CatalogError> {
        let catalog = std::fs::File::open(catalog_path)?;
        let prices = std::fs::File::open(price_path)?;
        Self::from_csv_readers(catalog, prices)
    }

    pub fn from_csv_readers<C: Read, P: Read>(catalog: C, prices: P) -> Result<Self, CatalogError> {
        let mut loaded = Self::new();

        let mut catalog_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(catalog);
        for (index, row) in catalog_reader.deserialize::<CatalogRow>().enumerate() {
            let entry = row?.into_entry(index + 1)?;
            loaded.insert_entry(entry);
        }

        let mut price_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(prices);
        for row in price_reader.deserialize::<PriceRow>() {
            loaded.prices.push(row?.into_price());
        }

        Ok(loaded)
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn lookup_catalog_item(&self, code: &str) -> Result<Option<CatalogEntry>, CatalogError> {
        Ok(self.entries.get(&catalog_key(code)).cloned())
    }

    async fn regional_prices(
        &self,
        code: &str,
        region_id: &str,
    ) -> Result<Vec<RegionalPrice>, CatalogError> {
        let key = catalog_key(code);
        Ok(self
            .prices
            .iter()
            .filter(|price| {
                catalog_key(&price.code) == key && price.region_id.eq_ignore_ascii_case(region_id)
            })
            .cloned()
            .collect())
    }

    async fn catalog_entries(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self.entries.values().cloned().collect())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    code: String,
    description: String,
    trade: String,
    unit: String,
    formula: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    waste: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    activity: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    life_years: Option<String>,
    #[serde(default)]
    requires: String,
    #[serde(default)]
    auto_adds: String,
    #[serde(default)]
    excludes: String,
    #[serde(default)]
    damage_types: String,
    #[serde(default)]
    severities: String,
    #[serde(default)]
    room_types: String,
    #[serde(default)]
    zones: String,
}

impl CatalogRow {
    fn into_entry(self, row: usize) -> Result<CatalogEntry, CatalogError> {
        let unit = Unit::parse(&self.unit).ok_or_else(|| CatalogError::InvalidRow {
            row,
            message: format!("unknown unit '{}'", self.unit),
        })?;
        let default_waste_factor =
            parse_number(self.waste.as_deref(), row, "waste")?.unwrap_or(0.0);
        let life_expectancy_years = parse_number(self.life_years.as_deref(), row, "life_years")?;

        Ok(CatalogEntry {
            code: self.code,
            description: self.description,
            trade_code: self.trade.to_ascii_uppercase(),
            unit,
            quantity_formula: self.formula,
            default_waste_factor,
            activity: self.activity.unwrap_or_else(install),
            life_expectancy_years,
            companions: CompanionRules {
                requires: split_list(&self.requires),
                auto_adds: split_list(&self.auto_adds),
                excludes: split_list(&self.excludes),
            },
            conditions: MatchConditions {
                damage_types: split_list(&self.damage_types),
                severities: split_list(&self.severities),
                room_types: split_list(&self.room_types),
                zones: split_list(&self.zones),
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    code: String,
    region: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    activity: Option<String>,
    material: f64,
    labor: f64,
    #[serde(default)]
    equipment: Option<f64>,
}

impl PriceRow {
    fn into_price(self) -> RegionalPrice {
        RegionalPrice {
            code: self.code,
            region_id: self.region,
            activity: self.activity.unwrap_or_else(install),
            costs: UnitCosts {
                material_cost: self.material,
                labor_cost: self.labor,
                equipment_cost: self.equipment.unwrap_or(0.0),
            },
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number(raw: Option<&str>, row: usize, column: &str) -> Result<Option<f64>, CatalogError> {
    raw.map(|value| {
        value.trim().parse::<f64>().map_err(|_| CatalogError::InvalidRow {
            row,
            message: format!("column '{}' is not a number: '{}'", column, value),
        })
    })
    .transpose()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
