//! Market listing models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of produce offered in a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProductType {
    Crop,
    Vegetable,
    Fruit,
    Dairy,
    Livestock,
    Other,
}

impl ProductType {
    pub const ALL: [ProductType; 6] = [
        ProductType::Crop,
        ProductType::Vegetable,
        ProductType::Fruit,
        ProductType::Dairy,
        ProductType::Livestock,
        ProductType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Crop => "Crop",
            ProductType::Vegetable => "Vegetable",
            ProductType::Fruit => "Fruit",
            ProductType::Dairy => "Dairy",
            ProductType::Livestock => "Livestock",
            ProductType::Other => "Other",
        }
    }

    /// Categories a listing of this type may be filed under
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            ProductType::Crop => &["Grain", "Cereal", "Pulse", "Oilseed", "Fiber", "Other"],
            ProductType::Vegetable => &["Leafy", "Root", "Fruit", "Stem", "Bulb", "Other"],
            ProductType::Fruit => &["Citrus", "Berry", "Tropical", "Stone Fruit", "Pome Fruit", "Other"],
            ProductType::Dairy => &["Milk", "Cheese", "Butter", "Yogurt", "Other"],
            ProductType::Livestock => &["Cattle", "Poultry", "Swine", "Sheep", "Goat", "Other"],
            ProductType::Other => &[],
        }
    }

    pub fn accepts_category(&self, category: &str) -> bool {
        let category = category.trim();
        self.categories()
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ProductType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown product type: {}", s))
    }
}

/// Unit a market price is quoted in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    G,
    Lb,
    Oz,
    Ton,
    Quintal,
    Bushel,
    Unit,
    Dozen,
    Bunch,
    Crate,
}

impl Unit {
    pub const ALL: [Unit; 11] = [
        Unit::Kg,
        Unit::G,
        Unit::Lb,
        Unit::Oz,
        Unit::Ton,
        Unit::Quintal,
        Unit::Bushel,
        Unit::Unit,
        Unit::Dozen,
        Unit::Bunch,
        Unit::Crate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::Lb => "lb",
            Unit::Oz => "oz",
            Unit::Ton => "ton",
            Unit::Quintal => "quintal",
            Unit::Bushel => "bushel",
            Unit::Unit => "unit",
            Unit::Dozen => "dozen",
            Unit::Bunch => "bunch",
            Unit::Crate => "crate",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Unit::ALL
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown unit: {}", s))
    }
}
