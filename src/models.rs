//! # Backend Data Model
//!
//! Shapes of the payloads exchanged with the backend. Only the fields the
//! bot displays or forwards are modelled; unknown fields are ignored.
//!
//! ## Core Concepts
//!
//! - **Product**: a catalog entry wrapping a tree species and a price
//! - **CartItem**: a pending bucket of some product with a quantity
//! - **Profile**: the logged-in user's display fields
//! - **RegistrationForm / PlantingRecord**: data collected by dialogs

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Tokens issued by the backend on login or registration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// A price as sent by the backend, either a JSON number or a decimal string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Number(f64),
    Text(String),
}

impl Price {
    /// Numeric amount; unparseable text counts as zero
    pub fn amount(&self) -> f64 {
        match self {
            Price::Number(n) => *n,
            Price::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }
}

impl Default for Price {
    fn default() -> Self {
        Price::Text("0".to_string())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Number(n) => write!(f, "{n}"),
            Price::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Tree species description embedded in a product
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tree {
    #[serde(default = "default_tree_name", deserialize_with = "or_default_name")]
    pub name_en: String,
    #[serde(default, deserialize_with = "or_empty")]
    pub desc_en: String,
}

impl Default for Tree {
    fn default() -> Self {
        Self {
            name_en: default_tree_name(),
            desc_en: String::new(),
        }
    }
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub tree: Tree,
}

/// One line of the user's cart
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CartItem {
    /// Bucket identifier, used for quantity changes and removal
    #[serde(default)]
    pub id: Option<i64>,
    pub product: Product,
    #[serde(default = "default_count")]
    pub count: u32,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.product.price.amount() * f64::from(self.count)
    }
}

/// Profile fields returned by `/api/get/me/`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profile {
    #[serde(default = "default_profile_name", deserialize_with = "or_default_profile_name")]
    pub name: String,
    #[serde(default = "default_region", deserialize_with = "or_default_region")]
    pub region: String,
    #[serde(rename = "phoneNumber", default, deserialize_with = "or_empty")]
    pub phone_number: String,
}

/// Fields collected by the registration dialog
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub region: String,
    pub birth_date: String,
}

impl RegistrationForm {
    /// Form fields in the order and naming the backend expects
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("username", &self.username),
            ("password", &self.password),
            ("FirstName", &self.first_name),
            ("LastName", &self.last_name),
            ("phoneNumber", &self.phone_number),
            ("region", &self.region),
            ("birthDate", &self.birth_date),
            ("email", ""),
        ]
    }
}

/// A worker's planting report, ready for multipart submission
#[derive(Clone, PartialEq)]
pub struct PlantingRecord {
    pub bucket: String,
    pub latitude: f64,
    pub longitude: f64,
    pub photo: Vec<u8>,
}

impl fmt::Debug for PlantingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlantingRecord")
            .field("bucket", &self.bucket)
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("photo_bytes", &self.photo.len())
            .finish()
    }
}

/// Line totals and grand total of a cart
#[derive(Debug, Clone, PartialEq)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub bucket_id: Option<i64>,
    pub name: String,
    pub quantity: u32,
    pub line_total: f64,
}

impl CartSummary {
    pub fn from_items(items: &[CartItem]) -> Self {
        let lines: Vec<CartLine> = items
            .iter()
            .map(|item| CartLine {
                bucket_id: item.id,
                name: item.product.tree.name_en.clone(),
                quantity: item.count,
                line_total: item.line_total(),
            })
            .collect();
        let total = lines.iter().map(|line| line.line_total).sum();
        Self { lines, total }
    }
}

fn default_tree_name() -> String {
    "Tree".to_string()
}

fn default_profile_name() -> String {
    "User".to_string()
}

fn default_region() -> String {
    "Unknown".to_string()
}

fn default_count() -> u32 {
    1
}

// The backend sends explicit nulls for unset text fields.
fn or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn or_default_name<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_tree_name))
}

fn or_default_profile_name<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_profile_name))
}

fn or_default_region<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_region))
}
