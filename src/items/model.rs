//! Item types: the stored entity, the creation payload and the partial update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::items::validation::ValidationError;

pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;

/// A stored item. This is also the JSON shape cached under `entity:<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: u64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub quantity: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewItem {
    /// Shorthand for a payload with only the required fields.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            quantity: 0,
            tags: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        check_name(&self.name, &mut errors);
        if let Some(description) = &self.description {
            check_description(description, &mut errors);
        }
        check_price(self.price, &mut errors);
        errors.into_result()
    }

    /// Materialize a stored item; `created_at` and `updated_at` are both `now`.
    pub fn into_item(self, id: String, now: DateTime<Utc>) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            quantity: self.quantity,
            tags: self.tags,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A field in a partial update.
///
/// Distinguishes a key that was left out (`Absent`) from one explicitly set to
/// JSON `null` (`Null`).
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Value(value)
    }
}

// Only called when the key is present; missing keys use `Default` (Absent).
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|v| v.map_or(Patch::Null, Patch::Value))
    }
}

/// Payload for a partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub price: Patch<f64>,
    #[serde(default)]
    pub quantity: Patch<u64>,
    #[serde(default)]
    pub tags: Patch<Vec<String>>,
}

impl ItemUpdate {
    /// No field present at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_absent()
            && self.description.is_absent()
            && self.price.is_absent()
            && self.quantity.is_absent()
            && self.tags.is_absent()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();

        match &self.name {
            Patch::Value(name) => check_name(name, &mut errors),
            Patch::Null => errors.push("name", "must not be null"),
            Patch::Absent => {}
        }
        if let Patch::Value(description) = &self.description {
            check_description(description, &mut errors);
        }
        match self.price {
            Patch::Value(price) => check_price(price, &mut errors),
            Patch::Null => errors.push("price", "must not be null"),
            Patch::Absent => {}
        }
        if self.quantity == Patch::Null {
            errors.push("quantity", "must not be null");
        }
        if self.tags == Patch::Null {
            errors.push("tags", "must not be null");
        }

        errors.into_result()
    }

    /// Merge present fields into `item` and stamp `updated_at`.
    ///
    /// `Null` clears `description`; on other fields it is rejected by
    /// [`validate`](Self::validate) and ignored here.
    pub fn apply_to(&self, item: &mut Item, now: DateTime<Utc>) {
        if let Patch::Value(name) = &self.name {
            item.name = name.clone();
        }
        match &self.description {
            Patch::Value(description) => item.description = Some(description.clone()),
            Patch::Null => item.description = None,
            Patch::Absent => {}
        }
        if let Patch::Value(price) = self.price {
            item.price = price;
        }
        if let Patch::Value(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Patch::Value(tags) = &self.tags {
            item.tags = tags.clone();
        }
        item.updated_at = now;
    }
}

fn check_name(name: &str, errors: &mut ValidationError) {
    let len = name.chars().count();
    if len == 0 {
        errors.push("name", "must not be empty");
    } else if len > NAME_MAX_LEN {
        errors.push("name", format!("must be at most {NAME_MAX_LEN} characters"));
    }
}

fn check_description(description: &str, errors: &mut ValidationError) {
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        errors.push(
            "description",
            format!("must be at most {DESCRIPTION_MAX_LEN} characters"),
        );
    }
}

fn check_price(price: f64, errors: &mut ValidationError) {
    if !price.is_finite() || price <= 0.0 {
        errors.push("price", "must be greater than 0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> Item {
        NewItem {
            name: "Widget".to_string(),
            description: Some("A useful widget".to_string()),
            price: 29.99,
            quantity: 100,
            tags: vec!["electronics".to_string()],
        }
        .into_item("id-1".to_string(), Utc::now())
    }

    #[test]
    fn test_new_item_defaults() {
        let item: NewItem = serde_json::from_str(r#"{"name": "Minimal", "price": 9.99}"#).unwrap();
        assert_eq!(item.description, None);
        assert_eq!(item.quantity, 0);
        assert!(item.tags.is_empty());
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_new_item_bounds() {
        assert!(NewItem::new("", 1.0).validate().is_err());
        assert!(NewItem::new("x".repeat(101), 1.0).validate().is_err());
        assert!(NewItem::new("x".repeat(100), 1.0).validate().is_ok());

        let err = NewItem::new("ok", -10.0).validate().unwrap_err();
        assert_eq!(err.errors()[0].field, "price");
        assert!(NewItem::new("ok", 0.0).validate().is_err());
        assert!(NewItem::new("ok", f64::NAN).validate().is_err());

        let mut long = NewItem::new("ok", 1.0);
        long.description = Some("d".repeat(501));
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_negative_quantity_is_rejected_by_type() {
        let parsed: Result<NewItem, _> =
            serde_json::from_str(r#"{"name": "A", "price": 1, "quantity": -1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_quantity_above_u32_range_is_accepted() {
        let item: NewItem = serde_json::from_str(
            r#"{"name": "A", "price": 1, "quantity": 5000000000}"#,
        )
        .unwrap();
        assert_eq!(item.quantity, 5_000_000_000);
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_patch_distinguishes_absent_and_null() {
        let update: ItemUpdate =
            serde_json::from_str(r#"{"description": null, "price": 5}"#).unwrap();
        assert!(update.name.is_absent());
        assert_eq!(update.description, Patch::Null);
        assert_eq!(update.price, Patch::Value(5.0));
        assert!(update.validate().is_ok());

        let empty: ItemUpdate = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_null_on_required_field_is_rejected() {
        let update: ItemUpdate = serde_json::from_str(r#"{"name": null}"#).unwrap();
        let err = update.validate().unwrap_err();
        assert_eq!(err.errors()[0].field, "name");
    }

    #[test]
    fn test_apply_merges_present_fields_only() {
        let mut item = sample_item();
        let created_at = item.created_at;
        let later = created_at + chrono::Duration::seconds(5);

        let update = ItemUpdate {
            price: Patch::Value(5.0),
            description: Patch::Null,
            ..Default::default()
        };
        update.apply_to(&mut item, later);

        assert_eq!(item.name, "Widget");
        assert_eq!(item.price, 5.0);
        assert_eq!(item.quantity, 100);
        assert_eq!(item.description, None);
        assert_eq!(item.tags, vec!["electronics".to_string()]);
        assert_eq!(item.created_at, created_at);
        assert_eq!(item.updated_at, later);
    }

    #[test]
    fn test_item_json_shape() {
        let item = sample_item();
        let value = serde_json::to_value(&item).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        for key in [
            "id",
            "name",
            "description",
            "price",
            "quantity",
            "tags",
            "created_at",
            "updated_at",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }
}
