use serde::{Deserialize, Serialize};
use std::fmt;

/// One styled look within a collection.
///
/// `id` is `None` until the backend has persisted the outfit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(default)]
    pub outfit_items: Vec<OutfitItem>,
}

impl Outfit {
    pub fn new(description: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            id: None,
            description: description.into(),
            image_url: image_url.into(),
            outfit_items: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_items(mut self, items: Vec<OutfitItem>) -> Self {
        self.outfit_items = items;
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Compares the outfit's own fields, ignoring its items.
    pub fn same_fields(&self, other: &Outfit) -> bool {
        self.id == other.id
            && self.description == other.description
            && self.image_url == other.image_url
    }
}

impl fmt::Display for Outfit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => writeln!(f, "  [{}] {}", id, self.description)?,
            None => writeln!(f, "  [new] {}", self.description)?,
        }
        for item in &self.outfit_items {
            writeln!(f, "    - {}", item)?;
        }
        Ok(())
    }
}

/// One shoppable product reference within an outfit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutfitItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outfit_id: Option<i64>,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub product_link: String,
}

impl OutfitItem {
    pub fn new(
        image_url: impl Into<String>,
        store_name: impl Into<String>,
        product_link: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            outfit_id: None,
            image_url: image_url.into(),
            store_name: store_name.into(),
            product_link: product_link.into(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_outfit_id(mut self, outfit_id: i64) -> Self {
        self.outfit_id = Some(outfit_id);
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Compares the fields that are sent on update. The back-reference is
    /// ignored: the server fills it in and the client never edits it.
    pub fn same_fields(&self, other: &OutfitItem) -> bool {
        self.id == other.id
            && self.image_url == other.image_url
            && self.store_name == other.store_name
            && self.product_link == other.product_link
    }
}

impl fmt::Display for OutfitItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "new".to_string());
        write!(f, "[{}] {} <{}>", id, self.store_name, self.product_link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_outfit_is_not_persisted() {
        let outfit = Outfit::new("Denim on denim", "https://img/1.png");
        assert!(!outfit.is_persisted());
        assert!(outfit.with_id(4).is_persisted());
    }

    #[test]
    fn test_outfit_same_fields_ignores_items() {
        let a = Outfit::new("Look", "u1").with_id(1);
        let b = a
            .clone()
            .with_items(vec![OutfitItem::new("u2", "Shop", "https://shop/a")]);
        assert!(a.same_fields(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_item_same_fields_ignores_back_reference() {
        let a = OutfitItem::new("u", "Shop", "https://shop/a").with_id(5);
        let b = a.clone().with_outfit_id(10);
        assert!(a.same_fields(&b));

        let c = OutfitItem {
            store_name: "Other".to_string(),
            ..a.clone()
        };
        assert!(!a.same_fields(&c));
    }

    #[test]
    fn test_new_item_serializes_without_ids() {
        let item = OutfitItem::new("u", "Shop", "https://shop/a");
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("outfitId").is_none());
        assert_eq!(json["imageURL"], "u");
        assert_eq!(json["storeName"], "Shop");
    }
}
