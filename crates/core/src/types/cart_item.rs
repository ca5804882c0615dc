//! Cart item records.
//!
//! A [`CartItem`] is the unit of cart state: one dish with a quantity and the
//! display fields copied from the menu when it was added. The JSON shape
//! (camelCase) is shared between local storage and the order service.

use serde::{Deserialize, Serialize};

use super::id::{DishId, RestaurantId};
use super::price::Price;

/// A dish picked from a menu, before it lands in a cart.
///
/// Carries every [`CartItem`] field except the quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishSelection {
    pub dish_id: DishId,
    pub restaurant_id: RestaurantId,
    /// Unit price as shown on the menu.
    pub price: Price,
    pub dish_name: String,
    #[serde(default)]
    pub dish_description: String,
}

impl DishSelection {
    /// Create a selection with an empty description.
    #[must_use]
    pub fn new(
        dish_id: DishId,
        restaurant_id: RestaurantId,
        price: Price,
        dish_name: impl Into<String>,
    ) -> Self {
        Self {
            dish_id,
            restaurant_id,
            price,
            dish_name: dish_name.into(),
            dish_description: String::new(),
        }
    }

    /// Set the description shown under the dish name.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.dish_description = description.into();
        self
    }
}

/// One cart entry.
///
/// `price` is the unit price last known at add time; it is never
/// re-validated against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub dish_id: DishId,
    pub quantity: u32,
    pub price: Price,
    #[serde(default)]
    pub dish_name: String,
    #[serde(default)]
    pub dish_description: String,
    pub restaurant_id: RestaurantId,
}

impl CartItem {
    /// Create a cart entry with quantity 1.
    #[must_use]
    pub fn from_selection(selection: DishSelection) -> Self {
        Self {
            dish_id: selection.dish_id,
            quantity: 1,
            price: selection.price,
            dish_name: selection.dish_name,
            dish_description: selection.dish_description,
            restaurant_id: selection.restaurant_id,
        }
    }

    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn selection() -> DishSelection {
        DishSelection::new(
            DishId::new(1),
            RestaurantId::new(10),
            Price::from_units(100),
            "Borscht",
        )
        .with_description("Beetroot soup")
    }

    #[test]
    fn test_from_selection_starts_at_one() {
        let item = CartItem::from_selection(selection());
        assert_eq!(item.quantity, 1);
        assert_eq!(item.dish_name, "Borscht");
        assert_eq!(item.dish_description, "Beetroot soup");
        assert_eq!(item.line_total(), Price::from_units(100));
    }

    #[test]
    fn test_camel_case_json() {
        let item = CartItem::from_selection(selection());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["dishId"], 1);
        assert_eq!(json["restaurantId"], 10);
        assert_eq!(json["dishName"], "Borscht");
        assert_eq!(json["quantity"], 1);
    }

    #[test]
    fn test_missing_display_fields_default() {
        let item: CartItem = serde_json::from_str(
            r#"{"dishId": 3, "quantity": 2, "price": 40, "restaurantId": 1}"#,
        )
        .unwrap();
        assert_eq!(item.dish_name, "");
        assert_eq!(item.line_total(), Price::from_units(80));
    }
}
