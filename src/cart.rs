// Cart aggregation for the QR ordering menu

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::menu::Dish;
use crate::orders::{Order, OrderLine};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Quantity must be positive, got {quantity}")]
    InvalidQuantity { quantity: u32 },
    #[error("Dish {dish_id} is not available")]
    DishUnavailable { dish_id: String },
    #[error("Dish {dish_id} has no option {option:?} in modifier group {modifier_id}")]
    UnknownModifier {
        dish_id: String,
        modifier_id: String,
        option: String,
    },
    #[error("Modifier group {modifier_id} selected more than once for dish {dish_id}")]
    DuplicateModifier { dish_id: String, modifier_id: String },
    #[error("Unknown cart line: {line_id}")]
    UnknownLine { line_id: String },
    #[error("Quantity of cart line {line_id} would overflow")]
    QuantityOverflow { line_id: String },
    #[error("Cart price would overflow")]
    PriceOverflow,
    #[error("Cart total is negative: {total}")]
    NegativeTotal { total: i64 },
    #[error("Cart is empty")]
    EmptyCart,
}

/// Option picked for one modifier group of a dish. The price adjustment is
/// taken from the dish when the selection is added to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedModifier {
    pub modifier_id: String,
    pub option: String,
    #[serde(default)]
    pub price_adjustment: i64,
}

impl SelectedModifier {
    pub fn new(modifier_id: impl Into<String>, option: impl Into<String>) -> Self {
        Self {
            modifier_id: modifier_id.into(),
            option: option.into(),
            price_adjustment: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub dish: Dish,
    pub quantity: u32,
    pub selected_modifiers: Vec<SelectedModifier>,
    pub notes: Option<String>,
}

impl CartLine {
    /// Base price plus every modifier adjustment
    pub fn unit_price(&self) -> Result<i64, CartError> {
        self.selected_modifiers
            .iter()
            .try_fold(self.dish.price, |acc, m| acc.checked_add(m.price_adjustment))
            .ok_or(CartError::PriceOverflow)
    }

    pub fn total_price(&self) -> Result<i64, CartError> {
        self.unit_price()?
            .checked_mul(i64::from(self.quantity))
            .ok_or(CartError::PriceOverflow)
    }

    fn same_selection(&self, dish: &Dish, modifiers: &[SelectedModifier]) -> bool {
        self.dish.id == dish.id && self.selected_modifiers == modifiers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub total_items: u64,
    pub total_price: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    next_line: u32,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds a dish, merging into an existing line when the dish and the
    /// modifier selection match. Returns the id of the affected line.
    pub fn add_item(
        &mut self,
        dish: &Dish,
        quantity: u32,
        modifiers: Vec<SelectedModifier>,
        notes: Option<String>,
    ) -> Result<String, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }
        if !dish.available {
            return Err(CartError::DishUnavailable {
                dish_id: dish.id.clone(),
            });
        }
        let modifiers = resolve_modifiers(dish, modifiers)?;

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.same_selection(dish, &modifiers))
        {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| CartError::QuantityOverflow {
                    line_id: line.id.clone(),
                })?;
            debug!(line_id = %line.id, dish = %dish.name, quantity = %line.quantity, "Merged into cart line");
            return Ok(line.id.clone());
        }

        self.next_line += 1;
        let id = format!("line-{}", self.next_line);
        self.lines.push(CartLine {
            id: id.clone(),
            dish: dish.clone(),
            quantity,
            selected_modifiers: modifiers,
            notes: notes.filter(|n| !n.trim().is_empty()),
        });
        debug!(line_id = %id, dish = %dish.name, quantity = %quantity, "Added cart line");
        Ok(id)
    }

    /// One unit, no modifiers
    pub fn quick_add(&mut self, dish: &Dish) -> Result<String, CartError> {
        self.add_item(dish, 1, Vec::new(), None)
    }

    pub fn remove_line(&mut self, line_id: &str) -> Result<CartLine, CartError> {
        let index = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CartError::UnknownLine {
                line_id: line_id.to_string(),
            })?;
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn totals(&self) -> Result<CartTotals, CartError> {
        let total_items = self.lines.iter().map(|l| u64::from(l.quantity)).sum();
        let total_price = self.lines.iter().try_fold(0i64, |acc, line| {
            acc.checked_add(line.total_price()?)
                .ok_or(CartError::PriceOverflow)
        })?;
        if total_price < 0 {
            return Err(CartError::NegativeTotal { total: total_price });
        }
        Ok(CartTotals {
            total_items,
            total_price,
        })
    }

    /// Turns the cart into a new order for `table_number` and empties it.
    /// The cart is left untouched on error. The order's estimate is the
    /// longest preparation time among its dishes.
    pub fn checkout(
        &mut self,
        order_id: impl Into<String>,
        table_number: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Order, CartError> {
        if self.lines.is_empty() {
            return Err(CartError::EmptyCart);
        }
        let totals = self.totals()?;

        let lines = self
            .lines
            .iter()
            .map(|l| {
                let mut line = OrderLine::new(l.id.clone(), l.dish.name.clone(), l.quantity)
                    .with_modifiers(l.selected_modifiers.iter().map(|m| m.option.clone()).collect())
                    .with_unit_price(l.unit_price()?);
                line.notes = l.notes.clone();
                Ok::<_, CartError>(line)
            })
            .collect::<Result<Vec<_>, CartError>>()?;

        let mut order = Order::new(order_id, table_number, lines, created_at);
        if let Some(minutes) = self
            .lines
            .iter()
            .map(|l| l.dish.preparation_time)
            .max()
            .filter(|m| *m > 0)
        {
            order = order.with_estimate(minutes);
        }

        info!(
            order_id = %order.id,
            table = %table_number,
            total_items = %totals.total_items,
            total_price = %totals.total_price,
            "Cart checked out"
        );
        self.clear();
        Ok(order)
    }
}

/// Checks each selection against the dish's own modifier groups and takes
/// the price adjustment from the dish. One option per group; the result is
/// sorted by group id since selection order is not meaningful.
fn resolve_modifiers(
    dish: &Dish,
    selections: Vec<SelectedModifier>,
) -> Result<Vec<SelectedModifier>, CartError> {
    let mut resolved: Vec<SelectedModifier> = Vec::with_capacity(selections.len());
    for selection in selections {
        if resolved.iter().any(|m| m.modifier_id == selection.modifier_id) {
            return Err(CartError::DuplicateModifier {
                dish_id: dish.id.clone(),
                modifier_id: selection.modifier_id,
            });
        }
        let option = dish
            .modifier_option(&selection.modifier_id, &selection.option)
            .ok_or_else(|| CartError::UnknownModifier {
                dish_id: dish.id.clone(),
                modifier_id: selection.modifier_id.clone(),
                option: selection.option.clone(),
            })?;
        resolved.push(SelectedModifier {
            price_adjustment: option.price_adjustment,
            ..selection
        });
    }
    resolved.sort_by(|a, b| a.modifier_id.cmp(&b.modifier_id));
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{ModifierGroup, ModifierOption};

    fn group(id: &str, options: &[(&str, i64)]) -> ModifierGroup {
        ModifierGroup {
            id: id.into(),
            name: id.into(),
            options: options
                .iter()
                .map(|(name, price_adjustment)| ModifierOption {
                    name: (*name).into(),
                    price_adjustment: *price_adjustment,
                })
                .collect(),
        }
    }

    fn provoleta() -> Dish {
        Dish::new("dish-1", "Provoleta", 3500).with_modifier(group("mod-1", &[("Single", 0), ("To share", 1500)]))
    }

    #[test]
    fn test_same_selection_merges() {
        let mut cart = Cart::new();
        let first = cart.add_item(&provoleta(), 1, vec![], None).unwrap();
        let second = cart.add_item(&provoleta(), 2, vec![], None).unwrap();

        assert_eq!(first, second);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.totals().unwrap().total_price, 10500);
    }

    #[test]
    fn test_different_modifiers_stay_separate() {
        let mut cart = Cart::new();
        cart.add_item(&provoleta(), 1, vec![], None).unwrap();
        cart.add_item(&provoleta(), 1, vec![SelectedModifier::new("mod-1", "To share")], None)
            .unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[1].unit_price(), Ok(5000));
    }

    #[test]
    fn test_modifier_order_does_not_split_lines() {
        let bife = Dish::new("dish-3", "Bife de Chorizo", 12500)
            .with_modifier(group("mod-3", &[("Rare", 0), ("Medium", 0)]))
            .with_modifier(group("mod-4", &[("Fries", 0), ("Grilled vegetables", 500)]));
        let doneness = SelectedModifier::new("mod-3", "Rare");
        let side = SelectedModifier::new("mod-4", "Grilled vegetables");

        let mut cart = Cart::new();
        cart.add_item(&bife, 1, vec![doneness.clone(), side.clone()], None).unwrap();
        cart.add_item(&bife, 1, vec![side, doneness], None).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.lines()[0].total_price(), Ok(26000));
    }

    #[test]
    fn test_price_adjustment_comes_from_the_dish() {
        let mut cart = Cart::new();
        let mut forged = SelectedModifier::new("mod-1", "To share");
        forged.price_adjustment = -3500;
        cart.add_item(&provoleta(), 1, vec![forged], None).unwrap();

        assert_eq!(cart.lines()[0].selected_modifiers[0].price_adjustment, 1500);
        assert_eq!(cart.totals().unwrap().total_price, 5000);
    }

    #[test]
    fn test_selections_outside_the_dish_are_rejected() {
        let mut cart = Cart::new();

        assert_eq!(
            cart.add_item(&provoleta(), 1, vec![SelectedModifier::new("mod-1", "Huge")], None),
            Err(CartError::UnknownModifier {
                dish_id: "dish-1".into(),
                modifier_id: "mod-1".into(),
                option: "Huge".into(),
            })
        );
        assert!(matches!(
            cart.add_item(&provoleta(), 1, vec![SelectedModifier::new("mod-9", "Single")], None),
            Err(CartError::UnknownModifier { .. })
        ));
        assert_eq!(
            cart.add_item(
                &provoleta(),
                1,
                vec![SelectedModifier::new("mod-1", "Single"), SelectedModifier::new("mod-1", "To share")],
                None
            ),
            Err(CartError::DuplicateModifier {
                dish_id: "dish-1".into(),
                modifier_id: "mod-1".into(),
            })
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_zero_quantity_and_unavailable_dish_rejected() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add_item(&provoleta(), 0, vec![], None),
            Err(CartError::InvalidQuantity { quantity: 0 })
        );

        let asado = Dish::new("dish-5", "Asado de Tira", 9500).unavailable();
        assert!(matches!(cart.quick_add(&asado), Err(CartError::DishUnavailable { .. })));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_negative_total_is_an_error() {
        let water = Dish::new("dish-9", "Promo water", 100).with_modifier(group("promo", &[("Voucher", -500)]));
        let mut cart = Cart::new();
        cart.add_item(&water, 1, vec![SelectedModifier::new("promo", "Voucher")], None)
            .unwrap();

        assert_eq!(cart.totals(), Err(CartError::NegativeTotal { total: -400 }));
    }

    #[test]
    fn test_merge_overflow_is_an_error_not_a_panic() {
        let mut cart = Cart::new();
        let id = cart.add_item(&provoleta(), u32::MAX, vec![], None).unwrap();

        assert_eq!(
            cart.add_item(&provoleta(), 1, vec![], None),
            Err(CartError::QuantityOverflow { line_id: id })
        );
        assert_eq!(cart.lines()[0].quantity, u32::MAX);
    }

    #[test]
    fn test_totals_survive_huge_quantities() {
        let empanada = Dish::new("dish-2", "Empanada", 1);
        let mut cart = Cart::new();
        cart.add_item(&empanada, u32::MAX, vec![], None).unwrap();
        cart.add_item(&provoleta(), 1, vec![], None).unwrap();

        let totals = cart.totals().unwrap();
        assert_eq!(totals.total_items, u64::from(u32::MAX) + 1);
        assert_eq!(totals.total_price, i64::from(u32::MAX) + 3500);

        let pricey = Dish::new("dish-7", "Whole cow", i64::MAX / 2);
        let mut cart = Cart::new();
        cart.add_item(&pricey, 3, vec![], None).unwrap();
        assert_eq!(cart.totals(), Err(CartError::PriceOverflow));
        assert!(matches!(cart.checkout("ord-x", 1, Utc::now()), Err(CartError::PriceOverflow)));
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_checkout_estimate_is_longest_preparation() {
        let mut cart = Cart::new();
        cart.quick_add(&provoleta().with_preparation_time(12)).unwrap();
        cart.quick_add(&Dish::new("dish-4", "Flan", 2500).with_preparation_time(5)).unwrap();

        let order = cart.checkout("ord-1", 4, Utc::now()).unwrap();
        assert_eq!(order.estimated_minutes, Some(12));

        cart.quick_add(&Dish::new("dish-6", "Agua", 900)).unwrap();
        let order = cart.checkout("ord-2", 4, Utc::now()).unwrap();
        assert_eq!(order.estimated_minutes, None);
    }

    #[test]
    fn test_remove_line() {
        let mut cart = Cart::new();
        let id = cart.quick_add(&provoleta()).unwrap();

        assert_eq!(cart.remove_line(&id).unwrap().dish.name, "Provoleta");
        assert!(matches!(cart.remove_line(&id), Err(CartError::UnknownLine { .. })));
    }
}
