// Menu catalogue: categories and dishes offered on the QR menu

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
}

/// One selectable option inside a modifier group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierOption {
    pub name: String,
    pub price_adjustment: i64,
}

/// A named option group on a dish, e.g. size or doneness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierGroup {
    pub id: String,
    pub name: String,
    pub options: Vec<ModifierOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category_name: String,
    pub available: bool,
    /// Minutes
    pub preparation_time: u32,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<ModifierGroup>,
}

impl Dish {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            category_name: String::new(),
            available: true,
            preparation_time: 0,
            allergens: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn in_category(mut self, category_name: impl Into<String>) -> Self {
        self.category_name = category_name.into();
        self
    }

    pub fn with_modifier(mut self, group: ModifierGroup) -> Self {
        self.modifiers.push(group);
        self
    }

    pub fn with_preparation_time(mut self, minutes: u32) -> Self {
        self.preparation_time = minutes;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn modifier_option(&self, group_id: &str, option: &str) -> Option<&ModifierOption> {
        self.modifiers
            .iter()
            .find(|g| g.id == group_id)?
            .options
            .iter()
            .find(|o| o.name == option)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub categories: Vec<Category>,
    pub dishes: Vec<Dish>,
}

impl Menu {
    pub fn new(categories: Vec<Category>, dishes: Vec<Dish>) -> Self {
        Self { categories, dishes }
    }

    /// Dishes listed under a category, matched by category name
    pub fn dishes_in(&self, category: &Category) -> Vec<&Dish> {
        self.dishes
            .iter()
            .filter(|d| d.category_name == category.name)
            .collect()
    }

    pub fn dish(&self, dish_id: &str) -> Option<&Dish> {
        self.dishes.iter().find(|d| d.id == dish_id)
    }

    pub fn dish_count(&self, category: &Category) -> usize {
        self.dishes_in(category).len()
    }
}
