//! Shopping list built from a meal plan's ingredients

use std::collections::HashSet;

use super::MealPlan;

const MEAT_DAIRY: &[&str] = &[
    "chicken", "beef", "egg", "yogurt", "milk", "cheese", "fish", "tuna", "pork", "turkey",
];
const PRODUCE: &[&str] = &[
    "apple", "banana", "berry", "spinach", "lettuce", "tomato", "avocado", "potato", "onion",
    "garlic", "fruit", "veg",
];
const PANTRY: &[&str] = &[
    "oat", "rice", "pasta", "bread", "oil", "sauce", "spice", "salt", "pepper", "honey", "nut",
    "seed", "powder",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Produce,
    MeatDairy,
    Pantry,
    Other,
}

impl Category {
    /// Display order
    pub const ALL: [Category; 4] = [
        Category::Produce,
        Category::MeatDairy,
        Category::Pantry,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Produce => "Produce",
            Category::MeatDairy => "Meat & Dairy",
            Category::Pantry => "Pantry",
            Category::Other => "Other",
        }
    }
}

/// Keyword match on the lowercase name; meat & dairy wins over produce,
/// produce over pantry
pub fn categorize(name: &str) -> Category {
    let lower = name.to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| lower.contains(k));
    if has(MEAT_DAIRY) {
        Category::MeatDairy
    } else if has(PRODUCE) {
        Category::Produce
    } else if has(PANTRY) {
        Category::Pantry
    } else {
        Category::Other
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingItem {
    pub name: String,
    pub amount: String,
    pub category: Category,
}

#[derive(Debug, Clone)]
pub struct ShoppingList {
    calorie_target: u32,
    items: Vec<ShoppingItem>,
    /// Indices into `items`
    checked: HashSet<usize>,
}

impl ShoppingList {
    /// One entry per ingredient line, duplicates kept since amounts use mixed units
    pub fn from_plan(plan: &MealPlan) -> Self {
        let items = plan
            .meals
            .iter()
            .flat_map(|meal| meal.ingredients.iter())
            .map(|ing| ShoppingItem {
                name: ing.name.clone(),
                amount: ing.amount.clone(),
                category: categorize(&ing.name),
            })
            .collect();
        Self {
            calorie_target: plan.calorie_target,
            items,
            checked: HashSet::new(),
        }
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    /// Non-empty categories in display order, items paired with their index
    pub fn by_category(&self) -> Vec<(Category, Vec<(usize, &ShoppingItem)>)> {
        Category::ALL
            .iter()
            .map(|cat| {
                (
                    *cat,
                    self.items
                        .iter()
                        .enumerate()
                        .filter(|(_, i)| i.category == *cat)
                        .collect::<Vec<_>>(),
                )
            })
            .filter(|(_, items)| !items.is_empty())
            .collect()
    }

    /// Flip the checked state of one item, returns the new state.
    /// Out-of-range indices stay unchecked.
    pub fn toggle(&mut self, index: usize) -> bool {
        if index >= self.items.len() || self.checked.remove(&index) {
            false
        } else {
            self.checked.insert(index);
            true
        }
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.contains(&index)
    }

    pub fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// Plain-text list for copying
    pub fn to_text(&self) -> String {
        let mut text = format!("🛒 Shopping List - {} kcal Plan\n\n", self.calorie_target);
        for (category, items) in self.by_category() {
            text.push_str(&format!("[{}]\n", category.label()));
            for (_, item) in items {
                text.push_str(&format!("- {} ({})\n", item.name, item.amount));
            }
            text.push('\n');
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::{Ingredient, Meal, MealType};

    fn plan_with(ingredients: &[(&str, &str)]) -> MealPlan {
        MealPlan {
            calorie_target: 2000,
            description: String::new(),
            meals: vec![Meal {
                name: "Test".into(),
                meal_type: MealType::Lunch,
                calories: 0,
                protein: 0,
                carbs: 0,
                fats: 0,
                fiber: 0,
                image: String::new(),
                ingredients: ingredients
                    .iter()
                    .map(|(n, a)| Ingredient {
                        name: n.to_string(),
                        amount: a.to_string(),
                    })
                    .collect(),
                instructions: vec![],
                prep_time: None,
            }],
        }
    }

    #[test]
    fn test_categorize_priority() {
        assert_eq!(categorize("Chicken breast"), Category::MeatDairy);
        // "Eggplant" contains "egg" and meat & dairy is checked first
        assert_eq!(categorize("Eggplant"), Category::MeatDairy);
        assert_eq!(categorize("Sweet potato"), Category::Produce);
        // "peanut butter" hits pantry's "nut"
        assert_eq!(categorize("Peanut butter"), Category::Pantry);
        assert_eq!(categorize("Garlic"), Category::Produce);
        assert_eq!(categorize("Olive oil"), Category::Pantry);
        assert_eq!(categorize("Salsa"), Category::Other);
    }

    #[test]
    fn test_text_omits_empty_categories() {
        let plan = plan_with(&[("Chicken breast", "200g"), ("Rice", "90g"), ("Spinach", "1 cup")]);
        let list = ShoppingList::from_plan(&plan);
        assert_eq!(
            list.to_text(),
            "🛒 Shopping List - 2000 kcal Plan\n\n\
             [Produce]\n- Spinach (1 cup)\n\n\
             [Meat & Dairy]\n- Chicken breast (200g)\n\n\
             [Pantry]\n- Rice (90g)\n\n"
        );
    }

    #[test]
    fn test_toggle_checked() {
        let plan = plan_with(&[("Banana", "1"), ("Salsa", "2 tbsp")]);
        let mut list = ShoppingList::from_plan(&plan);
        assert!(list.toggle(0));
        assert!(list.is_checked(0));
        assert_eq!(list.checked_count(), 1);
        assert!(!list.toggle(0));
        assert_eq!(list.checked_count(), 0);
        assert!(!list.toggle(7));
        assert_eq!(list.checked_count(), 0);
    }

    #[test]
    fn test_duplicate_lines_checked_separately() {
        let plan = plan_with(&[("Olive oil", "1 tbsp"), ("Rice", "90g"), ("Olive oil", "2 tsp")]);
        let mut list = ShoppingList::from_plan(&plan);
        assert!(list.toggle(2));
        assert!(!list.is_checked(0));
        assert!(list.is_checked(2));
        assert_eq!(list.checked_count(), 1);

        let pantry = &list.by_category()[0].1;
        let indices: Vec<usize> = pantry.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
