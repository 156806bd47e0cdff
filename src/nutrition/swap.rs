//! Meal swapping - alternatives of the same meal type

use tracing::info;

use super::data::meal_alternatives;
use super::{Meal, MealPlan, NutritionError};

/// Same-type meals the user can swap to, excluding the current one
pub fn alternatives_for(meal: &Meal) -> Vec<Meal> {
    meal_alternatives()
        .into_iter()
        .filter(|alt| alt.meal_type == meal.meal_type && alt.name != meal.name)
        .collect()
}

/// Swap the meal at `index` for the alternative called `name` (case-insensitive).
/// Returns the meal that was replaced.
pub fn swap_with_alternative(
    plan: &mut MealPlan,
    index: usize,
    name: &str,
) -> Result<Meal, NutritionError> {
    let current = plan.meals.get(index).ok_or(NutritionError::MealIndex {
        index,
        len: plan.meals.len(),
    })?;
    let replacement = alternatives_for(current)
        .into_iter()
        .find(|alt| alt.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| NutritionError::UnknownAlternative(name.to_string()))?;

    info!(index, from = %current.name, to = %replacement.name, "Meal swapped");
    plan.swap_meal(index, replacement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::{MealType, get_meal_plan};

    #[test]
    fn test_alternatives_same_type_only() {
        let plan = get_meal_plan(2500).unwrap();
        let snack = &plan.meals[2];
        assert_eq!(snack.meal_type, MealType::Snack);

        let alts = alternatives_for(snack);
        assert!(!alts.is_empty());
        assert!(alts.iter().all(|m| m.meal_type == MealType::Snack));
        assert!(alts.iter().all(|m| m.name != snack.name));
    }

    #[test]
    fn test_alternatives_exclude_current() {
        let alts = alternatives_for(&meal_alternatives()[0]);
        assert!(alts.iter().all(|m| m.name != "Overnight Oats with Berries"));
    }

    #[test]
    fn test_swap_with_alternative() {
        let mut plan = get_meal_plan(2000).unwrap();
        let before = plan.totals().calories;

        let old = swap_with_alternative(&mut plan, 0, "avocado toast with eggs").unwrap();
        assert_eq!(old.name, "Egg White Veggie Omelette");
        assert_eq!(plan.meals[0].name, "Avocado Toast with Eggs");
        assert_eq!(plan.totals().calories, before - 450 + 520);

        assert_eq!(
            swap_with_alternative(&mut plan, 0, "Beef & Veggie Stir-Fry"),
            Err(NutritionError::UnknownAlternative("Beef & Veggie Stir-Fry".into())),
            "Lunch alternative must not replace a breakfast"
        );
        assert!(matches!(
            swap_with_alternative(&mut plan, 7, "x"),
            Err(NutritionError::MealIndex { index: 7, .. })
        ));
    }
}
