//! Static meal plans and per-type alternatives

use super::{CaloriePlan, Ingredient, Meal, MealPlan, MealType, NutritionError};

use MealType::{Breakfast, Dinner, Lunch, Snack};

pub const CALORIE_PLANS: &[CaloriePlan] = &[
    CaloriePlan {
        calories: 2000,
        title: "Aggressive Fat Loss",
        description: "Maximum deficit for rapid results",
        meals: "3 meals",
    },
    CaloriePlan {
        calories: 2500,
        title: "Moderate Deficit",
        description: "Sustainable fat loss / maintenance",
        meals: "3 meals + 1 snack",
    },
    CaloriePlan {
        calories: 3000,
        title: "Maintenance / Lean Bulk",
        description: "Maintain or grow lean muscle",
        meals: "3 meals + 1 snack",
    },
    CaloriePlan {
        calories: 3500,
        title: "Lean Bulk",
        description: "Optimal muscle growth for larger athletes",
        meals: "4 meals + 1 snack",
    },
];

pub fn find_calorie_plan(calories: u32) -> Option<&'static CaloriePlan> {
    CALORIE_PLANS.iter().find(|p| p.calories == calories)
}

/// Macros in order: calories, protein, carbs, fats, fiber
type Macros = [u32; 5];

fn meal(
    name: &str,
    meal_type: MealType,
    [calories, protein, carbs, fats, fiber]: Macros,
    image: &str,
    prep_time: Option<&str>,
    ingredients: &[(&str, &str)],
    instructions: &[&str],
) -> Meal {
    Meal {
        name: name.to_string(),
        meal_type,
        calories,
        protein,
        carbs,
        fats,
        fiber,
        image: format!("assets/meals/{}", image),
        ingredients: ingredients
            .iter()
            .map(|(name, amount)| Ingredient {
                name: name.to_string(),
                amount: amount.to_string(),
            })
            .collect(),
        instructions: instructions.iter().map(|s| s.to_string()).collect(),
        prep_time: prep_time.map(str::to_string),
    }
}

pub fn get_meal_plan(calories: u32) -> Result<MealPlan, NutritionError> {
    let (description, meals) = match calories {
        2000 => (
            "High-protein deficit plan built around lean meats and vegetables",
            plan_2000(),
        ),
        2500 => (
            "Balanced plan for steady fat loss while training hard",
            plan_2500(),
        ),
        3000 => (
            "Fuel for performance with room for lean muscle gain",
            plan_3000(),
        ),
        3500 => (
            "Calorie-dense plan to support muscle growth and recovery",
            plan_3500(),
        ),
        other => return Err(NutritionError::UnknownPlan(other)),
    };
    Ok(MealPlan {
        calorie_target: calories,
        description: description.to_string(),
        meals,
    })
}

fn plan_2000() -> Vec<Meal> {
    vec![
        meal(
            "Egg White Veggie Omelette",
            Breakfast,
            [450, 38, 35, 16, 7],
            "breakfast-omelette.jpg",
            Some("15 min"),
            &[
                ("Egg whites", "250ml"),
                ("Whole eggs", "2"),
                ("Spinach", "1 cup"),
                ("Tomato", "1 medium"),
                ("Whole grain bread", "1 slice"),
            ],
            &[
                "Whisk egg whites and whole eggs with a pinch of salt.",
                "Saute spinach and diced tomato in a non-stick pan for 2 minutes.",
                "Pour in the eggs and cook on medium heat until set, then fold.",
                "Serve with toasted bread.",
            ],
        ),
        meal(
            "Grilled Chicken Quinoa Bowl",
            Lunch,
            [650, 55, 60, 18, 10],
            "lunch-chicken-rice.jpg",
            Some("25 min"),
            &[
                ("Chicken breast", "180g"),
                ("Quinoa (dry)", "70g"),
                ("Mixed vegetables", "150g"),
                ("Avocado", "1/4"),
                ("Lemon juice", "1 tbsp"),
            ],
            &[
                "Cook quinoa according to package instructions.",
                "Season chicken and grill for 6-7 minutes per side.",
                "Steam the vegetables until tender-crisp.",
                "Slice chicken and assemble the bowl with avocado and lemon juice.",
            ],
        ),
        meal(
            "Baked Salmon with Roasted Vegetables",
            Dinner,
            [900, 60, 70, 38, 12],
            "dinner-salmon.jpg",
            Some("35 min"),
            &[
                ("Salmon fillet", "200g"),
                ("Sweet potato", "250g"),
                ("Broccoli", "200g"),
                ("Olive oil", "1 tbsp"),
                ("Garlic", "2 cloves"),
            ],
            &[
                "Preheat the oven to 200C.",
                "Cube the sweet potato, toss with olive oil and garlic and roast for 15 minutes.",
                "Add broccoli and the salmon to the tray and bake 12-15 minutes more.",
                "Finish with black pepper and a squeeze of lemon.",
            ],
        ),
    ]
}

fn plan_2500() -> Vec<Meal> {
    vec![
        meal(
            "Protein Pancakes with Berries",
            Breakfast,
            [600, 40, 75, 14, 8],
            "breakfast-pancakes.jpg",
            Some("20 min"),
            &[
                ("Oat flour", "60g"),
                ("Protein powder", "1 scoop"),
                ("Egg", "2"),
                ("Milk", "100ml"),
                ("Mixed berries", "100g"),
                ("Honey", "1 tsp"),
            ],
            &[
                "Blend oat flour, protein powder, eggs and milk into a smooth batter.",
                "Cook small pancakes on a hot non-stick pan, 2 minutes per side.",
                "Top with berries and a drizzle of honey.",
            ],
        ),
        meal(
            "Chicken & Rice Power Bowl",
            Lunch,
            [750, 60, 85, 16, 7],
            "lunch-chicken-rice.jpg",
            Some("25 min"),
            &[
                ("Chicken breast", "200g"),
                ("Jasmine rice (dry)", "90g"),
                ("Bell pepper", "1"),
                ("Green beans", "100g"),
                ("Soy sauce", "1 tbsp"),
            ],
            &[
                "Cook the rice.",
                "Stir-fry sliced chicken until golden, then add pepper and green beans.",
                "Season with soy sauce and serve over rice.",
            ],
        ),
        meal(
            "Greek Yogurt Parfait",
            Snack,
            [350, 28, 40, 9, 5],
            "snack-parfait.jpg",
            Some("5 min"),
            &[
                ("Greek yogurt", "200g"),
                ("Granola", "30g"),
                ("Blueberry", "75g"),
                ("Chia seeds", "1 tsp"),
            ],
            &[
                "Layer yogurt, granola and blueberries in a glass.",
                "Sprinkle chia seeds on top.",
            ],
        ),
        meal(
            "Lean Steak with Sweet Potato",
            Dinner,
            [800, 62, 70, 28, 10],
            "dinner-steak-rice.jpg",
            Some("30 min"),
            &[
                ("Sirloin steak", "200g"),
                ("Sweet potato", "300g"),
                ("Asparagus", "150g"),
                ("Olive oil", "1 tsp"),
                ("Salt & pepper", "to taste"),
            ],
            &[
                "Bake the sweet potato at 200C for 25 minutes.",
                "Season the steak and sear 3-4 minutes per side, then rest 5 minutes.",
                "Pan-roast asparagus in olive oil.",
                "Slice the steak and plate with sweet potato and asparagus.",
            ],
        ),
    ]
}

fn plan_3000() -> Vec<Meal> {
    vec![
        meal(
            "Loaded Oatmeal with Peanut Butter",
            Breakfast,
            [750, 35, 95, 26, 12],
            "breakfast-oatmeal.jpg",
            Some("10 min"),
            &[
                ("Rolled oats", "100g"),
                ("Milk", "250ml"),
                ("Peanut butter", "2 tbsp"),
                ("Banana", "1"),
                ("Protein powder", "1/2 scoop"),
            ],
            &[
                "Simmer oats in milk for 5 minutes, stirring often.",
                "Stir in protein powder off the heat.",
                "Top with sliced banana and peanut butter.",
            ],
        ),
        meal(
            "Turkey Pasta Bolognese",
            Lunch,
            [850, 60, 100, 20, 9],
            "lunch-bolognese.jpg",
            Some("30 min"),
            &[
                ("Ground turkey", "200g"),
                ("Whole wheat pasta (dry)", "100g"),
                ("Tomato sauce", "200g"),
                ("Onion", "1/2"),
                ("Garlic", "2 cloves"),
                ("Parmesan cheese", "15g"),
            ],
            &[
                "Boil pasta until al dente.",
                "Brown the turkey with diced onion and garlic.",
                "Add tomato sauce and simmer for 10 minutes.",
                "Toss with pasta and top with parmesan.",
            ],
        ),
        meal(
            "Chocolate Banana Protein Shake",
            Snack,
            [450, 40, 50, 10, 5],
            "snack-shake.jpg",
            Some("5 min"),
            &[
                ("Protein powder (chocolate)", "1 scoop"),
                ("Banana", "1"),
                ("Milk", "300ml"),
                ("Oats", "30g"),
            ],
            &["Blend everything with a handful of ice until smooth."],
        ),
        meal(
            "Steak & Rice with Avocado",
            Dinner,
            [950, 65, 85, 38, 11],
            "dinner-steak-rice.jpg",
            Some("30 min"),
            &[
                ("Flank steak", "220g"),
                ("Basmati rice (dry)", "90g"),
                ("Avocado", "1/2"),
                ("Black beans", "80g"),
                ("Lime", "1/2"),
            ],
            &[
                "Cook the rice and warm the black beans.",
                "Sear the steak to preference and slice against the grain.",
                "Serve over rice with beans, avocado and a squeeze of lime.",
            ],
        ),
    ]
}

fn plan_3500() -> Vec<Meal> {
    vec![
        meal(
            "Protein Pancake Stack with Eggs",
            Breakfast,
            [800, 50, 95, 22, 8],
            "breakfast-pancakes.jpg",
            Some("20 min"),
            &[
                ("Oat flour", "80g"),
                ("Protein powder", "1 scoop"),
                ("Egg", "3"),
                ("Milk", "150ml"),
                ("Maple syrup", "1 tbsp"),
                ("Strawberry", "100g"),
            ],
            &[
                "Blend oat flour, protein powder, one egg and milk into a batter.",
                "Cook pancakes on a hot pan, 2 minutes per side.",
                "Scramble the remaining eggs and serve alongside with strawberries and syrup.",
            ],
        ),
        meal(
            "Double Chicken Rice Bowl",
            Lunch,
            [850, 70, 95, 18, 7],
            "lunch-chicken-rice.jpg",
            Some("25 min"),
            &[
                ("Chicken thigh (skinless)", "250g"),
                ("Jasmine rice (dry)", "100g"),
                ("Broccoli", "150g"),
                ("Teriyaki sauce", "2 tbsp"),
                ("Sesame seeds", "1 tsp"),
            ],
            &[
                "Cook the rice and steam the broccoli.",
                "Pan-fry chicken thighs for 6 minutes per side, then glaze with teriyaki sauce.",
                "Assemble and finish with sesame seeds.",
            ],
        ),
        meal(
            "Post-Workout Tuna Wrap",
            Lunch,
            [500, 42, 50, 14, 6],
            "lunch-tuna-wrap.jpg",
            Some("10 min"),
            &[
                ("Tuna (canned in water)", "1 can"),
                ("Large tortilla", "1"),
                ("Light mayo", "1 tbsp"),
                ("Lettuce", "1 cup"),
                ("Cucumber", "1/2"),
            ],
            &[
                "Mix drained tuna with mayo.",
                "Fill the tortilla with lettuce, cucumber and tuna, then roll tightly.",
            ],
        ),
        meal(
            "Mass Gainer Shake",
            Snack,
            [500, 40, 60, 12, 5],
            "snack-shake.jpg",
            Some("5 min"),
            &[
                ("Protein powder", "1 scoop"),
                ("Whole milk", "350ml"),
                ("Oats", "40g"),
                ("Almond butter", "1 tbsp"),
            ],
            &["Blend all ingredients until smooth."],
        ),
        meal(
            "Beef Burrito Bowl",
            Dinner,
            [850, 58, 85, 28, 14],
            "dinner-burrito-bowl.jpg",
            Some("30 min"),
            &[
                ("Lean ground beef", "200g"),
                ("Brown rice (dry)", "80g"),
                ("Black beans", "100g"),
                ("Corn", "60g"),
                ("Salsa", "3 tbsp"),
                ("Cheddar cheese", "20g"),
            ],
            &[
                "Cook the rice.",
                "Brown the beef with taco spices.",
                "Warm beans and corn, then layer everything with salsa and cheese.",
            ],
        ),
    ]
}

/// Extra meals offered when swapping, grouped by meal type
pub fn meal_alternatives() -> Vec<Meal> {
    vec![
        meal(
            "Overnight Oats with Berries",
            Breakfast,
            [500, 30, 65, 12, 10],
            "alt-overnight-oats.jpg",
            Some("5 min + overnight"),
            &[
                ("Rolled oats", "70g"),
                ("Greek yogurt", "150g"),
                ("Milk", "100ml"),
                ("Mixed berries", "100g"),
                ("Chia seeds", "1 tbsp"),
            ],
            &[
                "Combine oats, yogurt, milk and chia seeds in a jar.",
                "Refrigerate overnight and top with berries.",
            ],
        ),
        meal(
            "Avocado Toast with Eggs",
            Breakfast,
            [520, 26, 40, 28, 11],
            "alt-avocado-toast.jpg",
            Some("10 min"),
            &[
                ("Sourdough bread", "2 slices"),
                ("Avocado", "1/2"),
                ("Egg", "2"),
                ("Chili flakes", "pinch"),
            ],
            &[
                "Toast the bread and mash avocado on top.",
                "Fry or poach the eggs and place on the toast.",
                "Finish with chili flakes.",
            ],
        ),
        meal(
            "Greek Yogurt Power Bowl",
            Breakfast,
            [480, 38, 50, 12, 6],
            "alt-yogurt-bowl.jpg",
            Some("5 min"),
            &[
                ("Greek yogurt", "250g"),
                ("Banana", "1"),
                ("Walnut", "15g"),
                ("Honey", "1 tsp"),
            ],
            &["Top yogurt with sliced banana, walnuts and honey."],
        ),
        meal(
            "Tuna Salad Wrap",
            Lunch,
            [600, 45, 55, 20, 8],
            "alt-tuna-wrap.jpg",
            Some("10 min"),
            &[
                ("Tuna (canned in water)", "1 can"),
                ("Whole wheat tortilla", "1 large"),
                ("Greek yogurt", "2 tbsp"),
                ("Lettuce", "1 cup"),
                ("Tomato", "1"),
            ],
            &[
                "Mix tuna with yogurt, salt and pepper.",
                "Fill the tortilla with lettuce, tomato and tuna, then roll.",
            ],
        ),
        meal(
            "Beef & Veggie Stir-Fry",
            Lunch,
            [700, 50, 70, 22, 8],
            "alt-beef-stirfry.jpg",
            Some("20 min"),
            &[
                ("Beef strips", "180g"),
                ("Rice noodles (dry)", "70g"),
                ("Stir-fry vegetables", "200g"),
                ("Soy sauce", "2 tbsp"),
                ("Ginger", "1 tsp"),
            ],
            &[
                "Soak the noodles in hot water.",
                "Stir-fry beef over high heat for 2 minutes, add vegetables and ginger.",
                "Toss in noodles and soy sauce.",
            ],
        ),
        meal(
            "Turkey Avocado Sandwich",
            Lunch,
            [650, 45, 60, 24, 9],
            "alt-turkey-sandwich.jpg",
            Some("10 min"),
            &[
                ("Turkey breast slices", "150g"),
                ("Whole grain bread", "2 slices"),
                ("Avocado", "1/2"),
                ("Spinach", "1 cup"),
            ],
            &["Layer turkey, avocado and spinach between the bread slices."],
        ),
        meal(
            "Chicken Fajita Bowl",
            Dinner,
            [800, 60, 80, 24, 12],
            "alt-fajita-bowl.jpg",
            Some("25 min"),
            &[
                ("Chicken breast", "200g"),
                ("Brown rice (dry)", "80g"),
                ("Bell pepper", "1"),
                ("Onion", "1/2"),
                ("Fajita spice", "1 tbsp"),
            ],
            &[
                "Cook the rice.",
                "Slice chicken, pepper and onion and cook with fajita spice until charred.",
                "Serve over rice.",
            ],
        ),
        meal(
            "Pork Tenderloin with Potatoes",
            Dinner,
            [850, 62, 75, 30, 9],
            "alt-pork-tenderloin.jpg",
            Some("40 min"),
            &[
                ("Pork tenderloin", "220g"),
                ("Baby potato", "300g"),
                ("Green beans", "150g"),
                ("Olive oil", "1 tbsp"),
                ("Rosemary", "1 sprig"),
            ],
            &[
                "Roast halved potatoes with olive oil and rosemary at 200C for 20 minutes.",
                "Sear the pork on all sides, then roast with the potatoes for 15 minutes.",
                "Rest the pork and serve with steamed green beans.",
            ],
        ),
        meal(
            "Shrimp Pasta Primavera",
            Dinner,
            [780, 50, 90, 20, 10],
            "alt-shrimp-pasta.jpg",
            Some("25 min"),
            &[
                ("Shrimp", "200g"),
                ("Whole wheat pasta (dry)", "90g"),
                ("Zucchini", "1"),
                ("Cherry tomato", "150g"),
                ("Garlic", "2 cloves"),
            ],
            &[
                "Boil the pasta.",
                "Saute garlic, zucchini and tomatoes, then add shrimp until pink.",
                "Toss with the pasta.",
            ],
        ),
        meal(
            "Apple with Almond Butter",
            Snack,
            [300, 8, 30, 18, 7],
            "alt-apple-almond.jpg",
            None,
            &[("Apple", "1 large"), ("Almond butter", "2 tbsp")],
            &["Slice the apple and dip in almond butter."],
        ),
        meal(
            "Cottage Cheese & Pineapple",
            Snack,
            [250, 25, 25, 5, 2],
            "alt-cottage-cheese.jpg",
            None,
            &[("Cottage cheese", "200g"), ("Pineapple chunks", "80g")],
            &["Top the cottage cheese with pineapple."],
        ),
        meal(
            "Protein Energy Balls",
            Snack,
            [350, 20, 35, 14, 5],
            "alt-energy-balls.jpg",
            Some("15 min"),
            &[
                ("Oats", "50g"),
                ("Protein powder", "1/2 scoop"),
                ("Peanut butter", "1 tbsp"),
                ("Honey", "1 tbsp"),
                ("Dark chocolate chips", "10g"),
            ],
            &[
                "Mix everything into a thick dough.",
                "Roll into 6 balls and chill for 10 minutes.",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_plan() {
        assert_eq!(get_meal_plan(1800), Err(NutritionError::UnknownPlan(1800)));
        assert!(find_calorie_plan(1800).is_none());
        assert_eq!(find_calorie_plan(3500).unwrap().meals, "4 meals + 1 snack");
    }

    #[test]
    fn test_meal_counts_match_summaries() {
        assert_eq!(get_meal_plan(2000).unwrap().meals.len(), 3);
        assert_eq!(get_meal_plan(2500).unwrap().meals.len(), 4);
        assert_eq!(get_meal_plan(3000).unwrap().meals.len(), 4);
        assert_eq!(get_meal_plan(3500).unwrap().meals.len(), 5);
    }

    #[test]
    fn test_every_type_has_alternatives() {
        let alts = meal_alternatives();
        for t in [Breakfast, Lunch, Dinner, Snack] {
            assert!(
                alts.iter().filter(|m| m.meal_type == t).count() >= 2,
                "{} should have alternatives",
                t.label()
            );
        }
        assert!(alts.iter().all(|m| m.image.starts_with("assets/meals/")));
    }
}
