//! Nutrition module - calorie-targeted meal plans, swaps, shopping lists
//! and PDF export

pub mod data;
pub mod pdf;
pub mod shopping;
pub mod swap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use data::{CALORIE_PLANS, get_meal_plan};
pub use shopping::{Category, ShoppingList};
pub use swap::{alternatives_for, swap_with_alternative};

#[derive(Debug, Error, PartialEq)]
pub enum NutritionError {
    #[error("No meal plan for {0} kcal")]
    UnknownPlan(u32),
    #[error("Meal {index} out of range (plan has {len} meals)")]
    MealIndex { index: usize, len: usize },
    #[error("No alternative named '{0}' for this meal")]
    UnknownAlternative(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn label(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub meal_type: MealType,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
    pub fiber: u32,
    /// Path to a JPEG/PNG shown next to the meal
    pub image: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub prep_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub calorie_target: u32,
    pub description: String,
    pub meals: Vec<Meal>,
}

impl MealPlan {
    pub fn totals(&self) -> MacroTotals {
        self.meals.iter().fold(MacroTotals::default(), |acc, m| MacroTotals {
            calories: acc.calories + m.calories,
            protein: acc.protein + m.protein,
            carbs: acc.carbs + m.carbs,
            fats: acc.fats + m.fats,
            fiber: acc.fiber + m.fiber,
        })
    }

    /// Replace the meal at `index`, returning the one that was there
    pub fn swap_meal(&mut self, index: usize, replacement: Meal) -> Result<Meal, NutritionError> {
        let len = self.meals.len();
        let slot = self
            .meals
            .get_mut(index)
            .ok_or(NutritionError::MealIndex { index, len })?;
        Ok(std::mem::replace(slot, replacement))
    }

    /// Suggested export file name
    pub fn pdf_filename(&self) -> String {
        format!("Hybrid_Athlete_{}kcal_MealPlan.pdf", self.calorie_target)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MacroTotals {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
    pub fiber: u32,
}

impl MacroTotals {
    pub fn fiber_status(&self) -> FiberStatus {
        FiberStatus::from_grams(self.fiber)
    }
}

/// Daily fiber rating, target 35-50g
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiberStatus {
    Poor,
    Moderate,
    Good,
    Excessive,
}

impl FiberStatus {
    pub fn from_grams(fiber: u32) -> Self {
        match fiber {
            0..=24 => FiberStatus::Poor,
            25..=35 => FiberStatus::Moderate,
            36..=50 => FiberStatus::Good,
            _ => FiberStatus::Excessive,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FiberStatus::Poor => "Poor",
            FiberStatus::Moderate => "Moderate",
            FiberStatus::Good => "Good",
            FiberStatus::Excessive => "Excessive",
        }
    }
}

/// Bar fill for the fiber gauge, 50g is a full bar
pub fn fiber_percentage(fiber: u32) -> f64 {
    (fiber as f64 / 50.0 * 100.0).min(100.0)
}

/// One selectable calorie target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaloriePlan {
    pub calories: u32,
    pub title: &'static str,
    pub description: &'static str,
    pub meals: &'static str,
}
