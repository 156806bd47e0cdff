//! Hybrid Athlete Blueprint - 8-week training program tracker and meal planner

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hybrid_athlete::auth;
use hybrid_athlete::backend::Backend;
use hybrid_athlete::config::{Config, DEFAULT_DB_PATH, DEFAULT_LOCAL_PATH};
use hybrid_athlete::local::LocalStore;
use hybrid_athlete::models::{AuthSession, ExerciseSet};
use hybrid_athlete::nutrition::{
    self, CALORIE_PLANS, MealPlan, ShoppingList, alternatives_for, fiber_percentage,
    get_meal_plan, swap_with_alternative,
};
use hybrid_athlete::program::{
    PROGRAM_WEEKS, adjust_workout, find_workout, get_week_progression, get_workout_split,
};
use hybrid_athlete::progress::{VolumeTrend, volume_by_date};
use hybrid_athlete::tui::App;
use hybrid_athlete::workout_log::{LogError, WorkoutSession, validate_set};

#[derive(Parser)]
#[command(name = "hybrid-athlete")]
#[command(author, version, about = "Hybrid Athlete Blueprint - 8-week training tracker and meal planner")]
struct Cli {
    /// SQLite database used when no remote backend is configured
    #[arg(long, global = true, env = "HYBRID_ATHLETE_DB", default_value = DEFAULT_DB_PATH)]
    db: String,

    /// Local store for the session and unsaved sets
    #[arg(long, global = true, env = "HYBRID_ATHLETE_LOCAL", default_value = DEFAULT_LOCAL_PATH)]
    local: String,

    /// Remote backend URL
    #[arg(long, global = true, env = "SUPABASE_URL", hide_env_values = true)]
    supabase_url: Option<String>,

    /// Remote backend anon key
    #[arg(long, global = true, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// Show the 5-day split for a week
    Program {
        /// Week 1-8 (defaults to your current week)
        #[arg(short, long)]
        week: Option<u32>,
    },

    /// Show one workout day with the week's progression applied
    Workout {
        /// Workout day 1-5
        day: u32,
        #[arg(short, long)]
        week: Option<u32>,
    },

    /// Show or change your current program week
    Week {
        /// New week 1-8
        week: Option<u32>,
    },

    /// Enter a set (kept locally until `save`)
    Set {
        day: u32,
        /// Exercise id, e.g. "dips"
        exercise: String,
        /// Set number, starting at 1
        set: u32,
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        reps: u32,
        #[arg(long)]
        rpe: Option<u8>,
        #[arg(short, long)]
        week: Option<u32>,
    },

    /// Save entered sets to the backend
    Save {
        day: u32,
        #[arg(short, long)]
        week: Option<u32>,
        /// Only this exercise
        #[arg(short, long)]
        exercise: Option<String>,
    },

    /// Throw away entered sets that were not saved
    Discard {
        day: u32,
        #[arg(short, long)]
        week: Option<u32>,
        #[arg(short, long)]
        exercise: Option<String>,
    },

    /// Mark a workout as completed
    Finish {
        day: u32,
        #[arg(short, long)]
        week: Option<u32>,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List personal records
    Records,

    /// Volume per workout date and trend
    Progress,

    /// Create an account (a secure password is generated for you)
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    Logout,

    /// Show the logged-in user
    Whoami,

    /// Meal plans
    Nutrition {
        #[command(subcommand)]
        command: NutritionCommand,
    },
}

#[derive(Subcommand)]
enum NutritionCommand {
    /// List calorie plans
    Plans,

    /// Show a plan with totals and fiber status
    Show {
        calories: u32,
        /// Swap a meal: "<meal number>=<alternative name>"
        #[arg(long, value_parser = parse_swap)]
        swap: Vec<(usize, String)>,
    },

    /// List swap options for a meal
    Alternatives {
        calories: u32,
        /// Meal number as shown by `show`
        meal: usize,
    },

    /// Print the shopping list
    Shopping {
        calories: u32,
        #[arg(long, value_parser = parse_swap)]
        swap: Vec<(usize, String)>,
    },

    /// Export the plan as PDF
    Export {
        calories: u32,
        #[arg(long, value_parser = parse_swap)]
        swap: Vec<(usize, String)>,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

fn parse_swap(s: &str) -> Result<(usize, String), String> {
    let (index, name) = s
        .split_once('=')
        .ok_or_else(|| "expected <meal number>=<alternative name>".to_string())?;
    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid meal number '{}'", index))?;
    if index == 0 {
        return Err("meal numbers start at 1".to_string());
    }
    Ok((index - 1, name.trim().to_string()))
}

struct Ctx {
    local: LocalStore,
    session: Option<AuthSession>,
    backend: Arc<dyn Backend>,
}

impl Ctx {
    fn session(&self) -> Result<&AuthSession> {
        self.session
            .as_ref()
            .context("Not logged in. Run `hybrid-athlete login` first.")
    }

    /// Explicit week, else the profile's current week, else week 1
    async fn week(&self, explicit: Option<u32>) -> Result<u32> {
        let week = match (explicit, &self.session) {
            (Some(week), _) => week,
            (None, Some(session)) => self
                .backend
                .get_profile(&session.user.id)
                .await?
                .map(|p| p.current_week)
                .unwrap_or(1),
            (None, None) => 1,
        };
        get_week_progression(week)?;
        Ok(week)
    }

    async fn workout_session(&self, day: u32, week: u32) -> Result<WorkoutSession> {
        let session = self.session()?;
        Ok(WorkoutSession::load(self.backend.clone(), &session.user.id, day, week).await?)
    }
}

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let tui_mode = matches!(cli.command, None | Some(Commands::Tui));
    // TUI owns the terminal: errors only unless RUST_LOG says otherwise
    init_tracing(if tui_mode { "error" } else { "info" });

    let config = Config {
        db_path: cli.db,
        local_path: cli.local,
        supabase_url: cli.supabase_url,
        supabase_anon_key: cli.supabase_key,
    };
    let local = config.open_local()?;
    let session = auth::current_session(&local)?;
    let backend = config.open_backend(session.clone())?;
    let ctx = Ctx {
        local,
        session,
        backend,
    };

    match cli.command {
        Some(Commands::Tui) | None => {
            let mut app = App::new(ctx.backend, ctx.local, ctx.session).await?;
            app.run().await?;
        }

        Some(Commands::Program { week }) => {
            let week = ctx.week(week).await?;
            let progression = get_week_progression(week)?;
            println!(
                "Week {}/{} - {} ({}% 1RM, RPE {}-{})",
                week,
                PROGRAM_WEEKS,
                progression.phase.name(),
                progression.intensity_target,
                progression.rpe_range.0,
                progression.rpe_range.1
            );
            println!("{}", progression.description);
            println!("{:-<60}", "");
            for day in get_workout_split() {
                let adjusted = adjust_workout(day, week)?;
                let sets: u32 = adjusted.exercises.iter().map(|e| e.sets).sum();
                println!(
                    "Day {} | {:18} | {:?} | {} | {} exercises, {} sets",
                    day.id,
                    day.name,
                    day.difficulty,
                    day.duration,
                    adjusted.exercises.len(),
                    sets
                );
                println!("      {}", day.focus);
            }
        }

        Some(Commands::Workout { day, week }) => {
            let week = ctx.week(week).await?;
            let workout = adjust_workout(find_workout(day)?, week)?;
            let logged = match &ctx.session {
                Some(_) => Some(ctx.workout_session(day, week).await?),
                None => None,
            };

            println!("{} - {}", workout.name, workout.focus);
            println!("{}", workout.description);
            println!("{:-<60}", "");
            for (i, ex) in workout.exercises.iter().enumerate() {
                println!(
                    "{}. {} {} [{}] - {} sets x {} reps, rest {}",
                    i + 1,
                    ex.kind.emoji(),
                    ex.name,
                    ex.id,
                    ex.sets,
                    ex.reps,
                    ex.adjusted_rest.as_deref().unwrap_or(&ex.rest)
                );
                if let Some(notes) = &ex.notes {
                    println!("   {}", notes);
                }
                if let Some(video) = &ex.video_id {
                    println!("   Demo: https://www.youtube.com/watch?v={}", video);
                }

                let Some(log) = &logged else { continue };
                if let Some(pr) = log.record(&ex.id) {
                    println!("   PR: {} lbs x {}", pr.weight, pr.reps);
                }
                let pending = ctx.local.pending_for(day, week, &ex.id)?;
                for set_number in 1..=ex.sets {
                    let target = ex
                        .target_reps_for_set(set_number)
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| ex.reps.clone());
                    let prev = log
                        .previous_sets(&ex.id)
                        .iter()
                        .find(|s| s.set_number == set_number)
                        .map(|s| format!("last {} x {}", s.weight, s.reps))
                        .unwrap_or_default();
                    let entry = if let Some(p) = pending.iter().find(|s| s.set_number == set_number) {
                        format!("{} x {} (unsaved)", p.weight, p.reps)
                    } else if let Some(s) = log.saved_set(&ex.id, set_number) {
                        let progress = log
                            .progress(&ex.id, s)
                            .map(|p| format!(" [{}]", p))
                            .unwrap_or_default();
                        format!("{} x {}{}", s.weight, s.reps, progress)
                    } else {
                        "-".to_string()
                    };
                    println!("   Set {}: target {:>3} | {:24} {}", set_number, target, entry, prev);
                }
            }
        }

        Some(Commands::Week { week }) => {
            let session = ctx.session()?;
            match week {
                Some(week) => {
                    auth::set_current_week(ctx.backend.as_ref(), &session.user.id, week).await?;
                    let progression = get_week_progression(week)?;
                    println!("Current week set to {} ({})", week, progression.phase.name());
                }
                None => {
                    let week = ctx.week(None).await?;
                    let progression = get_week_progression(week)?;
                    println!("Week {}/{} - {}", week, PROGRAM_WEEKS, progression.phase.name());
                    for goal in progression.goals {
                        println!("  - {}", goal);
                    }
                }
            }
        }

        Some(Commands::Set {
            day,
            exercise,
            set,
            weight,
            reps,
            rpe,
            week,
        }) => {
            let week = ctx.week(week).await?;
            let ex = find_workout(day)?.find_exercise(&exercise)?;
            let entry = ExerciseSet::new(set, weight, reps, rpe);
            validate_set(&entry)?;
            ctx.local.put_pending(day, week, ex.id, &entry)?;
            println!(
                "{} set {}: {} lbs x {} (run `save {}` to store)",
                ex.name, set, weight, reps, day
            );
        }

        Some(Commands::Save {
            day,
            week,
            exercise,
        }) => {
            let week = ctx.week(week).await?;
            let workout = find_workout(day)?;
            let mut session = ctx.workout_session(day, week).await?;

            let mut pending = ctx.local.pending(day, week)?;
            if let Some(only) = &exercise {
                pending.retain(|p| &p.exercise_id == only);
            }
            if pending.is_empty() {
                println!("Nothing to save.");
                return Ok(());
            }

            let mut exercise_ids: Vec<String> = pending.iter().map(|p| p.exercise_id.clone()).collect();
            exercise_ids.dedup();
            for exercise_id in exercise_ids {
                let ex = workout.find_exercise(&exercise_id)?;
                let sets: Vec<ExerciseSet> = pending
                    .iter()
                    .filter(|p| p.exercise_id == exercise_id)
                    .map(|p| p.set.clone())
                    .collect();

                match session.save_exercise_batch(ex.id, ex.name, sets).await {
                    Ok(outcome) => {
                        ctx.local.remove_pending(day, week, ex.id, &outcome.saved)?;
                        println!("{}: saved {} set(s)", ex.name, outcome.saved.len());
                        if let Some(pr) = outcome.new_record {
                            println!("  🏆 New PR! {} lbs x {}", pr.weight, pr.reps);
                        }
                    }
                    Err(LogError::PartialBatch {
                        saved,
                        failed_set,
                        source,
                    }) => {
                        ctx.local.remove_pending(day, week, ex.id, &saved)?;
                        bail!(
                            "{}: saved {} set(s), set {} failed: {}. Unsaved sets are kept; run save again.",
                            ex.name,
                            saved.len(),
                            failed_set,
                            source
                        );
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Some(Commands::Discard {
            day,
            week,
            exercise,
        }) => {
            let week = ctx.week(week).await?;
            let removed = ctx
                .local
                .discard_pending(day, week, exercise.as_deref())?;
            println!("Discarded {} unsaved set(s).", removed);
        }

        Some(Commands::Finish { day, week, notes }) => {
            let week = ctx.week(week).await?;
            let mut session = ctx.workout_session(day, week).await?;
            session.complete(notes.as_deref()).await?;
            println!("Workout completed. Great job!");
        }

        Some(Commands::Records) => {
            let session = ctx.session()?;
            let mut records = ctx.backend.personal_records(&session.user.id).await?;
            records.sort_by(|a, b| a.exercise_name.cmp(&b.exercise_name));
            if records.is_empty() {
                println!("No personal records yet.");
            }
            for pr in records {
                println!(
                    "{:32} {:>7.1} lbs x {:<3} {}",
                    pr.exercise_name,
                    pr.weight,
                    pr.reps,
                    pr.achieved_at.format("%Y-%m-%d")
                );
            }
        }

        Some(Commands::Progress) => {
            let session = ctx.session()?;
            let points = volume_by_date(ctx.backend.as_ref(), &session.user.id).await?;
            if points.is_empty() {
                println!("No workouts logged yet.");
                return Ok(());
            }
            let max = points.iter().map(|p| p.volume).fold(0.0_f64, f64::max);
            for p in &points {
                let bar = if max > 0.0 {
                    "█".repeat((p.volume / max * 40.0).round() as usize)
                } else {
                    String::new()
                };
                println!("{} {:>9.0} {}", p.label(), p.volume, bar);
            }
            if let Some(trend) = VolumeTrend::fit(&points) {
                println!("{}", trend.summary());
            }
        }

        Some(Commands::Signup { name, email }) => {
            let creds = auth::sign_up(ctx.backend.as_ref(), &ctx.local, &name, &email).await?;
            println!("Account created for {}", creds.email);
            println!("Password: {}", creds.password);
            println!("Save this password now - it will not be shown again.");
        }

        Some(Commands::Login { email, password }) => {
            let (_, profile) = auth::login(ctx.backend.as_ref(), &ctx.local, &email, &password).await?;
            println!(
                "Welcome back, {}! Current week: {}",
                profile.display_name(),
                profile.current_week
            );
        }

        Some(Commands::Logout) => {
            auth::logout(ctx.backend.as_ref(), &ctx.local).await?;
            println!("Logged out.");
        }

        Some(Commands::Whoami) => match &ctx.session {
            Some(session) => {
                let profile = ctx.backend.get_profile(&session.user.id).await?;
                println!(
                    "{} ({}) on {} backend",
                    profile.as_ref().map(|p| p.display_name()).unwrap_or("athlete"),
                    session.user.email.as_deref().unwrap_or("-"),
                    ctx.backend.name()
                );
            }
            None => println!("Not logged in."),
        },

        Some(Commands::Nutrition { command }) => run_nutrition(command)?,
    }

    Ok(())
}

fn plan_with_swaps(calories: u32, swaps: &[(usize, String)]) -> Result<MealPlan> {
    let mut plan = get_meal_plan(calories)?;
    for (index, name) in swaps {
        swap_with_alternative(&mut plan, *index, name)?;
    }
    Ok(plan)
}

fn run_nutrition(command: NutritionCommand) -> Result<()> {
    match command {
        NutritionCommand::Plans => {
            for plan in CALORIE_PLANS {
                println!(
                    "{:>5} kcal | {:24} | {:36} | {}",
                    plan.calories, plan.title, plan.description, plan.meals
                );
            }
        }

        NutritionCommand::Show { calories, swap } => {
            let plan = plan_with_swaps(calories, &swap)?;
            let totals = plan.totals();
            println!("{} kcal plan - {}", plan.calorie_target, plan.description);
            println!(
                "Totals: {} kcal | {}g P | {}g C | {}g F | {}g fiber ({}, {:.0}%)",
                totals.calories,
                totals.protein,
                totals.carbs,
                totals.fats,
                totals.fiber,
                totals.fiber_status().label(),
                fiber_percentage(totals.fiber)
            );
            println!("{:-<60}", "");
            for (i, meal) in plan.meals.iter().enumerate() {
                println!(
                    "{}. [{}] {} - {} kcal, {}g P, {}g C, {}g F, {}g fiber{}",
                    i + 1,
                    meal.meal_type.label(),
                    meal.name,
                    meal.calories,
                    meal.protein,
                    meal.carbs,
                    meal.fats,
                    meal.fiber,
                    meal.prep_time
                        .as_deref()
                        .map(|t| format!(", {}", t))
                        .unwrap_or_default()
                );
                for ing in &meal.ingredients {
                    println!("     - {} ({})", ing.name, ing.amount);
                }
            }
        }

        NutritionCommand::Alternatives { calories, meal } => {
            let plan = get_meal_plan(calories)?;
            let current = meal
                .checked_sub(1)
                .and_then(|i| plan.meals.get(i))
                .ok_or(nutrition::NutritionError::MealIndex {
                    index: meal,
                    len: plan.meals.len(),
                })?;
            println!("Alternatives for {} ({}):", current.name, current.meal_type.label());
            for alt in alternatives_for(current) {
                println!(
                    "  {} - {} kcal, {}g P, {}g C, {}g F",
                    alt.name, alt.calories, alt.protein, alt.carbs, alt.fats
                );
            }
        }

        NutritionCommand::Shopping { calories, swap } => {
            let plan = plan_with_swaps(calories, &swap)?;
            print!("{}", ShoppingList::from_plan(&plan).to_text());
        }

        NutritionCommand::Export {
            calories,
            swap,
            out,
        } => {
            let plan = plan_with_swaps(calories, &swap)?;
            let path = nutrition::pdf::export_meal_plan(&plan, &out)?;
            println!("PDF saved to {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_swap() {
        assert_eq!(parse_swap("2=Tuna Salad Wrap"), Ok((1, "Tuna Salad Wrap".to_string())));
        assert!(parse_swap("0=x").is_err());
        assert!(parse_swap("Tuna").is_err());
        assert!(parse_swap("a=b").is_err());
    }

    #[test]
    fn test_cli_parses_set_command() {
        let cli = Cli::try_parse_from([
            "hybrid-athlete",
            "set",
            "1",
            "dips",
            "2",
            "--weight",
            "25",
            "--reps",
            "6",
            "--rpe",
            "8",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Set { set, weight, rpe, .. }) => {
                assert_eq!(set, 2);
                assert_eq!(weight, 25.0);
                assert_eq!(rpe, Some(8));
            }
            _ => panic!("expected set command"),
        }
    }
}
