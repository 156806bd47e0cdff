//! TUI module - Terminal dashboard with ratatui

use std::io::{Stdout, stdout};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{BarChart, Block, Borders, Cell, Clear, Gauge, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};
use tracing::warn;

use crate::auth;
use crate::backend::Backend;
use crate::local::LocalStore;
use crate::models::{AuthSession, ExerciseSet, Profile};
use crate::nutrition::{
    CALORIE_PLANS, FiberStatus, Meal, MealPlan, ShoppingList, alternatives_for, fiber_percentage,
    get_meal_plan, pdf::export_meal_plan,
};
use crate::program::{
    AdjustedWorkout, PROGRAM_WEEKS, adjust_workout, get_week_progression, get_workout_split,
};
use crate::progress::{VolumePoint, VolumeTrend, volume_by_date};
use crate::workout_log::{LogError, WorkoutSession, validate_set};

type Tui = Terminal<CrosstermBackend<Stdout>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Welcome,
    Dashboard,
    Workout,
    Progress,
    Plans,
    MealPlan,
    Shopping,
}

/// Parse "set weight reps [rpe]", e.g. "2 135 8 7"
pub fn parse_set_entry(input: &str) -> Result<ExerciseSet, String> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if !(3..=4).contains(&parts.len()) {
        return Err("Enter: set weight reps [rpe]".to_string());
    }
    let set_number: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid set number '{}'", parts[0]))?;
    let weight: f64 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid weight '{}'", parts[1]))?;
    let reps: u32 = parts[2]
        .parse()
        .map_err(|_| format!("Invalid reps '{}'", parts[2]))?;
    let rpe = match parts.get(3) {
        Some(r) => Some(r.parse::<u8>().map_err(|_| format!("Invalid RPE '{}'", r))?),
        None => None,
    };
    let set = ExerciseSet::new(set_number, weight, reps, rpe);
    validate_set(&set).map_err(|e| e.to_string())?;
    Ok(set)
}

/// App state for TUI
pub struct App {
    backend: Arc<dyn Backend>,
    local: LocalStore,
    session: Option<AuthSession>,
    profile: Option<Profile>,
    screen: Screen,
    week: u32,
    selected_day: usize,
    workout: Option<AdjustedWorkout>,
    log: Option<WorkoutSession>,
    selected_exercise: usize,
    /// Set entry being typed on the workout screen
    input: Option<String>,
    volume: Vec<VolumePoint>,
    trend: Option<VolumeTrend>,
    selected_plan: usize,
    plan: Option<MealPlan>,
    selected_meal: usize,
    /// Swap dialog: candidates and cursor
    swap: Option<(Vec<Meal>, usize)>,
    shopping: Option<ShoppingList>,
    selected_item: usize,
    status: Option<String>,
    should_quit: bool,
}

impl App {
    pub async fn new(
        backend: Arc<dyn Backend>,
        local: LocalStore,
        session: Option<AuthSession>,
    ) -> Result<Self> {
        let profile = match &session {
            Some(s) => match auth::ensure_profile(backend.as_ref(), s).await {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(error = %e, "Could not load profile");
                    None
                }
            },
            None => None,
        };
        let week = profile.as_ref().map(|p| p.current_week).unwrap_or(1);

        Ok(Self {
            backend,
            local,
            session,
            profile,
            screen: Screen::Welcome,
            week,
            selected_day: 0,
            workout: None,
            log: None,
            selected_exercise: 0,
            input: None,
            volume: Vec::new(),
            trend: None,
            selected_plan: 0,
            plan: None,
            selected_meal: 0,
            swap: None,
            shopping: None,
            selected_item: 0,
            status: None,
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        let result = self.event_loop(&mut terminal).await;

        restore_terminal()?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            if let Some(key) = poll_key()? {
                self.handle_key(key).await?;
            }
        }
        Ok(())
    }

    fn user_id(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.user.id.clone())
    }

    // ---- rendering ----

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let user = match (&self.profile, &self.session) {
            (Some(p), _) => p.display_name().to_string(),
            (None, Some(s)) => s.user.email.clone().unwrap_or_default(),
            (None, None) => "guest".to_string(),
        };
        let header = Paragraph::new(format!(
            "HYBRID ATHLETE BLUEPRINT | Week {}/{} | {} | {}",
            self.week,
            PROGRAM_WEEKS,
            user,
            self.backend.name()
        ))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        match self.screen {
            Screen::Welcome => self.render_welcome(frame, chunks[1]),
            Screen::Dashboard => self.render_dashboard(frame, chunks[1]),
            Screen::Workout => self.render_workout(frame, chunks[1]),
            Screen::Progress => self.render_progress(frame, chunks[1]),
            Screen::Plans => self.render_plans(frame, chunks[1]),
            Screen::MealPlan => self.render_meal_plan(frame, chunks[1]),
            Screen::Shopping => self.render_shopping(frame, chunks[1]),
        }

        // Footer
        let footer_text = if let Some(input) = &self.input {
            format!("set weight reps [rpe]: {}_  (Enter: keep, Esc: cancel)", input)
        } else if let Some(status) = &self.status {
            status.clone()
        } else {
            self.key_help().to_string()
        };
        let footer = Paragraph::new(footer_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn key_help(&self) -> &'static str {
        match self.screen {
            Screen::Welcome => "Enter: training | n: nutrition | q: quit",
            Screen::Dashboard => "↑↓: day | ←→: week | Enter: open | p: progress | n: nutrition | Esc: back",
            Screen::Workout => "↑↓: exercise | e: enter set | s: save | d: discard | f: finish | Esc: back",
            Screen::Progress => "Esc: back",
            Screen::Plans => "↑↓: plan | Enter: open | Esc: back",
            Screen::MealPlan if self.swap.is_some() => "↑↓: choose | Enter: swap | Esc: cancel",
            Screen::MealPlan => "↑↓: meal | x: swap | l: shopping list | p: export PDF | Esc: back",
            Screen::Shopping => "↑↓: item | Space: check | Esc: back",
        }
    }

    fn render_welcome(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from("HYBRID ATHLETE BLUEPRINT".bold().fg(Color::Blue)),
            Line::from(""),
            Line::from("8 weeks. 5 days. Calisthenics and bodybuilding in one program."),
            Line::from(""),
        ];
        if let Ok(p) = get_week_progression(self.week) {
            lines.push(Line::from(format!(
                "Week {}: {} - {}",
                self.week,
                p.phase.name(),
                p.description
            )));
        }
        lines.push(Line::from(""));
        if self.session.is_none() {
            lines.push(Line::from(
                "Not logged in - run `hybrid-athlete signup` / `login` to track your sets."
                    .fg(Color::Yellow),
            ));
        }
        let welcome = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(welcome, area);
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let rows: Vec<Row> = get_workout_split()
            .iter()
            .map(|day| {
                let sets: u32 = adjust_workout(day, self.week)
                    .map(|w| w.exercises.iter().map(|e| e.sets).sum())
                    .unwrap_or(0);
                Row::new(vec![
                    Cell::from(format!("Day {}", day.id)),
                    Cell::from(day.name),
                    Cell::from(format!("{:?}", day.difficulty)),
                    Cell::from(day.duration),
                    Cell::from(format!("{} sets", sets)),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Min(16),
                Constraint::Length(13),
                Constraint::Length(10),
                Constraint::Length(9),
            ],
        )
        .header(Row::new(vec!["", "Workout", "Level", "Time", "Volume"]).style(Style::default().bold()))
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title("Workout Split"));
        let mut state = ratatui::widgets::TableState::default().with_selected(Some(self.selected_day));
        frame.render_stateful_widget(table, chunks[0], &mut state);

        let mut lines = Vec::new();
        if let Ok(p) = get_week_progression(self.week) {
            lines.push(Line::from(p.phase.name().bold().fg(Color::Blue)));
            lines.push(Line::from(p.description));
            lines.push(Line::from(""));
            lines.push(Line::from(format!("Volume: {:.0}%", p.volume_multiplier * 100.0)));
            lines.push(Line::from(format!("Intensity: {}% 1RM", p.intensity_target)));
            lines.push(Line::from(format!("RPE: {}-{}", p.rpe_range.0, p.rpe_range.1)));
            lines.push(Line::from(format!("Rest: x{:.2}", p.rest_multiplier)));
            lines.push(Line::from(""));
            for goal in p.goals {
                lines.push(Line::from(format!("• {}", goal)));
            }
        }
        if let Some(day) = get_workout_split().get(self.selected_day) {
            lines.push(Line::from(""));
            lines.push(Line::from(day.focus.fg(Color::Cyan)));
        }
        let info = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(format!("Week {}", self.week)));
        frame.render_widget(info, chunks[1]);
    }

    fn render_workout(&self, frame: &mut Frame, area: Rect) {
        let Some(workout) = &self.workout else {
            return;
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(8), Constraint::Length(12)])
            .split(area);

        let title = Paragraph::new(workout.description.as_str())
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(workout.name.as_str()));
        frame.render_widget(title, chunks[0]);

        let rows: Vec<Row> = workout
            .exercises
            .iter()
            .map(|ex| {
                let saved = self.log.as_ref().map(|l| l.sets(&ex.id).len()).unwrap_or(0);
                let pending = self
                    .local
                    .pending_for(workout.id, self.week, &ex.id)
                    .map(|p| p.len())
                    .unwrap_or(0);
                let pr = self
                    .log
                    .as_ref()
                    .and_then(|l| l.record(&ex.id))
                    .map(|r| format!("{} x {}", r.weight, r.reps))
                    .unwrap_or_default();
                let logged = if pending > 0 {
                    format!("{}/{} (+{})", saved, ex.sets, pending)
                } else {
                    format!("{}/{}", saved, ex.sets)
                };
                Row::new(vec![
                    Cell::from(ex.kind.emoji()),
                    Cell::from(ex.name.clone()),
                    Cell::from(format!("{} x {}", ex.sets, ex.reps)),
                    Cell::from(ex.adjusted_rest.clone().unwrap_or_else(|| ex.rest.clone())),
                    Cell::from(logged),
                    Cell::from(pr),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Min(24),
                Constraint::Length(18),
                Constraint::Length(9),
                Constraint::Length(10),
                Constraint::Length(12),
            ],
        )
        .header(Row::new(vec!["", "Exercise", "Sets x Reps", "Rest", "Logged", "PR"]).style(Style::default().bold()))
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title("Exercises"));
        let mut state = ratatui::widgets::TableState::default().with_selected(Some(self.selected_exercise));
        frame.render_stateful_widget(table, chunks[1], &mut state);

        frame.render_widget(self.exercise_detail(workout), chunks[2]);
    }

    fn exercise_detail(&self, workout: &AdjustedWorkout) -> Paragraph<'static> {
        let Some(ex) = workout.exercises.get(self.selected_exercise) else {
            return Paragraph::new("");
        };
        let mut lines = Vec::new();
        if let Some(notes) = &ex.notes {
            lines.push(Line::from(notes.clone().fg(Color::Gray)));
        }
        if let Some(video) = &ex.video_id {
            lines.push(Line::from(format!("Demo: https://www.youtube.com/watch?v={}", video)));
        }

        let pending = self
            .local
            .pending_for(workout.id, self.week, &ex.id)
            .unwrap_or_default();
        for set_number in 1..=ex.sets {
            let target = ex
                .target_reps_for_set(set_number)
                .map(|r| r.to_string())
                .unwrap_or_else(|| ex.reps.clone());
            let mut spans = vec![Span::raw(format!("Set {}  target {:>3}  ", set_number, target))];

            if let Some(p) = pending.iter().find(|s| s.set_number == set_number) {
                spans.push(format!("{} x {} (unsaved)", p.weight, p.reps).fg(Color::Yellow));
            } else if let Some(log) = &self.log
                && let Some(s) = log.saved_set(&ex.id, set_number)
            {
                spans.push(format!("{} x {}", s.weight, s.reps).fg(Color::White));
                if let Some(progress) = log.progress(&ex.id, s) {
                    let color = if progress.is_improved() {
                        Color::Green
                    } else if progress.is_regressed() {
                        Color::Red
                    } else {
                        Color::DarkGray
                    };
                    spans.push(format!("  {}", progress).fg(color));
                }
            } else {
                spans.push("-".fg(Color::DarkGray));
            }

            if let Some(prev) = self
                .log
                .as_ref()
                .and_then(|l| l.previous_sets(&ex.id).iter().find(|s| s.set_number == set_number))
            {
                spans.push(format!("   last {} x {}", prev.weight, prev.reps).fg(Color::DarkGray));
            }
            lines.push(Line::from(spans));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(ex.name.clone()))
    }

    fn render_progress(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(3)])
            .split(area);

        if self.volume.is_empty() {
            let empty = Paragraph::new("No workouts logged yet.")
                .block(Block::default().borders(Borders::ALL).title("Training Volume"));
            frame.render_widget(empty, chunks[0]);
        } else {
            // Most recent sessions that fit the width
            let max_bars = (chunks[0].width.saturating_sub(2) / 9).max(1) as usize;
            let start = self.volume.len().saturating_sub(max_bars);
            let labels: Vec<(String, u64)> = self.volume[start..]
                .iter()
                .map(|p| (p.label(), p.volume.round() as u64))
                .collect();
            let data: Vec<(&str, u64)> = labels.iter().map(|(l, v)| (l.as_str(), *v)).collect();
            let chart = BarChart::default()
                .block(Block::default().borders(Borders::ALL).title("Training Volume (lbs)"))
                .data(data.as_slice())
                .bar_width(7)
                .bar_gap(2)
                .bar_style(Style::default().fg(Color::Blue))
                .value_style(Style::default().fg(Color::White).bg(Color::Blue));
            frame.render_widget(chart, chunks[0]);
        }

        let trend = match &self.trend {
            Some(t) => t.summary(),
            None => "Log at least 3 workout days to see a trend".to_string(),
        };
        let summary = Paragraph::new(trend).block(Block::default().borders(Borders::ALL).title("Trend"));
        frame.render_widget(summary, chunks[1]);
    }

    fn render_plans(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = CALORIE_PLANS
            .iter()
            .map(|p| {
                ListItem::new(vec![
                    Line::from(vec![
                        format!("{} kcal  ", p.calories).bold().fg(Color::Blue),
                        Span::raw(p.title),
                    ]),
                    Line::from(format!("   {} - {}", p.description, p.meals).fg(Color::Gray)),
                ])
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Choose Your Plan"))
            .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = ListState::default().with_selected(Some(self.selected_plan));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_meal_plan(&self, frame: &mut Frame, area: Rect) {
        let Some(plan) = &self.plan else {
            return;
        };
        let totals = plan.totals();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(6)])
            .split(area);

        let macros = Paragraph::new(format!(
            "{} kcal | {}g protein | {}g carbs | {}g fats",
            totals.calories, totals.protein, totals.carbs, totals.fats
        ))
        .block(Block::default().borders(Borders::ALL).title(format!(
            "{} kcal Plan - {}",
            plan.calorie_target, plan.description
        )));
        frame.render_widget(macros, chunks[0]);

        let status = totals.fiber_status();
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Fiber (target 35-50g)"))
            .gauge_style(Style::default().fg(fiber_color(status)))
            .percent(fiber_percentage(totals.fiber).round() as u16)
            .label(format!("{}g - {}", totals.fiber, status.label()));
        frame.render_widget(gauge, chunks[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[2]);

        let items: Vec<ListItem> = plan
            .meals
            .iter()
            .map(|m| {
                ListItem::new(vec![
                    Line::from(m.meal_type.label().to_uppercase().fg(Color::Blue)),
                    Line::from(m.name.clone().bold()),
                    Line::from(
                        format!(
                            "{} kcal | {}P {}C {}F | {}g fiber",
                            m.calories, m.protein, m.carbs, m.fats, m.fiber
                        )
                        .fg(Color::Gray),
                    ),
                ])
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Meals"))
            .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = ListState::default().with_selected(Some(self.selected_meal));
        frame.render_stateful_widget(list, body[0], &mut state);

        if let Some(meal) = plan.meals.get(self.selected_meal) {
            frame.render_widget(meal_detail(meal), body[1]);
        }

        if let Some((alternatives, cursor)) = &self.swap {
            let popup = centered_rect(60, 60, area);
            frame.render_widget(Clear, popup);
            let items: Vec<ListItem> = if alternatives.is_empty() {
                vec![ListItem::new("No alternatives available")]
            } else {
                alternatives
                    .iter()
                    .map(|m| {
                        ListItem::new(format!(
                            "{} - {} kcal, {}g P, {}g C, {}g F",
                            m.name, m.calories, m.protein, m.carbs, m.fats
                        ))
                    })
                    .collect()
            };
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title("Swap Meal"))
                .highlight_style(Style::default().bg(Color::Blue));
            let mut state = ListState::default().with_selected(Some(*cursor));
            frame.render_stateful_widget(list, popup, &mut state);
        }
    }

    fn render_shopping(&self, frame: &mut Frame, area: Rect) {
        let Some(list) = &self.shopping else {
            return;
        };
        let mut items = Vec::new();
        for (category, entries) in list.by_category() {
            items.push(ListItem::new(Line::from(
                format!("[{}]", category.label()).bold().fg(Color::Blue),
            )));
            for (index, item) in entries {
                let mark = if list.is_checked(index) { "[x]" } else { "[ ]" };
                let style = if list.is_checked(index) {
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default()
                };
                items.push(ListItem::new(Line::styled(
                    format!("  {} {} ({})", mark, item.name, item.amount),
                    style,
                )));
            }
        }
        let title = format!(
            "Shopping List - {}/{} checked",
            list.checked_count(),
            list.items().len()
        );
        let widget = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = ListState::default().with_selected(self.shopping_row());
        frame.render_stateful_widget(widget, area, &mut state);
    }

    /// Row of the selected item in the rendered list, counting category headers
    fn shopping_row(&self) -> Option<usize> {
        let list = self.shopping.as_ref()?;
        let mut row = 0;
        let mut index = 0;
        for (_, entries) in list.by_category() {
            row += 1;
            for _ in entries {
                if index == self.selected_item {
                    return Some(row);
                }
                row += 1;
                index += 1;
            }
        }
        None
    }

    // ---- input ----

    async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.input.is_some() {
            self.handle_input_key(key);
            return Ok(());
        }
        if key.code == KeyCode::Char('q') && self.screen != Screen::Workout {
            self.should_quit = true;
            return Ok(());
        }
        self.status = None;

        match self.screen {
            Screen::Welcome => match key.code {
                KeyCode::Enter => self.screen = Screen::Dashboard,
                KeyCode::Char('n') => self.screen = Screen::Plans,
                _ => {}
            },
            Screen::Dashboard => match key.code {
                KeyCode::Up => self.selected_day = self.selected_day.saturating_sub(1),
                KeyCode::Down => {
                    self.selected_day = (self.selected_day + 1).min(get_workout_split().len() - 1)
                }
                KeyCode::Left if self.week > 1 => self.change_week(self.week - 1).await,
                KeyCode::Right if self.week < PROGRAM_WEEKS => self.change_week(self.week + 1).await,
                KeyCode::Enter => self.open_workout().await,
                KeyCode::Char('p') => self.open_progress().await,
                KeyCode::Char('n') => self.screen = Screen::Plans,
                KeyCode::Esc => self.screen = Screen::Welcome,
                _ => {}
            },
            Screen::Workout => self.handle_workout_key(key).await,
            Screen::Progress => {
                if key.code == KeyCode::Esc {
                    self.screen = Screen::Dashboard;
                }
            }
            Screen::Plans => match key.code {
                KeyCode::Up => self.selected_plan = self.selected_plan.saturating_sub(1),
                KeyCode::Down => {
                    self.selected_plan = (self.selected_plan + 1).min(CALORIE_PLANS.len() - 1)
                }
                KeyCode::Enter => self.open_plan(),
                KeyCode::Esc => self.screen = Screen::Welcome,
                _ => {}
            },
            Screen::MealPlan => self.handle_meal_plan_key(key),
            Screen::Shopping => self.handle_shopping_key(key),
        }
        Ok(())
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let Some(buffer) = self.input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == ' ' => buffer.push(c),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Esc => self.input = None,
            KeyCode::Enter => {
                let text = buffer.clone();
                self.input = None;
                self.store_pending(&text);
            }
            _ => {}
        }
    }

    fn store_pending(&mut self, text: &str) {
        let Some((day, exercise_id)) = self.selected_exercise_ids() else {
            return;
        };
        self.status = Some(match parse_set_entry(text) {
            Ok(set) => match self.local.put_pending(day, self.week, &exercise_id, &set) {
                Ok(()) => format!("Set {} kept - press s to save", set.set_number),
                Err(e) => format!("Could not store set: {}", e),
            },
            Err(msg) => msg,
        });
    }

    fn selected_exercise_ids(&self) -> Option<(u32, String)> {
        let workout = self.workout.as_ref()?;
        let ex = workout.exercises.get(self.selected_exercise)?;
        Some((workout.id, ex.id.clone()))
    }

    async fn handle_workout_key(&mut self, key: KeyEvent) {
        let count = self.workout.as_ref().map(|w| w.exercises.len()).unwrap_or(0);
        match key.code {
            KeyCode::Up => self.selected_exercise = self.selected_exercise.saturating_sub(1),
            KeyCode::Down if count > 0 => {
                self.selected_exercise = (self.selected_exercise + 1).min(count - 1)
            }
            KeyCode::Char('e') => {
                if self.session.is_some() {
                    self.input = Some(String::new());
                } else {
                    self.status = Some("Log in to record sets".to_string());
                }
            }
            KeyCode::Char('s') => self.save_pending().await,
            KeyCode::Char('d') => {
                if let Some((day, exercise_id)) = self.selected_exercise_ids() {
                    self.status = Some(
                        match self.local.discard_pending(day, self.week, Some(&exercise_id)) {
                            Ok(n) => format!("Discarded {} unsaved set(s)", n),
                            Err(e) => e.to_string(),
                        },
                    );
                }
            }
            KeyCode::Char('f') => self.finish_workout().await,
            KeyCode::Esc | KeyCode::Char('q') => {
                self.screen = Screen::Dashboard;
                self.log = None;
            }
            _ => {}
        }
    }

    fn handle_meal_plan_key(&mut self, key: KeyEvent) {
        if let Some((alternatives, cursor)) = self.swap.as_mut() {
            match key.code {
                KeyCode::Up => *cursor = cursor.saturating_sub(1),
                KeyCode::Down if !alternatives.is_empty() => {
                    *cursor = (*cursor + 1).min(alternatives.len() - 1)
                }
                KeyCode::Enter => {
                    let choice = alternatives.get(*cursor).cloned();
                    self.swap = None;
                    if let (Some(meal), Some(plan)) = (choice, self.plan.as_mut()) {
                        let name = meal.name.clone();
                        if plan.swap_meal(self.selected_meal, meal).is_ok() {
                            self.status = Some(format!("Replaced with {}", name));
                        }
                    }
                }
                KeyCode::Esc => self.swap = None,
                _ => {}
            }
            return;
        }

        let count = self.plan.as_ref().map(|p| p.meals.len()).unwrap_or(0);
        match key.code {
            KeyCode::Up => self.selected_meal = self.selected_meal.saturating_sub(1),
            KeyCode::Down if count > 0 => self.selected_meal = (self.selected_meal + 1).min(count - 1),
            KeyCode::Char('x') => {
                if let Some(meal) = self.plan.as_ref().and_then(|p| p.meals.get(self.selected_meal)) {
                    self.swap = Some((alternatives_for(meal), 0));
                }
            }
            KeyCode::Char('l') => {
                if let Some(plan) = &self.plan {
                    self.shopping = Some(ShoppingList::from_plan(plan));
                    self.selected_item = 0;
                    self.screen = Screen::Shopping;
                }
            }
            KeyCode::Char('p') => {
                if let Some(plan) = &self.plan {
                    self.status = Some(match export_meal_plan(plan, Path::new(".")) {
                        Ok(path) => format!("PDF saved to {}", path.display()),
                        Err(e) => format!("Failed to export PDF: {}", e),
                    });
                }
            }
            KeyCode::Esc => self.screen = Screen::Plans,
            _ => {}
        }
    }

    fn handle_shopping_key(&mut self, key: KeyEvent) {
        let Some(list) = self.shopping.as_mut() else {
            return;
        };
        let count = list.items().len();
        match key.code {
            KeyCode::Up => self.selected_item = self.selected_item.saturating_sub(1),
            KeyCode::Down if count > 0 => self.selected_item = (self.selected_item + 1).min(count - 1),
            KeyCode::Char(' ') | KeyCode::Enter => {
                // Selection follows display order, which groups by category
                let index = list
                    .by_category()
                    .into_iter()
                    .flat_map(|(_, items)| items)
                    .nth(self.selected_item)
                    .map(|(index, _)| index);
                if let Some(index) = index {
                    list.toggle(index);
                }
            }
            KeyCode::Esc => self.screen = Screen::MealPlan,
            _ => {}
        }
    }

    // ---- actions ----

    async fn change_week(&mut self, week: u32) {
        self.week = week;
        if let Some(user_id) = self.user_id()
            && let Err(e) = auth::set_current_week(self.backend.as_ref(), &user_id, week).await
        {
            self.status = Some(format!("Could not save week: {}", e));
        }
    }

    async fn open_workout(&mut self) {
        let Some(day) = get_workout_split().get(self.selected_day) else {
            return;
        };
        match adjust_workout(day, self.week) {
            Ok(workout) => self.workout = Some(workout),
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        }
        self.log = None;
        if let Some(user_id) = self.user_id() {
            match WorkoutSession::load(self.backend.clone(), &user_id, day.id, self.week).await {
                Ok(log) => self.log = Some(log),
                Err(e) => self.status = Some(format!("Could not load logged sets: {}", e)),
            }
        }
        self.selected_exercise = 0;
        self.screen = Screen::Workout;
    }

    async fn save_pending(&mut self) {
        let Some(workout) = &self.workout else {
            return;
        };
        let Some(log) = self.log.as_mut() else {
            self.status = Some("Log in to save sets".to_string());
            return;
        };
        let pending = match self.local.pending(workout.id, self.week) {
            Ok(p) => p,
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };
        if pending.is_empty() {
            self.status = Some("Nothing to save".to_string());
            return;
        }

        let mut saved_total = 0;
        let mut records = Vec::new();
        for ex in &workout.exercises {
            let sets: Vec<ExerciseSet> = pending
                .iter()
                .filter(|p| p.exercise_id == ex.id)
                .map(|p| p.set.clone())
                .collect();
            if sets.is_empty() {
                continue;
            }
            match log.save_exercise_batch(&ex.id, &ex.name, sets).await {
                Ok(outcome) => {
                    if let Err(e) =
                        self.local
                            .remove_pending(workout.id, self.week, &ex.id, &outcome.saved)
                    {
                        warn!(error = %e, "Could not clear saved sets");
                    }
                    saved_total += outcome.saved.len();
                    if let Some(pr) = outcome.new_record {
                        records.push(format!("{} {} x {}", ex.name, pr.weight, pr.reps));
                    }
                }
                Err(LogError::PartialBatch {
                    saved,
                    failed_set,
                    source,
                }) => {
                    if let Err(e) = self
                        .local
                        .remove_pending(workout.id, self.week, &ex.id, &saved)
                    {
                        warn!(error = %e, "Could not clear saved sets");
                    }
                    self.status = Some(format!(
                        "{}: set {} failed ({}); {} set(s) saved, the rest kept",
                        ex.name,
                        failed_set,
                        source,
                        saved_total + saved.len()
                    ));
                    return;
                }
                Err(e) => {
                    self.status = Some(format!("Failed to save: {}", e));
                    return;
                }
            }
        }

        self.status = Some(if records.is_empty() {
            format!("Saved {} set(s)", saved_total)
        } else {
            format!("Saved {} set(s) - New PR! {}", saved_total, records.join(", "))
        });
    }

    async fn finish_workout(&mut self) {
        let Some(log) = self.log.as_mut() else {
            self.status = Some("Log in to track workouts".to_string());
            return;
        };
        self.status = Some(match log.complete(None).await {
            Ok(()) => "Workout completed. Great job!".to_string(),
            Err(LogError::NoActiveLog) => "Save at least one set first".to_string(),
            Err(e) => format!("Failed to complete workout: {}", e),
        });
    }

    async fn open_progress(&mut self) {
        let Some(user_id) = self.user_id() else {
            self.status = Some("Log in to see progress".to_string());
            return;
        };
        match volume_by_date(self.backend.as_ref(), &user_id).await {
            Ok(points) => {
                self.trend = VolumeTrend::fit(&points);
                self.volume = points;
                self.screen = Screen::Progress;
            }
            Err(e) => self.status = Some(format!("Could not load progress: {}", e)),
        }
    }

    fn open_plan(&mut self) {
        let Some(summary) = CALORIE_PLANS.get(self.selected_plan) else {
            return;
        };
        match get_meal_plan(summary.calories) {
            Ok(plan) => {
                self.plan = Some(plan);
                self.selected_meal = 0;
                self.swap = None;
                self.screen = Screen::MealPlan;
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }
}

fn meal_detail(meal: &Meal) -> Paragraph<'static> {
    let mut lines = vec![Line::from(meal.name.clone().bold())];
    if let Some(prep) = &meal.prep_time {
        lines.push(Line::from(format!("Prep: {}", prep).fg(Color::Gray)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Ingredients".bold()));
    for ing in &meal.ingredients {
        lines.push(Line::from(format!("• {} ({})", ing.name, ing.amount)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Instructions".bold()));
    for (i, step) in meal.instructions.iter().enumerate() {
        lines.push(Line::from(format!("{}. {}", i + 1, step)));
    }
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(meal.meal_type.label()))
}

fn fiber_color(status: FiberStatus) -> Color {
    match status {
        FiberStatus::Poor | FiberStatus::Excessive => Color::Red,
        FiberStatus::Moderate => Color::Yellow,
        FiberStatus::Good => Color::Green,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn poll_key() -> Result<Option<KeyEvent>> {
    if event::poll(std::time::Duration::from_millis(100))?
        && let Event::Key(key) = event::read()?
        && key.kind == KeyEventKind::Press
    {
        return Ok(Some(key));
    }
    Ok(None)
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_entry() {
        let set = parse_set_entry("2 135 8 7").unwrap();
        assert_eq!(set.set_number, 2);
        assert_eq!(set.weight, 135.0);
        assert_eq!(set.reps, 8);
        assert_eq!(set.rpe, Some(7));

        let no_rpe = parse_set_entry(" 1 22.5 10 ").unwrap();
        assert_eq!(no_rpe.rpe, None);
        assert_eq!(no_rpe.weight, 22.5);
    }

    #[test]
    fn test_parse_set_entry_rejects_bad_input() {
        assert!(parse_set_entry("1 100").is_err());
        assert!(parse_set_entry("x 100 5").is_err());
        assert!(parse_set_entry("1 100 0").is_err(), "Zero reps is not a set");
        assert!(parse_set_entry("1 100 5 11").is_err(), "RPE above 10");
        assert!(parse_set_entry("0 100 5").is_err());
    }

    #[test]
    fn test_centered_rect_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 50, area);
        assert!(popup.x >= 20 && popup.right() <= 80);
        assert!(popup.y >= 10 && popup.bottom() <= 30);
    }
}
