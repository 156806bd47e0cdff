//! PDF export of a meal plan (printpdf)
//!
//! Layout runs first and produces a list of draw operations per page in
//! top-down millimetres; rendering then maps them onto printpdf, whose
//! y axis starts at the bottom of the page.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::path::PaintMode;
use printpdf::*;
use thiserror::Error;
use tracing::{info, warn};

use super::MealPlan;

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 15.0;
const HEADER_HEIGHT: f32 = 40.0;
const IMAGE_WIDTH: f32 = 60.0;
const IMAGE_HEIGHT: f32 = 40.0;
const IMAGE_DPI: f32 = 300.0;
const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width in em
const AVG_CHAR_EM: f32 = 0.5;

pub type Rgb8 = [u8; 3];

pub const BACKGROUND: Rgb8 = [17, 24, 39];
pub const SURFACE: Rgb8 = [31, 41, 55];
pub const PRIMARY: Rgb8 = [59, 130, 246];
pub const TEXT: Rgb8 = [243, 244, 246];
pub const TEXT_MUTED: Rgb8 = [156, 163, 175];
pub const ACCENT: Rgb8 = [16, 185, 129];
pub const BORDER: Rgb8 = [55, 65, 81];
const WHITE: Rgb8 = [255, 255, 255];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// One primitive at top-down page coordinates; text `y` is the baseline
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb8,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        color: Rgb8,
        weight: FontWeight,
        align: Align,
    },
    Image {
        path: PathBuf,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
}

/// Estimated width in mm of `text` at `size` points
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_CHAR_EM * PT_TO_MM
}

/// Greedy word wrap to `max_width` mm; an over-long word gets its own line
pub fn wrap_text(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, size) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct LayoutBuilder {
    pages: Vec<Vec<DrawOp>>,
    y: f32,
}

impl LayoutBuilder {
    fn new() -> Self {
        let mut builder = Self {
            pages: Vec::new(),
            y: MARGIN,
        };
        builder.add_page();
        builder
    }

    fn add_page(&mut self) {
        self.pages.push(vec![DrawOp::FillRect {
            x: 0.0,
            y: 0.0,
            w: PAGE_WIDTH,
            h: PAGE_HEIGHT,
            color: BACKGROUND,
        }]);
        self.y = MARGIN;
    }

    /// Start a new page when `required` mm would cross the bottom margin
    fn check_new_page(&mut self, required: f32) -> bool {
        if self.y + required > PAGE_HEIGHT - MARGIN {
            self.add_page();
            return true;
        }
        false
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.push(op);
        }
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb8) {
        self.push(DrawOp::FillRect { x, y, w, h, color });
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        text: impl Into<String>,
        x: f32,
        y: f32,
        size: f32,
        color: Rgb8,
        weight: FontWeight,
        align: Align,
    ) {
        self.push(DrawOp::Text {
            text: text.into(),
            x,
            y,
            size,
            color,
            weight,
            align,
        });
    }
}

/// Lay out the whole document; `date` is printed in the header
pub fn layout_meal_plan(plan: &MealPlan, date: &str) -> Vec<Vec<DrawOp>> {
    use Align::*;
    use FontWeight::*;

    let mut b = LayoutBuilder::new();

    // Header
    b.rect(0.0, 0.0, PAGE_WIDTH, HEADER_HEIGHT, SURFACE);
    b.text("HYBRID ATHLETE", MARGIN, 20.0, 22.0, PRIMARY, Bold, Left);
    b.text("BLUEPRINT", MARGIN + 65.0, 20.0, 22.0, WHITE, Bold, Left);
    b.text("NUTRITION PLAN", MARGIN, 27.0, 10.0, TEXT_MUTED, Regular, Left);
    b.text(date, PAGE_WIDTH - MARGIN, 20.0, 10.0, TEXT_MUTED, Regular, Right);

    // Title and description
    b.y = 55.0;
    let target = plan.calorie_target.to_string();
    b.text(&target, MARGIN, b.y, 28.0, PRIMARY, Bold, Left);
    let kcal_x = MARGIN + text_width(&target, 28.0) + 2.0;
    b.text(" KCAL PLAN", kcal_x, b.y, 18.0, TEXT, Bold, Left);

    b.y += 10.0;
    for line in wrap_text(&plan.description, PAGE_WIDTH - 2.0 * MARGIN, 11.0) {
        b.text(line, MARGIN, b.y, 11.0, TEXT_MUTED, Regular, Left);
        b.y += 5.0;
    }
    b.y += 10.0;

    // Daily totals box
    let totals = plan.totals();
    let box_w = PAGE_WIDTH - 2.0 * MARGIN;
    b.rect(MARGIN - 0.3, b.y - 0.3, box_w + 0.6, 25.6, BORDER);
    b.rect(MARGIN, b.y, box_w, 25.0, SURFACE);
    let start_x = MARGIN + 10.0;
    let center_y = b.y + 14.0;
    let col_gap = 35.0;
    let columns = [
        (totals.calories.to_string(), "CALORIES", PRIMARY, 16.0),
        (format!("{}g", totals.protein), "PROTEIN", TEXT, 14.0),
        (format!("{}g", totals.carbs), "CARBS", TEXT, 14.0),
        (format!("{}g", totals.fats), "FATS", TEXT, 14.0),
        (format!("{}g", totals.fiber), "FIBER", ACCENT, 14.0),
    ];
    for (i, (value, label, color, size)) in columns.into_iter().enumerate() {
        let x = start_x + col_gap * i as f32;
        b.text(value, x, center_y - 2.0, size, color, Bold, Left);
        b.text(label, x, center_y + 5.0, 8.0, TEXT_MUTED, Bold, Left);
    }
    b.y += 40.0;

    // Meals
    for meal in &plan.meals {
        b.check_new_page(120.0);
        let top = b.y;

        b.push(DrawOp::Image {
            path: PathBuf::from(&meal.image),
            x: PAGE_WIDTH - MARGIN - IMAGE_WIDTH,
            y: top,
            w: IMAGE_WIDTH,
            h: IMAGE_HEIGHT,
        });

        b.rect(MARGIN, top, 4.0, 18.0, PRIMARY);
        b.text(
            meal.meal_type.label().to_uppercase(),
            MARGIN + 8.0,
            top + 4.0,
            9.0,
            PRIMARY,
            Bold,
            Left,
        );

        let title_width = PAGE_WIDTH - MARGIN * 2.0 - 70.0;
        let title = wrap_text(&meal.name, title_width, 16.0);
        for (i, line) in title.iter().enumerate() {
            b.text(line.as_str(), MARGIN + 8.0, top + 12.0 + i as f32 * 7.0, 16.0, TEXT, Bold, Left);
        }
        let mut content_y = top + 12.0 + title.len() as f32 * 7.0;

        let macros = format!(
            "{} kcal  |  {}g P  |  {}g C  |  {}g F  |  ",
            meal.calories, meal.protein, meal.carbs, meal.fats
        );
        let fiber_x = MARGIN + 8.0 + text_width(&macros, 10.0);
        b.text(macros, MARGIN + 8.0, content_y, 10.0, TEXT_MUTED, Regular, Left);
        b.text(
            format!("{}g Fiber", meal.fiber),
            fiber_x,
            content_y,
            10.0,
            ACCENT,
            Regular,
            Left,
        );
        content_y += 8.0;

        if let Some(prep) = &meal.prep_time {
            b.text(
                format!("Duration: {}", prep),
                MARGIN + 8.0,
                content_y,
                9.0,
                TEXT_MUTED,
                Regular,
                Left,
            );
            content_y += 8.0;
        }

        // Clear the image before the lists start
        b.y = (content_y + 5.0).max(top + IMAGE_HEIGHT + 5.0);

        b.check_new_page(20.0);
        b.text("Ingredients", MARGIN + 8.0, b.y + 6.0, 11.0, TEXT, Bold, Left);
        b.y += 12.0;
        for ing in &meal.ingredients {
            b.check_new_page(7.0);
            b.rect(MARGIN + 9.0, b.y - 2.0, 2.0, 2.0, PRIMARY);
            b.text(ing.name.as_str(), MARGIN + 15.0, b.y, 10.0, TEXT_MUTED, Regular, Left);
            b.text(
                ing.amount.as_str(),
                PAGE_WIDTH - MARGIN - 20.0,
                b.y,
                10.0,
                TEXT,
                Regular,
                Right,
            );
            b.y += 7.0;
        }
        b.y += 6.0;

        b.check_new_page(20.0);
        b.text("Instructions", MARGIN + 8.0, b.y + 6.0, 11.0, TEXT, Bold, Left);
        b.y += 12.0;
        for (i, step) in meal.instructions.iter().enumerate() {
            b.check_new_page(12.0);
            b.text((i + 1).to_string(), MARGIN + 10.0, b.y, 10.0, PRIMARY, Bold, Left);
            for line in wrap_text(step, PAGE_WIDTH - MARGIN * 2.0 - 25.0, 10.0) {
                b.check_new_page(6.0);
                b.text(line, MARGIN + 18.0, b.y, 10.0, TEXT_MUTED, Regular, Left);
                b.y += 6.0;
            }
            b.y += 2.0;
        }

        b.y += 20.0;
    }

    // Footer on every page once the count is known
    let total = b.pages.len();
    for (i, page) in b.pages.iter_mut().enumerate() {
        page.push(DrawOp::Text {
            text: footer_text(plan.calorie_target, i + 1, total),
            x: PAGE_WIDTH / 2.0,
            y: PAGE_HEIGHT - 10.0,
            size: 8.0,
            color: TEXT_MUTED,
            weight: FontWeight::Regular,
            align: Align::Center,
        });
    }

    b.pages
}

pub fn footer_text(calorie_target: u32, page: usize, total: usize) -> String {
    format!(
        "Hybrid Athlete Blueprint - {} kcal Plan - Page {} of {}",
        calorie_target, page, total
    )
}

fn fill(layer: &PdfLayerReference, color: Rgb8) {
    layer.set_fill_color(Color::Rgb(Rgb::new(
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
        None,
    )));
}

fn draw_image(layer: &PdfLayerReference, path: &Path, x: f32, y: f32, w: f32, h: f32) {
    let img = match printpdf::image_crate::open(path) {
        Ok(img) => img,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Meal image unavailable, skipping");
            return;
        }
    };
    let natural_w = img.width() as f32 / IMAGE_DPI * 25.4;
    let natural_h = img.height() as f32 / IMAGE_DPI * 25.4;
    if natural_w <= 0.0 || natural_h <= 0.0 {
        return;
    }
    Image::from_dynamic_image(&img).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(PAGE_HEIGHT - y - h)),
            scale_x: Some(w / natural_w),
            scale_y: Some(h / natural_h),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

/// Write laid-out pages to `path`
pub fn render(pages: &[Vec<DrawOp>], title: &str, path: &Path) -> Result<(), ExportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(format!("{:?}", e)))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(format!("{:?}", e)))?;

    for (index, ops) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };

        for op in ops {
            match op {
                DrawOp::FillRect { x, y, w, h, color } => {
                    fill(&layer, *color);
                    layer.add_rect(
                        Rect::new(
                            Mm(*x),
                            Mm(PAGE_HEIGHT - y - h),
                            Mm(x + w),
                            Mm(PAGE_HEIGHT - y),
                        )
                        .with_mode(PaintMode::Fill),
                    );
                }
                DrawOp::Text {
                    text,
                    x,
                    y,
                    size,
                    color,
                    weight,
                    align,
                } => {
                    let font = match weight {
                        FontWeight::Regular => &regular,
                        FontWeight::Bold => &bold,
                    };
                    let width = text_width(text, *size);
                    let left = match align {
                        Align::Left => *x,
                        Align::Right => x - width,
                        Align::Center => x - width / 2.0,
                    };
                    fill(&layer, *color);
                    layer.use_text(text.as_str(), *size, Mm(left), Mm(PAGE_HEIGHT - y), font);
                }
                DrawOp::Image { path, x, y, w, h } => draw_image(&layer, path, *x, *y, *w, *h),
            }
        }
    }

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| ExportError::Pdf(format!("{:?}", e)))?;
    Ok(())
}

/// Export the plan into `out_dir`, returning the written file's path
pub fn export_meal_plan(plan: &MealPlan, out_dir: &Path) -> Result<PathBuf, ExportError> {
    let date = chrono::Local::now().format("%m/%d/%Y").to_string();
    let pages = layout_meal_plan(plan, &date);
    let path = out_dir.join(plan.pdf_filename());
    render(
        &pages,
        &format!("Hybrid Athlete {} kcal Meal Plan", plan.calorie_target),
        &path,
    )?;
    info!(path = %path.display(), pages = pages.len(), "Exported meal plan");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::get_meal_plan;

    fn texts(page: &[DrawOp]) -> Vec<&str> {
        page.iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("Grilled Chicken Quinoa Bowl with Extra Roasted Vegetables", 60.0, 16.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width(l, 16.0) <= 60.0 || !l.contains(' ')));
        assert_eq!(lines.join(" "), "Grilled Chicken Quinoa Bowl with Extra Roasted Vegetables");
        assert!(wrap_text("", 50.0, 10.0).is_empty());
    }

    #[test]
    fn test_layout_paginates_with_footers() {
        let plan = get_meal_plan(3500).unwrap();
        let pages = layout_meal_plan(&plan, "01/01/2026");
        assert!(pages.len() > 1, "Five meals should not fit on one page");

        let total = pages.len();
        for (i, page) in pages.iter().enumerate() {
            assert!(matches!(page[0], DrawOp::FillRect { color: BACKGROUND, .. }));
            let footer = footer_text(3500, i + 1, total);
            assert!(texts(page).contains(&footer.as_str()), "Page {} missing footer", i + 1);
        }
    }

    #[test]
    fn test_content_stays_above_bottom_margin() {
        let plan = get_meal_plan(3000).unwrap();
        for page in layout_meal_plan(&plan, "01/01/2026") {
            for op in &page {
                if let DrawOp::Text { text, y, .. } = op
                    && !text.starts_with("Hybrid Athlete Blueprint")
                {
                    assert!(*y <= PAGE_HEIGHT - MARGIN, "'{}' at {} crosses the margin", text, y);
                }
            }
        }
    }

    #[test]
    fn test_first_page_header_and_totals() {
        let plan = get_meal_plan(2000).unwrap();
        let pages = layout_meal_plan(&plan, "03/15/2026");
        let first = texts(&pages[0]);
        assert!(first.contains(&"HYBRID ATHLETE"));
        assert!(first.contains(&"NUTRITION PLAN"));
        assert!(first.contains(&"03/15/2026"));
        assert!(first.contains(&"2000"));
        assert!(first.contains(&"BREAKFAST"));
        assert!(first.contains(&"29g"), "Fiber total should be shown");
    }

    #[test]
    fn test_export_writes_pdf_without_images() {
        let dir = tempfile::tempdir().unwrap();
        let plan = get_meal_plan(2500).unwrap();

        let path = export_meal_plan(&plan, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "Hybrid_Athlete_2500kcal_MealPlan.pdf");

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
