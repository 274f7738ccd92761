// Bar charts of the answers.
//
// Charts are planned first (pure data, testable), then drawn with plotters.

use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use survey_stats::classifier::select_columns;

use crate::survey::io_common::cut_label;
use crate::survey::*;

const LIKERT_MAX_CHARTS: usize = 10;
const TITLE_MAX_CHARS: usize = 80;
const CHOICE_LABEL_MAX_CHARS: usize = 60;

// plotters resolves every text of the charts (titles, axes, annotations) by family.
const FONT_FAMILY: &str = "sans-serif";
static FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ChartShape {
    /// Ordinal answers, in the order of their scale.
    Vertical,
    /// Multiple choice answers, most frequent on top.
    Horizontal,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Bar {
    pub label: String,
    pub count: u64,
    /// Percentage of the answered rows.
    pub percent: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ChartPlan {
    pub title: String,
    pub subtitle: String,
    /// The file name of the image, without extension.
    pub output: String,
    pub shape: ChartShape,
    pub bars: Vec<Bar>,
    /// Number of rows with an answer.
    pub n: u64,
}

struct ChoiceChart {
    output: &'static str,
    title: &'static str,
    any_of: &'static [&'static str],
    all_of: &'static [&'static str],
    top_n: usize,
}

const CHOICE_CHARTS: [ChoiceChart; 5] = [
    ChoiceChart {
        output: "ai_tools_used",
        title: "AI Chat Assistants Used",
        any_of: &["which ai", "what ai"],
        all_of: &[],
        top_n: 10,
    },
    ChoiceChart {
        output: "scrum_roles",
        title: "Scrum Roles",
        any_of: &[],
        all_of: &["role", "scrum"],
        top_n: 8,
    },
    ChoiceChart {
        output: "experience_years",
        title: "Years of Experience",
        any_of: &[],
        all_of: &["experience", "year"],
        top_n: 8,
    },
    ChoiceChart {
        output: "benefits_experienced",
        title: "Benefits Experienced with AI Chat Assistants",
        any_of: &[],
        all_of: &["benefits", "experienced"],
        top_n: 12,
    },
    ChoiceChart {
        output: "problems_frustrations",
        title: "Problems and Frustrations Encountered",
        any_of: &["problem", "frustration"],
        all_of: &[],
        top_n: 12,
    },
];

pub fn likert_filter() -> ColumnFilter {
    ColumnFilter::any(&["how often", "to what extent", "do you agree", "helpful"])
}

/// The title of a chart: the question up to its first question mark.
fn chart_title(question: &str) -> String {
    let first = question.split('?').next().unwrap_or(question);
    first.chars().take(TITLE_MAX_CHARS).collect()
}

fn to_bars(rows: &[FrequencyRow], max_label: Option<usize>) -> Vec<Bar> {
    rows.iter()
        .map(|r| {
            let label = r.label.to_string();
            Bar {
                label: match max_label {
                    Some(n) => cut_label(&label, n),
                    None => label,
                },
                count: r.count,
                percent: r.percent,
            }
        })
        .collect()
}

/// A vertical chart of an ordinal question. The percentages add up to 100%.
pub fn likert_plan(
    table: &ResponseTable,
    question: &str,
    output: &str,
) -> SurveyResult<Option<ChartPlan>> {
    let freqs = summarize(table, question, DenominatorMode::ValidOnly, None).context(StatsSnafu {})?;
    if freqs.denominator == 0 {
        warn!("No answer to {:?}, skipping chart {}", question, output);
        return Ok(None);
    }
    let labels: Vec<String> = freqs.value_rows().map(|r| r.label.to_string()).collect();
    let freqs = match Scale::detect(&labels) {
        Some(scale) => {
            debug!("likert_plan: {:?}: scale {:?}", output, scale);
            freqs.ordered_by_scale(scale)
        }
        None => freqs,
    };
    let bars = to_bars(&freqs.rows, None);
    let total: f64 = bars.iter().map(|b| b.percent).sum();
    Ok(Some(ChartPlan {
        title: chart_title(question),
        subtitle: format!("(n={}, total={:.1}%)", freqs.denominator, total),
        output: output.to_string(),
        shape: ChartShape::Vertical,
        bars,
        n: freqs.denominator,
    }))
}

/// A horizontal chart with the most frequent answers. The coverage is the share of
/// the answers shown, which is below 100% when some answers are left out.
pub fn multiple_choice_plan(
    table: &ResponseTable,
    question: &str,
    title: &str,
    output: &str,
    top_n: usize,
) -> SurveyResult<Option<ChartPlan>> {
    let freqs = summarize(table, question, DenominatorMode::ValidOnly, None).context(StatsSnafu {})?;
    if freqs.denominator == 0 {
        warn!("No answer to {:?}, skipping chart {}", question, output);
        return Ok(None);
    }
    let shown = freqs.rows.len().min(top_n);
    let bars = to_bars(&freqs.rows[..shown], Some(CHOICE_LABEL_MAX_CHARS));
    let coverage: f64 = bars.iter().map(|b| b.percent).sum();
    Ok(Some(ChartPlan {
        title: title.to_string(),
        subtitle: format!(
            "(n={}, showing top {}, coverage={:.1}%)",
            freqs.denominator,
            bars.len(),
            coverage
        ),
        output: output.to_string(),
        shape: ChartShape::Horizontal,
        bars,
        n: freqs.denominator,
    }))
}

/// The number of responses from each source, in order of appearance.
pub fn source_distribution_plan(table: &ResponseTable) -> SurveyResult<Option<ChartPlan>> {
    if !table.has_column(SOURCE_COLUMN) || table.num_rows() == 0 {
        return Ok(None);
    }
    let total = table.num_rows() as u64;
    let bars: Vec<Bar> = first_seen_counts(table, SOURCE_COLUMN)
        .context(StatsSnafu {})?
        .into_iter()
        .map(|(label, count)| Bar {
            label,
            count,
            percent: count as f64 * 100.0 / total as f64,
        })
        .collect();
    if bars.is_empty() {
        return Ok(None);
    }
    Ok(Some(ChartPlan {
        title: "Distribution of Survey Responses by Source".to_string(),
        subtitle: format!("(n={})", total),
        output: "response_distribution".to_string(),
        shape: ChartShape::Vertical,
        bars,
        n: total,
    }))
}

/// All the charts, in drawing order.
///
/// Arguments:
/// * `top_n` if provided, replaces the number of answers shown in the multiple
/// choice charts.
pub fn plan_all_charts(
    table: &ResponseTable,
    rules: &BucketRules,
    top_n: Option<usize>,
) -> SurveyResult<Vec<ChartPlan>> {
    let mut plans: Vec<ChartPlan> = Vec::new();
    plans.extend(source_distribution_plan(table)?);

    let likert = select_columns(table, rules, &likert_filter());
    info!("Found {} Likert-scale questions", likert.len());
    for (i, col) in likert.iter().take(LIKERT_MAX_CHARTS).enumerate() {
        plans.extend(likert_plan(table, col, &format!("likert_{}", i + 1))?);
    }

    for spec in CHOICE_CHARTS.iter() {
        let filter = ColumnFilter::any(spec.any_of).and_all(spec.all_of);
        // Only the first matching question is drawn.
        if let Some(col) = select_columns(table, rules, &filter).first() {
            plans.extend(multiple_choice_plan(
                table,
                col,
                spec.title,
                spec.output,
                top_n.unwrap_or(spec.top_n),
            )?);
        } else {
            debug!("plan_all_charts: no question for {}", spec.output);
        }
    }
    Ok(plans)
}

/// Makes the embedded font available to plotters. Registering it again is harmless.
fn register_chart_font() -> SurveyResult<()> {
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA)
        .ok()
        .context(DrawingChartSnafu {
            path: "assets/DejaVuSans.ttf",
            message: "cannot load the embedded font",
        })
}

fn bar_annotation(bar: &Bar) -> String {
    format!("{} ({:.1}%)", bar.count, bar.percent)
}

fn axis_max(bars: &[Bar]) -> u64 {
    let max = bars.iter().map(|b| b.count).max().unwrap_or(0);
    max + max / 4 + 1
}

fn draw_vertical(plan: &ChartPlan, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&plan.title, (FONT_FAMILY, 26))?;
    let root = root.titled(&plan.subtitle, (FONT_FAMILY, 18))?;

    let n = plan.bars.len() as i32;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(60)
        .build_cartesian_2d((0..n).into_segmented(), 0u64..axis_max(&plan.bars))?;

    let x_labels = |v: &SegmentValue<i32>| -> String {
        match v {
            SegmentValue::CenterOf(i) => plan
                .bars
                .get(*i as usize)
                .map(|b| b.label.clone())
                .unwrap_or_default(),
            _ => String::new(),
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(plan.bars.len())
        .x_label_formatter(&x_labels)
        .y_desc("Frequency")
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(GREEN.mix(0.7).filled())
            .margin(10)
            .data(plan.bars.iter().enumerate().map(|(i, b)| (i as i32, b.count))),
    )?;

    let style = TextStyle::from((FONT_FAMILY, 14).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(plan.bars.iter().enumerate().map(|(i, b)| {
        Text::new(
            bar_annotation(b),
            (SegmentValue::CenterOf(i as i32), b.count),
            style.clone(),
        )
    }))?;
    root.present()?;
    Ok(())
}

fn draw_horizontal(plan: &ChartPlan, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (1400, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&plan.title, (FONT_FAMILY, 26))?;
    let root = root.titled(&plan.subtitle, (FONT_FAMILY, 18))?;

    let n = plan.bars.len() as i32;
    // The most frequent answer is drawn on top.
    let position = |i: usize| n - 1 - i as i32;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(420)
        .build_cartesian_2d(0u64..axis_max(&plan.bars), (0..n).into_segmented())?;

    let y_labels = |v: &SegmentValue<i32>| -> String {
        match v {
            SegmentValue::CenterOf(p) => plan
                .bars
                .get((n - 1 - *p) as usize)
                .map(|b| b.label.clone())
                .unwrap_or_default(),
            _ => String::new(),
        }
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(plan.bars.len())
        .y_label_formatter(&y_labels)
        .x_desc("Frequency")
        .draw()?;

    chart.draw_series(
        Histogram::horizontal(&chart)
            .style(MAGENTA.mix(0.6).filled())
            .margin(6)
            .data(plan.bars.iter().enumerate().map(|(i, b)| (position(i), b.count))),
    )?;

    let style = TextStyle::from((FONT_FAMILY, 14).into_font()).pos(Pos::new(HPos::Left, VPos::Center));
    chart.draw_series(plan.bars.iter().enumerate().map(|(i, b)| {
        Text::new(
            format!("  {}", bar_annotation(b)),
            (b.count, SegmentValue::CenterOf(position(i))),
            style.clone(),
        )
    }))?;
    root.present()?;
    Ok(())
}

/// Draws a chart as a PNG image in the given directory and returns its path.
pub fn render_chart(plan: &ChartPlan, dir: &Path) -> SurveyResult<PathBuf> {
    fs::create_dir_all(dir).context(WritingFileSnafu {
        path: dir.display().to_string(),
    })?;
    register_chart_font()?;
    let path = dir.join(format!("{}.png", plan.output));
    // The image format is chosen from the extension.
    let partial = dir.join(format!("{}.partial.png", plan.output));
    debug!(
        "render_chart: {:?}: {} bars, n={}",
        path,
        plan.bars.len(),
        plan.n
    );
    let res = match plan.shape {
        ChartShape::Vertical => draw_vertical(plan, &partial),
        ChartShape::Horizontal => draw_horizontal(plan, &partial),
    };
    if let Err(e) = res {
        let _ = fs::remove_file(&partial);
        return DrawingChartSnafu {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .fail();
    }
    io_common::commit_partial(&partial, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::tests::*;

    fn bar_counts(plan: &ChartPlan) -> Vec<(String, u64)> {
        plan.bars.iter().map(|b| (b.label.clone(), b.count)).collect()
    }

    #[test]
    fn plans_for_sample() {
        init();
        let table = sample_merged();
        let plans = plan_all_charts(&table, &BucketRules::default(), None).unwrap();
        let names: Vec<&str> = plans.iter().map(|p| p.output.as_str()).collect();
        assert_eq!(
            names,
            vec!["response_distribution", "likert_1", "ai_tools_used", "scrum_roles"]
        );

        let sources = &plans[0];
        assert_eq!(
            bar_counts(sources),
            vec![
                ("Survey 1 (respostas)".to_string(), 2),
                ("Survey 2 (Udemy)".to_string(), 2)
            ]
        );

        // Scale order, over the 3 answers.
        let likert = &plans[1];
        assert_eq!(likert.shape, ChartShape::Vertical);
        assert_eq!(
            bar_counts(likert),
            vec![
                ("Slightly helpful".to_string(), 1),
                ("Very helpful".to_string(), 2)
            ]
        );
        assert_eq!(likert.subtitle, "(n=3, total=100.0%)");
        assert_eq!(
            likert.title,
            "How helpful are AI chat assistants for the Scrum accountabilities"
        );

        let tools = &plans[2];
        assert_eq!(tools.shape, ChartShape::Horizontal);
        assert_eq!(tools.n, 3);
        assert_eq!(tools.subtitle, "(n=3, showing top 2, coverage=100.0%)");
    }

    #[test]
    fn top_n_reduces_coverage() {
        init();
        let table = sample_merged();
        let plans = plan_all_charts(&table, &BucketRules::default(), Some(1)).unwrap();
        let tools = plans.iter().find(|p| p.output == "ai_tools_used").unwrap();
        assert_eq!(bar_counts(tools), vec![("ChatGPT".to_string(), 2)]);
        assert_eq!(tools.subtitle, "(n=3, showing top 1, coverage=66.7%)");
    }

    #[test]
    fn unanswered_questions_are_skipped() {
        init();
        let table = sample_export(&[[Some("2024-01-01"), None, None, None, None]]);
        let plans = plan_all_charts(&table, &BucketRules::default(), None).unwrap();
        assert!(plans.is_empty());
    }

    #[test]
    fn long_labels_are_cut() {
        let q = "Which AI chat assistants do you use?";
        let long = "x".repeat(70);
        let table = sample_export(&[[None, None, Some(long.as_str()), None, None]]);
        let plan = multiple_choice_plan(&table, q, "Tools", "tools", 10)
            .unwrap()
            .unwrap();
        assert_eq!(plan.bars[0].label, format!("{}...", "x".repeat(60)));
    }

    #[test]
    fn annotated_bar_is_drawn() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let plan = ChartPlan {
            title: "How often do you use AI chat assistants".to_string(),
            subtitle: "(n=3, total=100.0%)".to_string(),
            output: "likert_1".to_string(),
            shape: ChartShape::Vertical,
            bars: vec![Bar {
                label: "Often".to_string(),
                count: 3,
                percent: 100.0,
            }],
            n: 3,
        };
        let p = render_chart(&plan, dir.path()).unwrap();
        assert!(fs::metadata(&p).unwrap().len() > 0);
        let horizontal = ChartPlan {
            output: "ai_tools_used".to_string(),
            shape: ChartShape::Horizontal,
            ..plan
        };
        assert!(render_chart(&horizontal, dir.path()).unwrap().is_file());
    }

    #[test]
    fn charts_are_written() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let plots = dir.path().join("plots");
        let table = sample_merged();
        for plan in plan_all_charts(&table, &BucketRules::default(), None).unwrap() {
            let p = render_chart(&plan, &plots).unwrap();
            assert!(p.is_file());
            assert_eq!(p, plots.join(format!("{}.png", plan.output)));
        }
        let leftovers = fs::read_dir(&plots)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .map(|e| e.file_name().to_string_lossy().contains(".partial"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(leftovers, 0);
    }
}
