//! Report chapters
//!
//! Each chapter turns the cohort run into an ordered list of blocks (headings,
//! text tables and figures) for the document-assembly collaborator. Charts are
//! submitted to a `RenderSink`; a chart without data is left out together with
//! its figure block.

use crate::config::{PlotType, ReportConfig};
use crate::error::MetricsError;
use crate::pipeline::CohortRun;
use crate::render::{render_if_data, ChartKind, ChartRequest, RenderSink};
use crate::tables::{
    dwell_revisit_table, fixation_sample_table, fixation_summary_table, revisits_by_participant,
    transition_count_table, transition_share_table, DataTable, TableRow, TextTable,
};
use crate::types::{ParticipantMetrics, TransitionMatrix};
use serde::Serialize;
use std::path::PathBuf;

/// Paragraph style of chapter titles
pub const CHAPTER_STYLE: &str = "Heading 2";

/// Paragraph style of the discussion heading closing every chapter
pub const DISCUSSION_STYLE: &str = "Heading 3";

/// Width of embedded figures in centimetres
pub const FIGURE_WIDTH_CM: f64 = 12.0;

pub const BAR_PLOT_CAPTION: &str =
    "Bar plot showing the mean of the fixation duration and the 95% confidence interval.";
pub const BOX_PLOT_CAPTION: &str = "Box plot showing the mean, the 25% and 75% quartiles, and the distribution of the fixation duration.";
pub const TRANSITIONS_CAPTION: &str = "Amount of transitions from an area of interest to another.";
pub const TASK_BAR_PLOT_CAPTION: &str =
    "Bar plot showing the mean of the task completion times and the 95% confidence interval.";
pub const TASK_BOX_PLOT_CAPTION: &str = "Box plot showing the mean, the 25% and 75% quartiles, and the distribution of the task completion times.";

const FIXATION_X_LABEL: &str = "Area of interest";
const FIXATION_Y_LABEL: &str = "Fixation duration [s]";
const TRANSITION_X_LABEL: &str = "AOI destination (to)";
const TRANSITION_Y_LABEL: &str = "AOI source (from)";
const TASK_X_LABEL: &str = "Critical task";
const TASK_Y_LABEL: &str = "Completion time [s]";

/// One element of a chapter, in document order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportBlock {
    Heading {
        text: String,
        style: String,
    },
    Table(TextTable),
    Figure {
        path: PathBuf,
        caption: String,
        width_cm: f64,
    },
}

impl ReportBlock {
    fn heading(text: &str, style: &str) -> Self {
        ReportBlock::Heading {
            text: text.to_string(),
            style: style.to_string(),
        }
    }

    fn figure(path: PathBuf, caption: &str) -> Self {
        ReportBlock::Figure {
            path,
            caption: caption.to_string(),
            width_cm: FIGURE_WIDTH_CM,
        }
    }
}

/// A rendered chapter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterOutput {
    pub title: String,
    pub blocks: Vec<ReportBlock>,
}

impl ChapterOutput {
    fn open(title: &str) -> Self {
        Self {
            title: title.to_string(),
            blocks: vec![ReportBlock::heading(title, CHAPTER_STYLE)],
        }
    }

    fn close(mut self) -> Self {
        self.blocks
            .push(ReportBlock::heading("Discussion", DISCUSSION_STYLE));
        self
    }

    /// Paths of the figures embedded in the chapter
    pub fn figures(&self) -> Vec<&PathBuf> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                ReportBlock::Figure { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn tables(&self) -> Vec<&TextTable> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                ReportBlock::Table(table) => Some(table),
                _ => None,
            })
            .collect()
    }
}

/// Run every enabled chapter in report order
pub fn assemble_chapters(
    run: &CohortRun,
    config: &ReportConfig,
    sink: &mut dyn RenderSink,
) -> Result<Vec<ChapterOutput>, MetricsError> {
    let mut chapters = Vec::new();
    if config.time_on_task.enabled {
        chapters.push(time_on_task(run, config, sink)?);
    }
    if config.average_fixation.enabled {
        chapters.push(average_fixation(run, config, sink)?);
    }
    if config.dwell_times.enabled {
        chapters.push(dwell_times_and_revisits(run, config, sink)?);
    }
    if config.transitions.enabled {
        chapters.push(transitions(run, config, sink)?);
    }
    Ok(chapters)
}

/// Task completion time bar plots per participant and pooled bar and box plots
pub fn time_on_task(
    run: &CohortRun,
    config: &ReportConfig,
    sink: &mut dyn RenderSink,
) -> Result<ChapterOutput, MetricsError> {
    let mut chapter = ChapterOutput::open("Time on tasks");

    let Some(times) = run.task_times.as_ref().filter(|t| !t.is_empty()) else {
        log::warn!("Time on tasks: no completion times, figures omitted");
        return Ok(chapter.close());
    };

    for row in &times.rows {
        let request = ChartRequest::new(
            ChartKind::Bar,
            format!("Time on task: participant {}", row.position),
            times.participant_table(row, &row.participant),
            config.figure_path(&format!("Time_on_task_participant{}.png", row.position)),
        )
        .with_axes(TASK_X_LABEL, TASK_Y_LABEL);
        render_if_data(sink, request)?;
    }

    let pooled = times.to_table("Time on task");
    let bar_path = config.figure_path("Time_on_task_bar_plot.png");
    let box_path = config.figure_path("Time_on_task_box_plot.png");

    let bar_drawn = render_if_data(
        sink,
        ChartRequest::new(ChartKind::Bar, "Time on task", pooled.clone(), bar_path.clone())
            .with_axes(TASK_X_LABEL, TASK_Y_LABEL),
    )?;
    let box_drawn = render_if_data(
        sink,
        ChartRequest::new(ChartKind::Box, "Time on task", pooled, box_path.clone())
            .with_axes(TASK_X_LABEL, TASK_Y_LABEL),
    )?;

    match config.time_on_task.plot_type {
        PlotType::Bar if bar_drawn => chapter
            .blocks
            .push(ReportBlock::figure(bar_path, TASK_BAR_PLOT_CAPTION)),
        PlotType::Box if box_drawn => chapter
            .blocks
            .push(ReportBlock::figure(box_path, TASK_BOX_PLOT_CAPTION)),
        _ => {}
    }

    Ok(chapter.close())
}

/// Fixation duration box plots per participant and pooled bar and box plots
pub fn average_fixation(
    run: &CohortRun,
    config: &ReportConfig,
    sink: &mut dyn RenderSink,
) -> Result<ChapterOutput, MetricsError> {
    let mut chapter = ChapterOutput::open("Average fixation");

    for (participant, n) in run.participants.iter().zip(run.input_positions()) {
        let request = ChartRequest::new(
            ChartKind::Box,
            format!("Average fixation duration: participant {}", n),
            fixation_sample_table(&participant.participant, &participant.fixations),
            config.figure_path(&format!("Average_fixation_participant{}.png", n)),
        )
        .with_axes(FIXATION_X_LABEL, FIXATION_Y_LABEL);
        render_if_data(sink, request)?;
    }

    let Some(cohort) = &run.cohort else {
        log::warn!("Average fixation: no cohort data, figures omitted");
        return Ok(chapter.close());
    };

    let pooled = fixation_sample_table("Average fixation duration", &cohort.fixations);
    let box_path = config.figure_path("Average_fixation_box_plot.png");
    let bar_path = config.figure_path("Average_fixation_bar_plot.png");

    let box_drawn = render_if_data(
        sink,
        fixation_chart(ChartKind::Box, pooled.clone(), box_path.clone()),
    )?;
    let bar_drawn = render_if_data(
        sink,
        fixation_chart(ChartKind::Bar, pooled, bar_path.clone()),
    )?;

    match config.average_fixation.plot_type {
        PlotType::Bar if bar_drawn => chapter
            .blocks
            .push(ReportBlock::figure(bar_path, BAR_PLOT_CAPTION)),
        PlotType::Box if box_drawn => chapter
            .blocks
            .push(ReportBlock::figure(box_path, BOX_PLOT_CAPTION)),
        _ => {}
    }

    let summary = fixation_summary_table("Fixation duration", &cohort.fixations);
    chapter
        .blocks
        .push(ReportBlock::Table(summary.to_text(config.decimals)));

    Ok(chapter.close())
}

fn fixation_chart(kind: ChartKind, table: DataTable, destination: PathBuf) -> ChartRequest {
    ChartRequest::new(kind, "Average fixation duration", table, destination)
        .with_axes(FIXATION_X_LABEL, FIXATION_Y_LABEL)
}

/// Dwell time pie charts per participant, cohort dwell statistics and
/// per-participant revisits
pub fn dwell_times_and_revisits(
    run: &CohortRun,
    config: &ReportConfig,
    sink: &mut dyn RenderSink,
) -> Result<ChapterOutput, MetricsError> {
    let mut chapter = ChapterOutput::open("Dwell times and revisits");

    for (participant, n) in run.participants.iter().zip(run.input_positions()) {
        let request = ChartRequest::new(
            ChartKind::Pie,
            format!("Dwell times: participant {}", n),
            dwell_share_table(participant),
            config.figure_path(&format!("Dwell_times_participant{}.png", n)),
        );
        render_if_data(sink, request)?;
    }

    match &run.cohort {
        Some(cohort) => {
            chapter.blocks.push(ReportBlock::Table(
                dwell_revisit_table(cohort).to_text(config.decimals),
            ));
            chapter.blocks.push(ReportBlock::Table(
                revisits_by_participant(&run.participants, cohort).to_text(config.decimals),
            ));
        }
        None => log::warn!("Dwell times and revisits: no cohort data, tables omitted"),
    }

    Ok(chapter.close())
}

// Dwell sums of the AOIs with closed episodes; AOIs whose sum is NaN get no wedge.
fn dwell_share_table(participant: &ParticipantMetrics) -> DataTable {
    let entries: Vec<_> = participant
        .dwell
        .entries
        .iter()
        .filter(|e| !e.stats.sum.is_nan())
        .collect();

    let columns = entries.iter().map(|e| e.aoi.clone()).collect();
    let mut table = DataTable::new(&participant.participant, "Statistic", columns);
    if !entries.is_empty() {
        table.rows.push(TableRow {
            label: "Sum".to_string(),
            values: entries.iter().map(|e| Some(e.stats.sum)).collect(),
        });
    }
    table
}

/// Transition heatmaps per participant and for the cohort
pub fn transitions(
    run: &CohortRun,
    config: &ReportConfig,
    sink: &mut dyn RenderSink,
) -> Result<ChapterOutput, MetricsError> {
    let mut chapter = ChapterOutput::open("Transitions");

    for (participant, n) in run.participants.iter().zip(run.input_positions()) {
        let Some(table) = transition_table(
            &participant.participant,
            &participant.transitions,
            config.transitions.normalize,
        )?
        else {
            continue;
        };
        let request = ChartRequest::new(
            ChartKind::Heatmap,
            format!("Transitions: participant {}", n),
            table,
            config.figure_path(&format!("Transitions_participant{}.png", n)),
        )
        .with_axes(TRANSITION_X_LABEL, TRANSITION_Y_LABEL);
        render_if_data(sink, request)?;
    }

    let Some(cohort) = &run.cohort else {
        log::warn!("Transitions: no cohort data, heatmap omitted");
        return Ok(chapter.close());
    };

    if let Some(table) =
        transition_table("Transitions", &cohort.transitions, config.transitions.normalize)?
    {
        let path = config.figure_path("Transitions_heat_map.png");
        let request = ChartRequest::new(ChartKind::Heatmap, "Transitions", table, path.clone())
            .with_axes(TRANSITION_X_LABEL, TRANSITION_Y_LABEL);
        if render_if_data(sink, request)? {
            chapter
                .blocks
                .push(ReportBlock::figure(path, TRANSITIONS_CAPTION));
        }
    }

    chapter.blocks.push(ReportBlock::Table(
        transition_count_table("Transition counts", &cohort.transitions).to_text(config.decimals),
    ));

    Ok(chapter.close())
}

// A matrix without transitions has nothing to normalize; it is skipped with a warning.
fn transition_table(
    title: &str,
    matrix: &TransitionMatrix,
    normalize: bool,
) -> Result<Option<DataTable>, MetricsError> {
    if !normalize {
        return Ok(Some(transition_count_table(title, matrix)));
    }
    match matrix.normalized() {
        Ok(shares) => Ok(Some(transition_share_table(title, &shares))),
        Err(e) if e.is_recoverable() => {
            log::warn!("{}: {}", title, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::MetricsProcessor;
    use crate::render::CollectingSink;
    use crate::schema::TaskEvent;
    use crate::types::{EventLog, Fixation};
    use std::path::Path;

    fn log_of(participant: &str, labels: &[&str]) -> EventLog {
        let fixations = labels
            .iter()
            .enumerate()
            .map(|(i, aoi)| Fixation::new(*aoi, i as f64, i as f64 + 0.25))
            .collect();
        EventLog::new(participant, fixations)
    }

    fn sample_run() -> CohortRun {
        let mut processor = MetricsProcessor::new();
        processor.add_log(&log_of("Participant 1", &["Screen", "Knob", "Screen"]));
        processor.add_log(&log_of("Participant 2", &["Knob", "Alarm", "Knob", "Knob"]));
        processor.finish().unwrap()
    }

    fn heading_texts(chapter: &ChapterOutput) -> Vec<(&str, &str)> {
        chapter
            .blocks
            .iter()
            .filter_map(|block| match block {
                ReportBlock::Heading { text, style } => Some((text.as_str(), style.as_str())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_average_fixation_requests_all_plots() {
        let run = sample_run();
        let mut sink = CollectingSink::new();
        let chapter = average_fixation(&run, &ReportConfig::default(), &mut sink).unwrap();

        assert_eq!(
            sink.destinations(),
            vec![
                Path::new("Outputs/Average_fixation_participant1.png"),
                Path::new("Outputs/Average_fixation_participant2.png"),
                Path::new("Outputs/Average_fixation_box_plot.png"),
                Path::new("Outputs/Average_fixation_bar_plot.png"),
            ]
        );
        assert_eq!(
            chapter.figures(),
            vec![&PathBuf::from("Outputs/Average_fixation_bar_plot.png")]
        );
        assert_eq!(
            heading_texts(&chapter),
            vec![("Average fixation", "Heading 2"), ("Discussion", "Heading 3")]
        );
    }

    #[test]
    fn test_average_fixation_box_plot_choice() {
        let run = sample_run();
        let mut config = ReportConfig::default();
        config.average_fixation.plot_type = PlotType::Box;

        let mut sink = CollectingSink::new();
        let chapter = average_fixation(&run, &config, &mut sink).unwrap();

        match &chapter.blocks[1] {
            ReportBlock::Figure { path, caption, width_cm } => {
                assert_eq!(path, &PathBuf::from("Outputs/Average_fixation_box_plot.png"));
                assert_eq!(caption, BOX_PLOT_CAPTION);
                assert_eq!(*width_cm, 12.0);
            }
            other => panic!("expected figure, got {:?}", other),
        }
    }

    #[test]
    fn test_dwell_chapter_tables() {
        let run = sample_run();
        let mut sink = CollectingSink::new();
        let chapter = dwell_times_and_revisits(&run, &ReportConfig::default(), &mut sink).unwrap();
        let tables = chapter.tables();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].header[0], "AOI");
        assert_eq!(tables[0].header_shading, "D0CECE");

        let revisits = tables[1];
        assert_eq!(revisits.rows.last().unwrap()[0], "Mean");
        // Participant 2 never looked at Screen and returned to Knob twice
        assert_eq!(revisits.rows[1], vec!["Participant 2", "nan", "2.0", "0.0"]);
    }

    #[test]
    fn test_transitions_chapter_embeds_cohort_heatmap() {
        let run = sample_run();
        let mut sink = CollectingSink::new();
        let chapter = transitions(&run, &ReportConfig::default(), &mut sink).unwrap();

        assert_eq!(sink.requests.len(), 3);
        assert_eq!(sink.requests[0].title, "Transitions: participant 1");
        assert_eq!(
            sink.requests[0].x_label.as_deref(),
            Some("AOI destination (to)")
        );
        assert_eq!(
            chapter.figures(),
            vec![&PathBuf::from("Outputs/Transitions_heat_map.png")]
        );

        let cohort_request = &sink.requests[2];
        let total: f64 = cohort_request
            .table
            .rows
            .iter()
            .flat_map(|r| r.values.iter().flatten())
            .sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_fixation_participant_omits_heatmap() {
        let mut processor = MetricsProcessor::new();
        processor.add_log(&log_of("Participant 1", &["Screen"]));
        let run = processor.finish().unwrap();

        let mut sink = CollectingSink::new();
        let chapter = transitions(&run, &ReportConfig::default(), &mut sink).unwrap();

        assert!(sink.requests.is_empty());
        assert!(chapter.figures().is_empty());
        assert_eq!(heading_texts(&chapter).len(), 2);
    }

    #[test]
    fn test_disabled_chapters_are_left_out() {
        let run = sample_run();
        let mut config = ReportConfig::default();
        config.average_fixation.enabled = false;
        config.transitions.enabled = false;

        let mut sink = CollectingSink::new();
        let chapters = assemble_chapters(&run, &config, &mut sink).unwrap();

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Dwell times and revisits");
        assert!(sink.requests.iter().all(|r| r.kind == ChartKind::Pie));
    }

    #[test]
    fn test_dwell_chapter_requests_pie_per_participant() {
        let run = sample_run();
        let mut sink = CollectingSink::new();
        dwell_times_and_revisits(&run, &ReportConfig::default(), &mut sink).unwrap();

        assert_eq!(
            sink.destinations(),
            vec![
                Path::new("Outputs/Dwell_times_participant1.png"),
                Path::new("Outputs/Dwell_times_participant2.png"),
            ]
        );
        let second = &sink.requests[1];
        assert_eq!(second.kind, ChartKind::Pie);
        assert_eq!(second.title, "Dwell times: participant 2");
        assert_eq!(second.table.columns, vec!["Knob", "Alarm"]);
        assert_eq!(second.table.rows[0].values, vec![Some(0.25), Some(0.25)]);
    }

    #[test]
    fn test_dwell_pie_leaves_out_unclosed_aois() {
        let mut processor = MetricsProcessor::new();
        processor.add_log(&log_of("Participant 1", &["Screen", "Knob"]));
        processor.add_log(&log_of("Participant 2", &["Alarm"]));
        let run = processor.finish().unwrap();

        let mut sink = CollectingSink::new();
        dwell_times_and_revisits(&run, &ReportConfig::default(), &mut sink).unwrap();

        // Knob and Alarm only have the unclosed trailing episode
        assert_eq!(sink.requests.len(), 1);
        assert_eq!(sink.requests[0].table.columns, vec!["Screen"]);
    }

    #[test]
    fn test_skipped_participant_keeps_figure_numbers() {
        let mut processor = MetricsProcessor::new();
        processor.add_log(&log_of("Participant 1", &["Screen", "Knob"]));
        processor.add_log(&EventLog::new("Participant 2", vec![]));
        processor.add_log(&log_of("Participant 3", &["Knob", "Screen"]));
        let run = processor.finish().unwrap();

        let mut sink = CollectingSink::new();
        transitions(&run, &ReportConfig::default(), &mut sink).unwrap();

        assert_eq!(sink.requests[1].title, "Transitions: participant 3");
        assert_eq!(sink.requests[1].table.title, "Participant 3");
        assert_eq!(
            sink.requests[1].destination,
            PathBuf::from("Outputs/Transitions_participant3.png")
        );

        let mut sink = CollectingSink::new();
        average_fixation(&run, &ReportConfig::default(), &mut sink).unwrap();
        assert_eq!(
            sink.destinations()[1],
            Path::new("Outputs/Average_fixation_participant3.png")
        );
    }

    fn task_run() -> CohortRun {
        let mut processor = MetricsProcessor::new();
        processor.add_log(&log_of("Participant 1", &["Screen", "Knob"]));
        processor.add_task_events(&[
            TaskEvent::new("Participant 1", "Task1", 0.0),
            TaskEvent::new("Participant 2", "Task1", 1.0),
            TaskEvent::new("Participant 1", "Task1", 12.0),
            TaskEvent::new("Participant 2", "Task1", 9.0),
        ]);
        processor.finish().unwrap()
    }

    #[test]
    fn test_time_on_task_chapter() {
        let run = task_run();
        let mut config = ReportConfig::default();
        config.time_on_task.enabled = true;

        let mut sink = CollectingSink::new();
        let chapter = time_on_task(&run, &config, &mut sink).unwrap();

        assert_eq!(
            sink.destinations(),
            vec![
                Path::new("Outputs/Time_on_task_participant1.png"),
                Path::new("Outputs/Time_on_task_participant2.png"),
                Path::new("Outputs/Time_on_task_bar_plot.png"),
                Path::new("Outputs/Time_on_task_box_plot.png"),
            ]
        );
        assert_eq!(sink.requests[1].title, "Time on task: participant 2");
        assert_eq!(sink.requests[1].y_label.as_deref(), Some("Completion time [s]"));
        assert_eq!(
            sink.requests[2].table.column("Critical task 1"),
            Some(vec![Some(12.0), Some(8.0)])
        );

        match &chapter.blocks[1] {
            ReportBlock::Figure { path, caption, .. } => {
                assert_eq!(path, &PathBuf::from("Outputs/Time_on_task_bar_plot.png"));
                assert_eq!(caption, TASK_BAR_PLOT_CAPTION);
            }
            other => panic!("expected figure, got {:?}", other),
        }
        assert_eq!(
            heading_texts(&chapter),
            vec![("Time on tasks", "Heading 2"), ("Discussion", "Heading 3")]
        );
    }

    #[test]
    fn test_time_on_task_is_first_when_enabled() {
        let mut config = ReportConfig::default();
        config.time_on_task.enabled = true;
        config.time_on_task.plot_type = PlotType::Box;

        let mut sink = CollectingSink::new();
        let chapters = assemble_chapters(&task_run(), &config, &mut sink).unwrap();

        assert_eq!(chapters.len(), 4);
        assert_eq!(chapters[0].title, "Time on tasks");
        assert_eq!(
            chapters[0].figures(),
            vec![&PathBuf::from("Outputs/Time_on_task_box_plot.png")]
        );
    }

    #[test]
    fn test_time_on_task_without_events_keeps_headings() {
        let mut sink = CollectingSink::new();
        let chapter = time_on_task(&sample_run(), &ReportConfig::default(), &mut sink).unwrap();

        assert!(sink.requests.is_empty());
        assert_eq!(chapter.blocks.len(), 2);
    }

    #[test]
    fn test_empty_run_keeps_headings() {
        let run = MetricsProcessor::new().finish().unwrap();
        let mut sink = CollectingSink::new();
        let chapters = assemble_chapters(&run, &ReportConfig::default(), &mut sink).unwrap();

        assert_eq!(chapters.len(), 3);
        for chapter in &chapters {
            assert_eq!(chapter.blocks.len(), 2);
        }
        assert!(sink.requests.is_empty());
    }
}
