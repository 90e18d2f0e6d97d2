use crate::errors::{BotError, MissingField};
use crate::models::{Branch, MetricKind, PeriodLabel, PeriodSlot, Snapshot};

pub const TOTAL_LABEL: &str = "TOTAL";

/// How a column's cells are colored when the table is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStyle {
    Label,
    Plain,
    Achievement,
    Delta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    pub style: ColumnStyle,
}

const fn column(header: &'static str, style: ColumnStyle) -> Column {
    Column { header, style }
}

const MTD_COLUMNS: [Column; 4] = [
    column("TELDA", ColumnStyle::Label),
    column("TGT", ColumnStyle::Plain),
    column("REAL", ColumnStyle::Plain),
    column("ACH", ColumnStyle::Achievement),
];

const FULL_COLUMNS: [Column; 11] = [
    column("TELDA", ColumnStyle::Label),
    column("TGT", ColumnStyle::Plain),
    column("REAL", ColumnStyle::Plain),
    column("ACH", ColumnStyle::Achievement),
    column("M-1", ColumnStyle::Plain),
    column("MTD M-1", ColumnStyle::Plain),
    column("MoM", ColumnStyle::Delta),
    column("TGT YTD", ColumnStyle::Plain),
    column("REAL YTD", ColumnStyle::Plain),
    column("ACH YTD", ColumnStyle::Achievement),
    column("GAP", ColumnStyle::Plain),
];

/// Extra figures shown once a YTD period is tracked.
#[derive(Debug, Clone, PartialEq)]
pub struct YtdFigures {
    pub prior_actual: i64,
    pub mtd_baseline: i64,
    pub mom: String,
    pub ytd_target: i64,
    pub ytd_actual: i64,
    pub ytd_achievement: String,
    pub gap: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub name: String,
    pub target: i64,
    pub actual: i64,
    pub achievement: String,
    pub ytd: Option<YtdFigures>,
}

impl ReportRow {
    pub fn is_total(&self) -> bool {
        self.name == TOTAL_LABEL
    }

    pub fn cells(&self) -> Vec<String> {
        let mut cells = vec![
            self.name.clone(),
            self.target.to_string(),
            self.actual.to_string(),
            self.achievement.clone(),
        ];
        if let Some(ytd) = &self.ytd {
            cells.extend([
                ytd.prior_actual.to_string(),
                ytd.mtd_baseline.to_string(),
                ytd.mom.clone(),
                ytd.ytd_target.to_string(),
                ytd.ytd_actual.to_string(),
                ytd.ytd_achievement.clone(),
                ytd.gap.to_string(),
            ]);
        }
        cells
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub mtd: PeriodLabel,
    pub ytd: Option<PeriodLabel>,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn columns(&self) -> &'static [Column] {
        if self.ytd.is_some() {
            &FULL_COLUMNS
        } else {
            &MTD_COLUMNS
        }
    }

    pub fn title_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("MTD {}", self.mtd)];
        if let Some(ytd) = &self.ytd {
            lines.push(format!("YTD {ytd}"));
        }
        lines
    }
}

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn ratio_percent(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

#[derive(Debug, Default)]
struct Figures {
    target: i64,
    actual: i64,
    prior_actual: i64,
    mtd_baseline: i64,
    ytd_target: i64,
    ytd_actual: i64,
}

impl Figures {
    fn accumulate(&mut self, other: &Figures) {
        self.target = self.target.saturating_add(other.target);
        self.actual = self.actual.saturating_add(other.actual);
        self.prior_actual = self.prior_actual.saturating_add(other.prior_actual);
        self.mtd_baseline = self.mtd_baseline.saturating_add(other.mtd_baseline);
        self.ytd_target = self.ytd_target.saturating_add(other.ytd_target);
        self.ytd_actual = self.ytd_actual.saturating_add(other.ytd_actual);
    }

    fn into_row(self, name: String, with_ytd: bool) -> ReportRow {
        let ytd = with_ytd.then(|| YtdFigures {
            prior_actual: self.prior_actual,
            mtd_baseline: self.mtd_baseline,
            mom: format_percent(ratio_percent(
                self.actual.saturating_sub(self.mtd_baseline),
                self.mtd_baseline,
            )),
            ytd_target: self.ytd_target,
            ytd_actual: self.ytd_actual,
            ytd_achievement: format_percent(ratio_percent(self.ytd_actual, self.ytd_target)),
            gap: self.ytd_target.saturating_sub(self.ytd_actual),
        });

        ReportRow {
            name,
            target: self.target,
            actual: self.actual,
            achievement: format_percent(ratio_percent(self.actual, self.target)),
            ytd,
        }
    }
}

const MTD_KINDS: [MetricKind; 2] = [MetricKind::Target, MetricKind::Actual];

fn required_kinds(with_ytd: bool) -> &'static [MetricKind] {
    if with_ytd { &MetricKind::ALL } else { &MTD_KINDS }
}

/// Builds the report rows, or names the first value still missing.
pub fn compute_report(snapshot: &Snapshot) -> Result<Report, BotError> {
    let mtd = snapshot
        .period(PeriodSlot::Mtd)
        .cloned()
        .ok_or(BotError::MissingData(MissingField::Period(PeriodSlot::Mtd)))?;
    let ytd = snapshot.period(PeriodSlot::Ytd).cloned();
    let with_ytd = ytd.is_some();

    let mut branch_figures = Vec::with_capacity(Branch::COUNT);
    for branch in Branch::ALL {
        let mut values = [0i64; MetricKind::ALL.len()];
        for (index, kind) in required_kinds(with_ytd).iter().enumerate() {
            values[index] = snapshot
                .metric(branch, *kind)
                .ok_or(BotError::MissingData(MissingField::Metric {
                    branch,
                    kind: *kind,
                }))?;
        }
        let [target, actual, prior_actual, mtd_baseline, ytd_target, ytd_actual] = values;
        branch_figures.push((
            branch,
            Figures {
                target,
                actual,
                prior_actual,
                mtd_baseline,
                ytd_target,
                ytd_actual,
            },
        ));
    }

    let mut totals = Figures::default();
    let mut rows = Vec::with_capacity(Branch::COUNT + 1);
    for (branch, figures) in branch_figures {
        totals.accumulate(&figures);
        rows.push(figures.into_row(branch.name().to_string(), with_ytd));
    }
    rows.push(totals.into_row(TOTAL_LABEL.to_string(), with_ytd));

    Ok(Report { mtd, ytd, rows })
}
