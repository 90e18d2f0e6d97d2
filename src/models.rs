use crate::errors::BotError;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Reporting units tracked by the bot, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Branch {
    #[serde(rename = "BINJAI")]
    Binjai,
    #[serde(rename = "INNER SUMUT")]
    InnerSumut,
    #[serde(rename = "KABANJAHE")]
    Kabanjahe,
    #[serde(rename = "KISARAN")]
    Kisaran,
    #[serde(rename = "LUBUK PAKAM")]
    LubukPakam,
    #[serde(rename = "PADANGSIDEMPUAN")]
    Padangsidempuan,
    #[serde(rename = "RANTAU PRAPAT")]
    RantauPrapat,
    #[serde(rename = "SIANTAR")]
    Siantar,
    #[serde(rename = "SIBOLGA")]
    Sibolga,
    #[serde(rename = "TOBA")]
    Toba,
}

impl Branch {
    pub const ALL: [Branch; 10] = [
        Branch::Binjai,
        Branch::InnerSumut,
        Branch::Kabanjahe,
        Branch::Kisaran,
        Branch::LubukPakam,
        Branch::Padangsidempuan,
        Branch::RantauPrapat,
        Branch::Siantar,
        Branch::Sibolga,
        Branch::Toba,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn name(self) -> &'static str {
        match self {
            Branch::Binjai => "BINJAI",
            Branch::InnerSumut => "INNER SUMUT",
            Branch::Kabanjahe => "KABANJAHE",
            Branch::Kisaran => "KISARAN",
            Branch::LubukPakam => "LUBUK PAKAM",
            Branch::Padangsidempuan => "PADANGSIDEMPUAN",
            Branch::RantauPrapat => "RANTAU PRAPAT",
            Branch::Siantar => "SIANTAR",
            Branch::Sibolga => "SIBOLGA",
            Branch::Toba => "TOBA",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Branch {
    type Err = BotError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        Branch::ALL
            .into_iter()
            .find(|branch| branch.name() == normalized)
            .ok_or_else(|| BotError::validation(format!("'{value}' is not a known TELDA.")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricKind {
    Target,
    Actual,
    PriorActual,
    MtdBaseline,
    YtdTarget,
    YtdActual,
}

impl MetricKind {
    /// Order in which a report looks for missing values within a branch.
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Target,
        MetricKind::Actual,
        MetricKind::PriorActual,
        MetricKind::MtdBaseline,
        MetricKind::YtdTarget,
        MetricKind::YtdActual,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MetricKind::Target => "tgt",
            MetricKind::Actual => "real",
            MetricKind::PriorActual => "prev",
            MetricKind::MtdBaseline => "baseline",
            MetricKind::YtdTarget => "ytd_tgt",
            MetricKind::YtdActual => "ytd_real",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Target => "TGT",
            MetricKind::Actual => "REAL",
            MetricKind::PriorActual => "M-1",
            MetricKind::MtdBaseline => "MTD M-1",
            MetricKind::YtdTarget => "TGT YTD",
            MetricKind::YtdActual => "REAL YTD",
        }
    }

    pub fn set_command(self) -> String {
        format!("/set_{}", self.key())
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MetricKind {
    type Err = BotError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim().to_lowercase();
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| {
                let keys = MetricKind::ALL.map(MetricKind::key).join(", ");
                BotError::validation(format!("'{value}' is not a metric. Use one of: {keys}."))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodSlot {
    Mtd,
    Ytd,
}

impl PeriodSlot {
    pub fn label(self) -> &'static str {
        match self {
            PeriodSlot::Mtd => "MTD",
            PeriodSlot::Ytd => "YTD",
        }
    }

    pub fn set_command(self) -> &'static str {
        match self {
            PeriodSlot::Mtd => "/set_mtd",
            PeriodSlot::Ytd => "/set_ytd",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodLabel {
    pub month: String,
    pub year: i32,
}

impl fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month.to_uppercase(), self.year)
    }
}

/// Per-branch figures. `None` means the value was never set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricRecord {
    pub tgt: Option<i64>,
    pub real: Option<i64>,
    pub prev: Option<i64>,
    pub baseline: Option<i64>,
    pub ytd_tgt: Option<i64>,
    pub ytd_real: Option<i64>,
}

impl MetricRecord {
    pub fn get(&self, kind: MetricKind) -> Option<i64> {
        match kind {
            MetricKind::Target => self.tgt,
            MetricKind::Actual => self.real,
            MetricKind::PriorActual => self.prev,
            MetricKind::MtdBaseline => self.baseline,
            MetricKind::YtdTarget => self.ytd_tgt,
            MetricKind::YtdActual => self.ytd_real,
        }
    }

    pub fn set(&mut self, kind: MetricKind, value: i64) {
        let slot = match kind {
            MetricKind::Target => &mut self.tgt,
            MetricKind::Actual => &mut self.real,
            MetricKind::PriorActual => &mut self.prev,
            MetricKind::MtdBaseline => &mut self.baseline,
            MetricKind::YtdTarget => &mut self.ytd_tgt,
            MetricKind::YtdActual => &mut self.ytd_real,
        };
        *slot = Some(value);
    }
}

/// Point-in-time copy of everything the store holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub periods: BTreeMap<PeriodSlot, PeriodLabel>,
    pub branches: BTreeMap<Branch, MetricRecord>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            periods: BTreeMap::new(),
            branches: Branch::ALL
                .into_iter()
                .map(|branch| (branch, MetricRecord::default()))
                .collect(),
        }
    }
}

impl Snapshot {
    pub fn period(&self, slot: PeriodSlot) -> Option<&PeriodLabel> {
        self.periods.get(&slot)
    }

    pub fn metric(&self, branch: Branch, kind: MetricKind) -> Option<i64> {
        self.branches.get(&branch).and_then(|record| record.get(kind))
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub reply: String,
}
