use crate::errors::BotError;
use crate::models::{Branch, MetricKind, PeriodLabel, PeriodSlot};

/// A chat command after its arguments have been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    SetPeriod {
        slot: PeriodSlot,
        label: PeriodLabel,
    },
    SetValues {
        kind: MetricKind,
        values: Vec<i64>,
    },
    SetOne {
        kind: MetricKind,
        branch: Branch,
        value: i64,
    },
    List(MetricKind),
    Status,
    Report,
    Save,
}

pub const HELP_TEXT: &str = "\
Commands:
/set_mtd <month> <year> - set the MTD period
/set_ytd <month> <year> - set the YTD period (adds the YTD columns)
/set_tgt <10 values> - targets, one per TELDA
/set_real <10 values> - actuals, one per TELDA
/set_prev <10 values> - last month's actuals
/set_baseline <10 values> - MTD figures of last month
/set_ytd_tgt <10 values> - YTD targets
/set_ytd_real <10 values> - YTD actuals
/set <metric> <TELDA> <value> - set a single value
/list_tgt, /list_real, /list <metric> - show stored values
/status - what is set and when it was saved
/print_table - render the report
/save - save all data";

fn setter_kind(name: &str) -> Option<MetricKind> {
    let key = name.strip_prefix("set_")?;
    MetricKind::ALL.into_iter().find(|kind| kind.key() == key)
}

fn parse_integer(value: &str, field: &str) -> Result<i64, BotError> {
    value
        .parse::<i64>()
        .map_err(|_| BotError::validation(format!("'{value}' is not a valid integer for {field}.")))
}

impl Command {
    /// Parses `/name args...`. Returns `Ok(None)` for text that is not a command.
    pub fn parse(text: &str) -> Result<Option<Command>, BotError> {
        let mut parts = text.split_whitespace();
        let Some(head) = parts.next() else {
            return Ok(None);
        };
        let Some(name) = head.strip_prefix('/') else {
            return Ok(None);
        };
        let name = name.split('@').next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();

        Self::from_parts(&name, &args).map(Some)
    }

    fn from_parts(name: &str, args: &[&str]) -> Result<Command, BotError> {
        match name {
            "start" | "help" => Ok(Command::Help),
            "set_mtd" => parse_period(PeriodSlot::Mtd, args),
            "set_ytd" => parse_period(PeriodSlot::Ytd, args),
            "set" => parse_single(args),
            "list_tgt" => Ok(Command::List(MetricKind::Target)),
            "list_real" => Ok(Command::List(MetricKind::Actual)),
            "list" => match args {
                [key] => Ok(Command::List(key.parse()?)),
                _ => Err(BotError::validation("Usage: /list <metric>")),
            },
            "status" => Ok(Command::Status),
            "print_table" | "report" => Ok(Command::Report),
            "save" => Ok(Command::Save),
            other => match setter_kind(other) {
                Some(kind) => parse_values(kind, args),
                None => Err(BotError::validation(format!(
                    "Unknown command /{other}. Send /help for the list of commands."
                ))),
            },
        }
    }
}

fn parse_period(slot: PeriodSlot, args: &[&str]) -> Result<Command, BotError> {
    let [month, year] = args else {
        return Err(BotError::validation(format!(
            "Usage: {} <month> <year>",
            slot.set_command()
        )));
    };
    let year = year
        .parse::<i32>()
        .map_err(|_| BotError::validation(format!("'{year}' is not a valid year.")))?;

    Ok(Command::SetPeriod {
        slot,
        label: PeriodLabel {
            month: month.to_string(),
            year,
        },
    })
}

fn parse_values(kind: MetricKind, args: &[&str]) -> Result<Command, BotError> {
    if args.len() != Branch::COUNT {
        return Err(BotError::validation(format!(
            "Usage: {} <{} values, one for each TELDA>",
            kind.set_command(),
            Branch::COUNT
        )));
    }
    let values = args
        .iter()
        .zip(Branch::ALL)
        .map(|(value, branch)| parse_integer(value, branch.name()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Command::SetValues { kind, values })
}

/// `/set <metric> <branch name, may contain spaces> <value>`
fn parse_single(args: &[&str]) -> Result<Command, BotError> {
    let [key, branch @ .., value] = args else {
        return Err(BotError::validation("Usage: /set <metric> <TELDA> <value>"));
    };
    if branch.is_empty() {
        return Err(BotError::validation("Usage: /set <metric> <TELDA> <value>"));
    }
    let kind: MetricKind = key.parse()?;
    let branch: Branch = branch.join(" ").parse()?;
    let value = parse_integer(value, branch.name())?;

    Ok(Command::SetOne {
        kind,
        branch,
        value,
    })
}
