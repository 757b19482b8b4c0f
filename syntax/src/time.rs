use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};

use crate::date_pattern::DatePattern;
use crate::parse::prelude::*;

/// A parsed `$[...]` schedule-time expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeExpr<'a> {
    /// `pattern`, optionally shifted: `yyyyMMdd-1` (days), `HH+1/24` (hours),
    /// `HHmm-30/24/60` (minutes).
    Shifted { pattern: &'a str, minutes: i64 },
    /// `add_months(pattern,N)`
    AddMonths { pattern: &'a str, months: i32 },
    /// `this_day(pattern)`
    ThisDay { pattern: &'a str },
    /// `last_day(pattern)`: the day before.
    LastDay { pattern: &'a str },
    /// `month_begin(pattern,N)`: first day of the month N months away.
    MonthBegin { pattern: &'a str, months: i32 },
    /// `month_end(pattern,N)`: last day of the month N months away.
    MonthEnd { pattern: &'a str, months: i32 },
    /// `week_begin(pattern,N)`: Monday of the week N weeks away.
    WeekBegin { pattern: &'a str, weeks: i32 },
    /// `week_end(pattern,N)`: Sunday of the week N weeks away.
    WeekEnd { pattern: &'a str, weeks: i32 },
}

const MINUTES_PER_DAY: f64 = 1440.0;

p! {
    func_name() -> &'a str, {
        recognize(skip_many1(char('_').or(combine::parser::char::letter())))
    }
}

p! {
    func_arg() -> &'a str, {
        recognize(skip_many1(none_of(",)".chars())))
    }
}

p! {
    func_call() -> (&'a str, Vec<&'a str>), {
        func_name()
            .skip(char('('))
            .and(sep_by1(func_arg(), char(',')))
            .skip(char(')'))
            .skip(eof())
    }
}

impl<'a> TimeExpr<'a> {
    /// Parse the text between `$[` and `]`. Returns `None` for a function call
    /// we don't recognize or whose arguments are malformed; such placeholders
    /// are left in the text as-is.
    pub fn parse(expr: &'a str) -> Option<Self> {
        use combine::EasyParser;
        let expr = expr.trim();
        match func_call().easy_parse(expr) {
            Ok(((name, args), _)) => Self::from_call(name, &args),
            Err(_) => Some(Self::shifted(expr)),
        }
    }

    fn from_call(name: &'a str, args: &[&'a str]) -> Option<Self> {
        let pattern = args.first()?.trim();
        let offset = || -> Option<i32> {
            match args.get(1) {
                Some(n) => n.trim().parse().ok(),
                None => None,
            }
        };
        let expr = match (name, args.len()) {
            ("this_day", 1) => Self::ThisDay { pattern },
            ("last_day", 1) => Self::LastDay { pattern },
            ("add_months", 2) => Self::AddMonths { pattern, months: offset()? },
            ("month_begin", 2) => Self::MonthBegin { pattern, months: offset()? },
            ("month_end", 2) => Self::MonthEnd { pattern, months: offset()? },
            ("week_begin", 2) => Self::WeekBegin { pattern, weeks: offset()? },
            ("week_end", 2) => Self::WeekEnd { pattern, weeks: offset()? },
            _ => return None,
        };
        Some(expr)
    }

    // patterns can contain '-' themselves (yyyy-MM-dd), so only the last
    // sign followed by a valid arithmetic suffix counts as an offset.
    // An offset too large for any date saturates here and fails in `eval`.
    fn shifted(expr: &'a str) -> Self {
        if let Some(idx) = expr.rfind(['+', '-']) {
            if idx > 0 {
                if let Some(days) = eval_days(&expr[idx + 1..]) {
                    let sign = if expr[idx..].starts_with('-') { -1.0 } else { 1.0 };
                    return Self::Shifted {
                        pattern: &expr[..idx],
                        minutes: (sign * days * MINUTES_PER_DAY).round() as i64,
                    };
                }
            }
        }
        Self::Shifted {
            pattern: expr,
            minutes: 0,
        }
    }

    /// Evaluate against `time` and format with this expression's pattern.
    pub fn eval(&self, time: NaiveDateTime) -> Option<String> {
        use TimeExpr::*;
        let (pattern, time) = match *self {
            Shifted { pattern, minutes } => {
                (pattern, time.checked_add_signed(Duration::try_minutes(minutes)?)?)
            }
            AddMonths { pattern, months } => (pattern, add_months(time, months)?),
            ThisDay { pattern } => (pattern, time),
            LastDay { pattern } => (pattern, time.checked_sub_signed(Duration::days(1))?),
            MonthBegin { pattern, months } => {
                let time = add_months(time, months)?;
                (pattern, time.with_day(1)?)
            }
            MonthEnd { pattern, months } => {
                let time = add_months(time, months)?;
                (pattern, time.with_day(last_day_of_month(time.date())?)?)
            }
            WeekBegin { pattern, weeks } => (pattern, week_begin(time, weeks)?),
            WeekEnd { pattern, weeks } => {
                let begin = week_begin(time, weeks)?;
                (pattern, begin.checked_add_signed(Duration::days(6))?)
            }
        };
        Some(DatePattern::new(pattern).format(time))
    }
}

/// Evaluate an offset like `1`, `1/24`, `30/24/60` or `7*2` as a number of days.
fn eval_days(s: &str) -> Option<f64> {
    let mut ops = s.split_inclusive(['*', '/']);
    let (mut total, mut pending) = parse_operand(ops.next()?)?;
    for op in ops {
        let (n, next) = parse_operand(op)?;
        match pending? {
            '*' => total *= n,
            _ if n == 0.0 => return None,
            _ => total /= n,
        }
        pending = next;
    }
    if pending.is_some() {
        return None;
    }
    Some(total)
}

// "24/" -> (24.0, Some('/')), "60" -> (60.0, None)
fn parse_operand(s: &str) -> Option<(f64, Option<char>)> {
    let (digits, op) = match s.chars().last()? {
        c @ ('*' | '/') => (&s[..s.len() - 1], Some(c)),
        _ => (s, None),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((digits.parse::<u32>().ok()? as f64, op))
}

fn add_months(time: NaiveDateTime, months: i32) -> Option<NaiveDateTime> {
    let delta = Months::new(months.unsigned_abs());
    if months >= 0 {
        time.checked_add_months(delta)
    } else {
        time.checked_sub_months(delta)
    }
}

fn last_day_of_month(date: NaiveDate) -> Option<u32> {
    let first = date.with_day(1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.pred_opt()?.day())
}

fn week_begin(time: NaiveDateTime, weeks: i32) -> Option<NaiveDateTime> {
    let time = time.checked_add_signed(Duration::weeks(weeks as i64))?;
    let from_monday = time.weekday().num_days_from_monday() as i64;
    time.checked_sub_signed(Duration::days(from_monday))
}
