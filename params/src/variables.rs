use chrono::{Duration, NaiveDateTime};

use syntax::{resolve_all, DatePattern};

use crate::{CommandType, Direct, ExecutionContext, Property, VarMap};

/// Business date: the day before the reference time, `yyyyMMdd`.
pub const BIZ_DATE: &str = "system.biz.date";
/// The reference day itself, `yyyyMMdd`.
pub const BIZ_CURDATE: &str = "system.biz.curdate";
/// The reference time, `yyyyMMddHHmmss`.
pub const DATETIME: &str = "system.datetime";

/// Variables derived from how and when the attempt was triggered.
/// Backfill (complement) runs without a schedule time get none.
pub fn business_time(cmd: CommandType, schedule: Option<NaiveDateTime>, now: NaiveDateTime) -> VarMap {
    let mut vars = VarMap::default();
    let reference = match (cmd, schedule) {
        (_, Some(time)) => time,
        (CommandType::ComplementData, None) => return vars,
        (_, None) => now,
    };
    let day = DatePattern::new("yyyyMMdd");
    vars.insert(BIZ_DATE.to_owned(), day.format(reference - Duration::days(1)));
    vars.insert(BIZ_CURDATE.to_owned(), day.format(reference));
    vars.insert(DATETIME.to_owned(), DatePattern::new("yyyyMMddHHmmss").format(reference));
    vars
}

/// Build the mapping placeholders are resolved against.
///
/// Lowest to highest precedence: the context's defined params, the task's
/// local input properties, then business-time variables. Each user-supplied
/// value is itself resolved once, against business-time variables overlaid
/// by the defined params.
pub fn merge(ctx: &ExecutionContext, local: &[Property]) -> Result<VarMap, syntax::Error> {
    let system = business_time(ctx.cmd_type_if_complement, ctx.schedule_time, ctx.start_time);
    let time = ctx.reference_time();

    let mut lookup = system.clone();
    lookup.extend(ctx.defined_params.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut merged = VarMap::default();
    for (name, value) in &ctx.defined_params {
        merged.insert(name.clone(), resolve_all(value, &lookup, time)?);
    }
    for prop in local.iter().filter(|p| p.direct == Direct::In) {
        let value = prop.value.as_deref().unwrap_or_default();
        merged.insert(prop.prop.clone(), resolve_all(value, &lookup, time)?);
    }
    merged.extend(system);

    tracing::debug!(count = merged.len(), "merged task variables");
    Ok(merged)
}
