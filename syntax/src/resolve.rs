use chrono::NaiveDateTime;

use crate::{Error, Segment, Template, TimeExpr, VarMap};

/// Replace every `${name}` found in `vars`. Unknown names and `$[...]`
/// expressions are left exactly as written.
pub fn resolve(text: &str, vars: &VarMap) -> Result<String, Error> {
    if !text.contains('$') {
        return Ok(text.to_owned());
    }
    let template = Template::parse(text)?;
    let mut out = String::with_capacity(text.len());
    for segment in template.segments() {
        match segment {
            Segment::Var(name) => match vars.get(*name) {
                Some(val) => out.push_str(val),
                None => segment.write_literal(&mut out),
            },
            _ => segment.write_literal(&mut out),
        }
    }
    Ok(out)
}

/// Expand every `$[...]` expression against `time`. Expressions that don't
/// parse, and all `${...}` variables, are left exactly as written.
pub fn resolve_schedule_time(text: &str, time: NaiveDateTime) -> Result<String, Error> {
    if !text.contains("$[") {
        return Ok(text.to_owned());
    }
    let template = Template::parse(text)?;
    let mut out = String::with_capacity(text.len());
    for segment in template.segments() {
        match segment {
            Segment::Time(expr) => match TimeExpr::parse(expr).and_then(|e| e.eval(time)) {
                Some(val) => out.push_str(&val),
                None => segment.write_literal(&mut out),
            },
            _ => segment.write_literal(&mut out),
        }
    }
    Ok(out)
}

/// Schedule-time expressions first, then variables.
pub fn resolve_all(text: &str, vars: &VarMap, time: NaiveDateTime) -> Result<String, Error> {
    let text = resolve_schedule_time(text, time)?;
    resolve(&text, vars)
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;

    fn vars(pairs: &[(&str, &str)]) -> VarMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn time() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-03-05 07:08:09", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_resolve_vars() -> Result<()> {
        let vars = vars(&[("dt", "20240305"), ("queue", "etl")]);
        assert_eq!(
            resolve("--dt ${dt} --queue ${queue}", &vars)?,
            "--dt 20240305 --queue etl"
        );
        Ok(())
    }

    #[test]
    fn test_unresolved_left_literal() -> Result<()> {
        let vars = vars(&[("dt", "20240305")]);
        assert_eq!(
            resolve("${JAVA_HOME}/bin/java ${dt} $[yyyyMMdd] $", &vars)?,
            "${JAVA_HOME}/bin/java 20240305 $[yyyyMMdd] $"
        );
        Ok(())
    }

    #[test]
    fn test_resolve_schedule_time() -> Result<()> {
        assert_eq!(
            resolve_schedule_time("day=$[yyyyMMdd-1] ${dt} $[bogus_fn(x)]", time())?,
            "day=20240304 ${dt} $[bogus_fn(x)]"
        );
        Ok(())
    }

    #[test]
    fn test_huge_offset_left_literal() -> Result<()> {
        assert_eq!(
            resolve_schedule_time("--day $[yyyyMMdd+4000000000*100] $[yyyyMMdd]", time())?,
            "--day $[yyyyMMdd+4000000000*100] 20240305"
        );
        Ok(())
    }

    #[test]
    fn test_time_before_vars() -> Result<()> {
        // a time expansion can't be re-read as a variable, but a variable
        // value containing `$[` is not expanded either.
        let vars = vars(&[("fmt", "$[yyyy]")]);
        assert_eq!(
            resolve_all("$[yyyyMMdd] ${fmt}", &vars, time())?,
            "20240305 $[yyyy]"
        );
        Ok(())
    }

    #[test]
    fn test_referentially_transparent() -> Result<()> {
        let vars = vars(&[("a", "1")]);
        let first = resolve_all("${a}-$[HH]-${b}", &vars, time())?;
        for _ in 0..3 {
            assert_eq!(resolve_all("${a}-$[HH]-${b}", &vars, time())?, first);
        }
        assert_eq!(first, "1-07-${b}");
        Ok(())
    }
}
