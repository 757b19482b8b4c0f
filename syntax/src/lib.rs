#[macro_use]
mod macros;
mod parse;

mod template;
pub use template::{Segment, Template};

mod time;
pub use time::TimeExpr;

mod date_pattern;
pub use date_pattern::DatePattern;

mod resolve;
pub use resolve::{resolve, resolve_all, resolve_schedule_time};

/// Variable name to value mapping used for placeholder substitution.
pub type VarMap = util::HashMap<String, String>;

#[derive(Debug, thiserror::Error)]
#[error("ParseError in template '{text}' at position {pos}: {msg}")]
pub struct Error {
    msg: String,
    pos: usize,
    text: String,
}

impl Error {
    fn new(text: &str, pos: usize, msg: String) -> Self {
        // since converting combine's errors is a lifetime nightmare,
        // we just stringify the error before returning it.
        Self {
            msg,
            pos,
            text: text.to_owned(),
        }
    }
}
