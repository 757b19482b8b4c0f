use crate::parse::prelude::*;

/// One piece of a placeholder template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text, copied through unchanged.
    Text(&'a str),
    /// `${name}`: generic variable reference.
    Var(&'a str),
    /// `$[expr]`: schedule-time expression.
    Time(&'a str),
}

impl Segment<'_> {
    /// Write this segment back out exactly as it appeared in the template.
    pub fn write_literal(&self, out: &mut String) {
        match self {
            Segment::Text(text) => out.push_str(text),
            Segment::Var(name) => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
            Segment::Time(expr) => {
                out.push_str("$[");
                out.push_str(expr);
                out.push(']');
            }
        }
    }
}

wrapper! {
    dollar_braces(parser), {
        string("${").with(parser).skip(char('}'))
    }
}

wrapper! {
    dollar_brackets(parser), {
        string("$[").with(parser).skip(char(']'))
    }
}

p! {
    variable() -> Segment<'a>, {
        dollar_braces(recognize(skip_many1(none_of("}".chars())))).map(Segment::Var)
    }
}

p! {
    time_placeholder() -> Segment<'a>, {
        dollar_brackets(recognize(skip_many1(none_of("]".chars())))).map(Segment::Time)
    }
}

// any run of text that can't start a placeholder.
p! {
    text() -> Segment<'a>, {
        recognize(skip_many1(none_of("$".chars()))).map(Segment::Text)
    }
}

// a '$' that doesn't open a well-formed placeholder is just text.
p! {
    lone_dollar() -> Segment<'a>, {
        recognize(char('$')).map(Segment::Text)
    }
}

p! {
    segment() -> Segment<'a>, {
        choice!(
            attempt(variable()),
            attempt(time_placeholder()),
            text(),
            lone_dollar()
        )
    }
}

p! {
    segments() -> Vec<Segment<'a>>, {
        many(segment()).skip(eof())
    }
}

/// A parsed placeholder template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
    /// Split `text` into literal text and placeholders.
    pub fn parse(text: &'a str) -> Result<Self, crate::Error> {
        use combine::EasyParser;
        segments()
            .easy_parse(text)
            .map(|(segments, _remainder)| Self { segments })
            .map_err(|e| {
                let pos = e.position.translate_position(text);
                crate::Error::new(text, pos, format!("{}", e))
            })
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }
}
