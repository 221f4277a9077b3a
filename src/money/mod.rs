mod format;
mod sign;

pub(crate) use format::{
    format_amount, format_cents, format_percent, parse_dollars, round_cents, truncate,
};
pub(crate) use sign::{effective_type, normalize, Flow};

#[cfg(test)]
mod tests;
