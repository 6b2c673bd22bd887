pub(crate) mod coerce;
pub(crate) mod types;
