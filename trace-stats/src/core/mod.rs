pub(crate) mod check;
pub(crate) mod error;
pub(crate) mod maps;
pub(crate) mod probe;
