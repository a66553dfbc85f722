pub(crate) mod cpus;
pub(crate) mod logger;
pub(crate) mod net;
pub(crate) mod number;
pub(crate) mod signals;
