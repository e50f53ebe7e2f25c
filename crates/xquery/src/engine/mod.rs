pub mod atomize;
pub mod collation;
pub mod compare;
pub mod numeric;
pub mod runtime;
