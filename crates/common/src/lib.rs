// folio-common: block model, editor tree format and the conversion between them

pub mod block;
pub mod convert;
pub mod document;
pub mod tree;
