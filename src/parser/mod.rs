// Parser module: locates price containers in fetched or rendered markup.

pub mod price_parser;

pub use price_parser::PriceSelectors;
