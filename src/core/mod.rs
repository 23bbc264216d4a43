pub mod batch;
pub mod converter;
pub mod error;
pub mod report;

#[cfg(test)]
pub mod testing;

pub use batch::BatchJob;
pub use converter::ConvertOptions;
