pub mod arxiv;
pub mod iacr;

pub use arxiv::ArxivSource;
pub use iacr::IacrSource;
