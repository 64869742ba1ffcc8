pub mod directory;
pub mod pricing;

pub use directory::{DirectorySnapshot, RouteDirectory};
pub use pricing::{Fare, FareCalculator, FareConfig};
