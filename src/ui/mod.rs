pub mod progress;

pub use progress::ProjectProgress;
