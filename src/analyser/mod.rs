pub mod logic;
pub mod session;

pub use session::AnalysisSession;
