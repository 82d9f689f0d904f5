pub mod fetcher;
pub mod graph;
pub mod layout;
pub mod providers;
pub mod recommendations;
pub mod session;

pub use session::GraphSession;
