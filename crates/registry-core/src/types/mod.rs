mod audit;
mod ban;
mod challenge;
mod moderation;
mod network;
mod payload;

pub use audit::*;
pub use ban::*;
pub use challenge::*;
pub use moderation::*;
pub use network::*;
pub use payload::*;
