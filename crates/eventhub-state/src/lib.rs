mod barrier;
mod hub_state;
mod timeline;

pub use barrier::apply as apply_barrier;
pub use hub_state::{build_hub_state, ExtensionInfo};
pub use timeline::SharedStateTimeline;
