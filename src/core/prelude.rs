pub use crate::core::logging::init_logger;
pub use crate::core::logging::{debug, error, info, trace, warn};
pub use crate::core::util::HashMap;
#[allow(unused_imports)]
pub use crate::core::util::HashSet;
pub use crate::core::util::clamp_offset;
pub use crate::ternary;
