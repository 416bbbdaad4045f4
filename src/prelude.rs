pub(crate) use anyhow::{Context as _, Result, bail};
pub(crate) use tracing::{debug, error, info, trace, warn};
